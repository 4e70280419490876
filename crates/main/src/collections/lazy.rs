////////////////////////////////////////////////////////////////////////////////
// This file is part of "Ad Astra", an embeddable scripting programming       //
// language platform.                                                         //
//                                                                            //
// This work is proprietary software with source-available code.              //
//                                                                            //
// To copy, use, distribute, or contribute to this work, you must agree to    //
// the terms of the General License Agreement:                                //
//                                                                            //
// https://github.com/Eliah-Lakhin/ad-astra/blob/master/EULA.md               //
//                                                                            //
// The agreement grants a Basic Commercial License, allowing you to use       //
// this work in non-commercial and limited commercial products with a total   //
// gross revenue cap. To remove this commercial limit for one of your         //
// products, you must acquire a Full Commercial License.                      //
//                                                                            //
// If you contribute to the source code, documentation, or related materials, //
// you must grant me an exclusive license to these contributions.             //
// Contributions are governed by the "Contributions" section of the General   //
// License Agreement.                                                         //
//                                                                            //
// Copying the work in parts is strictly forbidden, except as permitted       //
// under the General License Agreement.                                       //
//                                                                            //
// If you do not or cannot agree to the terms of this Agreement,              //
// do not use this work.                                                      //
//                                                                            //
// This work is provided "as is", without any warranties, express or implied, //
// except where such disclaimers are legally invalid.                         //
//                                                                            //
// Copyright (c) 2024 Ilya Lakhin (Илья Александрович Лахин).                 //
// All rights reserved.                                                       //
////////////////////////////////////////////////////////////////////////////////

use std::{
    fmt::{Debug, Formatter},
    sync::Arc,
};

use crate::{
    collections::{
        native::{
            box_collection,
            satisfies_enumerable,
            unbox_enumerable,
            Backing,
            NativeCollection,
            NativeEnumerable,
            Ownership,
        },
        wrappers::EnumerableWrapper,
    },
    runtime::{
        Reflect,
        RuntimeResult,
        Shape,
        TypeDescriptor,
        TypeInfo,
        TypeInfoHint,
        Unboxed,
        Value,
    },
};

type Generator<T> = dyn Fn() -> Vec<T> + Send + Sync;

/// A lazily evaluated read-only sequence.
///
/// The LazyList produces its elements on every enumeration by calling the
/// generator function. Unboxing a LazyList always evaluates the sequence into
/// a new LazyList over the produced elements.
///
/// ```
/// use ad_astra_reflect::{collections::LazyList, runtime::Value};
///
/// let evens = LazyList::new(|| (0..5).map(|x| x * 2).collect());
///
/// let boxed = Value::give(evens).unwrap();
/// let object = boxed.object().unwrap();
/// let values = object.as_enumerable().unwrap().to_values().unwrap();
///
/// assert_eq!(values.len(), 5);
/// ```
pub struct LazyList<T> {
    backing: Arc<Backing<Arc<Generator<T>>>>,
}

impl<T> Clone for LazyList<T> {
    #[inline(always)]
    fn clone(&self) -> Self {
        Self {
            backing: self.backing.clone(),
        }
    }
}

impl<T> Debug for LazyList<T> {
    #[inline(always)]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("LazyList")
    }
}

impl<T> LazyList<T> {
    #[inline(always)]
    pub fn new(generator: impl Fn() -> Vec<T> + Send + Sync + 'static) -> Self {
        let generator: Arc<Generator<T>> = Arc::new(generator);

        Self {
            backing: Backing::new(generator),
        }
    }

    /// Produces the elements of the sequence.
    #[inline(always)]
    pub fn evaluate(&self) -> Vec<T> {
        let generator = self.backing.read().clone();

        generator()
    }
}

impl<T: Clone + Send + Sync + 'static> LazyList<T> {
    /// Creates a sequence that always produces copies of the `items`.
    #[inline(always)]
    pub fn from_vec(items: Vec<T>) -> Self {
        Self::new(move || items.clone())
    }
}

impl<T: Reflect + Clone> NativeCollection for LazyList<T> {
    type Storage = Arc<Generator<T>>;
    type Wrapper = EnumerableWrapper<Self>;

    #[inline(always)]
    fn backing(&self) -> &Arc<Backing<Self::Storage>> {
        &self.backing
    }

    #[inline(always)]
    fn from_backing(backing: Arc<Backing<Self::Storage>>) -> Self {
        Self { backing }
    }
}

impl<T: Reflect + Clone> NativeEnumerable for LazyList<T> {
    type Item = T;

    #[inline(always)]
    fn snapshot(&self) -> Vec<Self::Item> {
        self.evaluate()
    }

    #[inline(always)]
    fn from_items(items: Vec<Self::Item>) -> Self {
        Self::from_vec(items)
    }
}

impl<T: Reflect + Clone> Reflect for LazyList<T> {
    const SHAPE: Shape = Shape::ENUMERABLE;

    #[inline(always)]
    fn create_type_info() -> TypeInfo {
        TypeInfo::collection(
            Self::CATEGORY,
            TypeInfoHint::LazyList,
            vec![TypeInfo::of::<T>()],
        )
    }

    #[inline(always)]
    fn box_parameter(self, _descriptor: Option<&Arc<TypeDescriptor>>) -> RuntimeResult<Value> {
        Ok(box_collection(&self, Ownership::Give))
    }

    fn unbox_parameter(
        value: &Value,
        _descriptor: Option<&Arc<TypeDescriptor>>,
        name: Option<&str>,
    ) -> RuntimeResult<Unboxed<Self>> {
        match unbox_enumerable::<Self>(value, name)? {
            Unboxed::Alias(native) => Ok(Unboxed::Owned(Self::from_vec(native.evaluate()))),
            owned => Ok(owned),
        }
    }

    #[inline(always)]
    fn try_satisfies(value: &Value) -> bool {
        satisfies_enumerable(value)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use crate::{
        collections::{native::NativeCollection, LazyList, List},
        runtime::{RuntimeError, Value},
    };

    #[test]
    fn test_lazy_evaluation() {
        let calls = Arc::new(AtomicUsize::new(0));

        let lazy = {
            let calls = calls.clone();

            LazyList::new(move || {
                let _ = calls.fetch_add(1, Ordering::SeqCst);

                vec![1u16, 2, 3]
            })
        };

        let boxed = Value::give(lazy.clone()).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let object = boxed.object().unwrap();

        assert!(object.as_readonly_list().is_none());
        assert_eq!(object.as_enumerable().unwrap().to_values().unwrap().len(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let unboxed = boxed.unbox::<LazyList<u16>>().unwrap();

        assert!(unboxed.is_owned());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(unboxed.evaluate(), vec![1, 2, 3]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let list = boxed.unbox::<List<u16>>().unwrap();

        assert_eq!(list.to_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn test_lazy_enumerator_cursor() {
        let calls = Arc::new(AtomicUsize::new(0));

        let boxed = {
            let calls = calls.clone();

            Value::give(LazyList::new(move || {
                let _ = calls.fetch_add(1, Ordering::SeqCst);

                vec![String::from("a"), String::from("b")]
            }))
            .unwrap()
        };

        let object = boxed.object().unwrap();
        let mut enumerator = object.as_enumerable().unwrap().create_enumerator().unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(enumerator.current().is_none());

        assert!(enumerator.next().unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(enumerator.current().unwrap().unbox::<String>().unwrap().as_str(), "a");

        assert!(enumerator.next().unwrap());
        assert_eq!(enumerator.index(), 1);
        assert!(!enumerator.next().unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_lent_lazy_disposal() {
        let lazy = LazyList::from_vec(vec![1u8, 2]);

        let lent = lazy.lend();
        let object = lent.object().unwrap();
        let enumerable = object.as_enumerable().unwrap();

        let mut enumerator = enumerable.create_enumerator().unwrap();

        assert!(enumerator.next().unwrap());

        drop(lazy);

        assert!(matches!(
            enumerator.next(),
            Err(RuntimeError::ObjectDisposed { .. }),
        ));
        assert!(matches!(
            enumerable.to_values(),
            Err(RuntimeError::ObjectDisposed { .. }),
        ));
    }
}
