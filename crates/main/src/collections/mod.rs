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

//! Universal container interfaces and the native containers that implement
//! them.
//!
//! The reflection runtime never exposes a native Rust collection directly.
//! Instead, boxing a native container creates (or reuses) a thin wrapper
//! object that implements one of the universal interfaces over the container
//! without copying:
//!
//! | Category              | Interfaces                                              |
//! |-----------------------|---------------------------------------------------------|
//! | Enumerable            | [ValueEnumerable]                                       |
//! | ReadonlyList          | [ValueEnumerable], [ValueReadonlyList]                  |
//! | Array                 | [ValueEnumerable], [ValueReadonlyList], [ValueArray]    |
//! | List                  | [ValueEnumerable], [ValueReadonlyList], [ValueList]     |
//! | ObservableList        | List interfaces and [ValueObservableList]               |
//! | ReadonlyDictionary    | [ValueEnumerable], [ValueReadonlyDictionary]            |
//! | Dictionary            | ReadonlyDictionary interfaces and [ValueDictionary]     |
//!
//! The container's shared storage remembers the live wrapper, so boxing the
//! same container twice yields the same wrapper object while the first one
//! is in use.
//!
//! A container boxed by value (through [Value::give](crate::runtime::Value::give)
//! or as a function's result) is owned by its wrapper and stays valid for as
//! long as the Value exists. A container boxed by reference through
//! [lend](native::NativeCollection::lend) is referred to weakly: once every
//! native handle is dropped, operations on the wrapper fail with
//! [ObjectDisposed](crate::runtime::RuntimeError::ObjectDisposed).
//!
//! Custom containers implement the shape traits of the [native] module, name
//! their [wrapper](native::CollectionWrapper) type, and box themselves
//! through the [box_collection](native::box_collection) function with the
//! [NativeCollectionReference](crate::runtime::TypeInfoHint::NativeCollectionReference)
//! hint.

mod array;
mod dictionary;
mod interfaces;
mod lazy;
mod list;
pub mod native;
mod observable;
pub mod wrappers;

pub use crate::collections::{
    array::Array,
    dictionary::Dictionary,
    interfaces::{
        ItemChangedHandler,
        ValueArray,
        ValueDictionary,
        ValueEnumerable,
        ValueEnumerator,
        ValueList,
        ValueObservableList,
        ValueReadonlyDictionary,
        ValueReadonlyList,
    },
    lazy::LazyList,
    list::{List, SortedList},
    observable::{ObservableList, ObservableStorage},
};

#[cfg(test)]
mod tests {
    use std::{collections::VecDeque, sync::Arc};

    use crate::{
        collections::{
            native::{
                box_collection,
                satisfies_enumerable,
                unbox_enumerable,
                Backing,
                NativeCollection,
                NativeEnumerable,
                NativeList,
                NativeReadonlyList,
                Ownership,
            },
            wrappers::ListWrapper,
            List,
            ValueEnumerable,
            ValueEnumerator,
        },
        runtime::{
            error::fail,
            ObjectBase,
            Ptr,
            Reflect,
            Reflectable,
            RuntimeError,
            RuntimeResult,
            Shape,
            TypeCategory,
            TypeDescriptor,
            TypeInfo,
            TypeInfoHint,
            Unboxed,
            Value,
        },
    };

    #[derive(Clone)]
    struct Ring {
        backing: Arc<Backing<VecDeque<i32>>>,
    }

    impl std::fmt::Debug for Ring {
        fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.debug_list().entries(self.backing.read().iter()).finish()
        }
    }

    impl NativeCollection for Ring {
        type Storage = VecDeque<i32>;
        type Wrapper = ListWrapper<Self>;

        fn backing(&self) -> &Arc<Backing<Self::Storage>> {
            &self.backing
        }

        fn from_backing(backing: Arc<Backing<Self::Storage>>) -> Self {
            Self { backing }
        }
    }

    impl NativeEnumerable for Ring {
        type Item = i32;

        fn snapshot(&self) -> Vec<Self::Item> {
            self.backing.read().iter().copied().collect()
        }

        fn from_items(items: Vec<Self::Item>) -> Self {
            Self {
                backing: Backing::new(items.into()),
            }
        }
    }

    impl NativeReadonlyList for Ring {
        fn length(&self) -> usize {
            self.backing.read().len()
        }

        fn item(&self, index: usize) -> Option<Self::Item> {
            self.backing.read().get(index).copied()
        }
    }

    impl NativeList for Ring {
        fn replace(&self, index: usize, item: Self::Item) -> RuntimeResult<()> {
            let mut items = self.backing.write();
            let length = items.len();

            match items.get_mut(index) {
                Some(slot) => *slot = item,
                None => return fail(RuntimeError::OutOfBounds { index, length }),
            }

            Ok(())
        }

        fn append(&self, item: Self::Item) {
            self.backing.write().push_back(item);
        }

        fn insert_at(&self, index: usize, item: Self::Item) -> RuntimeResult<()> {
            self.backing.write().insert(index, item);

            Ok(())
        }

        fn remove_at(&self, index: usize) -> RuntimeResult<Self::Item> {
            let mut items = self.backing.write();
            let length = items.len();

            match items.remove(index) {
                Some(item) => Ok(item),
                None => fail(RuntimeError::OutOfBounds { index, length }),
            }
        }

        fn clear_items(&self) {
            self.backing.write().clear();
        }
    }

    impl Reflect for Ring {
        const SHAPE: Shape = Shape::LIST;

        fn create_type_info() -> TypeInfo {
            TypeInfo::collection(
                Self::CATEGORY,
                TypeInfoHint::NativeCollectionReference,
                vec![TypeInfo::of::<i32>()],
            )
        }

        fn box_parameter(self, _descriptor: Option<&Arc<TypeDescriptor>>) -> RuntimeResult<Value> {
            Ok(box_collection(&self, Ownership::Give))
        }

        fn unbox_parameter(
            value: &Value,
            _descriptor: Option<&Arc<TypeDescriptor>>,
            name: Option<&str>,
        ) -> RuntimeResult<Unboxed<Self>> {
            unbox_enumerable::<Self>(value, name)
        }

        fn try_satisfies(value: &Value) -> bool {
            satisfies_enumerable(value)
        }
    }

    #[test]
    fn test_custom_collection() {
        let ring = Ring::from_items(vec![1, 2]);

        assert_eq!(Ring::CATEGORY, TypeCategory::List);
        assert_eq!(
            TypeInfo::of::<Ring>().hint(),
            TypeInfoHint::NativeCollectionReference,
        );

        let boxed = Value::give(ring.clone()).unwrap();

        assert!(ring.backing().has_wrapper());
        assert_eq!(boxed, Value::give(ring.clone()).unwrap());

        boxed
            .object()
            .unwrap()
            .as_list()
            .unwrap()
            .add(Value::give(3).unwrap())
            .unwrap();

        assert_eq!(ring.snapshot(), vec![1, 2, 3]);

        let alias = boxed.unbox::<Ring>().unwrap();

        assert!(!alias.is_owned());
        assert!(alias.same(&ring));

        let list = boxed.unbox::<List<i32>>().unwrap();

        assert!(list.is_owned());
        assert_eq!(list.to_vec(), vec![1, 2, 3]);

        let back = Value::give(list.clone()).unwrap().unbox::<Ring>().unwrap();

        assert!(back.is_owned());
        assert!(!back.same(&ring));
        assert_eq!(back.snapshot(), vec![1, 2, 3]);
    }

    #[test]
    fn test_wrapper_release() {
        let ring = Ring::from_items(vec![1]);

        let boxed = Value::give(ring.clone()).unwrap();

        assert!(ring.backing().has_wrapper());

        drop(boxed);

        assert!(!ring.backing().has_wrapper());

        let lent = ring.lend();

        assert!(ring.backing().has_wrapper());
        assert_eq!(lent, ring.lend());

        drop(ring);

        assert!(matches!(
            lent.object().unwrap().as_readonly_list().unwrap().count(),
            Err(RuntimeError::ObjectDisposed { .. }),
        ));
    }

    #[derive(Default)]
    struct Stuttering {
        object: ObjectBase,
    }

    impl Reflectable for Stuttering {
        fn object(&self) -> &ObjectBase {
            &self.object
        }

        fn as_enumerable(&self) -> Option<&dyn ValueEnumerable> {
            Some(self)
        }
    }

    impl ValueEnumerable for Stuttering {
        fn create_enumerator(&self) -> RuntimeResult<Box<dyn ValueEnumerator>> {
            Ok(Box::new(StutteringEnumerator { position: 0 }))
        }
    }

    // Yields one element, then advances without providing the next one.
    struct StutteringEnumerator {
        position: usize,
    }

    impl ValueEnumerator for StutteringEnumerator {
        fn current(&self) -> Option<Value> {
            match self.position {
                1 => Some(Value::give(7i32).unwrap()),
                _ => None,
            }
        }

        fn index(&self) -> usize {
            self.position.saturating_sub(1)
        }

        fn next(&mut self) -> RuntimeResult<bool> {
            self.position += 1;

            Ok(self.position <= 2)
        }
    }

    #[test]
    fn test_enumerator_without_current() {
        let boxed = Value::from_ptr(Ptr::new(Stuttering::default()));

        match boxed.unbox::<List<i32>>() {
            Err(RuntimeError::EnumeratorOutOfRange { index }) => assert_eq!(index, 1),
            other => panic!("unexpected result: {other:?}"),
        }

        match boxed.object().unwrap().as_enumerable().unwrap().to_values() {
            Err(RuntimeError::EnumeratorOutOfRange { index }) => assert_eq!(index, 1),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
