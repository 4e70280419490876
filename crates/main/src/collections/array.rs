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
            NativeArray,
            NativeCollection,
            NativeEnumerable,
            NativeReadonlyList,
            Ownership,
        },
        wrappers::ArrayWrapper,
    },
    runtime::{
        error::fail,
        Reflect,
        RuntimeError,
        RuntimeResult,
        Shape,
        TypeDescriptor,
        TypeInfo,
        TypeInfoHint,
        Unboxed,
        Value,
    },
};

/// A fixed-order resizable array with reference semantics.
///
/// Unlike the [List](crate::collections::List), the Array does not support
/// insertion and removal of individual elements, but it can be resized. New
/// elements are default-initialized.
pub struct Array<T> {
    backing: Arc<Backing<Vec<T>>>,
}

impl<T> Clone for Array<T> {
    #[inline(always)]
    fn clone(&self) -> Self {
        Self {
            backing: self.backing.clone(),
        }
    }
}

impl<T: Debug> Debug for Array<T> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.debug_list().entries(self.backing.read().iter()).finish()
    }
}

impl<T: Default + Clone> Array<T> {
    /// Creates an array of `length` default elements.
    #[inline(always)]
    pub fn new(length: usize) -> Self {
        Self::from_vec(vec![T::default(); length])
    }

    #[inline(always)]
    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            backing: Backing::new(items),
        }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.backing.read().len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.backing.read().is_empty()
    }

    #[inline(always)]
    pub fn get(&self, index: usize) -> Option<T> {
        self.backing.read().get(index).cloned()
    }

    pub fn set(&self, index: usize, item: T) -> RuntimeResult<()> {
        let mut items = self.backing.write();
        let length = items.len();

        match items.get_mut(index) {
            Some(slot) => {
                *slot = item;
                Ok(())
            }

            None => fail(RuntimeError::OutOfBounds { index, length }),
        }
    }

    #[inline(always)]
    pub fn resize(&self, length: usize) {
        self.backing.write().resize(length, T::default());
    }

    #[inline(always)]
    pub fn to_vec(&self) -> Vec<T> {
        self.backing.read().clone()
    }

    #[inline(always)]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.backing, &other.backing)
    }
}

impl<T: Reflect + Default + Clone> NativeCollection for Array<T> {
    type Storage = Vec<T>;
    type Wrapper = ArrayWrapper<Self>;

    #[inline(always)]
    fn backing(&self) -> &Arc<Backing<Self::Storage>> {
        &self.backing
    }

    #[inline(always)]
    fn from_backing(backing: Arc<Backing<Self::Storage>>) -> Self {
        Self { backing }
    }
}

impl<T: Reflect + Default + Clone> NativeEnumerable for Array<T> {
    type Item = T;

    #[inline(always)]
    fn snapshot(&self) -> Vec<Self::Item> {
        self.to_vec()
    }

    #[inline(always)]
    fn from_items(items: Vec<Self::Item>) -> Self {
        Self::from_vec(items)
    }
}

impl<T: Reflect + Default + Clone> NativeReadonlyList for Array<T> {
    #[inline(always)]
    fn length(&self) -> usize {
        self.len()
    }

    #[inline(always)]
    fn item(&self, index: usize) -> Option<Self::Item> {
        self.get(index)
    }
}

impl<T: Reflect + Default + Clone> NativeArray for Array<T> {
    #[inline(always)]
    fn store(&self, index: usize, item: Self::Item) -> RuntimeResult<()> {
        self.set(index, item)
    }

    #[inline(always)]
    fn resize(&self, length: usize) {
        Array::resize(self, length)
    }
}

impl<T: Reflect + Default + Clone> Reflect for Array<T> {
    const SHAPE: Shape = Shape::ARRAY;

    #[inline(always)]
    fn create_type_info() -> TypeInfo {
        TypeInfo::collection(
            Self::CATEGORY,
            TypeInfoHint::Array,
            vec![TypeInfo::of::<T>()],
        )
    }

    #[inline(always)]
    fn box_parameter(self, _descriptor: Option<&Arc<TypeDescriptor>>) -> RuntimeResult<Value> {
        Ok(box_collection(&self, Ownership::Give))
    }

    #[inline(always)]
    fn unbox_parameter(
        value: &Value,
        _descriptor: Option<&Arc<TypeDescriptor>>,
        name: Option<&str>,
    ) -> RuntimeResult<Unboxed<Self>> {
        unbox_enumerable::<Self>(value, name)
    }

    #[inline(always)]
    fn try_satisfies(value: &Value) -> bool {
        satisfies_enumerable(value)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        collections::{Array, List},
        runtime::{RuntimeError, TypeCategory, Value},
    };

    #[test]
    fn test_array_interface() {
        let array = Array::<f64>::new(2);
        let boxed = Value::give(array.clone()).unwrap();
        let object = boxed.object().unwrap();

        assert!(object.as_list().is_none());

        let interface = object.as_array().unwrap();

        interface.set(1, Value::give(2.5f64).unwrap()).unwrap();
        interface.resize(3).unwrap();

        assert_eq!(array.to_vec(), vec![0.0, 2.5, 0.0]);

        match interface.set(5, Value::give(1.0f64).unwrap()) {
            Err(RuntimeError::OutOfBounds { index, length }) => {
                assert_eq!(index, 5);
                assert_eq!(length, 3);
            }

            other => panic!("unexpected result: {other:?}"),
        }

        assert!(interface.set(0, Value::give(1i32).unwrap()).is_err());
        assert_eq!(boxed.type_name(), "Array");
    }

    #[test]
    fn test_array_from_list() {
        let list = List::from_vec(vec![true, false]);
        let boxed = Value::give(list.clone()).unwrap();

        let array = boxed.unbox::<Array<bool>>().unwrap();

        assert!(array.is_owned());
        assert_eq!(array.to_vec(), vec![true, false]);
        assert_eq!(<Array<bool> as crate::runtime::Reflect>::CATEGORY, TypeCategory::Array);
    }
}
