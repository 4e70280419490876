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
            NativeList,
            NativeReadonlyList,
            Ownership,
        },
        wrappers::{ListWrapper, ReadonlyListWrapper},
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

/// A growable list with reference semantics.
///
/// Clones of the List share the same elements. Boxing the List wraps it into
/// a [ValueList](crate::collections::ValueList) object without copying, and
/// unboxing the wrapper back into a `List<T>` of the same element type
/// returns an alias of the original List.
///
/// ```
/// use ad_astra_reflect::{collections::List, runtime::Value};
///
/// let list = List::from_vec(vec![1, 2, 3]);
///
/// let boxed = Value::give(list.clone()).unwrap();
/// let alias = boxed.unbox::<List<i32>>().unwrap();
///
/// alias.push(4);
///
/// assert_eq!(list.to_vec(), vec![1, 2, 3, 4]);
/// ```
pub struct List<T> {
    backing: Arc<Backing<Vec<T>>>,
}

impl<T> Clone for List<T> {
    #[inline(always)]
    fn clone(&self) -> Self {
        Self {
            backing: self.backing.clone(),
        }
    }
}

impl<T: Debug> Debug for List<T> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.debug_list().entries(self.backing.read().iter()).finish()
    }
}

impl<T> Default for List<T> {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> List<T> {
    #[inline(always)]
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
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
    pub fn push(&self, item: T) {
        self.backing.write().push(item);
    }

    /// Inserts the item at the index.
    ///
    /// Fails with [RuntimeError::OutOfBounds] if the index is greater than the
    /// list's length.
    pub fn insert(&self, index: usize, item: T) -> RuntimeResult<()> {
        let mut items = self.backing.write();

        if index > items.len() {
            return fail(RuntimeError::OutOfBounds {
                index,
                length: items.len(),
            });
        }

        items.insert(index, item);

        Ok(())
    }

    /// Removes the item at the index and returns it.
    pub fn remove(&self, index: usize) -> RuntimeResult<T> {
        let mut items = self.backing.write();

        if index >= items.len() {
            return fail(RuntimeError::OutOfBounds {
                index,
                length: items.len(),
            });
        }

        Ok(items.remove(index))
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
    pub fn clear(&self) {
        self.backing.write().clear();
    }

    /// Returns true if both handles refer to the same list.
    #[inline(always)]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.backing, &other.backing)
    }
}

impl<T: Clone> List<T> {
    #[inline(always)]
    pub fn get(&self, index: usize) -> Option<T> {
        self.backing.read().get(index).cloned()
    }

    /// Returns a copy of the list's elements.
    #[inline(always)]
    pub fn to_vec(&self) -> Vec<T> {
        self.backing.read().clone()
    }
}

impl<T: PartialEq> List<T> {
    #[inline(always)]
    pub fn contains(&self, item: &T) -> bool {
        self.backing.read().contains(item)
    }

    #[inline(always)]
    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.backing.read().iter().position(|candidate| candidate == item)
    }
}

impl<T: Reflect + Clone> NativeCollection for List<T> {
    type Storage = Vec<T>;
    type Wrapper = ListWrapper<Self>;

    #[inline(always)]
    fn backing(&self) -> &Arc<Backing<Self::Storage>> {
        &self.backing
    }

    #[inline(always)]
    fn from_backing(backing: Arc<Backing<Self::Storage>>) -> Self {
        Self { backing }
    }
}

impl<T: Reflect + Clone> NativeEnumerable for List<T> {
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

impl<T: Reflect + Clone> NativeReadonlyList for List<T> {
    #[inline(always)]
    fn length(&self) -> usize {
        self.len()
    }

    #[inline(always)]
    fn item(&self, index: usize) -> Option<Self::Item> {
        self.get(index)
    }
}

impl<T: Reflect + Clone> NativeList for List<T> {
    #[inline(always)]
    fn replace(&self, index: usize, item: Self::Item) -> RuntimeResult<()> {
        self.set(index, item)
    }

    #[inline(always)]
    fn append(&self, item: Self::Item) {
        self.push(item)
    }

    #[inline(always)]
    fn insert_at(&self, index: usize, item: Self::Item) -> RuntimeResult<()> {
        self.insert(index, item)
    }

    #[inline(always)]
    fn remove_at(&self, index: usize) -> RuntimeResult<Self::Item> {
        self.remove(index)
    }

    #[inline(always)]
    fn clear_items(&self) {
        self.clear()
    }
}

impl<T: Reflect + Clone> Reflect for List<T> {
    const SHAPE: Shape = Shape::LIST;

    #[inline(always)]
    fn create_type_info() -> TypeInfo {
        TypeInfo::collection(Self::CATEGORY, TypeInfoHint::List, vec![TypeInfo::of::<T>()])
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

/// A list that keeps its elements in ascending order.
///
/// The SortedList is exposed to the reflection runtime as a read-only list,
/// and it is always copied when unboxed from a foreign collection.
pub struct SortedList<T> {
    backing: Arc<Backing<Vec<T>>>,
}

impl<T> Clone for SortedList<T> {
    #[inline(always)]
    fn clone(&self) -> Self {
        Self {
            backing: self.backing.clone(),
        }
    }
}

impl<T: Debug> Debug for SortedList<T> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.debug_list().entries(self.backing.read().iter()).finish()
    }
}

impl<T: PartialOrd> Default for SortedList<T> {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PartialOrd> SortedList<T> {
    #[inline(always)]
    pub fn new() -> Self {
        Self {
            backing: Backing::new(Vec::new()),
        }
    }

    pub fn from_vec(mut items: Vec<T>) -> Self {
        items.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        Self {
            backing: Backing::new(items),
        }
    }

    /// Inserts the item keeping the order. Returns the item's index.
    pub fn insert(&self, item: T) -> usize {
        let mut items = self.backing.write();
        let index = items.partition_point(|candidate| candidate <= &item);

        items.insert(index, item);

        index
    }

    /// Removes the first item equal to the `item`. Returns false if there is
    /// no such item.
    pub fn remove(&self, item: &T) -> bool {
        let mut items = self.backing.write();

        match items.iter().position(|candidate| candidate == item) {
            Some(index) => {
                let _ = items.remove(index);
                true
            }

            None => false,
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
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.backing, &other.backing)
    }
}

impl<T: Clone> SortedList<T> {
    #[inline(always)]
    pub fn get(&self, index: usize) -> Option<T> {
        self.backing.read().get(index).cloned()
    }

    #[inline(always)]
    pub fn to_vec(&self) -> Vec<T> {
        self.backing.read().clone()
    }
}

impl<T: Reflect + Clone + PartialOrd> NativeCollection for SortedList<T> {
    type Storage = Vec<T>;
    type Wrapper = ReadonlyListWrapper<Self>;

    #[inline(always)]
    fn backing(&self) -> &Arc<Backing<Self::Storage>> {
        &self.backing
    }

    #[inline(always)]
    fn from_backing(backing: Arc<Backing<Self::Storage>>) -> Self {
        Self { backing }
    }
}

impl<T: Reflect + Clone + PartialOrd> NativeEnumerable for SortedList<T> {
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

impl<T: Reflect + Clone + PartialOrd> NativeReadonlyList for SortedList<T> {
    #[inline(always)]
    fn length(&self) -> usize {
        self.len()
    }

    #[inline(always)]
    fn item(&self, index: usize) -> Option<Self::Item> {
        self.get(index)
    }
}

impl<T: Reflect + Clone + PartialOrd> Reflect for SortedList<T> {
    const SHAPE: Shape = Shape::READONLY_LIST;

    #[inline(always)]
    fn create_type_info() -> TypeInfo {
        TypeInfo::collection(
            Self::CATEGORY,
            TypeInfoHint::SortedList,
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
        collections::{native::NativeCollection, List, SortedList},
        runtime::{invoke_function, RuntimeError, Value},
    };

    #[test]
    fn test_list_aliasing() {
        let list = List::from_vec(vec![10, 20, 30]);
        let boxed = Value::give(list.clone()).unwrap();

        let alias = boxed.unbox::<List<i32>>().unwrap();

        assert!(!alias.is_owned());
        assert!(List::ptr_eq(&list, &alias));

        alias.set(1, 25).unwrap();

        assert_eq!(list.to_vec(), vec![10, 25, 30]);

        let copy = boxed.unbox::<SortedList<i32>>().unwrap();

        assert!(copy.is_owned());
        assert_eq!(copy.to_vec(), vec![10, 25, 30]);

        list.push(5);

        assert_eq!(copy.len(), 3);

        let widened = boxed.unbox::<List<i64>>();

        match widened {
            Err(RuntimeError::TypeMismatch { name, .. }) => {
                assert_eq!(name.as_deref(), Some("value"));
            }

            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_list_interface() {
        let list = List::from_vec(vec![String::from("a"), String::from("b")]);
        let boxed = Value::give(list.clone()).unwrap();
        let object = boxed.object().unwrap();

        let readonly = object.as_readonly_list().unwrap();
        let mutable = object.as_list().unwrap();

        assert!(object.as_array().is_none());
        assert_eq!(readonly.count().unwrap(), 2);

        mutable.add(Value::give(String::from("c")).unwrap()).unwrap();
        mutable.insert(0, Value::give(String::from("z")).unwrap()).unwrap();

        assert_eq!(list.to_vec(), ["z", "a", "b", "c"]);

        let removed = mutable.remove(1).unwrap();

        assert_eq!(removed.unbox::<String>().unwrap().as_str(), "a");

        let needle = Value::give(String::from("c")).unwrap();

        assert_eq!(readonly.index_of(&needle).unwrap(), Some(2));
        assert!(!readonly.contains(&Value::give(1i32).unwrap()).unwrap());

        match readonly.get(10) {
            Err(RuntimeError::OutOfBounds { index, length }) => {
                assert_eq!(index, 10);
                assert_eq!(length, 3);
            }

            other => panic!("unexpected result: {other:?}"),
        }

        let values = object.as_enumerable().unwrap().to_values().unwrap();

        assert_eq!(values.len(), 3);
        assert_eq!(values[0].unbox::<String>().unwrap().as_str(), "z");

        mutable.clear().unwrap();

        assert!(list.is_empty());
    }

    #[test]
    fn test_wrapper_caching() {
        let list = List::from_vec(vec![1u8, 2, 3]);

        let first = Value::give(list.clone()).unwrap();
        let second = Value::give(list.clone()).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, list.lend());

        drop(list);

        let enumerable = first.object().unwrap();
        let values = enumerable.as_enumerable().unwrap().to_values().unwrap();

        assert_eq!(values.len(), 3);
        assert_eq!(first.unbox::<List<u8>>().unwrap().to_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn test_lent_list_disposal() {
        let list = List::from_vec(vec![1u8, 2, 3]);

        let lent = list.lend();
        let enumerable = lent.object().unwrap();

        let mut enumerator = enumerable
            .as_enumerable()
            .unwrap()
            .create_enumerator()
            .unwrap();

        assert!(enumerator.next().unwrap());
        assert_eq!(enumerator.index(), 0);
        assert_eq!(*enumerator.current().unwrap().unbox::<u8>().unwrap(), 1);

        drop(list);

        match enumerable.as_enumerable().unwrap().create_enumerator() {
            Err(RuntimeError::ObjectDisposed { .. }) => (),
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("enumerator created over disposed collection"),
        }

        assert!(matches!(
            enumerator.next(),
            Err(RuntimeError::ObjectDisposed { .. }),
        ));

        assert!(matches!(
            lent.unbox::<List<u8>>(),
            Err(RuntimeError::ObjectDisposed { .. }),
        ));
    }

    #[test]
    fn test_function_returning_list() {
        let make = || List::from_vec(vec![1i32, 2, 3]);

        let result = invoke_function(&make, &[]).unwrap();
        let object = result.object().unwrap();

        let values = object.as_enumerable().unwrap().to_values().unwrap();

        assert_eq!(values.len(), 3);
        assert_eq!(*values[2].unbox::<i32>().unwrap(), 3);
        assert_eq!(object.as_readonly_list().unwrap().count().unwrap(), 3);

        object.as_list().unwrap().add(Value::give(4).unwrap()).unwrap();

        assert_eq!(result.unbox::<List<i32>>().unwrap().to_vec(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_sorted_list() {
        let sorted = SortedList::from_vec(vec![3, 1, 2]);

        assert_eq!(sorted.insert(0), 0);
        assert_eq!(sorted.insert(2), 3);
        assert!(sorted.remove(&3));
        assert!(!sorted.remove(&7));
        assert_eq!(sorted.to_vec(), vec![0, 1, 2, 2]);

        let boxed = Value::give(sorted.clone()).unwrap();
        let object = boxed.object().unwrap();

        assert!(object.as_readonly_list().is_some());
        assert!(object.as_list().is_none());

        let list = boxed.unbox::<List<i32>>().unwrap();

        assert!(list.is_owned());
        assert_eq!(list.to_vec(), vec![0, 1, 2, 2]);
    }
}
