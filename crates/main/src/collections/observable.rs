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
            NativeObservableList,
            NativeReadonlyList,
            Ownership,
        },
        wrappers::ObservableListWrapper,
        ItemChangedHandler,
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

/// The storage of the [ObservableList].
pub struct ObservableStorage<T> {
    items: Vec<T>,
    subscribers: Vec<(usize, ItemChangedHandler)>,
    next_subscription: usize,
}

/// A list that notifies subscribers about every structural change.
///
/// Each handler receives the start index of the change, the number of the
/// replaced items, and the number of the new items. The handlers are called
/// after the change is applied, outside of the list's lock, so a handler may
/// read the list.
///
/// | Operation | Notification                      |
/// |-----------|-----------------------------------|
/// | push      | `(length, 0, 1)`                  |
/// | insert    | `(index, 0, 1)`                   |
/// | remove    | `(index, 1, 0)`                   |
/// | set       | `(index, 1, 1)`                   |
/// | clear     | `(0, length, 0)`                  |
pub struct ObservableList<T> {
    backing: Arc<Backing<ObservableStorage<T>>>,
}

impl<T> Clone for ObservableList<T> {
    #[inline(always)]
    fn clone(&self) -> Self {
        Self {
            backing: self.backing.clone(),
        }
    }
}

impl<T: Debug> Debug for ObservableList<T> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_list()
            .entries(self.backing.read().items.iter())
            .finish()
    }
}

impl<T> Default for ObservableList<T> {
    #[inline(always)]
    fn default() -> Self {
        Self::from_vec(Vec::new())
    }
}

impl<T> ObservableList<T> {
    #[inline(always)]
    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            backing: Backing::new(ObservableStorage {
                items,
                subscribers: Vec::new(),
                next_subscription: 0,
            }),
        }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.backing.read().items.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.backing.read().items.is_empty()
    }

    pub fn push(&self, item: T) {
        let (index, handlers) = {
            let mut storage = self.backing.write();

            storage.items.push(item);

            (storage.items.len() - 1, collect_handlers(&storage))
        };

        notify(handlers, index, 0, 1);
    }

    pub fn insert(&self, index: usize, item: T) -> RuntimeResult<()> {
        let handlers = {
            let mut storage = self.backing.write();
            let length = storage.items.len();

            if index > length {
                return fail(RuntimeError::OutOfBounds { index, length });
            }

            storage.items.insert(index, item);

            collect_handlers(&storage)
        };

        notify(handlers, index, 0, 1);

        Ok(())
    }

    pub fn remove(&self, index: usize) -> RuntimeResult<T> {
        let (item, handlers) = {
            let mut storage = self.backing.write();
            let length = storage.items.len();

            if index >= length {
                return fail(RuntimeError::OutOfBounds { index, length });
            }

            (storage.items.remove(index), collect_handlers(&storage))
        };

        notify(handlers, index, 1, 0);

        Ok(item)
    }

    pub fn set(&self, index: usize, item: T) -> RuntimeResult<()> {
        let handlers = {
            let mut storage = self.backing.write();
            let length = storage.items.len();

            match storage.items.get_mut(index) {
                Some(slot) => *slot = item,
                None => return fail(RuntimeError::OutOfBounds { index, length }),
            }

            collect_handlers(&storage)
        };

        notify(handlers, index, 1, 1);

        Ok(())
    }

    pub fn clear(&self) {
        let (length, handlers) = {
            let mut storage = self.backing.write();
            let length = storage.items.len();

            storage.items.clear();

            (length, collect_handlers(&storage))
        };

        notify(handlers, 0, length, 0);
    }

    /// Subscribes the handler to the list changes. Returns the subscription
    /// identifier.
    pub fn subscribe(&self, handler: impl Fn(usize, usize, usize) + Send + Sync + 'static) -> usize {
        self.subscribe_handler(Arc::new(handler))
    }

    pub fn unsubscribe(&self, subscription: usize) -> bool {
        let mut storage = self.backing.write();
        let before = storage.subscribers.len();

        storage.subscribers.retain(|(id, _)| *id != subscription);

        storage.subscribers.len() != before
    }

    #[inline(always)]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.backing, &other.backing)
    }

    fn subscribe_handler(&self, handler: ItemChangedHandler) -> usize {
        let mut storage = self.backing.write();
        let subscription = storage.next_subscription;

        storage.next_subscription += 1;
        storage.subscribers.push((subscription, handler));

        subscription
    }
}

impl<T: Clone> ObservableList<T> {
    #[inline(always)]
    pub fn get(&self, index: usize) -> Option<T> {
        self.backing.read().items.get(index).cloned()
    }

    #[inline(always)]
    pub fn to_vec(&self) -> Vec<T> {
        self.backing.read().items.clone()
    }
}

#[inline(always)]
fn collect_handlers<T>(storage: &ObservableStorage<T>) -> Vec<ItemChangedHandler> {
    storage
        .subscribers
        .iter()
        .map(|(_, handler)| handler.clone())
        .collect()
}

#[inline(always)]
fn notify(handlers: Vec<ItemChangedHandler>, index: usize, replaced: usize, inserted: usize) {
    for handler in handlers {
        handler(index, replaced, inserted);
    }
}

impl<T: Reflect + Clone> NativeCollection for ObservableList<T> {
    type Storage = ObservableStorage<T>;
    type Wrapper = ObservableListWrapper<Self>;

    #[inline(always)]
    fn backing(&self) -> &Arc<Backing<Self::Storage>> {
        &self.backing
    }

    #[inline(always)]
    fn from_backing(backing: Arc<Backing<Self::Storage>>) -> Self {
        Self { backing }
    }
}

impl<T: Reflect + Clone> NativeEnumerable for ObservableList<T> {
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

impl<T: Reflect + Clone> NativeReadonlyList for ObservableList<T> {
    #[inline(always)]
    fn length(&self) -> usize {
        self.len()
    }

    #[inline(always)]
    fn item(&self, index: usize) -> Option<Self::Item> {
        self.get(index)
    }
}

impl<T: Reflect + Clone> NativeList for ObservableList<T> {
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

impl<T: Reflect + Clone> NativeObservableList for ObservableList<T> {
    #[inline(always)]
    fn subscribe(&self, handler: ItemChangedHandler) -> usize {
        self.subscribe_handler(handler)
    }

    #[inline(always)]
    fn unsubscribe(&self, subscription: usize) -> bool {
        ObservableList::unsubscribe(self, subscription)
    }
}

impl<T: Reflect + Clone> Reflect for ObservableList<T> {
    const SHAPE: Shape = Shape::OBSERVABLE_LIST;

    #[inline(always)]
    fn create_type_info() -> TypeInfo {
        TypeInfo::collection(
            Self::CATEGORY,
            TypeInfoHint::ObservableList,
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
    use std::sync::{Arc, Mutex};

    use crate::{
        collections::ObservableList,
        runtime::{TypeCategory, Value},
    };

    #[test]
    fn test_observable_notifications() {
        let list = ObservableList::from_vec(vec![1i32, 2]);
        let log = Arc::new(Mutex::new(Vec::new()));

        let subscription = {
            let log = log.clone();

            list.subscribe(move |index, replaced, inserted| {
                log.lock().unwrap().push((index, replaced, inserted));
            })
        };

        list.push(3);
        list.insert(0, 0).unwrap();
        list.set(1, 10).unwrap();
        let _ = list.remove(2).unwrap();
        assert!(list.insert(10, 0).is_err());
        list.clear();

        assert_eq!(
            log.lock().unwrap().as_slice(),
            &[(2, 0, 1), (0, 0, 1), (1, 1, 1), (2, 1, 0), (0, 3, 0)],
        );

        assert!(list.unsubscribe(subscription));
        assert!(!list.unsubscribe(subscription));

        list.push(1);

        assert_eq!(log.lock().unwrap().len(), 5);
    }

    #[test]
    fn test_observable_interface() {
        let list = ObservableList::from_vec(vec![String::from("a")]);
        let boxed = Value::give(list.clone()).unwrap();
        let object = boxed.object().unwrap();

        assert_eq!(crate::runtime::capability_category(&*object), TypeCategory::ObservableList);

        let changes = Arc::new(Mutex::new(Vec::new()));

        let subscription = {
            let changes = changes.clone();

            object
                .as_observable_list()
                .unwrap()
                .subscribe(Arc::new(move |index: usize, replaced: usize, inserted: usize| {
                    changes.lock().unwrap().push((index, replaced, inserted));
                }))
                .unwrap()
        };

        object
            .as_list()
            .unwrap()
            .add(Value::give(String::from("b")).unwrap())
            .unwrap();

        assert_eq!(list.to_vec(), ["a", "b"]);
        assert_eq!(changes.lock().unwrap().as_slice(), &[(1, 0, 1)]);

        assert!(object
            .as_observable_list()
            .unwrap()
            .unsubscribe(subscription)
            .unwrap());

        let alias = boxed.unbox::<ObservableList<String>>().unwrap();

        assert!(ObservableList::ptr_eq(&list, &alias));
    }
}
