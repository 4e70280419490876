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

use std::sync::Arc;

use crate::runtime::{error::fail, RuntimeError, RuntimeResult, Value};

/// A forward-only cursor over the elements of a [ValueEnumerable].
///
/// A new enumerator is positioned before the first element. Each call of
/// [next](ValueEnumerator::next) advances the cursor.
pub trait ValueEnumerator: Send + Sync {
    /// Returns the element under the cursor, or None if the cursor is not
    /// positioned on an element.
    fn current(&self) -> Option<Value>;

    /// Returns the index of the element under the cursor.
    fn index(&self) -> usize;

    /// Advances the cursor to the next element. Returns false if there are no
    /// more elements.
    fn next(&mut self) -> RuntimeResult<bool>;
}

/// The universal interface of the collections that can be enumerated.
pub trait ValueEnumerable: Send + Sync {
    /// Creates a new cursor over the collection's elements.
    ///
    /// Fails with [ObjectDisposed](crate::runtime::RuntimeError::ObjectDisposed)
    /// if the underlying native collection no longer exists.
    fn create_enumerator(&self) -> RuntimeResult<Box<dyn ValueEnumerator>>;

    /// Collects all elements in enumeration order.
    ///
    /// Fails with
    /// [EnumeratorOutOfRange](crate::runtime::RuntimeError::EnumeratorOutOfRange)
    /// if the enumerator advances without providing the current element.
    fn to_values(&self) -> RuntimeResult<Vec<Value>> {
        let mut enumerator = self.create_enumerator()?;
        let mut result = Vec::new();

        while enumerator.next()? {
            let Some(value) = enumerator.current() else {
                return fail(RuntimeError::EnumeratorOutOfRange {
                    index: enumerator.index(),
                });
            };

            result.push(value);
        }

        Ok(result)
    }
}

/// The universal interface of the indexed read-only collections.
pub trait ValueReadonlyList: Send + Sync {
    fn count(&self) -> RuntimeResult<usize>;

    /// Fails with [OutOfBounds](crate::runtime::RuntimeError::OutOfBounds) if
    /// the index is not less than the count.
    fn get(&self, index: usize) -> RuntimeResult<Value>;

    fn contains(&self, item: &Value) -> RuntimeResult<bool> {
        Ok(self.index_of(item)?.is_some())
    }

    fn index_of(&self, item: &Value) -> RuntimeResult<Option<usize>>;
}

/// The universal interface of the resizable fixed-order collections.
pub trait ValueArray: Send + Sync {
    fn set(&self, index: usize, item: Value) -> RuntimeResult<()>;

    /// Changes the number of the elements. New elements are default
    /// initialized.
    fn resize(&self, length: usize) -> RuntimeResult<()>;
}

/// The universal interface of the mutable lists.
pub trait ValueList: Send + Sync {
    fn set(&self, index: usize, item: Value) -> RuntimeResult<()>;

    /// Appends the item to the end of the list.
    fn add(&self, item: Value) -> RuntimeResult<()>;

    fn insert(&self, index: usize, item: Value) -> RuntimeResult<()>;

    /// Removes the item at the index and returns it.
    fn remove(&self, index: usize) -> RuntimeResult<Value>;

    fn clear(&self) -> RuntimeResult<()>;
}

/// A handler of the observable list changes.
///
/// The arguments are the start index of the change, the number of the
/// replaced (old) items, and the number of the new items at this index.
pub type ItemChangedHandler = Arc<dyn Fn(usize, usize, usize) + Send + Sync>;

/// The universal interface of the lists that notify subscribers about every
/// structural change.
pub trait ValueObservableList: Send + Sync {
    /// Subscribes the handler and returns the subscription identifier.
    fn subscribe(&self, handler: ItemChangedHandler) -> RuntimeResult<usize>;

    /// Cancels the subscription. Returns false if there is no such
    /// subscription.
    fn unsubscribe(&self, subscription: usize) -> RuntimeResult<bool>;
}

/// The universal interface of the read-only key-value collections.
pub trait ValueReadonlyDictionary: Send + Sync {
    fn count(&self) -> RuntimeResult<usize>;

    fn keys(&self) -> RuntimeResult<Vec<Value>>;

    fn values(&self) -> RuntimeResult<Vec<Value>>;

    /// Fails with [KeyNotFound](crate::runtime::RuntimeError::KeyNotFound) if
    /// there is no such key.
    fn get(&self, key: &Value) -> RuntimeResult<Value>;

    fn contains_key(&self, key: &Value) -> RuntimeResult<bool>;
}

/// The universal interface of the mutable key-value collections.
pub trait ValueDictionary: Send + Sync {
    /// Inserts or replaces the entry.
    fn set(&self, key: Value, value: Value) -> RuntimeResult<()>;

    /// Removes the entry. Returns false if there is no such key.
    fn remove(&self, key: &Value) -> RuntimeResult<bool>;

    fn clear(&self) -> RuntimeResult<()>;
}
