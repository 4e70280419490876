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
    any::type_name,
    sync::{Arc, Mutex, OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak},
};

use compact_str::CompactString;
use log::trace;

use crate::{
    collections::ItemChangedHandler,
    runtime::{
        error::{fail, type_mismatch},
        Ptr,
        Reflect,
        Reflectable,
        RuntimeError,
        RuntimeResult,
        TypeInfo,
        Unboxed,
        Value,
    },
};

/// A shared storage of a native collection.
///
/// All handles of the same native collection share one backing. Besides the
/// collection's data, the backing remembers the collection's live wrapper
/// object, so that boxing the same collection twice produces the same
/// wrapper while the first one is still in use.
pub struct Backing<S> {
    storage: RwLock<S>,
    wrapper: Mutex<Option<Weak<dyn Reflectable>>>,
}

impl<S> Backing<S> {
    #[inline(always)]
    pub fn new(storage: S) -> Arc<Self> {
        Arc::new(Self {
            storage: RwLock::new(storage),
            wrapper: Mutex::new(None),
        })
    }

    #[inline(always)]
    pub fn read(&self) -> RwLockReadGuard<'_, S> {
        self.storage
            .read()
            .unwrap_or_else(|poison| poison.into_inner())
    }

    #[inline(always)]
    pub fn write(&self) -> RwLockWriteGuard<'_, S> {
        self.storage
            .write()
            .unwrap_or_else(|poison| poison.into_inner())
    }

    /// Returns true if the collection currently has a live wrapper object.
    #[inline]
    pub fn has_wrapper(&self) -> bool {
        let slot = self
            .wrapper
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());

        live_wrapper(slot.as_ref()).is_some()
    }
}

/// A handle to a native collection with reference semantics.
///
/// Cloning the handle shares the collection's [Backing].
pub trait NativeCollection: Clone + Send + Sync + 'static {
    type Storage: Send + Sync + 'static;

    /// The object that exposes this collection to the [Value] world.
    type Wrapper: CollectionWrapper<Self>;

    fn backing(&self) -> &Arc<Backing<Self::Storage>>;

    fn from_backing(backing: Arc<Backing<Self::Storage>>) -> Self;

    /// Returns true if both handles refer to the same collection.
    #[inline(always)]
    fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(self.backing(), other.backing())
    }

    /// Boxes the collection by reference.
    ///
    /// Unlike [Value::give], the resulting wrapper does not keep the
    /// collection alive: once every native handle is dropped, the wrapper
    /// fails with [RuntimeError::ObjectDisposed].
    #[inline(always)]
    fn lend(&self) -> Value {
        box_collection(self, Ownership::Lend)
    }
}

/// A [Reflectable] object that wraps the native collection `C`.
pub trait CollectionWrapper<C: NativeCollection>: Reflectable + Sized {
    fn wrap(native: NativeRef<C>) -> Self;

    /// Returns the reference to the wrapped native collection.
    fn native(&self) -> &NativeRef<C>;
}

/// A native collection that can be enumerated.
pub trait NativeEnumerable: NativeCollection {
    type Item: Reflect + Clone;

    /// Returns a copy of the collection's elements in enumeration order.
    fn snapshot(&self) -> Vec<Self::Item>;

    /// Creates a new independent collection from the elements.
    fn from_items(items: Vec<Self::Item>) -> Self;
}

/// A native collection with indexed read access.
pub trait NativeReadonlyList: NativeEnumerable {
    fn length(&self) -> usize;

    fn item(&self, index: usize) -> Option<Self::Item>;
}

/// A native resizable fixed-order collection.
pub trait NativeArray: NativeReadonlyList {
    fn store(&self, index: usize, item: Self::Item) -> RuntimeResult<()>;

    fn resize(&self, length: usize);
}

/// A native mutable list.
pub trait NativeList: NativeReadonlyList {
    fn replace(&self, index: usize, item: Self::Item) -> RuntimeResult<()>;

    fn append(&self, item: Self::Item);

    fn insert_at(&self, index: usize, item: Self::Item) -> RuntimeResult<()>;

    fn remove_at(&self, index: usize) -> RuntimeResult<Self::Item>;

    fn clear_items(&self);
}

/// A native mutable list with change notifications.
pub trait NativeObservableList: NativeList {
    fn subscribe(&self, handler: ItemChangedHandler) -> usize;

    fn unsubscribe(&self, subscription: usize) -> bool;
}

/// A native collection with key-based read access.
pub trait NativeReadonlyDictionary: NativeCollection {
    type Key: Reflect + Clone + Ord;
    type Value: Reflect + Clone;

    fn length(&self) -> usize;

    /// Returns a copy of the collection's entries in enumeration order.
    fn entries(&self) -> Vec<(Self::Key, Self::Value)>;

    /// Returns the entry that follows the `after` key in enumeration order,
    /// or the first entry if `after` is None.
    fn next_entry(&self, after: Option<&Self::Key>) -> Option<(Self::Key, Self::Value)>;

    fn lookup(&self, key: &Self::Key) -> Option<Self::Value>;

    /// Creates a new independent collection from the entries.
    fn from_entries(entries: Vec<(Self::Key, Self::Value)>) -> Self;
}

/// A native mutable key-value collection.
pub trait NativeDictionary: NativeReadonlyDictionary {
    fn put(&self, key: Self::Key, value: Self::Value) -> Option<Self::Value>;

    fn take(&self, key: &Self::Key) -> Option<Self::Value>;

    fn clear_entries(&self);
}

/// Defines whether the boxed wrapper owns the native collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Ownership {
    /// The wrapper keeps the collection alive.
    Give,

    /// The wrapper refers to the collection weakly.
    Lend,
}

/// A reference from a wrapper object to the wrapped native collection.
///
/// The reference is weak unless it has been [retained](NativeRef::retain).
pub struct NativeRef<C: NativeCollection> {
    backing: Weak<Backing<C::Storage>>,
    retained: OnceLock<Arc<Backing<C::Storage>>>,
}

impl<C: NativeCollection> Clone for NativeRef<C> {
    #[inline(always)]
    fn clone(&self) -> Self {
        let retained = OnceLock::new();

        if let Some(backing) = self.retained.get() {
            let _ = retained.set(backing.clone());
        }

        Self {
            backing: self.backing.clone(),
            retained,
        }
    }
}

impl<C: NativeCollection> NativeRef<C> {
    #[inline(always)]
    pub fn new(native: &C) -> Self {
        Self {
            backing: Arc::downgrade(native.backing()),
            retained: OnceLock::new(),
        }
    }

    /// Makes this reference keep the collection alive.
    ///
    /// Does nothing if the reference is already retained or the collection
    /// no longer exists.
    pub fn retain(&self) {
        if self.retained.get().is_some() {
            return;
        }

        if let Some(backing) = self.backing.upgrade() {
            let _ = self.retained.set(backing);
        }
    }

    #[inline(always)]
    pub fn is_retained(&self) -> bool {
        self.retained.get().is_some()
    }

    /// Returns a handle to the native collection.
    ///
    /// Fails with [RuntimeError::ObjectDisposed] if the collection no longer
    /// exists.
    pub fn get(&self) -> RuntimeResult<C> {
        if let Some(backing) = self.retained.get() {
            return Ok(C::from_backing(backing.clone()));
        }

        match self.backing.upgrade() {
            Some(backing) => Ok(C::from_backing(backing)),

            None => fail(RuntimeError::ObjectDisposed {
                type_name: CompactString::from(type_name::<C>()),
            }),
        }
    }
}

/// Boxes the native collection through its wrapper object.
///
/// While the previously created wrapper is alive, subsequent boxings of the
/// same collection reuse it. With [Ownership::Give] the wrapper starts
/// owning the collection, so the Value stays valid after every native
/// handle is dropped.
pub fn box_collection<C: NativeCollection>(native: &C, ownership: Ownership) -> Value {
    let mut slot = native
        .backing()
        .wrapper
        .lock()
        .unwrap_or_else(|poison| poison.into_inner());

    if let Some(wrapper) = live_wrapper(slot.as_ref()) {
        if ownership == Ownership::Give {
            if let Some(wrapper) = (**wrapper.root()).as_any().downcast_ref::<C::Wrapper>() {
                wrapper.native().retain();
            }
        }

        return Value::from_ptr(wrapper);
    }

    trace!(
        "Creating {ownership:?} wrapper for '{}' collection.",
        type_name::<C>(),
    );

    let reference = NativeRef::new(native);

    if ownership == Ownership::Give {
        reference.retain();
    }

    let wrapper = Ptr::new(C::Wrapper::wrap(reference)).into_root();

    *slot = Some(Arc::downgrade(wrapper.root()));

    Value::from_ptr(wrapper)
}

fn live_wrapper(slot: Option<&Weak<dyn Reflectable>>) -> Option<Ptr<dyn Reflectable>> {
    let wrapper = slot?.upgrade()?;

    if wrapper.object().is_disposed() {
        return None;
    }

    let wrapper = Ptr::from_arc(wrapper);

    if wrapper.root().object().is_disposed() {
        return None;
    }

    Some(wrapper)
}

/// Recovers the native collection of type `C` from the Value.
///
/// If the Value wraps the collection of exactly this type, the function
/// returns an alias of the original collection. Otherwise, the function
/// enumerates the boxed collection and returns an owned copy.
pub fn unbox_enumerable<C>(value: &Value, name: Option<&str>) -> RuntimeResult<Unboxed<C>>
where
    C: NativeEnumerable + Reflect,
{
    let Some(object) = value.live_object(name)? else {
        return type_mismatch(name, TypeInfo::of::<C>(), value.type_name());
    };

    if let Some(wrapper) = (*object).as_any().downcast_ref::<C::Wrapper>() {
        return Ok(Unboxed::Alias(wrapper.native().get()?));
    }

    let Some(enumerable) = object.as_enumerable() else {
        return type_mismatch(name, TypeInfo::of::<C>(), value.type_name());
    };

    let mut enumerator = enumerable.create_enumerator()?;
    let mut items = Vec::new();

    while enumerator.next()? {
        let Some(item) = enumerator.current() else {
            return fail(RuntimeError::EnumeratorOutOfRange {
                index: enumerator.index(),
            });
        };

        let item = C::Item::unbox_parameter(&item, None, Some(name.unwrap_or("value")))?;

        items.push(item.into_inner());
    }

    Ok(Unboxed::Owned(C::from_items(items)))
}

/// Recovers the native key-value collection of type `C` from the Value.
///
/// Follows the same aliasing rules as [unbox_enumerable].
pub fn unbox_dictionary<C>(value: &Value, name: Option<&str>) -> RuntimeResult<Unboxed<C>>
where
    C: NativeReadonlyDictionary + Reflect,
{
    let Some(object) = value.live_object(name)? else {
        return type_mismatch(name, TypeInfo::of::<C>(), value.type_name());
    };

    if let Some(wrapper) = (*object).as_any().downcast_ref::<C::Wrapper>() {
        return Ok(Unboxed::Alias(wrapper.native().get()?));
    }

    let Some(dictionary) = object.as_readonly_dictionary() else {
        return type_mismatch(name, TypeInfo::of::<C>(), value.type_name());
    };

    let mut entries = Vec::new();

    for key in dictionary.keys()? {
        let value = dictionary.get(&key)?;

        let key = C::Key::unbox_parameter(&key, None, Some(name.unwrap_or("key")))?;
        let value = C::Value::unbox_parameter(&value, None, Some(name.unwrap_or("value")))?;

        entries.push((key.into_inner(), value.into_inner()));
    }

    Ok(Unboxed::Owned(C::from_entries(entries)))
}

/// Returns true if the Value refers to an enumerable collection.
#[inline]
pub fn satisfies_enumerable(value: &Value) -> bool {
    match value.peek_object() {
        Some(object) => object.as_enumerable().is_some(),
        None => false,
    }
}

/// Returns true if the Value refers to a key-value collection.
#[inline]
pub fn satisfies_dictionary(value: &Value) -> bool {
    match value.peek_object() {
        Some(object) => object.as_readonly_dictionary().is_some(),
        None => false,
    }
}
