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
    collections::BTreeMap,
    fmt::{Debug, Formatter},
    ops::Bound,
    sync::Arc,
};

use crate::{
    collections::{
        native::{
            box_collection,
            satisfies_dictionary,
            unbox_dictionary,
            Backing,
            NativeCollection,
            NativeDictionary,
            NativeReadonlyDictionary,
            Ownership,
        },
        wrappers::DictionaryWrapper,
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

/// An ordered key-value collection with reference semantics.
///
/// The entries are enumerated in ascending key order. When boxed, the
/// Dictionary is exposed through the
/// [ValueDictionary](crate::collections::ValueDictionary) interface, and its
/// enumeration produces [Pair](crate::exports::Pair) values.
///
/// ```
/// use ad_astra_reflect::{collections::Dictionary, runtime::Value};
///
/// let squares = Dictionary::new();
///
/// for key in 1..=3 {
///     let _ = squares.insert(key, key * key);
/// }
///
/// let boxed = Value::give(squares.clone()).unwrap();
/// let object = boxed.object().unwrap();
/// let dictionary = object.as_readonly_dictionary().unwrap();
///
/// assert_eq!(dictionary.count().unwrap(), 3);
/// assert_eq!(*dictionary.get(&Value::give(2).unwrap()).unwrap().unbox::<i32>().unwrap(), 4);
/// ```
pub struct Dictionary<K, V> {
    backing: Arc<Backing<BTreeMap<K, V>>>,
}

impl<K, V> Clone for Dictionary<K, V> {
    #[inline(always)]
    fn clone(&self) -> Self {
        Self {
            backing: self.backing.clone(),
        }
    }
}

impl<K: Debug, V: Debug> Debug for Dictionary<K, V> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.debug_map().entries(self.backing.read().iter()).finish()
    }
}

impl<K: Ord, V> Default for Dictionary<K, V> {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord, V> Dictionary<K, V> {
    #[inline(always)]
    pub fn new() -> Self {
        Self {
            backing: Backing::new(BTreeMap::new()),
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

    /// Inserts or replaces the entry. Returns the replaced value.
    #[inline(always)]
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.backing.write().insert(key, value)
    }

    #[inline(always)]
    pub fn remove(&self, key: &K) -> Option<V> {
        self.backing.write().remove(key)
    }

    #[inline(always)]
    pub fn contains_key(&self, key: &K) -> bool {
        self.backing.read().contains_key(key)
    }

    #[inline(always)]
    pub fn clear(&self) {
        self.backing.write().clear();
    }

    #[inline(always)]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.backing, &other.backing)
    }
}

impl<K: Ord + Clone, V: Clone> Dictionary<K, V> {
    #[inline(always)]
    pub fn get(&self, key: &K) -> Option<V> {
        self.backing.read().get(key).cloned()
    }

    #[inline(always)]
    pub fn keys(&self) -> Vec<K> {
        self.backing.read().keys().cloned().collect()
    }

    #[inline(always)]
    pub fn values(&self) -> Vec<V> {
        self.backing.read().values().cloned().collect()
    }

    /// Returns a copy of the entries in ascending key order.
    #[inline(always)]
    pub fn to_vec(&self) -> Vec<(K, V)> {
        self.backing
            .read()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for Dictionary<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            backing: Backing::new(iter.into_iter().collect()),
        }
    }
}

impl<K, V> NativeCollection for Dictionary<K, V>
where
    K: Reflect + Clone + Ord,
    V: Reflect + Clone,
{
    type Storage = BTreeMap<K, V>;
    type Wrapper = DictionaryWrapper<Self>;

    #[inline(always)]
    fn backing(&self) -> &Arc<Backing<Self::Storage>> {
        &self.backing
    }

    #[inline(always)]
    fn from_backing(backing: Arc<Backing<Self::Storage>>) -> Self {
        Self { backing }
    }
}

impl<K, V> NativeReadonlyDictionary for Dictionary<K, V>
where
    K: Reflect + Clone + Ord,
    V: Reflect + Clone,
{
    type Key = K;
    type Value = V;

    #[inline(always)]
    fn length(&self) -> usize {
        self.len()
    }

    #[inline(always)]
    fn entries(&self) -> Vec<(Self::Key, Self::Value)> {
        self.to_vec()
    }

    fn next_entry(&self, after: Option<&Self::Key>) -> Option<(Self::Key, Self::Value)> {
        let storage = self.backing.read();

        let (key, value) = match after {
            None => storage.iter().next()?,
            Some(after) => storage
                .range((Bound::Excluded(after), Bound::Unbounded))
                .next()?,
        };

        Some((key.clone(), value.clone()))
    }

    #[inline(always)]
    fn lookup(&self, key: &Self::Key) -> Option<Self::Value> {
        self.get(key)
    }

    #[inline(always)]
    fn from_entries(entries: Vec<(Self::Key, Self::Value)>) -> Self {
        entries.into_iter().collect()
    }
}

impl<K, V> NativeDictionary for Dictionary<K, V>
where
    K: Reflect + Clone + Ord,
    V: Reflect + Clone,
{
    #[inline(always)]
    fn put(&self, key: Self::Key, value: Self::Value) -> Option<Self::Value> {
        self.insert(key, value)
    }

    #[inline(always)]
    fn take(&self, key: &Self::Key) -> Option<Self::Value> {
        self.remove(key)
    }

    #[inline(always)]
    fn clear_entries(&self) {
        self.clear()
    }
}

impl<K, V> Reflect for Dictionary<K, V>
where
    K: Reflect + Clone + Ord,
    V: Reflect + Clone,
{
    const SHAPE: Shape = Shape::DICTIONARY;

    #[inline(always)]
    fn create_type_info() -> TypeInfo {
        TypeInfo::collection(
            Self::CATEGORY,
            TypeInfoHint::Dictionary,
            vec![TypeInfo::of::<K>(), TypeInfo::of::<V>()],
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
        unbox_dictionary::<Self>(value, name)
    }

    #[inline(always)]
    fn try_satisfies(value: &Value) -> bool {
        satisfies_dictionary(value)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        collections::{native::NativeCollection, Dictionary},
        exports::Pair,
        runtime::{RuntimeError, Value},
    };

    #[test]
    fn test_dictionary_interface() {
        let squares = Dictionary::new();

        for key in 1..=3 {
            let _ = squares.insert(key, key * key);
        }

        let boxed = Value::give(squares.clone()).unwrap();
        let object = boxed.object().unwrap();

        let readonly = object.as_readonly_dictionary().unwrap();
        let mutable = object.as_dictionary().unwrap();

        assert_eq!(readonly.count().unwrap(), 3);

        let two = Value::give(2).unwrap();

        assert_eq!(*readonly.get(&two).unwrap().unbox::<i32>().unwrap(), 4);
        assert!(mutable.remove(&two).unwrap());
        assert!(!mutable.remove(&two).unwrap());
        assert_eq!(readonly.count().unwrap(), 2);
        assert!(!readonly.contains_key(&two).unwrap());
        assert!(!readonly.contains_key(&Value::give(true).unwrap()).unwrap());

        match readonly.get(&two) {
            Err(RuntimeError::KeyNotFound { .. }) => (),
            other => panic!("unexpected result: {other:?}"),
        }

        mutable
            .set(Value::give(5).unwrap(), Value::give(25).unwrap())
            .unwrap();

        assert_eq!(squares.to_vec(), vec![(1, 1), (3, 9), (5, 25)]);

        let keys = readonly.keys().unwrap();

        assert_eq!(keys.len(), 3);
        assert_eq!(*keys[2].unbox::<i32>().unwrap(), 5);

        let pairs = object.as_enumerable().unwrap().to_values().unwrap();

        assert_eq!(pairs.len(), 3);

        let pair = pairs[1].unbox::<Pair>().unwrap();

        assert_eq!(*pair.key.unbox::<i32>().unwrap(), 3);
        assert_eq!(*pair.value.unbox::<i32>().unwrap(), 9);

        mutable.clear().unwrap();

        assert!(squares.is_empty());
    }

    #[test]
    fn test_dictionary_unboxing() {
        let source = [(String::from("a"), 1u32), (String::from("b"), 2)]
            .into_iter()
            .collect::<Dictionary<_, _>>();

        let boxed = Value::give(source.clone()).unwrap();

        let alias = boxed.unbox::<Dictionary<String, u32>>().unwrap();

        assert!(!alias.is_owned());
        assert!(Dictionary::ptr_eq(&source, &alias));

        let copy = boxed.unbox::<Dictionary<String, u64>>();

        assert!(matches!(copy, Err(RuntimeError::TypeMismatch { .. })));
        assert!(boxed.unbox::<crate::collections::List<u32>>().is_err());
    }

    #[test]
    fn test_dictionary_enumerator_cursor() {
        let source = Dictionary::new();

        let _ = source.insert(1u8, String::from("one"));
        let _ = source.insert(3u8, String::from("three"));

        let boxed = Value::give(source.clone()).unwrap();
        let object = boxed.object().unwrap();

        let mut enumerator = object.as_enumerable().unwrap().create_enumerator().unwrap();

        assert!(enumerator.next().unwrap());

        let first = enumerator.current().unwrap().unbox::<Pair>().unwrap();

        assert_eq!(*first.key.unbox::<u8>().unwrap(), 1);
        assert_eq!(enumerator.index(), 0);

        let _ = source.insert(2u8, String::from("two"));

        assert!(enumerator.next().unwrap());

        let second = enumerator.current().unwrap().unbox::<Pair>().unwrap();

        assert_eq!(*second.key.unbox::<u8>().unwrap(), 2);
        assert_eq!(&*second.value.unbox::<String>().unwrap(), "two");

        assert!(enumerator.next().unwrap());
        assert_eq!(enumerator.index(), 2);
        assert!(!enumerator.next().unwrap());
        assert!(enumerator.current().is_none());
        assert!(!enumerator.next().unwrap());
    }

    #[test]
    fn test_dictionary_given_temporary() {
        let boxed = Value::give(
            [(1i32, 10i32), (2, 20)]
                .into_iter()
                .collect::<Dictionary<_, _>>(),
        )
        .unwrap();

        let object = boxed.object().unwrap();

        assert_eq!(object.as_readonly_dictionary().unwrap().count().unwrap(), 2);
        assert_eq!(object.as_enumerable().unwrap().to_values().unwrap().len(), 2);
    }

    #[test]
    fn test_dictionary_lent_disposal() {
        let source = [(1i32, 10i32)].into_iter().collect::<Dictionary<_, _>>();

        let lent = source.lend();
        let object = lent.object().unwrap();
        let enumerable = object.as_enumerable().unwrap();

        let mut enumerator = enumerable.create_enumerator().unwrap();

        assert!(enumerator.next().unwrap());

        drop(source);

        assert!(matches!(
            enumerator.next(),
            Err(RuntimeError::ObjectDisposed { .. }),
        ));
        assert!(matches!(
            enumerable.create_enumerator(),
            Err(RuntimeError::ObjectDisposed { .. }),
        ));
        assert!(matches!(
            object.as_readonly_dictionary().unwrap().count(),
            Err(RuntimeError::ObjectDisposed { .. }),
        ));
    }
}
