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

use std::vec::IntoIter;

use compact_str::format_compact;

use crate::{
    collections::{
        native::{
            CollectionWrapper,
            NativeArray,
            NativeDictionary,
            NativeEnumerable,
            NativeList,
            NativeObservableList,
            NativeReadonlyDictionary,
            NativeReadonlyList,
            NativeRef,
        },
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
    exports::Pair,
    runtime::{error::fail, ObjectBase, Reflect, Reflectable, RuntimeError, RuntimeResult, Value},
};

macro_rules! declare_wrapper {
    ($(#[$meta:meta])* $wrapper:ident: $shape:ident) => {
        $(#[$meta])*
        pub struct $wrapper<C: $shape> {
            object: ObjectBase,
            native: NativeRef<C>,
        }

        impl<C: $shape> CollectionWrapper<C> for $wrapper<C> {
            #[inline(always)]
            fn wrap(native: NativeRef<C>) -> Self {
                Self {
                    object: ObjectBase::new(),
                    native,
                }
            }

            #[inline(always)]
            fn native(&self) -> &NativeRef<C> {
                &self.native
            }
        }
    };
}

declare_wrapper!(
    /// A wrapper object that exposes a native enumerable collection through
    /// the [ValueEnumerable] interface.
    EnumerableWrapper: NativeEnumerable
);

declare_wrapper!(
    /// A wrapper object that exposes a native indexed collection through the
    /// [ValueReadonlyList] interface.
    ReadonlyListWrapper: NativeReadonlyList
);

declare_wrapper!(
    /// A wrapper object that exposes a native array through the [ValueArray]
    /// interface.
    ArrayWrapper: NativeArray
);

declare_wrapper!(
    /// A wrapper object that exposes a native list through the [ValueList]
    /// interface.
    ListWrapper: NativeList
);

declare_wrapper!(
    /// A wrapper object that exposes a native observable list through the
    /// [ValueObservableList] interface.
    ObservableListWrapper: NativeObservableList
);

declare_wrapper!(
    /// A wrapper object that exposes a native key-value collection through
    /// the [ValueReadonlyDictionary] interface.
    ReadonlyDictionaryWrapper: NativeReadonlyDictionary
);

declare_wrapper!(
    /// A wrapper object that exposes a native mutable key-value collection
    /// through the [ValueDictionary] interface.
    DictionaryWrapper: NativeDictionary
);

impl<C: NativeEnumerable> Reflectable for EnumerableWrapper<C> {
    #[inline(always)]
    fn object(&self) -> &ObjectBase {
        &self.object
    }

    #[inline(always)]
    fn as_enumerable(&self) -> Option<&dyn ValueEnumerable> {
        Some(self)
    }
}

impl<C: NativeEnumerable> ValueEnumerable for EnumerableWrapper<C> {
    #[inline]
    fn create_enumerator(&self) -> RuntimeResult<Box<dyn ValueEnumerator>> {
        let _ = self.native.get()?;

        Ok(Box::new(SequenceEnumerator::new(self.native.clone())))
    }
}

impl<C: NativeReadonlyList> Reflectable for ReadonlyListWrapper<C> {
    #[inline(always)]
    fn object(&self) -> &ObjectBase {
        &self.object
    }

    #[inline(always)]
    fn as_enumerable(&self) -> Option<&dyn ValueEnumerable> {
        Some(self)
    }

    #[inline(always)]
    fn as_readonly_list(&self) -> Option<&dyn ValueReadonlyList> {
        Some(self)
    }
}

impl<C: NativeArray> Reflectable for ArrayWrapper<C> {
    #[inline(always)]
    fn object(&self) -> &ObjectBase {
        &self.object
    }

    #[inline(always)]
    fn as_enumerable(&self) -> Option<&dyn ValueEnumerable> {
        Some(self)
    }

    #[inline(always)]
    fn as_readonly_list(&self) -> Option<&dyn ValueReadonlyList> {
        Some(self)
    }

    #[inline(always)]
    fn as_array(&self) -> Option<&dyn ValueArray> {
        Some(self)
    }
}

impl<C: NativeList> Reflectable for ListWrapper<C> {
    #[inline(always)]
    fn object(&self) -> &ObjectBase {
        &self.object
    }

    #[inline(always)]
    fn as_enumerable(&self) -> Option<&dyn ValueEnumerable> {
        Some(self)
    }

    #[inline(always)]
    fn as_readonly_list(&self) -> Option<&dyn ValueReadonlyList> {
        Some(self)
    }

    #[inline(always)]
    fn as_list(&self) -> Option<&dyn ValueList> {
        Some(self)
    }
}

impl<C: NativeObservableList> Reflectable for ObservableListWrapper<C> {
    #[inline(always)]
    fn object(&self) -> &ObjectBase {
        &self.object
    }

    #[inline(always)]
    fn as_enumerable(&self) -> Option<&dyn ValueEnumerable> {
        Some(self)
    }

    #[inline(always)]
    fn as_readonly_list(&self) -> Option<&dyn ValueReadonlyList> {
        Some(self)
    }

    #[inline(always)]
    fn as_list(&self) -> Option<&dyn ValueList> {
        Some(self)
    }

    #[inline(always)]
    fn as_observable_list(&self) -> Option<&dyn ValueObservableList> {
        Some(self)
    }
}

impl<C: NativeObservableList> ValueObservableList for ObservableListWrapper<C> {
    #[inline]
    fn subscribe(&self, handler: ItemChangedHandler) -> RuntimeResult<usize> {
        Ok(self.native.get()?.subscribe(handler))
    }

    #[inline]
    fn unsubscribe(&self, subscription: usize) -> RuntimeResult<bool> {
        Ok(self.native.get()?.unsubscribe(subscription))
    }
}

impl<C: NativeReadonlyDictionary> Reflectable for ReadonlyDictionaryWrapper<C> {
    #[inline(always)]
    fn object(&self) -> &ObjectBase {
        &self.object
    }

    #[inline(always)]
    fn as_enumerable(&self) -> Option<&dyn ValueEnumerable> {
        Some(self)
    }

    #[inline(always)]
    fn as_readonly_dictionary(&self) -> Option<&dyn ValueReadonlyDictionary> {
        Some(self)
    }
}

impl<C: NativeDictionary> Reflectable for DictionaryWrapper<C> {
    #[inline(always)]
    fn object(&self) -> &ObjectBase {
        &self.object
    }

    #[inline(always)]
    fn as_enumerable(&self) -> Option<&dyn ValueEnumerable> {
        Some(self)
    }

    #[inline(always)]
    fn as_readonly_dictionary(&self) -> Option<&dyn ValueReadonlyDictionary> {
        Some(self)
    }

    #[inline(always)]
    fn as_dictionary(&self) -> Option<&dyn ValueDictionary> {
        Some(self)
    }
}

macro_rules! impl_readonly_list {
    ($wrapper:ident: $shape:ident) => {
        impl<C: $shape> ValueEnumerable for $wrapper<C> {
            #[inline]
            fn create_enumerator(&self) -> RuntimeResult<Box<dyn ValueEnumerator>> {
                let _ = self.native.get()?;

                Ok(Box::new(ListEnumerator::new(self.native.clone())))
            }
        }

        impl<C: $shape> ValueReadonlyList for $wrapper<C> {
            #[inline]
            fn count(&self) -> RuntimeResult<usize> {
                Ok(self.native.get()?.length())
            }

            #[inline]
            fn get(&self, index: usize) -> RuntimeResult<Value> {
                list_get(&self.native.get()?, index)
            }

            #[inline]
            fn index_of(&self, item: &Value) -> RuntimeResult<Option<usize>> {
                list_index_of(&self.native.get()?, item)
            }
        }
    };
}

impl_readonly_list!(ReadonlyListWrapper: NativeReadonlyList);
impl_readonly_list!(ArrayWrapper: NativeArray);
impl_readonly_list!(ListWrapper: NativeList);
impl_readonly_list!(ObservableListWrapper: NativeObservableList);

impl<C: NativeArray> ValueArray for ArrayWrapper<C> {
    fn set(&self, index: usize, item: Value) -> RuntimeResult<()> {
        let item = C::Item::unbox_parameter(&item, None, Some("value"))?.into_inner();

        self.native.get()?.store(index, item)
    }

    #[inline]
    fn resize(&self, length: usize) -> RuntimeResult<()> {
        self.native.get()?.resize(length);

        Ok(())
    }
}

macro_rules! impl_list {
    ($wrapper:ident: $shape:ident) => {
        impl<C: $shape> ValueList for $wrapper<C> {
            fn set(&self, index: usize, item: Value) -> RuntimeResult<()> {
                let item = C::Item::unbox_parameter(&item, None, Some("value"))?.into_inner();

                self.native.get()?.replace(index, item)
            }

            fn add(&self, item: Value) -> RuntimeResult<()> {
                let item = C::Item::unbox_parameter(&item, None, Some("value"))?.into_inner();

                self.native.get()?.append(item);

                Ok(())
            }

            fn insert(&self, index: usize, item: Value) -> RuntimeResult<()> {
                let item = C::Item::unbox_parameter(&item, None, Some("value"))?.into_inner();

                self.native.get()?.insert_at(index, item)
            }

            fn remove(&self, index: usize) -> RuntimeResult<Value> {
                self.native.get()?.remove_at(index)?.box_parameter(None)
            }

            fn clear(&self) -> RuntimeResult<()> {
                self.native.get()?.clear_items();

                Ok(())
            }
        }
    };
}

impl_list!(ListWrapper: NativeList);
impl_list!(ObservableListWrapper: NativeObservableList);

macro_rules! impl_readonly_dictionary {
    ($wrapper:ident: $shape:ident) => {
        impl<C: $shape> ValueEnumerable for $wrapper<C> {
            #[inline]
            fn create_enumerator(&self) -> RuntimeResult<Box<dyn ValueEnumerator>> {
                let _ = self.native.get()?;

                Ok(Box::new(DictionaryEnumerator::new(self.native.clone())))
            }
        }

        impl<C: $shape> ValueReadonlyDictionary for $wrapper<C> {
            #[inline]
            fn count(&self) -> RuntimeResult<usize> {
                Ok(self.native.get()?.length())
            }

            fn keys(&self) -> RuntimeResult<Vec<Value>> {
                self.native
                    .get()?
                    .entries()
                    .into_iter()
                    .map(|(key, _)| key.box_parameter(None))
                    .collect()
            }

            fn values(&self) -> RuntimeResult<Vec<Value>> {
                self.native
                    .get()?
                    .entries()
                    .into_iter()
                    .map(|(_, value)| value.box_parameter(None))
                    .collect()
            }

            fn get(&self, key: &Value) -> RuntimeResult<Value> {
                let native = self.native.get()?;
                let unboxed = C::Key::unbox_parameter(key, None, Some("key"))?;

                match native.lookup(&unboxed) {
                    Some(value) => value.box_parameter(None),

                    None => fail(RuntimeError::KeyNotFound {
                        key: format_compact!("{key:?}"),
                    }),
                }
            }

            fn contains_key(&self, key: &Value) -> RuntimeResult<bool> {
                let native = self.native.get()?;

                if !C::Key::try_satisfies(key) {
                    return Ok(false);
                }

                let unboxed = C::Key::unbox_parameter(key, None, Some("key"))?;

                Ok(native.lookup(&unboxed).is_some())
            }
        }
    };
}

impl_readonly_dictionary!(ReadonlyDictionaryWrapper: NativeReadonlyDictionary);
impl_readonly_dictionary!(DictionaryWrapper: NativeDictionary);

impl<C: NativeDictionary> ValueDictionary for DictionaryWrapper<C> {
    fn set(&self, key: Value, value: Value) -> RuntimeResult<()> {
        let key = C::Key::unbox_parameter(&key, None, Some("key"))?.into_inner();
        let value = C::Value::unbox_parameter(&value, None, Some("value"))?.into_inner();

        let _ = self.native.get()?.put(key, value);

        Ok(())
    }

    fn remove(&self, key: &Value) -> RuntimeResult<bool> {
        let native = self.native.get()?;

        if !C::Key::try_satisfies(key) {
            return Ok(false);
        }

        let key = C::Key::unbox_parameter(key, None, Some("key"))?;

        Ok(native.take(&key).is_some())
    }

    fn clear(&self) -> RuntimeResult<()> {
        self.native.get()?.clear_entries();

        Ok(())
    }
}

fn list_get<C: NativeReadonlyList>(native: &C, index: usize) -> RuntimeResult<Value> {
    match native.item(index) {
        Some(item) => item.box_parameter(None),

        None => fail(RuntimeError::OutOfBounds {
            index,
            length: native.length(),
        }),
    }
}

fn list_index_of<C: NativeReadonlyList>(native: &C, item: &Value) -> RuntimeResult<Option<usize>> {
    if !C::Item::try_satisfies(item) {
        return Ok(None);
    }

    for (index, candidate) in native.snapshot().into_iter().enumerate() {
        if &candidate.box_parameter(None)? == item {
            return Ok(Some(index));
        }
    }

    Ok(None)
}

// Reads the elements of an indexed collection one by one.
struct ListEnumerator<C: NativeReadonlyList> {
    native: NativeRef<C>,
    position: Option<usize>,
    current: Option<Value>,
}

impl<C: NativeReadonlyList> ListEnumerator<C> {
    #[inline(always)]
    fn new(native: NativeRef<C>) -> Self {
        Self {
            native,
            position: None,
            current: None,
        }
    }
}

impl<C: NativeReadonlyList> ValueEnumerator for ListEnumerator<C> {
    #[inline(always)]
    fn current(&self) -> Option<Value> {
        self.current.clone()
    }

    #[inline(always)]
    fn index(&self) -> usize {
        self.position.unwrap_or_default()
    }

    fn next(&mut self) -> RuntimeResult<bool> {
        let native = self.native.get()?;

        let position = match self.position {
            None => 0,
            Some(position) => position + 1,
        };

        match native.item(position) {
            Some(item) => {
                self.position = Some(position);
                self.current = Some(item.box_parameter(None)?);

                Ok(true)
            }

            None => {
                self.current = None;

                Ok(false)
            }
        }
    }
}

// Evaluates the sequence on the first step, and boxes one element per step.
struct SequenceEnumerator<C: NativeEnumerable> {
    native: NativeRef<C>,
    items: Option<IntoIter<C::Item>>,
    position: Option<usize>,
    current: Option<Value>,
}

impl<C: NativeEnumerable> SequenceEnumerator<C> {
    #[inline(always)]
    fn new(native: NativeRef<C>) -> Self {
        Self {
            native,
            items: None,
            position: None,
            current: None,
        }
    }
}

impl<C: NativeEnumerable> ValueEnumerator for SequenceEnumerator<C> {
    #[inline(always)]
    fn current(&self) -> Option<Value> {
        self.current.clone()
    }

    #[inline(always)]
    fn index(&self) -> usize {
        self.position.unwrap_or_default()
    }

    fn next(&mut self) -> RuntimeResult<bool> {
        let native = self.native.get()?;

        let items = self
            .items
            .get_or_insert_with(|| native.snapshot().into_iter());

        match items.next() {
            Some(item) => {
                self.position = Some(match self.position {
                    None => 0,
                    Some(position) => position + 1,
                });
                self.current = Some(item.box_parameter(None)?);

                Ok(true)
            }

            None => {
                self.current = None;

                Ok(false)
            }
        }
    }
}

// Walks the key-value collection in key order, resuming after the last
// visited key.
struct DictionaryEnumerator<C: NativeReadonlyDictionary> {
    native: NativeRef<C>,
    last_key: Option<C::Key>,
    position: Option<usize>,
    current: Option<Value>,
    finished: bool,
}

impl<C: NativeReadonlyDictionary> DictionaryEnumerator<C> {
    #[inline(always)]
    fn new(native: NativeRef<C>) -> Self {
        Self {
            native,
            last_key: None,
            position: None,
            current: None,
            finished: false,
        }
    }
}

impl<C: NativeReadonlyDictionary> ValueEnumerator for DictionaryEnumerator<C> {
    #[inline(always)]
    fn current(&self) -> Option<Value> {
        self.current.clone()
    }

    #[inline(always)]
    fn index(&self) -> usize {
        self.position.unwrap_or_default()
    }

    fn next(&mut self) -> RuntimeResult<bool> {
        let native = self.native.get()?;

        if self.finished {
            return Ok(false);
        }

        let Some((key, value)) = native.next_entry(self.last_key.as_ref()) else {
            self.finished = true;
            self.current = None;

            return Ok(false);
        };

        let pair = Pair {
            key: key.clone().box_parameter(None)?,
            value: value.box_parameter(None)?,
        };

        self.position = Some(match self.position {
            None => 0,
            Some(position) => position + 1,
        });
        self.last_key = Some(key);
        self.current = Some(Value::give(pair)?);

        Ok(true)
    }
}
