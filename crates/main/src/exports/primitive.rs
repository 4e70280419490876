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
    marker::PhantomData,
};

use compact_str::CompactString;

use crate::runtime::{
    error::fail,
    unbox_data,
    RuntimeError,
    RuntimeResult,
    TypeDescriptorBuilder,
    TypeKind,
    TypeRegistrar,
    Value,
    ValueSerializer,
    ValueType,
};

/// A plain data type with a textual representation.
///
/// Each Primitive is registered as a [primitive](TypeKind::Primitive) type
/// with the [PrimitiveSerializer] attached.
pub trait Primitive: ValueType + Default {
    /// The registered name of the type.
    const NAME: &'static str;

    /// Converts the data into text.
    fn to_text(&self) -> String;

    /// Parses the text. Returns None if the text is not a valid
    /// representation of the type.
    fn from_text(text: &str) -> Option<Self>;
}

/// The [ValueSerializer] of the [Primitive] type `T`.
pub struct PrimitiveSerializer<T> {
    marker: PhantomData<fn() -> T>,
}

impl<T> Default for PrimitiveSerializer<T> {
    #[inline(always)]
    fn default() -> Self {
        Self {
            marker: PhantomData,
        }
    }
}

impl<T: Primitive> Debug for PrimitiveSerializer<T> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_tuple("PrimitiveSerializer")
            .field(&T::NAME)
            .finish()
    }
}

impl<T: Primitive> ValueSerializer for PrimitiveSerializer<T> {
    #[inline(always)]
    fn default_value(&self) -> RuntimeResult<Value> {
        Value::give(T::default())
    }

    #[inline(always)]
    fn serialize(&self, value: &Value) -> RuntimeResult<String> {
        Ok(unbox_data::<T>(value, Some("value"))?.to_text())
    }

    fn deserialize(&self, text: &str) -> RuntimeResult<Value> {
        match T::from_text(text) {
            Some(data) => Value::give(data),

            None => fail(RuntimeError::Deserialize {
                type_name: CompactString::from(T::NAME),
                text: CompactString::from(text),
            }),
        }
    }
}

#[inline(always)]
pub(super) fn register_primitive<T: Primitive>(registrar: &mut TypeRegistrar) {
    let _ = registrar.add(
        TypeDescriptorBuilder::new(T::NAME, TypeKind::Primitive)
            .native::<T>()
            .serializer(PrimitiveSerializer::<T>::default()),
    );
}
