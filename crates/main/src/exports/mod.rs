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

//! Built-in reflected types.
//!
//! The [PredefinedTypes] loader registers the following types in the
//! [global](crate::runtime::TypeManager::global) type manager:
//!
//! | Name                               | Rust type                   | Kind      |
//! |------------------------------------|-----------------------------|-----------|
//! | `i8`, `i16`, `i32`, `i64`, `isize` | the same                    | Primitive |
//! | `u8`, `u16`, `u32`, `u64`, `usize` | the same                    | Primitive |
//! | `f32`, `f64`                       | the same                    | Primitive |
//! | `bool`                             | [bool]                      | Primitive |
//! | `String`                           | [String]                    | Primitive |
//! | `DateTime`                         | [DateTime]                  | Primitive |
//! | `Void`                             | `()`                        | Primitive |
//! | `Pair`                             | [Pair]                      | Struct    |
//! | `Object`                           | `dyn Reflectable`           | Interface |
//! | `Function`, `Enumerable`, ...      | the universal interfaces    | Interface |
//!
//! The primitive types carry a [PrimitiveSerializer], and can be created
//! without arguments, which produces the type's default value.

mod boolean;
mod date;
mod interfaces;
mod number;
mod pair;
mod primitive;
mod string;
mod unit;

pub use crate::exports::{
    date::DateTime,
    pair::Pair,
    primitive::{Primitive, PrimitiveSerializer},
};
use crate::{
    exports::{interfaces::register_interfaces, primitive::register_primitive},
    runtime::{PropertyInfo, TypeDescriptorBuilder, TypeKind, TypeLoader, TypeRegistrar},
};

/// The [TypeLoader] of the built-in types.
#[derive(Clone, Copy, Debug, Default)]
pub struct PredefinedTypes;

impl TypeLoader for PredefinedTypes {
    fn load(&self, registrar: &mut TypeRegistrar) {
        register_interfaces(registrar);

        register_primitive::<i8>(registrar);
        register_primitive::<i16>(registrar);
        register_primitive::<i32>(registrar);
        register_primitive::<i64>(registrar);
        register_primitive::<isize>(registrar);
        register_primitive::<u8>(registrar);
        register_primitive::<u16>(registrar);
        register_primitive::<u32>(registrar);
        register_primitive::<u64>(registrar);
        register_primitive::<usize>(registrar);
        register_primitive::<f32>(registrar);
        register_primitive::<f64>(registrar);
        register_primitive::<bool>(registrar);
        register_primitive::<String>(registrar);
        register_primitive::<DateTime>(registrar);

        let _ = registrar.add(TypeDescriptorBuilder::new("Void", TypeKind::Primitive).native::<()>());
        let _ = registrar.add(
            TypeDescriptorBuilder::new("Pair", TypeKind::Struct)
                .native::<Pair>()
                .property(PropertyInfo::readonly("key", |this: &Pair| this.key.clone()))
                .property(PropertyInfo::readonly("value", |this: &Pair| this.value.clone())),
        );
    }
}
