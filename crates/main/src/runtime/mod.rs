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

//! The reflection runtime.
//!
//! The runtime consists of the following layers:
//!
//!  - The object model: [Reflectable] objects with an embedded [ObjectBase]
//!    header, owned through the [Ptr] pointers and observed through the [Raw]
//!    pointers. Several objects can be [aggregated](aggregate) into a single
//!    identity that shares one reference counter.
//!  - The universal [Value] container, which holds Null, a pointer to an
//!    object, or plain data boxed by copy.
//!  - The [Reflect] trait, which classifies a Rust type into a
//!    [TypeCategory], describes it through a [TypeInfo], and converts the data
//!    between the Rust type and the Value.
//!  - The invocation layer: [MethodInfo] descriptions of the Rust functions
//!    grouped into overloaded [MethodGroups](MethodGroup), and the [Func]
//!    callables that cross the boundary in both directions.
//!  - The metadata layer: [TypeDescriptors](TypeDescriptor) with their
//!    properties, methods, events, and constructors, registered in the
//!    [TypeManager].
//!
//! ```
//! use ad_astra_reflect::runtime::{RuntimeError, Value};
//!
//! let number = Value::deserialize("u8", "200").unwrap();
//!
//! assert_eq!(*number.unbox::<u8>().unwrap(), 200);
//! assert_eq!(number.serialize().unwrap(), "200");
//!
//! let widened = number.unbox::<u16>();
//!
//! assert!(matches!(widened, Err(RuntimeError::TypeMismatch { .. })));
//! ```

pub(crate) mod aggregation;
mod category;
mod descriptor;
pub(crate) mod error;
mod event;
mod function;
mod info;
mod invoke;
mod manager;
pub(crate) mod object;
mod reflect;
mod value;

pub use crate::runtime::{
    aggregation::{
        aggregate,
        aggregation_parents,
        aggregation_root,
        force_dispose,
        safe_aggregation_cast,
        try_aggregation_root,
    },
    category::{Shape, TypeCategory},
    descriptor::{PropertyInfo, TypeDescriptor, TypeDescriptorBuilder, TypeKind, ValueSerializer},
    error::{MemberKind, RuntimeError, RuntimeResult, RuntimeResultExt},
    event::{Event, EventInfo},
    function::{Func, IntoFunc, NativeFunctionProxy, ValueFunctionProxy},
    info::{Decorator, TypeInfo, TypeInfoHint},
    invoke::{
        invoke_function,
        receiver,
        FuncArgs,
        MethodGroup,
        MethodInfo,
        MethodKind,
        NativeFunction,
        NativeMethod,
        ParameterInfo,
    },
    manager::{LoaderId, TypeLoader, TypeManager, TypeRegistrar},
    object::{
        capability_category,
        object_descriptor,
        object_descriptor_in,
        object_type_name,
        reference_counter,
        AsAny,
        ObjectBase,
        Pointee,
        Ptr,
        Raw,
        Reflectable,
    },
    reflect::{unbox_data, Reflect, Unboxed, ValueBoxing, ValueType},
    value::{Value, ValueKind},
};
