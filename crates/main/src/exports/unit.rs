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

use crate::runtime::{Reflect, RuntimeResult, TypeDescriptor, TypeInfo, Unboxed, Value};

/// The unit type is registered as "Void": the result of the functions that
/// return nothing.
///
/// Boxing the unit produces Null. Any Value unboxes into the unit.
impl Reflect for () {
    #[inline(always)]
    fn create_type_info() -> TypeInfo {
        TypeInfo::by_descriptor::<()>()
    }

    #[inline(always)]
    fn box_parameter(self, _descriptor: Option<&Arc<TypeDescriptor>>) -> RuntimeResult<Value> {
        Ok(Value::null())
    }

    #[inline(always)]
    fn unbox_parameter(
        _value: &Value,
        _descriptor: Option<&Arc<TypeDescriptor>>,
        _name: Option<&str>,
    ) -> RuntimeResult<Unboxed<Self>> {
        Ok(Unboxed::Owned(()))
    }

    #[inline(always)]
    fn try_satisfies(_value: &Value) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::{MethodInfo, TypeInfo, Value};

    #[test]
    fn test_void() {
        assert_eq!(TypeInfo::of::<()>().to_string(), "Void");
        assert!(Value::give(()).unwrap().is_null());
        assert!(Value::give(5).unwrap().unbox::<()>().is_ok());

        let method = MethodInfo::function("noop", &[], || ());

        assert_eq!(method.return_type().to_string(), "Void");
        assert!(method.invoke(None, &[]).unwrap().is_null());
    }
}
