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

use crate::{exports::Primitive, reflect_value};

reflect_value!(bool);

impl Primitive for bool {
    const NAME: &'static str = "bool";

    #[inline(always)]
    fn to_text(&self) -> String {
        String::from(match *self {
            true => "true",
            false => "false",
        })
    }

    // Only the exact lower-case literals are accepted.
    #[inline(always)]
    fn from_text(text: &str) -> Option<Self> {
        match text {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::Value;

    #[test]
    fn test_bool_literals() {
        assert!(*Value::deserialize("bool", "true").unwrap().unbox::<bool>().unwrap());
        assert!(!*Value::deserialize("bool", "false").unwrap().unbox::<bool>().unwrap());

        for text in ["True", "1", " true", ""] {
            assert!(Value::deserialize("bool", text).is_err(), "accepted {text:?}");
        }

        assert_eq!(Value::give(false).unwrap().serialize().unwrap(), "false");
    }
}
