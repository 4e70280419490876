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

use crate::{reflect_value, runtime::Value};

/// A key-value entry of a dictionary.
///
/// Enumerating a boxed dictionary produces boxed Pairs.
#[derive(Clone, Debug, Default, PartialEq, PartialOrd)]
pub struct Pair {
    pub key: Value,
    pub value: Value,
}

reflect_value!(Pair);

impl Pair {
    #[inline(always)]
    pub fn new(key: Value, value: Value) -> Self {
        Self { key, value }
    }
}

#[cfg(test)]
mod tests {
    use crate::{exports::Pair, runtime::Value};

    #[test]
    fn test_pair_properties() {
        let pair = Value::give(Pair::new(
            Value::give(String::from("answer")).unwrap(),
            Value::give(42u32).unwrap(),
        ))
        .unwrap();

        assert_eq!(pair.type_name(), "Pair");
        assert_eq!(
            pair.get_property("key").unwrap().unbox::<String>().unwrap().as_str(),
            "answer",
        );
        assert_eq!(*pair.get_property("value").unwrap().unbox::<u32>().unwrap(), 42);
        assert!(pair.set_property("key", Value::null()).is_err());
    }
}
