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

// The narrow types are parsed through the widest type of their family, and
// then range-checked by the cast crate.
macro_rules! narrow_number {
    ($($ty:ident from $wide:ty),+ $(,)?) => {
        $(
        reflect_value!($ty);

        impl Primitive for $ty {
            const NAME: &'static str = stringify!($ty);

            #[inline(always)]
            fn to_text(&self) -> String {
                self.to_string()
            }

            #[inline(always)]
            fn from_text(text: &str) -> Option<Self> {
                cast::$ty(text.parse::<$wide>().ok()?).ok()
            }
        }
        )+
    };
}

macro_rules! wide_number {
    ($($ty:ident),+ $(,)?) => {
        $(
        reflect_value!($ty);

        impl Primitive for $ty {
            const NAME: &'static str = stringify!($ty);

            #[inline(always)]
            fn to_text(&self) -> String {
                self.to_string()
            }

            #[inline(always)]
            fn from_text(text: &str) -> Option<Self> {
                text.parse::<$ty>().ok()
            }
        }
        )+
    };
}

narrow_number!(
    i8 from i64,
    i16 from i64,
    i32 from i64,
    u8 from u64,
    u16 from u64,
    u32 from u64,
    f32 from f64,
);

wide_number!(i64, u64, isize, usize, f64);

#[cfg(test)]
mod tests {
    use crate::runtime::{RuntimeError, Value};

    #[test]
    fn test_integer_ranges() {
        assert_eq!(*Value::deserialize("u8", "255").unwrap().unbox::<u8>().unwrap(), 255);
        assert_eq!(*Value::deserialize("i8", "-128").unwrap().unbox::<i8>().unwrap(), -128);

        for (type_name, text) in [("u8", "256"), ("i8", "-129"), ("u16", "-1"), ("i32", "1.5")] {
            match Value::deserialize(type_name, text) {
                Err(RuntimeError::Deserialize {
                    type_name: actual, ..
                }) => assert_eq!(actual, type_name),

                other => panic!("unexpected result for {text:?}: {other:?}"),
            }
        }

        let boxed = Value::give(u64::MAX).unwrap();

        assert_eq!(boxed.serialize().unwrap(), u64::MAX.to_string());
        assert_eq!(Value::deserialize("u64", &boxed.serialize().unwrap()).unwrap(), boxed);
    }

    #[test]
    fn test_float_ranges() {
        let boxed = Value::deserialize("f32", "1.5").unwrap();

        assert_eq!(*boxed.unbox::<f32>().unwrap(), 1.5);
        assert_eq!(boxed.serialize().unwrap(), "1.5");

        assert!(Value::deserialize("f32", "1e300").is_err());
        assert_eq!(*Value::deserialize("f64", "1e300").unwrap().unbox::<f64>().unwrap(), 1e300);
    }

    #[test]
    fn test_default_values() {
        assert_eq!(*Value::create("i32", &[]).unwrap().unbox::<i32>().unwrap(), 0);
        assert_eq!(*Value::create("f64", &[]).unwrap().unbox::<f64>().unwrap(), 0.0);
        assert!(Value::create("u8", &[Value::give(1u8).unwrap()]).is_err());
    }
}
