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

//! # Ad Astra Reflect
//!
//! Runtime reflection layer of the Ad Astra platform.
//!
//! The crate describes native Rust types through runtime metadata objects
//! ([TypeDescriptor](runtime::TypeDescriptor)) that can be discovered and
//! invoked by name, and provides a universal dynamically typed container
//! ([Value](runtime::Value)) able to hold any reflectable value: primitives,
//! structs and enums by copy, class instances by raw or shared ownership,
//! containers and callables through thin wrapper objects.
//!
//! The conversion between native data and the Value container is driven by the
//! [Reflect](runtime::Reflect) trait. Each implementation declares the type's
//! shape (plain value, function, or one of the container categories), produces
//! a [TypeInfo](runtime::TypeInfo) describing the type at a call boundary, and
//! boxes or unboxes the data.
//!
//! ```
//! use ad_astra_reflect::{collections::List, runtime::Value};
//!
//! let list = List::from_vec(vec![1, 2, 3]);
//!
//! let boxed = Value::give(list.clone()).unwrap();
//! let unboxed = boxed.unbox::<List<i32>>().unwrap();
//!
//! unboxed.push(4);
//!
//! assert_eq!(list.to_vec(), vec![1, 2, 3, 4]);
//! ```

mod report;

pub mod collections;
pub mod exports;
pub mod runtime;
