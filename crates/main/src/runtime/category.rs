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
    fmt::{Debug, Display, Formatter},
    ops::BitOr,
};

/// A set of universal interfaces implemented by a Rust type.
///
/// The shape is a compile-time property of the type: each reflected type
/// declares its shape through the [Reflect::SHAPE](crate::runtime::Reflect::SHAPE)
/// constant, and the runtime classifies the type with
/// [TypeCategory::resolve].
///
/// Every interface constant includes the bits of the interfaces it extends.
/// For example, [Shape::LIST] includes the [Shape::READONLY_LIST] bits, which
/// in turn include the [Shape::ENUMERABLE] bit.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Shape(u16);

impl Debug for Shape {
    #[inline(always)]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_fmt(format_args!("Shape({:#011b})", self.0))
    }
}

impl BitOr for Shape {
    type Output = Self;

    #[inline(always)]
    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl Shape {
    /// The type does not implement any of the universal interfaces.
    pub const NON_GENERIC: Self = Self(0);

    /// The type is a callable delegate.
    pub const FUNCTION: Self = Self(1 << 0);

    /// The type can be iterated by a value enumerator.
    pub const ENUMERABLE: Self = Self(1 << 1);

    /// The type provides indexed read access.
    pub const READONLY_LIST: Self = Self(1 << 2 | Self::ENUMERABLE.0);

    /// The type provides indexed read and write access, and can be resized.
    pub const ARRAY: Self = Self(1 << 3 | Self::READONLY_LIST.0);

    /// The type provides indexed read and write access, insertion, and
    /// removal.
    pub const LIST: Self = Self(1 << 4 | Self::READONLY_LIST.0);

    /// The type is a list that notifies subscribers about item changes.
    pub const OBSERVABLE_LIST: Self = Self(1 << 5 | Self::LIST.0);

    /// The type provides key-based read access.
    pub const READONLY_DICTIONARY: Self = Self(1 << 6 | Self::ENUMERABLE.0);

    /// The type provides key-based read and write access.
    pub const DICTIONARY: Self = Self(1 << 7 | Self::READONLY_DICTIONARY.0);

    /// Returns a shape that implements the interfaces of both shapes.
    #[inline(always)]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Returns true if this shape implements all interfaces of the `other`
    /// shape.
    #[inline(always)]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true if the shape does not implement any universal interface.
    #[inline(always)]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// A classification of a Rust type by the most specific universal interface
/// it implements.
///
/// The category determines the boxing, unboxing, and type information strategy
/// of the type. See [TypeCategory::resolve] for the priority rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeCategory {
    /// The type does not implement any universal interface.
    NonGeneric,

    /// The type is a callable delegate.
    Function,

    /// The type can only be enumerated.
    Enumerable,

    /// The type is an indexed read-only collection.
    ReadonlyList,

    /// The type is a resizable fixed-order collection.
    Array,

    /// The type is a mutable list.
    List,

    /// The type is a mutable list with change notifications.
    ObservableList,

    /// The type is a read-only key-value collection.
    ReadonlyDictionary,

    /// The type is a mutable key-value collection.
    Dictionary,
}

impl Display for TypeCategory {
    #[inline(always)]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.interface_name())
    }
}

impl TypeCategory {
    /// Classifies the shape by the following priority:
    ///
    /// Function, Dictionary, ReadonlyDictionary, ObservableList, List, Array,
    /// ReadonlyList, Enumerable, and finally NonGeneric.
    ///
    /// A shape that implements several unrelated interfaces (e.g. both a
    /// dictionary and a list) is classified by the first interface in this
    /// order.
    pub const fn resolve(shape: Shape) -> Self {
        if shape.contains(Shape::FUNCTION) {
            return Self::Function;
        }

        if shape.contains(Shape::DICTIONARY) {
            return Self::Dictionary;
        }

        if shape.contains(Shape::READONLY_DICTIONARY) {
            return Self::ReadonlyDictionary;
        }

        if shape.contains(Shape::OBSERVABLE_LIST) {
            return Self::ObservableList;
        }

        if shape.contains(Shape::LIST) {
            return Self::List;
        }

        if shape.contains(Shape::ARRAY) {
            return Self::Array;
        }

        if shape.contains(Shape::READONLY_LIST) {
            return Self::ReadonlyList;
        }

        if shape.contains(Shape::ENUMERABLE) {
            return Self::Enumerable;
        }

        Self::NonGeneric
    }

    /// Returns the name of the universal interface type that represents this
    /// category in the type manager.
    pub const fn interface_name(self) -> &'static str {
        match self {
            Self::NonGeneric => "Object",
            Self::Function => "Function",
            Self::Enumerable => "Enumerable",
            Self::ReadonlyList => "ReadonlyList",
            Self::Array => "Array",
            Self::List => "List",
            Self::ObservableList => "ObservableList",
            Self::ReadonlyDictionary => "ReadonlyDictionary",
            Self::Dictionary => "Dictionary",
        }
    }

    /// Returns the shape that corresponds to this category.
    pub const fn shape(self) -> Shape {
        match self {
            Self::NonGeneric => Shape::NON_GENERIC,
            Self::Function => Shape::FUNCTION,
            Self::Enumerable => Shape::ENUMERABLE,
            Self::ReadonlyList => Shape::READONLY_LIST,
            Self::Array => Shape::ARRAY,
            Self::List => Shape::LIST,
            Self::ObservableList => Shape::OBSERVABLE_LIST,
            Self::ReadonlyDictionary => Shape::READONLY_DICTIONARY,
            Self::Dictionary => Shape::DICTIONARY,
        }
    }

    /// Returns true if the values of this category are boxed as wrappers over
    /// native collections.
    #[inline(always)]
    pub const fn is_collection(self) -> bool {
        !matches!(self, Self::NonGeneric | Self::Function)
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::{Shape, TypeCategory};

    #[test]
    fn test_category_priority() {
        assert_eq!(
            TypeCategory::resolve(Shape::NON_GENERIC),
            TypeCategory::NonGeneric,
        );
        assert_eq!(
            TypeCategory::resolve(Shape::ENUMERABLE),
            TypeCategory::Enumerable,
        );
        assert_eq!(TypeCategory::resolve(Shape::LIST), TypeCategory::List);
        assert_eq!(
            TypeCategory::resolve(Shape::OBSERVABLE_LIST),
            TypeCategory::ObservableList,
        );
        assert_eq!(TypeCategory::resolve(Shape::ARRAY), TypeCategory::Array);

        assert_eq!(
            TypeCategory::resolve(Shape::LIST | Shape::DICTIONARY),
            TypeCategory::Dictionary,
        );
        assert_eq!(
            TypeCategory::resolve(Shape::FUNCTION | Shape::LIST),
            TypeCategory::Function,
        );
        assert_eq!(
            TypeCategory::resolve(Shape::ARRAY | Shape::LIST),
            TypeCategory::List,
        );
        assert_eq!(
            TypeCategory::resolve(Shape::READONLY_DICTIONARY | Shape::OBSERVABLE_LIST),
            TypeCategory::ReadonlyDictionary,
        );
    }

    #[test]
    fn test_category_shape() {
        for category in [
            TypeCategory::NonGeneric,
            TypeCategory::Function,
            TypeCategory::Enumerable,
            TypeCategory::ReadonlyList,
            TypeCategory::Array,
            TypeCategory::List,
            TypeCategory::ObservableList,
            TypeCategory::ReadonlyDictionary,
            TypeCategory::Dictionary,
        ] {
            assert_eq!(TypeCategory::resolve(category.shape()), category);
        }

        assert!(Shape::OBSERVABLE_LIST.contains(Shape::READONLY_LIST));
        assert!(!Shape::ARRAY.contains(Shape::LIST));
        assert_eq!(TypeCategory::NonGeneric.interface_name(), "Object");
    }
}
