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
    error::Error as StdError,
    fmt::{Debug, Display, Formatter},
    result::Result as StdResult,
};

use compact_str::CompactString;
use strsim::normalized_damerau_levenshtein;

#[cfg(feature = "reduced-metadata")]
use crate::report::system_panic;

/// A result of a runtime API call, which can either be a normal value or a
/// [RuntimeError].
pub type RuntimeResult<T> = StdResult<T, RuntimeError>;

/// A helper trait for the [RuntimeResult] object.
///
/// This trait is automatically implemented for RuntimeResult and provides the
/// [expect_blame](Self::expect_blame) function, which either unwraps the
/// underlying value or panics with the error description.
pub trait RuntimeResultExt {
    /// The [Ok] type of the underlying [Result].
    type OkType;

    /// If the result is [Ok], returns the underlying data; otherwise, panics
    /// with the `message` followed by the error description.
    fn expect_blame(self, message: &str) -> Self::OkType;
}

impl<T> RuntimeResultExt for RuntimeResult<T> {
    type OkType = T;

    #[inline(always)]
    #[track_caller]
    fn expect_blame(self, message: &str) -> Self::OkType {
        match self {
            Ok(ok) => ok,
            Err(error) => panic!("{message}\n{error}"),
        }
    }
}

/// Represents any error that may occur during boxing, unboxing, member access
/// or invocation of the reflected data.
///
/// The [Display] implementation provides a brief description of the
/// underlying error.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum RuntimeError {
    /// The [Value](crate::runtime::Value) payload kind or its dynamic type does
    /// not match the statically expected type.
    TypeMismatch {
        /// The diagnostic name of the parameter being unboxed, if known.
        name: Option<CompactString>,

        /// The name of the expected type.
        expected: CompactString,

        /// The name of the actual type, or the name of the payload kind.
        actual: CompactString,
    },

    /// The number of the invocation arguments differs from the number of the
    /// declared parameters.
    ArgumentCountMismatch {
        /// The name of the method group being invoked, if known.
        group: Option<CompactString>,

        /// The number of the declared parameters.
        expected: usize,

        /// The number of the provided arguments.
        actual: usize,
    },

    /// The requested member is not registered in the type descriptor.
    MemberNotFound {
        /// The kind of the member.
        kind: MemberKind,

        /// The name of the type being searched.
        owner: CompactString,

        /// The requested member name.
        name: CompactString,

        /// The closest registered member name, if any.
        suggestion: Option<CompactString>,
    },

    /// The requested type is not registered in the type manager.
    TypeNotFound {
        /// The requested type name.
        name: CompactString,

        /// The closest registered type name, if any.
        suggestion: Option<CompactString>,
    },

    /// A forced disposal of an object which is still referenced by shared
    /// pointers.
    NotDisposable {
        /// The name of the object's type.
        type_name: CompactString,

        /// The value of the object's reference counter at the time of the
        /// disposal request.
        counter: usize,
    },

    /// An attempt to read a property that does not have a getter.
    NotReadable {
        /// The name of the type that owns the property.
        owner: CompactString,

        /// The name of the property.
        property: CompactString,
    },

    /// An attempt to write a property that does not have a setter.
    NotWritable {
        /// The name of the type that owns the property.
        owner: CompactString,

        /// The name of the property.
        property: CompactString,
    },

    /// A required receiver or argument is null.
    NullArgument {
        /// The diagnostic name of the argument.
        name: CompactString,
    },

    /// An access to an object or a native collection that has already been
    /// disposed.
    ObjectDisposed {
        /// The name of the disposed object's type.
        type_name: CompactString,
    },

    /// An enumerator reported an element at the `index` but provided no
    /// current value.
    EnumeratorOutOfRange {
        /// The position the enumerator advanced to.
        index: usize,
    },

    /// An indexed access outside of the collection bounds.
    OutOfBounds {
        /// The requested index.
        index: usize,

        /// The actual length of the collection.
        length: usize,
    },

    /// A dictionary does not contain the requested key.
    KeyNotFound {
        /// The debug representation of the requested key.
        key: CompactString,
    },

    /// The text cannot be deserialized into a value of the primitive type.
    Deserialize {
        /// The name of the primitive type.
        type_name: CompactString,

        /// The source text.
        text: CompactString,
    },

    /// The type does not provide a serializer.
    NotSerializable {
        /// The name of the type.
        type_name: CompactString,
    },
}

impl Display for RuntimeError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TypeMismatch {
                name: Some(name),
                expected,
                actual,
            } => formatter.write_fmt(format_args!(
                "argument {name:?} cannot convert from '{actual}' to '{expected}'",
            )),

            Self::TypeMismatch {
                name: None,
                expected,
                actual,
            } => formatter.write_fmt(format_args!(
                "cannot convert from '{actual}' to '{expected}'",
            )),

            Self::ArgumentCountMismatch {
                group: Some(group),
                expected,
                actual,
            } => formatter.write_fmt(format_args!(
                "{group:?} expects {expected} arguments, but {actual} provided",
            )),

            Self::ArgumentCountMismatch {
                group: None,
                expected,
                actual,
            } => formatter.write_fmt(format_args!(
                "expected {expected} arguments, but {actual} provided",
            )),

            Self::MemberNotFound {
                kind,
                owner,
                name,
                suggestion,
            } => {
                formatter.write_fmt(format_args!("{kind} {name:?} not found in '{owner}'"))?;

                if let Some(suggestion) = suggestion {
                    formatter.write_fmt(format_args!(", did you mean {suggestion:?}?"))?;
                }

                Ok(())
            }

            Self::TypeNotFound { name, suggestion } => {
                formatter.write_fmt(format_args!("type {name:?} not found"))?;

                if let Some(suggestion) = suggestion {
                    formatter.write_fmt(format_args!(", did you mean {suggestion:?}?"))?;
                }

                Ok(())
            }

            Self::NotDisposable { type_name, counter } => formatter.write_fmt(format_args!(
                "cannot dispose '{type_name}' instance referenced {counter} times",
            )),

            Self::NotReadable { owner, property } => formatter.write_fmt(format_args!(
                "property {property:?} of '{owner}' is not readable",
            )),

            Self::NotWritable { owner, property } => formatter.write_fmt(format_args!(
                "property {property:?} of '{owner}' is not writable",
            )),

            Self::NullArgument { name } => {
                formatter.write_fmt(format_args!("argument {name:?} is null"))
            }

            Self::ObjectDisposed { type_name } => {
                formatter.write_fmt(format_args!("'{type_name}' instance has been disposed"))
            }

            Self::EnumeratorOutOfRange { index } => formatter.write_fmt(format_args!(
                "enumerator advanced to element {index} without providing it"
            )),

            Self::OutOfBounds { index, length } => {
                formatter.write_fmt(format_args!("index {index} out of 0..{length} bounds"))
            }

            Self::KeyNotFound { key } => formatter.write_fmt(format_args!("key {key} not found")),

            Self::Deserialize { type_name, text } => formatter.write_fmt(format_args!(
                "cannot deserialize {text:?} as '{type_name}'",
            )),

            Self::NotSerializable { type_name } => {
                formatter.write_fmt(format_args!("'{type_name}' is not serializable"))
            }
        }
    }
}

impl StdError for RuntimeError {}

impl RuntimeError {
    /// Returns the diagnostic parameter name associated with this error, if
    /// any.
    pub fn parameter_name(&self) -> Option<&str> {
        match self {
            Self::TypeMismatch { name, .. } => name.as_deref(),
            Self::NullArgument { name } => Some(name.as_str()),
            _ => None,
        }
    }
}

/// A kind of the type member used in the [RuntimeError::MemberNotFound] error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// A type property.
    Property,

    /// A named group of methods.
    Method,

    /// A type event.
    Event,

    /// A group of type constructors.
    Constructor,
}

impl Display for MemberKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Property => formatter.write_str("property"),
            Self::Method => formatter.write_str("method"),
            Self::Event => formatter.write_str("event"),
            Self::Constructor => formatter.write_str("constructor"),
        }
    }
}

// In the reduced-metadata build, every detected failure is fatal.
#[inline(always)]
pub(crate) fn fail<T>(error: RuntimeError) -> RuntimeResult<T> {
    #[cfg(feature = "reduced-metadata")]
    {
        let _ = error;
        system_panic!("Reflection failure.");
    }

    #[cfg(not(feature = "reduced-metadata"))]
    Err(error)
}

#[inline]
pub(crate) fn type_mismatch<T>(
    name: Option<&str>,
    expected: impl Display,
    actual: impl Display,
) -> RuntimeResult<T> {
    fail(RuntimeError::TypeMismatch {
        name: name.map(CompactString::from),
        expected: CompactString::from(expected.to_string()),
        actual: CompactString::from(actual.to_string()),
    })
}

const CLOSENESS_THRESHOLD: f64 = 0.5;

pub(crate) fn suggest<'a>(
    pattern: &str,
    candidates: impl IntoIterator<Item = &'a str>,
) -> Option<CompactString> {
    let mut best = None;
    let mut best_closeness = CLOSENESS_THRESHOLD;

    for candidate in candidates {
        let closeness = normalized_damerau_levenshtein(pattern, candidate);

        if closeness > best_closeness {
            best_closeness = closeness;
            best = Some(candidate);
        }
    }

    best.map(CompactString::from)
}

#[cfg(test)]
mod tests {
    use compact_str::CompactString;

    use crate::runtime::{error::suggest, MemberKind, RuntimeError};

    #[test]
    fn test_type_mismatch_display() {
        let named = RuntimeError::TypeMismatch {
            name: Some(CompactString::from("bases")),
            expected: CompactString::from("List<i32>"),
            actual: CompactString::from("bool"),
        };

        assert_eq!(
            named.to_string(),
            r#"argument "bases" cannot convert from 'bool' to 'List<i32>'"#,
        );
        assert_eq!(named.parameter_name(), Some("bases"));

        let anonymous = RuntimeError::TypeMismatch {
            name: None,
            expected: CompactString::from("i32"),
            actual: CompactString::from("null"),
        };

        assert_eq!(anonymous.to_string(), "cannot convert from 'null' to 'i32'");
        assert_eq!(anonymous.parameter_name(), None);
    }

    #[test]
    fn test_member_suggestion() {
        assert_eq!(
            suggest("Resett", ["Reset", "Clear", "Add"]).as_deref(),
            Some("Reset"),
        );
        assert_eq!(suggest("zzz", ["Reset", "Clear"]), None);

        let error = RuntimeError::MemberNotFound {
            kind: MemberKind::Method,
            owner: CompactString::from("Derived"),
            name: CompactString::from("Resett"),
            suggestion: Some(CompactString::from("Reset")),
        };

        assert_eq!(
            error.to_string(),
            r#"method "Resett" not found in 'Derived', did you mean "Reset"?"#,
        );
    }
}
