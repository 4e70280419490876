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
    fmt::Debug,
    ops::{Deref, DerefMut},
    sync::Arc,
};

use compact_str::CompactString;

use crate::runtime::{
    error::{fail, type_mismatch},
    Pointee,
    Ptr,
    Raw,
    RuntimeError,
    RuntimeResult,
    Shape,
    TypeCategory,
    TypeDescriptor,
    TypeInfo,
    Value,
};

/// A Rust type that can cross the reflection boundary.
///
/// The trait declares the type's [shape](Reflect::SHAPE), creates the type's
/// [TypeInfo], and converts the data between the Rust type and the universal
/// [Value] container.
///
/// The crate implements this trait for the primitive types, the [Ptr] and
/// [Raw] pointers, the [Option] of value types, the [Value] itself, the
/// [Func](crate::runtime::Func) callables, and the native containers from the
/// [collections](crate::collections) module. Custom value types (structs and
/// enums boxed by copy) implement it through the [reflect_value](crate::reflect_value)
/// macro.
pub trait Reflect: Sized + Send + Sync + 'static {
    /// The set of universal interfaces implemented by this type.
    const SHAPE: Shape = Shape::NON_GENERIC;

    /// The category of this type resolved from the [SHAPE](Reflect::SHAPE).
    const CATEGORY: TypeCategory = TypeCategory::resolve(Self::SHAPE);

    /// Creates a description of this type.
    ///
    /// Use [TypeInfo::of] to get the cached instance.
    fn create_type_info() -> TypeInfo;

    /// Converts the data into the universal [Value] container.
    ///
    /// The optional `descriptor` is the declared type of the boxed data. If
    /// omitted, the descriptor is looked up by the Rust type.
    fn box_parameter(self, descriptor: Option<&Arc<TypeDescriptor>>) -> RuntimeResult<Value>;

    /// Recovers the data from the universal [Value] container.
    ///
    /// The optional `name` is the diagnostic name of the parameter being
    /// unboxed. Every failure reported by this function refers to this name.
    fn unbox_parameter(
        value: &Value,
        descriptor: Option<&Arc<TypeDescriptor>>,
        name: Option<&str>,
    ) -> RuntimeResult<Unboxed<Self>>;

    /// Returns true if the [unbox_parameter](Reflect::unbox_parameter) would
    /// succeed for the `value`.
    ///
    /// Unlike unboxing, this function never fails and never copies the
    /// data.
    fn try_satisfies(value: &Value) -> bool;
}

/// A transient result of unboxing.
///
/// The Alias variant refers to already existing native data: an object or a
/// native container that the [Value] wrapped. Changes made through the alias
/// are observable through the original data.
///
/// The Owned variant holds a fresh copy of the data that is independent of the
/// unboxed Value.
#[derive(Debug)]
pub enum Unboxed<T> {
    /// The handle to the existing native data.
    Alias(T),

    /// A freshly constructed native data.
    Owned(T),
}

impl<T> Deref for Unboxed<T> {
    type Target = T;

    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        self.get()
    }
}

impl<T> DerefMut for Unboxed<T> {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self {
            Self::Alias(data) => data,
            Self::Owned(data) => data,
        }
    }
}

impl<T> Unboxed<T> {
    /// Returns true if the data is a fresh copy.
    #[inline(always)]
    pub fn is_owned(&self) -> bool {
        matches!(self, Self::Owned(_))
    }

    #[inline(always)]
    pub fn get(&self) -> &T {
        match self {
            Self::Alias(data) => data,
            Self::Owned(data) => data,
        }
    }

    #[inline(always)]
    pub fn into_inner(self) -> T {
        match self {
            Self::Alias(data) => data,
            Self::Owned(data) => data,
        }
    }
}

/// The boxing layer for the non-generic types: pointers, optional values, and
/// plain values boxed by copy.
pub trait ValueBoxing: Sized {
    /// Converts the data into the universal [Value] container.
    fn box_value(self, descriptor: Option<&Arc<TypeDescriptor>>) -> RuntimeResult<Value>;

    /// Recovers the data from the universal [Value] container.
    ///
    /// Unboxing the null Value succeeds only for the [Raw] pointers (producing
    /// a null pointer) and the [Option] types (producing None).
    fn unbox_value(
        value: &Value,
        descriptor: Option<&Arc<TypeDescriptor>>,
        name: Option<&str>,
    ) -> RuntimeResult<Self>;

    /// Returns true if the [unbox_value](ValueBoxing::unbox_value) would
    /// succeed for the `value`.
    fn satisfies_value(value: &Value) -> bool;
}

/// A plain data type boxed into the [Value] by copy.
///
/// Implement this trait through the [reflect_value](crate::reflect_value)
/// macro.
///
/// The boxed values are compared through the [PartialOrd] implementation.
/// The derived implementation compares the struct fields in declaration order
/// and the enum variants by discriminant.
pub trait ValueType: Reflect + Clone + Debug + PartialOrd {}

/// Implements the [ValueType], [ValueBoxing], and [Reflect] traits for the
/// plain data types boxed by copy.
///
/// ```
/// use ad_astra_reflect::{reflect_value, runtime::Value};
///
/// #[derive(Clone, Debug, PartialEq, PartialOrd)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// reflect_value!(Point);
///
/// let boxed = Value::give(Point { x: 1, y: 2 }).unwrap();
///
/// assert_eq!(boxed.unbox::<Point>().unwrap().x, 1);
/// assert!(boxed < Value::give(Point { x: 1, y: 3 }).unwrap());
/// ```
#[macro_export]
macro_rules! reflect_value {
    ($($ty:ty),+ $(,)?) => {
        $(
        impl $crate::runtime::ValueType for $ty {}

        impl $crate::runtime::ValueBoxing for $ty {
            #[inline(always)]
            fn box_value(
                self,
                descriptor: ::std::option::Option<
                    &::std::sync::Arc<$crate::runtime::TypeDescriptor>,
                >,
            ) -> $crate::runtime::RuntimeResult<$crate::runtime::Value> {
                ::std::result::Result::Ok($crate::runtime::Value::from_data(
                    self,
                    descriptor.cloned(),
                ))
            }

            #[inline(always)]
            fn unbox_value(
                value: &$crate::runtime::Value,
                _descriptor: ::std::option::Option<
                    &::std::sync::Arc<$crate::runtime::TypeDescriptor>,
                >,
                name: ::std::option::Option<&str>,
            ) -> $crate::runtime::RuntimeResult<Self> {
                $crate::runtime::unbox_data::<Self>(value, name)
            }

            #[inline(always)]
            fn satisfies_value(value: &$crate::runtime::Value) -> bool {
                value.downcast_ref::<Self>().is_some()
            }
        }

        impl $crate::runtime::Reflect for $ty {
            #[inline(always)]
            fn create_type_info() -> $crate::runtime::TypeInfo {
                $crate::runtime::TypeInfo::by_descriptor::<Self>()
            }

            #[inline(always)]
            fn box_parameter(
                self,
                descriptor: ::std::option::Option<
                    &::std::sync::Arc<$crate::runtime::TypeDescriptor>,
                >,
            ) -> $crate::runtime::RuntimeResult<$crate::runtime::Value> {
                $crate::runtime::ValueBoxing::box_value(self, descriptor)
            }

            #[inline(always)]
            fn unbox_parameter(
                value: &$crate::runtime::Value,
                descriptor: ::std::option::Option<
                    &::std::sync::Arc<$crate::runtime::TypeDescriptor>,
                >,
                name: ::std::option::Option<&str>,
            ) -> $crate::runtime::RuntimeResult<$crate::runtime::Unboxed<Self>> {
                ::std::result::Result::Ok($crate::runtime::Unboxed::Owned(
                    <Self as $crate::runtime::ValueBoxing>::unbox_value(value, descriptor, name)?,
                ))
            }

            #[inline(always)]
            fn try_satisfies(value: &$crate::runtime::Value) -> bool {
                <Self as $crate::runtime::ValueBoxing>::satisfies_value(value)
            }
        }
        )+
    };
}

/// Copies the plain data of type `T` out of the boxed [Value].
///
/// Fails with the [RuntimeError::TypeMismatch] error if the Value is not a
/// boxed `T`.
pub fn unbox_data<T: ValueType>(value: &Value, name: Option<&str>) -> RuntimeResult<T> {
    match value.downcast_ref::<T>() {
        Some(data) => Ok(data.clone()),
        None => type_mismatch(name, TypeInfo::of::<T>(), value.type_name()),
    }
}

impl<T: ?Sized + Pointee> ValueBoxing for Ptr<T> {
    #[inline(always)]
    fn box_value(self, _descriptor: Option<&Arc<TypeDescriptor>>) -> RuntimeResult<Value> {
        Ok(Value::from_ptr(self))
    }

    fn unbox_value(
        value: &Value,
        _descriptor: Option<&Arc<TypeDescriptor>>,
        name: Option<&str>,
    ) -> RuntimeResult<Self> {
        let Some(root) = value.live_object(name)? else {
            return type_mismatch(name, TypeInfo::of::<Self>(), value.type_name());
        };

        match T::cast(&root) {
            Some(target) => Ok(Ptr::from_arc(target)),
            None => type_mismatch(name, TypeInfo::of::<Self>(), value.type_name()),
        }
    }

    fn satisfies_value(value: &Value) -> bool {
        match value.peek_object() {
            Some(root) => T::cast(&root).is_some(),
            None => false,
        }
    }
}

impl<T: ?Sized + Pointee> Reflect for Ptr<T> {
    #[inline(always)]
    fn create_type_info() -> TypeInfo {
        TypeInfo::shared(Arc::new(TypeInfo::by_descriptor::<T>()))
    }

    #[inline(always)]
    fn box_parameter(self, descriptor: Option<&Arc<TypeDescriptor>>) -> RuntimeResult<Value> {
        self.box_value(descriptor)
    }

    #[inline(always)]
    fn unbox_parameter(
        value: &Value,
        descriptor: Option<&Arc<TypeDescriptor>>,
        name: Option<&str>,
    ) -> RuntimeResult<Unboxed<Self>> {
        Ok(Unboxed::Alias(Self::unbox_value(value, descriptor, name)?))
    }

    #[inline(always)]
    fn try_satisfies(value: &Value) -> bool {
        Self::satisfies_value(value)
    }
}

impl<T: ?Sized + Pointee> ValueBoxing for Raw<T> {
    fn box_value(self, _descriptor: Option<&Arc<TypeDescriptor>>) -> RuntimeResult<Value> {
        if self.is_null() {
            return Ok(Value::null());
        }

        match self.get() {
            Some(target) => Ok(Value::from_raw(&target)),

            None => fail(RuntimeError::ObjectDisposed {
                type_name: CompactString::from(TypeInfo::of::<Self>().to_string()),
            }),
        }
    }

    fn unbox_value(
        value: &Value,
        _descriptor: Option<&Arc<TypeDescriptor>>,
        name: Option<&str>,
    ) -> RuntimeResult<Self> {
        if value.is_null() {
            return Ok(Raw::null());
        }

        let Some(root) = value.live_object(name)? else {
            return type_mismatch(name, TypeInfo::of::<Self>(), value.type_name());
        };

        match T::cast(&root) {
            Some(target) => Ok(Raw::new(&target)),
            None => type_mismatch(name, TypeInfo::of::<Self>(), value.type_name()),
        }
    }

    fn satisfies_value(value: &Value) -> bool {
        if value.is_null() {
            return true;
        }

        match value.peek_object() {
            Some(root) => T::cast(&root).is_some(),
            None => false,
        }
    }
}

impl<T: ?Sized + Pointee> Reflect for Raw<T> {
    #[inline(always)]
    fn create_type_info() -> TypeInfo {
        TypeInfo::raw(Arc::new(TypeInfo::by_descriptor::<T>()))
    }

    #[inline(always)]
    fn box_parameter(self, descriptor: Option<&Arc<TypeDescriptor>>) -> RuntimeResult<Value> {
        self.box_value(descriptor)
    }

    #[inline(always)]
    fn unbox_parameter(
        value: &Value,
        descriptor: Option<&Arc<TypeDescriptor>>,
        name: Option<&str>,
    ) -> RuntimeResult<Unboxed<Self>> {
        Ok(Unboxed::Alias(Self::unbox_value(value, descriptor, name)?))
    }

    #[inline(always)]
    fn try_satisfies(value: &Value) -> bool {
        Self::satisfies_value(value)
    }
}

impl<T: ValueType + ValueBoxing> ValueBoxing for Option<T> {
    #[inline]
    fn box_value(self, descriptor: Option<&Arc<TypeDescriptor>>) -> RuntimeResult<Value> {
        match self {
            None => Ok(Value::null()),
            Some(data) => data.box_value(descriptor),
        }
    }

    #[inline]
    fn unbox_value(
        value: &Value,
        descriptor: Option<&Arc<TypeDescriptor>>,
        name: Option<&str>,
    ) -> RuntimeResult<Self> {
        if value.is_null() {
            return Ok(None);
        }

        Ok(Some(T::unbox_value(value, descriptor, name)?))
    }

    #[inline]
    fn satisfies_value(value: &Value) -> bool {
        value.is_null() || T::satisfies_value(value)
    }
}

impl<T: ValueType + ValueBoxing> Reflect for Option<T> {
    #[inline(always)]
    fn create_type_info() -> TypeInfo {
        TypeInfo::nullable(TypeInfo::of::<T>())
    }

    #[inline(always)]
    fn box_parameter(self, descriptor: Option<&Arc<TypeDescriptor>>) -> RuntimeResult<Value> {
        self.box_value(descriptor)
    }

    #[inline(always)]
    fn unbox_parameter(
        value: &Value,
        descriptor: Option<&Arc<TypeDescriptor>>,
        name: Option<&str>,
    ) -> RuntimeResult<Unboxed<Self>> {
        Ok(Unboxed::Owned(Self::unbox_value(value, descriptor, name)?))
    }

    #[inline(always)]
    fn try_satisfies(value: &Value) -> bool {
        Self::satisfies_value(value)
    }
}

impl Reflect for Value {
    #[inline(always)]
    fn create_type_info() -> TypeInfo {
        TypeInfo::by_name(TypeCategory::NonGeneric.interface_name())
    }

    #[inline(always)]
    fn box_parameter(self, _descriptor: Option<&Arc<TypeDescriptor>>) -> RuntimeResult<Value> {
        Ok(self)
    }

    #[inline(always)]
    fn unbox_parameter(
        value: &Value,
        _descriptor: Option<&Arc<TypeDescriptor>>,
        _name: Option<&str>,
    ) -> RuntimeResult<Unboxed<Self>> {
        Ok(Unboxed::Alias(value.clone()))
    }

    #[inline(always)]
    fn try_satisfies(_value: &Value) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::runtime::{
        aggregate,
        ObjectBase,
        Ptr,
        Raw,
        Reflect,
        Reflectable,
        RuntimeError,
        Value,
        ValueKind,
    };

    #[derive(Default)]
    struct Engine {
        object: ObjectBase,
    }

    impl Reflectable for Engine {
        fn object(&self) -> &ObjectBase {
            &self.object
        }
    }

    #[derive(Default)]
    struct Wheel {
        object: ObjectBase,
    }

    impl Reflectable for Wheel {
        fn object(&self) -> &ObjectBase {
            &self.object
        }
    }

    #[test]
    fn test_primitive_round_trip() {
        for number in [i64::MIN, -1, 0, 1, i64::MAX] {
            let boxed = Value::give(number).unwrap();

            assert_eq!(boxed.kind(), ValueKind::Boxed);
            assert_eq!(*boxed.unbox::<i64>().unwrap(), number);
        }

        let boxed = Value::give(String::from("text")).unwrap();
        let copy = boxed.clone();

        assert_eq!(copy.unbox::<String>().unwrap().as_str(), "text");
        assert!(copy.unbox::<String>().unwrap().is_owned());
        assert_eq!(boxed, copy);

        assert!(i32::try_satisfies(&Value::give(5i32).unwrap()));
        assert!(!i32::try_satisfies(&Value::give(5i64).unwrap()));
    }

    #[test]
    fn test_type_mismatch() {
        let boxed = Value::give(true).unwrap();

        match boxed.unbox::<i32>() {
            Err(RuntimeError::TypeMismatch {
                expected, actual, ..
            }) => {
                assert_eq!(expected, "i32");
                assert_eq!(actual, "bool");
            }

            other => panic!("unexpected result: {other:?}"),
        }

        match i32::unbox_parameter(&Value::null(), None, Some("count")) {
            Err(RuntimeError::TypeMismatch { name, actual, .. }) => {
                assert_eq!(name.as_deref(), Some("count"));
                assert_eq!(actual, "null");
            }

            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_nullable() {
        assert!(Value::give(None::<i32>).unwrap().is_null());
        assert_eq!(*Value::null().unbox::<Option<i32>>().unwrap(), None);

        let boxed = Value::give(Some(7u16)).unwrap();

        assert_eq!(*boxed.unbox::<Option<u16>>().unwrap(), Some(7));
        assert_eq!(*boxed.unbox::<u16>().unwrap(), 7);
    }

    #[test]
    fn test_pointer_round_trip() {
        let engine = Arc::new(Engine::default());
        let wheel = Arc::new(Wheel::default());

        let wheel_object: Arc<dyn Reflectable> = wheel.clone();

        aggregate(&(engine.clone() as Arc<dyn Reflectable>), [wheel_object]);

        let first = Value::give(Raw::new(&wheel)).unwrap();
        let second = Value::give(Raw::new(&engine)).unwrap();

        assert_eq!(first.kind(), ValueKind::RawPtr);
        assert_eq!(first, second);
        assert_eq!(engine.object().counter(), 0);

        let unboxed = first.unbox::<Raw<Engine>>().unwrap();

        assert!(!unboxed.is_owned());
        assert!(Arc::ptr_eq(&unboxed.get().get().unwrap(), &engine));

        let unboxed = second.unbox::<Raw<Wheel>>().unwrap();

        assert!(Arc::ptr_eq(&unboxed.get().get().unwrap(), &wheel));

        let null = Value::null().unbox::<Raw<Wheel>>().unwrap();

        assert!(null.is_null());
        assert!(Value::null().unbox::<Ptr<Wheel>>().is_err());

        {
            let shared = Value::give(Ptr::from_arc(wheel.clone())).unwrap();

            assert_eq!(shared.kind(), ValueKind::SharedPtr);
            assert_eq!(engine.object().counter(), 1);
            assert_eq!(shared, first);

            let ptr = shared.unbox::<Ptr<Engine>>().unwrap().into_inner();

            assert_eq!(engine.object().counter(), 2);
            assert!(Arc::ptr_eq(ptr.as_arc(), &engine));
        }

        assert!(engine.object().is_disposed());

        match first.unbox::<Ptr<Engine>>() {
            Err(RuntimeError::ObjectDisposed { .. }) => (),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_value_identity() {
        let boxed = Value::give(3.5f64).unwrap();
        let unboxed = boxed.unbox::<Value>().unwrap();

        assert_eq!(*unboxed, boxed);
        assert!(Value::try_satisfies(&Value::null()));
    }
}
