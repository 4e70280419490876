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
    any::{type_name, Any},
    cmp::Ordering,
    fmt::{Debug, Formatter},
    sync::{Arc, Weak},
};

use compact_str::CompactString;

use crate::runtime::{
    aggregation::{aggregation_root, force_dispose},
    error::{fail, type_mismatch},
    object::object_address,
    object_descriptor_in,
    object_type_name,
    Pointee,
    Ptr,
    Reflect,
    Reflectable,
    RuntimeError,
    RuntimeResult,
    TypeCategory,
    TypeDescriptor,
    TypeManager,
    Unboxed,
    ValueType,
};

/// A universal dynamically typed container of the reflected data.
///
/// The Value is either:
///
///  - Null: no payload.
///  - RawPtr: a non-owning pointer to a [Reflectable] object. The Value does
///    not affect the object's lifetime.
///  - SharedPtr: an owning pointer to a Reflectable object.
///  - Boxed: a copy of plain data (a primitive, a struct, or an enum) tagged
///    with the data's type.
///
/// The pointer states always refer to the
/// [aggregation root](crate::runtime::aggregation_root) of the object.
///
/// Cloning the Value copies the boxed data, and shares the referenced object
/// for the pointer states.
///
/// The Values are ordered as follows: Null is less than any pointer, and any
/// pointer is less than any boxed data. The pointers compare by the identity
/// of the referenced objects. Boxed data of the same type compare through the
/// type's [PartialOrd] implementation, and boxed data of different types are
/// not comparable.
pub struct Value {
    inner: ValueInner,
}

enum ValueInner {
    Null,
    RawPtr(Weak<dyn Reflectable>),
    SharedPtr(Ptr<dyn Reflectable>),
    Boxed {
        payload: Box<dyn BoxedPayload>,
        descriptor: Option<Arc<TypeDescriptor>>,
    },
}

/// A state of the [Value].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    RawPtr,
    SharedPtr,
    Boxed,
}

trait BoxedPayload: Send + Sync + 'static {
    fn copy(&self) -> Box<dyn BoxedPayload>;

    fn compare(&self, other: &dyn BoxedPayload) -> Option<Ordering>;

    fn payload(&self) -> &(dyn Any + Send + Sync);

    fn payload_type_name(&self) -> &'static str;

    fn fmt_payload(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result;
}

struct Boxed<T: ValueType>(T);

impl<T: ValueType> BoxedPayload for Boxed<T> {
    #[inline(always)]
    fn copy(&self) -> Box<dyn BoxedPayload> {
        Box::new(Self(self.0.clone()))
    }

    #[inline(always)]
    fn compare(&self, other: &dyn BoxedPayload) -> Option<Ordering> {
        let other = other.payload().downcast_ref::<T>()?;

        self.0.partial_cmp(other)
    }

    #[inline(always)]
    fn payload(&self) -> &(dyn Any + Send + Sync) {
        &self.0
    }

    #[inline(always)]
    fn payload_type_name(&self) -> &'static str {
        type_name::<T>()
    }

    #[inline(always)]
    fn fmt_payload(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.0, formatter)
    }
}

impl Default for Value {
    #[inline(always)]
    fn default() -> Self {
        Self::null()
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        let inner = match &self.inner {
            ValueInner::Null => ValueInner::Null,
            ValueInner::RawPtr(object) => ValueInner::RawPtr(object.clone()),
            ValueInner::SharedPtr(ptr) => ValueInner::SharedPtr(ptr.clone()),
            ValueInner::Boxed {
                payload,
                descriptor,
            } => ValueInner::Boxed {
                payload: payload.copy(),
                descriptor: descriptor.clone(),
            },
        };

        Self { inner }
    }
}

impl Debug for Value {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            ValueInner::Null => formatter.write_str("null"),

            ValueInner::RawPtr(object) => match object.upgrade() {
                Some(object) => formatter.write_fmt(format_args!(
                    "Raw({} @ {:#x})",
                    object_type_name(object.as_ref()),
                    object_address(&object),
                )),

                None => formatter.write_str("Raw(disposed)"),
            },

            ValueInner::SharedPtr(ptr) => Debug::fmt(ptr, formatter),

            ValueInner::Boxed { payload, .. } => payload.fmt_payload(formatter),
        }
    }
}

impl PartialEq for Value {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (&self.inner, &other.inner) {
            (ValueInner::Null, ValueInner::Null) => Some(Ordering::Equal),
            (ValueInner::Null, _) => Some(Ordering::Less),
            (_, ValueInner::Null) => Some(Ordering::Greater),

            (
                ValueInner::Boxed { payload: this, .. },
                ValueInner::Boxed { payload: other, .. },
            ) => this.compare(other.as_ref()),

            (ValueInner::Boxed { .. }, _) => Some(Ordering::Greater),
            (_, ValueInner::Boxed { .. }) => Some(Ordering::Less),

            _ => Some(self.address().cmp(&other.address())),
        }
    }
}

impl Value {
    /// Creates the Null value.
    #[inline(always)]
    pub const fn null() -> Self {
        Self {
            inner: ValueInner::Null,
        }
    }

    /// Boxes the Rust data into the Value.
    ///
    /// This is a shortcut for [Reflect::box_parameter] without the explicit
    /// type descriptor.
    #[inline(always)]
    pub fn give<T: Reflect>(data: T) -> RuntimeResult<Self> {
        data.box_parameter(None)
    }

    /// Unboxes the Rust data from the Value.
    ///
    /// This is a shortcut for [Reflect::unbox_parameter] without the explicit
    /// type descriptor and the diagnostic name.
    #[inline(always)]
    pub fn unbox<T: Reflect>(&self) -> RuntimeResult<Unboxed<T>> {
        T::unbox_parameter(self, None, None)
    }

    /// Creates a SharedPtr value that owns the aggregation root of the
    /// referenced object.
    #[inline]
    pub fn from_ptr<T: ?Sized + Pointee>(ptr: Ptr<T>) -> Self {
        Self {
            inner: ValueInner::SharedPtr(ptr.into_root()),
        }
    }

    /// Creates a RawPtr value that refers to the aggregation root of the
    /// object.
    #[inline]
    pub fn from_raw<T: ?Sized + Pointee>(object: &Arc<T>) -> Self {
        let root = aggregation_root(&T::upcast(object.clone()));

        Self {
            inner: ValueInner::RawPtr(Arc::downgrade(&root)),
        }
    }

    /// Creates a Boxed value over a copy of the plain data.
    ///
    /// If the `descriptor` is omitted, the Value resolves the descriptor by
    /// the Rust type of the data on demand.
    #[inline(always)]
    pub fn from_data<T: ValueType>(data: T, descriptor: Option<Arc<TypeDescriptor>>) -> Self {
        Self {
            inner: ValueInner::Boxed {
                payload: Box::new(Boxed(data)),
                descriptor,
            },
        }
    }

    #[inline(always)]
    pub fn kind(&self) -> ValueKind {
        match &self.inner {
            ValueInner::Null => ValueKind::Null,
            ValueInner::RawPtr(_) => ValueKind::RawPtr,
            ValueInner::SharedPtr(_) => ValueKind::SharedPtr,
            ValueInner::Boxed { .. } => ValueKind::Boxed,
        }
    }

    #[inline(always)]
    pub fn is_null(&self) -> bool {
        matches!(&self.inner, ValueInner::Null)
    }

    /// Returns a reference to the boxed data if the Value is a boxed `T`.
    #[inline]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        match &self.inner {
            ValueInner::Boxed { payload, .. } => payload.payload().downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Returns the object referenced by the pointer states.
    ///
    /// Fails with [RuntimeError::NullArgument] if the Value is Null, and with
    /// [RuntimeError::ObjectDisposed] if the object has been disposed.
    pub fn object(&self) -> RuntimeResult<Arc<dyn Reflectable>> {
        if self.is_null() {
            return fail(RuntimeError::NullArgument {
                name: CompactString::from("this"),
            });
        }

        match self.live_object(None)? {
            Some(object) => Ok(object),

            None => type_mismatch(
                None,
                TypeCategory::NonGeneric.interface_name(),
                self.type_name(),
            ),
        }
    }

    /// Returns the name of the Value's dynamic type.
    ///
    /// For the Null value the function returns "null".
    pub fn type_name(&self) -> CompactString {
        match &self.inner {
            ValueInner::Null => CompactString::from("null"),

            ValueInner::RawPtr(object) => match object.upgrade() {
                Some(object) => object_type_name(object.as_ref()),
                None => CompactString::from("disposed"),
            },

            ValueInner::SharedPtr(ptr) => object_type_name(ptr.root().as_ref()),

            ValueInner::Boxed {
                payload,
                descriptor,
            } => match descriptor {
                Some(descriptor) => CompactString::from(descriptor.name()),

                None => match TypeManager::global().type_by_id(payload.payload().type_id()) {
                    Some(descriptor) => CompactString::from(descriptor.name()),
                    None => CompactString::from(payload.payload_type_name()),
                },
            },
        }
    }

    /// Returns the runtime type descriptor of the Value's dynamic type.
    ///
    /// The lookup is performed in the [global](TypeManager::global) type
    /// manager.
    #[inline(always)]
    pub fn type_descriptor(&self) -> RuntimeResult<Arc<TypeDescriptor>> {
        self.type_descriptor_in(TypeManager::global())
    }

    /// Returns the runtime type descriptor of the Value's dynamic type
    /// registered in the `manager`.
    pub fn type_descriptor_in(&self, manager: &TypeManager) -> RuntimeResult<Arc<TypeDescriptor>> {
        match &self.inner {
            ValueInner::Null => fail(RuntimeError::NullArgument {
                name: CompactString::from("this"),
            }),

            ValueInner::Boxed {
                payload,
                descriptor,
            } => {
                if let Some(descriptor) = descriptor {
                    return Ok(descriptor.clone());
                }

                match manager.type_by_id(payload.payload().type_id()) {
                    Some(descriptor) => Ok(descriptor),

                    None => fail(RuntimeError::TypeNotFound {
                        name: CompactString::from(payload.payload_type_name()),
                        suggestion: None,
                    }),
                }
            }

            _ => object_descriptor_in(self.object()?.as_ref(), manager),
        }
    }

    /// Constructs a new instance of the registered type `type_name` through
    /// the type's constructor group.
    ///
    /// ```
    /// use ad_astra_reflect::runtime::Value;
    ///
    /// let number = Value::create("i32", &[]).unwrap();
    ///
    /// assert_eq!(*number.unbox::<i32>().unwrap(), 0);
    /// ```
    #[inline(always)]
    pub fn create(type_name: &str, arguments: &[Value]) -> RuntimeResult<Self> {
        Self::create_in(TypeManager::global(), type_name, arguments)
    }

    /// Constructs a new instance of the type `type_name` registered in the
    /// `manager`.
    pub fn create_in(
        manager: &TypeManager,
        type_name: &str,
        arguments: &[Value],
    ) -> RuntimeResult<Self> {
        manager.type_by_name(type_name)?.construct(arguments)
    }

    /// Reads the property of the Value's dynamic type.
    #[inline(always)]
    pub fn get_property(&self, name: &str) -> RuntimeResult<Self> {
        self.get_property_in(TypeManager::global(), name)
    }

    pub fn get_property_in(&self, manager: &TypeManager, name: &str) -> RuntimeResult<Self> {
        self.type_descriptor_in(manager)?
            .property(name)?
            .get_value(self)
    }

    /// Writes the property of the Value's dynamic type.
    #[inline(always)]
    pub fn set_property(&self, name: &str, value: Value) -> RuntimeResult<()> {
        self.set_property_in(TypeManager::global(), name, value)
    }

    pub fn set_property_in(
        &self,
        manager: &TypeManager,
        name: &str,
        value: Value,
    ) -> RuntimeResult<()> {
        self.type_descriptor_in(manager)?
            .property(name)?
            .set_value(self, value)
    }

    /// Calls the instance method of the Value's dynamic type.
    ///
    /// If the type has several methods with this name, the method is
    /// chosen through the [overload resolution](crate::runtime::MethodGroup::resolve).
    #[inline(always)]
    pub fn invoke(&self, name: &str, arguments: &[Value]) -> RuntimeResult<Self> {
        self.invoke_in(TypeManager::global(), name, arguments)
    }

    /// Calls the instance method of the Value's dynamic type registered in
    /// the `manager`.
    pub fn invoke_in(
        &self,
        manager: &TypeManager,
        name: &str,
        arguments: &[Value],
    ) -> RuntimeResult<Self> {
        self.type_descriptor_in(manager)?
            .method_group(name)?
            .invoke(Some(self), arguments)
    }

    /// Calls the static method `name` of the registered type `type_name`.
    #[inline(always)]
    pub fn invoke_static(type_name: &str, name: &str, arguments: &[Value]) -> RuntimeResult<Self> {
        Self::invoke_static_in(TypeManager::global(), type_name, name, arguments)
    }

    pub fn invoke_static_in(
        manager: &TypeManager,
        type_name: &str,
        name: &str,
        arguments: &[Value],
    ) -> RuntimeResult<Self> {
        manager
            .type_by_name(type_name)?
            .method_group(name)?
            .invoke(None, arguments)
    }

    /// Subscribes the `handler` function to the event of the Value's dynamic
    /// type.
    #[inline(always)]
    pub fn attach_event(&self, name: &str, handler: Value) -> RuntimeResult<()> {
        self.attach_event_in(TypeManager::global(), name, handler)
    }

    pub fn attach_event_in(
        &self,
        manager: &TypeManager,
        name: &str,
        handler: Value,
    ) -> RuntimeResult<()> {
        self.type_descriptor_in(manager)?
            .event(name)?
            .attach(self, handler)
    }

    /// Unsubscribes the `handler` function from the event of the Value's
    /// dynamic type.
    #[inline(always)]
    pub fn detach_event(&self, name: &str, handler: Value) -> RuntimeResult<()> {
        self.detach_event_in(TypeManager::global(), name, handler)
    }

    pub fn detach_event_in(
        &self,
        manager: &TypeManager,
        name: &str,
        handler: Value,
    ) -> RuntimeResult<()> {
        self.type_descriptor_in(manager)?
            .event(name)?
            .detach(self, handler)
    }

    /// Converts the boxed primitive data into text.
    #[inline(always)]
    pub fn serialize(&self) -> RuntimeResult<String> {
        self.serialize_in(TypeManager::global())
    }

    pub fn serialize_in(&self, manager: &TypeManager) -> RuntimeResult<String> {
        self.type_descriptor_in(manager)?.serialize(self)
    }

    /// Parses the text into the boxed primitive data of the registered type
    /// `type_name`.
    #[inline(always)]
    pub fn deserialize(type_name: &str, text: &str) -> RuntimeResult<Self> {
        Self::deserialize_in(TypeManager::global(), type_name, text)
    }

    pub fn deserialize_in(manager: &TypeManager, type_name: &str, text: &str) -> RuntimeResult<Self> {
        manager.type_by_name(type_name)?.deserialize(text)
    }

    /// Disposes the referenced object regardless of the Raw pointers to it.
    ///
    /// Fails with [RuntimeError::NotDisposable] if the object is referenced by
    /// any shared pointer, including this Value if it is a SharedPtr.
    pub fn force_dispose(&self) -> RuntimeResult<()> {
        force_dispose(&self.object()?)
    }

    // Resolves the referenced object of the pointer states. Returns None for
    // the Null and Boxed states.
    pub(crate) fn live_object(
        &self,
        name: Option<&str>,
    ) -> RuntimeResult<Option<Arc<dyn Reflectable>>> {
        let object = match &self.inner {
            ValueInner::Null | ValueInner::Boxed { .. } => return Ok(None),

            ValueInner::RawPtr(object) => match object.upgrade() {
                Some(object) => object,

                None => {
                    return fail(RuntimeError::ObjectDisposed {
                        type_name: CompactString::from(name.unwrap_or("object")),
                    })
                }
            },

            ValueInner::SharedPtr(ptr) => ptr.root().clone(),
        };

        if object.object().is_disposed() {
            return fail(RuntimeError::ObjectDisposed {
                type_name: object_type_name(object.as_ref()),
            });
        }

        Ok(Some(object))
    }

    // A non-failing version of the live_object function.
    pub(crate) fn peek_object(&self) -> Option<Arc<dyn Reflectable>> {
        let object = match &self.inner {
            ValueInner::Null | ValueInner::Boxed { .. } => return None,
            ValueInner::RawPtr(object) => object.upgrade()?,
            ValueInner::SharedPtr(ptr) => ptr.root().clone(),
        };

        if object.object().is_disposed() {
            return None;
        }

        Some(object)
    }

    #[inline(always)]
    fn address(&self) -> usize {
        match &self.inner {
            ValueInner::RawPtr(object) => Weak::as_ptr(object) as *const () as usize,
            ValueInner::SharedPtr(ptr) => object_address(ptr.root()),
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cmp::Ordering, sync::Arc};

    use crate::runtime::{ObjectBase, Ptr, Raw, Reflectable, RuntimeError, Value, ValueKind};

    #[derive(Default)]
    struct Sample {
        object: ObjectBase,
    }

    impl Reflectable for Sample {
        fn object(&self) -> &ObjectBase {
            &self.object
        }
    }

    #[test]
    fn test_value_ordering() {
        let object = Arc::new(Sample::default());

        let null = Value::null();
        let raw = Value::from_raw(&object);
        let number = Value::give(10i32).unwrap();

        assert!(null < raw);
        assert!(raw < number);
        assert!(null < number);

        assert_eq!(
            Value::give(1i32)
                .unwrap()
                .partial_cmp(&Value::give(2i32).unwrap()),
            Some(Ordering::Less),
        );
        assert_eq!(
            Value::give(1i32)
                .unwrap()
                .partial_cmp(&Value::give(1u32).unwrap()),
            None,
        );
        assert_ne!(Value::give(1i32).unwrap(), Value::give(1u32).unwrap());
    }

    #[test]
    fn test_value_copy_semantics() {
        let object = Arc::new(Sample::default());
        let shared = Value::from_ptr(Ptr::from_arc(object.clone()));

        assert_eq!(object.object().counter(), 1);

        let copy = shared.clone();

        assert_eq!(object.object().counter(), 2);
        assert_eq!(copy.kind(), ValueKind::SharedPtr);

        drop(shared);
        drop(copy);

        assert!(object.object().is_disposed());
    }

    #[test]
    fn test_force_dispose() {
        let object = Arc::new(Sample::default());
        let raw = Value::give(Raw::new(&object)).unwrap();

        {
            let _shared = Value::give(Ptr::from_arc(object.clone())).unwrap();

            match raw.force_dispose() {
                Err(RuntimeError::NotDisposable { counter, .. }) => assert_eq!(counter, 1),
                other => panic!("unexpected result: {other:?}"),
            }
        }

        let object = Arc::new(Sample::default());
        let raw = Value::give(Raw::new(&object)).unwrap();

        assert!(raw.force_dispose().is_ok());
        assert!(object.object().is_disposed());
        assert!(raw.object().is_err());
        assert!(Value::null().force_dispose().is_err());
    }
}
