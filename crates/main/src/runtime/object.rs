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
    any::{type_name, Any, TypeId},
    fmt::{Debug, Formatter},
    ops::Deref,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
        Mutex,
        RwLock,
        Weak,
    },
};

use compact_str::CompactString;

use crate::{
    collections::{
        ValueArray,
        ValueDictionary,
        ValueEnumerable,
        ValueList,
        ValueObservableList,
        ValueReadonlyDictionary,
        ValueReadonlyList,
    },
    report::system_panic,
    runtime::{
        aggregation::{aggregation_root, dispose_object, safe_aggregation_cast, Aggregation},
        error::fail,
        RuntimeError,
        RuntimeResult,
        TypeCategory,
        TypeDescriptor,
        TypeManager,
        ValueFunctionProxy,
    },
};

/// A helper trait that exposes the concrete type of a reflectable object.
///
/// The trait is automatically implemented for all `'static` types that are
/// [Send] and [Sync].
pub trait AsAny: Any + Send + Sync {
    /// Returns a reference to this object as [Any].
    fn as_any(&self) -> &(dyn Any + Send + Sync);

    /// Converts a shared pointer to this object into a shared pointer to [Any].
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    #[inline(always)]
    fn as_any(&self) -> &(dyn Any + Send + Sync) {
        self
    }

    #[inline(always)]
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// A reference type known to the reflection runtime.
///
/// Every reflectable reference type embeds an [ObjectBase] that carries the
/// object's reference counter, its lazily bound type tag, and the aggregation
/// side-table.
///
/// ```
/// use ad_astra_reflect::runtime::{ObjectBase, Ptr, Reflectable};
///
/// #[derive(Default)]
/// struct Counter {
///     object: ObjectBase,
/// }
///
/// impl Reflectable for Counter {
///     fn object(&self) -> &ObjectBase {
///         &self.object
///     }
/// }
///
/// let first = Ptr::new(Counter::default());
/// let second = first.clone();
///
/// assert_eq!(second.object().counter(), 2);
/// ```
///
/// The capability accessors (`as_enumerable`, `as_list`, `as_function`, etc.)
/// expose the universal container and function interfaces implemented by the
/// object. By default, an object does not implement any of them.
pub trait Reflectable: AsAny {
    /// Returns the bookkeeping part of this object.
    fn object(&self) -> &ObjectBase;

    /// A custom disposal hook.
    ///
    /// The runtime calls this function exactly once, when the object's
    /// reference counter returns to zero or when the object is
    /// [forcefully disposed](crate::runtime::Value::force_dispose).
    #[inline(always)]
    fn dispose(&self) {}

    /// Returns the Rust name of the object's concrete type.
    #[inline(always)]
    fn native_name(&self) -> &'static str {
        type_name::<Self>()
    }

    #[inline(always)]
    fn as_enumerable(&self) -> Option<&dyn ValueEnumerable> {
        None
    }

    #[inline(always)]
    fn as_readonly_list(&self) -> Option<&dyn ValueReadonlyList> {
        None
    }

    #[inline(always)]
    fn as_list(&self) -> Option<&dyn ValueList> {
        None
    }

    #[inline(always)]
    fn as_array(&self) -> Option<&dyn ValueArray> {
        None
    }

    #[inline(always)]
    fn as_observable_list(&self) -> Option<&dyn ValueObservableList> {
        None
    }

    #[inline(always)]
    fn as_readonly_dictionary(&self) -> Option<&dyn ValueReadonlyDictionary> {
        None
    }

    #[inline(always)]
    fn as_dictionary(&self) -> Option<&dyn ValueDictionary> {
        None
    }

    #[inline(always)]
    fn as_function(&self) -> Option<&dyn ValueFunctionProxy> {
        None
    }
}

/// A type that can be referenced by the [Ptr] and [Raw] pointers.
///
/// This trait is implemented for every [Reflectable] type and for the
/// `dyn Reflectable` trait object.
pub trait Pointee: Reflectable {
    /// Searches the aggregation of the `object` for the participant of this
    /// type.
    fn cast(object: &Arc<dyn Reflectable>) -> Option<Arc<Self>>;

    /// Erases the concrete type of the shared pointer.
    fn upcast(this: Arc<Self>) -> Arc<dyn Reflectable>;
}

impl<T: Reflectable> Pointee for T {
    #[inline(always)]
    fn cast(object: &Arc<dyn Reflectable>) -> Option<Arc<Self>> {
        safe_aggregation_cast::<T>(object)
    }

    #[inline(always)]
    fn upcast(this: Arc<Self>) -> Arc<dyn Reflectable> {
        this
    }
}

impl Pointee for dyn Reflectable {
    #[inline(always)]
    fn cast(object: &Arc<dyn Reflectable>) -> Option<Arc<Self>> {
        Some(object.clone())
    }

    #[inline(always)]
    fn upcast(this: Arc<Self>) -> Arc<dyn Reflectable> {
        this
    }
}

/// A bookkeeping part of every [Reflectable] object.
///
/// The reference counter starts at zero: a freshly constructed object is
/// "raw-owned". Each [Ptr] over the object (or over any participant of the
/// object's aggregation) increments the counter of the aggregation root by
/// exactly one. When the last Ptr is dropped, the root and all of its
/// aggregated parents are disposed.
pub struct ObjectBase {
    counter: AtomicUsize,
    disposed: AtomicBool,
    type_tag: Mutex<Option<TypeTag>>,
    pub(super) aggregation: RwLock<Option<Aggregation>>,
}

impl Default for ObjectBase {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for ObjectBase {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ObjectBase")
            .field("counter", &self.counter())
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

impl ObjectBase {
    /// Creates a new bookkeeping part with zero reference counter.
    #[inline(always)]
    pub const fn new() -> Self {
        Self {
            counter: AtomicUsize::new(0),
            disposed: AtomicBool::new(false),
            type_tag: Mutex::new(None),
            aggregation: RwLock::new(None),
        }
    }

    /// Returns the current value of this object's own reference counter.
    ///
    /// If the object participates in an aggregation, the meaningful counter
    /// belongs to the aggregation root. See
    /// [reference_counter](crate::runtime::reference_counter).
    #[inline(always)]
    pub fn counter(&self) -> usize {
        self.counter.load(Ordering::Acquire)
    }

    /// Returns true if the object has been disposed.
    #[inline(always)]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    #[inline(always)]
    pub(super) fn retain(&self) {
        let _ = self.counter.fetch_add(1, Ordering::AcqRel);
    }

    // Returns true if the counter dropped to zero.
    #[inline(always)]
    pub(super) fn release(&self) -> bool {
        let previous = self.counter.fetch_sub(1, Ordering::AcqRel);

        if previous == 0 {
            system_panic!("Reference counter underflow.");
        }

        previous == 1
    }

    // Returns true if the object was not disposed before.
    #[inline(always)]
    pub(super) fn mark_disposed(&self) -> bool {
        !self.disposed.swap(true, Ordering::AcqRel)
    }

    pub(super) fn bind_type(
        &self,
        manager: &TypeManager,
        type_id: TypeId,
        fallback: TypeCategory,
    ) -> Option<Arc<TypeDescriptor>> {
        let version = manager.version();

        let mut tag = self
            .type_tag
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());

        if let Some(tag) = tag.as_ref() {
            if tag.manager == manager.id() && tag.version == version {
                return Some(tag.descriptor.clone());
            }
        }

        let descriptor = match manager.type_by_id(type_id) {
            Some(descriptor) => descriptor,
            None => manager.find_type(fallback.interface_name())?,
        };

        *tag = Some(TypeTag {
            manager: manager.id(),
            version,
            descriptor: descriptor.clone(),
        });

        Some(descriptor)
    }
}

// The descriptor bound to the object in a particular state of a particular
// type manager.
struct TypeTag {
    manager: usize,
    version: usize,
    descriptor: Arc<TypeDescriptor>,
}

/// Returns the runtime type descriptor of the object's most-derived registered
/// type in the [global](TypeManager::global) type manager.
///
/// Unregistered objects that implement one of the universal container or
/// function interfaces report the descriptor of that interface.
#[inline(always)]
pub fn object_descriptor(object: &dyn Reflectable) -> RuntimeResult<Arc<TypeDescriptor>> {
    object_descriptor_in(object, TypeManager::global())
}

/// Returns the runtime type descriptor of the object's most-derived type
/// registered in the `manager`.
pub fn object_descriptor_in(
    object: &dyn Reflectable,
    manager: &TypeManager,
) -> RuntimeResult<Arc<TypeDescriptor>> {
    match find_object_descriptor(object, manager) {
        Some(descriptor) => Ok(descriptor),

        None => fail(RuntimeError::TypeNotFound {
            name: CompactString::from(object.native_name()),
            suggestion: None,
        }),
    }
}

/// Returns the registered type name of the object, or the object's Rust type
/// name if the object's type is not registered.
pub fn object_type_name(object: &dyn Reflectable) -> CompactString {
    match find_object_descriptor(object, TypeManager::global()) {
        Some(descriptor) => CompactString::from(descriptor.name()),
        None => CompactString::from(object.native_name()),
    }
}

#[inline(always)]
fn find_object_descriptor(
    object: &dyn Reflectable,
    manager: &TypeManager,
) -> Option<Arc<TypeDescriptor>> {
    object
        .object()
        .bind_type(manager, object.as_any().type_id(), capability_category(object))
}

/// Returns the most specific universal interface implemented by the object.
pub fn capability_category(object: &dyn Reflectable) -> TypeCategory {
    if object.as_function().is_some() {
        return TypeCategory::Function;
    }

    if object.as_dictionary().is_some() {
        return TypeCategory::Dictionary;
    }

    if object.as_readonly_dictionary().is_some() {
        return TypeCategory::ReadonlyDictionary;
    }

    if object.as_observable_list().is_some() {
        return TypeCategory::ObservableList;
    }

    if object.as_list().is_some() {
        return TypeCategory::List;
    }

    if object.as_array().is_some() {
        return TypeCategory::Array;
    }

    if object.as_readonly_list().is_some() {
        return TypeCategory::ReadonlyList;
    }

    if object.as_enumerable().is_some() {
        return TypeCategory::Enumerable;
    }

    TypeCategory::NonGeneric
}

/// Returns the value of the reference counter that owns the object: the
/// counter of the object's aggregation root.
#[inline]
pub fn reference_counter(object: &Arc<dyn Reflectable>) -> usize {
    aggregation_root(object).object().counter()
}

#[inline(always)]
pub(crate) fn object_address(object: &Arc<dyn Reflectable>) -> usize {
    Arc::as_ptr(object) as *const () as usize
}

/// An owning reference-counting pointer to a [Reflectable] object.
///
/// Unlike [Arc], the Ptr maintains the object's intrusive reference counter.
/// Creating a Ptr over any participant of an aggregation increments the
/// counter of the aggregation root, and dropping it decrements the counter.
/// When the counter returns to zero, the root and its aggregated parents are
/// disposed.
///
/// ```
/// use std::sync::Arc;
///
/// use ad_astra_reflect::runtime::{ObjectBase, Ptr, Reflectable};
///
/// #[derive(Default)]
/// struct Foo {
///     object: ObjectBase,
/// }
///
/// impl Reflectable for Foo {
///     fn object(&self) -> &ObjectBase {
///         &self.object
///     }
/// }
///
/// let raw = Arc::new(Foo::default());
///
/// assert_eq!(raw.object().counter(), 0);
///
/// {
///     let _ptr = Ptr::from_arc(raw.clone());
///
///     assert_eq!(raw.object().counter(), 1);
/// }
///
/// assert_eq!(raw.object().counter(), 0);
/// assert!(raw.object().is_disposed());
/// ```
pub struct Ptr<T: ?Sized + Pointee> {
    target: Arc<T>,
    root: Arc<dyn Reflectable>,
}

impl<T: ?Sized + Pointee> Drop for Ptr<T> {
    fn drop(&mut self) {
        if self.root.object().release() {
            dispose_object(&self.root);
        }
    }
}

impl<T: ?Sized + Pointee> Clone for Ptr<T> {
    #[inline]
    fn clone(&self) -> Self {
        self.root.object().retain();

        Self {
            target: self.target.clone(),
            root: self.root.clone(),
        }
    }
}

impl<T: ?Sized + Pointee> Deref for Ptr<T> {
    type Target = T;

    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        self.target.deref()
    }
}

impl<T: ?Sized + Pointee> Debug for Ptr<T> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_fmt(format_args!(
            "Ptr({} @ {:#x})",
            object_type_name(self.root.as_ref()),
            object_address(&self.root),
        ))
    }
}

impl<T: Reflectable> Ptr<T> {
    /// Allocates a new object and creates the first owning pointer to it.
    #[inline(always)]
    pub fn new(data: T) -> Self {
        Self::from_arc(Arc::new(data))
    }
}

impl<T: ?Sized + Pointee> Ptr<T> {
    /// Creates an owning pointer over an already allocated object.
    ///
    /// The object becomes shared-owned: the reference counter of its
    /// aggregation root increments by one.
    pub fn from_arc(target: Arc<T>) -> Self {
        let root = aggregation_root(&T::upcast(target.clone()));

        root.object().retain();

        Self { target, root }
    }

    /// Returns the underlying shared pointer.
    #[inline(always)]
    pub fn as_arc(&self) -> &Arc<T> {
        &self.target
    }

    /// Returns the aggregation root of the referenced object.
    #[inline(always)]
    pub fn root(&self) -> &Arc<dyn Reflectable> {
        &self.root
    }

    /// Converts this pointer into an owning pointer to the aggregation root.
    #[inline]
    pub fn into_root(self) -> Ptr<dyn Reflectable> {
        Ptr::from_arc(self.root.clone())
    }

    /// Creates a non-owning pointer to the same object.
    #[inline(always)]
    pub fn downgrade(&self) -> Raw<T> {
        Raw::new(&self.target)
    }

    /// Returns true if both pointers refer to the same logical object (the
    /// same aggregation root).
    #[inline(always)]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        object_address(&this.root) == object_address(&other.root)
    }

    /// Searches the object's aggregation for the participant of type `U`.
    #[inline]
    pub fn cast<U: Pointee + Sized>(&self) -> Option<Ptr<U>> {
        U::cast(&self.root).map(Ptr::from_arc)
    }
}

/// A non-owning pointer to a [Reflectable] object.
///
/// The Raw pointer does not affect the object's reference counter, and it
/// does not keep the object's memory alive. Accessing the object through
/// a Raw pointer after the memory has been released fails with
/// [RuntimeError::ObjectDisposed].
pub struct Raw<T: ?Sized + Pointee> {
    target: Option<Weak<T>>,
}

impl<T: ?Sized + Pointee> Clone for Raw<T> {
    #[inline(always)]
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
        }
    }
}

impl<T: ?Sized + Pointee> Debug for Raw<T> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self.target.as_ref().and_then(Weak::upgrade) {
            Some(target) => {
                let object = T::upcast(target);

                formatter.write_fmt(format_args!(
                    "Raw({} @ {:#x})",
                    object_type_name(object.as_ref()),
                    object_address(&object),
                ))
            }

            None if self.target.is_none() => formatter.write_str("Raw(null)"),

            None => formatter.write_str("Raw(disposed)"),
        }
    }
}

impl<T: ?Sized + Pointee> PartialEq for Raw<T> {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }
}

impl<T: ?Sized + Pointee> Raw<T> {
    /// Creates a null raw pointer.
    #[inline(always)]
    pub fn null() -> Self {
        Self { target: None }
    }

    /// Creates a raw pointer to the object.
    #[inline(always)]
    pub fn new(target: &Arc<T>) -> Self {
        Self {
            target: Some(Arc::downgrade(target)),
        }
    }

    /// Returns true if this is a null pointer.
    #[inline(always)]
    pub fn is_null(&self) -> bool {
        self.target.is_none()
    }

    /// Returns a shared pointer to the object, if the pointer is not null and
    /// the object's memory has not been released.
    #[inline(always)]
    pub fn get(&self) -> Option<Arc<T>> {
        self.target.as_ref()?.upgrade()
    }

    /// Creates an owning pointer over the referenced object.
    pub fn to_ptr(&self) -> RuntimeResult<Ptr<T>> {
        match &self.target {
            None => fail(RuntimeError::NullArgument {
                name: CompactString::from("pointer"),
            }),

            Some(target) => match target.upgrade() {
                Some(target) => Ok(Ptr::from_arc(target)),

                None => fail(RuntimeError::ObjectDisposed {
                    type_name: CompactString::from(type_name::<T>()),
                }),
            },
        }
    }

    #[inline(always)]
    fn address(&self) -> usize {
        match &self.target {
            Some(target) => Weak::as_ptr(target) as *const () as usize,
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use crate::runtime::{ObjectBase, Ptr, Raw, Reflectable};

    #[derive(Default)]
    struct Base {
        object: ObjectBase,
        disposals: AtomicUsize,
    }

    impl Reflectable for Base {
        fn object(&self) -> &ObjectBase {
            &self.object
        }

        fn dispose(&self) {
            let _ = self.disposals.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_reference_counting() {
        let raw = Arc::new(Base::default());

        assert_eq!(raw.object().counter(), 0);

        {
            let first = Ptr::from_arc(raw.clone());
            assert_eq!(raw.object().counter(), 1);

            {
                let second = Ptr::from_arc(raw.clone());
                assert_eq!(raw.object().counter(), 2);

                {
                    let third = Ptr::from_arc(raw.clone());
                    assert_eq!(raw.object().counter(), 3);
                    assert!(Ptr::ptr_eq(&first, &third));
                }

                assert_eq!(raw.object().counter(), 2);
                drop(second);
            }

            assert_eq!(raw.object().counter(), 1);
            assert!(!raw.object().is_disposed());
        }

        assert_eq!(raw.object().counter(), 0);
        assert!(raw.object().is_disposed());
        assert_eq!(raw.disposals.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_ptr_clone() {
        let first = Ptr::new(Base::default());
        let second = first.clone();

        assert_eq!(first.object().counter(), 2);

        drop(first);

        assert_eq!(second.object().counter(), 1);
        assert_eq!(second.disposals.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_raw_pointer() {
        let null = Raw::<Base>::null();

        assert!(null.is_null());
        assert!(null.get().is_none());
        assert!(null.to_ptr().is_err());

        let object = Arc::new(Base::default());
        let raw = Raw::new(&object);

        assert_eq!(raw, Raw::new(&object));
        assert_eq!(object.object().counter(), 0);

        {
            let ptr = raw.to_ptr().unwrap();
            assert_eq!(ptr.object().counter(), 1);
            assert_eq!(ptr.downgrade(), raw);
        }

        drop(object);

        assert!(raw.get().is_none());
        assert!(raw.to_ptr().is_err());
    }
}
