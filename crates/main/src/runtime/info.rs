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
    any::{type_name, TypeId},
    fmt::{Display, Formatter},
    sync::{Arc, RwLock},
};

use ahash::AHashMap;
use compact_str::CompactString;
use lady_deirdre::sync::Lazy;

use crate::runtime::{
    error::fail,
    Reflect,
    RuntimeError,
    RuntimeResult,
    TypeCategory,
    TypeDescriptor,
    TypeManager,
};

/// The outer wrapping shape of a [TypeInfo].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Decorator {
    /// A non-owning pointer to the [element](TypeInfo::element) type.
    RawPtr,

    /// An owning reference-counting pointer to the
    /// [element](TypeInfo::element) type.
    SharedPtr,

    /// An optional value of the [element](TypeInfo::element) type.
    Nullable,

    /// A value described by a registered [TypeDescriptor].
    ByDescriptor,

    /// A universal interface type parametrized by the
    /// [arguments](TypeInfo::arguments).
    Generic,
}

/// An auxiliary tag of a [TypeInfo] that identifies the concrete container
/// flavor.
///
/// The hint does not affect the decorator or the generic arguments of the
/// type info. It tells the boxing engine which wrapper implementation applies
/// and whether unboxing may alias the original container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum TypeInfoHint {
    /// The type is not a container, or the container flavor is irrelevant.
    #[default]
    Normal,

    /// A lazily evaluated enumerable view: [LazyList](crate::collections::LazyList).
    LazyList,

    /// [Array](crate::collections::Array).
    Array,

    /// [List](crate::collections::List).
    List,

    /// [SortedList](crate::collections::SortedList).
    SortedList,

    /// [ObservableList](crate::collections::ObservableList).
    ObservableList,

    /// [Dictionary](crate::collections::Dictionary).
    Dictionary,

    /// A user-defined container type bound live to its wrapper.
    NativeCollectionReference,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum DescriptorKey {
    Native { id: TypeId, name: &'static str },
    Named(CompactString),
}

/// Describes one use of a type at a call boundary: a parameter type, a return
/// type, or a container element type.
///
/// The instances of the TypeInfo are immutable. The type infos of the Rust
/// types are created once per type and cached. See [TypeInfo::of].
///
/// ```
/// use ad_astra_reflect::{collections::List, runtime::TypeInfo};
///
/// assert_eq!(TypeInfo::of::<i32>().to_string(), "i32");
/// assert_eq!(TypeInfo::of::<Option<i32>>().to_string(), "Option<i32>");
/// assert_eq!(TypeInfo::of::<List<i32>>().to_string(), "List<i32>");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    decorator: Decorator,
    hint: TypeInfoHint,
    element: Option<Arc<TypeInfo>>,
    descriptor: Option<DescriptorKey>,
    arguments: Vec<Arc<TypeInfo>>,
}

impl Display for TypeInfo {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self.decorator {
            Decorator::RawPtr => {
                formatter.write_str("Raw<")?;
                self.fmt_element(formatter)?;
                formatter.write_str(">")
            }

            Decorator::SharedPtr => match &self.element {
                Some(element) if element.decorator == Decorator::Generic => {
                    Display::fmt(element, formatter)
                }

                _ => {
                    formatter.write_str("Ptr<")?;
                    self.fmt_element(formatter)?;
                    formatter.write_str(">")
                }
            },

            Decorator::Nullable => {
                formatter.write_str("Option<")?;
                self.fmt_element(formatter)?;
                formatter.write_str(">")
            }

            Decorator::ByDescriptor => formatter.write_str(&self.descriptor_name()),

            Decorator::Generic => {
                formatter.write_str(&self.descriptor_name())?;

                if self.arguments.is_empty() {
                    return Ok(());
                }

                formatter.write_str("<")?;

                let mut first = true;

                for argument in &self.arguments {
                    match first {
                        true => first = false,
                        false => formatter.write_str(", ")?,
                    }

                    Display::fmt(argument, formatter)?;
                }

                formatter.write_str(">")
            }
        }
    }
}

impl TypeInfo {
    /// Returns the cached type info of the Rust type `T`.
    ///
    /// The first call computes the type info through
    /// [Reflect::create_type_info]. Subsequent calls return a clone of the
    /// same shared instance.
    pub fn of<T: Reflect>() -> Arc<TypeInfo> {
        static CACHE: Lazy<RwLock<AHashMap<TypeId, Arc<TypeInfo>>>> =
            Lazy::new(|| RwLock::new(AHashMap::new()));

        let id = TypeId::of::<T>();

        {
            let cache = CACHE.read().unwrap_or_else(|poison| poison.into_inner());

            if let Some(info) = cache.get(&id) {
                return info.clone();
            }
        }

        // Computed outside of the lock, because the type info of a generic
        // type requests the type infos of its arguments.
        let info = Arc::new(T::create_type_info());

        let mut cache = CACHE.write().unwrap_or_else(|poison| poison.into_inner());

        cache.entry(id).or_insert(info).clone()
    }

    /// Creates a non-owning pointer type info over the `element` type.
    #[inline(always)]
    pub fn raw(element: Arc<TypeInfo>) -> Self {
        Self::wrap(Decorator::RawPtr, element)
    }

    /// Creates an owning pointer type info over the `element` type.
    #[inline(always)]
    pub fn shared(element: Arc<TypeInfo>) -> Self {
        Self::wrap(Decorator::SharedPtr, element)
    }

    /// Creates an optional value type info over the `element` type.
    #[inline(always)]
    pub fn nullable(element: Arc<TypeInfo>) -> Self {
        Self::wrap(Decorator::Nullable, element)
    }

    /// Creates a type info that refers to the registered descriptor of the
    /// Rust type `T`.
    #[inline(always)]
    pub fn by_descriptor<T: ?Sized + 'static>() -> Self {
        Self {
            decorator: Decorator::ByDescriptor,
            hint: TypeInfoHint::Normal,
            element: None,
            descriptor: Some(DescriptorKey::Native {
                id: TypeId::of::<T>(),
                name: type_name::<T>(),
            }),
            arguments: Vec::new(),
        }
    }

    /// Creates a type info that refers to the registered descriptor by the
    /// descriptor's name.
    #[inline(always)]
    pub fn by_name(name: impl Into<CompactString>) -> Self {
        Self {
            decorator: Decorator::ByDescriptor,
            hint: TypeInfoHint::Normal,
            element: None,
            descriptor: Some(DescriptorKey::Named(name.into())),
            arguments: Vec::new(),
        }
    }

    /// Creates a type info of the universal interface type `name`
    /// parametrized by the `arguments`.
    #[inline(always)]
    pub fn generic(name: impl Into<CompactString>, arguments: Vec<Arc<TypeInfo>>) -> Self {
        Self {
            decorator: Decorator::Generic,
            hint: TypeInfoHint::Normal,
            element: None,
            descriptor: Some(DescriptorKey::Named(name.into())),
            arguments,
        }
    }

    /// Creates a type info of the container that implements the `category`
    /// interface.
    ///
    /// The result is a shared pointer to the generic interface type, because
    /// the containers are always boxed by shared pointers to their wrappers.
    pub fn collection(
        category: TypeCategory,
        hint: TypeInfoHint,
        arguments: Vec<Arc<TypeInfo>>,
    ) -> Self {
        let generic = Self::generic(category.interface_name(), arguments).with_hint(hint);

        Self::shared(Arc::new(generic)).with_hint(hint)
    }

    /// Creates a type info of the function that returns `result` and accepts
    /// the `parameters`.
    ///
    /// The first generic argument of the underlying interface type is the
    /// return type, followed by the parameter types in order.
    pub fn function(result: Arc<TypeInfo>, parameters: Vec<Arc<TypeInfo>>) -> Self {
        let mut arguments = Vec::with_capacity(parameters.len() + 1);

        arguments.push(result);
        arguments.extend(parameters);

        Self::shared(Arc::new(Self::generic(
            TypeCategory::Function.interface_name(),
            arguments,
        )))
    }

    /// Returns a copy of this type info with the `hint`.
    #[inline(always)]
    pub fn with_hint(mut self, hint: TypeInfoHint) -> Self {
        self.hint = hint;

        self
    }

    #[inline(always)]
    pub fn decorator(&self) -> Decorator {
        self.decorator
    }

    #[inline(always)]
    pub fn hint(&self) -> TypeInfoHint {
        self.hint
    }

    /// Returns the wrapped type info of the RawPtr, SharedPtr, and Nullable
    /// decorators.
    #[inline(always)]
    pub fn element(&self) -> Option<&Arc<TypeInfo>> {
        self.element.as_ref()
    }

    /// Returns the generic arguments of the Generic decorator.
    #[inline(always)]
    pub fn arguments(&self) -> &[Arc<TypeInfo>] {
        &self.arguments
    }

    /// Returns true if this type info, or the type info it wraps, refers
    /// to the Rust type `T` by descriptor.
    pub fn is_native<T: ?Sized + 'static>(&self) -> bool {
        match &self.descriptor {
            Some(DescriptorKey::Native { id, .. }) => *id == TypeId::of::<T>(),
            _ => match &self.element {
                Some(element) => element.is_native::<T>(),
                None => false,
            },
        }
    }

    /// Resolves the runtime type descriptor this type info bottoms out at.
    ///
    /// For the pointer and nullable decorators, the function resolves the
    /// descriptor of the wrapped type. The lookup is performed in the
    /// [global](TypeManager::global) type manager.
    #[inline(always)]
    pub fn type_descriptor(&self) -> RuntimeResult<Arc<TypeDescriptor>> {
        self.type_descriptor_in(TypeManager::global())
    }

    /// Resolves the runtime type descriptor in the `manager`.
    pub fn type_descriptor_in(&self, manager: &TypeManager) -> RuntimeResult<Arc<TypeDescriptor>> {
        match self.find_descriptor_in(manager) {
            Some(descriptor) => Ok(descriptor),

            None => fail(RuntimeError::TypeNotFound {
                name: self.descriptor_name(),
                suggestion: None,
            }),
        }
    }

    /// A non-failing version of the [type_descriptor](Self::type_descriptor)
    /// function.
    #[inline(always)]
    pub fn find_descriptor(&self) -> Option<Arc<TypeDescriptor>> {
        self.find_descriptor_in(TypeManager::global())
    }

    pub fn find_descriptor_in(&self, manager: &TypeManager) -> Option<Arc<TypeDescriptor>> {
        match &self.descriptor {
            Some(DescriptorKey::Native { id, .. }) => manager.type_by_id(*id),
            Some(DescriptorKey::Named(name)) => manager.find_type(name),
            None => self.element.as_ref()?.find_descriptor_in(manager),
        }
    }

    #[inline(always)]
    fn wrap(decorator: Decorator, element: Arc<TypeInfo>) -> Self {
        Self {
            decorator,
            hint: TypeInfoHint::Normal,
            element: Some(element),
            descriptor: None,
            arguments: Vec::new(),
        }
    }

    fn fmt_element(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.element {
            Some(element) => Display::fmt(element, formatter),
            None => formatter.write_str("?"),
        }
    }

    fn descriptor_name(&self) -> CompactString {
        match &self.descriptor {
            Some(DescriptorKey::Native { id, name }) => {
                match TypeManager::global().type_by_id(*id) {
                    Some(descriptor) => CompactString::from(descriptor.name()),
                    None => CompactString::from(*name),
                }
            }

            Some(DescriptorKey::Named(name)) => name.clone(),

            None => match &self.element {
                Some(element) => element.descriptor_name(),
                None => CompactString::from("?"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        collections::{Dictionary, LazyList, List, SortedList},
        runtime::{Decorator, Func, Ptr, Raw, TypeCategory, TypeInfo, TypeInfoHint, Value},
    };

    #[test]
    fn test_non_generic_type_info() {
        let info = TypeInfo::of::<i32>();

        assert_eq!(info.decorator(), Decorator::ByDescriptor);
        assert!(info.is_native::<i32>());
        assert_eq!(info.type_descriptor().unwrap().name(), "i32");
        assert!(Arc::ptr_eq(&info, &TypeInfo::of::<i32>()));

        let info = TypeInfo::of::<Option<f64>>();

        assert_eq!(info.decorator(), Decorator::Nullable);
        assert_eq!(info.element().unwrap().decorator(), Decorator::ByDescriptor);
        assert_eq!(info.to_string(), "Option<f64>");
        assert_eq!(info.type_descriptor().unwrap().name(), "f64");

        assert_eq!(TypeInfo::of::<Value>().to_string(), "Object");
    }

    #[test]
    fn test_pointer_type_info() {
        use crate::runtime::{ObjectBase, Reflectable};

        struct Node {
            object: ObjectBase,
        }

        impl Reflectable for Node {
            fn object(&self) -> &ObjectBase {
                &self.object
            }
        }

        let shared = TypeInfo::of::<Ptr<Node>>();

        assert_eq!(shared.decorator(), Decorator::SharedPtr);
        assert!(shared.is_native::<Node>());

        let raw = TypeInfo::of::<Raw<Node>>();

        assert_eq!(raw.decorator(), Decorator::RawPtr);
        assert!(raw.to_string().starts_with("Raw<"));
    }

    #[test]
    fn test_generic_type_info() {
        let list = TypeInfo::of::<List<i32>>();

        assert_eq!(list.decorator(), Decorator::SharedPtr);
        assert_eq!(list.hint(), TypeInfoHint::List);

        let generic = list.element().unwrap();

        assert_eq!(generic.decorator(), Decorator::Generic);
        assert_eq!(generic.arguments().len(), 1);
        assert_eq!(list.to_string(), "List<i32>");

        let sorted = TypeInfo::of::<SortedList<i32>>();

        assert_eq!(sorted.hint(), TypeInfoHint::SortedList);
        assert_eq!(sorted.to_string(), "ReadonlyList<i32>");

        let lazy = TypeInfo::of::<LazyList<u8>>();

        assert_eq!(lazy.hint(), TypeInfoHint::LazyList);
        assert_eq!(lazy.to_string(), "Enumerable<u8>");

        let dictionary = TypeInfo::of::<Dictionary<i32, String>>();

        assert_eq!(dictionary.hint(), TypeInfoHint::Dictionary);
        assert_eq!(dictionary.to_string(), "Dictionary<i32, String>");
        assert_eq!(
            dictionary.type_descriptor().unwrap().category(),
            TypeCategory::Dictionary,
        );

        let function = TypeInfo::of::<Func<(i32, bool), String>>();

        assert_eq!(function.to_string(), "Function<String, i32, bool>");
        assert_eq!(
            function.type_descriptor().unwrap().category(),
            TypeCategory::Function,
        );

        let nested = TypeInfo::of::<List<List<bool>>>();

        assert_eq!(nested.to_string(), "List<List<bool>>");
    }
}
