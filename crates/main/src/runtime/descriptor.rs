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
    fmt::{Debug, Display, Formatter},
    sync::Arc,
};

use ahash::AHashMap;
use compact_str::CompactString;

use crate::{
    report::system_panic,
    runtime::{
        error::{fail, suggest},
        receiver,
        EventInfo,
        MemberKind,
        MethodGroup,
        MethodInfo,
        MethodKind,
        Reflect,
        RuntimeError,
        RuntimeResult,
        TypeCategory,
        TypeInfo,
        TypeManager,
        Value,
    },
};

/// A kind of the registered type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// A primitive type with a [serializer](ValueSerializer).
    Primitive,

    /// A plain data type boxed by copy.
    Struct,

    /// An enumeration with named items.
    Enum,

    /// A reference type boxed by pointer.
    Class,

    /// A universal interface type.
    Interface,
}

impl Display for TypeKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primitive => formatter.write_str("primitive"),
            Self::Struct => formatter.write_str("struct"),
            Self::Enum => formatter.write_str("enum"),
            Self::Class => formatter.write_str("class"),
            Self::Interface => formatter.write_str("interface"),
        }
    }
}

/// A textual representation of the primitive values.
pub trait ValueSerializer: Send + Sync {
    /// Returns the boxed default value of the primitive type.
    fn default_value(&self) -> RuntimeResult<Value>;

    /// Converts the boxed primitive value into text.
    fn serialize(&self, value: &Value) -> RuntimeResult<String>;

    /// Parses the text into the boxed primitive value.
    ///
    /// Fails with [RuntimeError::Deserialize] if the text is not a valid
    /// representation of the primitive type.
    fn deserialize(&self, text: &str) -> RuntimeResult<Value>;
}

type Getter = dyn Fn(&Value) -> RuntimeResult<Value> + Send + Sync;
type Setter = dyn Fn(&Value, Value) -> RuntimeResult<()> + Send + Sync;

/// A description of the reflected type property.
///
/// ```
/// use std::sync::atomic::{AtomicI32, Ordering};
///
/// use ad_astra_reflect::runtime::{ObjectBase, PropertyInfo, Ptr, Reflectable, Value};
///
/// #[derive(Default)]
/// struct Gauge {
///     object: ObjectBase,
///     level: AtomicI32,
/// }
///
/// impl Reflectable for Gauge {
///     fn object(&self) -> &ObjectBase {
///         &self.object
///     }
/// }
///
/// let level = PropertyInfo::read_write(
///     "level",
///     |this: &Ptr<Gauge>| this.level.load(Ordering::SeqCst),
///     |this: &Ptr<Gauge>, value: i32| this.level.store(value, Ordering::SeqCst),
/// );
///
/// let gauge = Value::from_ptr(Ptr::new(Gauge::default()));
///
/// level.set_value(&gauge, Value::give(7).unwrap()).unwrap();
///
/// assert_eq!(*level.get_value(&gauge).unwrap().unbox::<i32>().unwrap(), 7);
/// ```
pub struct PropertyInfo {
    name: CompactString,
    owner: CompactString,
    ty: Arc<TypeInfo>,
    getter: Option<Box<Getter>>,
    setter: Option<Box<Setter>>,
}

impl Debug for PropertyInfo {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("PropertyInfo")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("ty", &self.ty)
            .field("readable", &self.is_readable())
            .field("writable", &self.is_writable())
            .finish()
    }
}

impl PropertyInfo {
    /// Creates a property with a getter and a setter.
    pub fn read_write<This: Reflect, T: Reflect>(
        name: &str,
        getter: impl Fn(&This) -> T + Send + Sync + 'static,
        setter: impl Fn(&This, T) + Send + Sync + 'static,
    ) -> Self {
        Self {
            getter: Some(Self::make_getter(getter)),
            setter: Some(Self::make_setter(name, setter)),
            ..Self::blank::<T>(name)
        }
    }

    /// Creates a property that can only be read.
    pub fn readonly<This: Reflect, T: Reflect>(
        name: &str,
        getter: impl Fn(&This) -> T + Send + Sync + 'static,
    ) -> Self {
        Self {
            getter: Some(Self::make_getter(getter)),
            ..Self::blank::<T>(name)
        }
    }

    /// Creates a property that can only be written.
    pub fn writeonly<This: Reflect, T: Reflect>(
        name: &str,
        setter: impl Fn(&This, T) + Send + Sync + 'static,
    ) -> Self {
        Self {
            setter: Some(Self::make_setter(name, setter)),
            ..Self::blank::<T>(name)
        }
    }

    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the name of the type that declares this property.
    #[inline(always)]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Returns the declared type of the property.
    #[inline(always)]
    pub fn ty(&self) -> &Arc<TypeInfo> {
        &self.ty
    }

    #[inline(always)]
    pub fn is_readable(&self) -> bool {
        self.getter.is_some()
    }

    #[inline(always)]
    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    /// Reads the property of the `this` object.
    ///
    /// Fails with [RuntimeError::NotReadable] if the property does not have a
    /// getter.
    pub fn get_value(&self, this: &Value) -> RuntimeResult<Value> {
        match &self.getter {
            Some(getter) => getter(this),

            None => fail(RuntimeError::NotReadable {
                owner: self.owner.clone(),
                property: self.name.clone(),
            }),
        }
    }

    /// Writes the property of the `this` object.
    ///
    /// Fails with [RuntimeError::NotWritable] if the property does not have a
    /// setter.
    pub fn set_value(&self, this: &Value, value: Value) -> RuntimeResult<()> {
        match &self.setter {
            Some(setter) => setter(this, value),

            None => fail(RuntimeError::NotWritable {
                owner: self.owner.clone(),
                property: self.name.clone(),
            }),
        }
    }

    fn blank<T: Reflect>(name: &str) -> Self {
        Self {
            name: CompactString::from(name),
            owner: CompactString::default(),
            ty: TypeInfo::of::<T>(),
            getter: None,
            setter: None,
        }
    }

    fn make_getter<This: Reflect, T: Reflect>(
        getter: impl Fn(&This) -> T + Send + Sync + 'static,
    ) -> Box<Getter> {
        Box::new(move |this| {
            let this = receiver::<This>(Some(this))?;

            getter(this.get()).box_parameter(None)
        })
    }

    fn make_setter<This: Reflect, T: Reflect>(
        name: &str,
        setter: impl Fn(&This, T) + Send + Sync + 'static,
    ) -> Box<Setter> {
        let name = CompactString::from(name);

        Box::new(move |this, value| {
            let this = receiver::<This>(Some(this))?;
            let value = T::unbox_parameter(&value, None, Some(&name))?;

            setter(this.get(), value.into_inner());

            Ok(())
        })
    }
}

/// A runtime description of the registered type.
///
/// The descriptor is a read-only metadata object created through the
/// [TypeDescriptorBuilder] and registered in the [TypeManager]. Member
/// lookups (properties, methods, and events) search the type itself first,
/// and then its base types in declaration order.
pub struct TypeDescriptor {
    name: CompactString,
    kind: TypeKind,
    native: Option<(TypeId, &'static str)>,
    category: TypeCategory,
    bases: Vec<Arc<TypeDescriptor>>,
    properties: Vec<Arc<PropertyInfo>>,
    property_index: AHashMap<CompactString, usize>,
    events: Vec<Arc<EventInfo>>,
    event_index: AHashMap<CompactString, usize>,
    methods: Vec<Arc<MethodGroup>>,
    method_index: AHashMap<CompactString, usize>,
    constructors: Option<Arc<MethodGroup>>,
    serializer: Option<Box<dyn ValueSerializer>>,
    enum_items: Vec<(CompactString, Value)>,
}

impl Debug for TypeDescriptor {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("category", &self.category)
            .field(
                "bases",
                &self.bases.iter().map(|base| base.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl Display for TypeDescriptor {
    #[inline(always)]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.name)
    }
}

impl TypeDescriptor {
    /// Returns the descriptor of the Rust type `T` registered in the
    /// [global](TypeManager::global) type manager.
    #[inline(always)]
    pub fn of<T: ?Sized + 'static>() -> RuntimeResult<Arc<Self>> {
        Self::of_in::<T>(TypeManager::global())
    }

    /// Returns the descriptor of the Rust type `T` registered in the
    /// `manager`.
    pub fn of_in<T: ?Sized + 'static>(manager: &TypeManager) -> RuntimeResult<Arc<Self>> {
        match manager.type_by_id(TypeId::of::<T>()) {
            Some(descriptor) => Ok(descriptor),

            None => fail(RuntimeError::TypeNotFound {
                name: CompactString::from(type_name::<T>()),
                suggestion: None,
            }),
        }
    }

    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline(always)]
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    #[inline(always)]
    pub fn category(&self) -> TypeCategory {
        self.category
    }

    /// Returns the identity of the Rust type described by this descriptor.
    #[inline(always)]
    pub fn type_id(&self) -> Option<TypeId> {
        self.native.map(|(id, _)| id)
    }

    /// Returns the name of the Rust type described by this descriptor.
    #[inline(always)]
    pub fn native_name(&self) -> Option<&'static str> {
        self.native.map(|(_, name)| name)
    }

    /// Returns the direct base types in declaration order.
    #[inline(always)]
    pub fn bases(&self) -> &[Arc<TypeDescriptor>] {
        &self.bases
    }

    /// Returns the properties declared by this type, excluding the inherited
    /// ones.
    #[inline(always)]
    pub fn properties(&self) -> &[Arc<PropertyInfo>] {
        &self.properties
    }

    #[inline(always)]
    pub fn events(&self) -> &[Arc<EventInfo>] {
        &self.events
    }

    #[inline(always)]
    pub fn method_groups(&self) -> &[Arc<MethodGroup>] {
        &self.methods
    }

    #[inline(always)]
    pub fn constructors(&self) -> Option<&Arc<MethodGroup>> {
        self.constructors.as_ref()
    }

    #[inline(always)]
    pub fn enum_items(&self) -> &[(CompactString, Value)] {
        &self.enum_items
    }

    /// Returns true if the type has a [ValueSerializer].
    #[inline(always)]
    pub fn is_serializable(&self) -> bool {
        self.serializer.is_some()
    }

    /// Returns true if this type is `name`, or if any of its base types,
    /// directly or transitively, is `name`.
    pub fn can_convert_to(&self, name: &str) -> bool {
        if self.name == name {
            return true;
        }

        self.bases.iter().any(|base| base.can_convert_to(name))
    }

    /// Searches for the property in this type and its base types.
    pub fn property(&self, name: &str) -> RuntimeResult<Arc<PropertyInfo>> {
        match self.find_member(name, &|ty| ty.own_property(name)) {
            Some(property) => Ok(property),
            None => self.member_not_found(MemberKind::Property, name, &|ty| ty.property_names()),
        }
    }

    /// Searches for the method group in this type and its base types.
    pub fn method_group(&self, name: &str) -> RuntimeResult<Arc<MethodGroup>> {
        match self.find_member(name, &|ty| ty.own_method_group(name)) {
            Some(group) => Ok(group),
            None => self.member_not_found(MemberKind::Method, name, &|ty| ty.method_names()),
        }
    }

    /// Searches for the event in this type and its base types.
    pub fn event(&self, name: &str) -> RuntimeResult<Arc<EventInfo>> {
        match self.find_member(name, &|ty| ty.own_event(name)) {
            Some(event) => Ok(event),
            None => self.member_not_found(MemberKind::Event, name, &|ty| ty.event_names()),
        }
    }

    /// Returns the enum item by name.
    pub fn enum_item(&self, name: &str) -> RuntimeResult<Value> {
        if let Some((_, value)) = self.enum_items.iter().find(|(item, _)| *item == name) {
            return Ok(value.clone());
        }

        fail(RuntimeError::MemberNotFound {
            kind: MemberKind::Property,
            owner: self.name.clone(),
            name: CompactString::from(name),
            suggestion: suggest(name, self.enum_items.iter().map(|(item, _)| item.as_str())),
        })
    }

    /// Constructs a new instance of this type through the constructor group.
    ///
    /// A primitive type without constructors produces its
    /// [default value](ValueSerializer::default_value) when called without
    /// arguments.
    pub fn construct(&self, arguments: &[Value]) -> RuntimeResult<Value> {
        if let Some(constructors) = &self.constructors {
            return constructors.invoke(None, arguments);
        }

        if let (Some(serializer), true) = (&self.serializer, arguments.is_empty()) {
            return serializer.default_value();
        }

        fail(RuntimeError::MemberNotFound {
            kind: MemberKind::Constructor,
            owner: self.name.clone(),
            name: CompactString::from("new"),
            suggestion: None,
        })
    }

    /// Returns the default value of the primitive type.
    pub fn default_value(&self) -> RuntimeResult<Value> {
        match &self.serializer {
            Some(serializer) => serializer.default_value(),
            None => self.not_serializable(),
        }
    }

    /// Converts the boxed primitive value into text.
    pub fn serialize(&self, value: &Value) -> RuntimeResult<String> {
        match &self.serializer {
            Some(serializer) => serializer.serialize(value),
            None => self.not_serializable(),
        }
    }

    /// Parses the text into the boxed primitive value.
    pub fn deserialize(&self, text: &str) -> RuntimeResult<Value> {
        match &self.serializer {
            Some(serializer) => serializer.deserialize(text),
            None => self.not_serializable(),
        }
    }

    #[inline(always)]
    fn own_property(&self, name: &str) -> Option<Arc<PropertyInfo>> {
        Some(self.properties[*self.property_index.get(name)?].clone())
    }

    #[inline(always)]
    fn own_method_group(&self, name: &str) -> Option<Arc<MethodGroup>> {
        Some(self.methods[*self.method_index.get(name)?].clone())
    }

    #[inline(always)]
    fn own_event(&self, name: &str) -> Option<Arc<EventInfo>> {
        Some(self.events[*self.event_index.get(name)?].clone())
    }

    fn property_names(&self) -> Vec<&str> {
        self.properties.iter().map(|member| member.name()).collect()
    }

    fn method_names(&self) -> Vec<&str> {
        self.methods.iter().map(|member| member.name()).collect()
    }

    fn event_names(&self) -> Vec<&str> {
        self.events.iter().map(|member| member.name()).collect()
    }

    fn find_member<M>(&self, name: &str, own: &dyn Fn(&Self) -> Option<M>) -> Option<M> {
        if let Some(member) = own(self) {
            return Some(member);
        }

        self.bases.iter().find_map(|base| base.find_member(name, own))
    }

    fn member_not_found<T>(
        &self,
        kind: MemberKind,
        name: &str,
        names: &dyn for<'a> Fn(&'a Self) -> Vec<&'a str>,
    ) -> RuntimeResult<T> {
        let mut candidates = Vec::new();

        self.collect_names(names, &mut candidates);

        fail(RuntimeError::MemberNotFound {
            kind,
            owner: self.name.clone(),
            name: CompactString::from(name),
            suggestion: suggest(name, candidates),
        })
    }

    fn collect_names<'a>(
        &'a self,
        names: &dyn for<'b> Fn(&'b Self) -> Vec<&'b str>,
        result: &mut Vec<&'a str>,
    ) {
        result.extend(names(self));

        for base in &self.bases {
            base.collect_names(names, result);
        }
    }

    #[inline(always)]
    fn not_serializable<T>(&self) -> RuntimeResult<T> {
        fail(RuntimeError::NotSerializable {
            type_name: self.name.clone(),
        })
    }
}

/// A builder of the [TypeDescriptor].
///
/// The builder panics on duplicate property and event names. Methods with the
/// same name form a single overloaded [MethodGroup]. Constructors form the
/// type's constructor group.
pub struct TypeDescriptorBuilder {
    descriptor: TypeDescriptor,
    constructors: Option<MethodGroup>,
    methods: Vec<MethodGroup>,
}

impl TypeDescriptorBuilder {
    pub fn new(name: &str, kind: TypeKind) -> Self {
        Self {
            descriptor: TypeDescriptor {
                name: CompactString::from(name),
                kind,
                native: None,
                category: TypeCategory::NonGeneric,
                bases: Vec::new(),
                properties: Vec::new(),
                property_index: AHashMap::new(),
                events: Vec::new(),
                event_index: AHashMap::new(),
                methods: Vec::new(),
                method_index: AHashMap::new(),
                constructors: None,
                serializer: None,
                enum_items: Vec::new(),
            },
            constructors: None,
            methods: Vec::new(),
        }
    }

    /// Binds the descriptor to the Rust type `T`.
    ///
    /// The objects and the boxed data of this Rust type resolve their dynamic
    /// type to this descriptor.
    #[inline(always)]
    pub fn native<T: ?Sized + 'static>(mut self) -> Self {
        self.descriptor.native = Some((TypeId::of::<T>(), type_name::<T>()));

        self
    }

    #[inline(always)]
    pub fn category(mut self, category: TypeCategory) -> Self {
        self.descriptor.category = category;

        self
    }

    /// Adds the base type.
    ///
    /// The members of the base types are inherited by this type.
    #[inline(always)]
    pub fn base(mut self, base: &Arc<TypeDescriptor>) -> Self {
        self.descriptor.bases.push(base.clone());

        self
    }

    pub fn property(mut self, mut property: PropertyInfo) -> Self {
        if self.descriptor.property_index.contains_key(property.name()) {
            system_panic!(
                "Property {:?} is already declared in type {:?}.",
                property.name(),
                self.descriptor.name,
            );
        }

        property.owner = self.descriptor.name.clone();

        let _ = self
            .descriptor
            .property_index
            .insert(property.name.clone(), self.descriptor.properties.len());

        self.descriptor.properties.push(Arc::new(property));

        self
    }

    pub fn event(mut self, event: EventInfo) -> Self {
        if self.descriptor.event_index.contains_key(event.name()) {
            system_panic!(
                "Event {:?} is already declared in type {:?}.",
                event.name(),
                self.descriptor.name,
            );
        }

        let _ = self
            .descriptor
            .event_index
            .insert(CompactString::from(event.name()), self.descriptor.events.len());

        self.descriptor.events.push(Arc::new(event));

        self
    }

    /// Adds the method or the constructor.
    ///
    /// A method with the name of an already added method becomes the next
    /// overload in the same group.
    pub fn method(mut self, method: MethodInfo) -> Self {
        if method.kind() == MethodKind::Constructor {
            self.constructors
                .get_or_insert_with(|| MethodGroup::new(CompactString::from(method.name())))
                .push(method);

            return self;
        }

        match self
            .descriptor
            .method_index
            .get(method.name())
            .copied()
        {
            Some(index) => self.methods[index].push(method),

            None => {
                let name = CompactString::from(method.name());
                let mut group = MethodGroup::new(name.clone());

                group.push(method);

                let _ = self.descriptor.method_index.insert(name, self.methods.len());

                self.methods.push(group);
            }
        }

        self
    }

    #[inline(always)]
    pub fn serializer(mut self, serializer: impl ValueSerializer + 'static) -> Self {
        self.descriptor.serializer = Some(Box::new(serializer));

        self
    }

    pub fn enum_item(mut self, name: &str, value: Value) -> Self {
        if self
            .descriptor
            .enum_items
            .iter()
            .any(|(item, _)| *item == name)
        {
            system_panic!(
                "Enum item {name:?} is already declared in type {:?}.",
                self.descriptor.name,
            );
        }

        self.descriptor
            .enum_items
            .push((CompactString::from(name), value));

        self
    }

    pub fn build(mut self) -> TypeDescriptor {
        self.descriptor.methods = self.methods.into_iter().map(Arc::new).collect();
        self.descriptor.constructors = self.constructors.map(Arc::new);

        self.descriptor
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicI32, Ordering},
        Arc,
    };

    use crate::runtime::{
        MemberKind,
        MethodInfo,
        ObjectBase,
        PropertyInfo,
        Ptr,
        Reflectable,
        RuntimeError,
        TypeDescriptorBuilder,
        TypeKind,
        Value,
    };

    #[derive(Default)]
    struct Shape {
        object: ObjectBase,
        sides: AtomicI32,
    }

    impl Reflectable for Shape {
        fn object(&self) -> &ObjectBase {
            &self.object
        }
    }

    #[test]
    fn test_member_lookup() {
        let base = Arc::new(
            TypeDescriptorBuilder::new("Shape", TypeKind::Class)
                .native::<Shape>()
                .property(PropertyInfo::readonly("sides", |this: &Ptr<Shape>| {
                    this.sides.load(Ordering::SeqCst)
                }))
                .property(PropertyInfo::writeonly(
                    "secret",
                    |this: &Ptr<Shape>, value: i32| this.sides.store(value, Ordering::SeqCst),
                ))
                .method(MethodInfo::method("grow", &[], |this: &Ptr<Shape>| {
                    this.sides.fetch_add(1, Ordering::SeqCst) + 1
                }))
                .build(),
        );

        let derived = TypeDescriptorBuilder::new("Square", TypeKind::Class)
            .base(&base)
            .method(MethodInfo::function("unit", &[], || 1i32))
            .build();

        assert!(derived.can_convert_to("Shape"));
        assert!(!base.can_convert_to("Square"));

        let shape = Value::from_ptr(Ptr::new(Shape::default()));

        let grow = derived.method_group("grow").unwrap();

        assert_eq!(*grow.invoke(Some(&shape), &[]).unwrap().unbox::<i32>().unwrap(), 1);

        let sides = derived.property("sides").unwrap();

        assert_eq!(sides.owner(), "Shape");
        assert_eq!(*sides.get_value(&shape).unwrap().unbox::<i32>().unwrap(), 1);

        match sides.set_value(&shape, Value::give(3).unwrap()) {
            Err(RuntimeError::NotWritable { owner, property }) => {
                assert_eq!(owner, "Shape");
                assert_eq!(property, "sides");
            }

            other => panic!("unexpected result: {other:?}"),
        }

        let secret = derived.property("secret").unwrap();

        secret.set_value(&shape, Value::give(8).unwrap()).unwrap();

        assert!(matches!(
            secret.get_value(&shape),
            Err(RuntimeError::NotReadable { .. }),
        ));

        assert_eq!(*sides.get_value(&shape).unwrap().unbox::<i32>().unwrap(), 8);

        match derived.method_group("gorw") {
            Err(RuntimeError::MemberNotFound {
                kind,
                owner,
                suggestion,
                ..
            }) => {
                assert_eq!(kind, MemberKind::Method);
                assert_eq!(owner, "Square");
                assert_eq!(suggestion.as_deref(), Some("grow"));
            }

            other => panic!("unexpected result: {other:?}"),
        }

        assert!(matches!(
            derived.construct(&[]),
            Err(RuntimeError::MemberNotFound {
                kind: MemberKind::Constructor,
                ..
            }),
        ));

        assert!(matches!(
            derived.serialize(&shape),
            Err(RuntimeError::NotSerializable { .. }),
        ));
    }

    #[test]
    fn test_enum_items() {
        let descriptor = TypeDescriptorBuilder::new("Direction", TypeKind::Enum)
            .enum_item("North", Value::give(0u8).unwrap())
            .enum_item("South", Value::give(1u8).unwrap())
            .build();

        assert_eq!(
            *descriptor.enum_item("South").unwrap().unbox::<u8>().unwrap(),
            1,
        );

        match descriptor.enum_item("Nort") {
            Err(RuntimeError::MemberNotFound { suggestion, .. }) => {
                assert_eq!(suggestion.as_deref(), Some("North"));
            }

            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    #[should_panic(expected = "Ad Astra Reflect internal error. Property \"x\" is already declared")]
    fn test_duplicate_property() {
        let _ = TypeDescriptorBuilder::new("Twice", TypeKind::Struct)
            .property(PropertyInfo::readonly("x", |this: &i32| *this))
            .property(PropertyInfo::readonly("x", |this: &i32| *this));
    }

    #[test]
    #[should_panic(expected = "Enum item \"North\" is already declared in type \"Direction\"")]
    fn test_duplicate_enum_item() {
        let _ = TypeDescriptorBuilder::new("Direction", TypeKind::Enum)
            .enum_item("North", Value::give(0u8).unwrap())
            .enum_item("North", Value::give(1u8).unwrap());
    }
}
