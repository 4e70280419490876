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
    any::TypeId,
    fmt::{Debug, Formatter},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
        RwLock,
        RwLockReadGuard,
        RwLockWriteGuard,
    },
};

use ahash::AHashMap;
use compact_str::CompactString;
use lady_deirdre::sync::Lazy;
use log::{debug, warn};

use crate::{
    exports::PredefinedTypes,
    report::system_panic,
    runtime::{
        error::{fail, suggest},
        RuntimeError,
        RuntimeResult,
        TypeDescriptor,
        TypeDescriptorBuilder,
    },
};

/// A source of the type descriptors.
///
/// The loader is installed into the [TypeManager] through the
/// [add_type_loader](TypeManager::add_type_loader) function. The manager runs
/// the loader each time it loads the registry.
///
/// The trait is implemented for any `Fn(&mut TypeRegistrar)` function.
pub trait TypeLoader: Send + Sync + 'static {
    /// Registers the loader's types through the `registrar`.
    fn load(&self, registrar: &mut TypeRegistrar);
}

impl<F> TypeLoader for F
where
    F: Fn(&mut TypeRegistrar) + Send + Sync + 'static,
{
    #[inline(always)]
    fn load(&self, registrar: &mut TypeRegistrar) {
        self(registrar)
    }
}

/// An identifier of the installed [TypeLoader].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LoaderId(usize);

/// A collector of the type descriptors produced by a [TypeLoader].
pub struct TypeRegistrar {
    known: AHashMap<CompactString, Arc<TypeDescriptor>>,
    added: Vec<Arc<TypeDescriptor>>,
}

impl TypeRegistrar {
    /// Builds and registers the type descriptor.
    ///
    /// Returns the registered descriptor, which can be used as a
    /// [base](TypeDescriptorBuilder::base) of the subsequently registered
    /// types.
    pub fn add(&mut self, builder: TypeDescriptorBuilder) -> Arc<TypeDescriptor> {
        let descriptor = Arc::new(builder.build());

        self.added.push(descriptor.clone());

        descriptor
    }

    /// Searches for the type registered by this loader, or by the loaders
    /// that ran before it.
    pub fn find(&self, name: &str) -> Option<Arc<TypeDescriptor>> {
        if let Some(descriptor) = self
            .added
            .iter()
            .rev()
            .find(|descriptor| descriptor.name() == name)
        {
            return Some(descriptor.clone());
        }

        self.known.get(name).cloned()
    }
}

/// A registry of the runtime [type descriptors](TypeDescriptor).
///
/// The manager owns a set of [type loaders](TypeLoader). When the manager is
/// loaded, it runs each installed loader and indexes the produced
/// descriptors by name and by Rust type identity. When unloaded, the manager
/// clears the indexes, and every lookup fails with
/// [RuntimeError::TypeNotFound].
///
/// Each structural change of the registry increments the manager's
/// [version](Self::version) counter.
///
/// The process-wide instance is available through the [global](Self::global)
/// function. This instance is created loaded, and it includes the predefined
/// types: the primitives, `DateTime`, `Pair`, `Void`, and the universal
/// interface types.
///
/// ```
/// use ad_astra_reflect::runtime::{
///     TypeDescriptorBuilder,
///     TypeKind,
///     TypeManager,
///     TypeRegistrar,
/// };
///
/// let manager = TypeManager::new();
///
/// let _ = manager.add_type_loader(|registrar: &mut TypeRegistrar| {
///     let _ = registrar.add(TypeDescriptorBuilder::new("Point", TypeKind::Struct));
/// });
///
/// assert!(manager.type_by_name("Point").is_err());
///
/// manager.load();
///
/// assert_eq!(manager.type_by_name("Point").unwrap().name(), "Point");
/// ```
pub struct TypeManager {
    id: usize,
    state: RwLock<ManagerState>,
    version: AtomicUsize,
    next_loader: AtomicUsize,
}

impl Default for TypeManager {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for TypeManager {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        let state = self.read();

        formatter
            .debug_struct("TypeManager")
            .field("loaded", &state.loaded)
            .field("loaders", &state.loaders.len())
            .field("types", &state.by_name.len())
            .field("version", &self.version())
            .finish()
    }
}

impl TypeManager {
    /// Returns the process-wide type manager.
    pub fn global() -> &'static Self {
        static GLOBAL: Lazy<TypeManager> = Lazy::new(|| {
            let manager = TypeManager::new();

            let _ = manager.add_type_loader(PredefinedTypes);

            manager.load();

            manager
        });

        &GLOBAL
    }

    /// Creates an unloaded manager without loaders.
    pub fn new() -> Self {
        static NEXT_MANAGER: AtomicUsize = AtomicUsize::new(1);

        Self {
            id: NEXT_MANAGER.fetch_add(1, Ordering::Relaxed),
            state: RwLock::new(ManagerState {
                loaded: false,
                loaders: Vec::new(),
                by_name: AHashMap::new(),
                by_id: AHashMap::new(),
                owners: AHashMap::new(),
            }),
            version: AtomicUsize::new(0),
            next_loader: AtomicUsize::new(0),
        }
    }

    /// Installs the type loader.
    ///
    /// If the manager is loaded, the loader's types are registered
    /// immediately.
    ///
    /// The function panics if the loader registers a type name that is
    /// already registered.
    pub fn add_type_loader(&self, loader: impl TypeLoader) -> LoaderId {
        let id = LoaderId(self.next_loader.fetch_add(1, Ordering::Relaxed));
        let loader: Arc<dyn TypeLoader> = Arc::new(loader);

        if !self.is_loaded() {
            self.write().loaders.push((id, loader));

            debug!("Type loader {id:?} installed.");

            return id;
        }

        let mut registrar = TypeRegistrar {
            known: self.read().by_name.clone(),
            added: Vec::new(),
        };

        loader.load(&mut registrar);

        let mut state = self.write();

        state.loaders.push((id, loader));

        if state.loaded {
            state.register(id, registrar.added);
            self.bump();
        }

        debug!("Type loader {id:?} installed and loaded.");

        id
    }

    /// Uninstalls the type loader.
    ///
    /// If the manager is loaded, the loader's types are unregistered. Returns
    /// false if the loader is not installed.
    pub fn remove_type_loader(&self, id: LoaderId) -> bool {
        let mut state = self.write();

        let Some(index) = state.loaders.iter().position(|(loader, _)| *loader == id) else {
            return false;
        };

        let _ = state.loaders.remove(index);

        if state.loaded {
            state.unregister(id);
            self.bump();
        }

        debug!("Type loader {id:?} removed.");

        true
    }

    /// Runs every installed loader and registers the produced types.
    ///
    /// Does nothing if the manager is already loaded.
    ///
    /// The function panics if two loaders register the same type name.
    pub fn load(&self) {
        let loaders = {
            let state = self.read();

            if state.loaded {
                return;
            }

            state.loaders.clone()
        };

        let mut known = AHashMap::new();
        let mut batches = Vec::with_capacity(loaders.len());

        for (id, loader) in &loaders {
            let mut registrar = TypeRegistrar {
                known,
                added: Vec::new(),
            };

            loader.load(&mut registrar);

            for descriptor in &registrar.added {
                let _ = registrar
                    .known
                    .insert(CompactString::from(descriptor.name()), descriptor.clone());
            }

            known = registrar.known;
            batches.push((*id, registrar.added));
        }

        let mut state = self.write();

        if state.loaded {
            return;
        }

        for (id, descriptors) in batches {
            if state.loaders.iter().any(|(loader, _)| *loader == id) {
                state.register(id, descriptors);
            }
        }

        state.loaded = true;

        self.bump();

        debug!(
            "Type manager loaded {} types from {} loaders.",
            state.by_name.len(),
            state.loaders.len(),
        );
    }

    /// Unregisters all types while keeping the loaders installed.
    ///
    /// Does nothing if the manager is not loaded.
    pub fn unload(&self) {
        let mut state = self.write();

        if !state.loaded {
            return;
        }

        state.by_name.clear();
        state.by_id.clear();
        state.owners.clear();
        state.loaded = false;

        self.bump();

        debug!("Type manager unloaded.");
    }

    /// Unloads and then loads the manager again.
    pub fn reload(&self) {
        self.unload();
        self.load();
    }

    #[inline(always)]
    pub fn is_loaded(&self) -> bool {
        self.read().loaded
    }

    /// Returns the counter of the structural changes of the registry.
    ///
    /// The cached type bindings of the objects are invalidated when this
    /// counter changes.
    #[inline(always)]
    pub fn version(&self) -> usize {
        self.version.load(Ordering::Acquire)
    }

    /// Returns the type descriptor by the type name.
    ///
    /// Fails with [RuntimeError::TypeNotFound] if there is no such type.
    pub fn type_by_name(&self, name: &str) -> RuntimeResult<Arc<TypeDescriptor>> {
        let state = self.read();

        if let Some(descriptor) = state.by_name.get(name) {
            return Ok(descriptor.clone());
        }

        let suggestion = suggest(name, state.by_name.keys().map(CompactString::as_str));

        drop(state);

        fail(RuntimeError::TypeNotFound {
            name: CompactString::from(name),
            suggestion,
        })
    }

    /// A non-failing version of the [type_by_name](Self::type_by_name)
    /// function.
    #[inline(always)]
    pub fn find_type(&self, name: &str) -> Option<Arc<TypeDescriptor>> {
        self.read().by_name.get(name).cloned()
    }

    /// Returns the type descriptor bound to the Rust type identity.
    #[inline(always)]
    pub fn type_by_id(&self, id: TypeId) -> Option<Arc<TypeDescriptor>> {
        self.read().by_id.get(&id).cloned()
    }

    /// Returns the names of all registered types in alphabetical order.
    pub fn type_names(&self) -> Vec<CompactString> {
        let mut names = self.read().by_name.keys().cloned().collect::<Vec<_>>();

        names.sort();

        names
    }

    // A process-unique identifier of this manager instance.
    #[inline(always)]
    pub(crate) fn id(&self) -> usize {
        self.id
    }

    #[inline(always)]
    fn bump(&self) {
        let _ = self.version.fetch_add(1, Ordering::AcqRel);
    }

    #[inline(always)]
    fn read(&self) -> RwLockReadGuard<'_, ManagerState> {
        self.state
            .read()
            .unwrap_or_else(|poison| poison.into_inner())
    }

    #[inline(always)]
    fn write(&self) -> RwLockWriteGuard<'_, ManagerState> {
        self.state
            .write()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

struct ManagerState {
    loaded: bool,
    loaders: Vec<(LoaderId, Arc<dyn TypeLoader>)>,
    by_name: AHashMap<CompactString, Arc<TypeDescriptor>>,
    by_id: AHashMap<TypeId, Arc<TypeDescriptor>>,
    owners: AHashMap<LoaderId, Vec<Arc<TypeDescriptor>>>,
}

impl ManagerState {
    fn register(&mut self, id: LoaderId, descriptors: Vec<Arc<TypeDescriptor>>) {
        for (index, descriptor) in descriptors.iter().enumerate() {
            let duplicate = self.by_name.contains_key(descriptor.name())
                || descriptors[..index]
                    .iter()
                    .any(|previous| previous.name() == descriptor.name());

            if duplicate {
                system_panic!("Type {:?} is already registered.", descriptor.name());
            }
        }

        for descriptor in &descriptors {
            let _ = self
                .by_name
                .insert(CompactString::from(descriptor.name()), descriptor.clone());

            let Some(type_id) = descriptor.type_id() else {
                continue;
            };

            match self.by_id.get(&type_id) {
                Some(previous) => warn!(
                    "Type {} describes the same Rust type as type {}.",
                    descriptor.name(),
                    previous.name(),
                ),

                None => {
                    let _ = self.by_id.insert(type_id, descriptor.clone());
                }
            }
        }

        self.owners.entry(id).or_default().extend(descriptors);
    }

    fn unregister(&mut self, id: LoaderId) {
        let Some(descriptors) = self.owners.remove(&id) else {
            return;
        };

        for descriptor in descriptors {
            let _ = self.by_name.remove(descriptor.name());

            let Some(type_id) = descriptor.type_id() else {
                continue;
            };

            if let Some(current) = self.by_id.get(&type_id) {
                if Arc::ptr_eq(current, &descriptor) {
                    let _ = self.by_id.remove(&type_id);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicI32, Ordering},
        Arc,
        Once,
    };

    use crate::runtime::{
        aggregate,
        MethodInfo,
        ObjectBase,
        PropertyInfo,
        Ptr,
        Reflectable,
        RuntimeError,
        TypeDescriptorBuilder,
        TypeKind,
        TypeManager,
        TypeRegistrar,
        Value,
    };

    struct Alpha;

    #[test]
    fn test_manager_lifecycle() {
        let manager = TypeManager::new();

        assert!(!manager.is_loaded());

        let id = manager.add_type_loader(|registrar: &mut TypeRegistrar| {
            let _ = registrar.add(
                TypeDescriptorBuilder::new("Alpha", TypeKind::Struct).native::<Alpha>(),
            );
        });

        assert!(matches!(
            manager.type_by_name("Alpha"),
            Err(RuntimeError::TypeNotFound { .. }),
        ));

        let version = manager.version();

        manager.load();

        assert!(manager.is_loaded());
        assert!(manager.version() > version);
        assert_eq!(manager.type_names(), vec!["Alpha"]);
        assert_eq!(
            manager
                .type_by_id(std::any::TypeId::of::<Alpha>())
                .unwrap()
                .name(),
            "Alpha",
        );

        match manager.type_by_name("Alpah") {
            Err(RuntimeError::TypeNotFound { suggestion, .. }) => {
                assert_eq!(suggestion.as_deref(), Some("Alpha"));
            }

            other => panic!("unexpected result: {other:?}"),
        }

        let beta = manager.add_type_loader(|registrar: &mut TypeRegistrar| {
            let alpha = registrar.find("Alpha").unwrap();

            let _ = registrar.add(
                TypeDescriptorBuilder::new("Beta", TypeKind::Class).base(&alpha),
            );
        });

        assert!(manager.type_by_name("Beta").unwrap().can_convert_to("Alpha"));

        manager.unload();

        assert!(manager.find_type("Alpha").is_none());
        assert!(manager.type_by_id(std::any::TypeId::of::<Alpha>()).is_none());

        manager.reload();

        assert_eq!(manager.type_names(), vec!["Alpha", "Beta"]);

        assert!(manager.remove_type_loader(beta));
        assert!(!manager.remove_type_loader(beta));
        assert!(manager.find_type("Beta").is_none());

        assert!(manager.remove_type_loader(id));
        assert!(manager.type_names().is_empty());
    }

    #[test]
    #[should_panic(expected = "Ad Astra Reflect internal error. Type \"Twin\" is already registered.")]
    fn test_duplicate_type_name() {
        let manager = TypeManager::new();

        manager.load();

        for _ in 0..2 {
            let _ = manager.add_type_loader(|registrar: &mut TypeRegistrar| {
                let _ = registrar.add(TypeDescriptorBuilder::new("Twin", TypeKind::Struct));
            });
        }
    }

    #[test]
    fn test_predefined_types() {
        let manager = TypeManager::global();

        assert!(manager.is_loaded());

        for name in ["i32", "f64", "bool", "String", "Void", "Pair", "Object", "List"] {
            assert!(manager.find_type(name).is_some(), "missing type {name}");
        }
    }

    #[derive(Default)]
    struct Hidden {
        object: ObjectBase,
        level: AtomicI32,
    }

    impl Reflectable for Hidden {
        fn object(&self) -> &ObjectBase {
            &self.object
        }
    }

    #[test]
    fn test_private_manager_dispatch() {
        let manager = TypeManager::new();

        let _ = manager.add_type_loader(|registrar: &mut TypeRegistrar| {
            let _ = registrar.add(
                TypeDescriptorBuilder::new("Hidden", TypeKind::Class)
                    .native::<Hidden>()
                    .method(MethodInfo::constructor(&["level"], |level: i32| {
                        Ptr::new(Hidden {
                            object: ObjectBase::default(),
                            level: AtomicI32::new(level),
                        })
                    }))
                    .property(PropertyInfo::read_write(
                        "level",
                        |this: &Ptr<Hidden>| this.level.load(Ordering::SeqCst),
                        |this: &Ptr<Hidden>, value: i32| this.level.store(value, Ordering::SeqCst),
                    )),
            );
        });

        manager.load();

        let detached = Value::from_ptr(Ptr::new(Hidden::default()));

        assert_eq!(
            detached.type_descriptor_in(&manager).unwrap().name(),
            "Hidden",
        );
        assert_ne!(detached.type_descriptor().unwrap().name(), "Hidden");

        assert!(matches!(
            Value::create("Hidden", &[Value::give(3).unwrap()]),
            Err(RuntimeError::TypeNotFound { .. }),
        ));

        let hidden = Value::create_in(&manager, "Hidden", &[Value::give(3).unwrap()]).unwrap();

        assert_eq!(hidden.type_descriptor_in(&manager).unwrap().name(), "Hidden");
        assert_eq!(
            *hidden
                .get_property_in(&manager, "level")
                .unwrap()
                .unbox::<i32>()
                .unwrap(),
            3,
        );

        hidden
            .set_property_in(&manager, "level", Value::give(7).unwrap())
            .unwrap();

        assert_eq!(
            *hidden
                .get_property_in(&manager, "level")
                .unwrap()
                .unbox::<i32>()
                .unwrap(),
            7,
        );

        assert!(hidden.get_property("level").is_err());
    }

    #[derive(Default)]
    struct Base {
        object: ObjectBase,
        a: AtomicI32,
    }

    impl Reflectable for Base {
        fn object(&self) -> &ObjectBase {
            &self.object
        }
    }

    #[derive(Default)]
    struct Derived {
        object: ObjectBase,
        b: AtomicI32,
    }

    impl Reflectable for Derived {
        fn object(&self) -> &ObjectBase {
            &self.object
        }
    }

    fn register_derived() {
        static REGISTER: Once = Once::new();

        REGISTER.call_once(|| {
            let _ = TypeManager::global().add_type_loader(|registrar: &mut TypeRegistrar| {
                let base = registrar.add(
                    TypeDescriptorBuilder::new("Base", TypeKind::Class)
                        .native::<Base>()
                        .property(PropertyInfo::read_write(
                            "a",
                            |this: &Ptr<Base>| this.a.load(Ordering::SeqCst),
                            |this: &Ptr<Base>, value: i32| this.a.store(value, Ordering::SeqCst),
                        )),
                );

                let _ = registrar.add(
                    TypeDescriptorBuilder::new("Derived", TypeKind::Class)
                        .native::<Derived>()
                        .base(&base)
                        .method(MethodInfo::constructor(&["a", "b"], |a: i32, b: i32| {
                            let derived = Ptr::new(Derived {
                                object: ObjectBase::default(),
                                b: AtomicI32::new(b),
                            });

                            let base: Arc<dyn Reflectable> = Arc::new(Base {
                                object: ObjectBase::default(),
                                a: AtomicI32::new(a),
                            });

                            aggregate(derived.root(), [base]);

                            derived
                        }))
                        .property(PropertyInfo::readonly("b", |this: &Ptr<Derived>| {
                            this.b.load(Ordering::SeqCst)
                        }))
                        .method(MethodInfo::method(
                            "Reset",
                            &["a", "b"],
                            |this: &Ptr<Derived>, a: i32, b: i32| {
                                if let Some(base) = this.cast::<Base>() {
                                    base.a.store(a, Ordering::SeqCst);
                                }

                                this.b.store(b, Ordering::SeqCst);
                            },
                        )),
                );
            });
        });
    }

    #[test]
    fn test_derived_object() {
        register_derived();

        let derived = Value::create(
            "Derived",
            &[Value::give(10).unwrap(), Value::give(20).unwrap()],
        )
        .unwrap();

        assert_eq!(derived.type_name(), "Derived");
        assert!(derived.type_descriptor().unwrap().can_convert_to("Base"));

        assert_eq!(*derived.get_property("a").unwrap().unbox::<i32>().unwrap(), 10);
        assert_eq!(*derived.get_property("b").unwrap().unbox::<i32>().unwrap(), 20);

        let _ = derived
            .invoke("Reset", &[Value::give(30).unwrap(), Value::give(40).unwrap()])
            .unwrap();

        assert_eq!(*derived.get_property("a").unwrap().unbox::<i32>().unwrap(), 30);
        assert_eq!(*derived.get_property("b").unwrap().unbox::<i32>().unwrap(), 40);

        derived.set_property("a", Value::give(5).unwrap()).unwrap();

        assert_eq!(*derived.get_property("a").unwrap().unbox::<i32>().unwrap(), 5);

        assert!(matches!(
            derived.set_property("b", Value::give(1).unwrap()),
            Err(RuntimeError::NotWritable { .. }),
        ));

        match derived.invoke("Reset", &[Value::give(1).unwrap()]) {
            Err(RuntimeError::ArgumentCountMismatch {
                expected, actual, ..
            }) => {
                assert_eq!(expected, 2);
                assert_eq!(actual, 1);
            }

            other => panic!("unexpected result: {other:?}"),
        }

        assert!(matches!(
            Value::create("Derivd", &[]),
            Err(RuntimeError::TypeNotFound { .. }),
        ));
    }
}
