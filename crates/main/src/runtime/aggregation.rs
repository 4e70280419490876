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
    mem::take,
    sync::{Arc, Weak},
};

use log::{trace, warn};

use crate::{
    report::system_panic,
    runtime::{
        error::fail,
        object::object_address,
        object_type_name,
        Reflectable,
        RuntimeError,
        RuntimeResult,
    },
};

// The aggregation side-table of a participant.
//
// The root owns its parents, and each non-root participant refers to the root
// weakly. The root's own `root` field is None.
#[derive(Default)]
pub(crate) struct Aggregation {
    root: Option<Weak<dyn Reflectable>>,
    parents: Vec<Arc<dyn Reflectable>>,
}

/// Composes several independently allocated objects into one logical object.
///
/// The `root` becomes the aggregation root of the `parents`, and of all
/// participants of the parents' own aggregations. After the composition,
/// reference counting and disposal of every participant are redirected to the
/// root, and [safe_aggregation_cast] searches all participants.
///
/// The function panics if the root is a non-root participant of another
/// aggregation, or if one of the parents is already shared-owned or
/// aggregated into a different root. Aggregations are set up right after the
/// objects' construction.
pub fn aggregate(
    root: &Arc<dyn Reflectable>,
    parents: impl IntoIterator<Item = Arc<dyn Reflectable>>,
) {
    if has_root(root) {
        system_panic!(
            "'{}' instance is already aggregated into another object.",
            root.native_name(),
        );
    }

    let root_address = object_address(root);
    let weak_root = Arc::downgrade(root);
    let mut composed = Vec::new();

    for parent in parents {
        if object_address(&parent) == root_address {
            system_panic!("An object cannot aggregate itself.");
        }

        if parent.object().counter() != 0 {
            system_panic!(
                "'{}' instance is shared-owned and cannot be aggregated.",
                parent.native_name(),
            );
        }

        if has_root(&parent) {
            system_panic!(
                "'{}' instance is already aggregated into another object.",
                parent.native_name(),
            );
        }

        set_root(&parent, &weak_root);

        composed.push(parent);
    }

    let mut aggregation = root
        .object()
        .aggregation
        .write()
        .unwrap_or_else(|poison| poison.into_inner());

    aggregation
        .get_or_insert_with(Aggregation::default)
        .parents
        .append(&mut composed);
}

/// Returns the aggregation root of the object.
///
/// If the object does not participate in any aggregation, or if it is the
/// root itself, the function returns the object. If the object's root has
/// already been released, the function logs a warning and returns the
/// object as well; use [try_aggregation_root] to detect this case.
pub fn aggregation_root(object: &Arc<dyn Reflectable>) -> Arc<dyn Reflectable> {
    match try_aggregation_root(object) {
        Some(root) => root,

        None => {
            warn!(
                "'{}' instance outlived its aggregation root.",
                object.native_name(),
            );

            object.clone()
        }
    }
}

/// A checked version of the [aggregation_root] function.
///
/// Returns None if the object is a non-root participant whose root has
/// already been released.
pub fn try_aggregation_root(object: &Arc<dyn Reflectable>) -> Option<Arc<dyn Reflectable>> {
    let aggregation = object
        .object()
        .aggregation
        .read()
        .unwrap_or_else(|poison| poison.into_inner());

    match aggregation
        .as_ref()
        .and_then(|aggregation| aggregation.root.as_ref())
    {
        Some(root) => root.upgrade(),
        None => Some(object.clone()),
    }
}

/// Returns the parents directly composed by the object.
pub fn aggregation_parents(object: &Arc<dyn Reflectable>) -> Vec<Arc<dyn Reflectable>> {
    let aggregation = object
        .object()
        .aggregation
        .read()
        .unwrap_or_else(|poison| poison.into_inner());

    match aggregation.as_ref() {
        Some(aggregation) => aggregation.parents.clone(),
        None => Vec::new(),
    }
}

/// Searches all participants of the object's aggregation for the one whose
/// concrete type is `T`.
///
/// Returns None if there is no such participant.
///
/// The function panics if more than one participant has type `T`.
pub fn safe_aggregation_cast<T: Reflectable>(object: &Arc<dyn Reflectable>) -> Option<Arc<T>> {
    let root = aggregation_root(object);
    let expected = TypeId::of::<T>();

    let mut found = None;

    for participant in participants(&root) {
        if (*participant).as_any().type_id() != expected {
            continue;
        }

        if found.is_some() {
            system_panic!("Ambiguous aggregation cast to {}.", type_name::<T>());
        }

        found = Some(participant);
    }

    found?.into_any().downcast::<T>().ok()
}

/// Disposes the object's aggregation root and all of its participants.
///
/// The operation fails with [RuntimeError::NotDisposable] if the root's
/// reference counter is not zero. Disposing an already disposed object is a
/// noop.
pub fn force_dispose(object: &Arc<dyn Reflectable>) -> RuntimeResult<()> {
    let root = aggregation_root(object);
    let counter = root.object().counter();

    if counter != 0 {
        return fail(RuntimeError::NotDisposable {
            type_name: object_type_name(root.as_ref()),
            counter,
        });
    }

    dispose_object(&root);

    Ok(())
}

pub(super) fn dispose_object(object: &Arc<dyn Reflectable>) {
    if !object.object().mark_disposed() {
        return;
    }

    trace!("Disposing '{}' instance.", object.native_name());

    object.dispose();

    let parents = {
        let mut aggregation = object
            .object()
            .aggregation
            .write()
            .unwrap_or_else(|poison| poison.into_inner());

        match aggregation.as_mut() {
            Some(aggregation) => take(&mut aggregation.parents),
            None => Vec::new(),
        }
    };

    for parent in &parents {
        dispose_object(parent);
    }
}

fn has_root(object: &Arc<dyn Reflectable>) -> bool {
    let aggregation = object
        .object()
        .aggregation
        .read()
        .unwrap_or_else(|poison| poison.into_inner());

    match aggregation.as_ref() {
        Some(aggregation) => aggregation
            .root
            .as_ref()
            .map(|root| root.strong_count() > 0)
            .unwrap_or(false),

        None => false,
    }
}

fn set_root(object: &Arc<dyn Reflectable>, root: &Weak<dyn Reflectable>) {
    let parents = {
        let mut aggregation = object
            .object()
            .aggregation
            .write()
            .unwrap_or_else(|poison| poison.into_inner());

        let aggregation = aggregation.get_or_insert_with(Aggregation::default);

        aggregation.root = Some(root.clone());

        aggregation.parents.clone()
    };

    for parent in &parents {
        set_root(parent, root);
    }
}

fn participants(root: &Arc<dyn Reflectable>) -> Vec<Arc<dyn Reflectable>> {
    let mut result = Vec::new();
    let mut stack = vec![root.clone()];

    while let Some(next) = stack.pop() {
        stack.append(&mut aggregation_parents(&next));
        result.push(next);
    }

    result
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use crate::runtime::{
        aggregate,
        aggregation_root,
        force_dispose,
        object::object_address,
        reference_counter,
        safe_aggregation_cast,
        try_aggregation_root,
        ObjectBase,
        Ptr,
        Reflectable,
        RuntimeError,
    };

    macro_rules! participant {
        ($name:ident) => {
            #[derive(Default)]
            struct $name {
                object: ObjectBase,
                disposals: AtomicUsize,
            }

            impl Reflectable for $name {
                fn object(&self) -> &ObjectBase {
                    &self.object
                }

                fn dispose(&self) {
                    let _ = self.disposals.fetch_add(1, Ordering::SeqCst);
                }
            }
        };
    }

    participant!(Composite);
    participant!(First);
    participant!(Second);
    participant!(Third);

    fn same(left: &Arc<dyn Reflectable>, right: &Arc<dyn Reflectable>) -> bool {
        object_address(left) == object_address(right)
    }

    #[test]
    fn test_aggregation_root() {
        let composite = Arc::new(Composite::default());
        let first = Arc::new(First::default());
        let second = Arc::new(Second::default());

        let composite_object: Arc<dyn Reflectable> = composite.clone();
        let first_object: Arc<dyn Reflectable> = first.clone();
        let second_object: Arc<dyn Reflectable> = second.clone();

        aggregate(
            &composite_object,
            [first_object.clone(), second_object.clone()],
        );

        assert!(same(&aggregation_root(&first_object), &composite_object));
        assert!(same(&aggregation_root(&second_object), &composite_object));
        assert!(same(&aggregation_root(&composite_object), &composite_object));

        let cast = safe_aggregation_cast::<Second>(&first_object).unwrap();
        assert!(Arc::ptr_eq(&cast, &second));

        let cast = safe_aggregation_cast::<Composite>(&second_object).unwrap();
        assert!(Arc::ptr_eq(&cast, &composite));

        assert!(safe_aggregation_cast::<Third>(&first_object).is_none());
    }

    #[test]
    fn test_orphaned_participant() {
        let composite: Arc<dyn Reflectable> = Arc::new(Composite::default());
        let first: Arc<dyn Reflectable> = Arc::new(First::default());

        aggregate(&composite, [first.clone()]);

        assert!(same(&try_aggregation_root(&first).unwrap(), &composite));

        drop(composite);

        assert!(try_aggregation_root(&first).is_none());
        assert!(same(&aggregation_root(&first), &first));
    }

    #[test]
    fn test_nested_aggregation() {
        let outer: Arc<dyn Reflectable> = Arc::new(Composite::default());
        let inner: Arc<dyn Reflectable> = Arc::new(First::default());
        let third = Arc::new(Third::default());
        let third_object: Arc<dyn Reflectable> = third.clone();

        aggregate(&inner, [third_object.clone()]);
        assert!(same(&aggregation_root(&third_object), &inner));

        aggregate(&outer, [inner.clone()]);
        assert!(same(&aggregation_root(&third_object), &outer));
        assert!(same(&aggregation_root(&inner), &outer));

        let cast = safe_aggregation_cast::<Third>(&outer).unwrap();
        assert!(Arc::ptr_eq(&cast, &third));
    }

    #[test]
    fn test_shared_counter_and_cascade() {
        let composite = Arc::new(Composite::default());
        let first = Arc::new(First::default());
        let second = Arc::new(Second::default());

        let composite_object: Arc<dyn Reflectable> = composite.clone();
        let first_object: Arc<dyn Reflectable> = first.clone();

        let second_object: Arc<dyn Reflectable> = second.clone();

        aggregate(&composite_object, [first_object.clone(), second_object]);

        {
            let by_part = Ptr::from_arc(first.clone());

            assert_eq!(composite.object().counter(), 1);
            assert_eq!(first.object().counter(), 0);
            assert_eq!(reference_counter(&first_object), 1);

            let by_root = Ptr::from_arc(composite.clone());

            assert_eq!(reference_counter(&first_object), 2);
            assert!(by_part.cast::<Second>().is_some());

            drop(by_root);
        }

        assert!(composite.object().is_disposed());
        assert!(first.object().is_disposed());
        assert!(second.object().is_disposed());

        assert_eq!(composite.disposals.load(Ordering::SeqCst), 1);
        assert_eq!(first.disposals.load(Ordering::SeqCst), 1);
        assert_eq!(second.disposals.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_force_dispose() {
        let composite = Arc::new(Composite::default());
        let first = Arc::new(First::default());
        let first_object: Arc<dyn Reflectable> = first.clone();

        aggregate(&(composite.clone() as Arc<dyn Reflectable>), [first_object.clone()]);

        let ptr = Ptr::from_arc(composite.clone());

        match force_dispose(&first_object) {
            Err(RuntimeError::NotDisposable { counter, .. }) => assert_eq!(counter, 1),
            other => panic!("unexpected result: {other:?}"),
        }

        assert!(!first.object().is_disposed());

        drop(ptr);

        assert!(force_dispose(&first_object).is_ok());
        assert_eq!(composite.disposals.load(Ordering::SeqCst), 1);
        assert_eq!(first.disposals.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_force_dispose_raw() {
        let composite = Arc::new(Composite::default());
        let first = Arc::new(First::default());

        let first_object: Arc<dyn Reflectable> = first.clone();

        aggregate(&(composite.clone() as Arc<dyn Reflectable>), [first_object.clone()]);

        assert!(force_dispose(&first_object).is_ok());
        assert!(force_dispose(&first_object).is_ok());

        assert_eq!(composite.disposals.load(Ordering::SeqCst), 1);
        assert_eq!(first.disposals.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[should_panic]
    fn test_ambiguous_cast() {
        let composite: Arc<dyn Reflectable> = Arc::new(Composite::default());

        aggregate(
            &composite,
            [
                Arc::new(First::default()) as Arc<dyn Reflectable>,
                Arc::new(First::default()) as Arc<dyn Reflectable>,
            ],
        );

        let _ = safe_aggregation_cast::<First>(&composite);
    }
}
