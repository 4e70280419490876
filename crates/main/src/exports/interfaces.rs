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

use crate::runtime::{
    Reflectable,
    TypeCategory,
    TypeDescriptorBuilder,
    TypeKind,
    TypeRegistrar,
};

// Each interface is registered after its base interfaces.
const INTERFACES: [(TypeCategory, TypeCategory); 8] = [
    (TypeCategory::Function, TypeCategory::NonGeneric),
    (TypeCategory::Enumerable, TypeCategory::NonGeneric),
    (TypeCategory::ReadonlyList, TypeCategory::Enumerable),
    (TypeCategory::Array, TypeCategory::ReadonlyList),
    (TypeCategory::List, TypeCategory::ReadonlyList),
    (TypeCategory::ObservableList, TypeCategory::List),
    (TypeCategory::ReadonlyDictionary, TypeCategory::Enumerable),
    (TypeCategory::Dictionary, TypeCategory::ReadonlyDictionary),
];

pub(super) fn register_interfaces(registrar: &mut TypeRegistrar) {
    let _ = registrar.add(
        TypeDescriptorBuilder::new(TypeCategory::NonGeneric.interface_name(), TypeKind::Interface)
            .native::<dyn Reflectable>(),
    );

    for (category, base) in INTERFACES {
        let mut builder = TypeDescriptorBuilder::new(category.interface_name(), TypeKind::Interface)
            .category(category);

        if let Some(base) = registrar.find(base.interface_name()) {
            builder = builder.base(&base);
        }

        let _ = registrar.add(builder);
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        collections::{List, ObservableList},
        runtime::{TypeCategory, TypeKind, TypeManager, Value},
    };

    #[test]
    fn test_interface_hierarchy() {
        let observable = TypeManager::global().type_by_name("ObservableList").unwrap();

        assert_eq!(observable.kind(), TypeKind::Interface);
        assert_eq!(observable.category(), TypeCategory::ObservableList);

        for base in ["List", "ReadonlyList", "Enumerable", "Object"] {
            assert!(observable.can_convert_to(base), "not a {base}");
        }

        assert!(!observable.can_convert_to("Array"));

        let list = List::from_vec(vec![1u8]);
        let boxed = Value::give(list.clone()).unwrap();

        assert_eq!(boxed.type_descriptor().unwrap().name(), "List");

        let items = ObservableList::<u8>::default();
        let boxed = Value::give(items.clone()).unwrap();

        assert_eq!(boxed.type_name(), "ObservableList");
    }
}
