//! Library element ids are derived from qualified names only.

use meld_core::ElementId;
use meld_tests::prelude::*;
use pretty_assertions::assert_eq;

fn ids(model: &Model, names: &[&str]) -> Vec<ElementId> {
    names
        .iter()
        .map(|name| {
            let instance = model.library().resolve(name).unwrap();
            model.library().element_id(instance).unwrap()
        })
        .collect()
}

const NAMES: [&str; 6] = [
    "Base",
    BASE_ANYTHING,
    BASE_PARTS,
    "Vehicles",
    "Vehicles::Car",
    "Vehicles::Car::engineParts",
];

// ========== TEST: load_order_does_not_change_ids ==========
#[test]
fn test_load_order_does_not_change_ids() {
    // GIVEN the same units loaded in different orders
    let first = model_with(&[base_library(), vehicle_library()]).unwrap();
    let second = model_with(&[vehicle_library(), base_library()]).unwrap();

    // WHEN
    let first_ids = ids(&first, &NAMES);
    let second_ids = ids(&second, &NAMES);

    // THEN
    assert_eq!(first_ids, second_ids);
    assert_eq!(first_ids[0], ElementId::for_unit("Base"));
    assert_eq!(
        first_ids[5],
        ElementId::nested(&ElementId::for_unit("Vehicles"), "Car::engineParts")
    );
}

// ========== TEST: ids_are_distinct_across_units ==========
#[test]
fn test_ids_are_distinct_across_units() {
    let model = model_with(&[base_library(), vehicle_library()]).unwrap();

    let mut all = ids(&model, &NAMES);
    all.sort();
    all.dedup();

    assert_eq!(all.len(), NAMES.len());
    // `parts` exists in both units under different containers.
    assert_ne!(
        ids(&model, &[BASE_PARTS]),
        ids(&model, &["Vehicles::Vehicle::parts"])
    );
}

// ========== TEST: units_load_from_json ==========
#[test]
fn test_units_load_from_json() {
    let json = serde_json::to_string(&vehicle_library()).unwrap();
    let unit: LibraryUnit = serde_json::from_str(&json).unwrap();

    let from_json = model_with(&[unit]).unwrap();
    let built = model_with(&[vehicle_library()]).unwrap();

    assert_eq!(
        ids(&from_json, &["Vehicles::Car::engineParts"]),
        ids(&built, &["Vehicles::Car::engineParts"])
    );
    let sparse: LibraryUnit =
        serde_json::from_str(r#"{"name": "Tiny", "members": [{"metaclass": "Class", "name": "T"}]}"#)
            .unwrap();
    assert_eq!(sparse.members[0].specializes, Vec::<String>::new());
}
