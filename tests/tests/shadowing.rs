//! Redefinition shadowing over a loaded library.

use meld_resolver::{all_redefined_features, inherited_memberships, visible_memberships};
use meld_tests::prelude::*;
use pretty_assertions::assert_eq;

fn membership_of(model: &Model, element: InstanceId) -> InstanceId {
    model.get_property(element, "referencingMembership").unwrap().instances()[0]
}

// ========== TEST: redefined_vehicle_parts_are_not_inherited_by_car ==========
#[test]
fn test_redefined_vehicle_parts_are_not_inherited_by_car() {
    // GIVEN
    init_tracing();
    let model = model_with(&[vehicle_library()]).unwrap();
    let car = model.library().resolve("Vehicles::Car").unwrap();
    let parts = model.library().resolve("Vehicles::Vehicle::parts").unwrap();
    let wheels = model.library().resolve("Vehicles::Vehicle::wheels").unwrap();
    let engine_parts = model.library().resolve("Vehicles::Car::engineParts").unwrap();

    // WHEN
    let mut ctx = model.context();
    let inherited = inherited_memberships(&mut ctx, car).unwrap();
    let visible = visible_memberships(&mut ctx, car, false, false).unwrap();

    // THEN
    assert_eq!(inherited, vec![membership_of(&model, wheels)]);
    assert_eq!(
        visible,
        vec![membership_of(&model, engine_parts), membership_of(&model, wheels)]
    );
    assert!(!visible.contains(&membership_of(&model, parts)));
    assert_eq!(
        all_redefined_features(&mut ctx, engine_parts).unwrap(),
        vec![engine_parts, parts]
    );
}

// ========== TEST: car_features_after_binding ==========
#[test]
fn test_car_features_after_binding() {
    // GIVEN the vehicle library over a bound base library
    let mut model = model_with(&[base_library(), vehicle_library()]).unwrap();
    model.bind_all().unwrap();
    let car = model.library().resolve("Vehicles::Car").unwrap();
    let wheels = model.library().resolve("Vehicles::Vehicle::wheels").unwrap();
    let engine_parts = model.library().resolve("Vehicles::Car::engineParts").unwrap();

    // WHEN
    let features = model.get_property(car, "feature").unwrap().instances();

    // THEN implied edges to Object do not bring in extra memberships
    assert_eq!(features, vec![engine_parts, wheels]);
}

// ========== TEST: named_arguments_reach_membership_natives ==========
#[test]
fn test_named_arguments_reach_membership_natives() {
    let model = model_with(&[vehicle_library()]).unwrap();
    let car = model.library().resolve("Vehicles::Car").unwrap();
    let vehicle = model.library().resolve("Vehicles::Vehicle").unwrap();

    let args = std::collections::HashMap::from([(
        "excludedTypes".to_string(),
        Value::set([Value::Instance(vehicle)]),
    )]);
    let inherited = model
        .invoke_operation(car, "inheritedMemberships", &args)
        .unwrap();

    assert_eq!(inherited.cardinality(), 0);
}
