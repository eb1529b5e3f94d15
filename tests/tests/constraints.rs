//! Kernel constraints, expression evaluation and engine limits.

use meld_ast::build::*;
use meld_eval::{EngineConfig, EvalError};
use meld_tests::prelude::*;
use pretty_assertions::assert_eq;

// ========== TEST: duplicate_member_names_violate_distinguishability ==========
#[test]
fn test_duplicate_member_names_violate_distinguishability() {
    // GIVEN a package owning two elements named x and one unnamed
    let mut model = Model::new().unwrap();
    let package = named(&mut model, "Namespace", "pkg").unwrap();
    for _ in 0..2 {
        let x = named(&mut model, "Namespace", "x").unwrap();
        model.add_member(package, x, Visibility::Public).unwrap();
    }
    let anonymous = model.create_instance("Namespace").unwrap();
    model
        .add_member(package, anonymous, Visibility::Private)
        .unwrap();

    // WHEN
    let violations = model.check_instance(package).unwrap();

    // THEN
    assert_eq!(
        violations.constraint_names(),
        vec!["validateNamespaceDistinguishability"]
    );
    assert!(violations.has_errors());
}

// ========== TEST: unbound_classifier_warns_until_bound ==========
#[test]
fn test_unbound_classifier_warns_until_bound() {
    let mut model = model_with(&[base_library()]).unwrap();
    let car = named(&mut model, "Class", "Car").unwrap();

    let before = model.check_instance(car).unwrap();
    model.bind(car).unwrap();
    let after = model.check_instance(car).unwrap();

    assert_eq!(before.constraint_names(), vec!["checkClassifierSpecialization"]);
    assert_eq!(before.warnings().count(), 1);
    assert!(!before.has_errors());
    assert!(after.is_empty());
}

// ========== TEST: dangling_membership_fails_lower_bound ==========
#[test]
fn test_dangling_membership_fails_lower_bound() {
    let mut model = Model::new().unwrap();
    let membership = model.create_instance("Membership").unwrap();

    let unmet = model.validate_lower_bounds(membership).unwrap();
    let violations = model.check_all().unwrap();

    assert_eq!(unmet.len(), 1);
    assert_eq!(unmet[0].property, "memberElement");
    assert!(violations
        .constraint_names()
        .iter()
        .any(|name| name == "multiplicity:memberElement"));
}

// ========== TEST: evaluate_against_the_model ==========
#[test]
fn test_evaluate_against_the_model() {
    let model = model_with(&[vehicle_library()]).unwrap();
    let vehicle = model.library().resolve("Vehicles::Vehicle").unwrap();

    let names = model
        .evaluate(
            &this().nav("ownedFeature").nav("name"),
            &Value::Instance(vehicle),
        )
        .unwrap();
    let car_is_vehicle = model
        .evaluate(
            &global("Vehicles::Car").call("specializes", vec![this()]),
            &Value::Instance(vehicle),
        )
        .unwrap();

    assert_eq!(names.into_items(), vec![Value::from("parts"), Value::from("wheels")]);
    assert_eq!(car_is_vehicle, Value::Bool(true));
}

// ========== TEST: deep_derivation_hits_depth_limit ==========
#[test]
fn test_deep_derivation_hits_depth_limit() {
    // GIVEN a subsetting chain f0 :> f1 :> ... :> f11, typed at the end
    let config: EngineConfig = serde_json::from_str(r#"{ "max_depth": 4 }"#).unwrap();
    let mut model = Model::new().unwrap().with_engine_config(config);
    let ty = named(&mut model, "Class", "T").unwrap();
    let features: Vec<InstanceId> = (0..12)
        .map(|i| named(&mut model, "Feature", &format!("f{i}")).unwrap())
        .collect();
    for pair in features.windows(2) {
        model.specialize("Subsetting", pair[0], pair[1]).unwrap();
    }
    model
        .specialize("FeatureTyping", features[11], ty)
        .unwrap();

    // WHEN
    let shallow = model.get_property(features[10], "type");
    let deep = model.get_property(features[0], "type");

    // THEN the limit is never recovered as null
    assert_eq!(shallow.unwrap().instances(), vec![ty]);
    assert!(matches!(
        deep,
        Err(SessionError::EvalError(EvalError::DepthExceeded { limit: 4 }))
    ));
}
