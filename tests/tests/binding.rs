//! Semantic binding: implied edges, redundancy, idempotence.

use meld_resolver::{specializes, supertypes};
use meld_tests::prelude::*;
use pretty_assertions::assert_eq;

fn implied_generals(model: &Model, ty: InstanceId) -> Vec<InstanceId> {
    let mut ctx = model.context();
    let all = supertypes(&mut ctx, ty, false).unwrap();
    let explicit = supertypes(&mut ctx, ty, true).unwrap();
    all.into_iter().filter(|t| !explicit.contains(t)).collect()
}

mod vehicles {
    use super::*;
    use super::assert_eq;

    pub fn scenario() -> Scenario {
        Scenario::new("vehicles")
            .library(base_library())
            .bound()
            .step(
                "spawn_vehicle",
                |w| {
                    w.spawn("Class", "Vehicle")?;
                    Ok(Value::Null)
                },
                |a| a.created(1).modified(1),
            )
            .step(
                "spawn_car",
                |w| {
                    let car = w.spawn("Class", "Car")?;
                    let vehicle = w.get("Vehicle")?;
                    w.model.specialize("Specialization", car, vehicle)?;
                    Ok(Value::Null)
                },
                |a| a.created(2).linked(2),
            )
            .step(
                "bind_all",
                |w| Ok(Value::from(w.model.bind_all()?.created.len() as i64)),
                // One Specialization for Vehicle: created, flagged, linked twice.
                |a| a.value(1i64).created(1).modified(1).linked(2),
            )
            .step(
                "bind_all_again",
                |w| {
                    let report = w.model.bind_all()?;
                    Ok(Value::from(report.is_unchanged()))
                },
                |a| a.value(true).created(0).deleted(0),
            )
            .step(
                "car_specializes_object",
                |w| {
                    let car = w.get("Car")?;
                    let object = w.get(BASE_OBJECT)?;
                    let mut ctx = w.model.context();
                    Ok(Value::from(specializes(&mut ctx, car, object)?))
                },
                |a| a.value(true),
            )
    }

    // ========== TEST: car_gets_no_direct_implied_edge ==========
    #[test]
    fn test_car_gets_no_direct_implied_edge() {
        init_tracing();
        let world = scenario().run().unwrap();

        let object = world.get(BASE_OBJECT).unwrap();
        let vehicle = world.get("Vehicle").unwrap();
        let car = world.get("Car").unwrap();
        assert_eq!(implied_generals(&world.model, vehicle), vec![object]);
        assert_eq!(implied_generals(&world.model, car), vec![]);
    }
}

mod suppression {
    use super::*;
    use super::assert_eq;

    pub fn scenario() -> Scenario {
        Scenario::new("suppression")
            .library(base_library())
            .bound()
            .step(
                "bind_lonely_class",
                |w| {
                    let car = w.spawn("Class", "Car")?;
                    w.model.bind(car)?;
                    Ok(Value::Null)
                },
                |a| a.created(2),
            )
            .step(
                "specialize_later",
                |w| {
                    let vehicle = w.spawn("Class", "Vehicle")?;
                    let car = w.get("Car")?;
                    w.model.specialize("Specialization", car, vehicle)?;
                    w.model.bind(vehicle)?;
                    Ok(Value::Null)
                },
                |a| a.created(3),
            )
            .step(
                "rebind_car",
                |w| {
                    let car = w.get("Car")?;
                    let report = w.model.bind(car)?;
                    Ok(Value::from(report.removed.len() as i64))
                },
                // The direct edge to Object is now reachable through Vehicle.
                |a| a.value(1i64).deleted(1).created(0),
            )
    }

    // ========== TEST: redundant_edge_suppressed_on_rebind ==========
    #[test]
    fn test_redundant_edge_suppressed_on_rebind() {
        let world = scenario().run().unwrap();

        let car = world.get("Car").unwrap();
        let vehicle = world.get("Vehicle").unwrap();
        assert_eq!(implied_generals(&world.model, car), vec![]);
        assert_eq!(
            supertypes(&mut world.model.context(), car, false).unwrap(),
            vec![vehicle]
        );
    }
}

mod features {
    use super::*;
    use super::assert_eq;

    pub fn scenario() -> Scenario {
        Scenario::new("features")
            .library(base_library())
            .bound()
            .step(
                "spawn_features",
                |w| {
                    let vehicle = w.spawn("Class", "Vehicle")?;
                    for name in ["engine", "owner"] {
                        let feature = w.spawn("Feature", name)?;
                        w.model.add_member(vehicle, feature, Visibility::Public)?;
                    }
                    let engine = w.get("engine")?;
                    w.model.set_property(engine, "isComposite", Value::Bool(true))?;
                    Ok(Value::Null)
                },
                |a| a.created(5),
            )
            .step(
                "bind_all",
                |w| Ok(Value::from(w.model.bind_all()?.created.len() as i64)),
                // Vehicle :> Object, engine :> parts, owner :> things
                |a| a.value(3i64),
            )
            .step(
                "engine_type_generals",
                |w| {
                    let engine = w.get("engine")?;
                    Ok(w.model.get_property(engine, "ownedSubsetting")?)
                },
                |a| a.size(1),
            )
    }

    // ========== TEST: composite_feature_subsets_parts_only ==========
    #[test]
    fn test_composite_feature_subsets_parts_only() {
        let world = scenario().run().unwrap();

        let engine = world.get("engine").unwrap();
        let owner = world.get("owner").unwrap();
        let parts = world.get(BASE_PARTS).unwrap();
        let things = world.get(BASE_THINGS).unwrap();
        assert_eq!(implied_generals(&world.model, engine), vec![parts]);
        assert_eq!(implied_generals(&world.model, owner), vec![things]);
        assert!(specializes(&mut world.model.context(), engine, things).unwrap());
    }
}

mod errors {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("errors")
            .step(
                "spawn_abstract",
                |w| {
                    w.spawn("Element", "e")?;
                    Ok(Value::Null)
                },
                |a| a.error("abstract"),
            )
            .step(
                "spawn_unknown",
                |w| {
                    w.spawn("Vehicle", "v")?;
                    Ok(Value::Null)
                },
                |a| a.error("Unknown class"),
            )
            .step(
                "bind_without_library",
                |w| {
                    let car = w.spawn("Class", "Car")?;
                    let report = w.model.bind(car)?;
                    Ok(Value::from(report.unresolved.join(",")))
                },
                |a| a.value("Base::Object,Base::Anything").created(1),
            )
    }

    // ========== TEST: failures_surface_as_errors ==========
    #[test]
    fn test_failures_surface_as_errors() {
        scenario().run().unwrap();
    }
}
