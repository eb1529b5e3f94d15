//! Composite cascade deletion leaves no dangling links.

use meld_registry::{EndDef, Registry, RegistryBuilder};
use meld_resolver::register_kernel;
use meld_tests::prelude::*;
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Kernel plus `Part` trees: composite `children` and plain `refs`.
fn parts_registry() -> Registry {
    let mut builder = RegistryBuilder::new();
    register_kernel(&mut builder).unwrap();
    builder.add_class("Part").extends("Element").done().unwrap();
    builder
        .add_association("PartChildren")
        .source(EndDef::new("parent", "Part").optional())
        .target(EndDef::new("children", "Part").ordered().composite())
        .done()
        .unwrap();
    builder
        .add_association("PartRefs")
        .source(EndDef::new("referrers", "Part"))
        .target(EndDef::new("refs", "Part"))
        .done()
        .unwrap();
    builder.build().unwrap()
}

fn assert_no_dangling_links(model: &Model) {
    let graph = model.graph();
    for link_id in graph.all_link_ids() {
        let link = graph.get_link(link_id).unwrap();
        assert!(graph.contains_instance(link.source), "{link_id} source dangles");
        assert!(graph.contains_instance(link.target), "{link_id} target dangles");
    }
}

// ========== TEST: random_trees_cascade_cleanly ==========
#[test]
fn test_random_trees_cascade_cleanly() {
    init_tracing();
    let mut rng = StdRng::seed_from_u64(42);

    for round in 0..10 {
        // GIVEN a random tree with random cross references
        let mut model = Model::with_registry(parts_registry());
        let root = named(&mut model, "Part", "root").unwrap();
        let mut tree = vec![root];
        for i in 0..rng.gen_range(1..25) {
            let parent = tree[rng.gen_range(0..tree.len())];
            let child = named(&mut model, "Part", &format!("p{round}_{i}")).unwrap();
            model.create_link("PartChildren", parent, child).unwrap();
            tree.push(child);
        }
        let outsider = named(&mut model, "Part", "outsider").unwrap();
        for _ in 0..rng.gen_range(0..10) {
            let from = tree[rng.gen_range(0..tree.len())];
            let to = tree[rng.gen_range(0..tree.len())];
            if model.linked_targets("PartRefs", from).unwrap().contains(&to) {
                continue;
            }
            model.create_link("PartRefs", from, to).unwrap();
        }
        model
            .create_link("PartRefs", outsider, tree[tree.len() - 1])
            .unwrap();

        // WHEN
        let victim = tree[rng.gen_range(0..tree.len())];
        let deleted = model.delete_instance(victim).unwrap();

        // THEN the victim and its subtree are gone, nothing points at them
        assert_eq!(deleted.instances.last(), Some(&victim));
        for id in &deleted.instances {
            assert!(!model.graph().contains_instance(*id));
        }
        assert!(model.graph().contains_instance(outsider));
        assert_no_dangling_links(&model);
        assert_eq!(
            model.graph().instance_count(),
            tree.len() + 1 - deleted.instances.len()
        );
    }
}

// ========== TEST: deleting_namespace_removes_memberships_not_members ==========
#[test]
fn test_deleting_namespace_removes_memberships_not_members() {
    let mut model = model_with(&[vehicle_library()]).unwrap();
    let vehicle = model.library().resolve("Vehicles::Vehicle").unwrap();
    let car = model.library().resolve("Vehicles::Car").unwrap();
    let wheels = model.library().resolve("Vehicles::Vehicle::wheels").unwrap();

    model.delete_instance(vehicle).unwrap();

    // Car's specialization of Vehicle survives with its general link removed.
    assert_no_dangling_links(&model);
    assert!(model.graph().contains_instance(wheels));
    assert_eq!(
        model.get_property(wheels, "owningNamespace").unwrap(),
        Value::Null
    );
    let supertypes = meld_resolver::supertypes(&mut model.context(), car, false).unwrap();
    assert_eq!(supertypes, vec![]);
}
