//! Round trip: a journaled model replayed into an empty one.

use meld_journal::{Journal, ReplayStats};
use meld_resolver::all_supertypes;
use meld_tests::prelude::*;
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Build a random package of classes and features, with random
/// specializations, deletions and a binding pass.
fn random_model(rng: &mut StdRng) -> Model {
    let mut model = model_with(&[base_library()]).unwrap();
    let package = named(&mut model, "Namespace", "pkg").unwrap();

    let mut classes = Vec::new();
    for i in 0..rng.gen_range(3..8) {
        let class = named(&mut model, "Class", &format!("C{i}")).unwrap();
        model.add_member(package, class, Visibility::Public).unwrap();
        for j in 0..rng.gen_range(0..3) {
            let feature = named(&mut model, "Feature", &format!("f{j}")).unwrap();
            model
                .set_property(feature, "isComposite", Value::Bool(rng.gen_bool(0.5)))
                .unwrap();
            model.add_member(class, feature, Visibility::Public).unwrap();
        }
        classes.push(class);
    }
    // Only specialize towards earlier classes, keeping the hierarchy acyclic.
    for (index, &specific) in classes.iter().enumerate().skip(1) {
        if rng.gen_bool(0.6) {
            let general = classes[rng.gen_range(0..index)];
            model.specialize("Specialization", specific, general).unwrap();
        }
    }
    model.bind_all().unwrap();

    let doomed = *classes.choose(rng).unwrap();
    model.delete_instance(doomed).unwrap();
    model.bind_all().unwrap();
    model
}

/// Derived properties compared after replay, by the class declaring them.
const DERIVED: [(&str, &str); 7] = [
    ("Element", "owningNamespace"),
    ("Namespace", "ownedMember"),
    ("Namespace", "membership"),
    ("Namespace", "member"),
    ("Type", "inheritedMembership"),
    ("Type", "ownedFeature"),
    ("Type", "feature"),
];

/// Rewrite recorded handles inside a value to their replayed copies.
fn remap(value: Value, stats: &ReplayStats) -> Value {
    match value {
        Value::Instance(id) => Value::Instance(stats.instance(id).unwrap()),
        Value::Collection(collection) => {
            let kind = collection.kind();
            let items = collection
                .into_items()
                .into_iter()
                .map(|item| remap(item, stats));
            Value::collection(kind, items)
        }
        other => other,
    }
}

// ========== TEST: replay_reproduces_random_models ==========
#[test]
fn test_replay_reproduces_random_models() {
    init_tracing();
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..5 {
        // GIVEN a model and its journal, through JSON
        let mut original = random_model(&mut rng);
        let journal = Journal::from_json(&original.take_journal().to_json().unwrap()).unwrap();

        // WHEN
        let mut replayed = Model::new().unwrap();
        let stats = replayed.replay(&journal).unwrap();

        // THEN the same instances, slots and links exist up to renaming
        assert_eq!(stats.applied, journal.len());
        assert_eq!(
            replayed.graph().instance_count(),
            original.graph().instance_count()
        );
        assert_eq!(replayed.graph().link_count(), original.graph().link_count());
        for id in original.graph().all_instance_ids() {
            let copy = stats.instance(id).unwrap();
            let before = original.graph().get_instance(id).unwrap();
            let after = replayed.graph().get_instance(copy).unwrap();
            assert_eq!(before.class_id, after.class_id);
            assert_eq!(
                original.get_property(id, "name").ok(),
                replayed.get_property(copy, "name").ok()
            );
        }
        for id in original.graph().all_instance_ids() {
            let class_id = original.graph().class_of(id).unwrap();
            let copy = stats.instance(id).unwrap();
            for (declaring, property) in DERIVED {
                if !original.registry().is_subclass_by_name(class_id, declaring) {
                    continue;
                }
                let expected = original
                    .get_property(id, property)
                    .unwrap_or_else(|err| panic!("{property} of {id}: {err}"));
                assert_eq!(
                    replayed.get_property(copy, property).unwrap(),
                    remap(expected, &stats),
                    "{property} of {id}"
                );
            }
            if !original.registry().is_subclass_by_name(class_id, "Type") {
                continue;
            }
            let expected: Vec<InstanceId> = all_supertypes(&mut original.context(), id)
                .unwrap()
                .into_iter()
                .map(|t| stats.instance(t).unwrap())
                .collect();
            assert_eq!(all_supertypes(&mut replayed.context(), copy).unwrap(), expected);
        }
    }
}

// ========== TEST: binding_edges_survive_replay ==========
#[test]
fn test_binding_edges_survive_replay() {
    // GIVEN Vehicle bound to Object, then Car :> Vehicle re-bound
    let mut original = model_with(&[base_library()]).unwrap();
    let vehicle = named(&mut original, "Class", "Vehicle").unwrap();
    let car = named(&mut original, "Class", "Car").unwrap();
    original.bind(car).unwrap();
    original.specialize("Specialization", car, vehicle).unwrap();
    let report = original.bind(car).unwrap();
    assert_eq!(report.removed.len(), 1);

    // WHEN
    let mut replayed = Model::new().unwrap();
    let stats = replayed.replay(original.journal()).unwrap();

    // THEN
    let object = original.library().resolve(BASE_OBJECT).unwrap();
    let car_copy = stats.instance(car).unwrap();
    assert_eq!(
        all_supertypes(&mut replayed.context(), car_copy).unwrap(),
        vec![
            car_copy,
            stats.instance(vehicle).unwrap(),
            stats.instance(object).unwrap(),
            stats
                .instance(original.library().resolve(BASE_ANYTHING).unwrap())
                .unwrap(),
        ]
    );
}
