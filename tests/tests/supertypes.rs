//! Supertype closure: reflexivity, termination, transitivity, diamonds.

use meld_resolver::{all_supertypes, specializes, supertypes};
use meld_tests::prelude::*;
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn conjugate(model: &mut Model, ty: InstanceId, original: InstanceId) {
    let conjugation = model.create_instance("Conjugation").unwrap();
    model
        .create_link("TypeOwnedConjugator", ty, conjugation)
        .unwrap();
    model
        .create_link("ConjugationOriginalType", conjugation, original)
        .unwrap();
}

// ========== TEST: conjugation_cycle_is_reflexive_and_finite ==========
#[test]
fn test_conjugation_cycle_is_reflexive_and_finite() {
    // GIVEN A ~ B and B ~ A
    let mut model = Model::new().unwrap();
    let a = named(&mut model, "Classifier", "A").unwrap();
    let b = named(&mut model, "Classifier", "B").unwrap();
    conjugate(&mut model, a, b);
    conjugate(&mut model, b, a);

    // WHEN
    let mut ctx = model.context();
    let of_a = all_supertypes(&mut ctx, a).unwrap();
    let of_b = all_supertypes(&mut ctx, b).unwrap();

    // THEN each type is its own first supertype and the cycle is cut
    assert_eq!(of_a, vec![a, b]);
    assert_eq!(of_b, vec![b, a]);
    assert!(specializes(&mut ctx, a, a).unwrap());
}

// ========== TEST: specialization_cycle_terminates ==========
#[test]
fn test_specialization_cycle_terminates() {
    let mut model = Model::new().unwrap();
    let a = named(&mut model, "Class", "A").unwrap();
    let b = named(&mut model, "Class", "B").unwrap();
    let c = named(&mut model, "Class", "C").unwrap();
    model.specialize("Specialization", a, b).unwrap();
    model.specialize("Specialization", b, c).unwrap();
    model.specialize("Specialization", c, a).unwrap();

    let of_b = all_supertypes(&mut model.context(), b).unwrap();

    assert_eq!(of_b, vec![b, c, a]);
}

// ========== TEST: diamond_lists_shared_ancestor_once ==========
#[test]
fn test_diamond_lists_shared_ancestor_once() {
    // GIVEN D :> B, D :> C, B :> A, C :> A
    let mut model = Model::new().unwrap();
    let a = named(&mut model, "Class", "A").unwrap();
    let b = named(&mut model, "Class", "B").unwrap();
    let c = named(&mut model, "Class", "C").unwrap();
    let d = named(&mut model, "Class", "D").unwrap();
    model.specialize("Specialization", b, a).unwrap();
    model.specialize("Specialization", c, a).unwrap();
    model.specialize("Specialization", d, b).unwrap();
    model.specialize("Specialization", d, c).unwrap();

    // WHEN
    let mut ctx = model.context();
    let closure = all_supertypes(&mut ctx, d).unwrap();

    // THEN
    assert_eq!(closure, vec![d, b, c, a]);
    assert_eq!(supertypes(&mut ctx, d, false).unwrap(), vec![b, c]);
}

// ========== TEST: random_hierarchies_are_transitive ==========
#[test]
fn test_random_hierarchies_are_transitive() {
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for round in 0..8 {
        // GIVEN a random hierarchy, cycles allowed
        let mut model = Model::new().unwrap();
        let count = rng.gen_range(3..9);
        let types: Vec<InstanceId> = (0..count)
            .map(|i| named(&mut model, "Class", &format!("T{round}_{i}")).unwrap())
            .collect();
        for &specific in &types {
            for &general in &types {
                if specific != general && rng.gen_bool(0.25) {
                    model
                        .specialize("Specialization", specific, general)
                        .unwrap();
                }
            }
        }

        // WHEN
        let mut ctx = model.context();
        let closures: Vec<Vec<InstanceId>> = types
            .iter()
            .map(|&ty| all_supertypes(&mut ctx, ty).unwrap())
            .collect();

        // THEN every closure starts with its type, has no duplicates and
        // contains the closures of its members
        for (index, closure) in closures.iter().enumerate() {
            assert_eq!(closure.first(), Some(&types[index]));
            let mut unique = closure.clone();
            unique.sort();
            unique.dedup();
            assert_eq!(unique.len(), closure.len());
            for member in closure {
                let position = types.iter().position(|t| t == member).unwrap();
                for inherited in &closures[position] {
                    assert!(
                        closure.contains(inherited),
                        "{inherited} missing from closure of {}",
                        types[index]
                    );
                }
            }
        }
    }
}
