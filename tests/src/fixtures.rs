//! Shared library units and model builders.

use meld_core::InstanceId;
use meld_resolver::kernel::{BASE_ANYTHING, BASE_THINGS};
use meld_session::{LibraryElement, LibraryUnit, Model, SessionResult};
use tracing_subscriber::filter::LevelFilter;

/// Route `tracing` output to the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(LevelFilter::DEBUG)
        .try_init();
}

/// The base concepts the kernel binding rules name: `Anything`,
/// `Object :> Anything`, `things`, and `parts :> things` (composite).
pub fn base_library() -> LibraryUnit {
    LibraryUnit::new("Base")
        .member(LibraryElement::new("Classifier", "Anything"))
        .member(LibraryElement::new("Class", "Object").specializes(BASE_ANYTHING))
        .member(LibraryElement::new("Feature", "things").typed_by(BASE_ANYTHING))
        .member(
            LibraryElement::new("Feature", "parts")
                .attr("isComposite", true)
                .specializes(BASE_THINGS),
        )
}

/// `Vehicle` owning `parts` and `wheels`, and `Car :> Vehicle` whose
/// `engineParts` redefines `Vehicle::parts`.
pub fn vehicle_library() -> LibraryUnit {
    LibraryUnit::new("Vehicles")
        .member(
            LibraryElement::new("Class", "Vehicle")
                .member(LibraryElement::new("Feature", "parts").attr("isComposite", true))
                .member(LibraryElement::new("Feature", "wheels")),
        )
        .member(
            LibraryElement::new("Class", "Car")
                .specializes("Vehicles::Vehicle")
                .member(
                    LibraryElement::new("Feature", "engineParts")
                        .attr("isComposite", true)
                        .redefines("Vehicles::Vehicle::parts"),
                ),
        )
}

/// A kernel model with the given units loaded.
pub fn model_with(units: &[LibraryUnit]) -> SessionResult<Model> {
    let mut model = Model::new()?;
    for unit in units {
        model.load_library(unit)?;
    }
    Ok(model)
}

/// Create a named element.
pub fn named(model: &mut Model, class_name: &str, name: &str) -> SessionResult<InstanceId> {
    let id = model.create_instance(class_name)?;
    model.set_property(id, "name", name.into())?;
    Ok(id)
}
