//! Scenario definition and runner.
//!
//! A scenario loads library units into a fresh kernel model, then runs
//! named steps in order. Each step is an action on the [`World`] plus an
//! assertion on what the action did, measured from the journal entries it
//! appended.

use std::collections::HashMap;

use meld_core::{InstanceId, Value};
use meld_journal::JournalRecord;
use meld_session::{LibraryUnit, Model};

use crate::assertion::{Assertion, AssertionBuilder, StepOutcome};
use crate::error::{StepError, TestError, TestResult};

/// The model under test plus handles named by earlier steps.
pub struct World {
    pub model: Model,
    handles: HashMap<String, InstanceId>,
}

impl World {
    fn new(model: Model) -> Self {
        Self {
            model,
            handles: HashMap::new(),
        }
    }

    /// A handle named by an earlier step, or a library element by
    /// qualified name.
    pub fn get(&self, name: &str) -> Result<InstanceId, StepError> {
        self.handles
            .get(name)
            .copied()
            .or_else(|| self.model.library().resolve(name))
            .ok_or_else(|| StepError::new(format!("no handle named {name}")))
    }

    /// Create a named element and remember its handle under that name.
    pub fn spawn(&mut self, class_name: &str, name: &str) -> Result<InstanceId, StepError> {
        let id = self.model.create_instance(class_name)?;
        self.model.set_property(id, "name", Value::from(name))?;
        self.handles.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn remember(&mut self, name: impl Into<String>, id: InstanceId) {
        self.handles.insert(name.into(), id);
    }
}

type Action = Box<dyn Fn(&mut World) -> Result<Value, StepError>>;

struct Step {
    name: String,
    action: Action,
    assertion: Assertion,
}

/// A named sequence of steps over one model.
pub struct Scenario {
    name: String,
    libraries: Vec<LibraryUnit>,
    bind_libraries: bool,
    steps: Vec<Step>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            libraries: Vec::new(),
            bind_libraries: false,
            steps: Vec::new(),
        }
    }

    /// Load a library unit before the first step.
    pub fn library(mut self, unit: LibraryUnit) -> Self {
        self.libraries.push(unit);
        self
    }

    /// Bind every loaded library type before the first step.
    pub fn bound(mut self) -> Self {
        self.bind_libraries = true;
        self
    }

    pub fn step(
        mut self,
        name: impl Into<String>,
        action: impl Fn(&mut World) -> Result<Value, StepError> + 'static,
        assert: impl FnOnce(AssertionBuilder) -> AssertionBuilder,
    ) -> Self {
        self.steps.push(Step {
            name: name.into(),
            action: Box::new(action),
            assertion: assert(AssertionBuilder::new()).build(),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run every step; the world is handed back for follow-up checks.
    pub fn run(&self) -> TestResult<World> {
        let mut model = Model::new().map_err(|e| TestError::setup(e.to_string()))?;
        for unit in &self.libraries {
            model
                .load_library(unit)
                .map_err(|e| TestError::setup(format!("{}: {e}", unit.name)))?;
        }
        if self.bind_libraries {
            model
                .bind_all()
                .map_err(|e| TestError::setup(e.to_string()))?;
        }

        let mut world = World::new(model);
        for step in &self.steps {
            let result = run_step(&mut world, step);
            step.assertion.verify(&step.name, &result)?;
        }
        Ok(world)
    }
}

fn run_step(world: &mut World, step: &Step) -> Result<StepOutcome, String> {
    let journal_before = world.model.journal().len();
    let instances_before = world.model.graph().instance_count();

    let value = (step.action)(world).map_err(|StepError(msg)| msg)?;

    let mut outcome = StepOutcome {
        value,
        ..Default::default()
    };
    let appended = world.model.journal().entries().get(journal_before..).unwrap_or(&[]);
    for entry in appended {
        match entry.record {
            JournalRecord::CreateInstance { .. } => outcome.created += 1,
            JournalRecord::SetAttribute { .. } => outcome.modified += 1,
            JournalRecord::CreateLink { .. } => outcome.linked += 1,
            JournalRecord::RemoveLink { .. } => outcome.unlinked += 1,
            JournalRecord::DeleteInstance { .. } => {}
        }
    }
    let instances_after = world.model.graph().instance_count();
    outcome.deleted = (instances_before + outcome.created).saturating_sub(instances_after);
    Ok(outcome)
}
