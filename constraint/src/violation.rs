//! Violations reported by the checker.

use std::fmt;

use meld_core::InstanceId;
use meld_mutation::LowerBoundViolation;

/// How bad a violation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationSeverity {
    /// A verification constraint or lower bound failed.
    Error,
    /// An implied relationship is missing, e.g. before binding has run.
    Warning,
}

/// What failed.
#[derive(Debug, Clone, PartialEq)]
pub enum ViolationCause {
    /// A declared constraint evaluated to false, to a non-Boolean, or failed.
    Constraint { name: String, detail: String },
    /// An association end holds fewer values than its lower bound.
    LowerBound {
        property: String,
        lower: u32,
        count: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub instance: InstanceId,
    pub severity: ViolationSeverity,
    pub cause: ViolationCause,
}

impl Violation {
    pub fn constraint(
        instance: InstanceId,
        severity: ViolationSeverity,
        name: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            instance,
            severity,
            cause: ViolationCause::Constraint {
                name: name.into(),
                detail: detail.into(),
            },
        }
    }

    pub fn lower_bound(unmet: LowerBoundViolation) -> Self {
        Self {
            instance: unmet.instance,
            severity: ViolationSeverity::Error,
            cause: ViolationCause::LowerBound {
                property: unmet.property,
                lower: unmet.lower,
                count: unmet.count,
            },
        }
    }

    /// Constraint name; lower bounds report as `multiplicity:<end>`.
    pub fn name(&self) -> String {
        match &self.cause {
            ViolationCause::Constraint { name, .. } => name.clone(),
            ViolationCause::LowerBound { property, .. } => format!("multiplicity:{property}"),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == ViolationSeverity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity == ViolationSeverity::Warning
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            ViolationSeverity::Error => "error",
            ViolationSeverity::Warning => "warning",
        };
        match &self.cause {
            ViolationCause::Constraint { name, detail } => {
                write!(f, "{level} on {}: {name}: {detail}", self.instance)
            }
            ViolationCause::LowerBound {
                property,
                lower,
                count,
            } => write!(
                f,
                "{level} on {}: {property} requires at least {lower} value(s), found {count}",
                self.instance
            ),
        }
    }
}

/// Violations in check order.
#[derive(Debug, Clone, Default)]
pub struct Violations {
    items: Vec<Violation>,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, violation: Violation) {
        self.items.push(violation);
    }

    pub fn merge(&mut self, other: Violations) {
        self.items.extend(other.items);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Violation::is_error)
    }

    pub fn all(&self) -> &[Violation] {
        &self.items
    }

    pub fn errors(&self) -> impl Iterator<Item = &Violation> {
        self.items.iter().filter(|v| v.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Violation> {
        self.items.iter().filter(|v| v.is_warning())
    }

    /// Violations reported against one instance.
    pub fn for_instance(&self, instance: InstanceId) -> impl Iterator<Item = &Violation> {
        self.items.iter().filter(move |v| v.instance == instance)
    }

    pub fn constraint_names(&self) -> Vec<String> {
        self.items.iter().map(Violation::name).collect()
    }
}

impl IntoIterator for Violations {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Violations {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
