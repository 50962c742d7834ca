//! # Lifecycle Scoping
//!
//! Step 2 of the questionnaire: an ordered list of at most seven lifecycle
//! stages, each flagged as changed (scoped-in) or not. Only changed stages
//! are scored.

use crate::primitives::MAX_LIFECYCLE_STAGES;
use crate::types::{EssaError, StageName};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One lifecycle stage and its scoping flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleStage {
    pub name: StageName,
    /// Expected to change due to the new material.
    pub changed: bool,
}

impl LifecycleStage {
    /// A stage that is not (yet) in scope.
    #[must_use]
    pub fn new(name: StageName) -> Self {
        Self {
            name,
            changed: false,
        }
    }
}

/// Ordered lifecycle stages of a project.
///
/// Invariants: at most [`MAX_LIFECYCLE_STAGES`] stages, names unique.
/// Checked on deserialization too.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<LifecycleStage>", into = "Vec<LifecycleStage>")]
pub struct Scoping {
    stages: Vec<LifecycleStage>,
}

impl Scoping {
    /// Build a scoping from stages, checking the invariants.
    pub fn from_stages(stages: Vec<LifecycleStage>) -> Result<Self, EssaError> {
        if stages.len() > MAX_LIFECYCLE_STAGES {
            return Err(EssaError::TooManyStages {
                max: MAX_LIFECYCLE_STAGES,
            });
        }
        let mut seen = BTreeSet::new();
        for stage in &stages {
            if !seen.insert(&stage.name) {
                return Err(EssaError::DuplicateStage(stage.name.to_string()));
            }
        }
        Ok(Self { stages })
    }

    /// Build an unscoped lifecycle from stage names.
    pub fn from_names(names: &[StageName]) -> Result<Self, EssaError> {
        Self::from_stages(names.iter().cloned().map(LifecycleStage::new).collect())
    }

    /// All stages in order.
    #[must_use]
    pub fn stages(&self) -> &[LifecycleStage] {
        &self.stages
    }

    /// Stages marked as changed, in order.
    pub fn active(&self) -> impl Iterator<Item = &StageName> {
        self.stages.iter().filter(|s| s.changed).map(|s| &s.name)
    }

    /// Whether any stage is marked as changed.
    #[must_use]
    pub fn has_active(&self) -> bool {
        self.stages.iter().any(|s| s.changed)
    }

    /// Whether the named stage exists and is marked as changed.
    #[must_use]
    pub fn is_active(&self, name: &StageName) -> bool {
        self.stages.iter().any(|s| s.changed && &s.name == name)
    }

    /// Whether the named stage exists.
    #[must_use]
    pub fn contains(&self, name: &StageName) -> bool {
        self.position(name).is_some()
    }

    fn position(&self, name: &StageName) -> Option<usize> {
        self.stages.iter().position(|s| &s.name == name)
    }

    fn require(&self, name: &StageName) -> Result<usize, EssaError> {
        self.position(name)
            .ok_or_else(|| EssaError::UnknownStage(name.to_string()))
    }

    /// Mark a stage as in or out of scope.
    pub fn set_changed(&mut self, name: &StageName, changed: bool) -> Result<(), EssaError> {
        let index = self.require(name)?;
        self.stages[index].changed = changed;
        Ok(())
    }

    /// Append a new, unscoped stage.
    pub fn add(&mut self, name: StageName) -> Result<(), EssaError> {
        if self.stages.len() >= MAX_LIFECYCLE_STAGES {
            return Err(EssaError::TooManyStages {
                max: MAX_LIFECYCLE_STAGES,
            });
        }
        if self.contains(&name) {
            return Err(EssaError::DuplicateStage(name.to_string()));
        }
        self.stages.push(LifecycleStage::new(name));
        Ok(())
    }

    /// Rename a stage in place, keeping its position and flag.
    pub fn rename(&mut self, from: &StageName, to: StageName) -> Result<(), EssaError> {
        let index = self.require(from)?;
        if from != &to && self.contains(&to) {
            return Err(EssaError::DuplicateStage(to.to_string()));
        }
        self.stages[index].name = to;
        Ok(())
    }

    /// Remove a stage.
    pub fn remove(&mut self, name: &StageName) -> Result<LifecycleStage, EssaError> {
        let index = self.require(name)?;
        Ok(self.stages.remove(index))
    }

    /// Swap a stage with the one before it. No-op for the first stage.
    pub fn move_up(&mut self, name: &StageName) -> Result<(), EssaError> {
        let index = self.require(name)?;
        if index > 0 {
            self.stages.swap(index - 1, index);
        }
        Ok(())
    }
}

impl TryFrom<Vec<LifecycleStage>> for Scoping {
    type Error = EssaError;

    fn try_from(stages: Vec<LifecycleStage>) -> Result<Self, Self::Error> {
        Self::from_stages(stages)
    }
}

impl From<Scoping> for Vec<LifecycleStage> {
    fn from(scoping: Scoping) -> Self {
        scoping.stages
    }
}

// =============================================================================
// TESTS
// =============================================================================
