//! # Wizard
//!
//! The five questionnaire steps and the typed input forms that drive them.
//!
//! | Step | Name | Form | Complete when |
//! |------|------|------|---------------|
//! | 1 | TRL | [`TrlForm`] | a TRL is selected |
//! | 2 | Scoping | [`ScopingForm`] | at least one stage is changed |
//! | 3 | Factors | [`FactorForm`] | three factors in every category |
//! | 4 | Scoring | [`ScoreForm`] | every active pair is scored |
//! | 5 | Results | none | same as step 4 |
//!
//! Navigation is strictly next/previous and never gated: an incomplete step
//! is reported through [`StepStatus`], and aggregates fail on their own.
//!
//! Forms reject unknown fields and malformed values (TRL out of range,
//! score out of range, empty names) while being deserialized, so a form
//! that exists is well-formed. Cross-checks against the project (is the
//! stage active, is the factor in the catalog) happen on apply.

use crate::project::Project;
use crate::reference::Catalog;
use crate::score::Score;
use crate::scoping::LifecycleStage;
use crate::types::{Category, EssaError, FactorName, StageName, TrlLevel};
use serde::{Deserialize, Serialize};

// =============================================================================
// STEPS
// =============================================================================

/// One page of the questionnaire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    #[default]
    Trl,
    Scoping,
    Factors,
    Scoring,
    Results,
}

impl Step {
    /// All steps in order.
    pub const ALL: [Step; 5] = [
        Step::Trl,
        Step::Scoping,
        Step::Factors,
        Step::Scoring,
        Step::Results,
    ];

    /// 1-based position.
    #[must_use]
    pub fn number(&self) -> u8 {
        match self {
            Step::Trl => 1,
            Step::Scoping => 2,
            Step::Factors => 3,
            Step::Scoring => 4,
            Step::Results => 5,
        }
    }

    /// Page title.
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Step::Trl => "Technology Readiness Level",
            Step::Scoping => "Lifecycle Scoping",
            Step::Factors => "Factor Selection",
            Step::Scoring => "Scoring",
            Step::Results => "Results",
        }
    }

    /// Get the next step, if any.
    #[must_use]
    pub fn next(&self) -> Option<Step> {
        match self {
            Step::Trl => Some(Step::Scoping),
            Step::Scoping => Some(Step::Factors),
            Step::Factors => Some(Step::Scoring),
            Step::Scoring => Some(Step::Results),
            Step::Results => None,
        }
    }

    /// Get the previous step, if any.
    #[must_use]
    pub fn previous(&self) -> Option<Step> {
        match self {
            Step::Trl => None,
            Step::Scoping => Some(Step::Trl),
            Step::Factors => Some(Step::Scoping),
            Step::Scoring => Some(Step::Factors),
            Step::Results => Some(Step::Scoring),
        }
    }

    /// Check if this step is terminal (Results).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Step::Results)
    }

    /// Whether the project satisfies this step.
    #[must_use]
    pub fn is_complete(&self, project: &Project) -> bool {
        match self {
            Step::Trl => project.trl().is_some(),
            Step::Scoping => project.scoping().has_active(),
            Step::Factors => project.factors().is_complete(),
            Step::Scoring | Step::Results => project.is_complete(),
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Step {}: {}", self.number(), self.title())
    }
}

/// Completion report for one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepStatus {
    pub step: Step,
    pub title: &'static str,
    pub complete: bool,
    pub current: bool,
}

/// Position in the questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Wizard {
    current: Step,
}

impl Wizard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn current(&self) -> Step {
        self.current
    }

    /// Move forward one step. Stays on Results.
    pub fn advance(&mut self) -> Step {
        if let Some(next) = self.current.next() {
            self.current = next;
        }
        self.current
    }

    /// Move back one step. Stays on TRL.
    pub fn back(&mut self) -> Step {
        if let Some(previous) = self.current.previous() {
            self.current = previous;
        }
        self.current
    }

    /// Completion of every step against a project.
    #[must_use]
    pub fn status(&self, project: &Project) -> Vec<StepStatus> {
        Step::ALL
            .into_iter()
            .map(|step| StepStatus {
                step,
                title: step.title(),
                complete: step.is_complete(project),
                current: step == self.current,
            })
            .collect()
    }
}

// =============================================================================
// FORMS
// =============================================================================

/// Step 1 input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrlForm {
    pub level: TrlLevel,
}

impl TrlForm {
    pub fn apply(&self, project: &mut Project, catalog: &Catalog) -> Result<(), EssaError> {
        project.set_trl(catalog, self.level.value()).map(|_| ())
    }
}

/// The changed flag of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageToggle {
    pub name: StageName,
    pub changed: bool,
}

/// Step 2 input.
///
/// `lifecycle`, when given, replaces the stage list first; stages that keep
/// their name keep their flag and scores. `stages` then sets flags.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScopingForm {
    #[serde(default)]
    pub lifecycle: Option<Vec<StageName>>,
    #[serde(default)]
    pub stages: Vec<StageToggle>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ScopingForm {
    pub fn apply(&self, project: &mut Project) -> Result<(), EssaError> {
        if let Some(names) = &self.lifecycle {
            let stages = names
                .iter()
                .map(|name| LifecycleStage {
                    name: name.clone(),
                    changed: project.scoping().is_active(name),
                })
                .collect();
            project.replace_stages(stages)?;
        }
        for toggle in &self.stages {
            project.set_scoping_stage(&toggle.name, toggle.changed)?;
        }
        if let Some(notes) = &self.notes {
            project.set_notes(notes.clone())?;
        }
        Ok(())
    }
}

/// Step 3 input for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FactorForm {
    pub category: Category,
    pub factors: Vec<FactorName>,
}

impl FactorForm {
    pub fn apply(&self, project: &mut Project, catalog: &Catalog) -> Result<(), EssaError> {
        project.select_factors(
            catalog,
            self.category,
            self.factors.iter().map(FactorName::as_str),
        )
    }
}

/// One scored pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoreInput {
    pub stage: StageName,
    pub factor: FactorName,
    pub score: Score,
    #[serde(default)]
    pub note: String,
}

/// Step 4 input: any number of pairs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoreForm {
    pub scores: Vec<ScoreInput>,
}

impl ScoreForm {
    pub fn apply(&self, project: &mut Project) -> Result<(), EssaError> {
        for input in &self.scores {
            project.set_score(&input.stage, &input.factor, input.score.value(), input.note.clone())?;
        }
        Ok(())
    }
}

/// Input for any step that takes one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum StepForm {
    Trl(TrlForm),
    Scoping(ScopingForm),
    Factors(FactorForm),
    Scores(ScoreForm),
}

impl StepForm {
    /// The step this form belongs to.
    #[must_use]
    pub fn step(&self) -> Step {
        match self {
            StepForm::Trl(_) => Step::Trl,
            StepForm::Scoping(_) => Step::Scoping,
            StepForm::Factors(_) => Step::Factors,
            StepForm::Scores(_) => Step::Scoring,
        }
    }

    /// Apply the form. Not atomic on its own; see [`Session::apply`](crate::Session::apply).
    pub fn apply(&self, project: &mut Project, catalog: &Catalog) -> Result<(), EssaError> {
        match self {
            StepForm::Trl(form) => form.apply(project, catalog),
            StepForm::Scoping(form) => form.apply(project),
            StepForm::Factors(form) => form.apply(project, catalog),
            StepForm::Scores(form) => form.apply(project),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
