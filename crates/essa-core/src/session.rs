//! # Session Module
//!
//! A [`Session`] is one project together with its wizard position. It is
//! the unit a host keeps per user: the CLI stores one in a snapshot file,
//! the HTTP server keeps many in a [`Workspace`](crate::Workspace).
//!
//! There is no process-wide "current project"; callers pass sessions
//! explicitly.

use crate::project::Project;
use crate::reference::Catalog;
use crate::types::EssaError;
use crate::wizard::{Step, StepForm, StepStatus, Wizard};
use serde::{Deserialize, Serialize};

/// A project and where the user is in the questionnaire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    project: Project,
    wizard: Wizard,
}

impl Session {
    /// Start a new project on step 1.
    pub fn new(name: &str, catalog: &Catalog) -> Result<Self, EssaError> {
        Ok(Self::with_project(Project::new(name, catalog)?))
    }

    /// Wrap an existing project, starting on step 1.
    #[must_use]
    pub fn with_project(project: Project) -> Self {
        Self {
            project,
            wizard: Wizard::new(),
        }
    }

    #[must_use]
    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Direct access for edits no form covers (stage editing, clearing scores).
    pub fn project_mut(&mut self) -> &mut Project {
        &mut self.project
    }

    #[must_use]
    pub fn step(&self) -> Step {
        self.wizard.current()
    }

    pub fn advance(&mut self) -> Step {
        self.wizard.advance()
    }

    pub fn back(&mut self) -> Step {
        self.wizard.back()
    }

    #[must_use]
    pub fn status(&self) -> Vec<StepStatus> {
        self.wizard.status(&self.project)
    }

    /// Check a loaded session against the catalog it will be used with.
    pub fn validate(&self, catalog: &Catalog) -> Result<(), EssaError> {
        self.project.validate(catalog)
    }

    /// Apply a step form atomically.
    ///
    /// The form runs against a copy; the session only changes if every
    /// part of the form succeeds. Does not move the wizard.
    pub fn apply(&mut self, catalog: &Catalog, form: &StepForm) -> Result<(), EssaError> {
        let mut draft = self.project.clone();
        form.apply(&mut draft, catalog)?;
        self.project = draft;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FactorName, StageName};
    use crate::wizard::{ScoreForm, ScoreInput, ScopingForm, StageToggle};
    use crate::Score;

    fn stage(name: &str) -> StageName {
        StageName::new(name).expect("valid")
    }

    #[test]
    fn new_session_starts_on_trl() {
        let session = Session::new("Demo", &Catalog::standard()).expect("valid");
        assert_eq!(session.step(), Step::Trl);
        assert_eq!(session.project().name(), "Demo");
    }

    #[test]
    fn failed_form_leaves_session_untouched() {
        let catalog = Catalog::standard();
        let mut session = Session::new("Demo", &catalog).expect("valid");
        let before = session.clone();

        let form = StepForm::Scoping(ScopingForm {
            stages: vec![
                StageToggle {
                    name: stage("Use phase"),
                    changed: true,
                },
                StageToggle {
                    name: stage("Teleportation"),
                    changed: true,
                },
            ],
            ..ScopingForm::default()
        });

        assert_eq!(
            session.apply(&catalog, &form),
            Err(EssaError::UnknownStage("Teleportation".into()))
        );
        assert_eq!(session, before);
    }

    #[test]
    fn score_form_is_all_or_nothing() {
        let catalog = Catalog::standard();
        let mut session = Session::new("Demo", &catalog).expect("valid");
        session
            .project_mut()
            .set_scoping_stage(&stage("Use phase"), true)
            .expect("known");
        session.project_mut().select_default_factors(&catalog);

        let input = |factor: &str, score: u8| ScoreInput {
            stage: stage("Use phase"),
            factor: FactorName::new(factor).expect("valid"),
            score: Score::new(score).expect("valid"),
            note: String::new(),
        };
        let form = StepForm::Scores(ScoreForm {
            scores: vec![input("Climate change", 2), input("Acidification", 3)],
        });

        assert_eq!(
            session.apply(&catalog, &form),
            Err(EssaError::InactiveFactor("Acidification".into()))
        );
        assert!(session.project().entries().is_empty());
    }

    #[test]
    fn navigation_delegates_to_wizard() {
        let mut session = Session::new("Demo", &Catalog::standard()).expect("valid");
        assert_eq!(session.advance(), Step::Scoping);
        assert_eq!(session.back(), Step::Trl);
        assert_eq!(session.status().len(), 5);
    }

    #[test]
    fn tampered_selection_is_rejected_on_load() {
        let catalog = Catalog::standard();
        let mut session = Session::new("Demo", &catalog).expect("valid");
        session.project_mut().select_default_factors(&catalog);
        let json = serde_json::to_value(&session).expect("serialize");

        let mut four = json.clone();
        four["project"]["factors"]["Environmental"]
            .as_array_mut()
            .expect("list")
            .push(serde_json::json!("Not a catalog factor"));
        assert!(serde_json::from_value::<Session>(four).is_err());

        let mut foreign = json;
        foreign["project"]["factors"]["Social"][0] = serde_json::json!("Not a catalog factor");
        let loaded: Session = serde_json::from_value(foreign).expect("shape is fine");
        assert!(matches!(
            loaded.validate(&catalog),
            Err(EssaError::UnknownFactor { .. })
        ));
        assert_eq!(session.validate(&catalog), Ok(()));
    }
}
