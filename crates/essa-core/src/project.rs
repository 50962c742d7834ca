//! # Project
//!
//! One assessment instance: TRL, lifecycle scoping, factor selection and
//! the scoring grid, plus the derived aggregates.
//!
//! ## Atomicity
//!
//! Every mutation validates first and writes last. A call that returns an
//! error leaves the project exactly as it was.
//!
//! ## Dormant Entries
//!
//! A pair is *active* when its stage is marked as changed and its factor
//! is selected. Cells of inactive pairs stay in the grid but are ignored by
//! completeness, aggregation and export until the pair becomes active
//! again. Removing a stage drops its cells; renaming one carries them.
//!
//! ## Strict Aggregation
//!
//! Aggregates are only computed over a complete grid: at least one active
//! stage, three factors in every category, and a score for every active
//! pair. Anything less is an `IncompleteData` error.
//!
//! ## Loading
//!
//! Deserialization re-checks names, text lengths, the lifecycle bounds and
//! the shape of the factor selection. [`Project::validate`] adds the checks
//! that need the catalog; loaders call it before handing a project out.

use crate::factors::FactorSelection;
use crate::grid::{Cell, ScoreEntry, ScoreGrid};
use crate::primitives::MAX_NOTE_LENGTH;
use crate::reference::{Catalog, TrlInfo};
use crate::results::Results;
use crate::score::{Mean, Score};
use crate::scoping::{LifecycleStage, Scoping};
use crate::types::{Category, EssaError, FactorName, StageName, TrlLevel, validated_name};
use serde::{Deserialize, Deserializer, Serialize};

/// A non-blocking observation about the current scoping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopingWarning {
    /// No stage is marked as changed, so nothing can be scored.
    NoStageChanged,
}

impl ScopingWarning {
    /// Human-readable warning text.
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            ScopingWarning::NoStageChanged => {
                "At least one lifecycle stage should be marked as changed"
            }
        }
    }
}

/// A named sustainability assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    #[serde(deserialize_with = "checked_name")]
    name: String,
    #[serde(deserialize_with = "checked_text_field")]
    description: String,
    trl: Option<TrlLevel>,
    #[serde(deserialize_with = "checked_text_field")]
    notes: String,
    scoping: Scoping,
    factors: FactorSelection,
    grid: ScoreGrid,
}

impl Project {
    /// Create a project with the catalog's default lifecycle, nothing scoped.
    pub fn new(name: &str, catalog: &Catalog) -> Result<Self, EssaError> {
        Self::with_stages(name, &catalog.default_stages)
    }

    /// Create a project with a custom lifecycle.
    pub fn with_stages(name: &str, stages: &[StageName]) -> Result<Self, EssaError> {
        Ok(Self {
            name: validated_name(name)?,
            description: String::new(),
            trl: None,
            notes: String::new(),
            scoping: Scoping::from_names(stages)?,
            factors: FactorSelection::default(),
            grid: ScoreGrid::new(),
        })
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn trl(&self) -> Option<TrlLevel> {
        self.trl
    }

    /// Free-text scoping notes.
    #[must_use]
    pub fn notes(&self) -> &str {
        &self.notes
    }

    #[must_use]
    pub fn scoping(&self) -> &Scoping {
        &self.scoping
    }

    #[must_use]
    pub fn factors(&self) -> &FactorSelection {
        &self.factors
    }

    /// Raw grid, including dormant cells.
    #[must_use]
    pub fn grid(&self) -> &ScoreGrid {
        &self.grid
    }

    /// Check a loaded project against the catalog: the TRL row exists,
    /// every selected factor is a catalog factor of its category, and no
    /// stored note is oversized.
    pub fn validate(&self, catalog: &Catalog) -> Result<(), EssaError> {
        if let Some(level) = self.trl {
            catalog.trl(level).ok_or(EssaError::UnknownTrl(level.value()))?;
        }
        self.factors.check_catalog(catalog)?;
        for (_, _, cell) in self.grid.iter() {
            checked_text(cell.note.clone())?;
        }
        Ok(())
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> Result<(), EssaError> {
        self.description = checked_text(description.into())?;
        Ok(())
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) -> Result<(), EssaError> {
        self.notes = checked_text(notes.into())?;
        Ok(())
    }

    // =========================================================================
    // STEP 1: TRL
    // =========================================================================

    /// Select the TRL and return its catalog row.
    pub fn set_trl<'c>(&mut self, catalog: &'c Catalog, level: u8) -> Result<&'c TrlInfo, EssaError> {
        let level = TrlLevel::new(level)?;
        let info = catalog.trl(level).ok_or(EssaError::UnknownTrl(level.value()))?;
        self.trl = Some(level);
        Ok(info)
    }

    /// Catalog row of the selected TRL.
    #[must_use]
    pub fn trl_info<'c>(&self, catalog: &'c Catalog) -> Option<&'c TrlInfo> {
        self.trl.and_then(|level| catalog.trl(level))
    }

    // =========================================================================
    // STEP 2: SCOPING
    // =========================================================================

    /// Mark a stage as changed (in scope) or not.
    pub fn set_scoping_stage(&mut self, stage: &StageName, changed: bool) -> Result<(), EssaError> {
        self.scoping.set_changed(stage, changed)
    }

    pub fn add_stage(&mut self, stage: StageName) -> Result<(), EssaError> {
        self.scoping.add(stage)
    }

    /// Rename a stage; its grid cells follow.
    pub fn rename_stage(&mut self, from: &StageName, to: StageName) -> Result<(), EssaError> {
        self.scoping.rename(from, to.clone())?;
        self.grid.rename_stage(from, to);
        Ok(())
    }

    /// Remove a stage together with its grid cells.
    pub fn remove_stage(&mut self, stage: &StageName) -> Result<LifecycleStage, EssaError> {
        let removed = self.scoping.remove(stage)?;
        self.grid.remove_stage(stage);
        Ok(removed)
    }

    pub fn move_stage_up(&mut self, stage: &StageName) -> Result<(), EssaError> {
        self.scoping.move_up(stage)
    }

    /// Restore the catalog's default lifecycle, nothing scoped.
    pub fn reset_stages(&mut self, catalog: &Catalog) -> Result<(), EssaError> {
        self.replace_stages(catalog.default_stages.iter().cloned().map(LifecycleStage::new).collect())
    }

    /// Replace the whole lifecycle. Cells of stages no longer listed are dropped.
    pub fn replace_stages(&mut self, stages: Vec<LifecycleStage>) -> Result<(), EssaError> {
        let scoping = Scoping::from_stages(stages)?;
        self.grid.retain_stages(|name| scoping.contains(name));
        self.scoping = scoping;
        Ok(())
    }

    /// Non-blocking warnings about the scoping.
    #[must_use]
    pub fn scoping_warnings(&self) -> Vec<ScopingWarning> {
        if self.scoping.has_active() {
            Vec::new()
        } else {
            vec![ScopingWarning::NoStageChanged]
        }
    }

    // =========================================================================
    // STEP 3: FACTORS
    // =========================================================================

    /// Select exactly three catalog factors for a category.
    pub fn select_factors<I, S>(
        &mut self,
        catalog: &Catalog,
        category: Category,
        names: I,
    ) -> Result<(), EssaError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.factors.select(catalog, category, names)
    }

    /// Select the catalog's suggested factors in every category.
    pub fn select_default_factors(&mut self, catalog: &Catalog) {
        self.factors = FactorSelection::defaults(catalog);
    }

    // =========================================================================
    // STEP 4: SCORING
    // =========================================================================

    /// Score an active pair, replacing any earlier score. Returns the
    /// replaced cell.
    pub fn set_score(
        &mut self,
        stage: &StageName,
        factor: &FactorName,
        score: u8,
        note: impl Into<String>,
    ) -> Result<Option<Cell>, EssaError> {
        let score = Score::new(score)?;
        self.require_active(stage, factor)?;
        let cell = Cell::new(score, note)?;
        Ok(self.grid.set(stage.clone(), factor.clone(), cell))
    }

    /// Remove the score of a pair, active or dormant.
    pub fn clear_score(&mut self, stage: &StageName, factor: &FactorName) -> Option<Cell> {
        self.grid.remove(stage, factor)
    }

    fn require_active(&self, stage: &StageName, factor: &FactorName) -> Result<(), EssaError> {
        if !self.scoping.contains(stage) {
            return Err(EssaError::UnknownStage(stage.to_string()));
        }
        if !self.scoping.is_active(stage) {
            return Err(EssaError::InactiveStage(stage.to_string()));
        }
        if !self.factors.is_active(factor) {
            return Err(EssaError::InactiveFactor(factor.to_string()));
        }
        Ok(())
    }

    /// Score of an active pair, if any.
    #[must_use]
    pub fn score(&self, stage: &StageName, factor: &FactorName) -> Option<&Cell> {
        if self.scoping.is_active(stage) && self.factors.is_active(factor) {
            self.grid.get(stage, factor)
        } else {
            None
        }
    }

    /// Active stages in lifecycle order.
    #[must_use]
    pub fn active_stages(&self) -> Vec<StageName> {
        self.scoping.active().cloned().collect()
    }

    /// Selected factors with their category, Environmental first.
    #[must_use]
    pub fn active_factors(&self) -> Vec<(Category, FactorName)> {
        self.factors
            .active()
            .map(|(category, name)| (category, name.clone()))
            .collect()
    }

    /// Every active pair, stage-major.
    pub fn active_pairs(&self) -> impl Iterator<Item = (&StageName, &FactorName)> {
        self.scoping
            .active()
            .flat_map(move |stage| self.factors.active().map(move |(_, factor)| (stage, factor)))
    }

    /// Scored active pairs, stage-major.
    #[must_use]
    pub fn entries(&self) -> Vec<ScoreEntry> {
        self.active_pairs()
            .filter_map(|(stage, factor)| {
                self.grid.get(stage, factor).map(|cell| ScoreEntry {
                    stage: stage.clone(),
                    factor: factor.clone(),
                    score: cell.score,
                    note: cell.note.clone(),
                })
            })
            .collect()
    }

    /// Active pairs that still need a score.
    #[must_use]
    pub fn missing_pairs(&self) -> Vec<(StageName, FactorName)> {
        self.active_pairs()
            .filter(|(stage, factor)| self.grid.get(stage, factor).is_none())
            .map(|(stage, factor)| (stage.clone(), factor.clone()))
            .collect()
    }

    /// Check the grid is ready for aggregation.
    pub fn check_complete(&self) -> Result<(), EssaError> {
        if !self.scoping.has_active() {
            return Err(EssaError::NoActiveStages);
        }
        if let Some(category) = self.factors.missing_categories().next() {
            return Err(EssaError::FactorsNotSelected(category));
        }
        let missing = self.missing_pairs().len();
        if missing > 0 {
            return Err(EssaError::MissingScores { missing });
        }
        Ok(())
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.check_complete().is_ok()
    }

    // =========================================================================
    // STEP 5: RESULTS
    // =========================================================================

    /// All aggregates over the complete grid.
    pub fn results(&self) -> Result<Results, EssaError> {
        self.check_complete()?;
        Results::compute(&self.active_stages(), &self.active_factors(), &self.entries())
    }

    /// Average score per active stage, in lifecycle order.
    pub fn average_by_stage(&self) -> Result<Vec<(StageName, Mean)>, EssaError> {
        Ok(self
            .results()?
            .by_stage
            .into_iter()
            .map(|a| (a.stage, a.mean))
            .collect())
    }

    /// Average score per selected factor.
    pub fn average_by_factor(&self) -> Result<Vec<(FactorName, Mean)>, EssaError> {
        Ok(self
            .results()?
            .by_factor
            .into_iter()
            .map(|a| (a.factor, a.mean))
            .collect())
    }

    /// Stage(s) with the highest average, all ties included.
    pub fn worst_stage(&self) -> Result<Vec<StageName>, EssaError> {
        Ok(self.results()?.worst.stages)
    }

    /// Mean of the stage means.
    pub fn overall_score(&self) -> Result<Mean, EssaError> {
        Ok(self.results()?.overall)
    }

    /// Scores and notes of one active stage, worst first.
    ///
    /// Ties keep the factor order (Environmental, Social, Economic).
    pub fn stage_breakdown(&self, stage: &StageName) -> Result<Vec<ScoreEntry>, EssaError> {
        self.check_complete()?;
        if !self.scoping.contains(stage) {
            return Err(EssaError::UnknownStage(stage.to_string()));
        }
        if !self.scoping.is_active(stage) {
            return Err(EssaError::InactiveStage(stage.to_string()));
        }
        let mut rows: Vec<ScoreEntry> = self
            .entries()
            .into_iter()
            .filter(|e| &e.stage == stage)
            .collect();
        rows.sort_by(|a, b| b.score.cmp(&a.score));
        Ok(rows)
    }
}

fn checked_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let raw = String::deserialize(deserializer)?;
    validated_name(&raw).map_err(serde::de::Error::custom)
}

fn checked_text_field<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    checked_text(String::deserialize(deserializer)?).map_err(serde::de::Error::custom)
}

fn checked_text(text: String) -> Result<String, EssaError> {
    if text.len() > MAX_NOTE_LENGTH {
        return Err(EssaError::NoteTooLong {
            length: text.len(),
            max: MAX_NOTE_LENGTH,
        });
    }
    Ok(text)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(name: &str) -> StageName {
        StageName::new(name).expect("valid")
    }

    fn factor(name: &str) -> FactorName {
        FactorName::new(name).expect("valid")
    }

    /// Two stages, one changed, default factors.
    fn scoped(catalog: &Catalog) -> Project {
        let mut project =
            Project::with_stages("Bio-resin", &[stage("Use"), stage("End-of-Life")]).expect("valid");
        project.set_scoping_stage(&stage("Use"), true).expect("known");
        project.select_default_factors(catalog);
        project
    }

    fn score_all(project: &mut Project, value: u8) {
        let pairs: Vec<_> = project
            .active_pairs()
            .map(|(s, f)| (s.clone(), f.clone()))
            .collect();
        for (s, f) in pairs {
            project.set_score(&s, &f, value, "").expect("active pair");
        }
    }

    #[test]
    fn empty_project_name_rejected() {
        let catalog = Catalog::standard();
        assert_eq!(Project::new("  ", &catalog), Err(EssaError::EmptyName));
    }

    #[test]
    fn new_project_uses_default_lifecycle() {
        let catalog = Catalog::standard();
        let project = Project::new("Demo", &catalog).expect("valid");
        assert_eq!(project.scoping().stages().len(), catalog.default_stages.len());
        assert_eq!(project.scoping_warnings(), vec![ScopingWarning::NoStageChanged]);
    }

    #[test]
    fn set_trl_returns_catalog_row() {
        let catalog = Catalog::standard();
        let mut project = Project::new("Demo", &catalog).expect("valid");

        let info = project.set_trl(&catalog, 4).expect("valid level");
        assert_eq!(info.level.value(), 4);
        assert_eq!(project.trl().map(TrlLevel::value), Some(4));

        assert_eq!(project.set_trl(&catalog, 10), Err(EssaError::InvalidTrl(10)));
        assert_eq!(project.trl().map(TrlLevel::value), Some(4));
    }

    #[test]
    fn inactive_pairs_cannot_be_scored() {
        let catalog = Catalog::standard();
        let mut project = scoped(&catalog);
        let climate = factor("Climate change");

        assert_eq!(
            project.set_score(&stage("End-of-Life"), &climate, 3, ""),
            Err(EssaError::InactiveStage("End-of-Life".into()))
        );
        assert_eq!(
            project.set_score(&stage("Transport"), &climate, 3, ""),
            Err(EssaError::UnknownStage("Transport".into()))
        );
        assert_eq!(
            project.set_score(&stage("Use"), &factor("Noise"), 3, ""),
            Err(EssaError::InactiveFactor("Noise".into()))
        );
        assert_eq!(
            project.set_score(&stage("Use"), &climate, 6, ""),
            Err(EssaError::InvalidScore(6))
        );
        assert!(project.grid().is_empty());
    }

    #[test]
    fn overwrite_keeps_one_entry() {
        let catalog = Catalog::standard();
        let mut project = scoped(&catalog);
        let climate = factor("Climate change");

        project.set_score(&stage("Use"), &climate, 2, "first").expect("ok");
        let previous = project
            .set_score(&stage("Use"), &climate, 4, "second")
            .expect("ok");

        assert_eq!(previous.map(|c| c.score.value()), Some(2));
        let entries = project.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].note, "second");
    }

    #[test]
    fn aggregates_require_complete_grid() {
        let catalog = Catalog::standard();
        let mut project = Project::new("Demo", &catalog).expect("valid");
        assert_eq!(project.results(), Err(EssaError::NoActiveStages));

        project = scoped(&catalog);
        project
            .select_factors(
                &catalog,
                Category::Social,
                [
                    "Health and safety (workers)",
                    "Equal opportunities (workers)",
                    "Local employment (local community)",
                ],
            )
            .expect("social factors");
        project
            .set_score(&stage("Use"), &factor("Climate change"), 2, "")
            .expect("ok");
        assert!(matches!(
            project.average_by_stage(),
            Err(EssaError::MissingScores { missing: 8 })
        ));

        score_all(&mut project, 3);
        assert!(project.is_complete());
        assert_eq!(project.worst_stage().expect("complete"), vec![stage("Use")]);
    }

    #[test]
    fn deselected_stage_cells_go_dormant() {
        let catalog = Catalog::standard();
        let mut project = scoped(&catalog);
        project.set_scoping_stage(&stage("End-of-Life"), true).expect("known");
        score_all(&mut project, 4);
        assert_eq!(project.entries().len(), 18);

        project.set_scoping_stage(&stage("End-of-Life"), false).expect("known");
        assert_eq!(project.entries().len(), 9);
        assert_eq!(project.grid().len(), 18);
        assert!(project.is_complete());

        project.set_scoping_stage(&stage("End-of-Life"), true).expect("known");
        assert_eq!(project.entries().len(), 18);
    }

    #[test]
    fn rename_and_remove_follow_grid() {
        let catalog = Catalog::standard();
        let mut project = scoped(&catalog);
        score_all(&mut project, 2);

        project.rename_stage(&stage("Use"), stage("Use phase")).expect("rename");
        assert!(project.is_complete());
        assert_eq!(project.entries()[0].stage, stage("Use phase"));

        project.remove_stage(&stage("Use phase")).expect("remove");
        assert!(project.grid().is_empty());
        assert_eq!(project.check_complete(), Err(EssaError::NoActiveStages));
    }

    #[test]
    fn failed_rename_changes_nothing() {
        let catalog = Catalog::standard();
        let mut project = scoped(&catalog);
        score_all(&mut project, 2);
        let before = project.clone();

        assert!(project.rename_stage(&stage("Use"), stage("End-of-Life")).is_err());
        assert_eq!(project, before);
    }

    #[test]
    fn breakdown_sorts_worst_first() {
        let catalog = Catalog::standard();
        let mut project = scoped(&catalog);
        score_all(&mut project, 1);
        project
            .set_score(&stage("Use"), &factor("Raw material cost"), 5, "more shifts")
            .expect("ok");

        let rows = project.stage_breakdown(&stage("Use")).expect("complete");
        assert_eq!(rows.len(), 9);
        assert_eq!(rows[0].factor, factor("Raw material cost"));
        assert_eq!(rows[0].note, "more shifts");
        assert_eq!(
            project.stage_breakdown(&stage("End-of-Life")),
            Err(EssaError::InactiveStage("End-of-Life".into()))
        );
    }

    #[test]
    fn reset_restores_defaults_and_drops_custom_cells() {
        let catalog = Catalog::standard();
        let mut project = scoped(&catalog);
        score_all(&mut project, 2);

        project.reset_stages(&catalog).expect("defaults are valid");
        assert_eq!(project.scoping().stages().len(), catalog.default_stages.len());
        assert!(project.grid().is_empty());
    }

    #[test]
    fn loading_rechecks_name_and_selection() {
        let catalog = Catalog::standard();
        let json = serde_json::to_value(scoped(&catalog)).expect("serialize");

        let mut blank = json.clone();
        blank["name"] = serde_json::json!("   ");
        assert!(serde_json::from_value::<Project>(blank).is_err());

        let mut padded = json.clone();
        padded["name"] = serde_json::json!("  Bio-resin ");
        let loaded: Project = serde_json::from_value(padded).expect("trimmed on load");
        assert_eq!(loaded.name(), "Bio-resin");

        let mut extra = json;
        extra["factors"]["Environmental"]
            .as_array_mut()
            .expect("list")
            .push(serde_json::json!("Not a catalog factor"));
        assert!(serde_json::from_value::<Project>(extra).is_err());
    }

    #[test]
    fn validate_checks_catalog_and_notes() {
        let catalog = Catalog::standard();
        let project = scoped(&catalog);
        assert_eq!(project.validate(&catalog), Ok(()));

        let mut json = serde_json::to_value(&project).expect("serialize");
        json["factors"]["Environmental"][2] = serde_json::json!("Not a catalog factor");
        let swapped: Project = serde_json::from_value(json).expect("shape is fine");
        assert!(matches!(
            swapped.validate(&catalog),
            Err(EssaError::UnknownFactor { .. })
        ));

        let mut json = serde_json::to_value(&project).expect("serialize");
        json["grid"]["cells"]["Use"]["Climate change"] =
            serde_json::json!({ "score": 3, "note": "x".repeat(MAX_NOTE_LENGTH + 1) });
        let noisy: Project = serde_json::from_value(json).expect("cells load as-is");
        assert!(matches!(
            noisy.validate(&catalog),
            Err(EssaError::NoteTooLong { .. })
        ));
    }
}
