//! # Results
//!
//! Derived views over scored entries: average per stage, average per
//! factor, the worst stage(s) and the overall score.
//!
//! Nothing here is stored. [`Results::compute`] is a pure function of an
//! ordered stage list, an ordered factor list and the entries, so the same
//! code serves the live project and the re-import check of an export.
//!
//! ## Worst Stage
//!
//! Higher is worse (5 = "Much Worse"). Every stage tied at the maximum
//! average is reported, in lifecycle order.

use crate::grid::ScoreEntry;
use crate::score::Mean;
use crate::types::{Category, EssaError, FactorName, StageName};
use serde::Serialize;

/// Average score of one lifecycle stage across the selected factors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageAverage {
    pub stage: StageName,
    pub mean: Mean,
}

/// Average score of one factor across the active stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactorAverage {
    pub factor: FactorName,
    pub category: Category,
    pub mean: Mean,
}

/// The stage(s) with the highest average.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorstStages {
    /// Never empty; more than one entry means a tie.
    pub stages: Vec<StageName>,
    pub mean: Mean,
}

impl WorstStages {
    /// Whether several stages share the maximum.
    #[must_use]
    pub fn is_tie(&self) -> bool {
        self.stages.len() > 1
    }
}

/// Everything shown on the results step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Results {
    pub by_stage: Vec<StageAverage>,
    pub by_factor: Vec<FactorAverage>,
    pub worst: WorstStages,
    /// Mean of the stage means.
    pub overall: Mean,
}

impl Results {
    /// Aggregate entries over the given stages and factors.
    ///
    /// Entries outside those lists are ignored. Stages and factors without
    /// any entry are left out of their tables. Fails with
    /// `NoActiveStages` when no stage has an entry.
    pub fn compute(
        stages: &[StageName],
        factors: &[(Category, FactorName)],
        entries: &[ScoreEntry],
    ) -> Result<Self, EssaError> {
        let counted: Vec<&ScoreEntry> = entries
            .iter()
            .filter(|e| stages.contains(&e.stage) && factors.iter().any(|(_, f)| f == &e.factor))
            .collect();

        let by_stage = average_by_stage(stages, &counted);
        let by_factor = average_by_factor(factors, &counted);
        let worst = worst_stages(&by_stage).ok_or(EssaError::NoActiveStages)?;
        let overall = overall_mean(&by_stage).ok_or(EssaError::NoActiveStages)?;

        Ok(Self {
            by_stage,
            by_factor,
            worst,
            overall,
        })
    }

    /// Average of one stage, if it was scored.
    #[must_use]
    pub fn stage_mean(&self, stage: &StageName) -> Option<Mean> {
        self.by_stage
            .iter()
            .find(|a| &a.stage == stage)
            .map(|a| a.mean)
    }

    /// Average of one factor, if it was scored.
    #[must_use]
    pub fn factor_mean(&self, factor: &FactorName) -> Option<Mean> {
        self.by_factor
            .iter()
            .find(|a| &a.factor == factor)
            .map(|a| a.mean)
    }
}

fn average_by_stage(stages: &[StageName], entries: &[&ScoreEntry]) -> Vec<StageAverage> {
    stages
        .iter()
        .filter_map(|stage| {
            let scores = entries.iter().filter(|e| &e.stage == stage).map(|e| e.score);
            Mean::of(scores).map(|mean| StageAverage {
                stage: stage.clone(),
                mean,
            })
        })
        .collect()
}

fn average_by_factor(
    factors: &[(Category, FactorName)],
    entries: &[&ScoreEntry],
) -> Vec<FactorAverage> {
    factors
        .iter()
        .filter_map(|(category, factor)| {
            let scores = entries
                .iter()
                .filter(|e| &e.factor == factor)
                .map(|e| e.score);
            Mean::of(scores).map(|mean| FactorAverage {
                factor: factor.clone(),
                category: *category,
                mean,
            })
        })
        .collect()
}

fn worst_stages(by_stage: &[StageAverage]) -> Option<WorstStages> {
    let max = by_stage.iter().map(|a| a.mean).max()?;
    let stages = by_stage
        .iter()
        .filter(|a| a.mean == max)
        .map(|a| a.stage.clone())
        .collect();
    Some(WorstStages { stages, mean: max })
}

/// Every complete stage has the same number of entries, so pooling the
/// stage means gives exactly the mean of the means.
fn overall_mean(by_stage: &[StageAverage]) -> Option<Mean> {
    by_stage
        .iter()
        .map(|a| a.mean)
        .reduce(|acc, mean| acc.merge(mean))
}

// =============================================================================
// TESTS
// =============================================================================
