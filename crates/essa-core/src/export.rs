//! # Results Export
//!
//! A flat, self-describing table of a finished assessment. One row per
//! scored pair, followed by the summary rows (stage averages, factor
//! averages, worst stage(s), overall). The same table renders to CSV
//! ([`crate::formats::csv`]) and JSON (serde), and both parse back.
//!
//! Averages carry their exact `sum` and `count` next to the rounded
//! display value, so a re-imported table reconstructs identical means.
//! [`ResultsTable::verify`] recomputes the summary from the entry rows and
//! checks it against the stored summary, and that every stage/factor pair
//! has exactly one entry row.

use crate::grid::ScoreEntry;
use crate::project::Project;
use crate::reference::Catalog;
use crate::results::{FactorAverage, Results, StageAverage, WorstStages};
use crate::score::{Mean, Score};
use crate::types::{Category, EssaError, FactorName, StageName, TrlLevel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// ROWS
// =============================================================================

/// What a row describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    Entry,
    StageAverage,
    FactorAverage,
    WorstStage,
    Overall,
}

impl RowKind {
    pub const ALL: [RowKind; 5] = [
        RowKind::Entry,
        RowKind::StageAverage,
        RowKind::FactorAverage,
        RowKind::WorstStage,
        RowKind::Overall,
    ];

    /// Name used in CSV and JSON.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RowKind::Entry => "entry",
            RowKind::StageAverage => "stage_average",
            RowKind::FactorAverage => "factor_average",
            RowKind::WorstStage => "worst_stage",
            RowKind::Overall => "overall",
        }
    }

    /// Parse a CSV kind cell.
    pub fn parse(raw: &str) -> Result<Self, EssaError> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == raw)
            .ok_or_else(|| EssaError::DeserializationError(format!("Unknown row kind: {}", raw)))
    }
}

/// One table row. Columns a kind does not use are `None` / empty.
///
/// | kind | stage | category + factor | score | sum/count/average/label |
/// |------|-------|-------------------|-------|-------------------------|
/// | entry | yes | yes | yes | label only |
/// | stage_average | yes | | | yes |
/// | factor_average | | yes | | yes |
/// | worst_stage | yes | | | yes |
/// | overall | | | | yes |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResultRow {
    pub kind: RowKind,
    pub stage: Option<StageName>,
    pub category: Option<Category>,
    pub factor: Option<FactorName>,
    pub score: Option<Score>,
    pub sum: Option<u32>,
    pub count: Option<u32>,
    /// Rounded display value ("2.67").
    pub average: Option<String>,
    /// Legend label of the score or average.
    pub label: String,
    #[serde(default)]
    pub note: String,
}

impl ResultRow {
    fn entry(entry: &ScoreEntry, category: Category) -> Self {
        Self {
            kind: RowKind::Entry,
            stage: Some(entry.stage.clone()),
            category: Some(category),
            factor: Some(entry.factor.clone()),
            score: Some(entry.score),
            sum: None,
            count: None,
            average: None,
            label: entry.score.label().name().to_string(),
            note: entry.note.clone(),
        }
    }

    fn summary(kind: RowKind, mean: Mean) -> Self {
        Self {
            kind,
            stage: None,
            category: None,
            factor: None,
            score: None,
            sum: Some(mean.sum()),
            count: Some(mean.count()),
            average: Some(mean.to_string()),
            label: mean.label().name().to_string(),
            note: String::new(),
        }
    }

    fn stage_average(average: &StageAverage) -> Self {
        Self {
            stage: Some(average.stage.clone()),
            ..Self::summary(RowKind::StageAverage, average.mean)
        }
    }

    fn factor_average(average: &FactorAverage) -> Self {
        Self {
            category: Some(average.category),
            factor: Some(average.factor.clone()),
            ..Self::summary(RowKind::FactorAverage, average.mean)
        }
    }

    fn worst_stage(stage: &StageName, mean: Mean) -> Self {
        Self {
            stage: Some(stage.clone()),
            ..Self::summary(RowKind::WorstStage, mean)
        }
    }

    /// Exact mean of a summary row.
    pub fn mean(&self) -> Result<Mean, EssaError> {
        match (self.sum, self.count) {
            (Some(sum), Some(count)) => Mean::from_parts(sum, count),
            _ => Err(self.malformed("missing sum or count")),
        }
    }

    fn stage_name(&self) -> Result<&StageName, EssaError> {
        self.stage.as_ref().ok_or_else(|| self.malformed("missing stage"))
    }

    fn factor_name(&self) -> Result<(Category, &FactorName), EssaError> {
        match (self.category, &self.factor) {
            (Some(category), Some(factor)) => Ok((category, factor)),
            _ => Err(self.malformed("missing category or factor")),
        }
    }

    fn malformed(&self, reason: &str) -> EssaError {
        EssaError::DeserializationError(format!("Malformed {} row: {}", self.kind.as_str(), reason))
    }

    /// Check the row has exactly the columns its kind uses, and that the
    /// derived columns agree with the exact ones.
    pub fn validate(&self) -> Result<(), EssaError> {
        let uses_stage = matches!(
            self.kind,
            RowKind::Entry | RowKind::StageAverage | RowKind::WorstStage
        );
        let uses_factor = matches!(self.kind, RowKind::Entry | RowKind::FactorAverage);

        if self.stage.is_some() != uses_stage {
            return Err(self.malformed("unexpected stage column"));
        }
        if self.factor.is_some() != uses_factor || self.category.is_some() != uses_factor {
            return Err(self.malformed("unexpected factor column"));
        }

        if self.kind == RowKind::Entry {
            let score = self.score.ok_or_else(|| self.malformed("missing score"))?;
            if self.sum.is_some() || self.count.is_some() || self.average.is_some() {
                return Err(self.malformed("entry rows carry no average"));
            }
            if self.label != score.label().name() {
                return Err(self.malformed("label does not match score"));
            }
            return Ok(());
        }

        if self.score.is_some() {
            return Err(self.malformed("summary rows carry no score"));
        }
        if !self.note.is_empty() {
            return Err(self.malformed("summary rows carry no note"));
        }
        let mean = self.mean()?;
        if self.average.as_deref() != Some(mean.to_string().as_str()) {
            return Err(self.malformed("average does not match sum and count"));
        }
        if self.label != mean.label().name() {
            return Err(self.malformed("label does not match average"));
        }
        Ok(())
    }
}

// =============================================================================
// TABLE
// =============================================================================

/// An exported assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResultsTable {
    pub project: String,
    pub trl: Option<TrlLevel>,
    pub rows: Vec<ResultRow>,
}

/// Build the export table of a project.
///
/// Fails with an `IncompleteData` error unless the grid is complete.
pub fn export_results(project: &Project) -> Result<ResultsTable, EssaError> {
    let results = project.results()?;
    let mut rows = Vec::new();

    for entry in project.entries() {
        let category = project
            .factors()
            .category_of(&entry.factor)
            .ok_or_else(|| EssaError::InactiveFactor(entry.factor.to_string()))?;
        rows.push(ResultRow::entry(&entry, category));
    }
    rows.extend(results.by_stage.iter().map(ResultRow::stage_average));
    rows.extend(results.by_factor.iter().map(ResultRow::factor_average));
    rows.extend(
        results
            .worst
            .stages
            .iter()
            .map(|stage| ResultRow::worst_stage(stage, results.worst.mean)),
    );
    rows.push(ResultRow::summary(RowKind::Overall, results.overall));

    Ok(ResultsTable {
        project: project.name().to_string(),
        trl: project.trl(),
        rows,
    })
}

impl ResultsTable {
    /// Rows of one kind, in table order.
    pub fn rows_of(&self, kind: RowKind) -> impl Iterator<Item = &ResultRow> {
        self.rows.iter().filter(move |r| r.kind == kind)
    }

    /// Check every row on its own.
    pub fn validate(&self) -> Result<(), EssaError> {
        self.rows.iter().try_for_each(ResultRow::validate)
    }

    /// The scored pairs.
    pub fn entries(&self) -> Result<Vec<ScoreEntry>, EssaError> {
        self.rows_of(RowKind::Entry)
            .map(|row| {
                let (_, factor) = row.factor_name()?;
                Ok(ScoreEntry {
                    stage: row.stage_name()?.clone(),
                    factor: factor.clone(),
                    score: row.score.ok_or_else(|| row.malformed("missing score"))?,
                    note: row.note.clone(),
                })
            })
            .collect()
    }

    /// Rebuild the results view from the summary rows.
    pub fn to_results(&self) -> Result<Results, EssaError> {
        let by_stage = self
            .rows_of(RowKind::StageAverage)
            .map(|row| {
                Ok(StageAverage {
                    stage: row.stage_name()?.clone(),
                    mean: row.mean()?,
                })
            })
            .collect::<Result<Vec<_>, EssaError>>()?;

        let by_factor = self
            .rows_of(RowKind::FactorAverage)
            .map(|row| {
                let (category, factor) = row.factor_name()?;
                Ok(FactorAverage {
                    factor: factor.clone(),
                    category,
                    mean: row.mean()?,
                })
            })
            .collect::<Result<Vec<_>, EssaError>>()?;

        let mut worst_rows = self.rows_of(RowKind::WorstStage).peekable();
        let worst_mean = match worst_rows.peek() {
            Some(row) => row.mean()?,
            None => return Err(missing_row(RowKind::WorstStage)),
        };
        let stages = worst_rows
            .map(|row| {
                if row.mean()? != worst_mean {
                    return Err(row.malformed("tied stages disagree on the average"));
                }
                row.stage_name().cloned()
            })
            .collect::<Result<Vec<_>, EssaError>>()?;

        let overall = self
            .rows_of(RowKind::Overall)
            .next()
            .ok_or_else(|| missing_row(RowKind::Overall))?
            .mean()?;

        Ok(Results {
            by_stage,
            by_factor,
            worst: WorstStages {
                stages,
                mean: worst_mean,
            },
            overall,
        })
    }

    /// Recompute the aggregates from the entry rows and compare them with
    /// the stored summary. Returns the recomputed results.
    pub fn verify(&self) -> Result<Results, EssaError> {
        self.validate()?;
        let entries = self.entries()?;

        let mut stages: Vec<StageName> = Vec::new();
        let mut factors: Vec<(Category, FactorName)> = Vec::new();
        let mut pairs: BTreeSet<(&StageName, &FactorName)> = BTreeSet::new();
        for row in self.rows_of(RowKind::Entry) {
            let stage = row.stage_name()?;
            if !stages.contains(stage) {
                stages.push(stage.clone());
            }
            let (category, factor) = row.factor_name()?;
            match factors.iter().find(|(_, f)| f == factor) {
                Some((known, _)) if *known != category => {
                    return Err(row.malformed("factor appears under two categories"));
                }
                Some(_) => {}
                None => factors.push((category, factor.clone())),
            }
            if !pairs.insert((stage, factor)) {
                return Err(EssaError::DeserializationError(format!(
                    "Entry for {} / {} appears more than once",
                    stage, factor
                )));
            }
        }

        let expected_pairs = stages.len().saturating_mul(factors.len());
        if entries.len() != expected_pairs {
            return Err(EssaError::DeserializationError(format!(
                "Table has {} entries, a complete grid of {} stages and {} factors needs {}",
                entries.len(),
                stages.len(),
                factors.len(),
                expected_pairs
            )));
        }

        let recomputed = Results::compute(&stages, &factors, &entries)?;
        if recomputed != self.to_results()? {
            return Err(EssaError::DeserializationError(
                "Summary rows do not match the entries".to_string(),
            ));
        }
        Ok(recomputed)
    }

    /// Rebuild an editable project from a verified table.
    ///
    /// Every stage that appears in the entries comes back marked as changed,
    /// in first-seen order. Factors must still exist in `catalog`.
    pub fn to_project(&self, catalog: &Catalog) -> Result<Project, EssaError> {
        self.verify()?;
        let entries = self.entries()?;

        let mut stages: Vec<StageName> = Vec::new();
        for entry in &entries {
            if !stages.contains(&entry.stage) {
                stages.push(entry.stage.clone());
            }
        }
        let mut project = Project::with_stages(&self.project, &stages)?;
        for stage in &stages {
            project.set_scoping_stage(stage, true)?;
        }

        for category in Category::ALL {
            let mut names: Vec<&str> = Vec::new();
            for row in self.rows_of(RowKind::FactorAverage) {
                let (row_category, factor) = row.factor_name()?;
                if row_category == category {
                    names.push(factor.as_str());
                }
            }
            project.select_factors(catalog, category, names)?;
        }

        if let Some(level) = self.trl {
            project.set_trl(catalog, level.value())?;
        }
        for entry in entries {
            project.set_score(&entry.stage, &entry.factor, entry.score.value(), entry.note)?;
        }
        project.check_complete()?;
        Ok(project)
    }

    /// Deterministic checksum of the table contents.
    ///
    /// FNV-1a over the CSV rendering. This is **NOT** a cryptographic hash;
    /// it detects accidental corruption only. See [`Self::blake3_hash`] with
    /// the `crypto-hash` feature for tamper evidence.
    #[must_use]
    pub fn checksum(&self) -> u64 {
        const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
        const PRIME: u64 = 0x0000_0100_0000_01b3;

        crate::formats::csv::to_csv(self)
            .bytes()
            .fold(OFFSET, |hash, byte| (hash ^ byte as u64).wrapping_mul(PRIME))
    }

    /// BLAKE3 hash of the CSV rendering, hex encoded.
    #[cfg(feature = "crypto-hash")]
    #[must_use]
    pub fn blake3_hash(&self) -> String {
        blake3::hash(crate::formats::csv::to_csv(self).as_bytes())
            .to_hex()
            .to_string()
    }
}

fn missing_row(kind: RowKind) -> EssaError {
    EssaError::DeserializationError(format!("Table has no {} row", kind.as_str()))
}

// =============================================================================
// TESTS
// =============================================================================
