//! # Scoring Grid
//!
//! Step 4 storage: one cell per (stage, factor) pair. A pair is either
//! scored or absent; there is never more than one cell for it.
//!
//! The grid itself knows nothing about which pairs are active. The owning
//! [`Project`](crate::Project) decides that and only hands active pairs to
//! aggregation and export.

use crate::primitives::MAX_NOTE_LENGTH;
use crate::score::Score;
use crate::types::{EssaError, FactorName, StageName};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Score and justification for one pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub score: Score,
    pub note: String,
}

impl Cell {
    /// Create a cell, rejecting oversized notes.
    pub fn new(score: Score, note: impl Into<String>) -> Result<Self, EssaError> {
        let note = note.into();
        if note.len() > MAX_NOTE_LENGTH {
            return Err(EssaError::NoteTooLong {
                length: note.len(),
                max: MAX_NOTE_LENGTH,
            });
        }
        Ok(Self { score, note })
    }
}

/// A flattened grid cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub stage: StageName,
    pub factor: FactorName,
    pub score: Score,
    pub note: String,
}

/// Stage -> factor -> cell.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreGrid {
    cells: BTreeMap<StageName, BTreeMap<FactorName, Cell>>,
}

impl ScoreGrid {
    /// Create an empty grid.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a cell, returning the one it replaced.
    pub fn set(&mut self, stage: StageName, factor: FactorName, cell: Cell) -> Option<Cell> {
        self.cells.entry(stage).or_default().insert(factor, cell)
    }

    /// Look up a cell.
    #[must_use]
    pub fn get(&self, stage: &StageName, factor: &FactorName) -> Option<&Cell> {
        self.cells.get(stage).and_then(|row| row.get(factor))
    }

    /// Remove a cell.
    pub fn remove(&mut self, stage: &StageName, factor: &FactorName) -> Option<Cell> {
        let row = self.cells.get_mut(stage)?;
        let removed = row.remove(factor);
        if row.is_empty() {
            self.cells.remove(stage);
        }
        removed
    }

    /// Drop every cell of a stage.
    pub fn remove_stage(&mut self, stage: &StageName) {
        self.cells.remove(stage);
    }

    /// Move a stage's cells under a new name.
    pub fn rename_stage(&mut self, from: &StageName, to: StageName) {
        if let Some(row) = self.cells.remove(from) {
            self.cells.insert(to, row);
        }
    }

    /// Keep only stages accepted by the predicate.
    pub fn retain_stages<F>(&mut self, mut keep: F)
    where
        F: FnMut(&StageName) -> bool,
    {
        self.cells.retain(|stage, _| keep(stage));
    }

    /// Every stored cell, active or not, stage-major.
    pub fn iter(&self) -> impl Iterator<Item = (&StageName, &FactorName, &Cell)> {
        self.cells.iter().flat_map(|(stage, row)| {
            row.iter().map(move |(factor, cell)| (stage, factor, cell))
        })
    }

    /// Total number of stored cells, active or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.values().map(BTreeMap::len).sum()
    }

    /// Whether no cell is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(stage: &str, factor: &str) -> (StageName, FactorName) {
        (
            StageName::new(stage).expect("valid"),
            FactorName::new(factor).expect("valid"),
        )
    }

    fn cell(score: u8) -> Cell {
        Cell::new(Score::new(score).expect("valid"), "").expect("valid")
    }

    #[test]
    fn overwrite_keeps_single_cell() {
        let mut grid = ScoreGrid::new();
        let (stage, factor) = pair("Use", "Climate change");

        assert!(grid.set(stage.clone(), factor.clone(), cell(2)).is_none());
        let previous = grid.set(stage.clone(), factor.clone(), cell(4));

        assert_eq!(previous.map(|c| c.score.value()), Some(2));
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.get(&stage, &factor).map(|c| c.score.value()), Some(4));
    }

    #[test]
    fn remove_cleans_empty_rows() {
        let mut grid = ScoreGrid::new();
        let (stage, factor) = pair("Use", "Climate change");
        grid.set(stage.clone(), factor.clone(), cell(3));
        assert!(grid.remove(&stage, &factor).is_some());
        assert!(grid.is_empty());
    }

    #[test]
    fn rename_moves_row() {
        let mut grid = ScoreGrid::new();
        let (stage, factor) = pair("Use", "Climate change");
        grid.set(stage.clone(), factor.clone(), cell(3));

        let renamed = StageName::new("Use phase").expect("valid");
        grid.rename_stage(&stage, renamed.clone());

        assert!(grid.get(&stage, &factor).is_none());
        assert!(grid.get(&renamed, &factor).is_some());
    }

    #[test]
    fn oversized_note_rejected() {
        let score = Score::new(3).expect("valid");
        let note = "n".repeat(MAX_NOTE_LENGTH + 1);
        assert!(matches!(
            Cell::new(score, note),
            Err(EssaError::NoteTooLong { .. })
        ));
    }
}
