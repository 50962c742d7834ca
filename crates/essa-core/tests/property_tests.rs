//! # Property-Based Tests
//!
//! Invariants of the assessment model checked over generated grids.

use essa_core::formats::csv;
use essa_core::{
    Catalog, Category, EssaError, Mean, Project, ResultsTable, RowKind, StageName, export_results,
};
use proptest::collection::vec;
use proptest::prelude::*;
use proptest::sample::Index;

/// A project with `stages` changed stages, the default factors, and the
/// given scores laid out stage-major.
fn scored_project(stages: usize, scores: &[u8]) -> Project {
    let catalog = Catalog::standard();
    let names: Vec<StageName> = (1..=stages)
        .map(|i| StageName::new(format!("Stage {}", i)).expect("valid"))
        .collect();
    let mut project = Project::with_stages("Generated", &names).expect("valid");
    for name in &names {
        project.set_scoping_stage(name, true).expect("known");
    }
    project.select_default_factors(&catalog);

    let pairs: Vec<_> = project
        .active_pairs()
        .map(|(s, f)| (s.clone(), f.clone()))
        .collect();
    for ((stage, factor), score) in pairs.iter().zip(scores) {
        project.set_score(stage, factor, *score, "").expect("active pair");
    }
    project
}

/// Number of stages plus a full grid of scores for them.
fn grid() -> impl Strategy<Value = (usize, Vec<u8>)> {
    (1usize..=7).prop_flat_map(|n| (Just(n), vec(1u8..=5, n * 9)))
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Stage averages are the arithmetic mean of the stage's row and stay on the scale.
    #[test]
    fn stage_average_is_row_mean((n, scores) in grid()) {
        let project = scored_project(n, &scores);
        let averages = project.average_by_stage().expect("complete");

        prop_assert_eq!(averages.len(), n);
        for ((_, mean), row) in averages.iter().zip(scores.chunks(9)) {
            let sum: u32 = row.iter().map(|s| *s as u32).sum();
            prop_assert_eq!(*mean, Mean::from_parts(sum, 9).expect("in range"));
            prop_assert!(mean.within_scale());
        }
    }

    /// Factor averages are the column means.
    #[test]
    fn factor_average_is_column_mean((n, scores) in grid()) {
        let project = scored_project(n, &scores);
        let averages = project.average_by_factor().expect("complete");

        prop_assert_eq!(averages.len(), 9);
        for (column, (_, mean)) in averages.iter().enumerate() {
            let sum: u32 = scores.chunks(9).map(|row| row[column] as u32).sum();
            prop_assert_eq!(*mean, Mean::from_parts(sum, n as u32).expect("in range"));
        }
    }

    /// The worst set holds exactly the stages at the maximum average.
    #[test]
    fn worst_stage_returns_every_tie((n, scores) in grid()) {
        let project = scored_project(n, &scores);
        let averages = project.average_by_stage().expect("complete");
        let max = averages.iter().map(|(_, m)| *m).max().expect("non-empty");
        let expected: Vec<StageName> = averages
            .iter()
            .filter(|(_, m)| *m == max)
            .map(|(s, _)| s.clone())
            .collect();

        prop_assert_eq!(project.worst_stage().expect("complete"), expected);
    }

    /// Overall score equals the mean of the stage means.
    #[test]
    fn overall_is_mean_of_means((n, scores) in grid()) {
        let project = scored_project(n, &scores);
        let overall = project.overall_score().expect("complete");
        let total: u32 = scores.iter().map(|s| *s as u32).sum();

        prop_assert_eq!(overall, Mean::from_parts(total, (9 * n) as u32).expect("in range"));
        prop_assert!(overall.within_scale());
    }

    /// Selecting any number of factors other than three fails.
    #[test]
    fn wrong_size_selection_fails(picks in proptest::sample::subsequence((0usize..13).collect::<Vec<_>>(), 0..=7)) {
        prop_assume!(picks.len() != 3);
        let catalog = Catalog::standard();
        let names: Vec<String> = catalog
            .factors_in(Category::Environmental)
            .enumerate()
            .filter(|(i, _)| picks.contains(i))
            .map(|(_, f)| f.name.to_string())
            .collect();

        let mut project = Project::new("Generated", &catalog).expect("valid");
        let result = project.select_factors(&catalog, Category::Environmental, &names);
        prop_assert!(matches!(result, Err(EssaError::FactorCount { .. })), "expected FactorCount error");
        prop_assert!(project.factors().in_category(Category::Environmental).is_empty());
    }

    /// Scores off the 1..=5 scale fail and leave the grid untouched.
    #[test]
    fn out_of_range_score_fails(score in prop_oneof![Just(0u8), 6u8..=255]) {
        let mut project = scored_project(1, &[3; 9]);
        let (stage, factor) = project
            .active_pairs()
            .map(|(s, f)| (s.clone(), f.clone()))
            .next()
            .expect("one pair");
        let before = project.clone();

        let result = project.set_score(&stage, &factor, score, "");
        prop_assert_eq!(result, Err(EssaError::InvalidScore(score)));
        prop_assert_eq!(project, before);
    }

    /// Repeated scoring of a pair keeps one entry holding the last score.
    #[test]
    fn overwrite_keeps_last(sequence in vec(1u8..=5, 1..20)) {
        let mut project = scored_project(1, &[3; 9]);
        let (stage, factor) = project
            .active_pairs()
            .map(|(s, f)| (s.clone(), f.clone()))
            .next()
            .expect("one pair");

        for score in &sequence {
            project.set_score(&stage, &factor, *score, "").expect("valid");
        }

        prop_assert_eq!(project.entries().len(), 9);
        prop_assert_eq!(project.grid().len(), 9);
        let last = sequence.last().copied();
        prop_assert_eq!(project.score(&stage, &factor).map(|c| c.score.value()), last);
    }

    /// Export, render, parse back: the rebuilt aggregates are identical.
    #[test]
    fn export_reimport_reconstructs_results((n, scores) in grid()) {
        let project = scored_project(n, &scores);
        let results = project.results().expect("complete");
        let table = export_results(&project).expect("complete");

        let from_csv = csv::from_csv(&csv::to_csv(&table)).expect("csv parses");
        prop_assert_eq!(&from_csv, &table);
        prop_assert_eq!(from_csv.verify().expect("consistent"), results.clone());

        let json = serde_json::to_string(&table).expect("json");
        let from_json: ResultsTable = serde_json::from_str(&json).expect("json parses");
        prop_assert_eq!(from_json.to_results().expect("summary"), results);
    }

    /// Dropping an entry row, or overwriting one with a copy of another,
    /// never survives verification or rebuilding.
    #[test]
    fn tampered_entries_are_rejected(
        (n, scores) in grid(),
        from in any::<Index>(),
        to in any::<Index>(),
        drop in any::<bool>(),
    ) {
        let project = scored_project(n, &scores);
        let mut table = export_results(&project).expect("complete");
        let entries: Vec<usize> = table
            .rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.kind == RowKind::Entry)
            .map(|(i, _)| i)
            .collect();

        let source = from.index(entries.len());
        if drop {
            table.rows.remove(entries[source]);
        } else {
            let mut target = to.index(entries.len());
            if target == source {
                target = (target + 1) % entries.len();
            }
            table.rows[entries[target]] = table.rows[entries[source]].clone();
        }

        prop_assert!(table.verify().is_err());
        prop_assert!(table.to_project(&Catalog::standard()).is_err());
        if let Ok(reparsed) = csv::from_csv(&csv::to_csv(&table)) {
            prop_assert!(reparsed.verify().is_err());
        }
    }
}
