//! Integration tests for the CLI commands.
//!
//! Each test works on a project file inside its own temporary directory.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use essa::cli::{
    StageCommand, StepCommand, cmd_export, cmd_factors, cmd_grid, cmd_hash, cmd_import, cmd_new,
    cmd_results, cmd_score, cmd_stages, cmd_status, cmd_step, cmd_trl, cmd_unscore, cmd_verify,
    load_session, save_session,
};
use essa_core::{Catalog, Category, ErrorKind, FactorName, StageName, Step};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn project_in(dir: &TempDir) -> PathBuf {
    dir.path().join("project.essa")
}

/// New project with "Use phase" changed, default factors and every pair scored 3,
/// except Use phase / Climate change which gets 5.
fn scored_project(path: &Path, catalog: &Catalog) {
    cmd_new(path, catalog, false, "Bio-based insulation", None, false).unwrap();
    cmd_trl(path, catalog, false, Some(4)).unwrap();
    cmd_stages(
        path,
        catalog,
        false,
        StageCommand::Mark {
            name: "Use phase".to_string(),
            unchanged: false,
            notes: Some("Only the use phase changes".to_string()),
        },
    )
    .unwrap();
    cmd_factors(path, catalog, false, true, None, &[]).unwrap();

    let session = load_session(path, catalog).unwrap();
    let factors: Vec<FactorName> = session
        .project()
        .active_factors()
        .into_iter()
        .map(|(_, f)| f)
        .collect();
    for factor in factors {
        let score = if factor.as_str() == "Climate change" { 5 } else { 3 };
        cmd_score(
            path,
            catalog,
            false,
            "Use phase",
            factor.as_str(),
            score,
            String::new(),
        )
        .unwrap();
    }
}

// =============================================================================
// NEW / LOAD
// =============================================================================

#[test]
fn test_new_creates_project_file() {
    let dir = TempDir::new().unwrap();
    let path = project_in(&dir);
    let catalog = Catalog::standard();

    cmd_new(&path, &catalog, false, "Hemp panels", Some("Walls".into()), false).unwrap();

    let session = load_session(&path, &catalog).unwrap();
    assert_eq!(session.project().name(), "Hemp panels");
    assert_eq!(session.project().description(), "Walls");
    assert_eq!(session.step(), Step::Trl);
}

#[test]
fn test_new_refuses_to_overwrite_without_force() {
    let dir = TempDir::new().unwrap();
    let path = project_in(&dir);
    let catalog = Catalog::standard();
    cmd_new(&path, &catalog, false, "First", None, false).unwrap();

    let err = cmd_new(&path, &catalog, false, "Second", None, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    cmd_new(&path, &catalog, false, "Second", None, true).unwrap();
    assert_eq!(load_session(&path, &catalog).unwrap().project().name(), "Second");
}

#[test]
fn test_missing_project_is_not_found() {
    let dir = TempDir::new().unwrap();
    let catalog = Catalog::standard();

    let err = cmd_status(&project_in(&dir), &catalog, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_json_project_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("project.json");
    let catalog = Catalog::standard();

    cmd_new(&path, &catalog, false, "Readable", None, false).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"Readable\""));

    cmd_trl(&path, &catalog, false, Some(2)).unwrap();
    let session = load_session(&path, &catalog).unwrap();
    assert_eq!(session.project().trl().map(|t| t.value()), Some(2));
}

#[test]
fn test_garbage_project_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = project_in(&dir);
    std::fs::write(&path, b"not a project").unwrap();
    let catalog = Catalog::standard();

    let err = load_session(&path, &catalog).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn test_edited_json_project_with_extra_factor_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("project.json");
    let catalog = Catalog::standard();
    cmd_new(&path, &catalog, false, "Edited", None, false).unwrap();
    cmd_factors(&path, &catalog, false, true, None, &[]).unwrap();

    let mut json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    json["project"]["factors"]["Environmental"]
        .as_array_mut()
        .unwrap()
        .push(serde_json::json!("Not a catalog factor"));
    std::fs::write(&path, serde_json::to_string(&json).unwrap()).unwrap();

    let err = load_session(&path, &catalog).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn test_edited_json_project_with_unknown_factor_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("project.json");
    let catalog = Catalog::standard();
    cmd_new(&path, &catalog, false, "Edited", None, false).unwrap();
    cmd_factors(&path, &catalog, false, true, None, &[]).unwrap();

    let mut json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    json["project"]["factors"]["Environmental"][0] = serde_json::json!("Not a catalog factor");
    std::fs::write(&path, serde_json::to_string(&json).unwrap()).unwrap();

    let err = load_session(&path, &catalog).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(cmd_status(&path, &catalog, false).is_err());
}

// =============================================================================
// WIZARD STEPS
// =============================================================================

#[test]
fn test_invalid_trl_leaves_project_unchanged() {
    let dir = TempDir::new().unwrap();
    let path = project_in(&dir);
    let catalog = Catalog::standard();
    cmd_new(&path, &catalog, false, "Trl", None, false).unwrap();

    let err = cmd_trl(&path, &catalog, false, Some(0)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(load_session(&path, &catalog).unwrap().project().trl().is_none());
}

#[test]
fn test_stage_editing() {
    let dir = TempDir::new().unwrap();
    let path = project_in(&dir);
    let catalog = Catalog::standard();
    cmd_new(&path, &catalog, false, "Stages", None, false).unwrap();

    cmd_stages(&path, &catalog, false, StageCommand::Remove { name: "Use phase".into() }).unwrap();
    cmd_stages(&path, &catalog, false, StageCommand::Add { name: "Second life".into() }).unwrap();
    cmd_stages(
        &path,
        &catalog,
        false,
        StageCommand::Rename {
            from: "Second life".into(),
            to: "Reuse".into(),
        },
    )
    .unwrap();
    cmd_stages(&path, &catalog, false, StageCommand::Up { name: "Reuse".into() }).unwrap();

    let session = load_session(&path, &catalog).unwrap();
    let names: Vec<&str> = session
        .project()
        .scoping()
        .stages()
        .iter()
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(names.len(), 7);
    assert_eq!(names[5], "Reuse");
    assert!(!names.contains(&"Use phase"));

    cmd_stages(&path, &catalog, false, StageCommand::Reset).unwrap();
    let session = load_session(&path, &catalog).unwrap();
    assert_eq!(
        session.project().scoping().stages().len(),
        catalog.default_stages.len()
    );
}

#[test]
fn test_eighth_stage_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = project_in(&dir);
    let catalog = Catalog::standard();
    cmd_new(&path, &catalog, false, "Full", None, false).unwrap();

    let err = cmd_stages(&path, &catalog, false, StageCommand::Add { name: "Extra".into() })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn test_factor_selection_by_category() {
    let dir = TempDir::new().unwrap();
    let path = project_in(&dir);
    let catalog = Catalog::standard();
    cmd_new(&path, &catalog, false, "Factors", None, false).unwrap();

    let picks = ["Climate change", "Water use", "Land Use"].map(String::from);
    cmd_factors(&path, &catalog, false, false, Some("env"), &picks).unwrap();

    let session = load_session(&path, &catalog).unwrap();
    let selected = session.project().factors().in_category(Category::Environmental);
    assert_eq!(selected.len(), 3);
    assert!(selected.contains(&FactorName::new("Land Use").unwrap()));

    let err = cmd_factors(&path, &catalog, false, false, Some("env"), &picks[..2]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn test_scoring_inactive_stage_fails() {
    let dir = TempDir::new().unwrap();
    let path = project_in(&dir);
    let catalog = Catalog::standard();
    cmd_new(&path, &catalog, false, "Inactive", None, false).unwrap();
    cmd_factors(&path, &catalog, false, true, None, &[]).unwrap();

    let err = cmd_score(
        &path,
        &catalog,
        false,
        "Use phase",
        "Climate change",
        3,
        String::new(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn test_unscore_reopens_the_grid() {
    let dir = TempDir::new().unwrap();
    let path = project_in(&dir);
    let catalog = Catalog::standard();
    scored_project(&path, &catalog);
    assert!(load_session(&path, &catalog).unwrap().project().is_complete());

    cmd_unscore(&path, &catalog, false, "Use phase", "Climate change").unwrap();

    let session = load_session(&path, &catalog).unwrap();
    assert_eq!(
        session.project().missing_pairs(),
        vec![(
            StageName::new("Use phase").unwrap(),
            FactorName::new("Climate change").unwrap()
        )]
    );
    assert!(cmd_results(&path, &catalog, false).unwrap_err().is_incomplete());
}

#[test]
fn test_unscore_in_json_mode() {
    let dir = TempDir::new().unwrap();
    let path = project_in(&dir);
    let catalog = Catalog::standard();
    scored_project(&path, &catalog);

    cmd_unscore(&path, &catalog, true, "Use phase", "Climate change").unwrap();
    cmd_unscore(&path, &catalog, true, "Use phase", "Climate change").unwrap();

    let session = load_session(&path, &catalog).unwrap();
    assert_eq!(session.project().missing_pairs().len(), 1);
}

#[test]
fn test_step_navigation_is_saved() {
    let dir = TempDir::new().unwrap();
    let path = project_in(&dir);
    let catalog = Catalog::standard();
    cmd_new(&path, &catalog, false, "Steps", None, false).unwrap();

    cmd_step(&path, &catalog, false, StepCommand::Next).unwrap();
    cmd_step(&path, &catalog, false, StepCommand::Next).unwrap();
    assert_eq!(load_session(&path, &catalog).unwrap().step(), Step::Factors);

    cmd_step(&path, &catalog, false, StepCommand::Back).unwrap();
    assert_eq!(load_session(&path, &catalog).unwrap().step(), Step::Scoping);
}

// =============================================================================
// RESULTS / EXPORT / IMPORT
// =============================================================================

#[test]
fn test_results_and_grid_of_complete_project() {
    let dir = TempDir::new().unwrap();
    let path = project_in(&dir);
    let catalog = Catalog::standard();
    scored_project(&path, &catalog);

    cmd_grid(&path, &catalog, false).unwrap();
    cmd_grid(&path, &catalog, true).unwrap();
    cmd_results(&path, &catalog, false).unwrap();
    cmd_results(&path, &catalog, true).unwrap();
    cmd_hash(&path, &catalog, true).unwrap();

    let session = load_session(&path, &catalog).unwrap();
    let overall = session.project().overall_score().unwrap();
    // eight 3s and one 5 over nine factors
    assert_eq!(overall.to_string(), "3.22");
}

#[test]
fn test_export_verify_import_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = project_in(&dir);
    let catalog = Catalog::standard();
    scored_project(&path, &catalog);

    for (file, format) in [("results.csv", "csv"), ("results.json", "json")] {
        let output = dir.path().join(file);
        cmd_export(&path, &catalog, &output, format).unwrap();
        cmd_verify(&output, false).unwrap();

        let imported = dir.path().join(format!("imported-{}.essa", format));
        cmd_import(&imported, &catalog, &output, false).unwrap();

        let original = load_session(&path, &catalog).unwrap();
        let rebuilt = load_session(&imported, &catalog).unwrap();
        assert_eq!(rebuilt.step(), Step::Results);
        assert_eq!(rebuilt.project().trl(), original.project().trl());
        assert_eq!(
            rebuilt.project().results().unwrap(),
            original.project().results().unwrap()
        );
    }
}

#[test]
fn test_export_rejects_unknown_format() {
    let dir = TempDir::new().unwrap();
    let path = project_in(&dir);
    let catalog = Catalog::standard();
    scored_project(&path, &catalog);

    let err = cmd_export(&path, &catalog, &dir.path().join("out.xml"), "xml").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn test_verify_detects_tampering() {
    let dir = TempDir::new().unwrap();
    let path = project_in(&dir);
    let catalog = Catalog::standard();
    scored_project(&path, &catalog);

    let output = dir.path().join("results.csv");
    cmd_export(&path, &catalog, &output, "csv").unwrap();
    let text = std::fs::read_to_string(&output).unwrap();
    // Overall goes from 29/9 to 30/9 without touching the entries.
    let tampered = text.replace(",29,9,3.22,", ",30,9,3.33,");
    assert_ne!(tampered, text);
    std::fs::write(&output, tampered).unwrap();

    assert!(cmd_verify(&output, false).is_err());
}

#[test]
fn test_import_refuses_existing_project() {
    let dir = TempDir::new().unwrap();
    let path = project_in(&dir);
    let catalog = Catalog::standard();
    scored_project(&path, &catalog);
    let output = dir.path().join("results.csv");
    cmd_export(&path, &catalog, &output, "csv").unwrap();

    let err = cmd_import(&path, &catalog, &output, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[test]
fn test_save_and_load_preserve_session() {
    let dir = TempDir::new().unwrap();
    let path = project_in(&dir);
    let catalog = Catalog::standard();
    scored_project(&path, &catalog);

    let session = load_session(&path, &catalog).unwrap();
    let copy = dir.path().join("copy.essa");
    save_session(&session, &copy).unwrap();

    assert_eq!(load_session(&copy, &catalog).unwrap(), session);
}
