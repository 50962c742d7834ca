//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//! Each command loads the project snapshot, applies its change through the
//! core, and writes the snapshot back.

use super::{StageCommand, StepCommand};
use crate::api::{self, AppState, ResultsResponse};
use crate::config::ServerConfig;
use essa_core::{
    Catalog, Category, EssaError, FactorForm, FactorName, Project,
    ResultsTable, Score, ScoreForm, ScoreInput, ScoreLabel, ScopingForm, Session, SnapshotHeader,
    StageName, StageToggle, StepForm, TrlForm, TrlLevel, Workspace, export_results,
    formats::{MAX_SNAPSHOT_SIZE, csv},
    session_from_bytes, session_to_bytes,
};
use std::path::{Path, PathBuf};
use std::str::FromStr;

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum size of an exported results table accepted by `verify`/`import` (16 MB).
const MAX_TABLE_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), EssaError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| EssaError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(EssaError::DeserializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an input path and make sure it is a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, EssaError> {
    let canonical = path.canonicalize().map_err(|e| {
        EssaError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(EssaError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve an output path against an existing parent directory.
fn validate_output_path(path: &Path) -> Result<PathBuf, EssaError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        EssaError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(EssaError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| EssaError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// NEW COMMAND
// =============================================================================

/// Start a new assessment.
pub fn cmd_new(
    project_path: &Path,
    catalog: &Catalog,
    json_mode: bool,
    name: &str,
    description: Option<String>,
    force: bool,
) -> Result<(), EssaError> {
    if project_path.exists() && !force {
        return Err(EssaError::ProjectExists(format!(
            "{} (use --force to overwrite)",
            project_path.display()
        )));
    }

    let mut session = Session::new(name, catalog)?;
    if let Some(description) = description {
        session.project_mut().set_description(description)?;
    }
    save_session(&session, project_path)?;
    tracing::info!(project = %session.project().name(), "Project created");

    if json_mode {
        print_json(&serde_json::json!({
            "project": session.project().name(),
            "file": project_path.to_string_lossy(),
            "step": session.step(),
        }));
        return Ok(());
    }

    println!("Created project '{}' at {:?}", session.project().name(), project_path);
    println!("Next: {}", session.step());
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show wizard progress.
pub fn cmd_status(project_path: &Path, catalog: &Catalog, json_mode: bool) -> Result<(), EssaError> {
    let session = load_session(project_path, catalog)?;
    let project = session.project();
    let status = session.status();
    let missing = project.missing_pairs().len();
    let warnings: Vec<&str> = project.scoping_warnings().iter().map(|w| w.message()).collect();

    if json_mode {
        print_json(&serde_json::json!({
            "project": project.name(),
            "description": project.description(),
            "trl": project.trl().map(TrlLevel::value),
            "step": session.step(),
            "status": status,
            "active_stages": project.active_stages().len(),
            "stages": project.scoping().stages().len(),
            "scored": project.entries().len(),
            "missing": missing,
            "warnings": warnings,
        }));
        return Ok(());
    }

    println!("ESSA Project Status");
    println!("===================");
    println!("Project: {}", project.name());
    if !project.description().is_empty() {
        println!("About:   {}", project.description());
    }
    match project.trl_info(catalog) {
        Some(info) => println!("TRL:     {} - {}", info.level.value(), info.definition),
        None => println!("TRL:     not selected"),
    }
    println!();
    for entry in &status {
        let marker = if entry.complete { "x" } else { " " };
        let pointer = if entry.current { "<" } else { "" };
        println!("  [{}] {} {}", marker, entry.step, pointer);
    }
    println!();
    println!(
        "Stages: {} of {} changed",
        project.active_stages().len(),
        project.scoping().stages().len()
    );
    println!("Scored: {} ({} missing)", project.entries().len(), missing);
    for warning in warnings {
        println!("Warning: {}", warning);
    }
    Ok(())
}

// =============================================================================
// STEP 1: TRL
// =============================================================================

/// Show the TRL table, or select a level.
pub fn cmd_trl(
    project_path: &Path,
    catalog: &Catalog,
    json_mode: bool,
    level: Option<u8>,
) -> Result<(), EssaError> {
    let Some(level) = level else {
        if json_mode {
            print_json(&serde_json::json!({ "trl_levels": catalog.trl_levels }));
            return Ok(());
        }
        println!("Technology Readiness Levels");
        println!("===========================");
        for info in &catalog.trl_levels {
            println!("  {} - {}", info.level.value(), info.definition);
            println!("      Actors: {}", info.actors_line());
        }
        return Ok(());
    };

    let mut session = load_session(project_path, catalog)?;
    let form = StepForm::Trl(TrlForm {
        level: TrlLevel::new(level)?,
    });
    session.apply(catalog, &form)?;
    save_session(&session, project_path)?;

    let info = session
        .project()
        .trl_info(catalog)
        .ok_or(EssaError::UnknownTrl(level))?;

    if json_mode {
        print_json(&serde_json::json!({
            "level": level,
            "definition": info.definition,
            "actors": info.actors,
        }));
        return Ok(());
    }

    println!("TRL {}: {}", level, info.definition);
    println!("Actors to engage: {}", info.actors_line());
    Ok(())
}

// =============================================================================
// STEP 2: LIFECYCLE STAGES
// =============================================================================

/// Edit and scope lifecycle stages.
pub fn cmd_stages(
    project_path: &Path,
    catalog: &Catalog,
    json_mode: bool,
    action: StageCommand,
) -> Result<(), EssaError> {
    let mut session = load_session(project_path, catalog)?;

    let changed = match action {
        StageCommand::List => false,
        StageCommand::Add { name } => {
            session.project_mut().add_stage(StageName::new(name)?)?;
            true
        }
        StageCommand::Rename { from, to } => {
            session
                .project_mut()
                .rename_stage(&StageName::new(from)?, StageName::new(to)?)?;
            true
        }
        StageCommand::Remove { name } => {
            let removed = session.project_mut().remove_stage(&StageName::new(name)?)?;
            tracing::debug!(stage = %removed.name, "Stage removed");
            true
        }
        StageCommand::Up { name } => {
            session.project_mut().move_stage_up(&StageName::new(name)?)?;
            true
        }
        StageCommand::Reset => {
            session.project_mut().reset_stages(catalog)?;
            true
        }
        StageCommand::Mark {
            name,
            unchanged,
            notes,
        } => {
            let form = StepForm::Scoping(ScopingForm {
                stages: vec![StageToggle {
                    name: StageName::new(name)?,
                    changed: !unchanged,
                }],
                notes,
                ..ScopingForm::default()
            });
            session.apply(catalog, &form)?;
            true
        }
    };

    if changed {
        save_session(&session, project_path)?;
    }

    let project = session.project();
    let warnings: Vec<&str> = project.scoping_warnings().iter().map(|w| w.message()).collect();

    if json_mode {
        print_json(&serde_json::json!({
            "stages": project.scoping().stages(),
            "notes": project.notes(),
            "warnings": warnings,
        }));
        return Ok(());
    }

    println!("Lifecycle Stages");
    println!("================");
    for (i, stage) in project.scoping().stages().iter().enumerate() {
        let marker = if stage.changed { "x" } else { " " };
        println!("  {}. [{}] {}", i + 1, marker, stage.name);
    }
    if !project.notes().is_empty() {
        println!();
        println!("Notes: {}", project.notes());
    }
    for warning in warnings {
        println!("Warning: {}", warning);
    }
    Ok(())
}

// =============================================================================
// STEP 3: FACTORS
// =============================================================================

/// Select factors, or show the current selection.
pub fn cmd_factors(
    project_path: &Path,
    catalog: &Catalog,
    json_mode: bool,
    defaults: bool,
    category: Option<&str>,
    factors: &[String],
) -> Result<(), EssaError> {
    let mut session = load_session(project_path, catalog)?;

    if category.is_none() && !factors.is_empty() {
        return Err(EssaError::UnknownCategory(
            "--factor requires --category".to_string(),
        ));
    }

    let mut draft = session.project().clone();
    if defaults {
        draft.select_default_factors(catalog);
    }
    if let Some(category) = category {
        let form = FactorForm {
            category: Category::from_str(category)?,
            factors: factors
                .iter()
                .map(FactorName::new)
                .collect::<Result<Vec<_>, _>>()?,
        };
        form.apply(&mut draft, catalog)?;
    }
    if defaults || category.is_some() {
        *session.project_mut() = draft;
        save_session(&session, project_path)?;
    }

    let project = session.project();
    if json_mode {
        let selection: Vec<_> = Category::ALL
            .iter()
            .map(|c| {
                serde_json::json!({
                    "category": c,
                    "selected": project.factors().in_category(*c),
                })
            })
            .collect();
        print_json(&serde_json::json!({ "factors": selection }));
        return Ok(());
    }

    for category in Category::ALL {
        println!("{} factors", category);
        let selected = project.factors().in_category(category);
        for info in catalog.factors_in(category) {
            let marker = if selected.contains(&info.name) { "x" } else { " " };
            if info.unit.is_empty() {
                println!("  [{}] {}", marker, info.name);
            } else {
                println!("  [{}] {} ({})", marker, info.name, info.unit);
            }
        }
        println!();
    }
    Ok(())
}

// =============================================================================
// STEP 4: SCORING
// =============================================================================

/// Score one stage/factor pair.
pub fn cmd_score(
    project_path: &Path,
    catalog: &Catalog,
    json_mode: bool,
    stage: &str,
    factor: &str,
    score: u8,
    note: String,
) -> Result<(), EssaError> {
    let mut session = load_session(project_path, catalog)?;
    let input = ScoreInput {
        stage: StageName::new(stage)?,
        factor: FactorName::new(factor)?,
        score: Score::new(score)?,
        note,
    };
    let label = input.score.label();
    session.apply(
        catalog,
        &StepForm::Scores(ScoreForm {
            scores: vec![input],
        }),
    )?;
    save_session(&session, project_path)?;

    let missing = session.project().missing_pairs().len();
    if json_mode {
        print_json(&serde_json::json!({
            "stage": stage.trim(),
            "factor": factor.trim(),
            "score": score,
            "label": label,
            "missing": missing,
        }));
        return Ok(());
    }

    println!("{} / {}: {} ({})", stage.trim(), factor.trim(), score, label);
    println!("{} pairs left to score", missing);
    Ok(())
}

/// Remove the score of one pair.
pub fn cmd_unscore(
    project_path: &Path,
    catalog: &Catalog,
    json_mode: bool,
    stage: &str,
    factor: &str,
) -> Result<(), EssaError> {
    let mut session = load_session(project_path, catalog)?;
    let cleared = session
        .project_mut()
        .clear_score(&StageName::new(stage)?, &FactorName::new(factor)?);
    if cleared.is_some() {
        save_session(&session, project_path)?;
    }

    if json_mode {
        print_json(&serde_json::json!({
            "stage": stage.trim(),
            "factor": factor.trim(),
            "cleared": cleared.as_ref().map(|cell| cell.score.value()),
        }));
        return Ok(());
    }

    match cleared {
        Some(cell) => println!(
            "Cleared {} / {} (was {})",
            stage.trim(),
            factor.trim(),
            cell.score
        ),
        None => println!("{} / {} has no score", stage.trim(), factor.trim()),
    }
    Ok(())
}

/// Show the grid of active stages by selected factors.
pub fn cmd_grid(project_path: &Path, catalog: &Catalog, json_mode: bool) -> Result<(), EssaError> {
    let session = load_session(project_path, catalog)?;
    let project = session.project();
    let stages = project.active_stages();
    let factors = project.active_factors();

    let cell = |stage: &StageName, factor: &FactorName| {
        project.score(stage, factor).map(|c| c.score.value())
    };

    if json_mode {
        let rows: Vec<_> = stages
            .iter()
            .map(|stage| {
                let scores: Vec<Option<u8>> = factors.iter().map(|(_, f)| cell(stage, f)).collect();
                serde_json::json!({ "stage": stage, "scores": scores })
            })
            .collect();
        let names: Vec<&FactorName> = factors.iter().map(|(_, f)| f).collect();
        print_json(&serde_json::json!({ "factors": names, "rows": rows }));
        return Ok(());
    }

    if stages.is_empty() {
        println!("No stage is marked as changed. Use `essa stages mark <name>`.");
        return Ok(());
    }

    println!("Factors:");
    for (i, (category, factor)) in factors.iter().enumerate() {
        println!("  F{} {} ({})", i + 1, factor, category);
    }
    println!();

    let header: Vec<String> = (1..=factors.len()).map(|i| format!("F{}", i)).collect();
    println!("{:<40} {}", "Stage", header.join("  "));
    for stage in &stages {
        let cells: Vec<String> = factors
            .iter()
            .map(|(_, f)| match cell(stage, f) {
                Some(score) => format!("{:<2}", score),
                None => "- ".to_string(),
            })
            .collect();
        println!("{:<40} {}", stage.as_str(), cells.join("  "));
    }
    Ok(())
}

// =============================================================================
// STEP 5: RESULTS
// =============================================================================

/// Show averages, the worst stage(s) and the overall score.
pub fn cmd_results(project_path: &Path, catalog: &Catalog, json_mode: bool) -> Result<(), EssaError> {
    let session = load_session(project_path, catalog)?;
    let response = ResultsResponse::new(session.project())?;

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&response).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Results: {}", response.project);
    println!("========");
    println!();
    println!("Average by lifecycle stage:");
    for stage in &response.by_stage {
        println!("  {:<40} {}  {}", stage.name, stage.average, stage.label);
    }
    println!();
    println!("Average by factor:");
    for factor in &response.by_factor {
        println!("  {:<40} {}  {}", factor.name, factor.average, factor.label);
    }
    println!();
    if response.worst_stages.len() > 1 {
        println!(
            "Worst stages (tied at {}): {}",
            response.worst_average,
            response.worst_stages.join(", ")
        );
    } else {
        println!(
            "Worst stage: {} ({})",
            response.worst_stages.join(", "),
            response.worst_average
        );
    }
    println!(
        "Overall score: {} ({})",
        response.overall.average, response.overall.label
    );
    if !response.breakdown.is_empty() {
        println!();
        println!("Breakdown of {}:", response.worst_stages.join(", "));
        for entry in &response.breakdown {
            if entry.note.is_empty() {
                println!("  {:<40} {}  {}", entry.factor, entry.score, entry.label);
            } else {
                println!(
                    "  {:<40} {}  {}  - {}",
                    entry.factor, entry.score, entry.label, entry.note
                );
            }
        }
    }
    Ok(())
}

// =============================================================================
// EXPORT / VERIFY / IMPORT
// =============================================================================

/// Write the results table.
pub fn cmd_export(
    project_path: &Path,
    catalog: &Catalog,
    output: &Path,
    format: &str,
) -> Result<(), EssaError> {
    let validated_output = validate_output_path(output)?;
    let session = load_session(project_path, catalog)?;
    let table = export_results(session.project())?;

    let data = match format {
        "csv" => csv::to_csv(&table).into_bytes(),
        "json" => serde_json::to_vec_pretty(&table)
            .map_err(|e| EssaError::SerializationError(e.to_string()))?,
        _ => {
            return Err(EssaError::SerializationError(format!(
                "Unknown format: {}. Use: csv, json",
                format
            )));
        }
    };

    std::fs::write(&validated_output, &data)
        .map_err(|e| EssaError::IoError(format!("Write file: {}", e)))?;

    println!("Checksum: {:016x}", table.checksum());
    println!("Exported {} bytes to {:?}", data.len(), validated_output);
    Ok(())
}

/// Read an exported table, CSV or JSON.
pub fn read_table(input: &Path) -> Result<ResultsTable, EssaError> {
    let validated_path = validate_file_path(input)?;
    validate_file_size(&validated_path, MAX_TABLE_FILE_SIZE)?;

    let text = std::fs::read_to_string(&validated_path)
        .map_err(|e| EssaError::IoError(format!("Read file: {}", e)))?;

    if text.trim_start().starts_with('{') {
        serde_json::from_str(&text).map_err(|e| EssaError::DeserializationError(e.to_string()))
    } else {
        csv::from_csv(&text)
    }
}

/// Check an exported table against its own entries.
pub fn cmd_verify(input: &Path, json_mode: bool) -> Result<(), EssaError> {
    let table = read_table(input)?;
    let results = table.verify()?;

    if json_mode {
        print_json(&serde_json::json!({
            "valid": true,
            "project": table.project,
            "rows": table.rows.len(),
            "overall": results.overall.to_string(),
            "checksum": format!("{:016x}", table.checksum()),
        }));
        return Ok(());
    }

    println!("Table for '{}' is consistent", table.project);
    println!("Rows:     {}", table.rows.len());
    println!("Overall:  {} ({})", results.overall, results.overall.label());
    println!("Checksum: {:016x}", table.checksum());
    Ok(())
}

/// Rebuild a project from an exported table. The wizard opens on the results.
pub fn cmd_import(
    project_path: &Path,
    catalog: &Catalog,
    input: &Path,
    force: bool,
) -> Result<(), EssaError> {
    if project_path.exists() && !force {
        return Err(EssaError::ProjectExists(format!(
            "{} (use --force to overwrite)",
            project_path.display()
        )));
    }

    let table = read_table(input)?;
    let project: Project = table.to_project(catalog)?;
    let mut session = Session::with_project(project);
    while !session.step().is_terminal() {
        session.advance();
    }
    save_session(&session, project_path)?;

    println!(
        "Imported '{}': {} stages, {} scores",
        session.project().name(),
        session.project().active_stages().len(),
        session.project().entries().len()
    );
    Ok(())
}

// =============================================================================
// NAVIGATION
// =============================================================================

/// Move the wizard one step.
pub fn cmd_step(
    project_path: &Path,
    catalog: &Catalog,
    json_mode: bool,
    direction: StepCommand,
) -> Result<(), EssaError> {
    let mut session = load_session(project_path, catalog)?;
    let step = match direction {
        StepCommand::Next => session.advance(),
        StepCommand::Back => session.back(),
    };
    save_session(&session, project_path)?;

    if json_mode {
        print_json(&serde_json::json!({ "step": step, "title": step.title() }));
        return Ok(());
    }

    println!("{}", step);
    if !step.is_complete(session.project()) {
        println!("(not complete yet)");
    }
    Ok(())
}

// =============================================================================
// CATALOG & HASH
// =============================================================================

/// Show the reference tables.
pub fn cmd_catalog(
    catalog: &Catalog,
    json_mode: bool,
    category: Option<&str>,
) -> Result<(), EssaError> {
    let categories = match category {
        Some(c) => vec![Category::from_str(c)?],
        None => Category::ALL.to_vec(),
    };

    if json_mode {
        let factors: Vec<_> = catalog
            .factors
            .iter()
            .filter(|f| categories.contains(&f.category))
            .collect();
        let legend: Vec<_> = ScoreLabel::ALL
            .iter()
            .map(|l| {
                serde_json::json!({
                    "score": l.upper(),
                    "label": l.name(),
                    "explanation": l.explanation(),
                })
            })
            .collect();
        print_json(&serde_json::json!({
            "factors": factors,
            "default_stages": catalog.default_stages,
            "legend": legend,
        }));
        return Ok(());
    }

    for category in categories {
        println!("{} factors", category);
        for info in catalog.factors_in(category) {
            let marker = if info.default_selected { "*" } else { " " };
            println!(" {} {}", marker, info.name);
            if !info.explanation.is_empty() {
                println!("     {}", info.explanation);
            }
        }
        println!();
    }

    println!("Default lifecycle:");
    for (i, stage) in catalog.default_stages.iter().enumerate() {
        println!("  {}. {}", i + 1, stage);
    }
    println!();
    println!("Scoring legend:");
    for label in ScoreLabel::ALL {
        println!("  {} {:<12} {}", label.upper(), label.name(), label.explanation());
    }
    Ok(())
}

/// Checksum and BLAKE3 hash of the results table.
pub fn cmd_hash(project_path: &Path, catalog: &Catalog, json_mode: bool) -> Result<(), EssaError> {
    let session = load_session(project_path, catalog)?;
    let table = export_results(session.project())?;
    let checksum = format!("{:016x}", table.checksum());
    let blake3 = table.blake3_hash();

    if json_mode {
        print_json(&serde_json::json!({
            "project": table.project,
            "checksum": checksum,
            "blake3": blake3,
        }));
        return Ok(());
    }

    println!("Checksum (FNV-1a): {}", checksum);
    println!("BLAKE3:            {}", blake3);
    Ok(())
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server. The project file, if present, is loaded into the
/// workspace.
pub async fn cmd_server(
    project_path: &Path,
    catalog: Catalog,
    config: ServerConfig,
) -> Result<(), EssaError> {
    let mut workspace = Workspace::new();
    if project_path.exists() {
        let session = load_session(project_path, &catalog)?;
        tracing::info!(project = %session.project().name(), "Loaded project into workspace");
        workspace.import(session, false)?;
    }

    println!("ESSA Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", config.host);
    println!("  Port:     {}", config.port);
    println!("  Projects: {}", workspace.len());
    println!();
    println!("Endpoints:");
    println!("  GET    /health                    - Health check");
    println!("  GET    /catalog                   - Reference tables");
    println!("  GET    /projects                  - List projects");
    println!("  POST   /projects                  - Create a project");
    println!("  GET    /projects/{{name}}           - Project view");
    println!("  DELETE /projects/{{name}}           - Delete a project");
    println!("  POST   /projects/{{name}}/trl       - Step 1");
    println!("  POST   /projects/{{name}}/scoping   - Step 2");
    println!("  POST   /projects/{{name}}/factors   - Step 3");
    println!("  POST   /projects/{{name}}/scores    - Step 4");
    println!("  POST   /projects/{{name}}/step      - Navigate");
    println!("  GET    /projects/{{name}}/results   - Step 5");
    println!("  GET    /projects/{{name}}/export    - Download results");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(AppState::new(workspace, catalog), &config).await
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Load a session from a project file (binary snapshot or JSON).
pub fn load_session(project_path: &Path, catalog: &Catalog) -> Result<Session, EssaError> {
    if !project_path.exists() {
        return Err(EssaError::ProjectNotFound(format!(
            "{} (run `essa new <name>` first)",
            project_path.display()
        )));
    }
    let validated_path = validate_file_path(project_path)?;
    validate_file_size(&validated_path, MAX_SNAPSHOT_SIZE as u64)?;

    let data = std::fs::read(&validated_path)
        .map_err(|e| EssaError::IoError(format!("Read project: {}", e)))?;

    // Try the binary snapshot first, then JSON
    let session = match session_from_bytes(&data) {
        Ok(session) => session,
        Err(snapshot_error) => serde_json::from_slice::<Session>(&data).map_err(|json_error| {
            tracing::debug!(%json_error, "Project file is not JSON either");
            if data.starts_with(&SnapshotHeader::new().magic) {
                snapshot_error
            } else {
                EssaError::DeserializationError(json_error.to_string())
            }
        })?,
    };

    session.validate(catalog)?;
    Ok(session)
}

/// Save a session. A `.json` extension writes JSON, anything else a binary snapshot.
pub fn save_session(session: &Session, project_path: &Path) -> Result<(), EssaError> {
    let is_json = project_path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let data = if is_json {
        serde_json::to_vec_pretty(session)
            .map_err(|e| EssaError::SerializationError(e.to_string()))?
    } else {
        session_to_bytes(session)?
    };

    std::fs::write(project_path, &data)
        .map_err(|e| EssaError::IoError(format!("Write project: {}", e)))
}
