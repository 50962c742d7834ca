//! # essa-core
//!
//! The assessment model for ESSA (Early-Stage Sustainability Assessment) -
//! THE LOGIC.
//!
//! A guided five-step questionnaire for a new material or product:
//! 1. Technology Readiness Level
//! 2. Lifecycle scoping (which stages change)
//! 3. Factor selection (three per Environmental / Social / Economic)
//! 4. Scoring grid (stage x factor, 1 = Much Better .. 5 = Much Worse)
//! 5. Results (stage and factor averages, worst stage, overall score)
//!
//! ## Architectural Constraints
//!
//! The CORE:
//! - Has NO async, NO network, NO logging dependencies (pure Rust)
//! - Uses integer arithmetic only; averages are exact rationals
//! - Uses `BTreeMap` everywhere for deterministic ordering
//! - Never panics on user input; every operation returns `Result`
//! - Holds no global state: projects and sessions are passed explicitly

// =============================================================================
// MODULES
// =============================================================================

pub mod export;
pub mod factors;
pub mod formats;
pub mod grid;
pub mod primitives;
pub mod project;
pub mod reference;
pub mod results;
pub mod score;
pub mod scoping;
pub mod session;
pub mod types;
pub mod wizard;
pub mod workspace;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{Category, ErrorKind, EssaError, FactorName, StageName, TrlLevel};

// =============================================================================
// RE-EXPORTS: Assessment Model
// =============================================================================

pub use factors::FactorSelection;
pub use grid::{Cell, ScoreEntry, ScoreGrid};
pub use project::{Project, ScopingWarning};
pub use reference::{Catalog, FactorInfo, TrlInfo};
pub use results::{FactorAverage, Results, StageAverage, WorstStages};
pub use score::{Mean, Score, ScoreLabel};
pub use scoping::{LifecycleStage, Scoping};

// =============================================================================
// RE-EXPORTS: Wizard & Sessions
// =============================================================================

pub use session::Session;
pub use wizard::{
    FactorForm, ScoreForm, ScoreInput, ScopingForm, StageToggle, Step, StepForm, StepStatus,
    TrlForm, Wizard,
};
pub use workspace::Workspace;

// =============================================================================
// RE-EXPORTS: Export & Formats
// =============================================================================

pub use export::{ResultRow, ResultsTable, RowKind, export_results};
pub use formats::{SnapshotHeader, session_from_bytes, session_to_bytes};
