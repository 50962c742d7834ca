//! # Assessment Primitives
//!
//! Hardcoded constants for the ESSA CORE.
//!
//! These are compiled into the binary and are immutable at runtime. The
//! reference catalog may change factor names and texts, but never these
//! bounds.

/// Lowest Technology Readiness Level.
pub const MIN_TRL: u8 = 1;

/// Highest Technology Readiness Level.
pub const MAX_TRL: u8 = 9;

/// Best score on the legend ("Much Better").
pub const MIN_SCORE: u8 = 1;

/// Worst score on the legend ("Much Worse").
pub const MAX_SCORE: u8 = 5;

/// Number of factors that must be selected in every category.
pub const FACTORS_PER_CATEGORY: usize = 3;

/// Maximum number of lifecycle stages in a project.
pub const MAX_LIFECYCLE_STAGES: usize = 7;

/// Magic bytes for the ESSA session snapshot header.
///
/// - File Header = Magic Bytes ("ESSA") + Version (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"ESSA";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the snapshot format.
pub const FORMAT_VERSION: u8 = 1;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length for stage, factor and project names.
pub const MAX_NAME_LENGTH: usize = 256;

/// Maximum length for a free-text note or description (64KB).
pub const MAX_NOTE_LENGTH: usize = 65536;
