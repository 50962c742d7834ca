//! # Core Type Definitions
//!
//! This module contains the small value types shared by every part of the
//! assessment model:
//! - Names (`StageName`, `FactorName`)
//! - Classification (`Category`, `TrlLevel`)
//! - Error types (`EssaError`, `ErrorKind`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (no floating-point)
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`
//! - Validate on construction, including when deserialized

use crate::primitives::{MAX_NAME_LENGTH, MAX_TRL, MIN_TRL};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// NAMES
// =============================================================================

/// Validate a user-supplied name and return its trimmed form.
pub(crate) fn validated_name(raw: &str) -> Result<String, EssaError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EssaError::EmptyName);
    }
    if trimmed.len() > MAX_NAME_LENGTH {
        return Err(EssaError::NameTooLong {
            length: trimmed.len(),
            max: MAX_NAME_LENGTH,
        });
    }
    Ok(trimmed.to_string())
}

/// Name of a lifecycle stage ("Use phase", "End-of-life ...").
///
/// Always non-empty and trimmed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StageName(String);

impl StageName {
    /// Create a stage name, rejecting empty or oversized input.
    pub fn new(name: impl AsRef<str>) -> Result<Self, EssaError> {
        validated_name(name.as_ref()).map(Self)
    }

    /// Get the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StageName {
    type Error = EssaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<StageName> for String {
    fn from(name: StageName) -> Self {
        name.0
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name of a sustainability factor, as listed in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FactorName(String);

impl FactorName {
    /// Create a factor name, rejecting empty or oversized input.
    pub fn new(name: impl AsRef<str>) -> Result<Self, EssaError> {
        validated_name(name.as_ref()).map(Self)
    }

    /// Get the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for FactorName {
    type Error = EssaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FactorName> for String {
    fn from(name: FactorName) -> Self {
        name.0
    }
}

impl fmt::Display for FactorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// CATEGORY
// =============================================================================

/// The three sustainability pillars a factor can belong to.
///
/// Declaration order is the display order used everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Environmental,
    Social,
    Economic,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Category; 3] = [
        Category::Environmental,
        Category::Social,
        Category::Economic,
    ];

    /// Get the category name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Category::Environmental => "Environmental",
            Category::Social => "Social",
            Category::Economic => "Economic",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = EssaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "environmental" | "env" => Ok(Category::Environmental),
            "social" | "soc" => Ok(Category::Social),
            "economic" | "eco" => Ok(Category::Economic),
            _ => Err(EssaError::UnknownCategory(s.to_string())),
        }
    }
}

// =============================================================================
// TECHNOLOGY READINESS LEVEL
// =============================================================================

/// Technology Readiness Level, 1 (basic principles) to 9 (proven system).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct TrlLevel(u8);

impl TrlLevel {
    /// Create a level, rejecting anything outside 1..=9.
    pub fn new(level: u8) -> Result<Self, EssaError> {
        if (MIN_TRL..=MAX_TRL).contains(&level) {
            Ok(Self(level))
        } else {
            Err(EssaError::InvalidTrl(level))
        }
    }

    /// Get the raw level.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for TrlLevel {
    type Error = EssaError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TrlLevel> for u8 {
    fn from(level: TrlLevel) -> Self {
        level.0
    }
}

impl fmt::Display for TrlLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TRL {}", self.0)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Broad classification of an [`EssaError`].
///
/// Hosts use this to pick a response (HTTP status, exit message) without
/// matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The offending input was rejected; state is unchanged.
    Validation,
    /// An aggregate was requested before the grid was complete.
    IncompleteData,
    /// A named project does not exist.
    NotFound,
    /// A named project already exists.
    Conflict,
    /// Encoded data (snapshot, CSV) could not be read or written.
    Format,
    /// File system failure.
    Io,
    /// Configuration or reference catalog is malformed.
    Config,
}

/// Errors that can occur in the ESSA model.
///
/// - No silent failures
/// - Every operation either fully applies or leaves the project untouched
/// - The CORE never panics; all errors are recoverable at the point of input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EssaError {
    #[error("Name must not be empty")]
    EmptyName,

    #[error("Name length {length} exceeds maximum {max} bytes")]
    NameTooLong { length: usize, max: usize },

    #[error("Note length {length} exceeds maximum {max} bytes")]
    NoteTooLong { length: usize, max: usize },

    #[error("TRL must be between 1 and 9, got {0}")]
    InvalidTrl(u8),

    #[error("TRL {0} is not defined in the reference catalog")]
    UnknownTrl(u8),

    #[error("Score must be between 1 and 5, got {0}")]
    InvalidScore(u8),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Exactly {expected} {category} factors must be selected, got {got}")]
    FactorCount {
        category: Category,
        expected: usize,
        got: usize,
    },

    #[error("'{name}' is not a {category} factor")]
    UnknownFactor { category: Category, name: String },

    #[error("Lifecycle stage not found: {0}")]
    UnknownStage(String),

    #[error("Lifecycle stage already exists: {0}")]
    DuplicateStage(String),

    #[error("At most {max} lifecycle stages are allowed")]
    TooManyStages { max: usize },

    #[error("Stage '{0}' is not marked as changed and cannot be scored")]
    InactiveStage(String),

    #[error("Factor '{0}' is not selected and cannot be scored")]
    InactiveFactor(String),

    #[error("No lifecycle stage is marked as changed")]
    NoActiveStages,

    #[error("No {0} factors have been selected")]
    FactorsNotSelected(Category),

    #[error("{missing} stage/factor pairs have no score yet")]
    MissingScores { missing: usize },

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Project already exists: {0}")]
    ProjectExists(String),

    #[error("Invalid reference catalog: {0}")]
    InvalidCatalog(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("I/O error: {0}")]
    IoError(String),
}

impl EssaError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            EssaError::EmptyName
            | EssaError::NameTooLong { .. }
            | EssaError::NoteTooLong { .. }
            | EssaError::InvalidTrl(_)
            | EssaError::UnknownTrl(_)
            | EssaError::InvalidScore(_)
            | EssaError::UnknownCategory(_)
            | EssaError::FactorCount { .. }
            | EssaError::UnknownFactor { .. }
            | EssaError::UnknownStage(_)
            | EssaError::DuplicateStage(_)
            | EssaError::TooManyStages { .. }
            | EssaError::InactiveStage(_)
            | EssaError::InactiveFactor(_) => ErrorKind::Validation,
            EssaError::NoActiveStages
            | EssaError::FactorsNotSelected(_)
            | EssaError::MissingScores { .. } => ErrorKind::IncompleteData,
            EssaError::ProjectNotFound(_) => ErrorKind::NotFound,
            EssaError::ProjectExists(_) => ErrorKind::Conflict,
            EssaError::InvalidCatalog(_) | EssaError::InvalidConfig(_) => ErrorKind::Config,
            EssaError::SerializationError(_) | EssaError::DeserializationError(_) => {
                ErrorKind::Format
            }
            EssaError::IoError(_) => ErrorKind::Io,
        }
    }

    /// Shorthand for `kind() == ErrorKind::Validation`.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    /// Shorthand for `kind() == ErrorKind::IncompleteData`.
    #[must_use]
    pub fn is_incomplete(&self) -> bool {
        self.kind() == ErrorKind::IncompleteData
    }
}

// =============================================================================
// TESTS
// =============================================================================
