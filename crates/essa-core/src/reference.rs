//! # Reference Catalog
//!
//! Static lookup tables the questionnaire is built from:
//! - TRL 1–9 with the EU definition and the actors to engage
//! - Environmental, Social and Economic factors (unit, explanation, default pick)
//! - The default lifecycle stages
//!
//! The built-in tables come from [`Catalog::standard`]. A host may load a
//! replacement (e.g. from TOML); every catalog goes through
//! [`Catalog::validate`] before use, so malformed tables are rejected at
//! construction rather than surfacing mid-assessment.

use crate::primitives::{FACTORS_PER_CATEGORY, MAX_LIFECYCLE_STAGES, MAX_TRL, MIN_TRL};
use crate::types::{Category, EssaError, FactorName, StageName, TrlLevel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// CATALOG ENTRIES
// =============================================================================

/// One row of the TRL table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrlInfo {
    pub level: TrlLevel,
    pub definition: String,
    /// Actors to engage at this level. Empty means none are prescribed.
    #[serde(default)]
    pub actors: Vec<String>,
}

impl TrlInfo {
    /// Actors as a single display line ("N/A" when none are prescribed).
    #[must_use]
    pub fn actors_line(&self) -> String {
        if self.actors.is_empty() {
            "N/A".to_string()
        } else {
            self.actors.join(", ")
        }
    }
}

/// A selectable sustainability factor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorInfo {
    pub name: FactorName,
    pub category: Category,
    /// Impact unit (environmental factors only; empty otherwise).
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub explanation: String,
    /// Part of the suggested three for its category.
    #[serde(default)]
    pub default_selected: bool,
}

// =============================================================================
// CATALOG
// =============================================================================

/// The complete set of reference tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub trl_levels: Vec<TrlInfo>,
    pub factors: Vec<FactorInfo>,
    pub default_stages: Vec<StageName>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl Catalog {
    /// The built-in reference tables.
    #[must_use]
    pub fn standard() -> Self {
        let trl_levels = STANDARD_TRL
            .iter()
            .filter_map(|(level, definition, actors)| {
                let level = TrlLevel::new(*level).ok()?;
                Some(TrlInfo {
                    level,
                    definition: (*definition).to_string(),
                    actors: actors.iter().map(|a| (*a).to_string()).collect(),
                })
            })
            .collect();

        let factors = [
            (Category::Environmental, ENVIRONMENTAL_FACTORS),
            (Category::Social, SOCIAL_FACTORS),
            (Category::Economic, ECONOMIC_FACTORS),
        ]
        .into_iter()
        .flat_map(|(category, rows)| {
            rows.iter().filter_map(move |(name, unit, explanation, selected)| {
                Some(FactorInfo {
                    name: FactorName::new(name).ok()?,
                    category,
                    unit: (*unit).to_string(),
                    explanation: (*explanation).to_string(),
                    default_selected: *selected,
                })
            })
        })
        .collect();

        let default_stages = DEFAULT_LIFECYCLE
            .iter()
            .filter_map(|name| StageName::new(name).ok())
            .collect();

        Self {
            trl_levels,
            factors,
            default_stages,
        }
    }

    /// Check the tables are usable by the questionnaire.
    ///
    /// - TRL levels are exactly 1..=9, each once
    /// - factor names are unique across all categories
    /// - every category offers at least three factors and exactly three defaults
    /// - 1 to 7 unique default stages
    pub fn validate(&self) -> Result<(), EssaError> {
        let levels: Vec<u8> = self.trl_levels.iter().map(|t| t.level.value()).collect();
        let expected: Vec<u8> = (MIN_TRL..=MAX_TRL).collect();
        let mut sorted = levels.clone();
        sorted.sort_unstable();
        if sorted != expected {
            return Err(EssaError::InvalidCatalog(format!(
                "TRL levels must be exactly {}..={}, got {:?}",
                MIN_TRL, MAX_TRL, levels
            )));
        }

        let mut names = BTreeSet::new();
        for factor in &self.factors {
            if !names.insert(factor.name.as_str()) {
                return Err(EssaError::InvalidCatalog(format!(
                    "Duplicate factor name: {}",
                    factor.name
                )));
            }
        }

        for category in Category::ALL {
            let offered = self.factors_in(category).count();
            if offered < FACTORS_PER_CATEGORY {
                return Err(EssaError::InvalidCatalog(format!(
                    "{} offers {} factors, at least {} required",
                    category, offered, FACTORS_PER_CATEGORY
                )));
            }
            let defaults = self
                .factors_in(category)
                .filter(|f| f.default_selected)
                .count();
            if defaults != FACTORS_PER_CATEGORY {
                return Err(EssaError::InvalidCatalog(format!(
                    "{} has {} default factors, exactly {} required",
                    category, defaults, FACTORS_PER_CATEGORY
                )));
            }
        }

        if self.default_stages.is_empty() || self.default_stages.len() > MAX_LIFECYCLE_STAGES {
            return Err(EssaError::InvalidCatalog(format!(
                "Default lifecycle must have 1 to {} stages, got {}",
                MAX_LIFECYCLE_STAGES,
                self.default_stages.len()
            )));
        }
        let unique: BTreeSet<_> = self.default_stages.iter().collect();
        if unique.len() != self.default_stages.len() {
            return Err(EssaError::InvalidCatalog(
                "Default lifecycle stages must be unique".to_string(),
            ));
        }

        Ok(())
    }

    /// Look up a TRL row.
    #[must_use]
    pub fn trl(&self, level: TrlLevel) -> Option<&TrlInfo> {
        self.trl_levels.iter().find(|t| t.level == level)
    }

    /// Factors of one category, in catalog order.
    pub fn factors_in(&self, category: Category) -> impl Iterator<Item = &FactorInfo> {
        self.factors.iter().filter(move |f| f.category == category)
    }

    /// Look up a factor by name in any category.
    #[must_use]
    pub fn factor(&self, name: &str) -> Option<&FactorInfo> {
        self.factors.iter().find(|f| f.name.as_str() == name)
    }

    /// The suggested three factors of a category.
    #[must_use]
    pub fn default_factors(&self, category: Category) -> Vec<FactorName> {
        self.factors_in(category)
            .filter(|f| f.default_selected)
            .map(|f| f.name.clone())
            .collect()
    }
}

// =============================================================================
// BUILT-IN TABLES
// =============================================================================

const TECH_DEVELOPERS: &str = "Technology developers";
const SCIENTIFIC_EXPERTS: &str = "External scientific experts";
const INDUSTRY: &str = "Industry representatives";
const GOVERNMENT: &str = "Government agency representatives";

/// (level, definition, actors)
const STANDARD_TRL: &[(u8, &str, &[&str])] = &[
    (1, "Basic principles observed", &[TECH_DEVELOPERS, SCIENTIFIC_EXPERTS]),
    (2, "Technology concept formulated", &[TECH_DEVELOPERS, SCIENTIFIC_EXPERTS]),
    (3, "Experimental proof of concept", &[TECH_DEVELOPERS, SCIENTIFIC_EXPERTS]),
    (
        4,
        "Technology validated in lab",
        &[TECH_DEVELOPERS, SCIENTIFIC_EXPERTS, INDUSTRY],
    ),
    (
        5,
        "Technology validated in relevant environment (industrially relevant environment in the case of key enabling technologies)",
        &[TECH_DEVELOPERS, SCIENTIFIC_EXPERTS, INDUSTRY, GOVERNMENT],
    ),
    (
        6,
        "Technology demonstrated in relevant environment (industrially relevant environment in the case of key enabling technologies)",
        &[],
    ),
    (7, "System prototype demonstration in operational environment", &[]),
    (8, "System complete and qualified", &[]),
    (
        9,
        "Actual system proven in operational environment (competitive manufacturing in the case of key enabling technologies; or in space)",
        &[],
    ),
];

/// (name, unit, explanation, default selected)
type FactorRow = (&'static str, &'static str, &'static str, bool);

const ENVIRONMENTAL_FACTORS: &[FactorRow] = &[
    ("Climate change", "kg CO2 eq", "Modification of climate affecting global ecosystem.", true),
    ("Particulate matters", "disease incidence", "PM effects on human health.", false),
    ("Water use", "m3 world eq", "Consumption & depletion, scarcity-adjusted.", false),
    ("Resource use, fossils", "MJ", "Depletion of non-renewable energy resources.", true),
    ("Land Use", "point", "Impact on land degradation & biodiversity.", true),
    ("Resource use, minerals and metals", "kg Sb eq", "Depletion of mineral resources.", false),
    ("Ozone depletion", "kg CFC-11 eq", "Impoverishment of protective ozone layer.", false),
    ("Acidification", "mol H+ eq", "Atmospheric chemicals redeposited in ecosystems.", false),
    ("Ionizing radiation, effect on human health", "kBq U235 eq", "Effects of radioactivity.", false),
    ("Photochemical ozone formation, effect on human health", "kg NMVOC eq", "Air quality deterioration (smog).", false),
    ("Eutrophication, terrestrial", "mol N eq", "Excess enrichment leading to imbalance.", false),
    ("Eutrophication, marine", "kg N eq", "Excess nutrients leading to dead zones.", false),
    ("Eutrophication, freshwater", "kg P eq", "Excess nutrients in rivers & lakes.", false),
];

const SOCIAL_FACTORS: &[FactorRow] = &[
    ("Health and safety (workers)", "", "Worker health & safety across supply chain.", true),
    ("Equal opportunities (workers)", "", "Non-discrimination & inclusion.", false),
    ("Smallholders including farmers (workers)", "", "Impacts on smallholders.", false),
    ("Access to material resources (local community)", "", "Shared resource access & rights.", false),
    ("Delocalization and migration (local community)", "", "Community displacement risks.", false),
    ("Safe and healthy living conditions (local community)", "", "Ambient environmental & safety conditions.", false),
    ("Respect of indigenous rights (local community)", "", "FPIC & cultural heritage.", false),
    ("Local employment (local community)", "", "Quality job opportunities locally.", false),
    ("Public commitment to sustainability issues (society)", "", "Transparency & responsible conduct.", true),
    ("Contribution to economic development (society)", "", "Shared prosperity enablement.", false),
    ("Prevention and mitigation of conflicts (society)", "", "Conflict sensitivity & mitigation.", false),
    ("Technology development (society)", "", "Innovation spillovers & capacity.", false),
    ("Ethical treatment of animals (society)", "", "Animal welfare standards.", false),
    ("Poverty alleviation (society)", "", "Inclusive growth & poverty reduction.", false),
    ("Health and safety (consumers)", "", "Consumer health & safety.", false),
    ("End of life responsibility (consumers)", "", "Design for circularity & EPR.", true),
    ("Health issues for children as consumers (children)", "", "Child-specific health risks.", false),
];

const ECONOMIC_FACTORS: &[FactorRow] = &[
    ("Complexity of production process", "", "How complex is manufacturing?", true),
    ("Raw material cost", "", "Cost of feedstocks & inputs.", true),
    ("Market size", "", "Addressable market potential.", false),
    ("Cost of final product", "", "Unit economics and price point.", true),
    ("Scalability of production process", "", "Ease of scale-up to volume.", false),
    ("Raw material availability", "", "Supply security & constraints.", false),
    ("Chance on subsidies", "", "Public funding & incentives likelihood.", false),
];

const DEFAULT_LIFECYCLE: &[&str] = &[
    "Raw material extraction",
    "Material synthesis / processing",
    "Component manufacturing",
    "Product assembly",
    "Distribution & logistics",
    "Use phase",
    "End-of-life (reuse/recycling/disposal)",
];

// =============================================================================
// TESTS
// =============================================================================
