//! # Factor Selection
//!
//! Step 3: exactly three factors per category, picked from the catalog.
//!
//! A deserialized selection is checked for shape only: every category is
//! either unpicked or holds three distinct factors, and no factor sits in
//! two categories. Catalog membership needs the catalog and is checked by
//! [`FactorSelection::check_catalog`].

use crate::primitives::FACTORS_PER_CATEGORY;
use crate::reference::Catalog;
use crate::types::{Category, EssaError, FactorName};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Selected factors per category, in the order they were picked.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<Category, Vec<FactorName>>",
    into = "BTreeMap<Category, Vec<FactorName>>"
)]
pub struct FactorSelection {
    selected: BTreeMap<Category, Vec<FactorName>>,
}

impl FactorSelection {
    /// The catalog's suggested three factors for every category.
    #[must_use]
    pub fn defaults(catalog: &Catalog) -> Self {
        let selected = Category::ALL
            .into_iter()
            .map(|category| (category, catalog.default_factors(category)))
            .collect();
        Self { selected }
    }

    /// Check a candidate selection for one category.
    ///
    /// Duplicates collapse, so `[a, a, b]` counts as two factors.
    pub fn validate<I, S>(
        catalog: &Catalog,
        category: Category,
        names: I,
    ) -> Result<Vec<FactorName>, EssaError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = BTreeSet::new();
        let mut picked = Vec::new();
        for raw in names {
            let name = FactorName::new(raw)?;
            if seen.insert(name.clone()) {
                picked.push(name);
            }
        }

        if picked.len() != FACTORS_PER_CATEGORY {
            return Err(EssaError::FactorCount {
                category,
                expected: FACTORS_PER_CATEGORY,
                got: picked.len(),
            });
        }

        for name in &picked {
            check_known(catalog, category, name)?;
        }

        Ok(picked)
    }

    /// Replace the selection of one category. Last call wins.
    pub fn select<I, S>(
        &mut self,
        catalog: &Catalog,
        category: Category,
        names: I,
    ) -> Result<(), EssaError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let picked = Self::validate(catalog, category, names)?;
        self.selected.insert(category, picked);
        Ok(())
    }

    /// Check every selected factor against the catalog.
    pub fn check_catalog(&self, catalog: &Catalog) -> Result<(), EssaError> {
        self.active()
            .try_for_each(|(category, name)| check_known(catalog, category, name))
    }

    /// Selection of one category (empty if not yet picked).
    #[must_use]
    pub fn in_category(&self, category: Category) -> &[FactorName] {
        self.selected.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All selected factors with their category, Environmental first.
    pub fn active(&self) -> impl Iterator<Item = (Category, &FactorName)> {
        self.selected
            .iter()
            .flat_map(|(category, names)| names.iter().map(move |n| (*category, n)))
    }

    /// Whether the factor is currently selected in any category.
    #[must_use]
    pub fn is_active(&self, name: &FactorName) -> bool {
        self.selected.values().any(|names| names.contains(name))
    }

    /// Category of a selected factor.
    #[must_use]
    pub fn category_of(&self, name: &FactorName) -> Option<Category> {
        self.selected
            .iter()
            .find(|(_, names)| names.contains(name))
            .map(|(category, _)| *category)
    }

    /// Categories that have no selection yet.
    pub fn missing_categories(&self) -> impl Iterator<Item = Category> + '_ {
        Category::ALL
            .into_iter()
            .filter(|c| self.in_category(*c).is_empty())
    }

    /// Whether all three categories have their three factors.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_categories().next().is_none()
    }
}

fn check_known(catalog: &Catalog, category: Category, name: &FactorName) -> Result<(), EssaError> {
    let known = catalog
        .factor(name.as_str())
        .is_some_and(|f| f.category == category);
    if !known {
        return Err(EssaError::UnknownFactor {
            category,
            name: name.to_string(),
        });
    }
    Ok(())
}

impl TryFrom<BTreeMap<Category, Vec<FactorName>>> for FactorSelection {
    type Error = EssaError;

    fn try_from(raw: BTreeMap<Category, Vec<FactorName>>) -> Result<Self, Self::Error> {
        let mut seen: BTreeSet<&FactorName> = BTreeSet::new();
        for (category, names) in &raw {
            if names.is_empty() {
                continue;
            }
            let distinct: BTreeSet<&FactorName> = names.iter().collect();
            if names.len() != FACTORS_PER_CATEGORY || distinct.len() != names.len() {
                return Err(EssaError::FactorCount {
                    category: *category,
                    expected: FACTORS_PER_CATEGORY,
                    got: distinct.len(),
                });
            }
            for name in names {
                if !seen.insert(name) {
                    return Err(EssaError::UnknownFactor {
                        category: *category,
                        name: name.to_string(),
                    });
                }
            }
        }

        let selected = raw
            .into_iter()
            .filter(|(_, names)| !names.is_empty())
            .collect();
        Ok(Self { selected })
    }
}

impl From<FactorSelection> for BTreeMap<Category, Vec<FactorName>> {
    fn from(selection: FactorSelection) -> Self {
        selection.selected
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ENV: [&str; 3] = ["Climate change", "Water use", "Acidification"];

    #[test]
    fn selects_three_known_factors() {
        let catalog = Catalog::standard();
        let mut selection = FactorSelection::default();
        selection
            .select(&catalog, Category::Environmental, ENV)
            .expect("valid");
        assert_eq!(selection.in_category(Category::Environmental).len(), 3);
        assert!(!selection.is_complete());
    }

    #[test]
    fn wrong_count_rejected() {
        let catalog = Catalog::standard();
        let mut selection = FactorSelection::default();
        let result = selection.select(&catalog, Category::Environmental, &ENV[..2]);
        assert_eq!(
            result,
            Err(EssaError::FactorCount {
                category: Category::Environmental,
                expected: 3,
                got: 2
            })
        );
        assert!(selection.in_category(Category::Environmental).is_empty());
    }

    #[test]
    fn duplicates_do_not_count_twice() {
        let catalog = Catalog::standard();
        let mut selection = FactorSelection::default();
        let names = ["Climate change", "Climate change", "Water use"];
        assert!(matches!(
            selection.select(&catalog, Category::Environmental, names),
            Err(EssaError::FactorCount { got: 2, .. })
        ));
    }

    #[test]
    fn factor_from_other_category_rejected() {
        let catalog = Catalog::standard();
        let mut selection = FactorSelection::default();
        let names = ["Climate change", "Water use", "Market size"];
        assert!(matches!(
            selection.select(&catalog, Category::Environmental, names),
            Err(EssaError::UnknownFactor { .. })
        ));
    }

    #[test]
    fn last_selection_wins() {
        let catalog = Catalog::standard();
        let mut selection = FactorSelection::defaults(&catalog);
        selection
            .select(&catalog, Category::Environmental, ENV)
            .expect("valid");
        let picked: Vec<_> = selection
            .in_category(Category::Environmental)
            .iter()
            .map(FactorName::as_str)
            .collect();
        assert_eq!(picked, ENV);
        assert!(!selection.is_active(&FactorName::new("Land Use").expect("valid")));
    }

    #[test]
    fn deserialization_checks_shape() {
        let four = r#"{"Environmental": ["Climate change", "Water use", "Acidification", "Land Use"]}"#;
        assert!(serde_json::from_str::<FactorSelection>(four).is_err());

        let repeated = r#"{"Social": ["Health", "Health", "Jobs"]}"#;
        assert!(serde_json::from_str::<FactorSelection>(repeated).is_err());

        let shared = r#"{"Environmental": ["A", "B", "C"], "Social": ["C", "D", "E"]}"#;
        assert!(serde_json::from_str::<FactorSelection>(shared).is_err());

        let partial: FactorSelection =
            serde_json::from_str(r#"{"Economic": [], "Environmental": ["A", "B", "C"]}"#)
                .expect("valid shape");
        assert_eq!(partial.missing_categories().count(), 2);
    }

    #[test]
    fn catalog_check_rejects_unknown_factor() {
        let catalog = Catalog::standard();
        let selection: FactorSelection = serde_json::from_str(
            r#"{"Environmental": ["Climate change", "Water use", "Not a catalog factor"]}"#,
        )
        .expect("valid shape");
        assert!(matches!(
            selection.check_catalog(&catalog),
            Err(EssaError::UnknownFactor { .. })
        ));
        assert!(FactorSelection::defaults(&catalog).check_catalog(&catalog).is_ok());
    }

    #[test]
    fn serialized_selection_round_trips() {
        let selection = FactorSelection::defaults(&Catalog::standard());
        let json = serde_json::to_string(&selection).expect("serialize");
        let back: FactorSelection = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, selection);
    }

    #[test]
    fn defaults_cover_every_category() {
        let selection = FactorSelection::defaults(&Catalog::standard());
        assert!(selection.is_complete());
        assert_eq!(selection.active().count(), 9);
        let first = selection.active().next().map(|(c, _)| c);
        assert_eq!(first, Some(Category::Environmental));
    }
}
