use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{catalog::Catalog, documents::Pokemon};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Caught,
    Uncaught,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    /// Parses a select value where `all` disables the filter.
    pub fn from_value(value: &str) -> Self {
        match value {
            "" | "all" => CategoryFilter::All,
            category => CategoryFilter::Only(category.to_owned()),
        }
    }

    pub fn as_value(&self) -> &str {
        match self {
            CategoryFilter::All => "all",
            CategoryFilter::Only(category) => category,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub query: String,
    pub category: CategoryFilter,
    pub status: StatusFilter,
}

impl FilterCriteria {
    pub fn matches(&self, pokemon: &Pokemon, caught: &BTreeSet<u64>) -> bool {
        matches_search(pokemon, &self.query.to_lowercase())
            && matches_category(pokemon, &self.category)
            && matches_status(pokemon, caught, self.status)
    }
}

/// `needle` must already be lowercase. Matches either name or the display
/// number.
pub fn matches_search(pokemon: &Pokemon, needle: &str) -> bool {
    pokemon.name.to_lowercase().contains(needle)
        || pokemon.name_en.to_lowercase().contains(needle)
        || pokemon.number.to_string().contains(needle)
}

pub fn matches_category(pokemon: &Pokemon, category: &CategoryFilter) -> bool {
    match category {
        CategoryFilter::All => true,
        CategoryFilter::Only(category) => pokemon.types.iter().any(|t| t == category),
    }
}

pub fn matches_status(pokemon: &Pokemon, caught: &BTreeSet<u64>, status: StatusFilter) -> bool {
    match status {
        StatusFilter::All => true,
        StatusFilter::Caught => caught.contains(&pokemon.id),
        StatusFilter::Uncaught => !caught.contains(&pokemon.id),
    }
}

/// Catalog entries passing every predicate, in catalog order.
pub fn filter<'a>(
    catalog: &'a Catalog,
    caught: &BTreeSet<u64>,
    criteria: &FilterCriteria,
) -> Vec<&'a Pokemon> {
    let needle = criteria.query.to_lowercase();
    catalog
        .entries()
        .iter()
        .filter(|pokemon| {
            matches_search(pokemon, &needle)
                && matches_category(pokemon, &criteria.category)
                && matches_status(pokemon, caught, criteria.status)
        })
        .collect()
}
