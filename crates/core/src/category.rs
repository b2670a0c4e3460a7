//! Document categories and the location → category resolver.
//!
//! Classification is table-driven: an operator-supplied [`CategoryConfig`]
//! maps mailbox locations to categories, and a built-in alias table absorbs
//! the legacy spellings (accented labels, singular/plural slugs) that older
//! producers still emit. Anything unmapped falls back to [`Category::Autre`];
//! resolution has no error path.

use std::collections::HashMap;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Fixed set of business document categories.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Declaration,
    Reclamation,
    Attestation,
    Paiement,
    /// Default bucket for anything unmapped.
    Autre,
}

/// Legacy/localized spellings accepted for each category, keyed by their
/// normalized form. Resolution never guesses beyond this table.
const ALIASES: &[(&str, Category)] = &[
    ("declaration", Category::Declaration),
    ("declarations", Category::Declaration),
    ("reclamation", Category::Reclamation),
    ("reclamations", Category::Reclamation),
    ("attestation", Category::Attestation),
    ("attestations", Category::Attestation),
    ("paiement", Category::Paiement),
    ("paiements", Category::Paiement),
    ("reglement", Category::Paiement),
    ("reglements", Category::Paiement),
    ("autre", Category::Autre),
    ("autres", Category::Autre),
    ("divers", Category::Autre),
];

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Declaration,
        Category::Reclamation,
        Category::Attestation,
        Category::Paiement,
        Category::Autre,
    ];

    /// Stable machine-readable key.
    pub fn slug(self) -> &'static str {
        match self {
            Category::Declaration => "declaration",
            Category::Reclamation => "reclamation",
            Category::Attestation => "attestation",
            Category::Paiement => "paiement",
            Category::Autre => "autre",
        }
    }

    /// Human-facing label as rendered by reporting consumers.
    pub fn display_label(self) -> &'static str {
        match self {
            Category::Declaration => "Déclarations",
            Category::Reclamation => "Réclamations",
            Category::Attestation => "Attestations",
            Category::Paiement => "Paiements",
            Category::Autre => "Autres",
        }
    }

    /// Strict alias lookup: returns `None` for labels outside the table.
    ///
    /// Used where an unrecognized label must be rejected (historical imports)
    /// rather than silently bucketed into the default.
    pub fn from_label(label: &str) -> Option<Category> {
        let key = normalize(label);
        ALIASES
            .iter()
            .find(|(alias, _)| *alias == key)
            .map(|(_, category)| *category)
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Autre
    }
}

impl core::fmt::Display for Category {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.display_label())
    }
}

/// Lowercase + explicit diacritic folding + trim.
///
/// The folding table covers the French accents seen in legacy labels; this is
/// the entire normalization, nothing heuristic.
pub fn normalize(input: &str) -> String {
    input
        .trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'à' | 'â' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'î' | 'ï' => 'i',
            'ô' | 'ö' => 'o',
            'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            _ => c,
        })
        .collect()
}

/// Operator-supplied mapping from mailbox locations to categories.
///
/// Many locations may map to one category. Keys are stored normalized so
/// lookups are case- and diacritic-insensitive regardless of how the config
/// was produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryConfig {
    locations: HashMap<String, Category>,
}

impl CategoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the mapping for one location.
    pub fn insert(&mut self, location: impl AsRef<str>, category: Category) {
        self.locations.insert(normalize(location.as_ref()), category);
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Resolve a location to its category.
    ///
    /// Configured mappings win over the built-in alias table; unmapped input
    /// yields the default category.
    pub fn resolve(&self, location: &str) -> Category {
        let key = normalize(location);
        if let Some(category) = self.locations.get(&key) {
            return *category;
        }
        Category::from_label(location).unwrap_or_default()
    }
}

impl FromIterator<(String, Category)> for CategoryConfig {
    fn from_iter<I: IntoIterator<Item = (String, Category)>>(iter: I) -> Self {
        let mut config = Self::new();
        for (location, category) in iter {
            config.insert(location, category);
        }
        config
    }
}

impl Serialize for CategoryConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.locations.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CategoryConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = HashMap::<String, Category>::deserialize(deserializer)?;
        Ok(raw.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_spellings_collapse_to_one_category() {
        let config = CategoryConfig::new();
        assert_eq!(config.resolve("declarations"), Category::Declaration);
        assert_eq!(config.resolve("Déclaration"), Category::Declaration);
        assert_eq!(
            config.resolve(Category::Declaration.display_label()),
            Category::Declaration
        );
    }

    #[test]
    fn unmapped_location_falls_back_to_default() {
        let config = CategoryConfig::new();
        assert_eq!(config.resolve("Boîte de réception/Inconnu"), Category::Autre);
        assert_eq!(config.resolve(""), Category::Autre);
    }

    #[test]
    fn configured_mapping_wins_over_alias_table() {
        let mut config = CategoryConfig::new();
        config.insert("Réclamations", Category::Paiement);
        assert_eq!(config.resolve("reclamations "), Category::Paiement);
        // Other aliases are untouched.
        assert_eq!(config.resolve("attestation"), Category::Attestation);
    }

    #[test]
    fn config_lookup_is_case_and_accent_insensitive() {
        let mut config = CategoryConfig::new();
        config.insert("Boîte/Déclarations fiscales", Category::Declaration);
        assert_eq!(
            config.resolve("boite/declarations fiscales"),
            Category::Declaration
        );
    }

    #[test]
    fn strict_label_lookup_rejects_unknown() {
        assert_eq!(Category::from_label("Règlements"), Some(Category::Paiement));
        assert_eq!(Category::from_label("garbage"), None);
        assert_eq!(Category::from_label(""), None);
    }

    #[test]
    fn config_loads_from_json() {
        let json = r#"{
            "Boîte de réception/Déclarations": "declaration",
            "Archives/Paiements": "paiement"
        }"#;
        let config: CategoryConfig = serde_json::from_str(json).unwrap();
        assert_eq!(
            config.resolve("boite de reception/declarations"),
            Category::Declaration
        );
        assert_eq!(config.resolve("Archives/Paiements"), Category::Paiement);

        let round = serde_json::to_string(&config).unwrap();
        let reparsed: CategoryConfig = serde_json::from_str(&round).unwrap();
        assert_eq!(reparsed, config);
    }
}
