use std::collections::BTreeSet;

use tracing::{info, instrument};

use crate::{documents::Pokemon, Status};

/// The static, read-only list of collectible entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    entries: Vec<Pokemon>,
}

impl Catalog {
    pub fn new(entries: Vec<Pokemon>) -> Self {
        Catalog { entries }
    }

    /// Loads the catalog from a local file or an http(s) URL.
    #[instrument(level = "info")]
    pub async fn load(source: &str) -> Result<Self, Status> {
        let entries: Vec<Pokemon> =
            if source.starts_with("http://") || source.starts_with("https://") {
                let resp = reqwest::get(source).await?.error_for_status()?;
                let text = resp.text().await?;
                serde_json::from_str(&text).map_err(|e| {
                    Status::invalid_argument(format!("Catalog '{source}' failed to parse: {e}"))
                })?
            } else {
                let bytes = tokio::fs::read(source).await.map_err(|e| {
                    Status::not_found(format!("Catalog '{source}' could not be read: {e}"))
                })?;
                serde_json::from_slice(&bytes).map_err(|e| {
                    Status::invalid_argument(format!("Catalog '{source}' failed to parse: {e}"))
                })?
            };

        info!("loaded {} catalog entries from '{source}'", entries.len());
        Ok(Catalog::new(entries))
    }

    pub fn entries(&self) -> &[Pokemon] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct types in order of first appearance.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.entries
            .iter()
            .flat_map(|pokemon| pokemon.types.iter())
            .filter(|category| seen.insert(category.as_str()))
            .map(|category| category.as_str())
            .collect()
    }

    /// Number of ids in `caught` that belong to the catalog. Stale ids are not
    /// counted.
    pub fn count_caught(&self, caught: &BTreeSet<u64>) -> usize {
        self.entries
            .iter()
            .filter(|pokemon| caught.contains(&pokemon.id))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CATALOG: &str = r#"[
        {"id": 1, "numero": 1, "nom": "Bulbizarre", "nomEn": "Bulbasaur", "types": ["plante", "poison"], "location": "Bourg Palette"},
        {"id": 4, "numero": 4, "nom": "Salamèche", "nomEn": "Charmander", "types": ["feu"], "location": "Bourg Palette"},
        {"id": 43, "numero": 43, "nom": "Mystherbe", "nomEn": "Oddish", "types": ["plante", "poison"], "location": "Route 24"}
    ]"#;

    #[tokio::test]
    async fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CATALOG.as_bytes()).unwrap();

        let catalog = Catalog::load(file.path().to_str().unwrap()).await.unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.entries()[1].name_en, "Charmander");
        assert_eq!(catalog.entries()[2].display_number(), "#043");
    }

    #[tokio::test]
    async fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pokemon_data.json");

        let status = Catalog::load(path.to_str().unwrap()).await.unwrap_err();
        assert!(matches!(status, Status::NotFound(_)));
    }

    #[tokio::test]
    async fn malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"pokemon": []}"#).unwrap();

        let status = Catalog::load(file.path().to_str().unwrap())
            .await
            .unwrap_err();
        assert!(status.is_invalid_argument());
    }

    #[test]
    fn categories_keep_first_appearance_order() {
        let catalog = Catalog::new(serde_json::from_str(CATALOG).unwrap());
        assert_eq!(catalog.categories(), vec!["plante", "poison", "feu"]);
    }

    #[test]
    fn count_ignores_stale_ids() {
        let catalog = Catalog::new(serde_json::from_str(CATALOG).unwrap());
        assert_eq!(catalog.count_caught(&BTreeSet::from([1, 43, 999])), 2);
    }
}
