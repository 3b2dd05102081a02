use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::Status;

/// Progress file accepted by import. Extra fields are ignored.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ImportFile {
    #[serde(rename = "pokemonIds")]
    pub pokemon_ids: Vec<u64>,
}

impl ImportFile {
    pub fn parse(bytes: &[u8]) -> Result<Self, Status> {
        serde_json::from_slice(bytes).map_err(|e| {
            Status::invalid_argument(format!(
                "Import file must be a JSON object with a 'pokemonIds' array of integers: {e}"
            ))
        })
    }
}

/// Progress file produced by export.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub date: String,
    pub total: usize,
    pub caught: usize,
    pub percentage: u32,

    #[serde(rename = "pokemonIds")]
    pub pokemon_ids: Vec<u64>,
}

impl ExportFile {
    pub fn new(caught_set: &BTreeSet<u64>, caught: usize, total: usize, percentage: u32) -> Self {
        ExportFile {
            date: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            total,
            caught,
            percentage,
            pokemon_ids: caught_set.iter().copied().collect(),
        }
    }

    /// Download name, e.g. `shiny-dex-2024-05-01.json`.
    pub fn file_name(&self) -> String {
        let day = self.date.get(..10).unwrap_or("export");
        format!("shiny-dex-{day}.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_ignores_extra_fields() {
        let file =
            ImportFile::parse(br#"{"pokemonIds": [1, 2, 3], "date": "2024-01-01", "caught": 3}"#)
                .unwrap();
        assert_eq!(file.pokemon_ids, vec![1, 2, 3]);
    }

    #[test]
    fn import_rejects_bad_shapes() {
        for payload in [
            &b"[1, 2, 3]"[..],
            br#"{"ids": [1]}"#,
            br#"{"pokemonIds": "1,2"}"#,
            br#"{"pokemonIds": [-1]}"#,
            b"not json",
        ] {
            let status = ImportFile::parse(payload).unwrap_err();
            assert!(status.is_invalid_argument());
        }
    }

    #[test]
    fn export_reimports_to_same_set() {
        let set = BTreeSet::from([4, 8, 15, 16, 23, 42]);
        let export = ExportFile::new(&set, 6, 151, 4);
        let bytes = serde_json::to_vec(&export).unwrap();

        let import = ImportFile::parse(&bytes).unwrap();
        assert_eq!(import.pokemon_ids.into_iter().collect::<BTreeSet<_>>(), set);
    }

    #[test]
    fn export_file_name_uses_day() {
        let export = ExportFile {
            date: "2024-05-01T10:00:00.000Z".to_owned(),
            total: 0,
            caught: 0,
            percentage: 0,
            pokemon_ids: vec![],
        };
        assert_eq!(export.file_name(), "shiny-dex-2024-05-01.json");
    }
}
