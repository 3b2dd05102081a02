use serde::{Deserialize, Serialize};

/// The singleton document shared by every client in synchronized mode.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct SharedProgress {
    #[serde(rename = "caughtPokemon")]
    #[serde(default)]
    pub caught_pokemon: Option<Vec<u64>>,

    #[serde(rename = "lastUpdate")]
    #[serde(default)]
    pub last_update: String,

    #[serde(rename = "totalPokemon")]
    #[serde(default)]
    pub total_pokemon: usize,
}

impl SharedProgress {
    /// Builds a full snapshot of `ids` stamped with the current time.
    pub fn new(ids: Vec<u64>, total_pokemon: usize) -> Self {
        SharedProgress {
            caught_pokemon: Some(ids),
            last_update: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            total_pokemon,
        }
    }
}
