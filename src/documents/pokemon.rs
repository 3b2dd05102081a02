use serde::{Deserialize, Serialize};

/// An entry of the static catalog. Field names follow the catalog file.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct Pokemon {
    pub id: u64,

    #[serde(rename = "numero")]
    pub number: u32,

    #[serde(rename = "nom")]
    pub name: String,

    #[serde(rename = "nomEn")]
    #[serde(default)]
    pub name_en: String,

    #[serde(default)]
    pub types: Vec<String>,

    #[serde(default)]
    pub location: String,
}

impl Pokemon {
    /// Display number padded to three digits, e.g. `#025`.
    pub fn display_number(&self) -> String {
        format!("#{:03}", self.number)
    }
}
