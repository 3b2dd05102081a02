use std::{env, path::PathBuf};

/// Credentials of the shared remote backend.
#[derive(Debug, Clone, Default)]
pub struct RemoteConfig {
    pub api_key: String,
    pub project_id: String,
}

impl RemoteConfig {
    pub fn from_env() -> Self {
        RemoteConfig {
            api_key: env::var("FIREBASE_API_KEY").unwrap_or_default(),
            project_id: env::var("FIREBASE_PROJECT_ID").unwrap_or_default(),
        }
    }

    /// True when the credentials look like a real project rather than the
    /// placeholders shipped with the sample configuration.
    pub fn is_configured(&self) -> bool {
        !is_placeholder(&self.api_key) && !is_placeholder(&self.project_id)
    }
}

fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    value.is_empty()
        || PLACEHOLDERS.contains(&value)
        || (value.starts_with('<') && value.ends_with('>'))
}

const PLACEHOLDERS: [&str; 4] = [
    "VOTRE_API_KEY",
    "VOTRE_PROJECT_ID",
    "YOUR_API_KEY",
    "YOUR_PROJECT_ID",
];

/// Default location of the device-scoped key-value storage file.
pub fn default_storage_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(env::temp_dir)
        .join("shiny_dex")
        .join("local_storage.json")
}
