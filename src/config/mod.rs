use serde::Deserialize;

/// Zencoder connection settings, read from `ZENCODER_*` environment variables.
#[derive(Debug, Deserialize)]
pub struct ZencoderConfig {
    /// API key sent on every request. Never logged.
    pub api_key: String,

    /// API root URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    "https://app.zencoder.com/api/v2".to_string()
}

impl ZencoderConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::prefixed("ZENCODER_").from_env()
    }
}
