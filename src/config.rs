use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub user_agent: String,
    pub bearer_token: Option<String>,
    pub request_timeout_seconds: u64,
    /// Pause before pricing each complex.
    pub request_delay_ms: u64,
    /// Pause after listing the complexes of every selected town.
    pub town_delay_ms: u64,
    /// How many years of transactions to ask for.
    pub price_years: u32,
    pub max_price_pages: u32,
    pub real_estate_type: String,
    pub db_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "https://new.land.naver.com".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            bearer_token: None,
            request_timeout_seconds: 30,
            request_delay_ms: 150,
            town_delay_ms: 1000,
            price_years: 5,
            max_price_pages: 20,
            real_estate_type: "APT".to_string(),
            db_path: "land.db".to_string(),
        }
    }
}

/// Loads the config file, falling back to defaults when it does not exist.
pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("No config at {}, using defaults", path);
            return Ok(AppConfig::default());
        }
        Err(e) => return Err(e.into()),
    };
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_gives_defaults() {
        let cfg = load_config("/nonexistent/land-scout/config.json").unwrap();
        assert_eq!(cfg.request_delay_ms, 150);
        assert_eq!(cfg.real_estate_type, "APT");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "bearer_token": "abc", "price_years": 3 }}"#).unwrap();

        let cfg = load_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(cfg.bearer_token.as_deref(), Some("abc"));
        assert_eq!(cfg.price_years, 3);
        assert_eq!(cfg.db_path, "land.db");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            load_config(file.path().to_str().unwrap()),
            Err(ConfigError::Parse(_))
        ));
    }
}
