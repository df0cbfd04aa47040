use std::path::PathBuf;
use std::time::Duration;
use rocket::figment::{self, Figment};
use serde::Deserialize;
use tracing::warn;
use crate::connection::CredentialSource;
use crate::generator::{DEFAULT_ENDPOINT, DEFAULT_MODEL, DEFAULT_TEMPERATURE};

pub const TEXTKEY_SECRET: &str = "textkey";
pub const OPENAI_KEY_SECRET: &str = "OPENAI_API_KEY";
pub const ADMIN_PASSWORD_SECRET: &str = "ADMIN_PASSWORD";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub admin_password: String,
    pub catalog_path: PathBuf,
    pub openai_endpoint: String,
    pub openai_model: String,
    pub temperature: f32,
    pub openai_api_key: Option<String>,
    pub store_timeout_secs: u64,
    pub generation_timeout_secs: u64,
    pub cors_origin_prefix: String,
    pub textkey: Option<CredentialSource>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            admin_password: "party".into(),
            catalog_path: PathBuf::from("geburtstags_daten.csv"),
            openai_endpoint: DEFAULT_ENDPOINT.into(),
            openai_model: DEFAULT_MODEL.into(),
            temperature: DEFAULT_TEMPERATURE,
            openai_api_key: None,
            store_timeout_secs: 10,
            generation_timeout_secs: 60,
            cors_origin_prefix: "http://localhost".into(),
            textkey: None,
        }
    }
}

impl AppConfig {
    /// Fails on malformed values instead of quietly resetting the admin password or store credentials.
    pub fn from_figment(figment: &Figment) -> Result<Self, figment::Error> {
        let mut config: AppConfig = figment.extract()?;
        config.textkey = config.textkey.filter(|source| !source.is_blank());
        Ok(config)
    }

    /// Secrets win over file and environment configuration.
    pub fn with_secrets<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(TEXTKEY_SECRET).map(CredentialSource::JsonString) {
            Some(source) if !source.is_blank() => self.textkey = Some(source),
            Some(_) => warn!("{} secret is empty - treating the vote store as not configured", TEXTKEY_SECRET),
            None => {}
        }
        if let Some(api_key) = lookup(OPENAI_KEY_SECRET) {
            self.openai_api_key = Some(api_key);
        }
        match lookup(ADMIN_PASSWORD_SECRET) {
            Some(password) if !password.trim().is_empty() => self.admin_password = password,
            Some(_) => warn!("{} secret is empty - keeping configured password", ADMIN_PASSWORD_SECRET),
            None => {}
        }
        self
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs.max(1))
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs.max(1))
    }
}
