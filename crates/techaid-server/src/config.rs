//! Layered application configuration.
//!
//! Sources, later ones winning: `config/base.toml`, `config/{APP_ENV}.toml`,
//! `config/local.toml`, then `TECHAID__SECTION__KEY` environment variables.

use std::env;
use std::path::Path;

use anyhow::{Context, Result};
use config::{Environment, File};
use serde::Deserialize;
use techaid_auth::AuthConfig;
use techaid_db::DbConfig;
use techaid_service::{AssignmentPolicy, SmtpConfig};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DbConfig,
    pub auth: AuthConfig,
    /// Absent: emails are logged, not sent.
    pub smtp: Option<SmtpConfig>,
    pub tickets: AssignmentPolicy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Browser origin allowed by CORS. `None` allows any origin.
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".into(),
            cors_origin: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let environment = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let config_dir = env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        let mut builder = config::Config::builder();
        for name in ["base".to_string(), environment, "local".to_string()] {
            let path = Path::new(&config_dir).join(format!("{name}.toml"));
            if path.exists() {
                builder = builder.add_source(File::from(path));
            }
        }
        builder = builder.add_source(
            Environment::with_prefix("TECHAID")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_private_key_pem.trim().is_empty()
            || self.auth.jwt_public_key_pem.trim().is_empty()
        {
            anyhow::bail!("auth.jwt_private_key_pem and auth.jwt_public_key_pem must be set");
        }
        if self.auth.min_password_length == 0 {
            anyhow::bail!("auth.min_password_length must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_need_signing_keys() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert!(!config.tickets.allow_reassign_active);
        assert!(config.smtp.is_none());
        assert!(config.validate().is_err());
    }

    #[test]
    fn nested_sections_deserialize() {
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                [server]
                bind = "127.0.0.1:9000"

                [auth]
                jwt_private_key_pem = "private"
                jwt_public_key_pem = "public"

                [smtp]
                host = "smtp.optimusbank.com"
                sender = "support@optimusbank.com"

                [tickets]
                allow_reassign_active = true
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.bind, "127.0.0.1:9000");
        assert!(config.tickets.allow_reassign_active);
        let smtp = config.smtp.as_ref().expect("smtp section");
        assert_eq!(smtp.port, 587);
        assert_eq!(smtp.sender_name, "Support");
        assert_eq!(config.auth.access_token_lifetime_secs, 900);
        assert!(config.validate().is_ok());
    }
}
