use std::{net::IpAddr, path::Path};

use anyhow::{ensure, Context};
use config::{Environment, File, FileFormat};
use portfolio_models::email_address::EmailAddress;
use serde::Deserialize;
use url::Url;

pub use duration::Duration;

mod duration;

pub const DEFAULT_CONFIG_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../config.toml");

/// Colon separated list of additional config files, applied after the
/// default config.
pub const CONFIG_PATHS_ENV: &str = "PORTFOLIO_CONFIG";

/// Environment variables like `PORTFOLIO_STORE__API_KEY` override single
/// config values.
pub const ENV_PREFIX: &str = "PORTFOLIO";

pub fn load() -> anyhow::Result<Config> {
    let extra_paths = std::env::var(CONFIG_PATHS_ENV).unwrap_or_default();
    let paths = std::iter::once(DEFAULT_CONFIG_PATH)
        .chain(extra_paths.split(':').filter(|path| !path.is_empty()))
        .collect::<Vec<_>>();
    load_with_override(&paths, &[])
}

pub fn load_with_override(
    paths: &[impl AsRef<Path>],
    overrides: &[&str],
) -> anyhow::Result<Config> {
    let builder = paths
        .iter()
        .try_fold(config::Config::builder(), |builder, path| {
            let path = path.as_ref();
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file at {}", path.display()))?;
            let source = File::from_str(&content, FileFormat::Toml);
            anyhow::Ok(builder.add_source(source))
        })?
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    let config = overrides
        .iter()
        .fold(builder, |builder, &source| {
            builder.add_source(File::from_str(source, FileFormat::Toml))
        })
        .build()?
        .try_deserialize::<Config>()
        .context("Failed to load config")?;

    config.validate()?;
    Ok(config)
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub http: HttpConfig,
    pub contact: ContactConfig,
    pub messages: MessagesConfig,
    pub store: StoreConfig,
    pub mail: MailConfig,
}

impl Config {
    fn validate(&self) -> anyhow::Result<()> {
        let missing = [
            ("store.project_id", &self.store.project_id),
            ("store.api_key", &self.store.api_key),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(key, _)| key)
        .collect::<Vec<_>>();

        ensure!(
            missing.is_empty(),
            "Missing required store configuration: {}",
            missing.join(", ")
        );

        let zero = [
            ("contact.timeout", self.contact.timeout),
            ("messages.poll_interval", self.messages.poll_interval),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_zero())
        .map(|(key, _)| key)
        .collect::<Vec<_>>();

        ensure!(
            zero.is_empty(),
            "Durations must not be zero: {}",
            zero.join(", ")
        );

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Bearer token for the read-only messages endpoint. The endpoint is
    /// disabled without one.
    pub admin_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContactConfig {
    pub recipient: EmailAddress,
    pub owner_name: String,
    pub collection: String,
    pub timeout: Duration,
    pub success_mail_delay: Duration,
    pub status_display: Duration,
}

#[derive(Debug, Deserialize)]
pub struct MessagesConfig {
    pub limit: u32,
    pub poll_interval: Duration,
}

#[derive(Debug, Deserialize)]
pub struct StoreConfig {
    pub endpoint: Url,
    #[serde(default)]
    pub project_id: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default)]
    pub api_key: String,
}

fn default_database() -> String {
    "(default)".into()
}

#[derive(Debug, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum MailConfig {
    /// Open the platform mail composer with a `mailto:` link.
    Mailto { opener: Option<String> },
    /// Deliver through an SMTP relay.
    Smtp { smtp_url: String, from: EmailAddress },
}
