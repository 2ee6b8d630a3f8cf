use std::{ops::Deref, sync::LazyLock};

use anyhow::Context;
use portfolio_utils::portfolio_version;

pub static USER_AGENT: LazyLock<String> = LazyLock::new(|| {
    let repository = env!("CARGO_PKG_REPOSITORY");
    let version = portfolio_version();

    format!("Portfolio Contact Backend ({repository}, Version {version})")
});

const _: () = {
    assert!(!env!("CARGO_PKG_REPOSITORY").is_empty());
};

#[derive(Debug, Clone)]
pub struct HttpClient(reqwest::Client);

impl HttpClient {
    pub fn new() -> anyhow::Result<Self> {
        reqwest::Client::builder()
            .user_agent(&*USER_AGENT)
            .build()
            .map(Self)
            .context("Failed to build http client")
    }
}

impl Deref for HttpClient {
    type Target = reqwest::Client;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
