use std::{process::Stdio, sync::Arc};

use anyhow::{ensure, Context};
use portfolio_mail_contracts::{MailClient, MailDraft};
use tokio::process::Command;
use tracing::{info, warn};

pub const DEFAULT_OPENER: &str = "xdg-open";

/// Opens the platform mail composer by passing a `mailto:` link to an
/// opener command.
#[derive(Debug, Clone)]
pub struct MailtoMailClient {
    opener: Arc<str>,
}

impl MailtoMailClient {
    pub fn new(opener: Option<&str>) -> Self {
        Self {
            opener: opener.unwrap_or(DEFAULT_OPENER).into(),
        }
    }

    fn command(&self, link: &str) -> Command {
        let mut command = Command::new(&*self.opener);
        command
            .arg(link)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        command
    }

    async fn open(&self, link: &str) -> anyhow::Result<()> {
        let status = self
            .command(link)
            .status()
            .await
            .with_context(|| format!("Failed to run {:?}", self.opener))?;
        ensure!(status.success(), "{:?} exited with {status}", self.opener);
        Ok(())
    }
}

impl MailClient for MailtoMailClient {
    #[tracing::instrument(skip_all, fields(recipient = %draft.recipient))]
    async fn compose(&self, draft: MailDraft) {
        let link = draft.mailto_link();
        info!("Opening mail composer");

        if let Err(err) = self.open(&link).await {
            warn!(%link, "Failed to open mail composer: {err:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsStr;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn command_passes_link() {
        let sut = MailtoMailClient::new(None);

        let command = sut.command("mailto:owner@example.com?subject=Hi");

        let command = command.as_std();
        assert_eq!(command.get_program(), DEFAULT_OPENER);
        assert_eq!(
            command.get_args().collect::<Vec<_>>(),
            [OsStr::new("mailto:owner@example.com?subject=Hi")]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn open_reports_exit_status() {
        assert!(MailtoMailClient::new(Some("true")).open("mailto:a@b.c").await.is_ok());
        assert!(MailtoMailClient::new(Some("false")).open("mailto:a@b.c").await.is_err());
        assert!(MailtoMailClient::new(Some("/nonexistent/opener"))
            .open("mailto:a@b.c")
            .await
            .is_err());
    }
}
