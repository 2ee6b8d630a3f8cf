use clap::Args;
use futures::StreamExt;
use portfolio_config::Config;
use portfolio_core_messages_contracts::{MessagesFeatureService, MessagesSnapshot};

use crate::environment::Provider;

#[derive(Debug, Args)]
pub struct MessagesCommand {
    /// Keep running and print the list again whenever it changes
    #[arg(short, long)]
    follow: bool,
}

impl MessagesCommand {
    pub async fn invoke(self, config: Config) -> anyhow::Result<()> {
        let provider = Provider::new(&config).await?;
        let messages = provider.messages_feature();

        if !self.follow {
            print_messages(&messages.list_recent().await?);
            return Ok(());
        }

        let mut snapshots = messages.watch();
        while let Some(snapshot) = snapshots.next().await {
            print_messages(&snapshot?);
        }

        Ok(())
    }
}

fn print_messages(messages: &MessagesSnapshot) {
    println!("{} message(s)", messages.len());
    for stored in messages {
        let message = &stored.record.message;
        println!(
            "\n[{}] {} <{}> ({})",
            stored.record.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            *message.name,
            *message.email,
            stored.id
        );
        for line in message.content.lines() {
            println!("    {line}");
        }
    }
}
