use portfolio_config::Config;
use tracing::info;

use crate::environment::Provider;

pub async fn serve(config: Config) -> anyhow::Result<()> {
    let provider = Provider::new(&config).await?;
    let server = provider.rest_server();

    if config.http.admin_token.is_none() {
        info!("No admin token configured, the messages endpoint is disabled");
    }
    info!(
        "Starting http server on {}:{}",
        config.http.host, config.http.port
    );
    server.serve(config.http.host, config.http.port).await
}
