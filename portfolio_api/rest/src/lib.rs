use std::{net::IpAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use portfolio_core_contact_contracts::ContactFeatureService;
use portfolio_core_messages_contracts::MessagesFeatureService;
use portfolio_utils::Apply;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

mod extractors;
mod middlewares;
mod models;
mod routes;

#[derive(Debug, Clone)]
pub struct RestServer<Contact, Messages> {
    contact: Contact,
    messages: Messages,
    config: RestServerConfig,
}

#[derive(Debug, Clone, Default)]
pub struct RestServerConfig {
    /// Bearer token for the messages endpoint, which is not mounted
    /// without one.
    pub admin_token: Option<Arc<str>>,
}

impl<Contact, Messages> RestServer<Contact, Messages>
where
    Contact: ContactFeatureService,
    Messages: MessagesFeatureService,
{
    pub fn new(contact: Contact, messages: Messages, config: RestServerConfig) -> Self {
        Self {
            contact,
            messages,
            config,
        }
    }

    pub async fn serve(self, host: IpAddr, port: u16) -> anyhow::Result<()> {
        let router = self.router();
        let listener = TcpListener::bind((host, port))
            .await
            .with_context(|| format!("Failed to bind to {host}:{port}"))?;
        info!("Listening on http://{host}:{port}");
        axum::serve(listener, router).await.map_err(Into::into)
    }

    fn router(self) -> Router<()> {
        Router::new()
            .merge(routes::contact::router(self.contact.into()))
            .apply_map(self.config.admin_token, |router, token| {
                router.merge(routes::messages::router(self.messages.into(), token))
            })
            .layer(CorsLayer::permissive())
            .apply(middlewares::trace::add)
            .apply(middlewares::request_id::add)
    }
}
