use std::sync::Arc;

use portfolio_api_rest::RestServerConfig;
use portfolio_config::Config;
use portfolio_core_contact_impl::ContactFeatureConfig;
use portfolio_core_messages_impl::MessagesFeatureConfig;
use types::{ContactFeature, Mail, MessagesFeature, RestServer, Store, Time};

use crate::{mail, store};

pub mod types;

/// Builds the services from the configured adapters. The store and mail
/// clients are shared by every service created by the same provider.
#[derive(Debug, Clone)]
pub struct Provider {
    store: Arc<Store>,
    mail: Arc<Mail>,
    config: ConfigProvider,
}

impl Provider {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            store: store::connect(&config.store)?.into(),
            mail: mail::connect(&config.mail).await?.into(),
            config: ConfigProvider::new(config),
        })
    }

    pub fn contact_feature(&self) -> ContactFeature {
        ContactFeature::new(
            Time::default(),
            Arc::clone(&self.store),
            Arc::clone(&self.mail),
            self.config.contact_feature_config.clone(),
        )
    }

    pub fn messages_feature(&self) -> MessagesFeature {
        MessagesFeature::new(
            Arc::clone(&self.store),
            self.config.messages_feature_config.clone(),
        )
    }

    pub fn rest_server(&self) -> RestServer {
        RestServer::new(
            self.contact_feature(),
            self.messages_feature(),
            self.config.rest_server_config.clone(),
        )
    }
}

/// The parts of the configuration the services are built from
#[derive(Debug, Clone)]
pub struct ConfigProvider {
    pub rest_server_config: RestServerConfig,
    pub contact_feature_config: ContactFeatureConfig,
    pub messages_feature_config: MessagesFeatureConfig,
}

impl ConfigProvider {
    pub fn new(config: &Config) -> Self {
        // API
        let rest_server_config = RestServerConfig {
            admin_token: config.http.admin_token.as_deref().map(Into::into),
        };

        // Core
        let contact_feature_config = ContactFeatureConfig {
            recipient: config.contact.recipient.clone(),
            owner_name: config.contact.owner_name.as_str().into(),
            collection: config.contact.collection.as_str().into(),
            timeout: *config.contact.timeout,
            success_mail_delay: *config.contact.success_mail_delay,
            status_display: *config.contact.status_display,
        };

        let messages_feature_config = MessagesFeatureConfig {
            collection: config.contact.collection.as_str().into(),
            limit: config.messages.limit,
            poll_interval: *config.messages.poll_interval,
        };

        Self {
            rest_server_config,
            contact_feature_config,
            messages_feature_config,
        }
    }
}
