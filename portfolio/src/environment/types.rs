use portfolio_core_contact_impl::ContactFeatureServiceImpl;
use portfolio_core_messages_impl::MessagesFeatureServiceImpl;
use portfolio_mail_impl::MailClientImpl;
use portfolio_shared_impl::time::TimeServiceImpl;
use portfolio_store_firestore::FirestoreMessageStore;

// API
pub type RestServer = portfolio_api_rest::RestServer<ContactFeature, MessagesFeature>;

// Adapters
pub type Store = FirestoreMessageStore;
pub type Mail = MailClientImpl;

// Shared
pub type Time = TimeServiceImpl;

// Core
pub type ContactFeature = ContactFeatureServiceImpl<Time, Store, Mail>;
pub type MessagesFeature = MessagesFeatureServiceImpl<Store>;
