pub mod commands;
pub mod environment;
mod mail;
mod store;
