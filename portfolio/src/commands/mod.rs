pub mod messages;
pub mod serve;
pub mod submit;
