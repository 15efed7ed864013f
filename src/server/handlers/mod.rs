pub mod chat;
pub mod home;
pub mod metrics;
