//! Background workers

pub mod mailer;

pub use mailer::{EmailJob, HttpRelayBackend, LogBackend, MailBackend, MailQueue, MailerConfig};
