//! Lyceum - e-learning platform backend
//!
//! A catalog of courses composed from modules, lessons and materials
//! through ordered mapper tables, with roadmaps and career paths layered
//! above, plus enrollments, JWT/OTP/OAuth authentication, an in-process
//! mail queue and streaming study-workspace chat.
//!
//! ## Services
//!
//! - **Catalog**: transactional course/roadmap/career-path writers
//! - **Composition**: nested detail readers sorted by mapper position
//! - **Enrollments**: enroll/cancel/progress with schema-backed invariants
//! - **Auth**: JWT access tokens, refresh tokens, one-time codes, OAuth
//! - **Chat**: cancellable streaming replies bridged from an upstream
//! - **Mail**: bounded queue with retry and exponential backoff

pub mod auth;
pub mod chat;
pub mod config;
pub mod db;
pub mod logging;
pub mod routes;
pub mod server;
pub mod services;
pub mod types;
pub mod worker;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{LyceumError, Result};
