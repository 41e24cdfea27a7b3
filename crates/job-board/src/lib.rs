//! Job board service core: companies, postings and applications with ownership rules,
//! referential integrity between the documents, and the REST surface over them.

pub mod board;
pub mod config;
pub mod error;
pub mod telemetry;

pub use board::{board_router, InMemoryStore, JobBoard};
pub use config::{AppConfig, BoardConfig};
pub use error::AppError;
