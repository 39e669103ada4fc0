//! # TecnoBot Core
//!
//! Shared foundation for the TecnoBot workspace: configuration, the error
//! taxonomy, chat message types, and the capability traits (`Provider`,
//! `Embedder`, `Retriever`) the other crates implement or consume.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::TecnobotConfig;
pub use error::{Result, TecnobotError};
