//! Process bootstrap, configuration, and HTTP control surface around the
//! table manager core.

pub mod config;
pub mod error;
pub mod router;

pub use config::Config;
pub use router::router;
