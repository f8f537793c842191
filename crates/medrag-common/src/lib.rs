//! Common utilities and patterns shared across medrag crates
//!
//! Error-handling conventions, process initialization, and logging setup
//! used by the library crates and the `medrag` binary.

pub mod error;
pub mod init;
pub mod logging;

pub use error::CommonError;
pub use init::initialize_environment;
pub use logging::{LogGuards, LoggingOptions, init_tracing};
