//! Deploy State Library
//!
//! Loads deployment-state documents and resolves a named environment into a
//! single merged map of values from its layered values and secrets files.

pub mod capability;
pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod helmexec;
pub mod logging;
pub mod render;
pub mod state;

pub use capability::{Collaborators, Decryptor, FileReader, OsFileReader, Renderer};
pub use error::{ErrorCode, LoadCause, StateError, StateResult};
pub use logging::Logger;
pub use state::{DEFAULT_ENV, Environment, State, create_from_yaml};
