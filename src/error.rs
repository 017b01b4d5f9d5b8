//! Typed error hierarchy for the MPD engine.
//!
//! Every error kind named in the specification (InvalidArgument, InvalidMesh,
//! InvalidChemistry, NumericalError, FileSystemError, ExternalToolFailure,
//! ConfigError) is a variant here. Each variant carries the fields needed to
//! print the single diagnostic line the engine owes the user: the failing
//! component, the failing invariant or tool, and the offending value.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("[{component}] invalid argument: {what} (got {value})")]
    InvalidArgument {
        component: &'static str,
        what: &'static str,
        value: String,
    },

    #[error("[{component}] invalid mesh: {invariant} (got {value})")]
    InvalidMesh {
        component: &'static str,
        invariant: &'static str,
        value: String,
    },

    #[error("[{component}] invalid chemistry: {what} (got {value})")]
    InvalidChemistry {
        component: &'static str,
        what: &'static str,
        value: String,
    },

    #[error("[{component}] numerical error: {what} (got {value})")]
    NumericalError {
        component: &'static str,
        what: &'static str,
        value: String,
    },

    #[error("[{component}] filesystem error on {path}: {source}")]
    FileSystemError {
        component: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("[{component}] external tool '{tool}' failed with exit status {status}")]
    ExternalToolFailure {
        component: &'static str,
        tool: &'static str,
        status: i32,
    },

    #[error("[{component}] configuration error: {what}")]
    ConfigError {
        component: &'static str,
        what: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
