//! Error types for the livecheck prober
//!
//! This module defines custom error types used throughout the application.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while setting up or issuing probes
#[derive(Error, Debug)]
pub enum ProbeError {
    /// HTTP client construction or request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint could not be parsed even after normalization
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Errors that can occur while parsing a status-class filter
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FilterError {
    /// Selector does not have the `Nxx` shape
    #[error("Invalid status class selector: {0:?} (expected e.g. \"2xx\")")]
    InvalidSelector(String),

    /// Selector digit is outside the 1-5 status class range
    #[error("Status class out of range: {0:?}")]
    ClassOutOfRange(String),

    /// Filter string contained no selectors
    #[error("Empty status class filter")]
    Empty,
}

/// Errors that can occur while writing report artifacts
#[derive(Error, Debug)]
pub enum ReportError {
    /// Failed to create or write an output file
    #[error("Failed to write output file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
