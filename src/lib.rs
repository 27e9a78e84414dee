//! livecheck - Concurrent, rate-limited endpoint liveness prober
//!
//! Probes a list of endpoints with HEAD requests, classifies them by HTTP
//! status class, and writes newline-separated endpoint lists per class.
//! Admissions are paced by a rate limiter and bounded by a concurrency
//! semaphore; Ctrl+C stops new admissions and drains in-flight probes.
//!
//! # Architecture
//!
//! - [`config`] - Configuration management and validation
//! - [`input`] - Endpoint list loading from file or stdin
//! - [`probe`] - Endpoint normalization and HEAD probing
//! - [`runner`] - Rate-limited dispatch, aggregation, cancellation
//! - [`report`] - Classification buckets and output artifacts
//! - [`error`] - Error types
//!
//! # Example
//!
//! ```no_run
//! use livecheck::config::Config;
//! use livecheck::runner::{shutdown::ShutdownSignal, ProbeRunner};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let runner = ProbeRunner::new(&config)?;
//!     let shutdown = ShutdownSignal::new();
//!     let buckets = runner
//!         .run(vec![String::from("example.com")], &shutdown)
//!         .await?;
//!     println!("{} endpoints classified", buckets.total());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod input;
pub mod probe;
pub mod report;
pub mod runner;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{FilterError, ProbeError, ReportError};
    pub use crate::probe::outcome::{ClassKey, ProbeOutcome, StatusFilter};
    pub use crate::probe::Prober;
    pub use crate::report::{ClassificationBuckets, ReportWriter};
    pub use crate::runner::shutdown::ShutdownSignal;
    pub use crate::runner::{ProbeRunner, StatsSnapshot};
}
