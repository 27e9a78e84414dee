//! Liveness probing with a shared HTTP client
//!
//! A probe is a single HEAD request against one normalized endpoint. HEAD
//! keeps the check lightweight: status arrives without transferring a
//! response body. Transport failures are not errors at this layer, they
//! become unreachable outcomes so the aggregator can account for them.

pub mod endpoint;
pub mod outcome;

use std::time::Duration;

use reqwest::Client;

use crate::error::ProbeError;
use crate::probe::outcome::ProbeOutcome;

/// Issues liveness probes against individual endpoints
///
/// One prober is shared by all worker tasks; `reqwest::Client` handles
/// connection pooling internally.
#[derive(Debug, Clone)]
pub struct Prober {
    /// HTTP client with configured timeout
    client: Client,
}

impl Prober {
    /// Create a new prober
    ///
    /// # Errors
    ///
    /// Returns `ProbeError::Http` if the HTTP client cannot be created.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }

    /// Probe one endpoint and classify the result
    ///
    /// The endpoint is normalized first, so callers may pass bare hosts.
    /// Every attempt is reported through tracing before the outcome is
    /// returned; with `--verbose` these lines reach the operator.
    pub async fn probe(&self, raw_endpoint: &str) -> ProbeOutcome {
        let target = endpoint::normalize(raw_endpoint);

        // Reject endpoints that cannot form a request target without
        // spending a network round trip on them.
        if let Err(e) = endpoint::parse(&target) {
            tracing::debug!(endpoint = %target, error = %e, "endpoint rejected");
            return ProbeOutcome::unreachable(target);
        }

        match self.client.head(&target).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                tracing::debug!(endpoint = %target, status, "probe completed");
                ProbeOutcome::responded(target, status)
            }
            Err(e) => {
                tracing::debug!(endpoint = %target, error = %e, "probe failed");
                ProbeOutcome::unreachable(target)
            }
        }
    }
}
