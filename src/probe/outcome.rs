//! Probe outcomes and status classification
//!
//! Every completed probe produces a [`ProbeOutcome`]. An outcome carries a
//! status code only when the request reached the server; transport failures
//! (DNS, connect, timeout, TLS) carry no status and classify as unreachable.

use std::fmt;
use std::str::FromStr;

use crate::error::FilterError;

/// Result of one liveness probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Normalized endpoint that was probed
    pub endpoint: String,

    /// HTTP status code, `None` on transport failure
    pub status: Option<u16>,
}

impl ProbeOutcome {
    /// Create an outcome for a probe that received a response
    pub fn responded(endpoint: impl Into<String>, status: u16) -> Self {
        Self {
            endpoint: endpoint.into(),
            status: Some(status),
        }
    }

    /// Create an outcome for a probe that failed at the transport level
    pub fn unreachable(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            status: None,
        }
    }

    /// Classification key for this outcome
    pub fn class_key(&self) -> ClassKey {
        match self.status {
            Some(status) => ClassKey::Status((status / 100) as u8),
            None => ClassKey::Unreachable,
        }
    }
}

/// Key a classified outcome is bucketed under
///
/// `Status(2)` groups all 2xx responses. Transport failures get their own
/// bucket rather than being dropped, so a cancelled or fully-failed run
/// still accounts for every completed probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClassKey {
    /// Leading digit of the status code (2 for 2xx, 4 for 4xx, ...)
    Status(u8),

    /// Transport-level failure, no status available
    Unreachable,
}

impl ClassKey {
    /// Suffix used for per-class output artifacts, e.g. `2xx` or `unreachable`
    pub fn suffix(&self) -> String {
        match self {
            Self::Status(class) => format!("{class}xx"),
            Self::Unreachable => String::from("unreachable"),
        }
    }
}

impl fmt::Display for ClassKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.suffix())
    }
}

/// Status-class filter parsed from a selector list like `2xx,3xx`
///
/// When configured, only outcomes whose status class matches one of the
/// selectors are written to the report. Unreachable outcomes never match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusFilter {
    // Index 1..=5 holds whether that class is selected.
    classes: [bool; 6],
}

impl StatusFilter {
    /// Check whether a status code matches the filter
    pub fn matches(&self, status: u16) -> bool {
        self.matches_class((status / 100) as u8)
    }

    /// Check whether a status class digit matches the filter
    pub fn matches_class(&self, class: u8) -> bool {
        usize::from(class) < self.classes.len() && self.classes[usize::from(class)]
    }

    /// Check whether a classification key matches the filter
    pub fn matches_key(&self, key: &ClassKey) -> bool {
        match key {
            ClassKey::Status(class) => self.matches_class(*class),
            ClassKey::Unreachable => false,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = FilterError;

    /// Parse a comma-separated selector list
    ///
    /// Each selector must be a single class digit followed by `xx`, e.g.
    /// `2xx`. Malformed selectors are rejected rather than skipped, so a
    /// typo cannot silently widen or narrow the report.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut classes = [false; 6];
        let mut seen = false;

        for part in s.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            let digit = part
                .strip_suffix("xx")
                .filter(|prefix| prefix.len() == 1)
                .and_then(|prefix| prefix.chars().next())
                .and_then(|c| c.to_digit(10))
                .ok_or_else(|| FilterError::InvalidSelector(part.to_string()))?;

            if !(1..=5).contains(&digit) {
                return Err(FilterError::ClassOutOfRange(part.to_string()));
            }

            classes[digit as usize] = true;
            seen = true;
        }

        if !seen {
            return Err(FilterError::Empty);
        }

        Ok(Self { classes })
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (class, selected) in self.classes.iter().enumerate() {
            if *selected {
                if !first {
                    write!(f, ",")?;
                }
                write!(f, "{class}xx")?;
                first = false;
            }
        }
        Ok(())
    }
}
