//! Data structures passed across the public API.

use serde::{Deserialize, Serialize};

/// Confidence for an address observed on the domain's own pages with a parsable name.
pub const CONFIDENCE_WEBSITE: f32 = 0.8;
/// Confidence for an observed address whose local-part yields no name.
pub const CONFIDENCE_WEBSITE_UNPARSED: f32 = 0.7;
/// Confidence for the primary pattern once its domain passes the reachability check.
pub const CONFIDENCE_PATTERN: f32 = 0.7;
/// Confidence for an alternate built-in pattern that passes the reachability check.
pub const CONFIDENCE_ALTERNATE_PATTERN: f32 = 0.6;
/// Confidence for the unverified last-resort guess.
pub const CONFIDENCE_GUESS: f32 = 0.3;

/// How a candidate address was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateSource {
    Website,
    Pattern,
    Guess,
}

impl std::fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CandidateSource::Website => write!(f, "website"),
            CandidateSource::Pattern => write!(f, "pattern"),
            CandidateSource::Guess => write!(f, "guess"),
        }
    }
}

/// A discovered or generated address with its provenance.
///
/// The address is stored lower-cased, which is also its uniqueness key.
/// Confidence is always within `[0, 1]` and can only be raised after
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailCandidate {
    pub address: String,
    pub local_part: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub position: Option<String>,
    pub confidence: f32,
    pub source: CandidateSource,
    pub verified: bool,
}

impl EmailCandidate {
    pub fn new(address: &str, source: CandidateSource, confidence: f32) -> Self {
        let address = address.trim().to_lowercase();
        let local_part = address
            .split_once('@')
            .map(|(local, _)| local.to_string())
            .unwrap_or_else(|| address.clone());
        Self {
            address,
            local_part,
            first_name: None,
            last_name: None,
            position: None,
            confidence: clamp_confidence(confidence),
            source,
            verified: false,
        }
    }

    pub fn with_names(mut self, first: Option<String>, last: Option<String>) -> Self {
        self.first_name = first.filter(|s| !s.is_empty());
        self.last_name = last.filter(|s| !s.is_empty());
        self
    }

    pub fn with_position(mut self, position: Option<String>) -> Self {
        self.position = position.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn verified(mut self, verified: bool) -> Self {
        self.verified = verified;
        self
    }

    pub fn domain(&self) -> &str {
        self.address
            .split_once('@')
            .map(|(_, domain)| domain)
            .unwrap_or("")
    }
}

fn clamp_confidence(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Input for a targeted lookup of one person.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FindOneRequest {
    pub domain: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    /// Optional pattern template such as `{first}.{last}@{domain}`.
    #[serde(default)]
    pub pattern: Option<String>,
}

impl FindOneRequest {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            ..Self::default()
        }
    }

    pub fn first_name(mut self, value: impl Into<String>) -> Self {
        self.first_name = Some(value.into());
        self
    }

    pub fn last_name(mut self, value: impl Into<String>) -> Self {
        self.last_name = Some(value.into());
        self
    }

    pub fn position(mut self, value: impl Into<String>) -> Self {
        self.position = Some(value.into());
        self
    }

    pub fn pattern(mut self, value: impl Into<String>) -> Self {
        self.pattern = Some(value.into());
        self
    }
}

/// Outcome of one entry in a batch of targeted lookups.
#[derive(Debug, Clone, Serialize)]
pub struct LookupResult {
    pub request: FindOneRequest,
    pub candidate: Option<EmailCandidate>,
    pub error: Option<String>,
}

impl LookupResult {
    pub(crate) fn found(request: FindOneRequest, candidate: EmailCandidate) -> Self {
        Self {
            request,
            candidate: Some(candidate),
            error: None,
        }
    }

    pub(crate) fn failed(request: FindOneRequest, error: String) -> Self {
        Self {
            request,
            candidate: None,
            error: Some(error),
        }
    }
}
