//! Naming-pattern detection and address generation.
//!
//! A [`Pattern`] is one of a fixed set of local-part templates over the
//! placeholders `{first}`, `{last}` and `{first_initial}`. Templates are parsed
//! once, so a malformed template is rejected before anything is generated.

use crate::core::error::{AppError, Result};
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pattern {
    FirstDotLast,
    FirstInitialLast,
    FirstUnderscoreLast,
    FirstDashLast,
    First,
    Last,
    FirstLast,
    FirstInitialDotLast,
}

impl Pattern {
    /// Order in which targeted lookups try the built-in patterns.
    pub const BUILTIN_ORDER: [Pattern; 6] = [
        Pattern::FirstDotLast,
        Pattern::FirstInitialLast,
        Pattern::First,
        Pattern::Last,
        Pattern::FirstLast,
        Pattern::FirstInitialDotLast,
    ];

    /// Shapes produced by detection, in tie-break priority.
    const DETECTABLE: [Pattern; 4] = [
        Pattern::FirstDotLast,
        Pattern::FirstInitialLast,
        Pattern::FirstUnderscoreLast,
        Pattern::FirstDashLast,
    ];

    const ALL: [Pattern; 8] = [
        Pattern::FirstDotLast,
        Pattern::FirstInitialLast,
        Pattern::FirstUnderscoreLast,
        Pattern::FirstDashLast,
        Pattern::First,
        Pattern::Last,
        Pattern::FirstLast,
        Pattern::FirstInitialDotLast,
    ];

    /// The local-part template, e.g. `{first}.{last}`.
    pub fn template(&self) -> &'static str {
        match self {
            Pattern::FirstDotLast => "{first}.{last}",
            Pattern::FirstInitialLast => "{first_initial}{last}",
            Pattern::FirstUnderscoreLast => "{first}_{last}",
            Pattern::FirstDashLast => "{first}-{last}",
            Pattern::First => "{first}",
            Pattern::Last => "{last}",
            Pattern::FirstLast => "{first}{last}",
            Pattern::FirstInitialDotLast => "{first_initial}.{last}",
        }
    }

    /// Leading component, separator, trailing component.
    fn shape(&self) -> (Part, &'static str, Part) {
        match self {
            Pattern::FirstDotLast => (Part::First, ".", Part::Last),
            Pattern::FirstInitialLast => (Part::Initial, "", Part::Last),
            Pattern::FirstUnderscoreLast => (Part::First, "_", Part::Last),
            Pattern::FirstDashLast => (Part::First, "-", Part::Last),
            Pattern::First => (Part::First, "", Part::None),
            Pattern::Last => (Part::None, "", Part::Last),
            Pattern::FirstLast => (Part::First, "", Part::Last),
            Pattern::FirstInitialDotLast => (Part::Initial, ".", Part::Last),
        }
    }
}

#[derive(Clone, Copy)]
enum Part {
    First,
    Initial,
    Last,
    None,
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.template())
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.template())
    }
}

impl FromStr for Pattern {
    type Err = AppError;

    /// Accepts `{first}.{last}` as well as `{first}.{last}@{domain}`.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim().to_lowercase();
        let local = trimmed.strip_suffix("@{domain}").unwrap_or(&trimmed);
        Pattern::ALL
            .into_iter()
            .find(|p| p.template() == local)
            .ok_or_else(|| AppError::InvalidPattern(s.to_string()))
    }
}

/// Result of pattern detection over a set of observed addresses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DetectedPattern {
    pub pattern: Pattern,
    /// Share of classified addresses that had the winning shape.
    pub confidence: f32,
    /// Number of addresses that could be classified at all.
    pub samples: usize,
}

impl Default for DetectedPattern {
    fn default() -> Self {
        Self {
            pattern: Pattern::FirstDotLast,
            confidence: 0.0,
            samples: 0,
        }
    }
}

/// Lower-cases, trims and keeps only alphanumerics and `-`.
pub(crate) fn sanitize_name_part(part: &str) -> String {
    part.trim()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-')
        .collect::<String>()
        .to_lowercase()
}

/// Classifies one local-part. A dot means `{first}.{last}` or nothing.
fn classify(local_part: &str) -> Option<(Pattern, String, String)> {
    let local = local_part.trim().to_lowercase();

    if local.contains('.') {
        let parts: Vec<&str> = local.split('.').collect();
        return match parts.as_slice() {
            [first, last] if !first.is_empty() && !last.is_empty() => {
                Some((Pattern::FirstDotLast, first.to_string(), last.to_string()))
            }
            _ => None,
        };
    }

    let mut chars = local.chars();
    if let Some(initial) = chars.next() {
        let rest = chars.as_str();
        if initial.is_alphabetic() && !rest.is_empty() && rest.chars().all(char::is_alphabetic) {
            return Some((
                Pattern::FirstInitialLast,
                initial.to_string(),
                rest.to_string(),
            ));
        }
    }

    for (sep, pattern) in [
        ('_', Pattern::FirstUnderscoreLast),
        ('-', Pattern::FirstDashLast),
    ] {
        if local.contains(sep) {
            return match local.split_once(sep) {
                Some((first, last)) if !first.is_empty() && !last.is_empty() => {
                    Some((pattern, first.to_string(), last.to_string()))
                }
                _ => None,
            };
        }
    }

    None
}

/// Picks the dominant naming pattern among `addresses`.
///
/// Unclassifiable local-parts are ignored. Ties go to the earlier shape in
/// `{first}.{last}`, `{first_initial}{last}`, `{first}_{last}`, `{first}-{last}`.
/// With no evidence at all the result is `{first}.{last}` with zero confidence.
pub fn detect_pattern<I, S>(addresses: I) -> DetectedPattern
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tally: HashMap<Pattern, usize> = HashMap::new();
    let mut samples = 0usize;

    for address in addresses {
        let address = address.as_ref();
        let local = address.split_once('@').map_or(address, |(l, _)| l);
        if let Some((pattern, _, _)) = classify(local) {
            *tally.entry(pattern).or_default() += 1;
            samples += 1;
        } else {
            tracing::trace!("Discarding unclassifiable local-part '{}'", local);
        }
    }

    if samples == 0 {
        return DetectedPattern::default();
    }

    let mut best = DetectedPattern::default();
    let mut best_count = 0usize;
    for pattern in Pattern::DETECTABLE {
        let count = tally.get(&pattern).copied().unwrap_or(0);
        if count > best_count {
            best_count = count;
            best.pattern = pattern;
        }
    }
    best.confidence = best_count as f32 / samples as f32;
    best.samples = samples;

    tracing::debug!(
        "Detected pattern {} from {} samples (share {:.2})",
        best.pattern,
        samples,
        best.confidence
    );
    best
}

/// Builds an address from `pattern` by substituting the normalised names.
///
/// Never fails: a missing component drops its separator (`{first}.{last}` with
/// no first name yields `doe@domain`), and a pattern whose only component is
/// missing falls back to whichever name is present.
pub fn generate_address(pattern: Pattern, first_name: &str, last_name: &str, domain: &str) -> String {
    let first = sanitize_name_part(first_name);
    let last = sanitize_name_part(last_name);
    let initial: String = first.chars().next().map(String::from).unwrap_or_default();

    let render = |part: Part| -> String {
        match part {
            Part::First => first.clone(),
            Part::Initial => initial.clone(),
            Part::Last => last.clone(),
            Part::None => String::new(),
        }
    };

    let (lead, sep, tail) = pattern.shape();
    let (lead, tail) = (render(lead), render(tail));
    let mut local = match (lead.is_empty(), tail.is_empty()) {
        (false, false) => format!("{}{}{}", lead, sep, tail),
        (false, true) => lead,
        (true, false) => tail,
        (true, true) => String::new(),
    };
    if local.is_empty() {
        local = if first.is_empty() { last.clone() } else { first.clone() };
    }

    format!("{}@{}", local, domain.trim().to_lowercase())
}

/// Guesses a (first, last) name pair from a local-part using the same rules
/// as detection. Names come back capitalised.
pub fn split_name(local_part: &str) -> Option<(String, String)> {
    let (pattern, first, last) = classify(local_part)?;
    let first = match pattern {
        Pattern::FirstInitialLast => first.to_uppercase(),
        _ => capitalize(&first),
    };
    Some((first, capitalize(&last)))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
