//! Syntactic address check, the first verification stage.

use regex::Regex;
use std::sync::LazyLock;

pub const MAX_ADDRESS_LEN: usize = 254;
pub const MAX_LOCAL_PART_LEN: usize = 64;

static FORMAT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap()
});

/// Returns why `address` fails the format check, or `None` when it passes.
pub fn format_problem(address: &str) -> Option<String> {
    if address.len() > MAX_ADDRESS_LEN {
        return Some(format!(
            "Address is longer than {} characters",
            MAX_ADDRESS_LEN
        ));
    }
    if !FORMAT_RE.is_match(address) {
        return Some("Invalid email format".to_string());
    }
    let local = address.split('@').next().unwrap_or_default();
    if local.len() > MAX_LOCAL_PART_LEN {
        return Some(format!(
            "Local part is longer than {} characters",
            MAX_LOCAL_PART_LEN
        ));
    }
    None
}

pub fn is_valid_format(address: &str) -> bool {
    format_problem(address).is_none()
}
