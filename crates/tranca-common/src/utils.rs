//! Utility functions for Tranca
//!
//! Common helper functions used across the codebase.

use std::sync::LazyLock;

/// Regex pattern for validating identifiers (resource ids, session ids)
static VALID_PATTERN: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new("^[a-zA-Z0-9_.:-]+$").expect("Invalid regex pattern"));

/// Validate an identifier contains only allowed characters
///
/// Allowed characters: alphanumeric, underscore, dot, colon, hyphen.
/// Empty identifiers are rejected.
///
/// # Examples
///
/// ```
/// use tranca_common::is_valid;
///
/// assert!(is_valid("orders"));
/// assert!(is_valid("tenant:orders.v1"));
/// assert!(!is_valid("invalid/path"));
/// assert!(!is_valid("with spaces"));
/// ```
pub fn is_valid(str: &str) -> bool {
    VALID_PATTERN.is_match(str)
}
