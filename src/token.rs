//! Detection of deferred values.
//!
//! Strings handed to this crate may still contain infrastructure-as-code
//! interpolations such as `${aws_sqs_queue.q.arn}` which are only resolved
//! at deploy time. Such values are opaque here and skip syntactic checks.

use once_cell::sync::Lazy;
use regex::Regex;

static UNRESOLVED_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{[^}]*\}").expect("unresolved token pattern is valid"));

/// Returns true if `value` contains at least one unresolved `${...}` interpolation.
///
/// ## Example
///
/// ```
/// use iam_policy_core::is_unresolved;
///
/// assert!(is_unresolved("${data.aws_partition.current.partition}:s3:GetObject"));
/// assert!(!is_unresolved("s3:GetObject"));
/// ```
pub fn is_unresolved(value: &str) -> bool {
    UNRESOLVED_PATTERN.is_match(value)
}
