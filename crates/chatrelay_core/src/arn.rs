//! Region extraction from resource identifiers.

use regex::Regex;
use std::sync::LazyLock;

static ARN_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^arn:[^:]+:[^:]+:([a-z0-9-]+):[^:]*:.+$").ok());

/// Returns the region component of an ARN such as
/// `arn:aws:lambda:us-east-1:123456789012:function:chat`.
///
/// Returns `None` when the identifier is not an ARN or carries no region.
///
/// # Examples
///
/// ```
/// use chatrelay_core::region_from_arn;
///
/// assert_eq!(
///     region_from_arn("arn:aws:lambda:ap-northeast-1:123456789012:function:chat"),
///     Some("ap-northeast-1")
/// );
/// assert_eq!(region_from_arn("arn:aws:s3:::bucket"), None);
/// assert_eq!(region_from_arn("not-an-arn"), None);
/// ```
pub fn region_from_arn(arn: &str) -> Option<&str> {
    ARN_PATTERN
        .as_ref()?
        .captures(arn)?
        .get(1)
        .map(|region| region.as_str())
}
