//! Role types for conversation participants.

use serde::{Deserialize, Serialize};

/// Speaker of a conversation turn.
///
/// Serialized in lowercase (`"user"`, `"assistant"`), the shape callers send
/// in `conversationHistory`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[display("user")]
    User,
    #[display("assistant")]
    Assistant,
}
