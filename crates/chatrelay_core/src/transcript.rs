//! Conversation turns and the transcript threaded through each request.

use crate::Role;
use serde::{Deserialize, Serialize};

/// One message exchanged in a conversation, tagged with its speaker.
///
/// # Examples
///
/// ```
/// use chatrelay_core::{Role, Turn};
///
/// let turn = Turn::user("Hello");
/// assert_eq!(*turn.role(), Role::User);
/// assert_eq!(turn.content(), "Hello");
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(setter(into))]
pub struct Turn {
    /// Who said it
    role: Role,
    /// What was said
    content: String,
}

impl Turn {
    /// Creates a turn with the given role and content.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Returns a builder for constructing a Turn.
    pub fn builder() -> TurnBuilder {
        TurnBuilder::default()
    }
}

/// Ordered history of turns for one conversation.
///
/// The caller owns the transcript between requests; the relay only receives
/// it, grows it and hands it back. Insertion order is conversation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript(Vec<Turn>);

impl Transcript {
    /// Creates an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of turns.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no turns have been exchanged.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All turns in conversation order.
    pub fn turns(&self) -> &[Turn] {
        &self.0
    }

    /// The most recent turn, if any.
    pub fn last(&self) -> Option<&Turn> {
        self.0.last()
    }

    /// The last `entries` turns (or all of them when shorter).
    pub fn recent(&self, entries: usize) -> &[Turn] {
        let start = self.0.len().saturating_sub(entries);
        &self.0[start..]
    }

    /// Appends one turn, consuming this transcript and returning the grown one.
    ///
    /// # Examples
    ///
    /// ```
    /// use chatrelay_core::{Role, Transcript};
    ///
    /// let transcript = Transcript::new()
    ///     .append_turn(Role::User, "Hello")
    ///     .append_turn(Role::Assistant, "Hi there");
    /// assert_eq!(transcript.len(), 2);
    /// assert_eq!(transcript.last().map(|t| t.content().as_str()), Some("Hi there"));
    /// ```
    pub fn append_turn(mut self, role: Role, content: impl Into<String>) -> Self {
        self.0.push(Turn::new(role, content));
        self
    }
}

impl From<Vec<Turn>> for Transcript {
    fn from(turns: Vec<Turn>) -> Self {
        Self(turns)
    }
}

impl From<Transcript> for Vec<Turn> {
    fn from(transcript: Transcript) -> Self {
        transcript.0
    }
}

impl IntoIterator for Transcript {
    type Item = Turn;
    type IntoIter = std::vec::IntoIter<Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Turn> for Transcript {
    fn from_iter<I: IntoIterator<Item = Turn>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Returns `transcript` with one trailing turn added.
pub fn append_turn(transcript: Transcript, role: Role, content: impl Into<String>) -> Transcript {
    transcript.append_turn(role, content)
}
