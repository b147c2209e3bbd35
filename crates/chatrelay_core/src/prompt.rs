//! Bounded prompt construction.
//!
//! The generation backend takes a single text blob, so the recent part of the
//! conversation is flattened into `"<label>: <content>"` lines. Only the last
//! few turns are kept to bound prompt size.

use crate::{Role, Turn};
use chatrelay_error::{ChatRelayError, ChatRelayResult};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use tracing::{debug, instrument};

/// Default number of turns kept in the prompt.
pub const DEFAULT_HISTORY_TURNS: usize = 5;

/// Number of most-recent conversation turns kept in a prompt.
///
/// A turn is one user entry plus one assistant entry, so a window of `n`
/// turns keeps up to `2n` history entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct HistoryWindow(NonZeroUsize);

impl HistoryWindow {
    /// Creates a window of `turns` turns.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `turns` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use chatrelay_core::HistoryWindow;
    ///
    /// assert_eq!(HistoryWindow::new(3).unwrap().entries(), 6);
    /// assert!(HistoryWindow::new(0).is_err());
    /// ```
    #[track_caller]
    pub fn new(turns: usize) -> ChatRelayResult<Self> {
        NonZeroUsize::new(turns).map(Self).ok_or_else(|| {
            ChatRelayError::configuration("history window must keep at least one turn")
        })
    }

    /// Number of turns in the window.
    pub fn turns(&self) -> usize {
        self.0.get()
    }

    /// Number of history entries (two per turn) in the window.
    pub fn entries(&self) -> usize {
        self.0.get().saturating_mul(2)
    }
}

impl Default for HistoryWindow {
    fn default() -> Self {
        Self(NonZeroUsize::new(DEFAULT_HISTORY_TURNS).unwrap_or(NonZeroUsize::MIN))
    }
}

impl TryFrom<usize> for HistoryWindow {
    type Error = ChatRelayError;

    fn try_from(turns: usize) -> Result<Self, Self::Error> {
        Self::new(turns)
    }
}

impl From<HistoryWindow> for usize {
    fn from(window: HistoryWindow) -> Self {
        window.turns()
    }
}

/// Per-role labels prefixed to each prompt line.
///
/// These must stay the same for every call of one deployment so the backend
/// sees consistent formatting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_getters::Getters)]
pub struct PromptLabels {
    /// Label for user lines
    user: String,
    /// Label for assistant lines
    assistant: String,
}

impl PromptLabels {
    /// Creates a label set.
    pub fn new(user: impl Into<String>, assistant: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            assistant: assistant.into(),
        }
    }

    /// Label used for `role`.
    pub fn label(&self, role: Role) -> &str {
        match role {
            Role::User => &self.user,
            Role::Assistant => &self.assistant,
        }
    }
}

impl Default for PromptLabels {
    fn default() -> Self {
        Self::new("User", "Assistant")
    }
}

/// Flattens a bounded suffix of a conversation into a prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, derive_getters::Getters)]
pub struct PromptBuilder {
    /// How many recent turns to keep
    window: HistoryWindow,
    /// Role labels
    labels: PromptLabels,
}

impl PromptBuilder {
    /// Creates a builder with the given window and labels.
    pub fn new(window: HistoryWindow, labels: PromptLabels) -> Self {
        Self { window, labels }
    }

    /// Builds the prompt for `new_message` following `history`.
    ///
    /// The last `2 * window` history entries are rendered one per line,
    /// followed by one user line holding `new_message`. Older entries are
    /// dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use chatrelay_core::{HistoryWindow, PromptBuilder, PromptLabels, Turn};
    ///
    /// let builder = PromptBuilder::new(HistoryWindow::new(1).unwrap(), PromptLabels::default());
    /// let history = vec![
    ///     Turn::user("first"),
    ///     Turn::assistant("reply one"),
    ///     Turn::user("second"),
    ///     Turn::assistant("reply two"),
    /// ];
    /// assert_eq!(
    ///     builder.build(&history, "third"),
    ///     "User: second\nAssistant: reply two\nUser: third"
    /// );
    /// ```
    #[instrument(skip_all, fields(history_len = history.len(), window = self.window.turns()))]
    pub fn build(&self, history: &[Turn], new_message: &str) -> String {
        let start = history.len().saturating_sub(self.window.entries());
        let kept = &history[start..];

        let prompt = kept
            .iter()
            .map(|turn| self.render(*turn.role(), turn.content()))
            .chain(std::iter::once(self.render(Role::User, new_message)))
            .collect::<Vec<_>>()
            .join("\n");

        debug!(
            kept = kept.len(),
            dropped = start,
            prompt_len = prompt.len(),
            "Built prompt"
        );
        prompt
    }

    fn render(&self, role: Role, content: &str) -> String {
        format!("{}: {}", self.labels.label(role), content)
    }
}

/// Builds a prompt with the default role labels.
///
/// See [`PromptBuilder::build`].
pub fn build_prompt(history: &[Turn], new_message: &str, window: HistoryWindow) -> String {
    PromptBuilder::new(window, PromptLabels::default()).build(history, new_message)
}
