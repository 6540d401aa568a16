//! Query session state machine for one mention-enabled host.
//!
//! Owns the candidate list, the mention being typed and the selection.
//! Knows nothing about rendering or timers: callers feed it text changes,
//! navigation keys and lookup results, and act on what it returns.

use tracing::{debug, warn};

use crate::directory::UserRecord;
use crate::error::Error;
use crate::mention::{self, Splice};

/// Keys the open panel intercepts. Everything else is plain text editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Down,
    Up,
    Enter,
    Escape,
}

/// What a text change asks the caller to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextChange {
    /// The session is destroyed; nothing happened.
    Ignored,
    /// No mention at the caret; the panel is closed.
    Closed,
    /// A mention is being typed; schedule a debounced lookup for this query.
    Schedule(String),
}

/// Result of a key press while the session is live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Not handled; the host should apply its default editing.
    Ignored,
    /// Handled; the host must suppress its default behaviour.
    Handled,
    /// A candidate was committed; the host must adopt the new text and caret.
    Commit(Committed),
}

/// A committed candidate and the rewritten host text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed {
    pub user: UserRecord,
    pub splice: Splice,
}

/// Identifies one issued lookup; responses are matched against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTicket {
    pub seq: u64,
    pub query: String,
}

/// How a lookup response was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    /// Candidates replaced; panel open with the first row selected.
    Opened,
    /// Empty result or failure; panel closed.
    Closed,
    /// Superseded or orphaned response; state untouched.
    Discarded,
}

/// Autocomplete state for a single host.
///
/// `selected` is `None` exactly when the panel is closed, and otherwise a
/// valid index into `candidates`, which is then non-empty.
#[derive(Debug, Default)]
pub struct MentionSession {
    candidates: Vec<UserRecord>,
    mention_start: Option<usize>,
    current_query: String,
    selected: Option<usize>,
    last_issued: u64,
    awaiting: Option<u64>,
    destroyed: bool,
}

impl MentionSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn is_open(&self) -> bool {
        self.selected.is_some()
    }

    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub const fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn candidates(&self) -> &[UserRecord] {
        &self.candidates
    }

    pub const fn mention_start(&self) -> Option<usize> {
        self.mention_start
    }

    pub fn current_query(&self) -> &str {
        &self.current_query
    }

    /// Re-run mention detection after the host text or caret changed.
    pub fn on_text_changed(&mut self, text: &str, caret: usize) -> TextChange {
        if self.destroyed {
            return TextChange::Ignored;
        }
        match mention::detect_mention(text, caret) {
            Some(found) => {
                self.mention_start = Some(found.start);
                self.current_query.clone_from(&found.query);
                TextChange::Schedule(found.query)
            }
            None => {
                self.close();
                TextChange::Closed
            }
        }
    }

    /// Mark a lookup as issued. Returns `None` when no mention is active.
    ///
    /// Issuing a lookup supersedes every earlier one.
    pub fn begin_lookup(&mut self, query: &str) -> Option<LookupTicket> {
        if self.destroyed || self.mention_start.is_none() {
            return None;
        }
        self.last_issued += 1;
        self.awaiting = Some(self.last_issued);
        Some(LookupTicket {
            seq: self.last_issued,
            query: query.to_string(),
        })
    }

    fn is_current(&self, ticket: &LookupTicket) -> bool {
        !self.destroyed && self.awaiting == Some(ticket.seq)
    }

    /// Apply a successful response.
    pub fn apply_results(&mut self, ticket: &LookupTicket, users: Vec<UserRecord>) -> LookupOutcome {
        if !self.is_current(ticket) {
            debug!(seq = ticket.seq, latest = self.last_issued, "Discarding stale lookup response");
            return LookupOutcome::Discarded;
        }
        self.awaiting = None;
        if users.is_empty() {
            self.close();
            return LookupOutcome::Closed;
        }
        self.candidates = users;
        self.selected = Some(0);
        LookupOutcome::Opened
    }

    /// Apply a failed response: log it and close the panel.
    pub fn apply_failure(&mut self, ticket: &LookupTicket, error: &Error) -> LookupOutcome {
        if !self.is_current(ticket) {
            return LookupOutcome::Discarded;
        }
        warn!(query = %ticket.query, %error, "User lookup failed");
        self.close();
        LookupOutcome::Closed
    }

    /// Handle a navigation key against the host's current text and caret.
    pub fn handle_key(&mut self, key: NavKey, text: &str, caret: usize) -> KeyOutcome {
        if self.destroyed {
            return KeyOutcome::Ignored;
        }
        let Some(selected) = self.selected else {
            return KeyOutcome::Ignored;
        };
        match key {
            NavKey::Down => {
                let last = self.candidates.len().saturating_sub(1);
                self.selected = Some((selected + 1).min(last));
                KeyOutcome::Handled
            }
            NavKey::Up => {
                self.selected = Some(selected.saturating_sub(1));
                KeyOutcome::Handled
            }
            NavKey::Escape => {
                self.close();
                KeyOutcome::Handled
            }
            NavKey::Enter => self
                .commit(selected, text, caret)
                .map_or(KeyOutcome::Handled, KeyOutcome::Commit),
        }
    }

    /// Move the selection to `index` (pointer hover). Returns whether it moved.
    pub fn select(&mut self, index: usize) -> bool {
        if self.destroyed || !self.is_open() || index >= self.candidates.len() {
            return false;
        }
        let moved = self.selected != Some(index);
        self.selected = Some(index);
        moved
    }

    /// Commit candidate `index`, replacing the mention up to `caret`.
    pub fn commit(&mut self, index: usize, text: &str, caret: usize) -> Option<Committed> {
        if self.destroyed || !self.is_open() {
            return None;
        }
        let start = self.mention_start?;
        let user = self.candidates.get(index)?.clone();
        let splice = mention::splice_mention(text, start, caret, &user.username);
        debug!(username = %user.username, start, caret, "Committed mention");
        self.close();
        Some(Committed { user, splice })
    }

    /// Close the panel and forget the mention. Outstanding lookups become stale.
    pub fn close(&mut self) {
        self.candidates.clear();
        self.mention_start = None;
        self.current_query.clear();
        self.selected = None;
        self.awaiting = None;
    }

    /// Close for good; every later call is a no-op.
    pub fn destroy(&mut self) {
        self.close();
        self.destroyed = true;
    }
}
