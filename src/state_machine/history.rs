//! Input history navigation
//!
//! Previously sent texts, most recent first, browsable with up/down the way
//! a shell history works. Navigation is computed from `(entries, cursor)`
//! without touching the entries themselves.

use serde::Serialize;
use std::collections::VecDeque;

/// Maximum number of remembered inputs
pub const HISTORY_CAPACITY: usize = 50;

/// Sent inputs plus the current browsing position
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct InputHistory {
    entries: VecDeque<String>,
    /// Index into `entries`; `None` when not browsing
    cursor: Option<usize>,
}

/// Result of a navigation step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub draft: String,
    pub cursor: Option<usize>,
}

impl InputHistory {
    pub fn entries(&self) -> &VecDeque<String> {
        &self.entries
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)] // Pairs with len()
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Prepend a sent text, evicting the oldest entries past `capacity`.
    /// Also ends any browsing in progress.
    pub fn record(&mut self, text: impl Into<String>, capacity: usize) {
        self.entries.push_front(text.into());
        self.entries.truncate(capacity);
        self.cursor = None;
    }

    pub fn reset_cursor(&mut self) {
        self.cursor = None;
    }

    /// Step towards older entries.
    ///
    /// Returns `None` when there is nothing to browse.
    pub fn navigate_up(&self) -> Option<Navigation> {
        let last = self.entries.len().checked_sub(1)?;
        let cursor = match self.cursor {
            None => 0,
            Some(current) => (current + 1).min(last),
        };
        Some(Navigation {
            draft: self.entries[cursor].clone(),
            cursor: Some(cursor),
        })
    }

    /// Step towards newer entries; stepping past the newest clears the draft.
    pub fn navigate_down(&self) -> Navigation {
        match self.cursor {
            Some(current) if current > 0 => {
                let cursor = current - 1;
                Navigation {
                    draft: self.entries.get(cursor).cloned().unwrap_or_default(),
                    cursor: Some(cursor),
                }
            }
            _ => Navigation {
                draft: String::new(),
                cursor: None,
            },
        }
    }

    /// Move the cursor to a position previously returned by a navigation step
    pub fn apply(&mut self, navigation: &Navigation) {
        self.cursor = navigation.cursor;
    }
}
