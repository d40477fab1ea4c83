//! Conversation history and scrollback navigation
//!
//! The store is an append-only sequence of turns owned by the session. The
//! navigator implements shell-style scrollback over it: a cursor that walks
//! older/newer through recorded turns, with a single "live" slot for the
//! draft currently in the editor.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Maximum turns kept in memory. Appending beyond this evicts the oldest.
pub const MAX_TURNS: usize = 256;

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One recorded message. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub content: String,
    pub role: Role,
}

/// Ordered sequence of turns. Turns are never reordered or edited in place;
/// the only mutation besides append is eviction from the front at capacity.
#[derive(Debug, Default)]
pub struct HistoryStore {
    turns: VecDeque<Turn>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn. Never fails; at capacity the oldest turn is dropped.
    pub fn push(&mut self, content: impl Into<String>, role: Role) {
        if self.turns.len() == MAX_TURNS {
            self.turns.pop_front();
        }
        self.turns.push_back(Turn {
            content: content.into(),
            role,
        });
    }

    pub fn get(&self, index: usize) -> Option<&Turn> {
        self.turns.get(index)
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// What the editor should display after a "newer" step.
#[derive(Debug, PartialEq, Eq)]
pub enum NavTarget<'a> {
    /// Load this turn's content, replacing the editor wholesale.
    Turn(&'a Turn),
    /// Back at the live position: clear the editor.
    Live,
}

/// Cursor over a [`HistoryStore`]: either viewing turn `i`, or "live"
/// (no turn selected, the editor holds the current draft).
///
/// Navigating intentionally discards any unsaved draft in the editor; there
/// is no merge or restore of pre-navigation text.
#[derive(Debug, Default)]
pub struct HistoryNavigator {
    cursor: Option<usize>,
}

impl HistoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(dead_code)] // State query utility
    pub fn is_live(&self) -> bool {
        self.cursor.is_none()
    }

    /// Return to the live position without touching the editor.
    pub fn reset(&mut self) {
        self.cursor = None;
    }

    /// Step toward older turns. Returns the turn to load, or `None` when the
    /// step is a no-op (empty history, or already at the oldest turn).
    pub fn older<'a>(&mut self, store: &'a HistoryStore) -> Option<&'a Turn> {
        if store.is_empty() {
            return None;
        }
        let last = store.len() - 1;
        let next = match self.cursor {
            None => last,
            // A cursor past the end can only result from eviction; clamp.
            Some(i) if i > last => last,
            Some(0) => return None,
            Some(i) => i - 1,
        };
        self.cursor = Some(next);
        store.get(next)
    }

    /// Step toward newer turns. `None` when already live (no-op);
    /// [`NavTarget::Live`] when stepping past the newest turn.
    pub fn newer<'a>(&mut self, store: &'a HistoryStore) -> Option<NavTarget<'a>> {
        let current = self.cursor?;
        if store.is_empty() || current + 1 >= store.len() {
            self.cursor = None;
            return Some(NavTarget::Live);
        }
        let next = current + 1;
        self.cursor = Some(next);
        store.get(next).map(NavTarget::Turn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn filled(n: usize) -> HistoryStore {
        let mut store = HistoryStore::new();
        for i in 0..n {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            store.push(format!("turn {i}"), role);
        }
        store
    }

    #[test]
    fn test_append_read_round_trip() {
        let mut store = HistoryStore::new();
        store.push("hello", Role::User);
        store.push("bonjour", Role::Assistant);

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(0).unwrap().content, "hello");
        assert_eq!(store.get(0).unwrap().role, Role::User);
        assert_eq!(store.get(1).unwrap().content, "bonjour");
        assert_eq!(store.get(1).unwrap().role, Role::Assistant);
        assert!(store.get(2).is_none());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut store = filled(MAX_TURNS);
        assert_eq!(store.get(0).unwrap().content, "turn 0");

        store.push("one more", Role::User);
        assert_eq!(store.len(), MAX_TURNS);
        assert_eq!(store.get(0).unwrap().content, "turn 1");
        assert_eq!(
            store.get(MAX_TURNS - 1).unwrap().content,
            "one more"
        );
    }

    #[test]
    fn test_older_from_live_starts_at_newest() {
        let store = filled(3);
        let mut nav = HistoryNavigator::new();

        let turn = nav.older(&store).unwrap();
        assert_eq!(turn.content, "turn 2");
        assert!(!nav.is_live());
    }

    #[test]
    fn test_older_on_empty_history_is_noop() {
        let store = HistoryStore::new();
        let mut nav = HistoryNavigator::new();
        assert!(nav.older(&store).is_none());
        assert!(nav.is_live());
    }

    #[test]
    fn test_n_olders_land_on_first_turn_then_stick() {
        let n = 5;
        let store = filled(n);
        let mut nav = HistoryNavigator::new();

        let mut last_seen = None;
        for _ in 0..n {
            last_seen = nav.older(&store).map(|t| t.content.clone());
        }
        assert_eq!(last_seen.as_deref(), Some("turn 0"));

        // One further "older" is a no-op; the cursor stays on turn 0.
        assert!(nav.older(&store).is_none());
        assert_eq!(nav.cursor, Some(0));
    }

    #[test]
    fn test_n_newers_from_first_turn_return_to_live() {
        let n = 5;
        let store = filled(n);
        let mut nav = HistoryNavigator::new();
        for _ in 0..n {
            nav.older(&store);
        }
        assert_eq!(nav.cursor, Some(0));

        for i in 0..n - 1 {
            match nav.newer(&store) {
                Some(NavTarget::Turn(t)) => assert_eq!(t.content, format!("turn {}", i + 1)),
                other => panic!("expected a turn, got {other:?}"),
            }
        }
        assert_eq!(nav.newer(&store), Some(NavTarget::Live));
        assert!(nav.is_live());
    }

    #[test]
    fn test_newer_while_live_is_noop() {
        let store = filled(2);
        let mut nav = HistoryNavigator::new();
        assert!(nav.newer(&store).is_none());
        assert!(nav.is_live());
    }

    #[test]
    fn test_stale_cursor_clamps_to_last_index() {
        let store = filled(3);
        let mut nav = HistoryNavigator::new();
        nav.cursor = Some(10);

        let turn = nav.older(&store).unwrap();
        assert_eq!(turn.content, "turn 2");
        assert_eq!(nav.cursor, Some(2));
    }

    proptest! {
        /// The cursor is always live or a valid index, for any event order.
        #[test]
        fn prop_cursor_stays_in_bounds(ops in proptest::collection::vec(0u8..3, 0..64)) {
            let mut store = HistoryStore::new();
            let mut nav = HistoryNavigator::new();
            for (i, op) in ops.iter().enumerate() {
                match *op {
                    0 => store.push(format!("t{i}"), Role::User),
                    1 => { nav.older(&store); }
                    _ => { nav.newer(&store); }
                }
                if let Some(cursor) = nav.cursor {
                    prop_assert!(cursor < store.len());
                }
            }
        }

        /// Appends never disturb turns already recorded (within capacity).
        #[test]
        fn prop_appends_are_stable(contents in proptest::collection::vec("[a-z]{0,12}", 1..32)) {
            let mut store = HistoryStore::new();
            for (i, content) in contents.iter().enumerate() {
                store.push(content.clone(), Role::User);
                prop_assert_eq!(store.len(), i + 1);
                for (j, expected) in contents[..=i].iter().enumerate() {
                    prop_assert_eq!(&store.get(j).unwrap().content, expected);
                }
            }
        }
    }
}
