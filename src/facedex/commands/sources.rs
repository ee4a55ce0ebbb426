//! Multi-source selection.
//!
//! A session remembers which configured source document it is browsing as an index into
//! the source list. An index that no longer fits the list (the list shrank, or a stale
//! session came back) falls back to the first source.

use crate::model::Session;

/// Current source index for `session`, clamped into `0..count`.
///
/// Writes the clamped value back so the session stays consistent.
pub fn current_source(session: &mut Session, count: usize) -> usize {
    if session.current_source >= count {
        session.current_source = 0;
    }
    session.current_source
}

/// Switches `session` to source `index`. Out-of-range indexes select source 0.
pub fn select_source(session: &mut Session, index: usize, count: usize) -> usize {
    session.current_source = if index < count { index } else { 0 };
    session.current_source
}
