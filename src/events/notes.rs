//! Note / quest tracking notifications.

/// Raised by [`NoteTracker`](crate::systems::notes::NoteTracker).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteEvent {
    /// A new note id was collected.
    Added(String),
    /// A note id was dropped.
    Removed(String),
    /// Notes were restored from the save store.
    Loaded(usize),
    /// All notes were cleared by a reset.
    Cleared,
}
