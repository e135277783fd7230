/// Log mutation notifications emitted by the owner of the conversation log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogEvent {
    /// A message was sent or received and now sits at the end of the log.
    MessageAppended,
    /// The message previously at `index` was removed; later messages were
    /// renumbered down by one.
    MessageRemoved { index: usize },
    /// A message was edited in place.
    MessageEdited { index: usize },
    /// Streaming output for the last message finished.
    GenerationFinished,
    /// A different conversation was loaded; the whole log was replaced.
    LogSwitched,
}

impl LogEvent {
    /// Whether the event comes from a high-frequency source whose full
    /// reconciliation may be coalesced with its neighbours.
    pub fn is_debounced(self) -> bool {
        matches!(
            self,
            Self::MessageRemoved { .. } | Self::MessageEdited { .. } | Self::GenerationFinished
        )
    }
}
