use hide_helper_protocol::message::ChatMessage;

/// Read/flag access to the conversation log owned by the host.
///
/// Indices are contiguous in `[0, len)` between mutations. A slot may still
/// be empty (tombstoned by a delete that is in flight); such slots report
/// `None` and are skipped.
pub trait MessageLog {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hidden flag of the message at `index`, or `None` when the slot is
    /// empty or out of range.
    fn is_hidden(&self, index: usize) -> Option<bool>;

    /// Sets the hidden flag in place. Returns `false` when the slot is empty
    /// or out of range.
    fn set_hidden(&mut self, index: usize, hidden: bool) -> bool;
}

/// In-memory log, for hosts that keep their messages in a `Vec`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatLog {
    messages: Vec<Option<ChatMessage>>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A log of `len` plain text messages, all visible.
    pub fn with_len(len: usize) -> Self {
        Self {
            messages: (0..len)
                .map(|index| Some(ChatMessage::text(format!("message {index}"))))
                .collect(),
        }
    }

    pub fn push(&mut self, message: ChatMessage) -> usize {
        self.messages.push(Some(message));
        self.messages.len() - 1
    }

    /// Removes the message at `index`, renumbering later ones.
    pub fn remove(&mut self, index: usize) -> Option<ChatMessage> {
        if index < self.messages.len() {
            self.messages.remove(index)
        } else {
            None
        }
    }

    /// Empties the slot at `index` without renumbering.
    pub fn tombstone(&mut self, index: usize) -> Option<ChatMessage> {
        self.messages.get_mut(index).and_then(Option::take)
    }

    pub fn get(&self, index: usize) -> Option<&ChatMessage> {
        self.messages.get(index).and_then(Option::as_ref)
    }

    /// Indices whose hidden flag is set, in log order.
    pub fn hidden_indices(&self) -> Vec<usize> {
        self.messages
            .iter()
            .enumerate()
            .filter(|(_, message)| message.as_ref().is_some_and(|message| message.hidden))
            .map(|(index, _)| index)
            .collect()
    }

    /// Messages a context builder should see.
    pub fn context_messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages
            .iter()
            .flatten()
            .filter(|message| !message.hidden)
    }
}

impl FromIterator<ChatMessage> for ChatLog {
    fn from_iter<T: IntoIterator<Item = ChatMessage>>(iter: T) -> Self {
        Self {
            messages: iter.into_iter().map(Some).collect(),
        }
    }
}

impl MessageLog for ChatLog {
    fn len(&self) -> usize {
        self.messages.len()
    }

    fn is_hidden(&self, index: usize) -> Option<bool> {
        self.get(index).map(|message| message.hidden)
    }

    fn set_hidden(&mut self, index: usize, hidden: bool) -> bool {
        match self.messages.get_mut(index) {
            Some(Some(message)) => {
                message.hidden = hidden;
                true
            }
            _ => false,
        }
    }
}
