use hide_helper_protocol::EntityRef;

/// Reports who owns the active conversation.
pub trait EntityIdentityProvider {
    /// `None` while no character or group is selected.
    fn current_entity(&self) -> Option<EntityRef>;
}

/// Snapshot of the host's selection. A selected group wins over the
/// character, since group chats also carry the last selected character.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationContext {
    pub group_id: Option<String>,
    pub character_avatar: Option<String>,
}

impl ConversationContext {
    pub fn character(avatar: impl Into<String>) -> Self {
        Self {
            group_id: None,
            character_avatar: Some(avatar.into()),
        }
    }

    pub fn group(id: impl Into<String>) -> Self {
        Self {
            group_id: Some(id.into()),
            character_avatar: None,
        }
    }
}

impl EntityIdentityProvider for ConversationContext {
    fn current_entity(&self) -> Option<EntityRef> {
        if let Some(id) = self.group_id.as_ref().filter(|id| !id.is_empty()) {
            return Some(EntityRef::Group { id: id.clone() });
        }
        self.character_avatar
            .as_ref()
            .filter(|avatar| !avatar.is_empty())
            .map(|avatar| EntityRef::Character {
                avatar: avatar.clone(),
            })
    }
}
