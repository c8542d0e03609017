use serde::{Deserialize, Serialize};

pub type ParticipantId = String;

/// A member of the travelling group. Participants are fixed at trip setup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
}

impl Participant {
    pub fn new(id: impl Into<ParticipantId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Returns true if `key` is this participant's id or (case-insensitively) name.
    pub fn matches(&self, key: &str) -> bool {
        let key = key.trim();
        self.id == key || self.name.eq_ignore_ascii_case(key)
    }
}

/// The roster a new trip starts with.
pub fn default_participants() -> Vec<Participant> {
    vec![
        Participant::new("1", "You"),
        Participant::new("2", "Alice"),
        Participant::new("3", "Bob"),
    ]
}

/// Look up a participant by id or name.
pub fn find_participant<'a>(participants: &'a [Participant], key: &str) -> Option<&'a Participant> {
    participants
        .iter()
        .find(|p| p.id == key.trim())
        .or_else(|| participants.iter().find(|p| p.matches(key)))
}
