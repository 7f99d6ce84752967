use quizpet_protocol::ParticipantId;

/// Source of the signed-in participant
pub trait Identity: Send + Sync {
    /// The current participant, or `None` when nobody is signed in
    fn current_participant(&self) -> Option<ParticipantId>;
}

/// Fixed identity, for tests and local tools
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(Option<ParticipantId>);

impl StaticIdentity {
    pub fn signed_in(participant: impl Into<ParticipantId>) -> Self {
        Self(Some(participant.into()))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl Identity for StaticIdentity {
    fn current_participant(&self) -> Option<ParticipantId> {
        self.0.clone()
    }
}
