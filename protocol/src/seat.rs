//! Seat documents as stored by the lobby store
//!
//! A lobby holds at most [`SEAT_CAPACITY`] seats. Seat order is join order:
//! the first seat is side 0 ("Player 1") once a battle starts.

use serde::{Deserialize, Serialize};

use crate::ids::{MoveId, ParticipantId};

/// Number of combatants a lobby can seat
pub const SEAT_CAPACITY: usize = 2;

/// One occupied seat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatRecord {
    pub participant_id: ParticipantId,

    #[serde(default)]
    pub ready: bool,

    /// Submitted move order, persisted together with the ready flag
    #[serde(default)]
    pub loadout: Vec<MoveId>,
}

impl SeatRecord {
    /// A freshly joined, unready seat
    pub fn new(participant_id: ParticipantId) -> Self {
        Self {
            participant_id,
            ready: false,
            loadout: Vec::new(),
        }
    }
}

/// Seat membership of one lobby at a point in time
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SeatSnapshot {
    pub seats: Vec<SeatRecord>,
}

impl SeatSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of occupied seats
    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Check if no further participant can join
    pub fn is_full(&self) -> bool {
        self.seats.len() >= SEAT_CAPACITY
    }

    /// Both seats present and both ready
    pub fn both_ready(&self) -> bool {
        self.seats.len() == SEAT_CAPACITY && self.seats.iter().all(|s| s.ready)
    }

    /// Get the seat held by a participant
    pub fn get(&self, participant: &ParticipantId) -> Option<&SeatRecord> {
        self.seats.iter().find(|s| &s.participant_id == participant)
    }

    /// Get a participant's seat mutably
    pub fn get_mut(&mut self, participant: &ParticipantId) -> Option<&mut SeatRecord> {
        self.seats
            .iter_mut()
            .find(|s| &s.participant_id == participant)
    }

    /// Seat index (0 or 1) held by a participant
    pub fn position(&self, participant: &ParticipantId) -> Option<usize> {
        self.seats
            .iter()
            .position(|s| &s.participant_id == participant)
    }

    pub fn contains(&self, participant: &ParticipantId) -> bool {
        self.position(participant).is_some()
    }

    /// Insert or replace the seat for `record.participant_id`
    ///
    /// A new participant is appended only while capacity allows; returns
    /// false when the record was rejected.
    pub fn upsert(&mut self, record: SeatRecord) -> bool {
        if let Some(existing) = self.get_mut(&record.participant_id) {
            *existing = record;
            return true;
        }
        if self.is_full() {
            return false;
        }
        self.seats.push(record);
        true
    }

    /// Remove a participant's seat, returning it if present
    pub fn remove(&mut self, participant: &ParticipantId) -> Option<SeatRecord> {
        let idx = self.position(participant)?;
        Some(self.seats.remove(idx))
    }

    /// Participants in seat order
    pub fn participants(&self) -> impl Iterator<Item = &ParticipantId> {
        self.seats.iter().map(|s| &s.participant_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seat(id: &str, ready: bool) -> SeatRecord {
        SeatRecord {
            participant_id: ParticipantId::from(id),
            ready,
            loadout: vec![MoveId::from("plasma-bite")],
        }
    }

    #[test]
    fn test_upsert_respects_capacity() {
        let mut snap = SeatSnapshot::new();
        assert!(snap.upsert(seat("a", false)));
        assert!(snap.upsert(seat("b", false)));
        assert!(snap.is_full());
        assert!(!snap.upsert(seat("c", false)));
        assert_eq!(snap.len(), 2);
    }

    #[test]
    fn test_upsert_replaces_existing() {
        let mut snap = SeatSnapshot::new();
        snap.upsert(seat("a", false));
        snap.upsert(seat("b", false));
        assert!(snap.upsert(seat("a", true)));

        assert_eq!(snap.len(), 2);
        assert_eq!(snap.position(&ParticipantId::from("a")), Some(0));
        assert!(snap.get(&ParticipantId::from("a")).unwrap().ready);
    }

    #[test]
    fn test_both_ready() {
        let mut snap = SeatSnapshot::new();
        snap.upsert(seat("a", true));
        assert!(!snap.both_ready());

        snap.upsert(seat("b", false));
        assert!(!snap.both_ready());

        snap.upsert(seat("b", true));
        assert!(snap.both_ready());
    }

    #[test]
    fn test_remove_shifts_order() {
        let mut snap = SeatSnapshot::new();
        snap.upsert(seat("a", false));
        snap.upsert(seat("b", false));

        let removed = snap.remove(&ParticipantId::from("a")).unwrap();
        assert_eq!(removed.participant_id.as_str(), "a");
        assert_eq!(snap.position(&ParticipantId::from("b")), Some(0));
        assert!(snap.remove(&ParticipantId::from("a")).is_none());
    }

    #[test]
    fn test_record_defaults_when_fields_missing() {
        let record: SeatRecord = serde_json::from_str(r#"{"participant_id":"uid-9"}"#).unwrap();
        assert!(!record.ready);
        assert!(record.loadout.is_empty());
    }
}
