//! Pre-battle loadout preparation

use quizpet_protocol::{Direction, MoveId};
use rand::Rng;
use thiserror::Error;

use crate::catalog::MoveCatalog;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadoutError {
    #[error("Move index {index} out of bounds for loadout of {len}")]
    OutOfBounds { index: usize, len: usize },

    #[error("Refresh already used this ready cycle")]
    RefreshAlreadyUsed,

    #[error("Move catalog is empty")]
    EmptyCatalog,
}

/// A participant's editable move order plus the one-time refresh privilege
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoadoutDraft {
    moves: Vec<MoveId>,
    refresh_used: bool,
}

impl LoadoutDraft {
    pub fn new(moves: Vec<MoveId>) -> Self {
        Self {
            moves,
            refresh_used: false,
        }
    }

    pub fn moves(&self) -> &[MoveId] {
        &self.moves
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn refresh_used(&self) -> bool {
        self.refresh_used
    }

    /// Replace the whole move order (the refresh privilege is untouched)
    pub fn replace(&mut self, moves: Vec<MoveId>) {
        self.moves = moves;
    }

    /// Make the refresh privilege available again
    pub fn rearm_refresh(&mut self) {
        self.refresh_used = false;
    }

    /// Swap the move at `index` with its neighbour in `direction`
    ///
    /// Moving the first entry up or the last entry down is a no-op and
    /// returns `Ok(false)`.
    pub fn reorder(&mut self, index: usize, direction: Direction) -> Result<bool, LoadoutError> {
        let len = self.moves.len();
        if index >= len {
            return Err(LoadoutError::OutOfBounds { index, len });
        }

        let other = match direction {
            Direction::Up if index == 0 => return Ok(false),
            Direction::Up => index - 1,
            Direction::Down if index + 1 == len => return Ok(false),
            Direction::Down => index + 1,
        };
        self.moves.swap(index, other);
        Ok(true)
    }

    /// Replace the move at `index` with a random catalog move
    ///
    /// Allowed once until [`rearm_refresh`](Self::rearm_refresh). Returns
    /// the new move id.
    pub fn refresh<R: Rng + ?Sized>(
        &mut self,
        index: usize,
        catalog: &MoveCatalog,
        rng: &mut R,
    ) -> Result<MoveId, LoadoutError> {
        if self.refresh_used {
            return Err(LoadoutError::RefreshAlreadyUsed);
        }
        let len = self.moves.len();
        let current = self
            .moves
            .get(index)
            .ok_or(LoadoutError::OutOfBounds { index, len })?;

        let next = catalog
            .random_id_other_than(current, rng)
            .ok_or(LoadoutError::EmptyCatalog)?;

        self.moves[index] = next.clone();
        self.refresh_used = true;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn draft() -> LoadoutDraft {
        LoadoutDraft::new(vec![
            MoveId::from("plasma-bite"),
            MoveId::from("nebula-pulse"),
            MoveId::from("gravity-slam"),
        ])
    }

    #[test]
    fn test_reorder_swaps_neighbours() {
        let mut d = draft();
        assert_eq!(d.reorder(1, Direction::Up), Ok(true));
        assert_eq!(d.moves()[0].as_str(), "nebula-pulse");
        assert_eq!(d.moves()[1].as_str(), "plasma-bite");

        assert_eq!(d.reorder(1, Direction::Down), Ok(true));
        assert_eq!(d.moves()[2].as_str(), "plasma-bite");
    }

    #[test]
    fn test_reorder_edges_are_noops() {
        let mut d = draft();
        let before = d.clone();
        assert_eq!(d.reorder(0, Direction::Up), Ok(false));
        assert_eq!(d.reorder(2, Direction::Down), Ok(false));
        assert_eq!(d, before);
    }

    #[test]
    fn test_reorder_out_of_bounds() {
        let mut d = draft();
        assert_eq!(
            d.reorder(3, Direction::Up),
            Err(LoadoutError::OutOfBounds { index: 3, len: 3 })
        );
    }

    #[test]
    fn test_refresh_once_per_cycle() {
        let catalog = MoveCatalog::standard();
        let mut rng = StdRng::seed_from_u64(3);
        let mut d = draft();

        let replaced = d.refresh(0, &catalog, &mut rng).unwrap();
        assert_ne!(replaced.as_str(), "plasma-bite");
        assert_eq!(d.moves()[0], replaced);
        assert!(d.refresh_used());

        assert_eq!(
            d.refresh(1, &catalog, &mut rng),
            Err(LoadoutError::RefreshAlreadyUsed)
        );

        d.rearm_refresh();
        assert!(d.refresh(1, &catalog, &mut rng).is_ok());
    }

    #[test]
    fn test_refresh_bad_index_keeps_privilege() {
        let catalog = MoveCatalog::standard();
        let mut rng = StdRng::seed_from_u64(3);
        let mut d = draft();

        assert!(d.refresh(9, &catalog, &mut rng).is_err());
        assert!(!d.refresh_used());
    }

    #[test]
    fn test_refresh_empty_catalog() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut d = draft();
        assert_eq!(
            d.refresh(0, &MoveCatalog::default(), &mut rng),
            Err(LoadoutError::EmptyCatalog)
        );
        assert!(!d.refresh_used());
    }
}
