//! # Health-aware Round Robin
//!
//! Scans at most one full lap of the rotation set starting at the cursor.
//!
//! The cursor advances past every candidate examined, including DOWN shards
//! that are skipped, so a skip shifts later selections. Routing sequences
//! depend on this exact behavior.

use sm_01_shard_store::ShardId;

use crate::domain::errors::DispatchError;
use crate::domain::health::HealthMap;

/// Pick the next UP shard and advance `cursor`.
///
/// - empty rotation set: `NoAvailableShard`, cursor untouched
/// - N candidates all DOWN: `NoHealthyShard`, cursor back at `cursor mod N`
pub fn select_shard(
    rotation: &[ShardId],
    health: &HealthMap,
    cursor: &mut usize,
) -> Result<ShardId, DispatchError> {
    let total = rotation.len();
    if total == 0 {
        return Err(DispatchError::NoAvailableShard);
    }

    for _ in 0..total {
        let position = *cursor % total;
        let candidate = &rotation[position];
        *cursor = (position + 1) % total;

        if health.get(candidate).is_some_and(|state| state.is_up()) {
            return Ok(candidate.clone());
        }
    }

    Err(DispatchError::NoHealthyShard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::health::HealthState;

    fn setup(raw: &[(&str, HealthState)]) -> (Vec<ShardId>, HealthMap) {
        let rotation = raw.iter().map(|(id, _)| ShardId::new(*id)).collect();
        let health = raw
            .iter()
            .map(|(id, state)| (ShardId::new(*id), *state))
            .collect();
        (rotation, health)
    }

    #[test]
    fn test_strict_rotation_when_all_up() {
        use HealthState::Up;
        let (rotation, health) = setup(&[("A", Up), ("B", Up), ("C", Up)]);
        let mut cursor = 0;

        let picks: Vec<String> = (0..6)
            .map(|_| select_shard(&rotation, &health, &mut cursor).unwrap().to_string())
            .collect();

        assert_eq!(picks, ["A", "B", "C", "A", "B", "C"]);
    }

    #[test]
    fn test_down_candidate_skipped_and_cursor_moves_past_it() {
        use HealthState::{Down, Up};
        let (rotation, health) = setup(&[("A", Up), ("B", Down), ("C", Up)]);
        let mut cursor = 1;

        let pick = select_shard(&rotation, &health, &mut cursor).unwrap();
        assert_eq!(pick.as_str(), "C");
        assert_eq!(cursor, 0);
    }

    #[test]
    fn test_empty_rotation_is_no_available() {
        let mut cursor = 2;
        let result = select_shard(&[], &HealthMap::new(), &mut cursor);

        assert_eq!(result, Err(DispatchError::NoAvailableShard));
        assert_eq!(cursor, 2);
    }

    #[test]
    fn test_all_down_is_no_healthy() {
        use HealthState::Down;
        let (rotation, health) = setup(&[("A", Down), ("B", Down)]);
        let mut cursor = 1;

        let result = select_shard(&rotation, &health, &mut cursor);
        assert_eq!(result, Err(DispatchError::NoHealthyShard));
        assert_eq!(cursor, 1);
    }

    #[test]
    fn test_cursor_is_taken_modulo_shrunken_set() {
        use HealthState::Up;
        let (rotation, health) = setup(&[("B", Up), ("C", Up)]);
        let mut cursor = 5;

        let pick = select_shard(&rotation, &health, &mut cursor).unwrap();
        assert_eq!(pick.as_str(), "C");
        assert_eq!(cursor, 0);
    }
}
