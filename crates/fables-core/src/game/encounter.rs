use crate::error::{Error, Result};
use crate::offset::layout::encounter::{DEFEATED, ENEMY_SLOTS, ENTRY_SIZE, TABLE_SIZE};

/// Per-enemy encounter and defeat counters, indexed by enemy id.
#[derive(Clone, PartialEq, Eq)]
pub struct EncounterTable {
    bytes: Vec<u8>,
}

impl EncounterTable {
    /// Wrap a raw table buffer, requiring exactly `expected_len` bytes.
    pub fn from_bytes(bytes: Vec<u8>, expected_len: usize) -> Result<Self> {
        if bytes.len() != expected_len {
            return Err(Error::SizeMismatch {
                expected: expected_len,
                actual: bytes.len(),
            });
        }
        Ok(Self { bytes })
    }

    /// A zeroed table of the standard size.
    pub fn empty() -> Self {
        Self {
            bytes: vec![0; TABLE_SIZE],
        }
    }

    /// Build a table from `(enemy, encountered, defeated)` entries.
    pub fn from_counts(counts: &[(usize, i32, i32)]) -> Self {
        let mut table = Self::empty();
        for &(enemy, encountered, defeated) in counts {
            table.set(enemy, encountered, defeated);
        }
        table
    }

    /// Overwrite one entry. Ids outside the table are ignored.
    pub fn set(&mut self, enemy: usize, encountered: i32, defeated: i32) {
        let Some(entry) = Self::entry_offset(enemy)
            .and_then(|start| self.bytes.get_mut(start..start.checked_add(ENTRY_SIZE)?))
        else {
            return;
        };
        entry[..DEFEATED].copy_from_slice(&encountered.to_le_bytes());
        entry[DEFEATED..].copy_from_slice(&defeated.to_le_bytes());
    }

    fn entry_offset(enemy: usize) -> Option<usize> {
        enemy.checked_mul(ENTRY_SIZE)
    }

    fn read_i32(&self, offset: usize) -> Option<i32> {
        let bytes = self.bytes.get(offset..offset.checked_add(4)?)?;
        Some(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn encountered(&self, enemy: usize) -> Option<i32> {
        self.read_i32(Self::entry_offset(enemy)?)
    }

    /// Times the enemy has been defeated (`enemy * 8 + 4`).
    pub fn defeated(&self, enemy: usize) -> Option<i32> {
        self.read_i32(Self::entry_offset(enemy)?.checked_add(DEFEATED)?)
    }

    /// True when every listed enemy has strictly more defeats than in `baseline`.
    ///
    /// An enemy id outside either table never counts as progressed.
    pub fn all_defeated_since(&self, baseline: &EncounterTable, enemies: &[usize]) -> bool {
        enemies
            .iter()
            .all(|&e| match (self.defeated(e), baseline.defeated(e)) {
                (Some(now), Some(before)) => now > before,
                _ => false,
            })
    }

    /// Ids with a nonzero defeat count.
    pub fn defeated_enemies(&self) -> Vec<(usize, i32)> {
        (0..ENEMY_SLOTS)
            .filter_map(|e| self.defeated(e).filter(|&n| n != 0).map(|n| (e, n)))
            .collect()
    }
}

impl std::fmt::Debug for EncounterTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncounterTable")
            .field("defeated", &self.defeated_enemies())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defeated_offset() {
        let mut bytes = vec![0u8; TABLE_SIZE];
        bytes[3 * 8 + 4] = 5;
        bytes[3 * 8] = 9;
        let table = EncounterTable::from_bytes(bytes, TABLE_SIZE).unwrap();
        assert_eq!(table.defeated(3), Some(5));
        assert_eq!(table.encountered(3), Some(9));
        assert_eq!(table.defeated(ENEMY_SLOTS), None);
    }

    #[test]
    fn test_huge_enemy_id_is_out_of_range() {
        let mut table = EncounterTable::from_counts(&[(1, 1, 1)]);
        for enemy in [usize::MAX, usize::MAX / 4, usize::MAX / ENTRY_SIZE] {
            assert_eq!(table.defeated(enemy), None);
            assert_eq!(table.encountered(enemy), None);
            table.set(enemy, 3, 3);
        }
        assert_eq!(table, EncounterTable::from_counts(&[(1, 1, 1)]));
        assert!(!table.all_defeated_since(&EncounterTable::empty(), &[usize::MAX / 4]));
    }

    #[test]
    fn test_size_must_match() {
        assert!(EncounterTable::from_bytes(vec![0; 16], TABLE_SIZE).is_err());
    }

    #[test]
    fn test_all_defeated_since() {
        let baseline = EncounterTable::from_counts(&[(3, 1, 0), (7, 2, 2)]);
        let fresh = EncounterTable::from_counts(&[(3, 1, 1), (7, 3, 2)]);

        assert!(fresh.all_defeated_since(&baseline, &[3]));
        assert!(!fresh.all_defeated_since(&baseline, &[7]));
        assert!(!fresh.all_defeated_since(&baseline, &[3, 7]));
        assert!(!fresh.all_defeated_since(&baseline, &[ENEMY_SLOTS + 1]));
        assert!(fresh.all_defeated_since(&baseline, &[]));
    }

    #[test]
    fn test_debug_lists_defeats_only() {
        let table = EncounterTable::from_counts(&[(2, 4, 1)]);
        assert_eq!(format!("{:?}", table), "EncounterTable { defeated: [(2, 1)] }");
    }
}
