use std::collections::HashMap;

use tracing::warn;

use super::record::RecipeId;
use crate::error::LarderError;
use crate::Result;

/// Size of the record-count header of `offsets.sdb`
pub const INDEX_HEADER_LEN: usize = 4;
/// Size of one (id, offset) entry of `offsets.sdb`
pub const INDEX_ENTRY_LEN: usize = 12;

/// In-memory mapping from recipe id to byte offset in the data file
#[derive(Clone, Debug, Default)]
pub struct OffsetIndex {
    offsets: HashMap<RecipeId, u32>,
    /// Every entry in file order, superseded duplicates included
    order: Vec<(RecipeId, u32)>,
}

impl OffsetIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            offsets: HashMap::with_capacity(capacity),
            order: Vec::with_capacity(capacity),
        }
    }

    /// Parse the full contents of an index file
    ///
    /// The header count must match the number of entries exactly and offsets
    /// must strictly increase. A repeated id keeps its last offset.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let count = read_header(bytes)? as usize;

        let expected = INDEX_HEADER_LEN + count * INDEX_ENTRY_LEN;
        if bytes.len() != expected {
            return Err(LarderError::CorruptStore(format!(
                "index declares {} records ({} bytes) but holds {} bytes",
                count,
                expected,
                bytes.len()
            )));
        }

        let mut index = Self::with_capacity(count);
        for entry in bytes[INDEX_HEADER_LEN..].chunks_exact(INDEX_ENTRY_LEN) {
            let mut id = [0u8; 8];
            id.copy_from_slice(&entry[..8]);
            let offset = u32::from_le_bytes([entry[8], entry[9], entry[10], entry[11]]);
            index.insert(u64::from_le_bytes(id), offset)?;
        }

        Ok(index)
    }

    /// Record the offset of the next record
    pub fn insert(&mut self, recipe_id: RecipeId, offset: u32) -> Result<()> {
        if let Some(last) = self.last_offset() {
            if offset <= last {
                return Err(LarderError::CorruptStore(format!(
                    "offset {} for recipe {} does not follow previous offset {}",
                    offset, recipe_id, last
                )));
            }
        }

        if self.offsets.insert(recipe_id, offset).is_some() {
            warn!(recipe_id, "duplicate recipe id in offset index, keeping latest");
        }
        self.order.push((recipe_id, offset));
        Ok(())
    }

    /// Whether an entry is the one its id resolves to
    fn is_live(&self, recipe_id: RecipeId, offset: u32) -> bool {
        self.offsets.get(&recipe_id) == Some(&offset)
    }

    /// Look up the offset of a recipe
    #[inline]
    pub fn get(&self, recipe_id: RecipeId) -> Option<u32> {
        self.offsets.get(&recipe_id).copied()
    }

    pub fn contains(&self, recipe_id: RecipeId) -> bool {
        self.offsets.contains_key(&recipe_id)
    }

    /// Number of distinct ids
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Largest offset in the index
    pub fn last_offset(&self) -> Option<u32> {
        self.order.last().map(|(_, offset)| *offset)
    }

    /// Ids in insertion order of their latest entry
    pub fn ids(&self) -> impl Iterator<Item = RecipeId> + '_ {
        self.entries().map(|(id, _)| id)
    }

    /// (id, offset) pairs in insertion order, superseded entries skipped
    pub fn entries(&self) -> impl Iterator<Item = (RecipeId, u32)> + '_ {
        self.order
            .iter()
            .copied()
            .filter(|(id, offset)| self.is_live(*id, *offset))
    }
}

/// Read the record count from the start of an index file
pub(crate) fn read_header(bytes: &[u8]) -> Result<u32> {
    match bytes.get(..INDEX_HEADER_LEN) {
        Some(h) => Ok(u32::from_le_bytes([h[0], h[1], h[2], h[3]])),
        None => Err(LarderError::CorruptStore(format!(
            "index file too short for header ({} bytes)",
            bytes.len()
        ))),
    }
}

/// Encode one index entry
pub(crate) fn encode_entry(recipe_id: RecipeId, offset: u32) -> [u8; INDEX_ENTRY_LEN] {
    let mut out = [0u8; INDEX_ENTRY_LEN];
    out[..8].copy_from_slice(&recipe_id.to_le_bytes());
    out[8..].copy_from_slice(&offset.to_le_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_bytes(entries: &[(u64, u32)]) -> Vec<u8> {
        let mut bytes = (entries.len() as u32).to_le_bytes().to_vec();
        for (id, offset) in entries {
            bytes.extend_from_slice(&encode_entry(*id, *offset));
        }
        bytes
    }

    #[test]
    fn test_parse_entries() {
        let index = OffsetIndex::from_bytes(&index_bytes(&[(10, 0), (7, 120), (99, 300)])).unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.get(7), Some(120));
        assert_eq!(index.get(8), None);
        assert_eq!(index.last_offset(), Some(300));
        assert_eq!(index.ids().collect::<Vec<_>>(), vec![10, 7, 99]);
    }

    #[test]
    fn test_empty_index() {
        let index = OffsetIndex::from_bytes(&0u32.to_le_bytes()).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.last_offset(), None);
    }

    #[test]
    fn test_count_mismatch_is_corrupt() {
        let mut bytes = index_bytes(&[(1, 0), (2, 100)]);
        bytes[0] = 3;
        assert!(matches!(
            OffsetIndex::from_bytes(&bytes),
            Err(LarderError::CorruptStore(_))
        ));

        let bytes = index_bytes(&[(1, 0), (2, 100)]);
        assert!(OffsetIndex::from_bytes(&bytes[..bytes.len() - 1]).is_err());
        assert!(OffsetIndex::from_bytes(&[0, 0]).is_err());
    }

    #[test]
    fn test_non_increasing_offsets_are_corrupt() {
        let bytes = index_bytes(&[(1, 100), (2, 100)]);
        assert!(matches!(
            OffsetIndex::from_bytes(&bytes),
            Err(LarderError::CorruptStore(_))
        ));
    }

    #[test]
    fn test_duplicate_id_keeps_latest() {
        let index = OffsetIndex::from_bytes(&index_bytes(&[(1, 0), (2, 50), (1, 90)])).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.get(1), Some(90));
        assert_eq!(index.entries().collect::<Vec<_>>(), vec![(2, 50), (1, 90)]);
    }

    #[test]
    fn test_many_duplicates_load_linearly() {
        let entries: Vec<(u64, u32)> = (0..50_000u32).map(|i| ((i % 3) as u64, i * 100)).collect();
        let index = OffsetIndex::from_bytes(&index_bytes(&entries)).unwrap();

        assert_eq!(index.len(), 3);
        assert_eq!(
            index.entries().collect::<Vec<_>>(),
            vec![(2, 4_999_700), (0, 4_999_800), (1, 4_999_900)]
        );
        assert_eq!(index.last_offset(), Some(4_999_900));
    }
}
