//! Dense index assignment for unique vertex keys.

use std::collections::HashMap;
use std::hash::Hash;

use corelib::{LoadError, LoadResult};

/// Maps each distinct key to a 0-based dense index in first-seen order.
#[derive(Debug)]
pub struct VertexIndex<K> {
    map: HashMap<K, u32>,
}

impl<K: Eq + Hash> VertexIndex<K> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
        }
    }

    /// Returns the dense index for `key` and whether it was newly assigned.
    pub fn get_or_insert(&mut self, key: K) -> LoadResult<(u32, bool)> {
        if let Some(&idx) = self.map.get(&key) {
            return Ok((idx, false));
        }
        let idx = u32::try_from(self.map.len()).map_err(|_| LoadError::TooManyVertices)?;
        self.map.insert(key, idx);
        Ok((idx, true))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_seen_order() {
        let mut index = VertexIndex::with_capacity(4);
        assert_eq!(index.get_or_insert("3/2/1").unwrap(), (0, true));
        assert_eq!(index.get_or_insert("1/1/1").unwrap(), (1, true));
        assert_eq!(index.get_or_insert("3/2/1").unwrap(), (0, false));
        assert_eq!(index.get_or_insert("2").unwrap(), (2, true));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn textual_keys_are_not_merged() {
        let mut index = VertexIndex::with_capacity(2);
        let (a, _) = index.get_or_insert("1/1").unwrap();
        let (b, _) = index.get_or_insert("-3/-1").unwrap();
        assert_ne!(a, b);
    }
}
