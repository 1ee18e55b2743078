//! A hash map with TeX grouping semantics.
//!
//! The [GroupingMap] type is an associative container in which mutations can be scoped
//!     to a group.
//! A group is started with [begin_group](GroupingMap::begin_group) and finished with
//!     [end_group](GroupingMap::end_group).
//! Every local mutation performed inside a group is rolled back when the group ends.
//! Global mutations bypass the groups entirely: they write the value and
//!     cancel any pending rollback for the same key in every open group.
//!
//! This is exactly the behavior of TeX's save stack, and the map is used for both the
//!     control sequence bindings and the category code table.
//!
//! # Examples
//!
//! ```
//! # use texparser_stdext::collections::groupingmap::*;
//! let mut owners = GroupingMap::default();
//! owners.insert("paganini", "rosalind", Scope::Local);
//!
//! owners.begin_group();
//! owners.insert("paganini", "mariana", Scope::Local);
//! owners.insert("mint", "mariana", Scope::Local);
//! assert_eq!(owners.get(&"paganini"), Some(&"mariana"));
//! assert_eq!(owners.end_group(), Ok(()));
//!
//! assert_eq!(owners.get(&"paganini"), Some(&"rosalind"));
//! assert_eq!(owners.get(&"mint"), None);
//! ```
//!
//! A global insert survives the end of every group that is open when it happens:
//! ```
//! # use texparser_stdext::collections::groupingmap::*;
//! let mut owners = GroupingMap::default();
//! owners.insert("paganini", "rosalind", Scope::Local);
//! owners.begin_group();
//! owners.insert("paganini", "mariana", Scope::Local);
//! owners.begin_group();
//! owners.insert("paganini", "ingrid", Scope::Global);
//! assert_eq!(owners.end_group(), Ok(()));
//! assert_eq!(owners.end_group(), Ok(()));
//! assert_eq!(owners.get(&"paganini"), Some(&"ingrid"));
//! ```
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;

/// The scope of an insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Scope {
    /// The insertion is rolled back at the end of the current group.
    #[default]
    Local,
    /// The insertion persists beyond the end of all current groups.
    Global,
}

/// What to do for a key when the group that touched it ends.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
enum Restore<V> {
    /// Put this value back.
    Value(V),
    /// The key was unset before the group; remove it.
    Unset,
}

/// Error returned by [GroupingMap::end_group] when there is no open group.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct NoGroupToEndError;

impl std::fmt::Display for NoGroupToEndError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "there is no group to end")
    }
}

impl std::error::Error for NoGroupToEndError {}

/// Hash map with grouping semantics.
///
/// See the module documentation.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupingMap<K: Eq + Hash, V> {
    values: HashMap<K, V>,
    // One frame per open group. The base (global) level has no frame: nothing is restored there.
    frames: Vec<HashMap<K, Restore<V>>>,
}

impl<K: Eq + Hash, V> Default for GroupingMap<K, V> {
    fn default() -> Self {
        GroupingMap {
            values: HashMap::new(),
            frames: Vec::new(),
        }
    }
}

impl<K: Eq + Hash + Clone, V> GroupingMap<K, V> {
    /// Inserts the value at the key in the provided scope.
    ///
    /// Returns whether a value was visible at the key before the insertion.
    pub fn insert(&mut self, key: K, val: V, scope: Scope) -> bool {
        let frame = match scope {
            Scope::Local => self.frames.last_mut(),
            Scope::Global => {
                for frame in &mut self.frames {
                    frame.remove(&key);
                }
                None
            }
        };
        let previous = self.values.insert(key.clone(), val);
        let existed = previous.is_some();
        if let Some(frame) = frame {
            // Only the first local assignment in a group records the value to restore.
            if let Entry::Vacant(vacant) = frame.entry(key) {
                vacant.insert(match previous {
                    None => Restore::Unset,
                    Some(previous) => Restore::Value(previous),
                });
            }
        }
        existed
    }

    /// Removes the key in the provided scope.
    ///
    /// A local removal is rolled back like a local insertion.
    pub fn remove(&mut self, key: &K, scope: Scope) {
        let previous = match self.values.remove(key) {
            None => return,
            Some(previous) => previous,
        };
        match scope {
            Scope::Local => {
                if let Some(frame) = self.frames.last_mut() {
                    if let Entry::Vacant(vacant) = frame.entry(key.clone()) {
                        vacant.insert(Restore::Value(previous));
                    }
                }
            }
            Scope::Global => {
                for frame in &mut self.frames {
                    frame.remove(key);
                }
            }
        }
    }

    /// Returns the visible value at the key.
    #[inline]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.values.get(key)
    }

    /// Returns whether a value is visible at the key.
    #[inline]
    pub fn contains_key(&self, key: &K) -> bool {
        self.values.contains_key(key)
    }

    /// Returns the value that the key will revert to when the current group ends.
    ///
    /// The outer [Option] is [None] if the key was not assigned locally in the current group,
    ///     in which case the end of the group does not change it.
    pub fn shadowed(&self, key: &K) -> Option<Option<&V>> {
        let frame = self.frames.last()?;
        match frame.get(key)? {
            Restore::Value(v) => Some(Some(v)),
            Restore::Unset => Some(None),
        }
    }

    /// Begins a new group.
    pub fn begin_group(&mut self) {
        self.frames.push(HashMap::new());
    }

    /// Ends the current group, rolling back every local mutation made within it.
    pub fn end_group(&mut self) -> Result<(), NoGroupToEndError> {
        let frame = self.frames.pop().ok_or(NoGroupToEndError)?;
        for (key, restore) in frame {
            match restore {
                Restore::Value(v) => {
                    self.values.insert(key, v);
                }
                Restore::Unset => {
                    self.values.remove(&key);
                }
            }
        }
        Ok(())
    }

    /// Number of currently open groups.
    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Iterates over the visible keys, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.values.keys()
    }

    /// Iterates over the visible (key, value) pairs, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.values.iter()
    }

    /// Number of visible values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no values are visible.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Eq + Hash + Clone, V> FromIterator<(K, V)> for GroupingMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        GroupingMap {
            values: iter.into_iter().collect(),
            frames: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_after_nested_insert() {
        let mut map = GroupingMap::default();
        map.begin_group();
        map.insert(3, 5, Scope::Local);
        assert_eq!(map.get(&3), Some(&5));
        map.insert(3, 4, Scope::Local);
        assert_eq!(map.get(&3), Some(&4));
        assert_eq!(map.end_group(), Ok(()));
        assert_eq!(map.get(&3), None);
    }

    #[test]
    fn local_insert_is_rolled_back_to_outer_value() {
        let mut map = GroupingMap::default();
        map.insert(1, "outer", Scope::Local);
        map.begin_group();
        map.insert(1, "inner", Scope::Local);
        map.begin_group();
        map.insert(1, "innermost", Scope::Local);
        assert_eq!(map.end_group(), Ok(()));
        assert_eq!(map.get(&1), Some(&"inner"));
        assert_eq!(map.end_group(), Ok(()));
        assert_eq!(map.get(&1), Some(&"outer"));
    }

    #[test]
    fn global_insert_cancels_pending_restores() {
        let mut map = GroupingMap::default();
        map.insert(1, 1, Scope::Local);
        map.begin_group();
        map.insert(1, 2, Scope::Local);
        map.begin_group();
        map.insert(1, 3, Scope::Global);
        map.insert(1, 4, Scope::Local);
        assert_eq!(map.end_group(), Ok(()));
        assert_eq!(map.get(&1), Some(&3));
        assert_eq!(map.end_group(), Ok(()));
        assert_eq!(map.get(&1), Some(&3));
    }

    #[test]
    fn global_insert_of_new_key_survives() {
        let mut map: GroupingMap<&str, i32> = GroupingMap::default();
        map.begin_group();
        map.insert("a", 1, Scope::Global);
        assert_eq!(map.end_group(), Ok(()));
        assert_eq!(map.get(&"a"), Some(&1));
    }

    #[test]
    fn local_remove_is_rolled_back() {
        let mut map = GroupingMap::default();
        map.insert('a', 1, Scope::Global);
        map.begin_group();
        map.remove(&'a', Scope::Local);
        assert_eq!(map.get(&'a'), None);
        assert_eq!(map.end_group(), Ok(()));
        assert_eq!(map.get(&'a'), Some(&1));
    }

    #[test]
    fn shadowed_value() {
        let mut map = GroupingMap::default();
        assert_eq!(map.shadowed(&1), None);
        map.insert(1, 10, Scope::Local);
        map.begin_group();
        assert_eq!(map.shadowed(&1), None);
        map.insert(1, 20, Scope::Local);
        map.insert(2, 30, Scope::Local);
        assert_eq!(map.shadowed(&1), Some(Some(&10)));
        assert_eq!(map.shadowed(&2), Some(None));
    }

    #[test]
    fn end_group_without_group() {
        let mut map = GroupingMap::<String, String>::default();
        assert_eq!(map.end_group(), Err(NoGroupToEndError));
        map.begin_group();
        assert_eq!(map.depth(), 1);
        assert_eq!(map.end_group(), Ok(()));
        assert_eq!(map.end_group(), Err(NoGroupToEndError));
    }

    #[test]
    fn from_iterator() {
        let map: GroupingMap<&str, i32> = [("a", 1), ("b", 2)].into_iter().collect();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&"b"), Some(&2));
        assert_eq!(map.depth(), 0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_round_trip_keeps_frames() {
        let mut map = GroupingMap::default();
        map.insert("a".to_string(), 1, Scope::Local);
        map.begin_group();
        map.insert("a".to_string(), 2, Scope::Local);
        let serialized = serde_json::to_string(&map).unwrap();
        let mut map: GroupingMap<String, i32> = serde_json::from_str(&serialized).unwrap();
        assert_eq!(map.end_group(), Ok(()));
        assert_eq!(map.get(&"a".to_string()), Some(&1));
    }
}
