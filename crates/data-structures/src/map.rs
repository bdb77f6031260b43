//! Hash maps and sets keyed with [`FxHasher`].
//!
//! The compiler hashes small integer ids almost exclusively, so the default SipHash is wasted
//! work. Use the `Index*` variants wherever iteration order reaches the output: block layout,
//! function layout and memory slot assignment must not depend on hash order.

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHasher;
use std::{
    collections::{HashMap, HashSet},
    hash::BuildHasherDefault,
};

type FxBuild = BuildHasherDefault<FxHasher>;

/// An unordered map.
pub type FxHashMap<K, V> = HashMap<K, V, FxBuild>;
/// An unordered set.
pub type FxHashSet<V> = HashSet<V, FxBuild>;
/// A map that iterates in insertion order.
pub type FxIndexMap<K, V> = IndexMap<K, V, FxBuild>;
/// A set that iterates in insertion order.
pub type FxIndexSet<V> = IndexSet<V, FxBuild>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_map_keeps_insertion_order() {
        let mut map = FxIndexMap::default();
        for key in [7u32, 1, 4, 2] {
            map.insert(key, key * 10);
        }
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), [7, 1, 4, 2]);
        map.shift_remove(&1);
        assert_eq!(map.values().copied().collect::<Vec<_>>(), [70, 40, 20]);
    }
}
