use std::borrow::Borrow;
use std::hash::Hash;
use std::ops::{Index, IndexMut};

use hashbrown::HashMap;
use serde::de::Error as SerdeError;
use serde::{Deserialize, Serialize};

use crate::is_debug;

pub trait KeyIndexKey<K> {
    fn key(&self) -> &K;
}

/// Insertion-ordered storage with O(1) lookup by key.
///
/// Items keep the order they were pushed in, which is also the order they
/// serialize in. Removal shifts later items down and re-indexes them.
#[derive(Debug, Clone)]
pub struct KeyIndexVec<K: Clone + Eq + Hash, V: KeyIndexKey<K>> {
    items: Vec<V>,
    idx_by_key: HashMap<K, usize>,
}

impl<K, V> Default for KeyIndexVec<K, V>
where
    K: Clone + Eq + Hash,
    V: KeyIndexKey<K>,
{
    fn default() -> Self {
        Self {
            items: Vec::new(),
            idx_by_key: HashMap::new(),
        }
    }
}

impl<K, V> KeyIndexVec<K, V>
where
    K: Clone + Eq + Hash,
    V: KeyIndexKey<K>,
{
    /// Appends `v`, or replaces the existing item with the same key in place.
    pub fn push(&mut self, v: V) {
        match self.idx_by_key.get(v.key()).copied() {
            Some(idx) => self.items[idx] = v,
            None => {
                self.idx_by_key.insert(v.key().clone(), self.items.len());
                self.items.push(v);
            }
        }
    }

    pub fn remove_by_key<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = self.idx_by_key.remove(key)?;
        let removed = self.items.remove(idx);
        let removed_key: &Q = removed.key().borrow();
        assert!(removed_key == key);

        for (pos, item) in self.items.iter().enumerate().skip(idx) {
            self.idx_by_key.insert(item.key().clone(), pos);
        }

        Some(removed)
    }

    /// Keeps only the items for which `keep` returns true and returns the removed ones.
    pub fn retain_with(&mut self, mut keep: impl FnMut(&V) -> bool) -> Vec<V> {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.items.len());
        for item in self.items.drain(..) {
            if keep(&item) {
                kept.push(item);
            } else {
                removed.push(item);
            }
        }
        self.items = kept;
        self.reindex();
        removed
    }

    pub fn iter(&self) -> std::slice::Iter<'_, V> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, V> {
        self.items.iter_mut()
    }

    pub fn as_slice(&self) -> &[V] {
        self.items.as_slice()
    }

    pub fn len(&self) -> usize {
        assert_eq!(self.items.len(), self.idx_by_key.len());
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        assert_eq!(self.items.len(), self.idx_by_key.len());
        self.items.is_empty()
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.idx_by_key.contains_key(key)
    }

    pub fn index_of_key<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.idx_by_key.get(key).copied()
    }

    pub fn by_key<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index_of_key(key).map(|idx| &self.items[idx])
    }

    pub fn by_key_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = self.index_of_key(key)?;
        Some(&mut self.items[idx])
    }

    pub fn into_vec(self) -> Vec<V> {
        self.items
    }

    fn reindex(&mut self) {
        self.idx_by_key.clear();
        for (idx, item) in self.items.iter().enumerate() {
            let prev = self.idx_by_key.insert(item.key().clone(), idx);
            assert!(prev.is_none(), "duplicate key in KeyIndexVec");
        }

        if is_debug() {
            assert_eq!(self.items.len(), self.idx_by_key.len());
        }
    }
}

impl<K, V> FromIterator<V> for KeyIndexVec<K, V>
where
    K: Clone + Eq + Hash,
    V: KeyIndexKey<K>,
{
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        let mut vec = Self::default();
        for item in iter {
            vec.push(item);
        }
        vec
    }
}

impl<K, V> Index<usize> for KeyIndexVec<K, V>
where
    K: Clone + Eq + Hash,
    V: KeyIndexKey<K>,
{
    type Output = V;

    fn index(&self, idx: usize) -> &Self::Output {
        assert!(idx < self.items.len());
        &self.items[idx]
    }
}

impl<K, V> IndexMut<usize> for KeyIndexVec<K, V>
where
    K: Clone + Eq + Hash,
    V: KeyIndexKey<K>,
{
    fn index_mut(&mut self, idx: usize) -> &mut Self::Output {
        assert!(idx < self.items.len());
        &mut self.items[idx]
    }
}

impl<'a, K, V> IntoIterator for &'a KeyIndexVec<K, V>
where
    K: Clone + Eq + Hash,
    V: KeyIndexKey<K>,
{
    type Item = &'a V;
    type IntoIter = std::slice::Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<K, V> Serialize for KeyIndexVec<K, V>
where
    K: Clone + Eq + Hash,
    V: KeyIndexKey<K> + Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.items.serialize(serializer)
    }
}

impl<'de, K, V> Deserialize<'de> for KeyIndexVec<K, V>
where
    K: Clone + Eq + Hash,
    V: KeyIndexKey<K> + Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let items: Vec<V> = Vec::deserialize(deserializer)?;
        let mut idx_by_key = HashMap::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            if idx_by_key.insert(item.key().clone(), idx).is_some() {
                return Err(SerdeError::custom("Duplicate key in KeyIndexVec"));
            }
        }

        Ok(Self { items, idx_by_key })
    }
}
