//! Order-preserving, identity-deduplicated collections.
//!
//! An [`Accumulator`] is the merged result-so-far of one traversal. It keeps:
//! - insertion order for first-seen identities,
//! - at most one entry per identity,
//! - an identity → position index, so a merge is O(1) per record.
//!
//! Replacing an entry never moves it.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use roomsync_types::{StreamUuid, UserUuid};

use crate::normalize::{Stream, User};

/// An entity with a stable identity.
pub trait Keyed {
    /// Identity type.
    type Key: Clone + Eq + Hash + Debug;

    /// The identity of this entity.
    fn key(&self) -> &Self::Key;
}

impl Keyed for User {
    type Key = UserUuid;

    fn key(&self) -> &UserUuid {
        &self.uuid
    }
}

impl Keyed for Stream {
    type Key = StreamUuid;

    fn key(&self) -> &StreamUuid {
        &self.uuid
    }
}

/// What an [`Accumulator::upsert`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// A new identity was appended at this position.
    Inserted(usize),
    /// An existing entry at this position was replaced.
    Replaced(usize),
}

/// Ordered collection, unique by identity.
#[derive(Debug, Clone)]
pub struct Accumulator<T: Keyed> {
    items: Vec<T>,
    index: HashMap<T::Key, usize>,
}

impl<T: Keyed> Accumulator<T> {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Replace the entry with the same identity in place, or append.
    pub fn upsert(&mut self, item: T) -> Upsert {
        match self.index.get(item.key()) {
            Some(&pos) => {
                self.items[pos] = item;
                Upsert::Replaced(pos)
            }
            None => {
                let pos = self.items.len();
                self.index.insert(item.key().clone(), pos);
                self.items.push(item);
                Upsert::Inserted(pos)
            }
        }
    }

    /// Look up an entry by identity.
    pub fn get(&self, key: &T::Key) -> Option<&T> {
        self.index.get(key).map(|&pos| &self.items[pos])
    }

    /// Position of an identity, if present.
    pub fn position(&self, key: &T::Key) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// Check if an identity is present.
    pub fn contains(&self, key: &T::Key) -> bool {
        self.index.contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the accumulator is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Entries in accumulator order.
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Iterate entries in accumulator order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Consume the accumulator, returning entries in order.
    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T: Keyed> Default for Accumulator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Keyed> FromIterator<T> for Accumulator<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut acc = Self::new();
        for item in iter {
            acc.upsert(item);
        }
        acc
    }
}

impl<T: Keyed + PartialEq> PartialEq for Accumulator<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}
