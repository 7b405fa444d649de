//! Lazily populated, insertion-ordered collections
//!
//! A [`LazyOrderedMap`] asks its [`Enumerate`] source for every `(key, value)`
//! pair the first time an accessor needs the full listing, caches the result
//! in enumeration order and serves every later access from the cache until
//! [`LazyOrderedMap::refresh`] drops it again.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;

use ahash::AHashMap;

use crate::error::Error;
use crate::index::resolve_index;

/// The source of a [`LazyOrderedMap`]'s entries
pub trait Enumerate {
    type Key: Clone + Eq + Hash + fmt::Debug;
    type Value;
    type Error: From<Error>;

    /// Produce every entry, in order
    fn enumerate(&mut self) -> Result<Vec<(Self::Key, Self::Value)>, Self::Error>;

    /// Build a single entry without enumerating everything.
    ///
    /// Only consulted before the map is populated. The default has no such
    /// shortcut.
    fn construct(&mut self, _key: &Self::Key) -> Result<Option<Self::Value>, Self::Error> {
        Ok(None)
    }
}

/// Whether the enumerator has run since creation or the last refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Population {
    Unpopulated,
    Populated,
}

/// An order-preserving map whose entries are fetched on first use
pub struct LazyOrderedMap<S: Enumerate> {
    source: S,
    entries: Vec<(S::Key, S::Value)>,
    index: AHashMap<S::Key, usize>,
    state: Population,
}

impl<S: Enumerate> LazyOrderedMap<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            entries: Vec::new(),
            index: AHashMap::new(),
            state: Population::Unpopulated,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn population(&self) -> Population {
        self.state
    }

    pub fn is_populated(&self) -> bool {
        self.state == Population::Populated
    }

    /// Drop every cached entry. The source is not consulted until the next access.
    pub fn refresh(&mut self) {
        self.entries.clear();
        self.index.clear();
        self.state = Population::Unpopulated;
    }

    /// Look up an entry by key, constructing or populating on a miss
    pub fn get<Q>(&mut self, key: &Q) -> Result<&mut S::Value, S::Error>
    where
        S::Key: Borrow<Q>,
        Q: Hash + Eq + fmt::Debug + ToOwned<Owned = S::Key> + ?Sized,
    {
        if let Some(&i) = self.index.get(key) {
            return Ok(&mut self.entries[i].1);
        }

        if self.state == Population::Unpopulated {
            let owned = key.to_owned();
            if let Some(value) = self.source.construct(&owned)? {
                let i = self.push(owned, value);
                return Ok(&mut self.entries[i].1);
            }
            self.ensure_populated()?;
            if let Some(&i) = self.index.get(key) {
                return Ok(&mut self.entries[i].1);
            }
        }

        Err(Error::KeyNotFound(format!("{:?}", key)).into())
    }

    /// Look up the entry at a position in iteration order (negative counts from the end)
    pub fn get_index(&mut self, index: isize) -> Result<(&S::Key, &mut S::Value), S::Error> {
        self.ensure_populated()?;
        let len = self.entries.len();
        let i = resolve_index(index, len).ok_or(Error::EntryOutOfRange { index, len })?;
        let (key, value) = &mut self.entries[i];
        Ok((&*key, value))
    }

    pub fn contains_key<Q>(&mut self, key: &Q) -> Result<bool, S::Error>
    where
        S::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.index.contains_key(key) {
            return Ok(true);
        }
        self.ensure_populated()?;
        Ok(self.index.contains_key(key))
    }

    pub fn len(&mut self) -> Result<usize, S::Error> {
        self.ensure_populated()?;
        Ok(self.entries.len())
    }

    pub fn is_empty(&mut self) -> Result<bool, S::Error> {
        self.len().map(|n| n == 0)
    }

    pub fn keys(&mut self) -> Result<impl Iterator<Item = &S::Key> + '_, S::Error> {
        self.ensure_populated()?;
        Ok(self.entries.iter().map(|(k, _)| k))
    }

    pub fn values(&mut self) -> Result<impl Iterator<Item = &S::Value> + '_, S::Error> {
        self.ensure_populated()?;
        Ok(self.entries.iter().map(|(_, v)| v))
    }

    pub fn values_mut(&mut self) -> Result<impl Iterator<Item = &mut S::Value> + '_, S::Error> {
        self.ensure_populated()?;
        Ok(self.entries.iter_mut().map(|(_, v)| v))
    }

    pub fn iter(&mut self) -> Result<impl Iterator<Item = (&S::Key, &S::Value)> + '_, S::Error> {
        self.ensure_populated()?;
        Ok(self.entries.iter().map(|(k, v)| (k, v)))
    }

    pub fn iter_mut(
        &mut self,
    ) -> Result<impl Iterator<Item = (&S::Key, &mut S::Value)> + '_, S::Error> {
        self.ensure_populated()?;
        Ok(self.entries.iter_mut().map(|(k, v)| (&*k, v)))
    }

    /// Run the enumerator unless it already ran since the last refresh.
    ///
    /// Entries built by [`Enumerate::construct`] keep their value: the
    /// enumerated value for the same key is discarded. Duplicate keys in the
    /// enumeration keep their first occurrence. Constructed keys that the
    /// enumeration did not produce are kept after the enumerated ones.
    pub fn ensure_populated(&mut self) -> Result<(), S::Error> {
        if self.state == Population::Populated {
            return Ok(());
        }

        let enumerated = self.source.enumerate()?;

        let mut constructed: Vec<Option<(S::Key, S::Value)>> =
            self.entries.drain(..).map(Some).collect();
        let constructed_at = std::mem::take(&mut self.index);

        for (key, value) in enumerated {
            if self.index.contains_key(&key) {
                continue;
            }
            let value = match constructed_at.get(&key) {
                Some(&i) => match constructed[i].take() {
                    Some((_, existing)) => existing,
                    None => value,
                },
                None => value,
            };
            self.push(key, value);
        }

        for (key, value) in constructed.into_iter().flatten() {
            self.push(key, value);
        }

        self.state = Population::Populated;
        Ok(())
    }

    fn push(&mut self, key: S::Key, value: S::Value) -> usize {
        let i = self.entries.len();
        self.index.insert(key.clone(), i);
        self.entries.push((key, value));
        i
    }
}

impl<S: Enumerate> fmt::Debug for LazyOrderedMap<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyOrderedMap")
            .field("keys", &self.entries.iter().map(|(k, _)| k).collect::<Vec<_>>())
            .field("state", &self.state)
            .finish()
    }
}
