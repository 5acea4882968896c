//! Posting-list store seam and the in-memory store used by the CLI and tests.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::error::StoreError;
use crate::{DirectedEdge, EdgeValue, MutationOp, PostingKey};

/// One posting list: all edges sharing an `(entity, attribute)` key.
/// Implementations serialize concurrent mutations to the same list themselves.
pub trait PostingList: Send + Sync {
    fn key(&self) -> &PostingKey;

    /// Apply `edge` with `op`, keeping secondary indexes in step. Returns true if the list changed.
    fn add_mutation_with_index(
        &self,
        edge: &DirectedEdge,
        op: MutationOp,
    ) -> Result<bool, StoreError>;
}

/// Key-addressed posting-list store. `get_or_create` may block inside the store.
pub trait PostingStore: Send + Sync {
    fn get_or_create(&self, key: &PostingKey) -> Lease;
}

/// Scoped handle on a posting list. The release callback runs exactly once: on [`Lease::release`],
/// or on drop if the holder never released it.
pub struct Lease {
    list: Arc<dyn PostingList>,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Lease {
    pub fn new<F>(list: Arc<dyn PostingList>, release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            list,
            release: Some(Box::new(release)),
        }
    }

    pub fn list(&self) -> &dyn PostingList {
        self.list.as_ref()
    }

    pub fn release(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.release_now();
    }
}

/// Lowercased alphanumeric runs of a literal value.
pub fn tokenize(value: &str) -> Vec<String> {
    value
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Secondary index: `(attribute, term)` → entities whose literal value contains the term.
#[derive(Debug, Default)]
pub struct TermIndex {
    terms: RwLock<HashMap<(String, String), BTreeSet<u64>>>,
}

impl TermIndex {
    fn add(&self, attribute: &str, value: &str, entity: u64) {
        let mut terms = self.terms.write().unwrap_or_else(PoisonError::into_inner);
        for token in tokenize(value) {
            terms
                .entry((attribute.to_string(), token))
                .or_default()
                .insert(entity);
        }
    }

    fn remove(&self, attribute: &str, value: &str, entity: u64) {
        let mut terms = self.terms.write().unwrap_or_else(PoisonError::into_inner);
        for token in tokenize(value) {
            let k = (attribute.to_string(), token);
            if let Some(set) = terms.get_mut(&k) {
                set.remove(&entity);
                if set.is_empty() {
                    terms.remove(&k);
                }
            }
        }
    }

    pub fn lookup(&self, attribute: &str, term: &str) -> Vec<u64> {
        self.terms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(attribute.to_string(), term.to_lowercase()))
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.terms.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory posting list.
#[derive(Debug)]
pub struct MemList {
    key: PostingKey,
    postings: Mutex<BTreeSet<EdgeValue>>,
    refs: AtomicUsize,
    index: Arc<TermIndex>,
}

impl MemList {
    fn new(key: PostingKey, index: Arc<TermIndex>) -> Self {
        Self {
            key,
            postings: Mutex::new(BTreeSet::new()),
            refs: AtomicUsize::new(0),
            index,
        }
    }

    pub fn postings(&self) -> Vec<EdgeValue> {
        self.postings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Leases currently held on this list.
    pub fn refs(&self) -> usize {
        self.refs.load(Ordering::Acquire)
    }
}

impl PostingList for MemList {
    fn key(&self) -> &PostingKey {
        &self.key
    }

    fn add_mutation_with_index(
        &self,
        edge: &DirectedEdge,
        op: MutationOp,
    ) -> Result<bool, StoreError> {
        if edge.entity != self.key.entity || edge.attribute != self.key.attribute {
            return Err(StoreError {
                key: self.key.to_string(),
                reason: format!("edge keyed {} applied to wrong list", edge.key()),
            });
        }
        let mut postings = self.postings.lock().unwrap_or_else(PoisonError::into_inner);
        let changed = match op {
            MutationOp::Set => postings.insert(edge.value.clone()),
            MutationOp::Del => postings.remove(&edge.value),
        };
        if changed && let EdgeValue::Literal { value, .. } = &edge.value {
            match op {
                MutationOp::Set => self.index.add(&edge.attribute, value, edge.entity),
                MutationOp::Del => self.index.remove(&edge.attribute, value, edge.entity),
            }
        }
        Ok(changed)
    }
}

/// Summary of a [`MemStore`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub lists: usize,
    pub postings: usize,
    pub index_terms: usize,
}

#[derive(Debug, Default)]
struct LeaseCounts {
    granted: AtomicU64,
    released: AtomicU64,
}

/// In-memory [`PostingStore`]. Lists are created on first lease and kept for the life of the store.
#[derive(Debug, Default)]
pub struct MemStore {
    lists: RwLock<HashMap<PostingKey, Arc<MemList>>>,
    index: Arc<TermIndex>,
    leases: Arc<LeaseCounts>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self, key: &PostingKey) -> Option<Arc<MemList>> {
        self.lists
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Values stored under `key`, sorted. Empty when the list does not exist.
    pub fn postings(&self, key: &PostingKey) -> Vec<EdgeValue> {
        self.list(key).map(|l| l.postings()).unwrap_or_default()
    }

    pub fn keys(&self) -> Vec<PostingKey> {
        let mut keys: Vec<_> = self
            .lists
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    pub fn index(&self) -> &TermIndex {
        &self.index
    }

    pub fn leases_granted(&self) -> u64 {
        self.leases.granted.load(Ordering::Acquire)
    }

    pub fn leases_released(&self) -> u64 {
        self.leases.released.load(Ordering::Acquire)
    }

    /// Leases granted and not yet released.
    pub fn outstanding_leases(&self) -> u64 {
        self.leases_granted()
            .saturating_sub(self.leases_released())
    }

    pub fn stats(&self) -> StoreStats {
        let lists = self.lists.read().unwrap_or_else(PoisonError::into_inner);
        StoreStats {
            lists: lists.len(),
            postings: lists.values().map(|l| l.postings().len()).sum(),
            index_terms: self.index.len(),
        }
    }
}

impl PostingStore for MemStore {
    fn get_or_create(&self, key: &PostingKey) -> Lease {
        let existing = self.list(key);
        let list = match existing {
            Some(list) => list,
            None => {
                let mut lists = self.lists.write().unwrap_or_else(PoisonError::into_inner);
                Arc::clone(
                    lists
                        .entry(key.clone())
                        .or_insert_with(|| Arc::new(MemList::new(key.clone(), Arc::clone(&self.index)))),
                )
            }
        };
        list.refs.fetch_add(1, Ordering::AcqRel);
        self.leases.granted.fetch_add(1, Ordering::AcqRel);

        let held = Arc::clone(&list);
        let leases = Arc::clone(&self.leases);
        Lease::new(list, move || {
            held.refs.fetch_sub(1, Ordering::AcqRel);
            leases.released.fetch_add(1, Ordering::AcqRel);
        })
    }
}
