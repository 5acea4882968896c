//! External id → uid assignment.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use crate::error::EdgeError;
use crate::utils::config::{FIRST_UID, UID_PREFIX};

/// Hands out numeric uids for external ids (IRIs, blank nodes, words). `_uid_:0x..` ids map to
/// the literal uid they carry.
///
/// Lookups share the read lock; allocation waits for the write lock and re-checks the map under it,
/// so two workers racing on the same new id get the same uid.
#[derive(Debug)]
pub struct UidAssigner {
    xids: RwLock<HashMap<String, u64>>,
    next: AtomicU64,
}

impl Default for UidAssigner {
    fn default() -> Self {
        Self {
            xids: RwLock::new(HashMap::new()),
            next: AtomicU64::new(FIRST_UID),
        }
    }
}

impl UidAssigner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uid already assigned to `xid`, if any.
    pub fn uid_of(&self, xid: &str) -> Option<u64> {
        if let Some(uid) = parse_literal_uid(xid) {
            return Some(uid);
        }
        self.xids
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(xid)
            .copied()
    }

    pub fn get_or_assign(&self, xid: &str) -> Result<u64, EdgeError> {
        if xid.starts_with(UID_PREFIX) {
            return parse_literal_uid(xid)
                .ok_or_else(|| EdgeError::Permanent(format!("invalid uid literal {xid:?}")));
        }
        if xid.is_empty() {
            return Err(EdgeError::Permanent("empty id".to_string()));
        }
        if let Some(uid) = self.uid_of(xid) {
            return Ok(uid);
        }
        let mut xids = self.xids.write().unwrap_or_else(PoisonError::into_inner);
        let uid = *xids
            .entry(xid.to_string())
            .or_insert_with(|| self.next.fetch_add(1, Ordering::Relaxed));
        Ok(uid)
    }

    /// Number of assigned (non-literal) ids.
    pub fn len(&self) -> usize {
        self.xids.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `_uid_:0x1f` → 31. Decimal is accepted too.
fn parse_literal_uid(xid: &str) -> Option<u64> {
    let body = xid.strip_prefix(UID_PREFIX)?;
    let uid = match body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok()?,
        None => body.parse().ok()?,
    };
    (uid != 0).then_some(uid)
}
