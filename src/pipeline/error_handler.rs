use std::sync::{PoisonError, RwLock};

use crate::error::LoadError;

/// Single-slot sticky error shared by every stage. The first error set wins; later ones are dropped.
///
/// Workers check it between units of work and stop once it is set.
#[derive(Debug, Default)]
pub struct ErrorRegister {
    slot: RwLock<Option<LoadError>>,
}

impl ErrorRegister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `err` unless an error is already held. Returns true if this call set it.
    pub fn set(&self, err: LoadError) -> bool {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            log::debug!("error register already set, dropping: {}", err);
            return false;
        }
        *slot = Some(err);
        true
    }

    /// Copy of the held error, if any.
    pub fn get(&self) -> Option<LoadError> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_set(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
