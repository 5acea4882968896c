//! Triple → directed edge conversion.

use std::sync::Arc;

use crate::engine::uid::UidAssigner;
use crate::error::EdgeError;
use crate::{DirectedEdge, EdgeValue, NQuad};

/// Converts a parsed triple into the edge the store applies.
///
/// Errors are classified: [`EdgeError::Transient`] is retried by the caller until it clears,
/// [`EdgeError::Permanent`] stops the load.
pub trait EdgeBuilder: Send + Sync {
    fn to_edge(&self, nq: &NQuad) -> Result<DirectedEdge, EdgeError>;
}

/// Default [`EdgeBuilder`]: subject and object ids become uids through a shared [`UidAssigner`].
#[derive(Clone, Debug, Default)]
pub struct UidEdgeBuilder {
    uids: Arc<UidAssigner>,
}

impl UidEdgeBuilder {
    pub fn new(uids: Arc<UidAssigner>) -> Self {
        Self { uids }
    }

    pub fn uids(&self) -> &Arc<UidAssigner> {
        &self.uids
    }
}

impl EdgeBuilder for UidEdgeBuilder {
    fn to_edge(&self, nq: &NQuad) -> Result<DirectedEdge, EdgeError> {
        if nq.predicate.is_empty() {
            return Err(EdgeError::Permanent("empty predicate".to_string()));
        }
        let entity = self.uids.get_or_assign(&nq.subject)?;
        let value = match (&nq.object_id, &nq.object_value) {
            (Some(id), _) => EdgeValue::Uid(self.uids.get_or_assign(id)?),
            (None, Some(v)) => EdgeValue::Literal {
                value: v.clone(),
                lang: nq.lang.clone(),
                datatype: nq.datatype.clone(),
            },
            (None, None) => {
                return Err(EdgeError::Permanent(format!(
                    "no object for {} {}",
                    nq.subject, nq.predicate
                )));
            }
        };
        Ok(DirectedEdge {
            entity,
            attribute: nq.predicate.clone(),
            value,
            label: nq.label.clone(),
        })
    }
}
