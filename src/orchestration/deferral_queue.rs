use parking_lot::Mutex;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::mapping::RelationMapper;
use crate::models::{DeferralKey, LookupDeferral};

/// A deferral whose referenced record now has a destination id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDeferral {
    pub deferral: LookupDeferral,
    pub target_destination_id: String,
}

/// Pending reference patches keyed by the unresolved `(type, source id)` they wait for
#[derive(Debug, Default)]
pub struct DeferralQueue {
    pending: Mutex<BTreeMap<DeferralKey, Vec<LookupDeferral>>>,
}

impl DeferralQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn normalized_key(deferral: &LookupDeferral) -> DeferralKey {
        DeferralKey::new(
            &deferral.referenced_type.to_ascii_lowercase(),
            deferral.referenced_source_id.trim(),
        )
    }

    /// Queue a deferral. Only deferrals bound to a created destination record can be patched.
    pub fn enqueue(&self, deferral: LookupDeferral) {
        if deferral.record_destination_id.is_none() {
            warn!(deferral = %deferral, "Dropping deferral without a destination record");
            return;
        }
        self.pending
            .lock()
            .entry(Self::normalized_key(&deferral))
            .or_default()
            .push(deferral);
    }

    pub fn enqueue_all(&self, deferrals: impl IntoIterator<Item = LookupDeferral>) {
        for deferral in deferrals {
            self.enqueue(deferral);
        }
    }

    /// Remove and return every deferral whose referenced record is now registered
    pub fn drain_resolvable(&self, mapper: &RelationMapper) -> Vec<ResolvedDeferral> {
        let mut resolved = Vec::new();
        self.pending.lock().retain(|key, deferrals| {
            match mapper.resolve(&key.object_type, &key.source_id) {
                Some(destination_id) => {
                    resolved.extend(deferrals.drain(..).map(|deferral| ResolvedDeferral {
                        deferral,
                        target_destination_id: destination_id.clone(),
                    }));
                    false
                }
                None => true,
            }
        });

        if !resolved.is_empty() {
            debug!(count = resolved.len(), "Deferrals became resolvable");
        }
        resolved
    }

    pub fn len(&self) -> usize {
        self.pending.lock().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take every remaining deferral, ordered by the key it waits for
    pub fn take_remaining(&self) -> Vec<LookupDeferral> {
        std::mem::take(&mut *self.pending.lock())
            .into_values()
            .flatten()
            .collect()
    }
}
