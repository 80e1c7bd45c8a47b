use std::cell::{Ref, RefCell, RefMut};
use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, trace};
use uqp_core::Numeric;

use crate::ids::QuantityId;
use crate::matrix::CorrelationMatrix;
use crate::operand::Operand;

/// A registry shared by one convention and its quantities.
///
/// Releases that arrive while the registry is borrowed are queued and applied
/// on the next access.
#[derive(Debug, Default)]
pub(crate) struct SharedRegistry {
    registry: RefCell<CorrelationRegistry>,
    pending: RefCell<Vec<QuantityId>>,
}

impl SharedRegistry {
    pub(crate) fn read(&self) -> Ref<'_, CorrelationRegistry> {
        if let Ok(mut registry) = self.registry.try_borrow_mut() {
            self.flush(&mut registry);
        }
        self.registry.borrow()
    }

    pub(crate) fn write(&self) -> RefMut<'_, CorrelationRegistry> {
        let mut registry = self.registry.borrow_mut();
        self.flush(&mut registry);
        registry
    }

    pub(crate) fn release(&self, id: QuantityId) {
        match self.registry.try_borrow_mut() {
            Ok(mut registry) => {
                self.flush(&mut registry);
                registry.release(id);
            }
            Err(_) => {
                debug!(%id, "registry busy, release queued");
                self.pending.borrow_mut().push(id);
            }
        }
    }

    fn flush(&self, registry: &mut CorrelationRegistry) {
        let queued = std::mem::take(&mut *self.pending.borrow_mut());
        for id in queued {
            registry.release(id);
        }
    }
}

/// Symmetric map of correlation coefficients between live quantities.
///
/// Released identities lose every coefficient recorded against them, and
/// lookups involving unknown or released identities fall back to the
/// caller's default.
#[derive(Debug, Default)]
pub struct CorrelationRegistry {
    next_id: u64,
    live: BTreeSet<QuantityId>,
    links: BTreeMap<QuantityId, BTreeMap<QuantityId, f64>>,
}

impl CorrelationRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh identity.
    pub fn register(&mut self) -> QuantityId {
        let id = QuantityId::from_raw(self.next_id);
        self.next_id += 1;
        self.live.insert(id);
        id
    }

    /// Returns `true` while `id` has not been released.
    pub fn is_live(&self, id: QuantityId) -> bool {
        self.live.contains(&id)
    }

    /// Number of live identities.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Number of unordered pairs with a recorded coefficient.
    pub fn link_count(&self) -> usize {
        self.links.values().map(BTreeMap::len).sum::<usize>() / 2
    }

    /// Records `r` for the pair, clamped to `[-1, 1]`.
    ///
    /// Self-pairs, NaN coefficients and released identities are ignored;
    /// the return value tells whether anything was stored.
    pub fn set(&mut self, a: QuantityId, b: QuantityId, r: f64) -> bool {
        if a == b || r.is_nan() || !self.is_live(a) || !self.is_live(b) {
            return false;
        }
        let r = r.clamp(-1.0, 1.0);
        self.links.entry(a).or_default().insert(b, r);
        self.links.entry(b).or_default().insert(a, r);
        trace!(%a, %b, r, "recorded correlation");
        true
    }

    /// Coefficient for the pair: 1 for a self-pair, `default` when unrecorded.
    pub fn get(&self, a: QuantityId, b: QuantityId, default: f64) -> f64 {
        if a == b {
            return 1.0;
        }
        self.links
            .get(&a)
            .and_then(|peers| peers.get(&b))
            .copied()
            .unwrap_or(default)
    }

    /// Records a coefficient between two operands; exact operands are ignored.
    pub fn correlated<N: Numeric>(&mut self, x: &Operand<N>, y: &Operand<N>, r: f64) -> bool {
        match (x.id(), y.id()) {
            (Some(a), Some(b)) => self.set(a, b, r),
            _ => false,
        }
    }

    /// Coefficient between two operands, `default` when either is exact.
    pub fn correlation<N: Numeric>(&self, x: &Operand<N>, y: &Operand<N>, default: f64) -> f64 {
        match (x.id(), y.id()) {
            (Some(a), Some(b)) => self.get(a, b, default),
            _ => default,
        }
    }

    /// Identities with a recorded coefficient against `id`.
    pub fn dependencies(&self, id: QuantityId) -> BTreeSet<QuantityId> {
        self.links
            .get(&id)
            .map(|peers| peers.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Pairwise coefficients of `quantities`; unrecorded pairs read 0.
    pub fn matrix<N: Numeric>(&self, quantities: &[Operand<N>]) -> CorrelationMatrix {
        let mut matrix = CorrelationMatrix::identity(quantities.len());
        for (row, x) in quantities.iter().enumerate() {
            for (col, y) in quantities.iter().enumerate().skip(row + 1) {
                matrix.put(row, col, self.correlation(x, y, 0.0));
            }
        }
        matrix
    }

    /// Forgets `id` and every coefficient that mentions it.
    pub fn release(&mut self, id: QuantityId) {
        self.live.remove(&id);
        let Some(peers) = self.links.remove(&id) else {
            return;
        };
        for peer in peers.keys() {
            let now_empty = match self.links.get_mut(peer) {
                Some(entries) => {
                    entries.remove(&id);
                    entries.is_empty()
                }
                None => false,
            };
            if now_empty {
                self.links.remove(peer);
            }
        }
        debug!(%id, dropped_links = peers.len(), "released quantity");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coefficients_are_symmetric_and_clamped() {
        let mut registry = CorrelationRegistry::new();
        let a = registry.register();
        let b = registry.register();
        assert!(registry.set(a, b, 1.0000001));
        assert_eq!(registry.get(b, a, 0.0), 1.0);
        assert_eq!(registry.get(a, a, 0.0), 1.0);
        assert_eq!(registry.link_count(), 1);
    }

    #[test]
    fn self_pairs_and_released_ids_are_ignored() {
        let mut registry = CorrelationRegistry::new();
        let a = registry.register();
        let b = registry.register();
        assert!(!registry.set(a, a, 0.5));
        registry.release(b);
        assert!(!registry.set(a, b, 0.5));
        assert_eq!(registry.get(a, b, 0.25), 0.25);
    }

    #[test]
    fn release_erases_every_mention() {
        let mut registry = CorrelationRegistry::new();
        let a = registry.register();
        let b = registry.register();
        let c = registry.register();
        registry.set(a, b, 0.3);
        registry.set(a, c, -0.4);
        registry.release(a);
        assert!(registry.dependencies(b).is_empty());
        assert!(registry.dependencies(c).is_empty());
        assert_eq!(registry.link_count(), 0);
        assert_eq!(registry.live_count(), 2);
    }
}
