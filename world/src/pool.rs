use anchorfall_core::{EntityPool, PoolError, PoolHandle, SpawnedEntity};
use slotmap::SlotMap;

/// Instance that can be parked in an [`ObjectPool`] and reused later.
pub trait Poolable: Default {
    /// Returns the instance to its pristine inactive state.
    fn reset(&mut self);

    /// Whether the instance is currently taking part in the simulation.
    fn is_live(&self) -> bool;
}

/// Growable pool of reusable instances addressed through versioned handles.
///
/// Checked out instances live in a slot map, so a released handle stops
/// resolving instead of aliasing the next occupant. Released instances are
/// reset and parked until the next checkout.
#[derive(Debug)]
pub struct ObjectPool<E> {
    checked_out: SlotMap<PoolHandle, E>,
    parked: Vec<E>,
    created: usize,
    limit: Option<usize>,
}

impl<E: Poolable> ObjectPool<E> {
    /// Creates an empty pool that grows without bound.
    #[must_use]
    pub fn new() -> Self {
        Self {
            checked_out: SlotMap::with_key(),
            parked: Vec::new(),
            created: 0,
            limit: None,
        }
    }

    /// Creates an empty pool that refuses to hold more than `limit` instances.
    #[must_use]
    pub fn with_capacity_limit(limit: usize) -> Self {
        Self {
            checked_out: SlotMap::with_capacity_and_key(limit),
            parked: Vec::with_capacity(limit),
            created: 0,
            limit: Some(limit),
        }
    }

    /// Number of instances ever created by the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.created
    }

    /// Reports whether the pool has not created any instance yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.created == 0
    }

    /// Number of instances currently checked out.
    #[must_use]
    pub fn checked_out_count(&self) -> usize {
        self.checked_out.len()
    }

    /// Read access to the instance behind a handle that is still checked out.
    #[must_use]
    pub fn get(&self, handle: PoolHandle) -> Option<&E> {
        self.checked_out.get(handle)
    }

    /// Iterates the checked out instances in slot order.
    pub fn iter_checked_out(&self) -> impl Iterator<Item = (PoolHandle, &E)> {
        self.checked_out.iter()
    }

    /// Iterates the checked out instances mutably in slot order.
    pub fn iter_checked_out_mut(&mut self) -> impl Iterator<Item = (PoolHandle, &mut E)> {
        self.checked_out.iter_mut()
    }

    fn park(&mut self, mut entity: E) {
        entity.reset();
        self.parked.push(entity);
    }
}

impl<E: Poolable> Default for ObjectPool<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Poolable + SpawnedEntity> EntityPool for ObjectPool<E> {
    type Entity = E;

    fn acquire(&mut self) -> Result<PoolHandle, PoolError> {
        let entity = match self.parked.pop() {
            Some(entity) => entity,
            None => {
                if let Some(limit) = self.limit {
                    if self.created >= limit {
                        return Err(PoolError::Exhausted { limit });
                    }
                }
                self.created += 1;
                E::default()
            }
        };
        Ok(self.checked_out.insert(entity))
    }

    fn entity_mut(&mut self, handle: PoolHandle) -> Option<&mut Self::Entity> {
        self.checked_out.get_mut(handle)
    }

    fn is_live(&self, handle: PoolHandle) -> bool {
        self.checked_out
            .get(handle)
            .is_some_and(|entity| entity.is_live())
    }

    fn release(&mut self, handle: PoolHandle) -> bool {
        let Some(entity) = self.checked_out.remove(handle) else {
            return false;
        };
        self.park(entity);
        true
    }

    fn release_all(&mut self) {
        let released: Vec<E> = self.checked_out.drain().map(|(_, entity)| entity).collect();
        for entity in released {
            self.park(entity);
        }
    }
}
