//! Component pools: the type-erased pool interface and the typed pool over
//! the indexed flat map.
//!
//! The registry owns every pool behind `Box<dyn ErasedPool>` so it can
//! erase, count and visit components without knowing their value types;
//! typed access recovers the concrete [`ComponentPool`] through `Any`. A
//! pool created for key `(T, variant)` always stores `T`, which is what
//! makes that recovery reliable.

use std::any::Any;

use crate::any_ref::{AnyRef, ConstAnyRef};
use crate::component::{Component, ComponentTypeId};
use crate::entity::Entity;
use crate::flat_map::IndexedFlatMap;

// ---------------------------------------------------------------------------
// ErasedPool
// ---------------------------------------------------------------------------

/// Operations usable on a pool without knowing its value type.
///
/// Dropping a pool drops every stored value; values that manage resources
/// release them through their own `Drop` impls, exactly once.
pub trait ErasedPool: Any {
    /// Remove the entity's value if present. Returns whether anything was
    /// removed. The removed value is dropped.
    fn erase(&mut self, entity: Entity) -> bool;

    /// Number of live `(entity, value)` entries.
    fn len(&self) -> usize;

    /// Whether the pool holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the pool holds a value for `entity`.
    fn contains(&self, entity: Entity) -> bool;

    /// Type-erased mutable reference to the entity's value.
    ///
    /// Pools whose rows are not Rust values (the binary pools) return
    /// `None`; their contents are reached through the typed accessors.
    fn entity_ref(&mut self, entity: Entity) -> Option<AnyRef<'_>>;

    /// Type-erased shared reference to the entity's value.
    fn entity_ref_const(&self, entity: Entity) -> Option<ConstAnyRef<'_>>;

    /// Upcast for typed recovery.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for typed recovery.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Consuming upcast, used when a pool is taken out of the directory for
    /// reorganization.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

// ---------------------------------------------------------------------------
// ComponentPool
// ---------------------------------------------------------------------------

/// Typed pool: all values of one component type (and variant), in insertion
/// order, with O(1) lookup by entity.
pub struct ComponentPool<T: Component> {
    entries: IndexedFlatMap<Entity, T>,
}

impl<T: Component> ComponentPool<T> {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self {
            entries: IndexedFlatMap::new(),
        }
    }

    /// Id of the component type this pool stores.
    pub fn component_type_id(&self) -> ComponentTypeId {
        T::component_type_id()
    }

    /// Insert or replace, returning the stored value and the replaced one.
    /// A replaced value is returned rather than dropped so the caller can
    /// decide its fate; letting it fall out of scope drops it.
    pub fn insert_ref(&mut self, entity: Entity, value: T) -> (&mut T, Option<T>) {
        self.entries.insert_ref(entity, value)
    }

    /// Insert or replace. Returns the previous value, if any.
    pub fn insert(&mut self, entity: Entity, value: T) -> Option<T> {
        self.entries.insert(entity, value)
    }

    /// Shared reference to the entity's value.
    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.entries.get(&entity)
    }

    /// Mutable reference to the entity's value.
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.entries.get_mut(&entity)
    }

    /// Remove the entity's value.
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        self.entries.remove(&entity)
    }

    /// Whether the pool holds a value for `entity`.
    pub fn contains(&self, entity: Entity) -> bool {
        self.entries.contains_key(&entity)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the pool holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pre-allocate room for `additional` more entries.
    pub fn reserve(&mut self, additional: usize) {
        self.entries.reserve(additional);
    }

    /// Entity at `pos` in iteration order. Views drive their iteration off
    /// this.
    #[inline]
    pub fn entity_at(&self, pos: usize) -> Option<Entity> {
        self.entries.key_at(pos)
    }

    /// The entities in iteration order.
    pub fn entities(&self) -> &[Entity] {
        self.entries.keys()
    }

    /// Iterate `(entity, value)` pairs in iteration order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (Entity, &T)> {
        self.entries.iter().map(|(e, v)| (*e, v))
    }

    /// Iterate with mutable value access.
    pub fn iter_mut(&mut self) -> impl ExactSizeIterator<Item = (Entity, &mut T)> {
        self.entries.iter_mut().map(|(e, v)| (*e, v))
    }

    /// Rebuild the pool so that `matched` (sorted ascending by entity)
    /// occupies positions `start..start + matched.len()`.
    ///
    /// The prefix before `start` keeps its order, the remaining entries keep
    /// their relative order after the matched block. Values are moved, never
    /// cloned or dropped.
    pub(crate) fn regroup(self, start: usize, matched: &[Entity]) -> Self {
        let (keys, values, index) = self.entries.into_parts();
        let mut taken: Vec<Option<T>> = values.into_iter().map(Some).collect();
        let mut rebuilt = IndexedFlatMap::new();
        rebuilt.reserve(keys.len());

        for i in 0..start.min(keys.len()) {
            if let Some(v) = taken[i].take() {
                rebuilt.insert(keys[i], v);
            }
        }
        for &entity in matched {
            if let Some(pos) = index.get(&entity).copied() {
                if let Some(v) = taken[pos].take() {
                    rebuilt.insert(entity, v);
                }
            }
        }
        for i in start..keys.len() {
            if matched.binary_search(&keys[i]).is_err() {
                if let Some(v) = taken[i].take() {
                    rebuilt.insert(keys[i], v);
                }
            }
        }

        Self { entries: rebuilt }
    }
}

impl<T: Component> Default for ComponentPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Component> ErasedPool for ComponentPool<T> {
    fn erase(&mut self, entity: Entity) -> bool {
        self.remove(entity).is_some()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn contains(&self, entity: Entity) -> bool {
        self.entries.contains_key(&entity)
    }

    fn entity_ref(&mut self, entity: Entity) -> Option<AnyRef<'_>> {
        self.get_mut(entity).map(AnyRef::new)
    }

    fn entity_ref_const(&self, entity: Entity) -> Option<ConstAnyRef<'_>> {
        self.get(entity).map(ConstAnyRef::new)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Debug, PartialEq)]
    struct Score(i64);
    impl Component for Score {}

    fn entities(n: u64) -> Vec<Entity> {
        (0..n).map(|_| Entity::create()).collect()
    }

    #[test]
    fn insert_get_remove_round_trip() {
        let [a, b] = [Entity::create(), Entity::create()];
        let mut pool = ComponentPool::new();
        assert_eq!(pool.insert(a, Score(1)), None);
        assert_eq!(pool.insert(b, Score(2)), None);
        assert_eq!(pool.insert(a, Score(3)), Some(Score(1)));
        assert_eq!(pool.get(a), Some(&Score(3)));
        assert_eq!(pool.remove(b), Some(Score(2)));
        assert_eq!(pool.get(b), None);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn erased_interface_round_trips_through_any_ref() {
        let e = Entity::create();
        let mut pool = ComponentPool::new();
        pool.insert(e, Score(7));

        let erased: &mut dyn ErasedPool = &mut pool;
        assert_eq!(erased.len(), 1);
        assert!(erased.contains(e));
        {
            let mut any = erased.entity_ref(e).unwrap();
            any.downcast_mut::<Score>().unwrap().0 = 8;
        }
        let shared = erased.entity_ref_const(e).unwrap();
        assert_eq!(shared.downcast_ref::<Score>(), Some(&Score(8)));
        assert!(erased.erase(e));
        assert!(!erased.erase(e));
    }

    #[test]
    fn regroup_moves_matched_entities_into_a_sorted_block() {
        let es = entities(6);
        let mut pool = ComponentPool::new();
        for (i, &e) in es.iter().enumerate() {
            pool.insert(e, Score(i as i64));
        }
        // Match entities at positions 4, 2, 5; first match is position 2.
        let mut matched = vec![es[4], es[2], es[5]];
        matched.sort_unstable();
        let pool = pool.regroup(2, &matched);

        let order: Vec<Entity> = pool.iter().map(|(e, _)| e).collect();
        assert_eq!(order, vec![es[0], es[1], es[2], es[4], es[5], es[3]]);
        // Values traveled with their entities.
        assert_eq!(pool.get(es[4]), Some(&Score(4)));
        assert_eq!(pool.get(es[3]), Some(&Score(3)));
    }

    #[test]
    fn regroup_never_drops_values() {
        #[derive(Clone)]
        struct Tracked(#[allow(dead_code)] u8, Rc<Cell<usize>>);
        impl Component for Tracked {}
        impl Drop for Tracked {
            fn drop(&mut self) {
                self.1.set(self.1.get() + 1);
            }
        }

        let drops = Rc::new(Cell::new(0));
        let es = entities(4);
        let mut pool = ComponentPool::new();
        for &e in &es {
            pool.insert(e, Tracked(0, drops.clone()));
        }
        let matched = {
            let mut m = vec![es[1], es[3]];
            m.sort_unstable();
            m
        };
        let pool = pool.regroup(1, &matched);
        assert_eq!(drops.get(), 0, "regroup must move, not drop");
        assert_eq!(pool.len(), 4);
        drop(pool);
        assert_eq!(drops.get(), 4);
    }
}
