//! The registry: a directory of component pools keyed by
//! `(type id, variant id)`, with the entity/component CRUD surface on top.
//!
//! The registry uniquely owns every pool, and each pool uniquely owns its
//! values; dropping the registry releases everything. Pools are created
//! lazily on the first write to a `(type, variant)` pair; reads against an
//! absent pool yield empty results rather than errors.
//!
//! Structural mutation (insert, remove, grouping) invalidates pool
//! iteration; in this API that rule is enforced by the borrow checker
//! rather than by documentation, since every range and view borrows the
//! registry.

use crate::any_ref::{AnyRef, ConstAnyRef};
use crate::binary::{BinaryDeleter, BinaryPool};
use crate::component::{Component, ComponentTypeId, EntityName, PoolKey};
use crate::entity::Entity;
use crate::open_map::OpenHashMap;
use crate::pool::{ComponentPool, ErasedPool};
use crate::view::{ComponentSet, View};
use crate::EcsError;

/// The ECS database: entities mapped to heterogeneous components through
/// per-type pools.
pub struct Registry {
    pools: OpenHashMap<PoolKey, Box<dyn ErasedPool>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            pools: OpenHashMap::new(),
        }
    }

    /// Number of pools currently in the directory.
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    // -- entity lifecycle ---------------------------------------------------

    /// Draw a fresh entity from the process-wide generator.
    pub fn create_entity(&self) -> Entity {
        Entity::create()
    }

    /// Create a fresh entity carrying an [`EntityName`].
    pub fn create_named(&mut self, name: &str) -> Entity {
        let entity = Entity::create();
        self.set(entity, EntityName::from(name));
        entity
    }

    /// Erase `entity` from every pool. Values are dropped; the entity id
    /// itself is never recycled.
    pub fn destroy_entity(&mut self, entity: Entity) {
        for (_, pool) in self.pools.iter_mut() {
            pool.erase(entity);
        }
    }

    /// Whether any pool holds a value for `entity`.
    pub fn is_known(&self, entity: Entity) -> bool {
        self.pools.iter().any(|(_, pool)| pool.contains(entity))
    }

    // -- typed pool access --------------------------------------------------

    pub(crate) fn pool<T: Component>(&self, variant: ComponentTypeId) -> Option<&ComponentPool<T>> {
        self.pools
            .get(&PoolKey::of::<T>(variant))?
            .as_any()
            .downcast_ref()
    }

    fn pool_mut<T: Component>(&mut self, variant: ComponentTypeId) -> Option<&mut ComponentPool<T>> {
        self.pools
            .get_mut(&PoolKey::of::<T>(variant))?
            .as_any_mut()
            .downcast_mut()
    }

    fn pool_or_create<T: Component>(&mut self, variant: ComponentTypeId) -> &mut ComponentPool<T> {
        let key = PoolKey::of::<T>(variant);
        if !self.pools.contains_key(&key) {
            self.pools.insert(key, Box::new(ComponentPool::<T>::new()));
        }
        self.pools
            .get_mut(&key)
            .and_then(|pool| pool.as_any_mut().downcast_mut())
            .expect("directory entry holds the pool type of its key")
    }

    // -- component CRUD -----------------------------------------------------

    /// Set `entity`'s component of type `T` (default variant).
    ///
    /// Returns `true` if the component was created, `false` if an existing
    /// value was replaced (and dropped).
    pub fn set<T: Component>(&mut self, entity: Entity, value: T) -> bool {
        self.set_in(entity, ComponentTypeId::default(), value)
    }

    /// [`set`](Self::set) against an explicit pool variant.
    pub fn set_in<T: Component>(
        &mut self,
        entity: Entity,
        variant: ComponentTypeId,
        value: T,
    ) -> bool {
        self.pool_or_create::<T>(variant).insert(entity, value).is_none()
    }

    /// Store a component and hand back a reference to the stored value. An
    /// existing value is dropped and replaced in place.
    pub fn emplace<T: Component>(&mut self, entity: Entity, value: T) -> &mut T {
        self.emplace_in(entity, ComponentTypeId::default(), value)
    }

    /// [`emplace`](Self::emplace) against an explicit pool variant.
    pub fn emplace_in<T: Component>(
        &mut self,
        entity: Entity,
        variant: ComponentTypeId,
        value: T,
    ) -> &mut T {
        self.pool_or_create::<T>(variant).insert_ref(entity, value).0
    }

    /// Remove `entity`'s component of type `T` (default variant). No-op if
    /// absent.
    pub fn remove<T: Component>(&mut self, entity: Entity) {
        self.remove_in::<T>(entity, ComponentTypeId::default());
    }

    /// [`remove`](Self::remove) against an explicit pool variant.
    pub fn remove_in<T: Component>(&mut self, entity: Entity, variant: ComponentTypeId) {
        if let Some(pool) = self.pool_mut::<T>(variant) {
            pool.remove(entity);
        }
    }

    /// Shared reference to `entity`'s component of type `T`.
    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.get_in(entity, ComponentTypeId::default())
    }

    /// [`get`](Self::get) against an explicit pool variant.
    pub fn get_in<T: Component>(&self, entity: Entity, variant: ComponentTypeId) -> Option<&T> {
        self.pool::<T>(variant)?.get(entity)
    }

    /// Mutable reference to `entity`'s component of type `T`.
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.get_mut_in(entity, ComponentTypeId::default())
    }

    /// [`get_mut`](Self::get_mut) against an explicit pool variant.
    pub fn get_mut_in<T: Component>(
        &mut self,
        entity: Entity,
        variant: ComponentTypeId,
    ) -> Option<&mut T> {
        self.pool_mut::<T>(variant)?.get_mut(entity)
    }

    /// Whether `entity` has a component of type `T` (default variant).
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.has_in::<T>(entity, ComponentTypeId::default())
    }

    /// [`has`](Self::has) against an explicit pool variant.
    pub fn has_in<T: Component>(&self, entity: Entity, variant: ComponentTypeId) -> bool {
        self.pool::<T>(variant)
            .map(|pool| pool.contains(entity))
            .unwrap_or(false)
    }

    /// Whether `entity` has every component in the tuple `S`, checked left
    /// to right with a short-circuit on the first miss. `variants` pairs up
    /// with the type list; missing trailing entries default to variant 0.
    pub fn has_all<S: ComponentSet>(&self, entity: Entity, variants: &[ComponentTypeId]) -> bool {
        S::contains_all(self, entity, variants)
    }

    // -- ranges -------------------------------------------------------------

    /// Iterate every `(entity, value)` of type `T` (default variant) in pool
    /// order. Empty if the pool does not exist.
    pub fn all_of<T: Component>(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.all_of_in(ComponentTypeId::default())
    }

    /// [`all_of`](Self::all_of) against an explicit pool variant.
    pub fn all_of_in<T: Component>(
        &self,
        variant: ComponentTypeId,
    ) -> impl Iterator<Item = (Entity, &T)> {
        self.pool::<T>(variant).into_iter().flat_map(|p| p.iter())
    }

    /// Mutable variant of [`all_of`](Self::all_of).
    pub fn all_of_mut<T: Component>(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.all_of_mut_in(ComponentTypeId::default())
    }

    /// Mutable variant of [`all_of_in`](Self::all_of_in).
    pub fn all_of_mut_in<T: Component>(
        &mut self,
        variant: ComponentTypeId,
    ) -> impl Iterator<Item = (Entity, &mut T)> {
        self.pool_mut::<T>(variant)
            .into_iter()
            .flat_map(|p| p.iter_mut())
    }

    /// Drop the whole pool of `T` (default variant), including every stored
    /// value.
    pub fn remove_all_of<T: Component>(&mut self) {
        self.remove_all_of_in::<T>(ComponentTypeId::default());
    }

    /// [`remove_all_of`](Self::remove_all_of) against an explicit variant.
    pub fn remove_all_of_in<T: Component>(&mut self, variant: ComponentTypeId) {
        self.pools.remove(&PoolKey::of::<T>(variant));
    }

    // -- type-erased visitation ----------------------------------------------

    /// Invoke `visit` once per pool holding a value for `entity`. The pool
    /// key carries the variant and type ids for visitors that need them.
    pub fn for_each_component(
        &self,
        entity: Entity,
        mut visit: impl FnMut(ConstAnyRef<'_>, PoolKey),
    ) {
        for (key, pool) in self.pools.iter() {
            if let Some(any) = pool.entity_ref_const(entity) {
                visit(any, *key);
            }
        }
    }

    /// Mutable variant of [`for_each_component`](Self::for_each_component).
    pub fn for_each_component_mut(
        &mut self,
        entity: Entity,
        mut visit: impl FnMut(AnyRef<'_>, PoolKey),
    ) {
        for (key, pool) in self.pools.iter_mut() {
            if let Some(any) = pool.entity_ref(entity) {
                visit(any, *key);
            }
        }
    }

    // -- names --------------------------------------------------------------

    /// The entity's [`EntityName`], if set.
    pub fn entity_name(&self, entity: Entity) -> Option<&str> {
        self.get::<EntityName>(entity).map(EntityName::as_str)
    }

    /// Set or replace the entity's [`EntityName`].
    pub fn set_entity_name(&mut self, entity: Entity, name: &str) {
        self.set(entity, EntityName::from(name));
    }

    /// First entity (in name-pool order) whose [`EntityName`] equals `name`.
    pub fn find_by_name(&self, name: &str) -> Option<Entity> {
        self.all_of::<EntityName>()
            .find(|(_, n)| n.as_str() == name)
            .map(|(entity, _)| entity)
    }

    // -- views --------------------------------------------------------------

    /// Join view over the default-variant pools of the tuple `S`, yielding
    /// `(entity, (&T1, ..., &Tn))` for entities present in all of them.
    pub fn view<S: ComponentSet>(&self) -> View<'_, S> {
        View::new(self, &[])
    }

    /// [`view`](Self::view) with explicit pool variants (missing trailing
    /// entries default to 0).
    pub fn view_in<S: ComponentSet>(&self, variants: &[ComponentTypeId]) -> View<'_, S> {
        View::new(self, variants)
    }

    // -- grouping -----------------------------------------------------------

    /// Physically reorganize the pool of `T` so entities satisfying `pred`
    /// form a contiguous block, sorted ascending by entity id, starting at
    /// the first matching position. Entries before that position keep their
    /// order, as do the non-matching entries after it. Values are moved,
    /// never dropped.
    ///
    /// Returns `false` (and leaves the pool untouched) when the pool does
    /// not exist or nothing matches.
    pub fn group_entities<T: Component>(
        &mut self,
        variant: ComponentTypeId,
        mut pred: impl FnMut(Entity, &T) -> bool,
    ) -> bool {
        let key = PoolKey::of::<T>(variant);
        let typed = self
            .pools
            .get(&key)
            .map(|pool| pool.as_any().is::<ComponentPool<T>>())
            .unwrap_or(false);
        if !typed {
            return false;
        }
        let Some(boxed) = self.pools.remove(&key) else {
            return false;
        };
        let pool = match boxed.into_any().downcast::<ComponentPool<T>>() {
            Ok(pool) => *pool,
            Err(_) => return false,
        };

        let Some(start) = pool.iter().position(|(e, v)| pred(e, v)) else {
            self.pools.insert(key, Box::new(pool));
            return false;
        };
        let mut matched: Vec<Entity> = pool
            .iter()
            .skip(start)
            .filter(|&(e, v)| pred(e, v))
            .map(|(e, _)| e)
            .collect();
        matched.sort_unstable();

        tracing::debug!(
            pool = ?key,
            prefix = start,
            grouped = matched.len(),
            "reorganized pool into grouped block"
        );
        self.pools.insert(key, Box::new(pool.regroup(start, &matched)));
        true
    }

    /// Group every pool of the tuple `S` against the others: each pool is
    /// reorganized with the predicate "has all the other components",
    /// rotating the variant list in lockstep with the type list. After a
    /// successful group, the shared entities occupy the same sorted block
    /// in every involved pool. Returns `false` as soon as one rotation has
    /// nothing to group.
    pub fn group<S: ComponentSet>(&mut self, variants: &[ComponentTypeId]) -> bool {
        S::group(self, variants)
    }

    // -- binary components ---------------------------------------------------

    fn binary_key(component: ComponentTypeId) -> PoolKey {
        PoolKey::new(BinaryPool::TYPE_ID, component)
    }

    fn binary_pool_or_create(&mut self, component: ComponentTypeId) -> &mut BinaryPool {
        let key = Self::binary_key(component);
        if !self.pools.contains_key(&key) {
            self.pools.insert(key, Box::new(BinaryPool::new()));
        }
        self.pools
            .get_mut(&key)
            .and_then(|pool| pool.as_any_mut().downcast_mut())
            .expect("directory entry holds the pool type of its key")
    }

    /// Ensure the binary pool for `component` exists. The deleter is
    /// installed only when the pool is first created; re-registering an
    /// existing component leaves the original deleter in place.
    pub fn register_binary(&mut self, component: ComponentTypeId, deleter: Option<BinaryDeleter>) {
        let key = Self::binary_key(component);
        if !self.pools.contains_key(&key) {
            let mut pool = BinaryPool::new();
            pool.set_deleter(deleter);
            self.pools.insert(key, Box::new(pool));
        }
    }

    /// The binary pool for `component`, if it exists.
    pub fn binary_pool(&self, component: ComponentTypeId) -> Option<&BinaryPool> {
        self.pools
            .get(&Self::binary_key(component))?
            .as_any()
            .downcast_ref()
    }

    /// Mutable access to the binary pool for `component`.
    pub fn binary_pool_mut(&mut self, component: ComponentTypeId) -> Option<&mut BinaryPool> {
        self.pools
            .get_mut(&Self::binary_key(component))?
            .as_any_mut()
            .downcast_mut()
    }

    /// Store an opaque payload for `(entity, component)`, creating the pool
    /// on first use. See [`BinaryPool::store`] for the size rules.
    pub fn store(
        &mut self,
        entity: Entity,
        component: ComponentTypeId,
        payload: &[u8],
    ) -> Result<bool, EcsError> {
        let result = self.binary_pool_or_create(component).store(entity, payload);
        if let Err(err) = &result {
            tracing::warn!(component = ?component, %err, "rejected binary payload");
        }
        result
    }

    /// The payload stored for `(entity, component)`.
    pub fn binary(&self, entity: Entity, component: ComponentTypeId) -> Option<&[u8]> {
        self.binary_pool(component)?.get(entity)
    }

    /// Mutable payload access.
    pub fn binary_mut(&mut self, entity: Entity, component: ComponentTypeId) -> Option<&mut [u8]> {
        self.binary_pool_mut(component)?.get_mut(entity)
    }

    /// Remove `(entity, component)`'s payload, invoking the pool deleter.
    pub fn remove_binary(&mut self, entity: Entity, component: ComponentTypeId) {
        if let Some(pool) = self.binary_pool_mut(component) {
            pool.remove(entity);
        }
    }

    /// Drop the binary pool of `component` entirely (deleter runs per row).
    pub fn remove_all_binary(&mut self, component: ComponentTypeId) {
        self.pools.remove(&Self::binary_key(component));
    }

    /// [`group_entities`](Self::group_entities) for a binary pool.
    pub fn group_binary_entities(
        &mut self,
        component: ComponentTypeId,
        mut pred: impl FnMut(Entity, &[u8]) -> bool,
    ) -> bool {
        let key = Self::binary_key(component);
        let binary = self
            .pools
            .get(&key)
            .map(|pool| pool.as_any().is::<BinaryPool>())
            .unwrap_or(false);
        if !binary {
            return false;
        }
        let Some(boxed) = self.pools.remove(&key) else {
            return false;
        };
        let pool = match boxed.into_any().downcast::<BinaryPool>() {
            Ok(pool) => *pool,
            Err(_) => return false,
        };

        let Some(start) = pool.iter().position(|(e, row)| pred(e, row)) else {
            self.pools.insert(key, Box::new(pool));
            return false;
        };
        let mut matched: Vec<Entity> = pool
            .iter()
            .skip(start)
            .filter(|&(e, row)| pred(e, row))
            .map(|(e, _)| e)
            .collect();
        matched.sort_unstable();

        self.pools.insert(key, Box::new(pool.regroup(start, &matched)));
        true
    }

    /// Group the binary pools of `components` against each other, the same
    /// rotation scheme as the typed [`group`](Self::group).
    pub fn group_binary(&mut self, components: &[ComponentTypeId]) -> bool {
        let mut common: Option<Vec<Entity>> = None;
        for &component in components {
            let Some(pool) = self.binary_pool(component) else {
                return false;
            };
            common = Some(match common {
                None => {
                    let mut entities: Vec<Entity> = pool.iter().map(|(e, _)| e).collect();
                    entities.sort_unstable();
                    entities
                }
                Some(prev) => prev.into_iter().filter(|&e| pool.contains(e)).collect(),
            });
        }
        let Some(common) = common else {
            return false;
        };
        for &component in components {
            if !self.group_binary_entities(component, |e, _| common.binary_search(&e).is_ok()) {
                return false;
            }
        }
        true
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("pool_count", &self.pools.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Pos {
        x: i32,
        y: i32,
    }
    impl Component for Pos {}

    #[derive(Debug, PartialEq)]
    struct Hp(u32);
    impl Component for Hp {}

    #[test]
    fn set_reports_created_vs_replaced() {
        let mut reg = Registry::new();
        let e = reg.create_entity();
        assert!(reg.set(e, Hp(10)));
        assert!(!reg.set(e, Hp(20)));
        assert_eq!(reg.get::<Hp>(e), Some(&Hp(20)));
    }

    #[test]
    fn emplace_returns_the_stored_value() {
        let mut reg = Registry::new();
        let e = reg.create_entity();
        reg.emplace(e, Hp(5)).0 += 1;
        assert_eq!(reg.get::<Hp>(e), Some(&Hp(6)));
    }

    #[test]
    fn reads_against_absent_pools_are_empty() {
        let reg = Registry::new();
        let e = Entity::create();
        assert_eq!(reg.get::<Pos>(e), None);
        assert!(!reg.has::<Pos>(e));
        assert_eq!(reg.all_of::<Pos>().count(), 0);
        assert!(!reg.is_known(e));
    }

    #[test]
    fn variant_pools_are_independent() {
        let mut reg = Registry::new();
        let e = reg.create_entity();
        let prev = ComponentTypeId::from_name("prev");
        reg.set(e, Pos { x: 1, y: 1 });
        reg.set_in(e, prev, Pos { x: 0, y: 0 });
        assert_eq!(reg.get::<Pos>(e), Some(&Pos { x: 1, y: 1 }));
        assert_eq!(reg.get_in::<Pos>(e, prev), Some(&Pos { x: 0, y: 0 }));
        reg.remove_in::<Pos>(e, prev);
        assert_eq!(reg.get_in::<Pos>(e, prev), None);
        assert!(reg.has::<Pos>(e));
    }

    #[test]
    fn destroy_entity_erases_from_every_pool() {
        let mut reg = Registry::new();
        let e = reg.create_named("doomed");
        reg.set(e, Pos { x: 1, y: 2 });
        reg.set(e, Hp(3));
        assert!(reg.is_known(e));
        reg.destroy_entity(e);
        assert!(!reg.is_known(e));
        assert_eq!(reg.entity_name(e), None);
    }

    #[test]
    fn names_resolve_back_to_entities() {
        let mut reg = Registry::new();
        let a = reg.create_named("alpha");
        let _b = reg.create_named("beta");
        let a2 = reg.create_named("alpha");
        assert_eq!(reg.entity_name(a), Some("alpha"));
        // First matching entity in pool order wins.
        assert_eq!(reg.find_by_name("alpha"), Some(a));
        assert_ne!(a, a2);
        assert_eq!(reg.find_by_name("gamma"), None);
    }

    #[test]
    fn for_each_component_visits_each_holding_pool() {
        let mut reg = Registry::new();
        let e = reg.create_entity();
        let other = reg.create_entity();
        reg.set(e, Pos { x: 0, y: 0 });
        reg.set(e, Hp(1));
        reg.set(other, Hp(2));

        let mut seen = Vec::new();
        reg.for_each_component(e, |any, key| {
            if let Some(hp) = any.downcast_ref::<Hp>() {
                seen.push(("hp", hp.0, key.variant));
            } else if any.downcast_ref::<Pos>().is_some() {
                seen.push(("pos", 0, key.variant));
            }
        });
        seen.sort();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].0, "hp");
        assert_eq!(seen[0].1, 1);
    }

    #[test]
    fn for_each_component_mut_allows_writes() {
        let mut reg = Registry::new();
        let e = reg.create_entity();
        reg.set(e, Hp(10));
        reg.for_each_component_mut(e, |mut any, _key| {
            if let Some(hp) = any.downcast_mut::<Hp>() {
                hp.0 += 5;
            }
        });
        assert_eq!(reg.get::<Hp>(e), Some(&Hp(15)));
    }

    #[test]
    fn remove_all_of_drops_the_pool() {
        let mut reg = Registry::new();
        let e = reg.create_entity();
        reg.set(e, Hp(1));
        let pools_before = reg.pool_count();
        reg.remove_all_of::<Hp>();
        assert_eq!(reg.pool_count(), pools_before - 1);
        assert_eq!(reg.get::<Hp>(e), None);
    }

    #[test]
    fn group_entities_builds_a_sorted_matching_block() {
        let mut reg = Registry::new();
        let es: Vec<Entity> = (0..6).map(|_| reg.create_entity()).collect();
        // Insert in reverse so pool order differs from id order.
        for (i, &e) in es.iter().rev().enumerate() {
            reg.set(e, Hp(i as u32));
        }
        let wanted: Vec<Entity> = vec![es[0], es[2], es[4]];
        assert!(reg.group_entities::<Hp>(ComponentTypeId::default(), |e, _| wanted.contains(&e)));

        let order: Vec<Entity> = reg.all_of::<Hp>().map(|(e, _)| e).collect();
        // Pool order was es5..es0; first match is es4 at position 1.
        assert_eq!(order[0], es[5]);
        assert_eq!(&order[1..4], &[es[0], es[2], es[4]]);
        assert_eq!(&order[4..], &[es[3], es[1]]);
    }

    #[test]
    fn group_entities_without_matches_returns_false() {
        let mut reg = Registry::new();
        let e = reg.create_entity();
        reg.set(e, Hp(1));
        assert!(!reg.group_entities::<Hp>(ComponentTypeId::default(), |_, _| false));
        assert!(!reg.group_entities::<Pos>(ComponentTypeId::default(), |_, _| true));
        // The pool survives a failed grouping untouched.
        assert_eq!(reg.get::<Hp>(e), Some(&Hp(1)));
    }

    #[test]
    fn binary_store_and_fetch() {
        let mut reg = Registry::new();
        let c = ComponentTypeId::from_name("blob");
        let e = reg.create_entity();
        assert_eq!(reg.store(e, c, &[1, 2, 3, 4]), Ok(true));
        assert_eq!(reg.binary(e, c), Some(&[1u8, 2, 3, 4][..]));
        let e2 = reg.create_entity();
        assert!(reg.store(e2, c, &[9; 8]).is_err());
        assert_eq!(reg.binary(e2, c), None);
        reg.remove_binary(e, c);
        assert_eq!(reg.binary(e, c), None);
    }

    #[test]
    fn binary_pools_participate_in_entity_destruction() {
        let mut reg = Registry::new();
        let c = ComponentTypeId::from_name("blob2");
        let e = reg.create_entity();
        reg.store(e, c, &[7]).unwrap();
        assert!(reg.is_known(e));
        reg.destroy_entity(e);
        assert_eq!(reg.binary(e, c), None);
    }

    #[test]
    fn group_binary_requires_every_pool() {
        let mut reg = Registry::new();
        let a = ComponentTypeId::from_name("a");
        let b = ComponentTypeId::from_name("b");
        let e = reg.create_entity();
        reg.store(e, a, &[1]).unwrap();
        assert!(!reg.group_binary(&[a, b]));
        reg.store(e, b, &[2]).unwrap();
        assert!(reg.group_binary(&[a, b]));
    }
}
