//! Join views: lazy N-way joins over component pools.
//!
//! A [`View`] captures one pool per requested component (plus variant) at
//! construction and yields `(entity, (&T1, ..., &Tn))` for every entity
//! present in *all* of them. Iteration walks the smallest captured pool
//! (the driver) positionally and point-looks-up the rest, so the cost is
//! `O(len(smallest) * n)` regardless of how large the other pools are.
//!
//! If any requested pool does not exist the view is empty.
//!
//! Tuple support is written out per arity, one impl each for 1–4
//! components; larger joins can always be expressed as a view over the
//! rarest components plus `get` calls on the rest.

use crate::component::{Component, ComponentTypeId};
use crate::entity::Entity;
use crate::pool::ComponentPool;
use crate::registry::Registry;

/// Variant for position `i`, defaulting to 0 past the end of the list.
#[inline]
fn variant_at(variants: &[ComponentTypeId], i: usize) -> ComponentTypeId {
    variants.get(i).copied().unwrap_or_default()
}

// ---------------------------------------------------------------------------
// ComponentSet
// ---------------------------------------------------------------------------

/// A tuple of component types usable with [`Registry::view`],
/// [`Registry::has_all`] and [`Registry::group`].
///
/// Implemented for tuples `(A,)` through `(A, B, C, D)` where every element
/// is a [`Component`].
pub trait ComponentSet {
    /// Number of components in the tuple.
    const LEN: usize;

    /// The captured pools: one `Option<&ComponentPool<_>>` per element.
    type Pools<'w>: Copy;

    /// The per-entity yield: one `&T` per element.
    type Refs<'w>;

    /// Capture the pools for this tuple from the registry.
    fn pools<'w>(registry: &'w Registry, variants: &[ComponentTypeId]) -> Self::Pools<'w>;

    /// Index and length of the smallest captured pool; `None` when any pool
    /// is absent (which makes the view empty).
    fn smallest(pools: &Self::Pools<'_>) -> Option<(usize, usize)>;

    /// Entity at `pos` of the driver pool.
    fn entity_at(pools: &Self::Pools<'_>, driver: usize, pos: usize) -> Option<Entity>;

    /// Look `entity` up in every pool; `None` when any lookup misses.
    fn fetch<'w>(pools: Self::Pools<'w>, entity: Entity) -> Option<Self::Refs<'w>>;

    /// Whether `entity` is present in every pool, short-circuiting left to
    /// right.
    fn contains_all(registry: &Registry, entity: Entity, variants: &[ComponentTypeId]) -> bool;

    /// Reorganize every pool of the tuple against the others (see
    /// [`Registry::group`]).
    fn group(registry: &mut Registry, variants: &[ComponentTypeId]) -> bool;
}

// -- (A,) -------------------------------------------------------------------

impl<A: Component> ComponentSet for (A,) {
    const LEN: usize = 1;
    type Pools<'w> = (Option<&'w ComponentPool<A>>,);
    type Refs<'w> = (&'w A,);

    fn pools<'w>(registry: &'w Registry, variants: &[ComponentTypeId]) -> Self::Pools<'w> {
        (registry.pool::<A>(variant_at(variants, 0)),)
    }

    fn smallest(pools: &Self::Pools<'_>) -> Option<(usize, usize)> {
        pools.0.map(|a| (0, a.len()))
    }

    fn entity_at(pools: &Self::Pools<'_>, _driver: usize, pos: usize) -> Option<Entity> {
        pools.0?.entity_at(pos)
    }

    fn fetch<'w>(pools: Self::Pools<'w>, entity: Entity) -> Option<Self::Refs<'w>> {
        Some((pools.0?.get(entity)?,))
    }

    fn contains_all(registry: &Registry, entity: Entity, variants: &[ComponentTypeId]) -> bool {
        registry.has_in::<A>(entity, variant_at(variants, 0))
    }

    fn group(registry: &mut Registry, variants: &[ComponentTypeId]) -> bool {
        // A single pool has no join partner; the whole pool is the match,
        // which sorts it by entity id.
        registry.group_entities::<A>(variant_at(variants, 0), |_, _| true)
    }
}

// -- (A, B) -----------------------------------------------------------------

impl<A: Component, B: Component> ComponentSet for (A, B) {
    const LEN: usize = 2;
    type Pools<'w> = (Option<&'w ComponentPool<A>>, Option<&'w ComponentPool<B>>);
    type Refs<'w> = (&'w A, &'w B);

    fn pools<'w>(registry: &'w Registry, variants: &[ComponentTypeId]) -> Self::Pools<'w> {
        (
            registry.pool::<A>(variant_at(variants, 0)),
            registry.pool::<B>(variant_at(variants, 1)),
        )
    }

    fn smallest(pools: &Self::Pools<'_>) -> Option<(usize, usize)> {
        let lens = [pools.0?.len(), pools.1?.len()];
        Some(smallest_of(&lens))
    }

    fn entity_at(pools: &Self::Pools<'_>, driver: usize, pos: usize) -> Option<Entity> {
        match driver {
            0 => pools.0?.entity_at(pos),
            _ => pools.1?.entity_at(pos),
        }
    }

    fn fetch<'w>(pools: Self::Pools<'w>, entity: Entity) -> Option<Self::Refs<'w>> {
        Some((pools.0?.get(entity)?, pools.1?.get(entity)?))
    }

    fn contains_all(registry: &Registry, entity: Entity, variants: &[ComponentTypeId]) -> bool {
        registry.has_in::<A>(entity, variant_at(variants, 0))
            && registry.has_in::<B>(entity, variant_at(variants, 1))
    }

    fn group(registry: &mut Registry, variants: &[ComponentTypeId]) -> bool {
        let (va, vb) = (variant_at(variants, 0), variant_at(variants, 1));
        let common = {
            let (Some(a), Some(b)) = (registry.pool::<A>(va), registry.pool::<B>(vb)) else {
                return false;
            };
            sorted_common(a.entities(), &[&|e| b.contains(e)])
        };
        let matches = |e: Entity| common.binary_search(&e).is_ok();
        registry.group_entities::<A>(va, |e, _| matches(e))
            && registry.group_entities::<B>(vb, |e, _| matches(e))
    }
}

// -- (A, B, C) --------------------------------------------------------------

impl<A: Component, B: Component, C: Component> ComponentSet for (A, B, C) {
    const LEN: usize = 3;
    type Pools<'w> = (
        Option<&'w ComponentPool<A>>,
        Option<&'w ComponentPool<B>>,
        Option<&'w ComponentPool<C>>,
    );
    type Refs<'w> = (&'w A, &'w B, &'w C);

    fn pools<'w>(registry: &'w Registry, variants: &[ComponentTypeId]) -> Self::Pools<'w> {
        (
            registry.pool::<A>(variant_at(variants, 0)),
            registry.pool::<B>(variant_at(variants, 1)),
            registry.pool::<C>(variant_at(variants, 2)),
        )
    }

    fn smallest(pools: &Self::Pools<'_>) -> Option<(usize, usize)> {
        let lens = [pools.0?.len(), pools.1?.len(), pools.2?.len()];
        Some(smallest_of(&lens))
    }

    fn entity_at(pools: &Self::Pools<'_>, driver: usize, pos: usize) -> Option<Entity> {
        match driver {
            0 => pools.0?.entity_at(pos),
            1 => pools.1?.entity_at(pos),
            _ => pools.2?.entity_at(pos),
        }
    }

    fn fetch<'w>(pools: Self::Pools<'w>, entity: Entity) -> Option<Self::Refs<'w>> {
        Some((
            pools.0?.get(entity)?,
            pools.1?.get(entity)?,
            pools.2?.get(entity)?,
        ))
    }

    fn contains_all(registry: &Registry, entity: Entity, variants: &[ComponentTypeId]) -> bool {
        registry.has_in::<A>(entity, variant_at(variants, 0))
            && registry.has_in::<B>(entity, variant_at(variants, 1))
            && registry.has_in::<C>(entity, variant_at(variants, 2))
    }

    fn group(registry: &mut Registry, variants: &[ComponentTypeId]) -> bool {
        let (va, vb, vc) = (
            variant_at(variants, 0),
            variant_at(variants, 1),
            variant_at(variants, 2),
        );
        let common = {
            let (Some(a), Some(b), Some(c)) = (
                registry.pool::<A>(va),
                registry.pool::<B>(vb),
                registry.pool::<C>(vc),
            ) else {
                return false;
            };
            sorted_common(a.entities(), &[&|e| b.contains(e), &|e| c.contains(e)])
        };
        let matches = |e: Entity| common.binary_search(&e).is_ok();
        registry.group_entities::<A>(va, |e, _| matches(e))
            && registry.group_entities::<B>(vb, |e, _| matches(e))
            && registry.group_entities::<C>(vc, |e, _| matches(e))
    }
}

// -- (A, B, C, D) -----------------------------------------------------------

impl<A: Component, B: Component, C: Component, D: Component> ComponentSet for (A, B, C, D) {
    const LEN: usize = 4;
    type Pools<'w> = (
        Option<&'w ComponentPool<A>>,
        Option<&'w ComponentPool<B>>,
        Option<&'w ComponentPool<C>>,
        Option<&'w ComponentPool<D>>,
    );
    type Refs<'w> = (&'w A, &'w B, &'w C, &'w D);

    fn pools<'w>(registry: &'w Registry, variants: &[ComponentTypeId]) -> Self::Pools<'w> {
        (
            registry.pool::<A>(variant_at(variants, 0)),
            registry.pool::<B>(variant_at(variants, 1)),
            registry.pool::<C>(variant_at(variants, 2)),
            registry.pool::<D>(variant_at(variants, 3)),
        )
    }

    fn smallest(pools: &Self::Pools<'_>) -> Option<(usize, usize)> {
        let lens = [
            pools.0?.len(),
            pools.1?.len(),
            pools.2?.len(),
            pools.3?.len(),
        ];
        Some(smallest_of(&lens))
    }

    fn entity_at(pools: &Self::Pools<'_>, driver: usize, pos: usize) -> Option<Entity> {
        match driver {
            0 => pools.0?.entity_at(pos),
            1 => pools.1?.entity_at(pos),
            2 => pools.2?.entity_at(pos),
            _ => pools.3?.entity_at(pos),
        }
    }

    fn fetch<'w>(pools: Self::Pools<'w>, entity: Entity) -> Option<Self::Refs<'w>> {
        Some((
            pools.0?.get(entity)?,
            pools.1?.get(entity)?,
            pools.2?.get(entity)?,
            pools.3?.get(entity)?,
        ))
    }

    fn contains_all(registry: &Registry, entity: Entity, variants: &[ComponentTypeId]) -> bool {
        registry.has_in::<A>(entity, variant_at(variants, 0))
            && registry.has_in::<B>(entity, variant_at(variants, 1))
            && registry.has_in::<C>(entity, variant_at(variants, 2))
            && registry.has_in::<D>(entity, variant_at(variants, 3))
    }

    fn group(registry: &mut Registry, variants: &[ComponentTypeId]) -> bool {
        let (va, vb, vc, vd) = (
            variant_at(variants, 0),
            variant_at(variants, 1),
            variant_at(variants, 2),
            variant_at(variants, 3),
        );
        let common = {
            let (Some(a), Some(b), Some(c), Some(d)) = (
                registry.pool::<A>(va),
                registry.pool::<B>(vb),
                registry.pool::<C>(vc),
                registry.pool::<D>(vd),
            ) else {
                return false;
            };
            sorted_common(
                a.entities(),
                &[&|e| b.contains(e), &|e| c.contains(e), &|e| d.contains(e)],
            )
        };
        let matches = |e: Entity| common.binary_search(&e).is_ok();
        registry.group_entities::<A>(va, |e, _| matches(e))
            && registry.group_entities::<B>(vb, |e, _| matches(e))
            && registry.group_entities::<C>(vc, |e, _| matches(e))
            && registry.group_entities::<D>(vd, |e, _| matches(e))
    }
}

/// Index and length of the smallest pool.
fn smallest_of(lens: &[usize]) -> (usize, usize) {
    let mut best = 0;
    for (i, &len) in lens.iter().enumerate() {
        if len < lens[best] {
            best = i;
        }
    }
    (best, lens[best])
}

/// Entities of `seed` present in every `others` membership test, sorted
/// ascending. This is the "has all the other components" predicate shared
/// by the group rotations: membership never changes while pools are merely
/// reordered, so it is computed once.
fn sorted_common(seed: &[Entity], others: &[&dyn Fn(Entity) -> bool]) -> Vec<Entity> {
    let mut common: Vec<Entity> = seed
        .iter()
        .copied()
        .filter(|&e| others.iter().all(|contains| contains(e)))
        .collect();
    common.sort_unstable();
    common
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

/// A lazy join over the pools of the component tuple `S`.
///
/// The view snapshots pool references at construction; it borrows the
/// registry, so structural mutation while a view is alive is a compile
/// error.
pub struct View<'w, S: ComponentSet> {
    pools: S::Pools<'w>,
    driver: Option<(usize, usize)>,
}

impl<'w, S: ComponentSet> View<'w, S> {
    pub(crate) fn new(registry: &'w Registry, variants: &[ComponentTypeId]) -> Self {
        let pools = S::pools(registry, variants);
        let driver = S::smallest(&pools);
        Self { pools, driver }
    }

    /// Iterate the join.
    pub fn iter(&self) -> ViewIter<'w, S> {
        let (driver, len) = self.driver.unwrap_or((0, 0));
        ViewIter {
            pools: self.pools,
            driver,
            len,
            pos: 0,
        }
    }
}

impl<'w, S: ComponentSet> IntoIterator for &View<'w, S> {
    type Item = (Entity, S::Refs<'w>);
    type IntoIter = ViewIter<'w, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'w, S: ComponentSet> IntoIterator for View<'w, S> {
    type Item = (Entity, S::Refs<'w>);
    type IntoIter = ViewIter<'w, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a [`View`]: the driver pool advances one position at a
/// time, entities missing from any other pool are skipped.
pub struct ViewIter<'w, S: ComponentSet> {
    pools: S::Pools<'w>,
    driver: usize,
    len: usize,
    pos: usize,
}

impl<'w, S: ComponentSet> Iterator for ViewIter<'w, S> {
    type Item = (Entity, S::Refs<'w>);

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.len {
            let pos = self.pos;
            self.pos += 1;
            let entity = S::entity_at(&self.pools, self.driver, pos)?;
            if let Some(refs) = S::fetch(self.pools, entity) {
                return Some((entity, refs));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.len - self.pos.min(self.len)))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
