//! Strata ECS -- an in-process, embeddable entity-component database.
//!
//! Entities are opaque 64-bit ids; components are plain Rust values stored
//! in per-type *pools* (packed insertion-ordered vectors with a hash
//! index); the [`Registry`](registry::Registry) is the directory of pools
//! and the CRUD surface; [`View`](view::View)s join N pools by entity.
//!
//! # Quick start
//!
//! ```
//! use strata_ecs::prelude::*;
//!
//! #[derive(Debug, PartialEq)]
//! struct Position { x: f32, y: f32 }
//! impl Component for Position {}
//!
//! #[derive(Debug, PartialEq)]
//! struct Velocity { dx: f32, dy: f32 }
//! impl Component for Velocity {}
//!
//! let mut registry = Registry::new();
//! let player = registry.create_named("player");
//! registry.set(player, Position { x: 0.0, y: 0.0 });
//! registry.set(player, Velocity { dx: 1.0, dy: 0.0 });
//!
//! for (_entity, (pos, vel)) in &registry.view::<(Position, Velocity)>() {
//!     assert_eq!(pos.x + vel.dx, 1.0);
//! }
//! assert_eq!(registry.find_by_name("player"), Some(player));
//! ```
//!
//! # Design notes
//!
//! - Storage is two layers deep: an open-addressing hash map
//!   ([`open_map`]) indexes a packed pair of vectors ([`flat_map`]), giving
//!   O(1) insert/erase/lookup with contiguous iteration.
//! - Type erasure uses 64-bit type-name fingerprints ([`any_ref`]), not
//!   `TypeId`, so the same identity scheme extends over the C ABI.
//! - [`Registry::group`](registry::Registry::group) physically reorders
//!   pools so that co-present entities form a sorted contiguous block,
//!   which turns joined iteration over those pools into parallel scans.
//!
//! The registry is not internally synchronized: concurrent readers are
//! fine, writers need external locking. The entity id generator is the
//! only global and is atomic.

#![deny(unsafe_code)]

#[allow(unsafe_code)]
pub mod any_ref;
pub mod binary;
pub mod component;
pub mod entity;
pub mod flat_map;
mod hash;
pub mod open_map;
pub mod pool;
pub mod registry;
pub mod view;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors produced by ECS operations.
///
/// Absence (unknown entity, missing component, missing pool) is expressed
/// as `Option`/empty ranges, not errors; the only recoverable failure in
/// the core is a binary payload whose size disagrees with its pool.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EcsError {
    /// A binary payload's size does not match the pool's fixed row size.
    #[error("binary payload of {found} bytes does not match the pool's fixed row size of {expected} bytes")]
    BinarySizeMismatch {
        /// Row size fixed by the pool's first insert.
        expected: usize,
        /// Size of the rejected payload.
        found: usize,
    },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::any_ref::{AnyRef, ConstAnyRef};
    pub use crate::binary::{BinaryDeleter, BinaryPool};
    pub use crate::component::{Component, ComponentTypeId, EntityName, PoolKey};
    pub use crate::entity::Entity;
    pub use crate::registry::Registry;
    pub use crate::view::{ComponentSet, View};
    pub use crate::EcsError;
}

// ---------------------------------------------------------------------------
// Integration tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Debug, PartialEq)]
    struct Counter(i64);
    impl Component for Counter {}

    // -- basic set / view: two of three entities join ------------------------

    #[test]
    fn set_and_view_with_names() {
        let mut reg = Registry::new();
        let a = reg.create_named("a");
        let b = reg.create_named("b");
        let c = reg.create_named("c");
        reg.set(b, Counter(42));
        reg.set(c, Counter(55));

        let mut rows: Vec<(Entity, String, i64)> = reg
            .view::<(EntityName, Counter)>()
            .iter()
            .map(|(e, (name, counter))| (e, name.to_string(), counter.0))
            .collect();
        rows.sort();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], (b, "b".to_owned(), 42));
        assert_eq!(rows[1], (c, "c".to_owned(), 55));

        // After grouping, {b, c} forms a sorted contiguous block in both
        // pools: right behind the non-matching `a` in the name pool, at the
        // front of the counter pool.
        assert!(reg.group::<(EntityName, Counter)>(&[]));
        let name_order: Vec<Entity> = reg.all_of::<EntityName>().map(|(e, _)| e).collect();
        let counter_order: Vec<Entity> = reg.all_of::<Counter>().map(|(e, _)| e).collect();
        assert_eq!(name_order, vec![a, b, c]);
        assert_eq!(counter_order, vec![b, c]);
    }

    // -- variant pools -------------------------------------------------------

    #[test]
    fn variant_pools_iterate_independently() {
        let mut reg = Registry::new();
        let b = reg.create_entity();
        let c = reg.create_entity();
        let d = reg.create_entity();
        let variant = ComponentTypeId::from_name("shadow");

        reg.set_in(d, variant, Counter(55));
        reg.set_in(b, variant, Counter(42));
        reg.set(c, Counter(99));

        let plain: Vec<(Entity, i64)> = reg.all_of::<Counter>().map(|(e, v)| (e, v.0)).collect();
        assert_eq!(plain, vec![(c, 99)]);

        let shadowed: Vec<(Entity, i64)> = reg
            .all_of_in::<Counter>(variant)
            .map(|(e, v)| (e, v.0))
            .collect();
        assert_eq!(shadowed, vec![(d, 55), (b, 42)], "insertion order preserved");
    }

    // -- drop discipline -----------------------------------------------------

    /// A component owning a buffer whose release is observable.
    struct Buffer {
        bytes: Vec<u8>,
        releases: Rc<Cell<usize>>,
    }
    impl Component for Buffer {}
    impl Drop for Buffer {
        fn drop(&mut self) {
            self.bytes.clear();
            self.releases.set(self.releases.get() + 1);
        }
    }

    #[test]
    fn drop_runs_exactly_once_per_value() {
        let releases = Rc::new(Cell::new(0));
        let buffer = |n| Buffer {
            bytes: vec![0; n],
            releases: releases.clone(),
        };

        let mut reg = Registry::new();
        let e = reg.create_entity();

        // Replacement drops the first value.
        reg.set(e, buffer(16));
        reg.set(e, buffer(32));
        assert_eq!(releases.get(), 1);

        // Removal drops the second.
        reg.remove::<Buffer>(e);
        assert_eq!(releases.get(), 2);

        // Values still stored when the registry dies are dropped with it.
        reg.set(e, buffer(8));
        let e2 = reg.create_entity();
        reg.set(e2, buffer(8));
        reg.destroy_entity(e2);
        assert_eq!(releases.get(), 3);
        drop(reg);
        assert_eq!(releases.get(), 4);
    }

    #[test]
    fn remove_all_of_drops_every_value() {
        let releases = Rc::new(Cell::new(0));
        let mut reg = Registry::new();
        for _ in 0..5 {
            let e = reg.create_entity();
            reg.set(
                e,
                Buffer {
                    bytes: vec![1],
                    releases: releases.clone(),
                },
            );
        }
        reg.remove_all_of::<Buffer>();
        assert_eq!(releases.get(), 5);
    }

    // -- join shapes ---------------------------------------------------------

    #[test]
    fn joins_over_absent_and_single_pools() {
        #[derive(Debug)]
        struct Missing;
        impl Component for Missing {}

        let mut reg = Registry::new();
        for i in 0..3 {
            let e = reg.create_entity();
            reg.set(e, Counter(i));
        }
        assert_eq!(reg.view::<(Counter, Missing)>().iter().count(), 0);
        let values: Vec<i64> = reg
            .view::<(Counter,)>()
            .iter()
            .map(|(_, (c,))| c.0)
            .collect();
        assert_eq!(values, vec![0, 1, 2]);
    }

    #[test]
    fn join_after_churn_stays_consistent() {
        let mut reg = Registry::new();
        let entities: Vec<Entity> = (0..100).map(|_| reg.create_entity()).collect();
        for (i, &e) in entities.iter().enumerate() {
            reg.set(e, Counter(i as i64));
            if i % 2 == 0 {
                reg.set_entity_name(e, &format!("even-{i}"));
            }
        }
        for &e in entities.iter().take(50) {
            reg.destroy_entity(e);
        }

        let joined = reg.view::<(EntityName, Counter)>().iter().count();
        // Evens among the surviving 50..99.
        assert_eq!(joined, 25);
        for (e, (_, counter)) in &reg.view::<(EntityName, Counter)>() {
            assert_eq!(reg.get::<Counter>(e).map(|c| c.0), Some(counter.0));
        }
    }

    // -- round trips ---------------------------------------------------------

    #[test]
    fn set_then_get_round_trip() {
        let mut reg = Registry::new();
        let e = reg.create_entity();
        reg.set(e, Counter(7));
        assert_eq!(reg.get::<Counter>(e), Some(&Counter(7)));
        assert!(reg.has::<Counter>(e));
        assert!(!reg.has_all::<(Counter, EntityName)>(e, &[]));
    }

    #[test]
    fn named_entity_round_trip() {
        let mut reg = Registry::new();
        let e = reg.create_named("round-trip");
        assert_eq!(reg.find_by_name("round-trip"), Some(e));
        assert_eq!(reg.entity_name(e), Some("round-trip"));
    }
}
