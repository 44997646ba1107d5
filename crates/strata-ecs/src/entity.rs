//! Entity identifiers and the process-wide id generator.
//!
//! An [`Entity`] is an opaque 64-bit id. Id `0` is reserved as the null
//! entity. Fresh ids come from a single process-wide atomic counter, so two
//! registries in the same process never hand out the same id. Adopting an
//! externally supplied id (deserialization, cloning entities from another
//! store) advances the counter past it, which keeps later [`Entity::create`]
//! calls collision-free.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::hash::{fnv1a_64, FNV_PRIME};

/// Process-wide id source. Initialized to zero, never reset.
static ID_GENERATOR: AtomicU64 = AtomicU64::new(0);

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// An opaque 64-bit entity identifier.
///
/// Entities are totally ordered by id and hash to their id. They carry no
/// generation counter; an id is never recycled because the generator only
/// moves forward.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entity(u64);

impl Entity {
    /// The reserved null entity (id 0). No component can be usefully
    /// attached to it, but storing one is not an error.
    pub const NULL: Entity = Entity(0);

    /// Draw a fresh, unique entity from the process-wide generator.
    pub fn create() -> Self {
        Entity(ID_GENERATOR.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Adopt an externally supplied id.
    ///
    /// The generator is atomically advanced to at least `id`, so entities
    /// created afterwards cannot collide with the adopted one. This is the
    /// constructor deserialization routes through.
    pub fn from_id(id: u64) -> Self {
        ID_GENERATOR.fetch_max(id, Ordering::Relaxed);
        Entity(id)
    }

    /// Derive a deterministic entity from the caller's source location.
    ///
    /// The id is an FNV-1a fingerprint of file, line and column, so the same
    /// call site always yields the same entity. The generator is not
    /// consulted; fingerprints are sparse in the 64-bit space, which is what
    /// keeps them disjoint from sequentially generated ids in practice.
    #[must_use]
    #[track_caller]
    pub fn from_source() -> Self {
        let loc = std::panic::Location::caller();
        let mut h = fnv1a_64(loc.file().as_bytes());
        h = (h ^ loc.line() as u64).wrapping_mul(FNV_PRIME);
        h = (h ^ loc.column() as u64).wrapping_mul(FNV_PRIME);
        if h == 0 {
            h = FNV_PRIME;
        }
        Entity(h)
    }

    /// The raw 64-bit id.
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }

    /// Whether this is the reserved null entity.
    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl Default for Entity {
    fn default() -> Self {
        Entity::NULL
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl Serialize for Entity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

// Deserialization goes through `from_id` so that loading stored entities
// advances the generator.
impl<'de> Deserialize<'de> for Entity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u64::deserialize(deserializer).map(Entity::from_id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
