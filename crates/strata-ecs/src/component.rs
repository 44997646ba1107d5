//! Component identity: type fingerprints, pool keys, and the [`Component`]
//! trait.
//!
//! Every component type is identified by a 64-bit [`ComponentTypeId`]. The
//! id is derived from one of three sources, in order of preference:
//!
//! 1. an explicit name supplied by the implementer ([`ComponentTypeId::from_name`]),
//! 2. the FNV-1a fingerprint of the type's `core::any::type_name` when no
//!    name is given,
//! 3. a raw numeric value ([`ComponentTypeId::new`]), used by the binary
//!    component layer where ids arrive from outside the type system.
//!
//! `type_name` is stable within one build but not guaranteed stable across
//! toolchains or crate renames. Components whose ids must survive either
//! should override [`Component::component_type_id`] with an explicit name;
//! that is the supported opt-in. Two distinct types fingerprinting to the
//! same id is unsupported and left undetected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::hash::fnv1a_64;

// ---------------------------------------------------------------------------
// TypeFingerprint
// ---------------------------------------------------------------------------

/// FNV-1a hash of a type's compiler-generated name.
///
/// This is the tag carried by the type-erased references
/// ([`AnyRef`](crate::any_ref::AnyRef)); it identifies a Rust type, while
/// [`ComponentTypeId`] identifies a component (which may be renamed).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeFingerprint(u64);

impl TypeFingerprint {
    /// Fingerprint of the type `T`.
    pub fn of<T: 'static>() -> Self {
        Self(fnv1a_64(std::any::type_name::<T>().as_bytes()))
    }

    /// The raw 64-bit fingerprint.
    #[inline]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TypeFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeFingerprint({:#018x})", self.0)
    }
}

// ---------------------------------------------------------------------------
// ComponentTypeId
// ---------------------------------------------------------------------------

/// 64-bit identifier of a component type (or of a pool variant).
///
/// The default value (0) is the default variant id.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct ComponentTypeId(u64);

impl ComponentTypeId {
    /// Wrap an explicit numeric id.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Derive an id from a name string (FNV-1a). Constant-evaluable, so it
    /// can back an associated constant in a [`Component`] impl.
    pub const fn from_name(name: &str) -> Self {
        Self(fnv1a_64(name.as_bytes()))
    }

    /// Derive an id from the type-name fingerprint of `T`.
    pub fn of<T: 'static>() -> Self {
        Self(TypeFingerprint::of::<T>().value())
    }

    /// The raw 64-bit id.
    #[inline]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Mixing addition combining two ids into one hash value.
    ///
    /// Used only for hashing the composite [`PoolKey`]; this is not a
    /// general-purpose hash combiner.
    pub const fn mix(self, other: ComponentTypeId) -> ComponentTypeId {
        ComponentTypeId(
            self.0
                .wrapping_add(0x9e37_79b9)
                .wrapping_add(other.0 << 6)
                .wrapping_add((other.0 > 2) as u64),
        )
    }
}

impl From<u64> for ComponentTypeId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Debug for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentTypeId({:#018x})", self.0)
    }
}

// ---------------------------------------------------------------------------
// PoolKey
// ---------------------------------------------------------------------------

/// Key of a pool in the registry directory: the component type id plus a
/// variant id.
///
/// The variant (default 0) lets several pools of the same value type
/// coexist, e.g. `"position"` vs `"prev_position"`, or the per-component-id
/// pools of the binary layer. Keys order lexicographically.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PoolKey {
    /// Id of the component type stored in the pool.
    pub type_id: ComponentTypeId,
    /// Variant distinguishing pools of the same type.
    pub variant: ComponentTypeId,
}

impl PoolKey {
    /// Build a key from its parts.
    pub const fn new(type_id: ComponentTypeId, variant: ComponentTypeId) -> Self {
        Self { type_id, variant }
    }

    /// Key of the pool holding `T` under `variant`.
    pub fn of<T: Component>(variant: ComponentTypeId) -> Self {
        Self::new(T::component_type_id(), variant)
    }
}

impl Hash for PoolKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.type_id.mix(self.variant).value());
    }
}

impl fmt::Debug for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PoolKey({:#x}, {:#x})",
            self.type_id.value(),
            self.variant.value()
        )
    }
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// Marker trait for types storable as components.
///
/// The default [`component_type_id`](Component::component_type_id) derives
/// the id from the type-name fingerprint. Override it with
/// [`ComponentTypeId::from_name`] when the id has to be stable across
/// builds, toolchains or module moves:
///
/// ```
/// use strata_ecs::component::{Component, ComponentTypeId};
///
/// struct Position { x: f32, y: f32 }
///
/// impl Component for Position {
///     fn component_type_id() -> ComponentTypeId {
///         ComponentTypeId::from_name("position")
///     }
/// }
/// ```
pub trait Component: Sized + 'static {
    /// Identifier of the pool family this component type lives in.
    fn component_type_id() -> ComponentTypeId {
        ComponentTypeId::of::<Self>()
    }
}

// ---------------------------------------------------------------------------
// EntityName
// ---------------------------------------------------------------------------

/// Built-in component carrying an entity's human-readable name.
///
/// Registered under an explicit name so its pool id does not depend on
/// fingerprint stability.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct EntityName(String);

impl EntityName {
    /// Wrap a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The name as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Component for EntityName {
    fn component_type_id() -> ComponentTypeId {
        ComponentTypeId::from_name("strata::EntityName")
    }
}

impl From<&str> for EntityName {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl From<String> for EntityName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl PartialEq<str> for EntityName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for EntityName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for EntityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
