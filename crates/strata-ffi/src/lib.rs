//! C ABI over the strata ECS registry.
//!
//! The registry is exposed as an opaque handle; components are *binary*:
//! identified by the hash of their registration name and stored as opaque
//! fixed-size payloads (see `strata_ecs::binary`). The exported surface
//! mirrors `include/ecs.h`.
//!
//! # Locking
//!
//! None of the `ecs_*` calls lock internally. A handle embeds a raw
//! reader-writer lock and exposes it through the four
//! `ecs_lock_registry*` / `ecs_unlock_registry*` calls; multi-threaded
//! callers bracket their accesses with those (guard objects cannot cross a
//! C call boundary, hence the raw lock). Single-threaded callers may
//! ignore the lock entirely.
//!
//! # Safety
//!
//! Every function taking a handle requires a pointer previously returned
//! by [`ecs_create_registry`] and not yet destroyed, honoring the locking
//! contract above. Name parameters must be valid NUL-terminated strings;
//! `(data, size)` pairs must describe readable memory.

use std::ffi::{c_char, c_int, c_void, CStr};
use std::ptr;

use parking_lot::lock_api::RawRwLock as _;
use parking_lot::RawRwLock;
use std::cell::UnsafeCell;

use strata_ecs::binary::{BinaryDeleter, BinaryPool};
use strata_ecs::component::ComponentTypeId;
use strata_ecs::entity::Entity;
use strata_ecs::registry::Registry;

/// Entity id as seen from C (0 is the null entity).
pub type EcsEntityId = u64;
/// Component id as seen from C: the FNV-1a hash of the registration name.
pub type EcsComponentId = u64;
/// Deleter invoked once per discarded component payload.
pub type EcsComponentDeleter = Option<unsafe extern "C" fn(data: *mut c_void, size: usize)>;
/// Callback of [`ecs_view_iterate`].
pub type EcsViewCallback =
    Option<unsafe extern "C" fn(EcsEntityId, *const *const c_void, *mut c_void) -> c_int>;
/// Callback of [`ecs_view_iterate_mut`].
pub type EcsViewCallbackMut =
    Option<unsafe extern "C" fn(EcsEntityId, *mut *mut c_void, *mut c_void) -> c_int>;

/// Upper bound on the number of components joined by one view call. The
/// scratch arrays live on the stack, so the cap is a compile-time constant.
pub const ECS_MAX_COMPONENT_COUNT_IN_VIEW: usize = 128;

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// The opaque registry handle: the core registry plus the raw lock backing
/// the explicit lock API.
pub struct EcsRegistry {
    lock: RawRwLock,
    inner: UnsafeCell<Registry>,
}

// The handle is shared across threads by C callers; synchronization is
// their obligation via the exported lock calls.
unsafe impl Send for EcsRegistry {}
unsafe impl Sync for EcsRegistry {}

unsafe fn registry_ref<'a>(handle: *const EcsRegistry) -> &'a Registry {
    &*(*handle).inner.get()
}

#[allow(clippy::mut_from_ref)]
unsafe fn registry_mut<'a>(handle: *mut EcsRegistry) -> &'a mut Registry {
    &mut *(*handle).inner.get()
}

fn component(id: EcsComponentId) -> ComponentTypeId {
    ComponentTypeId::new(id)
}

// ---------------------------------------------------------------------------
// Registry lifecycle
// ---------------------------------------------------------------------------

/// Create a new registry. Returns an owned handle; release it with
/// [`ecs_destroy_registry`].
#[no_mangle]
pub extern "C" fn ecs_create_registry() -> *mut EcsRegistry {
    Box::into_raw(Box::new(EcsRegistry {
        lock: RawRwLock::INIT,
        inner: UnsafeCell::new(Registry::new()),
    }))
}

/// Destroy a registry, releasing every pool and payload (deleters run).
/// A null handle is ignored.
#[no_mangle]
pub unsafe extern "C" fn ecs_destroy_registry(handle: *mut EcsRegistry) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// Create a fresh entity.
#[no_mangle]
pub unsafe extern "C" fn ecs_create_entity(handle: *mut EcsRegistry) -> EcsEntityId {
    registry_mut(handle).create_entity().id()
}

/// Create a fresh entity carrying the given NUL-terminated name.
#[no_mangle]
pub unsafe extern "C" fn ecs_create_named_entity(
    handle: *mut EcsRegistry,
    name: *const c_char,
) -> EcsEntityId {
    let name = CStr::from_ptr(name).to_string_lossy();
    registry_mut(handle).create_named(&name).id()
}

/// Erase the entity from every pool (deleters run on its binary payloads).
#[no_mangle]
pub unsafe extern "C" fn ecs_destroy_entity(handle: *mut EcsRegistry, entity: EcsEntityId) {
    registry_mut(handle).destroy_entity(Entity::from_id(entity));
}

/// Copy the entity's name into `buf`.
///
/// Returns the name length *including* the NUL terminator. When `buf` is
/// null the return value is the required buffer size; when the buffer is
/// too small the name is truncated (still NUL-terminated) and the returned
/// length reflects the truncation. An unnamed entity yields 0 and leaves
/// the buffer untouched.
#[no_mangle]
pub unsafe extern "C" fn ecs_get_entity_name(
    handle: *mut EcsRegistry,
    entity: EcsEntityId,
    buf: *mut c_char,
    bufsize: usize,
) -> usize {
    let Some(name) = registry_ref(handle).entity_name(Entity::from_id(entity)) else {
        return 0;
    };
    if buf.is_null() {
        return name.len() + 1;
    }
    if bufsize == 0 {
        return 0;
    }
    let n = name.len().min(bufsize - 1);
    ptr::copy_nonoverlapping(name.as_ptr(), buf.cast(), n);
    *buf.add(n) = 0;
    n + 1
}

/// First entity registered with `name`, or 0 if there is none.
#[no_mangle]
pub unsafe extern "C" fn ecs_find_entity_by_name(
    handle: *mut EcsRegistry,
    name: *const c_char,
) -> EcsEntityId {
    let name = CStr::from_ptr(name).to_string_lossy();
    registry_ref(handle)
        .find_by_name(&name)
        .map(Entity::id)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

/// Register a component under `name`, returning its id (the hash of the
/// name, so re-registering it yields the same id).
///
/// The optional deleter is installed only when the component is first
/// registered; later registrations keep the original deleter. It runs once
/// per payload whenever one is discarded: on overwrite, on removal, and on
/// pool or registry destruction.
#[no_mangle]
pub unsafe extern "C" fn ecs_register_component(
    handle: *mut EcsRegistry,
    name: *const c_char,
    deleter: EcsComponentDeleter,
) -> EcsComponentId {
    let name = CStr::from_ptr(name).to_string_lossy();
    let id = ComponentTypeId::from_name(&name);
    let deleter: Option<BinaryDeleter> = deleter.map(|f| -> BinaryDeleter {
        Box::new(move |bytes: &mut [u8]| unsafe { f(bytes.as_mut_ptr().cast(), bytes.len()) })
    });
    registry_mut(handle).register_binary(id, deleter);
    id.value()
}

/// Drop the whole pool of `component_id`; deleters run per payload.
#[no_mangle]
pub unsafe extern "C" fn ecs_remove_all(handle: *mut EcsRegistry, component_id: EcsComponentId) {
    registry_mut(handle).remove_all_binary(component(component_id));
}

/// Store a payload for `(entity, component_id)`.
///
/// The first payload stored into a pool fixes the pool's payload size; any
/// later payload of a different size fails with -1 and mutates nothing.
/// Overwriting an existing payload passes the old bytes to the deleter
/// first. Returns 0 on success.
#[no_mangle]
pub unsafe extern "C" fn ecs_store(
    handle: *mut EcsRegistry,
    entity: EcsEntityId,
    component_id: EcsComponentId,
    data: *const c_void,
    size: usize,
) -> c_int {
    let payload = if size == 0 {
        &[][..]
    } else {
        std::slice::from_raw_parts(data.cast::<u8>(), size)
    };
    match registry_mut(handle).store(Entity::from_id(entity), component(component_id), payload) {
        Ok(_) => 0,
        Err(_) => -1,
    }
}

/// Shared pointer to the payload of `(entity, component_id)`, or null.
/// Valid until the payload is removed or its pool mutates.
#[no_mangle]
pub unsafe extern "C" fn ecs_get(
    handle: *const EcsRegistry,
    entity: EcsEntityId,
    component_id: EcsComponentId,
) -> *const c_void {
    registry_ref(handle)
        .binary(Entity::from_id(entity), component(component_id))
        .map(|row| row.as_ptr().cast())
        .unwrap_or(ptr::null())
}

/// Mutable pointer to the payload of `(entity, component_id)`, or null.
#[no_mangle]
pub unsafe extern "C" fn ecs_get_mut(
    handle: *mut EcsRegistry,
    entity: EcsEntityId,
    component_id: EcsComponentId,
) -> *mut c_void {
    registry_mut(handle)
        .binary_mut(Entity::from_id(entity), component(component_id))
        .map(|row| row.as_mut_ptr().cast())
        .unwrap_or(ptr::null_mut())
}

/// Remove the payload of `(entity, component_id)` if present (deleter
/// runs).
#[no_mangle]
pub unsafe extern "C" fn ecs_remove(
    handle: *mut EcsRegistry,
    entity: EcsEntityId,
    component_id: EcsComponentId,
) {
    registry_mut(handle).remove_binary(Entity::from_id(entity), component(component_id));
}

/// 1 if the entity has a payload for every listed component, else 0.
#[no_mangle]
pub unsafe extern "C" fn ecs_has(
    handle: *const EcsRegistry,
    entity: EcsEntityId,
    component_count: c_int,
    components: *const EcsComponentId,
) -> c_int {
    let reg = registry_ref(handle);
    let entity = Entity::from_id(entity);
    let ids = std::slice::from_raw_parts(components, component_count.max(0) as usize);
    for &id in ids {
        let present = reg
            .binary_pool(component(id))
            .map(|pool| pool.contains(entity))
            .unwrap_or(false);
        if !present {
            return 0;
        }
    }
    1
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

unsafe fn view_pools<'a>(
    reg: &'a Registry,
    component_count: c_int,
    components: *const EcsComponentId,
) -> Result<Option<(Vec<&'a BinaryPool>, usize)>, c_int> {
    let n = component_count as usize;
    if component_count < 1 || n > ECS_MAX_COMPONENT_COUNT_IN_VIEW {
        return Err(-1);
    }
    let ids = std::slice::from_raw_parts(components, n);
    let mut pools = Vec::with_capacity(n);
    for &id in ids {
        match reg.binary_pool(component(id)) {
            Some(pool) => pools.push(pool),
            // An unregistered component joins as the empty pool.
            None => return Ok(None),
        }
    }
    let mut driver = 0;
    for (i, pool) in pools.iter().enumerate() {
        if pool.len() < pools[driver].len() {
            driver = i;
        }
    }
    Ok(Some((pools, driver)))
}

/// Invoke `callback` once per entity holding all listed components, with
/// an array of `component_count` read-only payload pointers.
///
/// Iteration is driven by the smallest pool. A nonzero callback return
/// aborts the walk and becomes this function's return value. Returns -1
/// when `component_count` is out of `1..=ECS_MAX_COMPONENT_COUNT_IN_VIEW`
/// or `callback` is null, 0 otherwise.
#[no_mangle]
pub unsafe extern "C" fn ecs_view_iterate(
    handle: *const EcsRegistry,
    component_count: c_int,
    components: *const EcsComponentId,
    callback: EcsViewCallback,
    context: *mut c_void,
) -> c_int {
    let Some(callback) = callback else {
        return -1;
    };
    let reg = registry_ref(handle);
    let (pools, driver) = match view_pools(reg, component_count, components) {
        Err(rc) => return rc,
        Ok(None) => return 0,
        Ok(Some(found)) => found,
    };

    let mut data = [ptr::null::<c_void>(); ECS_MAX_COMPONENT_COUNT_IN_VIEW];
    'rows: for pos in 0..pools[driver].len() {
        let Some(entity) = pools[driver].entity_at(pos) else {
            break;
        };
        for (i, pool) in pools.iter().enumerate() {
            match pool.get(entity) {
                Some(row) => data[i] = row.as_ptr().cast(),
                None => continue 'rows,
            }
        }
        let rc = callback(entity.id(), data.as_ptr(), context);
        if rc != 0 {
            return rc;
        }
    }
    0
}

/// [`ecs_view_iterate`] with mutable payload pointers. Listing the same
/// component twice hands the callback two pointers to the same payload;
/// writing through both is the caller's hazard.
#[no_mangle]
pub unsafe extern "C" fn ecs_view_iterate_mut(
    handle: *mut EcsRegistry,
    component_count: c_int,
    components: *const EcsComponentId,
    callback: EcsViewCallbackMut,
    context: *mut c_void,
) -> c_int {
    let Some(callback) = callback else {
        return -1;
    };
    let n = component_count as usize;
    if component_count < 1 || n > ECS_MAX_COMPONENT_COUNT_IN_VIEW {
        return -1;
    }
    let reg = registry_mut(handle);
    let ids = std::slice::from_raw_parts(components, n);
    let mut pools: Vec<*mut BinaryPool> = Vec::with_capacity(n);
    for &id in ids {
        match reg.binary_pool_mut(component(id)) {
            Some(pool) => pools.push(pool),
            None => return 0,
        }
    }
    let mut driver = 0;
    for (i, &pool) in pools.iter().enumerate() {
        if (*pool).len() < (*pools[driver]).len() {
            driver = i;
        }
    }

    let mut data = [ptr::null_mut::<c_void>(); ECS_MAX_COMPONENT_COUNT_IN_VIEW];
    'rows: for pos in 0..(*pools[driver]).len() {
        let Some(entity) = (*pools[driver]).entity_at(pos) else {
            break;
        };
        for (i, &pool) in pools.iter().enumerate() {
            match (*pool).get_mut(entity) {
                Some(row) => data[i] = row.as_mut_ptr().cast(),
                None => continue 'rows,
            }
        }
        let rc = callback(entity.id(), data.as_mut_ptr(), context);
        if rc != 0 {
            return rc;
        }
    }
    0
}

/// Reorganize the listed pools so entities present in all of them form a
/// sorted contiguous block in each, making joined iteration sequential.
///
/// Returns 1 when the pools were grouped, 0 when there is nothing to group
/// (no shared entities, or an unregistered component), -1 when
/// `component_count` is out of range.
#[no_mangle]
pub unsafe extern "C" fn ecs_group(
    handle: *mut EcsRegistry,
    component_count: c_int,
    components: *const EcsComponentId,
) -> c_int {
    let n = component_count as usize;
    if component_count < 1 || n > ECS_MAX_COMPONENT_COUNT_IN_VIEW {
        return -1;
    }
    let ids: Vec<ComponentTypeId> = std::slice::from_raw_parts(components, n)
        .iter()
        .map(|&id| component(id))
        .collect();
    if registry_mut(handle).group_binary(&ids) {
        1
    } else {
        0
    }
}

// ---------------------------------------------------------------------------
// Locking
// ---------------------------------------------------------------------------

/// Acquire the handle's lock exclusively (for writes).
#[no_mangle]
pub unsafe extern "C" fn ecs_lock_registry(handle: *mut EcsRegistry) {
    (*handle).lock.lock_exclusive();
}

/// Release the exclusive lock.
#[no_mangle]
pub unsafe extern "C" fn ecs_unlock_registry(handle: *mut EcsRegistry) {
    (*handle).lock.unlock_exclusive();
}

/// Acquire the handle's lock shared (for reads).
#[no_mangle]
pub unsafe extern "C" fn ecs_lock_registry_shared(handle: *mut EcsRegistry) {
    (*handle).lock.lock_shared();
}

/// Release the shared lock.
#[no_mangle]
pub unsafe extern "C" fn ecs_unlock_registry_shared(handle: *mut EcsRegistry) {
    (*handle).lock.unlock_shared();
}
