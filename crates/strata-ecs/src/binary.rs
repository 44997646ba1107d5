//! Fixed-stride binary component pool.
//!
//! The C ABI stores components as opaque `(pointer, size)` payloads. This
//! pool is the [`IndexedFlatMap`](crate::flat_map::IndexedFlatMap)
//! specialization for that shape: one flat byte vector holding equally
//! sized rows instead of a `Vec` of typed values. The first insert into an
//! empty pool fixes the row size; payloads of any other size are rejected
//! without mutating the pool.
//!
//! An optional deleter runs once per row whenever a row's bytes are
//! discarded: on remove, on replacement, on `clear`, and when the pool is
//! dropped. Reorganization ([`regroup`](BinaryPool::regroup)) moves rows
//! between buffers and does not invoke it.

use crate::component::ComponentTypeId;
use crate::entity::Entity;
use crate::open_map::OpenHashMap;
use crate::pool::ErasedPool;
use crate::{any_ref, EcsError};

/// Callback invoked on a row's bytes as they are discarded.
pub type BinaryDeleter = Box<dyn FnMut(&mut [u8])>;

/// Pool of fixed-size opaque byte rows keyed by entity.
pub struct BinaryPool {
    stride: usize,
    keys: Vec<Entity>,
    bytes: Vec<u8>,
    index: OpenHashMap<Entity, usize>,
    deleter: Option<BinaryDeleter>,
}

impl BinaryPool {
    /// Directory type id shared by every binary pool. The externally
    /// supplied component id becomes the pool key's variant.
    pub const TYPE_ID: ComponentTypeId = ComponentTypeId::from_name("strata::BinaryPool");

    /// Create an empty pool. The row size is fixed by the first insert.
    pub fn new() -> Self {
        Self {
            stride: 0,
            keys: Vec::new(),
            bytes: Vec::new(),
            index: OpenHashMap::new(),
            deleter: None,
        }
    }

    /// Install or clear the row deleter.
    pub fn set_deleter(&mut self, deleter: Option<BinaryDeleter>) {
        self.deleter = deleter;
    }

    /// The fixed row size. Zero until the first insert.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the pool holds no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Whether `entity` has a row.
    pub fn contains(&self, entity: Entity) -> bool {
        self.index.contains_key(&entity)
    }

    /// Position of `entity` in row order.
    #[inline]
    pub fn position(&self, entity: Entity) -> Option<usize> {
        self.index.get(&entity).copied()
    }

    /// Entity owning the row at `pos`.
    #[inline]
    pub fn entity_at(&self, pos: usize) -> Option<Entity> {
        self.keys.get(pos).copied()
    }

    #[inline]
    fn row_span(&self, pos: usize) -> std::ops::Range<usize> {
        pos * self.stride..(pos + 1) * self.stride
    }

    /// Row bytes at `pos`.
    pub fn row_at(&self, pos: usize) -> Option<&[u8]> {
        if pos < self.keys.len() {
            Some(&self.bytes[self.row_span(pos)])
        } else {
            None
        }
    }

    /// Mutable row bytes at `pos`.
    pub fn row_at_mut(&mut self, pos: usize) -> Option<&mut [u8]> {
        if pos < self.keys.len() {
            let span = self.row_span(pos);
            Some(&mut self.bytes[span])
        } else {
            None
        }
    }

    /// Row bytes for `entity`.
    pub fn get(&self, entity: Entity) -> Option<&[u8]> {
        let pos = self.position(entity)?;
        Some(&self.bytes[self.row_span(pos)])
    }

    /// Mutable row bytes for `entity`.
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut [u8]> {
        let pos = self.position(entity)?;
        let span = self.row_span(pos);
        Some(&mut self.bytes[span])
    }

    /// Store a payload for `entity`.
    ///
    /// Returns `Ok(true)` when a row was created and `Ok(false)` when an
    /// existing row was overwritten (its old bytes go through the deleter
    /// first). A payload whose size disagrees with the pool's fixed stride
    /// is rejected and nothing changes.
    pub fn store(&mut self, entity: Entity, payload: &[u8]) -> Result<bool, EcsError> {
        if let Some(pos) = self.position(entity) {
            if payload.len() != self.stride {
                return Err(EcsError::BinarySizeMismatch {
                    expected: self.stride,
                    found: payload.len(),
                });
            }
            let span = self.row_span(pos);
            if let Some(deleter) = &mut self.deleter {
                deleter(&mut self.bytes[span.clone()]);
            }
            self.bytes[span].copy_from_slice(payload);
            return Ok(false);
        }

        if self.keys.is_empty() {
            self.stride = payload.len();
        } else if payload.len() != self.stride {
            return Err(EcsError::BinarySizeMismatch {
                expected: self.stride,
                found: payload.len(),
            });
        }
        let pos = self.keys.len();
        self.keys.push(entity);
        self.bytes.extend_from_slice(payload);
        self.index.insert(entity, pos);
        Ok(true)
    }

    /// Remove the entity's row, invoking the deleter on its bytes. The
    /// trailing row is swapped into the gap.
    pub fn remove(&mut self, entity: Entity) -> bool {
        let Some(pos) = self.index.remove(&entity) else {
            return false;
        };
        let last = self.keys.len() - 1;
        let span = self.row_span(pos);
        if let Some(deleter) = &mut self.deleter {
            deleter(&mut self.bytes[span]);
        }
        self.keys.swap_remove(pos);
        if pos != last {
            if self.stride > 0 {
                self.bytes
                    .copy_within(last * self.stride..(last + 1) * self.stride, pos * self.stride);
            }
            self.index.insert(self.keys[pos], pos);
        }
        self.bytes.truncate(last * self.stride);
        true
    }

    /// Pre-allocate room for `additional` more rows.
    pub fn reserve(&mut self, additional: usize) {
        self.keys.reserve(additional);
        self.bytes.reserve(additional * self.stride);
    }

    /// Drop every row, invoking the deleter on each. The stride resets with
    /// the next insert into the now-empty pool.
    pub fn clear(&mut self) {
        if let Some(deleter) = &mut self.deleter {
            if self.stride > 0 {
                for row in self.bytes.chunks_exact_mut(self.stride) {
                    deleter(row);
                }
            } else {
                for _ in &self.keys {
                    deleter(&mut []);
                }
            }
        }
        self.keys.clear();
        self.bytes.clear();
        self.index.clear();
    }

    /// Iterate `(entity, row)` pairs in row order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &[u8])> {
        self.keys
            .iter()
            .enumerate()
            .map(|(pos, e)| (*e, &self.bytes[pos * self.stride..(pos + 1) * self.stride]))
    }

    /// Rebuild the pool so that `matched` (sorted ascending) occupies a
    /// contiguous block starting at `start`; same contract as the typed
    /// pool's regroup. Rows move between buffers, the deleter is not run.
    pub(crate) fn regroup(mut self, start: usize, matched: &[Entity]) -> Self {
        let mut out = BinaryPool {
            stride: self.stride,
            keys: Vec::with_capacity(self.keys.len()),
            bytes: Vec::with_capacity(self.bytes.len()),
            index: OpenHashMap::new(),
            deleter: self.deleter.take(),
        };

        let push = |out: &mut BinaryPool, entity: Entity, pos: usize| {
            let row = pos * self.stride..(pos + 1) * self.stride;
            let new_pos = out.keys.len();
            out.keys.push(entity);
            out.bytes.extend_from_slice(&self.bytes[row]);
            out.index.insert(entity, new_pos);
        };

        for pos in 0..start.min(self.keys.len()) {
            push(&mut out, self.keys[pos], pos);
        }
        for &entity in matched {
            if let Some(pos) = self.index.get(&entity).copied() {
                push(&mut out, entity, pos);
            }
        }
        for pos in start..self.keys.len() {
            if matched.binary_search(&self.keys[pos]).is_err() {
                push(&mut out, self.keys[pos], pos);
            }
        }
        out
    }
}

impl Default for BinaryPool {
    fn default() -> Self {
        Self::new()
    }
}

// The deleter owns whatever the rows point at; releasing the pool releases
// every row through it.
impl Drop for BinaryPool {
    fn drop(&mut self) {
        self.clear();
    }
}

impl std::fmt::Debug for BinaryPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinaryPool")
            .field("stride", &self.stride)
            .field("len", &self.keys.len())
            .field("has_deleter", &self.deleter.is_some())
            .finish()
    }
}

impl ErasedPool for BinaryPool {
    fn erase(&mut self, entity: Entity) -> bool {
        self.remove(entity)
    }

    fn len(&self) -> usize {
        self.keys.len()
    }

    fn contains(&self, entity: Entity) -> bool {
        self.index.contains_key(&entity)
    }

    // Rows are raw bytes, not Rust values; there is no type to fingerprint.
    fn entity_ref(&mut self, _entity: Entity) -> Option<any_ref::AnyRef<'_>> {
        None
    }

    fn entity_ref_const(&self, _entity: Entity) -> Option<any_ref::ConstAnyRef<'_>> {
        None
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn std::any::Any> {
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

    #[test]
    fn first_insert_fixes_the_stride() {
        let mut pool = BinaryPool::new();
        let e1 = Entity::create();
        let e2 = Entity::create();
        assert_eq!(pool.store(e1, &[1, 2, 3, 4]), Ok(true));
        assert_eq!(pool.stride(), 4);
        assert_eq!(
            pool.store(e2, &[1, 2, 3, 4, 5, 6, 7, 8]),
            Err(EcsError::BinarySizeMismatch {
                expected: 4,
                found: 8
            })
        );
        assert_eq!(pool.get(e2), None);
        assert_eq!(pool.get(e1), Some(&[1u8, 2, 3, 4][..]));
    }

    #[test]
    fn replace_keeps_the_row_position() {
        let mut pool = BinaryPool::new();
        let e1 = Entity::create();
        let e2 = Entity::create();
        pool.store(e1, &[1, 1]).unwrap();
        pool.store(e2, &[2, 2]).unwrap();
        assert_eq!(pool.store(e1, &[9, 9]), Ok(false));
        let rows: Vec<(Entity, Vec<u8>)> = pool.iter().map(|(e, r)| (e, r.to_vec())).collect();
        assert_eq!(rows, vec![(e1, vec![9, 9]), (e2, vec![2, 2])]);
    }

    #[test]
    fn remove_swaps_the_tail_row() {
        let mut pool = BinaryPool::new();
        let es: Vec<Entity> = (0..4).map(|_| Entity::create()).collect();
        for (i, &e) in es.iter().enumerate() {
            pool.store(e, &[i as u8; 2]).unwrap();
        }
        assert!(pool.remove(es[1]));
        assert!(!pool.remove(es[1]));
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.get(es[3]), Some(&[3u8, 3][..]));
        assert_eq!(pool.position(es[3]), Some(1));
    }

    #[test]
    fn deleter_runs_once_per_discarded_row() {
        let hits = Rc::new(Cell::new(0));
        let mut pool = BinaryPool::new();
        let counter = hits.clone();
        pool.set_deleter(Some(Box::new(move |_row| {
            counter.set(counter.get() + 1);
        })));

        let e1 = Entity::create();
        let e2 = Entity::create();
        pool.store(e1, &[1]).unwrap();
        pool.store(e2, &[2]).unwrap();
        pool.store(e1, &[3]).unwrap(); // replacement: old row deleted
        assert_eq!(hits.get(), 1);
        pool.remove(e1);
        assert_eq!(hits.get(), 2);
        drop(pool); // remaining row deleted on drop
        assert_eq!(hits.get(), 3);
    }

    #[test]
    fn stride_refixes_after_the_pool_empties() {
        let mut pool = BinaryPool::new();
        let e = Entity::create();
        pool.store(e, &[1, 2]).unwrap();
        pool.remove(e);
        assert!(pool.is_empty());
        assert_eq!(pool.store(e, &[1, 2, 3]), Ok(true));
        assert_eq!(pool.stride(), 3);
    }

    #[test]
    fn regroup_moves_rows_without_the_deleter() {
        let hits = Rc::new(Cell::new(0));
        let mut pool = BinaryPool::new();
        let counter = hits.clone();
        pool.set_deleter(Some(Box::new(move |_| {
            counter.set(counter.get() + 1);
        })));

        let es: Vec<Entity> = (0..4).map(|_| Entity::create()).collect();
        for (i, &e) in es.iter().enumerate() {
            pool.store(e, &[i as u8]).unwrap();
        }
        let mut matched = vec![es[3], es[1]];
        matched.sort_unstable();
        let pool = pool.regroup(1, &matched);
        assert_eq!(hits.get(), 0);
        let order: Vec<Entity> = pool.iter().map(|(e, _)| e).collect();
        assert_eq!(order, vec![es[0], es[1], es[3], es[2]]);
        assert_eq!(pool.get(es[3]), Some(&[3u8][..]));
        drop(pool);
        assert_eq!(hits.get(), 4, "deleter still owned by the rebuilt pool");
    }
}
