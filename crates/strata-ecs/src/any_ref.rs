//! Non-owning type-erased references tagged with a type fingerprint.
//!
//! [`AnyRef`] and [`ConstAnyRef`] are the loan types handed out by the
//! type-erased pool interface: a raw pointer paired with the
//! [`TypeFingerprint`] of the referent. Downcasting compares fingerprints
//! rather than using `TypeId`, so the same identity scheme works across the
//! C ABI where no Rust type information exists.
//!
//! # Safety
//!
//! This module is the only place (besides FFI) where raw pointers are
//! dereferenced. Soundness rests on two facts:
//!
//! - a reference can only be constructed from a live `&T` / `&mut T`, and
//!   the borrow lifetime is carried through `PhantomData`, so the pointer
//!   cannot outlive the pool slot it points at;
//! - a downcast only dereferences after the fingerprint matched. Fingerprints
//!   are 64-bit FNV over the full type path; distinct types colliding is
//!   unsupported (see [`crate::component`]).

use std::marker::PhantomData;

use crate::component::TypeFingerprint;

// ---------------------------------------------------------------------------
// AnyRef
// ---------------------------------------------------------------------------

/// A type-erased mutable reference.
pub struct AnyRef<'a> {
    ptr: *mut (),
    fingerprint: TypeFingerprint,
    _borrow: PhantomData<&'a mut ()>,
}

impl<'a> AnyRef<'a> {
    /// Erase a mutable reference.
    pub fn new<T: 'static>(value: &'a mut T) -> Self {
        Self {
            ptr: (value as *mut T).cast(),
            fingerprint: TypeFingerprint::of::<T>(),
            _borrow: PhantomData,
        }
    }

    /// Fingerprint of the referent's type.
    #[inline]
    pub fn fingerprint(&self) -> TypeFingerprint {
        self.fingerprint
    }

    /// Whether the referent is a `T`.
    #[inline]
    pub fn is<T: 'static>(&self) -> bool {
        self.fingerprint == TypeFingerprint::of::<T>()
    }

    /// Shared access to the referent, or `None` on a fingerprint mismatch.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        if self.is::<T>() {
            Some(unsafe { &*self.ptr.cast::<T>() })
        } else {
            None
        }
    }

    /// Mutable access to the referent, or `None` on a fingerprint mismatch.
    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        if self.is::<T>() {
            Some(unsafe { &mut *self.ptr.cast::<T>() })
        } else {
            None
        }
    }

    /// Consume the erased reference, recovering the full-lifetime `&'a mut T`.
    pub fn into_mut<T: 'static>(self) -> Option<&'a mut T> {
        if self.is::<T>() {
            Some(unsafe { &mut *self.ptr.cast::<T>() })
        } else {
            None
        }
    }
}

impl std::fmt::Debug for AnyRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AnyRef").field(&self.fingerprint).finish()
    }
}

// ---------------------------------------------------------------------------
// ConstAnyRef
// ---------------------------------------------------------------------------

/// A type-erased shared reference.
#[derive(Clone, Copy)]
pub struct ConstAnyRef<'a> {
    ptr: *const (),
    fingerprint: TypeFingerprint,
    _borrow: PhantomData<&'a ()>,
}

impl<'a> ConstAnyRef<'a> {
    /// Erase a shared reference.
    pub fn new<T: 'static>(value: &'a T) -> Self {
        Self {
            ptr: (value as *const T).cast(),
            fingerprint: TypeFingerprint::of::<T>(),
            _borrow: PhantomData,
        }
    }

    /// Fingerprint of the referent's type.
    #[inline]
    pub fn fingerprint(&self) -> TypeFingerprint {
        self.fingerprint
    }

    /// Whether the referent is a `T`.
    #[inline]
    pub fn is<T: 'static>(&self) -> bool {
        self.fingerprint == TypeFingerprint::of::<T>()
    }

    /// Shared access to the referent, or `None` on a fingerprint mismatch.
    /// The returned reference lives as long as the original borrow.
    pub fn downcast_ref<T: 'static>(self) -> Option<&'a T> {
        if self.is::<T>() {
            Some(unsafe { &*self.ptr.cast::<T>() })
        } else {
            None
        }
    }
}

impl<'a> From<AnyRef<'a>> for ConstAnyRef<'a> {
    fn from(any: AnyRef<'a>) -> Self {
        Self {
            ptr: any.ptr.cast_const(),
            fingerprint: any.fingerprint,
            _borrow: PhantomData,
        }
    }
}

impl std::fmt::Debug for ConstAnyRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ConstAnyRef").field(&self.fingerprint).finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
