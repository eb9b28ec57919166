use alloc::boxed::Box;
use core::ptr::NonNull;

use crate::CopyError;

// -----------------------------------------------------------------------------
// Copier

/// Produces an independent deep copy of a `U`.
///
/// The returned pointer becomes the allocation of the copy. It is later
/// handed to the [`Deleter`] of the same [`Policy`], directly or through a
/// [`Released`](crate::Released) value.
///
/// Implementing this trait is safe: pointers of an arbitrary copier are only
/// trusted by [`CloningPtr::from_raw_with`](crate::CloningPtr::from_raw_with),
/// whose caller vouches for them.
///
/// Closures `Fn(&U) -> Result<Box<U>, CopyError>` implement this trait and
/// [`BoxCopier`].
pub trait Copier<U> {
    fn copy(&self, value: &U) -> Result<NonNull<U>, CopyError>;
}

/// A [`Copier`] whose pointers come from [`Box::into_raw`].
///
/// # Safety
///
/// Every pointer returned by [`copy`](Copier::copy) must come from
/// `Box::into_raw` and must not be used by the copier afterwards.
pub unsafe trait BoxCopier<U>: Copier<U> {}

/// Copies through [`Clone`] into a [`Box`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DefaultCopy;

impl<U: Clone> Copier<U> for DefaultCopy {
    #[inline]
    fn copy(&self, value: &U) -> Result<NonNull<U>, CopyError> {
        Ok(NonNull::from(Box::leak(Box::new(value.clone()))))
    }
}

// SAFETY: see `copy`.
unsafe impl<U: Clone> BoxCopier<U> for DefaultCopy {}

impl<U, F> Copier<U> for F
where
    F: Fn(&U) -> Result<Box<U>, CopyError>,
{
    #[inline]
    fn copy(&self, value: &U) -> Result<NonNull<U>, CopyError> {
        self(value).map(|copy| NonNull::from(Box::leak(copy)))
    }
}

// SAFETY: see `copy`.
unsafe impl<U, F> BoxCopier<U> for F where F: Fn(&U) -> Result<Box<U>, CopyError> {}

// -----------------------------------------------------------------------------
// Deleter

/// Disposes of a `U` owned by a [`CloningPtr`](crate::CloningPtr).
///
/// Closures `Fn(Box<U>)` implement this trait and [`BoxDeleter`].
pub trait Deleter<U> {
    /// Destroys the value and frees its allocation.
    ///
    /// # Safety
    ///
    /// `ptr` must come from the [`Copier`] of the same [`Policy`] or have been
    /// adopted together with it, and must not be used afterwards.
    unsafe fn delete(&self, ptr: NonNull<U>);
}

/// A [`Deleter`] that frees pointers from [`Box::into_raw`].
///
/// # Safety
///
/// [`delete`](Deleter::delete) must accept any pointer from `Box::into_raw`.
pub unsafe trait BoxDeleter<U>: Deleter<U> {}

/// Drops the value as a [`Box`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DefaultDelete;

impl<U> Deleter<U> for DefaultDelete {
    #[inline]
    unsafe fn delete(&self, ptr: NonNull<U>) {
        // SAFETY: guaranteed by the caller.
        drop(unsafe { Box::from_raw(ptr.as_ptr()) });
    }
}

// SAFETY: see `delete`.
unsafe impl<U> BoxDeleter<U> for DefaultDelete {}

impl<U, F> Deleter<U> for F
where
    F: Fn(Box<U>),
{
    #[inline]
    unsafe fn delete(&self, ptr: NonNull<U>) {
        // SAFETY: guaranteed by the caller.
        self(unsafe { Box::from_raw(ptr.as_ptr()) });
    }
}

// SAFETY: see `delete`.
unsafe impl<U, F> BoxDeleter<U> for F where F: Fn(Box<U>) {}

// -----------------------------------------------------------------------------
// Policy

/// How the concrete value behind a [`CloningPtr`](crate::CloningPtr) is
/// copied and disposed of.
///
/// The policy lives next to the owned value and is cloned into every copy,
/// so all clones of a pointer share the same strategy.
///
/// Policies built from [`BoxCopier`] and [`BoxDeleter`] work with the safe
/// constructors. Any other pair, such as one allocating from an arena, is
/// adopted through the unsafe
/// [`CloningPtr::from_raw_with`](crate::CloningPtr::from_raw_with).
///
/// # Examples
///
/// ```
/// use pv_ptr::{CloningPtr, CopyError, DefaultDelete, Policy};
///
/// let policy = Policy::new(
///     |v: &Vec<u8>| {
///         if v.len() > 4 {
///             Err(CopyError::failed::<Vec<u8>>("too large"))
///         } else {
///             Ok(Box::new(v.clone()))
///         }
///     },
///     DefaultDelete,
/// );
///
/// let small = CloningPtr::<Vec<u8>>::new_with(vec![1, 2], policy.clone());
/// assert!(small.try_clone().is_ok());
///
/// let large = CloningPtr::<Vec<u8>>::new_with(vec![0; 8], policy);
/// assert!(large.try_clone().is_err());
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct Policy<C = DefaultCopy, D = DefaultDelete> {
    pub copier: C,
    pub deleter: D,
}

impl<C, D> Policy<C, D> {
    #[inline]
    pub const fn new(copier: C, deleter: D) -> Self {
        Self { copier, deleter }
    }

    /// Replaces the copier.
    #[inline]
    pub fn with_copier<C2>(self, copier: C2) -> Policy<C2, D> {
        Policy {
            copier,
            deleter: self.deleter,
        }
    }

    /// Replaces the deleter.
    #[inline]
    pub fn with_deleter<D2>(self, deleter: D2) -> Policy<C, D2> {
        Policy {
            copier: self.copier,
            deleter,
        }
    }
}
