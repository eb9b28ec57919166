use core::fmt;
use core::ops::Deref;
use core::ptr::NonNull;

/// A value that can only be observed through shared references.
///
/// `CloningPtr<ReadOnly<T>>` is the read-only counterpart of `CloningPtr<T>`:
/// it derefs to `&T` but never hands out `&mut T`. The pointer itself still
/// hands out `&mut ReadOnly<T>`, so a sized pointee can be replaced as a
/// whole with `*ptr = ReadOnly::new(..)`.
/// [`const_cast`](crate::cast::const_cast) and
/// [`read_only_cast`](crate::cast::read_only_cast) convert between the two.
///
/// # Examples
///
/// ```
/// use pv_ptr::{CloningPtr, ReadOnly};
///
/// let ptr = CloningPtr::<ReadOnly<String>>::new(ReadOnly::new(String::from("abc")));
/// assert_eq!(ptr.len(), 3);
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ReadOnly<T: ?Sized>(T);

impl<T> ReadOnly<T> {
    /// Wraps a value.
    #[inline(always)]
    pub const fn new(value: T) -> Self {
        Self(value)
    }

    /// Unwraps the value.
    #[inline(always)]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: ?Sized> ReadOnly<T> {
    /// Adds the read-only marker to a pointer.
    #[inline(always)]
    pub(crate) const fn wrap_ptr(ptr: NonNull<T>) -> NonNull<Self> {
        // SAFETY: `repr(transparent)`, same address and metadata, never null.
        unsafe { NonNull::new_unchecked(ptr.as_ptr() as *mut Self) }
    }

    /// Removes the read-only marker from a pointer.
    #[inline(always)]
    pub(crate) const fn unwrap_ptr(ptr: NonNull<Self>) -> NonNull<T> {
        // SAFETY: see `wrap_ptr`.
        unsafe { NonNull::new_unchecked(ptr.as_ptr() as *mut T) }
    }
}

impl<T: ?Sized> Deref for ReadOnly<T> {
    type Target = T;

    #[inline(always)]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for ReadOnly<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}
