use alloc::boxed::Box;
use core::fmt;
use core::mem::ManuallyDrop;
use core::ops::{Deref, DerefMut};
use core::ptr::NonNull;

/// A value given up by [`CloningPtr::release`](crate::CloningPtr::release).
///
/// The value keeps its address and is no longer tied to any control block.
/// Dropping a `Released` destroys the value through the deleter of the
/// [`Policy`](crate::Policy) that owned it.
///
/// # Examples
///
/// ```
/// use pv_ptr::CloningPtr;
///
/// let mut ptr = CloningPtr::<String>::new(String::from("kept"));
/// let released = ptr.release().unwrap();
/// assert!(ptr.is_null());
///
/// let boxed: Box<String> = released.into_box().unwrap();
/// assert_eq!(*boxed, "kept");
/// ```
pub struct Released<T: ?Sized> {
    ptr: NonNull<T>,
    free: Option<Box<dyn FnOnce()>>,
    boxed: bool,
}

impl<T: ?Sized> Released<T> {
    /// # Safety
    ///
    /// `ptr` must address a valid value that `free` destroys. If `boxed`,
    /// `ptr` must come from a `Box<T>` and `free` must be skippable.
    #[inline]
    pub(crate) unsafe fn new(ptr: NonNull<T>, free: Box<dyn FnOnce()>, boxed: bool) -> Self {
        Self {
            ptr,
            free: Some(free),
            boxed,
        }
    }

    /// Reinterprets the pointer, keeping the deleter.
    ///
    /// `cast` must return a pointer to the same value.
    #[inline]
    pub(crate) fn map<V: ?Sized>(
        self,
        cast: impl FnOnce(NonNull<T>) -> NonNull<V>,
    ) -> Released<V> {
        let mut this = ManuallyDrop::new(self);
        Released {
            ptr: cast(this.ptr),
            free: this.free.take(),
            boxed: this.boxed,
        }
    }

    /// Returns the address of the value.
    #[inline(always)]
    pub fn as_ptr(&self) -> NonNull<T> {
        self.ptr
    }

    /// Returns `true` if the value lives in a [`Box`].
    #[inline(always)]
    pub fn is_boxed(&self) -> bool {
        self.boxed
    }

    /// Converts into a [`Box`] if the value was allocated by one.
    ///
    /// The deleter is skipped. Values from custom allocations are returned
    /// unchanged in `Err`.
    pub fn into_box(self) -> Result<Box<T>, Self> {
        if !self.boxed {
            return Err(self);
        }
        let mut this = ManuallyDrop::new(self);
        drop(this.free.take());
        // SAFETY: `boxed` promises a `Box` allocation.
        Ok(unsafe { Box::from_raw(this.ptr.as_ptr()) })
    }

    /// Gives up the value without destroying it.
    ///
    /// The caller becomes responsible for disposing of it the way its
    /// allocator requires.
    pub fn into_raw(self) -> NonNull<T> {
        let mut this = ManuallyDrop::new(self);
        drop(this.free.take());
        this.ptr
    }
}

impl<T: ?Sized> Drop for Released<T> {
    fn drop(&mut self) {
        if let Some(free) = self.free.take() {
            free();
        }
    }
}

impl<T: ?Sized> Deref for Released<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        // SAFETY: the value lives until `free` runs.
        unsafe { self.ptr.as_ref() }
    }
}

impl<T: ?Sized> DerefMut for Released<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: see `deref`, `self` is the only owner.
        unsafe { self.ptr.as_mut() }
    }
}

impl<T: ?Sized> fmt::Debug for Released<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Released").field(&self.ptr).finish()
    }
}
