use alloc::boxed::Box;
use core::any::{Any, type_name};
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::ops::{Deref, DerefMut};
use core::ptr::NonNull;

use crate::block::{BoxedBlock, CastMode, ConcreteBlock, DelegatingBlock, Widen};
use crate::{
    BoxCopier, BoxDeleter, Copier, CopyError, DefaultCopy, DefaultDelete, Deleter, Policy, Released,
    TypeMismatch, Upcast,
};

// -----------------------------------------------------------------------------
// CloningPtr

/// An owning pointer with value semantics for polymorphic objects.
///
/// `CloningPtr<T>` behaves like an optional `Box<T>` that can be cloned even
/// when `T` is a trait object: cloning copies the pointee through its
/// dynamic type, so a `CloningPtr<dyn Shape>` holding a `Square` clones into
/// another `Square`.
///
/// # Ownership
///
/// The pointer owns a chain of control blocks. The last block holds the
/// allocation and the [`Policy`] used to copy and dispose of it, the others
/// are created by casts and only reinterpret the pointer.
///
/// # Methods
///
/// Observers and modifiers such as `get`, `release` or `take` are inherent
/// methods and take precedence over pointee methods of the same name, call
/// those through `(*ptr).get()`.
///
/// # Identity
///
/// Comparisons, ordering and hashing use the address of the pointee, never
/// its value. An empty pointer has address `0`. Zero-sized pointees share
/// their dangling address, so their clones compare equal.
///
/// # Threads
///
/// The pointer is neither `Send` nor `Sync`.
///
/// # Examples
///
/// ```
/// # #![allow(unsafe_code)]
/// use pv_ptr::{CloningPtr, impl_upcast};
///
/// trait Counter {
///     fn count(&self) -> u32;
///     fn bump(&mut self);
/// }
///
/// #[derive(Clone)]
/// struct Simple(u32);
///
/// impl Counter for Simple {
///     fn count(&self) -> u32 {
///         self.0
///     }
///
///     fn bump(&mut self) {
///         self.0 += 1;
///     }
/// }
///
/// impl_upcast!(Simple => dyn Counter);
///
/// let mut a = CloningPtr::<dyn Counter>::new(Simple(7));
/// let b = a.clone();
/// a.bump();
///
/// assert_eq!(a.count(), 8);
/// assert_eq!(b.count(), 7);
/// ```
pub struct CloningPtr<T: ?Sized + 'static> {
    ptr: Option<NonNull<T>>,
    block: Option<BoxedBlock<T>>,
}

impl<T: ?Sized + 'static> CloningPtr<T> {
    /// Creates an empty pointer.
    ///
    /// # Examples
    ///
    /// ```
    /// use pv_ptr::CloningPtr;
    ///
    /// let ptr = CloningPtr::<str>::null();
    /// assert!(ptr.is_null());
    /// assert!(ptr.get().is_none());
    /// ```
    #[inline(always)]
    pub const fn null() -> Self {
        Self {
            ptr: None,
            block: None,
        }
    }

    /// Moves `value` to the heap and owns it, copying with [`Clone`].
    ///
    /// # Examples
    ///
    /// ```
    /// use pv_ptr::CloningPtr;
    ///
    /// let ptr = CloningPtr::<Vec<u8>>::new(vec![1, 2, 3]);
    /// assert_eq!(ptr.len(), 3);
    /// ```
    #[inline]
    pub fn new<U>(value: U) -> Self
    where
        U: Upcast<T> + Clone + 'static,
    {
        Self::from_box(Box::new(value))
    }

    /// Moves `value` to the heap and owns it, copying and disposing of it
    /// through `policy`.
    ///
    /// The policy must work with [`Box`] allocations, custom allocations are
    /// adopted with [`from_raw_with`](Self::from_raw_with).
    #[inline]
    pub fn new_with<U, C, D>(value: U, policy: Policy<C, D>) -> Self
    where
        U: Upcast<T> + 'static,
        C: BoxCopier<U> + Clone + 'static,
        D: BoxDeleter<U> + Clone + 'static,
    {
        Self::from_box_with(Box::new(value), policy)
    }

    /// Takes ownership of a boxed value, copying with [`Clone`].
    ///
    /// The pointee keeps its address.
    #[inline]
    pub fn from_box<U>(value: Box<U>) -> Self
    where
        U: Upcast<T> + Clone + 'static,
    {
        Self::from_box_with(value, Policy::new(DefaultCopy, DefaultDelete))
    }

    /// Takes ownership of a boxed value, copying and disposing of it through
    /// `policy`.
    pub fn from_box_with<U, C, D>(value: Box<U>, policy: Policy<C, D>) -> Self
    where
        U: Upcast<T> + 'static,
        C: BoxCopier<U> + Clone + 'static,
        D: BoxDeleter<U> + Clone + 'static,
    {
        Self::from_block(Box::new(ConcreteBlock::from_box(value, policy)))
    }

    /// Takes ownership of a raw pointer, copying with [`Clone`].
    ///
    /// A null pointer gives an empty `CloningPtr`.
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must come from [`Box::into_raw`] and must not be
    /// used afterwards by the caller.
    ///
    /// # Examples
    ///
    /// ```
    /// use pv_ptr::CloningPtr;
    ///
    /// let raw = Box::into_raw(Box::new(5_i64));
    /// let ptr = unsafe { CloningPtr::<i64>::from_raw(raw) };
    /// assert_eq!(ptr.as_ptr().unwrap().as_ptr(), raw);
    ///
    /// let empty = unsafe { CloningPtr::<i64>::from_raw(core::ptr::null_mut::<i64>()) };
    /// assert!(empty.is_null());
    /// ```
    #[inline]
    pub unsafe fn from_raw<U>(ptr: *mut U) -> Self
    where
        U: Upcast<T> + Clone + 'static,
    {
        match NonNull::new(ptr) {
            // SAFETY: guaranteed by the caller.
            Some(ptr) => Self::from_box(unsafe { Box::from_raw(ptr.as_ptr()) }),
            None => Self::null(),
        }
    }

    /// Takes ownership of a raw pointer, copying and disposing of it through
    /// `policy`.
    ///
    /// This is how values from arenas, pools or other custom allocators are
    /// adopted. [`release`](Self::release) hands such values back with the
    /// same deleter, never as a [`Box`]. A null pointer gives an empty
    /// `CloningPtr`.
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must address a valid `U` that the caller owns and
    /// does not use afterwards. `policy.deleter` must be able to free `ptr`
    /// and every pointer `policy.copier` returns, and those pointers must
    /// address valid, exclusively owned values.
    pub unsafe fn from_raw_with<U, C, D>(ptr: *mut U, policy: Policy<C, D>) -> Self
    where
        U: Upcast<T> + 'static,
        C: Copier<U> + Clone + 'static,
        D: Deleter<U> + Clone + 'static,
    {
        match NonNull::new(ptr) {
            Some(ptr) => {
                // SAFETY: guaranteed by the caller.
                let block = unsafe { ConcreteBlock::from_raw(ptr, policy, false) };
                Self::from_block(Box::new(block))
            }
            None => Self::null(),
        }
    }

    /// Takes ownership of a type-erased value whose dynamic type must be
    /// exactly `U`.
    ///
    /// The value is dropped if the types differ.
    ///
    /// # Examples
    ///
    /// ```
    /// use core::any::Any;
    /// use pv_ptr::CloningPtr;
    ///
    /// let value: Box<dyn Any> = Box::new(1_u16);
    /// assert!(CloningPtr::<u32>::try_from_any::<u32>(value).is_err());
    ///
    /// let value: Box<dyn Any> = Box::new(1_u32);
    /// assert_eq!(*CloningPtr::<u32>::try_from_any::<u32>(value).unwrap(), 1);
    /// ```
    pub fn try_from_any<U>(value: Box<dyn Any>) -> Result<Self, TypeMismatch>
    where
        U: Upcast<T> + Clone + 'static,
    {
        match value.downcast::<U>() {
            Ok(value) => Ok(Self::from_box(value)),
            Err(_) => {
                log::debug!("refused to adopt a value that is not a `{}`", type_name::<U>());
                Err(TypeMismatch {
                    expected: type_name::<U>(),
                })
            }
        }
    }

    #[inline]
    pub(crate) fn from_block(block: BoxedBlock<T>) -> Self {
        let this = Self {
            ptr: block.ptr(),
            block: Some(block),
        };
        this.debug_check();
        this
    }

    #[inline]
    pub(crate) fn into_block(self) -> Option<BoxedBlock<T>> {
        self.block
    }

    /// Wraps the chain in a delegating block of mode `M`.
    #[inline]
    pub(crate) fn delegate<U, M>(self) -> CloningPtr<U>
    where
        U: ?Sized + 'static,
        M: CastMode<U, T>,
    {
        match self.block {
            Some(block) => CloningPtr::from_block(Box::new(DelegatingBlock::<U, T, M>::new(block))),
            None => CloningPtr::null(),
        }
    }

    /// Checks that the cached pointer matches the chain.
    #[inline(always)]
    fn debug_check(&self) {
        // Walks the whole chain, keep it out of release builds.
        #[cfg(all(debug_assertions, feature = "debug"))]
        {
            let expected = self.block.as_ref().and_then(|block| block.ptr());
            assert!(
                self.ptr.map(NonNull::addr) == expected.map(NonNull::addr),
                "`CloningPtr<{}>` cached pointer diverged from its control block",
                type_name::<T>(),
            );
        }
    }

    // -------------------------------------------------------------------------
    // Copy

    /// Deep-copies the pointee through its dynamic type.
    ///
    /// An empty pointer copies into an empty pointer. `self` is never
    /// modified, even on failure.
    pub fn try_clone(&self) -> Result<Self, CopyError> {
        let Some(block) = &self.block else {
            return Ok(Self::null());
        };

        match block.clone_block() {
            Ok(block) => {
                let copy = Self::from_block(block);
                #[cfg(all(debug_assertions, feature = "debug"))]
                log::trace!(
                    "cloned `CloningPtr<{}>` from {:#x} to {:#x}",
                    type_name::<T>(),
                    self.addr(),
                    copy.addr(),
                );
                Ok(copy)
            }
            Err(e) => {
                log::warn!("failed to clone `CloningPtr<{}>`: {e}", type_name::<T>());
                Err(e)
            }
        }
    }

    /// Replaces the pointee with a deep copy of `source`'s pointee.
    ///
    /// The copy is made before `self` is touched: on failure `self` keeps
    /// its previous value. An empty `source` empties `self`.
    ///
    /// # Examples
    ///
    /// ```
    /// use pv_ptr::CloningPtr;
    ///
    /// let mut a = CloningPtr::<String>::new(String::from("a"));
    /// let b = CloningPtr::<String>::new(String::from("b"));
    ///
    /// a.try_assign_from(&b).unwrap();
    /// assert_eq!(*a, "b");
    /// assert_ne!(a, b);
    /// ```
    pub fn try_assign_from(&mut self, source: &Self) -> Result<(), CopyError> {
        let copy = source.try_clone()?;
        *self = copy;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Conversions

    /// Converts into a pointer to a base type without copying.
    ///
    /// The existing chain is wrapped, the pointee keeps its address.
    ///
    /// # Examples
    ///
    /// ```
    /// # #![allow(unsafe_code)]
    /// use core::fmt::Debug;
    /// use pv_ptr::{CloningPtr, impl_upcast};
    ///
    /// #[derive(Clone, Debug)]
    /// struct Token(u8);
    ///
    /// impl_upcast!(Token => dyn Debug);
    ///
    /// let ptr = CloningPtr::<Token>::new(Token(3));
    /// let addr = ptr.addr();
    ///
    /// let debug: CloningPtr<dyn Debug> = ptr.upcast();
    /// assert_eq!(debug.addr(), addr);
    /// assert_eq!(format!("{:?}", &*debug), "Token(3)");
    /// ```
    #[inline]
    pub fn upcast<U>(self) -> CloningPtr<U>
    where
        T: Upcast<U>,
        U: ?Sized + 'static,
    {
        self.delegate::<U, Widen>()
    }

    /// Deep-copies the pointee into a pointer to a base type.
    #[inline]
    pub fn try_upcast_clone<U>(&self) -> Result<CloningPtr<U>, CopyError>
    where
        T: Upcast<U>,
        U: ?Sized + 'static,
    {
        Ok(self.try_clone()?.upcast())
    }

    // -------------------------------------------------------------------------
    // Modifiers

    /// Gives up ownership of the pointee and empties `self`.
    ///
    /// The object is not dropped. Dropping the returned [`Released`] frees it
    /// through the deleter of its [`Policy`], [`Released::into_box`] turns
    /// values allocated by a [`Box`] back into one.
    ///
    /// # Examples
    ///
    /// ```
    /// use pv_ptr::CloningPtr;
    ///
    /// let mut ptr = CloningPtr::<String>::new(String::from("owned"));
    /// let addr = ptr.addr();
    ///
    /// let released = ptr.release().unwrap();
    /// assert!(ptr.is_null());
    /// assert_eq!((&*released as *const String).addr(), addr);
    /// assert_eq!(*released, "owned");
    ///
    /// assert!(ptr.release().is_none());
    /// ```
    pub fn release(&mut self) -> Option<Released<T>> {
        let mut block = self.block.take()?;

        #[cfg(all(debug_assertions, feature = "debug"))]
        log::trace!("released `CloningPtr<{}>` at {:#x}", type_name::<T>(), self.addr());

        self.ptr = None;
        block.release()
    }

    /// Drops the pointee and empties `self`.
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::null();
    }

    /// Drops the pointee and takes ownership of `value`.
    #[inline]
    pub fn reset_to<U>(&mut self, value: Box<U>)
    where
        U: Upcast<T> + Clone + 'static,
    {
        *self = Self::from_box(value);
    }

    /// Drops the pointee and takes ownership of a raw pointer.
    ///
    /// Does nothing if `ptr` has the address of the current pointee, so a
    /// pointer never destroys the object it is being reset to. Zero-sized
    /// values share their address and are always adopted. A null pointer
    /// empties `self`.
    ///
    /// # Safety
    ///
    /// See [`from_raw`](Self::from_raw). The only pointer to the current
    /// pointee that may be passed is one with its exact address, unless `U`
    /// is zero-sized.
    pub unsafe fn reset_raw<U>(&mut self, ptr: *mut U)
    where
        U: Upcast<T> + Clone + 'static,
    {
        if size_of::<U>() != 0 && ptr.addr() == self.addr() {
            return;
        }
        // SAFETY: guaranteed by the caller.
        *self = unsafe { Self::from_raw(ptr) };
    }

    /// Moves the pointee out, leaving `self` empty.
    #[inline]
    pub fn take(&mut self) -> Self {
        core::mem::replace(self, Self::null())
    }

    /// Exchanges the pointees of two pointers without copying.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        core::mem::swap(self, other);
    }

    // -------------------------------------------------------------------------
    // Observers

    /// Returns `true` if the pointer owns nothing.
    #[inline(always)]
    pub fn is_null(&self) -> bool {
        self.ptr.is_none()
    }

    /// Returns the cached pointer to the pointee.
    #[inline(always)]
    pub fn as_ptr(&self) -> Option<NonNull<T>> {
        self.ptr
    }

    /// Returns the address of the pointee, `0` when empty.
    #[inline]
    pub fn addr(&self) -> usize {
        self.ptr.map_or(0, |ptr| ptr.addr().get())
    }

    /// Returns a shared reference to the pointee.
    #[inline]
    pub fn get(&self) -> Option<&T> {
        // SAFETY: the chain keeps the pointee alive as long as `self`.
        self.ptr.map(|ptr| unsafe { ptr.as_ref() })
    }

    /// Returns a mutable reference to the pointee.
    #[inline]
    pub fn get_mut(&mut self) -> Option<&mut T> {
        // SAFETY: see `get`, `&mut self` guarantees exclusive access.
        self.ptr.map(|mut ptr| unsafe { ptr.as_mut() })
    }
}

// -----------------------------------------------------------------------------
// Traits

impl<T: ?Sized + 'static> Default for CloningPtr<T> {
    #[inline(always)]
    fn default() -> Self {
        Self::null()
    }
}

/// Panics if the pointee cannot be copied, see [`CloningPtr::try_clone`].
impl<T: ?Sized + 'static> Clone for CloningPtr<T> {
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(ptr) => ptr,
            Err(e) => {
                log::error!("`CloningPtr::clone` failed: {e}");
                panic!("failed to clone `CloningPtr<{}>`: {e}", type_name::<T>());
            }
        }
    }

    fn clone_from(&mut self, source: &Self) {
        if let Err(e) = self.try_assign_from(source) {
            log::error!("`CloningPtr::clone_from` failed: {e}");
            panic!("failed to clone `CloningPtr<{}>`: {e}", type_name::<T>());
        }
    }
}

impl<T: ?Sized + 'static> Deref for CloningPtr<T> {
    type Target = T;

    /// # Panics
    ///
    /// Panics if the pointer is empty.
    #[track_caller]
    #[inline]
    fn deref(&self) -> &T {
        match self.get() {
            Some(value) => value,
            None => panic!("dereferenced an empty `CloningPtr<{}>`", type_name::<T>()),
        }
    }
}

impl<T: ?Sized + 'static> DerefMut for CloningPtr<T> {
    /// # Panics
    ///
    /// Panics if the pointer is empty.
    #[track_caller]
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        match self.get_mut() {
            Some(value) => value,
            None => panic!("dereferenced an empty `CloningPtr<{}>`", type_name::<T>()),
        }
    }
}

impl<T: ?Sized + 'static, U: ?Sized + 'static> PartialEq<CloningPtr<U>> for CloningPtr<T> {
    #[inline]
    fn eq(&self, other: &CloningPtr<U>) -> bool {
        self.addr() == other.addr()
    }
}

impl<T: ?Sized + 'static> Eq for CloningPtr<T> {}

impl<T: ?Sized + 'static, U: ?Sized + 'static> PartialOrd<CloningPtr<U>> for CloningPtr<T> {
    #[inline]
    fn partial_cmp(&self, other: &CloningPtr<U>) -> Option<Ordering> {
        Some(self.addr().cmp(&other.addr()))
    }
}

impl<T: ?Sized + 'static> Ord for CloningPtr<T> {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.addr().cmp(&other.addr())
    }
}

impl<T: ?Sized + 'static> Hash for CloningPtr<T> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl<T: ?Sized + 'static> fmt::Pointer for CloningPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ptr {
            Some(ptr) => fmt::Pointer::fmt(&ptr, f),
            None => fmt::Pointer::fmt(&core::ptr::null::<u8>(), f),
        }
    }
}

impl<T: ?Sized + 'static> fmt::Debug for CloningPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CloningPtr(")?;
        fmt::Pointer::fmt(self, f)?;
        f.write_str(")")
    }
}
