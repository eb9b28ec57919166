use alloc::boxed::Box;
use core::ptr::NonNull;

/// Marks that a pointer to `Self` can be widened to a pointer to `T`.
///
/// This is the stable spelling of "`Self` derives from `T`": a concrete type
/// that implements `dyn Trait`, or a trait object whose trait has `T` as a
/// supertrait. Every type trivially upcasts to itself.
///
/// Prefer [`impl_upcast!`](crate::impl_upcast) over manual implementations.
///
/// # Safety
///
/// [`upcast`](Upcast::upcast) must be a pure unsizing coercion: the returned
/// pointer must address the same object with the same provenance, and its
/// metadata must describe the same value. Boxes are rebuilt from the result.
pub unsafe trait Upcast<T: ?Sized> {
    /// Widens the pointer.
    fn upcast(ptr: NonNull<Self>) -> NonNull<T>;

    /// Widens an owning box, keeping the allocation.
    #[inline]
    fn upcast_box(boxed: Box<Self>) -> Box<T> {
        let ptr = Self::upcast(NonNull::from(Box::leak(boxed)));
        // SAFETY: `upcast` is a coercion, the pointer still comes from `Box`.
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }
}

// SAFETY: identity.
unsafe impl<T: ?Sized> Upcast<T> for T {
    #[inline(always)]
    fn upcast(ptr: NonNull<Self>) -> NonNull<T> {
        ptr
    }

    #[inline(always)]
    fn upcast_box(boxed: Box<Self>) -> Box<T> {
        boxed
    }
}

/// Implements [`Upcast`] for pairs of types related by an unsizing coercion.
///
/// The generated body only performs the coercion, so the macro is safe to
/// use. It expands to an `unsafe impl`, crates that deny `unsafe_code` need
/// to allow it at the call site.
///
/// # Examples
///
/// ```
/// # #![allow(unsafe_code)]
/// use pv_ptr::{CloningPtr, impl_upcast};
///
/// trait Animal {
///     fn name(&self) -> &str;
/// }
///
/// trait Pet: Animal {}
///
/// #[derive(Clone)]
/// struct Cat;
///
/// impl Animal for Cat {
///     fn name(&self) -> &str {
///         "cat"
///     }
/// }
///
/// impl Pet for Cat {}
///
/// impl_upcast! {
///     Cat => dyn Animal,
///     Cat => dyn Pet,
///     dyn Pet => dyn Animal,
/// }
///
/// let pet = CloningPtr::<dyn Pet>::new(Cat);
/// let animal: CloningPtr<dyn Animal> = pet.upcast();
/// assert_eq!(animal.name(), "cat");
/// ```
#[macro_export]
macro_rules! impl_upcast {
    ($($from:ty => $to:ty),+ $(,)?) => {
        $(
            // SAFETY: the body is an unsizing coercion.
            unsafe impl $crate::Upcast<$to> for $from {
                #[inline(always)]
                fn upcast(ptr: ::core::ptr::NonNull<Self>) -> ::core::ptr::NonNull<$to> {
                    ptr
                }
            }
        )+
    };
}
