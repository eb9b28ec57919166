use alloc::boxed::Box;
use core::marker::PhantomData;
use core::ptr::NonNull;

use super::{BoxedBlock, ControlBlock};
use crate::{CopyError, ReadOnly, Released, Upcast};

// -----------------------------------------------------------------------------
// Cast modes

/// Reinterprets pointers to `U` as pointers to `T`.
///
/// The result addresses the same value, so boxes stay valid across casts.
pub(crate) trait CastMode<T: ?Sized, U: ?Sized>: 'static {
    fn cast(ptr: NonNull<U>) -> NonNull<T>;
}

/// Implicit base conversion.
pub(crate) enum Widen {}

impl<T: ?Sized, U: ?Sized + Upcast<T>> CastMode<T, U> for Widen {
    #[inline(always)]
    fn cast(ptr: NonNull<U>) -> NonNull<T> {
        U::upcast(ptr)
    }
}

/// Unchecked downcast to a sized type.
///
/// Only [`static_cast`](crate::cast::static_cast) builds blocks in this mode,
/// its caller guarantees that the pointee is a `T`.
pub(crate) enum Downcast {}

impl<T, U: ?Sized> CastMode<T, U> for Downcast {
    #[inline(always)]
    fn cast(ptr: NonNull<U>) -> NonNull<T> {
        ptr.cast()
    }
}

/// `T` to `ReadOnly<T>`.
pub(crate) enum AddReadOnly {}

impl<T: ?Sized> CastMode<ReadOnly<T>, T> for AddReadOnly {
    #[inline(always)]
    fn cast(ptr: NonNull<T>) -> NonNull<ReadOnly<T>> {
        ReadOnly::wrap_ptr(ptr)
    }
}

/// `ReadOnly<T>` to `T`.
pub(crate) enum RemoveReadOnly {}

impl<T: ?Sized> CastMode<T, ReadOnly<T>> for RemoveReadOnly {
    #[inline(always)]
    fn cast(ptr: NonNull<ReadOnly<T>>) -> NonNull<T> {
        ReadOnly::unwrap_ptr(ptr)
    }
}

// -----------------------------------------------------------------------------
// DelegatingBlock

/// Views the chain behind `delegate` as `T` through the cast mode `M`.
pub(crate) struct DelegatingBlock<T: ?Sized, U: ?Sized, M> {
    delegate: BoxedBlock<U>,
    _marker: PhantomData<fn(M) -> *const T>,
}

impl<T: ?Sized, U: ?Sized, M> DelegatingBlock<T, U, M> {
    #[inline]
    pub(crate) fn new(delegate: BoxedBlock<U>) -> Self {
        Self {
            delegate,
            _marker: PhantomData,
        }
    }
}

impl<T, U, M> ControlBlock<T> for DelegatingBlock<T, U, M>
where
    T: ?Sized + 'static,
    U: ?Sized + 'static,
    M: CastMode<T, U>,
{
    fn clone_block(&self) -> Result<BoxedBlock<T>, CopyError> {
        let delegate = self.delegate.clone_block()?;
        Ok(Box::new(Self::new(delegate)))
    }

    #[inline]
    fn release(&mut self) -> Option<Released<T>> {
        Some(self.delegate.release()?.map(M::cast))
    }

    #[inline]
    fn ptr(&self) -> Option<NonNull<T>> {
        self.delegate.ptr().map(M::cast)
    }
}

#[cfg(test)]
mod tests {
    use super::{AddReadOnly, DelegatingBlock, Downcast, RemoveReadOnly, Widen};
    use crate::block::{BoxedBlock, ConcreteBlock};
    use crate::testing::{Base, Derived, Named, live};
    use crate::{DefaultCopy, DefaultDelete, Policy, ReadOnly};
    use alloc::boxed::Box;

    fn named(value: i32) -> BoxedBlock<dyn Named> {
        let policy = Policy::new(DefaultCopy, DefaultDelete);
        Box::new(ConcreteBlock::from_box(Box::new(Derived::new(value)), policy))
    }

    #[test]
    fn widen_keeps_chain() {
        let inner = named(4);
        let addr = inner.ptr().unwrap().addr();

        let widened: BoxedBlock<dyn Base> =
            Box::new(DelegatingBlock::<dyn Base, dyn Named, Widen>::new(inner));
        assert_eq!(widened.ptr().unwrap().addr(), addr);

        let copy = widened.clone_block().unwrap();
        assert_eq!(live(), 2);
        assert_ne!(copy.ptr().unwrap().addr(), addr);
        // SAFETY: `copy` is alive.
        assert_eq!(unsafe { copy.ptr().unwrap().as_ref() }.value(), 4);

        drop(widened);
        drop(copy);
        assert_eq!(live(), 0);
    }

    #[test]
    fn downcast_release() {
        let base: BoxedBlock<dyn Base> =
            Box::new(DelegatingBlock::<dyn Base, dyn Named, Widen>::new(named(6)));
        let mut derived: BoxedBlock<Derived> =
            Box::new(DelegatingBlock::<Derived, dyn Base, Downcast>::new(base));

        let copy = derived.clone_block().unwrap();
        let released = derived.release().unwrap();
        assert_eq!(released.value(), 6);
        assert!(derived.ptr().is_none());

        drop(derived);
        assert_eq!(live(), 2);
        drop(released);
        drop(copy);
        assert_eq!(live(), 0);
    }

    #[test]
    fn read_only_round_trip() {
        let inner = named(1);
        let addr = inner.ptr().unwrap().addr();

        type AddBlock = DelegatingBlock<ReadOnly<dyn Named>, dyn Named, AddReadOnly>;
        type RemoveBlock = DelegatingBlock<dyn Named, ReadOnly<dyn Named>, RemoveReadOnly>;

        let read_only: BoxedBlock<ReadOnly<dyn Named>> = Box::new(AddBlock::new(inner));
        let mut writable: BoxedBlock<dyn Named> = Box::new(RemoveBlock::new(read_only));
        assert_eq!(writable.ptr().unwrap().addr(), addr);

        let released = writable.release().unwrap();
        assert_eq!(released.name(), "derived");
        drop(released);
        assert_eq!(live(), 0);
    }
}
