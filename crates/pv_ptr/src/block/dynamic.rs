use alloc::boxed::Box;
use core::any::Any;
use core::ptr::NonNull;

use super::{BoxedBlock, ControlBlock};
use crate::{AsAny, CopyError, Released};

/// Checked downcast of the chain behind `delegate` to the concrete type `T`.
///
/// The type check runs once, in [`new`](DynamicBlock::new), and its result is
/// cached.
pub(crate) struct DynamicBlock<T, U: ?Sized> {
    delegate: BoxedBlock<U>,
    cached: Option<NonNull<T>>,
}

impl<T: Any, U: ?Sized + AsAny> DynamicBlock<T, U> {
    /// Returns `None` if the delegate is empty or does not hold a `T`.
    pub(crate) fn new(delegate: BoxedBlock<U>) -> Option<Self> {
        let ptr = delegate.ptr()?;
        // SAFETY: the delegate owns the value and nothing else borrows it yet.
        let value = unsafe { &mut *ptr.as_ptr() };
        let cached = NonNull::from(value.as_any_mut().downcast_mut::<T>()?);
        Some(Self {
            delegate,
            cached: Some(cached),
        })
    }
}

impl<T, U> ControlBlock<T> for DynamicBlock<T, U>
where
    T: Any,
    U: ?Sized + AsAny,
{
    fn clone_block(&self) -> Result<BoxedBlock<T>, CopyError> {
        let delegate = self.delegate.clone_block()?;
        // Copies keep their concrete type, so the check only fails for an
        // emptied chain.
        match Self::new(delegate) {
            Some(block) => Ok(Box::new(block)),
            None => Err(CopyError::Released),
        }
    }

    fn release(&mut self) -> Option<Released<T>> {
        let cached = self.cached.take()?;
        // The type was checked in `new`, `cached` addresses the same value.
        Some(self.delegate.release()?.map(|_| cached))
    }

    #[inline]
    fn ptr(&self) -> Option<NonNull<T>> {
        self.cached
    }
}
