use alloc::boxed::Box;
use core::marker::PhantomData;
use core::ptr::NonNull;

use super::{BoxedBlock, ControlBlock};
use crate::{BoxCopier, BoxDeleter, Copier, CopyError, Deleter, Policy, Released, Upcast};

/// Terminal block, owns an allocated `U` and the policy copying it.
pub(crate) struct ConcreteBlock<U, C, D: Deleter<U>> {
    ptr: Option<NonNull<U>>,
    policy: Policy<C, D>,
    // Every pointer of this block and its copies comes from `Box`.
    boxed: bool,
    _marker: PhantomData<U>,
}

impl<U, C, D: Deleter<U>> ConcreteBlock<U, C, D> {
    /// # Safety
    ///
    /// `ptr` must address a valid, exclusively owned `U` that `policy.deleter`
    /// frees, and so must every pointer `policy.copier` returns. `boxed`
    /// requires all of them to come from `Box::into_raw`.
    #[inline]
    pub(crate) unsafe fn from_raw(ptr: NonNull<U>, policy: Policy<C, D>, boxed: bool) -> Self {
        Self {
            ptr: Some(ptr),
            policy,
            boxed,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub(crate) fn from_box(value: Box<U>, policy: Policy<C, D>) -> Self
    where
        C: BoxCopier<U>,
        D: BoxDeleter<U>,
    {
        let ptr = NonNull::from(Box::leak(value));
        // SAFETY: the box and the policy agree on `Box` allocations.
        unsafe { Self::from_raw(ptr, policy, true) }
    }
}

impl<U, C, D: Deleter<U>> Drop for ConcreteBlock<U, C, D> {
    fn drop(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            // SAFETY: `ptr` was adopted with this policy and never released.
            unsafe { self.policy.deleter.delete(ptr) };
        }
    }
}

impl<T, U, C, D> ControlBlock<T> for ConcreteBlock<U, C, D>
where
    T: ?Sized + 'static,
    U: Upcast<T> + 'static,
    C: Copier<U> + Clone + 'static,
    D: Deleter<U> + Clone + 'static,
{
    fn clone_block(&self) -> Result<BoxedBlock<T>, CopyError> {
        let ptr = self.ptr.ok_or(CopyError::Released)?;
        // Cloned first: once the copy exists it must go back through the deleter.
        let policy = self.policy.clone();
        // SAFETY: the block owns the value and only hands out shared access here.
        let copy = policy.copier.copy(unsafe { ptr.as_ref() })?;
        // SAFETY: the copier of an adopted policy is trusted, see `from_raw`.
        Ok(Box::new(unsafe { Self::from_raw(copy, policy, self.boxed) }))
    }

    fn release(&mut self) -> Option<Released<T>> {
        let ptr = self.ptr.take()?;
        let deleter = self.policy.deleter.clone();
        // SAFETY: taking `ptr` hands ownership out once.
        let free = Box::new(move || unsafe { deleter.delete(ptr) });
        // SAFETY: `free` is the deleter `ptr` was adopted with.
        Some(unsafe { Released::new(U::upcast(ptr), free, self.boxed) })
    }

    #[inline]
    fn ptr(&self) -> Option<NonNull<T>> {
        self.ptr.map(U::upcast)
    }
}
