//! Type-erased control blocks.
//!
//! A [`CloningPtr<T>`](crate::CloningPtr) owns a chain of blocks ending in
//! exactly one [`ConcreteBlock`], the sole owner of the heap allocation.
//! Casts push a [`DelegatingBlock`] or [`DynamicBlock`] in front of the chain,
//! they never flatten it.

use alloc::boxed::Box;
use core::ptr::NonNull;

use crate::{CopyError, Released};

// -----------------------------------------------------------------------------
// Modules

mod concrete;
mod delegating;
mod dynamic;

// -----------------------------------------------------------------------------
// Exports

pub(crate) use concrete::ConcreteBlock;
pub(crate) use delegating::{
    AddReadOnly, CastMode, DelegatingBlock, Downcast, RemoveReadOnly, Widen,
};
pub(crate) use dynamic::DynamicBlock;

// -----------------------------------------------------------------------------
// ControlBlock

/// An owned control block viewed as `T`.
pub(crate) type BoxedBlock<T> = Box<dyn ControlBlock<T>>;

/// Clone, release and observe an owned value through its static type `T`.
///
/// After [`release`](ControlBlock::release) the block is empty: `ptr` and
/// `release` return `None` and `clone_block` fails with
/// [`CopyError::Released`].
pub(crate) trait ControlBlock<T: ?Sized> {
    /// Deep-copies the owned value through its dynamic type and returns a
    /// chain of the same shape owning the copy.
    fn clone_block(&self) -> Result<BoxedBlock<T>, CopyError>;

    /// Gives up ownership of the value.
    ///
    /// The result still frees through the deleter of the concrete block.
    fn release(&mut self) -> Option<Released<T>>;

    /// Observes the value without taking ownership.
    fn ptr(&self) -> Option<NonNull<T>>;
}
