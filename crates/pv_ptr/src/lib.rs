//! This crate provides [`CloningPtr`], an owning pointer with value semantics
//! for polymorphic (usually `dyn Trait`) objects.
//!
//! Cloning a `CloningPtr<dyn Trait>` deep-copies the pointee through its
//! dynamic type, not its static type, and dropping it drops the owned value.
//! `Box<dyn Trait>` cannot be cloned and `Rc`/`Arc` share the pointee; this
//! type fills the gap.
//!
//! **Control blocks**
//!
//! Every non-empty pointer owns a chain of control blocks. The last block of
//! the chain holds the heap allocation and knows its concrete type, so it can
//! copy it. Casts wrap the chain in another block instead of flattening it,
//! which keeps clones and [`release`](CloningPtr::release) correct for casted
//! pointers.
//!
//! **Casts**
//!
//! The [`cast`] module provides `static_cast`, `dynamic_cast` and the
//! read-only casts. Each of them returns a pointer that owns an independent
//! deep copy of the source.
//!
//! **Allocation**
//!
//! Values live in a [`Box`](alloc::boxed::Box) by default. A [`Policy`] with
//! a custom [`Copier`] and [`Deleter`] keeps them in any other storage, such
//! values are adopted with [`CloningPtr::from_raw_with`] and released as a
//! [`Released`] that still frees through the deleter.
//!
//! **Conversions**
//!
//! Stable Rust cannot express "`U` unsizes to `T`" as a bound, so the
//! relation is spelled with the [`Upcast`] trait and implemented through
//! [`impl_upcast!`](crate::impl_upcast).
//!
//! ```
//! # #![allow(unsafe_code)]
//! use pv_ptr::{CloningPtr, impl_upcast};
//!
//! trait Shape {
//!     fn area(&self) -> f64;
//! }
//!
//! #[derive(Clone)]
//! struct Square(f64);
//!
//! impl Shape for Square {
//!     fn area(&self) -> f64 {
//!         self.0 * self.0
//!     }
//! }
//!
//! impl_upcast!(Square => dyn Shape);
//!
//! let a = CloningPtr::<dyn Shape>::new(Square(2.0));
//! let b = a.clone();
//!
//! assert_eq!(b.area(), 4.0);
//! assert_ne!(a, b);
//! ```
#![expect(unsafe_code, reason = "Raw pointers are inherently unsafe.")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// No STD Support

extern crate alloc;

#[cfg(test)]
extern crate std;

// -----------------------------------------------------------------------------
// Modules

mod as_any;
mod block;
mod cloning;
mod error;
mod policy;
mod read_only;
mod released;
mod upcast;

pub mod cast;

#[cfg(test)]
mod testing;

// -----------------------------------------------------------------------------
// Top-level exports

pub use as_any::AsAny;
pub use cloning::CloningPtr;
pub use error::{CopyError, TypeMismatch};
pub use policy::{BoxCopier, BoxDeleter, Copier, DefaultCopy, DefaultDelete, Deleter, Policy};
pub use read_only::ReadOnly;
pub use released::Released;
pub use upcast::Upcast;
