#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

pub use pv_ptr as ptr;

pub use pv_ptr::{
    AsAny, BoxCopier, BoxDeleter, CloningPtr, Copier, CopyError, DefaultCopy, DefaultDelete,
    Deleter, Policy, ReadOnly, Released, TypeMismatch, Upcast, cast, impl_upcast,
};
