use alloc::borrow::Cow;

use thiserror::Error;

// -----------------------------------------------------------------------------
// CopyError

/// Errors raised while deep-copying the pointee of a [`CloningPtr`].
///
/// Every operation that clones (copy, assignment, converting copy and the
/// casts) propagates this error and leaves all existing pointers unchanged.
///
/// [`CloningPtr`]: crate::CloningPtr
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CopyError {
    #[error("copying a `{type_name}` failed: {reason}")]
    Failed {
        type_name: &'static str,
        reason: Cow<'static, str>,
    },

    #[error("the control block no longer owns a value")]
    Released,
}

impl CopyError {
    /// Creates a [`CopyError::Failed`] for values of type `U`.
    ///
    /// Intended for custom [`Copier`](crate::Copier) implementations.
    ///
    /// # Examples
    ///
    /// ```
    /// use pv_ptr::CopyError;
    ///
    /// let err = CopyError::failed::<u32>("out of budget");
    /// assert_eq!(err.to_string(), "copying a `u32` failed: out of budget");
    /// ```
    #[inline]
    pub fn failed<U: ?Sized>(reason: impl Into<Cow<'static, str>>) -> Self {
        Self::Failed {
            type_name: core::any::type_name::<U>(),
            reason: reason.into(),
        }
    }
}

// -----------------------------------------------------------------------------
// TypeMismatch

/// The dynamic type of a value differs from the type it was declared as.
///
/// Returned by [`CloningPtr::try_from_any`](crate::CloningPtr::try_from_any).
/// Adopting such a value with the default copy policy would slice it on
/// every clone, so the construction is refused.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("dynamic type of the value is not the declared type `{expected}`")]
pub struct TypeMismatch {
    pub expected: &'static str,
}
