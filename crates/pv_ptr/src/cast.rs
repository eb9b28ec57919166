//! Casts between [`CloningPtr`]s of related types.
//!
//! Every cast deep-copies the source and returns a pointer that owns the
//! copy, the source is left untouched. The copy keeps the whole control-block
//! chain of the source, so it can be cloned, released and dropped like any
//! other pointer.
//!
//! An empty source casts to an empty pointer. Widening conversions that do not
//! need a copy are provided by [`CloningPtr::upcast`].

use alloc::boxed::Box;
use core::any::{Any, type_name};

use crate::block::{AddReadOnly, DynamicBlock, Downcast, RemoveReadOnly};
use crate::{AsAny, CloningPtr, CopyError, ReadOnly};

/// Copies the pointee into a pointer to its concrete type, without checking
/// the type.
///
/// # Safety
///
/// The dynamic type of the pointee must be exactly `T`.
///
/// # Examples
///
/// ```
/// # #![allow(unsafe_code)]
/// use pv_ptr::{CloningPtr, cast, impl_upcast};
///
/// trait Shape {}
///
/// #[derive(Clone)]
/// struct Circle(f32);
///
/// impl Shape for Circle {}
///
/// impl_upcast!(Circle => dyn Shape);
///
/// let shape = CloningPtr::<dyn Shape>::new(Circle(1.5));
/// // SAFETY: `shape` holds a `Circle`.
/// let circle = unsafe { cast::static_cast::<Circle, _>(&shape) }.unwrap();
/// assert_eq!(circle.0, 1.5);
/// assert_ne!(circle, shape);
/// ```
pub unsafe fn static_cast<T, U>(source: &CloningPtr<U>) -> Result<CloningPtr<T>, CopyError>
where
    T: 'static,
    U: ?Sized + 'static,
{
    Ok(source.try_clone()?.delegate::<T, Downcast>())
}

/// Copies the pointee into a pointer to `T` if its dynamic type is `T`.
///
/// The type is checked before copying: on mismatch the result is an empty
/// pointer and nothing is copied.
///
/// # Examples
///
/// ```
/// # #![allow(unsafe_code)]
/// use pv_ptr::{AsAny, CloningPtr, cast, impl_upcast};
///
/// trait Shape: AsAny {}
///
/// #[derive(Clone)]
/// struct Circle;
/// #[derive(Clone)]
/// struct Square;
///
/// impl Shape for Circle {}
/// impl Shape for Square {}
///
/// impl_upcast!(Circle => dyn Shape, Square => dyn Shape);
///
/// let shape = CloningPtr::<dyn Shape>::new(Circle);
/// assert!(!cast::dynamic_cast::<Circle, _>(&shape).unwrap().is_null());
/// assert!(cast::dynamic_cast::<Square, _>(&shape).unwrap().is_null());
/// ```
pub fn dynamic_cast<T, U>(source: &CloningPtr<U>) -> Result<CloningPtr<T>, CopyError>
where
    T: Any,
    U: ?Sized + AsAny,
{
    let Some(value) = source.get() else {
        return Ok(CloningPtr::null());
    };

    if !value.as_any().is::<T>() {
        log::debug!(
            "dynamic cast of `CloningPtr<{}>` to `{}` failed its type check",
            type_name::<U>(),
            type_name::<T>(),
        );
        return Ok(CloningPtr::null());
    }

    let Some(block) = source.try_clone()?.into_block() else {
        return Ok(CloningPtr::null());
    };
    match DynamicBlock::<T, U>::new(block) {
        Some(block) => Ok(CloningPtr::from_block(Box::new(block))),
        None => Err(CopyError::Released),
    }
}

/// Copies the pointee into a pointer that allows mutation again.
///
/// # Examples
///
/// ```
/// use pv_ptr::{CloningPtr, ReadOnly, cast};
///
/// let frozen = CloningPtr::<ReadOnly<String>>::new(ReadOnly::new(String::from("a")));
///
/// let mut thawed = cast::const_cast(&frozen).unwrap();
/// thawed.push('b');
///
/// assert_eq!(*thawed, "ab");
/// assert_eq!(**frozen, "a");
/// ```
pub fn const_cast<T>(source: &CloningPtr<ReadOnly<T>>) -> Result<CloningPtr<T>, CopyError>
where
    T: ?Sized + 'static,
{
    Ok(source.try_clone()?.delegate::<T, RemoveReadOnly>())
}

/// Copies the pointee into a pointer that only allows shared access.
pub fn read_only_cast<T>(source: &CloningPtr<T>) -> Result<CloningPtr<ReadOnly<T>>, CopyError>
where
    T: ?Sized + 'static,
{
    Ok(source.try_clone()?.delegate::<ReadOnly<T>, AddReadOnly>())
}

#[cfg(test)]
mod tests {
    use super::{const_cast, dynamic_cast, read_only_cast, static_cast};
    use crate::testing::{Alternative, AlternativeBase, Base, Derived, Named, live};
    use crate::{AsAny, CloningPtr, CopyError, DefaultDelete, Policy, ReadOnly};
    use alloc::boxed::Box;

    fn refuse(_: &Derived) -> Result<Box<Derived>, CopyError> {
        Err(CopyError::failed::<Derived>("refused"))
    }

    #[test]
    fn round_trip_through_base() {
        let derived = CloningPtr::<Derived>::new(Derived::new(7));
        let base: CloningPtr<dyn Base> = derived.upcast();
        assert_eq!(live(), 1);

        let back = dynamic_cast::<Derived, _>(&base).unwrap();
        assert!(!back.is_null());
        assert_ne!(back, base);
        assert_eq!(back.value(), 7);
        assert_eq!(live(), 2);

        let sibling = dynamic_cast::<Alternative, _>(&base).unwrap();
        assert!(sibling.is_null());
        assert_eq!(live(), 2);
    }

    #[test]
    fn static_cast_copies() {
        let base = CloningPtr::<dyn Base>::new(Derived::new(3));

        // SAFETY: `base` holds a `Derived`.
        let mut derived = unsafe { static_cast::<Derived, _>(&base) }.unwrap();
        assert_eq!(live(), 2);
        assert_ne!(derived.addr(), base.addr());

        derived.set_value(4);
        assert_eq!(derived.value(), 4);
        assert_eq!(base.value(), 3);

        // SAFETY: empty pointers are never read.
        let empty = unsafe { static_cast::<Derived, dyn Base>(&CloningPtr::null()) }.unwrap();
        assert!(empty.is_null());
        assert_eq!(live(), 2);
    }

    #[test]
    fn read_only_casts() {
        let value = CloningPtr::<dyn Named>::new(Derived::new(5));

        let frozen: CloningPtr<ReadOnly<dyn Named>> = read_only_cast(&value).unwrap();
        assert_eq!(live(), 2);
        assert_eq!(frozen.name(), "derived");
        assert_ne!(frozen, value);

        let mut thawed: CloningPtr<dyn Named> = const_cast(&frozen).unwrap();
        assert_eq!(live(), 3);
        thawed.set_value(6);
        assert_eq!(thawed.value(), 6);
        assert_eq!(frozen.value(), 5);
        assert_eq!(value.value(), 5);
    }

    #[test]
    fn clones_of_casts_keep_chain() {
        let base = CloningPtr::<dyn Named>::new(Derived::new(1)).upcast::<dyn Base>();
        let mut derived = dynamic_cast::<Derived, _>(&base).unwrap();

        let copy = derived.clone();
        assert!((*copy).as_any().is::<Derived>());
        assert_eq!(live(), 3);

        let released = derived.release().unwrap();
        assert!(derived.is_null());
        assert_eq!(live(), 3);
        let released: Box<Derived> = released.into_box().unwrap();
        assert_eq!(released.value(), 1);
        drop(released);
        assert_eq!(live(), 2);

        let mut frozen = read_only_cast(&copy).unwrap();
        let released = frozen.release().unwrap();
        assert_eq!(released.value(), 1);
        drop((released, copy, base));
        assert_eq!(live(), 0);
    }

    #[test]
    fn empty_sources_give_empty_pointers() {
        let base = CloningPtr::<dyn Base>::null();
        assert!(dynamic_cast::<Derived, _>(&base).unwrap().is_null());
        assert!(read_only_cast(&base).unwrap().is_null());

        let frozen = CloningPtr::<ReadOnly<dyn Named>>::null();
        assert!(const_cast(&frozen).unwrap().is_null());
    }

    #[test]
    fn failing_copier_fails_casts() {
        let policy = Policy::new(refuse, DefaultDelete);
        let base = CloningPtr::<dyn Base>::new_with(Derived::new(2), policy);

        assert!(dynamic_cast::<Derived, _>(&base).is_err());
        // SAFETY: `base` holds a `Derived`.
        assert!(unsafe { static_cast::<Derived, _>(&base) }.is_err());
        assert!(read_only_cast(&base).is_err());

        assert_eq!(base.value(), 2);
        assert_eq!(live(), 1);

        // A failed type check never reaches the copier.
        assert!(dynamic_cast::<Alternative, _>(&base).unwrap().is_null());
    }

    #[test]
    fn dynamic_cast_to_other_interface() {
        let base = CloningPtr::<dyn Base>::new(Alternative { value: 3 });
        let alternative = dynamic_cast::<Alternative, _>(&base).unwrap();
        let other: CloningPtr<dyn AlternativeBase> = alternative.upcast();
        assert_eq!(other.alternative(), -3);
    }
}
