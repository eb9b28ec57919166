use alloc::boxed::Box;
use core::any::Any;

/// Views a value as [`dyn Any`](Any), through its dynamic type.
///
/// Implemented for every sized `'static` type. Add it as a supertrait of a
/// polymorphic interface to make [`dynamic_cast`](crate::cast::dynamic_cast)
/// available for pointers to that interface.
///
/// # Examples
///
/// ```
/// use pv_ptr::AsAny;
///
/// trait Node: AsAny {}
///
/// struct Leaf(u8);
/// impl Node for Leaf {}
///
/// let node: &dyn Node = &Leaf(1);
/// assert!(node.as_any().is::<Leaf>());
/// ```
pub trait AsAny: Any {
    /// Returns `self` as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;

    /// Returns `self` as `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Converts a box of `self` into `Box<dyn Any>`, keeping the allocation.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any> AsAny for T {
    #[inline(always)]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline(always)]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    #[inline(always)]
    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::{Alternative, Base, Derived};
    use alloc::boxed::Box;

    #[test]
    fn dispatches_on_dynamic_type() {
        let mut value: Box<dyn Base> = Box::new(Derived::new(2));

        // `Box<dyn Base>` is `Any` itself, go through the pointee.
        assert!((*value).as_any().is::<Derived>());
        assert!(!(*value).as_any().is::<Alternative>());

        (*value)
            .as_any_mut()
            .downcast_mut::<Derived>()
            .unwrap()
            .set_value(9);
        assert_eq!(value.value(), 9);

        let any = value.into_any();
        assert_eq!(any.downcast::<Derived>().unwrap().value(), 9);
    }
}
