//! Fixtures shared by the unit tests.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell, UnsafeCell};
use core::mem::MaybeUninit;
use core::ptr::NonNull;

use crate::{AsAny, Copier, CopyError, Deleter};

std::thread_local! {
    static LIVE: Cell<isize> = const { Cell::new(0) };
}

/// Number of [`Derived`] values alive on this thread.
pub fn live() -> isize {
    LIVE.with(Cell::get)
}

pub trait Base: AsAny {
    fn value(&self) -> i32;

    fn set_value(&mut self, value: i32);
}

pub trait Named: Base {
    fn name(&self) -> &'static str;
}

pub trait AlternativeBase: AsAny {
    fn alternative(&self) -> i32;
}

/// Counted implementation of [`Base`] and [`Named`].
#[derive(Debug)]
pub struct Derived {
    value: i32,
}

impl Derived {
    pub fn new(value: i32) -> Self {
        LIVE.with(|live| live.set(live.get() + 1));
        Self { value }
    }
}

impl Clone for Derived {
    fn clone(&self) -> Self {
        Self::new(self.value)
    }
}

impl Drop for Derived {
    fn drop(&mut self) {
        LIVE.with(|live| live.set(live.get() - 1));
    }
}

impl Base for Derived {
    fn value(&self) -> i32 {
        self.value
    }

    fn set_value(&mut self, value: i32) {
        self.value = value;
    }
}

impl Named for Derived {
    fn name(&self) -> &'static str {
        "derived"
    }
}

/// Uncounted implementation of [`Base`] and [`AlternativeBase`].
#[derive(Debug, Clone)]
pub struct Alternative {
    pub value: i32,
}

impl Base for Alternative {
    fn value(&self) -> i32 {
        self.value
    }

    fn set_value(&mut self, value: i32) {
        self.value = value;
    }
}

impl AlternativeBase for Alternative {
    fn alternative(&self) -> i32 {
        -self.value
    }
}

/// Panics when cloned.
#[derive(Debug)]
pub struct Fragile;

impl Clone for Fragile {
    fn clone(&self) -> Self {
        panic!("`Fragile` cannot be cloned");
    }
}

impl Base for Fragile {
    fn value(&self) -> i32 {
        0
    }

    fn set_value(&mut self, _: i32) {}
}

/// Counted zero-sized value.
#[derive(Debug)]
pub struct Unit(());

impl Unit {
    pub fn new() -> Self {
        LIVE.with(|live| live.set(live.get() + 1));
        Self(())
    }
}

impl Clone for Unit {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl Drop for Unit {
    fn drop(&mut self) {
        LIVE.with(|live| live.set(live.get() - 1));
    }
}

// -----------------------------------------------------------------------------
// Pool

/// Fixed-capacity storage for [`Derived`] values, outside the global allocator.
pub struct Pool {
    slots: Box<[UnsafeCell<MaybeUninit<Derived>>]>,
    free: RefCell<Vec<usize>>,
}

impl Pool {
    pub fn new(capacity: usize) -> Rc<Self> {
        Rc::new(Self {
            slots: (0..capacity).map(|_| UnsafeCell::new(MaybeUninit::uninit())).collect(),
            free: RefCell::new((0..capacity).rev().collect()),
        })
    }

    pub fn in_use(&self) -> usize {
        self.slots.len() - self.free.borrow().len()
    }

    pub fn owns(&self, addr: usize) -> bool {
        let start = self.slots.as_ptr().addr();
        let end = start + size_of_val(&*self.slots);
        (start..end).contains(&addr)
    }

    pub fn alloc(&self, value: Derived) -> Result<NonNull<Derived>, CopyError> {
        let index = self
            .free
            .borrow_mut()
            .pop()
            .ok_or_else(|| CopyError::failed::<Derived>("pool exhausted"))?;
        // SAFETY: free slots are not referenced.
        let slot = unsafe { &mut *self.slots[index].get() };
        Ok(NonNull::from(slot.write(value)))
    }

    /// # Safety
    ///
    /// `ptr` must come from `alloc` on this pool and must not be used
    /// afterwards.
    pub unsafe fn free(&self, ptr: NonNull<Derived>) {
        let start = self.slots.as_ptr().addr();
        let index = (ptr.addr().get() - start) / size_of::<Derived>();
        // SAFETY: guaranteed by the caller.
        unsafe { ptr.drop_in_place() };
        self.free.borrow_mut().push(index);
    }
}

#[derive(Clone)]
pub struct PoolCopy(pub Rc<Pool>);

impl Copier<Derived> for PoolCopy {
    fn copy(&self, value: &Derived) -> Result<NonNull<Derived>, CopyError> {
        self.0.alloc(value.clone())
    }
}

#[derive(Clone)]
pub struct PoolDelete(pub Rc<Pool>);

impl Deleter<Derived> for PoolDelete {
    unsafe fn delete(&self, ptr: NonNull<Derived>) {
        // SAFETY: pool policies only see pool pointers.
        unsafe { self.0.free(ptr) };
    }
}

crate::impl_upcast! {
    Derived => dyn Base,
    Derived => dyn Named,
    dyn Named => dyn Base,
    Alternative => dyn Base,
    Alternative => dyn AlternativeBase,
    Fragile => dyn Base,
}
