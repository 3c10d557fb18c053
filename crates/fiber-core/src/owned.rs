use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Single-threaded shared cell for state that both fibers of a pair point at.
///
/// Hook queues, effect records and the root update queue live behind an
/// `Owned` so the current fiber, its work-in-progress alternate and any
/// dispatcher handle held by user code all observe the same value.
pub struct Owned<T> {
    inner: Rc<RefCell<T>>,
}

impl<T> Clone for Owned<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Owned<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(value)),
        }
    }

    /// Run `f` with an immutable reference to the stored value.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let borrow = self.inner.borrow();
        f(&*borrow)
    }

    /// Run `f` with a mutable reference to the stored value.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut borrow = self.inner.borrow_mut();
        f(&mut *borrow)
    }

    /// Replace the stored value entirely.
    pub fn replace(&self, new_value: T) -> T {
        std::mem::replace(&mut *self.inner.borrow_mut(), new_value)
    }

    /// Whether both handles point at the same cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: fmt::Debug> fmt::Debug for Owned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(value) => f.debug_tuple("Owned").field(&*value).finish(),
            Err(_) => f.write_str("Owned(<borrowed>)"),
        }
    }
}
