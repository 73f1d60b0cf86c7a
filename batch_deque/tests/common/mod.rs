#![allow(dead_code)]

use std::alloc::Layout;
use std::cell::Cell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr::NonNull;
use std::rc::Rc;

use batch_deque::allocator_api2::alloc::{AllocError, Allocator, Global};

thread_local! {
    static LIVE: Cell<isize> = const { Cell::new(0) };
    static BUDGET: Cell<Option<usize>> = const { Cell::new(None) };
}

/// Element that counts live instances and can be told to panic on the
/// k-th construction through `Clone` or `Default`.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Counted(i32);

impl Counted {
    pub fn new(value: i32) -> Self {
        LIVE.with(|live| live.set(live.get() + 1));
        Counted(value)
    }

    pub fn value(&self) -> i32 {
        self.0
    }

    fn charge() {
        BUDGET.with(|budget| match budget.get() {
            Some(0) => {
                budget.set(None);
                panic!("construction budget exhausted");
            }
            Some(n) => budget.set(Some(n - 1)),
            None => {}
        });
    }
}

impl Clone for Counted {
    fn clone(&self) -> Self {
        Counted::charge();
        Counted::new(self.0)
    }
}

impl Default for Counted {
    fn default() -> Self {
        Counted::charge();
        Counted::new(0)
    }
}

impl Drop for Counted {
    fn drop(&mut self) {
        LIVE.with(|live| live.set(live.get() - 1));
    }
}

impl PartialEq<i32> for Counted {
    fn eq(&self, other: &i32) -> bool {
        self.0 == *other
    }
}

pub fn live() -> isize {
    LIVE.with(Cell::get)
}

/// The next `successes` constructions succeed, the one after panics.
pub fn fail_after(successes: usize) {
    BUDGET.with(|budget| budget.set(Some(successes)));
}

pub fn never_fail() {
    BUDGET.with(|budget| budget.set(None));
}

pub fn counted(values: impl IntoIterator<Item = i32>) -> Vec<Counted> {
    values.into_iter().map(Counted::new).collect()
}

pub fn values<'a>(items: impl IntoIterator<Item = &'a Counted>) -> Vec<i32> {
    items.into_iter().map(Counted::value).collect()
}

/// Runs `f` and asserts that it panicked.
pub fn expect_panic<R>(f: impl FnOnce() -> R) {
    let result = catch_unwind(AssertUnwindSafe(f));
    never_fail();
    assert!(result.is_err(), "operation was expected to panic");
}

/// Allocator that counts the allocations it serves.
#[derive(Clone, Default, Debug)]
pub struct CountingAlloc {
    allocations: Rc<Cell<usize>>,
}

impl CountingAlloc {
    pub fn allocations(&self) -> usize {
        self.allocations.get()
    }
}

unsafe impl Allocator for CountingAlloc {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        self.allocations.set(self.allocations.get() + 1);
        Global.allocate(layout)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        unsafe { Global.deallocate(ptr, layout) }
    }
}
