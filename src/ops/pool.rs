use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, PoisonError};

use crate::model::ItemId;

/// How many idle stacks the shared pool keeps.
pub const DEFAULT_POOL_CAPACITY: usize = 5;

static SHARED: StackPool = StackPool::new(DEFAULT_POOL_CAPACITY);

/// Bounded pool of traversal stacks, safe to use from several threads.
///
/// Returned stacks beyond the capacity are dropped.
#[derive(Debug)]
pub struct StackPool {
    idle: Mutex<Vec<Vec<ItemId>>>,
    capacity: usize,
}

impl StackPool {
    pub const fn new(capacity: usize) -> Self {
        StackPool {
            idle: Mutex::new(Vec::new()),
            capacity,
        }
    }

    /// The pool used by the traversal functions.
    pub fn shared() -> &'static StackPool {
        &SHARED
    }

    pub fn rent(&self) -> PooledStack<'_> {
        let stack = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        if stack.is_some() {
            log::trace!("reusing pooled traversal stack");
        }
        PooledStack {
            pool: self,
            stack: stack.unwrap_or_default(),
        }
    }

    /// Idle stacks currently held.
    pub fn idle(&self) -> usize {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn give_back(&self, mut stack: Vec<ItemId>) {
        stack.clear();
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < self.capacity {
            idle.push(stack);
        }
    }
}

/// A stack on loan from a [`StackPool`]; goes back to the pool on drop.
#[derive(Debug)]
pub struct PooledStack<'p> {
    pool: &'p StackPool,
    stack: Vec<ItemId>,
}

impl Deref for PooledStack<'_> {
    type Target = Vec<ItemId>;

    fn deref(&self) -> &Vec<ItemId> {
        &self.stack
    }
}

impl DerefMut for PooledStack<'_> {
    fn deref_mut(&mut self) -> &mut Vec<ItemId> {
        &mut self.stack
    }
}

impl Drop for PooledStack<'_> {
    fn drop(&mut self) {
        self.pool.give_back(std::mem::take(&mut self.stack));
    }
}
