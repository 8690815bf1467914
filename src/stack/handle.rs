use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::stack::layer_stack::LayerStack;

/// Shared handle to the live layer stack.
///
/// The interactive side and a running bulk generation hold clones of the same handle. Locks are
/// only held for the duration of a closure, never across an await point, so the stack stays
/// editable while a batch is in flight.
#[derive(Clone, Debug, Default)]
pub struct StackHandle {
    inner: Arc<Mutex<LayerStack>>,
}

impl StackHandle {
    /// Wrap a stack.
    pub fn new(stack: LayerStack) -> Self {
        Self {
            inner: Arc::new(Mutex::new(stack)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LayerStack> {
        // A panic inside a closure leaves the stack structurally valid.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with shared access.
    pub fn read<R>(&self, f: impl FnOnce(&LayerStack) -> R) -> R {
        f(&self.lock())
    }

    /// Run `f` with exclusive access.
    pub fn update<R>(&self, f: impl FnOnce(&mut LayerStack) -> R) -> R {
        f(&mut self.lock())
    }

    /// Clone the current stack.
    pub fn snapshot(&self) -> LayerStack {
        self.lock().clone()
    }

    /// Swap in a whole new stack (project load).
    pub fn replace(&self, stack: LayerStack) {
        *self.lock() = stack;
    }
}
