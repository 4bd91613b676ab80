//! Per-turn cancellation token.
//!
//! Cancelling sets a flag the frame loop checks before acting on each frame,
//! and aborts every future/stream guarded by the token so a pending read
//! resolves immediately.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use futures::future::{AbortHandle, Abortable};

#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Rc<CancelInner>,
}

#[derive(Default)]
struct CancelInner {
    cancelled: Cell<bool>,
    handles: RefCell<Vec<AbortHandle>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the token was already cancelled.
    pub fn cancel(&self) -> bool {
        if self.inner.cancelled.replace(true) {
            return false;
        }
        for handle in self.inner.handles.borrow_mut().drain(..) {
            handle.abort();
        }
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.get()
    }

    /// Wrap a future or stream so cancelling this token aborts it.
    pub fn guard<T>(&self, task: T) -> Abortable<T> {
        let (handle, registration) = AbortHandle::new_pair();
        if self.is_cancelled() {
            handle.abort();
        } else {
            self.inner.handles.borrow_mut().push(handle);
        }
        Abortable::new(task, registration)
    }
}
