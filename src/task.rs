use futures::future::{AbortHandle, Abortable, Aborted};
use leptos::*;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;

/// Tasks that live no longer than the view that started them. Cancelling drops
/// the pending future, so a response arriving after teardown writes nowhere.
/// Finished tasks forget their handle.
#[derive(Default)]
pub struct TaskScope {
    handles: Rc<RefCell<HashMap<u64, AbortHandle>>>,
    next_id: Cell<u64>,
}

impl TaskScope {
    pub fn bind<F: Future>(&self, future: F) -> impl Future<Output = Result<F::Output, Aborted>> {
        let (handle, registration) = AbortHandle::new_pair();
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.handles.borrow_mut().insert(id, handle);
        let handles = Rc::downgrade(&self.handles);
        async move {
            let result = Abortable::new(future, registration).await;
            if let Some(handles) = handles.upgrade() {
                handles.borrow_mut().remove(&id);
            }
            result
        }
    }

    pub fn spawn(&self, future: impl Future<Output = ()> + 'static) {
        let task = self.bind(future);
        spawn_local(async move {
            let _ = task.await;
        });
    }

    pub fn cancel(&self) {
        for (_, handle) in self.handles.borrow_mut().drain() {
            handle.abort();
        }
    }

    #[cfg(test)]
    fn pending(&self) -> usize {
        self.handles.borrow().len()
    }
}

impl Drop for TaskScope {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// A scope cancelled when the calling component is cleaned up.
pub fn use_task_scope() -> Rc<TaskScope> {
    let scope = Rc::new(TaskScope::default());
    let teardown = scope.clone();
    on_cleanup(move || teardown.cancel());
    scope
}
