use crate::error::Error;
use futures::future::{FutureExt, LocalBoxFuture, Shared, TryFutureExt};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

/// Ordered tuple of strings identifying a cached payload, e.g.
/// `["chats", "42", "messages"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    pub fn chats() -> Self {
        Self::new(["chats"])
    }

    pub fn messages(chat_id: &str) -> Self {
        Self::new(["chats", chat_id, "messages"])
    }

    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

type Payload = Rc<dyn Any>;
type InFlight = Shared<LocalBoxFuture<'static, Result<Payload, Error>>>;

enum Entry {
    Ready {
        data: Payload,
        stale: bool,
    },
    Pending {
        id: u64,
        future: InFlight,
        stale: bool,
    },
    /// The last fetch failed. Always refetched, and still matched by
    /// invalidation so that whoever shows the failure hears about it.
    Failed,
}

impl Entry {
    fn mark_stale(&mut self) {
        match self {
            Entry::Ready { stale, .. } | Entry::Pending { stale, .. } => *stale = true,
            Entry::Failed => {}
        }
    }
}

type Listener = Rc<dyn Fn(&QueryKey)>;

/// Request-keyed cache of the last successful payload per key.
///
/// Concurrent fetches of the same key share one in-flight request. An entry
/// stays fresh until [`QueryCache::invalidate`] marks it stale; the next fetch
/// of a stale key goes to the network exactly once. Failures are remembered
/// but never served: the next fetch of a failed key retries.
#[derive(Default)]
pub struct QueryCache {
    entries: RefCell<HashMap<QueryKey, Entry>>,
    listeners: RefCell<Vec<Listener>>,
    next_id: Cell<u64>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fetch<T, F, Fut>(&self, key: QueryKey, fetcher: F) -> Result<Rc<T>, Error>
    where
        T: 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, Error>> + 'static,
    {
        let existing = match self.entries.borrow().get(&key) {
            Some(Entry::Ready { data, stale: false }) => return downcast(&key, data.clone()),
            Some(Entry::Pending { id, future, .. }) => Some((*id, future.clone())),
            _ => None,
        };
        let (id, future) = match existing {
            Some(existing) => existing,
            None => {
                let id = self.next_id.get();
                self.next_id.set(id + 1);
                let future = fetcher()
                    .map_ok(|data| Rc::new(data) as Payload)
                    .boxed_local()
                    .shared();
                self.entries.borrow_mut().insert(
                    key.clone(),
                    Entry::Pending {
                        id,
                        future: future.clone(),
                        stale: false,
                    },
                );
                (id, future)
            }
        };
        let result = future.await;
        self.settle(&key, id, &result);
        downcast(&key, result?)
    }

    fn settle(&self, key: &QueryKey, id: u64, result: &Result<Payload, Error>) {
        let mut entries = self.entries.borrow_mut();
        let stale = match entries.get(key) {
            Some(Entry::Pending {
                id: pending, stale, ..
            }) if *pending == id => *stale,
            // Already settled by another waiter, or cleared meanwhile.
            _ => return,
        };
        match result {
            Ok(data) => {
                entries.insert(
                    key.clone(),
                    Entry::Ready {
                        data: data.clone(),
                        stale,
                    },
                );
            }
            Err(_) => {
                entries.insert(key.clone(), Entry::Failed);
            }
        }
    }

    /// Last settled payload for `key`, fresh or stale.
    #[cfg(test)]
    pub fn get<T: 'static>(&self, key: &QueryKey) -> Option<Rc<T>> {
        match self.entries.borrow().get(key) {
            Some(Entry::Ready { data, .. }) => data.clone().downcast::<T>().ok(),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn is_stale(&self, key: &QueryKey) -> Option<bool> {
        self.entries.borrow().get(key).map(|entry| match entry {
            Entry::Ready { stale, .. } | Entry::Pending { stale, .. } => *stale,
            Entry::Failed => true,
        })
    }

    /// Marks every entry under `prefix` stale and returns how many matched.
    /// Listeners hear about it once, and only when something matched.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut count = 0;
        for (key, entry) in self.entries.borrow_mut().iter_mut() {
            if key.starts_with(prefix) {
                entry.mark_stale();
                count += 1;
            }
        }
        if count > 0 {
            let listeners = self.listeners.borrow().clone();
            for listener in listeners {
                listener(prefix);
            }
        }
        count
    }

    pub fn subscribe(&self, listener: impl Fn(&QueryKey) + 'static) {
        self.listeners.borrow_mut().push(Rc::new(listener));
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn downcast<T: 'static>(key: &QueryKey, data: Payload) -> Result<Rc<T>, Error> {
    data.downcast::<T>()
        .map_err(|_| Error::CacheType(key.clone()))
}
