use crate::cache::{QueryCache, QueryKey};
use crate::error::Error;
use leptos::*;
use std::future::Future;
use std::rc::Rc;

/// Shares one [`QueryCache`] with the whole tree. Every invalidation that
/// matches something bumps `epoch`, which re-runs the mounted queries; fresh
/// keys answer from the cache and only stale ones go to the network.
#[derive(Clone)]
pub struct QueryClient {
    cache: Rc<QueryCache>,
    epoch: RwSignal<u64>,
}

impl QueryClient {
    pub fn new() -> Self {
        let cache = Rc::new(QueryCache::new());
        let epoch = create_rw_signal(0);
        cache.subscribe(move |_| epoch.update(|epoch| *epoch += 1));
        Self { cache, epoch }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    #[cfg(test)]
    pub fn epoch(&self) -> u64 {
        self.epoch.get_untracked()
    }

    /// Forgets everything, e.g. when the signed in user changes.
    pub fn clear(&self) {
        self.cache.clear();
        self.epoch.update(|epoch| *epoch += 1);
    }
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new()
    }
}

pub fn provide_query_client() -> QueryClient {
    let client = QueryClient::new();
    provide_context(client.clone());
    client
}

pub fn use_query_client() -> QueryClient {
    expect_context::<QueryClient>()
}

pub type Query<S, T> = Resource<(S, u64), Result<Rc<T>, Error>>;

/// Cached, deduplicated fetch bound to the calling component.
///
/// `source` is tracked like a resource source, `key` names its cache entry
/// and `fetcher` runs only when that entry is missing or stale.
pub fn use_query<S, T, Src, K, F, Fut>(source: Src, key: K, fetcher: F) -> Query<S, T>
where
    S: PartialEq + Clone + 'static,
    T: 'static,
    Src: Fn() -> S + 'static,
    K: Fn(&S) -> QueryKey + 'static,
    F: Fn(S) -> Fut + Clone + 'static,
    Fut: Future<Output = Result<T, Error>> + 'static,
{
    let client = use_query_client();
    let epoch = client.epoch;
    let cache = client.cache.clone();
    create_local_resource(
        move || (source(), epoch.get()),
        move |(source, _)| {
            let cache = cache.clone();
            let fetcher = fetcher.clone();
            let key = key(&source);
            async move { cache.fetch(key, move || fetcher(source)).await }
        },
    )
}
