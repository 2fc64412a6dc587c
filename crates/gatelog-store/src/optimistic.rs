//! In-memory collection with optimistic writes against a remote store
//!
//! Every mutation is applied to the local collection before the method
//! returns, and its remote round trip is spawned on the current
//! [`LocalSet`](tokio::task::LocalSet) right away. The returned [`PendingOp`]
//! only reports the outcome; dropping it does not cancel the round trip.
//! Each resolution touches only the record its own call introduced or
//! removed, so round trips may finish in any order.

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use log::{debug, info, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

use gatelog_domain::repository::RemoteCollection;
use gatelog_types::{Error, Record, Result};

/// Prefix of identities handed out before the remote store confirms a record
pub const PROVISIONAL_PREFIX: &str = "local-";

/// Remote round trip of an optimistic mutation, already applied locally.
///
/// The round trip runs whether or not this handle is awaited.
pub struct PendingOp<T> {
    handle: JoinHandle<Result<T>>,
}

impl<T> Future for PendingOp<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle).poll(cx).map(|joined| {
            joined.unwrap_or_else(|e| {
                Err(Error::RemoteOperationFailed(format!(
                    "round trip aborted: {}",
                    e
                )))
            })
        })
    }
}

/// True if `id` was issued locally and not yet replaced by the remote store
pub fn is_provisional(id: &str) -> bool {
    id.starts_with(PROVISIONAL_PREFIX)
}

/// Collection of records mirrored from a remote store.
///
/// Single-threaded: the collection lives behind an `Rc` and round trips are
/// spawned with `spawn_local`, so mutations must run inside a `LocalSet`.
pub struct OptimisticStore<T, R> {
    name: &'static str,
    items: Rc<watch::Sender<Vec<T>>>,
    /// Ids of `items` in the same order, plus records whose delete is still
    /// in flight at the position they were removed from
    order: Rc<RefCell<Vec<String>>>,
    remote: Rc<R>,
}

impl<T, R> OptimisticStore<T, R>
where
    T: Record + 'static,
    R: RemoteCollection<T> + 'static,
{
    /// Create an empty store. `name` only labels log events.
    pub fn new(name: &'static str, remote: R) -> Self {
        let (items, _) = watch::channel(Vec::new());
        Self {
            name,
            items: Rc::new(items),
            order: Rc::new(RefCell::new(Vec::new())),
            remote: Rc::new(remote),
        }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Copy of the current collection
    pub fn snapshot(&self) -> Vec<T> {
        self.items.borrow().clone()
    }

    /// Run `f` against the current collection without cloning it
    pub fn with_items<U>(&self, f: impl FnOnce(&[T]) -> U) -> U {
        f(&self.items.borrow())
    }

    /// Receiver that sees every change to the collection
    pub fn subscribe(&self) -> watch::Receiver<Vec<T>> {
        self.items.subscribe()
    }

    /// Replace the whole collection
    pub fn replace_all(&self, records: Vec<T>) {
        debug!(
            "event=store_replace store={} count={}",
            self.name,
            records.len()
        );
        *self.order.borrow_mut() = records.iter().map(|r| r.id().to_string()).collect();
        self.items.send_replace(records);
    }

    /// Fetch the full collection from the remote store and replace the local
    /// one. On failure the local collection is left untouched.
    pub async fn refresh(&self) -> Result<usize> {
        match self.remote.fetch_all().await {
            Ok(records) => {
                let count = records.len();
                self.replace_all(records);
                info!("event=store_refresh store={} status=ok count={}", self.name, count);
                Ok(count)
            }
            Err(err) => {
                warn!("event=store_refresh store={} status=error error={}", self.name, err);
                Err(err)
            }
        }
    }

    /// Insert `draft` at the front under a provisional identity, then create
    /// it remotely.
    ///
    /// On success the provisional record is replaced by the confirmed one.
    /// On failure it is removed again and the error is returned.
    pub fn add(&self, draft: T) -> PendingOp<T> {
        let provisional_id = format!("{}{}", PROVISIONAL_PREFIX, Uuid::new_v4());
        let mut record = draft;
        record.set_id(provisional_id.clone());

        self.order.borrow_mut().insert(0, provisional_id.clone());
        self.items.send_modify(|items| items.insert(0, record.clone()));
        debug!(
            "event=optimistic_add store={} id={}",
            self.name, provisional_id
        );

        let items = Rc::clone(&self.items);
        let order = Rc::clone(&self.order);
        let remote = Rc::clone(&self.remote);
        let name = self.name;

        let handle = tokio::task::spawn_local(async move {
            match remote.create(record).await {
                Ok(confirmed) => {
                    let replaced = items.send_if_modified(|items| {
                        match items.iter_mut().find(|r| r.id() == provisional_id) {
                            Some(slot) => {
                                *slot = confirmed.clone();
                                true
                            }
                            None => false,
                        }
                    });
                    if replaced {
                        if let Some(slot) = order
                            .borrow_mut()
                            .iter_mut()
                            .find(|o| **o == provisional_id)
                        {
                            *slot = confirmed.id().to_string();
                        }
                        debug!(
                            "event=add_confirmed store={} provisional_id={} id={}",
                            name,
                            provisional_id,
                            confirmed.id()
                        );
                    } else {
                        warn!(
                            "event=add_confirmed_orphan store={} provisional_id={} id={}",
                            name,
                            provisional_id,
                            confirmed.id()
                        );
                    }
                    Ok(confirmed)
                }
                Err(err) => {
                    order.borrow_mut().retain(|o| *o != provisional_id);
                    items.send_if_modified(|items| {
                        let before = items.len();
                        items.retain(|r| r.id() != provisional_id);
                        items.len() != before
                    });
                    warn!(
                        "event=add_rolled_back store={} id={} error={}",
                        name, provisional_id, err
                    );
                    Err(err)
                }
            }
        });
        PendingOp { handle }
    }

    /// Remove the record with `id` locally, then delete it remotely.
    ///
    /// On failure the exact record is put back after the nearest record that
    /// preceded it and is still present, or at the front if there is none.
    /// Removals that fail in any order therefore restore the original order.
    /// If a refresh brought the record back in the meantime it is left
    /// alone. The error is then returned.
    ///
    /// Unknown ids and records whose creation is still in flight are
    /// rejected up front, without touching the collection.
    pub fn remove(&self, id: &str) -> Result<PendingOp<()>> {
        if is_provisional(id) {
            return Err(Error::Validation(format!(
                "record {} is still being saved",
                id
            )));
        }

        let position = self
            .items
            .borrow()
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        let mut removed = None;
        self.items.send_modify(|items| removed = Some(items.remove(position)));
        let removed = removed.ok_or_else(|| Error::NotFound(id.to_string()))?;
        debug!(
            "event=optimistic_remove store={} id={} position={}",
            self.name, id, position
        );

        let items = Rc::clone(&self.items);
        let order = Rc::clone(&self.order);
        let remote = Rc::clone(&self.remote);
        let name = self.name;
        let id = id.to_string();

        let handle = tokio::task::spawn_local(async move {
            match remote.delete(&id).await {
                Ok(()) => {
                    if !items.borrow().iter().any(|r| r.id() == id) {
                        order.borrow_mut().retain(|o| *o != id);
                    }
                    debug!("event=remove_confirmed store={} id={}", name, id);
                    Ok(())
                }
                Err(err) => {
                    let restored = items.send_if_modified(|items| {
                        if items.iter().any(|r| r.id() == id) {
                            return false;
                        }
                        let mut order = order.borrow_mut();
                        let at = match order.iter().position(|o| *o == id) {
                            Some(slot) => order[..slot]
                                .iter()
                                .rev()
                                .find_map(|prev| items.iter().position(|r| r.id() == prev.as_str()))
                                .map_or(0, |i| i + 1),
                            None => {
                                let at = position.min(items.len());
                                let slot = at
                                    .checked_sub(1)
                                    .and_then(|p| order.iter().position(|o| o.as_str() == items[p].id()))
                                    .map_or(0, |s| s + 1);
                                order.insert(slot, id.clone());
                                at
                            }
                        };
                        items.insert(at, removed);
                        true
                    });
                    if restored {
                        warn!(
                            "event=remove_rolled_back store={} id={} error={}",
                            name, id, err
                        );
                    } else {
                        warn!(
                            "event=remove_rollback_skipped store={} id={} reason=already_present error={}",
                            name, id, err
                        );
                    }
                    Err(err)
                }
            }
        });
        Ok(PendingOp { handle })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{run_local, MemoryRemote};
    use chrono::{DateTime, Utc};

    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        id: String,
        text: String,
        at: DateTime<Utc>,
    }

    impl Record for Note {
        fn id(&self) -> &str {
            &self.id
        }

        fn set_id(&mut self, id: String) {
            self.id = id;
        }

        fn created_at(&self) -> DateTime<Utc> {
            self.at
        }
    }

    fn note(id: &str, text: &str) -> Note {
        Note {
            id: id.to_string(),
            text: text.to_string(),
            at: Utc::now(),
        }
    }

    fn store_with(notes: &[(&str, &str)]) -> OptimisticStore<Note, MemoryRemote<Note>> {
        let records: Vec<_> = notes.iter().map(|(id, text)| note(id, text)).collect();
        let remote = MemoryRemote::default();
        remote.seed(records.clone());
        let store = OptimisticStore::new("notes", remote);
        store.replace_all(records);
        store
    }

    fn ids(store: &OptimisticStore<Note, MemoryRemote<Note>>) -> Vec<String> {
        store.snapshot().into_iter().map(|n| n.id).collect()
    }

    #[tokio::test]
    async fn test_add_visible_before_remote_resolves() {
        run_local(async {
            let store = store_with(&[("r1", "one")]);

            let pending = store.add(note("", "two"));
            let snapshot = store.snapshot();
            assert_eq!(snapshot.len(), 2);
            assert!(is_provisional(&snapshot[0].id));
            assert_eq!(snapshot[0].text, "two");

            let confirmed = pending.await.unwrap();
            assert!(!is_provisional(&confirmed.id));
            assert_eq!(ids(&store), vec![confirmed.id.clone(), "r1".to_string()]);
            assert_eq!(store.remote().calls(), vec!["create"]);
        })
        .await;
    }

    #[tokio::test]
    async fn test_dropped_add_still_reaches_remote() {
        run_local(async {
            let store = store_with(&[("r1", "one")]);
            let mut rx = store.subscribe();

            drop(store.add(note("", "unattended")));
            rx.borrow_and_update();
            rx.changed().await.unwrap();

            assert_eq!(store.remote().calls(), vec!["create"]);
            let snapshot = store.snapshot();
            assert_eq!(snapshot.len(), 2);
            assert!(!is_provisional(&snapshot[0].id));
            assert_eq!(store.remote().records()[0].text, "unattended");
        })
        .await;
    }

    #[tokio::test]
    async fn test_dropped_remove_still_rolls_back() {
        run_local(async {
            let store = store_with(&[("r1", "one"), ("r2", "two")]);
            store.remote().fail_next_delete();
            let mut rx = store.subscribe();

            drop(store.remove("r1").unwrap());
            rx.borrow_and_update();
            assert_eq!(ids(&store), vec!["r2"]);

            rx.changed().await.unwrap();
            assert_eq!(store.remote().calls(), vec!["delete:r1"]);
            assert_eq!(ids(&store), vec!["r1", "r2"]);
        })
        .await;
    }

    #[tokio::test]
    async fn test_failed_add_rolls_back() {
        run_local(async {
            let store = store_with(&[("r1", "one")]);
            store.remote().fail_next_create();

            let pending = store.add(note("", "two"));
            assert_eq!(ids(&store).len(), 2);

            let err = pending.await.unwrap_err();
            assert!(matches!(err, Error::RemoteOperationFailed(_)));
            assert_eq!(ids(&store), vec!["r1"]);
        })
        .await;
    }

    #[tokio::test]
    async fn test_remove_visible_before_remote_resolves() {
        run_local(async {
            let store = store_with(&[("r1", "one"), ("r2", "two")]);

            let pending = store.remove("r1").unwrap();
            assert_eq!(ids(&store), vec!["r2"]);

            pending.await.unwrap();
            assert_eq!(ids(&store), vec!["r2"]);
        })
        .await;
    }

    #[tokio::test]
    async fn test_failed_remove_restores_position() {
        run_local(async {
            let store = store_with(&[("r1", "one"), ("r2", "two"), ("r3", "three")]);
            store.remote().fail_next_delete();

            let pending = store.remove("r2").unwrap();
            assert_eq!(ids(&store), vec!["r1", "r3"]);

            let err = pending.await.unwrap_err();
            assert!(err.is_remote());
            assert_eq!(ids(&store), vec!["r1", "r2", "r3"]);
            assert_eq!(store.snapshot()[1].text, "two");
        })
        .await;
    }

    #[tokio::test]
    async fn test_adjacent_removes_failing_in_reverse_keep_order() {
        run_local(async {
            let store = store_with(&[("a", "one"), ("b", "two"), ("c", "three")]);
            store.remote().set_unavailable(true);

            let remove_b = store.remove("b").unwrap();
            let remove_a = store.remove("a").unwrap();
            assert_eq!(ids(&store), vec!["c"]);

            assert!(remove_b.await.is_err());
            assert!(remove_a.await.is_err());
            assert_eq!(ids(&store), vec!["a", "b", "c"]);
        })
        .await;
    }

    #[tokio::test]
    async fn test_adjacent_removes_failing_in_order_keep_order() {
        run_local(async {
            let store = store_with(&[("a", "one"), ("b", "two"), ("c", "three")]);
            store.remote().set_unavailable(true);

            let remove_b = store.remove("b").unwrap();
            let remove_c = store.remove("c").unwrap();
            assert_eq!(ids(&store), vec!["a"]);

            assert!(remove_c.await.is_err());
            assert!(remove_b.await.is_err());
            assert_eq!(ids(&store), vec!["a", "b", "c"]);
        })
        .await;
    }

    #[tokio::test]
    async fn test_failed_remove_after_refresh_keeps_ids_unique() {
        run_local(async {
            let store = store_with(&[("a", "one"), ("b", "two")]);

            store.remote().fail_next_delete();
            let pending = store.remove("a").unwrap();
            assert_eq!(ids(&store), vec!["b"]);

            // The fetch is issued before the delete task gets to run
            assert_eq!(store.refresh().await.unwrap(), 2);
            assert!(pending.await.is_err());
            assert_eq!(ids(&store), vec!["a", "b"]);
        })
        .await;
    }

    #[tokio::test]
    async fn test_remove_unknown_id_is_rejected() {
        run_local(async {
            let store = store_with(&[("r1", "one")]);
            let err = store.remove("nope").err().unwrap();
            assert!(matches!(err, Error::NotFound(_)));
            assert_eq!(ids(&store), vec!["r1"]);
            assert!(store.remote().calls().is_empty());
        })
        .await;
    }

    #[tokio::test]
    async fn test_remove_provisional_is_rejected() {
        run_local(async {
            let store = store_with(&[]);
            let pending = store.add(note("", "draft"));
            let provisional = store.snapshot()[0].id.clone();

            let err = store.remove(&provisional).err().unwrap();
            assert!(matches!(err, Error::Validation(_)));
            assert_eq!(ids(&store).len(), 1);

            pending.await.unwrap();
        })
        .await;
    }

    #[tokio::test]
    async fn test_interleaved_adds_resolve_out_of_order() {
        run_local(async {
            let store = store_with(&[("r1", "one")]);
            let gate = store.remote().hold_create_when(|n: &Note| n.text == "first");
            store.remote().fail_create_when(|n: &Note| n.text == "first");

            let first = store.add(note("", "first"));
            let second = store.add(note("", "second"));
            assert_eq!(ids(&store).len(), 3);

            // The second round trip completes while the first is still parked
            let confirmed = second.await.unwrap();
            assert_eq!(store.remote().calls(), vec!["create", "create"]);
            let snapshot = store.snapshot();
            assert_eq!(snapshot[0].id, confirmed.id);
            assert!(is_provisional(&snapshot[1].id));
            assert_eq!(snapshot[1].text, "first");

            gate.notify_one();
            assert!(first.await.is_err());

            let snapshot = store.snapshot();
            assert_eq!(snapshot.len(), 2);
            assert_eq!(snapshot[0].id, confirmed.id);
            assert_eq!(snapshot[1].id, "r1");
        })
        .await;
    }

    #[tokio::test]
    async fn test_remove_rollback_does_not_disturb_later_add() {
        run_local(async {
            let store = store_with(&[("r1", "one"), ("r2", "two")]);
            store.remote().fail_next_delete();

            let removal = store.remove("r2").unwrap();
            let addition = store.add(note("", "three"));
            assert_eq!(ids(&store).len(), 2);

            addition.await.unwrap();
            removal.await.unwrap_err();

            let texts: Vec<_> = store.snapshot().into_iter().map(|n| n.text).collect();
            assert_eq!(texts, vec!["three", "one", "two"]);
        })
        .await;
    }

    #[tokio::test]
    async fn test_subscribers_see_optimistic_change() {
        run_local(async {
            let store = store_with(&[]);
            let mut rx = store.subscribe();
            rx.borrow_and_update();

            let pending = store.add(note("", "seen"));
            assert!(rx.has_changed().unwrap());
            assert_eq!(rx.borrow_and_update().len(), 1);

            pending.await.unwrap();
            assert!(rx.has_changed().unwrap());
        })
        .await;
    }

    #[tokio::test]
    async fn test_refresh_keeps_state_on_failure() {
        let store = store_with(&[("r1", "one")]);
        store.remote().fail_next_fetch();

        assert!(store.refresh().await.is_err());
        assert_eq!(ids(&store), vec!["r1"]);

        store.remote().seed(vec![note("s1", "from remote")]);
        assert_eq!(store.refresh().await.unwrap(), 1);
        assert_eq!(ids(&store), vec!["s1"]);
    }

    #[tokio::test]
    async fn test_confirmation_after_replace_is_dropped() {
        run_local(async {
            let store = store_with(&[]);
            let pending = store.add(note("", "late"));
            store.replace_all(vec![note("r9", "fresh")]);

            pending.await.unwrap();
            assert_eq!(ids(&store), vec!["r9"]);
        })
        .await;
    }
}
