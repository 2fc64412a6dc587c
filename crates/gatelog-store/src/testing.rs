//! Scripted in-memory remote collection

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

use tokio::sync::Notify;
use tokio::task::LocalSet;

use gatelog_domain::repository::RemoteCollection;
use gatelog_types::{Error, Record, Result};

type CreatePredicate<T> = Box<dyn Fn(&T) -> bool>;

/// Drive `test` inside a fresh `LocalSet` so optimistic round trips can be
/// spawned
pub async fn run_local<F: Future>(test: F) -> F::Output {
    LocalSet::new().run_until(test).await
}

/// In-memory stand-in for a remote store with injectable failures.
///
/// Assigns ids `r-1`, `r-2`, ... and records every call it receives.
pub struct MemoryRemote<T> {
    records: RefCell<Vec<T>>,
    next_id: Cell<u64>,
    unavailable: Cell<bool>,
    fail_fetch: Cell<bool>,
    fail_create: Cell<bool>,
    fail_delete: Cell<bool>,
    fail_create_when: RefCell<Option<CreatePredicate<T>>>,
    hold_create_when: RefCell<Option<(CreatePredicate<T>, Rc<Notify>)>>,
    calls: RefCell<Vec<String>>,
}

impl<T> Default for MemoryRemote<T> {
    fn default() -> Self {
        Self {
            records: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
            unavailable: Cell::new(false),
            fail_fetch: Cell::new(false),
            fail_create: Cell::new(false),
            fail_delete: Cell::new(false),
            fail_create_when: RefCell::new(None),
            hold_create_when: RefCell::new(None),
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl<T: Record> MemoryRemote<T> {
    pub fn seed(&self, records: Vec<T>) {
        *self.records.borrow_mut() = records;
    }

    pub fn records(&self) -> Vec<T> {
        self.records.borrow().clone()
    }

    /// Calls received so far: `fetch`, `create`, `delete:<id>`
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Every call fails with `RemoteUnavailable` while set
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.set(unavailable);
    }

    pub fn fail_next_fetch(&self) {
        self.fail_fetch.set(true);
    }

    pub fn fail_next_create(&self) {
        self.fail_create.set(true);
    }

    pub fn fail_next_delete(&self) {
        self.fail_delete.set(true);
    }

    /// Reject every create whose record matches `predicate`
    pub fn fail_create_when(&self, predicate: impl Fn(&T) -> bool + 'static) {
        *self.fail_create_when.borrow_mut() = Some(Box::new(predicate));
    }

    /// Park every create whose record matches `predicate` until the returned
    /// gate is notified once per held call
    pub fn hold_create_when(&self, predicate: impl Fn(&T) -> bool + 'static) -> Rc<Notify> {
        let gate = Rc::new(Notify::new());
        *self.hold_create_when.borrow_mut() = Some((Box::new(predicate), Rc::clone(&gate)));
        gate
    }

    fn check(&self, call: String, fail_flag: &Cell<bool>) -> Result<()> {
        self.calls.borrow_mut().push(call.clone());
        if self.unavailable.get() {
            return Err(Error::RemoteUnavailable("memory remote is offline".to_string()));
        }
        if fail_flag.replace(false) {
            return Err(Error::RemoteOperationFailed(format!("{} rejected", call)));
        }
        Ok(())
    }
}

impl<T: Record> RemoteCollection<T> for MemoryRemote<T> {
    async fn fetch_all(&self) -> Result<Vec<T>> {
        self.check("fetch".to_string(), &self.fail_fetch)?;
        Ok(self.records())
    }

    async fn create(&self, mut record: T) -> Result<T> {
        self.check("create".to_string(), &self.fail_create)?;
        let gate = self
            .hold_create_when
            .borrow()
            .as_ref()
            .filter(|(predicate, _)| predicate(&record))
            .map(|(_, gate)| Rc::clone(gate));
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let rejected = self
            .fail_create_when
            .borrow()
            .as_ref()
            .map(|predicate| predicate(&record))
            .unwrap_or(false);
        if rejected {
            return Err(Error::RemoteOperationFailed("create rejected".to_string()));
        }

        let id = self.next_id.get();
        self.next_id.set(id + 1);
        record.set_id(format!("r-{}", id));
        self.records.borrow_mut().insert(0, record.clone());
        Ok(record)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.check(format!("delete:{}", id), &self.fail_delete)?;
        let mut records = self.records.borrow_mut();
        let before = records.len();
        records.retain(|r| r.id() != id);
        if records.len() == before {
            return Err(Error::RemoteOperationFailed(format!("no record {}", id)));
        }
        Ok(())
    }
}
