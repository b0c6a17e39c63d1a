//! Scopes: bounded units of work that cache `Scoped` dependencies together.

use crate::core::Instance;
use crate::error::{Error, Result};
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Opaque identifier of a scope. Unique for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u64);

impl ScopeId {
  fn next() -> Self {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    Self(COUNTER.fetch_add(1, Ordering::Relaxed))
  }

  pub fn get(&self) -> u64 {
    self.0
  }
}

impl fmt::Display for ScopeId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "scope-{}", self.0)
  }
}

/// A cancellable unit of work.
///
/// Scopes begun with `Container::begin_scope_with` are torn down when their
/// token is cancelled. Cancelling does not interrupt a construction that is
/// already running.
#[derive(Clone, Default)]
pub struct CancellationToken {
  inner: Arc<CancelInner>,
}

type Callback = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct CancelInner {
  cancelled: AtomicBool,
  next: AtomicU64,
  callbacks: Mutex<HashMap<u64, Callback>>,
}

impl CancellationToken {
  pub fn new() -> Self {
    Self::default()
  }

  /// Cancels the token and runs every registered callback once.
  pub fn cancel(&self) {
    if self.inner.cancelled.swap(true, Ordering::AcqRel) {
      return;
    }
    let callbacks = std::mem::take(&mut *self.inner.callbacks.lock());
    for (_, callback) in callbacks {
      callback();
    }
  }

  pub fn is_cancelled(&self) -> bool {
    self.inner.cancelled.load(Ordering::Acquire)
  }

  /// Runs `f` when the token is cancelled, or right away if it already is.
  ///
  /// Returns an id for `remove_callback`. An id returned after cancellation
  /// refers to nothing.
  pub fn on_cancel(&self, f: impl FnOnce() + Send + 'static) -> u64 {
    let id = self.inner.next.fetch_add(1, Ordering::Relaxed);
    let mut callbacks = self.inner.callbacks.lock();
    if self.is_cancelled() {
      drop(callbacks);
      f();
    } else {
      callbacks.insert(id, Box::new(f));
    }
    id
  }

  /// Unregisters a callback that has not run yet. Returns `false` if it
  /// already ran or was removed.
  pub fn remove_callback(&self, id: u64) -> bool {
    self.inner.callbacks.lock().remove(&id).is_some()
  }

  /// Number of callbacks waiting for cancellation.
  pub fn pending_callbacks(&self) -> usize {
    self.inner.callbacks.lock().len()
  }
}

impl fmt::Debug for CancellationToken {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CancellationToken")
      .field("cancelled", &self.is_cancelled())
      .finish()
  }
}

type Slot = Arc<OnceCell<Instance>>;

#[derive(Default)]
struct ScopeCache {
  entries: Mutex<HashMap<String, Slot>>,
}

/// The per-container store of active scopes and their cached instances.
#[derive(Default)]
pub struct ScopeStore {
  scopes: DashMap<ScopeId, Arc<ScopeCache>>,
}

impl ScopeStore {
  pub(crate) fn begin(&self) -> ScopeId {
    let id = ScopeId::next();
    self.scopes.insert(id, Arc::default());
    tracing::debug!(target: "fibre_inject", scope = id.get(), "scope started");
    id
  }

  /// Discards the cache of `id`. Returns `false` if it was already ended.
  pub(crate) fn end(&self, id: ScopeId) -> bool {
    let ended = self.scopes.remove(&id).is_some();
    if ended {
      tracing::debug!(target: "fibre_inject", scope = id.get(), "scope ended");
    }
    ended
  }

  pub fn is_active(&self, id: ScopeId) -> bool {
    self.scopes.contains_key(&id)
  }

  /// Number of scopes that have begun and not yet ended.
  pub fn active_scopes(&self) -> usize {
    self.scopes.len()
  }

  /// The instance cached for `name` in scope `id`, if any.
  pub fn get(&self, id: ScopeId, name: &str) -> Option<Instance> {
    let cache = self.cache(id).ok()?;
    let slot = cache.entries.lock().get(name).cloned()?;
    slot.get().cloned()
  }

  /// Caches `value` for `name` in scope `id`, replacing any previous entry.
  pub fn put(&self, id: ScopeId, name: &str, value: Instance) -> Result<()> {
    let cache = self.cache(id)?;
    cache
      .entries
      .lock()
      .insert(name.to_owned(), Arc::new(OnceCell::with_value(value)));
    Ok(())
  }

  /// The cell holding `name` in scope `id`, created empty on first use.
  ///
  /// The entries lock is released before the caller initializes the cell,
  /// so constructing one scoped dependency may resolve others in the same
  /// scope.
  pub(crate) fn slot(&self, id: ScopeId, name: &str) -> Result<Slot> {
    let cache = self.cache(id)?;
    let mut entries = cache.entries.lock();
    Ok(entries.entry(name.to_owned()).or_default().clone())
  }

  fn cache(&self, id: ScopeId) -> Result<Arc<ScopeCache>> {
    self
      .scopes
      .get(&id)
      .map(|cache| cache.value().clone())
      .ok_or(Error::ScopeNotActive(id))
  }
}

/// An active scope.
///
/// Pass the handle to `Container::get_scoped` so that nested resolutions
/// share `Scoped` instances. The scope ends when `end` is called, when the
/// handle is dropped, or when its cancellation token is cancelled, whichever
/// happens first. Later teardown attempts are no-ops.
pub struct ScopeHandle {
  id: ScopeId,
  store: Arc<ScopeStore>,
  cancellation: Option<CancellationToken>,
  callback: Option<u64>,
}

impl ScopeHandle {
  pub(crate) fn new(store: Arc<ScopeStore>, cancellation: Option<CancellationToken>) -> Self {
    let id = store.begin();
    let callback = cancellation.as_ref().map(|token| {
      let weak: Weak<ScopeStore> = Arc::downgrade(&store);
      token.on_cancel(move || {
        if let Some(store) = weak.upgrade() {
          store.end(id);
        }
      })
    });
    Self {
      id,
      store,
      cancellation,
      callback,
    }
  }

  pub fn id(&self) -> ScopeId {
    self.id
  }

  pub fn is_active(&self) -> bool {
    self.store.is_active(self.id)
  }

  pub fn cancellation(&self) -> Option<&CancellationToken> {
    self.cancellation.as_ref()
  }

  /// Ends the scope, releasing every instance it cached.
  pub fn end(self) {
    // Drop does the work.
  }
}

impl Drop for ScopeHandle {
  fn drop(&mut self) {
    self.store.end(self.id);
    if let (Some(token), Some(callback)) = (&self.cancellation, self.callback) {
      token.remove_callback(callback);
    }
  }
}

impl fmt::Debug for ScopeHandle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ScopeHandle")
      .field("id", &self.id)
      .field("active", &self.is_active())
      .finish()
  }
}
