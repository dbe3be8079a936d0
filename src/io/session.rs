use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::{HierarchyError, Result};
use crate::io::store::StoreConnector;

/// When a [`StoreSession`] acquires and releases its store handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleMode {
    /// Acquire on first use and keep the handle until [`StoreSession::release`].
    #[default]
    Lazy,
    /// Only [`StoreSession::init`] and [`StoreSession::release`] change the
    /// handle; using the store while released is an error.
    Manual,
    /// Acquire before every operation and release right after it.
    Wrap,
}

struct State<S> {
    mode: HandleMode,
    handle: Option<Arc<S>>,
}

/// Owns the connection to a hierarchy store and gates every call into it.
///
/// Acquire and release are serialized by one lock. Operations run on a
/// shared handle outside the lock, so concurrent uses of an acquired
/// handle are not serialized here.
pub struct StoreSession<C: StoreConnector> {
    connector: C,
    state: Mutex<State<C::Store>>,
}

impl<C: StoreConnector> StoreSession<C> {
    pub fn new(connector: C, mode: HandleMode) -> Self {
        StoreSession {
            connector,
            state: Mutex::new(State { mode, handle: None }),
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn mode(&self) -> HandleMode {
        self.lock().mode
    }

    /// Switch modes. An acquired handle stays acquired.
    pub fn set_mode(&self, mode: HandleMode) {
        let mut state = self.lock();
        log::debug!("store session mode {:?} -> {:?}", state.mode, mode);
        state.mode = mode;
    }

    pub fn is_acquired(&self) -> bool {
        self.lock().handle.is_some()
    }

    /// Acquire the store handle. Does nothing if it is already acquired.
    pub fn init(&self) -> Result<()> {
        let mut state = self.lock();
        self.acquire(&mut state).map(drop)
    }

    /// Drop the store handle. Safe to call in any state.
    pub fn release(&self) {
        let mut state = self.lock();
        if state.handle.take().is_some() {
            log::debug!("store handle released");
        }
    }

    /// Run `op` against the store, acquiring and releasing as the mode
    /// requires. In `Wrap` mode the handle is released even if `op` fails
    /// or panics.
    pub fn run<T>(&self, op: impl FnOnce(&C::Store) -> Result<T>) -> Result<T> {
        let (store, mode) = {
            let mut state = self.lock();
            let store = match state.mode {
                HandleMode::Lazy | HandleMode::Wrap => self.acquire(&mut state)?,
                HandleMode::Manual => state.handle.clone().ok_or(HierarchyError::StoreUnavailable)?,
            };
            (store, state.mode)
        };
        let _release = (mode == HandleMode::Wrap).then(|| ReleaseGuard { session: self });
        op(&store)
    }

    fn acquire(&self, state: &mut State<C::Store>) -> Result<Arc<C::Store>> {
        if let Some(handle) = &state.handle {
            return Ok(Arc::clone(handle));
        }
        let handle = Arc::new(self.connector.connect()?);
        log::debug!("store handle acquired ({:?} mode)", state.mode);
        state.handle = Some(Arc::clone(&handle));
        Ok(handle)
    }

    fn lock(&self) -> MutexGuard<'_, State<C::Store>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct ReleaseGuard<'s, C: StoreConnector> {
    session: &'s StoreSession<C>,
}

impl<C: StoreConnector> Drop for ReleaseGuard<'_, C> {
    fn drop(&mut self) {
        self.session.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::store::HierarchyStore;
    use crate::model::HierarchyScope;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        connects: AtomicUsize,
    }

    struct Handle;

    impl HierarchyStore for Handle {
        fn fetch_subtree(&self, _: Option<&str>, _: HierarchyScope) -> Result<String> {
            Ok(String::new())
        }

        fn fetch_parent_id(&self, _: &str) -> Result<String> {
            Err(HierarchyError::Store("no parent".to_string()))
        }
    }

    impl StoreConnector for Counting {
        type Store = Handle;

        fn connect(&self) -> Result<Handle> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(Handle)
        }
    }

    fn connects(session: &StoreSession<Counting>) -> usize {
        session.connector().connects.load(Ordering::SeqCst)
    }

    #[test]
    fn test_lazy_acquires_once() {
        let session = StoreSession::new(Counting::default(), HandleMode::Lazy);
        assert!(!session.is_acquired());
        session.run(|_| Ok(())).unwrap();
        session.run(|_| Ok(())).unwrap();
        assert!(session.is_acquired());
        assert_eq!(connects(&session), 1);

        session.release();
        assert!(!session.is_acquired());
        session.run(|_| Ok(())).unwrap();
        assert_eq!(connects(&session), 2);
    }

    #[test]
    fn test_manual_requires_init() {
        let session = StoreSession::new(Counting::default(), HandleMode::Manual);
        let err = session.run(|_| Ok(())).unwrap_err();
        assert!(matches!(err, HierarchyError::StoreUnavailable));
        assert_eq!(connects(&session), 0);

        session.init().unwrap();
        session.init().unwrap();
        session.run(|_| Ok(())).unwrap();
        assert_eq!(connects(&session), 1);

        session.release();
        session.release();
        assert!(matches!(session.run(|_| Ok(())), Err(HierarchyError::StoreUnavailable)));
    }

    #[test]
    fn test_wrap_releases_after_failure() {
        let session = StoreSession::new(Counting::default(), HandleMode::Wrap);
        let err = session
            .run(|store| store.fetch_parent_id("x"))
            .unwrap_err();
        assert!(matches!(err, HierarchyError::Store(_)));
        assert!(!session.is_acquired());

        session.run(|_| Ok(())).unwrap();
        assert!(!session.is_acquired());
        assert_eq!(connects(&session), 2);
    }

    #[test]
    fn test_set_mode_keeps_handle() {
        let session = StoreSession::new(Counting::default(), HandleMode::Lazy);
        session.init().unwrap();
        session.set_mode(HandleMode::Manual);
        assert_eq!(session.mode(), HandleMode::Manual);
        session.run(|_| Ok(())).unwrap();
        assert_eq!(connects(&session), 1);
    }

    #[test]
    fn test_concurrent_init_connects_once() {
        let session = StoreSession::new(Counting::default(), HandleMode::Manual);
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| session.init().unwrap());
            }
        });
        assert_eq!(connects(&session), 1);
    }
}
