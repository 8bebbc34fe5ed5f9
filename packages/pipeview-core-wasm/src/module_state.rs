use lazy_static::lazy_static;
use parking_lot::ReentrantMutex;
use std::cell::RefCell;

use crate::config::ViewerConfig;
use crate::engine::ViewerEngine;

// The page drives a single viewer, so the engine behind the wasm exports is a
// process-wide instance. Everything runs on the page's one thread; the lock only
// satisfies the `static` requirements and guards against re-entrant borrows.
pub struct ModuleState;

lazy_static! {
    static ref MODULE_STATE: ReentrantMutex<RefCell<ViewerEngine>> =
        ReentrantMutex::new(RefCell::new(ViewerEngine::new(ViewerConfig::default())));
}

impl ModuleState {
    pub fn with_mut<F, R>(f: F) -> R
    where
        F: FnOnce(&mut ViewerEngine) -> R,
    {
        let guard = MODULE_STATE.lock();
        let mut borrow = guard.borrow_mut();
        f(&mut borrow)
    }

    pub fn with<F, R>(f: F) -> R
    where
        F: FnOnce(&ViewerEngine) -> R,
    {
        let guard = MODULE_STATE.lock();
        let borrow = guard.borrow();
        f(&borrow)
    }

    /// Drop every loaded resource and start over with `config`.
    pub fn reset(config: ViewerConfig) {
        Self::with_mut(|engine| *engine = ViewerEngine::new(config));
    }
}
