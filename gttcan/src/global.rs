//! Optional module-level singleton for hosts that call into GTTCAN from a
//! bare interrupt vector rather than threading a `&mut Gttcan<H>` through
//! their own dispatch code. Uses a `spin::Mutex` for shared state that
//! exists before any scheduler or async runtime is available to hand out
//! references.

use spin::Mutex;

use gttcan_hal::Callbacks;

use crate::node::Gttcan;

/// A lazily-populated, mutex-guarded node slot. Start empty; call
/// [`GlobalNode::set`] once during boot, then [`GlobalNode::with`] from
/// each interrupt vector.
pub struct GlobalNode<H: Callbacks> {
    inner: Mutex<Option<Gttcan<H>>>,
}

impl<H: Callbacks> GlobalNode<H> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    /// Installs a constructed node, replacing whatever was there before.
    pub fn set(&self, node: Gttcan<H>) {
        *self.inner.lock() = Some(node);
    }

    /// Runs `f` with exclusive access to the installed node. Does nothing
    /// if no node has been installed yet (e.g. an interrupt fires before
    /// boot finishes calling [`GlobalNode::set`]).
    pub fn with<R>(&self, f: impl FnOnce(&mut Gttcan<H>) -> R) -> Option<R> {
        self.inner.lock().as_mut().map(f)
    }
}

impl<H: Callbacks> Default for GlobalNode<H> {
    fn default() -> Self {
        Self::new()
    }
}
