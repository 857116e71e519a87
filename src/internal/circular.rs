//! Circular resolution detection infrastructure.

use std::cell::RefCell;

use crate::error::{DiError, DiResult};

const MAX_DEPTH: usize = 1024;

// Thread-local resolution state for circular resolution detection
thread_local! {
    static RESOLUTION_TLS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Guard for one frame of the thread-local resolution stack.
///
/// Entering a name that is already on the stack fails with
/// [`DiError::CircularResolution`] carrying the full path. The frame is popped
/// when the guard is dropped, including on early returns.
pub(crate) struct StackGuard {
    depth: usize,
}

impl StackGuard {
    pub(crate) fn enter(name: &str) -> DiResult<Self> {
        RESOLUTION_TLS.with(|tls| {
            let mut stack = tls.borrow_mut();

            if stack.iter().any(|n| n == name) {
                let mut path = stack.clone();
                path.push(name.to_string());
                return Err(DiError::CircularResolution(path));
            }

            // Depth guard
            if stack.len() >= MAX_DEPTH {
                let mut path = stack.clone();
                path.push(name.to_string());
                return Err(DiError::CircularResolution(path));
            }

            stack.push(name.to_string());
            Ok(Self { depth: stack.len() })
        })
    }
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        RESOLUTION_TLS.with(|tls| {
            let mut stack = tls.borrow_mut();
            debug_assert_eq!(stack.len(), self.depth);
            stack.truncate(self.depth.saturating_sub(1));
        });
    }
}

/// Runs `f` with `name` pushed on the resolution stack.
pub(crate) fn with_circular_guard<T, F>(name: &str, f: F) -> DiResult<T>
where
    F: FnOnce() -> DiResult<T>,
{
    let _guard = StackGuard::enter(name)?;
    f()
}
