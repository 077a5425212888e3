//! Debug-only reentrancy guard.
//!
//! The map calls into user code (the key comparer) while a chain is being
//! walked or relinked. A comparer that calls back into the same map would
//! observe it mid-operation. Debug builds turn that into a panic at the
//! point of reentry; release builds compile the guard away.

use core::cell::Cell;

/// Per-map tracker. Public entry points start with
/// `let _g = self.reentrancy.enter();`.
#[derive(Debug, Default)]
pub(crate) struct DebugReentrancy {
    #[cfg(debug_assertions)]
    active: Cell<bool>,
    // Cell keeps the map !Sync; it stays Send.
    #[cfg(not(debug_assertions))]
    _not_sync: core::marker::PhantomData<Cell<()>>,
}

impl DebugReentrancy {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(false),
            #[cfg(not(debug_assertions))]
            _not_sync: core::marker::PhantomData,
        }
    }

    /// Mark the map as busy until the returned guard drops. Panics in debug
    /// builds if it is already busy.
    #[inline]
    pub(crate) fn enter(&self) -> Entered<'_> {
        #[cfg(debug_assertions)]
        {
            assert!(
                !self.active.replace(true),
                "reentrancy detected: map accessed from inside its own comparer"
            );
            Entered { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            Entered {
                _owner: core::marker::PhantomData,
            }
        }
    }

    #[cfg(all(test, debug_assertions))]
    pub(crate) fn is_active(&self) -> bool {
        self.active.get()
    }
}

impl Clone for DebugReentrancy {
    // A clone is a separate map; it starts idle.
    fn clone(&self) -> Self {
        Self::new()
    }
}

/// RAII guard returned by [`DebugReentrancy::enter`].
pub(crate) struct Entered<'a> {
    #[cfg(debug_assertions)]
    owner: &'a DebugReentrancy,
    #[cfg(not(debug_assertions))]
    _owner: core::marker::PhantomData<&'a DebugReentrancy>,
}

impl Drop for Entered<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            let was_active = self.owner.active.replace(false);
            debug_assert!(was_active);
        }
    }
}
