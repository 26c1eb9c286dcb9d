use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Binary "one run in flight" resource.
///
/// Acquisition never blocks: a caller either gets a [`SlotGuard`] or is told
/// the slot is busy. The guard releases the slot when dropped, so release
/// happens on every exit path of the run that owns it, unwinding included.
#[derive(Clone, Debug, Default)]
pub struct ExecutionSlot {
    held: Arc<AtomicBool>,
}

impl ExecutionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self) -> Option<SlotGuard> {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SlotGuard {
                held: self.held.clone(),
            })
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

/// Proof of slot ownership. Dropping it frees the slot.
#[derive(Debug)]
pub struct SlotGuard {
    held: Arc<AtomicBool>,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.held.store(false, Ordering::Release);
    }
}
