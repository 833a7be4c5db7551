// ============================================================
// Layer 5 - Model Replicas
// ============================================================
// One loaded checkpoint, cloned once per inference worker.
// Burn modules clone by sharing their parameter tensors, so a
// replica costs a handle, not a second copy of the weights.
//
//   worker 0 ──► slot 0 ─┐
//   worker 1 ──► slot 1 ─┼── same parameters
//   worker 2 ──► slot 2 ─┘
//
// A caller takes the first free slot, starting from a rotating
// index. Only when every slot is busy does it wait, and then on
// its own rotating slot. With as many replicas as workers, no
// worker ever waits on another.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};

pub struct ModelReplicas<M> {
    slots: Vec<Mutex<M>>,
    next:  AtomicUsize,
}

impl<M: Clone> ModelReplicas<M> {
    /// Clone `model` into `count` slots (at least one).
    pub fn new(model: M, count: usize) -> Self {
        let count = count.max(1);
        let mut slots = Vec::with_capacity(count);
        for _ in 1..count {
            slots.push(Mutex::new(model.clone()));
        }
        slots.push(Mutex::new(model));
        Self { slots, next: AtomicUsize::new(0) }
    }
}

impl<M> ModelReplicas<M> {
    pub fn count(&self) -> usize {
        self.slots.len()
    }

    /// Borrow a replica for one inference call.
    ///
    /// Inference only reads the model, so a slot poisoned by a
    /// panicking worker is still safe to reuse.
    pub fn acquire(&self) -> MutexGuard<'_, M> {
        let n     = self.slots.len();
        let start = self.next.fetch_add(1, Ordering::Relaxed) % n;

        for k in 0..n {
            match self.slots[(start + k) % n].try_lock() {
                Ok(guard) => return guard,
                Err(TryLockError::Poisoned(p)) => return p.into_inner(),
                Err(TryLockError::WouldBlock) => continue,
            }
        }
        self.slots[start].lock().unwrap_or_else(PoisonError::into_inner)
    }
}
