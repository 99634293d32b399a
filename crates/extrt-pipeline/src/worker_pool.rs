//! Shared worker pool for Transform stages (spec §4.3, §5).
//!
//! A fresh set of scoped OS threads is spawned per Transform-stage
//! invocation and joined before the stage returns, giving the "single
//! shared pool, tasks complete before the stage returns" semantics of
//! spec §5 without a hand-rolled channel-based thread pool.

pub struct WorkerPool {
    size: usize,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        Self { size: size.max(1) }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Apply `f` to every item, data-parallel across up to `size` threads.
    /// `f` must confine its mutation to the single item it is given (spec
    /// §5 "no cross-item aliasing").
    pub fn map_mut<T, F>(&self, items: &mut [T], f: F)
    where
        T: Send,
        F: Fn(&mut T) + Sync,
    {
        if items.is_empty() {
            return;
        }
        let chunk_size = items.len().div_ceil(self.size).max(1);
        std::thread::scope(|scope| {
            for chunk in items.chunks_mut(chunk_size) {
                let f = &f;
                scope.spawn(move || {
                    for item in chunk {
                        f(item);
                    }
                });
            }
        });
    }
}
