//! Deferred deallocation for decoded stems
//!
//! Stem voices hold their decoded buffer in a `basedrop::Shared`. The output
//! mixer owns attached voices on the render thread and drops them there when
//! a session is unloaded; `Shared` turns that drop into a pointer enqueue and
//! the buffer itself is freed later on the `stem-gc` thread.
//!
//! ```ignore
//! use basedrop::Shared;
//! use crate::engine::gc::gc_handle;
//!
//! let buffer = Shared::new(&gc_handle(), decoded.buffer);
//! ```

use basedrop::{Collector, Handle};
use std::sync::mpsc;
use std::sync::OnceLock;
use std::thread;
use std::time::Duration;

/// Interval between collection passes
const COLLECT_INTERVAL: Duration = Duration::from_millis(100);

static GC_HANDLE: OnceLock<Handle> = OnceLock::new();

fn init_gc() -> Handle {
    let (tx, rx) = mpsc::channel();

    // Collector is !Sync, so it is created on and never leaves its thread
    thread::Builder::new()
        .name("stem-gc".to_string())
        .spawn(move || {
            let mut collector = Collector::new();
            tx.send(collector.handle()).expect("Failed to send GC handle");

            log::info!("Stem GC thread started");

            loop {
                collector.collect();
                thread::sleep(COLLECT_INTERVAL);
            }
        })
        .expect("Failed to spawn stem GC thread");

    rx.recv().expect("Failed to receive GC handle")
}

/// Handle for allocating `Shared<T>` values whose drop is deferred to the
/// collector thread. Starts the thread on first use.
pub fn gc_handle() -> Handle {
    GC_HANDLE.get_or_init(init_gc).clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use basedrop::Shared;

    #[test]
    fn test_shared_allocation_and_drop() {
        let data = Shared::new(&gc_handle(), vec![0.0f32; 1024]);
        let other = data.clone();
        assert_eq!(other.len(), 1024);
        drop(data);
        drop(other);
    }
}
