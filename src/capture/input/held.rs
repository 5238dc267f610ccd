use parking_lot::Mutex as ParkingMutex;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Keys currently held down, shared between the listener and the sampler.
///
/// Every access goes through one mutex. Readers copy the set out and release
/// the lock before doing anything slow.
#[derive(Debug, Clone, Default)]
pub struct HeldKeys {
    inner: Arc<ParkingMutex<BTreeSet<String>>>,
}

impl HeldKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&self, name: &str) {
        let mut held = self.inner.lock();
        if !held.contains(name) {
            held.insert(name.to_string());
        }
    }

    pub fn release(&self, name: &str) {
        self.inner.lock().remove(name);
    }

    /// Sorted copy of the held set at this instant
    pub fn snapshot(&self) -> BTreeSet<String> {
        self.inner.lock().clone()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

/// One-way stop flag raised by the listener and polled by the sampler
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    flag: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_release() {
        let held = HeldKeys::new();
        held.press("w");
        held.press("left_shift");
        held.press("w");
        held.release("left_shift");
        held.release("q");

        let snapshot: Vec<String> = held.snapshot().into_iter().collect();
        assert_eq!(snapshot, vec!["w".to_string()]);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let held = HeldKeys::new();
        held.press("a");
        let snapshot = held.snapshot();
        held.press("d");
        assert_eq!(snapshot.len(), 1);
        assert_eq!(held.snapshot().len(), 2);
    }

    #[test]
    fn test_snapshot_is_sorted() {
        let held = HeldKeys::new();
        for key in ["w", "d", "left_shift", "a"] {
            held.press(key);
        }
        let snapshot: Vec<String> = held.snapshot().into_iter().collect();
        assert_eq!(snapshot, vec!["a", "d", "left_shift", "w"]);
    }

    #[test]
    fn test_shared_across_threads() {
        let held = HeldKeys::new();
        let stop = StopSignal::new();

        let writer = {
            let held = held.clone();
            let stop = stop.clone();
            std::thread::spawn(move || {
                for i in 0..1000 {
                    held.press("w");
                    if i % 2 == 0 {
                        held.release("w");
                    }
                }
                stop.trigger();
            })
        };

        writer.join().unwrap();
        assert!(stop.is_triggered());
        assert!(held.snapshot().contains("w"));
    }
}
