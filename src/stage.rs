// Copyright (c) 2023 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

//! Background worker scaffolding shared by every long-running stage
//! (colormap generation, converter application, vectorization,
//! optimization): a "calculating flag + single lock + is_newest_available"
//! model over one background `std::thread`, mirroring the teacher's
//! single-lock state-holder pattern. The foreground never blocks on
//! [`Stage::poll`].

use std::sync::{Arc, Mutex};
use std::thread;

struct Inner<T> {
    calculating: bool,
    result: Option<T>,
    newest_available: bool,
}

/// A generic background stage. `T` is the result type a completed
/// computation publishes.
pub struct Stage<T> {
    inner: Arc<Mutex<Inner<T>>>,
}

impl<T: Send + 'static> Default for Stage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> Stage<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                calculating: false,
                result: None,
                newest_available: false,
            })),
        }
    }

    #[must_use]
    pub fn is_calculating(&self) -> bool {
        self.inner.lock().expect("stage lock poisoned").calculating
    }

    #[must_use]
    pub fn is_newest_available(&self) -> bool {
        self.inner
            .lock()
            .expect("stage lock poisoned")
            .newest_available
    }

    /// Starts `work` on a background thread. Refuses to start (returns
    /// `false`) while a prior computation is still running — starting
    /// a new one is forbidden until the previous reports completion,
    /// per the cooperative-cancellation model.
    pub fn submit<F>(&self, work: F) -> bool
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let mut guard = self.inner.lock().expect("stage lock poisoned");
        if guard.calculating {
            return false;
        }
        guard.calculating = true;
        guard.newest_available = false;
        drop(guard);

        let inner = Arc::clone(&self.inner);
        thread::spawn(move || {
            let result = work();
            let mut guard = inner.lock().expect("stage lock poisoned");
            guard.result = Some(result);
            guard.calculating = false;
            guard.newest_available = true;
        });
        true
    }

    /// Invalidates the current result without starting new work, used
    /// when upstream inputs change while nothing is running yet.
    pub fn invalidate(&self) {
        let mut guard = self.inner.lock().expect("stage lock poisoned");
        guard.newest_available = false;
    }

    /// Returns the last published result without blocking. `None`
    /// while calculating or once invalidated — callers needing a
    /// result right now should poll again rather than spin-wait on the
    /// foreground thread.
    #[must_use]
    pub fn poll(&self) -> Option<T>
    where
        T: Clone,
    {
        let guard = self.inner.lock().expect("stage lock poisoned");
        if guard.calculating || !guard.newest_available {
            return None;
        }
        guard.result.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn poll_is_none_until_work_completes() {
        let stage: Stage<i32> = Stage::new();
        assert!(stage.poll().is_none());
        stage.submit(|| {
            thread::sleep(Duration::from_millis(20));
            42
        });
        assert!(stage.is_calculating());
        while stage.is_calculating() {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(stage.poll(), Some(42));
    }

    #[test]
    fn submit_refuses_while_calculating() {
        let stage: Stage<i32> = Stage::new();
        stage.submit(|| {
            thread::sleep(Duration::from_millis(50));
            1
        });
        assert!(!stage.submit(|| 2));
        while stage.is_calculating() {
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn invalidate_clears_newest_available() {
        let stage: Stage<i32> = Stage::new();
        stage.submit(|| 7);
        while stage.is_calculating() {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(stage.is_newest_available());
        stage.invalidate();
        assert!(!stage.is_newest_available());
        assert!(stage.poll().is_none());
    }
}
