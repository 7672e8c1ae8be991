// SPDX-License-Identifier: GPL-3.0-only
//! Thread lifecycle management for device capture loops
//!
//! Devices deliver frames at their own pace, so their dequeue loop runs on a
//! dedicated thread while the pipeline stays on the caller's thread.

use crate::scheduler::LoopAction;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Controller for a capture loop running in a separate thread
pub struct CaptureLoop {
    thread_handle: Option<JoinHandle<()>>,
    stop_signal: Arc<AtomicBool>,
    name: String,
}

impl CaptureLoop {
    /// Start a new capture loop in a separate thread
    ///
    /// `loop_fn` is called repeatedly until it returns `LoopAction::Stop` or
    /// the controller is stopped.
    pub fn start<F>(name: &str, mut loop_fn: F) -> Self
    where
        F: FnMut() -> LoopAction + Send + 'static,
    {
        Self::start_with_init(name, || Ok(()), move |_: &mut ()| loop_fn())
    }

    /// Start a capture loop whose state is built on the capture thread
    ///
    /// If `init_fn` fails the thread exits without running `loop_fn`. The
    /// state never leaves the capture thread, so it does not need to be `Send`.
    pub fn start_with_init<S, I, F>(name: &str, init_fn: I, mut loop_fn: F) -> Self
    where
        S: 'static,
        I: FnOnce() -> Result<S, String> + Send + 'static,
        F: FnMut(&mut S) -> LoopAction + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop_signal);
        let thread_name = name.to_string();

        info!(name = %name, "Starting capture loop");

        let thread_handle = thread::spawn(move || {
            let mut state = match init_fn() {
                Ok(s) => s,
                Err(e) => {
                    warn!(name = %thread_name, error = %e, "Capture loop initialization failed");
                    return;
                }
            };

            while !thread_stop.load(Ordering::SeqCst) {
                if loop_fn(&mut state) == LoopAction::Stop {
                    debug!(name = %thread_name, "Loop requested stop");
                    break;
                }
            }

            info!(name = %thread_name, "Capture loop thread exiting");
        });

        Self {
            thread_handle: Some(thread_handle),
            stop_signal,
            name: name.to_string(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Signal the loop to stop without waiting for it
    pub fn request_stop(&self) {
        debug!(name = %self.name, "Requesting capture loop stop");
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Stop the loop and wait for the thread to finish
    pub fn stop(&mut self) {
        self.request_stop();
        self.join();
    }

    /// Wait for the thread to finish without sending the stop signal
    pub fn join(&mut self) {
        if let Some(handle) = self.thread_handle.take()
            && handle.join().is_err()
        {
            warn!(name = %self.name, "Capture loop thread panicked");
        }
    }
}

impl Drop for CaptureLoop {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            debug!(name = %self.name, "CaptureLoop dropped, stopping loop");
            self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    #[test]
    fn test_loop_stops_itself() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = Arc::clone(&counter);

        let mut capture = CaptureLoop::start("test-loop", move || {
            if counter_clone.fetch_add(1, Ordering::SeqCst) >= 10 {
                LoopAction::Stop
            } else {
                LoopAction::Continue
            }
        });

        capture.join();
        assert_eq!(counter.load(Ordering::SeqCst), 11);
        assert!(!capture.is_running());
    }

    #[test]
    fn test_stop_signal() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = Arc::clone(&counter);

        let mut capture = CaptureLoop::start("test-loop", move || {
            counter_clone.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(5));
            LoopAction::Continue
        });

        thread::sleep(Duration::from_millis(30));
        capture.stop();
        let after_stop = counter.load(Ordering::SeqCst);
        assert!(after_stop > 0);

        thread::sleep(Duration::from_millis(20));
        assert_eq!(counter.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn test_state_built_on_capture_thread() {
        let result = Arc::new(AtomicU32::new(0));
        let result_clone = Arc::clone(&result);

        // Rc is not Send, it only has to live on the capture thread
        let mut capture = CaptureLoop::start_with_init(
            "test-init-loop",
            || Ok(std::rc::Rc::new(42u32)),
            move |state| {
                result_clone.store(**state, Ordering::SeqCst);
                LoopAction::Stop
            },
        );

        capture.join();
        assert_eq!(result.load(Ordering::SeqCst), 42);
    }

    #[test]
    fn test_init_failure_skips_loop() {
        let ran = Arc::new(AtomicBool::new(false));
        let ran_clone = Arc::clone(&ran);

        let mut capture = CaptureLoop::start_with_init(
            "test-fail-init",
            || Err::<(), _>("device busy".to_string()),
            move |_: &mut ()| {
                ran_clone.store(true, Ordering::SeqCst);
                LoopAction::Stop
            },
        );

        capture.join();
        assert!(!ran.load(Ordering::SeqCst));
    }
}
