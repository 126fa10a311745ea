//! Queue worker: one dedicated thread per transport.
//!
//! Runs an `edge-executor` with a single drain task that sleeps on the
//! queue's ready signal, then processes packets until the queue is
//! empty.
//!
//! ```text
//!  ┌────────────────────────────────────────────────┐
//!  │  smp-worker thread                             │
//!  │  ┌──────────────────────────────────────────┐  │
//!  │  │  futures_lite::block_on                  │  │
//!  │  │  ┌────────────────────────────────────┐  │  │
//!  │  │  │  edge_executor::LocalExecutor      │  │  │
//!  │  │  │   drain: wait_ready → process_pending │  │
//!  │  │  └────────────────────────────────────┘  │  │
//!  │  └──────────────────────────────────────────┘  │
//!  └────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::thread::JoinHandle;

use log::{info, warn};

use super::transport::{SmpTransport, Transport};

/// Drain task: wake on enqueue, process, repeat until stopped.
async fn drain_loop<T: Transport>(smp: Arc<SmpTransport<T>>) {
    loop {
        smp.queue().wait_ready().await;
        if smp.queue().is_stopped() {
            break;
        }
        smp.process_pending();
    }
}

fn run_worker<T: Transport + 'static>(smp: Arc<SmpTransport<T>>) {
    let executor: edge_executor::LocalExecutor<'_, 8> = edge_executor::LocalExecutor::new();
    let task = executor.spawn(drain_loop(smp));

    info!("SMP[worker]: started");
    futures_lite::future::block_on(executor.run(task));
    info!("SMP[worker]: stopped");
}

/// Handle to a running worker thread.
pub struct Worker<T: Transport + 'static> {
    smp: Arc<SmpTransport<T>>,
    thread: Option<JoinHandle<()>>,
}

impl<T: Transport + 'static> Worker<T> {
    /// Spawn the worker thread for `smp`.
    pub fn spawn(smp: Arc<SmpTransport<T>>) -> std::io::Result<Self> {
        let worker_smp = Arc::clone(&smp);
        let thread = std::thread::Builder::new()
            .name("smp-worker".into())
            .spawn(move || run_worker(worker_smp))?;
        Ok(Self {
            smp,
            thread: Some(thread),
        })
    }

    pub fn transport(&self) -> &Arc<SmpTransport<T>> {
        &self.smp
    }

    /// Stop the worker and wait for the thread to exit. Packets still
    /// queued stay queued.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.smp.shutdown();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("SMP[worker]: thread panicked");
            }
        }
    }
}

impl<T: Transport + 'static> Drop for Worker<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ── Tests ─────────────────────────────────────────────────────
