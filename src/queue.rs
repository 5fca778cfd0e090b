//! Bounded task queue: decouples the acceptor from the worker pool.
//!
//! The original design is a hand-rolled ring buffer guarded by a mutex and
//! two condition variables (`not_empty`, `not_full`). `tokio::sync::mpsc`
//! already *is* that structure, scheduled cooperatively instead of by OS
//! thread wakeups, so `enqueue`/`dequeue` here are thin wrappers that
//! preserve the original names and FIFO/backpressure contract rather than
//! reimplementing the ring buffer on top of the channel.

use tokio::net::TcpStream;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::sync::Mutex;

pub struct TaskSender(Sender<TcpStream>);

impl TaskSender {
    /// Enqueues `stream`, suspending (not blocking the runtime) while the
    /// queue is full. Returns `Err` only once every receiver has been
    /// dropped, i.e. after shutdown has fully drained the worker pool.
    pub async fn enqueue(&self, stream: TcpStream) -> Result<(), TcpStream> {
        self.0.send(stream).await.map_err(|e| e.0)
    }

    /// Closes the sending half, the async equivalent of broadcasting on
    /// `not_empty` after flipping the running flag: every worker blocked in
    /// `dequeue` observes the channel closing once it has drained. Takes
    /// `self` by value since dropping the `Sender` is what actually closes
    /// the channel; a `&self` method has nothing to drop.
    pub fn close(self) {
        drop(self.0);
    }
}

/// The receiving half is shared by every worker. `mpsc::Receiver` is not
/// `Clone`, so workers contend for a single `Mutex<Receiver<_>>` instead —
/// the lock is only ever held across the (usually instantaneous) `recv`
/// call, not across request handling.
pub struct TaskReceiver(Mutex<Receiver<TcpStream>>);

impl TaskReceiver {
    /// Dequeues the next client socket, or `None` once the queue is closed
    /// and drained — the signal for a worker to exit its service loop.
    pub async fn dequeue(&self) -> Option<TcpStream> {
        self.0.lock().await.recv().await
    }
}

/// Builds a bounded task queue with the given capacity (`max_clients`).
pub fn channel(capacity: usize) -> (TaskSender, TaskReceiver) {
    let (tx, rx) = tokio::sync::mpsc::channel(capacity);
    (TaskSender(tx), TaskReceiver(Mutex::new(rx)))
}
