use crate::metrics::ChannelMetrics;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendError;

pub struct TrackedSender<T> {
    sender: mpsc::Sender<T>,
    len: Arc<AtomicUsize>,
    metrics: Option<ChannelMetrics>,
}

pub struct TrackedReceiver<T> {
    receiver: mpsc::Receiver<T>,
    len: Arc<AtomicUsize>,
    metrics: Option<ChannelMetrics>,
}

pub fn tracked_channel<T>(
    capacity: usize,
    metrics: Option<ChannelMetrics>,
) -> (TrackedSender<T>, TrackedReceiver<T>) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    let len = Arc::new(AtomicUsize::new(0));
    let sender = TrackedSender { sender, len: len.clone(), metrics: metrics.clone() };
    let receiver = TrackedReceiver { receiver, len, metrics };
    (sender, receiver)
}

impl<T> TrackedSender<T> {
    /// Waits for capacity rather than dropping: every delivered item reaches
    /// the receiver in order.
    pub async fn send(&self, value: T) -> Result<(), SendError<T>> {
        self.sender.send(value).await?;
        let len = self.len.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(metrics) = &self.metrics {
            metrics.inc_delivered();
            metrics.set_queue_depth(len);
        }
        Ok(())
    }
}

impl<T> TrackedReceiver<T> {
    /// `None` once the sending side is gone and the queue is drained.
    pub async fn recv(&mut self) -> Option<T> {
        let item = self.receiver.recv().await;
        if item.is_some() {
            let _ = self.len.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |value| {
                value.checked_sub(1)
            });
        }
        let len = self.len.load(Ordering::SeqCst);
        if let Some(metrics) = &self.metrics {
            metrics.set_queue_depth(len);
        }
        item
    }

    pub fn len(&self) -> usize {
        self.len.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
