//! Message bus: the queue pair between chat adapters and the agent.
//!
//! Adapters publish [`InboundMessage`]s; the agent publishes
//! [`OutboundMessage`]s which the channel manager's dispatch loop drains.
//! Both directions are bounded `tokio::sync::mpsc` queues. Consumers take the
//! receiver lock only for the duration of one `recv`, so `consume_*` is
//! cancellation-safe and can be raced against a timeout.

use tokio::sync::{Mutex, mpsc};

use crate::channel::{InboundMessage, OutboundMessage};

/// Default queue depth for each direction.
pub const DEFAULT_CAPACITY: usize = 256;

pub struct MessageBus {
    inbound_tx: mpsc::Sender<InboundMessage>,
    inbound_rx: Mutex<mpsc::Receiver<InboundMessage>>,
    outbound_tx: mpsc::Sender<OutboundMessage>,
    outbound_rx: Mutex<mpsc::Receiver<OutboundMessage>>,
}

impl MessageBus {
    /// Create a bus whose queues hold up to `capacity` messages each.
    pub fn new(capacity: usize) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel(capacity);
        let (outbound_tx, outbound_rx) = mpsc::channel(capacity);
        Self {
            inbound_tx,
            inbound_rx: Mutex::new(inbound_rx),
            outbound_tx,
            outbound_rx: Mutex::new(outbound_rx),
        }
    }

    /// Queue a message from a chat platform. Waits while the queue is full.
    pub async fn publish_inbound(&self, msg: InboundMessage) {
        // The bus owns both ends, so the queue never closes while `self` lives.
        let _ = self.inbound_tx.send(msg).await;
    }

    /// Take the next inbound message, waiting until one is available.
    pub async fn consume_inbound(&self) -> Option<InboundMessage> {
        self.inbound_rx.lock().await.recv().await
    }

    /// Queue a reply for delivery. Waits while the queue is full.
    pub async fn publish_outbound(&self, msg: OutboundMessage) {
        let _ = self.outbound_tx.send(msg).await;
    }

    /// Take the next outbound message, waiting until one is available.
    ///
    /// There is no internal timeout; callers that need to observe shutdown
    /// wrap this in `tokio::time::timeout`.
    pub async fn consume_outbound(&self) -> Option<OutboundMessage> {
        self.outbound_rx.lock().await.recv().await
    }

    /// Messages waiting in the inbound queue.
    pub fn inbound_size(&self) -> usize {
        self.inbound_tx.max_capacity() - self.inbound_tx.capacity()
    }

    /// Messages waiting in the outbound queue.
    pub fn outbound_size(&self) -> usize {
        self.outbound_tx.max_capacity() - self.outbound_tx.capacity()
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn outbound_is_fifo() {
        let bus = MessageBus::new(8);
        bus.publish_outbound(OutboundMessage::new("telegram", "c1", "first")).await;
        bus.publish_outbound(OutboundMessage::new("telegram", "c1", "second")).await;
        assert_eq!(bus.outbound_size(), 2);

        assert_eq!(bus.consume_outbound().await.unwrap().content, "first");
        assert_eq!(bus.consume_outbound().await.unwrap().content, "second");
        assert_eq!(bus.outbound_size(), 0);
    }

    #[tokio::test]
    async fn inbound_round_trip() {
        let bus = MessageBus::default();
        bus.publish_inbound(InboundMessage::new("discord", "u1", "c1", "hey")).await;
        let msg = bus.consume_inbound().await.unwrap();
        assert_eq!(msg.channel, "discord");
        assert_eq!(msg.content, "hey");
    }

    #[tokio::test(start_paused = true)]
    async fn consume_waits_without_timing_out() {
        let bus = MessageBus::new(4);
        let waited = tokio::time::timeout(Duration::from_secs(5), bus.consume_outbound()).await;
        assert!(waited.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_consume_does_not_lose_messages() {
        let bus = MessageBus::new(4);
        let _ = tokio::time::timeout(Duration::from_millis(10), bus.consume_outbound()).await;
        bus.publish_outbound(OutboundMessage::new("feishu", "c", "kept")).await;
        assert_eq!(bus.consume_outbound().await.unwrap().content, "kept");
    }
}
