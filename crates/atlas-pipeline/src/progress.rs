//! Progress notifications.
//!
//! The bus is a bounded `tokio::sync::broadcast` channel. Every acquisition
//! publishes [`ProgressEvent::Progress`] while downloading, a final `100` on
//! success, and [`ProgressEvent::Finished`] once the job is settled either way.
//! A subscriber that falls behind skips the events it missed.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::warn;

use atlas_types::ModelId;

/// Outbound `{modelId, progress}` notification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub model_id: ModelId,
    /// Percentage in `0..=100`, two decimals.
    pub progress: f64,
}

impl ProgressUpdate {
    pub fn new(model_id: ModelId, percent: f64) -> Self {
        Self {
            model_id,
            progress: round2(percent.clamp(0.0, 100.0)),
        }
    }

    /// Percentage from byte counts.
    pub fn from_bytes(model_id: ModelId, received: u64, total: u64) -> Self {
        let ratio = if total == 0 {
            1.0
        } else {
            received as f64 / total as f64
        };
        Self::new(model_id, ratio * 100.0)
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[derive(Clone, Debug, PartialEq)]
pub enum ProgressEvent {
    Progress(ProgressUpdate),
    Finished { model_id: ModelId, ok: bool },
}

impl ProgressEvent {
    pub fn model_id(&self) -> &ModelId {
        match self {
            Self::Progress(u) => &u.model_id,
            Self::Finished { model_id, .. } => model_id,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ProgressBus {
    tx: broadcast::Sender<ProgressEvent>,
}

impl ProgressBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, update: ProgressUpdate) {
        // No subscribers is not an error.
        let _ = self.tx.send(ProgressEvent::Progress(update));
    }

    pub fn finish(&self, model_id: ModelId, ok: bool) {
        let _ = self.tx.send(ProgressEvent::Finished { model_id, ok });
    }

    /// Every event for every model.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.tx.subscribe()
    }

    /// Updates for one model, ending after its job settles.
    pub fn subscribe_model(&self, model_id: ModelId) -> ProgressSubscription {
        ProgressSubscription {
            rx: self.tx.subscribe(),
            model_id,
            done: false,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ProgressBus {
    fn default() -> Self {
        Self::new(256)
    }
}

/// A finite stream of one model's progress.
#[derive(Debug)]
pub struct ProgressSubscription {
    rx: broadcast::Receiver<ProgressEvent>,
    model_id: ModelId,
    done: bool,
}

impl ProgressSubscription {
    pub fn model_id(&self) -> &ModelId {
        &self.model_id
    }

    /// Next update, or `None` once the job settled or the bus closed.
    pub async fn next(&mut self) -> Option<ProgressUpdate> {
        while !self.done {
            match self.rx.recv().await {
                Ok(ProgressEvent::Progress(u)) if u.model_id == self.model_id => return Some(u),
                Ok(ProgressEvent::Finished { model_id, .. }) if model_id == self.model_id => {
                    self.done = true;
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(model = %self.model_id, skipped, "progress subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => self.done = true,
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_decimal_precision() {
        let u = ProgressUpdate::from_bytes(ModelId::from("m"), 1, 3);
        assert_eq!(u.progress, 33.33);
        assert_eq!(ProgressUpdate::new(ModelId::from("m"), 150.0).progress, 100.0);
    }

    #[test]
    fn wire_shape() {
        let json = serde_json::to_value(ProgressUpdate::new(ModelId::from("GPe"), 12.5)).unwrap();
        assert_eq!(json, serde_json::json!({"modelId": "GPe", "progress": 12.5}));
    }

    #[tokio::test]
    async fn model_subscription_filters_and_ends() {
        let bus = ProgressBus::new(16);
        let mut sub = bus.subscribe_model(ModelId::from("a"));
        bus.publish(ProgressUpdate::new(ModelId::from("b"), 10.0));
        bus.publish(ProgressUpdate::new(ModelId::from("a"), 50.0));
        bus.publish(ProgressUpdate::new(ModelId::from("a"), 100.0));
        bus.finish(ModelId::from("a"), true);
        bus.publish(ProgressUpdate::new(ModelId::from("a"), 1.0));

        assert_eq!(sub.next().await.unwrap().progress, 50.0);
        assert_eq!(sub.next().await.unwrap().progress, 100.0);
        assert!(sub.next().await.is_none());
        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn lagging_subscriber_skips_ahead() {
        let bus = ProgressBus::new(2);
        let mut sub = bus.subscribe_model(ModelId::from("a"));
        for i in 0..5 {
            bus.publish(ProgressUpdate::new(ModelId::from("a"), i as f64));
        }
        bus.finish(ModelId::from("a"), false);
        let mut seen = Vec::new();
        while let Some(u) = sub.next().await {
            seen.push(u.progress);
        }
        assert_eq!(seen, [4.0]);
    }
}
