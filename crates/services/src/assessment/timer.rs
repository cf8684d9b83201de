use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use super::engine::EngineMessage;

/// Spawn the countdown source: one `Tick` per `period` until the receiver is gone.
pub(super) fn spawn_countdown(
    period: Duration,
    tx: UnboundedSender<EngineMessage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if tx.send(EngineMessage::Tick).is_err() {
                break;
            }
        }
    })
}
