use std::time::Duration;
use tokio::time::{interval, Interval, MissedTickBehavior};

/// Spaces out request issuance. Only the issuing loop waits on it; requests already issued keep
/// running.
pub(crate) struct Pacer {
    interval: Option<Interval>,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        let interval = (!delay.is_zero()).then(|| {
            let mut interval = interval(delay);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        Self { interval }
    }

    /// NOTE: The first wait completes instantly.
    pub async fn wait(&mut self) {
        if let Some(interval) = &mut self.interval {
            interval.tick().await;
        }
    }
}
