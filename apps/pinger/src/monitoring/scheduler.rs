use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior, interval};

/// Fixed-cadence timer driving probe cycles and status publishes.
///
/// The first tick completes immediately. A tick missed because the previous
/// cycle overran is delayed rather than bursted, so cycles never overlap.
pub struct Ticker {
    interval: Interval,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    pub async fn tick(&mut self) -> Instant {
        self.interval.tick().await
    }

    pub fn period(&self) -> Duration {
        self.interval.period()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_is_immediate() {
        let start = Instant::now();
        let mut ticker = Ticker::new(Duration::from_secs(5));

        ticker.tick().await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        ticker.tick().await;
        assert_eq!(start.elapsed(), Duration::from_secs(5));
        assert_eq!(ticker.period(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overrun_delays_next_tick() {
        let start = Instant::now();
        let mut ticker = Ticker::new(Duration::from_secs(5));
        ticker.tick().await;

        // A cycle taking longer than the period
        tokio::time::sleep(Duration::from_secs(7)).await;
        ticker.tick().await;
        assert_eq!(start.elapsed(), Duration::from_secs(7));

        ticker.tick().await;
        assert_eq!(start.elapsed(), Duration::from_secs(12));
    }
}
