use std::time::Duration;

use tokio::time::sleep;

/// Fixed pauses inserted before storage access to model network latency.
///
/// Every value is a flat delay, not a jittered distribution: the layer
/// simulates a request/response round trip, nothing more. `zero()` turns the
/// simulation off for tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyProfile {
    pub login: Duration,
    pub read: Duration,
    pub write: Duration,
    pub profile_read: Duration,
}

impl Default for LatencyProfile {
    fn default() -> Self {
        Self {
            login: Duration::from_millis(800),
            read: Duration::from_millis(300),
            write: Duration::from_millis(400),
            profile_read: Duration::from_millis(500),
        }
    }
}

impl LatencyProfile {
    pub fn zero() -> Self {
        Self {
            login: Duration::ZERO,
            read: Duration::ZERO,
            write: Duration::ZERO,
            profile_read: Duration::ZERO,
        }
    }

    pub(crate) async fn login_delay(&self) {
        pause(self.login).await;
    }

    pub(crate) async fn read_delay(&self) {
        pause(self.read).await;
    }

    pub(crate) async fn write_delay(&self) {
        pause(self.write).await;
    }

    pub(crate) async fn profile_delay(&self) {
        pause(self.profile_read).await;
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        sleep(duration).await;
    }
}
