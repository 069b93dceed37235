use std::time::Instant;

/// Monotonic-to-epoch clock synchronizer.
///
/// The device has no battery-backed clock; the broker's epoch time is
/// learned from the first timestamp it sends (the probe right after the
/// handshake, or the `createdAt` of the first verified message). Until
/// then `now()` is `None` and outbound stamping must be suppressed, since
/// the broker rejects messages created at epoch 0.
#[derive(Debug)]
pub struct ClockSync {
    started: Instant,
    offset: Option<u64>,
}

impl Default for ClockSync {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockSync {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            offset: None,
        }
    }

    /// Capture the offset from a remote epoch timestamp. Only the first
    /// nonzero timestamp counts; later ones are ignored so the local clock
    /// stays monotonic regardless of broker-side jitter.
    pub fn learn(&mut self, remote_epoch: u64) {
        if remote_epoch == 0 || self.offset.is_some() {
            return;
        }
        let offset = remote_epoch.saturating_sub(self.monotonic_seconds());
        tracing::debug!(remote_epoch, "clock offset learned");
        self.offset = Some(offset);
    }

    pub fn synchronized(&self) -> bool {
        self.offset.is_some()
    }

    /// Current epoch seconds, if an offset has been learned.
    pub fn now(&self) -> Option<u64> {
        self.offset.map(|o| o + self.monotonic_seconds())
    }

    fn monotonic_seconds(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}
