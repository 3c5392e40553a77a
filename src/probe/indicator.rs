//! Transient probe-result indicator
//!
//! Each TURN row owns one indicator. A probe acquires it before doing
//! any work, which also gates overlapping triggers on the same row;
//! publishing a result releases the row and schedules the reset back to
//! neutral after the display window.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tracing::debug;

/// How long a published result stays visible before reverting.
pub const INDICATOR_TTL: Duration = Duration::from_secs(7);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndicatorState {
    #[default]
    Neutral,
    Probing,
    Positive,
    Negative,
}

#[derive(Default)]
struct Inner {
    state: Mutex<IndicatorState>,
    in_flight: AtomicBool,
    // Bumped per probe so a stale reset task cannot clobber a newer result.
    epoch: AtomicU64,
}

/// Per-row tri-state result marker.
#[derive(Clone, Default)]
pub struct Indicator {
    inner: Arc<Inner>,
}

impl Indicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> IndicatorState {
        *self.inner.state.lock().expect("indicator poisoned")
    }

    /// Marks the row busy and returns the ticket the probe publishes
    /// through. Returns `None` while an earlier probe on this row is
    /// still in flight; the caller drops the trigger in that case.
    pub fn begin(&self) -> Option<ProbeTicket> {
        if self.inner.in_flight.swap(true, Ordering::AcqRel) {
            debug!("Probe already in flight on this row, ignoring trigger");
            return None;
        }

        self.inner.epoch.fetch_add(1, Ordering::AcqRel);
        *self.inner.state.lock().expect("indicator poisoned") = IndicatorState::Probing;
        Some(ProbeTicket {
            indicator: self.clone(),
            published: false,
        })
    }

    fn set_state(&self, state: IndicatorState) {
        *self.inner.state.lock().expect("indicator poisoned") = state;
    }
}

/// Held for the duration of exactly one probe invocation.
pub struct ProbeTicket {
    indicator: Indicator,
    published: bool,
}

impl ProbeTicket {
    /// Publishes the classification, releases the row and schedules the
    /// reset to neutral after [`INDICATOR_TTL`].
    pub fn publish(mut self, positive: bool) {
        self.published = true;

        let inner = &self.indicator.inner;
        let epoch = inner.epoch.load(Ordering::Acquire);
        self.indicator.set_state(if positive {
            IndicatorState::Positive
        } else {
            IndicatorState::Negative
        });
        inner.in_flight.store(false, Ordering::Release);

        let indicator = self.indicator.clone();
        tokio::spawn(async move {
            tokio::time::sleep(INDICATOR_TTL).await;
            let inner = &indicator.inner;
            // A newer probe owns the cell now; leave its result alone.
            if inner.epoch.load(Ordering::Acquire) == epoch
                && !inner.in_flight.load(Ordering::Acquire)
            {
                indicator.set_state(IndicatorState::Neutral);
            }
        });
    }
}

impl Drop for ProbeTicket {
    fn drop(&mut self) {
        if !self.published {
            // Abandoned probe: release the row without leaving a stale marker.
            self.indicator.set_state(IndicatorState::Neutral);
            self.indicator.inner.in_flight.store(false, Ordering::Release);
        }
    }
}
