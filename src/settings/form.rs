//! TURN server list editing
//!
//! Row-oriented view over the TURN entry list. Each row pairs its
//! settings entry with the transient probe indicator; removing or
//! reordering rows keeps indicator and entry together.

use tracing::debug;

use crate::probe::connector::IceConnector;
use crate::probe::indicator::Indicator;
use crate::probe::{ProbeReport, ProbeRequest, Prober};

use super::TurnServer;

/// One editable TURN row with its probe indicator.
#[derive(Clone, Default)]
pub struct TurnRow {
    pub entry: TurnServer,
    pub indicator: Indicator,
}

impl TurnRow {
    pub fn new(entry: TurnServer) -> Self {
        Self {
            entry,
            indicator: Indicator::new(),
        }
    }
}

/// The list of TURN rows being edited.
#[derive(Default)]
pub struct TurnForm {
    rows: Vec<TurnRow>,
}

impl TurnForm {
    pub fn from_entries(entries: Vec<TurnServer>) -> Self {
        Self {
            rows: entries.into_iter().map(TurnRow::new).collect(),
        }
    }

    pub fn rows(&self) -> &[TurnRow] {
        &self.rows
    }

    /// Appends a blank row for the user to fill in.
    pub fn add_row(&mut self) -> &TurnRow {
        self.rows.push(TurnRow::default());
        self.rows.last().expect("row just pushed")
    }

    pub fn remove_row(&mut self, index: usize) -> Option<TurnRow> {
        if index < self.rows.len() {
            Some(self.rows.remove(index))
        } else {
            None
        }
    }

    /// Replaces the entry at `index`, keeping the row's indicator.
    pub fn update_row(&mut self, index: usize, entry: TurnServer) -> bool {
        match self.rows.get_mut(index) {
            Some(row) => {
                row.entry = entry;
                true
            }
            None => false,
        }
    }

    /// The entries in their current order, for persisting.
    pub fn entries(&self) -> Vec<TurnServer> {
        self.rows.iter().map(|r| r.entry.clone()).collect()
    }

    /// Probes the row at `index` against its current, possibly unsaved,
    /// values and publishes the classification through the row's
    /// indicator. Returns `None` when the index is out of range or a
    /// probe on that row is already in flight.
    pub async fn trigger_probe<C: IceConnector>(
        &self,
        index: usize,
        prober: &Prober<C>,
    ) -> Option<ProbeReport> {
        let row = self.rows.get(index)?;
        let request = ProbeRequest {
            server: row.entry.server.clone(),
            secret: row.entry.secret.clone(),
            transports: row.entry.protocols.transports().to_vec(),
        };

        // Incomplete rows never touch the indicator.
        if !request.is_actionable() {
            debug!(index, "TURN row incomplete, probe skipped");
            return Some(ProbeReport::skipped());
        }

        let ticket = row.indicator.begin()?;
        let report = prober.run(&request).await;
        ticket.publish(report.relay_found());
        Some(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ProbeOutcome;
    use crate::probe::connector::{GatherEvent, IceSession, RelayTarget};
    use crate::probe::indicator::IndicatorState;
    use crate::probe::{GATHER_TIMEOUT, ProbeError};
    use crate::settings::TransportSet;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replays a fixed candidate line then completes.
    struct OneShotConnector {
        line: &'static str,
        connects: Arc<AtomicUsize>,
    }

    struct OneShotSession {
        events: Vec<GatherEvent>,
    }

    #[async_trait]
    impl IceSession for OneShotSession {
        async fn negotiate(&mut self) -> Result<(), ProbeError> {
            Ok(())
        }

        async fn next_event(&mut self) -> Option<GatherEvent> {
            if self.events.is_empty() {
                None
            } else {
                Some(self.events.remove(0))
            }
        }

        async fn close(&mut self) {}
    }

    #[async_trait]
    impl IceConnector for OneShotConnector {
        async fn connect(&self, _target: RelayTarget) -> Result<Box<dyn IceSession>, ProbeError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(OneShotSession {
                events: vec![
                    GatherEvent::Candidate(self.line.to_string()),
                    GatherEvent::GatheringComplete,
                ],
            }))
        }
    }

    fn relay_prober(connects: Arc<AtomicUsize>) -> Prober<OneShotConnector> {
        Prober::new(OneShotConnector {
            line: "candidate:1 1 udp 16777215 203.0.113.5 50000 typ relay",
            connects,
        })
    }

    fn filled_entry() -> TurnServer {
        TurnServer {
            server: "turn.example.com".to_string(),
            secret: "s3cr3t".to_string(),
            protocols: TransportSet::UdpAndTcp,
        }
    }

    #[test]
    fn test_row_editing() {
        let mut form = TurnForm::from_entries(vec![filled_entry()]);
        assert_eq!(form.rows().len(), 1);

        form.add_row();
        assert_eq!(form.rows().len(), 2);
        assert_eq!(form.rows()[1].entry, TurnServer::default());

        assert!(form.update_row(
            1,
            TurnServer {
                server: "turn2.example.com".to_string(),
                ..filled_entry()
            }
        ));
        assert!(!form.update_row(5, filled_entry()));

        let removed = form.remove_row(0).expect("remove");
        assert_eq!(removed.entry, filled_entry());
        assert_eq!(form.entries().len(), 1);
        assert_eq!(form.entries()[0].server, "turn2.example.com");

        assert!(form.remove_row(7).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_publishes_through_row_indicator() {
        let connects = Arc::new(AtomicUsize::new(0));
        let form = TurnForm::from_entries(vec![filled_entry()]);
        let prober = relay_prober(connects.clone());

        let report = form.trigger_probe(0, &prober).await.expect("report");
        assert_eq!(report.outcome, ProbeOutcome::Reachable);
        assert_eq!(connects.load(Ordering::SeqCst), 1);
        assert_eq!(form.rows()[0].indicator.state(), IndicatorState::Positive);

        // Result reverts after the display window.
        tokio::time::sleep(GATHER_TIMEOUT).await;
        assert_eq!(form.rows()[0].indicator.state(), IndicatorState::Neutral);
    }

    #[tokio::test]
    async fn test_incomplete_row_skips_without_touching_indicator() {
        let connects = Arc::new(AtomicUsize::new(0));
        let form = TurnForm::from_entries(vec![TurnServer {
            server: "turn.example.com".to_string(),
            secret: String::new(),
            protocols: TransportSet::Udp,
        }]);
        let prober = relay_prober(connects.clone());

        let report = form.trigger_probe(0, &prober).await.expect("report");
        assert_eq!(report.outcome, ProbeOutcome::Skipped);
        assert_eq!(connects.load(Ordering::SeqCst), 0);
        assert_eq!(form.rows()[0].indicator.state(), IndicatorState::Neutral);
    }

    #[tokio::test]
    async fn test_out_of_range_row_is_ignored() {
        let connects = Arc::new(AtomicUsize::new(0));
        let form = TurnForm::from_entries(vec![filled_entry()]);
        let prober = relay_prober(connects.clone());

        assert!(form.trigger_probe(3, &prober).await.is_none());
        assert_eq!(connects.load(Ordering::SeqCst), 0);
    }
}
