//! The poll scheduler.
//!
//! One `Monitor` drives the whole system: every poll interval it takes a
//! single consistent snapshot of all tracked locations, runs every spec
//! through the arrival state machine against that snapshot, and delivers
//! the produced events in batches. The loop is perpetual and only exits on
//! the shutdown channel, observed at the top of each iteration so a cycle
//! is never interrupted midway.

use chrono::{DateTime, Local};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use fam_core::{Event, EventKind, ExpectedFileSpec, Tracker, WindowPolicy};

use crate::config::MonitorConfig;
use crate::sink::EventSink;
use crate::snapshot::scan_locations;

/// The polling monitor: configuration, catalog, tracker, and sink.
pub struct Monitor<S> {
    config: MonitorConfig,
    specs: Vec<ExpectedFileSpec>,
    policy: WindowPolicy,
    tracker: Tracker,
    sink: S,
    pending: Vec<Event>,
}

impl<S: EventSink> Monitor<S> {
    /// Build a monitor from a validated config and catalog.
    pub fn new(config: MonitorConfig, specs: Vec<ExpectedFileSpec>, sink: S) -> Self {
        let policy = config.window_policy();
        let tracker = Tracker::new(config.retention_days);
        Self {
            config,
            specs,
            policy,
            tracker,
            sink,
            pending: Vec::new(),
        }
    }

    /// Number of expected-file specs under watch.
    pub fn spec_count(&self) -> usize {
        self.specs.len()
    }

    /// Run one poll pass: evict stale records, snapshot every location,
    /// evaluate every spec. Returns the events this pass produced.
    ///
    /// All events of one pass reflect the single snapshot taken at its
    /// start; a directory becoming unreadable mid-pass only affects the
    /// next cycle.
    pub fn poll_once(&mut self, now: DateTime<Local>) -> Vec<Event> {
        let evicted = self.tracker.evict_stale(now.date_naive());
        if evicted > 0 {
            log::debug!("evicted {evicted} tracking records past retention");
        }

        let snapshot = scan_locations(&self.config.locations, &self.config.input_extensions);
        log::debug!(
            "snapshot: {} input, {} archive, {} error files",
            snapshot.input.len(),
            snapshot.archive.len(),
            snapshot.error.len()
        );

        let mut produced = Vec::new();
        for spec in &self.specs {
            let expected_at = now.date_naive().and_time(spec.expected_time);
            let events = self.tracker.observe(spec, &snapshot, now, &self.policy);
            for event in &events {
                log::info!(
                    "{} for {} (client {}, category {})",
                    event.event_type.wire_name(),
                    event.file_name,
                    event.client_name,
                    event.category
                );
                if event.event_type == EventKind::Received
                    && !self
                        .policy
                        .within_expected_window(expected_at, now.naive_local())
                {
                    log::warn!("{} arrived outside its expected window", event.file_name);
                }
            }
            produced.extend(events);
        }
        produced
    }

    /// Drain the accumulator in batch-sized chunks. A failed batch is
    /// logged and dropped; later batches are still attempted.
    async fn flush(&mut self) {
        while !self.pending.is_empty() {
            let take = self.config.batch_size.min(self.pending.len());
            let batch: Vec<Event> = self.pending.drain(..take).collect();
            if let Err(e) = self.sink.submit(&batch).await {
                log::error!("dropping batch of {} events: {e}", batch.len());
            }
        }
    }

    /// Run the poll loop until the shutdown channel flips to true.
    ///
    /// Cancellation is cooperative and takes effect at the top of the next
    /// iteration, never mid-cycle. Anything still accumulated at shutdown
    /// is flushed before returning.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        log::info!(
            "monitor started: {} specs across {} location sets, polling every {}s",
            self.specs.len(),
            self.config.locations.len(),
            self.config.poll_interval_secs
        );

        let mut ticker = tokio::time::interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    // A closed channel means the controller is gone; treat
                    // it the same as an explicit stop.
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                _ = ticker.tick() => {}
            }

            let now = Local::now();
            let events = self.poll_once(now);
            self.pending.extend(events);
            self.flush().await;
        }

        self.flush().await;
        log::info!("monitor stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LocationSet;
    use crate::sink::MemorySink;
    use chrono::NaiveTime;
    use fam_core::EventKind;
    use fs_err as fs;
    use std::path::Path;

    fn test_config(root: &Path) -> MonitorConfig {
        let location = LocationSet {
            input: root.join("in"),
            archive: root.join("archive"),
            error: root.join("error"),
        };
        fs::create_dir_all(&location.input).unwrap();
        fs::create_dir_all(&location.archive).unwrap();
        fs::create_dir_all(&location.error).unwrap();

        MonitorConfig {
            api_key: String::new(),
            account_id: String::new(),
            catalog: root.join("checklist.toml"),
            locations: vec![location],
            input_extensions: vec!["txt".to_string(), "csv".to_string()],
            poll_interval_secs: 1,
            batch_size: 1,
            pre_window_secs: 120,
            post_window_secs: 120,
            missing_lead_secs: 15,
            in_progress_threshold_secs: 15,
            retention_days: 3,
        }
    }

    fn test_specs() -> Vec<ExpectedFileSpec> {
        let mut spec = ExpectedFileSpec::new(
            "FILE_<dateToken1>.csv",
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        );
        spec.client = "Acme".to_string();
        // Excluded on every weekday so a Missing event can never fire,
        // whatever wall-clock time the test happens to run at.
        spec.exclusion_weekdays = vec![
            chrono::Weekday::Mon,
            chrono::Weekday::Tue,
            chrono::Weekday::Wed,
            chrono::Weekday::Thu,
            chrono::Weekday::Fri,
            chrono::Weekday::Sat,
            chrono::Weekday::Sun,
        ];
        vec![spec]
    }

    #[test]
    fn test_poll_once_emits_received_for_arrived_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let name = format!(
            "FILE_{}.csv",
            Local::now().format("%Y%m%d")
        );
        fs::write(dir.path().join("in").join(&name), b"payload").unwrap();

        let mut monitor = Monitor::new(config, test_specs(), MemorySink::new());
        let events = monitor.poll_once(Local::now());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventKind::Received);
        assert_eq!(events[0].file_name, name);

        // Unchanged directory state: a second pass emits nothing new.
        let events = monitor.poll_once(Local::now());
        assert!(events.is_empty());
    }

    #[test]
    fn test_poll_once_with_empty_directories() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let mut monitor = Monitor::new(config, test_specs(), MemorySink::new());
        let events = monitor.poll_once(Local::now());
        assert!(events.is_empty());
        assert_eq!(monitor.spec_count(), 1);
    }

    #[tokio::test]
    async fn test_flush_drains_in_batch_sized_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.batch_size = 2;

        let sink = MemorySink::new();
        let mut monitor = Monitor::new(config, test_specs(), sink.clone());

        let spec = monitor.specs[0].clone();
        let expected_at = Local::now().date_naive().and_time(spec.expected_time);
        for i in 0..5 {
            monitor.pending.push(Event::new(
                EventKind::Received,
                &spec,
                format!("file-{i}"),
                expected_at,
                chrono::Utc::now(),
            ));
        }

        monitor.flush().await;
        let batches = sink.batches();
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].len(), 2);
        assert_eq!(batches[1].len(), 2);
        assert_eq!(batches[2].len(), 1);
        assert!(monitor.pending.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_delivers_and_stops_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let name = format!("FILE_{}.csv", Local::now().format("%Y%m%d"));
        fs::write(dir.path().join("in").join(&name), b"payload").unwrap();

        let sink = MemorySink::new();
        let mut monitor = Monitor::new(config, test_specs(), sink.clone());

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move { monitor.run(rx).await });

        // Let a few cycles run, then request shutdown.
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
        tx.send(true).unwrap();
        handle.await.unwrap();

        // Repeated cycles over unchanged directories deliver exactly one
        // Received event.
        let received: Vec<Event> = sink
            .events()
            .into_iter()
            .filter(|e| e.event_type == EventKind::Received)
            .collect();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].file_name, name);
    }
}
