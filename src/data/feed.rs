//! Background record loading for interactive front-ends.
//!
//! `RecordFeed` exposes the `{ data, loading, error, refetch }` shape the
//! dashboard consumes. Fetches run on a worker thread and report back over a
//! channel; the UI calls [`RecordFeed::poll`] once per tick.
//!
//! Every `refetch` gets a new generation number. Only the result of the most
//! recent generation is applied, so a slow stale response can never overwrite
//! a newer one. Older fetches are not cancelled, their results are dropped.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use chrono::{DateTime, Local};

use crate::data::RecordSource;
use crate::domain::Record;
use crate::error::FetchError;

struct FetchOutcome {
    generation: u64,
    result: Result<Vec<Record>, FetchError>,
}

pub struct RecordFeed {
    source: Arc<dyn RecordSource>,
    tx: Sender<FetchOutcome>,
    rx: Receiver<FetchOutcome>,
    generation: u64,
    records: Vec<Record>,
    loading: bool,
    error: Option<String>,
    fetched_at: Option<DateTime<Local>>,
    stale_responses: usize,
}

impl RecordFeed {
    /// Create an idle feed. Call [`RecordFeed::refetch`] to start loading.
    pub fn new(source: Arc<dyn RecordSource>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            source,
            tx,
            rx,
            generation: 0,
            records: Vec::new(),
            loading: false,
            error: None,
            fetched_at: None,
            stale_responses: 0,
        }
    }

    /// Start a new fetch. Returns its generation.
    pub fn refetch(&mut self) -> u64 {
        self.generation += 1;
        self.loading = true;
        self.error = None;

        let generation = self.generation;
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        tracing::debug!(generation, source = %source.describe(), "starting fetch");

        thread::spawn(move || {
            let result = source.fetch_records();
            // The receiver is gone only when the feed was dropped.
            let _ = tx.send(FetchOutcome { generation, result });
        });

        generation
    }

    /// Apply any finished fetches. Returns `true` if visible state changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(outcome) = self.rx.try_recv() {
            changed |= self.apply(outcome);
        }
        changed
    }

    fn apply(&mut self, outcome: FetchOutcome) -> bool {
        if outcome.generation != self.generation {
            self.stale_responses += 1;
            tracing::debug!(
                generation = outcome.generation,
                latest = self.generation,
                "ignoring stale fetch result"
            );
            return false;
        }

        self.loading = false;
        match outcome.result {
            Ok(records) => {
                tracing::info!(records = records.len(), "records loaded");
                self.records = records;
                self.error = None;
                self.fetched_at = Some(Local::now());
            }
            Err(err) => {
                tracing::error!("error fetching billing data: {err}");
                self.error = Some(err.message().to_string());
            }
        }
        true
    }

    pub fn data(&self) -> &[Record] {
        &self.records
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn fetched_at(&self) -> Option<DateTime<Local>> {
        self.fetched_at
    }

    /// Number of fetch results dropped because a newer fetch had started.
    pub fn stale_responses(&self) -> usize {
        self.stale_responses
    }

    pub fn source_description(&self) -> String {
        self.source.describe()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    use super::*;

    fn record(name: &str) -> Record {
        Record {
            customer_name: name.to_string(),
            mobile_number: String::new(),
            billing_period: "January 2024".to_string(),
            milk_quantity: 1.0,
            price_per_liter: 1.0,
            total_amount: 1.0,
        }
    }

    /// Each call takes the next scripted response and blocks until released.
    struct GatedSource {
        script: Mutex<VecDeque<(Receiver<()>, Result<Vec<Record>, FetchError>)>>,
    }

    impl GatedSource {
        fn new() -> Self {
            Self {
                script: Mutex::new(VecDeque::new()),
            }
        }

        fn push(&self, result: Result<Vec<Record>, FetchError>) -> Sender<()> {
            let (gate_tx, gate_rx) = mpsc::channel();
            self.script.lock().unwrap().push_back((gate_rx, result));
            gate_tx
        }
    }

    impl RecordSource for GatedSource {
        fn describe(&self) -> String {
            "gated".to_string()
        }

        fn fetch_records(&self) -> Result<Vec<Record>, FetchError> {
            let (gate, result) = self.script.lock().unwrap().pop_front().unwrap();
            gate.recv().unwrap();
            result
        }
    }

    fn wait_for_pending(source: &GatedSource, remaining: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while source.script.lock().unwrap().len() != remaining {
            assert!(Instant::now() < deadline, "worker did not start in time");
            thread::sleep(Duration::from_millis(5));
        }
    }

    fn poll_until(feed: &mut RecordFeed, done: impl Fn(&RecordFeed) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done(feed) {
            assert!(Instant::now() < deadline, "feed did not settle in time");
            feed.poll();
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn refetch_loads_records() {
        let source = Arc::new(GatedSource::new());
        let gate = source.push(Ok(vec![record("Alice")]));

        let mut feed = RecordFeed::new(source);
        assert!(!feed.is_loading());
        feed.refetch();
        assert!(feed.is_loading());

        gate.send(()).unwrap();
        poll_until(&mut feed, |f| !f.is_loading());

        assert_eq!(feed.data().len(), 1);
        assert!(feed.error().is_none());
        assert!(feed.fetched_at().is_some());
    }

    #[test]
    fn failure_sets_error_and_keeps_previous_records() {
        let source = Arc::new(GatedSource::new());
        let ok = source.push(Ok(vec![record("Alice")]));
        let fail = source.push(Err(FetchError::new("Failed to fetch data")));

        let mut feed = RecordFeed::new(source);
        feed.refetch();
        ok.send(()).unwrap();
        poll_until(&mut feed, |f| !f.is_loading());

        feed.refetch();
        assert!(feed.error().is_none());
        fail.send(()).unwrap();
        poll_until(&mut feed, |f| !f.is_loading());

        assert_eq!(feed.error(), Some("Failed to fetch data"));
        assert_eq!(feed.data().len(), 1);
    }

    #[test]
    fn stale_response_never_overwrites_newer_one() {
        let source = Arc::new(GatedSource::new());
        let slow = source.push(Ok(vec![record("Stale")]));
        let fast = source.push(Ok(vec![record("Fresh")]));

        let mut feed = RecordFeed::new(source.clone());
        assert_eq!(feed.refetch(), 1);
        // Let the first worker take its script entry before the second starts.
        wait_for_pending(&source, 1);
        assert_eq!(feed.refetch(), 2);
        wait_for_pending(&source, 0);

        fast.send(()).unwrap();
        poll_until(&mut feed, |f| !f.is_loading());
        assert_eq!(feed.data()[0].customer_name, "Fresh");

        slow.send(()).unwrap();
        poll_until(&mut feed, |f| f.stale_responses() == 1);
        assert_eq!(feed.data()[0].customer_name, "Fresh");
        assert!(!feed.is_loading());
    }
}
