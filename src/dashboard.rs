use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

use crate::event::{Event, Filter};
use crate::fetch::{resolve, EventSource, FetchOutcome};
use crate::poller::{PollHandle, PollMessage, Poller};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Error,
    Success,
}

/// Everything the renderer needs. Replaced wholesale by each successful
/// fetch; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    pub events: Vec<Event>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub filter: Filter,
}

impl DashboardState {
    pub fn new(filter: Filter) -> Self {
        Self {
            events: Vec::new(),
            is_loading: true,
            error: None,
            filter,
        }
    }

    /// Fold one fetch outcome into the state. A failure sets the error but
    /// leaves the previous events in place; loading ends either way.
    pub fn apply(&mut self, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::Events(events) => {
                self.events = events;
                self.error = None;
            }
            FetchOutcome::Failed(message) => {
                self.error = Some(message);
            }
        }
        self.is_loading = false;
    }

    pub fn phase(&self) -> Phase {
        if self.is_loading {
            Phase::Loading
        } else if self.error.is_some() {
            Phase::Error
        } else {
            Phase::Success
        }
    }
}

/// Fetch once and return the resulting state, without any timer.
pub async fn snapshot(source: &dyn EventSource, filter: Filter) -> DashboardState {
    let mut state = DashboardState::new(filter);
    let outcome = resolve(source.fetch(&state.filter).await);
    state.apply(outcome);
    state
}

/// Owns dashboard state and the polling lifecycle around it.
pub struct Controller {
    state: DashboardState,
    source: Arc<dyn EventSource>,
    period: Duration,
    tx: UnboundedSender<PollMessage>,
    rx: UnboundedReceiver<PollMessage>,
    poller: Option<PollHandle>,
    generation: u64,
    mounted: bool,
}

impl Controller {
    pub fn new(source: Arc<dyn EventSource>, filter: Filter, period: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            state: DashboardState::new(filter),
            source,
            period,
            tx,
            rx,
            poller: None,
            generation: 0,
            mounted: false,
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Start polling: one fetch now, then one per period.
    pub fn mount(&mut self) {
        if self.mounted {
            return;
        }
        self.mounted = true;
        self.restart_poller();
    }

    /// Stop the timer. Completions that arrive afterwards are ignored.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.poller = None;
        info!("Polling stopped");
    }

    /// Switch filter. While mounted the old timer is cancelled before the
    /// new one starts, so only one is ever running.
    pub fn set_filter(&mut self, filter: Filter) {
        if self.state.filter == filter {
            return;
        }
        info!("Filter changed to {:?}", filter);
        self.state.filter = filter;

        if self.mounted {
            self.restart_poller();
        }
    }

    /// One extra fetch for the current filter; the timer keeps its schedule.
    pub fn refresh(&self) {
        if !self.mounted {
            return;
        }
        debug!("Manual refresh for generation {}", self.generation);
        Poller::fetch_once(
            self.source.clone(),
            self.state.filter.clone(),
            self.generation,
            self.tx.clone(),
        );
    }

    /// Apply a completion if it belongs to the live poller. Returns whether
    /// state changed.
    pub fn handle(&mut self, message: PollMessage) -> bool {
        if !self.mounted {
            debug!("Dropping completion received after unmount");
            return false;
        }
        if message.generation != self.generation {
            debug!(
                "Discarding stale completion from generation {} (current {})",
                message.generation, self.generation
            );
            return false;
        }

        self.state.apply(message.outcome);
        true
    }

    /// Apply every completion that has already arrived.
    pub fn drain(&mut self) -> bool {
        let mut changed = false;
        while let Ok(message) = self.rx.try_recv() {
            changed |= self.handle(message);
        }
        changed
    }

    /// Wait for the next completion and apply it.
    pub async fn next(&mut self) -> bool {
        match self.rx.recv().await {
            Some(message) => self.handle(message),
            None => false,
        }
    }

    fn restart_poller(&mut self) {
        // Cancel first: the old handle is dropped before the new timer exists.
        self.poller = None;
        self.generation += 1;
        debug!(
            "Starting poller generation {} every {:?}",
            self.generation, self.period
        );
        self.poller = Some(Poller::start(
            self.source.clone(),
            self.state.filter.clone(),
            self.period,
            self.generation,
            self.tx.clone(),
        ));
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Action, EventsResponse};
    use crate::fetch::{FetchError, FALLBACK_ERROR};
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn sample(id: &str) -> Event {
        Event {
            request_id: id.to_string(),
            author: "alice".to_string(),
            action: Action::Push,
            from_branch: None,
            to_branch: "main".to_string(),
            timestamp: "t".to_string(),
        }
    }

    /// Answers with the events recorded for a filter, logging every call.
    #[derive(Default)]
    struct FilterEcho {
        calls: Mutex<Vec<Filter>>,
    }

    #[async_trait]
    impl EventSource for FilterEcho {
        async fn fetch(&self, filter: &Filter) -> Result<EventsResponse, FetchError> {
            self.calls.lock().unwrap().push(filter.clone());
            Ok(EventsResponse::success(vec![sample(&filter.to_string())]))
        }
    }

    #[test]
    fn test_initial_state_is_loading() {
        let state = DashboardState::new(Filter::All);
        assert!(state.is_loading);
        assert!(state.events.is_empty());
        assert_eq!(state.error, None);
        assert_eq!(state.phase(), Phase::Loading);
    }

    #[test]
    fn test_success_replaces_events_and_clears_error() {
        let mut state = DashboardState::new(Filter::All);
        state.apply(FetchOutcome::Failed("down".to_string()));
        assert_eq!(state.phase(), Phase::Error);

        state.apply(FetchOutcome::Events(vec![sample("1"), sample("2")]));
        assert_eq!(state.phase(), Phase::Success);
        assert_eq!(state.error, None);
        assert_eq!(state.events.len(), 2);

        state.apply(FetchOutcome::Events(vec![sample("3")]));
        assert_eq!(state.events, vec![sample("3")]);
    }

    #[test]
    fn test_failure_keeps_stale_events() {
        let mut state = DashboardState::new(Filter::All);
        state.apply(FetchOutcome::Events(vec![sample("1")]));
        state.apply(FetchOutcome::Failed(FALLBACK_ERROR.to_string()));

        assert!(!state.is_loading);
        assert_eq!(state.error.as_deref(), Some(FALLBACK_ERROR));
        assert_eq!(state.events, vec![sample("1")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mount_fetches_immediately() {
        let source = Arc::new(FilterEcho::default());
        let mut controller = Controller::new(source.clone(), Filter::All, Duration::from_secs(15));

        controller.mount();
        assert!(controller.next().await);
        assert!(!controller.state().is_loading);
        assert_eq!(controller.state().events[0].request_id, "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_filter_change_restarts_with_new_filter() {
        let source = Arc::new(FilterEcho::default());
        let mut controller = Controller::new(source.clone(), Filter::All, Duration::from_secs(15));

        controller.mount();
        assert!(controller.next().await);
        let first_generation = controller.generation();

        controller.set_filter(Filter::Action(Action::Push));
        assert_eq!(controller.generation(), first_generation + 1);
        assert!(controller.next().await);
        assert_eq!(controller.state().events[0].request_id, "PUSH");

        controller.set_filter(Filter::All);
        assert!(controller.next().await);
        assert_eq!(controller.state().events[0].request_id, "");

        let calls = source.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![Filter::All, Filter::Action(Action::Push), Filter::All]
        );
    }

    /// Records each fetch with the whole seconds elapsed since `start`.
    struct TimedEcho {
        start: tokio::time::Instant,
        calls: Mutex<Vec<(Filter, u64)>>,
    }

    #[async_trait]
    impl EventSource for TimedEcho {
        async fn fetch(&self, filter: &Filter) -> Result<EventsResponse, FetchError> {
            let elapsed = self.start.elapsed().as_secs();
            self.calls.lock().unwrap().push((filter.clone(), elapsed));
            Ok(EventsResponse::success(Vec::new()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_timer_across_filter_change_and_unmount() {
        let source = Arc::new(TimedEcho {
            start: tokio::time::Instant::now(),
            calls: Mutex::new(Vec::new()),
        });
        let mut controller = Controller::new(source.clone(), Filter::All, Duration::from_secs(15));

        controller.mount();
        tokio::time::sleep(Duration::from_secs(5)).await;

        controller.set_filter(Filter::Action(Action::Push));
        tokio::time::sleep(Duration::from_secs(41)).await;

        controller.unmount();
        tokio::time::sleep(Duration::from_secs(60)).await;

        // The old timer's 15s tick never fires and nothing runs after 46s.
        let push = Filter::Action(Action::Push);
        assert_eq!(
            *source.calls.lock().unwrap(),
            vec![
                (Filter::All, 0),
                (push.clone(), 5),
                (push.clone(), 20),
                (push, 35),
            ]
        );
        assert!(!controller.drain(), "Completions after unmount are ignored");
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_filter_does_not_restart() {
        let source = Arc::new(FilterEcho::default());
        let mut controller = Controller::new(source, Filter::All, Duration::from_secs(15));
        controller.mount();
        let generation = controller.generation();

        controller.set_filter(Filter::All);
        assert_eq!(controller.generation(), generation);
    }

    #[test]
    fn test_stale_generation_is_discarded() {
        let source = Arc::new(FilterEcho::default());
        let mut controller = Controller::new(source, Filter::All, Duration::from_secs(15));
        controller.mounted = true;
        controller.generation = 2;

        let stale = PollMessage {
            generation: 1,
            outcome: FetchOutcome::Events(vec![sample("old")]),
        };
        assert!(!controller.handle(stale));
        assert!(controller.state().is_loading);

        let fresh = PollMessage {
            generation: 2,
            outcome: FetchOutcome::Events(vec![sample("new")]),
        };
        assert!(controller.handle(fresh));
        assert_eq!(controller.state().events[0].request_id, "new");
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_updates_after_unmount() {
        let source = Arc::new(FilterEcho::default());
        let mut controller = Controller::new(source, Filter::All, Duration::from_secs(15));

        controller.mount();
        let generation = controller.generation();
        controller.unmount();
        assert!(!controller.is_mounted());

        let late = PollMessage {
            generation,
            outcome: FetchOutcome::Events(vec![sample("late")]),
        };
        assert!(!controller.handle(late));
        assert!(controller.state().events.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_fetches_without_resetting_timer() {
        let source = Arc::new(FilterEcho::default());
        let mut controller = Controller::new(source.clone(), Filter::All, Duration::from_secs(15));

        controller.mount();
        assert!(controller.next().await);
        let generation = controller.generation();

        controller.refresh();
        assert!(controller.next().await);
        assert_eq!(controller.generation(), generation);
        assert_eq!(source.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_snapshot_resolves_one_fetch() {
        let source = FilterEcho::default();
        let state = snapshot(&source, Filter::Action(Action::Merge)).await;
        assert!(!state.is_loading);
        assert_eq!(state.events[0].request_id, "MERGE");
    }
}
