use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::event::Filter;
use crate::fetch::{resolve, EventSource, FetchOutcome};

/// A finished fetch, tagged with the poller generation that issued it.
#[derive(Debug, Clone, PartialEq)]
pub struct PollMessage {
    pub generation: u64,
    pub outcome: FetchOutcome,
}

/// Owns the repeating timer for one filter. Dropping the handle stops the
/// timer; fetches already in flight still run to completion.
#[derive(Debug)]
pub struct PollHandle {
    generation: u64,
    filter: Filter,
    timer: JoinHandle<()>,
}

impl PollHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn cancel(&self) {
        self.timer.abort();
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

pub struct Poller;

impl Poller {
    /// Fetch immediately, then once every `period` until the handle is
    /// dropped. A slow fetch never delays or swallows the next tick.
    pub fn start(
        source: Arc<dyn EventSource>,
        filter: Filter,
        period: Duration,
        generation: u64,
        tx: UnboundedSender<PollMessage>,
    ) -> PollHandle {
        let timer_filter = filter.clone();
        let timer = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

            loop {
                ticker.tick().await;
                if tx.is_closed() {
                    debug!("Poll receiver gone, stopping generation {}", generation);
                    break;
                }
                debug!("Poll tick for generation {} ({:?})", generation, timer_filter);
                Self::fetch_once(source.clone(), timer_filter.clone(), generation, tx.clone());
            }
        });

        PollHandle {
            generation,
            filter,
            timer,
        }
    }

    /// Run a single fetch in its own task and report the outcome.
    pub fn fetch_once(
        source: Arc<dyn EventSource>,
        filter: Filter,
        generation: u64,
        tx: UnboundedSender<PollMessage>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let outcome = resolve(source.fetch(&filter).await);
            // The receiver may be gone after shutdown.
            let _ = tx.send(PollMessage {
                generation,
                outcome,
            });
        })
    }
}
