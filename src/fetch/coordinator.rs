use crate::core::config::ResponsePolicy;
use crate::core::viewport::Viewport;
use crate::data::query::{FilterParams, ViewportQuery};
use crate::data::response::FetchResponse;
use crate::fetch::debounce::Debounce;
use crate::prelude::HashSet;
use crate::{Error, Result};
use instant::Instant;
use std::time::Duration;

/// One fetch the host should execute
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    /// Monotonic issue order, starting at 1
    pub seq: u64,
    pub query: ViewportQuery,
}

/// What to do with a completed fetch
#[derive(Debug)]
pub enum FetchOutcome {
    Apply(FetchResponse),
    /// Report the error; keep what is rendered
    Failed(Error),
    /// Stale or unknown; ignore
    Discarded,
}

/// Turns a stream of viewports into debounced, sequenced fetch tickets and
/// reconciles their completions according to the [`ResponsePolicy`].
#[derive(Debug)]
pub struct FetchCoordinator {
    debounce: Debounce<Viewport>,
    policy: ResponsePolicy,
    filters: FilterParams,
    /// Viewport of the most recent schedule or issue
    current: Option<Viewport>,
    next_seq: u64,
    in_flight: HashSet<u64>,
    newest_applied: Option<u64>,
}

impl FetchCoordinator {
    pub fn new(debounce: Duration, policy: ResponsePolicy) -> Self {
        Self {
            debounce: Debounce::new(debounce),
            policy,
            filters: FilterParams::default(),
            current: None,
            next_seq: 1,
            in_flight: HashSet::default(),
            newest_applied: None,
        }
    }

    /// Schedules a fetch for `viewport` after the quiet period, superseding
    /// any pending schedule
    pub fn schedule(&mut self, viewport: Viewport, now: Instant) {
        self.current = Some(viewport);
        self.debounce.trigger(viewport, now);
    }

    /// Issues the pending fetch once its quiet period is over
    pub fn poll(&mut self, now: Instant) -> Option<FetchTicket> {
        let viewport = self.debounce.poll(now)?;
        Some(self.issue(viewport))
    }

    /// Issues a fetch for the current viewport immediately, dropping any
    /// pending schedule
    pub fn refetch_now(&mut self) -> Option<FetchTicket> {
        self.debounce.cancel();
        let viewport = self.current?;
        Some(self.issue(viewport))
    }

    /// Replaces the filters and reschedules the current viewport
    pub fn set_filters(&mut self, filters: FilterParams, now: Instant) {
        if self.filters == filters {
            return;
        }
        self.filters = filters;
        if let Some(viewport) = self.current {
            self.debounce.trigger(viewport, now);
        }
    }

    fn issue(&mut self, viewport: Viewport) -> FetchTicket {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.in_flight.insert(seq);

        log::debug!("Issuing fetch #{seq} at zoom {}", viewport.zoom());
        FetchTicket {
            seq,
            query: ViewportQuery::new(viewport, self.filters.clone()),
        }
    }

    /// Reconciles the result of ticket `seq`
    pub fn complete(&mut self, seq: u64, result: Result<FetchResponse>) -> FetchOutcome {
        if !self.in_flight.remove(&seq) {
            log::warn!("Completion for unknown fetch #{seq}");
            return FetchOutcome::Discarded;
        }

        let superseded = self.newest_applied.map_or(false, |newest| seq < newest);
        if superseded && self.policy == ResponsePolicy::DropSuperseded {
            log::debug!("Dropping fetch #{seq}: superseded");
            return FetchOutcome::Discarded;
        }

        match result {
            Ok(response) => {
                self.newest_applied = Some(self.newest_applied.map_or(seq, |n| n.max(seq)));
                FetchOutcome::Apply(response)
            }
            Err(e) => {
                log::warn!("Fetch #{seq} failed: {e}");
                FetchOutcome::Failed(e)
            }
        }
    }

    /// Forgets the pending schedule, the current viewport and every issued
    /// ticket. Sequence numbers keep increasing so a ticket issued before
    /// the reset can never match one issued after it.
    pub fn reset(&mut self) {
        self.debounce.cancel();
        self.current = None;
        self.in_flight.clear();
        self.newest_applied = None;
    }

    /// True while any issued fetch has not completed
    pub fn is_loading(&self) -> bool {
        !self.in_flight.is_empty()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }

    pub fn filters(&self) -> &FilterParams {
        &self.filters
    }

    pub fn current_viewport(&self) -> Option<Viewport> {
        self.current
    }

    pub fn policy(&self) -> ResponsePolicy {
        self.policy
    }
}
