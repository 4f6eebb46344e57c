//! Tokio driver for [`PlotMap`].
//!
//! [`MapSession`] owns a map together with its [`PlotSource`] and
//! [`BulkActions`] collaborators. It sleeps until the map's next deadline,
//! runs the fetches and bulk actions the map asks for concurrently in a
//! [`FuturesUnordered`], and feeds every completion back on the same task.
//! In-flight requests are never aborted; the map's response policy decides
//! what a late completion does.

use crate::{
    actions::{BulkAction, BulkActions, BulkOutcome},
    core::map::PlotMap,
    data::{query::FilterParams, response::FetchResponse},
    fetch::{coordinator::FetchTicket, source::PlotSource},
    input::events::{MapEvent, PointerEvent},
    render::surface::MapSurface,
    Error, Result,
};
use futures::{future::BoxFuture, stream::FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

/// Host input for a running session
#[derive(Debug, Clone)]
pub enum SessionCommand {
    Map(MapEvent),
    Pointer(PointerEvent),
    SetFilters(FilterParams),
    SetLasso(bool),
    Bulk(BulkAction),
    ClearSelection,
    FitToParcels,
    Refetch,
    Shutdown,
}

enum Completion {
    Fetch {
        seq: u64,
        result: Result<FetchResponse>,
    },
    Bulk {
        action: BulkAction,
        result: Result<BulkOutcome>,
    },
}

/// The clock the map runs on. Follows tokio's clock so paused-time tests
/// and the debounce deadlines agree.
fn now() -> instant::Instant {
    tokio::time::Instant::now().into_std()
}

async fn sleep_until(deadline: Option<instant::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => futures::future::pending().await,
    }
}

pub struct MapSession<S: MapSurface> {
    map: PlotMap<S>,
    source: Arc<dyn PlotSource>,
    bulk_actions: Option<Arc<dyn BulkActions>>,
    timeout: Option<Duration>,
    pending: FuturesUnordered<BoxFuture<'static, Completion>>,
}

impl<S: MapSurface> MapSession<S> {
    pub fn new(map: PlotMap<S>, source: Arc<dyn PlotSource>) -> Self {
        let timeout = map.config().fetch.request_timeout();
        Self {
            map,
            source,
            bulk_actions: None,
            timeout,
            pending: FuturesUnordered::new(),
        }
    }

    pub fn with_bulk_actions(mut self, actions: Arc<dyn BulkActions>) -> Self {
        self.bulk_actions = Some(actions);
        self
    }

    pub fn map(&self) -> &PlotMap<S> {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut PlotMap<S> {
        &mut self.map
    }

    pub fn into_map(self) -> PlotMap<S> {
        self.map
    }

    /// Fetches and bulk actions started but not yet fed back
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Mounts the map; the first fetch follows after the quiet period
    pub fn mount(&mut self) -> Result<()> {
        self.map.mount(now())?;
        Ok(())
    }

    fn dispatch(&mut self, ticket: FetchTicket) {
        let source = Arc::clone(&self.source);
        let timeout = self.timeout;
        let FetchTicket { seq, query } = ticket;

        self.pending.push(Box::pin(async move {
            let fetch = source.fetch(&query);
            let result = match timeout {
                Some(limit) => match tokio::time::timeout(limit, fetch).await {
                    Ok(result) => result,
                    Err(_) => Err(Error::Source(format!("Request timed out after {limit:?}"))),
                },
                None => fetch.await,
            };
            Completion::Fetch { seq, result }
        }));
    }

    fn complete(&mut self, completion: Completion) {
        match completion {
            Completion::Fetch { seq, result } => self.map.apply_response(seq, result),
            Completion::Bulk { action, result } => {
                if let Some(ticket) = self.map.finish_bulk(&action, result) {
                    self.dispatch(ticket);
                }
            }
        }
    }

    fn tick(&mut self) {
        if let Some(ticket) = self.map.poll(now()) {
            self.dispatch(ticket);
        }
    }

    /// Starts `action` on the current selection. Rejected before any
    /// collaborator call when nothing is selected or no [`BulkActions`] is
    /// configured.
    pub fn bulk(&mut self, action: BulkAction) -> Result<()> {
        let actions = self
            .bulk_actions
            .clone()
            .ok_or_else(|| Error::Source("No bulk actions configured".to_string()))?;
        let request = self.map.begin_bulk(action)?;
        log::info!(
            "Starting {} on {} parcels",
            request.action.describe(),
            request.ids.len()
        );

        self.pending.push(Box::pin(async move {
            let result = request.action.execute(actions.as_ref(), &request.ids).await;
            Completion::Bulk {
                action: request.action,
                result,
            }
        }));
        Ok(())
    }

    /// Applies one host command. Returns false for [`SessionCommand::Shutdown`].
    pub fn execute(&mut self, command: SessionCommand) -> bool {
        match command {
            SessionCommand::Map(event) => {
                self.map.on_map_event(&event, now());
            }
            SessionCommand::Pointer(event) => self.map.on_pointer(event),
            SessionCommand::SetFilters(filters) => self.map.set_filters(filters, now()),
            SessionCommand::SetLasso(enabled) => self.map.set_lasso_mode(enabled),
            SessionCommand::Bulk(action) => {
                if let Err(e) = self.bulk(action) {
                    log::warn!("Bulk action rejected: {e}");
                }
            }
            SessionCommand::ClearSelection => self.map.clear_selection(),
            SessionCommand::FitToParcels => {
                self.map.fit_to_parcels();
            }
            SessionCommand::Refetch => {
                if let Some(ticket) = self.map.refetch_now() {
                    self.dispatch(ticket);
                }
            }
            SessionCommand::Shutdown => return false,
        }
        true
    }

    /// Drives timers and completions until nothing is scheduled or in flight
    pub async fn run_until_idle(&mut self) {
        loop {
            let deadline = self.map.next_deadline();
            if deadline.is_none() && self.pending.is_empty() {
                break;
            }
            tokio::select! {
                Some(completion) = self.pending.next(), if !self.pending.is_empty() => {
                    self.complete(completion);
                }
                _ = sleep_until(deadline) => self.tick(),
            }
        }
    }

    /// Runs until `commands` closes or yields [`SessionCommand::Shutdown`],
    /// then tears the map down and returns it
    pub async fn run(mut self, mut commands: UnboundedReceiver<SessionCommand>) -> PlotMap<S> {
        if !self.map.is_mounted() {
            if let Err(e) = self.mount() {
                log::error!("Failed to mount map: {e}");
            }
        }

        loop {
            let deadline = self.map.next_deadline();
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => {
                        if !self.execute(command) {
                            break;
                        }
                    }
                    None => break,
                },
                Some(completion) = self.pending.next(), if !self.pending.is_empty() => {
                    self.complete(completion);
                }
                _ = sleep_until(deadline) => self.tick(),
            }
        }

        log::debug!("Session stopped with {} requests in flight", self.pending.len());
        self.map.teardown();
        self.map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::PlotMapConfig;
    use crate::core::geo::{LatLng, Point};
    use crate::core::viewport::MapView;
    use crate::data::query::ViewportQuery;
    use crate::fetch::memory::{square_parcel, InMemoryPlotSource};
    use crate::render::surface::RecordingSurface;
    use async_trait::async_trait;

    fn map(config: PlotMapConfig) -> PlotMap<RecordingSurface> {
        let view = MapView::new(LatLng::new(54.71, 20.45), 14.0, Point::new(800.0, 600.0));
        PlotMap::new(config, RecordingSurface::new(), view).unwrap()
    }

    struct Slow;

    #[async_trait]
    impl PlotSource for Slow {
        async fn fetch(&self, _query: &ViewportQuery) -> Result<FetchResponse> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(FetchResponse::default())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_fetch_is_rendered() {
        let source = InMemoryPlotSource::new(vec![
            square_parcel(1, LatLng::new(54.709, 20.449), 0.001),
            square_parcel(2, LatLng::new(54.711, 20.451), 0.001),
        ]);
        let mut session = MapSession::new(map(PlotMapConfig::default()), Arc::new(source));
        session.mount().unwrap();
        session.run_until_idle().await;

        assert_eq!(session.map().parcels().len(), 2);
        assert_eq!(session.map().surface().polygons().len(), 2);
        assert!(!session.map().is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_reported_as_failure() {
        let mut config = PlotMapConfig::default();
        config.fetch.request_timeout_ms = Some(1000);
        let mut session = MapSession::new(map(config), Arc::new(Slow));
        session.mount().unwrap();
        session.run_until_idle().await;

        assert!(session.map().mode().is_none());
        assert!(!session.map().is_loading());
        assert_eq!(session.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bulk_without_collaborator_is_rejected() {
        let mut session = MapSession::new(
            map(PlotMapConfig::default()),
            Arc::new(InMemoryPlotSource::new(vec![])),
        );
        assert!(matches!(session.bulk(BulkAction::Delete), Err(Error::Source(_))));
    }
}
