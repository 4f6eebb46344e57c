use crate::{
    actions::{BulkAction, BulkOutcome, LogNotifier, Notifier},
    core::{
        config::PlotMapConfig,
        geo::{LatLng, Point},
        tracker::ViewportTracker,
        viewport::{snap_zoom, MapView, Viewport},
    },
    data::{
        cluster::Cluster,
        parcel::{ListingId, ListingRef, Parcel, ParcelId, ParcelStatus},
        query::FilterParams,
        response::{FetchResponse, RenderMode},
    },
    fetch::{
        coordinator::{FetchCoordinator, FetchOutcome, FetchTicket},
        debounce::Debounce,
    },
    input::events::{KeyModifiers, MapEvent, PointerEvent},
    prelude::HashSet,
    render::{mode::ModeResolver, renderer::GeometryRenderer, surface::MapSurface},
    selection::{lasso::LassoEngine, LassoState, SelectionSet},
    Error, Result,
};
use crossbeam_channel::{Receiver, Sender};
use instant::Instant;
use std::sync::Arc;

/// Outbound events for the host UI
#[derive(Debug, Clone, PartialEq)]
pub enum MapNotification {
    /// A parcel was clicked, or the focus was cleared
    FocusedParcelChanged(Option<ParcelId>),
    /// The view has been still long enough to be written to the URL
    ViewportSettled(Viewport),
    SelectionChanged { count: usize },
    ModeChanged(RenderMode),
    LoadingChanged(bool),
}

/// Header counters for the current viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewportStats {
    pub assigned: u64,
    pub unassigned: u64,
    /// Server-side total for the viewport, which may exceed what is drawn
    pub total: u64,
}

/// What the detail panel shows for the focused parcel
#[derive(Debug, Clone, PartialEq)]
pub struct ParcelDetails {
    pub id: ParcelId,
    pub cadastral_number: Option<String>,
    pub address: Option<String>,
    pub area_sotki: Option<f64>,
    pub status: ParcelStatus,
    pub status_text: &'static str,
    pub listing_id: Option<ListingId>,
    pub listing: Option<ListingRef>,
    pub price_public: Option<u64>,
}

impl From<&Parcel> for ParcelDetails {
    fn from(parcel: &Parcel) -> Self {
        Self {
            id: parcel.id,
            cadastral_number: parcel.cadastral_number.clone(),
            address: parcel.address.clone(),
            area_sotki: parcel.area_sotki(),
            status: parcel.status,
            status_text: parcel.status.label(),
            listing_id: parcel.listing_id,
            listing: parcel.listing.clone(),
            price_public: parcel.price_public,
        }
    }
}

/// A bulk action bound to the ids it applies to
#[derive(Debug, Clone, PartialEq)]
pub struct BulkRequest {
    pub action: BulkAction,
    pub ids: Vec<ParcelId>,
}

/// The map controller.
///
/// Owns the viewport tracker, fetch coordinator, mode resolver, renderer,
/// selection and lasso, and wires them to one [`MapSurface`]. Every handler
/// takes `&mut self` and, where timing matters, an explicit `now`; the host
/// (or [`MapSession`](crate::session::MapSession)) calls [`poll`](Self::poll)
/// at [`next_deadline`](Self::next_deadline) and executes the returned
/// [`FetchTicket`]s.
pub struct PlotMap<S: MapSurface> {
    config: PlotMapConfig,
    surface: S,
    tracker: ViewportTracker,
    coordinator: FetchCoordinator,
    url_sync: Debounce<Viewport>,
    modes: ModeResolver,
    renderer: GeometryRenderer,
    selection: SelectionSet,
    lasso: LassoEngine,
    lasso_requested: bool,
    parcels: Vec<Parcel>,
    clusters: Vec<Cluster>,
    total: u64,
    focused: Option<ParcelId>,
    notifier: Arc<dyn Notifier>,
    subscribers: Vec<Sender<MapNotification>>,
    mounted: bool,
}

impl<S: MapSurface> PlotMap<S> {
    /// Creates a controller with a validated configuration. Prefer
    /// [`PlotMapBuilder`](crate::core::builder::PlotMapBuilder).
    pub fn new(config: PlotMapConfig, surface: S, view: MapView) -> Result<Self> {
        config.validate()?;

        let coordinator = FetchCoordinator::new(config.fetch.debounce(), config.fetch.policy);
        let renderer = GeometryRenderer::new(config.render.clone());
        let lasso = LassoEngine::new(config.lasso.clone(), config.render.palette.lasso_style());

        Ok(Self {
            url_sync: Debounce::new(config.url_sync.debounce()),
            config,
            surface,
            tracker: ViewportTracker::new(view),
            coordinator,
            modes: ModeResolver::new(),
            renderer,
            selection: SelectionSet::new(),
            lasso,
            lasso_requested: false,
            parcels: Vec::new(),
            clusters: Vec::new(),
            total: 0,
            focused: None,
            notifier: Arc::new(LogNotifier),
            subscribers: Vec::new(),
            mounted: false,
        })
    }

    pub fn set_notifier(&mut self, notifier: Arc<dyn Notifier>) {
        self.notifier = notifier;
    }

    /// Registers a listener for [`MapNotification`]s. Dropping the receiver
    /// unsubscribes.
    pub fn subscribe(&mut self) -> Receiver<MapNotification> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    fn notify(&mut self, notification: MapNotification) {
        self.subscribers
            .retain(|tx| tx.send(notification.clone()).is_ok());
    }

    // --- lifecycle ---

    /// Emits the initial viewport and schedules the first fetch
    pub fn mount(&mut self, now: Instant) -> Result<Viewport> {
        let viewport = self.tracker.mount()?;
        self.mounted = true;
        self.viewport_changed(viewport, now);
        log::info!("Map mounted at zoom {}", viewport.zoom());
        Ok(viewport)
    }

    /// Removes every shape and restores the engine's interaction state.
    /// Pending fetches are dropped; completions arriving later are discarded.
    pub fn teardown(&mut self) {
        self.lasso.deactivate(&mut self.surface);
        self.lasso_requested = false;
        self.renderer.clear(&mut self.surface);
        self.modes = ModeResolver::new();
        self.parcels.clear();
        self.clusters.clear();
        self.coordinator.reset();
        self.focused = None;
        self.url_sync.cancel();
        self.subscribers.clear();
        self.mounted = false;
        log::debug!("Map torn down");
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    // --- camera ---

    /// Feeds a camera event from the mapping engine. Returns the viewport
    /// when the event settled the view on a new one.
    pub fn on_map_event(&mut self, event: &MapEvent, now: Instant) -> Option<Viewport> {
        let viewport = self.tracker.observe(event)?;
        self.viewport_changed(viewport, now);
        Some(viewport)
    }

    fn viewport_changed(&mut self, viewport: Viewport, now: Instant) {
        self.coordinator.schedule(viewport, now);
        if self.config.url_sync.enabled {
            self.url_sync.trigger(viewport, now);
        }
    }

    // --- timers ---

    /// Fires due timers. Returns the fetch the host should execute, if one
    /// became due.
    pub fn poll(&mut self, now: Instant) -> Option<FetchTicket> {
        if let Some(viewport) = self.url_sync.poll(now) {
            self.notify(MapNotification::ViewportSettled(viewport));
        }

        let was_loading = self.coordinator.is_loading();
        let ticket = self.coordinator.poll(now)?;
        if !was_loading {
            self.notify(MapNotification::LoadingChanged(true));
        }
        Some(ticket)
    }

    /// Earliest instant at which [`poll`](Self::poll) has work
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.coordinator.next_deadline(), self.url_sync.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    // --- data ---

    /// Reconciles the completion of ticket `seq`
    pub fn apply_response(&mut self, seq: u64, result: Result<FetchResponse>) {
        let was_loading = self.coordinator.is_loading();

        match self.coordinator.complete(seq, result) {
            FetchOutcome::Apply(response) => self.apply(response),
            FetchOutcome::Failed(e) => {
                self.notifier.error(&format!("Failed to load parcels: {e}"));
            }
            FetchOutcome::Discarded => {}
        }

        if was_loading && !self.coordinator.is_loading() {
            self.notify(MapNotification::LoadingChanged(false));
        }
    }

    fn apply(&mut self, response: FetchResponse) {
        let transition = self.modes.resolve(&response);
        if transition.left(RenderMode::Plots) {
            self.renderer.clear_parcels(&mut self.surface);
        }
        if transition.left(RenderMode::Clusters) {
            self.renderer.clear_clusters(&mut self.surface);
        }

        self.total = response.total;
        match transition.current {
            RenderMode::Plots => {
                self.parcels = response.items;
                self.clusters.clear();
                self.render_parcels();
            }
            RenderMode::Clusters => {
                self.clusters = response.clusters;
                self.parcels.clear();
                self.renderer.render_clusters(&mut self.surface, &self.clusters);
            }
        }

        if self.config.selection.prune_on_refresh {
            let present: HashSet<ParcelId> = self.parcels.iter().map(|p| p.id).collect();
            if self.selection.retain(|id| present.contains(id)) {
                log::debug!("Pruned selection to {} parcels", self.selection.len());
                self.selection_changed();
            }
        }

        if let Some(id) = self.focused {
            if !self.parcels.iter().any(|p| p.id == id) {
                self.focused = None;
                self.notify(MapNotification::FocusedParcelChanged(None));
            }
        }

        if transition.previous != Some(transition.current) {
            self.notify(MapNotification::ModeChanged(transition.current));
        }
        self.sync_lasso();
    }

    fn render_parcels(&mut self) {
        let zoom = snap_zoom(self.tracker.zoom());
        self.renderer
            .render_parcels(&mut self.surface, &self.parcels, &self.selection, zoom);
    }

    /// Replaces the pass-through filters; the current viewport is refetched
    /// after the quiet period
    pub fn set_filters(&mut self, filters: FilterParams, now: Instant) {
        self.coordinator.set_filters(filters, now);
    }

    pub fn filters(&self) -> &FilterParams {
        self.coordinator.filters()
    }

    /// Fetch for the current viewport without waiting for the quiet period
    pub fn refetch_now(&mut self) -> Option<FetchTicket> {
        let was_loading = self.coordinator.is_loading();
        let ticket = self.coordinator.refetch_now()?;
        if !was_loading {
            self.notify(MapNotification::LoadingChanged(true));
        }
        Some(ticket)
    }

    // --- pointer ---

    /// Feeds a pointer event. While the lasso is active, down/move/up drive
    /// the gesture and clicks are ignored.
    pub fn on_pointer(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down { lat_lng, .. } => self.lasso.pointer_down(&mut self.surface, lat_lng),
            PointerEvent::Move { lat_lng, .. } => self.lasso.pointer_move(&mut self.surface, lat_lng),
            PointerEvent::Up { .. } => self.finish_lasso(),
            PointerEvent::Click {
                lat_lng,
                pixel,
                modifiers,
            } => {
                if !self.lasso.is_active() {
                    self.click(lat_lng, pixel, modifiers);
                }
            }
        }
    }

    fn finish_lasso(&mut self) {
        let Some(polygon) = self.lasso.pointer_up(&mut self.surface) else {
            return;
        };
        let hits = polygon.select(&self.parcels);
        log::debug!("Lasso enclosed {} parcels", hits.len());
        if self.selection.extend(hits) {
            self.render_parcels();
            self.selection_changed();
        }
    }

    /// A click at `lat_lng` (`pixel` in container coordinates). Hits a
    /// cluster marker in cluster mode, a parcel polygon in detail mode.
    pub fn click(&mut self, lat_lng: LatLng, pixel: Point, modifiers: KeyModifiers) {
        match self.modes.current() {
            Some(RenderMode::Clusters) => {
                if let Some(bounds) = self.renderer.cluster_at(pixel, self.tracker.view()) {
                    log::debug!("Zooming to cluster bounds {bounds:?}");
                    self.surface
                        .fit_bounds(bounds, self.config.render.fit_padding_px);
                }
            }
            Some(RenderMode::Plots) => {
                let Some(id) = self.renderer.parcel_at(lat_lng) else {
                    return;
                };
                if self.config.selection.enabled && self.selection.apply_click(id, modifiers) {
                    self.render_parcels();
                    self.selection_changed();
                }
                self.focused = Some(id);
                self.notify(MapNotification::FocusedParcelChanged(Some(id)));
            }
            None => {}
        }
    }

    // --- lasso ---

    /// Requests lasso mode. The lasso only engages while parcels (not
    /// clusters) are shown and selection is enabled.
    pub fn set_lasso_mode(&mut self, enabled: bool) {
        self.lasso_requested = enabled;
        self.sync_lasso();
    }

    pub fn lasso_requested(&self) -> bool {
        self.lasso_requested
    }

    pub fn lasso_state(&self) -> &LassoState {
        self.lasso.state()
    }

    fn sync_lasso(&mut self) {
        let wanted = self.lasso_requested
            && self.config.selection.enabled
            && self.modes.current() == Some(RenderMode::Plots);

        if wanted {
            self.lasso.activate(&mut self.surface);
        } else {
            self.lasso.deactivate(&mut self.surface);
        }
    }

    // --- selection ---

    fn selection_changed(&mut self) {
        let count = self.selection.len();
        self.notify(MapNotification::SelectionChanged { count });
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    /// Clears the selection and the focused parcel
    pub fn clear_selection(&mut self) {
        if self.selection.clear() {
            self.render_parcels();
            self.selection_changed();
        }
        if self.focused.take().is_some() {
            self.notify(MapNotification::FocusedParcelChanged(None));
        }
    }

    pub fn focused_parcel(&self) -> Option<ParcelDetails> {
        let id = self.focused?;
        self.parcels
            .iter()
            .find(|p| p.id == id)
            .map(ParcelDetails::from)
    }

    // --- bulk actions ---

    /// Binds `action` to the current selection. Fails with
    /// [`Error::EmptySelection`] when nothing is selected.
    pub fn begin_bulk(&self, action: BulkAction) -> Result<BulkRequest> {
        if self.selection.is_empty() {
            return Err(Error::EmptySelection);
        }
        Ok(BulkRequest {
            action,
            ids: self.selection.sorted_ids(),
        })
    }

    /// Reports the result of a bulk action. On success the selection is
    /// cleared and the returned ticket refetches the viewport; on failure the
    /// selection is kept.
    pub fn finish_bulk(
        &mut self,
        action: &BulkAction,
        result: Result<BulkOutcome>,
    ) -> Option<FetchTicket> {
        match result {
            Ok(outcome) => {
                self.notifier.success(&outcome.message());
                self.clear_selection();
                self.refetch_now()
            }
            Err(e) => {
                self.notifier
                    .error(&format!("Failed to {}: {e}", action.describe()));
                None
            }
        }
    }

    // --- queries ---

    pub fn stats(&self) -> ViewportStats {
        let (assigned, unassigned) = match self.modes.current() {
            Some(RenderMode::Clusters) => self.clusters.iter().fold((0, 0), |(a, u), c| {
                (
                    a + c.assigned_count.unwrap_or(0),
                    u + c.unassigned_count.unwrap_or(0),
                )
            }),
            _ => {
                let assigned = self.parcels.iter().filter(|p| p.is_assigned()).count() as u64;
                (assigned, self.parcels.len() as u64 - assigned)
            }
        };
        ViewportStats {
            assigned,
            unassigned,
            total: self.total,
        }
    }

    /// Asks the engine to show every rendered parcel. Returns false when no
    /// parcel is rendered.
    pub fn fit_to_parcels(&mut self) -> bool {
        match self.renderer.parcel_bounds() {
            Some(bounds) => {
                self.surface
                    .fit_bounds(bounds, self.config.render.fit_padding_px);
                true
            }
            None => false,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.coordinator.is_loading()
    }

    pub fn mode(&self) -> Option<RenderMode> {
        self.modes.current()
    }

    pub fn parcels(&self) -> &[Parcel] {
        &self.parcels
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn renderer(&self) -> &GeometryRenderer {
        &self.renderer
    }

    pub fn view(&self) -> &MapView {
        self.tracker.view()
    }

    pub fn current_viewport(&self) -> Option<Viewport> {
        self.tracker.current()
    }

    pub fn config(&self) -> &PlotMapConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}

impl<S: MapSurface> std::fmt::Debug for PlotMap<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlotMap")
            .field("mode", &self.modes.current())
            .field("viewport", &self.tracker.current())
            .field("parcels", &self.parcels.len())
            .field("clusters", &self.clusters.len())
            .field("selected", &self.selection.len())
            .field("lasso", self.lasso.state())
            .finish()
    }
}
