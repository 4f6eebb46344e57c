//! Drives a parcel map without any UI: an in-memory backend, a recording
//! surface and a tokio session. Run with `RUST_LOG=debug` to follow the
//! fetch and render decisions.

use plotmap::fetch::memory::square_parcel;
use plotmap::prelude::*;

/// A rough grid of parcels scattered around the Kaliningrad region
fn sample_parcels() -> Vec<Parcel> {
    let mut parcels = Vec::new();
    let mut id = 1;
    for row in 0..40 {
        for col in 0..40 {
            let origin = LatLng::new(54.60 + row as f64 * 0.006, 20.30 + col as f64 * 0.009);
            let mut parcel = square_parcel(id, origin, 0.002)
                .with_cadastral_number(format!("39:03:{row:03}{col:03}:{id}"))
                .with_area(600.0 + (id % 7) as f64 * 150.0)
                .with_price(350_000 + (id % 13) * 95_000);
            if id % 3 == 0 {
                parcel = parcel.with_listing(1 + id / 100);
            }
            parcels.push(parcel);
            id += 1;
        }
    }
    parcels
}

fn report(map: &PlotMap<RecordingSurface>, label: &str) {
    let stats = map.stats();
    println!(
        "{label}: mode={:?} parcels={} clusters={} shapes={} assigned={} unassigned={} total={} selected={}",
        map.mode(),
        map.parcels().len(),
        map.clusters().len(),
        map.surface().len(),
        stats.assigned,
        stats.unassigned,
        stats.total,
        map.selection().len()
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    plotmap::init_logging();

    let source = Arc::new(InMemoryPlotSource::new(sample_parcels()));
    log::info!("Backend holds {} parcels", source.len());

    let map = PlotMapBuilder::admin_map(LatLng::new(54.71, 20.45), 10.0, Point::new(1280.0, 800.0))
        .with_url("https://admin.example.org/plots/map?lat=54.7104&lon=20.4522&zoom=10")
        .build(RecordingSurface::new())?;
    let notifications = {
        let mut session = MapSession::new(map, source.clone()).with_bulk_actions(source.clone());
        let notifications = session.map_mut().subscribe();
        session.mount()?;
        session.run_until_idle().await;
        report(session.map(), "initial");

        // Zoom into the first cluster the way a user click would
        let cluster = session
            .map()
            .clusters()
            .first()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no clusters at zoom 10"))?;
        let pixel = session.map().view().lat_lng_to_pixel(&cluster.center);
        session.map_mut().click(cluster.center, pixel, KeyModifiers::NONE);
        let (bounds, padding) = *session
            .map()
            .surface()
            .fit_requests()
            .last()
            .ok_or_else(|| anyhow::anyhow!("cluster click did not fit bounds"))?;
        let (center, zoom) = session.map().view().fit_bounds(&bounds, padding);
        let zoom = zoom.max(14.0);
        for event in [
            MapEvent::ViewChanged { center, zoom },
            MapEvent::ZoomEnd { zoom },
            MapEvent::MoveEnd { center },
        ] {
            session.execute(SessionCommand::Map(event));
        }
        session.run_until_idle().await;
        report(session.map(), "after cluster click");

        // Lasso around the middle of the view
        session.execute(SessionCommand::SetLasso(true));
        let view = *session.map().view();
        let corners = [
            Point::new(view.size.x * 0.3, view.size.y * 0.3),
            Point::new(view.size.x * 0.7, view.size.y * 0.3),
            Point::new(view.size.x * 0.7, view.size.y * 0.7),
            Point::new(view.size.x * 0.3, view.size.y * 0.7),
        ];
        let path: Vec<(LatLng, Point)> = corners
            .iter()
            .map(|p| (view.pixel_to_lat_lng(p), *p))
            .collect();
        session.execute(SessionCommand::Pointer(PointerEvent::Down {
            lat_lng: path[0].0,
            pixel: path[0].1,
        }));
        for &(lat_lng, pixel) in &path[1..] {
            session.execute(SessionCommand::Pointer(PointerEvent::Move { lat_lng, pixel }));
        }
        session.execute(SessionCommand::Pointer(PointerEvent::Up {
            lat_lng: path[3].0,
            pixel: path[3].1,
        }));
        session.execute(SessionCommand::SetLasso(false));
        report(session.map(), "after lasso");

        if !session.map().selection().is_empty() {
            let mut draft = ListingDraft::new("Lasso selection");
            draft.is_published = false;
            session.bulk(BulkAction::CreateListing(draft))?;
            session.run_until_idle().await;
            report(session.map(), "after create listing");
        }

        session.map_mut().teardown();
        notifications
    };

    for notification in notifications.try_iter() {
        if let MapNotification::ViewportSettled(viewport) = notification {
            let link = ViewState::from_viewport(&viewport)
                .merge_into("https://admin.example.org/plots/map", 6)?;
            println!("share: {link}");
        }
    }

    Ok(())
}
