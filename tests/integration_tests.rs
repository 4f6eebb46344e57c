#[cfg(test)]
mod integration_tests {
    use plotmap::prelude::*;

    const ADMIN_BODY: &str = r#"{
        "items": [
            {
                "id": 101,
                "cadastral_number": "39:05:010203:45",
                "area": 1200.0,
                "address": "Zelenogradsk, Lesnaya 4",
                "status": "active",
                "listing_id": null,
                "polygon_coords": [[54.9580, 20.4750], [54.9580, 20.4770], [54.9595, 20.4770], [54.9595, 20.4750]],
                "comment": null
            },
            {
                "id": 102,
                "cadastral_number": "39:05:010203:46",
                "area": 800.0,
                "status": "reserved",
                "listing_id": 12,
                "listing": {"id": 12, "slug": "lesnaya-4", "title": "Plots on Lesnaya", "is_published": true},
                "polygon_coords": [[54.9600, 20.4780], [54.9600, 20.4795], [54.9612, 20.4795], [54.9612, 20.4780]]
            },
            {
                "id": 103,
                "cadastral_number": "39:05:010203:47",
                "polygon_coords": []
            }
        ],
        "clusters": [],
        "mode": "plots",
        "total": 3
    }"#;

    fn mounted(zoom: f64) -> (PlotMap<RecordingSurface>, FetchTicket, Instant) {
        let mut map =
            PlotMapBuilder::admin_map(LatLng::new(54.9595, 20.4770), zoom, Point::new(1024.0, 768.0))
                .build(RecordingSurface::new())
                .unwrap();
        let start = Instant::now();
        map.mount(start).unwrap();
        let now = start + Duration::from_millis(300);
        let ticket = map.poll(now).unwrap();
        (map, ticket, now)
    }

    #[test]
    fn test_admin_wire_response_end_to_end() {
        let (mut map, ticket, _) = mounted(17.0);
        let response: FetchResponse = serde_json::from_str(ADMIN_BODY).unwrap();
        map.apply_response(ticket.seq, Ok(response));

        assert_eq!(map.surface().polygons().len(), 2);
        assert_eq!(
            map.surface().labels(),
            ["39:05:010203:45", "39:05:010203:46"]
        );

        map.click(LatLng::new(54.9605, 20.4785), Point::default(), KeyModifiers::NONE);
        let details = map.focused_parcel().unwrap();
        assert_eq!(details.id, ParcelId(102));
        assert_eq!(details.area_sotki, Some(8.0));
        assert_eq!(details.status, ParcelStatus::Reserved);
        assert_eq!(details.listing.unwrap().slug, "lesnaya-4");

        assert_eq!(
            map.stats(),
            ViewportStats {
                assigned: 1,
                unassigned: 2,
                total: 3
            }
        );
    }

    #[test]
    fn test_catalog_wire_response_infers_clusters() {
        let (mut map, ticket, _) = mounted(9.0);
        let body = r#"{
            "plots": [],
            "clusters": [
                {"center": [54.95, 20.47], "count": 1, "bounds": [[54.95, 20.47], [54.95, 20.47]]},
                {"center": [54.72, 20.50], "count": 310, "price_range": [400000, 2500000],
                 "bounds": [[54.60, 20.30], [54.80, 20.70]]}
            ],
            "total_in_viewport": 311,
            "zoom": 9
        }"#;
        let response: FetchResponse = serde_json::from_str(body).unwrap();
        map.apply_response(ticket.seq, Ok(response));

        assert_eq!(map.mode(), Some(RenderMode::Clusters));
        let radii: Vec<f64> = map.surface().circles().iter().map(|c| c.1).collect();
        assert_eq!(radii[0], 14.0);
        assert!(radii[1] > 14.0 && radii[1] < 48.0);
        assert_eq!(map.stats().total, 311);
    }

    #[test]
    fn test_url_round_trip() {
        let (mut map, _, now) = mounted(15.0);
        let events = map.subscribe();

        let center = LatLng::new(54.9612, 20.4811);
        map.on_map_event(&MapEvent::MoveEnd { center }, now);
        map.poll(now + Duration::from_millis(500));

        let settled = events
            .try_iter()
            .find_map(|n| match n {
                MapNotification::ViewportSettled(viewport) => Some(viewport),
                _ => None,
            })
            .expect("settled viewport");
        let link = ViewState::from_viewport(&settled)
            .merge_into("https://admin.example.org/plots/map?district_id=2", 6)
            .unwrap();
        assert!(link.starts_with("https://admin.example.org/plots/map?district_id=2&lat="));
        assert!(link.ends_with("&zoom=15"));

        let restored = PlotMapBuilder::new()
            .with_size(Point::new(1024.0, 768.0))
            .with_url(&link)
            .build(RecordingSurface::new())
            .unwrap();
        assert!((restored.view().center.lat - center.lat).abs() < 1e-3);
        assert!((restored.view().center.lng - center.lng).abs() < 1e-3);
        assert_eq!(restored.view().zoom, 15.0);
    }

    #[test]
    fn test_config_file_drives_builder() {
        let path = std::env::temp_dir().join(format!("plotmap-config-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{
                "fetch": {"base_url": "https://api.example.org", "debounce_ms": 150,
                          "policy": "drop_superseded", "request_timeout_ms": 5000},
                "url_sync": {"enabled": false},
                "render": {"label_min_zoom": 15}
            }"#,
        )
        .unwrap();
        let config = PlotMapConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.fetch.policy, ResponsePolicy::DropSuperseded);
        assert_eq!(config.fetch.request_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.lasso.min_points, 3);

        let mut map = PlotMapBuilder::new()
            .with_config(config)
            .with_size(Point::new(800.0, 600.0))
            .build(RecordingSurface::new())
            .unwrap();
        let start = Instant::now();
        map.mount(start).unwrap();
        assert_eq!(map.next_deadline(), Some(start + Duration::from_millis(150)));
        map.poll(start + Duration::from_millis(150)).unwrap();
        // URL sync disabled: nothing else scheduled
        assert!(map.next_deadline().is_none());

        let source = HttpPlotSource::new(&map.config().fetch).unwrap();
        assert_eq!(source.url().as_str(), "https://api.example.org/api/admin/plots/map");
    }
}
