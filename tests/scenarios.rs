//! End-to-end HTTP scenarios (spec.md §8), driven against an in-memory
//! [`AppContext`] so no live PostGIS instance is required.

mod common;

use actix_web::{test, web, App};
use serde_json::Value;

use nldi_services::handlers;
use nldi_services::model::Feature;
use nldi_services::testing::{
    square_catchment, straight_flowline, FakeCatchmentLookup, FakeFeatureLookup,
    FakeFlowlineLookup, FakeMainstemLookup, FakeNavigationSource,
};

const PREFIX: &str = "/api/nldi";

macro_rules! app_with_ctx {
    ($ctx:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($ctx))
                .configure(|cfg| handlers::configure(cfg, PREFIX)),
        )
        .await
    };
}

/// S1: resolve a flowline directly by its COMID.
#[actix_web::test]
async fn scenario_s1_get_by_comid() {
    let flowline = straight_flowline(13293474, -89.5, 43.0, 0.2);
    let ctx = common::build_context(
        vec![],
        FakeFeatureLookup::new(),
        FakeFlowlineLookup::with(vec![flowline]),
        FakeCatchmentLookup::new(),
        FakeMainstemLookup::new(),
        FakeNavigationSource::new(),
    )
    .await;

    let app = app_with_ctx!(ctx);
    let req = test::TestRequest::get()
        .uri(&format!("{PREFIX}/linked-data/comid/13293474"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: Value = test::read_body_json(resp).await;
    let feature = &body["features"][0];
    assert_eq!(feature["properties"]["comid"], "13293474");
    assert_eq!(feature["geometry"]["type"], "LineString");
}

/// S1 (miss): an unknown COMID is a 404 with the standard error body.
#[actix_web::test]
async fn scenario_s1_unknown_comid_is_not_found() {
    let ctx = common::build_context(
        vec![],
        FakeFeatureLookup::new(),
        FakeFlowlineLookup::new(),
        FakeCatchmentLookup::new(),
        FakeMainstemLookup::new(),
        FakeNavigationSource::new(),
    )
    .await;

    let app = app_with_ctx!(ctx);
    let req = test::TestRequest::get()
        .uri(&format!("{PREFIX}/linked-data/comid/999"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "NotFound");
}

/// S2: resolve the catchment containing a point.
#[actix_web::test]
async fn scenario_s2_position_by_coordinates() {
    let catchment = square_catchment(13293474, -89.5, 43.0, 0.05);
    let ctx = common::build_context(
        vec![],
        FakeFeatureLookup::new(),
        FakeFlowlineLookup::new(),
        FakeCatchmentLookup::with(vec![catchment]),
        FakeMainstemLookup::new(),
        FakeNavigationSource::new(),
    )
    .await;

    let app = app_with_ctx!(ctx);
    let req = test::TestRequest::get()
        .uri(&format!(
            "{PREFIX}/linked-data/comid/position?coords=POINT(-89.51 43.01)"
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: Value = test::read_body_json(resp).await;
    let feature = &body["features"][0];
    assert_eq!(feature["properties"]["comid"], "13293474");
    assert_eq!(feature["properties"]["type"], "catchment");
}

/// A point outside every known catchment is a 404, not a 200 with an empty
/// collection (spec.md §7).
#[actix_web::test]
async fn position_outside_any_catchment_is_not_found() {
    let catchment = square_catchment(1, 0.0, 0.0, 0.01);
    let ctx = common::build_context(
        vec![],
        FakeFeatureLookup::new(),
        FakeFlowlineLookup::new(),
        FakeCatchmentLookup::with(vec![catchment]),
        FakeMainstemLookup::new(),
        FakeNavigationSource::new(),
    )
    .await;

    let app = app_with_ctx!(ctx);
    let req = test::TestRequest::get()
        .uri(&format!("{PREFIX}/linked-data/comid/position?coords=POINT(50 50)"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

/// S3: a feature registered with a crawler source is addressable by its own
/// identifier, distinct from the comid source.
#[actix_web::test]
async fn scenario_s3_get_feature_from_source() {
    let source = common::wqp_source();
    let feature = Feature {
        source_id: source.source_id,
        identifier: "USGS-05427850".to_owned(),
        name: Some("Yahara River at Madison, WI".to_owned()),
        uri: Some("https://www.waterqualitydata.us/provider/NWIS/USGS-05427850".to_owned()),
        comid: 13293474,
        reachcode: Some("07090002000768".to_owned()),
        measure: Some(42.0),
    };

    let ctx = common::build_context(
        vec![source],
        FakeFeatureLookup::with(vec![feature]),
        FakeFlowlineLookup::new(),
        FakeCatchmentLookup::new(),
        FakeMainstemLookup::new(),
        FakeNavigationSource::new(),
    )
    .await;

    let app = app_with_ctx!(ctx);
    let req = test::TestRequest::get()
        .uri(&format!("{PREFIX}/linked-data/wqp/USGS-05427850"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: Value = test::read_body_json(resp).await;
    let props = &body["features"][0]["properties"];
    assert_eq!(props["identifier"], "USGS-05427850");
    assert_eq!(props["source"], "wqp");
    assert_eq!(props["comid"], "13293474");
}

/// S4: upstream-main navigation projected onto flowlines, in navigation
/// order, with the anchor reach trimmed to its measure.
#[actix_web::test]
async fn scenario_s4_navigate_um_flowlines() {
    let anchor_flowline = straight_flowline(13293474, -89.5, 43.0, 0.2);
    let upstream_flowline = straight_flowline(13293470, -89.5, 43.2, 0.2);

    let nav_source = FakeNavigationSource::new();
    nav_source.script("UM", 13293474, vec![13293474, 13293470]);

    let ctx = common::build_context(
        vec![],
        FakeFeatureLookup::new(),
        FakeFlowlineLookup::with(vec![anchor_flowline, upstream_flowline]),
        FakeCatchmentLookup::new(),
        FakeMainstemLookup::new(),
        nav_source,
    )
    .await;

    let app = app_with_ctx!(ctx);
    let req = test::TestRequest::get()
        .uri(&format!(
            "{PREFIX}/linked-data/comid/13293474/navigation/UM/flowlines?distance=10"
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: Value = test::read_body_json(resp).await;
    let features = body["features"].as_array().unwrap();
    assert_eq!(features.len(), 2);
    assert_eq!(features[0]["properties"]["comid"], "13293474");
    assert_eq!(features[1]["properties"]["comid"], "13293470");
}

/// S5: navigation projected onto a crawler source's features instead of raw
/// flowlines.
#[actix_web::test]
async fn scenario_s5_navigate_onto_source_features() {
    let source = common::wqp_source();
    let upstream_feature = Feature {
        source_id: source.source_id,
        identifier: "USGS-UPSTREAM".to_owned(),
        name: None,
        uri: None,
        comid: 13293470,
        reachcode: None,
        measure: None,
    };

    let nav_source = FakeNavigationSource::new();
    nav_source.script("UT", 13293474, vec![13293474, 13293470]);

    let ctx = common::build_context(
        vec![source],
        FakeFeatureLookup::with(vec![upstream_feature]),
        FakeFlowlineLookup::with(vec![straight_flowline(13293474, -89.5, 43.0, 0.2)]),
        FakeCatchmentLookup::new(),
        FakeMainstemLookup::new(),
        nav_source,
    )
    .await;

    let app = app_with_ctx!(ctx);
    let req = test::TestRequest::get()
        .uri(&format!(
            "{PREFIX}/linked-data/comid/13293474/navigation/UT/wqp?distance=10"
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: Value = test::read_body_json(resp).await;
    let features = body["features"].as_array().unwrap();
    assert_eq!(features.len(), 1);
    assert_eq!(features[0]["properties"]["identifier"], "USGS-UPSTREAM");
}

/// S6: point-to-point navigation requires `stopComid`; absent it, the
/// request is rejected before the navigation oracle is ever called.
#[actix_web::test]
async fn scenario_s6_pp_navigation_requires_stop_comid() {
    let ctx = common::build_context(
        vec![],
        FakeFeatureLookup::new(),
        FakeFlowlineLookup::with(vec![straight_flowline(13293474, -89.5, 43.0, 0.2)]),
        FakeCatchmentLookup::new(),
        FakeMainstemLookup::new(),
        FakeNavigationSource::new(),
    )
    .await;

    let app = app_with_ctx!(ctx);
    let req = test::TestRequest::get()
        .uri(&format!(
            "{PREFIX}/linked-data/comid/13293474/navigation/PP/flowlines"
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "InvalidInput");
}

#[actix_web::test]
async fn scenario_s6_pp_navigation_with_stop_comid_succeeds() {
    let anchor_flowline = straight_flowline(13293474, -89.5, 43.0, 0.2);
    let stop_flowline = straight_flowline(13293460, -89.5, 43.6, 0.2);

    let nav_source = FakeNavigationSource::new();
    nav_source.script("PP", 13293474, vec![13293474, 13293470, 13293460]);

    let ctx = common::build_context(
        vec![],
        FakeFeatureLookup::new(),
        FakeFlowlineLookup::with(vec![
            anchor_flowline,
            straight_flowline(13293470, -89.5, 43.3, 0.2),
            stop_flowline,
        ]),
        FakeCatchmentLookup::new(),
        FakeMainstemLookup::new(),
        nav_source,
    )
    .await;

    let app = app_with_ctx!(ctx);
    let req = test::TestRequest::get()
        .uri(&format!(
            "{PREFIX}/linked-data/comid/13293474/navigation/PP/flowlines?stopComid=13293460"
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["features"].as_array().unwrap().len(), 3);
}

/// S7: the upstream basin endpoint shapes an (empty, in this fixture)
/// aggregated polygon as a valid — if featureless — FeatureCollection.
#[actix_web::test]
async fn scenario_s7_basin_endpoint() {
    let nav_source = FakeNavigationSource::new();
    nav_source.script("UM", 13293474, vec![13293474]);

    let ctx = common::build_context(
        vec![],
        FakeFeatureLookup::new(),
        FakeFlowlineLookup::with(vec![straight_flowline(13293474, -89.5, 43.0, 0.2)]),
        FakeCatchmentLookup::new(),
        FakeMainstemLookup::new(),
        nav_source,
    )
    .await;

    let app = app_with_ctx!(ctx);
    let req = test::TestRequest::get()
        .uri(&format!("{PREFIX}/linked-data/comid/13293474/basin"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["type"], "FeatureCollection");
}

/// The navigation-mode index enumerates all five modes.
#[actix_web::test]
async fn navigation_index_lists_all_modes() {
    let ctx = common::build_context(
        vec![],
        FakeFeatureLookup::new(),
        FakeFlowlineLookup::with(vec![straight_flowline(13293474, -89.5, 43.0, 0.2)]),
        FakeCatchmentLookup::new(),
        FakeMainstemLookup::new(),
        FakeNavigationSource::new(),
    )
    .await;

    let app = app_with_ctx!(ctx);
    let req = test::TestRequest::get()
        .uri(&format!("{PREFIX}/linked-data/comid/13293474/navigation"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body.as_array().unwrap().len(), 5);
}

/// Paging parameters out of range are rejected with 400, not clamped.
#[actix_web::test]
async fn list_features_rejects_invalid_limit() {
    let ctx = common::build_context(
        vec![common::wqp_source()],
        FakeFeatureLookup::new(),
        FakeFlowlineLookup::new(),
        FakeCatchmentLookup::new(),
        FakeMainstemLookup::new(),
        FakeNavigationSource::new(),
    )
    .await;

    let app = app_with_ctx!(ctx);
    let req = test::TestRequest::get()
        .uri(&format!("{PREFIX}/linked-data/wqp?limit=0"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

/// An unknown source suffix is a 404 everywhere it is used as a path
/// segment.
#[actix_web::test]
async fn unknown_source_suffix_is_not_found() {
    let ctx = common::build_context(
        vec![],
        FakeFeatureLookup::new(),
        FakeFlowlineLookup::new(),
        FakeCatchmentLookup::new(),
        FakeMainstemLookup::new(),
        FakeNavigationSource::new(),
    )
    .await;

    let app = app_with_ctx!(ctx);
    let req = test::TestRequest::get()
        .uri(&format!("{PREFIX}/linked-data/not-a-real-source"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

/// The landing document and source list are reachable with no fixtures at
/// all.
#[actix_web::test]
async fn landing_and_source_list_are_reachable() {
    let ctx = common::build_context(
        vec![],
        FakeFeatureLookup::new(),
        FakeFlowlineLookup::new(),
        FakeCatchmentLookup::new(),
        FakeMainstemLookup::new(),
        FakeNavigationSource::new(),
    )
    .await;

    let app = app_with_ctx!(ctx);

    let landing_req = test::TestRequest::get().uri(&format!("{PREFIX}/")).to_request();
    let landing_resp = test::call_service(&app, landing_req).await;
    assert!(landing_resp.status().is_success());

    let sources_req = test::TestRequest::get()
        .uri(&format!("{PREFIX}/linked-data"))
        .to_request();
    let sources_resp = test::call_service(&app, sources_req).await;
    assert!(sources_resp.status().is_success());
    let body: Value = test::read_body_json(sources_resp).await;
    // The synthetic `comid` source is always present.
    assert!(body.as_array().unwrap().iter().any(|s| s["source"] == "comid"));
}

