//! Shared scaffolding for the integration tests: builds an [`AppContext`]
//! entirely from the in-memory fakes in [`nldi_services::testing`], so the
//! HTTP layer and response shaping are exercised without a live PostGIS
//! instance.

use std::sync::Arc;

use nldi_services::config::{AppConfig, DatabaseConfig, MetadataConfig, PygeoapiConfig, ServerConfig};
use nldi_services::context::AppContext;
use nldi_services::geoprocessing::GeoprocessingClient;
use nldi_services::lookup::{BasinLookup, CatchmentLookup, FeatureLookup, FlowlineLookup, MainstemLookup};
use nldi_services::model::{CrawlerSource, IngestType};
use nldi_services::navigation::NavigationEngine;
use nldi_services::testing::{
    FakeBasinLookup, FakeCatchmentLookup, FakeFeatureLookup, FakeFlowlineLookup,
    FakeMainstemLookup, FakeNavigationSource, FakeSourceTable,
};
use nldi_services::sources::SourceRegistry;

pub fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            url: "http://localhost".to_owned(),
            prefix: "/api/nldi".to_owned(),
            pretty_print: false,
            bind_address: "127.0.0.1:0".to_owned(),
        },
        database: DatabaseConfig {
            host: "unused".to_owned(),
            port: 5432,
            name: "unused".to_owned(),
            username: "unused".to_owned(),
            password: "unused".to_owned(),
            pool_size: 1,
            pool_timeout_ms: 1_000,
        },
        log_level: "info".to_owned(),
        pygeoapi: PygeoapiConfig {
            url: "http://127.0.0.1:0".to_owned(),
            enabled: false,
            timeout_s: 1,
        },
        metadata: MetadataConfig {
            title: "NLDI test service".to_owned(),
            license: "CC0".to_owned(),
            contact: "nldi-test@example.org".to_owned(),
        },
        sources: Vec::new(),
    }
}

pub fn wqp_source() -> CrawlerSource {
    CrawlerSource {
        source_id: 7,
        suffix: "wqp".to_owned(),
        source_name: "Water Quality Portal".to_owned(),
        source_uri: "https://www.waterqualitydata.us".to_owned(),
        columns: nldi_services::model::ColumnMapping {
            identifier_column: "monitoring_location_identifier".to_owned(),
            name_column: "monitoring_location_name".to_owned(),
            uri_column: "uri".to_owned(),
        },
        ingest_type: IngestType::Point,
        feature_type: "monitoring location".to_owned(),
    }
}

/// Builds a fully in-memory [`AppContext`], configured by the closures'
/// return values so each test can script exactly the fixtures it needs.
pub async fn build_context(
    sources: Vec<CrawlerSource>,
    features: FakeFeatureLookup,
    flowlines: FakeFlowlineLookup,
    catchments: FakeCatchmentLookup,
    mainstems: FakeMainstemLookup,
    nav_source: FakeNavigationSource,
) -> AppContext {
    let config = Arc::new(test_config());

    let source_table = Arc::new(FakeSourceTable::new(sources));
    let source_registry = Arc::new(
        SourceRegistry::load_from(source_table)
            .await
            .expect("in-memory source table never fails"),
    );

    let features: Arc<dyn FeatureLookup> = Arc::new(features);
    let flowlines: Arc<dyn FlowlineLookup> = Arc::new(flowlines);
    let catchments: Arc<dyn CatchmentLookup> = Arc::new(catchments);
    let mainstems: Arc<dyn MainstemLookup> = Arc::new(mainstems);
    let basins: Arc<dyn BasinLookup> = Arc::new(FakeBasinLookup);

    let navigation = Arc::new(NavigationEngine::new(
        Arc::new(nav_source),
        flowlines.clone(),
        mainstems.clone(),
        basins.clone(),
    ));

    let geoprocessing = Arc::new(
        GeoprocessingClient::new(&config.pygeoapi).expect("disabled client always builds"),
    );

    let anchors = Arc::new(nldi_services::anchor::AnchorResolver::new(
        features.clone(),
        flowlines.clone(),
        catchments.clone(),
        geoprocessing.clone(),
    ));

    AppContext {
        config,
        sources: source_registry,
        features,
        flowlines,
        catchments,
        mainstems,
        basins,
        navigation,
        anchors,
        geoprocessing,
    }
}

