//! The application context: config, DB pool, source registry, lookup
//! plugins, navigation engine, and the geoprocessing client, bundled once at
//! startup and passed into every handler rather than reached for as
//! process-wide singletons (spec.md §9 "Global state").

use std::sync::Arc;

use crate::anchor::AnchorResolver;
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::error::Result;
use crate::geoprocessing::GeoprocessingClient;
use crate::lookup::basin::PgBasinLookup;
use crate::lookup::catchment::PgCatchmentLookup;
use crate::lookup::feature::PgFeatureLookup;
use crate::lookup::flowline::PgFlowlineLookup;
use crate::lookup::mainstem::PgMainstemLookup;
use crate::lookup::{BasinLookup, CatchmentLookup, FeatureLookup, FlowlineLookup, MainstemLookup};
use crate::navigation::{NavigationEngine, NavigationSource, PgNavigationSource};
use crate::response::LinkBuilder;
use crate::sources::SourceRegistry;

#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub sources: Arc<SourceRegistry>,
    pub features: Arc<dyn FeatureLookup>,
    pub flowlines: Arc<dyn FlowlineLookup>,
    pub catchments: Arc<dyn CatchmentLookup>,
    pub mainstems: Arc<dyn MainstemLookup>,
    pub basins: Arc<dyn BasinLookup>,
    pub navigation: Arc<NavigationEngine>,
    pub anchors: Arc<AnchorResolver>,
    pub geoprocessing: Arc<GeoprocessingClient>,
}

impl AppContext {
    pub async fn bootstrap(config: AppConfig) -> Result<Self> {
        let pool = DbPool::connect(&config.database).await?;
        let sources = Arc::new(SourceRegistry::load(pool.clone()).await?);

        let features: Arc<dyn FeatureLookup> = Arc::new(PgFeatureLookup::new(pool.clone()));
        let flowlines: Arc<dyn FlowlineLookup> = Arc::new(PgFlowlineLookup::new(pool.clone()));
        let catchments: Arc<dyn CatchmentLookup> = Arc::new(PgCatchmentLookup::new(pool.clone()));
        let mainstems: Arc<dyn MainstemLookup> = Arc::new(PgMainstemLookup::new(pool.clone()));
        let basins: Arc<dyn BasinLookup> = Arc::new(PgBasinLookup::new(pool.clone()));

        let geoprocessing = Arc::new(GeoprocessingClient::new(&config.pygeoapi)?);

        let nav_source: Arc<dyn NavigationSource> = Arc::new(PgNavigationSource::new(pool.clone()));
        let navigation = Arc::new(NavigationEngine::new(
            nav_source,
            flowlines.clone(),
            mainstems.clone(),
            basins.clone(),
        ));

        let anchors = Arc::new(AnchorResolver::new(
            features.clone(),
            flowlines.clone(),
            catchments.clone(),
            geoprocessing.clone(),
        ));

        Ok(AppContext {
            config: Arc::new(config),
            sources,
            features,
            flowlines,
            catchments,
            mainstems,
            basins,
            navigation,
            anchors,
            geoprocessing,
        })
    }

    pub fn link_builder(&self) -> LinkBuilder {
        LinkBuilder {
            base_url: format!(
                "{}{}",
                self.config.server.url.trim_end_matches('/'),
                self.config.server.prefix
            ),
        }
    }
}
