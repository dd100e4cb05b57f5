//! HTTP handlers. Routing, content negotiation, and the HTTP veneer are
//! explicitly out of core scope (spec.md §1); this module is the thin
//! layer that adapts the navigation/lookup engine to actix-web, and the
//! single place that maps [`crate::error::Error`] to a status code
//! (spec.md §7).

pub mod comid;
pub mod openapi;
pub mod request_id;
pub mod root;
pub mod sources;

use actix_web::web;
use serde::Deserialize;

use crate::context::AppContext;

pub fn configure(cfg: &mut web::ServiceConfig, prefix: &str) {
    cfg.service(
        web::scope(prefix)
            .route("/", web::get().to(root::landing))
            .route("/openapi", web::get().to(openapi::openapi))
            .route(
                "/linked-data/hydrolocation",
                web::get().to(comid::hydrolocation),
            )
            .route(
                "/linked-data/comid/position",
                web::get().to(comid::position),
            )
            .route("/linked-data/comid/{comid}", web::get().to(comid::get_comid))
            .route("/linked-data", web::get().to(sources::list_sources))
            .route(
                "/linked-data/{source}",
                web::get().to(sources::list_features),
            )
            .route(
                "/linked-data/{source}/{feature_id}",
                web::get().to(sources::get_feature),
            )
            .route(
                "/linked-data/{source}/{feature_id}/basin",
                web::get().to(sources::get_basin),
            )
            .route(
                "/linked-data/{source}/{feature_id}/navigation",
                web::get().to(sources::navigation_index),
            )
            .route(
                "/linked-data/{source}/{feature_id}/navigation/{mode}",
                web::get().to(sources::navigation_outputs),
            )
            .route(
                "/linked-data/{source}/{feature_id}/navigation/{mode}/{data_source}",
                web::get().to(sources::navigate),
            ),
    );
}

/// `?limit=&offset=` on the "features of a source, paged" endpoint.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// `?simplified=&splitCatchment=` on the basin endpoint.
#[derive(Debug, Deserialize)]
pub struct BasinQuery {
    #[serde(default)]
    pub simplified: bool,
    #[serde(default, rename = "splitCatchment")]
    pub split_catchment: bool,
}

/// `?distance=&stopComid=&trimStart=&trimTolerance=&legacy=` on the primary
/// navigation call.
#[derive(Debug, Deserialize)]
pub struct NavigationQuery {
    pub distance: Option<f64>,
    #[serde(default, rename = "stopComid")]
    pub stop_comid: Option<i64>,
    #[serde(default, rename = "trimStart")]
    pub trim_start: bool,
    #[serde(default, rename = "trimTolerance")]
    pub trim_tolerance: Option<f64>,
    /// Forward-compatibility no-op, accepted and logged (spec.md §9 Open
    /// Question (ii)).
    #[serde(default)]
    pub legacy: Option<String>,
    #[serde(default, rename = "excludeGeometry")]
    pub exclude_geometry: bool,
}

/// `?coords=POINT(lon lat)` shared by the coordinate-based endpoints.
#[derive(Debug, Deserialize)]
pub struct CoordsQuery {
    pub coords: String,
}

pub(crate) type Ctx = web::Data<AppContext>;
