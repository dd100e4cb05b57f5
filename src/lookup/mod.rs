//! Lookup plugins: one read-only query object per logical table family
//! (spec.md §4.3). Each plugin is an interface (capability set) with a
//! single PostGIS-backed implementation; tests substitute an in-memory
//! fake implementing the same trait (see [`crate::testing`]).

pub mod basin;
pub mod catchment;
pub mod feature;
pub mod flowline;
pub mod mainstem;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Basin, Catchment, Feature, Flowline};

#[async_trait]
pub trait FeatureLookup: Send + Sync {
    async fn by_identifier(&self, source_id: i32, identifier: &str) -> Result<Feature>;

    async fn list_paged(&self, source_id: i32, limit: i64, offset: i64) -> Result<Vec<Feature>>;

    /// All features of `source_id` whose COMID is one of `comids` — used to
    /// project a navigation result onto a crawler source (spec.md §4.5).
    async fn by_source_and_comids(&self, source_id: i32, comids: &[i64]) -> Result<Vec<Feature>>;

    /// Nearest feature of `source_id` to `(lon, lat)`, used when a `point`
    /// source's feature needs to be located against the catchment grid.
    async fn nearest(&self, source_id: i32, lon: f64, lat: f64) -> Result<Feature>;
}

#[async_trait]
pub trait FlowlineLookup: Send + Sync {
    async fn by_comid(&self, comid: i64) -> Result<Flowline>;

    async fn by_comids(&self, comids: &[i64]) -> Result<Vec<Flowline>>;
}

#[async_trait]
pub trait CatchmentLookup: Send + Sync {
    async fn containing_point(&self, lon: f64, lat: f64) -> Result<Catchment>;

    async fn by_comid(&self, comid: i64) -> Result<Catchment>;
}

#[async_trait]
pub trait MainstemLookup: Send + Sync {
    /// `Ok(None)` means no mainstem is recorded for this COMID; this is an
    /// annotation miss, not an error (spec.md §7).
    async fn by_comid(&self, comid: i64) -> Result<Option<String>>;
}

#[async_trait]
pub trait BasinLookup: Send + Sync {
    async fn upstream_basin(&self, comids: &[i64], simplify_tolerance: Option<f64>)
        -> Result<Basin>;
}
