//! In-memory fakes for the lookup-plugin traits, used by integration tests
//! so the navigation engine, anchor resolver, and handlers can be exercised
//! without a live PostGIS instance (SPEC_FULL.md §D; mirrors the teacher's
//! `InMemoryContext` pattern).

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use geo_types::{LineString, Polygon};

use crate::config::SourceDeclaration;
use crate::error::{Error, Result};
use crate::lookup::{BasinLookup, CatchmentLookup, FeatureLookup, FlowlineLookup, MainstemLookup};
use crate::model::{Basin, Catchment, CrawlerSource, Feature, Flowline};
use crate::navigation::NavigationSource;
use crate::sources::SourceTable;

#[derive(Default)]
pub struct FakeFlowlineLookup {
    flowlines: Mutex<HashMap<i64, Flowline>>,
}

impl FakeFlowlineLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, flowline: Flowline) {
        self.flowlines.lock().unwrap().insert(flowline.comid, flowline);
    }

    pub fn with(flowlines: Vec<Flowline>) -> Self {
        let fake = Self::new();
        for f in flowlines {
            fake.insert(f);
        }
        fake
    }
}

#[async_trait]
impl FlowlineLookup for FakeFlowlineLookup {
    async fn by_comid(&self, comid: i64) -> Result<Flowline> {
        self.flowlines
            .lock()
            .unwrap()
            .get(&comid)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("flowline comid {comid}")))
    }

    async fn by_comids(&self, comids: &[i64]) -> Result<Vec<Flowline>> {
        let map = self.flowlines.lock().unwrap();
        Ok(comids.iter().filter_map(|c| map.get(c).cloned()).collect())
    }
}

#[derive(Default)]
pub struct FakeFeatureLookup {
    features: Mutex<Vec<Feature>>,
}

impl FakeFeatureLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(features: Vec<Feature>) -> Self {
        FakeFeatureLookup {
            features: Mutex::new(features),
        }
    }
}

#[async_trait]
impl FeatureLookup for FakeFeatureLookup {
    async fn by_identifier(&self, source_id: i32, identifier: &str) -> Result<Feature> {
        self.features
            .lock()
            .unwrap()
            .iter()
            .find(|f| f.source_id == source_id && f.identifier == identifier)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("feature '{identifier}' in source {source_id}")))
    }

    async fn list_paged(&self, source_id: i32, limit: i64, offset: i64) -> Result<Vec<Feature>> {
        let mut matching: Vec<Feature> = self
            .features
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.source_id == source_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        Ok(matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn by_source_and_comids(&self, source_id: i32, comids: &[i64]) -> Result<Vec<Feature>> {
        let mut matching: Vec<Feature> = self
            .features
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.source_id == source_id && comids.contains(&f.comid))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        Ok(matching)
    }

    async fn nearest(&self, source_id: i32, _lon: f64, _lat: f64) -> Result<Feature> {
        self.features
            .lock()
            .unwrap()
            .iter()
            .find(|f| f.source_id == source_id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("feature of source {source_id}")))
    }
}

#[derive(Default)]
pub struct FakeCatchmentLookup {
    catchments: Mutex<Vec<Catchment>>,
}

impl FakeCatchmentLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(catchments: Vec<Catchment>) -> Self {
        FakeCatchmentLookup {
            catchments: Mutex::new(catchments),
        }
    }
}

#[async_trait]
impl CatchmentLookup for FakeCatchmentLookup {
    async fn containing_point(&self, lon: f64, lat: f64) -> Result<Catchment> {
        use geo::algorithm::contains::Contains;
        let point = geo_types::Point::new(lon, lat);
        self.catchments
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.geometry.contains(&point))
            .cloned()
            .ok_or_else(|| Error::not_found(format!("catchment containing ({lon}, {lat})")))
    }

    async fn by_comid(&self, comid: i64) -> Result<Catchment> {
        self.catchments
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.featureid == comid)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("catchment for comid {comid}")))
    }
}

#[derive(Default)]
pub struct FakeMainstemLookup {
    mainstems: Mutex<HashMap<i64, String>>,
}

impl FakeMainstemLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mainstems: HashMap<i64, String>) -> Self {
        FakeMainstemLookup {
            mainstems: Mutex::new(mainstems),
        }
    }
}

#[async_trait]
impl MainstemLookup for FakeMainstemLookup {
    async fn by_comid(&self, comid: i64) -> Result<Option<String>> {
        Ok(self.mainstems.lock().unwrap().get(&comid).cloned())
    }
}

#[derive(Default)]
pub struct FakeBasinLookup;

#[async_trait]
impl BasinLookup for FakeBasinLookup {
    async fn upstream_basin(
        &self,
        _comids: &[i64],
        _simplify_tolerance: Option<f64>,
    ) -> Result<Basin> {
        Ok(Basin {
            geometry: geo_types::MultiPolygon(vec![]),
        })
    }
}

/// An in-memory stand-in for the `crawler_source` table, so
/// `SourceRegistry::load_from` can be exercised without a database.
pub struct FakeSourceTable {
    sources: Mutex<Vec<CrawlerSource>>,
}

impl FakeSourceTable {
    pub fn new(sources: Vec<CrawlerSource>) -> Self {
        FakeSourceTable {
            sources: Mutex::new(sources),
        }
    }
}

#[async_trait]
impl SourceTable for FakeSourceTable {
    async fn fetch(&self) -> Result<Vec<CrawlerSource>> {
        Ok(self.sources.lock().unwrap().clone())
    }

    async fn upsert(&self, _declared: &[SourceDeclaration]) -> Result<()> {
        Ok(())
    }
}

/// An in-memory stand-in for `nhdplus_navigation.navigate`, keyed by
/// `(mode, start_comid)` so a test can script exactly which COMIDs a given
/// navigation call should return, independent of distance/stop_comid.
#[derive(Default)]
pub struct FakeNavigationSource {
    responses: Mutex<HashMap<(String, i64), Vec<i64>>>,
}

impl FakeNavigationSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, mode: &str, start_comid: i64, comids: Vec<i64>) {
        self.responses
            .lock()
            .unwrap()
            .insert((mode.to_ascii_uppercase(), start_comid), comids);
    }
}

#[async_trait]
impl NavigationSource for FakeNavigationSource {
    async fn navigate(
        &self,
        mode: &str,
        start_comid: i64,
        _distance_km: f64,
        _stop_comid: Option<i64>,
    ) -> Result<Vec<i64>> {
        Ok(self
            .responses
            .lock()
            .unwrap()
            .get(&(mode.to_ascii_uppercase(), start_comid))
            .cloned()
            .unwrap_or_default())
    }
}

/// Builds a trivial straight-line flowline for tests, running from
/// `(lon, lat)` north by `length_deg` degrees (upstream end first, per the
/// flow-direction convention documented in [`crate::util::geom`]).
pub fn straight_flowline(comid: i64, lon: f64, lat: f64, length_deg: f64) -> Flowline {
    Flowline {
        comid,
        geometry: LineString::new(vec![
            geo_types::Coord { x: lon, y: lat + length_deg },
            geo_types::Coord { x: lon, y: lat },
        ]),
        reachcode: format!("{comid:014}"),
        fromnode: comid * 10,
        tonode: comid * 10 + 1,
        hydroseq: comid,
        pathlength: length_deg * 111.0,
        lengthkm: length_deg * 111.0,
        mainstem_id: None,
    }
}

/// A square catchment polygon centered on `(lon, lat)` with the given half
/// extent, for tests of the "containing point" lookup.
pub fn square_catchment(featureid: i64, lon: f64, lat: f64, half_extent: f64) -> Catchment {
    Catchment {
        featureid,
        geometry: Polygon::new(
            LineString::new(vec![
                geo_types::Coord { x: lon - half_extent, y: lat - half_extent },
                geo_types::Coord { x: lon + half_extent, y: lat - half_extent },
                geo_types::Coord { x: lon + half_extent, y: lat + half_extent },
                geo_types::Coord { x: lon - half_extent, y: lat + half_extent },
                geo_types::Coord { x: lon - half_extent, y: lat - half_extent },
            ]),
            vec![],
        ),
    }
}
