//! Navigation engine: wraps `nhdplus_navigation.navigate` and offers the
//! flowline / feature / basin projections over its result (spec.md §4.5).

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::db::DbPool;
use crate::error::{Error, Result};
use crate::lookup::{BasinLookup, FlowlineLookup, MainstemLookup};
use crate::model::{Anchor, Basin, Flowline, MainstemEntry, NavMode, NavResult};
use crate::util::geom::{clip_linestring, measure_to_fraction};

/// The `nhdplus_navigation.navigate` SQL function, as a capability rather
/// than a direct pool dependency — lets the engine's projection logic be
/// exercised against an in-memory fake (see [`crate::testing`]) without a
/// live PostGIS instance.
#[async_trait]
pub trait NavigationSource: Send + Sync {
    async fn navigate(
        &self,
        mode: &str,
        start_comid: i64,
        distance_km: f64,
        stop_comid: Option<i64>,
    ) -> Result<Vec<i64>>;
}

pub struct PgNavigationSource {
    pool: DbPool,
}

impl PgNavigationSource {
    pub fn new(pool: DbPool) -> Self {
        PgNavigationSource { pool }
    }
}

#[async_trait]
impl NavigationSource for PgNavigationSource {
    async fn navigate(
        &self,
        mode: &str,
        start_comid: i64,
        distance_km: f64,
        stop_comid: Option<i64>,
    ) -> Result<Vec<i64>> {
        let mode = mode.to_owned();
        self.pool
            .with_session(move |conn| {
                Box::pin(async move {
                    let rows = conn
                        .query(
                            "SELECT comid FROM nhdplus_navigation.navigate($1, $2, $3, $4)",
                            &[&mode, &start_comid, &distance_km, &stop_comid],
                        )
                        .await?;
                    Ok(rows.iter().map(|r| r.get::<_, i64>("comid")).collect())
                })
            })
            .await
    }
}

pub struct NavigationEngine {
    source: Arc<dyn NavigationSource>,
    flowlines: Arc<dyn FlowlineLookup>,
    mainstems: Arc<dyn MainstemLookup>,
    basins: Arc<dyn BasinLookup>,
}

/// Validated parameters for one navigation request (spec.md §4.5 "Inputs and
/// constraints").
#[derive(Debug, Clone, Copy)]
pub struct NavParams {
    pub mode: NavMode,
    pub distance_km: f64,
    pub stop_comid: Option<i64>,
}

impl NavParams {
    pub fn new(mode: NavMode, distance_km: f64, stop_comid: Option<i64>) -> Result<Self> {
        if stop_comid.is_some() && !mode.accepts_stop_comid() {
            return Err(Error::invalid_input(format!(
                "mode {} does not accept stopComid",
                mode.as_str()
            )));
        }
        if mode == NavMode::Pp && stop_comid.is_none() {
            return Err(Error::invalid_input("PP navigation requires stopComid"));
        }
        if mode != NavMode::Pp && !(0.0 < distance_km && distance_km < 10_000.0) {
            return Err(Error::invalid_input(format!(
                "distance must be strictly between 0 and 10000 km, got {distance_km}"
            )));
        }
        Ok(NavParams {
            mode,
            distance_km,
            stop_comid,
        })
    }
}

impl NavigationEngine {
    pub fn new(
        source: Arc<dyn NavigationSource>,
        flowlines: Arc<dyn FlowlineLookup>,
        mainstems: Arc<dyn MainstemLookup>,
        basins: Arc<dyn BasinLookup>,
    ) -> Self {
        NavigationEngine {
            source,
            flowlines,
            mainstems,
            basins,
        }
    }

    /// Calls `nhdplus_navigation.navigate(mode, start_comid, distance_km,
    /// stop_comid)` and returns the ordered, de-duplicated COMID sequence
    /// (spec.md §4.5 "Edge cases and tie-breaks").
    pub async fn navigate(&self, anchor: &Anchor, params: NavParams) -> Result<NavResult> {
        let comids = self
            .source
            .navigate(
                params.mode.as_str(),
                anchor.comid,
                params.distance_km,
                params.stop_comid,
            )
            .await?;

        let mut seen = HashSet::with_capacity(comids.len());
        let mut ordered = Vec::with_capacity(comids.len());
        for comid in comids {
            if seen.insert(comid) {
                ordered.push(comid);
            }
        }

        let trim_start = anchor.measure.is_some();
        let trim_end = params.mode == NavMode::Pp;

        Ok(NavResult {
            comids: ordered,
            trim_start,
            trim_end,
        })
    }

    /// Projects a `NavResult` onto flowline geometry, preserving navigation
    /// order, with optional trimming of the first/last reach.
    pub async fn project_flowlines(
        &self,
        anchor: &Anchor,
        params: NavParams,
        nav_result: &NavResult,
        trim_start_requested: bool,
        simplify_tolerance: Option<f64>,
    ) -> Result<Vec<Flowline>> {
        if nav_result.is_empty() {
            return Ok(Vec::new());
        }

        let mut flowlines = self.flowlines.by_comids(&nav_result.comids).await?;
        // `by_comids` makes no ordering promise; restore navigation order.
        flowlines.sort_by_key(|f| {
            nav_result
                .comids
                .iter()
                .position(|c| *c == f.comid)
                .unwrap_or(usize::MAX)
        });

        if trim_start_requested && nav_result.trim_start {
            if let (Some(first), Some(measure)) = (flowlines.first_mut(), anchor.measure) {
                let f = measure_to_fraction(measure);
                let (f0, f1) = if params.mode.is_upstream() {
                    (0.0, f)
                } else {
                    (f, 1.0)
                };
                first.geometry = clip_linestring(&first.geometry, f0, f1);
            }
        }

        // `stopComid` names a reach, not a measured point on it, so the PP
        // stop flowline is kept whole; there is no stop measure to trim
        // against until the external interface grows a `stopMeasure` param.
        let _ = nav_result.trim_end;

        if let Some(tol) = simplify_tolerance {
            for fl in &mut flowlines {
                fl.geometry = crate::util::geom::simplify_linestring(&fl.geometry, tol);
            }
        }

        Ok(flowlines)
    }

    /// Mainstem URIs for each COMID in `nav_result`, annotated as `None`
    /// when the mainstem lookup misses (spec.md §7: not an error).
    pub async fn mainstem_annotations(&self, comids: &[i64]) -> Result<Vec<MainstemEntry>> {
        let mut out = Vec::with_capacity(comids.len());
        for &comid in comids {
            if let Some(uri) = self.mainstems.by_comid(comid).await? {
                out.push(MainstemEntry {
                    comid,
                    mainstem_uri: uri,
                });
            }
        }
        Ok(out)
    }

    pub async fn basin(&self, nav_result: &NavResult, simplify_tolerance: Option<f64>) -> Result<Basin> {
        self.basins
            .upstream_basin(&nav_result.comids, simplify_tolerance)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NavMode;

    #[test]
    fn pp_requires_stop_comid() {
        assert!(NavParams::new(NavMode::Pp, 10.0, None).is_err());
        assert!(NavParams::new(NavMode::Pp, 10.0, Some(42)).is_ok());
    }

    #[test]
    fn only_dm_and_pp_accept_stop_comid() {
        assert!(NavParams::new(NavMode::Um, 10.0, Some(42)).is_err());
        assert!(NavParams::new(NavMode::Ut, 10.0, Some(42)).is_err());
        assert!(NavParams::new(NavMode::Dd, 10.0, Some(42)).is_err());
        assert!(NavParams::new(NavMode::Dm, 10.0, Some(42)).is_ok());
    }

    #[test]
    fn distance_must_be_strictly_positive_and_bounded() {
        assert!(NavParams::new(NavMode::Um, 0.0, None).is_err());
        assert!(NavParams::new(NavMode::Um, 10_000.0, None).is_err());
        assert!(NavParams::new(NavMode::Um, 9_999.9, None).is_ok());
    }
}
