//! Domain records shared across the lookup plugins, the navigation engine,
//! and response shaping. These are plain data: no query logic lives here,
//! only the shapes the lookup plugins hand back and the engine passes along.

use geo_types::{Geometry, LineString, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};

/// `source_id` reserved for the synthetic `comid` source, whose "features"
/// are flowlines rather than rows of `nldi_data.feature`.
pub const COMID_SOURCE_ID: i32 = 0;
pub const COMID_SOURCE_SUFFIX: &str = "comid";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestType {
    Point,
    Reach,
}

/// Column-name mapping for one crawler source's row in the shared
/// `nldi_data.feature` table. Column names are bound as prepared-statement
/// parameters against a fixed allow-list, never spliced into SQL text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub identifier_column: String,
    pub name_column: String,
    pub uri_column: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlerSource {
    pub source_id: i32,
    pub suffix: String,
    pub source_name: String,
    pub source_uri: String,
    pub columns: ColumnMapping,
    pub ingest_type: IngestType,
    pub feature_type: String,
}

impl CrawlerSource {
    /// The synthetic built-in source that lets flowlines themselves be
    /// addressed as `/linked-data/comid/{comid}`.
    pub fn comid_source() -> Self {
        CrawlerSource {
            source_id: COMID_SOURCE_ID,
            suffix: COMID_SOURCE_SUFFIX.to_owned(),
            source_name: "NHDPlus Flowlines".to_owned(),
            source_uri: String::new(),
            columns: ColumnMapping {
                identifier_column: "comid".to_owned(),
                name_column: "gnis_name".to_owned(),
                uri_column: String::new(),
            },
            ingest_type: IngestType::Reach,
            feature_type: "flowline".to_owned(),
        }
    }

    pub fn is_comid_source(&self) -> bool {
        self.source_id == COMID_SOURCE_ID
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub source_id: i32,
    pub identifier: String,
    pub name: Option<String>,
    pub uri: Option<String>,
    pub comid: i64,
    pub reachcode: Option<String>,
    pub measure: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct Flowline {
    pub comid: i64,
    pub geometry: LineString<f64>,
    pub reachcode: String,
    pub fromnode: i64,
    pub tonode: i64,
    pub hydroseq: i64,
    pub pathlength: f64,
    pub lengthkm: f64,
    pub mainstem_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct Catchment {
    pub featureid: i64,
    pub geometry: Polygon<f64>,
}

#[derive(Debug, Clone)]
pub struct Basin {
    pub geometry: MultiPolygon<f64>,
}

/// Navigation mode accepted by `nhdplus_navigation.navigate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavMode {
    /// Upstream main.
    Um,
    /// Upstream with tributaries.
    Ut,
    /// Downstream main.
    Dm,
    /// Downstream with diversions.
    Dd,
    /// Point to point.
    Pp,
}

impl NavMode {
    pub fn as_str(self) -> &'static str {
        match self {
            NavMode::Um => "UM",
            NavMode::Ut => "UT",
            NavMode::Dm => "DM",
            NavMode::Dd => "DD",
            NavMode::Pp => "PP",
        }
    }

    pub fn from_str_ci(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "UM" => Some(NavMode::Um),
            "UT" => Some(NavMode::Ut),
            "DM" => Some(NavMode::Dm),
            "DD" => Some(NavMode::Dd),
            "PP" => Some(NavMode::Pp),
            _ => None,
        }
    }

    /// Only `DM` and `PP` accept a `stop_comid` (spec.md §4.5).
    pub fn accepts_stop_comid(self) -> bool {
        matches!(self, NavMode::Dm | NavMode::Pp)
    }

    pub fn all() -> [NavMode; 5] {
        [NavMode::Um, NavMode::Ut, NavMode::Dm, NavMode::Dd, NavMode::Pp]
    }

    /// True for the two upstream modes, used to decide trim direction.
    pub fn is_upstream(self) -> bool {
        matches!(self, NavMode::Um | NavMode::Ut)
    }
}

/// How the anchor for a request was derived; carried through for
/// diagnostics and for deciding whether `splitCatchment` applies.
#[derive(Debug, Clone)]
pub enum AnchorSource {
    Feature { source_id: i32, identifier: String },
    Coordinates { lon: f64, lat: f64 },
    Comid,
}

/// Ephemeral per-request value: a COMID plus an optional fractional measure
/// along the reach, derived from whichever identifier the caller supplied.
#[derive(Debug, Clone)]
pub struct Anchor {
    pub comid: i64,
    pub measure: Option<f64>,
    pub source: AnchorSource,
    pub trim_hint: Option<Geometry<f64>>,
}

impl Anchor {
    pub fn new(comid: i64, measure: Option<f64>, source: AnchorSource) -> Self {
        Anchor {
            comid,
            measure,
            source,
            trim_hint: None,
        }
    }
}

/// Ordered, de-duplicated COMIDs produced by the navigation engine for one
/// `(mode, anchor, distance_km, stop_comid?)` request, plus whether trimming
/// applies at either end.
#[derive(Debug, Clone, Default)]
pub struct NavResult {
    pub comids: Vec<i64>,
    pub trim_start: bool,
    pub trim_end: bool,
}

impl NavResult {
    pub fn is_empty(&self) -> bool {
        self.comids.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct MainstemEntry {
    pub comid: i64,
    pub mainstem_uri: String,
}
