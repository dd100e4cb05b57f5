//! Response shaping: assembles GeoJSON FeatureCollections augmented with
//! navigation HATEOAS links, and projects Flowline/Feature/Basin domain
//! records into the wire shape described in spec.md §4.6.

use geojson::{Feature as GeoFeature, FeatureCollection, JsonObject, JsonValue};

use crate::error::Result;
use crate::model::{Catchment, CrawlerSource, Feature, Flowline, MainstemEntry};
use crate::util::geom::to_geojson_geometry;

/// Base URL used to build absolute `navigation` links, e.g.
/// `https://labs.example.org/api/nldi`.
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    pub base_url: String,
}

impl LinkBuilder {
    pub fn navigation_url(&self, source_suffix: &str, identifier: &str) -> String {
        format!(
            "{}/linked-data/{}/{}/navigation",
            self.base_url, source_suffix, identifier
        )
    }
}

fn null_or(value: Option<JsonValue>) -> JsonValue {
    value.unwrap_or(JsonValue::Null)
}

/// Builds the `properties` object shared by every feature kind: missing
/// database values become JSON `null`, never the string `"null"`.
#[allow(clippy::too_many_arguments)]
fn build_properties(
    identifier: &str,
    name: Option<&str>,
    source_suffix: &str,
    source_name: &str,
    comid: i64,
    feature_type: &str,
    uri: Option<&str>,
    reachcode: Option<&str>,
    measure: Option<f64>,
    mainstem: Option<&str>,
    navigation_url: &str,
) -> JsonObject {
    let mut props = JsonObject::new();
    props.insert("identifier".into(), JsonValue::from(identifier));
    props.insert("name".into(), null_or(name.map(JsonValue::from)));
    props.insert("source".into(), JsonValue::from(source_suffix));
    props.insert("sourceName".into(), JsonValue::from(source_name));
    props.insert("comid".into(), JsonValue::from(comid.to_string()));
    props.insert("type".into(), JsonValue::from(feature_type));
    props.insert("uri".into(), null_or(uri.map(JsonValue::from)));
    props.insert("reachcode".into(), null_or(reachcode.map(JsonValue::from)));
    props.insert("measure".into(), null_or(measure.map(JsonValue::from)));
    props.insert("mainstem".into(), null_or(mainstem.map(JsonValue::from)));
    props.insert("navigation".into(), JsonValue::from(navigation_url));
    props
}

/// One flowline, usually also carrying `nhdplus_comid` for compatibility
/// with scenario S3 in spec.md §8.
pub fn flowline_feature(
    flowline: &Flowline,
    links: &LinkBuilder,
    exclude_geometry: bool,
) -> Result<GeoFeature> {
    let comid_str = flowline.comid.to_string();
    let mut properties = build_properties(
        &comid_str,
        None,
        "comid",
        "NHDPlus Flowlines",
        flowline.comid,
        "flowline",
        None,
        Some(flowline.reachcode.as_str()),
        None,
        None,
        &links.navigation_url("comid", &comid_str),
    );
    properties.insert("nhdplus_comid".into(), JsonValue::from(comid_str));

    let geometry = if exclude_geometry {
        None
    } else {
        Some(to_geojson_geometry(&geo_types::Geometry::LineString(
            flowline.geometry.clone(),
        ))?)
    };

    Ok(GeoFeature {
        bbox: None,
        geometry,
        id: None,
        properties: Some(properties),
        foreign_members: None,
    })
}

pub fn flowline_collection(
    flowlines: &[Flowline],
    links: &LinkBuilder,
    exclude_geometry: bool,
) -> Result<FeatureCollection> {
    let features = flowlines
        .iter()
        .map(|f| flowline_feature(f, links, exclude_geometry))
        .collect::<Result<Vec<_>>>()?;
    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

/// The catchment containing a `/linked-data/comid/position` query: the
/// feature's geometry is the catchment polygon itself, not a flowline
/// (spec.md §8 scenario S2).
pub fn catchment_feature(catchment: &Catchment, links: &LinkBuilder) -> Result<GeoFeature> {
    let comid_str = catchment.featureid.to_string();
    let properties = build_properties(
        &comid_str,
        None,
        "comid",
        "NHDPlus Flowlines",
        catchment.featureid,
        "catchment",
        None,
        None,
        None,
        None,
        &links.navigation_url("comid", &comid_str),
    );

    let geometry = to_geojson_geometry(&geo_types::Geometry::Polygon(catchment.geometry.clone()))?;
    Ok(GeoFeature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    })
}

/// The resolved point-on-flowline answer for `/linked-data/hydrolocation`.
pub fn hydrolocation_feature(
    comid: i64,
    measure: f64,
    point: geo_types::Point<f64>,
    links: &LinkBuilder,
) -> Result<GeoFeature> {
    let comid_str = comid.to_string();
    let mut properties = build_properties(
        &comid_str,
        None,
        "comid",
        "NHDPlus Flowlines",
        comid,
        "hydrolocation",
        None,
        None,
        Some(measure),
        None,
        &links.navigation_url("comid", &comid_str),
    );
    properties.insert("measure".into(), JsonValue::from(measure));

    let geometry = to_geojson_geometry(&geo_types::Geometry::Point(point))?;
    Ok(GeoFeature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    })
}

/// One crawler-source feature located along a navigation.
pub fn source_feature(
    feature: &Feature,
    source: &CrawlerSource,
    mainstem: Option<&MainstemEntry>,
    links: &LinkBuilder,
) -> GeoFeature {
    let properties = build_properties(
        &feature.identifier,
        feature.name.as_deref(),
        &source.suffix,
        &source.source_name,
        feature.comid,
        &source.feature_type,
        feature.uri.as_deref(),
        feature.reachcode.as_deref(),
        feature.measure,
        mainstem.map(|m| m.mainstem_uri.as_str()),
        &links.navigation_url(&source.suffix, &feature.identifier),
    );

    GeoFeature {
        bbox: None,
        geometry: None,
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

pub fn source_feature_collection(
    features: &[Feature],
    source: &CrawlerSource,
    mainstems: &[MainstemEntry],
    links: &LinkBuilder,
) -> FeatureCollection {
    let features = features
        .iter()
        .map(|f| {
            let mainstem = mainstems.iter().find(|m| m.comid == f.comid);
            source_feature(f, source, mainstem, links)
        })
        .collect();
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

pub fn basin_feature_collection(basin: &crate::model::Basin) -> Result<FeatureCollection> {
    if basin.geometry.0.is_empty() {
        return Ok(FeatureCollection {
            bbox: None,
            features: vec![],
            foreign_members: None,
        });
    }

    let geometry = to_geojson_geometry(&geo_types::Geometry::MultiPolygon(
        basin.geometry.clone(),
    ))?;
    let feature = GeoFeature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: Some(JsonObject::new()),
        foreign_members: None,
    };
    Ok(FeatureCollection {
        bbox: None,
        features: vec![feature],
        foreign_members: None,
    })
}

/// `GET /linked-data` — registered sources plus the synthetic `comid`
/// source, each with a `navigation` link to its source-level listing.
pub fn source_list_json(sources: &[CrawlerSource], links: &LinkBuilder) -> JsonValue {
    let entries: Vec<JsonValue> = sources
        .iter()
        .map(|s| {
            let mut obj = JsonObject::new();
            obj.insert("source".into(), JsonValue::from(s.suffix.as_str()));
            obj.insert("sourceName".into(), JsonValue::from(s.source_name.as_str()));
            obj.insert(
                "features".into(),
                JsonValue::from(format!("{}/linked-data/{}", links.base_url, s.suffix)),
            );
            JsonValue::Object(obj)
        })
        .collect();
    JsonValue::Array(entries)
}

/// Navigation-mode index: `GET
/// /linked-data/{source}/{featureId}/navigation`.
pub fn navigation_index_json(links: &LinkBuilder, source: &str, identifier: &str) -> JsonValue {
    use crate::model::NavMode;
    let entries: Vec<JsonValue> = NavMode::all()
        .iter()
        .map(|mode| {
            let mut obj = JsonObject::new();
            obj.insert(
                "source".into(),
                JsonValue::from(mode.as_str()),
            );
            obj.insert(
                "navigation".into(),
                JsonValue::from(format!(
                    "{}/linked-data/{}/{}/navigation/{}",
                    links.base_url,
                    source,
                    identifier,
                    mode.as_str()
                )),
            );
            JsonValue::Object(obj)
        })
        .collect();
    JsonValue::Array(entries)
}

/// Output-type index: `GET
/// /linked-data/{source}/{featureId}/navigation/{mode}`.
pub fn navigation_outputs_json(
    links: &LinkBuilder,
    source: &str,
    identifier: &str,
    mode: &str,
    data_sources: &[CrawlerSource],
) -> JsonValue {
    let mut entries: Vec<JsonValue> = vec![{
        let mut obj = JsonObject::new();
        obj.insert("source".into(), JsonValue::from("flowlines"));
        obj.insert(
            "features".into(),
            JsonValue::from(format!(
                "{}/linked-data/{}/{}/navigation/{}/flowlines",
                links.base_url, source, identifier, mode
            )),
        );
        JsonValue::Object(obj)
    }];

    entries.extend(data_sources.iter().map(|s| {
        let mut obj = JsonObject::new();
        obj.insert("source".into(), JsonValue::from(s.suffix.as_str()));
        obj.insert(
            "features".into(),
            JsonValue::from(format!(
                "{}/linked-data/{}/{}/navigation/{}/{}",
                links.base_url, source, identifier, mode, s.suffix
            )),
        );
        JsonValue::Object(obj)
    }));

    JsonValue::Array(entries)
}
