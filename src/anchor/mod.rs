//! Anchor resolver: turns any supported start identifier into an
//! [`Anchor`] (spec.md §4.4).

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::geoprocessing::GeoprocessingClient;
use crate::lookup::{CatchmentLookup, FeatureLookup, FlowlineLookup};
use crate::model::{Anchor, AnchorSource, CrawlerSource, IngestType};
use crate::util::point::LonLat;

pub struct AnchorResolver {
    features: Arc<dyn FeatureLookup>,
    flowlines: Arc<dyn FlowlineLookup>,
    catchments: Arc<dyn CatchmentLookup>,
    geoprocessing: Arc<GeoprocessingClient>,
}

impl AnchorResolver {
    pub fn new(
        features: Arc<dyn FeatureLookup>,
        flowlines: Arc<dyn FlowlineLookup>,
        catchments: Arc<dyn CatchmentLookup>,
        geoprocessing: Arc<GeoprocessingClient>,
    ) -> Self {
        AnchorResolver {
            features,
            flowlines,
            catchments,
            geoprocessing,
        }
    }

    /// `/linked-data/comid/{comid}`.
    pub async fn by_comid(&self, comid: i64) -> Result<Anchor> {
        // Existence check: the flowline must exist for this to be a valid
        // anchor.
        self.flowlines.by_comid(comid).await?;
        Ok(Anchor::new(comid, None, AnchorSource::Comid))
    }

    /// `/linked-data/{source}/{featureId}`.
    pub async fn by_feature(&self, source: &CrawlerSource, feature_id: &str) -> Result<Anchor> {
        if source.is_comid_source() {
            let comid: i64 = feature_id
                .parse()
                .map_err(|_| Error::invalid_input(format!("'{feature_id}' is not a COMID")))?;
            return self.by_comid(comid).await;
        }

        let feature = self.features.by_identifier(source.source_id, feature_id).await?;
        let measure = match source.ingest_type {
            IngestType::Reach => feature.measure,
            IngestType::Point => None,
        };

        Ok(Anchor::new(
            feature.comid,
            measure,
            AnchorSource::Feature {
                source_id: source.source_id,
                identifier: feature_id.to_owned(),
            },
        ))
    }

    /// `/linked-data/comid/position?coords=POINT(lon lat)`.
    pub async fn by_coordinates(
        &self,
        point: LonLat,
        split_catchment: bool,
    ) -> Result<Anchor> {
        let catchment = self.catchments.containing_point(point.lon, point.lat).await?;
        let mut anchor = Anchor::new(
            catchment.featureid,
            None,
            AnchorSource::Coordinates {
                lon: point.lon,
                lat: point.lat,
            },
        );

        if split_catchment {
            let split = self.geoprocessing.split_catchment(point).await?;
            anchor.comid = split.comid;
            anchor.measure = Some(split.measure);
            anchor.trim_hint = split.trim_geometry;
        }

        Ok(anchor)
    }

    /// `/linked-data/hydrolocation?coords=POINT(lon lat)` — delegates
    /// entirely to the remote geoprocessing client.
    pub async fn hydrolocation(&self, point: LonLat) -> Result<Anchor> {
        let result = self.geoprocessing.hydrolocation(point).await?;
        Ok(Anchor::new(
            result.comid,
            Some(result.measure),
            AnchorSource::Coordinates {
                lon: point.lon,
                lat: point.lat,
            },
        ))
    }
}
