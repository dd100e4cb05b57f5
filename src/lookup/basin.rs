use async_trait::async_trait;
use geo_types::Geometry;

use crate::db::DbPool;
use crate::error::{Error, Result};
use crate::lookup::BasinLookup as BasinLookupTrait;
use crate::model::Basin;
use crate::util::geom::parse_geojson_geometry;

pub struct PgBasinLookup {
    pool: DbPool,
}

impl PgBasinLookup {
    pub fn new(pool: DbPool) -> Self {
        PgBasinLookup { pool }
    }
}

#[async_trait]
impl BasinLookupTrait for PgBasinLookup {
    async fn upstream_basin(
        &self,
        comids: &[i64],
        simplify_tolerance: Option<f64>,
    ) -> Result<Basin> {
        if comids.is_empty() {
            return Ok(Basin {
                geometry: geo_types::MultiPolygon(vec![]),
            });
        }

        let comids = comids.to_vec();
        self.pool
            .with_session(move |conn| {
                Box::pin(async move {
                    let row = match simplify_tolerance {
                        Some(tol) => {
                            conn.query_opt(
                                "SELECT ST_AsGeoJSON(ST_SimplifyPreserveTopology( \
                                     ST_Union(geom), $2)) AS geom_json \
                                 FROM catchment WHERE featureid = ANY($1)",
                                &[&comids, &tol],
                            )
                            .await?
                        }
                        None => {
                            conn.query_opt(
                                "SELECT ST_AsGeoJSON(ST_Union(geom)) AS geom_json \
                                 FROM catchment WHERE featureid = ANY($1)",
                                &[&comids],
                            )
                            .await?
                        }
                    };
                    let row = row.ok_or_else(|| {
                        Error::GeometryError {
                            message: "basin union returned no row".to_owned(),
                        }
                    })?;
                    let geom_json: Option<String> = row.get("geom_json");
                    let Some(geom_json) = geom_json else {
                        return Ok(Basin {
                            geometry: geo_types::MultiPolygon(vec![]),
                        });
                    };

                    let geometry = parse_geojson_geometry(&geom_json)?;
                    let multipolygon = match geometry {
                        Geometry::MultiPolygon(mp) => mp,
                        Geometry::Polygon(p) => geo_types::MultiPolygon(vec![p]),
                        _ => {
                            return Err(Error::GeometryError {
                                message: "basin union is not polygonal".to_owned(),
                            })
                        }
                    };
                    Ok(Basin {
                        geometry: multipolygon,
                    })
                })
            })
            .await
    }
}
