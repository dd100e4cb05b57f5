use async_trait::async_trait;
use geo_types::Geometry;

use crate::db::DbPool;
use crate::error::{Error, Result};
use crate::lookup::CatchmentLookup;
use crate::model::Catchment;
use crate::util::geom::parse_geojson_geometry;

pub struct PgCatchmentLookup {
    pool: DbPool,
}

impl PgCatchmentLookup {
    pub fn new(pool: DbPool) -> Self {
        PgCatchmentLookup { pool }
    }
}

fn row_to_catchment(row: &tokio_postgres::Row) -> Result<Catchment> {
    let geom_json: String = row.get("geom_json");
    let geometry = parse_geojson_geometry(&geom_json)?;
    let Geometry::Polygon(geometry) = geometry else {
        return Err(Error::GeometryError {
            message: "catchment geometry is not a Polygon".to_owned(),
        });
    };
    Ok(Catchment {
        featureid: row.get("featureid"),
        geometry,
    })
}

#[async_trait]
impl CatchmentLookup for PgCatchmentLookup {
    async fn containing_point(&self, lon: f64, lat: f64) -> Result<Catchment> {
        self.pool
            .with_session(move |conn| {
                Box::pin(async move {
                    let row = conn
                        .query_opt(
                            "SELECT featureid, ST_AsGeoJSON(geom) AS geom_json FROM catchment \
                             WHERE ST_Contains(geom, ST_SetSRID(ST_MakePoint($1, $2), 4326)) \
                             LIMIT 1",
                            &[&lon, &lat],
                        )
                        .await?;
                    match row {
                        Some(row) => row_to_catchment(&row),
                        None => Err(Error::not_found(format!(
                            "catchment containing ({lon}, {lat})"
                        ))),
                    }
                })
            })
            .await
    }

    async fn by_comid(&self, comid: i64) -> Result<Catchment> {
        self.pool
            .with_session(move |conn| {
                Box::pin(async move {
                    let row = conn
                        .query_opt(
                            "SELECT featureid, ST_AsGeoJSON(geom) AS geom_json FROM catchment \
                             WHERE featureid = $1",
                            &[&comid],
                        )
                        .await?;
                    match row {
                        Some(row) => row_to_catchment(&row),
                        None => Err(Error::not_found(format!("catchment for comid {comid}"))),
                    }
                })
            })
            .await
    }
}
