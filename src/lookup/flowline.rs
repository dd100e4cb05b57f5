use async_trait::async_trait;
use geo_types::Geometry;

use crate::db::DbPool;
use crate::error::{Error, Result};
use crate::lookup::FlowlineLookup;
use crate::model::Flowline;
use crate::util::geom::parse_geojson_geometry;

pub struct PgFlowlineLookup {
    pool: DbPool,
}

impl PgFlowlineLookup {
    pub fn new(pool: DbPool) -> Self {
        PgFlowlineLookup { pool }
    }
}

const SELECT_COLUMNS: &str = "comid, ST_AsGeoJSON(geom) AS geom_json, reachcode, fromnode, \
     tonode, hydroseq, pathlength, lengthkm, mainstem_id";

fn row_to_flowline(row: &tokio_postgres::Row) -> Result<Flowline> {
    let geom_json: String = row.get("geom_json");
    let geometry = parse_geojson_geometry(&geom_json)?;
    let Geometry::LineString(geometry) = geometry else {
        return Err(Error::GeometryError {
            message: "flowline geometry is not a LineString".to_owned(),
        });
    };

    Ok(Flowline {
        comid: row.get("comid"),
        geometry,
        reachcode: row.get("reachcode"),
        fromnode: row.get("fromnode"),
        tonode: row.get("tonode"),
        hydroseq: row.get("hydroseq"),
        pathlength: row.get("pathlength"),
        lengthkm: row.get("lengthkm"),
        mainstem_id: row.get("mainstem_id"),
    })
}

#[async_trait]
impl FlowlineLookup for PgFlowlineLookup {
    async fn by_comid(&self, comid: i64) -> Result<Flowline> {
        self.pool
            .with_session(move |conn| {
                Box::pin(async move {
                    let row = conn
                        .query_opt(
                            &format!("SELECT {SELECT_COLUMNS} FROM flowline WHERE comid = $1"),
                            &[&comid],
                        )
                        .await?;
                    match row {
                        Some(row) => row_to_flowline(&row),
                        None => Err(Error::not_found(format!("flowline comid {comid}"))),
                    }
                })
            })
            .await
    }

    async fn by_comids(&self, comids: &[i64]) -> Result<Vec<Flowline>> {
        let comids = comids.to_vec();
        self.pool
            .with_session(move |conn| {
                Box::pin(async move {
                    let rows = conn
                        .query(
                            &format!(
                                "SELECT {SELECT_COLUMNS} FROM flowline WHERE comid = ANY($1)"
                            ),
                            &[&comids],
                        )
                        .await?;
                    rows.iter().map(row_to_flowline).collect()
                })
            })
            .await
    }
}
