use async_trait::async_trait;

use crate::db::DbPool;
use crate::error::{Error, Result};
use crate::lookup::FeatureLookup;
use crate::model::Feature;

pub struct PgFeatureLookup {
    pool: DbPool,
}

impl PgFeatureLookup {
    pub fn new(pool: DbPool) -> Self {
        PgFeatureLookup { pool }
    }
}

fn row_to_feature(row: &tokio_postgres::Row) -> Feature {
    Feature {
        source_id: row.get("source_id"),
        identifier: row.get("identifier"),
        name: row.get("name"),
        uri: row.get("uri"),
        comid: row.get("comid"),
        reachcode: row.get("reachcode"),
        measure: row.get("measure"),
    }
}

#[async_trait]
impl FeatureLookup for PgFeatureLookup {
    async fn by_identifier(&self, source_id: i32, identifier: &str) -> Result<Feature> {
        let identifier = identifier.to_owned();
        self.pool
            .with_session(move |conn| {
                Box::pin(async move {
                    let row = conn
                        .query_opt(
                            "SELECT source_id, identifier, name, uri, comid, reachcode, measure \
                             FROM feature WHERE source_id = $1 AND identifier = $2",
                            &[&source_id, &identifier],
                        )
                        .await?;
                    row.map(|r| row_to_feature(&r)).ok_or_else(|| {
                        Error::not_found(format!("feature '{identifier}' in source {source_id}"))
                    })
                })
            })
            .await
    }

    async fn list_paged(&self, source_id: i32, limit: i64, offset: i64) -> Result<Vec<Feature>> {
        self.pool
            .with_session(move |conn| {
                Box::pin(async move {
                    let rows = conn
                        .query(
                            "SELECT source_id, identifier, name, uri, comid, reachcode, measure \
                             FROM feature WHERE source_id = $1 \
                             ORDER BY identifier ASC LIMIT $2 OFFSET $3",
                            &[&source_id, &limit, &offset],
                        )
                        .await?;
                    Ok(rows.iter().map(row_to_feature).collect())
                })
            })
            .await
    }

    async fn by_source_and_comids(&self, source_id: i32, comids: &[i64]) -> Result<Vec<Feature>> {
        let comids = comids.to_vec();
        self.pool
            .with_session(move |conn| {
                Box::pin(async move {
                    let rows = conn
                        .query(
                            "SELECT source_id, identifier, name, uri, comid, reachcode, measure \
                             FROM feature WHERE source_id = $1 AND comid = ANY($2) \
                             ORDER BY identifier ASC",
                            &[&source_id, &comids],
                        )
                        .await?;
                    Ok(rows.iter().map(row_to_feature).collect())
                })
            })
            .await
    }

    async fn nearest(&self, source_id: i32, lon: f64, lat: f64) -> Result<Feature> {
        self.pool
            .with_session(move |conn| {
                Box::pin(async move {
                    let row = conn
                        .query_opt(
                            "SELECT f.source_id, f.identifier, f.name, f.uri, f.comid, \
                             f.reachcode, f.measure \
                             FROM feature f JOIN flowline fl ON fl.comid = f.comid \
                             WHERE f.source_id = $1 \
                             ORDER BY fl.geom <-> ST_SetSRID(ST_MakePoint($2, $3), 4326) \
                             LIMIT 1",
                            &[&source_id, &lon, &lat],
                        )
                        .await?;
                    row.map(|r| row_to_feature(&r)).ok_or_else(|| {
                        Error::not_found(format!(
                            "feature of source {source_id} near ({lon}, {lat})"
                        ))
                    })
                })
            })
            .await
    }
}
