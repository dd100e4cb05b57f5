use async_trait::async_trait;

use crate::db::DbPool;
use crate::error::Result;
use crate::lookup::MainstemLookup as MainstemLookupTrait;

pub struct PgMainstemLookup {
    pool: DbPool,
}

impl PgMainstemLookup {
    pub fn new(pool: DbPool) -> Self {
        PgMainstemLookup { pool }
    }
}

#[async_trait]
impl MainstemLookupTrait for PgMainstemLookup {
    async fn by_comid(&self, comid: i64) -> Result<Option<String>> {
        self.pool
            .with_session(move |conn| {
                Box::pin(async move {
                    let row = conn
                        .query_opt(
                            "SELECT mainstem_uri FROM mainstem_lookup WHERE comid = $1",
                            &[&comid],
                        )
                        .await?;
                    Ok(row.map(|r| r.get::<_, String>("mainstem_uri")))
                })
            })
            .await
    }
}
