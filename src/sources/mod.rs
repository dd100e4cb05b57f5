//! Source registry: the set of known crawler sources as a first-class,
//! cached value (spec.md §4.2). Constructed once per process and consulted
//! on every request; mutated only through [`SourceRegistry::align`], which
//! swaps the whole map atomically so concurrent readers never see a partial
//! mix of old and new state (spec.md §5).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::config::SourceDeclaration;
use crate::db::DbPool;
use crate::error::{Error, Result};
use crate::model::{ColumnMapping, CrawlerSource, IngestType};

/// The `crawler_source` table, as a capability rather than a direct pool
/// dependency — lets [`SourceRegistry`] be populated from an in-memory fake
/// in tests (see [`crate::testing`]).
#[async_trait]
pub trait SourceTable: Send + Sync {
    async fn fetch(&self) -> Result<Vec<CrawlerSource>>;

    async fn upsert(&self, declared: &[SourceDeclaration]) -> Result<()>;
}

pub struct PgSourceTable {
    pool: DbPool,
}

impl PgSourceTable {
    pub fn new(pool: DbPool) -> Self {
        PgSourceTable { pool }
    }
}

#[async_trait]
impl SourceTable for PgSourceTable {
    async fn fetch(&self) -> Result<Vec<CrawlerSource>> {
        fetch_sources(&self.pool).await
    }

    async fn upsert(&self, declared: &[SourceDeclaration]) -> Result<()> {
        let declared = declared.to_vec();
        self.pool
            .with_session(|mut conn| {
                Box::pin(async move {
                    let tx = conn.transaction().await?;

                    for decl in &declared {
                        let ingest_type = decl.ingest_type.as_str();
                        tx.execute(
                            "INSERT INTO crawler_source \
                             (suffix, source_name, source_uri, \
                              identifier_column, name_column, uri_column, \
                              ingest_type, feature_type) \
                             VALUES (lower($1), $2, $3, $4, $5, $6, $7, $8) \
                             ON CONFLICT (suffix) DO UPDATE SET \
                               source_name = EXCLUDED.source_name, \
                               source_uri = EXCLUDED.source_uri, \
                               identifier_column = EXCLUDED.identifier_column, \
                               name_column = EXCLUDED.name_column, \
                               uri_column = EXCLUDED.uri_column, \
                               ingest_type = EXCLUDED.ingest_type, \
                               feature_type = EXCLUDED.feature_type",
                            &[
                                &decl.suffix,
                                &decl.source_name,
                                &decl.source_uri,
                                &decl.feature_id_column,
                                &decl.feature_name_column,
                                &decl.feature_uri_column,
                                &ingest_type,
                                &decl.feature_type,
                            ],
                        )
                        .await?;
                    }

                    tx.commit().await?;
                    Ok(())
                })
            })
            .await
    }
}

struct Inner {
    by_suffix: HashMap<String, CrawlerSource>,
    by_id: HashMap<i32, CrawlerSource>,
}

impl Inner {
    fn build(sources: Vec<CrawlerSource>) -> Self {
        let mut by_suffix = HashMap::with_capacity(sources.len() + 1);
        let mut by_id = HashMap::with_capacity(sources.len() + 1);

        let comid = CrawlerSource::comid_source();
        by_suffix.insert(comid.suffix.to_ascii_lowercase(), comid.clone());
        by_id.insert(comid.source_id, comid);

        for source in sources {
            by_suffix.insert(source.suffix.to_ascii_lowercase(), source.clone());
            by_id.insert(source.source_id, source);
        }

        Inner { by_suffix, by_id }
    }
}

pub struct SourceRegistry {
    table: Arc<dyn SourceTable>,
    inner: RwLock<Arc<Inner>>,
}

impl SourceRegistry {
    /// Reads the `crawler_source` table and builds the in-memory map. Called
    /// once at process startup.
    pub async fn load(pool: DbPool) -> Result<Self> {
        Self::load_from(Arc::new(PgSourceTable::new(pool))).await
    }

    /// Builds the registry from any [`SourceTable`] implementation; used
    /// directly by [`Self::load`] and by tests that substitute an in-memory
    /// fake.
    pub async fn load_from(table: Arc<dyn SourceTable>) -> Result<Self> {
        let sources = table.fetch().await?;
        Ok(SourceRegistry {
            table,
            inner: RwLock::new(Arc::new(Inner::build(sources))),
        })
    }

    /// Case-insensitive suffix lookup. The synthetic `comid` source always
    /// resolves without touching the database.
    pub async fn get(&self, suffix: &str) -> Result<CrawlerSource> {
        let inner = self.inner.read().await;
        inner
            .by_suffix
            .get(&suffix.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| Error::not_found(format!("source '{suffix}'")))
    }

    pub async fn get_by_id(&self, source_id: i32) -> Result<CrawlerSource> {
        let inner = self.inner.read().await;
        inner
            .by_id
            .get(&source_id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("source id {source_id}")))
    }

    /// Ordered by `source_id`, stable across calls (spec.md §4.2).
    pub async fn list(&self) -> Vec<CrawlerSource> {
        let inner = self.inner.read().await;
        let mut sources: Vec<_> = inner.by_id.values().cloned().collect();
        sources.sort_by_key(|s| s.source_id);
        sources
    }

    /// Reconciles the in-database `crawler_source` table with a declarative
    /// YAML list: inserts missing rows, updates changed ones, never
    /// deletes. Idempotent — running it twice with the same input leaves
    /// the table (and the cache rebuilt from it) unchanged on the second
    /// run.
    pub async fn align(&self, declared: &[SourceDeclaration]) -> Result<()> {
        self.table.upsert(declared).await?;

        let fresh = self.table.fetch().await?;
        let mut guard = self.inner.write().await;
        *guard = Arc::new(Inner::build(fresh));
        Ok(())
    }
}

async fn fetch_sources(pool: &DbPool) -> Result<Vec<CrawlerSource>> {
    pool.with_session(|conn| {
        Box::pin(async move {
            let rows = conn
                .query(
                    "SELECT source_id, suffix, source_name, source_uri, \
                            identifier_column, name_column, uri_column, \
                            ingest_type, feature_type \
                     FROM crawler_source ORDER BY source_id",
                    &[],
                )
                .await?;

            let mut sources = Vec::with_capacity(rows.len());
            for row in rows {
                let ingest_type: String = row.get("ingest_type");
                sources.push(CrawlerSource {
                    source_id: row.get("source_id"),
                    suffix: row.get("suffix"),
                    source_name: row.get("source_name"),
                    source_uri: row.get("source_uri"),
                    columns: ColumnMapping {
                        identifier_column: row.get("identifier_column"),
                        name_column: row.get("name_column"),
                        uri_column: row.get("uri_column"),
                    },
                    ingest_type: if ingest_type.eq_ignore_ascii_case("point") {
                        IngestType::Point
                    } else {
                        IngestType::Reach
                    },
                    feature_type: row.get("feature_type"),
                });
            }
            Ok(sources)
        })
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comid_source_always_present() {
        let inner = Inner::build(vec![]);
        assert!(inner.by_suffix.contains_key("comid"));
        assert!(inner.by_id.contains_key(&0));
    }

    #[test]
    fn suffix_lookup_is_case_insensitive() {
        let inner = Inner::build(vec![CrawlerSource {
            source_id: 7,
            suffix: "WQP".to_owned(),
            source_name: "Water Quality Portal".to_owned(),
            source_uri: String::new(),
            columns: ColumnMapping {
                identifier_column: "monitoring_location_identifier".to_owned(),
                name_column: "monitoring_location_name".to_owned(),
                uri_column: "uri".to_owned(),
            },
            ingest_type: IngestType::Point,
            feature_type: "monitoring location".to_owned(),
        }]);
        assert!(inner.by_suffix.contains_key("wqp"));
    }
}
