use std::time::Duration;

use async_trait::async_trait;
use sea_query::{ColumnDef, Expr as SeaExpr, Iden, OnConflict, PostgresQueryBuilder, Query as SeaQuery, Table};
use sea_query_binder::SqlxBinder;
use sqlx::{PgPool, Row, postgres::PgPoolOptions};
use tracing::trace;

use crate::{
    Result,
    store::{KvStore, map_db_err},
    utils,
};

#[derive(Iden)]
#[iden = "pubflow_kv"]
enum KvIden {
    Table,

    Key,
    Value,
    UpdateTime,
}

/// Key/value documents in a single postgres table, upserted on save.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connects and creates the backing table when missing.
    pub async fn connect(db_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new().acquire_timeout(Duration::from_secs(5)).max_connections(8).connect(db_url).await.map_err(map_db_err)?;
        let store = Self {
            pool,
        };
        store.init().await?;
        Ok(store)
    }

    async fn init(&self) -> Result<()> {
        let sql = Table::create()
            .table(KvIden::Table)
            .if_not_exists()
            .col(ColumnDef::new(KvIden::Key).string().not_null().primary_key())
            .col(ColumnDef::new(KvIden::Value).text().not_null())
            .col(ColumnDef::new(KvIden::UpdateTime).big_integer().not_null())
            .build(PostgresQueryBuilder);
        sqlx::query(&sql).execute(&self.pool).await.map_err(map_db_err)?;
        Ok(())
    }
}

#[async_trait]
impl KvStore for PostgresStore {
    async fn load(
        &self,
        key: &str,
    ) -> Result<Option<String>> {
        trace!("postgres_store::load({})", key);
        let (sql, values) = SeaQuery::select()
            .column(KvIden::Value)
            .from(KvIden::Table)
            .and_where(SeaExpr::col(KvIden::Key).eq(key))
            .build_sqlx(PostgresQueryBuilder);
        let row = sqlx::query_with(&sql, values).fetch_optional(&self.pool).await.map_err(map_db_err)?;
        match row {
            Some(row) => Ok(Some(row.try_get::<String, usize>(0).map_err(map_db_err)?)),
            None => Ok(None),
        }
    }

    async fn save(
        &self,
        key: &str,
        value: &str,
    ) -> Result<()> {
        trace!("postgres_store::save({})", key);
        let mut query = SeaQuery::insert();
        query.into_table(KvIden::Table).columns([KvIden::Key, KvIden::Value, KvIden::UpdateTime]);
        query.values([key.into(), value.into(), utils::time::time_millis().into()]).map_err(map_db_err)?;
        query.on_conflict(OnConflict::column(KvIden::Key).update_columns([KvIden::Value, KvIden::UpdateTime]).to_owned());
        let (sql, values) = query.build_sqlx(PostgresQueryBuilder);
        sqlx::query_with(&sql, values).execute(&self.pool).await.map_err(map_db_err)?;
        Ok(())
    }
}
