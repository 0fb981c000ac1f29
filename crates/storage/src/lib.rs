use std::future::Future;
use std::str::FromStr;

use anyhow::{Context, Result};
use cresta_core::{QuerySpec, Row, CITY_SUMMARY_SQL, LEASE_SAMPLE_SQL, PROPERTY_SAMPLE_SQL};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row as _, SqlitePool, TypeInfo, ValueRef};
use tracing::debug;

pub trait RowFetcher: Send + Sync {
    fn fetch_rows(&self, query: &QuerySpec) -> impl Future<Output = Result<Vec<Row>>> + Send;
}

pub trait PortfolioRepository: Send + Sync {
    fn list_properties(&self, limit: u32) -> impl Future<Output = Result<Vec<Row>>> + Send;
    fn list_leases(&self, limit: u32) -> impl Future<Output = Result<Vec<Row>>> + Send;
    fn list_cities(&self) -> impl Future<Output = Result<Vec<Row>>> + Send;
    fn property_columns(&self) -> impl Future<Output = Result<Vec<String>>> + Send;
    fn list_tables(&self) -> impl Future<Output = Result<Vec<String>>> + Send;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct PropertyRecord {
    pub property_id: i64,
    pub building_name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub building_class: Option<String>,
    pub property_type: Option<String>,
    pub property_sub_type: Option<String>,
    pub building_size: Option<i64>,
    pub number_of_floors: Option<i64>,
    pub year_built: Option<i64>,
    pub year_renovated: Option<i64>,
    pub current_landlord: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct LeaseRecord {
    pub lease_id: i64,
    pub property_id: i64,
    pub tenant_name: Option<String>,
    // ISO-8601 date, so lexical order is chronological.
    pub execution_date: Option<String>,
    pub leased_sf: Option<i64>,
    pub rent_psf: Option<f64>,
    pub lease_term_months: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortfolioImport {
    #[serde(default)]
    pub properties: Vec<PropertyRecord>,
    #[serde(default)]
    pub leases: Vec<LeaseRecord>,
}

#[derive(Clone)]
pub struct SqliteWarehouse {
    pool: SqlitePool,
}

impl SqliteWarehouse {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid sqlite url {}", database_url))?
            .create_if_missing(true);

        // Every connection to an in-memory URL opens its own database.
        let pool_options = if is_in_memory(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| format!("failed connecting to sqlite at {}", database_url))?;

        let warehouse = Self { pool };
        warehouse.ensure_schema().await?;
        Ok(warehouse)
    }

    pub async fn memory() -> Result<Self> {
        Self::connect("sqlite::memory:", 1).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS PROPERTY (
              PROPERTY_ID INTEGER PRIMARY KEY,
              BUILDING_NAME TEXT NOT NULL,
              ADDRESS TEXT,
              CITY TEXT,
              STATE TEXT,
              BUILDING_CLASS TEXT,
              PROPERTY_TYPE TEXT,
              PROPERTY_SUB_TYPE TEXT,
              BUILDING_SIZE INTEGER,
              NUMBER_OF_FLOORS INTEGER,
              YEAR_BUILT INTEGER,
              YEAR_RENOVATED INTEGER,
              CURRENT_LANDLORD TEXT
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .context("failed creating PROPERTY table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS LEASE (
              LEASE_ID INTEGER PRIMARY KEY,
              PROPERTY_ID INTEGER NOT NULL,
              TENANT_NAME TEXT,
              EXECUTION_DATE TEXT,
              LEASED_SF INTEGER,
              RENT_PSF REAL,
              LEASE_TERM_MONTHS INTEGER
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .context("failed creating LEASE table")?;

        Ok(())
    }

    pub async fn import_properties(&self, records: &[PropertyRecord]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut written = 0_u64;

        for record in records {
            let result = sqlx::query(
                r#"
                INSERT INTO PROPERTY (
                  PROPERTY_ID, BUILDING_NAME, ADDRESS, CITY, STATE, BUILDING_CLASS,
                  PROPERTY_TYPE, PROPERTY_SUB_TYPE, BUILDING_SIZE, NUMBER_OF_FLOORS,
                  YEAR_BUILT, YEAR_RENOVATED, CURRENT_LANDLORD
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                ON CONFLICT(PROPERTY_ID) DO UPDATE SET
                  BUILDING_NAME=excluded.BUILDING_NAME,
                  ADDRESS=excluded.ADDRESS,
                  CITY=excluded.CITY,
                  STATE=excluded.STATE,
                  BUILDING_CLASS=excluded.BUILDING_CLASS,
                  PROPERTY_TYPE=excluded.PROPERTY_TYPE,
                  PROPERTY_SUB_TYPE=excluded.PROPERTY_SUB_TYPE,
                  BUILDING_SIZE=excluded.BUILDING_SIZE,
                  NUMBER_OF_FLOORS=excluded.NUMBER_OF_FLOORS,
                  YEAR_BUILT=excluded.YEAR_BUILT,
                  YEAR_RENOVATED=excluded.YEAR_RENOVATED,
                  CURRENT_LANDLORD=excluded.CURRENT_LANDLORD
                "#,
            )
            .bind(record.property_id)
            .bind(&record.building_name)
            .bind(&record.address)
            .bind(&record.city)
            .bind(&record.state)
            .bind(&record.building_class)
            .bind(&record.property_type)
            .bind(&record.property_sub_type)
            .bind(record.building_size)
            .bind(record.number_of_floors)
            .bind(record.year_built)
            .bind(record.year_renovated)
            .bind(&record.current_landlord)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed importing property {}", record.property_id))?;

            written += result.rows_affected();
        }

        tx.commit().await?;
        Ok(written)
    }

    pub async fn import_leases(&self, records: &[LeaseRecord]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut written = 0_u64;

        for record in records {
            let result = sqlx::query(
                r#"
                INSERT INTO LEASE (
                  LEASE_ID, PROPERTY_ID, TENANT_NAME, EXECUTION_DATE, LEASED_SF,
                  RENT_PSF, LEASE_TERM_MONTHS
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(LEASE_ID) DO UPDATE SET
                  PROPERTY_ID=excluded.PROPERTY_ID,
                  TENANT_NAME=excluded.TENANT_NAME,
                  EXECUTION_DATE=excluded.EXECUTION_DATE,
                  LEASED_SF=excluded.LEASED_SF,
                  RENT_PSF=excluded.RENT_PSF,
                  LEASE_TERM_MONTHS=excluded.LEASE_TERM_MONTHS
                "#,
            )
            .bind(record.lease_id)
            .bind(record.property_id)
            .bind(&record.tenant_name)
            .bind(&record.execution_date)
            .bind(record.leased_sf)
            .bind(record.rent_psf)
            .bind(record.lease_term_months)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed importing lease {}", record.lease_id))?;

            written += result.rows_affected();
        }

        tx.commit().await?;
        Ok(written)
    }

    pub async fn import(&self, bundle: &PortfolioImport) -> Result<(u64, u64)> {
        let properties = self.import_properties(&bundle.properties).await?;
        let leases = self.import_leases(&bundle.leases).await?;
        Ok((properties, leases))
    }

    async fn fetch_with_limit(&self, sql: &str, limit: u32) -> Result<Vec<Row>> {
        let rows = sqlx::query(sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(decode_row).collect()
    }
}

impl RowFetcher for SqliteWarehouse {
    async fn fetch_rows(&self, query: &QuerySpec) -> Result<Vec<Row>> {
        let mut statement = sqlx::query(&query.sql);
        for param in &query.params {
            statement = statement.bind(param.as_str());
        }

        let rows = statement
            .fetch_all(&self.pool)
            .await
            .context("warehouse query failed")?;
        debug!(rows = rows.len(), "warehouse query returned");

        rows.iter().map(decode_row).collect()
    }
}

impl PortfolioRepository for SqliteWarehouse {
    async fn list_properties(&self, limit: u32) -> Result<Vec<Row>> {
        self.fetch_with_limit(PROPERTY_SAMPLE_SQL, limit)
            .await
            .context("failed listing properties")
    }

    async fn list_leases(&self, limit: u32) -> Result<Vec<Row>> {
        self.fetch_with_limit(LEASE_SAMPLE_SQL, limit)
            .await
            .context("failed listing leases")
    }

    async fn list_cities(&self) -> Result<Vec<Row>> {
        let rows = sqlx::query(CITY_SUMMARY_SQL)
            .fetch_all(&self.pool)
            .await
            .context("failed summarising cities")?;
        rows.iter().map(decode_row).collect()
    }

    async fn property_columns(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT name FROM pragma_table_info('PROPERTY') ORDER BY cid")
            .fetch_all(&self.pool)
            .await
            .context("failed reading PROPERTY columns")?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("name").map_err(Into::into))
            .collect()
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed listing tables")?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("name").map_err(Into::into))
            .collect()
    }
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

fn decode_row(row: &SqliteRow) -> Result<Row> {
    let mut decoded = Row::new();
    for column in row.columns() {
        let value = decode_value(row, column.ordinal())
            .with_context(|| format!("failed decoding column {}", column.name()))?;
        decoded.insert(column.name().to_string(), value);
    }
    Ok(decoded)
}

fn decode_value(row: &SqliteRow, index: usize) -> Result<Value> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }

    let type_name = raw.type_info().name().to_ascii_uppercase();
    let value = match type_name.as_str() {
        "INTEGER" | "INT" | "BIGINT" | "BOOLEAN" => Value::from(row.try_get::<i64, _>(index)?),
        "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" => Number::from_f64(row.try_get::<f64, _>(index)?)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        "BLOB" => {
            let bytes = row.try_get::<Vec<u8>, _>(index)?;
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        }
        _ => Value::String(row.try_get::<String, _>(index)?),
    };
    Ok(value)
}
