//! Postgres implementation of the DnsRecordRepository trait

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{query, query_as, FromRow};
use uuid::Uuid;

use crate::{
    domain::dns::{
        errors::DnsRecordError, DnsRecord, DnsRecordRepository, DnsRecordSpec, VerificationStatus,
    },
    infrastructure::db::postgres::PostgresDatabase,
};

#[derive(FromRow)]
struct DnsRecordRow {
    id: Uuid,
    domain: String,
    name: String,
    kind: String,
    value: String,
    created_at: DateTime<Utc>,
    verified: bool,
    last_verified_at: Option<DateTime<Utc>>,
}

impl TryFrom<DnsRecordRow> for DnsRecord {
    type Error = DnsRecordError;

    fn try_from(row: DnsRecordRow) -> Result<Self, Self::Error> {
        Ok(DnsRecord {
            id: row.id,
            kind: row
                .kind
                .parse()
                .map_err(|_| DnsRecordError::CorruptRecord(row.id))?,
            domain: row.domain,
            name: row.name,
            value: row.value,
            created_at: row.created_at,
            status: VerificationStatus {
                verified: row.verified,
                last_verified_at: row.last_verified_at,
            },
        })
    }
}

fn unknown(err: sqlx::Error) -> DnsRecordError {
    DnsRecordError::UnknownError(anyhow!("Unknown database error: {:?}", err))
}

#[async_trait]
impl DnsRecordRepository for PostgresDatabase {
    #[mutants::skip]
    async fn create_record(&self, spec: &DnsRecordSpec) -> Result<DnsRecord, DnsRecordError> {
        query_as::<_, DnsRecordRow>(
            r#"
            INSERT INTO dns_records (id, domain, name, kind, value)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, domain, name, kind, value, created_at, verified, last_verified_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(spec.domain())
        .bind(spec.name())
        .bind(spec.kind().as_str())
        .bind(spec.value())
        .fetch_one(&self.pool)
        .await
        .map_err(unknown)?
        .try_into()
    }

    #[mutants::skip]
    async fn records_for_domain(&self, domain: &str) -> Result<Vec<DnsRecord>, DnsRecordError> {
        query_as::<_, DnsRecordRow>(
            r#"
            SELECT id, domain, name, kind, value, created_at, verified, last_verified_at
            FROM dns_records
            WHERE domain = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(domain)
        .fetch_all(&self.pool)
        .await
        .map_err(unknown)?
        .into_iter()
        .map(DnsRecord::try_from)
        .collect()
    }

    #[mutants::skip]
    async fn mark_verified(
        &self,
        domain: &str,
        verified_at: DateTime<Utc>,
    ) -> Result<u64, DnsRecordError> {
        let result = query(
            r#"
            UPDATE dns_records
            SET verified = TRUE,
                last_verified_at = $2
            WHERE domain = $1
            "#,
        )
        .bind(domain)
        .bind(verified_at)
        .execute(&self.pool)
        .await
        .map_err(unknown)?;

        Ok(result.rows_affected())
    }
}
