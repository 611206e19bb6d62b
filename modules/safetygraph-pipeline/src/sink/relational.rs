use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use safetygraph_common::{SafetyGraphError, SourceHazard, UnifiedIncidentRecord};

pub const INCIDENT_TABLE: &str = "hse_incidents_global";

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS hse_incidents_global (
        id                   BIGSERIAL    PRIMARY KEY,
        risk_id              UUID         NOT NULL,
        risk_code            TEXT         NOT NULL,
        incident_id          TEXT,
        source               TEXT         NOT NULL,
        jurisdiction         TEXT         NOT NULL,
        year                 INT,
        industry_code        TEXT,
        industry_code_system TEXT         NOT NULL,
        industry_name        TEXT,
        event_type           TEXT,
        domain_code          TEXT         NOT NULL,
        hazard_code          TEXT         NOT NULL,
        nature_of_injury     TEXT,
        body_part            TEXT,
        incident_count       BIGINT,
        days_lost            BIGINT,
        validation_status    TEXT         NOT NULL,
        record               JSONB        NOT NULL,
        loaded_at            TIMESTAMPTZ  NOT NULL DEFAULT now()
    )
"#;

const INSERT_BATCH: &str = r#"
    INSERT INTO hse_incidents_global (
        risk_id, risk_code, incident_id, source, jurisdiction, year,
        industry_code, industry_code_system, industry_name, event_type,
        domain_code, hazard_code, nature_of_injury, body_part,
        incident_count, days_lost, validation_status, record
    )
    SELECT
        risk_id, risk_code, incident_id, source, jurisdiction, year,
        industry_code, industry_code_system, industry_name, event_type,
        domain_code, hazard_code, nature_of_injury, body_part,
        incident_count, days_lost, validation_status, record::jsonb
    FROM UNNEST(
        $1::uuid[], $2::text[], $3::text[], $4::text[], $5::text[], $6::int[],
        $7::text[], $8::text[], $9::text[], $10::text[],
        $11::text[], $12::text[], $13::text[], $14::text[],
        $15::bigint[], $16::bigint[], $17::text[], $18::text[]
    ) AS t(
        risk_id, risk_code, incident_id, source, jurisdiction, year,
        industry_code, industry_code_system, industry_name, event_type,
        domain_code, hazard_code, nature_of_injury, body_part,
        incident_count, days_lost, validation_status, record
    )
"#;

/// Append-only writer for the wide incident table. One round trip per batch.
pub struct RelationalSink {
    pool: PgPool,
    batch_size: usize,
}

impl RelationalSink {
    pub async fn connect(database_url: &str, batch_size: usize) -> Result<Self, SafetyGraphError> {
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .connect(database_url)
            .await
            .map_err(|e| SafetyGraphError::SinkUnavailable(format!("relational store: {e}")))?;
        Ok(Self::new(pool, batch_size))
    }

    pub fn new(pool: PgPool, batch_size: usize) -> Self {
        Self { pool, batch_size: batch_size.max(1) }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the incident table if missing. Safe to re-run.
    pub async fn ensure_table(&self) -> Result<(), SafetyGraphError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await.map_err(db_err)?;
        Ok(())
    }

    /// Append `records` in batches, returning the number of rows written.
    /// A failing batch stops the write; earlier batches stay committed.
    pub async fn insert(&self, records: &[UnifiedIncidentRecord]) -> Result<u64, SafetyGraphError> {
        let mut written = 0;
        for (i, chunk) in records.chunks(self.batch_size).enumerate() {
            let rows = IncidentRows::from_records(chunk)?;
            let result = sqlx::query(INSERT_BATCH)
                .bind(rows.risk_id)
                .bind(rows.risk_code)
                .bind(rows.incident_id)
                .bind(rows.source)
                .bind(rows.jurisdiction)
                .bind(rows.year)
                .bind(rows.industry_code)
                .bind(rows.industry_code_system)
                .bind(rows.industry_name)
                .bind(rows.event_type)
                .bind(rows.domain_code)
                .bind(rows.hazard_code)
                .bind(rows.nature_of_injury)
                .bind(rows.body_part)
                .bind(rows.incident_count)
                .bind(rows.days_lost)
                .bind(rows.validation_status)
                .bind(rows.record)
                .execute(&self.pool)
                .await
                .map_err(db_err)?;
            written += result.rows_affected();
            info!(batch = i + 1, written, total = records.len(), "Relational batch inserted");
        }
        Ok(written)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn db_err(e: sqlx::Error) -> SafetyGraphError {
    SafetyGraphError::Database(e.to_string())
}

/// Column-major view of one batch, bound as Postgres arrays.
#[derive(Default)]
struct IncidentRows {
    risk_id: Vec<Uuid>,
    risk_code: Vec<String>,
    incident_id: Vec<Option<String>>,
    source: Vec<String>,
    jurisdiction: Vec<String>,
    year: Vec<Option<i32>>,
    industry_code: Vec<Option<String>>,
    industry_code_system: Vec<String>,
    industry_name: Vec<Option<String>>,
    event_type: Vec<Option<String>>,
    domain_code: Vec<String>,
    hazard_code: Vec<String>,
    nature_of_injury: Vec<Option<String>>,
    body_part: Vec<Option<String>>,
    incident_count: Vec<Option<i64>>,
    days_lost: Vec<Option<i64>>,
    validation_status: Vec<String>,
    record: Vec<String>,
}

impl IncidentRows {
    fn from_records(records: &[UnifiedIncidentRecord]) -> Result<Self, SafetyGraphError> {
        let mut rows = Self::default();
        for record in records {
            rows.push(record)?;
        }
        Ok(rows)
    }

    fn push(&mut self, r: &UnifiedIncidentRecord) -> Result<(), SafetyGraphError> {
        let stats = r.incident_statistics.unwrap_or_default();
        let industry = &r.industry_classification;
        let (event_type, nature, body_part) = source_codes(&r.hazard_classification.source);

        self.risk_id.push(r.risk_id);
        self.risk_code.push(r.risk_code.clone());
        self.incident_id.push(r.data_provenance.source_record_id.clone());
        self.source.push(r.source_system().as_str().to_string());
        self.jurisdiction.push(r.jurisdiction.primary_country.clone());
        self.year.push(stats.year);
        self.industry_code.push(industry.source_code().map(str::to_string));
        self.industry_code_system.push(industry.source_taxonomy.as_str().to_string());
        self.industry_name.push(industry_name(r));
        self.event_type.push(event_type);
        self.domain_code.push(r.domain().code().to_string());
        self.hazard_code.push(r.hazard_classification.unified.hazard_code.clone());
        self.nature_of_injury.push(nature);
        self.body_part.push(body_part);
        self.incident_count.push(stats.total_incidents.and_then(|n| i64::try_from(n).ok()));
        self.days_lost.push(stats.total_lost_days.and_then(|n| i64::try_from(n).ok()));
        self.validation_status.push(r.data_provenance.validation_status.as_str().to_string());
        self.record.push(serde_json::to_string(&r.without_source_record())?);
        Ok(())
    }
}

fn source_codes(hazard: &SourceHazard) -> (Option<String>, Option<String>, Option<String>) {
    match hazard {
        SourceHazard::Osha { event_type_code, nature, body_part, .. } => (
            Some(event_type_code.clone()),
            Some(nature.source_code.clone()),
            Some(body_part.source_code.clone()),
        ),
        SourceHazard::Esaw { deviation_code, .. } => (Some(deviation_code.clone()), None, None),
        SourceHazard::Cnesst { genre_accident_code, nature_lesion_code, siege_lesion_code, .. } => (
            Some(genre_accident_code.clone()),
            nature_lesion_code.clone(),
            siege_lesion_code.clone(),
        ),
        SourceHazard::Unclassified => (None, None, None),
    }
}

fn industry_name(r: &UnifiedIncidentRecord) -> Option<String> {
    let industry = &r.industry_classification;
    [&industry.scian, &industry.nace, &industry.isic]
        .into_iter()
        .flatten()
        .find(|code| Some(code.code.as_str()) == industry.source_code())
        .and_then(|code| code.description.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use safetygraph_harmonizer::Harmonizer;
    use serde_json::json;

    #[test]
    fn rows_are_column_aligned() {
        let mut harmonizer = Harmonizer::new();
        let batch = harmonizer.transform_batch(
            &[
                json!({"event_type": "42", "nature": "0111", "body_part": "41", "naics_code": "23821", "id": "A-1"}),
                json!({"genre_accident": "31", "scian": "236", "nb_lesions": 4, "jours_perdus": 60}),
            ],
            None,
        );
        let rows = IncidentRows::from_records(&batch.records).unwrap();

        assert_eq!(rows.risk_id.len(), 2);
        assert_eq!(rows.record.len(), 2);
        assert_eq!(rows.event_type, vec![Some("42".to_string()), Some("31".to_string())]);
        assert_eq!(rows.nature_of_injury[0].as_deref(), Some("0111"));
        assert_eq!(rows.incident_id[0].as_deref(), Some("A-1"));
        assert_eq!(rows.jurisdiction, vec!["US".to_string(), "CA".to_string()]);
        assert_eq!(rows.incident_count[1], Some(4));
        assert_eq!(rows.days_lost[1], Some(60));
        assert_eq!(rows.industry_code[1].as_deref(), Some("236"));
        assert!(!rows.record[0].contains("_source_record"));
    }
}
