use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::info;

use safetygraph_common::{SafetyGraphError, UnifiedIncidentRecord};

/// Flat-file export: one indented JSON array per run, raw payloads stripped.
#[derive(Debug, Clone)]
pub struct JsonExport {
    dir: PathBuf,
}

impl JsonExport {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `harmonized_{source}_{YYYYmmdd_HHMMSS}.json` under the export directory.
    pub fn file_name(source: &str, at: DateTime<Utc>) -> String {
        let source: String = source
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        format!("harmonized_{}_{}.json", source, at.format("%Y%m%d_%H%M%S"))
    }

    /// Write `records` and return the path written.
    pub async fn write(
        &self,
        source: &str,
        records: &[UnifiedIncidentRecord],
    ) -> Result<PathBuf, SafetyGraphError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(Self::file_name(source, Utc::now()));

        let stripped: Vec<UnifiedIncidentRecord> =
            records.iter().map(UnifiedIncidentRecord::without_source_record).collect();
        let body = serde_json::to_vec_pretty(&stripped)?;
        tokio::fs::write(&path, body).await?;

        info!(path = %path.display(), records = records.len(), "Exported harmonized records");
        Ok(path)
    }
}

/// Read an export back into records.
pub async fn read_export(path: &Path) -> Result<Vec<UnifiedIncidentRecord>, SafetyGraphError> {
    let body = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use safetygraph_harmonizer::Harmonizer;
    use serde_json::json;

    #[test]
    fn file_name_embeds_source_and_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 3, 7, 14, 5, 9).unwrap();
        assert_eq!(JsonExport::file_name("osha", at), "harmonized_osha_20240307_140509.json");
        assert_eq!(JsonExport::file_name("my data/v2", at), "harmonized_my_data_v2_20240307_140509.json");
    }

    #[tokio::test]
    async fn export_round_trips_without_raw_payload() {
        let dir = tempfile::tempdir().unwrap();
        let export = JsonExport::new(dir.path().join("out"));

        let mut harmonizer = Harmonizer::new();
        let raw = vec![
            json!({"event_type": "42", "naics_code": "23821", "id": "A-1"}),
            json!({"deviation": "51", "geo": "FR", "nace_r2": "F43"}),
            json!({"genre_accident": "31", "scian": "236", "nb_lesions": 4}),
        ];
        let batch = harmonizer.transform_batch(&raw, None);
        assert_eq!(batch.records.len(), 3);
        assert!(batch.records.iter().all(|r| r.source_record.is_some()));

        let path = export.write("mixed", &batch.records).await.unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(!text.contains("_source_record"));
        assert!(text.contains("\n  "), "export should be indented");

        let back = read_export(&path).await.unwrap();
        let expected: Vec<_> = batch.records.iter().map(|r| r.without_source_record()).collect();
        assert_eq!(back, expected);
    }
}
