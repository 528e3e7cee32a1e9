use crate::core::render::{badge_class, format_date};
use crate::domain::model::RepeatedServiceRecord;
use crate::domain::ports::Storage;
use crate::utils::error::{DashboardError, Result};

pub const CSV_HEADER: [&str; 9] = [
    "contract",
    "category",
    "experts",
    "first_service_id",
    "second_service_id",
    "first_service_date",
    "second_service_date",
    "days_between",
    "status",
];

/// Serializes records (already sorted) into CSV text.
pub fn records_to_csv(records: &[RepeatedServiceRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for record in records {
        writer.write_record([
            record.contract.clone(),
            record.category.clone(),
            record.experts.join(", "),
            record
                .first_service_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            record
                .second_service_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            format_date(record.first_service_date),
            format_date(record.second_service_date),
            record.days_between.to_string(),
            badge_class(record.days_between).to_string(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| DashboardError::IoError(e.into_error()))
}

pub struct CsvExporter<S: Storage> {
    storage: S,
}

impl<S: Storage> CsvExporter<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub async fn export(&self, filename: &str, records: &[RepeatedServiceRecord]) -> Result<usize> {
        let data = records_to_csv(records)?;
        tracing::debug!(
            "Writing {} repeated services ({} bytes) to {}",
            records.len(),
            data.len(),
            filename
        );
        self.storage.write_file(filename, &data).await?;
        Ok(records.len())
    }
}
