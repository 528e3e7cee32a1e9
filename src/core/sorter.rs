use crate::domain::model::RepeatedServiceRecord;
use chrono::NaiveDate;
use std::cmp::Ordering;

/// Most recent repeat first, then contract and category (case-insensitive).
///
/// Returns a new vector; records that tie on all three keys keep their input order.
pub fn sort_records(records: &[RepeatedServiceRecord]) -> Vec<RepeatedServiceRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(compare_records);
    sorted
}

pub fn recency_key(record: &RepeatedServiceRecord) -> NaiveDate {
    record
        .second_service_date
        .or(record.first_service_date)
        // 沒有任何日期時退回 1970-01-01
        .unwrap_or_default()
}

pub fn compare_records(a: &RepeatedServiceRecord, b: &RepeatedServiceRecord) -> Ordering {
    recency_key(b)
        .cmp(&recency_key(a))
        .then_with(|| compare_ignore_case(&a.contract, &b.contract))
        .then_with(|| compare_ignore_case(&a.category, &b.category))
}

fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}
