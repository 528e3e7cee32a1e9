use crate::domain::model::{ContractGroup, RepeatedServiceRecord};
use std::collections::HashMap;

/// Buckets already-sorted records by contract, in order of first appearance.
///
/// Records without a contract all land in the group keyed by `""`.
pub fn group_by_contract(sorted: &[RepeatedServiceRecord]) -> Vec<ContractGroup> {
    let mut groups: Vec<ContractGroup> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in sorted {
        match index.get(record.contract.as_str()) {
            Some(&position) => groups[position].items.push(record.clone()),
            None => {
                index.insert(record.contract.as_str(), groups.len());
                groups.push(ContractGroup {
                    contract: record.contract.clone(),
                    items: vec![record.clone()],
                });
            }
        }
    }

    tracing::debug!(
        "Grouped {} records into {} contract groups",
        sorted.len(),
        groups.len()
    );
    groups
}
