//! Aggregator
//!
//! Restores a deterministic order over the pool's completion-ordered
//! records: one record per profile URL, sorted by source page, then name,
//! with empty names last within their page.

use crate::crawler::types::DetailRecord;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Deduplicates by profile URL and sorts into the published order
///
/// When two records share a profile URL the later one in `records` wins.
/// Records without a profile URL (inline cards with no link) are never
/// merged with each other.
pub fn aggregate(records: Vec<DetailRecord>) -> Vec<DetailRecord> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<DetailRecord> = Vec::with_capacity(records.len());

    for record in records {
        if record.profile_url.is_empty() {
            unique.push(record);
            continue;
        }
        match positions.get(&record.profile_url) {
            Some(&index) => unique[index] = record,
            None => {
                positions.insert(record.profile_url.clone(), unique.len());
                unique.push(record);
            }
        }
    }

    unique.sort_by(compare_records);
    unique
}

fn compare_records(a: &DetailRecord, b: &DetailRecord) -> Ordering {
    a.source_page
        .cmp(&b.source_page)
        .then_with(|| match (a.name.is_empty(), b.name.is_empty()) {
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            _ => a.name.cmp(&b.name),
        })
        .then_with(|| a.profile_url.cmp(&b.profile_url))
}
