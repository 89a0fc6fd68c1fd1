//! Display order of archived records: newest first

use crate::core::record::ArchivedRecord;
use std::cmp::Ordering;
use std::sync::Arc;

/// Origin time descending, then id ascending.
///
/// The id tiebreak makes the order total, so repeated sorts of the same set
/// agree regardless of the order the records were collected in.
pub fn compare_for_display(a: &ArchivedRecord, b: &ArchivedRecord) -> Ordering {
    b.origin_time()
        .cmp(&a.origin_time())
        .then_with(|| a.id().cmp(&b.id()))
}

/// Sort records in place into display order
pub fn sort_for_display(records: &mut [Arc<ArchivedRecord>]) {
    records.sort_by(|a, b| compare_for_display(a, b));
}
