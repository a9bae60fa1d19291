//! Metadata Catalog
//!
//! Ordered item records aligned 1:1 with the Vector Store: the record at
//! position `i` describes the vector with ordinal `i`.

use std::collections::BTreeMap;

use xmodal_core::{ItemRecord, Modality, Ordinal, XmodalError, XmodalResult};

/// Bucket for records without an encoder tag
pub const UNKNOWN_ENCODER: &str = "unknown";

/// Per-item records for one collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataCatalog {
    records: Vec<ItemRecord>,
}

impl MetadataCatalog {
    /// Empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog restored from persisted records
    pub fn from_records(records: Vec<ItemRecord>) -> Self {
        MetadataCatalog { records }
    }

    /// Append a record, returning its ordinal
    ///
    /// `added_at` is raised to the previous record's timestamp if the clock
    /// moved backwards.
    pub fn append(&mut self, mut record: ItemRecord) -> Ordinal {
        if let Some(last) = self.records.last() {
            if record.added_at < last.added_at {
                record.added_at = last.added_at;
            }
        }
        let ordinal = Ordinal::new(self.records.len() as u64);
        self.records.push(record);
        ordinal
    }

    /// Record for `ordinal`
    pub fn get(&self, ordinal: Ordinal) -> XmodalResult<&ItemRecord> {
        self.records
            .get(ordinal.as_usize())
            .ok_or(XmodalError::IndexOutOfRange {
                ordinal: ordinal.as_u64(),
                len: self.records.len(),
            })
    }

    /// The `n` most recently added records, newest first
    pub fn recent(&self, n: usize) -> Vec<ItemRecord> {
        let mut newest: Vec<&ItemRecord> = self.records.iter().rev().collect();
        // stable: equal timestamps keep reverse insertion order
        newest.sort_by(|a, b| b.added_at.cmp(&a.added_at));
        newest.into_iter().take(n).cloned().collect()
    }

    /// Item count per modality
    pub fn modality_counts(&self) -> BTreeMap<Modality, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.modality).or_insert(0) += 1;
        }
        counts
    }

    /// Item count per producing encoder
    pub fn encoder_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            let encoder = record.encoder().unwrap_or(UNKNOWN_ENCODER);
            *counts.entry(encoder.to_string()).or_insert(0) += 1;
        }
        counts
    }

    /// All records in ordinal order
    pub fn records(&self) -> &[ItemRecord] {
        &self.records
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Remove every record
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use xmodal_core::{ExtraMetadata, ENCODER_KEY};

    fn record_at(path: &str, modality: Modality, secs: i64) -> ItemRecord {
        let at = Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap();
        ItemRecord::new(path, modality, at, 0, ExtraMetadata::new())
    }

    #[test]
    fn test_append_assigns_ordinals() {
        let mut catalog = MetadataCatalog::new();
        assert_eq!(catalog.append(record_at("a.png", Modality::Image, 0)), Ordinal::new(0));
        assert_eq!(catalog.append(record_at("b.wav", Modality::Audio, 1)), Ordinal::new(1));
        assert_eq!(catalog.get(Ordinal::new(1)).unwrap().filename, "b.wav");
    }

    #[test]
    fn test_get_out_of_range() {
        let catalog = MetadataCatalog::new();
        let err = catalog.get(Ordinal::new(0)).unwrap_err();
        assert!(matches!(err, XmodalError::IndexOutOfRange { ordinal: 0, len: 0 }));
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn test_append_clamps_backwards_clock() {
        let mut catalog = MetadataCatalog::new();
        catalog.append(record_at("a.png", Modality::Image, 10));
        catalog.append(record_at("b.png", Modality::Image, 5));
        let records = catalog.records();
        assert_eq!(records[1].added_at, records[0].added_at);
    }

    #[test]
    fn test_recent_newest_first_with_ties() {
        let mut catalog = MetadataCatalog::new();
        catalog.append(record_at("a.png", Modality::Image, 0));
        catalog.append(record_at("b.png", Modality::Image, 1));
        catalog.append(record_at("c.png", Modality::Image, 1));

        let recent: Vec<String> = catalog.recent(2).into_iter().map(|r| r.filename).collect();
        assert_eq!(recent, vec!["c.png", "b.png"]);
        assert_eq!(catalog.recent(10).len(), 3);
        assert!(catalog.recent(0).is_empty());
    }

    #[test]
    fn test_recent_orders_restored_records_by_time() {
        let base = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let mut late = record_at("late.png", Modality::Image, 0);
        late.added_at = base + Duration::seconds(100);
        let early = record_at("early.png", Modality::Image, 0);

        let catalog = MetadataCatalog::from_records(vec![late, early]);
        assert_eq!(catalog.recent(1)[0].filename, "late.png");
    }

    #[test]
    fn test_counts() {
        let mut catalog = MetadataCatalog::new();
        let mut tagged = record_at("a.png", Modality::Image, 0);
        tagged.extra.insert(ENCODER_KEY.to_string(), "clip".into());
        catalog.append(tagged);
        catalog.append(record_at("b.wav", Modality::Audio, 1));
        catalog.append(record_at("c.wav", Modality::Audio, 2));

        let by_modality = catalog.modality_counts();
        assert_eq!(by_modality[&Modality::Image], 1);
        assert_eq!(by_modality[&Modality::Audio], 2);
        assert!(!by_modality.contains_key(&Modality::Text));

        let by_encoder = catalog.encoder_counts();
        assert_eq!(by_encoder["clip"], 1);
        assert_eq!(by_encoder[UNKNOWN_ENCODER], 2);
    }
}
