use crate::bom_processing::domain::BomRecord;
use crate::shared::error::RebomError;
use crate::shared::Result;
use std::collections::{BTreeMap, HashSet};

/// What an ingestion should do with the catalog for one serial number.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileDecision {
    /// The input is already stored; return this record unchanged.
    Duplicate(BomRecord),
    /// Store a new record at this engine-managed version.
    Insert { bom_version: u32 },
    /// Overwrite this (latest) record and its blobs in place.
    Update(BomRecord),
}

/// VersionReconciler decides insert, update or duplicate for an ingestion.
///
/// `existing` holds every stored version of one `(organization, serialNumber)`.
pub struct VersionReconciler;

impl VersionReconciler {
    pub fn decide(
        existing: &[BomRecord],
        original_file_digest: &str,
        bom_digest: &str,
        declared_version: Option<u32>,
    ) -> Result<ReconcileDecision> {
        Self::check_unique_versions(existing)?;

        let exact: Vec<&BomRecord> = existing
            .iter()
            .filter(|r| r.original_file_digest == original_file_digest)
            .collect();
        match exact.as_slice() {
            [] => {}
            [record] => {
                tracing::info!(
                    bom_uuid = %record.uuid,
                    serial_number = %record.serial_number,
                    "Exact duplicate of stored input, returning existing record"
                );
                return Ok(ReconcileDecision::Duplicate((*record).clone()));
            }
            many => {
                return Err(Self::integrity_error(
                    original_file_digest,
                    many.len(),
                    "originalFileDigest",
                    many[0],
                ))
            }
        }

        let Some(latest) = existing.iter().max_by_key(|r| r.bom_version) else {
            let bom_version = declared_version.filter(|v| *v > 0).unwrap_or(1);
            return Ok(ReconcileDecision::Insert { bom_version });
        };

        let declared_is_newer = declared_version.is_some_and(|v| v > latest.bom_version);

        if latest.bom_digest == bom_digest && !declared_is_newer {
            tracing::info!(
                bom_uuid = %latest.uuid,
                bom_version = latest.bom_version,
                "Content digest unchanged, returning latest record"
            );
            return Ok(ReconcileDecision::Duplicate(latest.clone()));
        }

        if declared_is_newer {
            return Ok(ReconcileDecision::Insert {
                bom_version: latest.bom_version + 1,
            });
        }

        tracing::info!(
            bom_uuid = %latest.uuid,
            bom_version = latest.bom_version,
            declared_version = ?declared_version,
            "Declared version not newer than latest, replacing latest in place"
        );
        Ok(ReconcileDecision::Update(latest.clone()))
    }

    fn check_unique_versions(existing: &[BomRecord]) -> Result<()> {
        let mut seen = HashSet::new();
        for record in existing {
            if !seen.insert(record.bom_version) {
                let count = existing
                    .iter()
                    .filter(|r| r.bom_version == record.bom_version)
                    .count();
                return Err(Self::integrity_error(
                    &format!("{}@{}", record.serial_number, record.bom_version),
                    count,
                    "bomVersion",
                    record,
                ));
            }
        }
        Ok(())
    }

    fn integrity_error(
        identifier: &str,
        count: usize,
        key: &str,
        sample: &BomRecord,
    ) -> anyhow::Error {
        let mut context = BTreeMap::new();
        context.insert("key".to_string(), key.to_string());
        context.insert("serialNumber".to_string(), sample.serial_number.clone());
        context.insert("organization".to_string(), sample.organization.clone());
        tracing::error!(identifier, count, key, "Identity matched more than one record");
        RebomError::DataIntegrity {
            identifier: identifier.to_string(),
            count,
            context,
        }
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bom_processing::domain::BomMeta;

    fn record(version: u32, raw: &str, digest: &str) -> BomRecord {
        let mut record = BomRecord::new("urn:uuid:s", version, "org", BomMeta::default());
        record.original_file_digest = raw.to_string();
        record.bom_digest = digest.to_string();
        record
    }

    #[test]
    fn test_first_ingestion_inserts_at_declared_or_one() {
        assert_eq!(
            VersionReconciler::decide(&[], "r", "d", None).unwrap(),
            ReconcileDecision::Insert { bom_version: 1 }
        );
        assert_eq!(
            VersionReconciler::decide(&[], "r", "d", Some(3)).unwrap(),
            ReconcileDecision::Insert { bom_version: 3 }
        );
        assert_eq!(
            VersionReconciler::decide(&[], "r", "d", Some(0)).unwrap(),
            ReconcileDecision::Insert { bom_version: 1 }
        );
    }

    #[test]
    fn test_identical_raw_input_is_duplicate() {
        let existing = vec![record(1, "r1", "d1"), record(2, "r2", "d2")];
        let decision = VersionReconciler::decide(&existing, "r1", "dx", Some(9)).unwrap();
        assert_eq!(decision, ReconcileDecision::Duplicate(existing[0].clone()));
    }

    #[test]
    fn test_higher_declared_version_inserts_next_version() {
        let existing = vec![record(1, "r1", "d1")];
        assert_eq!(
            VersionReconciler::decide(&existing, "r2", "d2", Some(2)).unwrap(),
            ReconcileDecision::Insert { bom_version: 2 }
        );
        assert_eq!(
            VersionReconciler::decide(&existing, "r2", "d2", Some(7)).unwrap(),
            ReconcileDecision::Insert { bom_version: 2 }
        );
    }

    #[test]
    fn test_same_or_lower_declared_version_updates_latest() {
        let existing = vec![record(1, "r1", "d1"), record(2, "r2", "d2")];
        assert_eq!(
            VersionReconciler::decide(&existing, "r3", "d3", Some(1)).unwrap(),
            ReconcileDecision::Update(existing[1].clone())
        );
        assert_eq!(
            VersionReconciler::decide(&existing, "r3", "d3", None).unwrap(),
            ReconcileDecision::Update(existing[1].clone())
        );
    }

    #[test]
    fn test_unchanged_digest_is_duplicate_of_latest() {
        let existing = vec![record(1, "r1", "d1")];
        assert_eq!(
            VersionReconciler::decide(&existing, "r-cosmetic", "d1", Some(1)).unwrap(),
            ReconcileDecision::Duplicate(existing[0].clone())
        );
    }

    #[test]
    fn test_duplicate_versions_are_surfaced() {
        let existing = vec![record(1, "r1", "d1"), record(1, "r2", "d2")];
        let err = VersionReconciler::decide(&existing, "r3", "d3", None).unwrap_err();
        match err.downcast_ref::<RebomError>() {
            Some(RebomError::DataIntegrity { count, .. }) => assert_eq!(*count, 2),
            other => panic!("expected data integrity error, got {:?}", other),
        }
    }
}
