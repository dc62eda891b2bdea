use crate::store::FileRecord;

use super::facts::FileFacts;

/// What a pass must do with one observed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// No record exists for the path.
    Insert,
    /// Size and mtime match a hashed record; only liveness is refreshed.
    Touch,
    /// Size or mtime differ, or the record was never hashed.
    Update,
}

/// Classify a file against its existing record, if any.
///
/// Unchanged size and mtime are trusted without reading the content.
pub fn classify(existing: Option<&FileRecord>, facts: &FileFacts) -> Change {
    match existing {
        None => Change::Insert,
        Some(record)
            if record.size_bytes == facts.size_bytes
                && record.mtime == facts.mtime
                && !record.content_hash.is_empty() =>
        {
            Change::Touch
        }
        Some(_) => Change::Update,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(size_bytes: u64, mtime: i64) -> FileFacts {
        FileFacts {
            path: "/data/a.txt".into(),
            extension: "txt".into(),
            size_bytes,
            mtime,
        }
    }

    fn record(size_bytes: u64, mtime: i64, deleted_at: Option<i64>) -> FileRecord {
        FileRecord {
            path: "/data/a.txt".into(),
            extension: "txt".into(),
            size_bytes,
            mtime,
            content_hash: "abc".into(),
            first_seen: 1,
            last_seen: 1,
            deleted_at,
            seen_epoch: 1,
        }
    }

    #[test]
    fn new_paths_are_inserted() {
        assert_eq!(classify(None, &facts(3, 10)), Change::Insert);
    }

    #[test]
    fn matching_size_and_mtime_is_a_touch() {
        assert_eq!(classify(Some(&record(3, 10, None)), &facts(3, 10)), Change::Touch);
        assert_eq!(
            classify(Some(&record(3, 10, Some(50))), &facts(3, 10)),
            Change::Touch
        );
    }

    #[test]
    fn any_difference_is_an_update() {
        let existing = record(3, 10, None);
        assert_eq!(classify(Some(&existing), &facts(4, 10)), Change::Update);
        assert_eq!(classify(Some(&existing), &facts(3, 11)), Change::Update);
    }

    #[test]
    fn unhashed_record_is_an_update() {
        let mut existing = record(3, 10, None);
        existing.content_hash.clear();
        assert_eq!(classify(Some(&existing), &facts(3, 10)), Change::Update);
    }
}
