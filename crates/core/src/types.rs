/// All entity identifiers are 64-bit integers.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Reference to an uploaded file. `path` is relative to the upload root.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
    pub path: String,
    pub original_name: String,
    pub size_bytes: u64,
    pub sha256: String,
}

/// Monotonic identifier source used by the store when a transition creates
/// child rows (jury members, deliverables).
#[derive(Debug, Clone)]
pub struct IdSequence {
    next: DbId,
}

impl IdSequence {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Continue a sequence whose next free identifier is `next`.
    pub fn starting_at(next: DbId) -> Self {
        Self { next: next.max(1) }
    }

    /// Hand out the next identifier.
    pub fn next_id(&mut self) -> DbId {
        let id = self.next;
        self.next += 1;
        id
    }
}

impl Default for IdSequence {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_starts_at_one_and_increments() {
        let mut seq = IdSequence::new();
        assert_eq!(seq.next_id(), 1);
        assert_eq!(seq.next_id(), 2);
        assert_eq!(seq.next_id(), 3);
    }

    #[test]
    fn sequence_resumes_after_stored_rows() {
        let mut seq = IdSequence::starting_at(8);
        assert_eq!(seq.next_id(), 8);
        assert_eq!(IdSequence::starting_at(0).next_id(), 1);
    }
}
