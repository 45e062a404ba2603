//! Key naming for records and owner indexes.

/// Prefix of every primary record key.
pub const RECORD_PREFIX: &str = "transcription:";

/// Prefix of every owner index key.
pub const INDEX_PREFIX: &str = "user_transcriptions:";

/// Primary key of the record with the given id.
pub fn record_key(id: &str) -> String {
    format!("{RECORD_PREFIX}{id}")
}

/// Key of the ordered id list owned by `owner_id`.
pub fn index_key(owner_id: &str) -> String {
    format!("{INDEX_PREFIX}{owner_id}")
}

/// Recovers the record id from a primary key.
pub fn id_from_record_key(key: &str) -> Option<&str> {
    key.strip_prefix(RECORD_PREFIX).filter(|id| !id.is_empty())
}

/// Recovers the owner id from an index key.
pub fn owner_from_index_key(key: &str) -> Option<&str> {
    key.strip_prefix(INDEX_PREFIX).filter(|owner| !owner.is_empty())
}
