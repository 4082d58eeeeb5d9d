use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use uuid::Uuid;

use super::record::SessionRecord;

/// Key-value store for session records.
///
/// Ids are minted by the store on insert. Implementations decide retention;
/// [`MemorySessionStore`] keeps everything until `remove` or `clear`.
pub trait SessionStore: Send + Sync {
    fn insert(&self, record: SessionRecord) -> Result<String>;
    fn get(&self, id: &str) -> Result<Option<SessionRecord>>;
    fn remove(&self, id: &str) -> Result<Option<SessionRecord>>;
    fn len(&self) -> Result<usize>;
    fn clear(&self) -> Result<()>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    records: Mutex<HashMap<String, SessionRecord>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_records<T>(&self, f: impl FnOnce(&mut HashMap<String, SessionRecord>) -> T) -> Result<T> {
        let mut guard = self
            .records
            .lock()
            .map_err(|_| anyhow!("session store lock poisoned"))?;
        Ok(f(&mut guard))
    }
}

impl SessionStore for MemorySessionStore {
    fn insert(&self, record: SessionRecord) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.with_records(|records| {
            records.insert(id.clone(), record);
        })?;
        tracing::debug!(state_id = %id, "session record stored");
        Ok(id)
    }

    fn get(&self, id: &str) -> Result<Option<SessionRecord>> {
        self.with_records(|records| records.get(id).cloned())
    }

    fn remove(&self, id: &str) -> Result<Option<SessionRecord>> {
        self.with_records(|records| records.remove(id))
    }

    fn len(&self) -> Result<usize> {
        self.with_records(|records| records.len())
    }

    fn clear(&self) -> Result<()> {
        self.with_records(|records| records.clear())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn sample() -> SessionRecord {
        SessionRecord {
            raw_content: "晴天 - 周杰伦\n故事的小黄花".to_string(),
            analysis_text: "post".to_string(),
            song_name: "晴天".to_string(),
            artist: "周杰伦".to_string(),
            prompt_a: "paper texture".to_string(),
            image_a_path: "outputs/晴天_cover_A.png".to_string(),
            analysis_model: "gemini-3-pro-preview".to_string(),
            prompt_model: "gemini-3-flash-preview".to_string(),
            image_model: "nano-banana-2-4k".to_string(),
            error: Some("生成失败: boom".to_string()),
            ..SessionRecord::default()
        }
    }

    #[test]
    fn round_trip_returns_stored_fields() -> anyhow::Result<()> {
        let store = MemorySessionStore::new();
        let record = sample();
        let id = store.insert(record.clone())?;
        assert_eq!(store.get(&id)?, Some(record));
        Ok(())
    }

    #[test]
    fn unknown_id_is_none() -> anyhow::Result<()> {
        let store = MemorySessionStore::new();
        store.insert(sample())?;
        assert_eq!(store.get("missing")?, None);
        Ok(())
    }

    #[test]
    fn every_insert_gets_a_fresh_id() -> anyhow::Result<()> {
        let store = MemorySessionStore::new();
        let mut ids = HashSet::new();
        for _ in 0..16 {
            ids.insert(store.insert(sample())?);
        }
        assert_eq!(ids.len(), 16);
        assert_eq!(store.len()?, 16);
        Ok(())
    }

    #[test]
    fn remove_and_clear_end_lifecycle() -> anyhow::Result<()> {
        let store = MemorySessionStore::new();
        let first = store.insert(sample())?;
        let second = store.insert(SessionRecord::default())?;

        assert!(store.remove(&first)?.is_some());
        assert_eq!(store.get(&first)?, None);
        assert!(store.remove(&first)?.is_none());
        assert_eq!(store.len()?, 1);

        store.clear()?;
        assert_eq!(store.get(&second)?, None);
        assert!(store.is_empty()?);
        Ok(())
    }

    #[test]
    fn stored_copy_is_isolated_from_caller() -> anyhow::Result<()> {
        let store = MemorySessionStore::new();
        let mut record = sample();
        let id = store.insert(record.clone())?;
        record.song_name = "changed".to_string();
        let fetched = store.get(&id)?.unwrap_or_default();
        assert_eq!(fetched.song_name, "晴天");
        Ok(())
    }
}
