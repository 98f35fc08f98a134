//! Raw judge output keyed by everything that influences it.

use super::Store;
use rusqlite::{params, OptionalExtension};

pub struct JudgeCache {
    store: Store,
}

impl JudgeCache {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn key(provider: &str, model: &str, temperature: f32, max_tokens: u32, prompt: &str) -> String {
        let raw = format!(
            "{}:{}:{}:{}:{}",
            provider, model, temperature, max_tokens, prompt
        );
        format!("{:x}", md5::compute(raw))
    }

    pub fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let conn = self.store.lock()?;
        let raw = conn
            .query_row(
                "SELECT raw_text FROM judge_cache WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(raw)
    }

    pub fn put(&self, key: &str, provider: &str, model: &str, raw_text: &str) -> anyhow::Result<()> {
        let conn = self.store.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO judge_cache(key, provider, model, created_at, raw_text) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                key,
                provider,
                model,
                chrono::Utc::now().to_rfc3339(),
                raw_text
            ],
        )?;
        Ok(())
    }
}
