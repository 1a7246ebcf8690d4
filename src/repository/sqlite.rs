//! SQLite-backed content repository.

use super::ContentRepository;
use crate::error::{NotewiseError, Result};
use crate::models::{ChatTurn, ContentBlock, Tier, TierSummary};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS summaries (
    content_id INTEGER NOT NULL,
    tier TEXT NOT NULL,
    start_seconds INTEGER NOT NULL,
    title TEXT NOT NULL,
    summary TEXT NOT NULL,
    PRIMARY KEY (content_id, tier, start_seconds)
);

CREATE TABLE IF NOT EXISTS quizzes (
    content_id INTEGER NOT NULL,
    start_seconds INTEGER NOT NULL,
    kind TEXT NOT NULL,
    question TEXT NOT NULL,
    answer TEXT NOT NULL,
    explanation TEXT NOT NULL DEFAULT '',
    PRIMARY KEY (content_id, start_seconds, kind)
);

CREATE TABLE IF NOT EXISTS chat_turns (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    content_id INTEGER NOT NULL,
    question TEXT NOT NULL,
    answer TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chat_turns_content_id ON chat_turns(content_id);
"#;

/// SQLite content repository.
pub struct SqliteRepository {
    conn: Mutex<Connection>,
}

impl SqliteRepository {
    /// Open (or create) the database at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite repository at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory repository (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| NotewiseError::Persistence(format!("Failed to acquire database lock: {}", e)))
    }
}

#[async_trait]
impl ContentRepository for SqliteRepository {
    #[instrument(skip(self, summaries), fields(count = summaries.len()))]
    async fn save_tier(&self, content_id: i64, tier: Tier, summaries: &[TierSummary]) -> Result<()> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        for summary in summaries {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO summaries (content_id, tier, start_seconds, title, summary)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    content_id,
                    tier.as_str(),
                    summary.start_seconds,
                    summary.title,
                    summary.summary,
                ],
            )?;
        }

        tx.commit()?;
        debug!("Saved {} {} summaries for content {}", summaries.len(), tier, content_id);
        Ok(())
    }

    #[instrument(skip(self, blocks))]
    async fn save_quizzes(&self, content_id: i64, blocks: &[ContentBlock]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        let mut saved = 0;

        for block in blocks {
            if let Some(item) = &block.true_false {
                tx.execute(
                    r#"
                    INSERT OR REPLACE INTO quizzes
                    (content_id, start_seconds, kind, question, answer, explanation)
                    VALUES (?1, ?2, 'true_false', ?3, ?4, ?5)
                    "#,
                    params![
                        content_id,
                        block.start_seconds,
                        item.statement,
                        if item.answer { "true" } else { "false" },
                        item.explanation,
                    ],
                )?;
                saved += 1;
            }
            if let Some(item) = &block.open {
                tx.execute(
                    r#"
                    INSERT OR REPLACE INTO quizzes
                    (content_id, start_seconds, kind, question, answer, explanation)
                    VALUES (?1, ?2, 'open', ?3, ?4, '')
                    "#,
                    params![content_id, block.start_seconds, item.question, item.model_answer],
                )?;
                saved += 1;
            }
        }

        tx.commit()?;
        Ok(saved)
    }

    async fn summaries(&self, content_id: i64, tier: Tier) -> Result<Vec<TierSummary>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT start_seconds, title, summary FROM summaries
            WHERE content_id = ?1 AND tier = ?2
            ORDER BY start_seconds
            "#,
        )?;

        let rows = stmt.query_map(params![content_id, tier.as_str()], |row| {
            Ok(TierSummary {
                tier,
                start_seconds: row.get(0)?,
                title: row.get(1)?,
                summary: row.get(2)?,
            })
        })?;

        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    async fn append_turn(&self, content_id: i64, turn: &ChatTurn) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO chat_turns (content_id, question, answer, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![content_id, turn.question, turn.answer, turn.created_at.to_rfc3339()],
        )?;
        Ok(())
    }

    async fn recent_turns(&self, content_id: i64, limit: usize) -> Result<Vec<ChatTurn>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT question, answer, created_at FROM chat_turns
            WHERE content_id = ?1
            ORDER BY id DESC
            LIMIT ?2
            "#,
        )?;

        let rows = stmt.query_map(params![content_id, limit as i64], |row| {
            let created_at: String = row.get(2)?;
            Ok(ChatTurn {
                question: row.get(0)?,
                answer: row.get(1)?,
                created_at: DateTime::parse_from_rfc3339(&created_at)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
            })
        })?;

        let mut turns = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        turns.reverse();
        Ok(turns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{partition_by_tier, OpenItem, TrueFalseItem};

    fn block(start: u32) -> ContentBlock {
        ContentBlock {
            title: format!("Part {}", start),
            start_seconds: start,
            source_text: "text".to_string(),
            summary_easy: format!("easy {}", start),
            summary_hard: format!("hard {}", start),
            true_false: Some(TrueFalseItem {
                statement: "Water is wet".to_string(),
                answer: true,
                explanation: String::new(),
            }),
            open: Some(OpenItem {
                question: "Why?".to_string(),
                model_answer: "Because".to_string(),
            }),
        }
    }

    #[tokio::test]
    async fn test_save_and_load_tiers() {
        let repo = SqliteRepository::in_memory().unwrap();
        let blocks = vec![block(600), block(30)];

        for tier in Tier::ALL {
            repo.save_tier(5, tier, &partition_by_tier(&blocks, tier)).await.unwrap();
        }
        // Saving again replaces rather than duplicates
        repo.save_tier(5, Tier::Easy, &partition_by_tier(&blocks, Tier::Easy))
            .await
            .unwrap();

        let easy = repo.summaries(5, Tier::Easy).await.unwrap();
        assert_eq!(easy.len(), 2);
        assert_eq!(easy[0].start_seconds, 30);
        assert_eq!(easy[0].summary, "easy 30");

        let hard = repo.summaries(5, Tier::Hard).await.unwrap();
        assert_eq!(hard[1].summary, "hard 600");
        assert!(repo.summaries(6, Tier::Easy).await.unwrap().is_empty());

        assert_eq!(repo.save_quizzes(5, &blocks).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_recent_turns_oldest_first() {
        let repo = SqliteRepository::in_memory().unwrap();
        for i in 0..4 {
            repo.append_turn(1, &ChatTurn::new(format!("q{}", i), format!("a{}", i)))
                .await
                .unwrap();
        }
        repo.append_turn(2, &ChatTurn::new("other", "other")).await.unwrap();

        let turns = repo.recent_turns(1, 2).await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].question, "q2");
        assert_eq!(turns[1].question, "q3");
    }

    #[tokio::test]
    async fn test_file_backed_repository() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("notewise.db");
        {
            let repo = SqliteRepository::new(&path).unwrap();
            repo.append_turn(9, &ChatTurn::new("q", "a")).await.unwrap();
        }
        let repo = SqliteRepository::new(&path).unwrap();
        assert_eq!(repo.recent_turns(9, 10).await.unwrap().len(), 1);
    }
}
