//! JSONL-backed conversation store.
//!
//! Serves reads from an in-memory history and appends every turn as one
//! JSON object per line, timestamped at write time. Existing lines are
//! replayed on startup so history survives restarts. Write failures are
//! logged and swallowed — persistence trouble never fails a request.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use switchboard_application::ConversationStorePort;
use switchboard_domain::{Turn, TurnRole};

use super::memory::InMemoryConversationStore;

#[derive(Debug, Serialize, Deserialize)]
struct TurnRecord {
    caller_id: String,
    role: TurnRole,
    text: String,
    timestamp: String,
}

/// Conversation store with an append-only JSONL file behind it.
pub struct JsonlConversationStore {
    memory: InMemoryConversationStore,
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlConversationStore {
    /// Open (or create) the history file and replay existing records.
    pub fn open(path: impl AsRef<Path>, max_turns: usize) -> std::io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let memory = InMemoryConversationStore::new(max_turns);
        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            for line in reader.lines() {
                let line = line?;
                match serde_json::from_str::<TurnRecord>(&line) {
                    Ok(record) => {
                        let turn = Turn {
                            role: record.role,
                            text: record.text,
                        };
                        memory.push(&record.caller_id, turn);
                    }
                    Err(e) => warn!(%e, "Skipping malformed history line"),
                }
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            memory,
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ConversationStorePort for JsonlConversationStore {
    async fn context(&self, caller_id: &str) -> Vec<Turn> {
        self.memory.context(caller_id).await
    }

    async fn append(&self, caller_id: &str, turn: Turn) {
        let record = TurnRecord {
            caller_id: caller_id.to_string(),
            role: turn.role,
            text: turn.text.clone(),
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        };

        self.memory.append(caller_id, turn).await;

        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        match serde_json::to_string(&record) {
            Ok(line) => {
                if writeln!(writer, "{line}").and_then(|_| writer.flush()).is_err() {
                    warn!(path = %self.path.display(), "Could not append conversation record");
                }
            }
            Err(e) => warn!(%e, "Could not serialize conversation record"),
        }
    }
}
