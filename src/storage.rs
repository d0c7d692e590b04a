use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;
use tokio::fs;
use tracing::{info, warn};

use crate::error::{PoetError, Result};
use crate::message::Message;

/// Single-slot message drop per agent. A delivery overwrites whatever is
/// still waiting for the recipient; a collect empties the slot.
#[async_trait]
pub trait Mailbox: Send + Sync {
    async fn deliver(&self, message: &Message) -> Result<()>;
    async fn collect(&self, agent: &str) -> Result<Option<Message>>;
    /// Empty the slot. Returns whether anything was waiting.
    async fn clear(&self, agent: &str) -> Result<bool>;
}

/// Mailbox backed by one `message_to_<agent>.json` file per recipient.
#[derive(Debug, Clone)]
pub struct FileMailbox {
    directory: PathBuf,
}

impl FileMailbox {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn slot_path(&self, agent: &str) -> PathBuf {
        self.directory.join(format!("message_to_{agent}.json"))
    }
}

/// Agent names become file names, so they must stay a single path component.
pub fn validate_agent_name(agent: &str) -> Result<()> {
    if agent.trim().is_empty() {
        return Err(PoetError::Config("agent name must not be empty".into()));
    }
    if agent == "." || agent == ".." || agent.contains(['/', '\\', std::path::MAIN_SEPARATOR]) {
        return Err(PoetError::Config(format!(
            "agent name `{agent}` must not contain path separators"
        )));
    }
    Ok(())
}

/// A message that was read stays delivered even if its file could not be removed.
fn consumed(path: &Path, message: Message, removed: std::io::Result<()>) -> Message {
    if let Err(err) = removed {
        warn!(path = %path.display(), error = %err, "failed deleting consumed mailbox file");
    }
    message
}

fn to_pretty_json(message: &Message) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    message.serialize(&mut ser)?;
    Ok(buf)
}

#[async_trait]
impl Mailbox for FileMailbox {
    async fn deliver(&self, message: &Message) -> Result<()> {
        let path = self.slot_path(&message.recipient_id);
        let body = to_pretty_json(message)?;
        fs::write(&path, body).await.map_err(|err| {
            PoetError::Storage(format!("failed writing `{}`: {err}", path.display()))
        })?;
        info!(
            sender = %message.sender_id,
            recipient = %message.recipient_id,
            path = %path.display(),
            "message delivered"
        );
        Ok(())
    }

    async fn collect(&self, agent: &str) -> Result<Option<Message>> {
        let path = self.slot_path(agent);
        let raw = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(PoetError::Storage(format!(
                    "failed reading `{}`: {err}",
                    path.display()
                )))
            }
        };

        let message: Message = match serde_json::from_str(&raw) {
            Ok(message) => message,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "undecodable mailbox file left in place");
                return Ok(None);
            }
        };
        info!(
            agent,
            sender = %message.sender_id,
            path = %path.display(),
            "message received"
        );

        let removed = fs::remove_file(&path).await;
        Ok(Some(consumed(&path, message, removed)))
    }

    async fn clear(&self, agent: &str) -> Result<bool> {
        let path = self.slot_path(agent);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(PoetError::Storage(format!(
                "failed clearing `{}`: {err}",
                path.display()
            ))),
        }
    }
}

/// Same single-slot semantics, kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryMailbox {
    slots: Mutex<HashMap<String, Message>>,
}

impl InMemoryMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self, agent: &str) -> Result<bool> {
        Ok(self.lock()?.contains_key(agent))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Message>>> {
        self.slots
            .lock()
            .map_err(|_| PoetError::Storage("in-memory mailbox poisoned".into()))
    }
}

#[async_trait]
impl Mailbox for InMemoryMailbox {
    async fn deliver(&self, message: &Message) -> Result<()> {
        self.lock()?
            .insert(message.recipient_id.clone(), message.clone());
        Ok(())
    }

    async fn collect(&self, agent: &str) -> Result<Option<Message>> {
        Ok(self.lock()?.remove(agent))
    }

    async fn clear(&self, agent: &str) -> Result<bool> {
        Ok(self.lock()?.remove(agent).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Payload, PromptData};
    use tempfile::TempDir;

    #[tokio::test]
    async fn file_mailbox_round_trip_deletes_slot() {
        let dir = TempDir::new().unwrap();
        let mailbox = FileMailbox::new(dir.path());

        let msg = Message::new("alpha", "beta", "initial_poem", "Dawn is wise.");
        mailbox.deliver(&msg).await.unwrap();
        assert!(mailbox.slot_path("beta").exists());

        let received = mailbox.collect("beta").await.unwrap().unwrap();
        assert_eq!(received, msg);
        assert!(!mailbox.slot_path("beta").exists());
        assert!(mailbox.collect("beta").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn later_delivery_overwrites_waiting_message() {
        let dir = TempDir::new().unwrap();
        let mailbox = FileMailbox::new(dir.path());

        mailbox
            .deliver(&Message::new("alpha", "beta", "initial_poem", "first"))
            .await
            .unwrap();
        mailbox
            .deliver(&Message::new(
                "gamma",
                "beta",
                "prompt",
                PromptData::new("second"),
            ))
            .await
            .unwrap();

        let received = mailbox.collect("beta").await.unwrap().unwrap();
        assert_eq!(received.sender_id, "gamma");
        assert_eq!(received.payload, Payload::Prompt(PromptData::new("second")));
    }

    #[tokio::test]
    async fn slot_file_uses_four_space_indent() {
        let dir = TempDir::new().unwrap();
        let mailbox = FileMailbox::new(dir.path());
        mailbox
            .deliver(&Message::new("alpha", "beta", "initial_poem", "x"))
            .await
            .unwrap();

        let raw = std::fs::read_to_string(mailbox.slot_path("beta")).unwrap();
        assert!(raw.contains("\n    \"sender_id\": \"alpha\""));
    }

    #[tokio::test]
    async fn undecodable_slot_reads_as_empty_and_stays() {
        let dir = TempDir::new().unwrap();
        let mailbox = FileMailbox::new(dir.path());
        std::fs::write(mailbox.slot_path("alpha"), "{not json").unwrap();

        assert!(mailbox.collect("alpha").await.unwrap().is_none());
        assert!(mailbox.slot_path("alpha").exists());
    }

    #[tokio::test]
    async fn clear_reports_whether_slot_existed() {
        let dir = TempDir::new().unwrap();
        let mailbox = FileMailbox::new(dir.path());
        assert!(!mailbox.clear("alpha").await.unwrap());

        mailbox
            .deliver(&Message::new("beta", "alpha", "response_poem", "x"))
            .await
            .unwrap();
        assert!(mailbox.clear("alpha").await.unwrap());
        assert!(!mailbox.slot_path("alpha").exists());
    }

    #[tokio::test]
    async fn in_memory_mailbox_is_single_slot() {
        let mailbox = InMemoryMailbox::new();
        mailbox
            .deliver(&Message::new("alpha", "beta", "a", "one"))
            .await
            .unwrap();
        mailbox
            .deliver(&Message::new("alpha", "beta", "b", "two"))
            .await
            .unwrap();
        assert!(mailbox.pending("beta").unwrap());

        let got = mailbox.collect("beta").await.unwrap().unwrap();
        assert_eq!(got.message_type, "b");
        assert!(!mailbox.pending("beta").unwrap());
    }

    #[test]
    fn poisoned_in_memory_mailbox_is_a_storage_error() {
        let mailbox = std::sync::Arc::new(InMemoryMailbox::new());
        let held = std::sync::Arc::clone(&mailbox);
        let _ = std::thread::spawn(move || {
            let _guard = held.slots.lock().unwrap();
            panic!("poison the slots");
        })
        .join();

        let err = mailbox.pending("beta").unwrap_err();
        assert!(matches!(err, PoetError::Storage(_)));
    }

    #[test]
    fn failed_delete_still_returns_message() {
        let msg = Message::new("alpha", "beta", "initial_poem", "Dawn is wise.");
        let removed = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only directory",
        ));

        let got = consumed(Path::new("message_to_beta.json"), msg.clone(), removed);
        assert_eq!(got, msg);
    }

    #[test]
    fn agent_names_must_be_single_path_components() {
        assert!(validate_agent_name("alpha").is_ok());
        assert!(validate_agent_name("poet..two").is_ok());
        for bad in ["", "  ", ".", "..", "../x", "a/b", "a\\b"] {
            let err = validate_agent_name(bad).unwrap_err();
            assert!(matches!(err, PoetError::Config(_)), "{bad:?}");
        }
    }
}
