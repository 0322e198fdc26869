//! Background writer for persisted presence flags.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use chathub_core::types::id::UserId;
use chathub_database::store::MessageStore;

/// One `isOnline` / `lastSeen` write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceUpdate {
    /// User whose flags change.
    pub user_id: UserId,
    /// New `isOnline` value.
    pub online: bool,
    /// New `lastSeen` value.
    pub at: DateTime<Utc>,
}

#[derive(Debug)]
enum Command {
    Write(PresenceUpdate),
    Flush(oneshot::Sender<()>),
}

/// Applies presence flag writes in enqueue order on a dedicated task.
///
/// Enqueueing never waits; a full queue drops the write with a warning.
/// Store failures are logged and never reach the session that caused them.
#[derive(Debug)]
pub struct PresenceFlagWriter {
    tx: mpsc::Sender<Command>,
    task: JoinHandle<()>,
}

impl PresenceFlagWriter {
    /// Spawns the writer task. Must be called inside a Tokio runtime.
    pub fn spawn(store: Arc<dyn MessageStore>, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let task = tokio::spawn(run(store, rx));
        Self { tx, task }
    }

    /// Enqueue `isOnline = true`.
    pub fn mark_online(&self, user_id: UserId) {
        self.enqueue(PresenceUpdate {
            user_id,
            online: true,
            at: Utc::now(),
        });
    }

    /// Enqueue `isOnline = false`.
    pub fn mark_offline(&self, user_id: UserId) {
        self.enqueue(PresenceUpdate {
            user_id,
            online: false,
            at: Utc::now(),
        });
    }

    fn enqueue(&self, update: PresenceUpdate) {
        if let Err(e) = self.tx.try_send(Command::Write(update)) {
            warn!(
                user_id = %update.user_id,
                online = update.online,
                error = %e,
                "Presence flag queue rejected update"
            );
        }
    }

    /// Waits until every write enqueued before this call has been applied.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(Command::Flush(done_tx)).await.is_ok() {
            let _ = done_rx.await;
        }
    }
}

impl Drop for PresenceFlagWriter {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(store: Arc<dyn MessageStore>, mut rx: mpsc::Receiver<Command>) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            Command::Write(update) => {
                match store
                    .set_presence(update.user_id, update.online, update.at)
                    .await
                {
                    Ok(()) => debug!(
                        user_id = %update.user_id,
                        online = update.online,
                        "Presence flag written"
                    ),
                    Err(e) => warn!(
                        user_id = %update.user_id,
                        online = update.online,
                        error = %e,
                        "Failed to write presence flag"
                    ),
                }
            }
            Command::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chathub_database::store::MemoryMessageStore;
    use chathub_entity::user::CreateUser;

    use super::*;

    #[tokio::test]
    async fn test_writes_apply_in_order() {
        let store = Arc::new(MemoryMessageStore::new());
        let user = store
            .create_user(CreateUser {
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                password_hash: "x".to_string(),
            })
            .await
            .unwrap();

        let writer = PresenceFlagWriter::spawn(store.clone(), 16);
        writer.mark_online(user.id);
        writer.mark_offline(user.id);
        writer.mark_online(user.id);
        writer.flush().await;

        assert_eq!(store.presence_history(user.id).await, vec![true, false, true]);
        let stored = store.find_user(user.id).await.unwrap().unwrap();
        assert!(stored.is_online);
        assert!(stored.last_seen.is_some());
    }
}
