use std::sync::Arc;

use tokio::sync::watch;

use crate::{
    KnowledgeBase,
    document::DocumentSnapshot,
    error::KnowledgeBaseError,
    notice::Notice,
};

/// Cached document list, republished after every listing.
///
/// Cloning shares the same snapshot.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    client: KnowledgeBase,
    snapshot: Arc<watch::Sender<DocumentSnapshot>>,
}

impl DocumentStore {
    pub fn new(client: KnowledgeBase) -> Self {
        let (snapshot, _) = watch::channel(DocumentSnapshot::default());
        Self {
            client,
            snapshot: Arc::new(snapshot),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<DocumentSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn snapshot(&self) -> DocumentSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Re-fetch the list and replace the snapshot wholesale.
    ///
    /// Never fails: when the listing is unavailable the snapshot becomes
    /// empty with `available == false` and the cause is logged.
    pub async fn refresh(&self) -> DocumentSnapshot {
        let snapshot = match self.client.list_documents().await {
            Ok(documents) => {
                log::debug!("document listing returned {} entries", documents.len());
                DocumentSnapshot::new(documents)
            }
            Err(e) => {
                log::warn!("{e}");
                DocumentSnapshot::unavailable()
            }
        };
        self.snapshot.send_replace(snapshot.clone());
        snapshot
    }

    /// Delete a document and refresh on success.
    ///
    /// The request is sent whether or not `name` is in the current snapshot.
    pub async fn delete(&self, name: &str) -> Result<(), KnowledgeBaseError> {
        if !self.snapshot.borrow().contains(name) {
            log::debug!("deleting {name}, which is not in the current snapshot");
        }
        self.client.delete_document(name).await?;
        self.refresh().await;
        Ok(())
    }

    /// [`delete`](Self::delete), folded into the notice to show.
    pub async fn delete_with_notice(&self, name: &str) -> Notice {
        let result = self.delete(name).await;
        if let Err(e) = &result {
            log::warn!("delete of {name} failed: {e}");
        }
        Notice::for_delete(name, &result)
    }
}
