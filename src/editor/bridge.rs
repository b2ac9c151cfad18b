//! Request/response relay to the privileged page context
//!
//! The editor's document models live in a context the extractor cannot read
//! directly. The extractor sends a [`BridgeRequest`] carrying a fresh
//! correlation id; whatever runs in the privileged context answers with a
//! [`BridgeResponse`] echoing that id. Answers for ids nobody is waiting on
//! (late, duplicated, or foreign) are dropped.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};
use uuid::Uuid;

/// Ask the privileged side for the editor's model contents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeRequest {
    /// Correlation id
    pub id: Uuid,
}

/// Answer to a [`BridgeRequest`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeResponse {
    /// Correlation id of the request being answered
    pub id: Uuid,
    /// Full text of every editor model instance found
    pub models: Vec<String>,
}

type Pending = Arc<Mutex<HashMap<Uuid, oneshot::Sender<Vec<String>>>>>;

/// Requesting end of the relay
#[derive(Clone)]
pub struct EditorBridge {
    requests: mpsc::Sender<BridgeRequest>,
    pending: Pending,
}

impl EditorBridge {
    /// Create a bridge and the request stream the privileged side must serve
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<BridgeRequest>) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Self {
                requests: tx,
                pending: Arc::default(),
            },
            rx,
        )
    }

    /// Request the editor models, waiting at most `timeout` for the answer
    pub async fn request_models(&self, timeout: Duration) -> Result<Vec<String>> {
        let id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();
        self.pending_map().insert(id, tx);

        debug!(%id, "requesting editor models");
        // One deadline covers both queueing the request and the answer.
        let outcome = tokio::time::timeout(timeout, async {
            self.requests
                .send(BridgeRequest { id })
                .await
                .map_err(|_| Error::Extraction("editor bridge has no privileged peer".to_string()))?;
            rx.await
                .map_err(|_| Error::Extraction("editor bridge dropped the request".to_string()))
        })
        .await;
        // Whatever happened, this id is no longer awaited.
        self.pending_map().remove(&id);
        match outcome {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(format!(
                "no editor bridge answer within {}ms",
                timeout.as_millis()
            ))),
        }
    }

    /// Route an answer back to its waiting request; false if nobody is waiting
    pub fn deliver(&self, response: BridgeResponse) -> bool {
        let Some(tx) = self.pending_map().remove(&response.id) else {
            warn!(id = %response.id, "dropping editor bridge answer with unknown id");
            return false;
        };
        tx.send(response.models).is_ok()
    }

    fn pending_map(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<Uuid, oneshot::Sender<Vec<String>>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The privileged side's view of the editor component
pub trait ModelSource: Send + Sync {
    /// Text of every editor model instance currently alive
    fn models(&self) -> Vec<String>;
}

/// Answer bridge requests from `source` until the request stream closes
pub async fn serve_bridge(
    source: Arc<dyn ModelSource>,
    mut requests: mpsc::Receiver<BridgeRequest>,
    bridge: EditorBridge,
) {
    while let Some(request) = requests.recv().await {
        let models = source.models();
        debug!(id = %request.id, count = models.len(), "answering editor bridge request");
        bridge.deliver(BridgeResponse {
            id: request.id,
            models,
        });
    }
}
