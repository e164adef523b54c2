//! # Bootstrap
//!
//! Interception has to be in place before the first local mutator runs, but
//! the remote stream arrives later. [`Bootstrap::start`] wraps the tree right
//! away and spawns the fetch on the Tokio runtime; the embedder hands the
//! result to the document with [`PendingFetch::deliver`] (non-blocking, between
//! mutator turns) or [`PendingFetch::wait`].
//!
//! A fetch that fails or never finishes leaves the document draining with
//! interception active. That is a degraded mode, not an error state.

use crate::applier::PollOutcome;
use crate::config::PatcherConfig;
use crate::errors::BootstrapError;
use crate::interceptor::PatchedDocument;
use crate::wire::EditStream;
use std::future::Future;
use std::path::PathBuf;
use tokio::runtime::Handle;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::{debug, info, warn};
use treeweave_dom::DomTree;

type FetchResult = Result<EditStream, BootstrapError>;

/// Where the remote edit stream comes from
pub trait EditSource: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = FetchResult> + Send;
}

/// Reads an edit stream document from disk
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl EditSource for FileSource {
    fn fetch(&self) -> impl Future<Output = FetchResult> + Send {
        let path = self.path.clone();
        async move {
            debug!(path = %path.display(), "fetching edit stream");
            let json = tokio::fs::read_to_string(&path).await?;
            Ok(EditStream::from_json(&json)?)
        }
    }
}

/// An edit stream already in memory
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    stream: EditStream,
}

impl StaticSource {
    pub fn new(stream: EditStream) -> Self {
        Self { stream }
    }
}

impl EditSource for StaticSource {
    fn fetch(&self) -> impl Future<Output = FetchResult> + Send {
        let stream = self.stream.clone();
        async move { Ok(stream) }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Bootstrap {
    config: PatcherConfig,
}

impl Bootstrap {
    pub fn new(config: PatcherConfig) -> Self {
        Self { config }
    }

    /// Install interception over `tree` and start fetching from `source`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<D, S>(
        &self,
        tree: D,
        source: S,
    ) -> Result<(PatchedDocument<D>, PendingFetch), BootstrapError>
    where
        D: DomTree,
        S: EditSource,
    {
        let handle = Handle::try_current().map_err(|_| BootstrapError::NoRuntime)?;
        let doc = PatchedDocument::install(tree, self.config.clone());

        let (tx, rx) = oneshot::channel();
        handle.spawn(async move {
            let result = source.fetch().await;
            if tx.send(result).is_err() {
                debug!("edit stream fetched after its handle was dropped");
            }
        });

        Ok((doc, PendingFetch { receiver: Some(rx) }))
    }
}

/// Handle on an in-flight fetch
#[derive(Debug)]
pub struct PendingFetch {
    receiver: Option<oneshot::Receiver<FetchResult>>,
}

impl PendingFetch {
    /// True once the fetch result has been consumed
    pub fn is_finished(&self) -> bool {
        self.receiver.is_none()
    }

    /// Hand the stream to `doc` if it has arrived.
    ///
    /// Returns `Ok(None)` while the fetch is still running, and the outcome of
    /// the completing poll once the edits are queued.
    pub fn deliver<D: DomTree>(
        &mut self,
        doc: &mut PatchedDocument<D>,
    ) -> Result<Option<PollOutcome>, BootstrapError> {
        let Some(receiver) = self.receiver.as_mut() else {
            return Ok(None);
        };
        let result = match receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return Ok(None),
            Err(TryRecvError::Closed) => Err(BootstrapError::FetchDropped),
        };
        self.receiver = None;
        finish(doc, result).map(Some)
    }

    /// Wait for the fetch and hand the stream to `doc`
    pub async fn wait<D: DomTree>(
        mut self,
        doc: &mut PatchedDocument<D>,
    ) -> Result<PollOutcome, BootstrapError> {
        let receiver = self.receiver.take().ok_or(BootstrapError::FetchDropped)?;
        let result = receiver.await.unwrap_or(Err(BootstrapError::FetchDropped));
        finish(doc, result)
    }
}

fn finish<D: DomTree>(
    doc: &mut PatchedDocument<D>,
    result: FetchResult,
) -> Result<PollOutcome, BootstrapError> {
    let edits = result
        .and_then(|stream| Ok(stream.decode()?))
        .map_err(|error| {
            warn!(%error, "edit stream unavailable; interception stays active");
            error
        })?;

    info!(edits = edits.len(), "edit stream arrived");
    doc.receive_edits(edits);
    doc.poll();
    Ok(doc.signal_complete())
}
