//! Download transaction service.
//!
//! Couples artifact streaming with the download audit log. The audit row is
//! written with status `initiated` before the first byte moves; the stream
//! wrapper reports a single terminal outcome over a channel once the bytes
//! have been sent, failed, or the client went away, and a spawned task
//! applies that outcome to the row.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;
use sqlx::PgPool;
use tokio::io::AsyncRead;
use tokio::sync::oneshot;
use tokio_util::io::ReaderStream;

use crate::error::{AppError, Result};
use crate::models::build::Build;
use crate::models::download::Download;
use crate::storage::{ArtifactRef, ArtifactStore};

/// Terminal outcome of one audited byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed,
    Failed(String),
}

/// Byte stream that reports exactly one [`StreamOutcome`] when it ends.
///
/// End-of-stream reports `Completed`; a read error reports `Failed` with
/// the error text; dropping the stream before the end (client disconnect)
/// reports `Failed` as well. After the first report the sender is gone, so
/// later events cannot overwrite the outcome.
pub struct AuditedStream<R> {
    inner: ReaderStream<R>,
    outcome: Option<oneshot::Sender<StreamOutcome>>,
}

impl<R: AsyncRead> AuditedStream<R> {
    pub fn new(reader: R) -> (Self, oneshot::Receiver<StreamOutcome>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                inner: ReaderStream::new(reader),
                outcome: Some(tx),
            },
            rx,
        )
    }

    fn report(&mut self, outcome: StreamOutcome) {
        if let Some(tx) = self.outcome.take() {
            let _ = tx.send(outcome);
        }
    }
}

impl<R: AsyncRead + Unpin> Stream for AuditedStream<R> {
    type Item = std::io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let me = self.get_mut();
        match Pin::new(&mut me.inner).poll_next(cx) {
            Poll::Ready(None) => {
                me.report(StreamOutcome::Completed);
                Poll::Ready(None)
            }
            Poll::Ready(Some(Err(e))) => {
                me.report(StreamOutcome::Failed(e.to_string()));
                Poll::Ready(Some(Err(e)))
            }
            other => other,
        }
    }
}

impl<R> Drop for AuditedStream<R> {
    fn drop(&mut self) {
        if let Some(tx) = self.outcome.take() {
            let _ = tx.send(StreamOutcome::Failed(
                "stream abandoned before completion".to_string(),
            ));
        }
    }
}

/// Download transaction service
pub struct DownloadService {
    db: PgPool,
    store: Arc<dyn ArtifactStore>,
}

impl DownloadService {
    /// Create a new download service
    pub fn new(db: PgPool, store: Arc<dyn ArtifactStore>) -> Self {
        Self { db, store }
    }

    /// Start a download transaction for an already-resolved build.
    ///
    /// Verifies the physical file, writes the `initiated` audit row, then
    /// opens the artifact. The returned stream carries the bytes; outcome
    /// bookkeeping runs in a spawned task so it survives the request
    /// handler. Resolution failures never reach this method and are never
    /// audited.
    pub async fn begin(
        &self,
        printer_id: i64,
        build: &Build,
    ) -> Result<(Download, AuditedStream<crate::storage::ArtifactReader>)> {
        let artifact = ArtifactRef::new(build.storage_key.clone());

        if !self.store.exists(&artifact).await? {
            tracing::error!(build_id = build.id, artifact = %artifact,
                "artifact file missing for registered build");
            return Err(AppError::ArtifactMissing(format!(
                "artifact for build {} is missing from storage",
                build.id
            )));
        }

        let download: Download = sqlx::query_as(
            r#"
            INSERT INTO downloads (printer_id, build_id, status)
            VALUES ($1, $2, 'initiated')
            RETURNING id, printer_id, build_id, status, error_message, created_at
            "#,
        )
        .bind(printer_id)
        .bind(build.id)
        .fetch_one(&self.db)
        .await?;

        // The file can vanish between the exists check and the open; the
        // audit row already exists, so mark it failed before surfacing.
        let reader = match self.store.open(&artifact).await {
            Ok(reader) => reader,
            Err(e) => {
                apply_outcome(
                    self.db.clone(),
                    download.id,
                    build.id,
                    StreamOutcome::Failed(e.to_string()),
                )
                .await;
                return Err(e);
            }
        };

        let (stream, rx) = AuditedStream::new(reader);

        let db = self.db.clone();
        let download_id = download.id;
        let build_id = build.id;
        tokio::spawn(async move {
            let outcome = rx.await.unwrap_or_else(|_| {
                StreamOutcome::Failed("stream dropped without reporting".to_string())
            });
            apply_outcome(db, download_id, build_id, outcome).await;
        });

        Ok((download, stream))
    }

    /// List the download audit rows for one printer, newest first. Rows
    /// referencing since-deleted builds are included.
    pub async fn list_for_printer(&self, printer_id: i64) -> Result<Vec<Download>> {
        Ok(sqlx::query_as(
            r#"
            SELECT id, printer_id, build_id, status, error_message, created_at
            FROM downloads
            WHERE printer_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(printer_id)
        .fetch_all(&self.db)
        .await?)
    }
}

/// Move an audit row to its terminal status and emit the matching event.
/// A bookkeeping failure here is logged, never surfaced: the attempt is
/// already counted by the `initiated` row.
async fn apply_outcome(db: PgPool, download_id: i64, build_id: i64, outcome: StreamOutcome) {
    let (status, error_message) = match &outcome {
        StreamOutcome::Completed => ("completed", None),
        StreamOutcome::Failed(reason) => ("failed", Some(reason.clone())),
    };

    let updated = sqlx::query("UPDATE downloads SET status = $2, error_message = $3 WHERE id = $1")
        .bind(download_id)
        .bind(status)
        .bind(&error_message)
        .execute(&db)
        .await;

    match updated {
        Ok(_) => match outcome {
            StreamOutcome::Completed => {
                tracing::info!(download_id, build_id, "firmware download completed");
            }
            StreamOutcome::Failed(reason) => {
                tracing::warn!(download_id, build_id, reason = %reason, "firmware download failed");
            }
        },
        Err(e) => {
            tracing::warn!(download_id, error = %e, "failed to record download outcome");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::io;

    /// Reader that yields some bytes, then an error.
    struct FailingReader {
        chunks: Vec<Vec<u8>>,
    }

    impl AsyncRead for FailingReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut tokio::io::ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            match self.chunks.pop() {
                Some(chunk) => {
                    buf.put_slice(&chunk);
                    Poll::Ready(Ok(()))
                }
                None => Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "link went down",
                ))),
            }
        }
    }

    #[tokio::test]
    async fn test_completed_stream_reports_completed_once() {
        let (mut stream, rx) = AuditedStream::new(&b"firmware bytes"[..]);

        let mut collected = Vec::new();
        while let Some(chunk) = stream.next().await {
            collected.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(collected, b"firmware bytes");

        // Dropping after completion must not turn the outcome into a failure
        drop(stream);
        assert_eq!(rx.await.unwrap(), StreamOutcome::Completed);
    }

    #[tokio::test]
    async fn test_read_error_reports_failed() {
        let reader = FailingReader {
            chunks: vec![b"partial".to_vec()],
        };
        let (mut stream, rx) = AuditedStream::new(reader);

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(&first[..], b"partial");
        assert!(stream.next().await.unwrap().is_err());

        match rx.await.unwrap() {
            StreamOutcome::Failed(reason) => assert!(reason.contains("link went down")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_abandoned_stream_reports_failed() {
        let (mut stream, rx) = AuditedStream::new(&b"firmware bytes"[..]);

        // Client takes one chunk and disconnects
        let _ = stream.next().await;
        drop(stream);

        match rx.await.unwrap() {
            StreamOutcome::Failed(reason) => assert!(reason.contains("abandoned")),
            other => panic!("expected failure, got {:?}", other),
        }
    }
}
