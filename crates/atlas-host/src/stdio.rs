//! Newline-delimited JSON channel.
//!
//! Each input line is one envelope. Every request runs on its own task, so
//! responses are written in completion order, interleaved with
//! `{modelId, progress}` lines from the progress bus. Input ends the session;
//! requests still running are awaited before the writer is closed.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use atlas_pipeline::ProgressEvent;

use crate::error::{HostError, HostResult};
use crate::session::ViewerSession;

/// Serve `input` until EOF, writing responses and progress to `output`.
/// Returns the writer once everything has been flushed.
pub async fn run_stdio<R, W>(session: Arc<ViewerSession>, input: R, output: W) -> HostResult<W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<String>(session.config().channel_capacity);
    let writer = tokio::spawn(write_lines(rx, output));
    let (stop, stopped) = oneshot::channel();
    let progress = tokio::spawn(forward_progress(
        session.progress().subscribe(),
        tx.clone(),
        stopped,
    ));

    let mut requests = JoinSet::new();
    let mut lines = input.lines();
    let mut received = 0usize;
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        received += 1;
        let session = session.clone();
        let tx = tx.clone();
        requests.spawn(async move {
            let Some(response) = session.dispatcher().dispatch_json(&line).await else {
                return;
            };
            match serde_json::to_string(&response) {
                Ok(text) => {
                    let _ = tx.send(text).await;
                }
                Err(e) => warn!(error = %e, "failed to encode response"),
            }
        });
    }
    debug!(received, "stdin closed, draining requests");

    while let Some(joined) = requests.join_next().await {
        if let Err(e) = joined {
            warn!(error = %e, "request task failed");
        }
    }
    let _ = stop.send(());
    if let Err(e) = progress.await {
        warn!(error = %e, "progress forwarder failed");
    }
    drop(tx);

    let output = writer
        .await
        .map_err(|e| HostError::Internal(e.to_string()))??;
    info!(received, "stdio session finished");
    Ok(output)
}

async fn write_lines<W>(mut rx: mpsc::Receiver<String>, mut output: W) -> HostResult<W>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        output.write_all(line.as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await?;
    }
    Ok(output)
}

/// Copy progress updates to the output until told to stop, then flush
/// whatever the bus still buffers.
async fn forward_progress(
    mut events: broadcast::Receiver<ProgressEvent>,
    tx: mpsc::Sender<String>,
    mut stop: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            biased;
            event = events.recv() => match event {
                Ok(event) => {
                    if !forward(event, &tx).await {
                        return;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "progress forwarder lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return,
            },
            _ = &mut stop => break,
        }
    }
    loop {
        match events.try_recv() {
            Ok(event) => {
                if !forward(event, &tx).await {
                    return;
                }
            }
            Err(broadcast::error::TryRecvError::Lagged(_)) => {}
            Err(_) => return,
        }
    }
}

/// Returns `false` once the writer is gone.
async fn forward(event: ProgressEvent, tx: &mpsc::Sender<String>) -> bool {
    let ProgressEvent::Progress(update) = event else {
        return true;
    };
    match serde_json::to_string(&update) {
        Ok(text) => tx.send(text).await.is_ok(),
        Err(e) => {
            warn!(error = %e, "failed to encode progress");
            true
        }
    }
}
