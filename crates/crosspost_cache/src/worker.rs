//! Request queue and the worker that owns the link table.

use crate::limited::LimitedReader;
use crate::{LinkCacheConfig, LinkTable, LinkUpload};
use crosspost_error::{CrosspostResult, LinkCacheError, LinkCacheErrorKind};
use crosspost_interface::{ByteStream, LinkFetcher, Uploader};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument, warn};

type Resolution = Result<LinkUpload, LinkCacheError>;

/// A queued resolve request.
#[derive(Debug)]
struct ResolveRequest {
    url: String,
    reply: oneshot::Sender<Resolution>,
}

/// Handle to the link upload cache.
///
/// All state lives in one worker task reached through a bounded queue, so
/// table lookups never race. Fetches run in their own tasks and report back
/// to the worker, which caches successes and answers every caller waiting on
/// the URL. Cloning yields another handle to the same worker; the worker
/// stops once every handle is gone and no fetch is outstanding.
#[derive(Debug, Clone)]
pub struct LinkUploadCache {
    requests: mpsc::Sender<ResolveRequest>,
}

impl LinkUploadCache {
    /// Start the worker on the current Tokio runtime.
    pub fn spawn(
        config: LinkCacheConfig,
        fetcher: Arc<dyn LinkFetcher>,
        uploader: Arc<dyn Uploader>,
    ) -> Self {
        let (tx, rx) = mpsc::channel((*config.queue_depth()).max(1));
        let (done_tx, done_rx) = mpsc::unbounded_channel();

        let worker = LinkWorker {
            table: LinkTable::new(*config.capacity(), config.ttl()),
            in_flight: HashMap::new(),
            requests: rx,
            completions: done_rx,
            completions_tx: done_tx,
            fetcher,
            uploader,
            max_bytes: *config.max_bytes(),
        };
        tokio::spawn(worker.run());

        Self { requests: tx }
    }

    /// Content reference for the external image at `url`.
    ///
    /// Waits for a queue slot when the queue is full.
    ///
    /// # Errors
    ///
    /// - `InvalidLink` if `url` is not an absolute http(s) URL
    /// - `TooLarge` if the link announces a body above `max_bytes`
    /// - `Upstream` if the fetch or the re-upload failed
    /// - `WorkerGone` if the worker has stopped
    #[instrument(skip(self))]
    pub async fn resolve(&self, url: &str) -> CrosspostResult<LinkUpload> {
        validate_link(url)?;

        let (reply, response) = oneshot::channel();
        self.requests
            .send(ResolveRequest {
                url: url.to_string(),
                reply,
            })
            .await
            .map_err(|_| LinkCacheError::new(LinkCacheErrorKind::WorkerGone))?;

        let resolution = response
            .await
            .map_err(|_| LinkCacheError::new(LinkCacheErrorKind::WorkerGone))?;
        Ok(resolution?)
    }
}

fn validate_link(link: &str) -> Result<(), LinkCacheError> {
    let parsed = url::Url::parse(link).map_err(|e| {
        LinkCacheError::new(LinkCacheErrorKind::InvalidLink(format!("{}: {}", link, e)))
    })?;

    match parsed.scheme() {
        "http" | "https" if parsed.has_host() => Ok(()),
        scheme => Err(LinkCacheError::new(LinkCacheErrorKind::InvalidLink(format!(
            "unsupported scheme {} in {}",
            scheme, link
        )))),
    }
}

struct LinkWorker {
    table: LinkTable,
    in_flight: HashMap<String, Vec<oneshot::Sender<Resolution>>>,
    requests: mpsc::Receiver<ResolveRequest>,
    completions: mpsc::UnboundedReceiver<(String, Resolution)>,
    completions_tx: mpsc::UnboundedSender<(String, Resolution)>,
    fetcher: Arc<dyn LinkFetcher>,
    uploader: Arc<dyn Uploader>,
    max_bytes: u64,
}

impl LinkWorker {
    async fn run(mut self) {
        info!("Link upload cache started");
        let mut accepting = true;

        loop {
            tokio::select! {
                request = self.requests.recv(), if accepting => match request {
                    Some(request) => self.handle_request(request),
                    None => accepting = false,
                },
                Some((url, resolution)) = self.completions.recv() => {
                    self.complete(url, resolution);
                }
                else => break,
            }

            if !accepting && self.in_flight.is_empty() {
                break;
            }
        }

        info!(cached = self.table.len(), "Link upload cache stopped");
    }

    fn handle_request(&mut self, request: ResolveRequest) {
        let ResolveRequest { url, reply } = request;

        if let Some(upload) = self.table.get(&url) {
            debug!(url = %url, "Link cache hit");
            answer(reply, Ok(upload.clone()));
            return;
        }

        if let Some(waiters) = self.in_flight.get_mut(&url) {
            debug!(url = %url, waiters = waiters.len() + 1, "Joining in-flight resolution");
            waiters.push(reply);
            return;
        }

        debug!(url = %url, "Link cache miss, fetching");
        self.in_flight.insert(url.clone(), vec![reply]);

        let fetcher = Arc::clone(&self.fetcher);
        let uploader = Arc::clone(&self.uploader);
        let done = self.completions_tx.clone();
        let max_bytes = self.max_bytes;
        let job_url = url.clone();
        let job = tokio::spawn(async move {
            fetch_and_upload(fetcher.as_ref(), uploader.as_ref(), &job_url, max_bytes).await
        });
        tokio::spawn(async move {
            // A panicking collaborator must still release the waiters.
            let resolution = job.await.unwrap_or_else(|e| {
                Err(LinkCacheError::new(LinkCacheErrorKind::Upstream(format!(
                    "link job aborted: {}",
                    e
                ))))
            });
            // Worker only drops its receiver on shutdown.
            let _ = done.send((url, resolution));
        });
    }

    fn complete(&mut self, url: String, resolution: Resolution) {
        match &resolution {
            Ok(upload) => {
                info!(url = %url, content_uri = %upload.content_uri(), "Mirrored link");
                self.table.insert(&url, upload.clone());
            }
            Err(e) => warn!(url = %url, error = %e, "Link resolution failed"),
        }

        for waiter in self.in_flight.remove(&url).unwrap_or_default() {
            answer(waiter, resolution.clone());
        }
    }
}

/// Deliver a resolution; a caller that stopped listening is ignored.
fn answer(reply: oneshot::Sender<Resolution>, resolution: Resolution) {
    if reply.send(resolution).is_err() {
        debug!("Resolve caller went away before the reply");
    }
}

async fn fetch_and_upload(
    fetcher: &dyn LinkFetcher,
    uploader: &dyn Uploader,
    url: &str,
    max_bytes: u64,
) -> Resolution {
    let upstream = |e: crosspost_error::CrosspostError| {
        LinkCacheError::new(LinkCacheErrorKind::Upstream(e.to_string()))
    };

    let download = fetcher.fetch(url).await.map_err(upstream)?;
    if let Some(declared) = download.declared_length.filter(|d| *d > max_bytes) {
        return Err(LinkCacheError::new(LinkCacheErrorKind::TooLarge {
            limit: max_bytes,
            actual: declared,
        }));
    }

    let limited = LimitedReader::new(download.reader, max_bytes);
    let transferred = limited.counter();
    let reader: ByteStream = Box::pin(limited);
    let content_uri = uploader
        .upload(reader, &download.mimetype, download.declared_length)
        .await
        .map_err(upstream)?;

    let uploaded = transferred.load(Ordering::Acquire);
    if download.declared_length.is_some_and(|declared| declared != uploaded) {
        warn!(
            url = %url,
            declared = ?download.declared_length,
            uploaded,
            "Declared length does not match uploaded bytes"
        );
    }

    Ok(LinkUpload::new(content_uri, download.mimetype, Some(uploaded)))
}
