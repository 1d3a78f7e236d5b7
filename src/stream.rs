use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{Error, Result};
use crate::tweet::{Profile, Tweet};

/// Entities the pagination stream can carry.
pub trait Paginated {
    /// Pinned entities are only emitted from the first page.
    fn is_pinned(&self) -> bool {
        false
    }
}

impl Paginated for Tweet {
    fn is_pinned(&self) -> bool {
        self.is_pin
    }
}

impl Paginated for Profile {}

/// Ordered results of a paginated query. Dropping the stream cancels the
/// background fetch task.
pub struct TimelineStream<T> {
    rx: mpsc::Receiver<Result<T>>,
    cancel: CancellationToken,
}

impl<T> TimelineStream<T> {
    /// Stop fetching. The stream then yields [`Error::Cancelled`] and ends.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl<T> Stream for TimelineStream<T> {
    type Item = Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl<T> Drop for TimelineStream<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Drive `fetch_page(query, page_size, cursor)` until a page comes back
/// empty, the cursor stops moving, or `max_count` entities were emitted.
/// A fetch error is the last item of the stream.
///
/// Must be called from within a tokio runtime.
pub fn stream<T, F, Fut>(query: impl Into<String>, max_count: usize, fetch_page: F) -> TimelineStream<T>
where
    T: Paginated + Send + 'static,
    F: FnMut(String, usize, String) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(Vec<T>, String)>> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(1);
    let cancel = CancellationToken::new();
    tokio::spawn(paginate(
        query.into(),
        max_count,
        fetch_page,
        tx,
        cancel.clone(),
    ));
    TimelineStream { rx, cancel }
}

async fn paginate<T, F, Fut>(
    query: String,
    max_count: usize,
    mut fetch_page: F,
    tx: mpsc::Sender<Result<T>>,
    cancel: CancellationToken,
) where
    T: Paginated,
    F: FnMut(String, usize, String) -> Fut,
    Fut: Future<Output = Result<(Vec<T>, String)>>,
{
    let mut emitted = 0;
    let mut cursor = String::new();
    let mut first_page = true;

    while emitted < max_count {
        if cancel.is_cancelled() {
            let _ = tx.send(Err(Error::Cancelled)).await;
            return;
        }
        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                let _ = tx.send(Err(Error::Cancelled)).await;
                return;
            }
            page = fetch_page(query.clone(), max_count - emitted, cursor.clone()) => page,
        };
        let (items, next) = match fetched {
            Ok(page) => page,
            Err(e) => {
                let _ = tx.send(Err(e)).await;
                return;
            }
        };
        debug!(count = items.len(), cursor = %next, "fetched page");
        if items.is_empty() {
            return;
        }

        for item in items {
            if emitted >= max_count {
                return;
            }
            if !first_page && item.is_pinned() {
                continue;
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    let _ = tx.send(Err(Error::Cancelled)).await;
                    return;
                }
                sent = tx.send(Ok(item)) => {
                    if sent.is_err() {
                        return;
                    }
                }
            }
            emitted += 1;
        }

        first_page = false;
        if next.is_empty() || next == cursor {
            return;
        }
        cursor = next;
    }
}
