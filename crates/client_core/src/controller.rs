//! Loading state machines for catalog screens.
//!
//! A list screen owns one [`PaginatedListController`] and renders purely from
//! its [`ListState`]: skeletons while the first page is in flight, a
//! full-screen retry when `has_error` is set, a footer spinner while more
//! items stream in. A detail screen owns a [`DetailController`], the
//! single-item variant of the same pattern. Neither controller ever returns
//! an error to the caller; failures land in state.

use std::sync::Arc;

use shared::{
    error::FetchError,
    protocol::{PageRequest, PageResponse},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, warn};

use crate::{DetailSource, ListSource};

/// Activity state of a list screen. At most one variant is ever active, and
/// every operation ends back at `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPhase {
    #[default]
    Idle,
    InitialLoading,
    Refreshing,
    LoadingMore,
}

#[derive(Debug, Clone)]
pub struct ListState<T> {
    /// Accumulated items, in server order, append-only across pages.
    pub items: Vec<T>,
    /// Last page successfully merged (zero-based).
    pub current_page: u32,
    /// Collection size the server reported with the latest successful page.
    pub total: u64,
    pub phase: LoadPhase,
    /// Set only by a failed initial load or refresh; load-more failures never
    /// raise it.
    pub has_error: bool,
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            current_page: 0,
            total: 0,
            phase: LoadPhase::Idle,
            has_error: false,
        }
    }
}

impl<T> ListState<T> {
    /// True once every item the server reports has been accumulated.
    pub fn is_exhausted(&self) -> bool {
        self.items.len() as u64 >= self.total
    }
}

/// Notifications for presentation layers that prefer a push feed over
/// polling [`PaginatedListController::state`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEvent {
    PhaseChanged(LoadPhase),
    PageLoaded {
        page: u32,
        appended: usize,
        total: u64,
    },
    LoadFailed {
        phase: LoadPhase,
    },
}

struct ListInner<T> {
    state: ListState<T>,
    /// Bumped by [`PaginatedListController::reset`]; a completion whose
    /// captured epoch no longer matches is discarded unapplied.
    epoch: u64,
}

/// Drives at most one outstanding page fetch against a [`ListSource`] and
/// merges the results into a [`ListState`].
///
/// The three entry points differ in where the fetched page goes (replace vs
/// append) and how a failure surfaces (full-screen error vs silently ending
/// the footer spinner); they share the guard that nothing starts unless the
/// controller is idle, which is what keeps duplicate in-flight requests from
/// a repeated scroll or pull gesture impossible.
pub struct PaginatedListController<T> {
    source: Arc<dyn ListSource<T>>,
    page_size: u32,
    inner: Mutex<ListInner<T>>,
    events: broadcast::Sender<ListEvent>,
}

impl<T: Clone + Send + 'static> PaginatedListController<T> {
    pub fn new(source: Arc<dyn ListSource<T>>, page_size: u32) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            source,
            page_size: page_size.max(1),
            inner: Mutex::new(ListInner {
                state: ListState::default(),
                epoch: 0,
            }),
            events,
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Snapshot of the current state.
    pub async fn state(&self) -> ListState<T> {
        self.inner.lock().await.state.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ListEvent> {
        self.events.subscribe()
    }

    /// Load page zero, replacing anything currently held. Intended for screen
    /// mount and for the full-screen retry affordance. Silent no-op while
    /// another load is in flight.
    pub async fn load_first_page(&self) {
        let Some(epoch) = self.begin(LoadPhase::InitialLoading).await else {
            return;
        };
        let outcome = self
            .source
            .fetch_page(PageRequest::for_page(0, self.page_size))
            .await;
        self.complete_replace(epoch, LoadPhase::InitialLoading, outcome)
            .await;
    }

    /// Re-fetch page zero and replace the list, keeping stale items visible
    /// if the fetch fails. Always ends `Idle`, so a pull-to-refresh indicator
    /// cannot be left stuck active.
    pub async fn refresh(&self) {
        let Some(epoch) = self.begin(LoadPhase::Refreshing).await else {
            return;
        };
        let outcome = self
            .source
            .fetch_page(PageRequest::for_page(0, self.page_size))
            .await;
        self.complete_replace(epoch, LoadPhase::Refreshing, outcome).await;
    }

    /// Fetch the page after `current_page` and append it. No-op unless idle
    /// and the server reports more items than are held; a failure ends the
    /// phase without touching `has_error`, so the next scroll gesture simply
    /// tries again.
    pub async fn load_next_page(&self) {
        let (epoch, next_page) = {
            let mut inner = self.inner.lock().await;
            if inner.state.phase != LoadPhase::Idle || inner.state.is_exhausted() {
                return;
            }
            inner.state.phase = LoadPhase::LoadingMore;
            (inner.epoch, inner.state.current_page + 1)
        };
        self.emit(ListEvent::PhaseChanged(LoadPhase::LoadingMore));

        let outcome = self
            .source
            .fetch_page(PageRequest::for_page(next_page, self.page_size))
            .await;

        let mut inner = self.inner.lock().await;
        if inner.epoch != epoch {
            debug!("discarding load-more response for a torn-down list");
            return;
        }
        inner.state.phase = LoadPhase::Idle;
        match outcome {
            Ok(page) => {
                let appended = page.items.len();
                let total = page.total;
                inner.state.items.extend(page.items);
                inner.state.current_page = next_page;
                inner.state.total = total;
                drop(inner);
                self.emit(ListEvent::PageLoaded {
                    page: next_page,
                    appended,
                    total,
                });
            }
            Err(err) => {
                drop(inner);
                debug!(%err, page = next_page, "load-more failed; keeping accumulated items");
                self.emit(ListEvent::LoadFailed {
                    phase: LoadPhase::LoadingMore,
                });
            }
        }
        self.emit(ListEvent::PhaseChanged(LoadPhase::Idle));
    }

    /// Tear the screen's state down. Bumps the epoch so a response still in
    /// flight for the old state is discarded when it lands, rather than
    /// relying on the presentation layer to check whether it is still
    /// mounted.
    pub async fn reset(&self) {
        {
            let mut inner = self.inner.lock().await;
            inner.epoch += 1;
            inner.state = ListState::default();
        }
        self.emit(ListEvent::PhaseChanged(LoadPhase::Idle));
    }

    /// Enter a replace-style phase from idle, clearing the error flag for the
    /// new attempt. Returns the epoch the completion must present.
    async fn begin(&self, phase: LoadPhase) -> Option<u64> {
        let epoch = {
            let mut inner = self.inner.lock().await;
            if inner.state.phase != LoadPhase::Idle {
                return None;
            }
            inner.state.phase = phase;
            inner.state.has_error = false;
            inner.epoch
        };
        self.emit(ListEvent::PhaseChanged(phase));
        Some(epoch)
    }

    async fn complete_replace(
        &self,
        epoch: u64,
        phase: LoadPhase,
        outcome: Result<PageResponse<T>, FetchError>,
    ) {
        let mut inner = self.inner.lock().await;
        if inner.epoch != epoch {
            debug!("discarding response for a torn-down list");
            return;
        }
        inner.state.phase = LoadPhase::Idle;
        match outcome {
            Ok(page) => {
                let appended = page.items.len();
                let total = page.total;
                inner.state.items = page.items;
                inner.state.total = total;
                inner.state.current_page = 0;
                drop(inner);
                self.emit(ListEvent::PageLoaded {
                    page: 0,
                    appended,
                    total,
                });
            }
            Err(err) => {
                inner.state.has_error = true;
                drop(inner);
                warn!(%err, ?phase, "list load failed; keeping prior items");
                self.emit(ListEvent::LoadFailed { phase });
            }
        }
        self.emit(ListEvent::PhaseChanged(LoadPhase::Idle));
    }

    fn emit(&self, event: ListEvent) {
        // Nobody listening is fine; state() remains the source of truth.
        let _ = self.events.send(event);
    }
}

#[derive(Debug, Clone)]
pub struct DetailState<T> {
    pub item: Option<T>,
    pub loading: bool,
    pub has_error: bool,
}

impl<T> Default for DetailState<T> {
    fn default() -> Self {
        Self {
            item: None,
            loading: false,
            has_error: false,
        }
    }
}

struct DetailInner<T> {
    state: DetailState<T>,
    epoch: u64,
}

/// Single-item variant of the list controller, for detail screens that fetch
/// one record by id.
pub struct DetailController<T> {
    source: Arc<dyn DetailSource<T>>,
    inner: Mutex<DetailInner<T>>,
}

impl<T: Clone + Send + 'static> DetailController<T> {
    pub fn new(source: Arc<dyn DetailSource<T>>) -> Self {
        Self {
            source,
            inner: Mutex::new(DetailInner {
                state: DetailState::default(),
                epoch: 0,
            }),
        }
    }

    pub async fn state(&self) -> DetailState<T> {
        self.inner.lock().await.state.clone()
    }

    /// Fetch one item. The retry affordance is simply calling this again.
    /// Silent no-op while a fetch is already in flight.
    pub async fn load(&self, id: i64) {
        let epoch = {
            let mut inner = self.inner.lock().await;
            if inner.state.loading {
                return;
            }
            inner.state.loading = true;
            inner.state.has_error = false;
            inner.epoch
        };

        let outcome = self.source.fetch_item(id).await;

        let mut inner = self.inner.lock().await;
        if inner.epoch != epoch {
            debug!(id, "discarding detail response for a torn-down screen");
            return;
        }
        inner.state.loading = false;
        match outcome {
            Ok(item) => inner.state.item = Some(item),
            Err(err) => {
                inner.state.has_error = true;
                warn!(%err, id, "detail load failed");
            }
        }
    }

    /// Discard the held item and invalidate any in-flight fetch.
    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        inner.epoch += 1;
        inner.state = DetailState::default();
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
