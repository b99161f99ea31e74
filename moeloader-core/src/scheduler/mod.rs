//! Bounded media loading for the items a caller is currently showing.
//!
//! The [`MediaFetchScheduler`] keeps at most `limit` loads in flight. Requests beyond that wait in
//! a FIFO queue and are started, oldest first, as soon as a running load ends for any reason.
//! Each task ends with exactly one [`FetchEvent`] on the channel returned by
//! [`MediaFetchScheduler::new`], sent after the task has left the scheduler's queues.
//!
//! All queue transitions happen under one lock that is never held across an `.await`. Loads run
//! on spawned tokio tasks, so requesting a load must happen inside a tokio runtime.
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use log::debug;
use moeloader_common::{
    bytes::Bytes,
    cancel::{CancelSource, CancelToken},
    item::{MediaUrl, MediaVariant, ResultItem},
};
use moeloader_extractors::error::ExtractorError;
use tokio::sync::{
    mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    watch,
};

use crate::error::FetchError;

pub use self::fetcher::{MediaFetcher, TransportFetcher};

mod fetcher;

/// Concurrency used when the caller has no better figure.
pub const DEFAULT_LIMIT: usize = 4;

/// Identity of an item for deduplication: item ids are only unique within a site.
pub type ItemKey = (String, u64);

fn key_of(item: &ResultItem) -> ItemKey {
    (item.site.clone(), item.id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Queued,
    Loading,
    Done,
    Failed,
    Cancelled,
}

impl TaskState {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Cancelled)
    }
}

/// Caller side of a requested load. Cloning it doesn't create a new load.
#[derive(Debug, Clone)]
pub struct FetchHandle {
    id: u64,
    key: ItemKey,
    state: watch::Receiver<TaskState>,
}

impl FetchHandle {
    pub const fn id(&self) -> u64 {
        self.id
    }

    pub fn key(&self) -> &ItemKey {
        &self.key
    }

    pub fn state(&self) -> TaskState {
        *self.state.borrow()
    }

    /// Waits until the task reaches a terminal state.
    pub async fn finished(&self) -> TaskState {
        let mut state = self.state.clone();
        let result = state.wait_for(|s| s.is_terminal()).await.map(|s| *s);
        result.unwrap_or_else(|_| *state.borrow())
    }
}

impl PartialEq for FetchHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for FetchHandle {}

#[derive(Debug)]
pub enum FetchOutcome {
    /// `width` and `height` are the dimensions the site reported for the item.
    Done {
        payload: Bytes,
        width: u32,
        height: u32,
    },
    Failed(FetchError),
    Cancelled,
}

impl FetchOutcome {
    pub const fn state(&self) -> TaskState {
        match self {
            Self::Done { .. } => TaskState::Done,
            Self::Failed(_) => TaskState::Failed,
            Self::Cancelled => TaskState::Cancelled,
        }
    }
}

/// Completion notice of one task.
#[derive(Debug)]
pub struct FetchEvent {
    pub task_id: u64,
    pub item: ResultItem,
    pub outcome: FetchOutcome,
}

/// Keys of the tracked tasks, in queue order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerSnapshot {
    pub active: Vec<ItemKey>,
    pub pending: Vec<ItemKey>,
}

impl SchedulerSnapshot {
    pub fn is_idle(&self) -> bool {
        self.active.is_empty() && self.pending.is_empty()
    }
}

struct Task {
    id: u64,
    item: ResultItem,
    url: MediaUrl,
    state: watch::Sender<TaskState>,
    cancel: CancelSource,
}

impl Task {
    fn handle(&self) -> FetchHandle {
        FetchHandle {
            id: self.id,
            key: key_of(&self.item),
            state: self.state.subscribe(),
        }
    }
}

#[derive(Default)]
struct Queues {
    active: Vec<Task>,
    pending: VecDeque<Task>,
    next_id: u64,
}

impl Queues {
    fn find(&self, key: &ItemKey) -> Option<&Task> {
        self.active
            .iter()
            .chain(self.pending.iter())
            .find(|task| task.item.site == key.0 && task.item.id == key.1)
    }
}

struct Inner {
    fetcher: Arc<dyn MediaFetcher>,
    limit: usize,
    variant: MediaVariant,
    queues: Mutex<Queues>,
    events: UnboundedSender<FetchEvent>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Queues> {
        self.queues.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(
        &self,
        task_id: u64,
        item: ResultItem,
        state: &watch::Sender<TaskState>,
        outcome: FetchOutcome,
    ) {
        state.send_replace(outcome.state());
        let event = FetchEvent {
            task_id,
            item,
            outcome,
        };
        if self.events.send(event).is_err() {
            debug!("Fetch event receiver is gone, dropping event for task {task_id}");
        }
    }

    fn finish(&self, task: Task, outcome: FetchOutcome) {
        let Task {
            id, item, state, ..
        } = task;
        self.emit(id, item, &state, outcome);
    }

    fn start(self: &Arc<Self>, queues: &mut Queues, task: Task) {
        task.state.send_replace(TaskState::Loading);

        let inner = Arc::clone(self);
        let id = task.id;
        let url = task.url.clone();
        let token: CancelToken = task.cancel.token();
        debug!("Loading {} ({} active)", url.url, queues.active.len() + 1);
        queues.active.push(task);

        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                () = token.cancelled() => return,
                result = inner.fetcher.fetch(&url, &token) => result,
            };
            inner.complete(id, result);
        });
    }

    /// Moves the oldest pending tasks into free slots.
    fn promote(self: &Arc<Self>, queues: &mut Queues) {
        while queues.active.len() < self.limit {
            let Some(task) = queues.pending.pop_front() else {
                break;
            };
            self.start(queues, task);
        }
    }

    fn complete(self: &Arc<Self>, id: u64, result: Result<Bytes, ExtractorError>) {
        let mut queues = self.lock();
        // Gone when cancelled while the load was finishing.
        let Some(pos) = queues.active.iter().position(|task| task.id == id) else {
            return;
        };
        let task = queues.active.remove(pos);

        let outcome = match result {
            Ok(payload) => FetchOutcome::Done {
                payload,
                width: task.item.width,
                height: task.item.height,
            },
            Err(e) if e.is_cancelled() => FetchOutcome::Cancelled,
            Err(e) => FetchOutcome::Failed(FetchError::Request(e)),
        };

        self.finish(task, outcome);
        self.promote(&mut queues);
    }
}

pub struct MediaFetchScheduler {
    inner: Arc<Inner>,
}

impl MediaFetchScheduler {
    /// Creates a scheduler running at most `limit` loads at once (at least one).
    ///
    /// `variant` is the media variant to load; items without it fall back to their thumbnail or
    /// medium URL.
    pub fn new(
        fetcher: Arc<dyn MediaFetcher>,
        limit: usize,
        variant: MediaVariant,
    ) -> (Self, UnboundedReceiver<FetchEvent>) {
        let (events, receiver) = unbounded_channel();
        let inner = Inner {
            fetcher,
            limit: limit.max(1),
            variant,
            queues: Mutex::new(Queues::default()),
            events,
        };
        (
            Self {
                inner: Arc::new(inner),
            },
            receiver,
        )
    }

    pub fn limit(&self) -> usize {
        self.inner.limit
    }

    fn media_url(&self, item: &ResultItem) -> Option<MediaUrl> {
        item.url(self.inner.variant)
            .or_else(|| item.loadable_url().map(|(_, url)| url))
            .cloned()
    }

    /// Starts loading `item`, or queues it when every slot is taken.
    ///
    /// While the same item (site and id) is still queued or loading, the existing handle is
    /// returned instead. An item without a usable URL fails right away.
    pub fn request_load(&self, item: ResultItem) -> FetchHandle {
        let mut queues = self.inner.lock();

        if let Some(task) = queues.find(&key_of(&item)) {
            return task.handle();
        }

        let id = queues.next_id;
        queues.next_id += 1;
        let (state, _) = watch::channel(TaskState::Queued);

        let Some(url) = self.media_url(&item) else {
            let handle = FetchHandle {
                id,
                key: key_of(&item),
                state: state.subscribe(),
            };
            let error = FetchError::NoMediaUrl {
                site: item.site.clone(),
                id: item.id,
            };
            self.inner
                .emit(id, item, &state, FetchOutcome::Failed(error));
            return handle;
        };

        let task = Task {
            id,
            item,
            url,
            state,
            cancel: CancelSource::new(),
        };
        let handle = task.handle();

        if queues.active.len() < self.inner.limit {
            self.inner.start(&mut queues, task);
        } else {
            queues.pending.push_back(task);
        }

        handle
    }

    /// Requests every item in order. Handles come back in the same order.
    pub fn request_many(&self, items: impl IntoIterator<Item = ResultItem>) -> Vec<FetchHandle> {
        items
            .into_iter()
            .map(|item| self.request_load(item))
            .collect()
    }

    /// Cancels one task. Returns `false` if it had already finished.
    pub fn cancel(&self, handle: &FetchHandle) -> bool {
        let mut queues = self.inner.lock();

        if let Some(pos) = queues.active.iter().position(|t| t.id == handle.id) {
            let task = queues.active.remove(pos);
            task.cancel.cancel();
            self.inner.finish(task, FetchOutcome::Cancelled);
            self.inner.promote(&mut queues);
            return true;
        }

        if let Some(pos) = queues.pending.iter().position(|t| t.id == handle.id) {
            if let Some(task) = queues.pending.remove(pos) {
                self.inner.finish(task, FetchOutcome::Cancelled);
                return true;
            }
        }

        false
    }

    /// Cancels every loading and queued task. Returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let mut queues = self.inner.lock();
        let active = std::mem::take(&mut queues.active);
        let pending = std::mem::take(&mut queues.pending);
        let count = active.len() + pending.len();

        for task in active {
            task.cancel.cancel();
            self.inner.finish(task, FetchOutcome::Cancelled);
        }
        for task in pending {
            self.inner.finish(task, FetchOutcome::Cancelled);
        }

        if count > 0 {
            debug!("Cancelled {count} media loads");
        }
        count
    }

    pub fn snapshot(&self) -> SchedulerSnapshot {
        let queues = self.inner.lock();
        SchedulerSnapshot {
            active: queues.active.iter().map(|t| key_of(&t.item)).collect(),
            pending: queues.pending.iter().map(|t| key_of(&t.item)).collect(),
        }
    }
}

impl Drop for MediaFetchScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod test {
    use std::{
        collections::{HashMap, HashSet},
        sync::{Arc, Mutex},
    };

    use async_trait::async_trait;
    use moeloader_common::{
        bytes::Bytes,
        cancel::CancelToken,
        item::{MediaUrl, MediaVariant, ResultItem},
    };
    use moeloader_extractors::error::ExtractorError;
    use tokio::sync::{mpsc::error::TryRecvError, oneshot};

    use super::{FetchEvent, FetchOutcome, MediaFetchScheduler, MediaFetcher, TaskState};
    use crate::error::FetchError;

    type Reply = Result<Bytes, ExtractorError>;

    /// Fetcher whose loads only end when the test releases them.
    #[derive(Default)]
    struct GateFetcher {
        started: Mutex<Vec<String>>,
        gates: Mutex<HashMap<String, oneshot::Sender<Reply>>>,
    }

    impl GateFetcher {
        fn started(&self) -> Vec<String> {
            self.started.lock().unwrap().clone()
        }

        fn release(&self, url: &str, reply: Reply) {
            let gate = self.gates.lock().unwrap().remove(url).unwrap();
            let _ = gate.send(reply);
        }

        async fn wait_started(&self, count: usize) {
            for _ in 0..100 {
                if self.started().len() >= count {
                    return;
                }
                tokio::task::yield_now().await;
            }
            panic!("expected {count} started loads, got {:?}", self.started());
        }
    }

    #[async_trait]
    impl MediaFetcher for GateFetcher {
        async fn fetch(&self, url: &MediaUrl, cancel: &CancelToken) -> Reply {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().insert(url.url.clone(), tx);
            self.started.lock().unwrap().push(url.url.clone());

            tokio::select! {
                () = cancel.cancelled() => Err(ExtractorError::Cancelled),
                reply = rx => reply.unwrap_or(Err(ExtractorError::Cancelled)),
            }
        }
    }

    fn url(id: u64) -> String {
        format!("https://t.test/{id}.jpg")
    }

    fn item(id: u64) -> ResultItem {
        let mut item = ResultItem {
            site: "konachan".to_string(),
            id,
            width: 100 + id as u32,
            height: 50,
            ..ResultItem::default()
        };
        item.add_url(MediaVariant::Thumbnail, MediaUrl::new(url(id), None, None));
        item
    }

    fn keys(ids: &[u64]) -> Vec<(String, u64)> {
        ids.iter().map(|id| ("konachan".to_string(), *id)).collect()
    }

    fn scheduler(
        limit: usize,
    ) -> (
        Arc<GateFetcher>,
        MediaFetchScheduler,
        tokio::sync::mpsc::UnboundedReceiver<FetchEvent>,
    ) {
        let fetcher = Arc::new(GateFetcher::default());
        let (scheduler, events) =
            MediaFetchScheduler::new(fetcher.clone(), limit, MediaVariant::Thumbnail);
        (fetcher, scheduler, events)
    }

    #[tokio::test]
    async fn five_items_two_slots() {
        let (fetcher, scheduler, mut events) = scheduler(2);
        scheduler.request_many((1..=5).map(item));

        let snap = scheduler.snapshot();
        assert_eq!(snap.active, keys(&[1, 2]));
        assert_eq!(snap.pending, keys(&[3, 4, 5]));

        fetcher.wait_started(2).await;
        assert_eq!(fetcher.started(), vec![url(1), url(2)]);

        fetcher.release(&url(1), Ok(Bytes::from_static(b"one")));
        let event = events.recv().await.unwrap();
        assert_eq!(event.task_id, 0);
        match event.outcome {
            FetchOutcome::Done {
                payload,
                width,
                height,
            } => {
                assert_eq!(&payload[..], b"one");
                assert_eq!((width, height), (101, 50));
            }
            other => panic!("unexpected outcome {other:?}"),
        }

        let snap = scheduler.snapshot();
        assert_eq!(snap.active, keys(&[2, 3]));
        assert_eq!(snap.pending, keys(&[4, 5]));
        fetcher.wait_started(3).await;
        assert_eq!(fetcher.started()[2], url(3));

        fetcher.release(
            &url(2),
            Err(ExtractorError::HttpStatus {
                status: 404,
                url: url(2),
            }),
        );
        let event = events.recv().await.unwrap();
        assert_eq!(event.item.id, 2);
        assert!(matches!(
            event.outcome,
            FetchOutcome::Failed(FetchError::Request(_))
        ));

        for (id, started) in [(3, 4), (4, 5), (5, 5)] {
            fetcher.wait_started(started).await;
            assert!(scheduler.snapshot().active.len() <= 2);
            fetcher.release(&url(id), Ok(Bytes::new()));
            let event = events.recv().await.unwrap();
            assert_eq!(event.item.id, id);
        }

        assert_eq!(fetcher.started(), (1..=5).map(url).collect::<Vec<_>>());
        assert!(scheduler.snapshot().is_idle());
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn pending_items_start_in_request_order() {
        let (fetcher, scheduler, mut events) = scheduler(1);
        let handles = scheduler.request_many([item(7), item(3), item(9)]);
        assert_eq!(handles[0].state(), TaskState::Loading);
        assert_eq!(handles[1].state(), TaskState::Queued);

        for (n, id) in [7, 3, 9].into_iter().enumerate() {
            fetcher.wait_started(n + 1).await;
            assert_eq!(fetcher.started()[n], url(id));
            fetcher.release(&url(id), Ok(Bytes::new()));
            events.recv().await.unwrap();
        }

        for handle in &handles {
            assert_eq!(handle.finished().await, TaskState::Done);
        }
    }

    #[tokio::test]
    async fn cancel_all_reports_each_task_once() {
        let (fetcher, scheduler, mut events) = scheduler(2);
        let handles = scheduler.request_many((1..=4).map(item));
        fetcher.wait_started(2).await;

        assert_eq!(scheduler.cancel_all(), 4);
        assert!(scheduler.snapshot().is_idle());

        let mut seen = HashSet::new();
        for _ in 0..4 {
            let event = events.try_recv().unwrap();
            assert!(matches!(event.outcome, FetchOutcome::Cancelled));
            assert!(seen.insert(event.task_id));
        }
        for handle in &handles {
            assert_eq!(handle.state(), TaskState::Cancelled);
        }

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
        assert_eq!(fetcher.started().len(), 2);

        scheduler.request_load(item(5));
        assert_eq!(scheduler.snapshot().active, keys(&[5]));
    }

    #[tokio::test]
    async fn duplicate_requests_share_a_task() {
        let (fetcher, scheduler, mut events) = scheduler(1);
        let first = scheduler.request_load(item(1));
        let again = scheduler.request_load(item(1));
        assert_eq!(first, again);

        let queued = scheduler.request_load(item(2));
        assert_eq!(scheduler.request_load(item(2)), queued);
        assert_eq!(scheduler.snapshot().active, keys(&[1]));
        assert_eq!(scheduler.snapshot().pending, keys(&[2]));

        let mut other_site = item(1);
        other_site.site = "yandere".to_string();
        assert_ne!(scheduler.request_load(other_site), first);

        fetcher.wait_started(1).await;
        fetcher.release(&url(1), Ok(Bytes::new()));
        events.recv().await.unwrap();

        let retried = scheduler.request_load(item(1));
        assert_ne!(retried, first);
        assert_eq!(retried.state(), TaskState::Queued);
    }

    #[tokio::test]
    async fn cancelling_one_task_promotes_the_next() {
        let (fetcher, scheduler, mut events) = scheduler(1);
        let handles = scheduler.request_many((1..=3).map(item));
        fetcher.wait_started(1).await;

        assert!(scheduler.cancel(&handles[1]));
        let event = events.try_recv().unwrap();
        assert_eq!(event.item.id, 2);
        assert_eq!(scheduler.snapshot().pending, keys(&[3]));

        assert!(scheduler.cancel(&handles[0]));
        let event = events.try_recv().unwrap();
        assert_eq!(event.item.id, 1);
        assert!(matches!(event.outcome, FetchOutcome::Cancelled));
        assert_eq!(scheduler.snapshot().active, keys(&[3]));
        assert!(scheduler.snapshot().pending.is_empty());

        assert!(!scheduler.cancel(&handles[0]));
        fetcher.wait_started(2).await;
        assert_eq!(fetcher.started()[1], url(3));
    }

    #[tokio::test]
    async fn item_without_url_fails_immediately() {
        let (_fetcher, scheduler, mut events) = scheduler(2);
        let bare = ResultItem {
            site: "konachan".to_string(),
            id: 11,
            ..ResultItem::default()
        };

        let handle = scheduler.request_load(bare);
        assert_eq!(handle.state(), TaskState::Failed);
        assert!(scheduler.snapshot().is_idle());

        let event = events.try_recv().unwrap();
        assert!(matches!(
            event.outcome,
            FetchOutcome::Failed(FetchError::NoMediaUrl { id: 11, .. })
        ));
    }

    #[tokio::test]
    async fn zero_limit_still_runs_one_load() {
        let (_fetcher, scheduler, _events) = scheduler(0);
        assert_eq!(scheduler.limit(), 1);
        scheduler.request_many((1..=2).map(item));
        assert_eq!(scheduler.snapshot().active.len(), 1);
    }
}
