use crate::backend::{Backend, Client};
use crate::record::Record;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Duration;

/// Target of the crate's own diagnostics. The reporting layer never
/// forwards events with this target.
pub const INTERNAL_TARGET: &str = "tracing_report_sink";

/// Buffering and flushing behavior of the [`Dispatcher`].
///
/// **Fields**
/// - `channel_buffer`: maximum number of queued commands before new
///   records are dropped. Clamped to at least 16.
/// - `flush_timeout`: upper bound for a single backend flush. Clamped to
///   at least 10 ms.
#[derive(Clone, Debug)]
pub struct DispatchConfig {
    pub channel_buffer: usize,
    pub flush_timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            channel_buffer: 1024,
            flush_timeout: Duration::from_secs(2),
        }
    }
}

enum Command {
    Capture(Record),
    Flush,
    Shutdown(oneshot::Sender<()>),
}

/// Counters maintained by the dispatcher.
#[derive(Debug, Default)]
pub struct DispatchStats {
    /// Records handed to `submit` while a backend was configured.
    pub submitted: AtomicU64,
    /// Records the backend accepted.
    pub delivered: AtomicU64,
    /// Records the backend returned an error for.
    pub failed: AtomicU64,
    /// Dropped because the channel was full or already closed.
    pub dropped: AtomicU64,
    /// Backend flushes performed.
    pub flushes: AtomicU64,
}

/// Point-in-time copy of [`DispatchStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub submitted: u64,
    pub delivered: u64,
    pub failed: u64,
    pub dropped: u64,
    pub flushes: u64,
}

impl DispatchStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
        }
    }
}

/// Hands records to the backend from a background task through a bounded
/// channel, so log calls never wait on network I/O.
///
/// The worker runs on the ambient tokio runtime when there is one and on a
/// dedicated `report-sink-dispatch` thread otherwise. Without a configured
/// backend no worker exists and every operation is a no-op.
pub struct Dispatcher {
    sender: Option<mpsc::Sender<Command>>,
    stats: Arc<DispatchStats>,
    flush_pending: Arc<AtomicBool>,
    closed: AtomicBool,
}

impl Dispatcher {
    pub fn disabled() -> Self {
        Dispatcher {
            sender: None,
            stats: Arc::new(DispatchStats::default()),
            flush_pending: Arc::new(AtomicBool::new(false)),
            closed: AtomicBool::new(true),
        }
    }

    pub fn spawn(client: &Client, config: &DispatchConfig) -> Self {
        let Some(backend) = client.backend().cloned() else {
            return Self::disabled();
        };

        // Enforce minimal thresholds to avoid degenerate configs.
        let buffer = config.channel_buffer.max(16);
        let flush_timeout = config.flush_timeout.max(Duration::from_millis(10));

        let (tx, rx) = mpsc::channel::<Command>(buffer);
        let stats = Arc::new(DispatchStats::default());
        let flush_pending = Arc::new(AtomicBool::new(false));

        let worker = run_worker(
            backend,
            rx,
            flush_timeout,
            Arc::clone(&stats),
            Arc::clone(&flush_pending),
        );

        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(worker);
            }
            Err(_) => {
                let spawned = std::thread::Builder::new()
                    .name("report-sink-dispatch".to_string())
                    .spawn(move || {
                        match tokio::runtime::Builder::new_current_thread()
                            .enable_all()
                            .build()
                        {
                            Ok(runtime) => runtime.block_on(worker),
                            Err(e) => tracing::warn!(
                                target: INTERNAL_TARGET,
                                error = %e,
                                "failed to build dispatch runtime, records will be dropped"
                            ),
                        }
                    });
                if let Err(e) = spawned {
                    tracing::warn!(
                        target: INTERNAL_TARGET,
                        error = %e,
                        "failed to spawn dispatch thread, reporting disabled"
                    );
                    return Self::disabled();
                }
            }
        }

        Dispatcher {
            sender: Some(tx),
            stats,
            flush_pending,
            closed: AtomicBool::new(false),
        }
    }

    pub fn is_active(&self) -> bool {
        self.sender.is_some() && !self.closed.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Queue `record` for delivery. Never blocks; a full queue drops the
    /// record.
    pub fn submit(&self, record: Record) {
        let Some(sender) = self.active_sender() else {
            return;
        };
        self.stats.submitted.fetch_add(1, Ordering::Relaxed);

        if let Err(e) = sender.try_send(Command::Capture(record)) {
            self.stats.dropped.fetch_add(1, Ordering::Relaxed);
            let reason = match e {
                mpsc::error::TrySendError::Full(_) => "channel full",
                mpsc::error::TrySendError::Closed(_) => "channel closed",
            };
            tracing::debug!(target: INTERNAL_TARGET, reason, "dropping report record");
        }
    }

    /// Ask the worker for a backend flush. Requests coalesce while one is
    /// still queued.
    pub fn request_flush(&self) {
        let Some(sender) = self.active_sender() else {
            return;
        };
        if self.flush_pending.swap(true, Ordering::AcqRel) {
            return;
        }
        if sender.try_send(Command::Flush).is_err() {
            self.flush_pending.store(false, Ordering::Release);
        }
    }

    /// Stop accepting records, deliver everything already queued, flush the
    /// backend and stop the worker.
    ///
    /// Returns `false` if this did not complete within `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        let Some(sender) = self.sender.as_ref() else {
            return true;
        };
        if self.closed.swap(true, Ordering::AcqRel) {
            return true;
        }

        let (done_tx, done_rx) = oneshot::channel();
        let drained = async {
            sender.send(Command::Shutdown(done_tx)).await.ok()?;
            done_rx.await.ok()
        };
        matches!(tokio::time::timeout(timeout, drained).await, Ok(Some(())))
    }

    fn active_sender(&self) -> Option<&mpsc::Sender<Command>> {
        if self.closed.load(Ordering::Acquire) {
            return None;
        }
        self.sender.as_ref()
    }
}

async fn run_worker(
    backend: Arc<dyn Backend>,
    mut rx: mpsc::Receiver<Command>,
    flush_timeout: Duration,
    stats: Arc<DispatchStats>,
    flush_pending: Arc<AtomicBool>,
) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Capture(record) => {
                let record_id = record.id().to_string();
                match backend.capture(record).await {
                    Ok(()) => {
                        stats.delivered.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => {
                        stats.failed.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(
                            target: INTERNAL_TARGET,
                            record_id = %record_id,
                            error = %e,
                            "backend failed to capture record"
                        );
                    }
                }
            }
            Command::Flush => {
                flush_pending.store(false, Ordering::Release);
                flush(&*backend, flush_timeout, &stats).await;
            }
            Command::Shutdown(done) => {
                flush(&*backend, flush_timeout, &stats).await;
                let _ = done.send(());
                return;
            }
        }
    }
}

async fn flush(backend: &dyn Backend, timeout: Duration, stats: &DispatchStats) {
    stats.flushes.fetch_add(1, Ordering::Relaxed);
    match tokio::time::timeout(timeout, backend.flush(timeout)).await {
        Ok(true) => {}
        Ok(false) => tracing::debug!(target: INTERNAL_TARGET, "backend flush incomplete"),
        Err(_) => tracing::debug!(
            target: INTERNAL_TARGET,
            timeout_ms = timeout.as_millis() as u64,
            "backend flush timed out"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendError;
    use crate::memory_backend::MemoryBackend;
    use crate::record::{LogRecord, Record};
    use crate::level::Severity;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn record(body: &str) -> Record {
        Record::Log(LogRecord {
            record_id: crate::record::new_record_id(),
            body: body.to_string(),
            severity: Severity::Error,
            timestamp: Utc::now(),
            attributes: BTreeMap::new(),
            trace: None,
        })
    }

    struct FailingBackend;

    #[async_trait]
    impl Backend for FailingBackend {
        async fn capture(&self, _record: Record) -> Result<(), BackendError> {
            Err(BackendError::Transport("connection refused".into()))
        }
    }

    struct SlowFlushBackend;

    #[async_trait]
    impl Backend for SlowFlushBackend {
        async fn capture(&self, _record: Record) -> Result<(), BackendError> {
            Ok(())
        }

        async fn flush(&self, _timeout: Duration) -> bool {
            tokio::time::sleep(Duration::from_secs(60)).await;
            true
        }
    }

    /// Opens a local socket per record, as a network client would.
    struct SocketBackend;

    #[async_trait]
    impl Backend for SocketBackend {
        async fn capture(&self, _record: Record) -> Result<(), BackendError> {
            tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .map(drop)
                .map_err(|e| BackendError::Transport(e.to_string()))
        }
    }

    #[tokio::test]
    async fn delivers_queued_records_on_shutdown() {
        let backend = Arc::new(MemoryBackend::new());
        let dispatcher = Dispatcher::spawn(&Client::new(backend.clone()), &DispatchConfig::default());

        dispatcher.submit(record("one"));
        dispatcher.submit(record("two"));
        assert!(dispatcher.shutdown(Duration::from_secs(1)).await);

        assert_eq!(backend.len(), 2);
        assert!(backend.find("one").is_some());
        assert_eq!(dispatcher.stats().delivered, 2);
        assert_eq!(backend.flush_count(), 1);
    }

    #[tokio::test]
    async fn full_channel_drops_without_blocking() {
        let backend = Arc::new(MemoryBackend::new());
        let config = DispatchConfig {
            channel_buffer: 16,
            ..DispatchConfig::default()
        };
        let dispatcher = Dispatcher::spawn(&Client::new(backend.clone()), &config);

        // The worker cannot run before this task yields.
        for i in 0..20 {
            dispatcher.submit(record(&format!("r{}", i)));
        }
        let stats = dispatcher.stats();
        assert_eq!(stats.submitted, 20);
        assert_eq!(stats.dropped, 4);

        assert!(dispatcher.shutdown(Duration::from_secs(1)).await);
        assert_eq!(backend.len(), 16);
    }

    #[tokio::test]
    async fn backend_failures_are_counted_not_raised() {
        let dispatcher = Dispatcher::spawn(&Client::new(Arc::new(FailingBackend)), &DispatchConfig::default());
        dispatcher.submit(record("lost"));
        assert!(dispatcher.shutdown(Duration::from_secs(1)).await);

        let stats = dispatcher.stats();
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.delivered, 0);
    }

    #[tokio::test]
    async fn flush_requests_coalesce() {
        let backend = Arc::new(MemoryBackend::new());
        let dispatcher = Dispatcher::spawn(&Client::new(backend.clone()), &DispatchConfig::default());

        dispatcher.request_flush();
        dispatcher.request_flush();
        dispatcher.request_flush();
        assert!(dispatcher.shutdown(Duration::from_secs(1)).await);

        // One coalesced request plus the shutdown flush.
        assert_eq!(backend.flush_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_flush_is_bounded_by_timeout() {
        let config = DispatchConfig {
            flush_timeout: Duration::from_millis(100),
            ..DispatchConfig::default()
        };
        let dispatcher = Dispatcher::spawn(&Client::new(Arc::new(SlowFlushBackend)), &config);
        dispatcher.request_flush();
        assert!(dispatcher.shutdown(Duration::from_secs(5)).await);
        assert_eq!(dispatcher.stats().flushes, 2);
    }

    #[tokio::test]
    async fn no_backend_is_a_silent_noop() {
        let dispatcher = Dispatcher::spawn(&Client::none(), &DispatchConfig::default());
        assert!(!dispatcher.is_active());

        dispatcher.submit(record("nowhere"));
        dispatcher.request_flush();
        assert!(dispatcher.shutdown(Duration::from_millis(10)).await);
        assert_eq!(dispatcher.stats(), StatsSnapshot::default());
    }

    #[test]
    fn runs_on_own_thread_without_runtime() {
        let backend = Arc::new(MemoryBackend::new());
        let dispatcher = Dispatcher::spawn(&Client::new(backend.clone()), &DispatchConfig::default());
        dispatcher.submit(record("threaded"));

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        assert!(runtime.block_on(dispatcher.shutdown(Duration::from_secs(5))));
        assert!(backend.find("threaded").is_some());
    }

    #[test]
    fn own_thread_runtime_supports_network_io() {
        let dispatcher = Dispatcher::spawn(&Client::new(Arc::new(SocketBackend)), &DispatchConfig::default());
        dispatcher.submit(record("over the wire"));

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        assert!(runtime.block_on(dispatcher.shutdown(Duration::from_secs(5))));

        let stats = dispatcher.stats();
        assert_eq!(stats.delivered, 1);
        assert_eq!(stats.failed, 0);
    }
}
