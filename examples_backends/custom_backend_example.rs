use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info, info_span};
use tracing_report_sink::{
    init::init_tracing, Backend, BackendError, Client, Record,
};

/// Example of integrating a custom error tracker by implementing the
/// `Backend` trait directly. Imagine this talks to some proprietary
/// service for which this crate does not provide a built-in backend.
struct MyTrackerBackend;

#[async_trait]
impl Backend for MyTrackerBackend {
    async fn capture(&self, record: Record) -> Result<(), BackendError> {
        // Here you would call your own client library for the tracker.
        println!(
            "[my-tracker] {} {:?} {:?} trace={:?}",
            record.id(),
            record.severity(),
            record.message(),
            record.trace().map(|t| t.trace_id)
        );
        Ok(())
    }

    fn max_error_depth(&self) -> Option<usize> {
        Some(20)
    }
}

#[tokio::main]
async fn main() {
    let core = init_tracing(Client::new(Arc::new(MyTrackerBackend))).expect("install subscriber");

    info!("custom backend example started");

    let span = info_span!("import", batch = 17);
    span.in_scope(|| {
        error!(tracker = "my-tracker", "simulated error sent via custom backend");
    });

    core.shutdown(Duration::from_secs(2)).await;
}
