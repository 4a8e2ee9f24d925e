use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};
use tracing_report_sink::stdout_backend::StdoutBackend;
use tracing_report_sink::{init::init_tracing_with_config, init::LayerConfig, Client, CoreOptions};

#[tokio::main]
async fn main() {
    let options = CoreOptions::from_env()
        .expect("valid REPORT_SINK_* variables")
        .with_stack_trace();
    let core = init_tracing_with_config(
        Client::new(Arc::new(StdoutBackend::pretty())),
        options,
        LayerConfig::default(),
    )
    .expect("install subscriber");

    debug!("debug message"); // not reported
    info!("info message"); // not reported
    warn!("warn message"); // not reported

    let err = std::io::Error::new(std::io::ErrorKind::Other, "fake error");
    error!(
        just_a_test_string = "something",
        error = &err as &(dyn std::error::Error + 'static),
        "error message with fake error"
    ); // reported with extra data and a stack trace

    core.shutdown(Duration::from_secs(2)).await;
}
