use std::sync::Arc;
use std::time::Instant;
use tokio::time::Duration;
use tracing::error;

use tracing_report_sink::init::{init_tracing_with_config, LayerConfig};
use tracing_report_sink::{Client, CoreOptions, NoopBackend};

#[tokio::main]
async fn main() {
    let core = init_tracing_with_config(
        Client::new(Arc::new(NoopBackend)),
        CoreOptions::default(),
        LayerConfig {
            enable_stdout: false,
        },
    )
    .expect("install subscriber");

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        error!(iteration = i, "default load test error");
    }

    let elapsed = start.elapsed();
    println!(
        "default config: logged {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    core.shutdown(Duration::from_secs(5)).await;
    let stats = core.stats();
    println!(
        "delivered {} / dropped {} / flushes {}",
        stats.delivered, stats.dropped, stats.flushes
    );
}
