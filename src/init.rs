use crate::backend::Client;
use crate::core::ReportCore;
use crate::error::InitError;
use crate::layer::ReportLayer;
use crate::options::CoreOptions;
use tracing::Subscriber;
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Registry;

/// Subscriber-level wiring options.
///
/// **Fields**
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   installed next to the [`ReportLayer`] so events are also printed to
///   the console.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub enable_stdout: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            enable_stdout: true,
        }
    }
}

/// Attach a reporting layer to an existing subscriber. The subscriber keeps
/// its other destinations; the layer runs alongside them.
pub fn attach<S>(subscriber: S, client: Client, options: CoreOptions) -> Layered<ReportLayer, S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    subscriber.with(ReportLayer::new(client, options))
}

/// Install `Registry + ReportLayer` (plus a console layer when requested)
/// as the global default subscriber.
///
/// **Returns**
/// - the root [`ReportCore`], which can be used to `sync` or `shutdown`
///   delivery before the process exits.
/// - `Err(InitError::SubscriberAlreadySet)` if a global subscriber was
///   installed before.
pub fn init_tracing_with_config(
    client: Client,
    options: CoreOptions,
    config: LayerConfig,
) -> Result<ReportCore, InitError> {
    let layer = ReportLayer::new(client, options);
    let core = layer.core().clone();

    // Two branches because the stacked subscriber types differ.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(core)
}

/// Initialize tracing with default options: errors and above are reported,
/// no stack traces, console output on.
pub fn init_tracing(client: Client) -> Result<ReportCore, InitError> {
    init_tracing_with_config(client, CoreOptions::default(), LayerConfig::default())
}
