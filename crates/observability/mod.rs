mod config;
mod layer;
mod notifier;
mod webhook_sink;

use anyhow::Result;
use config::ObservabilityConfig;
use layer::AlertLayer;
use notifier::{AlertDispatcher, AlertSink};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use webhook_sink::WebhookAlertSink;

/// Installs the global subscriber: env filter, local-time fmt output and the optional alert sink.
/// Must run inside a tokio runtime when an alert sink is configured.
pub fn init_observability(component: &str) -> Result<()> {
    let mut config = ObservabilityConfig::from_env(component);

    let alert_layer = match config.alert_sink.as_ref() {
        Some(sink) => match WebhookAlertSink::new(sink.webhook_url.clone()) {
            Ok(webhook) => {
                let sinks: Vec<Arc<dyn AlertSink>> = vec![Arc::new(webhook)];
                Some(
                    AlertLayer::new(
                        AlertDispatcher::spawn(sinks),
                        config.service_context.clone(),
                        sink.min_level,
                    )
                    .with_filter(LevelFilter::from_level(sink.min_level)),
                )
            }
            Err(err) => {
                config
                    .warnings
                    .push(format!("alert webhook client failed to build: {err}"));
                None
            }
        },
        None => None,
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Local timestamps so `TZ` is honoured in the output.
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339());

    let alerts_enabled = alert_layer.is_some();

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(alert_layer)
        .with(env_filter)
        .try_init()?;

    let ctx = &config.service_context;
    for warning in &config.warnings {
        warn!(
            service = %ctx.service_name,
            environment = %ctx.environment,
            component = %ctx.component,
            %warning,
            "observability: config warning"
        );
    }

    info!(
        service = %ctx.service_name,
        environment = %ctx.environment,
        component = %ctx.component,
        alerts_enabled,
        "observability: tracing initialized"
    );

    Ok(())
}
