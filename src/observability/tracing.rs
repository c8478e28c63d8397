use anyhow::{Context, Error, Result};
use once_cell::sync::OnceCell;
use opentelemetry::{KeyValue, global, trace::TracerProvider};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    Resource,
    trace::{RandomIdGenerator, Sampler, SdkTracer, SdkTracerProvider},
};
use tracing::{Subscriber, info};
use tracing_subscriber::{
    EnvFilter, Layer, filter::filter_fn, fmt::MakeWriter, layer::SubscriberExt,
    registry::LookupSpan, util::SubscriberInitExt,
};

use super::structured_log::{AUDIT_TARGET, AuditLogLayer};
use crate::config::Config;

const SERVICE_NAME: &str = "respect-guard";

static TRACING_INIT: OnceCell<()> = OnceCell::new();

/// Tracing サブスクライバを一度だけ初期化する。
///
/// `OTEL_EXPORTER_OTLP_ENDPOINT` が設定されていれば OTLP エクスポーター経由でスパンを送信する。
/// 未設定、もしくはエクスポーターの初期化に失敗した場合は JSON の fmt レイヤーのみを使う。
/// 判定の監査ログ（[`AuditLogLayer`]）はどちらの場合も有効。
///
/// # Errors
/// サブスクライバの初期化に失敗した場合はエラーを返す。
pub fn init(config: &Config) -> Result<()> {
    TRACING_INIT.get_or_try_init(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = json_layer(std::io::stdout);

        let otel_layer = match config.otel_exporter_endpoint() {
            Some(endpoint) => match init_tracer(endpoint, config.otel_sampling_ratio()) {
                Ok(tracer) => Some(tracing_opentelemetry::layer().with_tracer(tracer)),
                Err(error) => {
                    eprintln!("failed to initialise OTLP exporter, continuing without it: {error:#}");
                    None
                }
            },
            None => None,
        };
        let otel_enabled = otel_layer.is_some();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(AuditLogLayer)
            .with(otel_layer)
            .try_init()
            .map_err(|e: tracing_subscriber::util::TryInitError| Error::msg(e.to_string()))?;

        info!(otel_enabled, "tracing initialized");
        Ok::<(), Error>(())
    })?;
    Ok(())
}

/// アプリケーションログ用の JSON fmt レイヤー。監査イベントは [`AuditLogLayer`] 側だけに出す。
fn json_layer<S, W>(writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .with_target(false)
        .json()
        .with_writer(writer)
        .with_filter(filter_fn(|metadata| metadata.target() != AUDIT_TARGET))
}

/// OTLP エクスポーター経由で OpenTelemetry トレーサーを初期化する。
///
/// # Errors
/// エクスポーターの構築に失敗した場合はエラーを返す。
fn init_tracer(endpoint: &str, sampling_ratio: f64) -> Result<SdkTracer> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .context("failed to build OTLP span exporter")?;

    let resource = Resource::builder()
        .with_attributes([
            KeyValue::new("service.name", SERVICE_NAME),
            KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
        ])
        .build();

    let tracer_provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_sampler(Sampler::TraceIdRatioBased(sampling_ratio))
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(resource)
        .build();

    let tracer = tracer_provider.tracer(SERVICE_NAME);
    global::set_tracer_provider(tracer_provider);

    Ok(tracer)
}
