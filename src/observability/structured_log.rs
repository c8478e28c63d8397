/// 判定結果の監査ログ。
use serde_json::json;
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

/// 監査対象イベントの target。判定ごとに1件だけ発行する。
pub const AUDIT_TARGET: &str = "respect_guard::audit";

/// [`AUDIT_TARGET`] のイベントだけを JSON 1行として stderr に書き出すレイヤー。
///
/// フィールドはスコアや判定などの数値・列挙値のみで、コメント本文は含めないこと。
pub(crate) struct AuditLogLayer;

impl<S: Subscriber> Layer<S> for AuditLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if event.metadata().target() != AUDIT_TARGET {
            return;
        }

        let mut visitor = JsonVisitor::default();
        event.record(&mut visitor);
        let entry = audit_entry(event.metadata().level().as_str(), visitor.values);
        eprintln!("{}", serde_json::to_string(&entry).unwrap_or_default());
    }
}

fn audit_entry(
    level: &str,
    fields: serde_json::Map<String, serde_json::Value>,
) -> serde_json::Value {
    json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "level": level,
        "service": "respect-guard",
        "kind": "verdict",
        "fields": fields,
    })
}

#[derive(Default)]
struct JsonVisitor {
    values: serde_json::Map<String, serde_json::Value>,
}

impl tracing::field::Visit for JsonVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.values
            .insert(field.name().to_string(), json!(format!("{value:?}")));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.values.insert(field.name().to_string(), json!(value));
    }

    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.values.insert(field.name().to_string(), json!(value));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.values.insert(field.name().to_string(), json!(value));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.values.insert(field.name().to_string(), json!(value));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.values.insert(field.name().to_string(), json!(value));
    }
}
