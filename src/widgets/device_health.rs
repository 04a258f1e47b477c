//! Device health widget.

use crate::error::EngineError;
use crate::metrics::health::health_summary;

use super::WidgetContext;

const LIST_LIMIT: usize = 10;

pub fn snapshot(ctx: &WidgetContext) -> Result<serde_json::Value, EngineError> {
    let summary = health_summary(
        &ctx.inventory.devices,
        ctx.config.stale_window(),
        LIST_LIMIT,
        ctx.now,
    );
    Ok(serde_json::to_value(summary)?)
}
