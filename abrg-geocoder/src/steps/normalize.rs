//! Normalization stage
//!
//! Populates the query's residual text from the raw input. Performs no
//! administrative matching and never fails.

use crate::query::Query;
use crate::steps::GeocodeStep;
use crate::text::NormalizedText;
use abrg_common::Result;
use async_trait::async_trait;
use tracing::debug;

pub struct NormalizeStep;

#[async_trait]
impl GeocodeStep for NormalizeStep {
    fn name(&self) -> &'static str {
        "normalize"
    }

    async fn apply(&self, mut query: Query) -> Result<Query> {
        let text = NormalizedText::from_raw(&query.input.address);
        query.total_normalized = text.len();
        debug!(normalized = %text.normalized(), "input normalized");
        query.temp_address = text;
        Ok(query)
    }
}
