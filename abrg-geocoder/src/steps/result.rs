//! Result finalization stage
//!
//! Terminal transform: rebuilds the canonical output address from the
//! matched fields, appends the unmatched remainder with its original
//! separators, and computes the match score. Always emits exactly one
//! record per input.
//!
//! Score: consumed normalized characters over total normalized characters,
//! plus 0.1 when the municipality code was resolved, clamped to [0, 1].

use crate::query::{FormattedAddress, Query};
use crate::steps::GeocodeStep;
use abrg_common::Result;
use async_trait::async_trait;
use tracing::debug;

/// Score bonus for a resolved municipality code
const LG_CODE_BONUS: f64 = 0.1;

pub struct ResultStep;

fn canonical_address(query: &Query) -> String {
    let mut out = String::new();
    for part in [
        &query.pref,
        &query.county,
        &query.city,
        &query.ward,
        &query.oaza_cho,
        &query.chome,
        &query.koaza,
    ]
    .into_iter()
    .flatten()
    {
        out.push_str(part);
    }

    if let Some(block) = &query.block_num {
        out.push_str(block);
        if let Some(rsdt) = &query.rsdt_num {
            out.push('-');
            out.push_str(rsdt);
            if let Some(rsdt2) = &query.rsdt_num2 {
                out.push('-');
                out.push_str(rsdt2);
            }
        }
    } else if let Some(prc) = &query.prc_num {
        out.push_str(prc);
    }

    // Unmatched remainder, original separators restored
    out.push_str(&query.temp_address.original());
    out
}

fn score(query: &Query) -> f64 {
    if query.total_normalized == 0 {
        return 0.0;
    }
    let mut s = query.consumed_normalized as f64 / query.total_normalized as f64;
    if query.lg_code.is_some() {
        s += LG_CODE_BONUS;
    }
    s.clamp(0.0, 1.0)
}

#[async_trait]
impl GeocodeStep for ResultStep {
    fn name(&self) -> &'static str {
        "result"
    }

    async fn apply(&self, mut query: Query) -> Result<Query> {
        let formatted = FormattedAddress {
            address: canonical_address(&query),
            score: score(&query),
        };
        debug!(
            address = %formatted.address,
            score = formatted.score,
            match_level = ?query.match_level,
            coordinate_level = ?query.coordinate_level,
            "result finalized"
        );
        query.formatted = Some(formatted);
        Ok(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::GeocodeInput;

    #[test]
    fn score_is_consumed_fraction_plus_bonus() {
        let mut q = Query::new(GeocodeInput::new("x"));
        q.total_normalized = 10;
        q.consumed_normalized = 8;
        assert!((score(&q) - 0.8).abs() < 1e-9);
        q.lg_code = Some("131016".into());
        assert!((score(&q) - 0.9).abs() < 1e-9);
        q.consumed_normalized = 10;
        assert_eq!(score(&q), 1.0);
    }

    #[test]
    fn empty_input_scores_zero() {
        let q = Query::new(GeocodeInput::new(""));
        assert_eq!(score(&q), 0.0);
    }

    #[test]
    fn canonical_order_and_number_join() {
        let mut q = Query::new(GeocodeInput::new("x"));
        q.pref = Some("東京都".into());
        q.city = Some("千代田区".into());
        q.oaza_cho = Some("紀尾井町".into());
        q.block_num = Some("1".into());
        q.rsdt_num = Some("3".into());
        assert_eq!(canonical_address(&q), "東京都千代田区紀尾井町1-3");
    }
}
