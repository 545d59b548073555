//! Residential display-number locator stage
//!
//! Runs after the block stage because the block number is a prefix
//! precondition: display rows are keyed by the resolved block. Matches
//! "{rsdt_num}" or "{rsdt_num}-{rsdt_num2}" printed forms against the
//! remaining text.

use crate::cache::DatasetCache;
use crate::provider::{ReferenceDataProvider, RsdtDspDb, RsdtDspRow};
use crate::query::{CoordinateLevel, MatchLevel, Query, SearchTarget};
use crate::steps::GeocodeStep;
use crate::text::{self, leading_separators, starts_with_fuzzy, DASH};
use abrg_common::{keys, Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

pub struct RsdtDspStep {
    provider: Arc<dyn ReferenceDataProvider>,
    cache: Arc<DatasetCache<dyn RsdtDspDb>>,
}

impl RsdtDspStep {
    pub fn new(
        provider: Arc<dyn ReferenceDataProvider>,
        cache: Arc<DatasetCache<dyn RsdtDspDb>>,
    ) -> Self {
        Self { provider, cache }
    }

    fn applies_to(query: &Query) -> bool {
        query.input.target != SearchTarget::Parcel
            && query.rsdt_id.is_none()
            && query.block_id.is_some()
            && !query.temp_address.is_empty()
    }
}

/// Printed form of a display row, with token-boundary check against `head`
fn match_rsdt(head: &[char], row: &RsdtDspRow, fuzzy: Option<char>) -> Option<usize> {
    let mut printed = text::normalize_key(&row.rsdt_num);
    if !row.rsdt_num2.is_empty() {
        printed.push(DASH);
        printed.extend(text::normalize_key(&row.rsdt_num2));
    }
    if printed.is_empty() || !starts_with_fuzzy(head, &printed, fuzzy) {
        return None;
    }
    if printed.last().map_or(false, |c| c.is_ascii_digit())
        && head.get(printed.len()).map_or(false, |c| c.is_ascii_digit())
    {
        return None;
    }
    Some(printed.len())
}

#[async_trait]
impl GeocodeStep for RsdtDspStep {
    fn name(&self) -> &'static str {
        "rsdt_dsp"
    }

    async fn apply(&self, mut query: Query) -> Result<Query> {
        if !Self::applies_to(&query) {
            return Ok(query);
        }
        let lg_code = query.lg_code.clone().unwrap_or_default();
        let machiaza_id = query.machiaza_id.clone().unwrap_or_default();
        let blk_id = query.block_id.clone().unwrap_or_default();

        let rsdtblk_key = match keys::rsdtblk_key(&lg_code, &machiaza_id, &blk_id) {
            Ok(k) => k,
            Err(Error::MalformedKeyInput { field }) => {
                debug!(field, "display lookup skipped: malformed key input");
                return Ok(query);
            }
            Err(e) => return Err(e),
        };

        let provider = self.provider.clone();
        let open_lg = lg_code.clone();
        let Some(db) = self
            .cache
            .get_or_open(&lg_code, move || async move {
                provider.open_rsdt_dsp_db(&open_lg).await
            })
            .await?
        else {
            debug!(lg_code = %lg_code, "display dataset absent");
            return Ok(query);
        };

        let rows = db.rsdts_by_block(&rsdtblk_key).await?;
        let chars = query.remaining_chars();
        let skip = leading_separators(&chars, true);
        let head = &chars[skip..];

        let mut best: Option<(usize, &RsdtDspRow)> = None;
        for row in &rows {
            if let Some(len) = match_rsdt(head, row, query.input.fuzzy) {
                if best.map_or(true, |(b, _)| len > b) {
                    best = Some((len, row));
                }
            }
        }
        let Some((len, row)) = best else {
            return Ok(query);
        };

        query.consume(skip + len);
        query.rsdt_id = Some(row.rsdt_id.clone());
        query.rsdt_num = Some(row.rsdt_num.clone());
        if !row.rsdt2_id.is_empty() {
            query.rsdt2_id = Some(row.rsdt2_id.clone());
            query.rsdt_num2 = Some(row.rsdt_num2.clone());
        }
        query.raise_match_level(MatchLevel::ResidentialDetail);
        query.set_coordinates(row.rep_lat, row.rep_lon, CoordinateLevel::Detail);
        debug!(rsdt_num = %row.rsdt_num, "residential display number resolved");
        Ok(query)
    }
}
