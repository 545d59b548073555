//! Residential block locator stage
//!
//! First of the on-demand locator stages. Queries the per-municipality
//! block dataset (opened lazily through the dataset cache) for rows under
//! the resolved machiaza and takes the longest printed block number that
//! prefixes the remaining text. An absent dataset is a pass-through, never
//! an error.

use crate::cache::DatasetCache;
use crate::provider::{ReferenceDataProvider, RsdtBlkDb, RsdtBlkRow};
use crate::query::{CoordinateLevel, MatchLevel, Query, SearchTarget};
use crate::steps::GeocodeStep;
use crate::text::{self, leading_separators, starts_with_fuzzy};
use abrg_common::{keys, Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

pub struct RsdtBlkStep {
    provider: Arc<dyn ReferenceDataProvider>,
    cache: Arc<DatasetCache<dyn RsdtBlkDb>>,
}

impl RsdtBlkStep {
    pub fn new(
        provider: Arc<dyn ReferenceDataProvider>,
        cache: Arc<DatasetCache<dyn RsdtBlkDb>>,
    ) -> Self {
        Self { provider, cache }
    }

    fn applies_to(query: &Query) -> bool {
        query.input.target != SearchTarget::Parcel
            && query.block_id.is_none()
            && query.rsdt_addr_flg != Some(0)
            && query.lg_code.is_some()
            && query.machiaza_id.is_some()
            && !query.temp_address.is_empty()
    }
}

#[async_trait]
impl GeocodeStep for RsdtBlkStep {
    fn name(&self) -> &'static str {
        "rsdt_blk"
    }

    async fn apply(&self, mut query: Query) -> Result<Query> {
        if !Self::applies_to(&query) {
            return Ok(query);
        }
        let lg_code = query.lg_code.clone().unwrap_or_default();
        let machiaza_id = query.machiaza_id.clone().unwrap_or_default();

        let town_key = match keys::town_key(&lg_code, &machiaza_id) {
            Ok(k) => k,
            Err(Error::MalformedKeyInput { field }) => {
                // Bad codes degrade to no-match at the stage boundary
                debug!(field, "block lookup skipped: malformed key input");
                return Ok(query);
            }
            Err(e) => return Err(e),
        };

        let provider = self.provider.clone();
        let open_lg = lg_code.clone();
        let Some(db) = self
            .cache
            .get_or_open(&lg_code, move || async move {
                provider.open_rsdt_blk_db(&open_lg).await
            })
            .await?
        else {
            debug!(lg_code = %lg_code, "block dataset absent");
            return Ok(query);
        };

        let rows = db.blocks_by_town(town_key).await?;
        let chars = query.remaining_chars();
        let skip = leading_separators(&chars, true);
        let head = &chars[skip..];

        let mut best: Option<(usize, &RsdtBlkRow)> = None;
        for row in &rows {
            let printed = text::normalize_key(&row.blk_num);
            if printed.is_empty() || !starts_with_fuzzy(head, &printed, query.input.fuzzy) {
                continue;
            }
            // A digit match must end at a token boundary: "1" must not
            // claim the head of "12"
            if printed.last().map_or(false, |c| c.is_ascii_digit())
                && head.get(printed.len()).map_or(false, |c| c.is_ascii_digit())
            {
                continue;
            }
            if best.map_or(true, |(b, _)| printed.len() > b) {
                best = Some((printed.len(), row));
            }
        }
        let Some((len, row)) = best else {
            return Ok(query);
        };

        query.consume(skip + len);
        query.block_id = Some(row.blk_id.clone());
        query.block_num = Some(row.blk_num.clone());
        query.raise_match_level(MatchLevel::ResidentialBlock);
        query.set_coordinates(row.rep_lat, row.rep_lon, CoordinateLevel::Detail);
        debug!(blk_num = %row.blk_num, "residential block resolved");
        Ok(query)
    }
}
