//! Cadastral parcel locator stage
//!
//! The alternate numbering scheme. Runs after the residential stages and
//! only when they did not resolve a block (machiaza flagged for parcel
//! numbering, residential dataset absent, or an explicit parcel search
//! target). Printed forms join up to three components with dashes
//! ("123-4-5").

use crate::cache::DatasetCache;
use crate::provider::{ParcelDb, ParcelRow, ReferenceDataProvider};
use crate::query::{CoordinateLevel, MatchLevel, Query, SearchTarget};
use crate::steps::GeocodeStep;
use crate::text::{self, leading_separators, starts_with_fuzzy, DASH};
use abrg_common::{keys, Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

pub struct ParcelStep {
    provider: Arc<dyn ReferenceDataProvider>,
    cache: Arc<DatasetCache<dyn ParcelDb>>,
}

impl ParcelStep {
    pub fn new(
        provider: Arc<dyn ReferenceDataProvider>,
        cache: Arc<DatasetCache<dyn ParcelDb>>,
    ) -> Self {
        Self { provider, cache }
    }

    fn applies_to(query: &Query) -> bool {
        query.input.target != SearchTarget::Residential
            && query.prc_id.is_none()
            && query.block_id.is_none()
            && query.rsdt_id.is_none()
            && query.lg_code.is_some()
            && query.machiaza_id.is_some()
            && !query.temp_address.is_empty()
    }
}

/// Printed parcel number ("123", "123-4" or "123-4-5")
fn parcel_printed(row: &ParcelRow) -> Vec<char> {
    let mut printed = text::normalize_key(&row.prc_num1);
    for part in [&row.prc_num2, &row.prc_num3] {
        if !part.is_empty() {
            printed.push(DASH);
            printed.extend(text::normalize_key(part));
        }
    }
    printed
}

#[async_trait]
impl GeocodeStep for ParcelStep {
    fn name(&self) -> &'static str {
        "parcel"
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
                debug!(field, "parcel lookup skipped: malformed key input");
                return Ok(query);
            }
            Err(e) => return Err(e),
        };

        let provider = self.provider.clone();
        let open_lg = lg_code.clone();
        let Some(db) = self
            .cache
            .get_or_open(&lg_code, move || async move {
                provider.open_parcel_db(&open_lg).await
            })
            .await?
        else {
            debug!(lg_code = %lg_code, "parcel dataset absent");
            return Ok(query);
        };

        let rows = db.parcels_by_town(town_key).await?;
        let chars = query.remaining_chars();
        let skip = leading_separators(&chars, true);
        let head = &chars[skip..];

        let mut best: Option<(usize, &ParcelRow)> = None;
        for row in &rows {
            let printed = parcel_printed(row);
            if printed.is_empty() || !starts_with_fuzzy(head, &printed, query.input.fuzzy) {
                continue;
            }
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
        query.prc_id = Some(row.prc_id.clone());
        query.prc_num = Some(
            [&row.prc_num1, &row.prc_num2, &row.prc_num3]
                .iter()
                .filter(|p| !p.is_empty())
                .map(|p| p.as_str())
                .collect::<Vec<_>>()
                .join("-"),
        );
        query.raise_match_level(MatchLevel::ResidentialDetail);
        query.set_coordinates(row.rep_lat, row.rep_lon, CoordinateLevel::Detail);
        debug!(prc_num = %query.prc_num.as_deref().unwrap_or(""), "parcel resolved");
        Ok(query)
    }
}
