//! Koaza stage
//!
//! Completes a koaza name under the resolved oaza (and chōme, when one
//! exists). Runs after the chōme stage so the koaza rows are scoped to the
//! right subdivision.

use crate::query::{CoordinateLevel, MatchLevel, Query};
use crate::steps::GeocodeStep;
use crate::tables::{OazaChoRow, ReferenceTables};
use crate::text::{self, leading_separators, starts_with_fuzzy};
use abrg_common::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;

pub struct KoazaStep {
    /// (lg_code, normalized oaza, normalized chōme) → koaza rows
    rows: HashMap<(String, String, String), Vec<OazaChoRow>>,
}

impl KoazaStep {
    pub fn new(tables: &ReferenceTables) -> Self {
        let mut rows: HashMap<(String, String, String), Vec<OazaChoRow>> = HashMap::new();
        for row in &tables.oaza_chomes {
            if row.koaza.is_empty() {
                continue;
            }
            let key = (
                row.lg_code.clone(),
                text::normalize_key(&row.oaza_cho).into_iter().collect(),
                text::normalize_key(&row.chome).into_iter().collect(),
            );
            rows.entry(key).or_default().push(row.clone());
        }
        Self { rows }
    }
}

#[async_trait]
impl GeocodeStep for KoazaStep {
    fn name(&self) -> &'static str {
        "koaza"
    }

    async fn apply(&self, mut query: Query) -> Result<Query> {
        let (Some(lg_code), Some(oaza_cho)) = (query.lg_code.clone(), query.oaza_cho.clone())
        else {
            return Ok(query);
        };
        if query.koaza.is_some() {
            return Ok(query);
        }
        let key = (
            lg_code,
            text::normalize_key(&oaza_cho).into_iter().collect::<String>(),
            query
                .chome
                .as_deref()
                .map(|c| text::normalize_key(c).into_iter().collect::<String>())
                .unwrap_or_default(),
        );
        let Some(candidates) = self.rows.get(&key) else {
            return Ok(query);
        };

        let chars = query.remaining_chars();
        let skip = leading_separators(&chars, false);
        let head = &chars[skip..];

        let mut best: Option<(usize, &OazaChoRow)> = None;
        for row in candidates {
            let printed = text::normalize_key(&row.koaza);
            if starts_with_fuzzy(head, &printed, query.input.fuzzy)
                && best.map_or(true, |(b, _)| printed.len() > b)
            {
                best = Some((printed.len(), row));
            }
        }
        let Some((len, row)) = best else {
            return Ok(query);
        };

        query.consume(skip + len);
        query.koaza = Some(row.koaza.clone());
        query.machiaza_id = Some(row.machiaza_id.clone());
        query.rsdt_addr_flg = Some(row.rsdt_addr_flg);
        query.raise_match_level(MatchLevel::MachiAzaDetail);
        query.set_coordinates(row.rep_lat, row.rep_lon, CoordinateLevel::MachiAza);
        debug!(koaza = %row.koaza, "koaza resolved");
        Ok(query)
    }
}
