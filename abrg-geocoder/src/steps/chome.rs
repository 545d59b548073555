//! Chōme stage
//!
//! Completes the machiaza when the oaza matched without its chōme. Accepts
//! both the counter form ("1丁目", already normalized from 一丁目) and the
//! bare digit followed by a dash ("1-3" where 1 is the chōme).

use crate::query::{CoordinateLevel, MatchLevel, Query};
use crate::steps::GeocodeStep;
use crate::tables::{OazaChoRow, ReferenceTables};
use crate::text::{self, leading_separators, starts_with_fuzzy, DASH};
use abrg_common::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;

pub struct ChomeStep {
    /// (lg_code, normalized oaza) → chōme rows under that oaza
    rows: HashMap<(String, String), Vec<OazaChoRow>>,
}

impl ChomeStep {
    pub fn new(tables: &ReferenceTables) -> Self {
        let mut rows: HashMap<(String, String), Vec<OazaChoRow>> = HashMap::new();
        for row in &tables.oaza_chomes {
            if row.chome.is_empty() {
                continue;
            }
            let key = (
                row.lg_code.clone(),
                text::normalize_key(&row.oaza_cho).into_iter().collect(),
            );
            rows.entry(key).or_default().push(row.clone());
        }
        Self { rows }
    }
}

/// Match one chōme row against the head of the residual text. Returns the
/// number of characters covered.
fn match_chome(head: &[char], chome: &str, fuzzy: Option<char>) -> Option<usize> {
    let printed: Vec<char> = text::normalize_key(chome);
    if starts_with_fuzzy(head, &printed, fuzzy) {
        return Some(printed.len());
    }
    // Bare digits before a dash: "1-3" names chōme 1
    let digits: Vec<char> = printed.iter().copied().take_while(|c| c.is_ascii_digit()).collect();
    if !digits.is_empty()
        && starts_with_fuzzy(head, &digits, fuzzy)
        && head.get(digits.len()) == Some(&DASH)
    {
        return Some(digits.len());
    }
    None
}

#[async_trait]
impl GeocodeStep for ChomeStep {
    fn name(&self) -> &'static str {
        "chome"
    }

    async fn apply(&self, mut query: Query) -> Result<Query> {
        let (Some(lg_code), Some(oaza_cho)) = (query.lg_code.clone(), query.oaza_cho.clone())
        else {
            return Ok(query);
        };
        if query.chome.is_some() || query.machiaza_id.is_some() {
            return Ok(query);
        }
        let oaza_key: String = text::normalize_key(&oaza_cho).into_iter().collect();
        let Some(candidates) = self.rows.get(&(lg_code, oaza_key)) else {
            return Ok(query);
        };

        let chars = query.remaining_chars();
        let skip = leading_separators(&chars, false);
        let head = &chars[skip..];

        let mut best: Option<(usize, &OazaChoRow)> = None;
        for row in candidates {
            if let Some(len) = match_chome(head, &row.chome, query.input.fuzzy) {
                if best.map_or(true, |(b, _)| len > b) {
                    best = Some((len, row));
                }
            }
        }
        let Some((len, row)) = best else {
            return Ok(query);
        };

        query.consume(skip + len);
        query.chome = Some(row.chome.clone());
        query.machiaza_id = Some(row.machiaza_id.clone());
        query.rsdt_addr_flg = Some(row.rsdt_addr_flg);
        query.raise_match_level(MatchLevel::MachiAzaDetail);
        query.set_coordinates(row.rep_lat, row.rep_lon, CoordinateLevel::MachiAza);
        debug!(chome = %row.chome, "chome resolved");
        Ok(query)
    }
}
