//! Ward stage
//!
//! Bare "{ward}" forms of designated-city wards, for addresses that omit
//! the city name but spell the ward with no oaza attached to it.

use crate::query::{CoordinateLevel, MatchLevel, Query};
use crate::steps::{pref_in_scope, GeocodeStep};
use crate::tables::{ReferenceTables, WardRow};
use crate::text::{self, leading_separators};
use crate::trie::PrefixTrie;
use abrg_common::keys;
use abrg_common::Result;
use async_trait::async_trait;
use tracing::debug;

struct WardEntry {
    row: WardRow,
    pref_key: u8,
}

pub struct WardStep {
    trie: PrefixTrie<WardEntry>,
}

impl WardStep {
    pub fn new(tables: &ReferenceTables) -> Self {
        let mut trie = PrefixTrie::new();
        for row in &tables.wards {
            let Ok(pref_key) = keys::pref_key(&row.lg_code) else {
                debug!(lg_code = %row.lg_code, "skipping ward row with bad lg_code");
                continue;
            };
            trie.insert(
                &text::normalize_key(&row.ward),
                WardEntry {
                    row: row.clone(),
                    pref_key,
                },
            );
        }
        Self { trie }
    }
}

#[async_trait]
impl GeocodeStep for WardStep {
    fn name(&self) -> &'static str {
        "ward"
    }

    async fn apply(&self, mut query: Query) -> Result<Query> {
        if query.lg_code.is_some() {
            return Ok(query);
        }
        let chars = query.remaining_chars();
        let skip = leading_separators(&chars, false);
        let Some(m) = self
            .trie
            .find_longest(&chars[skip..], query.input.fuzzy, |e: &WardEntry| {
                pref_in_scope(&query, e.pref_key)
            })
        else {
            return Ok(query);
        };

        let entry = m.value;
        query.consume(skip + m.len);
        query.city = Some(entry.row.city.clone());
        query.ward = Some(entry.row.ward.clone());
        query.lg_code = Some(entry.row.lg_code.clone());
        if query.pref.is_none() {
            query.pref = Some(entry.row.pref.clone());
            query.pref_key = Some(entry.pref_key);
        }
        query.raise_match_level(MatchLevel::Ward);
        query.set_coordinates(entry.row.rep_lat, entry.row.rep_lon, CoordinateLevel::City);
        debug!(ward = %entry.row.ward, "ward resolved");
        Ok(query)
    }
}
