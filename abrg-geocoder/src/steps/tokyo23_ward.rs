//! Tokyo 23 special-ward stage
//!
//! Bare special-ward forms ("千代田区..." with an oaza the town stage did
//! not know). The ward is city-grade, so a match resolves the municipality
//! code directly.

use crate::query::{CoordinateLevel, MatchLevel, Query};
use crate::steps::GeocodeStep;
use crate::tables::{ReferenceTables, Tokyo23WardRow};
use crate::text::{self, leading_separators};
use crate::trie::PrefixTrie;
use abrg_common::Result;
use async_trait::async_trait;
use tracing::debug;

const TOKYO_PREF_KEY: u8 = 13;
const TOKYO_PREF: &str = "東京都";

pub struct Tokyo23WardStep {
    trie: PrefixTrie<Tokyo23WardRow>,
}

impl Tokyo23WardStep {
    pub fn new(tables: &ReferenceTables) -> Self {
        let mut trie = PrefixTrie::new();
        for row in &tables.tokyo23_wards {
            trie.insert(&text::normalize_key(&row.ward), row.clone());
        }
        Self { trie }
    }
}

#[async_trait]
impl GeocodeStep for Tokyo23WardStep {
    fn name(&self) -> &'static str {
        "tokyo23_ward"
    }

    async fn apply(&self, mut query: Query) -> Result<Query> {
        if query.lg_code.is_some()
            || query.pref_key.map_or(false, |k| k != TOKYO_PREF_KEY)
        {
            return Ok(query);
        }
        let chars = query.remaining_chars();
        let skip = leading_separators(&chars, false);
        let Some(m) = self
            .trie
            .find_longest(&chars[skip..], query.input.fuzzy, |_| true)
        else {
            return Ok(query);
        };

        let row = m.value;
        query.consume(skip + m.len);
        query.pref = Some(TOKYO_PREF.to_string());
        query.pref_key = Some(TOKYO_PREF_KEY);
        // City-grade ward
        query.city = Some(row.ward.clone());
        query.lg_code = Some(row.lg_code.clone());
        query.raise_match_level(MatchLevel::Ward);
        query.set_coordinates(row.rep_lat, row.rep_lon, CoordinateLevel::City);
        debug!(ward = %row.ward, "tokyo23 ward resolved");
        Ok(query)
    }
}
