//! Tokyo 23 special-ward town stage
//!
//! Tokyo's special wards break normal containment: they are modeled as
//! wards of one prefecture but addressed like first-class cities. This
//! stage catches "{ward}{town}" forms ("千代田区紀尾井町...") that the
//! generic path cannot resolve, running before the bare-ward stage so the
//! longer town form gets first chance at the prefix.

use crate::query::{CoordinateLevel, MatchLevel, Query};
use crate::steps::GeocodeStep;
use crate::tables::{ReferenceTables, Tokyo23TownRow};
use crate::text::{self, leading_separators};
use crate::trie::PrefixTrie;
use abrg_common::Result;
use async_trait::async_trait;
use tracing::debug;

/// Prefecture ordinal of 東京都
const TOKYO_PREF_KEY: u8 = 13;
const TOKYO_PREF: &str = "東京都";

pub struct Tokyo23TownStep {
    trie: PrefixTrie<Tokyo23TownRow>,
}

impl Tokyo23TownStep {
    pub fn new(tables: &ReferenceTables) -> Self {
        let mut trie = PrefixTrie::new();
        for row in &tables.tokyo23_towns {
            let mut name = text::normalize_key(&row.ward);
            name.extend(text::normalize_key(&row.oaza_cho));
            name.extend(text::normalize_key(&row.chome));
            trie.insert(&name, row.clone());
        }
        Self { trie }
    }

    fn applies_to(query: &Query) -> bool {
        query.lg_code.is_none()
            && query
                .pref_key
                .map_or(true, |k| k == TOKYO_PREF_KEY)
    }
}

#[async_trait]
impl GeocodeStep for Tokyo23TownStep {
    fn name(&self) -> &'static str {
        "tokyo23_town"
    }

    async fn apply(&self, mut query: Query) -> Result<Query> {
        if !Self::applies_to(&query) {
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
        // Special wards are city-grade: the ward name fills the city slot
        query.city = Some(row.ward.clone());
        query.oaza_cho = Some(row.oaza_cho.clone());
        query.lg_code = Some(row.lg_code.clone());
        query.machiaza_id = Some(row.machiaza_id.clone());
        query.rsdt_addr_flg = Some(row.rsdt_addr_flg);
        if row.chome.is_empty() {
            query.raise_match_level(MatchLevel::MachiAza);
        } else {
            query.chome = Some(row.chome.clone());
            query.raise_match_level(MatchLevel::MachiAzaDetail);
        }
        query.set_coordinates(row.rep_lat, row.rep_lon, CoordinateLevel::MachiAza);
        debug!(ward = %row.ward, oaza = %row.oaza_cho, "tokyo23 town resolved");
        Ok(query)
    }
}
