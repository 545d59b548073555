//! Ward + oaza stage
//!
//! Catches addresses that omit the city entirely and lead with a
//! designated-city ward followed by an oaza ("中区栄..." for Nagoya).
//! Resolves straight through to the machiaza in one match.

use crate::query::{CoordinateLevel, MatchLevel, Query};
use crate::steps::{pref_in_scope, GeocodeStep};
use crate::tables::{ReferenceTables, WardOazaRow};
use crate::text::{self, leading_separators};
use crate::trie::PrefixTrie;
use abrg_common::keys;
use abrg_common::Result;
use async_trait::async_trait;
use tracing::debug;

struct WardOazaEntry {
    row: WardOazaRow,
    pref_key: u8,
}

pub struct WardAndOazaStep {
    trie: PrefixTrie<WardOazaEntry>,
}

impl WardAndOazaStep {
    pub fn new(tables: &ReferenceTables) -> Self {
        let mut trie = PrefixTrie::new();
        for row in &tables.ward_oazas {
            let Ok(pref_key) = keys::pref_key(&row.lg_code) else {
                debug!(lg_code = %row.lg_code, "skipping ward/oaza row with bad lg_code");
                continue;
            };
            let mut name = text::normalize_key(&row.ward);
            name.extend(text::normalize_key(&row.oaza_cho));
            trie.insert(
                &name,
                WardOazaEntry {
                    row: row.clone(),
                    pref_key,
                },
            );
        }
        Self { trie }
    }
}

#[async_trait]
impl GeocodeStep for WardAndOazaStep {
    fn name(&self) -> &'static str {
        "ward_and_oaza"
    }

    async fn apply(&self, mut query: Query) -> Result<Query> {
        if query.lg_code.is_some() || query.match_level >= MatchLevel::MachiAza {
            return Ok(query);
        }
        let chars = query.remaining_chars();
        let skip = leading_separators(&chars, false);
        let Some(m) = self
            .trie
            .find_longest(&chars[skip..], query.input.fuzzy, |e: &WardOazaEntry| {
                pref_in_scope(&query, e.pref_key)
            })
        else {
            return Ok(query);
        };

        let entry = m.value;
        query.consume(skip + m.len);
        query.city = Some(entry.row.city.clone());
        query.ward = Some(entry.row.ward.clone());
        query.oaza_cho = Some(entry.row.oaza_cho.clone());
        query.lg_code = Some(entry.row.lg_code.clone());
        query.machiaza_id = Some(entry.row.machiaza_id.clone());
        if query.pref.is_none() {
            query.pref = Some(entry.row.pref.clone());
            query.pref_key = Some(entry.pref_key);
        }
        query.raise_match_level(MatchLevel::MachiAza);
        query.set_coordinates(entry.row.rep_lat, entry.row.rep_lon, CoordinateLevel::MachiAza);
        debug!(ward = %entry.row.ward, oaza = %entry.row.oaza_cho, "ward and oaza resolved");
        Ok(query)
    }
}
