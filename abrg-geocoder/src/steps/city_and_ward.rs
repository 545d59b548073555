//! City + ward stage
//!
//! Matches "{city}" and "{city}{ward}" forms. Plain municipality rows
//! carry an empty ward; designated-city ward rows carry both names and the
//! ward-level lg_code, so "堺市堺区" resolves in one step. Duplicate city
//! names across prefectures (both Tokyo and Hiroshima have a 府中市) are
//! disambiguated by the prefecture scope when one is already resolved, and
//! by canonical preference otherwise.

use crate::query::{CoordinateLevel, MatchLevel, Query};
use crate::steps::{pref_in_scope, GeocodeStep};
use crate::tables::{CityWardRow, ReferenceTables};
use crate::text::{self, leading_separators};
use crate::trie::PrefixTrie;
use abrg_common::keys;
use abrg_common::Result;
use async_trait::async_trait;
use tracing::debug;

struct CityWardEntry {
    row: CityWardRow,
    pref_key: u8,
}

pub struct CityAndWardStep {
    trie: PrefixTrie<CityWardEntry>,
}

impl CityAndWardStep {
    pub fn new(tables: &ReferenceTables) -> Self {
        let mut trie = PrefixTrie::new();
        for row in &tables.city_wards {
            let Ok(pref_key) = keys::pref_key(&row.lg_code) else {
                debug!(lg_code = %row.lg_code, "skipping city/ward row with bad lg_code");
                continue;
            };
            let mut name = text::normalize_key(&row.city);
            name.extend(text::normalize_key(&row.ward));
            trie.insert(
                &name,
                CityWardEntry {
                    row: row.clone(),
                    pref_key,
                },
            );
        }
        Self { trie }
    }
}

#[async_trait]
impl GeocodeStep for CityAndWardStep {
    fn name(&self) -> &'static str {
        "city_and_ward"
    }

    async fn apply(&self, mut query: Query) -> Result<Query> {
        if query.lg_code.is_some() {
            return Ok(query);
        }
        let chars = query.remaining_chars();
        let skip = leading_separators(&chars, false);
        let Some(m) = self
            .trie
            .find_longest(&chars[skip..], query.input.fuzzy, |e: &CityWardEntry| {
                pref_in_scope(&query, e.pref_key)
            })
        else {
            return Ok(query);
        };

        let entry = m.value;
        query.consume(skip + m.len);
        query.city = Some(entry.row.city.clone());
        query.lg_code = Some(entry.row.lg_code.clone());
        if query.pref.is_none() {
            query.pref = Some(entry.row.pref.clone());
            query.pref_key = Some(entry.pref_key);
        }
        if entry.row.ward.is_empty() {
            query.raise_match_level(MatchLevel::City);
        } else {
            query.ward = Some(entry.row.ward.clone());
            query.raise_match_level(MatchLevel::Ward);
        }
        query.set_coordinates(entry.row.rep_lat, entry.row.rep_lon, CoordinateLevel::City);
        debug!(city = %entry.row.city, ward = %entry.row.ward, "city resolved");
        Ok(query)
    }
}
