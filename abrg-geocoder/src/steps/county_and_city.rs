//! County + city stage
//!
//! Matches "{county}{city}" forms (郡 rows only). Real-world addressing
//! frequently drops the county, in which case this stage yields no match
//! and the city+ward stage resolves the city on its own.

use crate::query::{CoordinateLevel, MatchLevel, Query};
use crate::steps::{pref_in_scope, GeocodeStep};
use crate::tables::{CountyCityRow, ReferenceTables};
use crate::text::{self, leading_separators};
use crate::trie::PrefixTrie;
use abrg_common::keys;
use abrg_common::Result;
use async_trait::async_trait;
use tracing::debug;

struct CountyCityEntry {
    row: CountyCityRow,
    pref_key: u8,
}

pub struct CountyAndCityStep {
    trie: PrefixTrie<CountyCityEntry>,
}

impl CountyAndCityStep {
    pub fn new(tables: &ReferenceTables) -> Self {
        let mut trie = PrefixTrie::new();
        for row in &tables.county_cities {
            let Ok(pref_key) = keys::pref_key(&row.lg_code) else {
                debug!(lg_code = %row.lg_code, "skipping county/city row with bad lg_code");
                continue;
            };
            let mut name = text::normalize_key(&row.county);
            name.extend(text::normalize_key(&row.city));
            trie.insert(
                &name,
                CountyCityEntry {
                    row: row.clone(),
                    pref_key,
                },
            );
        }
        Self { trie }
    }
}

#[async_trait]
impl GeocodeStep for CountyAndCityStep {
    fn name(&self) -> &'static str {
        "county_and_city"
    }

    async fn apply(&self, mut query: Query) -> Result<Query> {
        if query.lg_code.is_some() {
            return Ok(query);
        }
        let chars = query.remaining_chars();
        let skip = leading_separators(&chars, false);
        let Some(m) = self
            .trie
            .find_longest(&chars[skip..], query.input.fuzzy, |e: &CountyCityEntry| {
                pref_in_scope(&query, e.pref_key)
            })
        else {
            return Ok(query);
        };

        let entry = m.value;
        query.consume(skip + m.len);
        query.county = Some(entry.row.county.clone());
        query.city = Some(entry.row.city.clone());
        query.lg_code = Some(entry.row.lg_code.clone());
        if query.pref.is_none() {
            query.pref = Some(entry.row.pref.clone());
            query.pref_key = Some(entry.pref_key);
        }
        query.raise_match_level(MatchLevel::City);
        query.set_coordinates(entry.row.rep_lat, entry.row.rep_lon, CoordinateLevel::City);
        debug!(county = %entry.row.county, city = %entry.row.city, "county and city resolved");
        Ok(query)
    }
}
