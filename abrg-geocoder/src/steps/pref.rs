//! Prefecture stage
//!
//! Longest-prefix match of the input head against the 47 prefecture names.
//! Accepts the suffix-dropped spelling ("東京" for 東京都) as an alias.

use crate::query::{CoordinateLevel, MatchLevel, Query};
use crate::steps::GeocodeStep;
use crate::tables::{PrefRow, ReferenceTables};
use crate::text::{self, leading_separators};
use crate::trie::PrefixTrie;
use abrg_common::keys;
use abrg_common::Result;
use async_trait::async_trait;
use tracing::debug;

struct PrefEntry {
    row: PrefRow,
    pref_key: u8,
}

pub struct PrefStep {
    trie: PrefixTrie<PrefEntry>,
}

impl PrefStep {
    pub fn new(tables: &ReferenceTables) -> Self {
        let mut trie = PrefixTrie::new();
        for row in &tables.prefs {
            let Ok(pref_key) = keys::pref_key(&row.lg_code) else {
                debug!(lg_code = %row.lg_code, "skipping prefecture row with bad lg_code");
                continue;
            };
            let name = text::normalize_key(&row.pref);
            trie.insert(
                &name,
                PrefEntry {
                    row: row.clone(),
                    pref_key,
                },
            );
            // 東京都 → 東京, 大阪府 → 大阪, 広島県 → 広島; 北海道 keeps its suffix
            if matches!(name.last(), Some('都' | '府' | '県')) {
                trie.insert_alias(
                    &name[..name.len() - 1],
                    PrefEntry {
                        row: row.clone(),
                        pref_key,
                    },
                );
            }
        }
        Self { trie }
    }
}

#[async_trait]
impl GeocodeStep for PrefStep {
    fn name(&self) -> &'static str {
        "pref"
    }

    async fn apply(&self, mut query: Query) -> Result<Query> {
        if query.match_level >= MatchLevel::Prefecture {
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

        let entry = m.value;
        query.consume(skip + m.len);
        query.pref = Some(entry.row.pref.clone());
        query.pref_key = Some(entry.pref_key);
        query.raise_match_level(MatchLevel::Prefecture);
        query.set_coordinates(entry.row.rep_lat, entry.row.rep_lon, CoordinateLevel::Prefecture);
        debug!(pref = %entry.row.pref, "prefecture resolved");
        Ok(query)
    }
}
