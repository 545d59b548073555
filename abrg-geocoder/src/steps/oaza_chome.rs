//! Oaza-chōme stage
//!
//! Longest-prefix match of "{oaza}{chome}{koaza}" names. With a resolved
//! municipality the trie is scoped to its `lg_code`; without one (the input
//! skipped straight from the prefecture to the town) candidates are scoped
//! by prefecture and a match resolves the municipality from the row.
//! An input that stops at the oaza ("宮町2-3") still matches through an
//! oaza-only alias; the dedicated chōme stage then completes the machiaza
//! from the remaining digits.

use crate::query::{CoordinateLevel, MatchLevel, Query};
use crate::steps::{pref_in_scope, GeocodeStep};
use crate::tables::{OazaChoRow, ReferenceTables};
use crate::text::{self, leading_separators};
use crate::trie::PrefixTrie;
use abrg_common::{keys, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;

struct OazaChoEntry {
    row: OazaChoRow,
    pref_key: u8,
    /// False for the oaza-only alias of a chōme/koaza row: the match sets
    /// the oaza name but must not claim the row's machiaza
    with_detail: bool,
}

/// Municipality names carried by an oaza match that resolved the lg_code
struct Municipality {
    pref: String,
    county: Option<String>,
    city: String,
    ward: Option<String>,
}

pub struct OazaChomeStep {
    trie: PrefixTrie<OazaChoEntry>,
    municipalities: HashMap<String, Municipality>,
}

impl OazaChomeStep {
    pub fn new(tables: &ReferenceTables) -> Self {
        let mut municipalities = HashMap::new();
        for row in &tables.county_cities {
            municipalities.insert(
                row.lg_code.clone(),
                Municipality {
                    pref: row.pref.clone(),
                    county: Some(row.county.clone()),
                    city: row.city.clone(),
                    ward: None,
                },
            );
        }
        for row in &tables.city_wards {
            municipalities.insert(
                row.lg_code.clone(),
                Municipality {
                    pref: row.pref.clone(),
                    county: None,
                    city: row.city.clone(),
                    ward: (!row.ward.is_empty()).then(|| row.ward.clone()),
                },
            );
        }
        for row in &tables.tokyo23_wards {
            // City-grade special ward
            municipalities.insert(
                row.lg_code.clone(),
                Municipality {
                    pref: "東京都".to_string(),
                    county: None,
                    city: row.ward.clone(),
                    ward: None,
                },
            );
        }

        let mut trie = PrefixTrie::new();
        for row in &tables.oaza_chomes {
            let Ok(pref_key) = keys::pref_key(&row.lg_code) else {
                debug!(lg_code = %row.lg_code, "skipping oaza row with bad lg_code");
                continue;
            };
            let oaza = text::normalize_key(&row.oaza_cho);
            let mut name = oaza.clone();
            name.extend(text::normalize_key(&row.chome));
            name.extend(text::normalize_key(&row.koaza));
            trie.insert(
                &name,
                OazaChoEntry {
                    row: row.clone(),
                    pref_key,
                    with_detail: true,
                },
            );
            if name.len() > oaza.len() {
                trie.insert_alias(
                    &oaza,
                    OazaChoEntry {
                        row: row.clone(),
                        pref_key,
                        with_detail: false,
                    },
                );
            }
        }
        Self { trie, municipalities }
    }
}

#[async_trait]
impl GeocodeStep for OazaChomeStep {
    fn name(&self) -> &'static str {
        "oaza_chome"
    }

    async fn apply(&self, mut query: Query) -> Result<Query> {
        if query.machiaza_id.is_some() {
            return Ok(query);
        }
        let lg_scope = query.lg_code.clone();
        let chars = query.remaining_chars();
        let skip = leading_separators(&chars, false);
        let Some(m) = self
            .trie
            .find_longest(&chars[skip..], query.input.fuzzy, |e: &OazaChoEntry| {
                match &lg_scope {
                    Some(lg) => e.row.lg_code == *lg,
                    None => pref_in_scope(&query, e.pref_key),
                }
            })
        else {
            return Ok(query);
        };

        let entry = m.value;
        let row = &entry.row;
        query.consume(skip + m.len);
        query.oaza_cho = Some(row.oaza_cho.clone());
        if query.lg_code.is_none() {
            // The input skipped the municipality; the matched row names it
            query.lg_code = Some(row.lg_code.clone());
            if let Some(muni) = self.municipalities.get(&row.lg_code) {
                if query.pref.is_none() {
                    query.pref = Some(muni.pref.clone());
                    query.pref_key = Some(entry.pref_key);
                }
                query.county = muni.county.clone();
                query.city = Some(muni.city.clone());
                query.ward = muni.ward.clone();
            }
        }
        if entry.with_detail {
            query.machiaza_id = Some(row.machiaza_id.clone());
            query.rsdt_addr_flg = Some(row.rsdt_addr_flg);
            let mut detail = false;
            if !row.chome.is_empty() {
                query.chome = Some(row.chome.clone());
                detail = true;
            }
            if !row.koaza.is_empty() {
                query.koaza = Some(row.koaza.clone());
                detail = true;
            }
            query.raise_match_level(if detail {
                MatchLevel::MachiAzaDetail
            } else {
                MatchLevel::MachiAza
            });
            query.set_coordinates(row.rep_lat, row.rep_lon, CoordinateLevel::MachiAza);
        } else {
            // Oaza spelled without its chōme; the chōme stage finishes it
            query.raise_match_level(MatchLevel::MachiAza);
        }
        debug!(oaza = %row.oaza_cho, with_detail = entry.with_detail, "oaza resolved");
        Ok(query)
    }
}
