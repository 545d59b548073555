//! Regex fallback stage
//!
//! Last of the matchers. When no dataset resolved the residual numeric
//! token (new developments, dataset lag, absent shard), pattern rules
//! extract a chōme/block/number-like token into the printed-form fields.
//! Never sets codes or coordinates, and never overrides anything already
//! resolved at equal-or-better detail.

use crate::query::{MatchLevel, Query};
use crate::steps::GeocodeStep;
use crate::text::{leading_separators, DASH};
use abrg_common::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// "{n}丁目" at the head of the remainder
static CHOME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)丁目").expect("chome pattern"));

/// "{block}(番地|番|-){number}号?" or a bare "{block}(番地)?"
static BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^(\d+)(?:番地|番|{DASH})?(?:(\d+)号?)?")).expect("block pattern")
});

/// A bare display number after a resolved block ("3号" or "3")
static NUM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)号?").expect("number pattern"));

pub struct RegexStep;

impl RegexStep {
    fn applies_to(query: &Query) -> bool {
        query.match_level >= MatchLevel::MachiAza
            && query.match_level < MatchLevel::ResidentialDetail
            && query.prc_id.is_none()
            && !query.temp_address.is_empty()
    }
}

#[async_trait]
impl GeocodeStep for RegexStep {
    fn name(&self) -> &'static str {
        "regex"
    }

    async fn apply(&self, mut query: Query) -> Result<Query> {
        if !Self::applies_to(&query) {
            return Ok(query);
        }

        // Residual chōme first, when no table row claimed one
        if query.chome.is_none() {
            let chars = query.remaining_chars();
            let skip = leading_separators(&chars, false);
            let head: String = chars[skip..].iter().collect();
            if let Some(caps) = CHOME_RE.captures(&head) {
                let whole = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
                let n = &caps[1];
                let consumed = whole.chars().count();
                query.consume(skip + consumed);
                query.chome = Some(format!("{n}丁目"));
                debug!(chome = %n, "chome extracted by fallback pattern");
            }
        }

        // Block / number tokens
        if query.block_num.is_none() {
            let chars = query.remaining_chars();
            let skip = leading_separators(&chars, true);
            let head: String = chars[skip..].iter().collect();
            if let Some(caps) = BLOCK_RE.captures(&head) {
                let whole = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
                let consumed = whole.chars().count();
                if consumed > 0 {
                    query.consume(skip + consumed);
                    query.block_num = Some(caps[1].to_string());
                    if let Some(num) = caps.get(2) {
                        query.rsdt_num = Some(num.as_str().to_string());
                    }
                    debug!(token = %whole.replace(DASH, "-"), "number token extracted by fallback pattern");
                }
            }
        } else if query.rsdt_num.is_none() {
            // Block resolved by dataset but the display row was missing:
            // the trailing number still gets a printed form
            let chars = query.remaining_chars();
            let skip = leading_separators(&chars, true);
            let head: String = chars[skip..].iter().collect();
            if let Some(caps) = NUM_RE.captures(&head) {
                let whole = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
                query.consume(skip + whole.chars().count());
                query.rsdt_num = Some(caps[1].to_string());
                debug!(num = %&caps[1], "display number extracted by fallback pattern");
            }
        }

        Ok(query)
    }
}
