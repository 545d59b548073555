//! The ordered stage chain
//!
//! One file per stage. Every stage implements [`GeocodeStep`]: it receives
//! the query, may consume a matched prefix and refine the hypothesis, and
//! always forwards the record. No-match is not an error; valid addresses
//! routinely omit levels, so a stage that cannot advance simply passes the
//! query through. Only a storage-collaborator failure propagates as `Err`.
//!
//! Chain order (block number is a prefix precondition for the display
//! number, and the Tokyo23 stages must see ward-first forms before the
//! generic path gives up):
//!
//! normalize → pref → county+city → city+ward → ward+oaza → ward →
//! tokyo23-town → tokyo23-ward → oaza-chōme → chōme → koaza → rsdt-blk →
//! rsdt-dsp → parcel → regex → result

use crate::query::Query;
use abrg_common::Result;
use async_trait::async_trait;

pub mod chome;
pub mod city_and_ward;
pub mod county_and_city;
pub mod koaza;
pub mod normalize;
pub mod oaza_chome;
pub mod parcel;
pub mod pref;
pub mod regex;
pub mod result;
pub mod rsdt_blk;
pub mod rsdt_dsp;
pub mod tokyo23_town;
pub mod tokyo23_ward;
pub mod ward;
pub mod ward_and_oaza;

pub use chome::ChomeStep;
pub use city_and_ward::CityAndWardStep;
pub use county_and_city::CountyAndCityStep;
pub use koaza::KoazaStep;
pub use normalize::NormalizeStep;
pub use oaza_chome::OazaChomeStep;
pub use parcel::ParcelStep;
pub use pref::PrefStep;
pub use regex::RegexStep;
pub use result::ResultStep;
pub use rsdt_blk::RsdtBlkStep;
pub use rsdt_dsp::RsdtDspStep;
pub use tokyo23_town::Tokyo23TownStep;
pub use tokyo23_ward::Tokyo23WardStep;
pub use ward::WardStep;
pub use ward_and_oaza::WardAndOazaStep;

/// One transform in the pipeline.
///
/// `apply` takes the query by value and returns it: stage failures that are
/// not collaborator failures must be absorbed (the record comes back
/// unchanged), so the record itself can never be lost mid-chain.
#[async_trait]
pub trait GeocodeStep: Send + Sync {
    /// Stage name, for logs
    fn name(&self) -> &'static str;

    async fn apply(&self, query: Query) -> Result<Query>;
}

/// Scope check shared by hierarchy stages: a candidate row is acceptable
/// only when its prefecture agrees with what the query already resolved.
pub(crate) fn pref_in_scope(query: &Query, row_pref_key: u8) -> bool {
    query.pref_key.map_or(true, |k| k == row_pref_key)
}
