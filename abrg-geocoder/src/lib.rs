//! # ABRG Geocoder Core
//!
//! Multi-stage resolution pipeline turning free-form Japanese postal
//! addresses into structured, geocoded records.
//!
//! One [`Geocoder`] owns an immutable snapshot of the administrative
//! reference tables, per-stage prefix tries, and lazily-opened
//! per-municipality datasets. Each [`Geocoder::geocode`] call pushes a
//! single [`Query`] through the ordered stage chain:
//!
//! normalize → pref → county+city → city+ward → ward+oaza → ward →
//! tokyo23-town → tokyo23-ward → oaza-chōme → chōme → koaza →
//! rsdt-blk → rsdt-dsp → parcel → regex → result
//!
//! Stages consume matched prefixes of the normalized input, raise the
//! match/coordinate confidence levels, and always forward the record;
//! a stage that cannot extend the match passes it through unchanged.
//!
//! Storage is behind the [`provider::ReferenceDataProvider`] trait; this
//! crate implements no backend.

pub mod cache;
pub mod geocoder;
pub mod provider;
pub mod query;
pub mod steps;
pub mod tables;
pub mod text;
pub mod trie;

pub use abrg_common::{Error, Result};
pub use geocoder::Geocoder;
pub use query::{CoordinateLevel, FormattedAddress, GeocodeInput, MatchLevel, Query, SearchTarget};
