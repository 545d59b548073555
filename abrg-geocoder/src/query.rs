//! Query model: the unit of work and match-state accumulator
//!
//! One `Query` per geocoding request. Stages mutate it only through the
//! explicit transitions here ([`Query::consume`], [`Query::raise_match_level`],
//! [`Query::set_coordinates`]), which preserve the pipeline invariants:
//! confidence levels never decrease, and consumed text plus the remaining
//! `temp_address` always reconstructs the original input.

use crate::text::NormalizedText;
use abrg_common::{Error, Result};
use serde::Serialize;

/// Which addressing schemes a request wants resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchTarget {
    /// Try residential numbering first, fall back to parcel
    #[default]
    All,
    /// Residential block/display numbering only
    Residential,
    /// Cadastral parcel numbering only
    Parcel,
}

impl std::str::FromStr for SearchTarget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(Self::All),
            "residential" => Ok(Self::Residential),
            "parcel" => Ok(Self::Parcel),
            other => Err(Error::InvalidInput(format!("unknown search target: {other}"))),
        }
    }
}

/// One geocoding request
#[derive(Debug, Clone, Serialize)]
pub struct GeocodeInput {
    /// Free-form address text
    pub address: String,
    /// Which addressing schemes to resolve
    pub target: SearchTarget,
    /// Optional wildcard character matching any single character during
    /// prefix comparison, uniformly across all hierarchy stages
    pub fuzzy: Option<char>,
    /// Opaque client tag echoed on the output record
    pub tag: Option<String>,
}

impl GeocodeInput {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            target: SearchTarget::All,
            fuzzy: None,
            tag: None,
        }
    }

    pub fn with_target(mut self, target: SearchTarget) -> Self {
        self.target = target;
        self
    }

    pub fn with_fuzzy(mut self, fuzzy: char) -> Self {
        self.fuzzy = Some(fuzzy);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Reject malformed requests before the pipeline starts.
    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            return Err(Error::InvalidInput("empty address".into()));
        }
        if let Some(c) = self.fuzzy {
            if c.is_ascii_digit() || c == crate::text::DASH || c == crate::text::SPACE {
                return Err(Error::InvalidInput(format!(
                    "unusable fuzzy wildcard: {c:?}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for GeocodeInput {
    fn default() -> Self {
        Self::new("")
    }
}

/// Ordinal confidence for how deep into the administrative hierarchy the
/// input text was resolved. Never decreases across stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchLevel {
    #[default]
    Unknown,
    Prefecture,
    City,
    Ward,
    /// Town/oaza resolved
    MachiAza,
    /// Chōme or koaza resolved under the oaza
    MachiAzaDetail,
    /// Residential block number resolved
    ResidentialBlock,
    /// Residential display number or cadastral parcel resolved
    ResidentialDetail,
}

/// Ordinal confidence for the precision of the attached representative
/// coordinate. Independent of [`MatchLevel`]; never decreases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateLevel {
    #[default]
    Unknown,
    Prefecture,
    City,
    MachiAza,
    /// Block, residential display, or parcel representative point
    Detail,
}

/// Canonical output address and match score
#[derive(Debug, Clone, Serialize)]
pub struct FormattedAddress {
    pub address: String,
    /// Fraction of the normalized input that was matched, in [0, 1]
    pub score: f64,
}

/// The single evolving match hypothesis for one request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Query {
    pub input: GeocodeInput,

    /// Residual unmatched text; each stage removes a consumed prefix
    #[serde(skip_serializing)]
    pub temp_address: NormalizedText,

    /// Original text of every consumed prefix, in consumption order
    pub consumed: String,

    /// Normalized length of the whole input, fixed at normalization time
    pub total_normalized: usize,
    /// Normalized characters consumed so far
    pub consumed_normalized: usize,

    /// Prefecture ordinal (lg_code prefix) once the prefecture is known
    pub pref_key: Option<u8>,
    /// Municipality code
    pub lg_code: Option<String>,
    /// Town/oaza code within the municipality
    pub machiaza_id: Option<String>,

    pub pref: Option<String>,
    pub county: Option<String>,
    pub city: Option<String>,
    pub ward: Option<String>,
    pub oaza_cho: Option<String>,
    pub chome: Option<String>,
    pub koaza: Option<String>,

    /// Residential block: dataset id and printed number
    pub block_id: Option<String>,
    pub block_num: Option<String>,
    /// Residential display number (and secondary number)
    pub rsdt_id: Option<String>,
    pub rsdt_num: Option<String>,
    pub rsdt2_id: Option<String>,
    pub rsdt_num2: Option<String>,
    /// Cadastral parcel: dataset id and printed number
    pub prc_id: Option<String>,
    pub prc_num: Option<String>,

    /// 1 when the resolved machiaza uses residential numbering, 0 for parcel
    pub rsdt_addr_flg: Option<u8>,

    pub rep_lat: Option<f64>,
    pub rep_lon: Option<f64>,

    pub match_level: MatchLevel,
    pub coordinate_level: CoordinateLevel,

    /// Set once by the result stage
    pub formatted: Option<FormattedAddress>,
}

impl Query {
    pub fn new(input: GeocodeInput) -> Self {
        Self {
            input,
            ..Default::default()
        }
    }

    /// Consume `n` normalized characters from the head of the residual
    /// text, moving their original form onto the consumed buffer.
    pub fn consume(&mut self, n: usize) {
        let original = self.temp_address.take_prefix(n);
        self.consumed.push_str(&original);
        self.consumed_normalized += n;
    }

    /// Raise the hierarchy confidence; lowering is a no-op.
    pub fn raise_match_level(&mut self, level: MatchLevel) {
        if level > self.match_level {
            self.match_level = level;
        }
    }

    /// Attach a representative point when it is finer than what is known.
    /// Missing coordinates on the source row leave the query untouched.
    pub fn set_coordinates(
        &mut self,
        lat: Option<f64>,
        lon: Option<f64>,
        level: CoordinateLevel,
    ) {
        if level <= self.coordinate_level {
            return;
        }
        if let (Some(lat), Some(lon)) = (lat, lon) {
            self.rep_lat = Some(lat);
            self.rep_lon = Some(lon);
            self.coordinate_level = level;
        }
    }

    /// Normalized characters still unmatched
    pub fn remaining_chars(&self) -> Vec<char> {
        self.temp_address.as_chars()
    }
}
