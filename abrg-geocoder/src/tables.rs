//! Administrative reference tables
//!
//! Read-only, memory-resident lookup sets: one row type per hierarchy
//! level, loaded once per [`crate::Geocoder`] from the storage provider and
//! shared immutably across every pipeline instance. Rows are never mutated
//! after load; identical place names across prefectures stay distinct via
//! their `lg_code`.

use crate::provider::ReferenceDataProvider;
use abrg_common::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Prefecture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefRow {
    /// Prefecture-level lg_code (e.g. "130001" for Tokyo)
    pub lg_code: String,
    pub pref: String,
    pub rep_lat: Option<f64>,
    pub rep_lon: Option<f64>,
}

/// County + city pair, for rows that belong to a county
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountyCityRow {
    pub lg_code: String,
    pub pref: String,
    pub county: String,
    pub city: String,
    pub rep_lat: Option<f64>,
    pub rep_lon: Option<f64>,
}

/// Municipality, optionally with a ward of a designated city.
///
/// Plain cities carry an empty `ward`; ward rows carry the ward-level
/// lg_code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityWardRow {
    pub lg_code: String,
    pub pref: String,
    pub city: String,
    pub ward: String,
    pub rep_lat: Option<f64>,
    pub rep_lon: Option<f64>,
}

/// Ward + oaza pair, for addresses that omit the city name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WardOazaRow {
    pub lg_code: String,
    pub machiaza_id: String,
    pub pref: String,
    pub city: String,
    pub ward: String,
    pub oaza_cho: String,
    pub rep_lat: Option<f64>,
    pub rep_lon: Option<f64>,
}

/// Ward of a designated city
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WardRow {
    pub lg_code: String,
    pub pref: String,
    pub city: String,
    pub ward: String,
    pub rep_lat: Option<f64>,
    pub rep_lon: Option<f64>,
}

/// Town under one of Tokyo's 23 special wards
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tokyo23TownRow {
    pub lg_code: String,
    pub machiaza_id: String,
    pub ward: String,
    pub oaza_cho: String,
    /// Chōme name as printed ("一丁目"), empty when the town has none
    pub chome: String,
    pub rsdt_addr_flg: u8,
    pub rep_lat: Option<f64>,
    pub rep_lon: Option<f64>,
}

/// One of Tokyo's 23 special wards: modeled as a ward, behaves as a city
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tokyo23WardRow {
    pub lg_code: String,
    pub ward: String,
    pub rep_lat: Option<f64>,
    pub rep_lon: Option<f64>,
}

/// Oaza/chōme/koaza row within a municipality
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OazaChoRow {
    pub lg_code: String,
    pub machiaza_id: String,
    pub oaza_cho: String,
    /// Chōme name as printed, empty when absent
    pub chome: String,
    /// Koaza name, empty when absent
    pub koaza: String,
    pub rsdt_addr_flg: u8,
    pub rep_lat: Option<f64>,
    pub rep_lon: Option<f64>,
}

/// Immutable snapshot of every reference set, loaded once at startup.
#[derive(Debug, Default)]
pub struct ReferenceTables {
    pub prefs: Vec<PrefRow>,
    pub county_cities: Vec<CountyCityRow>,
    pub city_wards: Vec<CityWardRow>,
    pub ward_oazas: Vec<WardOazaRow>,
    pub wards: Vec<WardRow>,
    pub tokyo23_towns: Vec<Tokyo23TownRow>,
    pub tokyo23_wards: Vec<Tokyo23WardRow>,
    pub oaza_chomes: Vec<OazaChoRow>,
}

impl ReferenceTables {
    /// Load every reference set from the provider. Called once per
    /// geocoder lifetime; a provider failure here is fatal for startup.
    pub async fn load(provider: &dyn ReferenceDataProvider) -> Result<Self> {
        let started = std::time::Instant::now();
        let tables = Self {
            prefs: provider.pref_list().await?,
            county_cities: provider.county_and_city_list().await?,
            city_wards: provider.city_and_ward_list().await?,
            ward_oazas: provider.ward_and_oaza_list().await?,
            wards: provider.wards().await?,
            tokyo23_towns: provider.tokyo23_towns().await?,
            tokyo23_wards: provider.tokyo23_wards().await?,
            oaza_chomes: provider.oaza_chomes().await?,
        };
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            prefs = tables.prefs.len(),
            municipalities = tables.county_cities.len() + tables.city_wards.len(),
            oaza_chomes = tables.oaza_chomes.len(),
            "reference tables loaded"
        );
        Ok(tables)
    }
}
