//! Storage collaborator contract
//!
//! The pipeline consumes storage exclusively through these traits. Concrete
//! backends (an embedded file engine, a remote edge database) live outside
//! this crate and implement them; the core never knows which one it holds.
//!
//! Reference sets load once per provider lifetime. Per-municipality
//! datasets are opened lazily by `lg_code` and may legitimately be absent
//! (`Ok(None)`), which locator stages treat as no-match. A hard
//! connectivity or corruption failure is an `Err` and fails the current
//! request only.

use crate::tables::{
    CityWardRow, CountyCityRow, OazaChoRow, PrefRow, Tokyo23TownRow, Tokyo23WardRow, WardOazaRow,
    WardRow,
};
use abrg_common::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Residential block row from a per-municipality dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RsdtBlkRow {
    pub blk_id: String,
    /// Printed block number ("1" in "1-3")
    pub blk_num: String,
    pub rep_lat: Option<f64>,
    pub rep_lon: Option<f64>,
}

/// Residential display-number row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RsdtDspRow {
    pub rsdt_id: String,
    /// Printed display number ("3" in "1-3")
    pub rsdt_num: String,
    /// Secondary number, empty when absent
    pub rsdt2_id: String,
    pub rsdt_num2: String,
    pub rep_lat: Option<f64>,
    pub rep_lon: Option<f64>,
}

/// Cadastral parcel row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParcelRow {
    pub prc_id: String,
    /// Printed parcel number components; 2 and 3 empty when absent
    pub prc_num1: String,
    pub prc_num2: String,
    pub prc_num3: String,
    pub rep_lat: Option<f64>,
    pub rep_lon: Option<f64>,
}

/// Prefix-lookup provider over one municipality's residential blocks
#[async_trait]
pub trait RsdtBlkDb: Send + Sync {
    /// All block rows under the given town key
    async fn blocks_by_town(&self, town_key: u64) -> Result<Vec<RsdtBlkRow>>;
}

/// Prefix-lookup provider over one municipality's display numbers
#[async_trait]
pub trait RsdtDspDb: Send + Sync {
    /// All display-number rows under the given block key
    async fn rsdts_by_block(&self, rsdtblk_key: &str) -> Result<Vec<RsdtDspRow>>;
}

/// Prefix-lookup provider over one municipality's parcels
#[async_trait]
pub trait ParcelDb: Send + Sync {
    /// All parcel rows under the given town key
    async fn parcels_by_town(&self, town_key: u64) -> Result<Vec<ParcelRow>>;
}

/// The backend-agnostic storage contract the pipeline depends on.
#[async_trait]
pub trait ReferenceDataProvider: Send + Sync {
    async fn pref_list(&self) -> Result<Vec<PrefRow>>;
    async fn county_and_city_list(&self) -> Result<Vec<CountyCityRow>>;
    async fn city_and_ward_list(&self) -> Result<Vec<CityWardRow>>;
    async fn ward_and_oaza_list(&self) -> Result<Vec<WardOazaRow>>;
    async fn wards(&self) -> Result<Vec<WardRow>>;
    async fn tokyo23_towns(&self) -> Result<Vec<Tokyo23TownRow>>;
    async fn tokyo23_wards(&self) -> Result<Vec<Tokyo23WardRow>>;
    async fn oaza_chomes(&self) -> Result<Vec<OazaChoRow>>;

    /// Open the residential-block dataset for a municipality, or report it
    /// absent. Called at most once per `lg_code` thanks to the dataset
    /// cache.
    async fn open_rsdt_blk_db(&self, lg_code: &str) -> Result<Option<Arc<dyn RsdtBlkDb>>>;

    /// Open the residential display-number dataset for a municipality
    async fn open_rsdt_dsp_db(&self, lg_code: &str) -> Result<Option<Arc<dyn RsdtDspDb>>>;

    /// Open the cadastral parcel dataset for a municipality
    async fn open_parcel_db(&self, lg_code: &str) -> Result<Option<Arc<dyn ParcelDb>>>;
}
