//! Shared test fixtures: an in-memory storage provider with a small but
//! realistic slice of the address base registry.
//!
//! Fixture geography:
//! - 東京都千代田区紀尾井町 (tokyo23 town, residential blocks 1..3)
//! - 東京都府中市宮町一/二丁目 (chōme rows, no per-municipality datasets)
//! - 広島県安芸郡府中町大通 (county town, parcel numbering, parcel dataset)
//! - 広島県府中市 (duplicate city name against Tokyo's 府中市)
//! - 大阪府大阪市北区梅田 (designated city, ward+oaza form)

use abrg_common::{keys, Error, Result};
use abrg_geocoder::provider::{
    ParcelDb, ParcelRow, ReferenceDataProvider, RsdtBlkDb, RsdtBlkRow, RsdtDspDb, RsdtDspRow,
};
use abrg_geocoder::tables::{
    CityWardRow, CountyCityRow, OazaChoRow, PrefRow, ReferenceTables, Tokyo23TownRow,
    Tokyo23WardRow, WardOazaRow, WardRow,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Install the test log subscriber; later calls are no-ops. Run tests with
/// RUST_LOG=abrg_geocoder=debug to see the per-stage trace.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn pref_rows() -> Vec<PrefRow> {
    let row = |lg: &str, name: &str, lat: f64, lon: f64| PrefRow {
        lg_code: lg.into(),
        pref: name.into(),
        rep_lat: Some(lat),
        rep_lon: Some(lon),
    };
    vec![
        row("130001", "東京都", 35.6895, 139.6917),
        row("340006", "広島県", 34.3966, 132.4596),
        row("270008", "大阪府", 34.6863, 135.5200),
        row("010006", "北海道", 43.0642, 141.3469),
    ]
}

pub fn county_city_rows() -> Vec<CountyCityRow> {
    vec![CountyCityRow {
        lg_code: "343439".into(),
        pref: "広島県".into(),
        county: "安芸郡".into(),
        city: "府中町".into(),
        rep_lat: Some(34.3926),
        rep_lon: Some(132.5039),
    }]
}

pub fn city_ward_rows() -> Vec<CityWardRow> {
    let row = |lg: &str, pref: &str, city: &str, ward: &str, lat: f64, lon: f64| CityWardRow {
        lg_code: lg.into(),
        pref: pref.into(),
        city: city.into(),
        ward: ward.into(),
        rep_lat: Some(lat),
        rep_lon: Some(lon),
    };
    vec![
        row("132063", "東京都", "府中市", "", 35.6690, 139.4777),
        row("342076", "広島県", "府中市", "", 34.5687, 133.2364),
        row("343439", "広島県", "府中町", "", 34.3926, 132.5039),
        row("271004", "大阪府", "大阪市", "", 34.6937, 135.5023),
        row("271276", "大阪府", "大阪市", "北区", 34.7054, 135.5101),
    ]
}

pub fn ward_rows() -> Vec<WardRow> {
    vec![WardRow {
        lg_code: "271276".into(),
        pref: "大阪府".into(),
        city: "大阪市".into(),
        ward: "北区".into(),
        rep_lat: Some(34.7054),
        rep_lon: Some(135.5101),
    }]
}

pub fn ward_oaza_rows() -> Vec<WardOazaRow> {
    vec![WardOazaRow {
        lg_code: "271276".into(),
        machiaza_id: "0001000".into(),
        pref: "大阪府".into(),
        city: "大阪市".into(),
        ward: "北区".into(),
        oaza_cho: "梅田".into(),
        rep_lat: Some(34.7024),
        rep_lon: Some(135.4959),
    }]
}

pub fn tokyo23_ward_rows() -> Vec<Tokyo23WardRow> {
    vec![Tokyo23WardRow {
        lg_code: "131016".into(),
        ward: "千代田区".into(),
        rep_lat: Some(35.6940),
        rep_lon: Some(139.7536),
    }]
}

pub fn tokyo23_town_rows() -> Vec<Tokyo23TownRow> {
    vec![
        Tokyo23TownRow {
            lg_code: "131016".into(),
            machiaza_id: "0056000".into(),
            ward: "千代田区".into(),
            oaza_cho: "紀尾井町".into(),
            chome: String::new(),
            rsdt_addr_flg: 1,
            rep_lat: Some(35.6794),
            rep_lon: Some(139.7368),
        },
        // Deliberately malformed machiaza id: locator stages must degrade
        // to no-match instead of failing the request
        Tokyo23TownRow {
            lg_code: "131016".into(),
            machiaza_id: "9".into(),
            ward: "千代田区".into(),
            oaza_cho: "麹町".into(),
            chome: String::new(),
            rsdt_addr_flg: 1,
            rep_lat: None,
            rep_lon: None,
        },
    ]
}

pub fn oaza_cho_rows() -> Vec<OazaChoRow> {
    let row = |lg: &str, machiaza: &str, oaza: &str, chome: &str, koaza: &str, flg: u8| OazaChoRow {
        lg_code: lg.into(),
        machiaza_id: machiaza.into(),
        oaza_cho: oaza.into(),
        chome: chome.into(),
        koaza: koaza.into(),
        rsdt_addr_flg: flg,
        rep_lat: Some(35.0),
        rep_lon: Some(135.0),
    };
    vec![
        row("131016", "0056000", "紀尾井町", "", "", 1),
        row("132063", "0001001", "宮町", "一丁目", "", 1),
        row("132063", "0001002", "宮町", "二丁目", "", 1),
        row("343439", "0002000", "大通", "", "", 0),
        row("343439", "0002001", "大通", "", "上組", 0),
    ]
}

pub fn fixture_tables() -> ReferenceTables {
    ReferenceTables {
        prefs: pref_rows(),
        county_cities: county_city_rows(),
        city_wards: city_ward_rows(),
        ward_oazas: ward_oaza_rows(),
        wards: ward_rows(),
        tokyo23_towns: tokyo23_town_rows(),
        tokyo23_wards: tokyo23_ward_rows(),
        oaza_chomes: oaza_cho_rows(),
    }
}

pub struct MemBlkDb {
    rows: HashMap<u64, Vec<RsdtBlkRow>>,
}

#[async_trait]
impl RsdtBlkDb for MemBlkDb {
    async fn blocks_by_town(&self, town_key: u64) -> Result<Vec<RsdtBlkRow>> {
        Ok(self.rows.get(&town_key).cloned().unwrap_or_default())
    }
}

pub struct MemDspDb {
    rows: HashMap<String, Vec<RsdtDspRow>>,
}

#[async_trait]
impl RsdtDspDb for MemDspDb {
    async fn rsdts_by_block(&self, rsdtblk_key: &str) -> Result<Vec<RsdtDspRow>> {
        Ok(self.rows.get(rsdtblk_key).cloned().unwrap_or_default())
    }
}

pub struct MemParcelDb {
    rows: HashMap<u64, Vec<ParcelRow>>,
}

#[async_trait]
impl ParcelDb for MemParcelDb {
    async fn parcels_by_town(&self, town_key: u64) -> Result<Vec<ParcelRow>> {
        Ok(self.rows.get(&town_key).cloned().unwrap_or_default())
    }
}

/// In-memory storage provider over the fixture data.
pub struct MockProvider {
    blk_dbs: HashMap<String, Arc<MemBlkDb>>,
    dsp_dbs: HashMap<String, Arc<MemDspDb>>,
    parcel_dbs: HashMap<String, Arc<MemParcelDb>>,
    pub blk_opens: AtomicUsize,
    pub fail_blk_open: AtomicBool,
}

impl MockProvider {
    pub fn new() -> Self {
        let blk_row = |id: &str, num: &str, lat: f64, lon: f64| RsdtBlkRow {
            blk_id: id.into(),
            blk_num: num.into(),
            rep_lat: Some(lat),
            rep_lon: Some(lon),
        };
        let kioicho = keys::town_key("131016", "0056000").expect("fixture town key");
        let mut blk_rows = HashMap::new();
        blk_rows.insert(
            kioicho,
            vec![
                blk_row("001", "1", 35.67945, 139.73684),
                blk_row("002", "2", 35.67950, 139.73700),
                blk_row("003", "3", 35.67960, 139.73720),
            ],
        );

        let dsp_row = |id: &str, num: &str| RsdtDspRow {
            rsdt_id: id.into(),
            rsdt_num: num.into(),
            rsdt2_id: String::new(),
            rsdt_num2: String::new(),
            rep_lat: Some(35.67947),
            rep_lon: Some(139.73690),
        };
        let mut dsp_rows = HashMap::new();
        dsp_rows.insert(
            keys::rsdtblk_key("131016", "0056000", "001").expect("fixture block key"),
            vec![dsp_row("003", "3"), dsp_row("030", "30")],
        );

        let otori = keys::town_key("343439", "0002000").expect("fixture town key");
        let mut parcel_rows = HashMap::new();
        parcel_rows.insert(
            otori,
            vec![ParcelRow {
                prc_id: "000123000040000000".into(),
                prc_num1: "123".into(),
                prc_num2: "4".into(),
                prc_num3: String::new(),
                rep_lat: Some(34.39270),
                rep_lon: Some(132.50400),
            }],
        );

        let mut blk_dbs = HashMap::new();
        blk_dbs.insert("131016".to_string(), Arc::new(MemBlkDb { rows: blk_rows }));
        let mut dsp_dbs = HashMap::new();
        dsp_dbs.insert("131016".to_string(), Arc::new(MemDspDb { rows: dsp_rows }));
        let mut parcel_dbs = HashMap::new();
        parcel_dbs.insert(
            "343439".to_string(),
            Arc::new(MemParcelDb { rows: parcel_rows }),
        );

        Self {
            blk_dbs,
            dsp_dbs,
            parcel_dbs,
            blk_opens: AtomicUsize::new(0),
            fail_blk_open: AtomicBool::new(false),
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReferenceDataProvider for MockProvider {
    async fn pref_list(&self) -> Result<Vec<PrefRow>> {
        Ok(pref_rows())
    }

    async fn county_and_city_list(&self) -> Result<Vec<CountyCityRow>> {
        Ok(county_city_rows())
    }

    async fn city_and_ward_list(&self) -> Result<Vec<CityWardRow>> {
        Ok(city_ward_rows())
    }

    async fn ward_and_oaza_list(&self) -> Result<Vec<WardOazaRow>> {
        Ok(ward_oaza_rows())
    }

    async fn wards(&self) -> Result<Vec<WardRow>> {
        Ok(ward_rows())
    }

    async fn tokyo23_towns(&self) -> Result<Vec<Tokyo23TownRow>> {
        Ok(tokyo23_town_rows())
    }

    async fn tokyo23_wards(&self) -> Result<Vec<Tokyo23WardRow>> {
        Ok(tokyo23_ward_rows())
    }

    async fn oaza_chomes(&self) -> Result<Vec<OazaChoRow>> {
        Ok(oaza_cho_rows())
    }

    async fn open_rsdt_blk_db(&self, lg_code: &str) -> Result<Option<Arc<dyn RsdtBlkDb>>> {
        self.blk_opens.fetch_add(1, Ordering::SeqCst);
        if self.fail_blk_open.load(Ordering::SeqCst) {
            return Err(Error::Provider("block shard unreachable".into()));
        }
        Ok(self
            .blk_dbs
            .get(lg_code)
            .cloned()
            .map(|db| db as Arc<dyn RsdtBlkDb>))
    }

    async fn open_rsdt_dsp_db(&self, lg_code: &str) -> Result<Option<Arc<dyn RsdtDspDb>>> {
        Ok(self
            .dsp_dbs
            .get(lg_code)
            .cloned()
            .map(|db| db as Arc<dyn RsdtDspDb>))
    }

    async fn open_parcel_db(&self, lg_code: &str) -> Result<Option<Arc<dyn ParcelDb>>> {
        Ok(self
            .parcel_dbs
            .get(lg_code)
            .cloned()
            .map(|db| db as Arc<dyn ParcelDb>))
    }
}
