//! Geocoder driver
//!
//! Owns the immutable reference-table snapshot, the per-stage tries, the
//! lazy dataset caches, and the ordered stage chain. One `Geocoder` serves
//! many concurrent requests; each request owns its own [`Query`] and walks
//! the chain in a plain loop, so there is no intra-request concurrency and
//! no shared mutable state beyond the dataset caches.

use crate::cache::DatasetCache;
use crate::provider::{ParcelDb, ReferenceDataProvider, RsdtBlkDb, RsdtDspDb};
use crate::query::{GeocodeInput, Query};
use crate::steps::{
    ChomeStep, CityAndWardStep, CountyAndCityStep, GeocodeStep, KoazaStep, NormalizeStep,
    OazaChomeStep, ParcelStep, PrefStep, RegexStep, ResultStep, RsdtBlkStep, RsdtDspStep,
    Tokyo23TownStep, Tokyo23WardStep, WardAndOazaStep, WardStep,
};
use crate::tables::ReferenceTables;
use abrg_common::Result;
use std::sync::Arc;
use tracing::{debug, info};

/// The address-resolution pipeline.
pub struct Geocoder {
    tables: Arc<ReferenceTables>,
    steps: Vec<Box<dyn GeocodeStep>>,
}

impl Geocoder {
    /// Load the reference snapshot from the provider and assemble the
    /// stage chain. Called once; the geocoder is then shared by reference
    /// across requests.
    pub async fn new(provider: Arc<dyn ReferenceDataProvider>) -> Result<Self> {
        let started = std::time::Instant::now();
        let tables = Arc::new(ReferenceTables::load(provider.as_ref()).await?);

        let blk_cache: Arc<DatasetCache<dyn RsdtBlkDb>> = Arc::new(DatasetCache::new());
        let dsp_cache: Arc<DatasetCache<dyn RsdtDspDb>> = Arc::new(DatasetCache::new());
        let parcel_cache: Arc<DatasetCache<dyn ParcelDb>> = Arc::new(DatasetCache::new());

        let steps: Vec<Box<dyn GeocodeStep>> = vec![
            Box::new(NormalizeStep),
            Box::new(PrefStep::new(&tables)),
            Box::new(CountyAndCityStep::new(&tables)),
            Box::new(CityAndWardStep::new(&tables)),
            Box::new(WardAndOazaStep::new(&tables)),
            Box::new(WardStep::new(&tables)),
            Box::new(Tokyo23TownStep::new(&tables)),
            Box::new(Tokyo23WardStep::new(&tables)),
            Box::new(OazaChomeStep::new(&tables)),
            Box::new(ChomeStep::new(&tables)),
            Box::new(KoazaStep::new(&tables)),
            Box::new(RsdtBlkStep::new(provider.clone(), blk_cache)),
            Box::new(RsdtDspStep::new(provider.clone(), dsp_cache)),
            Box::new(ParcelStep::new(provider.clone(), parcel_cache)),
            Box::new(RegexStep),
            Box::new(ResultStep),
        ];

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            stages = steps.len(),
            "geocoder initialized"
        );
        Ok(Self { tables, steps })
    }

    /// The reference snapshot this geocoder was built from
    pub fn tables(&self) -> &ReferenceTables {
        &self.tables
    }

    /// Resolve one address: one query in, one finalized record out.
    pub async fn geocode(&self, input: GeocodeInput) -> Result<Query> {
        input.validate()?;
        let mut query = Query::new(input);
        for step in &self.steps {
            query = step.apply(query).await?;
            debug!(
                step = step.name(),
                match_level = ?query.match_level,
                remaining = query.temp_address.len(),
                "stage applied"
            );
        }
        Ok(query)
    }

    /// Resolve one address and hand the finalized record to a consumer.
    pub async fn geocode_with<F>(&self, input: GeocodeInput, consumer: F) -> Result<()>
    where
        F: FnOnce(Query),
    {
        let query = self.geocode(input).await?;
        consumer(query);
        Ok(())
    }
}
