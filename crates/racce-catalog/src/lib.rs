//! Reference catalogs for tracks and car models.
//!
//! The live-state engine looks tracks up by label and car models up by id
//! while it applies server events. It never mutates the catalog; records are
//! handed out as shared [`Arc`]s so every car pointing at the same model
//! shares one allocation.
//!
//! [`StaticCatalog::builtin`] carries the data the server ships with. Tests
//! and embedders can build their own with [`StaticCatalog::new`] or implement
//! [`Catalog`] directly.

pub mod data;

use std::collections::BTreeMap;
use std::sync::Arc;

use racce_types::{CarModel, CarModelId, Track};

/// Read-only lookups the engine performs against reference data.
///
/// Lookups are synchronous and expected to be cheap.
pub trait Catalog: Send + Sync {
    /// Resolve a track from the label the server logs.
    fn track_by_label(&self, label: &str) -> Option<Arc<Track>>;

    /// Resolve a car model from the id the server logs.
    fn car_model_by_id(&self, id: CarModelId) -> Option<Arc<CarModel>>;
}

/// In-memory catalog backed by ordered maps.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    tracks: BTreeMap<String, Arc<Track>>,
    car_models: BTreeMap<CarModelId, Arc<CarModel>>,
}

impl StaticCatalog {
    /// Build a catalog from explicit records.
    ///
    /// Later records with a duplicate label or id replace earlier ones.
    pub fn new(
        tracks: impl IntoIterator<Item = Track>,
        car_models: impl IntoIterator<Item = CarModel>,
    ) -> Self {
        Self {
            tracks: tracks
                .into_iter()
                .map(|track| (track.label.clone(), Arc::new(track)))
                .collect(),
            car_models: car_models
                .into_iter()
                .map(|model| (model.id, Arc::new(model)))
                .collect(),
        }
    }

    /// The catalog of tracks and car models the server ships with.
    pub fn builtin() -> Self {
        let tracks = data::TRACKS.iter().map(|&(label, name, country)| Track {
            label: label.to_owned(),
            name: name.to_owned(),
            country: country.to_owned(),
        });
        let car_models = data::CAR_MODELS.iter().map(|&(id, name, class)| CarModel {
            id: CarModelId::new(id),
            name: name.to_owned(),
            class,
        });
        Self::new(tracks, car_models)
    }

    /// Number of known tracks.
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Number of known car models.
    pub fn car_model_count(&self) -> usize {
        self.car_models.len()
    }
}

impl Catalog for StaticCatalog {
    fn track_by_label(&self, label: &str) -> Option<Arc<Track>> {
        self.tracks.get(label).cloned()
    }

    fn car_model_by_id(&self, id: CarModelId) -> Option<Arc<CarModel>> {
        self.car_models.get(&id).cloned()
    }
}
