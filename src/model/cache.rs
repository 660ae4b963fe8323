use crate::error::PredictorError;
use crate::model::predictor::PricePredictor;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{info, warn};

type Loader = Box<dyn Fn() -> Result<Arc<dyn PricePredictor>, PredictorError> + Send + Sync>;

struct CachedModel {
    predictor: Arc<dyn PricePredictor>,
    loaded_at: Instant,
}

/// Lazily loaded model handle that expires after a fixed freshness window.
///
/// The loader runs while the slot lock is held, so only one caller ever loads
/// at a time. Failed loads are not remembered.
pub struct ModelCache {
    loader: Loader,
    ttl: Duration,
    slot: Mutex<Option<CachedModel>>,
}

impl ModelCache {
    pub fn new<F>(ttl: Duration, loader: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn PricePredictor>, PredictorError> + Send + Sync + 'static,
    {
        Self {
            loader: Box::new(loader),
            ttl,
            slot: Mutex::new(None),
        }
    }

    pub fn get(&self) -> Result<Arc<dyn PricePredictor>, PredictorError> {
        self.get_at(Instant::now())
    }

    /// Returns the cached model if it was loaded less than `ttl` before `now`,
    /// otherwise loads a fresh one.
    pub fn get_at(&self, now: Instant) -> Result<Arc<dyn PricePredictor>, PredictorError> {
        let mut slot = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(cached) = slot.as_ref() {
            if now.saturating_duration_since(cached.loaded_at) < self.ttl {
                return Ok(cached.predictor.clone());
            }
            info!(ttl_secs = self.ttl.as_secs(), "Cached model expired, reloading");
        }

        match (self.loader)() {
            Ok(predictor) => {
                *slot = Some(CachedModel {
                    predictor: predictor.clone(),
                    loaded_at: now,
                });
                Ok(predictor)
            }
            Err(e) => {
                warn!(error = %e, "Model load failed");
                *slot = None;
                Err(e)
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.is_loaded_at(Instant::now())
    }

    /// Whether `get_at(now)` would be served without calling the loader.
    pub fn is_loaded_at(&self, now: Instant) -> bool {
        self.slot
            .lock()
            .map(|slot| {
                slot.as_ref().is_some_and(|cached| {
                    now.saturating_duration_since(cached.loaded_at) < self.ttl
                })
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{FeatureRow, FeatureSchema, SchemaVersion};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed(FeatureSchema);

    impl PricePredictor for Fixed {
        fn schema(&self) -> &FeatureSchema {
            &self.0
        }

        fn predict(&self, rows: &[FeatureRow]) -> Result<Vec<f64>, PredictorError> {
            Ok(vec![1.0; rows.len()])
        }
    }

    fn counting_cache(ttl: Duration) -> (ModelCache, Arc<AtomicUsize>) {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = loads.clone();
        let cache = ModelCache::new(ttl, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(Fixed(FeatureSchema::for_version(SchemaVersion::Full)))
                as Arc<dyn PricePredictor>)
        });
        (cache, loads)
    }

    #[test]
    fn test_loads_lazily() {
        let (cache, loads) = counting_cache(Duration::from_secs(60));
        assert!(!cache.is_loaded());
        assert_eq!(loads.load(Ordering::SeqCst), 0);

        cache.get().unwrap();
        assert!(cache.is_loaded());
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reuses_model_within_ttl() {
        let (cache, loads) = counting_cache(Duration::from_secs(60));
        let start = Instant::now();

        let first = cache.get_at(start).unwrap();
        let second = cache.get_at(start + Duration::from_secs(59)).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reloads_after_ttl() {
        let (cache, loads) = counting_cache(Duration::from_secs(60));
        let start = Instant::now();

        let first = cache.get_at(start).unwrap();
        let second = cache.get_at(start + Duration::from_secs(60)).unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_expired_model_is_not_reported_loaded() {
        let (cache, loads) = counting_cache(Duration::from_secs(60));
        let start = Instant::now();

        cache.get_at(start).unwrap();
        assert!(cache.is_loaded_at(start + Duration::from_secs(59)));
        assert!(!cache.is_loaded_at(start + Duration::from_secs(60)));
        assert!(!cache.is_loaded_at(start + Duration::from_secs(3600)));

        // Checking freshness never loads.
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let cache = ModelCache::new(Duration::from_secs(60), move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(PredictorError::ModelNotFound("car.onnx".to_string()))
            } else {
                Ok(Arc::new(Fixed(FeatureSchema::for_version(SchemaVersion::Full)))
                    as Arc<dyn PricePredictor>)
            }
        });

        assert!(matches!(cache.get(), Err(PredictorError::ModelNotFound(_))));
        assert!(!cache.is_loaded());

        assert!(cache.get().is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
