//! The prediction request path: validate, assemble, predict, format.

use metrics::histogram;
use serde::Serialize;
use std::slice;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::PricingConfig;
use crate::display::format_currency;
use crate::error::PredictorError;
use crate::features::{CarInput, FeatureRecord, FeatureSchema};
use crate::model::ModelCache;

/// A priced submission.
#[derive(Serialize, Debug, Clone)]
pub struct Quote {
    pub predicted_price: f64,
    /// Human readable price, e.g. "PKR 1,500,000"
    pub display: String,
    pub schema: &'static str,
    pub features: FeatureRecord,
}

pub struct PriceService {
    cache: ModelCache,
    schema: FeatureSchema,
    reference_year: i32,
    currency: String,
}

impl PriceService {
    pub fn new(cache: ModelCache, schema: FeatureSchema, pricing: &PricingConfig) -> Self {
        Self {
            cache,
            schema,
            reference_year: pricing.reference_year,
            currency: pricing.currency.clone(),
        }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn model_loaded(&self) -> bool {
        self.cache.is_loaded()
    }

    /// Loads the model now instead of on the first submission.
    pub fn warm_up(&self) -> Result<(), PredictorError> {
        self.cache.get().map(|_| ())
    }

    /// Prices one car.
    ///
    /// Input problems come back as [`PredictorError::Validation`] before the
    /// model is touched. Any failure after that point is reported with the
    /// underlying error text.
    pub fn quote(&self, input: &CarInput) -> Result<Quote, PredictorError> {
        let record = FeatureRecord::assemble(input, self.reference_year)?;
        let row = record.to_row(&self.schema)?;

        let predictor = self.cache.get()?;
        if predictor.schema() != &self.schema {
            return Err(PredictorError::SchemaMismatch {
                expected: self.schema.tag().to_string(),
                found: predictor.schema().tag().to_string(),
            });
        }

        let start = Instant::now();
        let prices = predictor.predict(slice::from_ref(&row))?;
        histogram!("carprice_inference_seconds").record(start.elapsed().as_secs_f64());

        let predicted_price = prices
            .first()
            .copied()
            .ok_or_else(|| PredictorError::Inference("model returned no prediction".to_string()))?;
        if !predicted_price.is_finite() {
            return Err(PredictorError::Inference(format!(
                "model returned a non-finite prediction ({})",
                predicted_price
            )));
        }
        debug!(row = ?row, "Priced feature row");

        let display = format_currency(predicted_price, &self.currency);
        info!(
            brand = %record.brand,
            model = %record.model,
            year = record.year,
            price = predicted_price,
            "Prediction served"
        );

        Ok(Quote {
            predicted_price,
            display,
            schema: self.schema.tag(),
            features: record,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::features::{FeatureRow, SchemaVersion};
    use crate::model::PricePredictor;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Returns a fixed price and remembers what it was asked.
    pub(crate) struct StubPredictor {
        pub schema: FeatureSchema,
        pub price: f64,
        pub calls: AtomicUsize,
        pub fail: AtomicBool,
        pub last_rows: Mutex<Vec<FeatureRow>>,
    }

    impl StubPredictor {
        pub(crate) fn new(version: SchemaVersion, price: f64) -> Arc<Self> {
            Arc::new(Self {
                schema: FeatureSchema::for_version(version),
                price,
                calls: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
                last_rows: Mutex::new(Vec::new()),
            })
        }
    }

    impl PricePredictor for StubPredictor {
        fn schema(&self) -> &FeatureSchema {
            &self.schema
        }

        fn predict(&self, rows: &[FeatureRow]) -> Result<Vec<f64>, PredictorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_rows.lock().unwrap() = rows.to_vec();
            if self.fail.load(Ordering::SeqCst) {
                return Err(PredictorError::Inference(
                    "columns are missing: {'Age'}".to_string(),
                ));
            }
            Ok(vec![self.price; rows.len()])
        }
    }

    pub(crate) fn service_with(stub: Arc<StubPredictor>, version: SchemaVersion) -> PriceService {
        let cache = ModelCache::new(Duration::from_secs(3600), move || {
            Ok(stub.clone() as Arc<dyn PricePredictor>)
        });
        PriceService::new(
            cache,
            FeatureSchema::for_version(version),
            &PricingConfig::default(),
        )
    }

    pub(crate) fn toyota() -> CarInput {
        CarInput {
            brand: "Toyota".to_string(),
            condition: "Used".to_string(),
            fuel: "Petrol".to_string(),
            model: "Corolla Altis".to_string(),
            registered_city: "Karachi".to_string(),
            year: 2018,
            kms_driven: 50_000,
            price: Some(1_500_000.0),
            transaction_type: Some("Cash".to_string()),
        }
    }

    #[test]
    fn test_quote_formats_stub_price() {
        let stub = StubPredictor::new(SchemaVersion::Full, 2_345_678.4);
        let service = service_with(stub.clone(), SchemaVersion::Full);

        let quote = service.quote(&toyota()).unwrap();
        assert_eq!(quote.predicted_price, 2_345_678.4);
        assert_eq!(quote.display, "PKR 2,345,678");
        assert_eq!(quote.schema, "car-price/full-v1");
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_quote_sends_single_assembled_row() {
        let stub = StubPredictor::new(SchemaVersion::Full, 1.0);
        let service = service_with(stub.clone(), SchemaVersion::Full);

        let quote = service.quote(&toyota()).unwrap();
        assert_eq!(quote.features.age, 7);
        assert_eq!(quote.features.price_per_km, 30.0);

        let rows = stub.last_rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), 11);
        assert_eq!(rows[0].get("Age"), Some(&crate::features::FeatureValue::Int(7)));
    }

    #[test]
    fn test_blank_model_name_never_reaches_model() {
        let stub = StubPredictor::new(SchemaVersion::Full, 1.0);
        let service = service_with(stub.clone(), SchemaVersion::Full);

        let input = CarInput {
            model: "   ".to_string(),
            ..toyota()
        };
        let err = service.quote(&input).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
        assert!(!service.model_loaded());
    }

    #[test]
    fn test_failure_does_not_poison_later_requests() {
        let stub = StubPredictor::new(SchemaVersion::Full, 900_000.0);
        let service = service_with(stub.clone(), SchemaVersion::Full);

        stub.fail.store(true, Ordering::SeqCst);
        let err = service.quote(&toyota()).unwrap_err();
        assert!(!err.is_validation());
        assert!(err.to_string().contains("columns are missing: {'Age'}"));

        stub.fail.store(false, Ordering::SeqCst);
        let quote = service.quote(&toyota()).unwrap();
        assert_eq!(quote.display, "PKR 900,000");
    }

    #[test]
    fn test_schema_mismatch_fails_before_predict() {
        let stub = StubPredictor::new(SchemaVersion::Compact, 1.0);
        let service = service_with(stub.clone(), SchemaVersion::Full);

        match service.quote(&toyota()) {
            Err(PredictorError::SchemaMismatch { expected, found }) => {
                assert_eq!(expected, "car-price/full-v1");
                assert_eq!(found, "car-price/compact-v1");
            }
            other => panic!("Expected SchemaMismatch, got {:?}", other),
        }
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_non_finite_prediction_is_an_error() {
        let stub = StubPredictor::new(SchemaVersion::Full, f64::NAN);
        let service = service_with(stub, SchemaVersion::Full);

        let err = service.quote(&toyota()).unwrap_err();
        assert!(matches!(err, PredictorError::Inference(_)));
    }

    #[test]
    fn test_load_failure_is_reported() {
        let cache = ModelCache::new(Duration::from_secs(60), || {
            Err(PredictorError::ModelNotFound("car_price_model.onnx".to_string()))
        });
        let service = PriceService::new(
            cache,
            FeatureSchema::for_version(SchemaVersion::Full),
            &PricingConfig::default(),
        );

        let err = service.quote(&toyota()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Model not found at path: car_price_model.onnx"
        );
        assert!(service.warm_up().is_err());
    }
}
