pub mod cache;
pub mod loader;
pub mod predictor;

pub use cache::ModelCache;
pub use predictor::PricePredictor;
