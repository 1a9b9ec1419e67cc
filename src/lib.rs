pub mod bot;
pub mod config;
pub mod domain_age;
pub mod error;
pub mod features;
pub mod model;
pub mod system;
pub mod trainer;

pub use config::Config;
pub use domain_age::DomainAgeChecker;
pub use error::PhishguardError;
pub use features::{FeatureExtractor, UrlFeatures, FEATURE_COLUMNS};
pub use model::{PhishingModel, Verdict};
