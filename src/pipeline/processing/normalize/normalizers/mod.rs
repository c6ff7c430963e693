// Base trait and utilities for source-specific normalizers
pub mod base;

// Individual normalizer implementations
pub mod database_export;
pub mod initial_catalog;
pub mod regional;

pub use base::{BaseNormalizer, NormalizerUtils, SourceNormalizer};
pub use database_export::DatabaseExportNormalizer;
pub use initial_catalog::InitialCatalogNormalizer;
pub use regional::RegionalNormalizer;
