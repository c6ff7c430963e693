// Pipeline processing: normalization, naming, conflation, remediation, validation and tagging

pub mod conflation;
pub mod enrich;
pub mod normalize;
pub mod quality_gate;
pub mod remediate;
pub mod standardize;
