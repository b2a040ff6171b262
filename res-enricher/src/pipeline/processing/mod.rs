// Pipeline processing: geography resolution, normalization, enrichment

pub mod analytics;
pub mod enrich;
pub mod geography;
pub mod normalize;
