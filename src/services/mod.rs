pub mod bar_normalizer;
pub mod ingestion_service;
pub mod moving_average;
pub mod series_aligner;
