pub mod bar_provider;
pub mod prediction;
pub mod retry;
pub mod yahoo;
