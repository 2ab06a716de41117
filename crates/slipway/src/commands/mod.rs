pub mod aurora;
pub mod backup;
pub mod build;
