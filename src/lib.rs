pub mod cli;
pub mod config;
mod db;
pub mod embed;
pub mod featdb;
pub mod knn;
pub mod searcher;
pub mod utils;

pub use config::Opts;
pub use featdb::{FeatureDb, ImageFeature};
