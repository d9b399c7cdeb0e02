pub mod aggregate;
pub mod chart;
pub mod csv_codec;
pub mod day;
pub mod db;
pub mod models;
pub mod service;
pub mod settings;
