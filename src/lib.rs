// Library exports for photofeed
// The binary and integration tests both go through these modules

pub mod config;
pub mod db;
pub mod error;
pub mod password;
pub mod repository;
