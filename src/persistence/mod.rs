//! Durable preference store backed by `SQLite`.

pub mod db;
pub mod preference_repo;
