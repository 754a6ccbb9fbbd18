//! Migration pipeline for moving the application from Firebase to Supabase.
//!
//! The pipeline is strictly sequential: each user, document, and column
//! operation is awaited to completion before the next begins. Per-record
//! failures are collected into outcomes and never abort the batch;
//! per-collection failures are recorded and the batch continues with the
//! next mapping. Only configuration errors and unhandled top-level errors
//! are fatal.

pub mod auth;
pub mod config;
pub mod data;
pub mod env_file;
pub mod executor;
pub mod report;
pub mod schema;
pub mod transform;
