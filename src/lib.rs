//! GeoBit - Newsletter content management backend
//!
//! An admin-gated API for curating geoscience content sources, summarizing
//! articles with an LLM aggregation service, and assembling and publishing
//! newsletter issues to a subscriber list.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
