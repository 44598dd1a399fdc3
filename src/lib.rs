//! Swipe-to-label review server.
//!
//! A reviewer is shown one image at a time for an attitude together with the
//! value a model predicted for it, and swipes to mark that value correct or
//! wrong. This crate holds the session engine that decides what to show next
//! and records judgments, plus the thin HTTP layer around it.

pub mod api;
pub mod catalog;
pub mod config;
pub mod corpus;
pub mod db;
pub mod error;
pub mod models;
pub mod session;
