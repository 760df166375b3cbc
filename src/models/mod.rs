//! Core data models for the bucket browser.
//!
//! `object` holds what the storage backend hands out (listing entries and
//! streamed objects); `listing` holds the request we send to it and the JSON
//! shape we send to clients.

pub mod listing;
pub mod object;
