//! Game marketplace REST API.
//!
//! Users register and log in with opaque session tokens, publish games, browse a filtered and
//! paginated catalogue, keep wishlists and owned lists, upload images and review games.

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod query;
pub mod routes;
pub mod state;
pub mod storage;
