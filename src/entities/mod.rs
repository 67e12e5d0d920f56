//! `SeaORM` entities, one module per table.

pub mod game;
pub mod game_platform;
pub mod game_review;
pub mod genre;
pub mod owned;
pub mod platform;
pub mod user;
pub mod wishlist;
