// src/db/models/mod.rs

//! Data models for registry tables

mod recipe;
mod user;

pub use recipe::Recipe;
pub use user::{Session, User};
