//! API route handlers

pub mod documents;
pub mod export;
pub mod health;
pub mod search;
