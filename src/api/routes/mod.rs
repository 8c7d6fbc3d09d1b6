//! API Routes
//!
//! Route handlers organized by functionality.

pub mod activity;
pub mod groups;
pub mod health;
