//! Domain operations of the cookie inventory.
//!
//! Functions take any [`sea_orm::ConnectionTrait`], so callers decide the
//! transaction boundary.

pub mod catalog;
pub mod cookies;
pub mod shrinkage;
