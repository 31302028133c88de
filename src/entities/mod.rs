pub mod cookie;
pub mod cookie_batch;
pub mod cookie_shrinkage;
pub mod packaging_type;
pub mod recipe;
