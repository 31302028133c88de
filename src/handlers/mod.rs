pub mod galletas;

pub use crate::AppState;
