pub mod extraction;
pub mod models;
