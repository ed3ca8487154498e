pub mod extract;
pub mod health;
pub mod models;
pub mod page;
