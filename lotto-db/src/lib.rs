pub mod models;
pub mod sink;
pub mod table;
