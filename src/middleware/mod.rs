// Middleware shared by all routes

pub mod cors;

pub use cors::*;
