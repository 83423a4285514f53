pub mod access;
pub mod auth;
pub mod config;
pub mod handlers;
pub mod models;
pub mod payments;
pub mod qr;
pub mod routes;
pub mod state;
pub mod store;
pub mod utils;

#[cfg(test)]
mod test_support;
