pub mod rate_limit;
mod server;

pub use server::{AppState, routes, run_server};
