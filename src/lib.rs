pub mod config;
pub mod server;
pub mod status;

pub use crate::config::{Config, Endpoints};
pub use crate::server::{run, ServerError};
