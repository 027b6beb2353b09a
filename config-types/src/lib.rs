mod config;
mod service;
mod version;

pub use config::Config;
pub use service::Service;
pub use version::Version;
