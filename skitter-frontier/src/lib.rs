pub mod config;
pub mod domain;
pub mod error;
pub mod frontier;
pub mod policy;
pub mod record;
pub mod robots;

pub use config::FrontierConfig;
pub use error::FrontierError;
pub use frontier::{Frontier, Order};
pub use record::{UrlIndex, UrlRecord};
pub use robots::{RobotsCache, RobotsPolicy};
