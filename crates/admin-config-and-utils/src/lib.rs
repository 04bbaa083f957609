//! Configuration, paths, and logging setup for the carrier admin tools.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{Config, DEFAULT_PAGE_SIZE, DEFAULT_SUPABASE_PUBLISHABLE_KEY, DEFAULT_SUPABASE_URL};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;
