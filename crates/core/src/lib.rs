pub mod config;
pub mod error;
pub mod run;

pub use config::Config;
pub use error::*;
pub use run::*;
