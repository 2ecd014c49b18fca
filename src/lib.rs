pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, toml_config::TomlConfig};

pub use core::{
    calculator::calculate,
    cart::Cart,
    catalog::Catalog,
    engine::{EngineSettings, OrderEngine},
    form::FormSubmission,
    render::{OrderReceipt, OutputFormat},
};
pub use domain::model::{CatalogItem, LineResult, OrderResult, RequestedLine};
pub use utils::error::{OrderError, Result};
