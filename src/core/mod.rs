pub mod calculator;
pub mod cart;
pub mod catalog;
pub mod engine;
pub mod form;
pub mod render;

pub use crate::domain::model::{CatalogItem, LineResult, OrderResult, RequestedLine};
pub use crate::domain::ports::{CatalogSource, ConfigProvider, Storage};
pub use crate::utils::error::Result;
