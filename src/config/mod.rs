pub mod config;
pub mod store;

pub use config::{AnnotateConfig, AnnotateConfigBuilder, CustomColorMap};
pub use store::{load_config_file, save_config_file, write_default_config_file};
