pub mod workdir;

pub use workdir::{is_directory_name, WorkDir};
