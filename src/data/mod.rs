pub mod data;
pub mod progress;
pub mod report;

pub use data::{Data, DataState};
pub use progress::{NoProgress, Progress};
pub use report::{DeployReport, RegisterReport};
