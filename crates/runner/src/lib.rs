pub mod report;
pub mod version;

pub use report::{HostReport, Report, Target, collect_targets};
