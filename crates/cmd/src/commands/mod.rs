pub mod scan;

pub use scan::{ScanArgs, scan_command};
