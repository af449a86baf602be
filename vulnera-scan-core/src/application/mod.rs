//! Scan orchestration layer

pub mod artifact_scanner;
pub mod await_scan;
pub mod scan_operation;
pub mod shared_result;

pub use artifact_scanner::ArtifactScanner;
pub use await_scan::AwaitScan;
pub use scan_operation::ScanOperation;
pub use shared_result::SharedResult;
