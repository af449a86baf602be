//! Scan domain layer

pub mod error;
pub mod scan;
pub mod summary;
pub mod transport;

pub use error::{ScanError, TransportError};
pub use scan::{CodeArtifactId, Scan, ScanStatus, ScanTransitionError};
pub use summary::ScanSummary;
pub use transport::ScanTransport;
