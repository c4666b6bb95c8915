pub mod carving;
pub mod checks;
pub mod config;
pub mod error;
pub mod formats;
pub mod io;
pub mod signatures;
pub mod types;

pub use carving::{CarvedFile, Carver, ScanReport, ScanStats};
pub use checks::{DataCheckStatus, ExactSizeCheck, FileCheckOutcome, SizeBoundedFileCheck};
pub use config::ScanConfig;
pub use error::{CarveError, Rejection, Result};
pub use formats::{DbHeader, identify, identify_into};
pub use signatures::{DispatchPolicy, IdentifyFn, Signature, SignatureRegistry};
pub use types::{FormatDescriptor, Offset, ProbeMode, SizeCheckStrategy, Variant};
