//! Source-text locator.
//!
//! - [`file`]: find a target file under the project root
//! - [`call`]: recognized `fieldName(fontSize±N)` patterns
//! - [`site`]: pair markers with calls inside one file
//! - [`scan`]: whole-project component records
//! - [`context`]: source context around requested lines

pub mod call;
pub mod context;
pub mod file;
pub mod scan;
pub mod site;

pub use call::{CallMatcher, DEFAULT_FIELD_NAMES};
pub use context::{ContextError, ShowReport, show_context};
pub use file::find_file;
pub use scan::{ComponentRecord, ElementRecord, ScanReport, scan_project};
pub use site::{Analysis, MatchType, Site, analyze};
