//! Path utilities.
//!
//! - [`fs`]: project root resolution (`~` expansion, lexical `..` folding)
//! - [`hint`]: `file:line` path hints carried by element records

pub mod fs;
pub mod hint;

pub use fs::resolve_root;
pub use hint::PathHint;
