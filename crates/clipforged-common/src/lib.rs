//! Clipforged-Common: types shared by the clipforged crates.
//!
//! - **Result envelope**: [`OperationResult`], the camelCase JSON shape every
//!   operation returns
//! - **Upload store**: filename sanitization and the flat working directory
//! - **Path utilities**: media detection by extension
//!
//! # Examples
//!
//! ```
//! use clipforged_common::{sanitize_filename, OperationResult};
//!
//! let name = sanitize_filename("Holiday Clip.MOV");
//! let result = OperationResult::ok("Stored upload").with_output_file(name);
//! assert_eq!(result.output_file.as_deref(), Some("holiday-clip.mov"));
//! ```

pub mod envelope;
pub mod error;
pub mod paths;
pub mod uploads;

pub use envelope::OperationResult;
pub use error::{Error, Result};
pub use uploads::{sanitize_filename, StoredFile, UploadStore, DEFAULT_WORK_DIR, FALLBACK_NAME};
