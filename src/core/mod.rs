/*!
# Core Module

Core functionality shared by the parser, loader and analyzers:
error handling and BOM-aware file reading.
*/

pub mod errors;
pub mod fs_utils;

pub use errors::{ModelError, ModelResult};
pub use fs_utils::{decode_tmdl_bytes, read_tmdl_file};
