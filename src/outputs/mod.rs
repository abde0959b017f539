//! Export of the merged collection result.
//!
//! # Submodules
//!
//! - [`xlsx`]: the spreadsheet, one sheet per record kind
//! - [`json`]: optional JSON copy of the same rows (`--json`)
//! - [`summary`]: text summary and bar chart printed at the end of a run
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── collection_20251125_090507.xlsx
//! └── collection_20251125_090507.json   # with --json
//! ```

pub mod json;
pub mod summary;
pub mod xlsx;
