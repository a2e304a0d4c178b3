//! Rendering of the `%files` fragment and build requirements list
//!
//! The fragment is consumed by the external spec writer; nothing here knows
//! about the rest of the spec file.

mod files;

pub use files::{
    render_build_requires, render_files_sections, FilesFragment, IGNORE_BUCKET, MAIN_BUCKET,
};
