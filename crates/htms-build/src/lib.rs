//! Build dispatcher for htms.
//!
//! Walks a source directory, resolves each file's configuration and routes it
//! to a terminal action: expand and render HTML, render Markdown through its
//! renderer template, compile a stylesheet, copy it, or ignore it.

pub mod builder;
pub mod format;
pub mod stylesheet;

pub use builder::{BuildConfig, BuildError, BuildReport, FileFailure, SiteBuilder};
