//! Stylesheet compilation.

use std::path::Path;

use grass::{Options, OutputStyle};

/// Compile a SASS-family file to CSS, optionally minified.
///
/// The syntax (`.scss` or indented `.sass`) is inferred from the extension and
/// `@use`/`@import` resolve relative to the file.
pub fn compile(path: &Path, minify: bool) -> Result<String, String> {
    let options = Options::default().style(OutputStyle::Expanded);
    let css = grass::from_path(path, &options).map_err(|e| e.to_string())?;

    if minify {
        minify_css(&css)
    } else {
        Ok(css)
    }
}

/// Minify CSS using lightningcss.
pub fn minify_css(css: &str) -> Result<String, String> {
    use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

    let stylesheet = StyleSheet::parse(css, ParserOptions::default())
        .map_err(|e| format!("CSS parse error: {}", e))?;

    let minified = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..Default::default()
        })
        .map_err(|e| format!("CSS minify error: {}", e))?;

    Ok(minified.code)
}
