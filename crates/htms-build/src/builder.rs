//! Site builder.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;
use walkdir::WalkDir;

use htms_core::config::{Config, ConfigError, ConfigResolver, Route};
use htms_core::paths::{dotted_extension, normalize};
use htms_core::template::{CallerContext, Expander};
use htms_core::LoadError;

use crate::{format, stylesheet};

/// Configuration for building a site.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Source directory
    pub input_dir: PathBuf,

    /// Output directory
    pub output_dir: PathBuf,

    /// Override rules (`.json`, `.yaml`/`.yml` or `.nix`)
    pub config_source: Option<PathBuf>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("src"),
            output_dir: PathBuf::from("out"),
            config_source: None,
        }
    }
}

/// Result of a build.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// HTML and Markdown pages written
    pub rendered: usize,

    /// Files copied verbatim
    pub copied: usize,

    /// Stylesheets compiled
    pub compiled: usize,

    /// Files that produced no output
    pub ignored: usize,

    /// Files that failed, each with its error
    pub failures: Vec<FileFailure>,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

impl BuildReport {
    /// Whether every file was processed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Rendered => self.rendered += 1,
            Outcome::Copied => self.copied += 1,
            Outcome::Compiled => self.compiled += 1,
            Outcome::Ignored => self.ignored += 1,
        }
    }
}

/// A source file that could not be built.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: BuildError,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Source directory not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to compile stylesheet {}: {message}", .path.display())]
    Stylesheet { path: PathBuf, message: String },

    #[error("Failed to serialize {}: {source}", .path.display())]
    Serialize {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Build task failed: {0}")]
    Join(String),
}

/// What a file's terminal action did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Rendered,
    Copied,
    Compiled,
    Ignored,
}

/// Builds a source directory into an output directory.
pub struct SiteBuilder {
    config: BuildConfig,
}

impl SiteBuilder {
    /// Create a new site builder.
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Build the site.
    ///
    /// Configuration errors abort the build before anything is written.
    /// Every other failure is recorded against its file in the report while
    /// the remaining files are still processed.
    pub async fn build(&self) -> Result<BuildReport, BuildError> {
        let start = Instant::now();

        let input_dir = normalize(&self.config.input_dir);
        let output_dir = normalize(&self.config.output_dir);

        if !input_dir.is_dir() {
            return Err(BuildError::MissingInput(input_dir));
        }

        let resolver = match &self.config.config_source {
            Some(source) => ConfigResolver::load(source, &input_dir).await?,
            None => ConfigResolver::with_defaults(&input_dir),
        };

        tokio::fs::create_dir_all(&output_dir)
            .await
            .map_err(|source| BuildError::Io {
                path: output_dir.clone(),
                source,
            })?;

        let mut tasks = JoinSet::new();
        for entry in WalkDir::new(&input_dir).min_depth(1).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            let source = entry.into_path();
            if source.is_dir() || source.starts_with(&output_dir) {
                continue;
            }

            let relative = match source.strip_prefix(&input_dir) {
                Ok(relative) => relative.to_path_buf(),
                Err(_) => continue,
            };

            let job = FileJob {
                config: resolver.get(&source),
                source,
                relative,
                output_dir: output_dir.clone(),
            };
            tasks.spawn(async move {
                let result = job.run().await;
                (job.source, result)
            });
        }

        let mut report = BuildReport {
            output_dir,
            ..Default::default()
        };

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(outcome))) => report.record(outcome),
                Ok((path, Err(error))) => {
                    tracing::error!("{}: {}", path.display(), error);
                    report.failures.push(FileFailure { path, error });
                }
                Err(e) => {
                    tracing::error!("Build task failed: {}", e);
                    report.failures.push(FileFailure {
                        path: PathBuf::new(),
                        error: BuildError::Join(e.to_string()),
                    });
                }
            }
        }

        report.duration_ms = start.elapsed().as_millis() as u64;

        tracing::info!(
            "Built {} pages, {} stylesheets, {} copied, {} ignored in {}ms",
            report.rendered,
            report.compiled,
            report.copied,
            report.ignored,
            report.duration_ms
        );
        if !report.is_success() {
            tracing::warn!("{} files failed", report.failures.len());
        }

        Ok(report)
    }
}

/// One source file and everything needed to process it.
struct FileJob {
    source: PathBuf,
    relative: PathBuf,
    output_dir: PathBuf,
    config: Arc<Config>,
}

impl FileJob {
    async fn run(&self) -> Result<Outcome, BuildError> {
        let files = &self.config.files;
        let route = files.route(&dotted_extension(&self.source));
        let target = files.output_path(&self.output_dir, &self.relative, route);

        tracing::debug!("{} -> {:?}", self.relative.display(), route);

        match route {
            Route::Html => {
                let html = self.blocking(render_page).await?;
                write(&target, html).await?;
                Ok(Outcome::Rendered)
            }
            Route::Markdown => {
                let html = self.blocking(render_markdown).await?;
                write(&target, html).await?;
                Ok(Outcome::Rendered)
            }
            Route::Stylesheet => {
                let css = self.blocking(compile_stylesheet).await?;
                write(&target, css).await?;
                Ok(Outcome::Compiled)
            }
            Route::Ignore => Ok(Outcome::Ignored),
            Route::Copy => {
                create_parent(&target).await?;
                tokio::fs::copy(&self.source, &target)
                    .await
                    .map_err(|source| BuildError::Io {
                        path: target.clone(),
                        source,
                    })?;
                Ok(Outcome::Copied)
            }
        }
    }

    /// Run a CPU-bound step on the blocking pool.
    async fn blocking(
        &self,
        step: fn(&Path, &Config) -> Result<String, BuildError>,
    ) -> Result<String, BuildError> {
        let source = self.source.clone();
        let config = Arc::clone(&self.config);

        tokio::task::spawn_blocking(move || step(&source, &config))
            .await
            .map_err(|e| BuildError::Join(format!("{}: {}", self.source.display(), e)))?
    }
}

fn render_page(source: &Path, config: &Config) -> Result<String, BuildError> {
    let document = Expander::new(config).load(source, CallerContext::none(), false)?;
    serialize(source, &document.children, config)
}

/// Render a Markdown file and pour it into the renderer template next to it.
fn render_markdown(source: &Path, config: &Config) -> Result<String, BuildError> {
    let dir = source.parent().unwrap_or(Path::new("/"));
    let renderer = dir.join(&config.files.md_renderer);

    let mut expander = Expander::new(config);
    let page = expander.load_markdown(source)?;
    let attrs = page.attributes();

    let caller = CallerContext::with_children(&page.document.children).attrs(attrs.as_ref());
    let document = expander.load(&renderer, caller, false)?;

    serialize(source, &document.children, config)
}

fn compile_stylesheet(source: &Path, config: &Config) -> Result<String, BuildError> {
    stylesheet::compile(source, config.format.minify).map_err(|message| BuildError::Stylesheet {
        path: source.to_path_buf(),
        message,
    })
}

fn serialize(
    source: &Path,
    nodes: &[htms_core::Node],
    config: &Config,
) -> Result<String, BuildError> {
    format::finish(nodes, config).map_err(|e| BuildError::Serialize {
        path: source.to_path_buf(),
        source: e,
    })
}

async fn create_parent(path: &Path) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| BuildError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
    }
    Ok(())
}

async fn write(path: &Path, contents: String) -> Result<(), BuildError> {
    create_parent(path).await?;
    tokio::fs::write(path, contents)
        .await
        .map_err(|source| BuildError::Io {
            path: path.to_path_buf(),
            source,
        })
}
