//! Site build command.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use htms_build::{BuildConfig, SiteBuilder};
use serde::Deserialize;

use super::BuildArgs;

/// Project file structure (htms.toml).
#[derive(Debug, Deserialize, Default)]
struct ProjectFile {
    #[serde(default)]
    build: BuildSettings,
}

#[derive(Debug, Deserialize)]
struct BuildSettings {
    #[serde(default = "default_input")]
    input: PathBuf,
    #[serde(default = "default_output")]
    output: PathBuf,
    /// Override rules file
    config: Option<PathBuf>,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            input: default_input(),
            output: default_output(),
            config: None,
        }
    }
}

fn default_input() -> PathBuf {
    PathBuf::from("src")
}
fn default_output() -> PathBuf {
    PathBuf::from("out")
}

/// Load the project file if it exists.
/// Returns an error if the file exists but is malformed.
fn load_project(path: &Path) -> Result<ProjectFile> {
    if path.exists() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let project: ProjectFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        tracing::info!("Loaded project from {}", path.display());
        return Ok(project);
    }
    Ok(ProjectFile::default())
}

/// Merge command-line arguments over the project file. Flags win.
pub fn build_config(args: BuildArgs, project: &Path) -> Result<BuildConfig> {
    let settings = load_project(project)?.build;

    Ok(BuildConfig {
        input_dir: args.input.unwrap_or(settings.input),
        output_dir: args.output.unwrap_or(settings.output),
        config_source: args.config.or(settings.config),
    })
}

/// Run the build command.
pub async fn run(args: BuildArgs, project: &Path) -> Result<()> {
    let config = build_config(args, project)?;
    tracing::info!(
        "Building {} -> {}",
        config.input_dir.display(),
        config.output_dir.display()
    );

    let report = SiteBuilder::new(config).build().await.context("Build failed")?;

    tracing::info!("Output: {}", report.output_dir.display());

    if !report.is_success() {
        for failure in &report.failures {
            tracing::error!("  {}", failure.path.display());
        }
        bail!("{} files failed to build", report.failures.len());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_without_project_file() {
        let temp = tempdir().unwrap();

        let config = build_config(BuildArgs::default(), &temp.path().join("htms.toml")).unwrap();

        assert_eq!(config.input_dir, PathBuf::from("src"));
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.config_source, None);
    }

    #[test]
    fn flags_override_project_file() {
        let temp = tempdir().unwrap();
        let project = temp.path().join("htms.toml");
        fs::write(
            &project,
            "[build]\ninput = \"site\"\noutput = \"public\"\nconfig = \"htms.json\"\n",
        )
        .unwrap();

        let args = BuildArgs {
            output: Some(PathBuf::from("dist")),
            ..Default::default()
        };
        let config = build_config(args, &project).unwrap();

        assert_eq!(config.input_dir, PathBuf::from("site"));
        assert_eq!(config.output_dir, PathBuf::from("dist"));
        assert_eq!(config.config_source, Some(PathBuf::from("htms.json")));
    }

    #[test]
    fn malformed_project_file_is_an_error() {
        let temp = tempdir().unwrap();
        let project = temp.path().join("htms.toml");
        fs::write(&project, "[build\n").unwrap();

        assert!(build_config(BuildArgs::default(), &project).is_err());
    }
}
