//! Scaffold a starter site.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Files written under the source directory.
const SOURCES: &[(&str, &str)] = &[
    ("index.html", DEFAULT_INDEX),
    ("header.htms", DEFAULT_HEADER),
    ("render.htms", DEFAULT_RENDERER),
    ("about.md", DEFAULT_ABOUT),
    ("style.scss", DEFAULT_STYLE),
];

/// Run the init command in `root`.
pub async fn run(root: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing htms...");

    let src_dir = root.join("src");

    if src_dir.exists() {
        if !yes {
            tracing::warn!("src/ directory already exists. Use --yes to overwrite.");
            return Ok(());
        }
    } else {
        fs::create_dir_all(&src_dir).context("Failed to create src directory")?;
    }

    let project_path = root.join("htms.toml");
    if !project_path.exists() || yes {
        fs::write(&project_path, DEFAULT_PROJECT).context("Failed to write htms.toml")?;
        tracing::info!("Created htms.toml");
    }

    for (name, contents) in SOURCES {
        let path = src_dir.join(name);
        if !path.exists() || yes {
            fs::write(&path, contents).with_context(|| format!("Failed to write {}", name))?;
            tracing::info!("Created src/{}", name);
        }
    }

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'htms build' to build the site into out/.");

    Ok(())
}

const DEFAULT_PROJECT: &str = r#"# htms project

[build]
# Source directory
input = "src"

# Output directory
output = "out"

# Per-file override rules (.json, .yaml or .nix)
# config = "htms.json"
"#;

const DEFAULT_INDEX: &str = r#"<IMPORT src="header.htms" as="PAGE-HEADER"/>
<head>
    <title>My site</title>
    <link rel="stylesheet" href="style.css">
</head>
<body>
    <PAGE-HEADER title="Welcome">
        <p>Built with htms.</p>
    </PAGE-HEADER>
    <main>
        <p>Read the <a href="about.html">about page</a>.</p>
    </main>
</body>
"#;

const DEFAULT_HEADER: &str = r#"<header>
    <h1>{{title}}</h1>
    {{{}}}
</header>
"#;

const DEFAULT_RENDERER: &str = r#"<IMPORT src="header.htms" as="PAGE-HEADER"/>
<head>
    <title>{{title}}</title>
    <link rel="stylesheet" href="style.css">
</head>
<body>
    <PAGE-HEADER title="{{title}}"/>
    <article>
        {{{}}}
    </article>
</body>
"#;

const DEFAULT_ABOUT: &str = r#"---
title: About
---

# About

This page is written in **Markdown** and rendered through `render.htms`.
"#;

const DEFAULT_STYLE: &str = r#"$accent: #3b5bdb;

body {
    font-family: system-ui, sans-serif;
    max-width: 48rem;
    margin: 0 auto;

    a {
        color: $accent;
    }
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn scaffolds_project() {
        let temp = tempdir().unwrap();

        run(temp.path(), false).await.unwrap();

        assert!(temp.path().join("htms.toml").exists());
        for (name, _) in SOURCES {
            assert!(temp.path().join("src").join(name).exists(), "missing {}", name);
        }
    }

    #[tokio::test]
    async fn keeps_existing_sources_without_yes() {
        let temp = tempdir().unwrap();
        let index = temp.path().join("src/index.html");
        fs::create_dir_all(index.parent().unwrap()).unwrap();
        fs::write(&index, "<p>mine</p>").unwrap();

        run(temp.path(), false).await.unwrap();
        assert_eq!(fs::read_to_string(&index).unwrap(), "<p>mine</p>");

        run(temp.path(), true).await.unwrap();
        assert_eq!(fs::read_to_string(&index).unwrap(), DEFAULT_INDEX);
    }
}
