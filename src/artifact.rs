//! Artifact extraction and persistence.
//!
//! Generated output is expected to carry one `### path/to/file.ext` heading
//! per file, each followed by a fenced code block. Extraction is strict
//! about the heading (the name must carry an extension) so generic markdown
//! headers never turn into files. Outputs that are README templates with
//! placeholder text are rejected wholesale rather than written to disk.

use crate::errors::SupervisorError;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::warn;

static FILE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    // heading with a dotted filename, e.g. "### backend/server.js"
    Regex::new(r"###+\s+([^\s\n(]+\.[a-zA-Z0-9]+).*\n").unwrap()
});

static CODE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[a-zA-Z0-9]*\n(.*?)```").unwrap());

const TEMPLATE_INDICATORS: &[&str] = &[
    "Give examples",
    "Add examples",
    "Add_Names",
    "Add_inspiration",
    "your-repo-link",
    "your-directory-name",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    pub path: String,
    pub content: String,
}

/// Extract `### file.ext` + fenced-code sections from generated output.
/// Returns an empty vec when no multi-file format is present.
pub fn parse_files(output: &str) -> Vec<FileContent> {
    let markers: Vec<_> = FILE_MARKER.captures_iter(output).collect();
    let mut files = Vec::new();

    for (i, cap) in markers.iter().enumerate() {
        let whole = cap.get(0).map(|m| m.end()).unwrap_or(0);
        let path = match cap.get(1) {
            Some(m) => m.as_str().to_string(),
            None => continue,
        };
        let section_end = markers
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(output.len());
        let section = &output[whole..section_end];

        if let Some(code) = CODE_BLOCK.captures(section).and_then(|c| c.get(1)) {
            files.push(FileContent {
                path,
                content: code.as_str().trim().to_string(),
            });
        }
    }

    files
}

/// True when any parsed file still contains README-template placeholders.
pub fn is_template_output(files: &[FileContent]) -> bool {
    files.iter().any(|f| {
        TEMPLATE_INDICATORS.iter().any(|ind| {
            let hit = f.content.contains(ind);
            if hit {
                warn!(path = %f.path, indicator = ind, "template placeholder in generated file");
            }
            hit
        })
    })
}

/// Parse the output and write the files under `root/<project_name>`.
///
/// `NoFilesParsed` means the output carried no usable file sections (or only
/// template fragments); `ArtifactWriteFailed` means the filesystem refused
/// the write. Callers treat the two differently.
pub fn write_project(
    root: &Path,
    project_name: &str,
    output: &str,
) -> Result<PathBuf, SupervisorError> {
    let files = parse_files(output);
    if files.is_empty() || is_template_output(&files) {
        return Err(SupervisorError::NoFilesParsed);
    }

    let dir = root.join(project_name);
    fs::create_dir_all(&dir).map_err(|source| SupervisorError::ArtifactWriteFailed {
        path: dir.clone(),
        source,
    })?;

    for file in &files {
        let full = dir.join(&file.path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|source| SupervisorError::ArtifactWriteFailed {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&full, &file.content).map_err(|source| {
            SupervisorError::ArtifactWriteFailed { path: full.clone(), source }
        })?;
    }

    Ok(dir)
}
