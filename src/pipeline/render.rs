//! Diagram rendering: Mermaid description → SVG via the external `mmdc`.
//!
//! The renderer is a separate executable (mermaid-cli). It reads a source
//! file and writes an image, so the description goes through a uniquely
//! named temp file in the output directory. The temp file is a
//! [`tempfile::NamedTempFile`] and is removed when it goes out of scope,
//! whether or not the renderer succeeded.
//!
//! ## Command resolution
//!
//! 1. [`RendererConfig::command`] when set
//! 2. `mmdc` (or `mmdc.cmd`) on PATH
//! 3. the package runner fallback: `npx mmdc`

use crate::config::RendererConfig;
use crate::error::RoadmapError;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

const MERMAID_FENCE: &str = "```mermaid";
const FENCE: &str = "```";

/// A resolved renderer invocation, minus the input/output pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererCommand {
    pub program: PathBuf,
    /// Arguments placed before `-i <input> -o <output>` (e.g. `mmdc` for `npx`).
    pub leading_args: Vec<String>,
}

impl RendererCommand {
    fn args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.leading_args.iter().map(OsString::from).collect();
        args.push("-i".into());
        args.push(input.as_os_str().to_os_string());
        args.push("-o".into());
        args.push(output.as_os_str().to_os_string());
        args
    }

    /// Human-readable command line, used in logs and errors.
    pub fn command_line(&self, input: &Path, output: &Path) -> String {
        std::iter::once(self.program.as_os_str().to_os_string())
            .chain(self.args(input, output))
            .map(|a| a.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Locate the renderer executable.
pub fn resolve_command(config: &RendererConfig) -> RendererCommand {
    if let Some(ref command) = config.command {
        return RendererCommand {
            program: command.clone(),
            leading_args: Vec::new(),
        };
    }

    if let Ok(mmdc) = which::which("mmdc").or_else(|_| which::which("mmdc.cmd")) {
        return RendererCommand {
            program: mmdc,
            leading_args: Vec::new(),
        };
    }

    let runner = which::which(&config.runner)
        .or_else(|_| which::which(format!("{}.cmd", config.runner)))
        .unwrap_or_else(|_| PathBuf::from(&config.runner));
    debug!("mmdc not on PATH, falling back to {} mmdc", runner.display());

    RendererCommand {
        program: runner,
        leading_args: vec!["mmdc".to_string()],
    }
}

/// Remove one surrounding ```` ```mermaid ```` … ```` ``` ```` pair.
///
/// Only applies when the trimmed text starts with ```` ```mermaid ````; then
/// the first ```` ```mermaid ```` and the first remaining ```` ``` ```` are
/// removed and the result trimmed. Anything else is returned unchanged.
pub fn strip_mermaid_fence(description: &str) -> String {
    let trimmed = description.trim();
    if !trimmed.starts_with(MERMAID_FENCE) {
        return description.to_string();
    }
    let without_open = trimmed.replacen(MERMAID_FENCE, "", 1);
    without_open.replacen(FENCE, "", 1).trim().to_string()
}

/// Render `description` to `<output_dir>/<image_file_name>`.
///
/// A stale image under the fixed name is removed first, so after a failed
/// run no image is left behind unless the renderer itself wrote one.
pub async fn render_diagram(
    description: &str,
    output_dir: &Path,
    config: &RendererConfig,
) -> Result<PathBuf, RoadmapError> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|e| RoadmapError::OutputWriteFailed {
            path: output_dir.to_path_buf(),
            source: e,
        })?;

    let source = strip_mermaid_fence(description);

    let mut source_file = tempfile::Builder::new()
        .prefix("temp_")
        .suffix(".mmd")
        .tempfile_in(output_dir)
        .map_err(|e| RoadmapError::OutputWriteFailed {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
    source_file
        .write_all(source.as_bytes())
        .and_then(|_| source_file.flush())
        .map_err(|e| RoadmapError::OutputWriteFailed {
            path: source_file.path().to_path_buf(),
            source: e,
        })?;

    let image_path = output_dir.join(&config.image_file_name);
    remove_stale(&image_path).await?;

    let command = resolve_command(config);
    let command_line = command.command_line(source_file.path(), &image_path);
    info!("Rendering diagram: {}", command_line);

    let output = Command::new(&command.program)
        .args(command.args(source_file.path(), &image_path))
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| RoadmapError::RendererLaunchFailed {
            command: command_line.clone(),
            source: e,
        })?;

    if let Err(e) = source_file.close() {
        warn!("Could not remove temporary diagram source: {}", e);
    }

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        warn!("Renderer stderr:\n{}", stderr);
        debug!("Renderer stdout:\n{}", stdout);
        return Err(RoadmapError::RendererFailed {
            command: command_line,
            exit_code: output.status.code(),
            stdout,
            stderr,
        });
    }

    if !image_path.exists() {
        return Err(RoadmapError::Internal(format!(
            "renderer exited successfully but did not write '{}'",
            image_path.display()
        )));
    }

    debug!("Rendered {}", image_path.display());
    Ok(image_path)
}

async fn remove_stale(path: &Path) -> Result<(), RoadmapError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            debug!("Removed stale {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(RoadmapError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_exactly_the_first_fence_pair() {
        let fenced = "```mermaid\ngraph TD\n    A --> B\n```";
        assert_eq!(strip_mermaid_fence(fenced), "graph TD\n    A --> B");

        let twice = "```mermaid\ngraph TD\n```\n```mermaid\nX\n```";
        assert_eq!(strip_mermaid_fence(twice), "graph TD\n\n```mermaid\nX\n```");
    }

    #[test]
    fn surrounding_whitespace_before_fence_is_ignored() {
        assert_eq!(strip_mermaid_fence("\n  ```mermaid\nA\n```  \n"), "A");
    }

    #[test]
    fn unfenced_text_is_untouched() {
        let plain = "graph TD\n    A --> B\n";
        assert_eq!(strip_mermaid_fence(plain), plain);
        // A generic fence is not a mermaid fence.
        let generic = "```\ngraph TD\n```";
        assert_eq!(strip_mermaid_fence(generic), generic);
    }

    #[test]
    fn explicit_command_is_used_verbatim() {
        let config = RendererConfig {
            command: Some(PathBuf::from("/opt/bin/mmdc")),
            ..RendererConfig::default()
        };
        let cmd = resolve_command(&config);
        assert_eq!(cmd.program, PathBuf::from("/opt/bin/mmdc"));
        assert!(cmd.leading_args.is_empty());
        assert_eq!(
            cmd.command_line(Path::new("out/temp_1.mmd"), Path::new("out/diagram.svg")),
            "/opt/bin/mmdc -i out/temp_1.mmd -o out/diagram.svg"
        );
    }

    #[test]
    fn runner_fallback_prefixes_mmdc() {
        let cmd = RendererCommand {
            program: PathBuf::from("npx"),
            leading_args: vec!["mmdc".into()],
        };
        assert_eq!(
            cmd.command_line(Path::new("a.mmd"), Path::new("b.svg")),
            "npx mmdc -i a.mmd -o b.svg"
        );
    }

    #[tokio::test]
    async fn launch_failure_is_reported_and_temp_file_removed() {
        let dir = tempfile::tempdir().unwrap();
        let config = RendererConfig {
            command: Some(PathBuf::from("/definitely/not/a/renderer")),
            ..RendererConfig::default()
        };
        let err = render_diagram("graph TD\nA-->B", dir.path(), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, RoadmapError::RendererLaunchFailed { .. }));

        let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert!(leftovers.is_empty(), "temp source must be removed: {leftovers:?}");
    }
}
