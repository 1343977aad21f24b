//! PDF rendering of the assembled page.

use anyhow::{Context, bail};
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Turns an assembled HTML document plus stylesheet into a paged file.
pub trait PageRenderer {
    /// `base` holds every file the markup references by relative path.
    fn render(&self, markup: &str, stylesheet: &str, base: &Path, output: &Path) -> anyhow::Result<()>;
}

/// Runs an external HTML-to-PDF program as
/// `<program> --stylesheet <css> --base-url <base> <html> <output>`.
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    program: String,
}

impl CommandRenderer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl PageRenderer for CommandRenderer {
    fn render(&self, markup: &str, stylesheet: &str, base: &Path, output: &Path) -> anyhow::Result<()> {
        let html_path = base.join("book.html");
        let css_path = base.join("book.css");
        std::fs::write(&html_path, markup)
            .with_context(|| format!("writing {}", html_path.display()))?;
        std::fs::write(&css_path, stylesheet)
            .with_context(|| format!("writing {}", css_path.display()))?;

        debug!(program = %self.program, output = %output.display(), "rendering PDF");
        let result = Command::new(&self.program)
            .arg("--stylesheet")
            .arg(&css_path)
            .arg("--base-url")
            .arg(base)
            .arg(&html_path)
            .arg(output)
            .output()
            .with_context(|| format!("running {}", self.program))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            bail!("{} exited with {}: {}", self.program, result.status, stderr.trim());
        }
        Ok(())
    }
}
