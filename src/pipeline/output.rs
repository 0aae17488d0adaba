//! Markdown persistence for finished summaries.

use std::io;
use std::path::{Path, PathBuf};

/// Destination of the summary for a document named `name`.
pub fn markdown_path(name: &str, output_dir: &Path) -> PathBuf {
    output_dir.join(format!("{name}.md"))
}

/// Write `text` to `{output_dir}/{name}.md`.
///
/// The file is written under a temporary name and renamed into place, so an interrupted write
/// never leaves a partial artifact at the final path.
pub fn write_markdown(name: &str, text: &str, output_dir: &Path) -> io::Result<PathBuf> {
    let target = markdown_path(name, output_dir);
    let staging = output_dir.join(format!(".{name}.md.partial"));

    std::fs::write(&staging, text)?;
    if let Err(error) = std::fs::rename(&staging, &target) {
        let _ = std::fs::remove_file(&staging);
        return Err(error);
    }

    tracing::debug!(path = %target.display(), bytes = text.len(), "Summary written");
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_summary_under_document_name() {
        let dir = tempfile::tempdir().expect("tempdir");

        let path = write_markdown("report", "# Summary\n\nBody", dir.path()).expect("write");

        assert_eq!(path, dir.path().join("report.md"));
        assert_eq!(
            std::fs::read_to_string(&path).expect("read"),
            "# Summary\n\nBody"
        );
    }

    #[test]
    fn leaves_no_staging_file_behind() {
        let dir = tempfile::tempdir().expect("tempdir");

        write_markdown("report", "text", dir.path()).expect("write");

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .expect("read dir")
            .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["report.md".to_string()]);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope");

        assert!(write_markdown("report", "text", &missing).is_err());
        assert!(!markdown_path("report", &missing).exists());
    }
}
