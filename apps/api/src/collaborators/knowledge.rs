//! Local knowledge base: house notes the analyst reads before every critique.

use std::path::Path;

use tracing::{debug, warn};

const KNOWLEDGE_EXTENSIONS: &[&str] = &["txt", "md"];

/// Concatenates every `.txt`/`.md` file in `dir` (name order) as `--- name ---\n{contents}`.
///
/// A missing directory yields an empty string; unreadable files are skipped.
pub fn load_knowledge_base(dir: &Path) -> String {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Knowledge base {} not available: {e}", dir.display());
            return String::new();
        }
    };

    let mut files: Vec<_> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| KNOWLEDGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    files.sort();

    let mut sections = Vec::with_capacity(files.len());
    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match std::fs::read_to_string(&path) {
            Ok(contents) => sections.push(format!("--- {name} ---\n{}", contents.trim())),
            Err(e) => warn!("Skipping knowledge file {name}: {e}"),
        }
    }

    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concatenates_text_and_markdown_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b_staging.md"), "# Staging\nDeclutter first.\n").unwrap();
        std::fs::write(dir.path().join("a_pricing.txt"), "Price within 2% of comps.").unwrap();
        std::fs::write(dir.path().join("photo.jpg"), [0u8, 1, 2]).unwrap();

        let kb = load_knowledge_base(dir.path());
        assert_eq!(
            kb,
            "--- a_pricing.txt ---\nPrice within 2% of comps.\n\n--- b_staging.md ---\n# Staging\nDeclutter first."
        );
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_knowledge_base(&dir.path().join("nope")), "");
    }
}
