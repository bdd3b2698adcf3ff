use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::models::Documentation;

pub const JSON_FILE_NAME: &str = "api-documentation.json";
pub const HTML_FILE_NAME: &str = "api-documentation.html";
pub const ARCHIVE_FILE_NAME: &str = "api-documentation.zip";

const DATA_START_MARKER: &str = "const apiData = [";
const DATA_END_MARKER: &str = "];";

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("failed to serialise documentation: {0}")]
    Serialise(#[from] serde_json::Error),
    #[error("archive I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Packages a documentation value into a downloadable zip archive holding a
/// pretty-printed JSON file and a rendered HTML page.
///
/// The HTML is produced by splicing the documentation JSON over the
/// placeholder data array in a static template. The template is read from
/// disk on every call; there is no caching.
pub struct ArtifactPackager {
    template_path: PathBuf,
}

impl ArtifactPackager {
    pub fn new() -> Self {
        Self::with_template(default_template_path())
    }

    pub fn with_template(template_path: impl Into<PathBuf>) -> Self {
        Self {
            template_path: template_path.into(),
        }
    }

    /// Build `api-documentation.zip` inside `out_dir` and return its path.
    ///
    /// The archive is flat and holds exactly two entries, named after the
    /// JSON and HTML base file names. The intermediate files are deleted
    /// once they have been archived; only the archive remains.
    pub fn package(
        &self,
        documentation: &Documentation,
        out_dir: &Path,
    ) -> Result<PathBuf, PackageError> {
        let json = serde_json::to_string_pretty(documentation)?;

        let json_path = out_dir.join(JSON_FILE_NAME);
        fs::write(&json_path, &json)?;

        let template = fs::read_to_string(&self.template_path)?;
        let html = splice_api_data(&template, &json);
        let html_path = out_dir.join(HTML_FILE_NAME);
        fs::write(&html_path, &html)?;

        let zip_path = out_dir.join(ARCHIVE_FILE_NAME);
        let archive = fs::File::create(&zip_path)?;
        let mut zip = ZipWriter::new(archive);
        let options = SimpleFileOptions::default();

        zip.start_file(JSON_FILE_NAME, options)?;
        zip.write_all(json.as_bytes())?;
        zip.start_file(HTML_FILE_NAME, options)?;
        zip.write_all(html.as_bytes())?;
        zip.finish()?;

        fs::remove_file(&json_path)?;
        fs::remove_file(&html_path)?;

        Ok(zip_path)
    }
}

impl Default for ArtifactPackager {
    fn default() -> Self {
        Self::new()
    }
}

fn default_template_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("assets")
        .join("api-docs-template.html")
}

/// Replace the template's placeholder data array with the documentation JSON.
///
/// The primary path replaces the whole span from the start marker through
/// the first `];` after it. When the span cannot be located, the start
/// marker token alone is replaced, which leaves the placeholder array's
/// tail (and its `];`) in place. That asymmetry matches the template's
/// established processing and is kept as-is.
fn splice_api_data(template: &str, json: &str) -> String {
    let replacement = format!("const apiData = {json};");

    match template.find(DATA_START_MARKER) {
        Some(start) => match template[start..].find(DATA_END_MARKER) {
            Some(rel_end) => {
                let end = start + rel_end + DATA_END_MARKER.len();
                format!("{}{}{}", &template[..start], replacement, &template[end..])
            }
            None => template.replace(DATA_START_MARKER, &replacement),
        },
        None => template.replace(DATA_START_MARKER, &replacement),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use serde_json::json;

    use super::*;

    const TEMPLATE: &str = "<html><script>\nconst apiData = [\n  { \"Endpoint\": \"sample\" }\n];\nrender(apiData);\n</script></html>";

    fn packager(dir: &Path) -> ArtifactPackager {
        let template_path = dir.join("template.html");
        fs::write(&template_path, TEMPLATE).unwrap();
        ArtifactPackager::with_template(template_path)
    }

    fn sample_documentation() -> Documentation {
        json!([{
            "Endpoint": "GET /items",
            "Description": "List items.",
            "Parameters": [],
            "Request Body": "-",
            "Responses": [],
            "Authentication": "-",
            "Other Details": "-",
            "Links": "-"
        }])
    }

    fn archive_names(zip_path: &Path) -> Vec<String> {
        let file = fs::File::open(zip_path).unwrap();
        let archive = zip::ZipArchive::new(file).unwrap();
        archive.file_names().map(str::to_string).collect()
    }

    #[test]
    fn archive_holds_exactly_the_two_expected_entries() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = packager(dir.path())
            .package(&sample_documentation(), dir.path())
            .unwrap();

        let mut names = archive_names(&zip_path);
        names.sort();
        assert_eq!(names, vec![HTML_FILE_NAME, JSON_FILE_NAME]);
    }

    #[test]
    fn json_entry_roundtrips_to_the_input() {
        let dir = tempfile::tempdir().unwrap();
        let docs = sample_documentation();
        let zip_path = packager(dir.path()).package(&docs, dir.path()).unwrap();

        let file = fs::File::open(&zip_path).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        let mut json = String::new();
        archive
            .by_name(JSON_FILE_NAME)
            .unwrap()
            .read_to_string(&mut json)
            .unwrap();

        let back: Documentation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, docs);
    }

    #[test]
    fn repeated_packaging_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let docs = sample_documentation();
        let p = packager(dir.path());

        let mut outputs = Vec::new();
        for _ in 0..2 {
            let zip_path = p.package(&docs, dir.path()).unwrap();
            let file = fs::File::open(&zip_path).unwrap();
            let mut archive = zip::ZipArchive::new(file).unwrap();
            let mut json = Vec::new();
            archive
                .by_name(JSON_FILE_NAME)
                .unwrap()
                .read_to_end(&mut json)
                .unwrap();
            outputs.push(json);
        }
        assert_eq!(outputs[0], outputs[1]);
    }

    #[test]
    fn intermediate_files_are_removed_after_archiving() {
        let dir = tempfile::tempdir().unwrap();
        packager(dir.path())
            .package(&sample_documentation(), dir.path())
            .unwrap();

        assert!(!dir.path().join(JSON_FILE_NAME).exists());
        assert!(!dir.path().join(HTML_FILE_NAME).exists());
        assert!(dir.path().join(ARCHIVE_FILE_NAME).exists());
    }

    #[test]
    fn splice_replaces_the_placeholder_span() {
        let json = "[{\"Endpoint\": \"GET /items\"}]";
        let html = splice_api_data(TEMPLATE, json);

        assert!(html.contains("const apiData = [{\"Endpoint\": \"GET /items\"}];"));
        assert!(!html.contains("sample"));
        // Surrounding static content is untouched.
        assert!(html.starts_with("<html><script>"));
        assert!(html.contains("render(apiData);"));
    }

    #[test]
    fn splice_without_start_marker_leaves_template_unchanged() {
        let template = "<html><script>render([]);</script></html>";
        let html = splice_api_data(template, "[]");
        assert_eq!(html, template);
    }

    #[test]
    fn splice_without_end_marker_keeps_the_dangling_tail() {
        // Token replacement only; the placeholder's tail stays behind.
        let template = "const apiData = [ 1, 2, 3";
        let html = splice_api_data(template, "[]");
        assert_eq!(html, "const apiData = []; 1, 2, 3");
    }
}
