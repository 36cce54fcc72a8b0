//! Loading deployment documents from disk.

use std::path::Path;

use crate::model::DeploymentDocument;
use crate::parse::{parse_document, parse_json_document};
use crate::{ConfigError, ConfigResult};

/// Read a deployment document, choosing the format from the file extension.
pub fn load_document(path: impl AsRef<Path>) -> ConfigResult<DeploymentDocument> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("kdl") => parse_document(&content),
        Some("json") => parse_json_document(&content),
        other => Err(ConfigError::UnsupportedFormat(format!(
            "{} (extension {:?}, expected .kdl or .json)",
            path.display(),
            other.unwrap_or("")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const KDL: &str = r#"
        project "acme"
        environment "test" account="123456789012" region="us-east-1" {
            stage "build" {
                action "compile" buildspec="compile.yml"
            }
        }
    "#;

    #[test]
    fn test_load_kdl_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("softfactory.kdl");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(KDL.as_bytes())
            .unwrap();

        let doc = load_document(&path).unwrap();
        assert_eq!(doc.project, "acme");
    }

    #[test]
    fn test_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("softfactory.yaml");
        std::fs::write(&path, KDL).unwrap();

        assert!(matches!(
            load_document(&path).unwrap_err(),
            ConfigError::UnsupportedFormat(_)
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_document(dir.path().join("absent.kdl")).unwrap_err(),
            ConfigError::Io(_)
        ));
    }
}
