use crate::utils::error::InitError;
use serde::Deserialize;
use std::path::Path;

/// 标签清单：`{"classes": [...]}` 或直接是字符串数组，下标即类别 id
#[derive(Deserialize)]
#[serde(untagged)]
enum LabelManifest {
    Object { classes: Vec<String> },
    List(Vec<String>),
}

pub fn load_labels(path: &Path) -> Result<Vec<String>, InitError> {
    if !path.exists() {
        return Err(InitError::MissingLabels(path.to_path_buf()));
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| InitError::LoadFailure(format!("read {}: {}", path.display(), e)))?;

    let manifest: LabelManifest = serde_json::from_str(&raw)
        .map_err(|e| InitError::LoadFailure(format!("parse {}: {}", path.display(), e)))?;

    let labels = match manifest {
        LabelManifest::Object { classes } => classes,
        LabelManifest::List(classes) => classes,
    };

    if labels.is_empty() {
        return Err(InitError::LoadFailure(format!(
            "label manifest {} has no classes",
            path.display()
        )));
    }

    tracing::info!("Loaded {} labels from {}", labels.len(), path.display());
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn manifest(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn reads_object_manifest() {
        let file = manifest(r#"{"classes": ["hello", "thanks", "me"]}"#);
        let labels = load_labels(file.path()).unwrap();
        assert_eq!(labels, vec!["hello", "thanks", "me"]);
    }

    #[test]
    fn reads_bare_list() {
        let file = manifest(r#"["a", "b"]"#);
        assert_eq!(load_labels(file.path()).unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn missing_file_is_missing_labels() {
        let err = load_labels(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, InitError::MissingLabels(_)));
    }

    #[test]
    fn malformed_or_empty_is_load_failure() {
        let file = manifest("{not json");
        assert!(matches!(load_labels(file.path()), Err(InitError::LoadFailure(_))));

        let file = manifest(r#"{"classes": []}"#);
        assert!(matches!(load_labels(file.path()), Err(InitError::LoadFailure(_))));
    }
}
