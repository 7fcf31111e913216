//! On-disk layout of an export: `<root>/<PermissionSetName>/<artifact>.json`.

use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_OUT_DIR: &str = "out";

pub const METADATA_FILE: &str = "metadata.json";
pub const INLINE_POLICY_FILE: &str = "inline-policy.json";
pub const BOUNDARY_FILE: &str = "boundary.json";
pub const MANAGED_POLICIES_FILE: &str = "managed-policies.json";
pub const TAGS_FILE: &str = "tags.json";

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("permission set name {0:?} cannot be used as a directory name")]
    UnsafeName(String),
    #[error("create directory {path}: {source}")]
    CreateDir { path: PathBuf, #[source] source: std::io::Error },
    #[error("serialize {path}: {source}")]
    Serialize { path: PathBuf, #[source] source: serde_json::Error },
    #[error("write {path}: {source}")]
    Write { path: PathBuf, #[source] source: std::io::Error },
}

/// Directory for one Permission Set. The name must be a single normal path component.
pub fn permission_set_dir(root: &Path, name: &str) -> Result<PathBuf, OutputError> {
    if name.is_empty() || name.contains('/') || name.contains('\\') {
        return Err(OutputError::UnsafeName(name.to_string()));
    }
    let mut comps = Path::new(name).components();
    match (comps.next(), comps.next()) {
        (Some(Component::Normal(_)), None) => Ok(root.join(name)),
        _ => Err(OutputError::UnsafeName(name.to_string())),
    }
}

pub fn ensure_dir(path: &Path) -> Result<(), OutputError> {
    std::fs::create_dir_all(path).map_err(|source| OutputError::CreateDir { path: path.to_path_buf(), source })
}

/// Pretty JSON (2-space indent), overwriting whatever is there.
pub fn write_json<T: Serialize + ?Sized>(dir: &Path, file_name: &str, value: &T) -> Result<PathBuf, OutputError> {
    let path = dir.join(file_name);
    let body = serde_json::to_string_pretty(value)
        .map_err(|source| OutputError::Serialize { path: path.clone(), source })?;
    std::fs::write(&path, body).map_err(|source| OutputError::Write { path: path.clone(), source })?;
    tracing::debug!(path = %path.display(), "wrote artifact");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_names_join_the_root() {
        let root = Path::new("out");
        assert_eq!(permission_set_dir(root, "DevAccess").unwrap(), PathBuf::from("out/DevAccess"));
        assert_eq!(permission_set_dir(root, "a.b@c+d=e,f-g").unwrap(), root.join("a.b@c+d=e,f-g"));
    }

    #[test]
    fn path_like_names_are_rejected() {
        for bad in ["", ".", "..", "a/b", "../x", "a\\b", "/abs"] {
            assert!(matches!(permission_set_dir(Path::new("out"), bad), Err(OutputError::UnsafeName(_))), "{bad}");
        }
    }

    #[test]
    fn ensure_dir_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let d = tmp.path().join("x").join("y");
        ensure_dir(&d).unwrap();
        ensure_dir(&d).unwrap();
        assert!(d.is_dir());
    }

    #[test]
    fn json_is_pretty_with_two_spaces_and_keeps_key_order() {
        let tmp = tempfile::tempdir().unwrap();
        let v = json!({ "Version": "2012-10-17", "Statement": [{ "Effect": "Allow" }] });
        let p = write_json(tmp.path(), INLINE_POLICY_FILE, &v).unwrap();
        let text = std::fs::read_to_string(p).unwrap();
        assert_eq!(
            text,
            "{\n  \"Version\": \"2012-10-17\",\n  \"Statement\": [\n    {\n      \"Effect\": \"Allow\"\n    }\n  ]\n}"
        );
    }

    #[test]
    fn rewrite_overwrites_with_identical_bytes() {
        let tmp = tempfile::tempdir().unwrap();
        let v = json!([{ "Key": "team", "Value": "ü-platform" }]);
        let first = std::fs::read(write_json(tmp.path(), TAGS_FILE, &v).unwrap()).unwrap();
        let second = std::fs::read(write_json(tmp.path(), TAGS_FILE, &v).unwrap()).unwrap();
        assert_eq!(first, second);
        assert!(String::from_utf8(second).unwrap().contains("ü-platform"));
    }

    #[test]
    fn write_into_missing_dir_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let err = write_json(&tmp.path().join("nope"), TAGS_FILE, &json!([])).unwrap_err();
        assert!(matches!(err, OutputError::Write { .. }));
    }
}
