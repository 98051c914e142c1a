// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reading and writing a credential bundle as a flat directory of text files.

use std::path::Path;

use tracing::debug;
use wabot_core::{CredentialBundle, WabotError};

/// Rejects names that would escape or nest inside the target directory.
pub fn validate_file_name(name: &str) -> Result<(), WabotError> {
    let unsafe_name = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
        || Path::new(name).is_absolute();
    if unsafe_name {
        return Err(WabotError::Format(format!(
            "credential fragment name {name:?} is not a plain file name"
        )));
    }
    Ok(())
}

/// Load every regular file directly inside `dir`.
///
/// Subdirectories are ignored. A missing directory, or one with no files,
/// is [`WabotError::SourceMissing`]. Any unreadable file fails the whole
/// read; nothing partial is returned.
pub async fn read_bundle(dir: &Path) -> Result<CredentialBundle, WabotError> {
    let missing = || WabotError::SourceMissing {
        path: dir.display().to_string(),
    };

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(missing()),
        Err(e) => return Err(WabotError::io(dir, e)),
    };

    let mut bundle = CredentialBundle::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| WabotError::io(dir, e))? {
        let path = entry.path();
        let file_type = entry.file_type().await.map_err(|e| WabotError::io(&path, e))?;
        if !file_type.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            return Err(WabotError::Format(format!(
                "credential file name {} is not valid UTF-8",
                path.display()
            )));
        };
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| WabotError::io(&path, e))?;
        bundle.insert(name, content);
    }

    if bundle.is_empty() {
        return Err(missing());
    }
    debug!(dir = %dir.display(), files = bundle.len(), "credential bundle read");
    Ok(bundle)
}

/// Write every fragment into `dir`, creating it if needed. Returns the file count.
///
/// All names are validated before the first write.
pub async fn write_bundle(bundle: &CredentialBundle, dir: &Path) -> Result<usize, WabotError> {
    for name in bundle.file_names() {
        validate_file_name(name)?;
    }
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| WabotError::io(dir, e))?;
    for (name, content) in bundle.iter() {
        let path = dir.join(name);
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| WabotError::io(&path, e))?;
    }
    debug!(dir = %dir.display(), files = bundle.len(), "credential bundle written");
    Ok(bundle.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn plain_names_pass() {
        for name in ["creds.json", "app-state-sync-key-AAAA.json", "pre-key-1.json", ".hidden"] {
            assert!(validate_file_name(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn traversal_names_fail() {
        for name in ["", ".", "..", "../creds.json", "a/b", "a\\b", "/etc/passwd"] {
            assert!(validate_file_name(name).is_err(), "{name}");
        }
    }

    #[tokio::test]
    async fn missing_dir_is_source_missing() {
        let dir = tempdir().unwrap();
        let err = read_bundle(&dir.path().join("absent")).await.unwrap_err();
        assert!(matches!(err, WabotError::SourceMissing { .. }));
    }

    #[tokio::test]
    async fn empty_dir_is_source_missing() {
        let dir = tempdir().unwrap();
        let err = read_bundle(dir.path()).await.unwrap_err();
        assert!(matches!(err, WabotError::SourceMissing { .. }));
    }

    #[tokio::test]
    async fn subdirectories_are_skipped() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("creds.json"), "{}").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("inner.json"), "x").unwrap();

        let bundle = read_bundle(dir.path()).await.unwrap();
        assert_eq!(bundle.file_names().collect::<Vec<_>>(), vec!["creds.json"]);
    }

    #[tokio::test]
    async fn write_creates_target_and_counts() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("auth").join("restored");
        let bundle: CredentialBundle = [("creds.json", "{}"), ("session-1.json", "abc")]
            .into_iter()
            .collect();

        assert_eq!(write_bundle(&bundle, &target).await.unwrap(), 2);
        assert_eq!(std::fs::read_to_string(target.join("session-1.json")).unwrap(), "abc");
        assert_eq!(read_bundle(&target).await.unwrap(), bundle);
    }

    #[tokio::test]
    async fn unsafe_name_writes_nothing() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("out");
        let bundle: CredentialBundle = [("a.json", "1"), ("../escape.json", "2")]
            .into_iter()
            .collect();

        let err = write_bundle(&bundle, &target).await.unwrap_err();
        assert!(matches!(err, WabotError::Format(_)));
        assert!(!target.exists());
        assert!(!dir.path().join("escape.json").exists());
    }
}
