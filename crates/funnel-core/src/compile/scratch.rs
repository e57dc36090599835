//! Scratch directories under `build/` and the files staged into them.

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use crate::domain::FunnelError;

use super::sources::{DEAD_CODE_STUB, PATCHED_REGISTER_ELEMENT, UPSTREAM_REGISTER_ELEMENT};

/// Intermediate compiler output.
pub const BUILD_CC: &str = "build/cc";
const FAKE_MODULE: &str = "build/fake-module";
const PATCHED_MODULE: &str = "build/patched-module";

/// Recreated empty on every cleanup.
const FRESH_DIRS: &[&str] = &[
    "build/patched-module/document-register-element/build",
    "build/fake-module/third_party/babel",
    "build/fake-module/src/polyfills/",
];

/// Appended so the compiler sees an ES module and emits a provide for it.
const EXPORT_SUFFIX: &str = "\n\nexport function deadCode() {}\n";

/// Filesystem staging rooted at the project directory.
#[derive(Debug, Clone)]
pub struct Scratch {
    root: PathBuf,
}

impl Scratch {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    /// Reset the fake and patched module trees, keep `build/cc`.
    pub async fn cleanup_build_dir(&self) -> Result<(), FunnelError> {
        self.create_dir(BUILD_CC).await?;
        self.remove_dir(FAKE_MODULE).await?;
        self.remove_dir(PATCHED_MODULE).await?;
        for dir in FRESH_DIRS {
            self.create_dir(dir).await?;
        }
        tracing::debug!(root = %self.root.display(), "build dir reset");
        Ok(())
    }

    /// Write a dead-code stub for every listed file that does not exist yet.
    pub async fn write_dead_code_stubs(&self, stubs: &[&str]) -> Result<(), FunnelError> {
        for stub in stubs {
            let path = self.path(stub);
            if exists(&path).await? {
                continue;
            }
            if let Some(parent) = path.parent() {
                self.create_dir(parent).await?;
            }
            tokio::fs::write(&path, DEAD_CODE_STUB)
                .await
                .map_err(|e| FunnelError::io(&path, e))?;
        }
        Ok(())
    }

    /// Copy document-register-element with an export appended, once.
    pub async fn patch_register_element(&self) -> Result<(), FunnelError> {
        let patched = self.path(PATCHED_REGISTER_ELEMENT);
        if exists(&patched).await? {
            return Ok(());
        }
        let upstream = self.path(UPSTREAM_REGISTER_ELEMENT);
        let mut contents = tokio::fs::read_to_string(&upstream)
            .await
            .map_err(|e| FunnelError::io(&upstream, e))?;
        contents.push_str(EXPORT_SUFFIX);

        if let Some(parent) = patched.parent() {
            self.create_dir(parent).await?;
        }
        tokio::fs::write(&patched, contents)
            .await
            .map_err(|e| FunnelError::io(&patched, e))?;
        tracing::debug!(path = %patched.display(), "patched register-element");
        Ok(())
    }

    pub async fn remove_file_if_exists(&self, relative: impl AsRef<Path>) -> Result<(), FunnelError> {
        let path = self.path(relative);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(()),
            Err(e) => Err(FunnelError::io(path, e)),
        }
    }

    async fn create_dir(&self, relative: impl AsRef<Path>) -> Result<(), FunnelError> {
        let path = self.path(relative);
        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|e| FunnelError::io(path, e))
    }

    async fn remove_dir(&self, relative: impl AsRef<Path>) -> Result<(), FunnelError> {
        let path = self.path(relative);
        match tokio::fs::remove_dir_all(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(()),
            Err(e) => Err(FunnelError::io(path, e)),
        }
    }
}

async fn exists(path: &Path) -> Result<bool, FunnelError> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|e| FunnelError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cleanup_resets_module_trees() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = Scratch::new(dir.path());
        std::fs::create_dir_all(dir.path().join("build/fake-module/old")).unwrap();
        std::fs::create_dir_all(dir.path().join("build/cc")).unwrap();
        std::fs::write(dir.path().join("build/cc/keep.js"), "x").unwrap();

        scratch.cleanup_build_dir().await.unwrap();

        assert!(!dir.path().join("build/fake-module/old").exists());
        assert!(dir.path().join("build/cc/keep.js").exists());
        for fresh in FRESH_DIRS {
            assert!(dir.path().join(fresh).is_dir(), "{fresh}");
        }
    }

    #[tokio::test]
    async fn stubs_do_not_overwrite_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = Scratch::new(dir.path());
        let real = dir.path().join("build/fake-module/src/polyfills.js");
        std::fs::create_dir_all(real.parent().unwrap()).unwrap();
        std::fs::write(&real, "real").unwrap();

        scratch
            .write_dead_code_stubs(&[
                "build/fake-module/src/polyfills.js",
                "build/fake-module/src/polyfills/promise.js",
            ])
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&real).unwrap(), "real");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("build/fake-module/src/polyfills/promise.js"))
                .unwrap(),
            DEAD_CODE_STUB
        );
    }

    #[tokio::test]
    async fn register_element_is_patched_once() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = Scratch::new(dir.path());
        let upstream = dir.path().join(UPSTREAM_REGISTER_ELEMENT);
        std::fs::create_dir_all(upstream.parent().unwrap()).unwrap();
        std::fs::write(&upstream, "/* dre */").unwrap();

        scratch.patch_register_element().await.unwrap();
        let patched = dir.path().join(PATCHED_REGISTER_ELEMENT);
        assert_eq!(
            std::fs::read_to_string(&patched).unwrap(),
            "/* dre */\n\nexport function deadCode() {}\n"
        );

        // upstream changes are not picked up while the patched copy exists
        std::fs::write(&upstream, "/* newer */").unwrap();
        scratch.patch_register_element().await.unwrap();
        assert!(std::fs::read_to_string(&patched).unwrap().starts_with("/* dre */"));
    }

    #[tokio::test]
    async fn missing_upstream_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Scratch::new(dir.path()).patch_register_element().await.unwrap_err();
        assert!(matches!(err, FunnelError::Io { .. }));
    }

    #[tokio::test]
    async fn removing_absent_file_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        Scratch::new(dir.path())
            .remove_file_if_exists("build/cc/nothing.js")
            .await
            .unwrap();
    }
}
