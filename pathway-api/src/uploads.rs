//! Media file storage under `<root>/uploads`
//!
//! Stored files are referenced by their served path, e.g.
//! `/uploads/audio/3f2a..e1.mp3`, which is what assessment documents hold.

use pathway_common::models::{MediaKind, Question};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// URL prefix uploaded files are served under
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

/// File store rooted at the uploads directory
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `bytes` under a fresh name, returning the served path
    pub async fn save(
        &self,
        kind: MediaKind,
        original_name: &str,
        bytes: &[u8],
    ) -> std::io::Result<String> {
        let file_name = match extension(original_name) {
            Some(ext) => format!("{}.{}", Uuid::new_v4().simple(), ext),
            None => Uuid::new_v4().simple().to_string(),
        };

        let dir = self.root.join(kind.dir_name());
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&file_name), bytes).await?;

        let served = format!("{}/{}/{}", UPLOADS_URL_PREFIX, kind.dir_name(), file_name);
        debug!(path = %served, size = bytes.len(), "Stored upload");
        Ok(served)
    }

    /// Filesystem location of a served path.
    ///
    /// Only `/uploads/...` paths made of plain components resolve.
    pub fn resolve(&self, served_path: &str) -> Option<PathBuf> {
        let relative = served_path
            .strip_prefix(UPLOADS_URL_PREFIX)?
            .strip_prefix('/')?;
        let relative = Path::new(relative);

        let plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        (plain && relative.components().next().is_some()).then(|| self.root.join(relative))
    }

    /// Remove a stored file; missing files and failures are logged only
    pub async fn delete_if_exists(&self, served_path: &str) {
        let Some(path) = self.resolve(served_path) else {
            warn!(path = %served_path, "Refusing to delete file outside uploads");
            return;
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!(path = %served_path, "Deleted upload"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %served_path, "Failed to delete file: {}", e),
        }
    }

    pub async fn delete_all<I, S>(&self, served_paths: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for path in served_paths {
            self.delete_if_exists(path.as_ref()).await;
        }
    }

    /// Copy a stored file under a fresh name in the same directory
    pub async fn duplicate(&self, served_path: &str) -> std::io::Result<String> {
        let source = self.resolve(served_path).ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("not an upload path: {}", served_path),
            )
        })?;

        let dir = served_path
            .rsplit_once('/')
            .map(|(dir, _)| dir)
            .unwrap_or(UPLOADS_URL_PREFIX);
        let file_name = match extension(served_path) {
            Some(ext) => format!("{}.{}", Uuid::new_v4().simple(), ext),
            None => Uuid::new_v4().simple().to_string(),
        };

        let target = source.with_file_name(&file_name);
        tokio::fs::copy(&source, &target).await?;

        Ok(format!("{}/{}", dir, file_name))
    }
}

/// Lower-cased alphanumeric extension of a client file name
fn extension(name: &str) -> Option<String> {
    let ext = Path::new(name).extension()?.to_str()?;
    (!ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .then(|| ext.to_ascii_lowercase())
}

/// Position of the first question whose `audio` is not one of `owned`.
///
/// Client-sent documents may only reference files the assessment already
/// holds; new files arrive as uploads.
pub fn foreign_question_audio(questions: &[Question], owned: &[String]) -> Option<usize> {
    questions.iter().position(|q| {
        q.audio
            .as_ref()
            .is_some_and(|path| !owned.iter().any(|o| o == path))
    })
}

/// Attach uploaded question audio: file `i` goes to question `indexes[i]`.
///
/// Indexes past the end of `questions`, and files without an index, are
/// ignored. Returns the paths that were not attached.
pub fn map_question_audios(
    questions: &mut [Question],
    paths: Vec<String>,
    indexes: &[usize],
) -> Vec<String> {
    let mut unused = Vec::new();

    for (i, path) in paths.into_iter().enumerate() {
        match indexes.get(i).and_then(|idx| questions.get_mut(*idx)) {
            Some(question) => question.audio = Some(path),
            None => unused.push(path),
        }
    }

    unused
}
