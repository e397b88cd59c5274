use super::*;

/// Content-addressed local media store standing in for a hosted media
/// service: files land under `media/` named by their blake3 hash and the
/// returned URL is the service-relative path.
pub(crate) struct LocalMediaStore {
    media_dir: PathBuf,
}

impl LocalMediaStore {
    pub(crate) fn new(media_dir: PathBuf) -> Self {
        Self { media_dir }
    }
}

impl MediaUploader for LocalMediaStore {
    fn upload(&self, local_path: &std::path::Path) -> Option<UploadedMedia> {
        let outcome = (|| -> Result<UploadedMedia> {
            let bytes = std::fs::read(local_path)
                .with_context(|| format!("read upload {}", local_path.display()))?;
            let hash = blake3::hash(&bytes).to_hex().to_string();
            let dest = self.media_dir.join(&hash);
            if !dest.exists() {
                std::fs::create_dir_all(&self.media_dir)
                    .with_context(|| format!("create dir {}", self.media_dir.display()))?;
                std::fs::write(&dest, &bytes)
                    .with_context(|| format!("write {}", dest.display()))?;
            }
            Ok(UploadedMedia {
                url: format!("/media/{hash}"),
            })
        })();

        // The spooled file is consumed in every outcome.
        let _ = std::fs::remove_file(local_path);

        match outcome {
            Ok(media) => Some(media),
            Err(err) => {
                tracing::warn!(error = ?err, "media upload failed");
                None
            }
        }
    }
}
