use std::path::Path;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadedMedia {
    pub url: String,
}

/// External media-upload collaborator.
///
/// `None` signals upload failure. Implementations consume the local file:
/// it must be gone afterwards whether or not the upload succeeded, so a
/// failed request never strands spooled bytes on disk.
pub trait MediaUploader: Send + Sync {
    fn upload(&self, local_path: &Path) -> Option<UploadedMedia>;
}
