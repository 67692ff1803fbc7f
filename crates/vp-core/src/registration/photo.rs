use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use serde::Serialize;

use crate::ids::{PhotoId, VisitorId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoSource {
    Camera,
    File,
}

/// A still image ready for upload, with an inline preview.
///
/// Every instance carries a fresh [`PhotoId`]; a retake produces a new id, which
/// is what invalidates any upload result bound to the previous one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapturedPhoto {
    id: PhotoId,
    source: PhotoSource,
    #[serde(skip)]
    image: Bytes,
    preview_data_uri: String,
}

impl CapturedPhoto {
    pub const MIME_TYPE: &'static str = "image/jpeg";

    pub fn from_jpeg(image: impl Into<Bytes>, source: PhotoSource) -> Self {
        let image = image.into();
        let preview_data_uri = format!("data:{};base64,{}", Self::MIME_TYPE, STANDARD.encode(&image));
        Self {
            id: PhotoId::new(),
            source,
            image,
            preview_data_uri,
        }
    }

    pub fn id(&self) -> &PhotoId {
        &self.id
    }

    pub fn source(&self) -> PhotoSource {
        self.source
    }

    pub fn image(&self) -> &Bytes {
        &self.image
    }

    pub fn preview_data_uri(&self) -> &str {
        &self.preview_data_uri
    }
}

/// Server-assigned identity for an uploaded selfie.
///
/// Bound to the photo instance it was minted for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelfieUploadResult {
    pub visitor_id: VisitorId,
    pub selfie_url: String,
    pub photo_id: PhotoId,
}
