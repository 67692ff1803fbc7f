use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use vp_core::ports::{ApiError, SelfieUploadPort};
use vp_core::{CapturedPhoto, PhotoId, SelfieUploadResult, ValidationError, WizardError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("an upload is already in progress")]
    InFlight,
    /// The photo was retaken or cleared while the upload was outstanding.
    #[error("photo was replaced during upload")]
    Superseded,
}

impl UploadError {
    pub fn into_wizard_error(self) -> Option<WizardError> {
        match self {
            Self::Api(err) => Some(err.into()),
            Self::InFlight => Some(ValidationError::RequestInFlight.into()),
            Self::Superseded => None,
        }
    }
}

#[derive(Default)]
struct UploadInner {
    current: Option<PhotoId>,
    pending: Option<PhotoId>,
    cached: Option<SelfieUploadResult>,
}

/// Uploads the selfie once per photo instance.
///
/// The result is bound to the photo it was minted for; `invalidate` drops it
/// and turns any outstanding upload into [`UploadError::Superseded`].
pub struct PhotoUploadPipeline {
    api: Arc<dyn SelfieUploadPort>,
    inner: Mutex<UploadInner>,
}

impl PhotoUploadPipeline {
    pub fn new(api: Arc<dyn SelfieUploadPort>) -> Self {
        Self {
            api,
            inner: Mutex::new(UploadInner::default()),
        }
    }

    pub async fn upload(&self, photo: &CapturedPhoto) -> Result<SelfieUploadResult, UploadError> {
        let photo_id = photo.id().clone();
        {
            let mut inner = self.lock();
            if let Some(cached) = inner
                .cached
                .as_ref()
                .filter(|cached| cached.photo_id == photo_id)
            {
                debug!(photo_id = %photo_id, "selfie already uploaded");
                return Ok(cached.clone());
            }
            if inner.pending.is_some() {
                return Err(UploadError::InFlight);
            }
            inner.current = Some(photo_id.clone());
            inner.pending = Some(photo_id.clone());
            inner.cached = None;
        }

        let result = self.api.upload_selfie(photo.image().clone()).await;

        let mut inner = self.lock();
        if inner.pending.as_ref() == Some(&photo_id) {
            inner.pending = None;
        }
        if inner.current.as_ref() != Some(&photo_id) {
            debug!(photo_id = %photo_id, "dropping upload result for replaced photo");
            return Err(UploadError::Superseded);
        }

        match result {
            Ok(upload) => {
                let selfie = SelfieUploadResult {
                    visitor_id: upload.visitor_id,
                    selfie_url: upload.selfie_url,
                    photo_id,
                };
                inner.cached = Some(selfie.clone());
                info!(visitor_id = %selfie.visitor_id, "selfie uploaded");
                Ok(selfie)
            }
            Err(err) => {
                warn!(photo_id = %photo_id, error = %err, "selfie upload failed");
                Err(err.into())
            }
        }
    }

    pub fn cached(&self) -> Option<SelfieUploadResult> {
        self.lock().cached.clone()
    }

    pub fn invalidate(&self) {
        *self.lock() = UploadInner::default();
    }

    fn lock(&self) -> MutexGuard<'_, UploadInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;
    use vp_core::ports::SelfieUpload;
    use vp_core::{PhotoSource, VisitorId};

    struct GatedUploads {
        calls: AtomicUsize,
        release: Notify,
        gated: bool,
    }

    impl GatedUploads {
        fn new(gated: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                release: Notify::new(),
                gated,
            })
        }
    }

    #[async_trait]
    impl SelfieUploadPort for GatedUploads {
        async fn upload_selfie(&self, _jpeg: Bytes) -> Result<SelfieUpload, ApiError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.gated {
                self.release.notified().await;
            }
            Ok(SelfieUpload {
                visitor_id: VisitorId::from(format!("V{n}")),
                selfie_url: format!("https://cdn.example.com/V{n}.jpg"),
            })
        }
    }

    fn photo(byte: u8) -> CapturedPhoto {
        CapturedPhoto::from_jpeg(vec![byte], PhotoSource::Camera)
    }

    #[tokio::test]
    async fn upload_is_cached_per_photo_instance() {
        let api = GatedUploads::new(false);
        let pipeline = PhotoUploadPipeline::new(api.clone());
        let shot = photo(1);

        let first = pipeline.upload(&shot).await.expect("upload");
        let second = pipeline.upload(&shot).await.expect("cached");

        assert_eq!(first, second);
        assert_eq!(first.photo_id, *shot.id());
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn new_photo_uploads_again() {
        let api = GatedUploads::new(false);
        let pipeline = PhotoUploadPipeline::new(api.clone());

        let first = pipeline.upload(&photo(1)).await.expect("first");
        let second = pipeline.upload(&photo(2)).await.expect("second");

        assert_ne!(first.visitor_id, second.visitor_id);
        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_during_upload_supersedes_result() {
        let api = GatedUploads::new(true);
        let pipeline = Arc::new(PhotoUploadPipeline::new(api.clone()));
        let shot = photo(1);

        let task = {
            let pipeline = Arc::clone(&pipeline);
            let shot = shot.clone();
            tokio::spawn(async move { pipeline.upload(&shot).await })
        };
        while api.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        assert_eq!(
            pipeline.upload(&photo(2)).await,
            Err(UploadError::InFlight)
        );

        pipeline.invalidate();
        api.release.notify_one();

        assert_eq!(task.await.expect("join"), Err(UploadError::Superseded));
        assert!(pipeline.cached().is_none());
    }
}
