// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image entity: one uploaded raster held by the label server.
//
// `threshold` and `inverted` are updated optimistically: the new value is
// written locally before the request goes out and rolled back if the request
// fails or is abandoned.  Every other field only changes when the server
// reports it.  All mutating methods take `&mut self`, so one instance can
// never have two mutating requests in flight; share an instance between
// tasks through `SharedImage`, whose FIFO lock queues the operations.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use labelwerk_core::error::{LabelwerkError, Result};
use labelwerk_core::types::{Dimensions, ImageFormat, ImageId};
use labelwerk_core::wire::{ImageRecord, InvertRequest, ThresholdRequest};

use crate::session::Session;
use crate::transport::{FilePart, join_url};

/// An image shared between tasks; the mutex serialises mutating calls.
pub type SharedImage = Arc<tokio::sync::Mutex<Image>>;

/// Multipart field the server reads the upload from.
const UPLOAD_FIELD: &str = "file";

/// Local mirror of one server-side image.
///
/// Instances are never cached or shared by id: every [`Image::list`] builds
/// fresh objects, and two instances for the same id evolve independently.
#[derive(Debug)]
pub struct Image {
    id: ImageId,
    file_name: String,
    dimensions: Dimensions,
    original_dimensions: Dimensions,
    length_mm: f64,
    threshold: u8,
    inverted: bool,
    deleted: bool,
    session: Session,
}

impl Image {
    fn from_record(session: &Session, record: ImageRecord) -> Self {
        Self {
            dimensions: record.dimensions(),
            original_dimensions: record.original_dimensions(),
            id: record.id,
            file_name: record.file_name,
            length_mm: record.length_mm,
            threshold: record.threshold,
            inverted: record.inverted,
            deleted: false,
            session: session.clone(),
        }
    }

    // -- Construction --------------------------------------------------------

    /// Fetch every image currently held by the server.
    #[instrument(skip(session))]
    pub async fn list(session: &Session) -> Result<Vec<Image>> {
        let value = session.transport().get("/images").await?;
        let records: Vec<ImageRecord> = serde_json::from_value(value)
            .map_err(|e| LabelwerkError::InvalidResponse(format!("image list: {e}")))?;

        debug!(count = records.len(), "received image list");
        records
            .into_iter()
            .map(|record| {
                record.validate().map_err(LabelwerkError::InvalidResponse)?;
                Ok(Image::from_record(session, record))
            })
            .collect()
    }

    /// Fetch the image with the given id, or fail with `ImageNotFound`.
    pub async fn find(session: &Session, id: &ImageId) -> Result<Image> {
        Image::list(session)
            .await?
            .into_iter()
            .find(|image| &image.id == id)
            .ok_or_else(|| LabelwerkError::ImageNotFound { id: id.to_string() })
    }

    /// Upload raw file bytes and return the image the server created.
    ///
    /// The part's MIME type comes from the file extension; the server refuses
    /// anything that is not `image/*`, so unknown extensions fail here without
    /// a request.  Any failure, including transport errors, is reported as
    /// `LabelwerkError::Upload`.
    #[instrument(skip(session, bytes))]
    pub async fn upload(
        session: &Session,
        bytes: impl Into<Vec<u8>>,
        file_name: &str,
    ) -> Result<Image> {
        let format = ImageFormat::from_file_name(file_name).ok_or_else(|| {
            LabelwerkError::upload(format!("unsupported image type for '{file_name}'"))
        })?;

        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(LabelwerkError::upload(format!("'{file_name}' is empty")));
        }

        let part = FilePart {
            field: UPLOAD_FIELD.to_string(),
            file_name: file_name.to_string(),
            mime_type: format.mime_type().to_string(),
            bytes,
        };

        let value = session
            .transport()
            .post_file("/images", part)
            .await
            .map_err(LabelwerkError::upload_caused_by)?;

        let record: ImageRecord = serde_json::from_value(value)
            .map_err(|e| LabelwerkError::upload(format!("malformed upload response: {e}")))?;
        record.validate().map_err(LabelwerkError::upload)?;

        session.cache().refresh();
        info!(id = %record.id, dimensions = %record.dimensions(), "image uploaded");
        Ok(Image::from_record(session, record))
    }

    /// Delete every image on the server.
    ///
    /// Instances still held elsewhere are not marked deleted; their next call
    /// will fail with a 404 from the server.
    #[instrument(skip(session))]
    pub async fn delete_all(session: &Session) -> Result<()> {
        session.transport().delete("/images").await?;
        session.cache().refresh();
        info!("all images deleted");
        Ok(())
    }

    // -- Accessors -----------------------------------------------------------

    pub fn id(&self) -> &ImageId {
        &self.id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Current processed size, as last reported by the server.
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Size recorded at upload time; never changes.
    pub fn original_dimensions(&self) -> Dimensions {
        self.original_dimensions
    }

    /// Physical print length in millimetres.
    pub fn length_mm(&self) -> f64 {
        self.length_mm
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn inverted(&self) -> bool {
        self.inverted
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Resource URL, `{base}/images/{id}`.
    pub fn url(&self) -> String {
        join_url(self.session.base_url(), &self.path())
    }

    /// Resource URL with the current cache key appended.
    pub fn preview_url(&self) -> String {
        self.session.cache().bust(&self.url())
    }

    /// Wrap this instance for use from several tasks.
    pub fn into_shared(self) -> SharedImage {
        Arc::new(tokio::sync::Mutex::new(self))
    }

    // -- Remote operations ---------------------------------------------------

    /// Download the processed PNG.
    #[instrument(skip(self), fields(id = %self.id))]
    pub async fn fetch_png(&self) -> Result<Vec<u8>> {
        self.ensure_live()?;
        self.session.transport().get_bytes(&self.path()).await
    }

    /// Toggle colour inversion.
    #[instrument(skip(self), fields(id = %self.id))]
    pub async fn invert(&mut self) -> Result<()> {
        self.ensure_live()?;
        let path = self.action_path("invert");
        let next = !self.inverted;
        let body = serde_json::to_value(InvertRequest { invert: next })?;

        let response = optimistic(&mut self.inverted, next, &self.session, &path, body).await?;
        self.absorb(response);
        self.session.cache().refresh();
        debug!(inverted = self.inverted, "inversion confirmed");
        Ok(())
    }

    /// Set the binarisation threshold.
    #[instrument(skip(self), fields(id = %self.id))]
    pub async fn set_threshold(&mut self, threshold: u8) -> Result<()> {
        self.ensure_live()?;
        let path = self.action_path("threshold");
        let body = serde_json::to_value(ThresholdRequest { threshold })?;

        let response =
            optimistic(&mut self.threshold, threshold, &self.session, &path, body).await?;
        self.absorb(response);
        self.session.cache().refresh();
        debug!(threshold = self.threshold, "threshold confirmed");
        Ok(())
    }

    /// Delete this image on the server.
    ///
    /// After success every further call fails with `UseAfterDelete` without
    /// touching the network.  A 404 also marks the instance deleted, since the
    /// backing resource is gone either way, but the error is still returned.
    #[instrument(skip(self), fields(id = %self.id))]
    pub async fn delete(&mut self) -> Result<()> {
        self.ensure_live()?;

        match self.session.transport().delete(&self.path()).await {
            Ok(()) => {
                self.deleted = true;
                self.session.cache().refresh();
                info!("image deleted");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                warn!("image was already gone on the server");
                self.deleted = true;
                self.session.cache().refresh();
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    // -- Helpers -------------------------------------------------------------

    fn ensure_live(&self) -> Result<()> {
        if self.deleted {
            warn!(id = %self.id, "call on deleted image");
            return Err(LabelwerkError::UseAfterDelete {
                id: self.id.to_string(),
            });
        }
        Ok(())
    }

    fn path(&self) -> String {
        format!("/images/{}", self.id)
    }

    fn action_path(&self, action: &str) -> String {
        format!("/images/{}/{action}", self.id)
    }

    /// Adopt server-reported state if the response carries an image record.
    fn absorb(&mut self, response: Value) {
        if response.is_null() {
            return;
        }
        match serde_json::from_value::<ImageRecord>(response) {
            Ok(record) if record.id == self.id && record.validate().is_ok() => {
                self.dimensions = record.dimensions();
                self.length_mm = record.length_mm;
                self.threshold = record.threshold;
                self.inverted = record.inverted;
            }
            Ok(record) => {
                warn!(returned = %record.id, "ignoring response for a different or invalid image");
            }
            Err(e) => debug!(error = %e, "response carries no image record"),
        }
    }
}

/// Write `next` into `slot`, send the request, and restore the previous value
/// unless the server confirms.  Dropping the future also restores it.
async fn optimistic<T: Copy>(
    slot: &mut T,
    next: T,
    session: &Session,
    path: &str,
    body: Value,
) -> Result<Value> {
    let pending = Pending::apply(slot, next);
    match session.transport().post(path, Some(body)).await {
        Ok(response) => {
            pending.confirm();
            Ok(response)
        }
        Err(e) => {
            warn!(path, error = %e, "server rejected update, restoring previous value");
            Err(e)
        }
    }
}

/// Optimistically written value that rolls back on drop unless confirmed.
struct Pending<'a, T: Copy> {
    slot: &'a mut T,
    previous: T,
    confirmed: bool,
}

impl<'a, T: Copy> Pending<'a, T> {
    fn apply(slot: &'a mut T, next: T) -> Self {
        let previous = *slot;
        *slot = next;
        Self {
            slot,
            previous,
            confirmed: false,
        }
    }

    fn confirm(mut self) {
        self.confirmed = true;
    }
}

impl<T: Copy> Drop for Pending<'_, T> {
    fn drop(&mut self) {
        if !self.confirmed {
            *self.slot = self.previous;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::testing::{BASE, ScriptedTransport, label_png_record};
    use crate::transport::Transport;

    async fn uploaded(transport: &Arc<ScriptedTransport>) -> Image {
        transport.reply_json(label_png_record());
        Image::upload(&transport.session(), b"png-bytes".to_vec(), "label.png")
            .await
            .unwrap()
    }

    // -- upload --

    #[tokio::test]
    async fn upload_builds_image_from_response() {
        let transport = ScriptedTransport::new();
        let image = uploaded(&transport).await;

        assert_eq!(image.id().as_str(), "abc");
        assert_eq!(image.file_name(), "label.png");
        assert_eq!(image.dimensions(), Dimensions::new(200, 50));
        assert_eq!(image.original_dimensions(), Dimensions::new(200, 50));
        assert_eq!(image.length_mm(), 25.4);
        assert_eq!(image.threshold(), 128);
        assert!(!image.inverted());

        let call = &transport.calls()[0];
        assert_eq!((call.method, call.path.as_str()), ("POST", "/images"));
        assert_eq!(
            call.body,
            Some(json!({
                "field": "file",
                "file_name": "label.png",
                "mime_type": "image/png",
                "len": 9
            }))
        );
    }

    #[tokio::test]
    async fn upload_bumps_cache() {
        let transport = ScriptedTransport::new();
        let session = transport.session();
        transport.reply_json(label_png_record());
        Image::upload(&session, b"x".to_vec(), "label.png").await.unwrap();
        assert_eq!(session.cache().key(), "cache=1");
    }

    #[tokio::test]
    async fn upload_with_missing_fields_is_upload_error() {
        let transport = ScriptedTransport::new();
        let session = transport.session();
        transport.reply_json(json!({ "file_name": "label.png", "width": 200 }));

        let err = Image::upload(&session, b"x".to_vec(), "label.png").await.unwrap_err();
        assert!(matches!(err, LabelwerkError::Upload { .. }));
        assert_eq!(session.cache().value(), 0);
    }

    #[tokio::test]
    async fn upload_with_empty_id_is_upload_error() {
        let transport = ScriptedTransport::new();
        let mut record = label_png_record();
        record["id"] = json!("");
        transport.reply_json(record);

        let err = Image::upload(&transport.session(), b"x".to_vec(), "label.png")
            .await
            .unwrap_err();
        assert!(matches!(err, LabelwerkError::Upload { .. }));
    }

    #[tokio::test]
    async fn upload_transport_failure_keeps_status() {
        let transport = ScriptedTransport::new();
        transport.reply_status(500, "printer offline");

        let err = Image::upload(&transport.session(), b"x".to_vec(), "label.png")
            .await
            .unwrap_err();
        assert!(matches!(err, LabelwerkError::Upload { .. }));
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn upload_rejects_unknown_type_without_request() {
        let transport = ScriptedTransport::new();
        let err = Image::upload(&transport.session(), b"x".to_vec(), "notes.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, LabelwerkError::Upload { .. }));
        assert_eq!(transport.call_count(), 0);
    }

    // -- optimistic updates --

    #[tokio::test]
    async fn invert_twice_restores_original() {
        let transport = ScriptedTransport::new();
        let mut image = uploaded(&transport).await;
        transport.reply_ok().reply_ok();

        image.invert().await.unwrap();
        assert!(image.inverted());
        image.invert().await.unwrap();
        assert!(!image.inverted());

        let calls = transport.calls();
        assert_eq!(calls[1].path, "/images/abc/invert");
        assert_eq!(calls[1].body, Some(json!({ "invert": true })));
        assert_eq!(calls[2].body, Some(json!({ "invert": false })));
    }

    #[tokio::test]
    async fn failed_invert_rolls_back() {
        let transport = ScriptedTransport::new();
        let mut image = uploaded(&transport).await;
        transport.reply_status(500, "boom");

        let err = image.invert().await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert!(!image.inverted());
    }

    #[tokio::test]
    async fn set_threshold_sends_value() {
        let transport = ScriptedTransport::new();
        let mut image = uploaded(&transport).await;
        transport.reply_ok();

        image.set_threshold(90).await.unwrap();
        assert_eq!(image.threshold(), 90);

        let call = &transport.calls()[1];
        assert_eq!(call.path, "/images/abc/threshold");
        assert_eq!(call.body, Some(json!({ "threshold": 90 })));
    }

    #[tokio::test]
    async fn failed_set_threshold_rolls_back() {
        let transport = ScriptedTransport::new();
        let mut image = uploaded(&transport).await;
        transport.reply_status(404, "Not Found");

        assert!(image.set_threshold(10).await.is_err());
        assert_eq!(image.threshold(), 128);
        assert!(!image.is_deleted());
    }

    #[tokio::test]
    async fn failed_update_does_not_bump_cache() {
        let transport = ScriptedTransport::new();
        let mut image = uploaded(&transport).await;
        let before = image.session.cache().value();
        transport.reply_status(503, "busy");

        let _ = image.set_threshold(10).await;
        assert_eq!(image.session.cache().value(), before);
    }

    #[tokio::test]
    async fn successful_mutations_bump_cache() {
        let transport = ScriptedTransport::new();
        let mut image = uploaded(&transport).await;
        let before = image.session.cache().value();
        transport.reply_ok().reply_ok();

        image.invert().await.unwrap();
        image.set_threshold(64).await.unwrap();
        assert_eq!(image.session.cache().value(), before + 2);
        assert!(image.preview_url().ends_with(&format!("cache={}", before + 2)));
    }

    #[tokio::test]
    async fn server_record_in_response_is_adopted() {
        let transport = ScriptedTransport::new();
        let mut image = uploaded(&transport).await;
        let mut processed = label_png_record();
        processed["width"] = json!(400);
        processed["height"] = json!(100);
        processed["threshold"] = json!(100);
        transport.reply_json(processed);

        image.set_threshold(100).await.unwrap();
        assert_eq!(image.dimensions(), Dimensions::new(400, 100));
        assert_eq!(image.original_dimensions(), Dimensions::new(200, 50));
    }

    /// Transport whose requests never complete.
    struct Stalled;

    #[async_trait]
    impl Transport for Stalled {
        fn base_url(&self) -> &str {
            BASE
        }
        async fn get(&self, _path: &str) -> Result<Value> {
            std::future::pending().await
        }
        async fn get_bytes(&self, _path: &str) -> Result<Vec<u8>> {
            std::future::pending().await
        }
        async fn post(&self, _path: &str, _body: Option<Value>) -> Result<Value> {
            std::future::pending().await
        }
        async fn post_file(&self, _path: &str, _file: FilePart) -> Result<Value> {
            std::future::pending().await
        }
        async fn delete(&self, _path: &str) -> Result<()> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn abandoned_update_rolls_back() {
        let session = Session::with_transport(Arc::new(Stalled));
        let record: ImageRecord = serde_json::from_value(label_png_record()).unwrap();
        let mut image = Image::from_record(&session, record);

        let outcome = tokio::time::timeout(Duration::from_millis(20), image.invert()).await;
        assert!(outcome.is_err());
        assert!(!image.inverted());

        let outcome = tokio::time::timeout(Duration::from_millis(20), image.set_threshold(3)).await;
        assert!(outcome.is_err());
        assert_eq!(image.threshold(), 128);
    }

    // -- delete --

    #[tokio::test]
    async fn calls_after_delete_fail_without_request() {
        let transport = ScriptedTransport::new();
        let mut image = uploaded(&transport).await;
        transport.reply_ok();

        image.delete().await.unwrap();
        assert!(image.is_deleted());
        assert_eq!(transport.calls()[1].method, "DELETE");
        assert_eq!(transport.calls()[1].path, "/images/abc");
        let issued = transport.call_count();

        assert!(matches!(image.invert().await, Err(LabelwerkError::UseAfterDelete { .. })));
        assert!(matches!(
            image.set_threshold(1).await,
            Err(LabelwerkError::UseAfterDelete { .. })
        ));
        assert!(matches!(image.delete().await, Err(LabelwerkError::UseAfterDelete { .. })));
        assert!(matches!(image.fetch_png().await, Err(LabelwerkError::UseAfterDelete { .. })));
        assert_eq!(transport.call_count(), issued);
    }

    #[tokio::test]
    async fn failed_delete_keeps_image_live() {
        let transport = ScriptedTransport::new();
        let mut image = uploaded(&transport).await;
        transport.reply_status(500, "disk error").reply_ok();

        assert!(image.delete().await.is_err());
        assert!(!image.is_deleted());
        image.invert().await.unwrap();
    }

    #[tokio::test]
    async fn delete_of_missing_image_marks_deleted() {
        let transport = ScriptedTransport::new();
        let mut image = uploaded(&transport).await;
        transport.reply_status(404, "");

        let err = image.delete().await.unwrap_err();
        assert!(err.is_not_found());
        assert!(image.is_deleted());
    }

    // -- listing --

    #[tokio::test]
    async fn list_builds_fresh_instances() {
        let transport = ScriptedTransport::new();
        let session = transport.session();
        transport
            .reply_json(json!([label_png_record()]))
            .reply_json(json!([label_png_record()]))
            .reply_ok();

        let mut first = Image::list(&session).await.unwrap();
        let second = Image::list(&session).await.unwrap();
        assert_eq!(first[0].id(), second[0].id());

        first[0].invert().await.unwrap();
        assert!(first[0].inverted());
        assert!(!second[0].inverted());
    }

    #[tokio::test]
    async fn list_rejects_malformed_body() {
        let transport = ScriptedTransport::new();
        transport.reply_json(json!({ "images": [] }));

        let err = Image::list(&transport.session()).await.unwrap_err();
        assert!(matches!(err, LabelwerkError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn find_reports_missing_id() {
        let transport = ScriptedTransport::new();
        transport.reply_json(json!([label_png_record()]));

        let err = Image::find(&transport.session(), &ImageId::from("zzz"))
            .await
            .unwrap_err();
        assert!(matches!(err, LabelwerkError::ImageNotFound { .. }));
    }

    #[tokio::test]
    async fn delete_all_bumps_cache() {
        let transport = ScriptedTransport::new();
        let session = transport.session();
        transport.reply_ok();

        Image::delete_all(&session).await.unwrap();
        assert_eq!(transport.calls()[0].path, "/images");
        assert_eq!(session.cache().value(), 1);
    }

    // -- urls and binary --

    #[tokio::test]
    async fn urls_are_derived_from_id() {
        let transport = ScriptedTransport::new();
        let image = uploaded(&transport).await;
        assert_eq!(image.url(), format!("{BASE}/images/abc"));
        assert_eq!(image.preview_url(), format!("{BASE}/images/abc?cache=1"));
    }

    #[tokio::test]
    async fn fetch_png_reads_resource() {
        let transport = ScriptedTransport::new();
        let image = uploaded(&transport).await;
        transport.reply_bytes(b"\x89PNG\r\n");

        assert_eq!(image.fetch_png().await.unwrap(), b"\x89PNG\r\n");
        assert_eq!(transport.calls()[1].path, "/images/abc");
    }

    // -- concurrency --

    #[tokio::test]
    async fn shared_image_serialises_mutations() {
        let transport = ScriptedTransport::new();
        let shared = uploaded(&transport).await.into_shared();
        transport.reply_ok().reply_ok().reply_ok();

        let a = {
            let image = shared.clone();
            tokio::spawn(async move { image.lock().await.invert().await })
        };
        let b = {
            let image = shared.clone();
            tokio::spawn(async move { image.lock().await.set_threshold(42).await })
        };
        let c = {
            let image = shared.clone();
            tokio::spawn(async move { image.lock().await.invert().await })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();
        c.await.unwrap().unwrap();

        let image = shared.lock().await;
        assert!(!image.inverted());
        assert_eq!(image.threshold(), 42);

        // Each invert request carried the state left by the one before it.
        let inverts: Vec<_> = transport
            .calls()
            .into_iter()
            .filter(|call| call.path.ends_with("/invert"))
            .map(|call| call.body)
            .collect();
        assert_eq!(
            inverts,
            vec![Some(json!({ "invert": true })), Some(json!({ "invert": false }))]
        );
    }
}
