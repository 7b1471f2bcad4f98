use crate::export::Report;
use crate::model::{NewRecord, Record, RecordId, RecordPatch};
use crate::store::{ObjectStore, RecordStore, StoreError};
use chrono::{DateTime, Utc};
use image::ImageFormat;
use std::path::Path;

/// Folder within the bucket that reports are uploaded to
pub const REPORTS_FOLDER: &str = "reports";

/// Folder within the bucket that record photos are uploaded to
pub const PHOTOS_FOLDER: &str = "photos";

/// Uploads finished reports and links them back to the record they were made for
pub struct ReportPublisher<'a> {
    objects: &'a dyn ObjectStore,
    records: &'a dyn RecordStore,
    bucket: String,
}

impl<'a> ReportPublisher<'a> {
    pub fn new<S: Into<String>>(
        objects: &'a dyn ObjectStore,
        records: &'a dyn RecordStore,
        bucket: S,
    ) -> ReportPublisher<'a> {
        ReportPublisher {
            objects,
            records,
            bucket: bucket.into(),
        }
    }

    /// Upload `report` to `{bucket}/reports/{file_name}` and return its public URL. With a
    /// `record`, the URL is also stored as that record's `pdf_url`; if that update fails the
    /// upload stays in place and the error is returned.
    pub fn publish(&self, report: &Report, record: Option<RecordId>) -> Result<String, StoreError> {
        let path = format!("{REPORTS_FOLDER}/{}", report.file_name);
        let url = self
            .objects
            .upload(&self.bucket, &path, &report.bytes, "application/pdf")?;
        log::info!("published {} ({} bytes) to {url}", report.file_name, report.len());

        if let Some(id) = record {
            self.records.update(id, &RecordPatch::pdf_url(url.clone()))?;
            log::debug!("linked report to record #{id}");
        }
        Ok(url)
    }
}

/// A photo picked for a record, not yet uploaded
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl PhotoUpload {
    pub fn new<S: Into<String>>(file_name: S, bytes: Vec<u8>) -> PhotoUpload {
        PhotoUpload {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<PhotoUpload> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(PhotoUpload { file_name, bytes })
    }

    /// The file name without any directories; browsers may send a full client path
    fn base_name(&self) -> &str {
        self.file_name
            .rsplit(['/', '\\'])
            .next()
            .filter(|name| !name.is_empty() && *name != "..")
            .unwrap_or("photo")
    }

    fn content_type(&self) -> &'static str {
        match image::guess_format(&self.bytes) {
            Ok(ImageFormat::Jpeg) => "image/jpeg",
            Ok(ImageFormat::Png) => "image/png",
            Ok(ImageFormat::Gif) => "image/gif",
            Ok(ImageFormat::WebP) => "image/webp",
            Ok(ImageFormat::Bmp) => "image/bmp",
            _ => "application/octet-stream",
        }
    }
}

/// Saves records together with their photos: the photo goes to the object store first and
/// its public URL becomes the record's `photo_url`
pub struct RecordPublisher<'a> {
    objects: &'a dyn ObjectStore,
    records: &'a dyn RecordStore,
    bucket: String,
}

impl<'a> RecordPublisher<'a> {
    pub fn new<S: Into<String>>(
        objects: &'a dyn ObjectStore,
        records: &'a dyn RecordStore,
        bucket: S,
    ) -> RecordPublisher<'a> {
        RecordPublisher {
            objects,
            records,
            bucket: bucket.into(),
        }
    }

    /// Upload `photo` to `{bucket}/photos/{millis}_{file name}` and return its public URL
    pub fn upload_photo(&self, photo: &PhotoUpload, at: DateTime<Utc>) -> Result<String, StoreError> {
        let path = format!("{PHOTOS_FOLDER}/{}_{}", at.timestamp_millis(), photo.base_name());
        let url = self
            .objects
            .upload(&self.bucket, &path, &photo.bytes, photo.content_type())?;
        log::debug!("uploaded photo {} ({} bytes)", path, photo.bytes.len());
        Ok(url)
    }

    /// Insert `record`, uploading `photo` first. A failed upload inserts nothing.
    pub fn insert(&self, mut record: NewRecord, photo: Option<&PhotoUpload>) -> Result<Record, StoreError> {
        if let Some(photo) = photo {
            record.photo_url = Some(self.upload_photo(photo, Utc::now())?);
        }
        let record = self.records.insert(record)?;
        log::info!("saved record #{} for {}", record.id, record.project_name);
        Ok(record)
    }

    /// Apply `patch` to record `id`; a new `photo` is uploaded first and replaces the
    /// record's `photo_url`. A failed upload leaves the record untouched.
    pub fn update(
        &self,
        id: RecordId,
        mut patch: RecordPatch,
        photo: Option<&PhotoUpload>,
    ) -> Result<Record, StoreError> {
        if let Some(photo) = photo {
            patch.photo_url = Some(Some(self.upload_photo(photo, Utc::now())?));
        }
        let record = self.records.update(id, &patch)?;
        log::info!("updated record #{id}");
        Ok(record)
    }
}
