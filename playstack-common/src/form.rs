//! Multipart form submissions
//!
//! Both services accept the same form: an optional `url` text field and an
//! optional `file` upload. Unknown fields are ignored.

use crate::acquire::{AcquireError, InputSource};
use axum::extract::multipart::{Multipart, MultipartError};
use bytes::Bytes;

pub const URL_FIELD: &str = "url";
pub const FILE_FIELD: &str = "file";

/// Raw form fields as submitted
#[derive(Debug, Default, Clone)]
pub struct Submission {
    pub url: Option<String>,
    /// (file name, content); absent when the file input was left empty
    pub upload: Option<(String, Bytes)>,
}

impl Submission {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, MultipartError> {
        let mut submission = Submission::default();
        while let Some(field) = multipart.next_field().await? {
            match field.name() {
                Some(URL_FIELD) => {
                    submission.url = Some(field.text().await?);
                }
                Some(FILE_FIELD) => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let bytes = field.bytes().await?;
                    // Browsers send an unnamed empty part for an empty file input
                    if !file_name.is_empty() {
                        submission.upload = Some((file_name, bytes));
                    }
                }
                _ => {}
            }
        }
        Ok(submission)
    }

    /// Resolve to one input; the URL wins when both are present
    pub fn into_source(self) -> Result<InputSource, AcquireError> {
        InputSource::from_form(self.url, self.upload)
    }
}
