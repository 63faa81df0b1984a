use axum::{
    Form,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};
use tracing::debug;

use crate::{
    error::AppError::{self, MalformedPayload},
    services::{MarkForm, VerifyForm},
};

pub const EMAIL_FIELD: &str = "email";
pub const BRANCH_FIELD: &str = "branch";
pub const COURSE_NAME_FIELD: &str = "courseName";
pub const COURSE_CODE_FIELD: &str = "courseCode";
pub const IMAGE_FIELD: &str = "image";

const MULTIPART: &str = "multipart/form-data";

/// Reads the login form as multipart (browser `FormData`) or urlencoded. Missing fields stay empty.
pub async fn get_verify_form(request: Request) -> Result<VerifyForm, AppError> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with(MULTIPART));

    if !is_multipart {
        let Form(form) = Form::<VerifyForm>::from_request(request, &())
            .await
            .map_err(|_| MalformedPayload)?;

        return Ok(form);
    }

    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|_| MalformedPayload)?;
    let mut form = VerifyForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|_| MalformedPayload)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        let slot = match name.as_str() {
            EMAIL_FIELD => &mut form.email,
            BRANCH_FIELD => &mut form.branch,
            COURSE_NAME_FIELD => &mut form.course_name,
            COURSE_CODE_FIELD => &mut form.course_code,
            _ => continue,
        };
        *slot = field.text().await.map_err(|_| MalformedPayload)?;
    }

    Ok(form)
}

/// Reads the capture form. Missing fields stay empty, the image is drained and dropped.
pub async fn get_mark_form(mut multipart: Multipart) -> Result<MarkForm, AppError> {
    let mut form = MarkForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|_| MalformedPayload)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            BRANCH_FIELD => form.branch = field.text().await.map_err(|_| MalformedPayload)?,
            COURSE_CODE_FIELD => {
                form.course_code = field.text().await.map_err(|_| MalformedPayload)?
            }
            IMAGE_FIELD => {
                let image = field.bytes().await.map_err(|_| MalformedPayload)?;

                debug!("Discarded captured image of {} bytes", image.len());
            }
            _ => {
                #[cfg(feature = "verbose")]
                debug!("Ignoring unexpected field {name}");
            }
        }
    }

    Ok(form)
}
