use std::{path::Path, sync::Arc};

use axum::{
    extract::{Multipart, Request, State as AxumState},
    http::{StatusCode, header::LOCATION},
    response::{Html, IntoResponse, Response},
};

use crate::{
    error::AppError,
    seed::seed,
    services::{mark_attendance, verify_teacher},
    state::State,
    utils::{get_mark_form, get_verify_form},
};

pub const LOGIN_PAGE: &str = "login.html";
pub const CAPTURE_PAGE: &str = "camera-access.html";

pub const MARKED: &str = "Attendance successfully marked.";
pub const SEEDED: &str = "Mock data seeded successfully.";

pub async fn login_handler(AxumState(state): AxumState<Arc<State>>) -> Result<Response, AppError> {
    serve_page(&state.config.public_dir, LOGIN_PAGE)
        .await
        .map_err(AppError::Page)
}

pub async fn capture_handler(
    AxumState(state): AxumState<Arc<State>>,
) -> Result<Response, AppError> {
    serve_page(&state.config.public_dir, CAPTURE_PAGE)
        .await
        .map_err(AppError::Page)
}

pub async fn verify_handler(
    AxumState(state): AxumState<Arc<State>>,
    request: Request,
) -> Result<Response, AppError> {
    let form = get_verify_form(request).await?;

    let verified = verify_teacher(state.store.as_ref(), &form)
        .await
        .map_err(AppError::Verify)?;

    if !verified {
        return Ok((StatusCode::FOUND, [(LOCATION, state.config.reject_url.clone())]).into_response());
    }

    serve_page(&state.config.public_dir, CAPTURE_PAGE)
        .await
        .map_err(AppError::VerifyPage)
}

pub async fn mark_handler(
    AxumState(state): AxumState<Arc<State>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = get_mark_form(multipart).await?;

    mark_attendance(state.store.as_ref(), &form)
        .await
        .map_err(AppError::Mark)?;

    Ok((StatusCode::OK, MARKED))
}

pub async fn seed_handler(
    AxumState(state): AxumState<Arc<State>>,
) -> Result<impl IntoResponse, AppError> {
    seed(state.store.as_ref()).await.map_err(AppError::Seed)?;

    Ok((StatusCode::OK, SEEDED))
}

async fn serve_page(public_dir: &Path, page: &str) -> Result<Response, std::io::Error> {
    let html = tokio::fs::read_to_string(public_dir.join(page)).await?;

    Ok(Html(html).into_response())
}
