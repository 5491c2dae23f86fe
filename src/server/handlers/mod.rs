// src/server/handlers/mod.rs
//! HTTP request handlers for the Larder server

pub mod admin;
pub mod creation;
pub mod recipes;
pub mod site;

use crate::store::OpenArchive;
use axum::{
    body::Body,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;

/// Stream an opened archive as an attachment
pub(crate) fn archive_response(archive: OpenArchive) -> Response {
    let headers = [
        (header::CONTENT_TYPE, "application/gzip".to_string()),
        (header::CONTENT_LENGTH, archive.len.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", archive.file_name),
        ),
    ];
    let body = Body::from_stream(ReaderStream::new(archive.file));
    (StatusCode::OK, headers, body).into_response()
}
