// src/server/handlers/creation.rs
//! Recipe submission endpoints

use crate::recipe::{GithubForm, NewRecipeForm, UploadedFile};
use crate::runtime;
use crate::server::{ApiError, Notice, ServerState};
use axum::{
    Form,
    extract::{Multipart, State, multipart::MultipartError},
};
use std::sync::Arc;

const SUBMITTED: &str =
    "Successfully created your new recipe. We will now verify your recipe before publishing it.";

fn multipart_error(err: MultipartError) -> ApiError {
    ApiError::new(err.status(), err.body_text())
}

/// POST /new
///
/// Multipart fields `id`, `name`, `author`, `png`, `svg` plus one or more
/// `files` parts.
pub async fn create(
    State(state): State<Arc<ServerState>>,
    mut multipart: Multipart,
) -> Result<Notice, ApiError> {
    let mut form = NewRecipeForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "files" | "files[]" => {
                let file_name = field.file_name().map(str::to_string);
                let contents = field.bytes().await.map_err(multipart_error)?;
                // Browsers send an empty nameless part when no file was picked
                if let Some(file_name) = file_name.filter(|n| !n.is_empty()) {
                    form.files.push(UploadedFile {
                        file_name,
                        contents: contents.to_vec(),
                    });
                }
            }
            "id" | "name" | "author" | "png" | "svg" => {
                let value = field.text().await.map_err(multipart_error)?;
                let slot = match name.as_str() {
                    "id" => &mut form.id,
                    "name" => &mut form.name,
                    "author" => &mut form.author,
                    "png" => &mut form.png,
                    _ => &mut form.svg,
                };
                *slot = Some(value);
            }
            _ => {}
        }
    }

    let creation = state.creation.clone();
    runtime::blocking(move || creation.create(&form)).await?;
    Ok(Notice::success(SUBMITTED))
}

/// POST /github
pub async fn github(
    State(state): State<Arc<ServerState>>,
    Form(form): Form<GithubForm>,
) -> Result<Notice, ApiError> {
    state.creation.import(&state.importer, &form).await?;
    Ok(Notice::success(SUBMITTED))
}
