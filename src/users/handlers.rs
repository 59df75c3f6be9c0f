use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use time::format_description::well_known::Rfc3339;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;
use crate::users::dto::{ImageUpload, ListParams, MessageResponse, UserForm, UserListResponse};
use crate::users::model::{Gender, NewUser, Status, User, UserChanges};
use crate::users::store::ListQuery;
use crate::users::validate::{validate_form, validate_image, FormMode};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/export", get(export_users))
        .route("/users/:id", get(get_user))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/:id", put(update_user).delete(delete_user))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
}

fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::BadRequest("Invalid user id".into()))
}

/// Pulls the text fields and the optional `profile` file out of a multipart
/// body. Unknown fields are ignored; an empty file part counts as no file.
async fn read_user_form(mut mp: Multipart) -> Result<(UserForm, Option<ImageUpload>), ApiError> {
    let mut form = UserForm::blank();
    let mut image = None;

    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed form data: {e}")))?
    {
        let Some(name) = field.name().map(|s| s.to_string()) else {
            continue;
        };
        if name == "profile" {
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".into());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Could not read profile file: {e}")))?;
            if !bytes.is_empty() {
                image = Some(ImageUpload { bytes, content_type });
            }
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Malformed form data: {e}")))?;
            match name.as_str() {
                "firstName" => form.first_name = value,
                "lastName" => form.last_name = value,
                "email" => form.email = value,
                "mobile" => form.mobile = value,
                "address" => form.address = value,
                "gender" => form.gender = value,
                "status" => form.status = value,
                _ => {}
            }
        }
    }

    Ok((form, image))
}

/// Converts a vetted form into store field values. Email is lowercased so the
/// unique index is case-insensitive in effect.
fn to_new_user(form: &UserForm, profile_image_url: String) -> anyhow::Result<NewUser> {
    Ok(NewUser {
        first_name: form.first_name.trim().to_string(),
        last_name: form.last_name.trim().to_string(),
        email: form.email.trim().to_lowercase(),
        mobile: form.mobile.trim().to_string(),
        address: form.address.trim().to_string(),
        gender: Gender::parse(form.gender.trim())
            .ok_or_else(|| anyhow::anyhow!("gender not vetted before conversion"))?,
        status: Status::parse(form.status.trim())
            .ok_or_else(|| anyhow::anyhow!("status not vetted before conversion"))?,
        profile_image_url,
    })
}

#[instrument(skip(state))]
async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<UserListResponse>, ApiError> {
    let limit = params.limit.max(1);
    let page = params.page.max(1);
    let query = ListQuery {
        search: params.search.filter(|s| !s.trim().is_empty()),
        page,
        limit,
    };
    let result = state.store.list(&query).await?;
    let total_pages = (result.total).div_ceil(u64::from(limit)) as u32;
    Ok(Json(UserListResponse {
        users: result.users,
        current_page: page,
        total_pages,
        total_users: result.total,
    }))
}

#[instrument(skip(state))]
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let id = parse_id(&id)?;
    let user = state.store.get(id).await?;
    Ok(Json(user))
}

#[instrument(skip(state, mp))]
async fn create_user(
    State(state): State<AppState>,
    mp: Multipart,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let (form, image) = read_user_form(mp).await?;

    let mut errors = validate_form(&form);
    errors.extend(validate_image(image.as_ref(), FormMode::Create));
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }
    let image = image.ok_or_else(|| anyhow::anyhow!("image vetted but missing"))?;

    let url = state
        .media
        .upload(image.bytes, &image.content_type)
        .await
        .map_err(ApiError::Internal)?;

    let user = state.store.create(to_new_user(&form, url)?).await?;
    info!(user_id = %user.id, email = %user.email, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, mp))]
async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    mp: Multipart,
) -> Result<Json<User>, ApiError> {
    let id = parse_id(&id)?;
    let (form, image) = read_user_form(mp).await?;

    let mut errors = validate_form(&form);
    errors.extend(validate_image(image.as_ref(), FormMode::Edit));
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let existing = state.store.get(id).await?;

    let new_url = match image {
        Some(image) => Some(
            state
                .media
                .upload(image.bytes, &image.content_type)
                .await
                .map_err(ApiError::Internal)?,
        ),
        None => None,
    };
    let replacing_image = new_url.is_some();

    let fields = to_new_user(&form, String::new())?;
    let user = state
        .store
        .update(
            id,
            UserChanges {
                first_name: Some(fields.first_name),
                last_name: Some(fields.last_name),
                email: Some(fields.email),
                mobile: Some(fields.mobile),
                address: Some(fields.address),
                gender: Some(fields.gender),
                status: Some(fields.status),
                profile_image_url: new_url,
            },
        )
        .await?;

    // Release the superseded image in the background. Losing this race only
    // orphans an object on the media host; the update itself already stuck.
    if replacing_image {
        let media = state.media.clone();
        let old_url = existing.profile_image_url;
        tokio::spawn(async move {
            if let Err(e) = media.delete_by_url(&old_url).await {
                warn!(error = %e, url = %old_url, "failed to release replaced profile image");
            }
        });
    }

    info!(user_id = %user.id, "user updated");
    Ok(Json(user))
}

#[instrument(skip(state))]
async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    state.store.delete(id).await?;
    info!(user_id = %id, "user deleted");
    Ok(Json(MessageResponse {
        message: "User deleted successfully".into(),
    }))
}

/// Fixed column order of the CSV export.
const CSV_COLUMNS: [&str; 8] = [
    "firstName", "lastName", "email", "mobile", "gender", "status", "address", "createdAt",
];

fn users_to_csv(users: &[User]) -> anyhow::Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_COLUMNS)?;
    for user in users {
        let created_at = user.created_at.format(&Rfc3339)?;
        writer.write_record([
            user.first_name.as_str(),
            user.last_name.as_str(),
            user.email.as_str(),
            user.mobile.as_str(),
            user.gender.as_str(),
            user.status.as_str(),
            user.address.as_str(),
            created_at.as_str(),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("csv buffer: {e}"))
}

#[instrument(skip(state))]
async fn export_users(State(state): State<AppState>) -> Result<Response, ApiError> {
    let users = state.store.all().await?;
    if users.is_empty() {
        return Err(ApiError::NotFound("No users found to export".into()));
    }
    let body = users_to_csv(&users).map_err(ApiError::Internal)?;
    let headers = [
        (header::CONTENT_TYPE, "text/csv"),
        (header::CONTENT_DISPOSITION, "attachment; filename=users.csv"),
    ];
    Ok((headers, body).into_response())
}
