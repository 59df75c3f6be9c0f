use async_trait::async_trait;
use thiserror::Error;

use crate::users::dto::{ImageUpload, UserForm, UserListResponse};
use crate::users::model::User;

/// How a request ended, from the view's perspective. Not-found is kept apart
/// from generic network failure so the detail view can show "deleted or bad
/// link" instead of "check your connection".
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("not found")]
    NotFound,

    /// The server rejected the request (validation, duplicate); carries the
    /// server's message for the toast.
    #[error("{0}")]
    Rejected(String),

    #[error("network error: {0}")]
    Network(String),
}

/// The REST surface the views drive.
#[async_trait]
pub trait DirectoryApi: Send + Sync {
    async fn list_users(
        &self,
        page: u32,
        limit: u32,
        search: &str,
    ) -> Result<UserListResponse, ClientError>;

    async fn get_user(&self, id: &str) -> Result<User, ClientError>;

    async fn create_user(
        &self,
        form: &UserForm,
        image: Option<&ImageUpload>,
    ) -> Result<User, ClientError>;

    async fn update_user(
        &self,
        id: &str,
        form: &UserForm,
        image: Option<&ImageUpload>,
    ) -> Result<User, ClientError>;

    async fn delete_user(&self, id: &str) -> Result<(), ClientError>;

    async fn export_csv(&self) -> Result<Vec<u8>, ClientError>;
}

/// reqwest-backed client talking to the PeopleFlow API.
pub struct HttpDirectoryApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpDirectoryApi {
    /// `base_url` is the server root, e.g. `http://localhost:5000`.
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: format!("{}/api", base_url.trim_end_matches('/')),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Network(err.to_string())
    }
}

/// Maps a non-success response onto the error taxonomy, digging the server's
/// message (or first field error) out of the JSON body when there is one.
async fn check(res: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(ClientError::NotFound);
    }
    if status == reqwest::StatusCode::BAD_REQUEST {
        let message = res
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| {
                body.get("message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
                    .or_else(|| {
                        body.get("errors")?
                            .as_array()?
                            .first()?
                            .get("message")?
                            .as_str()
                            .map(str::to_string)
                    })
            })
            .unwrap_or_else(|| "Request rejected".into());
        return Err(ClientError::Rejected(message));
    }
    Err(ClientError::Network(format!("unexpected status {status}")))
}

fn multipart_form(
    form: &UserForm,
    image: Option<&ImageUpload>,
) -> Result<reqwest::multipart::Form, ClientError> {
    let mut mp = reqwest::multipart::Form::new()
        .text("firstName", form.first_name.clone())
        .text("lastName", form.last_name.clone())
        .text("email", form.email.clone())
        .text("mobile", form.mobile.clone())
        .text("address", form.address.clone())
        .text("gender", form.gender.clone())
        .text("status", form.status.clone());
    if let Some(image) = image {
        let part = reqwest::multipart::Part::bytes(image.bytes.to_vec())
            .file_name("profile")
            .mime_str(&image.content_type)
            .map_err(|e| ClientError::Network(e.to_string()))?;
        mp = mp.part("profile", part);
    }
    Ok(mp)
}

#[async_trait]
impl DirectoryApi for HttpDirectoryApi {
    async fn list_users(
        &self,
        page: u32,
        limit: u32,
        search: &str,
    ) -> Result<UserListResponse, ClientError> {
        let res = self
            .http
            .get(self.url("/users"))
            .query(&[
                ("page", page.to_string()),
                ("limit", limit.to_string()),
                ("search", search.to_string()),
            ])
            .send()
            .await?;
        Ok(check(res).await?.json().await?)
    }

    async fn get_user(&self, id: &str) -> Result<User, ClientError> {
        let res = self.http.get(self.url(&format!("/users/{id}"))).send().await?;
        Ok(check(res).await?.json().await?)
    }

    async fn create_user(
        &self,
        form: &UserForm,
        image: Option<&ImageUpload>,
    ) -> Result<User, ClientError> {
        let res = self
            .http
            .post(self.url("/users"))
            .multipart(multipart_form(form, image)?)
            .send()
            .await?;
        Ok(check(res).await?.json().await?)
    }

    async fn update_user(
        &self,
        id: &str,
        form: &UserForm,
        image: Option<&ImageUpload>,
    ) -> Result<User, ClientError> {
        let res = self
            .http
            .put(self.url(&format!("/users/{id}")))
            .multipart(multipart_form(form, image)?)
            .send()
            .await?;
        Ok(check(res).await?.json().await?)
    }

    async fn delete_user(&self, id: &str) -> Result<(), ClientError> {
        let res = self
            .http
            .delete(self.url(&format!("/users/{id}")))
            .send()
            .await?;
        check(res).await?;
        Ok(())
    }

    async fn export_csv(&self) -> Result<Vec<u8>, ClientError> {
        let res = self.http.get(self.url("/users/export")).send().await?;
        Ok(check(res).await?.bytes().await?.to_vec())
    }
}
