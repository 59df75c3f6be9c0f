use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::users::model::User;

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    10
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListResponse {
    pub users: Vec<User>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_users: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Text fields of the create/edit form, as they arrive in the multipart body
/// (and as the form view holds them before submit). Enumerations stay raw
/// strings here; validation vets them before they are parsed into model types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile: String,
    pub address: String,
    pub gender: String,
    pub status: String,
}

impl UserForm {
    /// Form with the same defaults the original registration form starts from.
    pub fn blank() -> Self {
        Self {
            status: "Active".into(),
            ..Default::default()
        }
    }
}

/// An image file pulled out of a multipart request or picked in the form view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub bytes: Bytes,
    pub content_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_params_default_to_first_page_of_ten() {
        let params: ListParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, 10);
        assert!(params.search.is_none());
    }

    #[test]
    fn blank_form_starts_active() {
        assert_eq!(UserForm::blank().status, "Active");
        assert!(UserForm::blank().gender.is_empty());
    }
}
