//! View-state machines for the directory frontend.
//!
//! Each view is a pure state machine: discrete events go in, effects come
//! out, and the only suspension points are the network effects. Every fetch
//! carries a sequence number so a response that arrives after a newer fetch
//! was issued is dropped instead of overwriting fresher state.

pub mod client;
pub mod detail;
pub mod form;
pub mod list;

/// A transient toast surfaced to the user. Every failure ends up here; the
/// client never swallows an error silently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::users::dto::{ImageUpload, UserForm, UserListResponse};
    use crate::users::model::{Gender, Status, User};
    use time::OffsetDateTime;
    use uuid::Uuid;

    use super::client::{ClientError, DirectoryApi};

    pub fn sample_user(first_name: &str) -> User {
        User {
            id: Uuid::new_v4(),
            first_name: first_name.into(),
            last_name: "Verma".into(),
            email: format!("{}@example.com", first_name.to_lowercase()),
            mobile: "9123456789".into(),
            address: "12 MG Road".into(),
            gender: Gender::Female,
            status: Status::Active,
            profile_image_url: "https://media.local/p/user-profiles/a".into(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    /// Scripted [`DirectoryApi`] for driving `perform` in tests.
    #[derive(Default)]
    pub struct ScriptedApi {
        pub list_responses: Mutex<VecDeque<Result<UserListResponse, ClientError>>>,
        pub get_responses: Mutex<VecDeque<Result<User, ClientError>>>,
        pub delete_responses: Mutex<VecDeque<Result<(), ClientError>>>,
    }

    impl ScriptedApi {
        fn next<T>(queue: &Mutex<VecDeque<Result<T, ClientError>>>) -> Result<T, ClientError> {
            queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ClientError::Network("no scripted response".into())))
        }
    }

    #[async_trait]
    impl DirectoryApi for ScriptedApi {
        async fn list_users(
            &self,
            _page: u32,
            _limit: u32,
            _search: &str,
        ) -> Result<UserListResponse, ClientError> {
            Self::next(&self.list_responses)
        }

        async fn get_user(&self, _id: &str) -> Result<User, ClientError> {
            Self::next(&self.get_responses)
        }

        async fn create_user(
            &self,
            _form: &UserForm,
            _image: Option<&ImageUpload>,
        ) -> Result<User, ClientError> {
            Self::next(&self.get_responses)
        }

        async fn update_user(
            &self,
            _id: &str,
            _form: &UserForm,
            _image: Option<&ImageUpload>,
        ) -> Result<User, ClientError> {
            Self::next(&self.get_responses)
        }

        async fn delete_user(&self, _id: &str) -> Result<(), ClientError> {
            Self::next(&self.delete_responses)
        }

        async fn export_csv(&self) -> Result<Vec<u8>, ClientError> {
            Ok(b"firstName\n".to_vec())
        }
    }
}
