use uuid::Uuid;

use crate::ui::client::{ClientError, DirectoryApi};
use crate::ui::Notice;
use crate::users::dto::UserListResponse;
use crate::users::model::User;

const PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListPhase {
    Loading,
    Loaded,
    Empty,
    Error(String),
}

#[derive(Debug)]
pub enum ListEvent {
    PageChanged(u32),
    SearchEdited(String),
    /// Explicit submit; typing alone never triggers a fetch.
    SearchSubmitted,
    DeleteRequested(Uuid),
    DeleteConfirmed,
    DeleteCancelled,
    ExportRequested,
    UsersArrived {
        seq: u64,
        outcome: Result<UserListResponse, ClientError>,
    },
    DeleteFinished {
        id: Uuid,
        outcome: Result<(), ClientError>,
    },
    ExportFinished {
        outcome: Result<Vec<u8>, ClientError>,
    },
}

#[derive(Debug, PartialEq, Eq)]
pub enum ListEffect {
    FetchUsers {
        seq: u64,
        page: u32,
        limit: u32,
        search: String,
    },
    DeleteUser {
        id: Uuid,
    },
    ExportCsv,
    SaveFile {
        name: String,
        bytes: Vec<u8>,
    },
    Notify(Notice),
}

/// List view: paginated, searchable table with confirm-gated deletion.
#[derive(Debug)]
pub struct ListView {
    pub phase: ListPhase,
    pub rows: Vec<User>,
    pub page: u32,
    pub total_pages: u32,
    pub total_users: u64,
    pub search_input: String,
    /// Search text actually in effect (set on submit, not per keystroke).
    query: String,
    /// Row awaiting confirmation; `Some` means the confirm modal is open.
    pending_delete: Option<Uuid>,
    fetch_seq: u64,
}

impl ListView {
    pub fn new() -> (Self, Vec<ListEffect>) {
        let mut view = Self {
            phase: ListPhase::Loading,
            rows: Vec::new(),
            page: 1,
            total_pages: 1,
            total_users: 0,
            search_input: String::new(),
            query: String::new(),
            pending_delete: None,
            fetch_seq: 0,
        };
        let fetch = view.start_fetch();
        (view, vec![fetch])
    }

    pub fn confirming_delete(&self) -> Option<Uuid> {
        self.pending_delete
    }

    fn start_fetch(&mut self) -> ListEffect {
        self.fetch_seq += 1;
        self.phase = ListPhase::Loading;
        ListEffect::FetchUsers {
            seq: self.fetch_seq,
            page: self.page,
            limit: PAGE_SIZE,
            search: self.query.clone(),
        }
    }

    pub fn handle(&mut self, event: ListEvent) -> Vec<ListEffect> {
        match event {
            ListEvent::PageChanged(page) => {
                if page == self.page {
                    return Vec::new();
                }
                self.page = page;
                vec![self.start_fetch()]
            }
            ListEvent::SearchEdited(text) => {
                self.search_input = text;
                Vec::new()
            }
            ListEvent::SearchSubmitted => {
                self.query = self.search_input.trim().to_string();
                self.page = 1;
                vec![self.start_fetch()]
            }
            ListEvent::DeleteRequested(id) => {
                self.pending_delete = Some(id);
                Vec::new()
            }
            ListEvent::DeleteCancelled => {
                self.pending_delete = None;
                Vec::new()
            }
            ListEvent::DeleteConfirmed => match self.pending_delete.take() {
                Some(id) => vec![ListEffect::DeleteUser { id }],
                None => Vec::new(),
            },
            ListEvent::ExportRequested => vec![ListEffect::ExportCsv],
            ListEvent::UsersArrived { seq, outcome } => {
                if seq != self.fetch_seq {
                    // A newer fetch is already in flight; this response is stale.
                    return Vec::new();
                }
                match outcome {
                    Ok(data) => {
                        self.rows = data.users;
                        self.total_pages = data.total_pages;
                        self.total_users = data.total_users;
                        self.phase = if self.rows.is_empty() {
                            ListPhase::Empty
                        } else {
                            ListPhase::Loaded
                        };
                    }
                    Err(_) => {
                        self.phase = ListPhase::Error(
                            "Failed to fetch users. Please make sure the server is running."
                                .into(),
                        );
                    }
                }
                Vec::new()
            }
            ListEvent::DeleteFinished { id, outcome } => match outcome {
                Ok(()) => {
                    self.rows.retain(|u| u.id != id);
                    self.total_users = self.total_users.saturating_sub(1);
                    let mut effects =
                        vec![ListEffect::Notify(Notice::Success("User deleted successfully!".into()))];
                    if self.rows.is_empty() {
                        if self.page > 1 {
                            // The last row on this page is gone; step back one.
                            self.page -= 1;
                            effects.push(self.start_fetch());
                        } else {
                            self.phase = ListPhase::Empty;
                        }
                    }
                    effects
                }
                Err(_) => vec![ListEffect::Notify(Notice::Error(
                    "Failed to delete user.".into(),
                ))],
            },
            ListEvent::ExportFinished { outcome } => match outcome {
                Ok(bytes) => vec![
                    ListEffect::SaveFile {
                        name: "users.csv".into(),
                        bytes,
                    },
                    ListEffect::Notify(Notice::Success("Users exported successfully!".into())),
                ],
                Err(_) => vec![ListEffect::Notify(Notice::Error(
                    "Failed to export users.".into(),
                ))],
            },
        }
    }
}

/// Executes one network effect and feeds the result back as an event.
/// `SaveFile` and `Notify` are for the rendering layer and produce nothing.
pub async fn perform(api: &dyn DirectoryApi, effect: ListEffect) -> Option<ListEvent> {
    match effect {
        ListEffect::FetchUsers {
            seq,
            page,
            limit,
            search,
        } => Some(ListEvent::UsersArrived {
            seq,
            outcome: api.list_users(page, limit, &search).await,
        }),
        ListEffect::DeleteUser { id } => Some(ListEvent::DeleteFinished {
            id,
            outcome: api.delete_user(&id.to_string()).await,
        }),
        ListEffect::ExportCsv => Some(ListEvent::ExportFinished {
            outcome: api.export_csv().await,
        }),
        ListEffect::SaveFile { .. } | ListEffect::Notify(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::testing::{sample_user, ScriptedApi};

    fn page_of(users: Vec<User>, total_pages: u32, total_users: u64) -> UserListResponse {
        UserListResponse {
            users,
            current_page: 1,
            total_pages,
            total_users,
        }
    }

    fn loaded_view(users: Vec<User>) -> ListView {
        let (mut view, effects) = ListView::new();
        let seq = match effects[0] {
            ListEffect::FetchUsers { seq, .. } => seq,
            _ => unreachable!(),
        };
        let total = users.len() as u64;
        view.handle(ListEvent::UsersArrived {
            seq,
            outcome: Ok(page_of(users, 1, total)),
        });
        view
    }

    #[test]
    fn starts_loading_with_an_initial_fetch() {
        let (view, effects) = ListView::new();
        assert_eq!(view.phase, ListPhase::Loading);
        assert!(matches!(
            effects[0],
            ListEffect::FetchUsers { page: 1, .. }
        ));
    }

    #[test]
    fn empty_result_lands_in_empty_phase() {
        let view = loaded_view(Vec::new());
        assert_eq!(view.phase, ListPhase::Empty);
    }

    #[test]
    fn typing_does_not_fetch_but_submit_does_and_resets_page() {
        let mut view = loaded_view(vec![sample_user("Asha")]);
        view.page = 3;
        assert!(view.handle(ListEvent::SearchEdited("ann".into())).is_empty());
        let effects = view.handle(ListEvent::SearchSubmitted);
        match &effects[0] {
            ListEffect::FetchUsers { page, search, .. } => {
                assert_eq!(*page, 1);
                assert_eq!(search, "ann");
            }
            other => panic!("unexpected effect {other:?}"),
        }
    }

    #[test]
    fn stale_fetch_response_is_dropped() {
        let (mut view, effects) = ListView::new();
        let first_seq = match effects[0] {
            ListEffect::FetchUsers { seq, .. } => seq,
            _ => unreachable!(),
        };
        // A page change supersedes the initial fetch before it resolves.
        view.handle(ListEvent::PageChanged(2));
        view.handle(ListEvent::UsersArrived {
            seq: first_seq,
            outcome: Ok(page_of(vec![sample_user("Stale")], 5, 41)),
        });
        assert_eq!(view.phase, ListPhase::Loading);
        assert!(view.rows.is_empty());
    }

    #[test]
    fn fetch_failure_lands_in_error_phase() {
        let (mut view, effects) = ListView::new();
        let seq = match effects[0] {
            ListEffect::FetchUsers { seq, .. } => seq,
            _ => unreachable!(),
        };
        view.handle(ListEvent::UsersArrived {
            seq,
            outcome: Err(ClientError::Network("refused".into())),
        });
        assert!(matches!(view.phase, ListPhase::Error(_)));
    }

    #[test]
    fn delete_needs_explicit_confirmation() {
        let user = sample_user("Asha");
        let id = user.id;
        let mut view = loaded_view(vec![user]);

        assert!(view.handle(ListEvent::DeleteRequested(id)).is_empty());
        assert_eq!(view.confirming_delete(), Some(id));

        // Cancelling closes the modal and fires nothing.
        view.handle(ListEvent::DeleteCancelled);
        assert!(view.handle(ListEvent::DeleteConfirmed).is_empty());

        view.handle(ListEvent::DeleteRequested(id));
        let effects = view.handle(ListEvent::DeleteConfirmed);
        assert_eq!(effects, vec![ListEffect::DeleteUser { id }]);
        assert_eq!(view.confirming_delete(), None);
    }

    #[test]
    fn delete_success_removes_row_locally() {
        let users = vec![sample_user("Asha"), sample_user("Bela")];
        let id = users[0].id;
        let mut view = loaded_view(users);
        let effects = view.handle(ListEvent::DeleteFinished { id, outcome: Ok(()) });
        assert_eq!(view.rows.len(), 1);
        assert!(effects
            .iter()
            .any(|e| matches!(e, ListEffect::Notify(Notice::Success(_)))));
        assert!(!effects.iter().any(|e| matches!(e, ListEffect::FetchUsers { .. })));
    }

    #[test]
    fn deleting_last_row_beyond_page_one_steps_back() {
        let user = sample_user("Asha");
        let id = user.id;
        let mut view = loaded_view(vec![user]);
        view.page = 2;
        let effects = view.handle(ListEvent::DeleteFinished { id, outcome: Ok(()) });
        assert_eq!(view.page, 1);
        assert!(effects
            .iter()
            .any(|e| matches!(e, ListEffect::FetchUsers { page: 1, .. })));
    }

    #[test]
    fn delete_failure_only_toasts() {
        let user = sample_user("Asha");
        let id = user.id;
        let mut view = loaded_view(vec![user]);
        let effects = view.handle(ListEvent::DeleteFinished {
            id,
            outcome: Err(ClientError::Network("refused".into())),
        });
        assert_eq!(view.rows.len(), 1);
        assert_eq!(
            effects,
            vec![ListEffect::Notify(Notice::Error("Failed to delete user.".into()))]
        );
    }

    #[test]
    fn export_success_saves_file_and_toasts() {
        let mut view = loaded_view(vec![sample_user("Asha")]);
        assert_eq!(view.handle(ListEvent::ExportRequested), vec![ListEffect::ExportCsv]);
        let effects = view.handle(ListEvent::ExportFinished {
            outcome: Ok(b"firstName\n".to_vec()),
        });
        assert!(matches!(&effects[0], ListEffect::SaveFile { name, .. } if name == "users.csv"));
        assert!(matches!(&effects[1], ListEffect::Notify(Notice::Success(_))));
    }

    #[tokio::test]
    async fn perform_feeds_fetch_results_back_as_events() {
        let api = ScriptedApi::default();
        api.list_responses
            .lock()
            .unwrap()
            .push_back(Ok(page_of(vec![sample_user("Asha")], 1, 1)));

        let (mut view, effects) = ListView::new();
        let event = perform(&api, effects.into_iter().next().unwrap())
            .await
            .unwrap();
        view.handle(event);
        assert_eq!(view.phase, ListPhase::Loaded);
        assert_eq!(view.rows.len(), 1);
    }
}
