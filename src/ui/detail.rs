use uuid::Uuid;

use crate::ui::client::{ClientError, DirectoryApi};
use crate::ui::Notice;
use crate::users::model::User;

/// Detail view keeps "record gone" and "network down" apart: a deleted record
/// or a bad link gets its own message instead of a generic failure.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    Loading,
    Loaded(User),
    NotFound,
    Error(String),
}

#[derive(Debug)]
pub enum DetailEvent {
    FetchArrived {
        seq: u64,
        outcome: Result<User, ClientError>,
    },
}

#[derive(Debug, PartialEq)]
pub enum DetailEffect {
    FetchUser { seq: u64, id: Uuid },
    Notify(Notice),
}

pub struct DetailView {
    pub state: DetailState,
    fetch_seq: u64,
}

impl DetailView {
    pub fn new(id: Uuid) -> (Self, Vec<DetailEffect>) {
        let view = Self {
            state: DetailState::Loading,
            fetch_seq: 1,
        };
        let effects = vec![DetailEffect::FetchUser { seq: 1, id }];
        (view, effects)
    }

    pub fn handle(&mut self, event: DetailEvent) -> Vec<DetailEffect> {
        match event {
            DetailEvent::FetchArrived { seq, outcome } => {
                if seq != self.fetch_seq {
                    return Vec::new();
                }
                match outcome {
                    Ok(user) => {
                        self.state = DetailState::Loaded(user);
                        Vec::new()
                    }
                    Err(ClientError::NotFound) => {
                        self.state = DetailState::NotFound;
                        vec![DetailEffect::Notify(Notice::Error(
                            "Could not find user. They may have been deleted.".into(),
                        ))]
                    }
                    Err(_) => {
                        self.state =
                            DetailState::Error("Failed to load user details.".into());
                        vec![DetailEffect::Notify(Notice::Error(
                            "Failed to load user details.".into(),
                        ))]
                    }
                }
            }
        }
    }
}

pub async fn perform(api: &dyn DirectoryApi, effect: DetailEffect) -> Option<DetailEvent> {
    match effect {
        DetailEffect::FetchUser { seq, id } => Some(DetailEvent::FetchArrived {
            seq,
            outcome: api.get_user(&id.to_string()).await,
        }),
        DetailEffect::Notify(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::testing::{sample_user, ScriptedApi};

    #[test]
    fn starts_loading_with_a_fetch() {
        let id = Uuid::new_v4();
        let (view, effects) = DetailView::new(id);
        assert_eq!(view.state, DetailState::Loading);
        assert_eq!(effects, vec![DetailEffect::FetchUser { seq: 1, id }]);
    }

    #[test]
    fn not_found_and_network_failure_are_distinct_states() {
        let (mut view, _) = DetailView::new(Uuid::new_v4());
        view.handle(DetailEvent::FetchArrived {
            seq: 1,
            outcome: Err(ClientError::NotFound),
        });
        assert_eq!(view.state, DetailState::NotFound);

        let (mut view, _) = DetailView::new(Uuid::new_v4());
        let effects = view.handle(DetailEvent::FetchArrived {
            seq: 1,
            outcome: Err(ClientError::Network("refused".into())),
        });
        assert!(matches!(view.state, DetailState::Error(_)));
        assert!(matches!(&effects[0], DetailEffect::Notify(Notice::Error(_))));
    }

    #[test]
    fn stale_response_is_dropped() {
        let (mut view, _) = DetailView::new(Uuid::new_v4());
        view.handle(DetailEvent::FetchArrived {
            seq: 7,
            outcome: Ok(sample_user("Stale")),
        });
        assert_eq!(view.state, DetailState::Loading);
    }

    #[tokio::test]
    async fn perform_loads_the_user() {
        let api = ScriptedApi::default();
        api.get_responses
            .lock()
            .unwrap()
            .push_back(Ok(sample_user("Asha")));

        let id = Uuid::new_v4();
        let (mut view, effects) = DetailView::new(id);
        let event = perform(&api, effects.into_iter().next().unwrap())
            .await
            .unwrap();
        view.handle(event);
        assert!(matches!(&view.state, DetailState::Loaded(u) if u.first_name == "Asha"));
    }
}
