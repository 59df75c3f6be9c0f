use uuid::Uuid;

use crate::error::FieldError;
use crate::ui::client::{ClientError, DirectoryApi};
use crate::ui::Notice;
use crate::users::dto::{ImageUpload, UserForm};
use crate::users::model::User;
use crate::users::validate::{validate_form, validate_image, FormMode as ValidateMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    /// Editing an existing record; presence of the id in the navigation
    /// context is what puts the form in this mode.
    Edit(Uuid),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPhase {
    /// Edit mode only: waiting for the fetch-by-id prefill.
    Prefilling,
    Ready,
    Submitting,
    Saved,
}

/// A local preview of the image shown in the form. Previews backed by an
/// object URL (a freshly selected file) must be released when superseded or
/// when the view goes away; previews pointing at the already-hosted image
/// have nothing to release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePreview {
    pub url: String,
    local: bool,
}

impl ImagePreview {
    fn local() -> Self {
        Self {
            url: format!("blob:{}", Uuid::new_v4()),
            local: true,
        }
    }

    fn hosted(url: String) -> Self {
        Self { url, local: false }
    }
}

#[derive(Debug)]
pub enum FormEvent {
    PrefillArrived {
        seq: u64,
        outcome: Result<User, ClientError>,
    },
    FieldsEdited(UserForm),
    ImageSelected(ImageUpload),
    Submitted,
    SubmitFinished {
        outcome: Result<User, ClientError>,
    },
    /// View teardown; releases any live preview.
    TornDown,
}

#[derive(Debug, PartialEq)]
pub enum FormEffect {
    FetchUser { seq: u64, id: Uuid },
    Submit {
        mode: FormMode,
        fields: UserForm,
        image: Option<ImageUpload>,
    },
    /// Tells the rendering layer to revoke an object URL.
    ReleasePreview(String),
    Notify(Notice),
    NavigateToList,
}

pub struct FormView {
    pub mode: FormMode,
    pub phase: FormPhase,
    pub fields: UserForm,
    pub errors: Vec<FieldError>,
    preview: Option<ImagePreview>,
    selected_image: Option<ImageUpload>,
    fetch_seq: u64,
}

impl FormView {
    pub fn new(mode: FormMode) -> (Self, Vec<FormEffect>) {
        let mut view = Self {
            mode,
            phase: FormPhase::Ready,
            fields: UserForm::blank(),
            errors: Vec::new(),
            preview: None,
            selected_image: None,
            fetch_seq: 0,
        };
        let effects = match mode {
            FormMode::Create => Vec::new(),
            FormMode::Edit(id) => {
                view.phase = FormPhase::Prefilling;
                view.fetch_seq += 1;
                vec![FormEffect::FetchUser {
                    seq: view.fetch_seq,
                    id,
                }]
            }
        };
        (view, effects)
    }

    pub fn preview(&self) -> Option<&ImagePreview> {
        self.preview.as_ref()
    }

    /// Swaps the preview, emitting a release for the superseded one when it
    /// owned an object URL. Release happens unconditionally on replacement;
    /// skipping it leaks the URL for the lifetime of the page.
    fn replace_preview(&mut self, next: Option<ImagePreview>, effects: &mut Vec<FormEffect>) {
        if let Some(old) = self.preview.take() {
            if old.local {
                effects.push(FormEffect::ReleasePreview(old.url));
            }
        }
        self.preview = next;
    }

    fn validate_mode(&self) -> ValidateMode {
        match self.mode {
            FormMode::Create => ValidateMode::Create,
            FormMode::Edit(_) => ValidateMode::Edit,
        }
    }

    pub fn handle(&mut self, event: FormEvent) -> Vec<FormEffect> {
        let mut effects = Vec::new();
        match event {
            FormEvent::PrefillArrived { seq, outcome } => {
                if seq != self.fetch_seq || self.phase != FormPhase::Prefilling {
                    return effects;
                }
                match outcome {
                    Ok(user) => {
                        self.fields = UserForm {
                            first_name: user.first_name,
                            last_name: user.last_name,
                            email: user.email,
                            mobile: user.mobile,
                            address: user.address,
                            gender: user.gender.as_str().into(),
                            status: user.status.as_str().into(),
                        };
                        let hosted = ImagePreview::hosted(user.profile_image_url);
                        self.replace_preview(Some(hosted), &mut effects);
                        self.phase = FormPhase::Ready;
                    }
                    Err(_) => {
                        self.phase = FormPhase::Ready;
                        effects.push(FormEffect::Notify(Notice::Error(
                            "Failed to fetch user data.".into(),
                        )));
                    }
                }
            }
            FormEvent::FieldsEdited(fields) => {
                self.fields = fields;
            }
            FormEvent::ImageSelected(image) => {
                self.replace_preview(Some(ImagePreview::local()), &mut effects);
                self.selected_image = Some(image);
            }
            FormEvent::Submitted => {
                if self.phase != FormPhase::Ready {
                    return effects;
                }
                let mut errors = validate_form(&self.fields);
                errors.extend(validate_image(
                    self.selected_image.as_ref(),
                    self.validate_mode(),
                ));
                self.errors = errors;
                if self.errors.is_empty() {
                    self.phase = FormPhase::Submitting;
                    effects.push(FormEffect::Submit {
                        mode: self.mode,
                        fields: self.fields.clone(),
                        image: self.selected_image.clone(),
                    });
                }
            }
            FormEvent::SubmitFinished { outcome } => {
                if self.phase != FormPhase::Submitting {
                    return effects;
                }
                match outcome {
                    Ok(_) => {
                        self.phase = FormPhase::Saved;
                        self.replace_preview(None, &mut effects);
                        let message = match self.mode {
                            FormMode::Create => "User created successfully!",
                            FormMode::Edit(_) => "User updated successfully!",
                        };
                        effects.push(FormEffect::Notify(Notice::Success(message.into())));
                        effects.push(FormEffect::NavigateToList);
                    }
                    Err(err) => {
                        self.phase = FormPhase::Ready;
                        let message = match err {
                            ClientError::Rejected(msg) => msg,
                            ClientError::NotFound => "Could not find user.".into(),
                            ClientError::Network(_) => "An error occurred.".into(),
                        };
                        effects.push(FormEffect::Notify(Notice::Error(message)));
                    }
                }
            }
            FormEvent::TornDown => {
                self.replace_preview(None, &mut effects);
            }
        }
        effects
    }
}

/// Executes one network effect; rendering-layer effects produce no event.
pub async fn perform(api: &dyn DirectoryApi, effect: FormEffect) -> Option<FormEvent> {
    match effect {
        FormEffect::FetchUser { seq, id } => Some(FormEvent::PrefillArrived {
            seq,
            outcome: api.get_user(&id.to_string()).await,
        }),
        FormEffect::Submit { mode, fields, image } => {
            let outcome = match mode {
                FormMode::Create => api.create_user(&fields, image.as_ref()).await,
                FormMode::Edit(id) => {
                    api.update_user(&id.to_string(), &fields, image.as_ref()).await
                }
            };
            Some(FormEvent::SubmitFinished { outcome })
        }
        FormEffect::ReleasePreview(_) | FormEffect::Notify(_) | FormEffect::NavigateToList => None,
    }
}
