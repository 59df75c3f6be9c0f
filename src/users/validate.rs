use lazy_static::lazy_static;
use regex::Regex;

use crate::error::FieldError;
use crate::users::dto::{ImageUpload, UserForm};
use crate::users::model::{Gender, Status};

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
pub const ALLOWED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/gif"];

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref MOBILE_RE: Regex = Regex::new(r"^[6-9]\d{9}$").unwrap();
}

/// Whether the payload is creating a record or editing an existing one. Only
/// the image rule differs: an edit keeps the stored image unless replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit,
}

struct Rule {
    field: &'static str,
    message: &'static str,
    check: fn(&UserForm) -> bool,
}

/// Ordered rule table. Every rule is evaluated; violations are collected
/// rather than short-circuiting so the client sees all problems at once.
const RULES: &[Rule] = &[
    Rule {
        field: "firstName",
        message: "First name is required",
        check: |f| !f.first_name.trim().is_empty(),
    },
    Rule {
        field: "lastName",
        message: "Last name is required",
        check: |f| !f.last_name.trim().is_empty(),
    },
    Rule {
        field: "email",
        message: "Must be a valid email address",
        check: |f| EMAIL_RE.is_match(f.email.trim()),
    },
    Rule {
        field: "mobile",
        message: "Must be a valid Indian mobile number",
        check: |f| MOBILE_RE.is_match(f.mobile.trim()),
    },
    Rule {
        field: "address",
        message: "Address is required",
        check: |f| !f.address.trim().is_empty(),
    },
    Rule {
        field: "gender",
        message: "Gender must be Male or Female",
        check: |f| Gender::parse(&f.gender).is_some(),
    },
    Rule {
        field: "status",
        message: "Status must be Active or Inactive",
        check: |f| Status::parse(&f.status).is_some(),
    },
];

/// Pure function from form payload to violation list.
pub fn validate_form(form: &UserForm) -> Vec<FieldError> {
    RULES
        .iter()
        .filter(|rule| !(rule.check)(form))
        .map(|rule| FieldError::new(rule.field, rule.message))
        .collect()
}

/// Image constraints. The file itself is required only on create; when a file
/// is present the size and content-type limits apply in either mode.
pub fn validate_image(image: Option<&ImageUpload>, mode: FormMode) -> Vec<FieldError> {
    let mut errors = Vec::new();
    match image {
        None => {
            if mode == FormMode::Create {
                errors.push(FieldError::new("profile", "Profile image is required"));
            }
        }
        Some(image) => {
            if image.bytes.len() > MAX_IMAGE_BYTES {
                errors.push(FieldError::new("profile", "The file is too large (max 5MB)"));
            }
            if !ALLOWED_IMAGE_TYPES.contains(&image.content_type.as_str()) {
                errors.push(FieldError::new("profile", "Unsupported file format"));
            }
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn valid_form() -> UserForm {
        UserForm {
            first_name: "Asha".into(),
            last_name: "Verma".into(),
            email: "asha@example.com".into(),
            mobile: "9123456789".into(),
            address: "12 MG Road".into(),
            gender: "Female".into(),
            status: "Active".into(),
        }
    }

    fn jpeg(len: usize) -> ImageUpload {
        ImageUpload {
            bytes: Bytes::from(vec![0u8; len]),
            content_type: "image/jpeg".into(),
        }
    }

    #[test]
    fn valid_form_passes() {
        assert!(validate_form(&valid_form()).is_empty());
    }

    #[test]
    fn all_violations_are_collected() {
        let errors = validate_form(&UserForm::default());
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            ["firstName", "lastName", "email", "mobile", "address", "gender", "status"]
        );
    }

    #[test]
    fn whitespace_only_names_fail() {
        let mut form = valid_form();
        form.first_name = "   ".into();
        form.address = "\t".into();
        let errors = validate_form(&form);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "firstName");
        assert_eq!(errors[1].field, "address");
    }

    #[test]
    fn mobile_must_start_with_six_through_nine() {
        let mut form = valid_form();
        form.mobile = "5123456789".into();
        assert_eq!(validate_form(&form).len(), 1);
        form.mobile = "9123456789".into();
        assert!(validate_form(&form).is_empty());
    }

    #[test]
    fn mobile_must_be_exactly_ten_digits() {
        let mut form = valid_form();
        form.mobile = "91234567890".into();
        assert_eq!(validate_form(&form)[0].field, "mobile");
        form.mobile = "912345678".into();
        assert_eq!(validate_form(&form)[0].field, "mobile");
    }

    #[test]
    fn malformed_email_fails() {
        let mut form = valid_form();
        for bad in ["asha", "asha@", "@example.com", "a b@example.com", "asha@example"] {
            form.email = bad.into();
            assert_eq!(validate_form(&form)[0].field, "email", "accepted {bad:?}");
        }
    }

    #[test]
    fn gender_and_status_must_match_enumeration() {
        let mut form = valid_form();
        form.gender = "other".into();
        form.status = "active".into();
        let errors = validate_form(&form);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn image_required_only_on_create() {
        assert_eq!(validate_image(None, FormMode::Create).len(), 1);
        assert!(validate_image(None, FormMode::Edit).is_empty());
    }

    #[test]
    fn oversized_image_rejected_in_both_modes() {
        let big = jpeg(MAX_IMAGE_BYTES + 1);
        assert_eq!(validate_image(Some(&big), FormMode::Create).len(), 1);
        assert_eq!(validate_image(Some(&big), FormMode::Edit).len(), 1);
        let ok = jpeg(MAX_IMAGE_BYTES);
        assert!(validate_image(Some(&ok), FormMode::Edit).is_empty());
    }

    #[test]
    fn unsupported_image_type_rejected() {
        let pdf = ImageUpload {
            bytes: Bytes::from_static(b"%PDF"),
            content_type: "application/pdf".into(),
        };
        let errors = validate_image(Some(&pdf), FormMode::Create);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Unsupported file format");
    }
}
