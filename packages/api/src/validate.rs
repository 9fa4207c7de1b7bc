//! Field constraints for request bodies. Each check returns the first violation
//! as [`ApiError::Validation`].

use crate::error::ApiError;

pub const TITLE_MAX_CHARS: usize = 200;
pub const TAG_NAME_MAX_CHARS: usize = 30;
pub const PASSWORD_MIN_CHARS: usize = 6;
pub const PASSWORD_MAX_CHARS: usize = 100;
pub const NAME_MAX_CHARS: usize = 50;

fn too_long(value: &str, max: usize) -> bool {
    value.chars().count() > max
}

pub fn title(title: &str) -> Result<(), ApiError> {
    if too_long(title, TITLE_MAX_CHARS) {
        return Err(ApiError::Validation(format!(
            "Title must be at most {TITLE_MAX_CHARS} characters"
        )));
    }
    Ok(())
}

pub fn tag_name(name: &str) -> Result<(), ApiError> {
    if name.is_empty() {
        return Err(ApiError::Validation("Tag name is required".into()));
    }
    if too_long(name, TAG_NAME_MAX_CHARS) {
        return Err(ApiError::Validation(format!(
            "Tag name must be at most {TAG_NAME_MAX_CHARS} characters"
        )));
    }
    Ok(())
}

pub fn email(email: &str) -> Result<(), ApiError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(ApiError::Validation("Invalid email address".into()));
    }
    Ok(())
}

pub fn password(password: &str) -> Result<(), ApiError> {
    let len = password.chars().count();
    if len < PASSWORD_MIN_CHARS {
        return Err(ApiError::Validation(format!(
            "Password must be at least {PASSWORD_MIN_CHARS} characters"
        )));
    }
    if len > PASSWORD_MAX_CHARS {
        return Err(ApiError::Validation(format!(
            "Password must be at most {PASSWORD_MAX_CHARS} characters"
        )));
    }
    Ok(())
}

pub fn display_name(name: &str) -> Result<(), ApiError> {
    if too_long(name, NAME_MAX_CHARS) {
        return Err(ApiError::Validation(format!(
            "Name must be at most {NAME_MAX_CHARS} characters"
        )));
    }
    Ok(())
}
