//! Request validation for the user schemas.

mod validation;
pub use validation::{is_valid_email, ValidationError, EMAIL_MAX_CHARS, NAME_MAX_CHARS};
