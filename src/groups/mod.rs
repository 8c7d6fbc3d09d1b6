//! Groups
//!
//! Validation for the create-group form and the slug blacklist it
//! consults.

pub mod blacklist;
mod schema;
mod slug;

pub use blacklist::{Blacklist, DEFAULT_BLACKLIST_PATH};
pub use schema::{
    check_name_slug, GroupForm, GroupSchema, LegacyGroupSchema, ValidGroup, ValidationErrors,
    BLACKLISTED_NAME_MESSAGE, GROUP_DESCRIPTION_MAX_LENGTH, GROUP_NAME_MAX_LENGTH,
    GROUP_NAME_MIN_LENGTH,
};
pub use slug::slugify;
