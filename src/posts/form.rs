//! Binding and validation for the post create/edit form.

use serde::Deserialize;

use crate::db::models::{Group, Post};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Raw form fields as submitted. `group` is the selected group id, empty
/// for "no group".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub group: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostField {
    Text,
    Group,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: PostField,
    pub message: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(Vec<FieldError>);

impl FormErrors {
    pub fn push(&mut self, field: PostField, message: &'static str) {
        self.0.push(FieldError { field, message });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    pub fn for_field(&self, field: PostField) -> Vec<&'static str> {
        self.0
            .iter()
            .filter(|e| e.field == field)
            .map(|e| e.message)
            .collect()
    }
}

/// A validated post body, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub text: String,
    pub group_id: Option<i64>,
}

impl PostForm {
    /// Form pre-filled from a stored post, for the edit page.
    pub fn from_post(post: &Post) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group_id().map(|id| id.to_string()).unwrap_or_default(),
        }
    }

    pub fn validate(&self, groups: &[Group]) -> Result<PostDraft, FormErrors> {
        let mut errors = FormErrors::default();

        let text = self.text.trim();
        if text.is_empty() {
            errors.push(PostField::Text, REQUIRED);
        }

        let group = self.group.trim();
        let group_id = if group.is_empty() {
            None
        } else {
            match group.parse::<i64>() {
                Ok(id) if groups.iter().any(|g| g.id == id) => Some(id),
                _ => {
                    errors.push(PostField::Group, INVALID_CHOICE);
                    None
                }
            }
        };

        if errors.is_empty() {
            Ok(PostDraft {
                text: text.to_string(),
                group_id,
            })
        } else {
            Err(errors)
        }
    }
}

/// Outcome of an edit submission by a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditDecision {
    /// Not the author: show the form again, save nothing, report nothing.
    Redisplay,
    RedisplayWithErrors(FormErrors),
    Save(PostDraft),
}

impl EditDecision {
    /// Validation only runs for the author.
    pub fn decide(is_author: bool, form: &PostForm, groups: &[Group]) -> Self {
        if !is_author {
            return EditDecision::Redisplay;
        }
        match form.validate(groups) {
            Ok(draft) => EditDecision::Save(draft),
            Err(errors) => EditDecision::RedisplayWithErrors(errors),
        }
    }
}

pub struct GroupChoice {
    pub id: i64,
    pub title: String,
    pub selected: bool,
}

/// Everything the form template renders: current values, choices, errors.
pub struct PostFormView {
    pub text: String,
    pub groups: Vec<GroupChoice>,
    pub text_errors: Vec<&'static str>,
    pub group_errors: Vec<&'static str>,
}

impl PostFormView {
    pub fn new(form: &PostForm, groups: &[Group], errors: Option<&FormErrors>) -> Self {
        let selected = form.group.trim();
        let groups = groups
            .iter()
            .map(|g| GroupChoice {
                id: g.id,
                title: g.title.clone(),
                selected: g.id.to_string() == selected,
            })
            .collect();

        Self {
            text: form.text.clone(),
            groups,
            text_errors: errors
                .map(|e| e.for_field(PostField::Text))
                .unwrap_or_default(),
            group_errors: errors
                .map(|e| e.for_field(PostField::Group))
                .unwrap_or_default(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.text_errors.is_empty() || !self.group_errors.is_empty()
    }
}
