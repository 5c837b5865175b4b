use chrono::{DateTime, Utc};
use taskdeck_shared::{new_id, Task, User};

pub const CITY_FALLBACK: &str = "Not Provided";

/// Result of a form action: an error to show and the input to redisplay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState<F> {
    pub error: Option<String>,
    pub form: F,
}

impl<F: Default> FormState<F> {
    pub fn cleared() -> Self {
        Self::default()
    }

    pub fn failed(message: impl Into<String>, form: F) -> Self {
        Self {
            error: Some(message.into()),
            form,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UserField {
    #[default]
    Name,
    Email,
    City,
}

impl UserField {
    pub fn next(self) -> Self {
        match self {
            UserField::Name => UserField::Email,
            UserField::Email => UserField::City,
            UserField::City => UserField::Name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserForm {
    pub name: String,
    pub email: String,
    pub city: String,
}

impl UserForm {
    pub fn field_mut(&mut self, field: UserField) -> &mut String {
        match field {
            UserField::Name => &mut self.name,
            UserField::Email => &mut self.email,
            UserField::City => &mut self.city,
        }
    }

    /// Presence checks, then a new user with a client-side id.
    pub fn prepare(&self, now: DateTime<Utc>) -> Result<User, FormState<UserForm>> {
        let name = self.name.trim();
        let email = self.email.trim();
        let city = self.city.trim();

        if name.is_empty() || email.is_empty() {
            return Err(FormState::failed("Name and email are required", self.clone()));
        }

        Ok(User {
            id: new_id(),
            name: name.to_string(),
            email: email.to_string(),
            created_at: now,
            avatar: None,
            city: if city.is_empty() {
                CITY_FALLBACK.to_string()
            } else {
                city.to_string()
            },
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskForm {
    pub title: String,
}

impl TaskForm {
    pub fn prepare(&self, user_id: Option<&str>, now: DateTime<Utc>) -> Result<Task, FormState<TaskForm>> {
        let Some(user_id) = user_id.filter(|id| !id.is_empty()) else {
            return Err(FormState::failed("Open a user's tasks to add one", self.clone()));
        };

        let title = self.title.trim();
        if title.is_empty() {
            return Err(FormState::failed("Title is required", self.clone()));
        }

        Ok(Task {
            id: new_id(),
            title: title.to_string(),
            done: false,
            user_id: user_id.to_string(),
            created_at: now,
            user_name: None,
        })
    }
}
