/// Client-side location: `/` for users, `/tasks` or `/:userId/tasks` for
/// tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Users,
    Tasks { user_id: Option<String> },
}

impl Route {
    pub fn parse(path: &str) -> Option<Self> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Some(Route::Users),
            ["tasks"] => Some(Route::Tasks { user_id: None }),
            [user_id, "tasks"] => Some(Route::Tasks {
                user_id: Some(user_id.to_string()),
            }),
            _ => None,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Users => "/".to_string(),
            Route::Tasks { user_id: None } => "/tasks".to_string(),
            Route::Tasks {
                user_id: Some(user_id),
            } => format!("/{}/tasks", user_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_routes() {
        assert_eq!(Route::parse("/"), Some(Route::Users));
        assert_eq!(Route::parse(""), Some(Route::Users));
        assert_eq!(Route::parse("/tasks"), Some(Route::Tasks { user_id: None }));
        assert_eq!(
            Route::parse("/42/tasks/"),
            Some(Route::Tasks {
                user_id: Some("42".into())
            })
        );
        assert_eq!(Route::parse("/42/notes"), None);
    }

    #[test]
    fn path_round_trips() {
        for path in ["/", "/tasks", "/u1/tasks"] {
            assert_eq!(Route::parse(path).unwrap().path(), path);
        }
    }
}
