//! Author model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{not_blank, same_identity};

/// Author record. Owns the books whose `author_id` points at it.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Author {
    /// Assigned by the repository on first save
    pub id: Option<i64>,
    pub name: String,
    pub biography: Option<String>,
}

impl Author {
    pub fn new(name: impl Into<String>, biography: Option<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            biography,
        }
    }
}

impl PartialEq for Author {
    fn eq(&self, other: &Self) -> bool {
        same_identity(self, self.id, other, other.id)
    }
}

impl Eq for Author {}

impl From<CreateAuthor> for Author {
    fn from(data: CreateAuthor) -> Self {
        Author::new(data.name, data.biography)
    }
}

/// Create author request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateAuthor {
    #[validate(custom(function = "not_blank"), length(max = 255))]
    pub name: String,
    pub biography: Option<String>,
}

/// Update author request. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateAuthor {
    #[validate(custom(function = "not_blank"), length(max = 255))]
    pub name: Option<String>,
    pub biography: Option<String>,
}

impl UpdateAuthor {
    pub fn apply(self, author: &mut Author) {
        if let Some(name) = self.name {
            author.name = name;
        }
        if let Some(biography) = self.biography {
            author.biography = Some(biography);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_name_rejected() {
        let data = CreateAuthor {
            name: "   ".to_string(),
            biography: None,
        };
        assert!(data.validate().is_err());

        let data = UpdateAuthor {
            name: Some(String::new()),
            biography: None,
        };
        assert!(data.validate().is_err());
        assert!(UpdateAuthor::default().validate().is_ok());
    }

    #[test]
    fn test_long_name_rejected() {
        let data = CreateAuthor {
            name: "a".repeat(256),
            biography: Some("b".repeat(10_000)),
        };
        assert!(data.validate().is_err());

        let data = CreateAuthor {
            name: "a".repeat(255),
            biography: Some("b".repeat(10_000)),
        };
        assert!(data.validate().is_ok());
    }

    #[test]
    fn test_update_keeps_absent_fields() {
        let mut author = Author::new("Tolstoy", Some("Russian novelist".to_string()));
        UpdateAuthor {
            name: Some("Leo Tolstoy".to_string()),
            biography: None,
        }
        .apply(&mut author);

        assert_eq!(author.name, "Leo Tolstoy");
        assert_eq!(author.biography.as_deref(), Some("Russian novelist"));
    }

    #[test]
    fn test_identity_equality() {
        let mut a = Author::new("A", None);
        let mut b = Author::new("A", None);
        assert_eq!(a, a);
        assert_ne!(a, b);

        a.id = Some(1);
        b.id = Some(1);
        b.name = "B".to_string();
        assert_eq!(a, b);
    }
}
