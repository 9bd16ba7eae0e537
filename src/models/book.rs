use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub isbn: String,
    pub publication_year: i32,
    pub available_copies: i32,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub isbn: String,
    pub publication_year: i32,
    pub available_copies: i32,
    pub author_id: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookChanges {
    pub title: Option<String>,
    pub isbn: Option<String>,
    pub publication_year: Option<i32>,
    pub available_copies: Option<i32>,
    pub author_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookCandidate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub publication_year: Option<i32>,
    #[serde(default)]
    pub available_copies: Option<i32>,
    #[serde(default)]
    pub author_id: Option<String>,
}

impl Book {
    pub fn new(draft: NewBook) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: draft.title,
            isbn: draft.isbn,
            publication_year: draft.publication_year,
            available_copies: draft.available_copies,
            author_id: draft.author_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, changes: BookChanges) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(isbn) = changes.isbn {
            self.isbn = isbn;
        }
        if let Some(year) = changes.publication_year {
            self.publication_year = year;
        }
        if let Some(copies) = changes.available_copies {
            self.available_copies = copies;
        }
        if let Some(author_id) = changes.author_id {
            self.author_id = author_id;
        }
        self.updated_at = Utc::now().max(self.updated_at);
    }
}
