//! Field rules applied to candidate records before they reach storage.
//!
//! Every violated field contributes exactly one message; the caller gets
//! all of them at once in [`AppError::ValidationFailed`].

use std::str::FromStr;

use chrono::{DateTime, NaiveDate};

use crate::errors::AppError;
use crate::models::{
    AuthorCandidate, AuthorChanges, BookCandidate, BookChanges, NewAuthor, NewBook, NewTask,
    TaskCandidate, TaskCategory, TaskChanges, TaskPriority, TaskStatus,
};

pub const TITLE_MAX_CHARS: usize = 100;
pub const ISBN_MAX_CHARS: usize = 32;
pub const PUBLICATION_YEAR_MAX: i32 = 2100;
pub const NAME_MAX_CHARS: usize = 100;
pub const EMAIL_MAX_CHARS: usize = 255;

const DEFAULT_AVAILABLE_COPIES: i32 = 1;

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp (date part kept).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// Parses an enumerated field, recording `"{field} must be a|b|c"` on failure.
fn parse_domain<T: FromStr>(
    field: &str,
    raw: &str,
    legal: String,
    violations: &mut Vec<String>,
) -> Option<T> {
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            violations.push(format!("{field} must be {legal}"));
            None
        }
    }
}

fn check_title(raw: &str, violations: &mut Vec<String>) -> Option<String> {
    let title = raw.trim();
    if title.is_empty() {
        violations.push("title is required".to_string());
        None
    } else if title.chars().count() > TITLE_MAX_CHARS {
        violations.push(format!("title must be {TITLE_MAX_CHARS} chars or fewer"));
        None
    } else {
        Some(title.to_string())
    }
}

fn check_due_date(raw: &str, violations: &mut Vec<String>) -> Option<NaiveDate> {
    if raw.trim().is_empty() {
        violations.push("dueDate is required (YYYY-MM-DD)".to_string());
        return None;
    }
    let parsed = parse_date(raw);
    if parsed.is_none() {
        violations.push("dueDate must be a valid date (YYYY-MM-DD)".to_string());
    }
    parsed
}

fn finish<T>(value: Option<T>, violations: Vec<String>) -> Result<T, AppError> {
    match value {
        Some(value) if violations.is_empty() => Ok(value),
        _ => Err(AppError::validation(violations)),
    }
}

/// Validates a full candidate for `create`.
pub fn validate_new_task(candidate: &TaskCandidate) -> Result<NewTask, AppError> {
    let mut violations = Vec::new();

    let title = match candidate.title.as_deref() {
        Some(raw) => check_title(raw, &mut violations),
        None => {
            violations.push("title is required".to_string());
            None
        }
    };
    let status = match candidate.status.as_deref() {
        Some(raw) => parse_domain::<TaskStatus>(
            "status",
            raw,
            TaskStatus::legal_values(),
            &mut violations,
        ),
        None => Some(TaskStatus::default()),
    };
    let priority = match candidate.priority.as_deref() {
        Some(raw) => parse_domain::<TaskPriority>(
            "priority",
            raw,
            TaskPriority::legal_values(),
            &mut violations,
        ),
        None => Some(TaskPriority::default()),
    };
    let due_date = match candidate.due_date.as_deref() {
        Some(raw) => check_due_date(raw, &mut violations),
        None => {
            violations.push("dueDate is required (YYYY-MM-DD)".to_string());
            None
        }
    };
    let category = match candidate.category.as_deref() {
        Some(raw) if !raw.trim().is_empty() => parse_domain::<TaskCategory>(
            "category",
            raw,
            TaskCategory::legal_values(),
            &mut violations,
        ),
        _ => {
            violations.push("category is required".to_string());
            None
        }
    };

    let draft = match (title, status, priority, due_date, category) {
        (Some(title), Some(status), Some(priority), Some(due_date), Some(category)) => {
            Some(NewTask {
                title,
                description: candidate.description.as_deref().unwrap_or_default().trim().to_string(),
                status,
                priority,
                due_date,
                category,
            })
        }
        _ => None,
    };
    finish(draft, violations)
}

/// Validates only the fields present in a partial update.
pub fn validate_task_changes(candidate: &TaskCandidate) -> Result<TaskChanges, AppError> {
    let mut violations = Vec::new();

    let changes = TaskChanges {
        title: candidate.title.as_deref().and_then(|raw| check_title(raw, &mut violations)),
        description: candidate.description.as_deref().map(|d| d.trim().to_string()),
        status: candidate.status.as_deref().and_then(|raw| {
            parse_domain("status", raw, TaskStatus::legal_values(), &mut violations)
        }),
        priority: candidate.priority.as_deref().and_then(|raw| {
            parse_domain("priority", raw, TaskPriority::legal_values(), &mut violations)
        }),
        due_date: candidate.due_date.as_deref().and_then(|raw| check_due_date(raw, &mut violations)),
        category: candidate.category.as_deref().and_then(|raw| {
            parse_domain("category", raw, TaskCategory::legal_values(), &mut violations)
        }),
    };
    finish(Some(changes), violations)
}

fn check_required_text(
    field: &str,
    raw: Option<&str>,
    max_chars: Option<usize>,
    violations: &mut Vec<String>,
) -> Option<String> {
    let value = raw.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        violations.push(format!("{field} is required"));
        return None;
    }
    if let Some(max) = max_chars {
        if value.chars().count() > max {
            violations.push(format!("{field} must be {max} chars or fewer"));
            return None;
        }
    }
    Some(value.to_string())
}

fn check_year(year: i32, violations: &mut Vec<String>) -> Option<i32> {
    if (0..=PUBLICATION_YEAR_MAX).contains(&year) {
        Some(year)
    } else {
        violations.push(format!("publication_year must be between 0 and {PUBLICATION_YEAR_MAX}"));
        None
    }
}

fn check_copies(copies: i32, violations: &mut Vec<String>) -> Option<i32> {
    if copies >= 0 {
        Some(copies)
    } else {
        violations.push("available_copies must be 0 or greater".to_string());
        None
    }
}

pub fn validate_new_book(candidate: &BookCandidate) -> Result<NewBook, AppError> {
    let mut violations = Vec::new();

    let title = check_required_text("title", candidate.title.as_deref(), None, &mut violations);
    let isbn = check_required_text(
        "isbn",
        candidate.isbn.as_deref(),
        Some(ISBN_MAX_CHARS),
        &mut violations,
    );
    let publication_year = match candidate.publication_year {
        Some(year) => check_year(year, &mut violations),
        None => {
            violations.push("publication_year is required".to_string());
            None
        }
    };
    let available_copies =
        check_copies(candidate.available_copies.unwrap_or(DEFAULT_AVAILABLE_COPIES), &mut violations);
    let author_id =
        check_required_text("author_id", candidate.author_id.as_deref(), None, &mut violations);

    let draft = match (title, isbn, publication_year, available_copies, author_id) {
        (Some(title), Some(isbn), Some(publication_year), Some(available_copies), Some(author_id)) => {
            Some(NewBook { title, isbn, publication_year, available_copies, author_id })
        }
        _ => None,
    };
    finish(draft, violations)
}

pub fn validate_book_changes(candidate: &BookCandidate) -> Result<BookChanges, AppError> {
    let mut violations = Vec::new();

    let changes = BookChanges {
        title: candidate
            .title
            .as_deref()
            .and_then(|raw| check_required_text("title", Some(raw), None, &mut violations)),
        isbn: candidate.isbn.as_deref().and_then(|raw| {
            check_required_text("isbn", Some(raw), Some(ISBN_MAX_CHARS), &mut violations)
        }),
        publication_year: candidate
            .publication_year
            .and_then(|year| check_year(year, &mut violations)),
        available_copies: candidate
            .available_copies
            .and_then(|copies| check_copies(copies, &mut violations)),
        author_id: candidate
            .author_id
            .as_deref()
            .and_then(|raw| check_required_text("author_id", Some(raw), None, &mut violations)),
    };
    finish(Some(changes), violations)
}

/// Trims the address and lower-cases its domain. Anything without exactly
/// one `@`, a non-empty local part and a dotted domain is rejected.
fn check_email(raw: &str, violations: &mut Vec<String>) -> Option<String> {
    let email = check_required_text("email", Some(raw), Some(EMAIL_MAX_CHARS), violations)?;
    let well_formed = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
                && domain.split('.').count() >= 2
                && domain.split('.').all(|label| !label.is_empty())
        }
        None => false,
    };
    if !well_formed {
        violations.push("email must be a valid email address".to_string());
        return None;
    }
    let (local, domain) = email.split_once('@')?;
    Some(format!("{local}@{}", domain.to_lowercase()))
}

pub fn validate_new_author(candidate: &AuthorCandidate) -> Result<NewAuthor, AppError> {
    let mut violations = Vec::new();

    let first_name = check_required_text(
        "first_name",
        candidate.first_name.as_deref(),
        Some(NAME_MAX_CHARS),
        &mut violations,
    );
    let last_name = check_required_text(
        "last_name",
        candidate.last_name.as_deref(),
        Some(NAME_MAX_CHARS),
        &mut violations,
    );
    let email = match candidate.email.as_deref() {
        Some(raw) => check_email(raw, &mut violations),
        None => {
            violations.push("email is required".to_string());
            None
        }
    };

    let draft = match (first_name, last_name, email) {
        (Some(first_name), Some(last_name), Some(email)) => {
            Some(NewAuthor { first_name, last_name, email })
        }
        _ => None,
    };
    finish(draft, violations)
}

pub fn validate_author_changes(candidate: &AuthorCandidate) -> Result<AuthorChanges, AppError> {
    let mut violations = Vec::new();

    let changes = AuthorChanges {
        first_name: candidate.first_name.as_deref().and_then(|raw| {
            check_required_text("first_name", Some(raw), Some(NAME_MAX_CHARS), &mut violations)
        }),
        last_name: candidate.last_name.as_deref().and_then(|raw| {
            check_required_text("last_name", Some(raw), Some(NAME_MAX_CHARS), &mut violations)
        }),
        email: candidate.email.as_deref().and_then(|raw| check_email(raw, &mut violations)),
    };
    finish(Some(changes), violations)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(err: AppError) -> Vec<String> {
        match err {
            AppError::ValidationFailed { details } => details,
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    fn candidate(title: &str, due: &str, category: &str) -> TaskCandidate {
        TaskCandidate {
            title: Some(title.into()),
            due_date: Some(due.into()),
            category: Some(category.into()),
            ..Default::default()
        }
    }

    #[test]
    fn accepts_minimal_task_with_defaults() {
        let draft = validate_new_task(&candidate("Buy milk", "2025-10-25", "Shopping")).unwrap();
        assert_eq!(draft.title, "Buy milk");
        assert_eq!(draft.description, "");
        assert_eq!(draft.status, TaskStatus::Pending);
        assert_eq!(draft.priority, TaskPriority::Medium);
        assert_eq!(draft.category, TaskCategory::Shopping);
        assert_eq!(draft.due_date, NaiveDate::from_ymd_opt(2025, 10, 25).unwrap());
    }

    #[test]
    fn reports_exactly_the_missing_required_fields() {
        let errs = details(validate_new_task(&TaskCandidate::default()).unwrap_err());
        assert_eq!(
            errs,
            vec![
                "title is required".to_string(),
                "dueDate is required (YYYY-MM-DD)".to_string(),
                "category is required".to_string(),
            ]
        );

        let only_title = TaskCandidate { title: Some("x".into()), ..Default::default() };
        let errs = details(validate_new_task(&only_title).unwrap_err());
        assert_eq!(errs.len(), 2);
        assert!(!errs.iter().any(|e| e.starts_with("title")));
    }

    #[test]
    fn out_of_domain_values_name_the_legal_set() {
        let mut c = candidate("x", "2025-10-25", "Chores");
        c.status = Some("done".into());
        c.priority = Some("urgent".into());
        let errs = details(validate_new_task(&c).unwrap_err());
        assert_eq!(
            errs,
            vec![
                "status must be pending|in-progress|completed".to_string(),
                "priority must be low|medium|high".to_string(),
                "category must be Work|Personal|Shopping|Health|Other".to_string(),
            ]
        );
    }

    #[test]
    fn title_is_trimmed_and_bounded() {
        let draft = validate_new_task(&candidate("  walk  ", "2025-10-22", "Health")).unwrap();
        assert_eq!(draft.title, "walk");

        let hundred = "a".repeat(100);
        assert!(validate_new_task(&candidate(&hundred, "2025-10-22", "Health")).is_ok());

        let long = "a".repeat(101);
        let errs = details(validate_new_task(&candidate(&long, "2025-10-22", "Health")).unwrap_err());
        assert_eq!(errs, vec!["title must be 100 chars or fewer".to_string()]);

        let errs = details(validate_new_task(&candidate("   ", "2025-10-22", "Health")).unwrap_err());
        assert_eq!(errs, vec!["title is required".to_string()]);
    }

    #[test]
    fn due_date_accepts_plain_dates_and_timestamps() {
        assert_eq!(parse_date("2025-10-25"), NaiveDate::from_ymd_opt(2025, 10, 25));
        assert_eq!(parse_date("2025-10-25T08:30:00Z"), NaiveDate::from_ymd_opt(2025, 10, 25));
        assert_eq!(parse_date("2025-02-30"), None);

        let errs = details(validate_new_task(&candidate("x", "next week", "Work")).unwrap_err());
        assert_eq!(errs, vec!["dueDate must be a valid date (YYYY-MM-DD)".to_string()]);
    }

    #[test]
    fn empty_partial_is_a_no_op_change() {
        let changes = validate_task_changes(&TaskCandidate::default()).unwrap();
        assert_eq!(changes, TaskChanges::default());
    }

    #[test]
    fn partial_validates_only_supplied_fields() {
        let partial = TaskCandidate { status: Some("completed".into()), ..Default::default() };
        let changes = validate_task_changes(&partial).unwrap();
        assert_eq!(changes.status, Some(TaskStatus::Completed));
        assert!(changes.title.is_none());

        let bad = TaskCandidate {
            priority: Some("HIGH".into()),
            title: Some("".into()),
            ..Default::default()
        };
        let errs = details(validate_task_changes(&bad).unwrap_err());
        assert_eq!(
            errs,
            vec!["title is required".to_string(), "priority must be low|medium|high".to_string()]
        );
    }

    #[test]
    fn book_defaults_copies_and_rejects_negative() {
        let c = BookCandidate {
            title: Some("Dune".into()),
            isbn: Some("978-0441013593".into()),
            publication_year: Some(1965),
            author_id: Some("a1".into()),
            ..Default::default()
        };
        assert_eq!(validate_new_book(&c).unwrap().available_copies, 1);

        let negative = BookCandidate { available_copies: Some(-1), ..c.clone() };
        let errs = details(validate_new_book(&negative).unwrap_err());
        assert_eq!(errs, vec!["available_copies must be 0 or greater".to_string()]);
    }

    #[test]
    fn book_requires_core_fields() {
        let errs = details(validate_new_book(&BookCandidate::default()).unwrap_err());
        assert_eq!(
            errs,
            vec![
                "title is required".to_string(),
                "isbn is required".to_string(),
                "publication_year is required".to_string(),
                "author_id is required".to_string(),
            ]
        );
    }

    #[test]
    fn book_changes_check_year_range() {
        let c = BookCandidate { publication_year: Some(2101), ..Default::default() };
        let errs = details(validate_book_changes(&c).unwrap_err());
        assert_eq!(errs, vec!["publication_year must be between 0 and 2100".to_string()]);
    }

    #[test]
    fn author_requires_names_and_a_real_address() {
        let errs = details(validate_new_author(&AuthorCandidate::default()).unwrap_err());
        assert_eq!(
            errs,
            vec![
                "first_name is required".to_string(),
                "last_name is required".to_string(),
                "email is required".to_string(),
            ]
        );

        let bad = AuthorCandidate {
            first_name: Some("Ursula".into()),
            last_name: Some("a".repeat(101)),
            email: Some("ursula@localhost".into()),
        };
        let errs = details(validate_new_author(&bad).unwrap_err());
        assert_eq!(
            errs,
            vec![
                "last_name must be 100 chars or fewer".to_string(),
                "email must be a valid email address".to_string(),
            ]
        );
    }

    #[test]
    fn author_email_is_trimmed_with_lowercase_domain() {
        let c = AuthorCandidate {
            first_name: Some(" Ursula ".into()),
            last_name: Some("Le Guin".into()),
            email: Some("  Ursula@Earthsea.ORG ".into()),
        };
        let draft = validate_new_author(&c).unwrap();
        assert_eq!(draft.first_name, "Ursula");
        assert_eq!(draft.email, "Ursula@earthsea.org");

        let partial = AuthorCandidate { email: Some("two@@example.com".into()), ..Default::default() };
        let errs = details(validate_author_changes(&partial).unwrap_err());
        assert_eq!(errs, vec!["email must be a valid email address".to_string()]);
    }
}
