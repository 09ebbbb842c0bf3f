//! `GET /print/:id`: the server-side print view. This is where a failed
//! client-side export of a stored resume lands.

use axum::{
    extract::{Path, Query, State},
    response::Html,
};
use serde::Deserialize;
use tracing::debug;
use vitae_core::print::UNTITLED;
use vitae_core::{render_print_page, Resume};

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::resume::ResumeRecord;
use crate::resumes::{handlers::parse_id, store};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PrintQuery {
    pub print: Option<String>,
}

impl PrintQuery {
    /// Any non-empty `print` value asks for the print dialog.
    pub fn auto_print(&self) -> bool {
        self.print.as_deref().is_some_and(|v| !v.is_empty())
    }
}

/// The record's own id and title win over whatever `data` carries.
pub fn resume_from_record(record: &ResumeRecord) -> Result<Resume, AppError> {
    let data: Resume = serde_json::from_value(record.data.clone())
        .map_err(|e| anyhow::anyhow!("Stored resume {} is malformed: {e}", record.id))?;
    let mut resume = data.with_id(record.id.to_string());
    if resume.display_name().is_none() {
        resume.name = if record.title.trim().is_empty() {
            UNTITLED.to_string()
        } else {
            record.title.clone()
        };
    }
    Ok(resume)
}

/// GET /print/:id
pub async fn handle_print(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Query(query): Query<PrintQuery>,
) -> Result<Html<String>, AppError> {
    let id = parse_id(&id)?;
    let record = store::find(&state.db, user.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;
    let resume = resume_from_record(&record)?;
    debug!("Rendering print view for resume {id} (auto print: {})", query.auto_print());
    Ok(Html(render_print_page(
        &resume,
        query.auto_print(),
        state.config.print_settle,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn record(title: &str, data: serde_json::Value) -> ResumeRecord {
        ResumeRecord {
            id: Uuid::new_v4(),
            title: title.to_string(),
            data,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_record_backfills_id_and_name() {
        let rec = record("Backend CV", json!({ "id": "local-1", "name": "" }));
        let resume = resume_from_record(&rec).unwrap();
        assert_eq!(resume.id(), rec.id.to_string());
        assert_eq!(resume.name, "Backend CV");

        let rec = record("  ", json!({}));
        assert_eq!(resume_from_record(&rec).unwrap().name, "Untitled Resume");

        let rec = record("Backend CV", json!({ "name": "Jane Doe" }));
        assert_eq!(resume_from_record(&rec).unwrap().name, "Jane Doe");
    }

    #[test]
    fn test_malformed_record_is_internal_error() {
        let rec = record("CV", json!({ "skills": 7 }));
        assert!(matches!(resume_from_record(&rec), Err(AppError::Internal(_))));
    }

    #[test]
    fn test_print_flag() {
        assert!(PrintQuery { print: Some("1".into()) }.auto_print());
        assert!(!PrintQuery { print: Some(String::new()) }.auto_print());
        assert!(!PrintQuery { print: None }.auto_print());
    }
}
