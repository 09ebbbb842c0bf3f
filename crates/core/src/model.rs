use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A single entry in one of the list sections (experience, education, projects).
///
/// `content` is free text; newline-separated lines become bullets in the preview.
/// The optional fields only apply to the section kind that uses them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeSection {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graduation_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

impl ResumeSection {
    pub fn new(id: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }
}

/// The canonical resume document, as stored in `resumes.data` and in the local cache.
///
/// `id` has no setter: it is fixed at construction (or deserialization) time.
/// `updated_at` is epoch milliseconds and only moves forward through [`Resume::touch`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resume {
    #[serde(default)]
    id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    #[serde(default)]
    pub experience: Vec<ResumeSection>,
    #[serde(default)]
    pub education: Vec<ResumeSection>,
    #[serde(default)]
    pub projects: Vec<ResumeSection>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub achievements: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub updated_at: i64,
}

impl Resume {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            role: String::new(),
            summary: String::new(),
            email: None,
            phone: None,
            linkedin: None,
            site: None,
            experience: Vec::new(),
            education: Vec::new(),
            projects: Vec::new(),
            skills: Vec::new(),
            achievements: Vec::new(),
            languages: Vec::new(),
            updated_at: Utc::now().timestamp_millis(),
        }
    }

    /// Rebuilds a resume under a different identity, keeping every other field.
    ///
    /// Used when a record fetched from the server carries its id outside of `data`.
    pub fn with_id(self, id: impl Into<String>) -> Self {
        Self { id: id.into(), ..self }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Marks the resume as mutated. `updated_at` becomes `now_ms`, or one past the
    /// previous value when the clock has not advanced.
    pub fn touch(&mut self, now_ms: i64) {
        self.updated_at = now_ms.max(self.updated_at.saturating_add(1));
    }

    /// Trimmed display name, `None` when the name is blank.
    pub fn display_name(&self) -> Option<&str> {
        let name = self.name.trim();
        (!name.is_empty()).then_some(name)
    }

    /// Contact fields in display order, skipping absent and empty values.
    pub fn contacts(&self) -> Vec<&str> {
        [&self.email, &self.phone, &self.linkedin, &self.site]
            .into_iter()
            .filter_map(|c| c.as_deref())
            .filter(|c| !c.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touch_is_strictly_increasing() {
        let mut resume = Resume::new("r1");
        resume.updated_at = 1_000;

        resume.touch(2_000);
        assert_eq!(resume.updated_at, 2_000);

        // Clock stalled
        resume.touch(2_000);
        assert_eq!(resume.updated_at, 2_001);

        // Clock went backwards
        resume.touch(500);
        assert_eq!(resume.updated_at, 2_002);
    }

    #[test]
    fn test_deserializes_camel_case_record() {
        let json = r#"{
            "id": "abc",
            "name": "Jane Doe",
            "role": "Engineer",
            "summary": "",
            "experience": [{"id": "e1", "title": "Acme", "content": "Built things", "startDate": "2020"}],
            "education": [],
            "skills": ["Rust"],
            "updatedAt": 1700000000000
        }"#;
        let resume: Resume = serde_json::from_str(json).unwrap();
        assert_eq!(resume.id(), "abc");
        assert_eq!(resume.experience[0].start_date.as_deref(), Some("2020"));
        assert!(resume.projects.is_empty());
        assert!(resume.languages.is_empty());
        assert_eq!(resume.updated_at, 1_700_000_000_000);
    }

    #[test]
    fn test_contacts_skip_blank_values() {
        let mut resume = Resume::new("r1");
        resume.email = Some("jane@example.com".to_string());
        resume.phone = Some(String::new());
        resume.site = Some("jane.dev".to_string());
        assert_eq!(resume.contacts(), vec!["jane@example.com", "jane.dev"]);
    }

    #[test]
    fn test_display_name_blank_is_none() {
        let mut resume = Resume::new("r1");
        resume.name = "   ".to_string();
        assert_eq!(resume.display_name(), None);
        resume.name = " Jane ".to_string();
        assert_eq!(resume.display_name(), Some("Jane"));
    }

    #[test]
    fn test_with_id_keeps_content() {
        let mut resume = Resume::new("local");
        resume.name = "Jane".to_string();
        let moved = resume.with_id("server-id");
        assert_eq!(moved.id(), "server-id");
        assert_eq!(moved.name, "Jane");
    }
}
