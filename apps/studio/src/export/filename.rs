use chrono::{NaiveDate, Utc};

/// Label used when neither the resume nor the user has a name.
pub const FALLBACK_LABEL: &str = "Resume";

const MAX_STEM_CHARS: usize = 50;

/// `<clean name>_<YYYY-MM-DD>.pdf`.
///
/// The name is the resume name, else the user name, else [`FALLBACK_LABEL`]. Only
/// ASCII letters, digits, whitespace, `-` and `_` survive; whitespace runs become a
/// single `_`; the result is cut to 50 characters.
pub fn generate_pdf_filename(
    resume_name: Option<&str>,
    user_name: Option<&str>,
    date: NaiveDate,
) -> String {
    let name = [resume_name, user_name]
        .into_iter()
        .flatten()
        .find(|n| !n.is_empty())
        .unwrap_or(FALLBACK_LABEL);

    let mut stem = clean(name);
    if stem.is_empty() {
        stem = FALLBACK_LABEL.to_string();
    }
    format!("{}_{}.pdf", stem, date.format("%Y-%m-%d"))
}

/// [`generate_pdf_filename`] dated today (UTC).
pub fn generate_pdf_filename_today(resume_name: Option<&str>, user_name: Option<&str>) -> String {
    generate_pdf_filename(resume_name, user_name, Utc::now().date_naive())
}

fn clean(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_space = false;
    for c in name.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('_');
            }
            in_space = true;
        } else if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            out.push(c);
            in_space = false;
        }
        // Anything else is dropped without ending a whitespace run.
    }
    out.chars().take(MAX_STEM_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn march_5() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
    }

    #[test]
    fn test_special_characters_are_stripped() {
        assert_eq!(
            generate_pdf_filename(Some("Jane Doe (Copy)"), None, march_5()),
            "Jane_Doe_Copy_2024-03-05.pdf"
        );
    }

    #[test]
    fn test_falls_back_to_user_then_label() {
        assert_eq!(
            generate_pdf_filename(None, Some("Sam Lee"), march_5()),
            "Sam_Lee_2024-03-05.pdf"
        );
        assert_eq!(
            generate_pdf_filename(Some(""), None, march_5()),
            "Resume_2024-03-05.pdf"
        );
        assert_eq!(
            generate_pdf_filename(Some("???"), None, march_5()),
            "Resume_2024-03-05.pdf"
        );
    }

    #[test]
    fn test_whitespace_runs_collapse() {
        assert_eq!(
            generate_pdf_filename(Some("a  \t b - c"), None, march_5()),
            "a_b_-_c_2024-03-05.pdf"
        );
        // Dropped characters between spaces still leave one run.
        assert_eq!(
            generate_pdf_filename(Some("R&D & Ops"), None, march_5()),
            "RD_Ops_2024-03-05.pdf"
        );
    }

    #[test]
    fn test_name_is_truncated_to_fifty_chars() {
        let long = "x".repeat(80);
        let name = generate_pdf_filename(Some(&long), None, march_5());
        assert_eq!(name, format!("{}_2024-03-05.pdf", "x".repeat(50)));
    }

    #[test]
    fn test_non_ascii_letters_are_dropped() {
        assert_eq!(
            generate_pdf_filename(Some("José Müller"), None, march_5()),
            "Jos_Mller_2024-03-05.pdf"
        );
    }
}
