//! Preview Renderer — maps a [`Resume`] to the single-column, ATS-friendly element tree
//! shown in the editor, mounted off-screen for export and served as the print view.
//!
//! Layout, in fixed order: header (name, role, contact line), then each non-empty
//! section. Empty sections are omitted entirely. All colours come from the
//! [`Palette`] argument and are written inline, so the tree renders the same with or
//! without any stylesheet.

use serde::{Deserialize, Serialize};

use crate::dom::{Element, FontFamily, FontWeight, ListMarker, Style, Tag, WhiteSpace};
use crate::model::{Resume, ResumeSection};
use crate::palette::Palette;

/// Attribute carried by the preview root. The studio uses it to find the export source.
pub const PREVIEW_ATTR: &str = "data-preview";
/// Attribute naming the section on every `<section>` element.
pub const SECTION_ATTR: &str = "data-section";

const CONTACT_SEPARATOR: &str = " • ";
const BULLET_PREFIXES: [char; 2] = ['-', '•'];

// ────────────────────────────────────────────────────────────────────────────
// Sections
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Summary,
    Experience,
    Education,
    Projects,
    Skills,
    Achievements,
    Languages,
}

impl SectionKind {
    /// Render order.
    pub const ALL: [SectionKind; 7] = [
        SectionKind::Summary,
        SectionKind::Experience,
        SectionKind::Education,
        SectionKind::Projects,
        SectionKind::Skills,
        SectionKind::Achievements,
        SectionKind::Languages,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            SectionKind::Summary => "summary",
            SectionKind::Experience => "experience",
            SectionKind::Education => "education",
            SectionKind::Projects => "projects",
            SectionKind::Skills => "skills",
            SectionKind::Achievements => "achievements",
            SectionKind::Languages => "languages",
        }
    }

    pub fn heading(&self) -> &'static str {
        match self {
            SectionKind::Summary => "Professional Summary",
            SectionKind::Experience => "Work Experience",
            SectionKind::Education => "Education",
            SectionKind::Projects => "Projects",
            SectionKind::Skills => "Skills",
            SectionKind::Achievements => "Achievements",
            SectionKind::Languages => "Languages",
        }
    }

    fn has_content(&self, resume: &Resume) -> bool {
        match self {
            SectionKind::Summary => !resume.summary.trim().is_empty(),
            SectionKind::Experience => !resume.experience.is_empty(),
            SectionKind::Education => !resume.education.is_empty(),
            SectionKind::Projects => !resume.projects.is_empty(),
            SectionKind::Skills => !resume.skills.is_empty(),
            SectionKind::Achievements => !resume.achievements.is_empty(),
            SectionKind::Languages => !resume.languages.is_empty(),
        }
    }
}

/// The sections `render_preview` will emit for this resume, in render order.
pub fn visible_sections(resume: &Resume) -> Vec<SectionKind> {
    SectionKind::ALL
        .into_iter()
        .filter(|kind| kind.has_content(resume))
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Renderer
// ────────────────────────────────────────────────────────────────────────────

pub fn render_preview(resume: &Resume, palette: &Palette) -> Element {
    let root = Element::new(Tag::Article)
        .attr(PREVIEW_ATTR, "resume")
        .attr("data-resume-id", resume.id())
        .attr("aria-label", "Resume preview")
        .style(Style {
            color: Some(palette.text),
            background: Some(palette.background),
            font_family: Some(FontFamily::Sans),
            font_size_px: Some(14.0),
            line_height: Some(1.5),
            padding_px: Some(24.0),
            ..Style::default()
        })
        .child(render_header(resume, palette));

    visible_sections(resume)
        .into_iter()
        .fold(root, |root, kind| root.child(render_section(kind, resume, palette)))
}

fn render_header(resume: &Resume, palette: &Palette) -> Element {
    let name = resume.display_name().unwrap_or("Your Name");
    let role = match resume.role.trim() {
        "" => "Your Role",
        role => role,
    };

    let mut header = Element::new(Tag::Header)
        .style(Style {
            margin_bottom_px: Some(16.0),
            ..Style::default()
        })
        .child(
            Element::new(Tag::H1)
                .style(Style {
                    color: Some(palette.text),
                    font_size_px: Some(24.0),
                    font_weight: Some(FontWeight::Bold),
                    line_height: Some(1.25),
                    ..Style::default()
                })
                .child(name),
        )
        .child(
            Element::new(Tag::P)
                .style(Style {
                    color: Some(palette.muted),
                    font_size_px: Some(14.0),
                    ..Style::default()
                })
                .child(role),
        );

    let contacts = resume.contacts();
    if !contacts.is_empty() {
        header = header.child(
            Element::new(Tag::P)
                .attr("data-role", "contacts")
                .style(Style {
                    color: Some(palette.faint),
                    font_size_px: Some(12.0),
                    margin_top_px: Some(4.0),
                    ..Style::default()
                })
                .child(contacts.join(CONTACT_SEPARATOR)),
        );
    }
    header
}

fn render_section(kind: SectionKind, resume: &Resume, palette: &Palette) -> Element {
    let heading = Element::new(Tag::H2)
        .style(Style {
            color: Some(palette.text),
            border_color: Some(palette.rule),
            border_bottom_px: Some(1.0),
            padding_bottom_px: Some(4.0),
            margin_bottom_px: Some(4.0),
            font_size_px: Some(14.0),
            font_weight: Some(FontWeight::Semibold),
            letter_spacing_em: Some(0.025),
            ..Style::default()
        })
        .child(kind.heading());

    let section = Element::new(Tag::Section)
        .attr(SECTION_ATTR, kind.key())
        .style(Style {
            margin_bottom_px: Some(16.0),
            ..Style::default()
        })
        .child(heading);

    match kind {
        SectionKind::Summary => match text_block(&resume.summary, palette) {
            Some(block) => section.child(block),
            None => section,
        },
        SectionKind::Experience => {
            section.child(entry_list(&resume.experience, palette, experience_meta))
        }
        SectionKind::Education => {
            section.child(entry_list(&resume.education, palette, education_meta))
        }
        SectionKind::Projects => section.child(entry_list(&resume.projects, palette, project_meta)),
        SectionKind::Skills => section.child(
            Element::new(Tag::P)
                .style(Style {
                    color: Some(palette.body),
                    ..Style::default()
                })
                .child(resume.skills.join(", ")),
        ),
        SectionKind::Achievements => section.child(bullet_list(&resume.achievements, palette)),
        SectionKind::Languages => section.child(bullet_list(&resume.languages, palette)),
    }
}

/// Title plus the secondary lines shown under it for one entry kind.
struct EntryMeta {
    title: String,
    lines: Vec<(String, bool)>,
}

fn experience_meta(e: &ResumeSection) -> EntryMeta {
    let start = e.start_date.as_deref().unwrap_or("");
    let end = e.end_date.as_deref().unwrap_or("");
    let lines = if start.is_empty() && end.is_empty() {
        vec![]
    } else {
        vec![(format!("{start} – {end}"), false)]
    };
    EntryMeta {
        title: e.title.clone(),
        lines,
    }
}

fn education_meta(e: &ResumeSection) -> EntryMeta {
    EntryMeta {
        title: e.title.clone(),
        lines: non_empty(e.graduation_date.as_deref())
            .map(|d| (d.to_string(), false))
            .into_iter()
            .collect(),
    }
}

fn project_meta(p: &ResumeSection) -> EntryMeta {
    let mut title = p.title.clone();
    for extra in [p.framework.as_deref(), p.duration.as_deref()] {
        if let Some(extra) = non_empty(extra) {
            title.push_str(CONTACT_SEPARATOR);
            title.push_str(extra);
        }
    }
    EntryMeta {
        title,
        lines: non_empty(p.link.as_deref())
            .map(|l| (l.to_string(), true))
            .into_iter()
            .collect(),
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

fn entry_list(
    entries: &[ResumeSection],
    palette: &Palette,
    meta: fn(&ResumeSection) -> EntryMeta,
) -> Element {
    let items = entries.iter().map(|entry| {
        let EntryMeta { title, lines } = meta(entry);
        let mut item = Element::new(Tag::Li)
            .attr("data-entry-id", entry.id.as_str())
            .style(Style {
                margin_bottom_px: Some(12.0),
                ..Style::default()
            })
            .child(
                Element::new(Tag::P)
                    .style(Style {
                        color: Some(palette.text),
                        font_weight: Some(FontWeight::Medium),
                        ..Style::default()
                    })
                    .child(title),
            );
        for (line, is_link) in lines {
            item = item.child(
                Element::new(Tag::P)
                    .style(Style {
                        color: Some(palette.faint),
                        font_size_px: Some(12.0),
                        break_all: is_link.then_some(true),
                        ..Style::default()
                    })
                    .child(line),
            );
        }
        let body = Element::new(Tag::Div).style(Style {
            margin_top_px: Some(4.0),
            ..Style::default()
        });
        match text_block(&entry.content, palette) {
            Some(block) => item.child(body.child(block)),
            None => item.child(body),
        }
    });

    Element::new(Tag::Ul)
        .style(Style {
            list_marker: Some(ListMarker::None),
            ..Style::default()
        })
        .children(items)
}

fn bullet_list<S: AsRef<str>>(lines: &[S], palette: &Palette) -> Element {
    Element::new(Tag::Ul)
        .style(Style {
            color: Some(palette.body),
            list_marker: Some(ListMarker::Disc),
            padding_left_px: Some(20.0),
            ..Style::default()
        })
        .children(lines.iter().map(|line| {
            Element::new(Tag::Li)
                .style(Style {
                    margin_bottom_px: Some(4.0),
                    ..Style::default()
                })
                .child(line.as_ref())
        }))
}

/// Renders free text: a bullet list when it holds more than one non-empty line,
/// otherwise a whitespace-preserving paragraph of the original text.
///
/// Leading `-` / `•` markers are stripped from bullet lines. Returns `None` for
/// empty input.
pub fn text_block(text: &str, palette: &Palette) -> Option<Element> {
    if text.is_empty() {
        return None;
    }
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    if lines.len() <= 1 {
        return Some(
            Element::new(Tag::P)
                .style(Style {
                    color: Some(palette.body),
                    white_space: Some(WhiteSpace::PreWrap),
                    ..Style::default()
                })
                .child(text),
        );
    }

    let stripped: Vec<&str> = lines
        .into_iter()
        .map(|l| l.strip_prefix(BULLET_PREFIXES).unwrap_or(l).trim_start())
        .collect();
    Some(bullet_list(&stripped, palette))
}
