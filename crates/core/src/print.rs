//! The print view: the resume preview on an always-white A4 page, which the
//! browser prints natively. Served by the API and written to disk by the studio
//! for resumes that only exist locally.

use std::time::Duration;

use crate::dom::escape_html;
use crate::palette::Palette;
use crate::preview::render_preview;
use crate::Resume;

/// Fallback document title for a resume without a name.
pub const UNTITLED: &str = "Untitled Resume";

/// Query flag that makes the print view call `window.print()` once it settles.
pub const PRINT_FLAG: &str = "print=1";

/// A complete HTML document for `resume`, rendered with the light palette no
/// matter which theme the user browses with.
pub fn render_print_page(resume: &Resume, auto_print: bool, settle: Duration) -> String {
    let palette = Palette::light();
    let preview = render_preview(resume, &palette).to_html();
    let title = escape_html(resume.display_name().unwrap_or(UNTITLED));
    let script = if auto_print {
        format!(
            "<script>window.addEventListener(\"load\", function () {{ setTimeout(function () {{ try {{ window.print(); }} catch (e) {{}} }}, {}); }});</script>",
            settle.as_millis()
        )
    } else {
        String::new()
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>
@page {{ size: A4; margin: 12mm; }}
html, body {{ margin: 0; background: #ffffff; color: #000000; }}
main {{ max-width: 794px; margin: 0 auto; padding: 24px; background: #ffffff; }}
@media print {{
  html, body, main {{ background: #ffffff !important; color: #000000 !important; }}
  main {{ padding: 0; }}
}}
</style>
</head>
<body>
<main>{preview}</main>
{script}
</body>
</html>
"#
    )
}
