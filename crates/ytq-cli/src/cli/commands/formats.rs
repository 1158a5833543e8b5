//! `ytq formats` – list the format catalog.

use anyhow::Result;
use ytq_core::catalog;

/// Catalog grouped by category, one `id  label` row per format.
pub fn render_catalog(current: Option<&str>) -> String {
    let mut out = String::new();
    for (category, specs) in catalog::categories() {
        out.push_str(category.label());
        out.push('\n');
        for spec in specs {
            let marker = if current.is_some_and(|c| c.eq_ignore_ascii_case(spec.id)) {
                '*'
            } else {
                ' '
            };
            out.push_str(&format!("  {marker} {:<10} {}\n", spec.id, spec.label));
        }
    }
    out
}

pub fn run_formats(json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(catalog::all())?);
    } else {
        print!("{}", render_catalog(None));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_rows_are_grouped_and_marked() {
        let text = render_catalog(Some("MP3"));
        let video = text.find("Video (WebM)").unwrap();
        let audio = text.find("Audio").unwrap();
        assert!(video < audio);
        assert!(text.contains("  * mp3"), "{text}");
        assert!(text.contains("    flac"), "{text}");
    }
}
