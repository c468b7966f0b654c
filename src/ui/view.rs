//! HTML fragments for the results panel.
//!
//! The browser page posts the extraction result to `/api/render` and swaps the
//! returned fragment into the cards container, so the banding and fallback
//! rules in [`cards`](super::cards) are applied in one place only.

use crate::error::RelayError;
use crate::relay::ExtractionResult;
use crate::ui::cards::{student_cards, StudentCard};
use askama::Template;

#[derive(Template)]
#[template(path = "cards.html")]
pub struct CardsTemplate {
    pub cards: Vec<StudentCard>,
}

/// Render the student cards for an extraction result.
///
/// A payload with no recognisable student records renders the
/// "No student data found" placeholder.
pub fn render_results(data: &ExtractionResult) -> Result<String, RelayError> {
    let template = CardsTemplate {
        cards: student_cards(data),
    };
    Ok(template.render()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn asha_card_markup() {
        let html = render_results(&json!({
            "students": [
                { "name": "Asha", "roll_no": "12", "marks": { "Math": 80, "Eng": 35 } }
            ]
        }))
        .unwrap();

        assert_eq!(html.matches("class=\"student-card\"").count(), 1);
        assert!(html.contains("<div class=\"student-avatar\">A</div>"));
        assert!(html.contains("Roll No: 12"));
        assert!(html.contains("mark-value high\">80<"));
        assert!(html.contains("mark-value low\">35<"));
    }

    #[test]
    fn empty_list_renders_placeholder() {
        let html = render_results(&json!({ "data": { "students": [] } })).unwrap();
        assert!(html.contains("No student data found"));
        assert!(!html.contains("student-card"));
    }

    #[test]
    fn student_without_marks() {
        let html = render_results(&json!({ "students": [{ "name": "Ravi" }] })).unwrap();
        assert!(html.contains("No marks data"));
        assert!(html.contains("Roll No: N/A"));
    }

    #[test]
    fn values_are_escaped() {
        let html = render_results(&json!({ "students": [{ "name": "<b>x</b>" }] })).unwrap();
        assert!(!html.contains("<b>x</b>"));
        assert!(html.contains("&lt;b&gt;"));
    }
}
