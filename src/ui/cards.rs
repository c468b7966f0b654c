//! Student cards derived from an extraction result.
//!
//! The webhook's schema is not fixed, so [`student_records`] is a
//! compatibility shim: it accepts a top-level `students` array, a `students`
//! array nested under `data`, a bare array, or a single object standing in for
//! one student. Anything else yields no cards. Values are displayed as-is and
//! never corrected.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

/// Scores at or above this are banded [`Band::High`].
pub const HIGH_THRESHOLD: i64 = 75;

/// Scores below this are banded [`Band::Low`].
pub const LOW_THRESHOLD: i64 = 40;

/// Colour band for a single mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    High,
    Medium,
    Low,
}

impl Band {
    /// CSS class used by the page stylesheet.
    pub fn css_class(self) -> &'static str {
        match self {
            Band::High => "high",
            Band::Medium => "medium",
            Band::Low => "low",
        }
    }
}

/// One subject row on a card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkRow {
    pub subject: String,
    /// The value exactly as the webhook sent it, rendered as text.
    pub value: String,
    /// Integer used for banding; 0 when the value is not numeric.
    pub score: i64,
    pub band: Band,
}

/// Display model for one student.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentCard {
    pub name: String,
    pub roll: String,
    pub initials: String,
    pub marks: Vec<MarkRow>,
}

pub fn band_for(score: i64) -> Band {
    if score >= HIGH_THRESHOLD {
        Band::High
    } else if score < LOW_THRESHOLD {
        Band::Low
    } else {
        Band::Medium
    }
}

static RE_LEADING_INT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*([+-]?\d+)").unwrap());

/// Integer prefix of a score: `80` → 80, `"80/100"` → 80, `"AB"` → 0.
pub fn score_of(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => RE_LEADING_INT
            .captures(s)
            .and_then(|caps| caps[1].parse::<i64>().ok())
            .unwrap_or(0),
        _ => 0,
    }
}

/// Locate the list of student records inside an extraction result.
pub fn student_records(data: &Value) -> Vec<&Value> {
    if let Some(list) = data.get("students").and_then(Value::as_array) {
        return list.iter().collect();
    }
    if let Some(list) = data
        .get("data")
        .and_then(|inner| inner.get("students"))
        .and_then(Value::as_array)
    {
        return list.iter().collect();
    }
    match data {
        Value::Array(list) => list.iter().collect(),
        Value::Object(_) => vec![data],
        _ => Vec::new(),
    }
}

/// Build one card per student record found in `data`.
pub fn student_cards(data: &Value) -> Vec<StudentCard> {
    student_records(data)
        .into_iter()
        .enumerate()
        .map(|(index, record)| student_card(record, index))
        .collect()
}

fn student_card(record: &Value, index: usize) -> StudentCard {
    let name = record
        .get("name")
        .and_then(non_empty_text)
        .unwrap_or_else(|| format!("Student {}", index + 1));
    let roll = ["roll_no", "rollNo", "roll", "id"]
        .iter()
        .find_map(|key| record.get(*key).and_then(non_empty_text))
        .unwrap_or_else(|| "N/A".to_string());

    StudentCard {
        initials: initials(&name),
        marks: mark_rows(record),
        name,
        roll,
    }
}

fn mark_rows(record: &Value) -> Vec<MarkRow> {
    let source = ["marks", "subjects"]
        .iter()
        .filter_map(|key| record.get(*key))
        .find(|v| v.is_object() || v.is_array());

    match source {
        Some(Value::Object(map)) => map
            .iter()
            .map(|(subject, value)| mark_row(subject.clone(), value))
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| {
                let subject = ["subject", "name"]
                    .iter()
                    .find_map(|key| item.get(*key).and_then(non_empty_text))?;
                let value = ["marks", "score", "obtained", "value"]
                    .iter()
                    .find_map(|key| item.get(*key))
                    .unwrap_or(&Value::Null);
                Some(mark_row(subject, value))
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn mark_row(subject: String, value: &Value) -> MarkRow {
    let score = score_of(value);
    MarkRow {
        subject,
        value: display_text(value),
        score,
        band: band_for(score),
    }
}

/// First letters of up to two space-separated words, upper-cased.
pub fn initials(name: &str) -> String {
    name.split(' ')
        .filter_map(|word| word.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect()
}

fn non_empty_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn display_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn asha_renders_one_card_with_high_and_low_bands() {
        let data = json!({
            "students": [
                { "name": "Asha", "roll_no": "12", "marks": { "Math": 80, "Eng": 35 } }
            ]
        });
        let cards = student_cards(&data);
        assert_eq!(cards.len(), 1);

        let card = &cards[0];
        assert_eq!(card.initials, "A");
        assert_eq!(card.roll, "12");
        assert_eq!(card.marks[0].subject, "Math");
        assert_eq!(card.marks[0].band, Band::High);
        assert_eq!(card.marks[1].subject, "Eng");
        assert_eq!(card.marks[1].band, Band::Low);
    }

    #[test]
    fn nested_empty_student_list_yields_no_cards() {
        assert!(student_cards(&json!({ "data": { "students": [] } })).is_empty());
    }

    #[test]
    fn top_level_array_and_single_object_are_accepted() {
        let list = json!([{ "name": "A" }, { "name": "B" }]);
        assert_eq!(student_cards(&list).len(), 2);

        let single = json!({ "name": "Ravi Kumar", "id": 7 });
        let cards = student_cards(&single);
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].initials, "RK");
        assert_eq!(cards[0].roll, "7");
    }

    #[test]
    fn scalars_yield_no_cards() {
        assert!(student_cards(&Value::Null).is_empty());
        assert!(student_cards(&json!("text")).is_empty());
    }

    #[test]
    fn band_boundaries() {
        assert_eq!(band_for(75), Band::High);
        assert_eq!(band_for(74), Band::Medium);
        assert_eq!(band_for(40), Band::Medium);
        assert_eq!(band_for(39), Band::Low);
        assert_eq!(band_for(0), Band::Low);
    }

    #[test]
    fn scores_follow_the_leading_integer() {
        assert_eq!(score_of(&json!(80)), 80);
        assert_eq!(score_of(&json!(80.9)), 80);
        assert_eq!(score_of(&json!("92/100")), 92);
        assert_eq!(score_of(&json!("  -5 ")), -5);
        assert_eq!(score_of(&json!("AB")), 0);
        assert_eq!(score_of(&json!(null)), 0);
        assert_eq!(score_of(&json!(true)), 0);
    }

    #[test]
    fn non_numeric_marks_keep_their_text() {
        let data = json!({ "students": [{ "name": "Asha", "marks": { "Art": "AB" } }] });
        let row = &student_cards(&data)[0].marks[0];
        assert_eq!(row.value, "AB");
        assert_eq!(row.score, 0);
        assert_eq!(row.band, Band::Low);
    }

    #[test]
    fn missing_fields_get_placeholders() {
        let cards = student_cards(&json!({ "students": [{}, { "name": "" }] }));
        assert_eq!(cards[0].name, "Student 1");
        assert_eq!(cards[0].roll, "N/A");
        assert_eq!(cards[0].initials, "S1");
        assert!(cards[0].marks.is_empty());
        assert_eq!(cards[1].name, "Student 2");
    }

    #[test]
    fn subjects_list_of_objects() {
        let data = json!({
            "students": [{
                "name": "Meera",
                "subjects": [
                    { "subject": "Physics", "marks": "78" },
                    { "name": "Chemistry", "score": 41 },
                    { "marks": 99 }
                ]
            }]
        });
        let marks = &student_cards(&data)[0].marks;
        assert_eq!(marks.len(), 2);
        assert_eq!(marks[0].band, Band::High);
        assert_eq!(marks[1].subject, "Chemistry");
        assert_eq!(marks[1].band, Band::Medium);
    }

    #[test]
    fn initials_take_two_words() {
        assert_eq!(initials("asha devi rao"), "AD");
        assert_eq!(initials("  Asha"), "A");
        assert_eq!(initials(""), "");
    }
}
