//! The `<br>`-separated key/value block under the course header.

use scraper::ElementRef;

use crate::models::BasicInfo;
use crate::utils::html::{Fragment, NodeExt};

const ELECTIVE: &str = "選修課";
const REQUIRED: &str = "必修課";
const CREDITS_SUBFIELD: &str = "，學分數：";

/// Rebuild the block's text, turning each `<br>` into a newline.
///
/// Text pieces are trimmed and empty ones dropped; inline elements
/// contribute their stripped text.
pub fn block_text(paragraph: ElementRef<'_>) -> String {
    let mut text = String::new();
    for fragment in paragraph.fragments() {
        match fragment {
            Fragment::Text(piece) => text.push_str(piece.trim()),
            Fragment::Break => text.push('\n'),
            Fragment::Element(el) => text.push_str(&el.stripped_text()),
        }
    }
    text
}

/// Parse the rebuilt block text into labeled fields.
///
/// When no line carries a recognized label the whole text is kept under
/// `raw_text`.
pub fn parse_block(text: &str) -> BasicInfo {
    let mut info = BasicInfo::default();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Some((key, value)) = split_key_value(line) else {
            continue;
        };

        if let Some(kind) = [ELECTIVE, REQUIRED]
            .into_iter()
            .find(|kind| line.starts_with(*kind))
        {
            info.course_type = Some(kind.to_string());
            if let Some((_, credits)) = line.split_once(CREDITS_SUBFIELD) {
                info.credits = Some(credits.trim().to_string());
            }
            continue;
        }

        let slot = match key {
            "學分數" => &mut info.credits,
            "上課時間" => &mut info.class_time,
            "修課班級" => &mut info.target_class,
            "修課年級" => &mut info.target_grade,
            "選課備註" => &mut info.enrollment_notes,
            _ => continue,
        };
        *slot = Some(value.to_string());
    }

    if !info.has_labels() {
        info.raw_text = Some(text.to_string());
    }
    info
}

/// Split once on the full-width colon, or on `:` when the line has none.
fn split_key_value(line: &str) -> Option<(&str, &str)> {
    line.split_once('：')
        .or_else(|| line.split_once(':'))
        .map(|(k, v)| (k.trim(), v.trim()))
}
