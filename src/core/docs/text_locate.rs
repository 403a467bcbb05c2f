// Text range resolution: maps logical targets (literal text, an index) onto
// the absolute character ranges the Docs API needs for edits.
//
// The Docs API indexes documents in UTF-16 code units, so every offset
// computed here is converted to that space before it touches a fragment's
// absolute indices. The reconstructed "full text" is only a search scratchpad;
// results are always expressed as absolute document positions.

use super::document_model::{ElementKind, Position, StructuralElement, TextFragment, TextRange};

fn utf16_len(s: &str) -> i64 {
    s.encode_utf16().count() as i64
}

/// Walk the content tree in document order and emit one fragment per text run
/// with a non-empty content string and known indices. Table cells are visited
/// row-major, left to right.
pub fn collect_fragments(content: &[StructuralElement]) -> Vec<TextFragment> {
    let mut fragments = Vec::new();
    collect_into(content, &mut fragments);
    // The API reports elements in order, but mapping below depends on it.
    fragments.sort_by_key(|f| f.start);
    fragments
}

fn collect_into(content: &[StructuralElement], out: &mut Vec<TextFragment>) {
    for element in content {
        match element.kind() {
            ElementKind::Paragraph(paragraph) => {
                for pe in &paragraph.elements {
                    let (Some(start), Some(end)) = (pe.start_index, pe.end_index) else {
                        continue;
                    };
                    let Some(text) = pe.text_run.as_ref().and_then(|r| r.content.as_deref())
                    else {
                        continue;
                    };
                    if text.is_empty() {
                        continue;
                    }
                    out.push(TextFragment {
                        text: text.to_string(),
                        start,
                        end,
                    });
                }
            }
            ElementKind::Table(table) => {
                for row in &table.table_rows {
                    for cell in &row.table_cells {
                        collect_into(&cell.content, out);
                    }
                }
            }
            ElementKind::SectionBreak | ElementKind::TableOfContents | ElementKind::Unknown => {}
        }
    }
}

/// Find the `instance`-th occurrence (1-based) of `needle` in the document
/// text and return its absolute range.
///
/// The search is case-sensitive and advances one character after each match,
/// so overlapping occurrences are all counted. Matches may straddle fragment
/// boundaries; both endpoints are mapped back through the fragment list. An
/// occurrence that cannot be mapped onto real document indices is skipped and
/// the same instance number is retried from the next search position.
pub fn find_text_in_content(
    content: &[StructuralElement],
    needle: &str,
    instance: u32,
) -> Option<TextRange> {
    if needle.is_empty() || instance == 0 {
        return None;
    }

    let fragments = collect_fragments(content);
    let mut full_text = String::new();
    for fragment in &fragments {
        full_text.push_str(&fragment.text);
    }

    tracing::debug!(
        fragments = fragments.len(),
        chars = full_text.len(),
        "Collected text fragments for search"
    );

    let needle_u16 = utf16_len(needle);
    let mut found_count = 0u32;
    let mut search_start = 0usize; // byte offset into full_text

    while found_count < instance {
        let hit = full_text.get(search_start..)?.find(needle)?;
        let byte_pos = search_start + hit;
        found_count += 1;

        if found_count == instance {
            let target_start = utf16_len(&full_text[..byte_pos]);
            let target_end = target_start + needle_u16;
            if let Some(range) = map_to_document_range(&fragments, target_start, target_end) {
                return Some(range);
            }
            // This occurrence does not map onto document indices. Skip past
            // it and keep counting toward the same instance number.
            tracing::debug!(instance, "Occurrence could not be mapped, retrying");
            found_count -= 1;
        }

        let step = full_text[byte_pos..]
            .chars()
            .next()
            .map_or(1, char::len_utf8);
        search_start = byte_pos + step;
    }

    None
}

/// Map a logical match span (UTF-16 offsets into the reconstructed text) back
/// to absolute document positions. The end boundary resolves to the fragment
/// it closes: `target_end > seg_start && target_end <= seg_end`.
fn map_to_document_range(
    fragments: &[TextFragment],
    target_start: i64,
    target_end: i64,
) -> Option<TextRange> {
    let mut start_index = None;
    let mut end_index = None;
    let mut seg_start = 0i64;

    for fragment in fragments {
        let seg_end = seg_start + utf16_len(&fragment.text);

        if start_index.is_none() && target_start >= seg_start && target_start < seg_end {
            start_index = Some(fragment.start + (target_start - seg_start));
        }
        if target_end > seg_start && target_end <= seg_end {
            end_index = Some(fragment.start + (target_end - seg_start));
            break;
        }

        seg_start = seg_end;
    }

    match (start_index, end_index) {
        (Some(start), Some(end)) => Some(TextRange { start, end }),
        _ => None,
    }
}

/// Find the paragraph whose `[startIndex, endIndex)` contains `index`,
/// recursing into table cells. Element ranges are disjoint, so once the
/// containing element is found there is no point scanning its siblings.
pub fn find_paragraph_in_content(
    content: &[StructuralElement],
    index: Position,
) -> Option<TextRange> {
    for element in content {
        let (Some(start), Some(end)) = (element.start_index, element.end_index) else {
            continue;
        };
        if index < start || index >= end {
            continue;
        }

        return match element.kind() {
            ElementKind::Paragraph(_) => Some(TextRange { start, end }),
            ElementKind::Table(table) => {
                for row in &table.table_rows {
                    for cell in &row.table_cells {
                        if let Some(found) = find_paragraph_in_content(&cell.content, index) {
                            return Some(found);
                        }
                    }
                }
                None
            }
            // The index sits inside a section break or similar; there is no
            // paragraph at that position.
            _ => None,
        };
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn content(value: serde_json::Value) -> Vec<StructuralElement> {
        serde_json::from_value(value).unwrap()
    }

    fn paragraph(start: i64, end: i64, runs: &[(&str, i64, i64)]) -> serde_json::Value {
        let elements: Vec<_> = runs
            .iter()
            .map(|(text, s, e)| {
                json!({"startIndex": s, "endIndex": e, "textRun": {"content": text}})
            })
            .collect();
        json!({"startIndex": start, "endIndex": end, "paragraph": {"elements": elements}})
    }

    #[test]
    fn finds_nth_instance_in_single_run() {
        // 42 characters (including the trailing newline) at positions 1-42.
        let content = content(json!([paragraph(
            1,
            43,
            &[("Test test test. This is a test sentence.\n", 1, 43)]
        )]));

        let third = find_text_in_content(&content, "test", 3).unwrap();
        assert_eq!(third, TextRange { start: 27, end: 31 });

        let first = find_text_in_content(&content, "test", 1).unwrap();
        assert_eq!(first, TextRange { start: 6, end: 10 });

        assert!(find_text_in_content(&content, "test", 4).is_none());
        assert!(find_text_in_content(&content, "absent", 1).is_none());
    }

    #[test]
    fn search_is_case_sensitive() {
        let content = content(json!([paragraph(1, 43, &[("Test test.\n", 1, 12)])]));
        let range = find_text_in_content(&content, "Test", 1).unwrap();
        assert_eq!(range, TextRange { start: 1, end: 5 });
        assert!(find_text_in_content(&content, "TEST", 1).is_none());
    }

    #[test]
    fn match_spanning_run_boundary_resolves() {
        let content = content(json!([paragraph(
            1,
            20,
            &[("This ", 1, 6), ("is a ", 6, 11), ("test case", 11, 20)]
        )]));

        let range = find_text_in_content(&content, "a test", 1).unwrap();
        assert_eq!(range, TextRange { start: 9, end: 15 });
    }

    #[test]
    fn match_ending_exactly_on_run_boundary_resolves_to_closing_run() {
        let content = content(json!([paragraph(
            1,
            20,
            &[("This ", 1, 6), ("is a ", 6, 11), ("test case", 11, 20)]
        )]));

        // "is a" ends exactly where the middle run ends its "is a" span.
        let range = find_text_in_content(&content, "is a", 1).unwrap();
        assert_eq!(range, TextRange { start: 6, end: 10 });
    }

    #[test]
    fn overlapping_occurrences_are_counted_individually() {
        let content = content(json!([paragraph(1, 6, &[("aaaa\n", 1, 6)])]));

        assert_eq!(
            find_text_in_content(&content, "aa", 1).unwrap(),
            TextRange { start: 1, end: 3 }
        );
        assert_eq!(
            find_text_in_content(&content, "aa", 2).unwrap(),
            TextRange { start: 2, end: 4 }
        );
        assert_eq!(
            find_text_in_content(&content, "aa", 3).unwrap(),
            TextRange { start: 3, end: 5 }
        );
        assert!(find_text_in_content(&content, "aa", 4).is_none());
    }

    #[test]
    fn offsets_are_utf16_code_units() {
        // The emoji takes two UTF-16 code units, so "test" starts at
        // absolute position 4 even though it is the 3rd char.
        let content = content(json!([paragraph(1, 9, &[("\u{1F600} test\n", 1, 9)])]));
        let range = find_text_in_content(&content, "test", 1).unwrap();
        assert_eq!(range, TextRange { start: 4, end: 8 });
    }

    #[test]
    fn searches_inside_table_cells() {
        let content = content(json!([
        {
            "startIndex": 1,
            "endIndex": 20,
            "table": {"tableRows": [
                {"tableCells": [
                    {"content": [paragraph(3, 9, &[("cell1\n", 3, 9)])]},
                    {"content": [paragraph(10, 16, &[("cell2\n", 10, 16)])]}
                ]}
            ]}
        }]));

        let range = find_text_in_content(&content, "cell2", 1).unwrap();
        assert_eq!(range, TextRange { start: 10, end: 15 });
    }

    #[test]
    fn resolved_range_round_trips_through_fragments() {
        let content = content(json!([paragraph(
            1,
            20,
            &[("This ", 1, 6), ("is a ", 6, 11), ("test case", 11, 20)]
        )]));

        let fragments = collect_fragments(&content);
        let full_text: String = fragments.iter().map(|f| f.text.as_str()).collect();
        let base = fragments[0].start;

        let range = find_text_in_content(&content, "a test", 1).unwrap();
        let sliced: String = full_text
            .chars()
            .skip((range.start - base) as usize)
            .take((range.end - range.start) as usize)
            .collect();
        assert_eq!(sliced, "a test");
    }

    #[test]
    fn paragraph_containing_index() {
        let content = content(json!([
            paragraph(1, 10, &[("para one\n", 1, 10)]),
            paragraph(10, 20, &[("para two\n", 10, 19)]),
        ]));

        assert_eq!(
            find_paragraph_in_content(&content, 5).unwrap(),
            TextRange { start: 1, end: 10 }
        );
        assert_eq!(
            find_paragraph_in_content(&content, 10).unwrap(),
            TextRange { start: 10, end: 20 }
        );
        // endIndex is exclusive.
        assert!(find_paragraph_in_content(&content, 20).is_none());
    }

    #[test]
    fn paragraph_lookup_is_idempotent() {
        let content = content(json!([
            paragraph(1, 10, &[("para one\n", 1, 10)]),
            paragraph(10, 20, &[("para two\n", 10, 19)]),
        ]));

        let first = find_paragraph_in_content(&content, 12).unwrap();
        for index in first.start..first.end {
            assert_eq!(find_paragraph_in_content(&content, index).unwrap(), first);
        }
    }

    #[test]
    fn paragraph_lookup_recurses_into_tables() {
        let content = content(json!([
        {
            "startIndex": 1,
            "endIndex": 30,
            "table": {"tableRows": [
                {"tableCells": [
                    {"content": [paragraph(3, 9, &[("cell1\n", 3, 9)])]},
                    {"content": [paragraph(10, 16, &[("cell2\n", 10, 16)])]}
                ]}
            ]}
        }]));

        assert_eq!(
            find_paragraph_in_content(&content, 12).unwrap(),
            TextRange { start: 10, end: 16 }
        );
    }

    #[test]
    fn non_paragraph_element_yields_not_found() {
        let content = content(json!([
            {"startIndex": 1, "endIndex": 2, "sectionBreak": {}},
            paragraph(2, 10, &[("content\n", 2, 10)]),
        ]));

        assert!(find_paragraph_in_content(&content, 1).is_none());
        assert!(find_paragraph_in_content(&content, 3).is_some());
    }
}
