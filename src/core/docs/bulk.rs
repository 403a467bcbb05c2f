// Bulk edit operations: a tagged operation enum deserialized straight from
// tool arguments, per-operation request preparation against an optional
// document snapshot, and chunking for the API's per-call request ceiling.

use serde::Deserialize;
use serde_json::{json, Value};

use super::document_model::{body_for_tab, Document, Position};
use super::DocsError;
use super::style_requests::{
    build_update_paragraph_style_request, build_update_table_cell_style_request,
    build_update_text_style_request, ParagraphStyleOptions, TableCellStyleOptions,
    TextStyleOptions,
};
use super::text_locate::{find_paragraph_in_content, find_text_in_content};

/// Per-call request ceiling of the `batchUpdate` endpoint.
pub const MAX_BATCH_UPDATE_REQUESTS: usize = 50;
/// Upper bound on operations accepted by one bulk call.
pub const MAX_BULK_OPERATIONS: usize = 500;

fn default_index() -> Position {
    1
}

fn default_instance() -> u32 {
    1
}

fn default_span() -> i64 {
    1
}

fn default_true() -> bool {
    true
}

fn default_list_type() -> String {
    "UNORDERED".to_string()
}

fn default_section_type() -> String {
    "CONTINUOUS".to_string()
}

/// One logical edit in a bulk update call. The `type` tag selects the
/// variant; unset fields fall back to the API's natural defaults (index 1,
/// row/column 0, match instance 1).
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BulkOperation {
    InsertText {
        #[serde(default)]
        text: String,
        #[serde(default = "default_index")]
        index: Position,
        tab_id: Option<String>,
    },
    DeleteRange {
        #[serde(default = "default_index")]
        start_index: Position,
        #[serde(default = "default_index")]
        end_index: Position,
        tab_id: Option<String>,
    },
    ApplyTextStyle {
        start_index: Option<Position>,
        end_index: Option<Position>,
        text_to_find: Option<String>,
        #[serde(default = "default_instance")]
        match_instance: u32,
        tab_id: Option<String>,
        #[serde(flatten)]
        style: TextStyleOptions,
    },
    ApplyParagraphStyle {
        start_index: Option<Position>,
        end_index: Option<Position>,
        text_to_find: Option<String>,
        #[serde(default = "default_instance")]
        match_instance: u32,
        index_within_paragraph: Option<Position>,
        tab_id: Option<String>,
        #[serde(flatten)]
        style: ParagraphStyleOptions,
    },
    InsertTable {
        #[serde(default = "default_span")]
        rows: i64,
        #[serde(default = "default_span")]
        columns: i64,
        #[serde(default = "default_index")]
        index: Position,
    },
    InsertPageBreak {
        #[serde(default = "default_index")]
        index: Position,
    },
    InsertImageFromUrl {
        #[serde(default)]
        image_url: String,
        #[serde(default = "default_index")]
        index: Position,
        width: Option<f64>,
        height: Option<f64>,
    },
    CreateBulletList {
        #[serde(default = "default_index")]
        start_index: Position,
        #[serde(default = "default_index")]
        end_index: Position,
        #[serde(default = "default_list_type")]
        list_type: String,
        #[serde(default)]
        nesting_level: i64,
        tab_id: Option<String>,
    },
    ReplaceAllText {
        #[serde(default)]
        find_text: String,
        #[serde(default)]
        replace_text: String,
        #[serde(default = "default_true")]
        match_case: bool,
        tab_id: Option<String>,
    },
    InsertTableRow {
        #[serde(default = "default_index")]
        table_start_index: Position,
        #[serde(default)]
        row_index: i64,
        #[serde(default)]
        insert_below: bool,
    },
    DeleteTableRow {
        #[serde(default = "default_index")]
        table_start_index: Position,
        #[serde(default)]
        row_index: i64,
    },
    InsertTableColumn {
        #[serde(default = "default_index")]
        table_start_index: Position,
        #[serde(default)]
        column_index: i64,
        #[serde(default)]
        insert_right: bool,
    },
    DeleteTableColumn {
        #[serde(default = "default_index")]
        table_start_index: Position,
        #[serde(default)]
        column_index: i64,
    },
    UpdateTableCellStyle {
        #[serde(default = "default_index")]
        table_start_index: Position,
        #[serde(default)]
        row_index: i64,
        #[serde(default)]
        column_index: i64,
        #[serde(flatten)]
        style: TableCellStyleOptions,
    },
    MergeTableCells {
        #[serde(default = "default_index")]
        table_start_index: Position,
        #[serde(default)]
        start_row: i64,
        #[serde(default)]
        start_column: i64,
        #[serde(default = "default_span")]
        row_span: i64,
        #[serde(default = "default_span")]
        column_span: i64,
    },
    UnmergeTableCells {
        #[serde(default = "default_index")]
        table_start_index: Position,
        #[serde(default)]
        row_index: i64,
        #[serde(default)]
        column_index: i64,
    },
    CreateNamedRange {
        #[serde(default)]
        name: String,
        #[serde(default = "default_index")]
        start_index: Position,
        #[serde(default = "default_index")]
        end_index: Position,
        tab_id: Option<String>,
    },
    DeleteNamedRange {
        #[serde(default)]
        named_range_id: String,
    },
    InsertFootnote {
        #[serde(default = "default_index")]
        index: Position,
        #[serde(default)]
        footnote_text: String,
    },
    InsertTableOfContents {
        #[serde(default = "default_index")]
        index: Position,
    },
    InsertHorizontalRule {
        #[serde(default = "default_index")]
        index: Position,
    },
    InsertSectionBreak {
        #[serde(default = "default_index")]
        index: Position,
        #[serde(default = "default_section_type")]
        section_type: String,
    },
}

impl BulkOperation {
    /// The operation's wire tag, used in summaries and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InsertText { .. } => "insert_text",
            Self::DeleteRange { .. } => "delete_range",
            Self::ApplyTextStyle { .. } => "apply_text_style",
            Self::ApplyParagraphStyle { .. } => "apply_paragraph_style",
            Self::InsertTable { .. } => "insert_table",
            Self::InsertPageBreak { .. } => "insert_page_break",
            Self::InsertImageFromUrl { .. } => "insert_image_from_url",
            Self::CreateBulletList { .. } => "create_bullet_list",
            Self::ReplaceAllText { .. } => "replace_all_text",
            Self::InsertTableRow { .. } => "insert_table_row",
            Self::DeleteTableRow { .. } => "delete_table_row",
            Self::InsertTableColumn { .. } => "insert_table_column",
            Self::DeleteTableColumn { .. } => "delete_table_column",
            Self::UpdateTableCellStyle { .. } => "update_table_cell_style",
            Self::MergeTableCells { .. } => "merge_table_cells",
            Self::UnmergeTableCells { .. } => "unmerge_table_cells",
            Self::CreateNamedRange { .. } => "create_named_range",
            Self::DeleteNamedRange { .. } => "delete_named_range",
            Self::InsertFootnote { .. } => "insert_footnote",
            Self::InsertTableOfContents { .. } => "insert_table_of_contents",
            Self::InsertHorizontalRule { .. } => "insert_horizontal_rule",
            Self::InsertSectionBreak { .. } => "insert_section_break",
        }
    }

    /// Whether preparing this operation needs a document snapshot to resolve
    /// a text or paragraph target.
    pub fn needs_document(&self) -> bool {
        match self {
            Self::ApplyTextStyle { text_to_find, .. } => text_to_find.is_some(),
            Self::ApplyParagraphStyle {
                text_to_find,
                index_within_paragraph,
                ..
            } => text_to_find.is_some() || index_within_paragraph.is_some(),
            _ => false,
        }
    }
}

fn location(index: Position, tab_id: Option<&str>) -> Value {
    match tab_id {
        Some(tab_id) => json!({"index": index, "tabId": tab_id}),
        None => json!({"index": index}),
    }
}

fn range(start: Position, end: Position, tab_id: Option<&str>) -> Value {
    match tab_id {
        Some(tab_id) => json!({"startIndex": start, "endIndex": end, "tabId": tab_id}),
        None => json!({"startIndex": start, "endIndex": end}),
    }
}

fn cell_location(table_start_index: Position, row_index: i64, column_index: i64) -> Value {
    json!({
        "tableStartLocation": {"index": table_start_index},
        "rowIndex": row_index,
        "columnIndex": column_index,
    })
}

fn bullet_preset(list_type: &str) -> Result<&'static str, DocsError> {
    match list_type {
        "UNORDERED" => Ok("BULLET_DISC_CIRCLE_SQUARE"),
        "ORDERED" | "ORDERED_DECIMAL" => Ok("NUMBERED_DECIMAL_ALPHA_ROMAN"),
        other => Err(DocsError::InvalidInput(format!(
            "Unknown list_type '{other}'. Use UNORDERED or ORDERED_DECIMAL."
        ))),
    }
}

fn resolve_text_target(
    document: Option<&Document>,
    tab_id: Option<&str>,
    text_to_find: &str,
    match_instance: u32,
) -> Result<(Position, Position), DocsError> {
    let document = document.ok_or_else(|| {
        DocsError::InvalidInput("Document data required for text-finding operations".to_string())
    })?;
    let content = body_for_tab(document, tab_id)
        .map(|body| body.content.as_slice())
        .unwrap_or(&[]);

    let found = find_text_in_content(content, text_to_find, match_instance).ok_or_else(|| {
        DocsError::InvalidInput(format!(
            "Text '{text_to_find}' (instance {match_instance}) not found in document"
        ))
    })?;
    Ok((found.start, found.end))
}

fn resolve_paragraph_target(
    document: Option<&Document>,
    tab_id: Option<&str>,
    index: Position,
) -> Result<(Position, Position), DocsError> {
    let document = document.ok_or_else(|| {
        DocsError::InvalidInput(
            "Document data required for paragraph-resolving operations".to_string(),
        )
    })?;
    let content = body_for_tab(document, tab_id)
        .map(|body| body.content.as_slice())
        .unwrap_or(&[]);

    let found = find_paragraph_in_content(content, index).ok_or_else(|| {
        DocsError::InvalidInput(format!("Could not find paragraph containing index {index}"))
    })?;
    Ok((found.start, found.end))
}

/// Translate one operation into its `batchUpdate` request.
///
/// `document` is the shared snapshot fetched once per bulk call; only
/// operations with text or paragraph targets read it. Returns `Ok(None)` for
/// operations that have nothing to do (style operations with zero options
/// set), which the pipeline skips rather than rejects.
pub fn prepare_request(
    op: &BulkOperation,
    document: Option<&Document>,
    default_tab_id: Option<&str>,
) -> Result<Option<Value>, DocsError> {
    let request = match op {
        BulkOperation::InsertText { text, index, tab_id } => {
            let tab_id = tab_id.as_deref().or(default_tab_id);
            Some(json!({
                "insertText": {"text": text, "location": location(*index, tab_id)}
            }))
        }

        BulkOperation::DeleteRange {
            start_index,
            end_index,
            tab_id,
        } => {
            if end_index <= start_index {
                return Err(DocsError::InvalidInput(format!(
                    "Invalid range: end_index ({end_index}) must be greater than start_index ({start_index})"
                )));
            }
            let tab_id = tab_id.as_deref().or(default_tab_id);
            Some(json!({
                "deleteContentRange": {"range": range(*start_index, *end_index, tab_id)}
            }))
        }

        BulkOperation::ApplyTextStyle {
            start_index,
            end_index,
            text_to_find,
            match_instance,
            tab_id,
            style,
        } => {
            let tab_id = tab_id.as_deref().or(default_tab_id);
            let (start, end) = match text_to_find {
                Some(needle) => resolve_text_target(document, tab_id, needle, *match_instance)?,
                None => match (start_index, end_index) {
                    (Some(start), Some(end)) => (*start, *end),
                    _ => {
                        return Err(DocsError::InvalidInput(
                            "Either (start_index, end_index) or text_to_find must be provided for apply_text_style"
                                .to_string(),
                        ))
                    }
                },
            };

            match build_update_text_style_request(start, end, style)? {
                Some(built) => {
                    let mut request = built.request;
                    if let Some(tab_id) = tab_id {
                        request["updateTextStyle"]["range"]["tabId"] = json!(tab_id);
                    }
                    Some(request)
                }
                None => None,
            }
        }

        BulkOperation::ApplyParagraphStyle {
            start_index,
            end_index,
            text_to_find,
            match_instance,
            index_within_paragraph,
            tab_id,
            style,
        } => {
            let tab_id = tab_id.as_deref().or(default_tab_id);
            let (start, end) = if let Some(needle) = text_to_find {
                let (text_start, _) =
                    resolve_text_target(document, tab_id, needle, *match_instance)?;
                resolve_paragraph_target(document, tab_id, text_start).map_err(|_| {
                    DocsError::InvalidInput(format!(
                        "Could not find paragraph containing text '{needle}'"
                    ))
                })?
            } else if let Some(index) = index_within_paragraph {
                resolve_paragraph_target(document, tab_id, *index)?
            } else {
                match (start_index, end_index) {
                    (Some(start), Some(end)) => (*start, *end),
                    _ => {
                        return Err(DocsError::InvalidInput(
                            "Either (start_index, end_index), text_to_find, or index_within_paragraph must be provided for apply_paragraph_style"
                                .to_string(),
                        ))
                    }
                }
            };

            match build_update_paragraph_style_request(start, end, style)? {
                Some(built) => {
                    let mut request = built.request;
                    if let Some(tab_id) = tab_id {
                        request["updateParagraphStyle"]["range"]["tabId"] = json!(tab_id);
                    }
                    Some(request)
                }
                None => None,
            }
        }

        BulkOperation::InsertTable { rows, columns, index } => {
            if *rows < 1 || *columns < 1 {
                return Err(DocsError::InvalidInput(format!(
                    "Table must have at least 1 row and 1 column (got {rows}x{columns})"
                )));
            }
            Some(json!({
                "insertTable": {
                    "rows": rows,
                    "columns": columns,
                    "location": {"index": index},
                }
            }))
        }

        BulkOperation::InsertPageBreak { index } => Some(json!({
            "insertPageBreak": {"location": {"index": index}}
        })),

        BulkOperation::InsertImageFromUrl {
            image_url,
            index,
            width,
            height,
        } => {
            if image_url.is_empty() {
                return Err(DocsError::InvalidInput(
                    "image_url is required for insert_image_from_url operation".to_string(),
                ));
            }
            let mut request = json!({
                "insertInlineImage": {"uri": image_url, "location": {"index": index}}
            });
            if let (Some(width), Some(height)) = (width, height) {
                request["insertInlineImage"]["objectSize"] = json!({
                    "height": {"magnitude": height, "unit": "PT"},
                    "width": {"magnitude": width, "unit": "PT"},
                });
            }
            Some(request)
        }

        BulkOperation::CreateBulletList {
            start_index,
            end_index,
            list_type,
            nesting_level,
            tab_id,
        } => {
            tracing::debug!(%list_type, nesting_level, "Preparing bullet list request");
            let tab_id = tab_id.as_deref().or(default_tab_id);
            Some(json!({
                "createParagraphBullets": {
                    "range": range(*start_index, *end_index, tab_id),
                    "bulletPreset": bullet_preset(list_type)?,
                }
            }))
        }

        BulkOperation::ReplaceAllText {
            find_text,
            replace_text,
            match_case,
            tab_id,
        } => {
            if find_text.is_empty() {
                return Err(DocsError::InvalidInput(
                    "find_text is required for replace_all_text operation".to_string(),
                ));
            }
            let mut request = json!({
                "replaceAllText": {
                    "containsText": {"text": find_text, "matchCase": match_case},
                    "replaceText": replace_text,
                }
            });
            if let Some(tab_id) = tab_id.as_deref().or(default_tab_id) {
                request["replaceAllText"]["tabId"] = json!(tab_id);
            }
            Some(request)
        }

        BulkOperation::InsertTableRow {
            table_start_index,
            row_index,
            insert_below,
        } => Some(json!({
            "insertTableRow": {
                "tableCellLocation": cell_location(*table_start_index, *row_index, 0),
                "insertBelow": insert_below,
            }
        })),

        BulkOperation::DeleteTableRow {
            table_start_index,
            row_index,
        } => Some(json!({
            "deleteTableRow": {
                "tableCellLocation": cell_location(*table_start_index, *row_index, 0),
            }
        })),

        BulkOperation::InsertTableColumn {
            table_start_index,
            column_index,
            insert_right,
        } => Some(json!({
            "insertTableColumn": {
                "tableCellLocation": cell_location(*table_start_index, 0, *column_index),
                "insertRight": insert_right,
            }
        })),

        BulkOperation::DeleteTableColumn {
            table_start_index,
            column_index,
        } => Some(json!({
            "deleteTableColumn": {
                "tableCellLocation": cell_location(*table_start_index, 0, *column_index),
            }
        })),

        BulkOperation::UpdateTableCellStyle {
            table_start_index,
            row_index,
            column_index,
            style,
        } => build_update_table_cell_style_request(
            *table_start_index,
            *row_index,
            *column_index,
            style,
        )?,

        BulkOperation::MergeTableCells {
            table_start_index,
            start_row,
            start_column,
            row_span,
            column_span,
        } => Some(json!({
            "mergeTableCells": {
                "tableRange": {
                    "tableCellLocation": cell_location(*table_start_index, *start_row, *start_column),
                    "rowSpan": row_span,
                    "columnSpan": column_span,
                }
            }
        })),

        BulkOperation::UnmergeTableCells {
            table_start_index,
            row_index,
            column_index,
        } => Some(json!({
            "unmergeTableCells": {
                "tableCellLocation": cell_location(*table_start_index, *row_index, *column_index),
            }
        })),

        BulkOperation::CreateNamedRange {
            name,
            start_index,
            end_index,
            tab_id,
        } => {
            if name.is_empty() {
                return Err(DocsError::InvalidInput(
                    "name is required for create_named_range operation".to_string(),
                ));
            }
            let tab_id = tab_id.as_deref().or(default_tab_id);
            Some(json!({
                "createNamedRange": {
                    "name": name,
                    "range": range(*start_index, *end_index, tab_id),
                }
            }))
        }

        BulkOperation::DeleteNamedRange { named_range_id } => {
            if named_range_id.is_empty() {
                return Err(DocsError::InvalidInput(
                    "named_range_id is required for delete_named_range operation".to_string(),
                ));
            }
            Some(json!({
                "deleteNamedRange": {"namedRangeId": named_range_id}
            }))
        }

        BulkOperation::InsertFootnote {
            index,
            footnote_text,
        } => Some(json!({
            "insertInlineImage": {
                "location": {"index": index},
                "footnoteText": footnote_text,
            }
        })),

        BulkOperation::InsertTableOfContents { index } => Some(json!({
            "insertTableOfContents": {"location": {"index": index}}
        })),

        BulkOperation::InsertHorizontalRule { index } => Some(json!({
            "insertHorizontalRule": {"location": {"index": index}}
        })),

        BulkOperation::InsertSectionBreak {
            index,
            section_type,
        } => Some(json!({
            "insertSectionBreak": {
                "location": {"index": index},
                "sectionType": section_type,
            }
        })),
    };

    Ok(request)
}

/// Split a request list into groups of at most `chunk_size`, preserving
/// order. A request never splits across groups.
pub fn chunk_requests(requests: Vec<Value>, chunk_size: usize) -> Vec<Vec<Value>> {
    if requests.is_empty() {
        return Vec::new();
    }
    let mut chunks = Vec::with_capacity(requests.len().div_ceil(chunk_size));
    let mut current = Vec::with_capacity(chunk_size.min(requests.len()));
    for request in requests {
        if current.len() == chunk_size {
            chunks.push(std::mem::replace(
                &mut current,
                Vec::with_capacity(chunk_size),
            ));
        }
        current.push(request);
    }
    chunks.push(current);
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn op(value: Value) -> BulkOperation {
        serde_json::from_value(value).unwrap()
    }

    fn prepare(value: Value) -> Value {
        prepare_request(&op(value), None, None).unwrap().unwrap()
    }

    fn snapshot() -> Document {
        serde_json::from_value(json!({
            "documentId": "doc1",
            "body": {"content": [
                {"startIndex": 1, "endIndex": 43, "paragraph": {"elements": [
                    {"startIndex": 1, "endIndex": 43, "textRun": {"content": "Test test test. This is a test sentence.\n"}}
                ]}}
            ]}
        }))
        .unwrap()
    }

    #[test]
    fn insert_text_defaults_to_index_one() {
        let request = prepare(json!({"type": "insert_text", "text": "hello"}));
        assert_eq!(request["insertText"]["text"], "hello");
        assert_eq!(request["insertText"]["location"]["index"], 1);
        assert!(request["insertText"]["location"].get("tabId").is_none());
    }

    #[test]
    fn insert_text_uses_default_tab_when_not_overridden() {
        let op = op(json!({"type": "insert_text", "text": "x", "index": 5}));
        let request = prepare_request(&op, None, Some("tab9")).unwrap().unwrap();
        assert_eq!(request["insertText"]["location"]["tabId"], "tab9");

        let op = op2_with_own_tab();
        let request = prepare_request(&op, None, Some("tab9")).unwrap().unwrap();
        assert_eq!(request["insertText"]["location"]["tabId"], "tab1");
    }

    fn op2_with_own_tab() -> BulkOperation {
        op(json!({"type": "insert_text", "text": "x", "index": 5, "tab_id": "tab1"}))
    }

    #[test]
    fn delete_range_rejects_inverted_range() {
        let op = op(json!({"type": "delete_range", "start_index": 10, "end_index": 10}));
        let err = prepare_request(&op, None, None).unwrap_err();
        assert!(matches!(err, DocsError::InvalidInput(_)));
        assert!(err.to_string().contains("end_index (10)"));
    }

    #[test]
    fn delete_range_builds_content_range() {
        let request = prepare(json!({"type": "delete_range", "start_index": 5, "end_index": 12}));
        assert_eq!(request["deleteContentRange"]["range"]["startIndex"], 5);
        assert_eq!(request["deleteContentRange"]["range"]["endIndex"], 12);
    }

    #[test]
    fn apply_text_style_with_explicit_range() {
        let request = prepare(json!({
            "type": "apply_text_style",
            "start_index": 5,
            "end_index": 10,
            "bold": true,
        }));
        assert_eq!(request["updateTextStyle"]["range"]["startIndex"], 5);
        assert_eq!(request["updateTextStyle"]["textStyle"]["bold"], true);
    }

    #[test]
    fn apply_text_style_resolves_text_target_from_snapshot() {
        let doc = snapshot();
        let op = op(json!({
            "type": "apply_text_style",
            "text_to_find": "test",
            "match_instance": 3,
            "italic": true,
        }));

        let request = prepare_request(&op, Some(&doc), None).unwrap().unwrap();
        assert_eq!(request["updateTextStyle"]["range"]["startIndex"], 27);
        assert_eq!(request["updateTextStyle"]["range"]["endIndex"], 31);
    }

    #[test]
    fn apply_text_style_without_target_is_rejected() {
        let op = op(json!({"type": "apply_text_style", "bold": true}));
        assert!(prepare_request(&op, None, None).is_err());
    }

    #[test]
    fn apply_text_style_missing_text_is_rejected() {
        let doc = snapshot();
        let op = op(json!({
            "type": "apply_text_style",
            "text_to_find": "absent",
            "bold": true,
        }));
        let err = prepare_request(&op, Some(&doc), None).unwrap_err();
        assert!(err.to_string().contains("'absent'"));
    }

    #[test]
    fn apply_text_style_without_options_prepares_nothing() {
        let op = op(json!({
            "type": "apply_text_style",
            "start_index": 1,
            "end_index": 5,
        }));
        assert!(prepare_request(&op, None, None).unwrap().is_none());
    }

    #[test]
    fn apply_paragraph_style_by_contained_index() {
        let doc = snapshot();
        let op = op(json!({
            "type": "apply_paragraph_style",
            "index_within_paragraph": 20,
            "alignment": "CENTER",
        }));

        let request = prepare_request(&op, Some(&doc), None).unwrap().unwrap();
        assert_eq!(request["updateParagraphStyle"]["range"]["startIndex"], 1);
        assert_eq!(request["updateParagraphStyle"]["range"]["endIndex"], 43);
        assert_eq!(
            request["updateParagraphStyle"]["paragraphStyle"]["alignment"],
            "CENTER"
        );
    }

    #[test]
    fn apply_paragraph_style_by_text_resolves_enclosing_paragraph() {
        let doc = snapshot();
        let op = op(json!({
            "type": "apply_paragraph_style",
            "text_to_find": "sentence",
            "named_style_type": "HEADING_2",
        }));

        let request = prepare_request(&op, Some(&doc), None).unwrap().unwrap();
        assert_eq!(request["updateParagraphStyle"]["range"]["startIndex"], 1);
        assert_eq!(request["updateParagraphStyle"]["range"]["endIndex"], 43);
    }

    #[test]
    fn insert_table_validates_dimensions() {
        let request = prepare(json!({"type": "insert_table", "rows": 2, "columns": 3, "index": 4}));
        assert_eq!(request["insertTable"]["rows"], 2);
        assert_eq!(request["insertTable"]["columns"], 3);
        assert_eq!(request["insertTable"]["location"]["index"], 4);

        let op = op(json!({"type": "insert_table", "rows": 0, "columns": 3}));
        assert!(prepare_request(&op, None, None).is_err());
    }

    #[test]
    fn insert_image_builds_object_size_only_when_complete() {
        let request = prepare(json!({
            "type": "insert_image_from_url",
            "image_url": "https://example.com/a.png",
            "index": 7,
            "width": 100.0,
            "height": 50.0,
        }));
        assert_eq!(
            request["insertInlineImage"]["objectSize"]["width"]["magnitude"],
            100.0
        );

        let request = prepare(json!({
            "type": "insert_image_from_url",
            "image_url": "https://example.com/a.png",
            "width": 100.0,
        }));
        assert!(request["insertInlineImage"].get("objectSize").is_none());

        let op = op(json!({"type": "insert_image_from_url"}));
        assert!(prepare_request(&op, None, None).is_err());
    }

    #[test]
    fn bullet_list_presets() {
        let request = prepare(json!({
            "type": "create_bullet_list",
            "start_index": 10,
            "end_index": 50,
        }));
        assert_eq!(
            request["createParagraphBullets"]["bulletPreset"],
            "BULLET_DISC_CIRCLE_SQUARE"
        );

        let request = prepare(json!({
            "type": "create_bullet_list",
            "start_index": 1,
            "end_index": 20,
            "list_type": "ORDERED_DECIMAL",
        }));
        assert_eq!(
            request["createParagraphBullets"]["bulletPreset"],
            "NUMBERED_DECIMAL_ALPHA_ROMAN"
        );

        let op = op(json!({"type": "create_bullet_list", "list_type": "FANCY"}));
        assert!(prepare_request(&op, None, None).is_err());
    }

    #[test]
    fn replace_all_text_shape() {
        let request = prepare(json!({
            "type": "replace_all_text",
            "find_text": "old",
            "replace_text": "new",
        }));
        assert_eq!(request["replaceAllText"]["containsText"]["text"], "old");
        assert_eq!(request["replaceAllText"]["containsText"]["matchCase"], true);
        assert_eq!(request["replaceAllText"]["replaceText"], "new");

        let op = op(json!({
            "type": "replace_all_text",
            "find_text": "old",
            "match_case": false,
            "tab_id": "tab456",
        }));
        let request = prepare_request(&op, None, None).unwrap().unwrap();
        assert_eq!(
            request["replaceAllText"]["containsText"]["matchCase"],
            false
        );
        assert_eq!(request["replaceAllText"]["tabId"], "tab456");

        let op = self::op(json!({"type": "replace_all_text", "replace_text": "x"}));
        assert!(prepare_request(&op, None, None).is_err());
    }

    #[test]
    fn table_structure_requests() {
        let request = prepare(json!({
            "type": "insert_table_row",
            "table_start_index": 100,
            "row_index": 2,
        }));
        let location = &request["insertTableRow"]["tableCellLocation"];
        assert_eq!(location["tableStartLocation"]["index"], 100);
        assert_eq!(location["rowIndex"], 2);
        assert_eq!(request["insertTableRow"]["insertBelow"], false);

        let request = prepare(json!({
            "type": "insert_table_column",
            "table_start_index": 100,
            "column_index": 1,
            "insert_right": true,
        }));
        assert_eq!(
            request["insertTableColumn"]["tableCellLocation"]["columnIndex"],
            1
        );
        assert_eq!(request["insertTableColumn"]["insertRight"], true);

        let request = prepare(json!({
            "type": "delete_table_row",
            "table_start_index": 50,
            "row_index": 3,
        }));
        assert_eq!(
            request["deleteTableRow"]["tableCellLocation"]["rowIndex"],
            3
        );
    }

    #[test]
    fn merge_and_unmerge_requests() {
        let request = prepare(json!({
            "type": "merge_table_cells",
            "table_start_index": 100,
            "start_row": 0,
            "start_column": 0,
            "row_span": 2,
            "column_span": 3,
        }));
        let table_range = &request["mergeTableCells"]["tableRange"];
        assert_eq!(table_range["tableCellLocation"]["rowIndex"], 0);
        assert_eq!(table_range["rowSpan"], 2);
        assert_eq!(table_range["columnSpan"], 3);

        let request = prepare(json!({
            "type": "unmerge_table_cells",
            "table_start_index": 100,
            "row_index": 1,
            "column_index": 1,
        }));
        assert_eq!(
            request["unmergeTableCells"]["tableCellLocation"]["columnIndex"],
            1
        );
    }

    #[test]
    fn cell_style_without_options_prepares_nothing() {
        let op = op(json!({
            "type": "update_table_cell_style",
            "table_start_index": 100,
        }));
        assert!(prepare_request(&op, None, None).unwrap().is_none());
    }

    #[test]
    fn named_range_requests() {
        let request = prepare(json!({
            "type": "create_named_range",
            "name": "section1",
            "start_index": 10,
            "end_index": 50,
        }));
        assert_eq!(request["createNamedRange"]["name"], "section1");
        assert_eq!(request["createNamedRange"]["range"]["startIndex"], 10);

        let op = op(json!({"type": "create_named_range", "start_index": 1, "end_index": 2}));
        assert!(prepare_request(&op, None, None).is_err());

        let request = prepare(json!({
            "type": "delete_named_range",
            "named_range_id": "range123",
        }));
        assert_eq!(request["deleteNamedRange"]["namedRangeId"], "range123");
    }

    #[test]
    fn content_element_requests() {
        let request = prepare(json!({
            "type": "insert_footnote",
            "index": 50,
            "footnote_text": "a note",
        }));
        assert_eq!(request["insertInlineImage"]["location"]["index"], 50);
        assert_eq!(request["insertInlineImage"]["footnoteText"], "a note");

        let request = prepare(json!({"type": "insert_table_of_contents", "index": 10}));
        assert_eq!(request["insertTableOfContents"]["location"]["index"], 10);

        let request = prepare(json!({"type": "insert_horizontal_rule", "index": 25}));
        assert_eq!(request["insertHorizontalRule"]["location"]["index"], 25);

        let request = prepare(json!({"type": "insert_section_break", "index": 100}));
        assert_eq!(request["insertSectionBreak"]["sectionType"], "CONTINUOUS");

        let request = prepare(json!({
            "type": "insert_section_break",
            "index": 100,
            "section_type": "NEXT_PAGE",
        }));
        assert_eq!(request["insertSectionBreak"]["sectionType"], "NEXT_PAGE");
    }

    #[test]
    fn unknown_operation_tag_fails_deserialization() {
        let parsed: Result<BulkOperation, _> =
            serde_json::from_value(json!({"type": "reticulate_splines"}));
        assert!(parsed.is_err());
    }

    #[test]
    fn needs_document_only_for_text_targets() {
        assert!(op(json!({"type": "apply_text_style", "text_to_find": "x", "bold": true}))
            .needs_document());
        assert!(op(json!({"type": "apply_paragraph_style", "index_within_paragraph": 5}))
            .needs_document());
        assert!(!op(json!({"type": "apply_text_style", "start_index": 1, "end_index": 2}))
            .needs_document());
        assert!(!op(json!({"type": "insert_text", "text": "x"})).needs_document());
    }

    #[test]
    fn chunking_preserves_order_and_sizes() {
        let requests: Vec<Value> = (0..123).map(|i| json!({"n": i})).collect();
        let chunks = chunk_requests(requests, 50);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 50);
        assert_eq!(chunks[1].len(), 50);
        assert_eq!(chunks[2].len(), 23);

        let flattened: Vec<i64> = chunks
            .iter()
            .flatten()
            .map(|v| v["n"].as_i64().unwrap())
            .collect();
        assert_eq!(flattened, (0..123).collect::<Vec<_>>());
    }

    #[test]
    fn chunking_edge_sizes() {
        assert!(chunk_requests(Vec::new(), 50).is_empty());

        let chunks = chunk_requests((0..50).map(|i| json!(i)).collect(), 50);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 50);

        let chunks = chunk_requests((0..30).map(|i| json!(i)).collect(), 10);
        assert_eq!(chunks.len(), 3);
    }
}
