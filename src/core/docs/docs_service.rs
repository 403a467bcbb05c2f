// This is the docs module - it contains the business logic for document
// editing: range resolution, style request building, and the bulk update
// pipeline. It has no HTTP code; the API is reached through the DocsApi port.

#[path = "document_model.rs"]
pub mod document_model;
#[path = "text_locate.rs"]
pub mod text_locate;
#[path = "style_requests.rs"]
pub mod style_requests;
#[path = "bulk.rs"]
pub mod bulk;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use self::bulk::{
    chunk_requests, prepare_request, BulkOperation, MAX_BATCH_UPDATE_REQUESTS,
    MAX_BULK_OPERATIONS,
};
use self::document_model::{all_tabs, body_for_tab, extract_text, Position, TabInfo, TextRange};

pub use self::document_model::Document;
use self::style_requests::{
    build_update_paragraph_style_request, build_update_text_style_request, ParagraphStyleOptions,
    TextStyleOptions,
};
use self::text_locate::{find_paragraph_in_content, find_text_in_content};

// Field masks for resolver-only fetches, so the API returns just enough
// structure to walk text runs and element boundaries.
pub const FIND_TEXT_FIELDS: &str = "body(content(paragraph(elements(startIndex,endIndex,textRun(content))),table,sectionBreak,tableOfContents,startIndex,endIndex))";
pub const PARAGRAPH_FIELDS: &str =
    "body(content(startIndex,endIndex,paragraph,table,sectionBreak,tableOfContents))";

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum DocsError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Document not found (ID: {0}). Check the ID.")]
    NotFound(String),

    #[error("Permission denied for document (ID: {0}). Ensure the authenticated account has edit access.")]
    PermissionDenied(String),

    #[error("Invalid request sent to Google Docs API: {0}")]
    InvalidRequest(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Google API error: {0}")]
    Api(String),
}

// ============================================================================
// API PORT
// ============================================================================
// The core defines what it needs from the Docs REST API; the infra layer
// implements it with a real HTTP client, tests with recording fakes.

#[async_trait]
pub trait DocsApi: Send + Sync {
    /// Fetch a document. `fields` is an optional response field mask;
    /// `include_tabs_content` asks the API to inline tab bodies.
    async fn get_document(
        &self,
        document_id: &str,
        fields: Option<&str>,
        include_tabs_content: bool,
    ) -> Result<Document, DocsError>;

    /// Submit one `batchUpdate` call. Requests execute in order within the
    /// call.
    async fn batch_update(
        &self,
        document_id: &str,
        requests: Vec<Value>,
    ) -> Result<Value, DocsError>;
}

// ============================================================================
// TARGETS
// ============================================================================

/// Where a text style applies: an explicit range, or the Nth occurrence of a
/// literal string.
#[derive(Debug, Clone)]
pub enum StyleTarget {
    Range { start: Position, end: Position },
    Text { text: String, instance: u32 },
}

/// Where a paragraph style applies. Text and Index targets resolve to the
/// whole paragraph containing them.
#[derive(Debug, Clone)]
pub enum ParagraphTarget {
    Range { start: Position, end: Position },
    Text { text: String, instance: u32 },
    Index(Position),
}

// ============================================================================
// SERVICE
// ============================================================================

pub struct DocsService<C: DocsApi> {
    client: C,
}

impl<C: DocsApi> DocsService<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Find the Nth occurrence of `text` in the document. `Ok(None)` when
    /// the text does not occur that many times.
    pub async fn find_text_range(
        &self,
        document_id: &str,
        text: &str,
        instance: u32,
    ) -> Result<Option<TextRange>, DocsError> {
        if text.is_empty() {
            return Err(DocsError::InvalidInput(
                "text_to_find must not be empty".to_string(),
            ));
        }

        let document = self
            .client
            .get_document(document_id, Some(FIND_TEXT_FIELDS), false)
            .await?;
        let content = document
            .body
            .as_ref()
            .map(|body| body.content.as_slice())
            .unwrap_or(&[]);

        Ok(find_text_in_content(content, text, instance))
    }

    /// Range of the paragraph containing `index`. `Ok(None)` when the index
    /// falls outside every paragraph.
    pub async fn get_paragraph_range(
        &self,
        document_id: &str,
        index: Position,
        tab_id: Option<&str>,
    ) -> Result<Option<TextRange>, DocsError> {
        let document = if tab_id.is_some() {
            self.client.get_document(document_id, None, true).await?
        } else {
            self.client
                .get_document(document_id, Some(PARAGRAPH_FIELDS), false)
                .await?
        };

        let content = body_for_tab(&document, tab_id)
            .map(|body| body.content.as_slice())
            .unwrap_or(&[]);

        Ok(find_paragraph_in_content(content, index))
    }

    /// Plain-text rendering of the document (or one tab), optionally
    /// truncated to `max_length` characters.
    pub async fn read_document(
        &self,
        document_id: &str,
        max_length: Option<usize>,
        tab_id: Option<&str>,
    ) -> Result<String, DocsError> {
        let document = self.client.get_document(document_id, None, true).await?;
        let content = body_for_tab(&document, tab_id)
            .map(|body| body.content.as_slice())
            .unwrap_or(&[]);

        let text = extract_text(content);
        let Some(max) = max_length else {
            return Ok(text);
        };
        if text.chars().count() <= max {
            return Ok(text);
        }

        let total = text.chars().count();
        let truncated: String = text.chars().take(max).collect();
        Ok(format!(
            "{truncated}\n\n[Content truncated: showing {max} of {total} characters]"
        ))
    }

    /// Flattened tab tree. Text lengths are only known when content is
    /// requested.
    pub async fn list_document_tabs(
        &self,
        document_id: &str,
        include_content: bool,
    ) -> Result<Vec<TabInfo>, DocsError> {
        let document = self
            .client
            .get_document(document_id, None, include_content)
            .await?;
        Ok(all_tabs(&document))
    }

    /// Append text at the end of the document (or tab). Inserts just before
    /// the trailing newline of the final element.
    pub async fn append_text(
        &self,
        document_id: &str,
        text: &str,
        add_newline_if_needed: bool,
        tab_id: Option<&str>,
    ) -> Result<(), DocsError> {
        if text.is_empty() {
            return Ok(());
        }

        let document = self.client.get_document(document_id, None, true).await?;
        let content = body_for_tab(&document, tab_id)
            .map(|body| body.content.as_slice())
            .unwrap_or(&[]);

        let end = content
            .iter()
            .rev()
            .find_map(|element| element.end_index)
            .unwrap_or(2);
        let insert_at = (end - 1).max(1);

        let payload = if add_newline_if_needed && insert_at > 1 {
            format!("\n{text}")
        } else {
            text.to_string()
        };

        tracing::debug!(document_id, insert_at, "Appending text");
        let request = serde_json::json!({
            "insertText": {"text": payload, "location": {"index": insert_at}}
        });
        self.client
            .batch_update(document_id, vec![request])
            .await?;
        Ok(())
    }

    /// Insert text at an absolute position. Empty text is a no-op.
    pub async fn insert_text(
        &self,
        document_id: &str,
        text: &str,
        index: Position,
    ) -> Result<(), DocsError> {
        if text.is_empty() {
            return Ok(());
        }
        let request = serde_json::json!({
            "insertText": {"text": text, "location": {"index": index}}
        });
        self.client
            .batch_update(document_id, vec![request])
            .await?;
        Ok(())
    }

    /// Delete the half-open range `[start, end)`.
    pub async fn delete_range(
        &self,
        document_id: &str,
        start: Position,
        end: Position,
    ) -> Result<(), DocsError> {
        if end <= start {
            return Err(DocsError::InvalidInput(format!(
                "Invalid range: end_index ({end}) must be greater than start_index ({start})"
            )));
        }
        let request = serde_json::json!({
            "deleteContentRange": {"range": {"startIndex": start, "endIndex": end}}
        });
        self.client
            .batch_update(document_id, vec![request])
            .await?;
        Ok(())
    }

    /// Apply character styling. Returns the field names changed, or `None`
    /// when no style option was set (nothing sent).
    pub async fn apply_text_style(
        &self,
        document_id: &str,
        target: StyleTarget,
        options: &TextStyleOptions,
    ) -> Result<Option<Vec<&'static str>>, DocsError> {
        let (start, end) = match target {
            StyleTarget::Range { start, end } => (start, end),
            StyleTarget::Text { text, instance } => {
                let found = self
                    .find_text_range(document_id, &text, instance)
                    .await?
                    .ok_or_else(|| {
                        DocsError::InvalidInput(format!(
                            "Text '{text}' (instance {instance}) not found in document"
                        ))
                    })?;
                (found.start, found.end)
            }
        };

        let Some(built) = build_update_text_style_request(start, end, options)? else {
            return Ok(None);
        };
        self.client
            .batch_update(document_id, vec![built.request])
            .await?;
        Ok(Some(built.fields))
    }

    /// Apply paragraph styling to the paragraph selected by `target`.
    pub async fn apply_paragraph_style(
        &self,
        document_id: &str,
        target: ParagraphTarget,
        options: &ParagraphStyleOptions,
    ) -> Result<Option<Vec<&'static str>>, DocsError> {
        let (start, end) = match target {
            ParagraphTarget::Range { start, end } => (start, end),
            ParagraphTarget::Text { text, instance } => {
                let found = self
                    .find_text_range(document_id, &text, instance)
                    .await?
                    .ok_or_else(|| {
                        DocsError::InvalidInput(format!(
                            "Text '{text}' (instance {instance}) not found in document"
                        ))
                    })?;
                let paragraph = self
                    .get_paragraph_range(document_id, found.start, None)
                    .await?
                    .ok_or_else(|| {
                        DocsError::InvalidInput(format!(
                            "Could not find paragraph containing text '{text}'"
                        ))
                    })?;
                (paragraph.start, paragraph.end)
            }
            ParagraphTarget::Index(index) => {
                let paragraph = self
                    .get_paragraph_range(document_id, index, None)
                    .await?
                    .ok_or_else(|| {
                        DocsError::InvalidInput(format!(
                            "Could not find paragraph containing index {index}"
                        ))
                    })?;
                (paragraph.start, paragraph.end)
            }
        };

        let Some(built) = build_update_paragraph_style_request(start, end, options)? else {
            return Ok(None);
        };
        self.client
            .batch_update(document_id, vec![built.request])
            .await?;
        Ok(Some(built.fields))
    }

    /// Insert an empty table.
    pub async fn insert_table(
        &self,
        document_id: &str,
        rows: i64,
        columns: i64,
        index: Position,
    ) -> Result<(), DocsError> {
        if rows < 1 || columns < 1 {
            return Err(DocsError::InvalidInput(
                "Table must have at least 1 row and 1 column.".to_string(),
            ));
        }
        let request = serde_json::json!({
            "insertTable": {
                "location": {"index": index},
                "rows": rows,
                "columns": columns,
            }
        });
        self.client
            .batch_update(document_id, vec![request])
            .await?;
        Ok(())
    }

    /// Insert a page break.
    pub async fn insert_page_break(
        &self,
        document_id: &str,
        index: Position,
    ) -> Result<(), DocsError> {
        let request = serde_json::json!({
            "insertPageBreak": {"location": {"index": index}}
        });
        self.client
            .batch_update(document_id, vec![request])
            .await?;
        Ok(())
    }

    /// Execute a list of edit operations as batched `batchUpdate` calls.
    ///
    /// The pipeline is linear: validate, fetch one shared snapshot if any
    /// operation resolves a text or paragraph target, prepare every request
    /// (any failure aborts before the first edit call), chunk to the API
    /// ceiling, submit chunks sequentially. A chunk failure stops the
    /// pipeline; earlier chunks have already committed and are not rolled
    /// back.
    pub async fn bulk_update(
        &self,
        document_id: &str,
        operations: &[BulkOperation],
        default_tab_id: Option<&str>,
    ) -> Result<String, DocsError> {
        tracing::info!(
            document_id,
            operations = operations.len(),
            "Processing bulk update"
        );

        if operations.is_empty() {
            return Ok("No operations to execute.".to_string());
        }
        if operations.len() > MAX_BULK_OPERATIONS {
            return Err(DocsError::InvalidInput(format!(
                "Too many operations ({}). Maximum is {MAX_BULK_OPERATIONS} operations per call.",
                operations.len()
            )));
        }

        // One snapshot shared by every text-resolving operation in this call.
        let document = if operations.iter().any(BulkOperation::needs_document) {
            tracing::debug!(document_id, "Fetching snapshot for target resolution");
            Some(self.client.get_document(document_id, None, true).await?)
        } else {
            None
        };

        let mut requests = Vec::with_capacity(operations.len());
        let mut kind_counts: BTreeMap<&'static str, usize> = BTreeMap::new();

        for (position, op) in operations.iter().enumerate() {
            let prepared = prepare_request(op, document.as_ref(), default_tab_id).map_err(
                |err| {
                    DocsError::InvalidInput(format!(
                        "Error preparing operation {} ({}): {err}",
                        position + 1,
                        op.kind()
                    ))
                },
            )?;
            // Style operations with nothing to change prepare no request.
            if let Some(request) = prepared {
                requests.push(request);
                *kind_counts.entry(op.kind()).or_insert(0) += 1;
            }
        }

        let chunks = chunk_requests(requests, MAX_BATCH_UPDATE_REQUESTS);
        let batch_count = chunks.len();
        tracing::info!(document_id, batches = batch_count, "Submitting batches");

        for (batch_index, chunk) in chunks.into_iter().enumerate() {
            tracing::debug!(
                batch = batch_index + 1,
                of = batch_count,
                requests = chunk.len(),
                "Executing batch"
            );
            if let Err(err) = self.client.batch_update(document_id, chunk).await {
                return Err(DocsError::Api(format!(
                    "Bulk update stopped at batch {} of {batch_count}: {err}. \
                     The first {batch_index} batch(es) were already applied and are not rolled back.",
                    batch_index + 1
                )));
            }
        }

        let mut summary = format!(
            "Successfully executed {} operations in {} batch(es):\n",
            operations.len(),
            batch_count
        );
        for (kind, count) in kind_counts {
            summary.push_str(&format!("\n  - {count}x {kind}"));
        }
        Ok(summary)
    }
}
