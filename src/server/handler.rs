// Maps tool calls (name + JSON arguments) onto the docs service and formats
// results as human-readable strings. Errors are surfaced as strings because
// the caller is an orchestrating assistant, not other Rust code.

use async_trait::async_trait;
use serde_json::Value;

use crate::core::docs::bulk::BulkOperation;
use crate::core::docs::document_model::TabInfo;
use crate::core::docs::style_requests::{ParagraphStyleOptions, TextStyleOptions};
use crate::core::docs::{DocsApi, DocsService, ParagraphTarget, StyleTarget};

use super::tools::docs_tool_catalog;

/// Accept either a bare document ID or a full docs.google.com URL.
pub fn extract_document_id(url_or_id: &str) -> Option<String> {
    if url_or_id.contains("docs.google.com") {
        if let Some(start) = url_or_id.find("/document/d/") {
            let after_d = &url_or_id[start + 12..];
            let end = after_d
                .find(|c| c == '/' || c == '?')
                .unwrap_or(after_d.len());
            let id = &after_d[..end];
            if !id.is_empty() {
                return Some(id.to_string());
            }
        }
        None
    } else if !url_or_id.is_empty() && !url_or_id.contains('/') && !url_or_id.contains(' ') {
        Some(url_or_id.to_string())
    } else {
        None
    }
}

#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle_tool_call(&self, name: &str, args: &Value) -> Result<String, String>;

    fn supported_tools(&self) -> Vec<String>;
}

pub struct DocsToolHandler<C: DocsApi> {
    service: DocsService<C>,
}

fn require_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, String> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("Missing '{key}' argument"))
}

fn require_i64(args: &Value, key: &str) -> Result<i64, String> {
    args.get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| format!("Missing '{key}' argument"))
}

fn opt_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(|v| v.as_str())
}

fn opt_i64(args: &Value, key: &str) -> Option<i64> {
    args.get(key).and_then(|v| v.as_i64())
}

fn opt_bool(args: &Value, key: &str, default: bool) -> bool {
    args.get(key).and_then(|v| v.as_bool()).unwrap_or(default)
}

fn document_id(args: &Value) -> Result<String, String> {
    let raw = require_str(args, "document_id")?;
    extract_document_id(raw).ok_or_else(|| format!("Could not extract document ID from: {raw}"))
}

fn format_tab(tab: &TabInfo) -> String {
    let indent = "  ".repeat(tab.level);
    let length = tab
        .text_length
        .map(|len| format!(", {len} chars"))
        .unwrap_or_default();
    format!("{indent}- {} (ID: {}{length})", tab.title, tab.tab_id)
}

impl<C: DocsApi> DocsToolHandler<C> {
    pub fn new(service: DocsService<C>) -> Self {
        Self { service }
    }

    fn text_style_target(args: &Value) -> Result<StyleTarget, String> {
        if let Some(text) = opt_str(args, "text_to_find") {
            return Ok(StyleTarget::Text {
                text: text.to_string(),
                instance: opt_i64(args, "match_instance").unwrap_or(1).max(1) as u32,
            });
        }
        match (opt_i64(args, "start_index"), opt_i64(args, "end_index")) {
            (Some(start), Some(end)) => Ok(StyleTarget::Range { start, end }),
            _ => Err(
                "Either (start_index, end_index) or text_to_find must be provided".to_string(),
            ),
        }
    }

    fn paragraph_target(args: &Value) -> Result<ParagraphTarget, String> {
        if let Some(text) = opt_str(args, "text_to_find") {
            return Ok(ParagraphTarget::Text {
                text: text.to_string(),
                instance: opt_i64(args, "match_instance").unwrap_or(1).max(1) as u32,
            });
        }
        if let Some(index) = opt_i64(args, "index_within_paragraph") {
            return Ok(ParagraphTarget::Index(index));
        }
        match (opt_i64(args, "start_index"), opt_i64(args, "end_index")) {
            (Some(start), Some(end)) => Ok(ParagraphTarget::Range { start, end }),
            _ => Err(
                "Either (start_index, end_index), text_to_find, or index_within_paragraph must be provided"
                    .to_string(),
            ),
        }
    }
}

#[async_trait]
impl<C: DocsApi> ToolHandler for DocsToolHandler<C> {
    async fn handle_tool_call(&self, name: &str, args: &Value) -> Result<String, String> {
        tracing::info!(tool = name, "Handling tool call");
        let doc_id = document_id(args)?;

        match name {
            "read_document" => {
                let max_length = opt_i64(args, "max_length").map(|n| n.max(0) as usize);
                self.service
                    .read_document(&doc_id, max_length, opt_str(args, "tab_id"))
                    .await
                    .map_err(|e| e.to_string())
            }

            "list_document_tabs" => {
                let include_content = opt_bool(args, "include_content", false);
                let tabs = self
                    .service
                    .list_document_tabs(&doc_id, include_content)
                    .await
                    .map_err(|e| e.to_string())?;

                if tabs.is_empty() {
                    return Ok("This document has no tabs structure (single-body document).".to_string());
                }
                let lines: Vec<String> = tabs.iter().map(format_tab).collect();
                Ok(format!("Document tabs:\n{}", lines.join("\n")))
            }

            "find_text_range" => {
                let text = require_str(args, "text_to_find")?;
                let instance = opt_i64(args, "match_instance").unwrap_or(1).max(1) as u32;
                let found = self
                    .service
                    .find_text_range(&doc_id, text, instance)
                    .await
                    .map_err(|e| e.to_string())?;

                Ok(match found {
                    Some(range) => format!(
                        "Found '{text}' (instance {instance}) at range {}-{}.",
                        range.start, range.end
                    ),
                    None => format!("Text '{text}' (instance {instance}) not found in document."),
                })
            }

            "get_paragraph_range" => {
                let index = require_i64(args, "index")?;
                let found = self
                    .service
                    .get_paragraph_range(&doc_id, index, opt_str(args, "tab_id"))
                    .await
                    .map_err(|e| e.to_string())?;

                Ok(match found {
                    Some(range) => format!(
                        "Paragraph containing index {index} spans range {}-{}.",
                        range.start, range.end
                    ),
                    None => format!("No paragraph contains index {index}."),
                })
            }

            "append_text" => {
                let text = require_str(args, "text")?;
                let add_newline = opt_bool(args, "add_newline_if_needed", true);
                self.service
                    .append_text(&doc_id, text, add_newline, opt_str(args, "tab_id"))
                    .await
                    .map_err(|e| e.to_string())?;
                Ok("Successfully appended text to the document.".to_string())
            }

            "insert_text" => {
                let text = require_str(args, "text")?;
                let index = require_i64(args, "index")?;
                self.service
                    .insert_text(&doc_id, text, index)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(format!("Successfully inserted text at index {index}."))
            }

            "delete_range" => {
                let start = require_i64(args, "start_index")?;
                let end = require_i64(args, "end_index")?;
                self.service
                    .delete_range(&doc_id, start, end)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(format!("Successfully deleted content in range {start}-{end}."))
            }

            "apply_text_style" => {
                let target = Self::text_style_target(args)?;
                let options: TextStyleOptions =
                    serde_json::from_value(args.clone()).map_err(|e| e.to_string())?;
                let applied = self
                    .service
                    .apply_text_style(&doc_id, target, &options)
                    .await
                    .map_err(|e| e.to_string())?;

                Ok(match applied {
                    Some(fields) => format!(
                        "Successfully applied text style ({}).",
                        fields.join(", ")
                    ),
                    None => "No style options were provided. No changes made.".to_string(),
                })
            }

            "apply_paragraph_style" => {
                let target = Self::paragraph_target(args)?;
                let options: ParagraphStyleOptions =
                    serde_json::from_value(args.clone()).map_err(|e| e.to_string())?;
                let applied = self
                    .service
                    .apply_paragraph_style(&doc_id, target, &options)
                    .await
                    .map_err(|e| e.to_string())?;

                Ok(match applied {
                    Some(fields) => format!(
                        "Successfully applied paragraph style ({}).",
                        fields.join(", ")
                    ),
                    None => "No style options were provided. No changes made.".to_string(),
                })
            }

            "insert_table" => {
                let rows = require_i64(args, "rows")?;
                let columns = require_i64(args, "columns")?;
                let index = require_i64(args, "index")?;
                self.service
                    .insert_table(&doc_id, rows, columns, index)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(format!(
                    "Successfully inserted a {rows}x{columns} table at index {index}."
                ))
            }

            "insert_page_break" => {
                let index = require_i64(args, "index")?;
                self.service
                    .insert_page_break(&doc_id, index)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(format!("Successfully inserted a page break at index {index}."))
            }

            "batch_update_document" => {
                let operations_value = args
                    .get("operations")
                    .cloned()
                    .ok_or_else(|| "Missing 'operations' argument".to_string())?;
                let operations: Vec<BulkOperation> = serde_json::from_value(operations_value)
                    .map_err(|e| format!("Invalid operations list: {e}"))?;

                self.service
                    .bulk_update(&doc_id, &operations, opt_str(args, "default_tab_id"))
                    .await
                    .map_err(|e| e.to_string())
            }

            other => Err(format!("Unknown tool: {other}")),
        }
    }

    fn supported_tools(&self) -> Vec<String> {
        docs_tool_catalog().into_iter().map(|t| t.name).collect()
    }
}
