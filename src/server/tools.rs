// Tool schema definitions for the document editing surface. These are the
// declarations an orchestrating assistant sees; the handler module maps the
// calls onto the core service.

use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    pub parameters: ToolParameters,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolParameters {
    #[serde(rename = "type")]
    pub param_type: String,
    pub properties: HashMap<String, PropertyDef>,
    pub required: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PropertyDef {
    #[serde(rename = "type")]
    pub prop_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

fn prop(prop_type: &str, description: &str) -> PropertyDef {
    PropertyDef {
        prop_type: prop_type.to_string(),
        description: Some(description.to_string()),
        enum_values: None,
    }
}

fn enum_prop(description: &str, values: &[&str]) -> PropertyDef {
    PropertyDef {
        prop_type: "string".to_string(),
        description: Some(description.to_string()),
        enum_values: Some(values.iter().map(|v| v.to_string()).collect()),
    }
}

fn tool(
    name: &str,
    description: &str,
    properties: Vec<(&str, PropertyDef)>,
    required: &[&str],
) -> ToolDef {
    ToolDef {
        name: name.to_string(),
        description: description.to_string(),
        parameters: ToolParameters {
            param_type: "object".to_string(),
            properties: properties
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect(),
            required: required.iter().map(|r| r.to_string()).collect(),
        },
    }
}

fn document_id_prop() -> PropertyDef {
    prop("string", "The document ID, or a docs.google.com URL containing it.")
}

/// The full tool surface. Every tool takes a `document_id` plus its own
/// parameters; all positions are 1-based and ranges half-open.
pub fn docs_tool_catalog() -> Vec<ToolDef> {
    vec![
        tool(
            "read_document",
            "Reads the plain text content of a Google Doc, optionally from one tab, optionally truncated.",
            vec![
                ("document_id", document_id_prop()),
                ("tab_id", prop("string", "Read this tab instead of the first one.")),
                ("max_length", prop("integer", "Truncate the returned text to this many characters.")),
            ],
            &["document_id"],
        ),
        tool(
            "list_document_tabs",
            "Lists all tabs in a document with their hierarchy.",
            vec![
                ("document_id", document_id_prop()),
                ("include_content", prop("boolean", "Also report each tab's text length.")),
            ],
            &["document_id"],
        ),
        tool(
            "find_text_range",
            "Finds the Nth occurrence of a text string and returns its absolute index range.",
            vec![
                ("document_id", document_id_prop()),
                ("text_to_find", prop("string", "The exact (case-sensitive) text to locate.")),
                ("match_instance", prop("integer", "Which occurrence to find, 1-based. Default 1.")),
            ],
            &["document_id", "text_to_find"],
        ),
        tool(
            "get_paragraph_range",
            "Returns the index range of the paragraph containing the given index.",
            vec![
                ("document_id", document_id_prop()),
                ("index", prop("integer", "Any index inside the paragraph.")),
                ("tab_id", prop("string", "Look in this tab instead of the first one.")),
            ],
            &["document_id", "index"],
        ),
        tool(
            "append_text",
            "Appends text at the end of the document.",
            vec![
                ("document_id", document_id_prop()),
                ("text", prop("string", "The text to append.")),
                ("add_newline_if_needed", prop("boolean", "Start on a fresh line. Default true.")),
                ("tab_id", prop("string", "Append to this tab instead of the first one.")),
            ],
            &["document_id", "text"],
        ),
        tool(
            "insert_text",
            "Inserts text at a specific index.",
            vec![
                ("document_id", document_id_prop()),
                ("text", prop("string", "The text to insert.")),
                ("index", prop("integer", "Insertion position, 1-based.")),
            ],
            &["document_id", "text", "index"],
        ),
        tool(
            "delete_range",
            "Deletes the content in the half-open range [start_index, end_index).",
            vec![
                ("document_id", document_id_prop()),
                ("start_index", prop("integer", "Start of the range, inclusive.")),
                ("end_index", prop("integer", "End of the range, exclusive. Must be greater than start_index.")),
            ],
            &["document_id", "start_index", "end_index"],
        ),
        tool(
            "apply_text_style",
            "Applies character styling (bold, italic, colors, font, link) to a range or to the Nth occurrence of a text string.",
            vec![
                ("document_id", document_id_prop()),
                ("start_index", prop("integer", "Start of the target range.")),
                ("end_index", prop("integer", "End of the target range.")),
                ("text_to_find", prop("string", "Style this text instead of an explicit range.")),
                ("match_instance", prop("integer", "Which occurrence of text_to_find. Default 1.")),
                ("bold", prop("boolean", "Set or clear bold.")),
                ("italic", prop("boolean", "Set or clear italic.")),
                ("underline", prop("boolean", "Set or clear underline.")),
                ("strikethrough", prop("boolean", "Set or clear strikethrough.")),
                ("font_size", prop("number", "Font size in points.")),
                ("font_family", prop("string", "Font family name, e.g. 'Arial'.")),
                ("foreground_color", prop("string", "Text color as hex, e.g. '#FF0000'.")),
                ("background_color", prop("string", "Highlight color as hex.")),
                ("link_url", prop("string", "Turn the range into a link to this URL.")),
            ],
            &["document_id"],
        ),
        tool(
            "apply_paragraph_style",
            "Applies paragraph styling (alignment, indents, spacing, named style) to the paragraph containing a range, a text match, or an index.",
            vec![
                ("document_id", document_id_prop()),
                ("start_index", prop("integer", "Start of the target range.")),
                ("end_index", prop("integer", "End of the target range.")),
                ("text_to_find", prop("string", "Style the paragraph containing this text.")),
                ("match_instance", prop("integer", "Which occurrence of text_to_find. Default 1.")),
                ("index_within_paragraph", prop("integer", "Style the paragraph containing this index.")),
                ("alignment", enum_prop("Paragraph alignment.", &["START", "CENTER", "END", "JUSTIFIED"])),
                ("indent_start", prop("number", "Left indent in points.")),
                ("indent_end", prop("number", "Right indent in points.")),
                ("space_above", prop("number", "Space above the paragraph in points.")),
                ("space_below", prop("number", "Space below the paragraph in points.")),
                ("named_style_type", enum_prop(
                    "Named paragraph style.",
                    &["NORMAL_TEXT", "TITLE", "SUBTITLE", "HEADING_1", "HEADING_2", "HEADING_3", "HEADING_4", "HEADING_5", "HEADING_6"],
                )),
                ("keep_with_next", prop("boolean", "Keep this paragraph on the same page as the next.")),
            ],
            &["document_id"],
        ),
        tool(
            "insert_table",
            "Inserts an empty table.",
            vec![
                ("document_id", document_id_prop()),
                ("rows", prop("integer", "Number of rows, at least 1.")),
                ("columns", prop("integer", "Number of columns, at least 1.")),
                ("index", prop("integer", "Insertion position, 1-based.")),
            ],
            &["document_id", "rows", "columns", "index"],
        ),
        tool(
            "insert_page_break",
            "Inserts a page break.",
            vec![
                ("document_id", document_id_prop()),
                ("index", prop("integer", "Insertion position, 1-based.")),
            ],
            &["document_id", "index"],
        ),
        tool(
            "batch_update_document",
            "Executes up to 500 edit operations in order, batched into API calls of at most 50 requests. \
             Each operation is an object with a 'type' field (insert_text, delete_range, apply_text_style, \
             apply_paragraph_style, insert_table, insert_page_break, insert_image_from_url, create_bullet_list, \
             replace_all_text, insert_table_row, delete_table_row, insert_table_column, delete_table_column, \
             update_table_cell_style, merge_table_cells, unmerge_table_cells, create_named_range, \
             delete_named_range, insert_footnote, insert_table_of_contents, insert_horizontal_rule, \
             insert_section_break) plus that operation's parameters.",
            vec![
                ("document_id", document_id_prop()),
                ("operations", prop("array", "The ordered list of operation objects.")),
                ("default_tab_id", prop("string", "Tab applied to operations that do not name one.")),
            ],
            &["document_id", "operations"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_names_are_unique_and_schemas_well_formed() {
        let catalog = docs_tool_catalog();
        let mut names: Vec<&str> = catalog.iter().map(|t| t.name.as_str()).collect();
        names.sort_unstable();
        let before = names.len();
        names.dedup();
        assert_eq!(names.len(), before);

        for tool in &catalog {
            assert_eq!(tool.parameters.param_type, "object");
            assert!(tool.parameters.required.contains(&"document_id".to_string()));
            for required in &tool.parameters.required {
                assert!(
                    tool.parameters.properties.contains_key(required),
                    "{} requires undeclared property {required}",
                    tool.name
                );
            }
        }
    }

    #[test]
    fn property_serialization_uses_wire_names() {
        let rendered = serde_json::to_value(enum_prop("alignment", &["START", "CENTER"])).unwrap();
        assert_eq!(rendered["type"], "string");
        assert_eq!(rendered["enum"][0], "START");
        assert!(rendered.get("enum_values").is_none());
    }
}
