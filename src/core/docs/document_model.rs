// Typed model of the Google Docs API document tree.
//
// Only the parts of the response the resolvers and tools actually walk are
// modeled; everything else is dropped during deserialization. All indices are
// 1-based UTF-16 code unit offsets, exactly as the Docs API reports them.

use serde::Deserialize;

/// 1-based UTF-16 code unit offset into a document's text stream.
pub type Position = i64;

/// Half-open range of document positions: `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRange {
    pub start: Position,
    pub end: Position,
}

/// One contiguous run of literal text with known absolute indices.
#[derive(Debug, Clone)]
pub struct TextFragment {
    pub text: String,
    pub start: Position,
    pub end: Position,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub document_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tabs: Vec<Tab>,
    /// Legacy documents without a tabs structure carry their body here.
    pub body: Option<Body>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    #[serde(default)]
    pub tab_properties: TabProperties,
    pub document_tab: Option<DocumentTab>,
    #[serde(default)]
    pub child_tabs: Vec<Tab>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabProperties {
    #[serde(default)]
    pub tab_id: String,
    #[serde(default)]
    pub title: String,
    pub index: Option<i64>,
    pub parent_tab_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTab {
    pub body: Option<Body>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

/// One entry of a body (or table cell) `content` list. The API marks the
/// element's kind by which of the nested objects is present.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralElement {
    pub start_index: Option<Position>,
    pub end_index: Option<Position>,
    pub paragraph: Option<Paragraph>,
    pub table: Option<Table>,
    pub section_break: Option<serde_json::Value>,
    pub table_of_contents: Option<serde_json::Value>,
}

/// Closed view over the structural element union, so every tree walk is a
/// single exhaustive match instead of scattered key probing.
#[derive(Debug)]
pub enum ElementKind<'a> {
    Paragraph(&'a Paragraph),
    Table(&'a Table),
    SectionBreak,
    TableOfContents,
    Unknown,
}

impl StructuralElement {
    pub fn kind(&self) -> ElementKind<'_> {
        if let Some(paragraph) = &self.paragraph {
            ElementKind::Paragraph(paragraph)
        } else if let Some(table) = &self.table {
            ElementKind::Table(table)
        } else if self.section_break.is_some() {
            ElementKind::SectionBreak
        } else if self.table_of_contents.is_some() {
            ElementKind::TableOfContents
        } else {
            ElementKind::Unknown
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    #[serde(default)]
    pub elements: Vec<ParagraphElement>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphElement {
    pub start_index: Option<Position>,
    pub end_index: Option<Position>,
    pub text_run: Option<TextRun>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRun {
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    #[serde(default)]
    pub table_rows: Vec<TableRow>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    #[serde(default)]
    pub table_cells: Vec<TableCell>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCell {
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

/// Flattened description of one tab, with its nesting level.
#[derive(Debug, Clone)]
pub struct TabInfo {
    pub tab_id: String,
    pub title: String,
    pub index: Option<i64>,
    pub parent_tab_id: Option<String>,
    pub level: usize,
    pub text_length: Option<usize>,
}

/// Pick the body to operate on: the named tab if given, else the first tab,
/// else the legacy top-level body.
pub fn body_for_tab<'a>(document: &'a Document, tab_id: Option<&str>) -> Option<&'a Body> {
    if !document.tabs.is_empty() {
        if let Some(tab_id) = tab_id {
            if let Some(tab) = find_tab_by_id(&document.tabs, tab_id) {
                return tab.document_tab.as_ref().and_then(|t| t.body.as_ref());
            }
        }
        return document
            .tabs
            .first()
            .and_then(|tab| tab.document_tab.as_ref())
            .and_then(|t| t.body.as_ref());
    }
    document.body.as_ref()
}

/// Find a tab by ID, searching child tabs recursively.
pub fn find_tab_by_id<'a>(tabs: &'a [Tab], tab_id: &str) -> Option<&'a Tab> {
    for tab in tabs {
        if tab.tab_properties.tab_id == tab_id {
            return Some(tab);
        }
        if let Some(found) = find_tab_by_id(&tab.child_tabs, tab_id) {
            return Some(found);
        }
    }
    None
}

/// Flatten the tab tree into a list with hierarchy info.
pub fn all_tabs(document: &Document) -> Vec<TabInfo> {
    let mut tabs = Vec::new();
    for tab in &document.tabs {
        push_tab_and_children(tab, 0, &mut tabs);
    }
    tabs
}

fn push_tab_and_children(tab: &Tab, level: usize, out: &mut Vec<TabInfo>) {
    let text_length = tab
        .document_tab
        .as_ref()
        .and_then(|t| t.body.as_ref())
        .map(|body| extract_text(&body.content).len());

    out.push(TabInfo {
        tab_id: tab.tab_properties.tab_id.clone(),
        title: tab.tab_properties.title.clone(),
        index: tab.tab_properties.index,
        parent_tab_id: tab.tab_properties.parent_tab_id.clone(),
        level,
        text_length,
    });

    for child in &tab.child_tabs {
        push_tab_and_children(child, level + 1, out);
    }
}

/// Concatenate all text run contents in document order, recursing into
/// table cells.
pub fn extract_text(content: &[StructuralElement]) -> String {
    let mut text = String::new();
    extract_text_into(content, &mut text);
    text
}

fn extract_text_into(content: &[StructuralElement], out: &mut String) {
    for element in content {
        match element.kind() {
            ElementKind::Paragraph(paragraph) => {
                for pe in &paragraph.elements {
                    if let Some(run) = pe.text_run.as_ref().and_then(|r| r.content.as_deref()) {
                        out.push_str(run);
                    }
                }
            }
            ElementKind::Table(table) => {
                for row in &table.table_rows {
                    for cell in &row.table_cells {
                        extract_text_into(&cell.content, out);
                    }
                }
            }
            ElementKind::SectionBreak | ElementKind::TableOfContents | ElementKind::Unknown => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc_with_tabs() -> Document {
        serde_json::from_value(json!({
            "documentId": "doc1",
            "title": "Tabbed",
            "tabs": [
                {
                    "tabProperties": {"tabId": "t1", "title": "First"},
                    "documentTab": {"body": {"content": [
                        {"startIndex": 1, "endIndex": 7, "paragraph": {"elements": [
                            {"startIndex": 1, "endIndex": 7, "textRun": {"content": "first\n"}}
                        ]}}
                    ]}},
                    "childTabs": [
                        {
                            "tabProperties": {"tabId": "t1a", "title": "Nested", "parentTabId": "t1"},
                            "documentTab": {"body": {"content": []}}
                        }
                    ]
                },
                {
                    "tabProperties": {"tabId": "t2", "title": "Second"},
                    "documentTab": {"body": {"content": []}}
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn body_for_tab_prefers_named_tab() {
        let doc = doc_with_tabs();
        assert!(body_for_tab(&doc, Some("t2")).is_some());
        assert!(body_for_tab(&doc, Some("t1a")).is_some());
    }

    #[test]
    fn body_for_tab_defaults_to_first_tab() {
        let doc = doc_with_tabs();
        let body = body_for_tab(&doc, None).unwrap();
        assert_eq!(extract_text(&body.content), "first\n");
    }

    #[test]
    fn body_for_tab_falls_back_to_legacy_body() {
        let doc: Document = serde_json::from_value(json!({
            "documentId": "doc2",
            "body": {"content": [
                {"startIndex": 1, "endIndex": 6, "paragraph": {"elements": [
                    {"startIndex": 1, "endIndex": 6, "textRun": {"content": "body\n"}}
                ]}}
            ]}
        }))
        .unwrap();
        let body = body_for_tab(&doc, None).unwrap();
        assert_eq!(extract_text(&body.content), "body\n");
    }

    #[test]
    fn all_tabs_flattens_with_levels() {
        let doc = doc_with_tabs();
        let tabs = all_tabs(&doc);
        assert_eq!(tabs.len(), 3);
        assert_eq!(tabs[0].tab_id, "t1");
        assert_eq!(tabs[0].level, 0);
        assert_eq!(tabs[1].tab_id, "t1a");
        assert_eq!(tabs[1].level, 1);
        assert_eq!(tabs[2].tab_id, "t2");
        assert_eq!(tabs[0].text_length, Some(6));
    }

    #[test]
    fn element_kind_dispatch() {
        let element: StructuralElement = serde_json::from_value(json!({
            "startIndex": 1,
            "endIndex": 2,
            "sectionBreak": {}
        }))
        .unwrap();
        assert!(matches!(element.kind(), ElementKind::SectionBreak));
    }
}
