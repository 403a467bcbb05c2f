// Builders for Docs API `batchUpdate` style requests. Each builder turns a
// bag of optional style fields into a single request JSON value plus the
// matching comma-joined field mask, or nothing when no field is set.

use serde::Deserialize;
use serde_json::{json, Value};

use super::document_model::Position;
use super::DocsError;

/// RGB components in the 0.0 to 1.0 range, as the Docs API expects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RgbColor {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

/// Parse `#RRGGBB` or `#RGB` (leading `#` optional) into API color
/// components. Returns `None` for anything else.
pub fn hex_to_rgb(hex: &str) -> Option<RgbColor> {
    let hex = hex.trim_start_matches('#');

    let expanded;
    let hex = if hex.len() == 3 {
        expanded = hex
            .chars()
            .flat_map(|c| [c, c])
            .collect::<String>();
        expanded.as_str()
    } else {
        hex
    };

    if hex.len() != 6 {
        return None;
    }
    let value = u32::from_str_radix(hex, 16).ok()?;

    Some(RgbColor {
        red: ((value >> 16) & 0xFF) as f64 / 255.0,
        green: ((value >> 8) & 0xFF) as f64 / 255.0,
        blue: (value & 0xFF) as f64 / 255.0,
    })
}

fn rgb_json(color: RgbColor) -> Value {
    json!({"red": color.red, "green": color.green, "blue": color.blue})
}

fn pt(magnitude: f64) -> Value {
    json!({"magnitude": magnitude, "unit": "PT"})
}

/// A built style request with the field names it updates, so callers can
/// report what actually changed.
#[derive(Debug, Clone)]
pub struct StyleRequest {
    pub request: Value,
    pub fields: Vec<&'static str>,
}

/// Character-level style options. All fields optional; unset fields are left
/// untouched in the document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextStyleOptions {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub strikethrough: Option<bool>,
    pub font_size: Option<f64>,
    pub font_family: Option<String>,
    pub foreground_color: Option<String>,
    pub background_color: Option<String>,
    pub link_url: Option<String>,
}

/// Paragraph-level style options.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParagraphStyleOptions {
    pub alignment: Option<String>,
    pub indent_start: Option<f64>,
    pub indent_end: Option<f64>,
    pub space_above: Option<f64>,
    pub space_below: Option<f64>,
    pub named_style_type: Option<String>,
    pub keep_with_next: Option<bool>,
}

/// Table cell style options. A border side needs both its color and width to
/// be emitted; a partial border side is dropped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableCellStyleOptions {
    pub background_color: Option<String>,
    pub padding_top: Option<f64>,
    pub padding_bottom: Option<f64>,
    pub padding_left: Option<f64>,
    pub padding_right: Option<f64>,
    pub border_top_color: Option<String>,
    pub border_top_width: Option<f64>,
    pub border_bottom_color: Option<String>,
    pub border_bottom_width: Option<f64>,
    pub border_left_color: Option<String>,
    pub border_left_width: Option<f64>,
    pub border_right_color: Option<String>,
    pub border_right_width: Option<f64>,
}

impl TableCellStyleOptions {
    fn border_sides(&self) -> [(&'static str, &Option<String>, &Option<f64>); 4] {
        [
            ("borderTop", &self.border_top_color, &self.border_top_width),
            (
                "borderBottom",
                &self.border_bottom_color,
                &self.border_bottom_width,
            ),
            ("borderLeft", &self.border_left_color, &self.border_left_width),
            (
                "borderRight",
                &self.border_right_color,
                &self.border_right_width,
            ),
        ]
    }
}

/// Build an `updateTextStyle` request for `[start, end)`.
///
/// Returns `Ok(None)` when no option is set. Invalid hex colors are input
/// errors, not silent drops.
pub fn build_update_text_style_request(
    start: Position,
    end: Position,
    style: &TextStyleOptions,
) -> Result<Option<StyleRequest>, DocsError> {
    let mut text_style = serde_json::Map::new();
    let mut fields: Vec<&'static str> = Vec::new();

    if let Some(bold) = style.bold {
        text_style.insert("bold".into(), json!(bold));
        fields.push("bold");
    }
    if let Some(italic) = style.italic {
        text_style.insert("italic".into(), json!(italic));
        fields.push("italic");
    }
    if let Some(underline) = style.underline {
        text_style.insert("underline".into(), json!(underline));
        fields.push("underline");
    }
    if let Some(strikethrough) = style.strikethrough {
        text_style.insert("strikethrough".into(), json!(strikethrough));
        fields.push("strikethrough");
    }
    if let Some(size) = style.font_size {
        text_style.insert("fontSize".into(), pt(size));
        fields.push("fontSize");
    }
    if let Some(family) = &style.font_family {
        text_style.insert("weightedFontFamily".into(), json!({"fontFamily": family}));
        fields.push("weightedFontFamily");
    }
    if let Some(hex) = &style.foreground_color {
        let color = hex_to_rgb(hex).ok_or_else(|| {
            DocsError::InvalidInput(format!("Invalid foreground hex color format: {hex}"))
        })?;
        text_style.insert(
            "foregroundColor".into(),
            json!({"color": {"rgbColor": rgb_json(color)}}),
        );
        fields.push("foregroundColor");
    }
    if let Some(hex) = &style.background_color {
        let color = hex_to_rgb(hex).ok_or_else(|| {
            DocsError::InvalidInput(format!("Invalid background hex color format: {hex}"))
        })?;
        text_style.insert(
            "backgroundColor".into(),
            json!({"color": {"rgbColor": rgb_json(color)}}),
        );
        fields.push("backgroundColor");
    }
    if let Some(url) = &style.link_url {
        text_style.insert("link".into(), json!({"url": url}));
        fields.push("link");
    }

    if fields.is_empty() {
        return Ok(None);
    }

    let request = json!({
        "updateTextStyle": {
            "range": {"startIndex": start, "endIndex": end},
            "textStyle": Value::Object(text_style),
            "fields": fields.join(","),
        }
    });

    Ok(Some(StyleRequest { request, fields }))
}

/// Build an `updateParagraphStyle` request for `[start, end)`.
pub fn build_update_paragraph_style_request(
    start: Position,
    end: Position,
    style: &ParagraphStyleOptions,
) -> Result<Option<StyleRequest>, DocsError> {
    let mut paragraph_style = serde_json::Map::new();
    let mut fields: Vec<&'static str> = Vec::new();

    if let Some(alignment) = &style.alignment {
        paragraph_style.insert("alignment".into(), json!(alignment));
        fields.push("alignment");
    }
    if let Some(indent) = style.indent_start {
        paragraph_style.insert("indentStart".into(), pt(indent));
        fields.push("indentStart");
    }
    if let Some(indent) = style.indent_end {
        paragraph_style.insert("indentEnd".into(), pt(indent));
        fields.push("indentEnd");
    }
    if let Some(space) = style.space_above {
        paragraph_style.insert("spaceAbove".into(), pt(space));
        fields.push("spaceAbove");
    }
    if let Some(space) = style.space_below {
        paragraph_style.insert("spaceBelow".into(), pt(space));
        fields.push("spaceBelow");
    }
    if let Some(named) = &style.named_style_type {
        paragraph_style.insert("namedStyleType".into(), json!(named));
        fields.push("namedStyleType");
    }
    if let Some(keep) = style.keep_with_next {
        paragraph_style.insert("keepWithNext".into(), json!(keep));
        fields.push("keepWithNext");
    }

    if fields.is_empty() {
        return Ok(None);
    }

    let request = json!({
        "updateParagraphStyle": {
            "range": {"startIndex": start, "endIndex": end},
            "paragraphStyle": Value::Object(paragraph_style),
            "fields": fields.join(","),
        }
    });

    Ok(Some(StyleRequest { request, fields }))
}

/// Build an `updateTableCellStyle` request targeting a single cell.
pub fn build_update_table_cell_style_request(
    table_start_index: Position,
    row_index: i64,
    column_index: i64,
    style: &TableCellStyleOptions,
) -> Result<Option<Value>, DocsError> {
    let mut cell_style = serde_json::Map::new();
    let mut fields: Vec<&'static str> = Vec::new();

    if let Some(hex) = &style.background_color {
        let color = hex_to_rgb(hex).ok_or_else(|| {
            DocsError::InvalidInput(format!("Invalid background hex color format: {hex}"))
        })?;
        cell_style.insert(
            "backgroundColor".into(),
            json!({"color": {"rgbColor": rgb_json(color)}}),
        );
        fields.push("backgroundColor");
    }

    let padding = [
        ("paddingTop", style.padding_top),
        ("paddingBottom", style.padding_bottom),
        ("paddingLeft", style.padding_left),
        ("paddingRight", style.padding_right),
    ];
    for (field, value) in padding {
        if let Some(magnitude) = value {
            cell_style.insert(field.into(), pt(magnitude));
            fields.push(field);
        }
    }

    for (field, color, width) in style.border_sides() {
        let (Some(hex), Some(width)) = (color, width) else {
            continue;
        };
        let color = hex_to_rgb(hex).ok_or_else(|| {
            DocsError::InvalidInput(format!("Invalid {field} hex color format: {hex}"))
        })?;
        cell_style.insert(
            field.into(),
            json!({
                "color": {"color": {"rgbColor": rgb_json(color)}},
                "width": pt(*width),
                "dashStyle": "SOLID",
            }),
        );
        fields.push(field);
    }

    if fields.is_empty() {
        return Ok(None);
    }

    Ok(Some(json!({
        "updateTableCellStyle": {
            "tableRange": {
                "tableCellLocation": {
                    "tableStartLocation": {"index": table_start_index},
                    "rowIndex": row_index,
                    "columnIndex": column_index,
                },
                "rowSpan": 1,
                "columnSpan": 1,
            },
            "tableCellStyle": Value::Object(cell_style),
            "fields": fields.join(","),
        }
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parsing() {
        assert_eq!(
            hex_to_rgb("#FF0000"),
            Some(RgbColor {
                red: 1.0,
                green: 0.0,
                blue: 0.0
            })
        );
        assert_eq!(
            hex_to_rgb("F00"),
            Some(RgbColor {
                red: 1.0,
                green: 0.0,
                blue: 0.0
            })
        );
        assert_eq!(
            hex_to_rgb("#ffffff"),
            Some(RgbColor {
                red: 1.0,
                green: 1.0,
                blue: 1.0
            })
        );
        assert!(hex_to_rgb("nope").is_none());
        assert!(hex_to_rgb("#12345").is_none());
        assert!(hex_to_rgb("").is_none());
    }

    #[test]
    fn text_style_request_with_fields() {
        let style = TextStyleOptions {
            bold: Some(true),
            font_size: Some(12.0),
            foreground_color: Some("#FF0000".to_string()),
            ..Default::default()
        };

        let built = build_update_text_style_request(5, 10, &style)
            .unwrap()
            .unwrap();
        let update = &built.request["updateTextStyle"];

        assert_eq!(update["range"]["startIndex"], 5);
        assert_eq!(update["range"]["endIndex"], 10);
        assert_eq!(update["textStyle"]["bold"], true);
        assert_eq!(update["textStyle"]["fontSize"]["magnitude"], 12.0);
        assert_eq!(update["textStyle"]["fontSize"]["unit"], "PT");
        assert_eq!(
            update["textStyle"]["foregroundColor"]["color"]["rgbColor"]["red"],
            1.0
        );
        assert_eq!(update["fields"], "bold,fontSize,foregroundColor");
        assert_eq!(built.fields, vec!["bold", "fontSize", "foregroundColor"]);
    }

    #[test]
    fn text_style_without_options_builds_nothing() {
        let built = build_update_text_style_request(1, 2, &TextStyleOptions::default()).unwrap();
        assert!(built.is_none());
    }

    #[test]
    fn text_style_rejects_bad_color() {
        let style = TextStyleOptions {
            foreground_color: Some("red".to_string()),
            ..Default::default()
        };
        let err = build_update_text_style_request(1, 2, &style).unwrap_err();
        assert!(matches!(err, DocsError::InvalidInput(_)));
    }

    #[test]
    fn text_style_link_and_font_family() {
        let style = TextStyleOptions {
            font_family: Some("Courier New".to_string()),
            link_url: Some("https://example.com".to_string()),
            ..Default::default()
        };

        let built = build_update_text_style_request(1, 5, &style)
            .unwrap()
            .unwrap();
        let text_style = &built.request["updateTextStyle"]["textStyle"];
        assert_eq!(
            text_style["weightedFontFamily"]["fontFamily"],
            "Courier New"
        );
        assert_eq!(text_style["link"]["url"], "https://example.com");
    }

    #[test]
    fn paragraph_style_request_with_fields() {
        let style = ParagraphStyleOptions {
            alignment: Some("CENTER".to_string()),
            space_above: Some(6.0),
            named_style_type: Some("HEADING_1".to_string()),
            ..Default::default()
        };

        let built = build_update_paragraph_style_request(1, 20, &style)
            .unwrap()
            .unwrap();
        let update = &built.request["updateParagraphStyle"];

        assert_eq!(update["paragraphStyle"]["alignment"], "CENTER");
        assert_eq!(update["paragraphStyle"]["spaceAbove"]["magnitude"], 6.0);
        assert_eq!(update["paragraphStyle"]["namedStyleType"], "HEADING_1");
        assert_eq!(update["fields"], "alignment,spaceAbove,namedStyleType");
    }

    #[test]
    fn paragraph_style_without_options_builds_nothing() {
        let built =
            build_update_paragraph_style_request(1, 2, &ParagraphStyleOptions::default()).unwrap();
        assert!(built.is_none());
    }

    #[test]
    fn cell_style_background_and_padding() {
        let style = TableCellStyleOptions {
            background_color: Some("#FF0000".to_string()),
            padding_top: Some(10.0),
            padding_bottom: Some(10.0),
            ..Default::default()
        };

        let request = build_update_table_cell_style_request(100, 1, 2, &style)
            .unwrap()
            .unwrap();
        let update = &request["updateTableCellStyle"];

        let location = &update["tableRange"]["tableCellLocation"];
        assert_eq!(location["tableStartLocation"]["index"], 100);
        assert_eq!(location["rowIndex"], 1);
        assert_eq!(location["columnIndex"], 2);
        assert_eq!(update["tableRange"]["rowSpan"], 1);
        assert_eq!(update["tableRange"]["columnSpan"], 1);

        let cell_style = &update["tableCellStyle"];
        assert_eq!(
            cell_style["backgroundColor"]["color"]["rgbColor"]["red"],
            1.0
        );
        assert_eq!(cell_style["paddingTop"]["magnitude"], 10.0);
        assert_eq!(
            update["fields"],
            "backgroundColor,paddingTop,paddingBottom"
        );
    }

    #[test]
    fn cell_style_borders_need_color_and_width() {
        let style = TableCellStyleOptions {
            border_top_color: Some("#000000".to_string()),
            border_top_width: Some(2.0),
            // Width without a color; dropped.
            border_bottom_width: Some(1.0),
            ..Default::default()
        };

        let request = build_update_table_cell_style_request(100, 0, 0, &style)
            .unwrap()
            .unwrap();
        let cell_style = &request["updateTableCellStyle"]["tableCellStyle"];

        assert_eq!(cell_style["borderTop"]["width"]["magnitude"], 2.0);
        assert_eq!(cell_style["borderTop"]["dashStyle"], "SOLID");
        assert!(cell_style.get("borderBottom").is_none());
    }

    #[test]
    fn cell_style_without_options_builds_nothing() {
        let built =
            build_update_table_cell_style_request(100, 0, 0, &TableCellStyleOptions::default())
                .unwrap();
        assert!(built.is_none());
    }
}
