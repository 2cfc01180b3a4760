//! Input/Output utilities.

use anyhow::Context;
use clap::ValueEnum;
use csv::WriterBuilder;
use dialoguer::Editor;
use serde::Serialize;
use serde_json::Value;
use unicode_width::UnicodeWidthStr;

const DEFAULT_EDITOR: &str = "vim";
const CUT_MARKER: &str = "# ------------------------ >8 ------------------------";
const COLUMN_GAP: &str = "  ";

#[derive(Debug, PartialEq)]
pub struct InputMessage {
    pub title: String,
    pub body: String,
}

const MESSAGE_HELP: &str = "
# Do not modify or remove the line above.
# Everything below it will be ignored.

## Help

Enter a message above the cut marker (the line containing -- >8 --).
The first line of your message will be used as the title.
The remaining text will be used for the description.
Save and exit your editor to continue.
";

/// Opens `$EDITOR` (or vim) for the user to write a message. `initial` is
/// placed above the cut marker, e.g. an issue template or the current title
/// and description when editing. The first line becomes the title and the
/// rest the body.
pub fn prompt_with_text_editor(initial: &str) -> anyhow::Result<InputMessage> {
    let executable = std::env::var("EDITOR")
        .ok()
        .filter(|editor| !editor.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_EDITOR.to_string());
    let mut editor = Editor::new();

    editor.executable(&executable);

    let Some(file_content) = editor
        .edit(&compose_editor_text(initial))
        .with_context(|| format!("Failed opening text editor '{executable}' to enter message"))?
    else {
        anyhow::bail!("Aborting: No message provided (editor closed without saving)")
    };

    parse_editor_text(&file_content)
}

fn compose_editor_text(initial: &str) -> String {
    format!("{initial}\n\n{CUT_MARKER}{MESSAGE_HELP}")
}

fn parse_editor_text(file_content: &str) -> anyhow::Result<InputMessage> {
    let (title, body) = match file_content.rsplit_once(CUT_MARKER) {
        Some((content, _)) => match content.trim_start().split_once('\n') {
            Some((title, body)) => (title.trim(), body.trim()),
            None => (content.trim(), ""),
        },
        None => anyhow::bail!(
            "The cut marker '{CUT_MARKER}' was removed or modified. \
                 This marker is required to separate your message from the help text."
        ),
    };

    if title.is_empty() {
        anyhow::bail!("Aborting: The title is empty");
    }

    Ok(InputMessage {
        body: body.to_string(),
        title: title.to_string(),
    })
}

/// Output format.
#[derive(Clone, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    /// Columns aligned with spaces.
    #[default]
    Table,
    /// Tab-separated values format.
    Tsv,
    /// Comma-separated values format.
    Csv,
    /// JSON format.
    Json,
}

/// Format a collection of items using the specified output format. `fields`
/// selects and orders the serialized fields; empty means all of them.
pub fn format<T, F>(items: &[T], fields: &[F], format: &OutputFormat) -> anyhow::Result<String>
where
    T: Serialize,
    F: Serialize,
{
    match format {
        OutputFormat::Table => Ok(columnize(&to_records(items, fields)?)),
        OutputFormat::Tsv => format_delimited(items, fields, b'\t'),
        OutputFormat::Csv => format_delimited(items, fields, b','),
        OutputFormat::Json => format_json(items, fields),
    }
}

/// Aligns rows into space-padded columns. Trailing whitespace is dropped.
pub fn columnize(rows: &[Vec<String>]) -> String {
    let column_count = rows.iter().map(Vec::len).max().unwrap_or_default();
    let widths: Vec<usize> = (0..column_count)
        .map(|column| {
            rows.iter()
                .filter_map(|row| row.get(column))
                .map(|cell| cell.width())
                .max()
                .unwrap_or_default()
        })
        .collect();

    rows.iter()
        .map(|row| {
            let mut line = String::new();

            for (column, cell) in row.iter().enumerate() {
                if column > 0 {
                    line.push_str(COLUMN_GAP);
                }

                line.push_str(cell);
                line.push_str(&" ".repeat(widths[column].saturating_sub(cell.width())));
            }

            line.trim_end().to_string()
        })
        .collect::<Vec<String>>()
        .join("\n")
}

fn format_json<T, F>(items: &[T], fields: &[F]) -> anyhow::Result<String>
where
    T: Serialize,
    F: Serialize,
{
    let json_values: Vec<Value> = items
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<Value>, _>>()?;

    if fields.is_empty() {
        return Ok(serde_json::to_string_pretty(&json_values)?);
    }

    let field_names = get_field_names(fields);
    let filtered_items = json_values
        .into_iter()
        .map(|mut item| {
            if let Value::Object(ref mut map) = item {
                map.retain(|key, _| field_names.iter().any(|name| name == key));
            }

            item
        })
        .collect::<Vec<Value>>();

    Ok(serde_json::to_string_pretty(&filtered_items)?)
}

fn format_delimited<T, F>(items: &[T], fields: &[F], delimiter: u8) -> anyhow::Result<String>
where
    T: Serialize,
    F: Serialize,
{
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .from_writer(vec![]);

    for record in to_records(items, fields)? {
        writer.write_record(&record)?;
    }

    let bytes = writer.into_inner()?;
    let mut output = String::from_utf8(bytes)?;

    if output.ends_with('\n') {
        output.pop();
    }

    Ok(output)
}

fn to_records<T, F>(items: &[T], fields: &[F]) -> anyhow::Result<Vec<Vec<String>>>
where
    T: Serialize,
    F: Serialize,
{
    let field_names = get_field_names(fields);

    items
        .iter()
        .map(|item| {
            let json_value = serde_json::to_value(item)?;
            let record = match json_value {
                Value::Object(map) if field_names.is_empty() => {
                    map.values().map(stringify_json_value).collect()
                }
                Value::Object(map) => field_names
                    .iter()
                    .map(|field_name| map.get(field_name).map(stringify_json_value).unwrap_or_default())
                    .collect(),
                _ => vec![stringify_json_value(&json_value)],
            };

            Ok(record)
        })
        .collect()
}

fn stringify_json_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.replace(['\t', '\r', '\n'], " ").trim().to_string(),
        Value::Array(arr) => arr
            .iter()
            .map(stringify_json_value)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

fn get_field_names<T: Serialize>(fields: &[T]) -> Vec<String> {
    fields
        .iter()
        .filter_map(|f| match serde_json::to_value(f) {
            Ok(Value::String(s)) => Some(s),
            _ => None,
        })
        .collect::<Vec<String>>()
}

/// What to do with a web URL.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UrlAction {
    /// Open it in the default browser.
    Open,
    /// Print it to stdout.
    Print,
    /// Put it on the clipboard.
    Copy,
}

/// Opens, prints, or copies a URL.
pub fn deliver_url(url: &str, action: UrlAction) -> anyhow::Result<()> {
    tracing::debug!(url, ?action, "delivering url");

    match action {
        UrlAction::Open => {
            open::that(url).with_context(|| format!("Failed to open {url} in the browser"))?
        }
        UrlAction::Print => println!("{url}"),
        UrlAction::Copy => {
            arboard::Clipboard::new()
                .and_then(|mut clipboard| clipboard.set_text(url))
                .context("Failed to copy the URL to the clipboard")?;

            eprintln!("Copied {url} to the clipboard");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::*;

    #[derive(Serialize)]
    struct Row {
        id: u64,
        title: String,
        labels: Vec<String>,
    }

    #[derive(Serialize)]
    #[serde(rename_all = "lowercase")]
    enum Field {
        Id,
        Title,
        Labels,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row {
                id: 7,
                title: "Fix\tthe build".to_string(),
                labels: vec!["bug".to_string(), "ci".to_string()],
            },
            Row {
                id: 12,
                title: "Docs".to_string(),
                labels: vec![],
            },
        ]
    }

    #[test]
    fn test_columnize_aligns_columns() {
        let rows = vec![
            vec!["!1".to_string(), "short".to_string(), "x".to_string()],
            vec!["!100".to_string(), "a longer title".to_string(), "y".to_string()],
        ];

        assert_eq!(
            columnize(&rows),
            "!1    short           x\n!100  a longer title  y"
        );
    }

    #[test]
    fn test_columnize_counts_display_width() {
        let rows = vec![
            vec!["日本".to_string(), "a".to_string()],
            vec!["abcd".to_string(), "b".to_string()],
        ];

        assert_eq!(columnize(&rows), "日本  a\nabcd  b");
    }

    #[test]
    fn test_format_table_with_selected_fields() {
        let output = format(&rows(), &[Field::Id, Field::Title], &OutputFormat::Table).unwrap();

        assert_eq!(output, "7   Fix the build\n12  Docs");
    }

    #[test]
    fn test_format_tsv_joins_arrays() {
        let output = format(&rows(), &[Field::Id, Field::Labels], &OutputFormat::Tsv).unwrap();

        assert_eq!(output, "7\tbug,ci\n12\t");
    }

    #[test]
    fn test_format_json_filters_fields() {
        let output = format(&rows(), &[Field::Id], &OutputFormat::Json).unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value, serde_json::json!([{ "id": 7 }, { "id": 12 }]));
    }

    #[test]
    fn test_parse_editor_text_splits_title_and_body() {
        let text = format!("My title\n\nFirst paragraph.\n\nSecond.\n{CUT_MARKER}\nignored");

        assert_eq!(
            parse_editor_text(&text).unwrap(),
            InputMessage {
                title: "My title".to_string(),
                body: "First paragraph.\n\nSecond.".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_editor_text_title_only() {
        let message = parse_editor_text(&compose_editor_text("Only a title")).unwrap();

        assert_eq!(message.title, "Only a title");
        assert_eq!(message.body, "");
    }

    #[test]
    fn test_parse_editor_text_requires_marker_and_title() {
        assert!(parse_editor_text("title without marker").is_err());
        assert!(parse_editor_text(&compose_editor_text("")).is_err());
    }
}
