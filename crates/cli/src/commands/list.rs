//! list - Show every object under the images/ namespace

use comfy_table::presets::NOTHING;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use r2img_core::{ObjectInfo, ObjectStore, list_all, root_prefix};
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Output structure for list (JSON format)
#[derive(Debug, Serialize)]
struct ListOutput {
    prefix: String,
    items: Vec<ObjectInfo>,
    total_objects: usize,
    total_size_bytes: i64,
    total_size_human: String,
}

/// Execute the list action
pub async fn execute<S>(store: &S, formatter: &Formatter) -> ExitCode
where
    S: ObjectStore + ?Sized,
{
    let prefix = root_prefix();

    let items = match list_all(store, &prefix).await {
        Ok(items) => items,
        Err(e) => {
            formatter.error(&format!("Failed to list objects: {e}"));
            return ExitCode::from(&e);
        }
    };

    let total_size: i64 = items.iter().map(|i| i.size_bytes).sum();
    let total_size_human = humansize::format_size(total_size.max(0) as u64, humansize::BINARY);

    if formatter.is_json() {
        formatter.json(&ListOutput {
            prefix,
            total_objects: items.len(),
            total_size_bytes: total_size,
            total_size_human,
            items,
        });
        return ExitCode::Success;
    }

    if !items.is_empty() {
        formatter.println(&render_table(&items).to_string());
    }
    formatter.println(&format!(
        "Total: {} object(s) under {prefix}, {total_size_human}",
        items.len()
    ));

    ExitCode::Success
}

fn render_table(items: &[ObjectInfo]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .set_content_arrangement(ContentArrangement::Disabled)
        .set_header(vec!["KEY", "SIZE", "LAST MODIFIED"]);

    for item in items {
        table.add_row(vec![
            Cell::new(&item.key),
            Cell::new(&item.size_human).set_alignment(CellAlignment::Right),
            Cell::new(format_modified(item)),
        ]);
    }

    table
}

fn format_modified(item: &ObjectInfo) -> String {
    item.last_modified
        .map(|ts| ts.strftime("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_contains_rows() {
        let mut a = ObjectInfo::new("images/a.jpg", 2048);
        a.last_modified = Some("2026-02-01T10:30:00Z".parse().unwrap());
        let b = ObjectInfo::new("images/blog/b.png", 10);

        let rendered = render_table(&[a, b]).to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("KEY"));
        assert!(lines[1].contains("images/a.jpg"));
        assert!(lines[1].contains("2 KiB"));
        assert!(lines[1].contains("2026-02-01 10:30:00"));
        assert!(lines[2].contains("images/blog/b.png"));
        assert!(lines[2].trim_end().ends_with('-'));
    }
}
