//! Human-readable CLI output.

use crate::reconcile::SyncStats;
use crate::store::Project;
use crate::tree::{Entry, Forest};
use crate::types::EntryId;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn format_timestamp(millis: i64) -> String {
    chrono::DateTime::<chrono::Utc>::from_timestamp_millis(millis)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn format_project_table(projects: &[Project]) -> String {
    if projects.is_empty() {
        return "No projects.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["ID", "Name", "Created", "Updated"]);
    for project in projects {
        table.add_row(vec![
            project.id.to_string(),
            project.name.clone(),
            format_timestamp(project.created_at),
            format_timestamp(project.updated_at),
        ]);
    }
    table.to_string()
}

/// Indented tree with box-drawing guides; folders are colored
pub fn format_tree(forest: &Forest, active: Option<&EntryId>) -> String {
    let mut out = String::new();
    write_level(forest, forest.roots(), "", active, &mut out);
    if out.is_empty() {
        out.push_str("(empty)\n");
    }
    out
}

fn write_level(forest: &Forest, ids: &[EntryId], prefix: &str, active: Option<&EntryId>, out: &mut String) {
    for (i, id) in ids.iter().enumerate() {
        let Some(entry) = forest.get(id) else {
            continue;
        };
        let last = i + 1 == ids.len();
        let branch = if last { "└── " } else { "├── " };
        out.push_str(prefix);
        out.push_str(branch);
        out.push_str(&label(entry, active == Some(id)));
        out.push('\n');

        if entry.is_folder() {
            let next = format!("{}{}", prefix, if last { "    " } else { "│   " });
            write_level(forest, entry.children(), &next, active, out);
        }
    }
}

fn label(entry: &Entry, active: bool) -> String {
    if entry.is_folder() {
        format!("{}/", entry.name.blue().bold())
    } else if active {
        format!("{} {}", entry.name.green(), "*".dimmed())
    } else {
        entry.name.clone()
    }
}

pub fn format_sync_stats(stats: &SyncStats) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Inserted", "Updated", "Removed", "Unchanged"]);
    table.add_row(vec![
        stats.inserted.to_string(),
        stats.updated.to_string(),
        stats.removed.to_string(),
        stats.unchanged.to_string(),
    ]);
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template;

    #[test]
    fn test_format_tree_lists_every_entry() {
        let forest = template::default_forest();
        let text = format_tree(&forest, None);
        for entry in forest.iter() {
            assert!(text.contains(&entry.name), "missing {}", entry.name);
        }
        assert_eq!(text.lines().count(), forest.len());
        assert!(text.lines().last().unwrap().starts_with("└── "));
    }

    #[test]
    fn test_format_tree_empty() {
        assert_eq!(format_tree(&Forest::new(), None), "(empty)\n");
    }

    #[test]
    fn test_format_project_table_empty() {
        assert_eq!(format_project_table(&[]), "No projects.");
    }
}
