//! CLI display utilities for formatting output

use crate::plugin::types::{BundleInfo, PluginSummary};
use prettytable::{format, Cell, Row, Table};

fn header(titles: &[&str], use_color: bool) -> Row {
    Row::new(
        titles
            .iter()
            .map(|title| {
                let cell = Cell::new(title);
                if use_color {
                    cell.style_spec("bFc")
                } else {
                    cell
                }
            })
            .collect(),
    )
}

fn table_with_titles(titles: &[&str], use_color: bool) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_CLEAN);
    table.set_titles(header(titles, use_color));
    table
}

/// One row per loaded bundle
pub fn bundle_table(bundles: &[BundleInfo], plugins: &[PluginSummary], use_color: bool) -> Table {
    let mut table = table_with_titles(&["Bundle", "Version", "Plugins", "Location"], use_color);
    for bundle in bundles {
        let count = plugins
            .iter()
            .filter(|p| p.bundle.as_deref() == Some(bundle.name.as_str()))
            .count();
        table.add_row(Row::new(vec![
            Cell::new(&bundle.name),
            Cell::new(bundle.version.as_deref().unwrap_or("-")),
            Cell::new(&count.to_string()),
            Cell::new(&bundle.location),
        ]));
    }
    table
}

/// One row per registered plugin
pub fn plugin_table(plugins: &[PluginSummary], use_color: bool) -> Table {
    let mut table = table_with_titles(&["Plugin", "Id", "Bundle", "Origin"], use_color);
    for plugin in plugins {
        table.add_row(Row::new(vec![
            Cell::new(&plugin.name),
            Cell::new(&plugin.id.to_string()),
            Cell::new(plugin.bundle.as_deref().unwrap_or("-")),
            Cell::new(&plugin.origin),
        ]));
    }
    table
}

fn print_table(table: &Table, use_color: bool) {
    if use_color {
        table.printstd();
    } else {
        print!("{}", table);
    }
}

/// Print the `list` output
pub fn display_listing(bundles: &[BundleInfo], plugins: &[PluginSummary], use_color: bool) {
    if bundles.is_empty() {
        eprintln!("No bundles loaded.");
    } else {
        print_table(&bundle_table(bundles, plugins, use_color), use_color);
    }

    if plugins.is_empty() {
        eprintln!("No plugins registered.");
    } else {
        println!();
        print_table(&plugin_table(plugins, use_color), use_color);
    }
}
