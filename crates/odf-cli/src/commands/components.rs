//! Implementation of the `odf components` command.

use serde::Serialize;

use odf_core::domain::{Catalog, ComponentDef, Layer};

use crate::{
    cli::{ComponentsArgs, ListFormat, OutputFormat},
    error::{CliError, CliResult},
    output::OutputManager,
};

/// One catalog entry, flattened for display.
#[derive(Debug, Serialize)]
struct Row {
    layer: String,
    component: String,
    port: Option<u16>,
    depends_on: Vec<String>,
    description: &'static str,
}

impl From<&ComponentDef> for Row {
    fn from(def: &ComponentDef) -> Self {
        Self {
            layer: def.layer.to_string(),
            component: def.component.to_string(),
            port: def.default_port,
            depends_on: def
                .dependencies
                .iter()
                .flat_map(|dep| {
                    dep.components
                        .iter()
                        .map(move |component| format!("{}/{component}", dep.layer))
                })
                .collect(),
            description: def.description,
        }
    }
}

pub fn execute(args: ComponentsArgs, output: OutputManager) -> CliResult<()> {
    let catalog = Catalog::builtin();
    let layer = args.layer.map(Layer::from);
    let rows: Vec<Row> = catalog
        .components()
        .filter(|def| layer.is_none_or(|layer| def.layer == layer))
        .map(Row::from)
        .collect();

    let format = args.format.unwrap_or(match output.format() {
        OutputFormat::Json => ListFormat::Json,
        _ => ListFormat::Table,
    });

    match format {
        ListFormat::Table => {
            output.header("Available Components:")?;
            for row in &rows {
                let port = row.port.map(|p| p.to_string()).unwrap_or_default();
                output.print(&format!(
                    "  {:<14} {:<13} {:>5}  {}",
                    row.layer, row.component, port, row.description
                ))?;
                if !row.depends_on.is_empty() {
                    output.print(&format!("  {:<34} requires {}", "", row.depends_on.join(", ")))?;
                }
            }
        }

        ListFormat::Json => {
            let json = serde_json::to_string_pretty(&rows).map_err(|e| CliError::InvalidInput {
                message: "failed to serialise the catalog".into(),
                source: Some(Box::new(e)),
            })?;
            output.data(&json)?;
        }

        ListFormat::List => {
            for row in &rows {
                output.data(&format!("{}/{}", row.layer, row.component))?;
            }
        }

        ListFormat::Csv => {
            output.data("layer,component,port,depends_on,description")?;
            for row in &rows {
                output.data(&csv_line(row))?;
            }
        }
    }

    Ok(())
}

fn csv_line(row: &Row) -> String {
    [
        row.layer.clone(),
        row.component.clone(),
        row.port.map(|p| p.to_string()).unwrap_or_default(),
        row.depends_on.join(" "),
        row.description.to_string(),
    ]
    .iter()
    .map(|cell| quote(cell))
    .collect::<Vec<_>>()
    .join(",")
}

/// RFC 4180 quoting, only where needed.
fn quote(cell: &str) -> String {
    if cell.contains([',', '"', '\n']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
