//! The nginx status page listing every published service.

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::value_objects::{Layer, Port};

const TBODY_OPEN: &str = "<tbody>";
const TBODY_CLOSE: &str = "</tbody>";

const BADGE_TOKEN: &str = r#"class="badge badge-info gap-2">layer_name"#;
const COMPONENT_TOKEN: &str = "component_name";
const URL_TOKEN: &str = "http://host:port/";

/// An HTML page split into header, row template and footer around its table
/// body. Rows are rendered from the template and emitted between the two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPage {
    header: String,
    row_template: String,
    rows: Vec<String>,
    footer: String,
}

impl StatusPage {
    /// `name` only labels errors.
    pub fn parse(name: &str, html: &str) -> DomainResult<Self> {
        let open = html.find(TBODY_OPEN).ok_or_else(|| missing(name, TBODY_OPEN))?;
        let body_start = open + TBODY_OPEN.len();
        let close = html[body_start..]
            .find(TBODY_CLOSE)
            .map(|offset| body_start + offset)
            .ok_or_else(|| missing(name, TBODY_CLOSE))?;

        Ok(Self {
            header: html[..body_start].to_string(),
            row_template: html[body_start..close].to_string(),
            rows: Vec::new(),
            footer: html[close..].to_string(),
        })
    }

    pub fn push_row(&mut self, badge: &str, layer: Layer, label: &str, port: Port) {
        let row = self
            .row_template
            .replace(BADGE_TOKEN, &format!(r#"class="{badge}">{layer}"#))
            .replace(COMPONENT_TOKEN, label)
            .replace(URL_TOKEN, &format!("http://localhost:{port}/"));
        self.rows.push(row);
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn render(&self) -> String {
        let mut out = self.header.clone();
        for row in &self.rows {
            out.push_str(row);
        }
        out.push_str(&self.footer);
        out
    }
}

fn missing(name: &str, tag: &str) -> DomainError {
    DomainError::MalformedTemplate {
        template: name.to_string(),
        reason: format!("missing `{tag}`"),
    }
}
