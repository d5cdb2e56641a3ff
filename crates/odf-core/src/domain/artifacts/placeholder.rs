//! Placeholder substitution for materialized template files.
//!
//! Templates embed three kinds of tokens:
//!
//! - the project sentinel [`PROJECT_SENTINEL`]
//! - hostnames of the form `hostname: project_name-<component>`
//! - published ports of the form `"<default port>:"`
//!
//! plus component-specific literals (`entity`, `table-name`, ...). A
//! [`Substitutions`] set applies them in a fixed order: hostnames, ports,
//! literals in insertion order, then the project sentinel so that the
//! hostname tokens are still intact when they are rewritten. Verbatim blocks
//! (generated source such as model fields) go in after everything else and
//! are never rewritten themselves.

use crate::domain::value_objects::{Component, Identifier, Port};

/// Stands for the project name in every template.
pub const PROJECT_SENTINEL: &str = "project_name";

const HOSTNAME_KEY: &str = "hostname: ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitutions {
    project: String,
    host: String,
    hostnames: Vec<Component>,
    ports: Vec<(Port, Port)>,
    literals: Vec<(String, String)>,
    verbatim: Vec<(String, String)>,
}

impl Substitutions {
    pub fn new(project: &Identifier) -> Self {
        Self {
            project: project.to_string(),
            host: project.hostname(),
            hostnames: Vec::new(),
            ports: Vec::new(),
            literals: Vec::new(),
            verbatim: Vec::new(),
        }
    }

    /// Rewrite `project_name-<component>` hostnames.
    #[must_use]
    pub fn hostname(mut self, component: Component) -> Self {
        self.hostnames.push(component);
        self
    }

    /// Rewrite the published port `default` to `allocated`.
    #[must_use]
    pub fn port(mut self, default: Port, allocated: Port) -> Self {
        if default != allocated {
            self.ports.push((default, allocated));
        }
        self
    }

    /// Plain text replacement, applied after hostnames and ports.
    #[must_use]
    pub fn literal(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.literals.push((from.into(), to.into()));
        self
    }

    /// Replace `token` with `block` once every other substitution has run.
    #[must_use]
    pub fn verbatim(mut self, token: impl Into<String>, block: impl Into<String>) -> Self {
        self.verbatim.push((token.into(), block.into()));
        self
    }

    /// Apply every substitution to free text.
    pub fn apply(&self, text: &str) -> String {
        let mut out = text.to_string();
        for component in &self.hostnames {
            out = out.replace(
                &format!("{HOSTNAME_KEY}{PROJECT_SENTINEL}-{component}"),
                &format!("{HOSTNAME_KEY}{}-{component}", self.host),
            );
        }
        self.apply_rest(out)
    }

    /// Apply every substitution to the value of a `hostname` key.
    pub fn apply_hostname(&self, value: &str) -> String {
        let mut out = value.to_string();
        for component in &self.hostnames {
            let sentinel = format!("{PROJECT_SENTINEL}-{component}");
            if out == sentinel {
                out = format!("{}-{component}", self.host);
            }
        }
        self.apply_rest(out)
    }

    fn apply_rest(&self, mut out: String) -> String {
        for (default, allocated) in &self.ports {
            out = out.replace(&format!("{default}:"), &format!("{allocated}:"));
        }
        for (from, to) in &self.literals {
            out = out.replace(from.as_str(), to);
        }
        out = out.replace(PROJECT_SENTINEL, &self.project);
        for (token, block) in &self.verbatim {
            out = out.replace(token.as_str(), block);
        }
        out
    }
}
