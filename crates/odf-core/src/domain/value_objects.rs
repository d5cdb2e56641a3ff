//! Domain value objects: Layer, Component, Layout, Profile, Role, Port, Identifier.
//!
//! # Design
//!
//! These are pure value types: equality-by-value, no identity. They hold NO
//! catalog knowledge. Which component lives in which layer, default ports and
//! dependencies all live in `catalog.rs`. This file's only job is to define
//! the types, their string representations, and their `FromStr` parsers.
//!
//! # Adding New Variants
//!
//! 1. Add the enum variant here
//! 2. Add the `as_str` arm here
//! 3. Add a `ComponentDef` (or `LayerDef`) entry in `catalog.rs`

use crate::domain::error::DomainError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// ── Layer ────────────────────────────────────────────────────────────────────

/// A functional category of deployable components.
///
/// Variant order is catalog order; `Ord` is derived so that ordered maps keyed
/// by `Layer` iterate in the order the composition engine processes layers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Analytics,
    Api,
    Devcontainers,
    Storage,
    Utility,
}

impl Layer {
    pub const ALL: [Layer; 5] = [
        Self::Analytics,
        Self::Api,
        Self::Devcontainers,
        Self::Storage,
        Self::Utility,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Analytics => "analytics",
            Self::Api => "api",
            Self::Devcontainers => "devcontainers",
            Self::Storage => "storage",
            Self::Utility => "utility",
        }
    }

    /// API components get one instance (and one port) per entity; everything
    /// else is a project-wide singleton.
    pub const fn is_per_entity(self) -> bool {
        matches!(self, Self::Api)
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Layer {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|layer| layer.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DomainError::UnknownLayer {
                layer: wanted.to_string(),
            })
    }
}

// ── Component ────────────────────────────────────────────────────────────────

/// A concrete deployable unit.
///
/// Variant order follows the catalog (layer by layer).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Component {
    #[serde(rename = "superset")]
    Superset,
    #[serde(rename = "api-postgres")]
    ApiPostgres,
    #[serde(rename = "python")]
    Python,
    #[serde(rename = "R")]
    R,
    #[serde(rename = "postgres")]
    Postgres,
    #[serde(rename = "nginx")]
    Nginx,
    #[serde(rename = "texlive")]
    Texlive,
}

impl Component {
    pub const ALL: [Component; 7] = [
        Self::Superset,
        Self::ApiPostgres,
        Self::Python,
        Self::R,
        Self::Postgres,
        Self::Nginx,
        Self::Texlive,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Superset => "superset",
            Self::ApiPostgres => "api-postgres",
            Self::Python => "python",
            Self::R => "R",
            Self::Postgres => "postgres",
            Self::Nginx => "nginx",
            Self::Texlive => "texlive",
        }
    }

    /// Parse a component name without knowing its layer.
    ///
    /// The error names an unknown layer placeholder; use
    /// [`Catalog::resolve`](crate::domain::Catalog::resolve) when the layer is
    /// known so the error carries it.
    pub fn parse_in(layer: &str, s: &str) -> Result<Self, DomainError> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DomainError::UnknownComponent {
                layer: layer.to_string(),
                component: wanted.to_string(),
            })
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Component {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_in("*", s)
    }
}

// ── Layout ───────────────────────────────────────────────────────────────────

/// Directory/content preset applied when the platform is created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// No extra scaffolding.
    #[default]
    Custom,
    /// Fixed academic folder layout.
    Research,
}

impl Layout {
    pub const ALL: [Layout; 2] = [Self::Custom, Self::Research];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Custom => "custom",
            Self::Research => "research",
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Layout {
    type Err = DomainError;

    /// Case and surrounding whitespace are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|layout| layout.as_str() == value)
            .ok_or_else(|| DomainError::InvalidLayout {
                value,
                valid: join_names(Self::ALL.iter().map(Self::as_str)),
            })
    }
}

// ── Profile ──────────────────────────────────────────────────────────────────

/// Pre-scripted bulk registration preset used by `odf init`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    #[default]
    Custom,
    Research,
}

impl Profile {
    pub const ALL: [Profile; 2] = [Self::Custom, Self::Research];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Custom => "custom",
            Self::Research => "research",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Profile {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|profile| profile.as_str() == value)
            .ok_or_else(|| DomainError::InvalidProfile {
                value,
                valid: join_names(Self::ALL.iter().map(Self::as_str)),
            })
    }
}

// ── Role ─────────────────────────────────────────────────────────────────────

/// Logical role of a template fragment; each role has exactly one file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    Build,
    Setup,
    Start,
    Stop,
    Dependencies,
    Deployment,
}

impl Role {
    /// Roles merged as line-oriented text, in processing order.
    pub const SCRIPTED: [Role; 5] = [
        Self::Build,
        Self::Setup,
        Self::Start,
        Self::Stop,
        Self::Dependencies,
    ];

    pub const fn file_name(&self) -> &'static str {
        match self {
            Self::Build => "build.sh",
            Self::Setup => "setup.sh",
            Self::Start => "start.sh",
            Self::Stop => "stop.sh",
            Self::Dependencies => "requirements.txt",
            Self::Deployment => "docker-compose.yaml",
        }
    }

    /// Shell scripts carry a shebang header and must be executable.
    pub const fn is_shell_script(&self) -> bool {
        matches!(self, Self::Build | Self::Setup | Self::Start | Self::Stop)
    }

    pub fn from_file_name(name: &str) -> Option<Self> {
        [Self::Deployment]
            .into_iter()
            .chain(Self::SCRIPTED)
            .find(|role| role.file_name() == name)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

// ── Port ─────────────────────────────────────────────────────────────────────

/// A TCP port. Persisted as a string (`"5432"`) in the settings document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Port(u16);

impl Port {
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u16 {
        self.0
    }

    /// The next port, or `None` at the top of the range.
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Port {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u16>()
            .map(Self)
            .map_err(|e| DomainError::MalformedSettings {
                reason: format!("invalid port '{s}': {e}"),
            })
    }
}

impl Serialize for Port {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Port {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u16),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(text) => text.parse().map_err(serde::de::Error::custom),
            Raw::Number(n) => Ok(Self(n)),
        }
    }
}

// ── Identifier ───────────────────────────────────────────────────────────────

/// A lower-cased `[A-Za-z0-9_]+` name (project, entity and plural names).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    /// Validate the charset, then lower-case.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        if value.is_empty() {
            return Err(DomainError::InvalidIdentifier {
                value: value.into(),
                reason: "must not be empty".into(),
            });
        }
        if !is_identifier(value) {
            return Err(DomainError::InvalidIdentifier {
                value: value.into(),
                reason: "only letters, digits and underscores are allowed".into(),
            });
        }
        Ok(Self(value.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hostname-safe form: underscores become hyphens.
    pub fn hostname(&self) -> String {
        self.0.replace('_', "-")
    }

    /// First letter upper-cased, the rest lower-cased.
    pub fn capitalized(&self) -> String {
        let mut chars = self.0.chars();
        match chars.next() {
            Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
            None => String::new(),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Identifier {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Identifier {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Identifier> for String {
    fn from(value: Identifier) -> Self {
        value.0
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// `true` if `value` matches `[A-Za-z0-9_]+`.
pub(crate) fn is_identifier(value: &str) -> bool {
    !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}
