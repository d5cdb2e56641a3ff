//! Profile presets: pre-scripted bulk registrations used by `odf init`.

use crate::domain::entities::entity::singular_from_stem;
use crate::domain::value_objects::{Component, Layer, Layout, Profile};

/// How a plural name is derived from an entity name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluralRule {
    /// Names already ending in `s` are kept as-is.
    KeepTrailingS,
    /// Always append `s`.
    AlwaysAppend,
}

impl PluralRule {
    pub fn apply(self, name: &str) -> String {
        match self {
            Self::KeepTrailingS if name.ends_with('s') => name.to_string(),
            _ => format!("{name}s"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ProfileDef {
    pub profile: Profile,
    /// Layout forced by the profile; `None` leaves it to the user.
    pub layout: Option<Layout>,
    /// Registered on every entity, in order.
    pub components: &'static [(Layer, Component)],
    /// Entity description; `{plural}` is replaced by the plural name.
    pub description: Option<&'static str>,
    pub plural_rule: PluralRule,
}

impl ProfileDef {
    /// Default `(name, plural_name)` for a source file stem.
    pub fn names_for(&self, stem: &str) -> (String, String) {
        let name = singular_from_stem(stem);
        let plural = self.plural_rule.apply(&name);
        (name, plural)
    }

    pub fn description_for(&self, plural_name: &str) -> String {
        self.description
            .map(|template| template.replace("{plural}", plural_name))
            .unwrap_or_default()
    }
}

pub static PROFILE_REGISTRY: &[ProfileDef] = &[
    ProfileDef {
        profile: Profile::Custom,
        layout: None,
        components: &[],
        description: None,
        plural_rule: PluralRule::KeepTrailingS,
    },
    ProfileDef {
        profile: Profile::Research,
        layout: Some(Layout::Research),
        components: &[
            (Layer::Devcontainers, Component::R),
            (Layer::Utility, Component::Texlive),
        ],
        description: Some("{plural} research"),
        plural_rule: PluralRule::AlwaysAppend,
    },
];

impl Profile {
    pub fn definition(self) -> &'static ProfileDef {
        PROFILE_REGISTRY
            .iter()
            .find(|def| def.profile == self)
            .unwrap_or(&PROFILE_REGISTRY[0])
    }
}
