use serde::{Deserialize, Serialize};

/// A declared flag.
///
/// Both `name` and `alias` are matched verbatim against argv tokens, so they
/// carry their dashes (`--display`, `-d`). After initialization either name
/// resolves to the same value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct FlagSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub takes_value: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl FlagSpec {
    /// An optional, value-less flag called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the secondary name. An empty string clears it.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = non_empty(alias.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn takes_value(mut self, takes_value: bool) -> Self {
        self.takes_value = takes_value;
        self
    }

    /// Value used when neither name appears on the command line.
    ///
    /// Implies `takes_value`.
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self.takes_value = true;
        self
    }

    /// Primary name followed by the alias, if any.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.alias.as_deref())
    }

    /// Whether `flag` is the primary name or the alias.
    pub fn matches(&self, flag: &str) -> bool {
        self.names().any(|n| n == flag)
    }

    /// Human-readable name used in failure messages (`--super or -s`).
    pub(crate) fn display_names(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{} or {}", self.name, alias),
            None => self.name.clone(),
        }
    }
}

pub(crate) fn non_empty(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == raw.len() {
        Some(raw)
    } else {
        Some(trimmed.to_string())
    }
}
