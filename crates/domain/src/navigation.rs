use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity_type::EntityTypeId;

/// Classes of navigation guarded against losing unsaved edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationKind {
    /// Switch between status/insert/update/massive sub-tabs of one parameter.
    Subtab,
    /// Switch the parameter (table) being edited.
    Parameter,
    /// Switch the top-level console tab.
    Tab,
}

impl NavigationKind {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subtab => "subtab",
            Self::Parameter => "parameter",
            Self::Tab => "tab",
        }
    }
}

/// Human-readable names for navigation targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationLabels {
    subtabs: BTreeMap<String, String>,
    parameters: BTreeMap<String, String>,
    tabs: BTreeMap<String, String>,
}

impl NavigationLabels {
    /// Creates label maps from explicit entries.
    #[must_use]
    pub fn new(
        subtabs: BTreeMap<String, String>,
        parameters: BTreeMap<String, String>,
        tabs: BTreeMap<String, String>,
    ) -> Self {
        Self {
            subtabs,
            parameters,
            tabs,
        }
    }

    /// Returns the console's built-in labels.
    #[must_use]
    pub fn standard() -> Self {
        let subtabs = [
            ("status", "Status"),
            ("insert", "Create"),
            ("update", "Update"),
            ("massive", "Bulk Update"),
            ("multiple", "Create Multiple"),
        ];
        let tabs = [
            ("dashboard", "Dashboard"),
            ("parameters", "Parameters"),
            ("configuration", "Configuration"),
            ("reports", "Reports"),
            ("alerts", "Alerts"),
            ("notifications", "Notifications"),
            ("permissions", "Permissions"),
        ];

        let mut parameters = BTreeMap::new();
        for entity_type in EntityTypeId::all() {
            parameters.insert(
                entity_type.as_str().to_owned(),
                entity_type.display_name().to_owned(),
            );
            parameters.insert(
                entity_type.alias().to_owned(),
                entity_type.display_name().to_owned(),
            );
        }

        Self {
            subtabs: to_map(&subtabs),
            parameters,
            tabs: to_map(&tabs),
        }
    }

    /// Returns the label for `key`, or `key` upper-cased when unknown.
    #[must_use]
    pub fn label(&self, kind: NavigationKind, key: &str) -> String {
        let map = match kind {
            NavigationKind::Subtab => &self.subtabs,
            NavigationKind::Parameter => &self.parameters,
            NavigationKind::Tab => &self.tabs,
        };

        map.get(key)
            .cloned()
            .unwrap_or_else(|| key.to_uppercase())
    }
}

impl Default for NavigationLabels {
    fn default() -> Self {
        Self::standard()
    }
}

fn to_map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(key, label)| ((*key).to_owned(), (*label).to_owned()))
        .collect()
}
