use std::fmt;

use serde::{Deserialize, Serialize};

/// Account slot a credential is stored under.
///
/// The default account and every external identity (for example a companion
/// add-on id) have independent slots that are never merged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum AccountIdentity {
    Default,
    External(String),
}

impl AccountIdentity {
    /// Pick the slot from an optional external id; blank ids mean the default account.
    pub fn from_addon_id(addon_id: Option<&str>) -> Self {
        match addon_id.map(str::trim) {
            Some(id) if !id.is_empty() => Self::External(id.to_string()),
            _ => Self::Default,
        }
    }

    /// File-system safe label for this slot.
    pub fn storage_label(&self) -> String {
        match self {
            Self::Default => "default".to_string(),
            Self::External(id) => format!("addon.{}", normalize_label(id)),
        }
    }
}

impl Default for AccountIdentity {
    fn default() -> Self {
        Self::Default
    }
}

impl fmt::Display for AccountIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("default"),
            Self::External(id) => write!(f, "external:{id}"),
        }
    }
}

fn normalize_label(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.trim().chars() {
        let lower = ch.to_ascii_lowercase();
        if lower.is_ascii_alphanumeric() || lower == '-' || lower == '.' || lower == '_' {
            out.push(lower);
        } else {
            out.push('-');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_addon_id_selects_default_account() {
        assert_eq!(AccountIdentity::from_addon_id(None), AccountIdentity::Default);
        assert_eq!(
            AccountIdentity::from_addon_id(Some("   ")),
            AccountIdentity::Default
        );
    }

    #[test]
    fn addon_id_selects_external_slot() {
        let identity = AccountIdentity::from_addon_id(Some("plugin.video.example"));
        assert_eq!(
            identity,
            AccountIdentity::External("plugin.video.example".to_string())
        );
    }

    #[test]
    fn storage_labels_do_not_collide() {
        assert_eq!(AccountIdentity::Default.storage_label(), "default");
        assert_eq!(
            AccountIdentity::External("My Addon/x".to_string()).storage_label(),
            "addon.my-addon-x"
        );
    }
}
