//! Store documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use bazaar_core::{StoreCustomization, StoreId, StoreSettings, StoreStatus, Subdomain, UserId};

use crate::db::{Document, collections};

/// Description used when an application leaves it blank.
pub const DEFAULT_STORE_DESCRIPTION: &str = "متجر إلكتروني متميز";

/// Template assigned when none is chosen.
pub const DEFAULT_TEMPLATE: &str = "modern-ecommerce";

/// A merchant's tenant record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    pub subdomain: Subdomain,
    pub owner_id: UserId,
    #[serde(default = "default_template")]
    pub template: String,
    #[serde(default)]
    pub customization: StoreCustomization,
    #[serde(default)]
    pub settings: StoreSettings,
    #[serde(default)]
    pub status: StoreStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_template() -> String {
    DEFAULT_TEMPLATE.to_owned()
}

impl Document for Store {
    const COLLECTION: &'static str = collections::STORES;

    fn id(&self) -> &str {
        self.id.as_str()
    }
}

impl Store {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == StoreStatus::Active
    }
}

/// Fields needed to create a store directly (the CLI sample store, or an
/// approved application).
#[derive(Debug, Clone)]
pub struct StoreDraft {
    pub name: String,
    pub description: String,
    pub subdomain: Subdomain,
    pub owner_id: UserId,
    pub template: String,
    pub customization: StoreCustomization,
    pub settings: StoreSettings,
}

impl StoreDraft {
    /// A draft with the default description, template, look and settings.
    #[must_use]
    pub fn new(name: impl Into<String>, subdomain: Subdomain, owner_id: UserId) -> Self {
        Self {
            name: name.into(),
            description: DEFAULT_STORE_DESCRIPTION.to_owned(),
            subdomain,
            owner_id,
            template: DEFAULT_TEMPLATE.to_owned(),
            customization: StoreCustomization::default(),
            settings: StoreSettings::default(),
        }
    }
}

/// Partial update of a store.
///
/// `customization` and `settings` are partial JSON documents deep-merged
/// into the current values, so a dashboard can send just the section it
/// edited.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub cover: Option<String>,
    pub template: Option<String>,
    pub customization: Option<Value>,
    pub settings: Option<Value>,
    pub status: Option<StoreStatus>,
}

impl StorePatch {
    #[must_use]
    pub const fn touches_customization(&self) -> bool {
        self.customization.is_some()
    }
}

/// Recursively merge `overlay` into `base`.
///
/// Objects merge key by key; any other overlay value (including arrays)
/// replaces the base value. `null` in the overlay is ignored.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None if !value.is_null() => {
                        base_map.insert(key.clone(), value.clone());
                    }
                    None => {}
                }
            }
        }
        (_, Value::Null) => {}
        (base, overlay) => *base = overlay.clone(),
    }
}

/// Apply a partial JSON document on top of a typed value.
///
/// # Errors
///
/// Returns the serde error if the merged document no longer matches `T`.
pub fn merge_into<T>(current: &T, overlay: &Value) -> Result<T, serde_json::Error>
where
    T: Serialize + serde::de::DeserializeOwned,
{
    let mut doc = serde_json::to_value(current)?;
    deep_merge(&mut doc, overlay);
    serde_json::from_value(doc)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_deep_merge_objects_and_scalars() {
        let mut base = json!({
            "colors": {"primary": "#000000", "text": "#111111"},
            "layout": {"productGridColumns": 4},
            "homepage": {"sectionsOrder": ["hero", "featured"]}
        });
        deep_merge(
            &mut base,
            &json!({
                "colors": {"primary": "#ff0000"},
                "layout": {"productGridColumns": 3},
                "homepage": {"sectionsOrder": ["featured"]},
                "ignored": null
            }),
        );

        assert_eq!(base["colors"]["primary"], "#ff0000");
        assert_eq!(base["colors"]["text"], "#111111");
        assert_eq!(base["layout"]["productGridColumns"], 3);
        assert_eq!(base["homepage"]["sectionsOrder"], json!(["featured"]));
        assert!(base.get("ignored").is_none());
    }

    #[test]
    fn test_merge_into_typed_customization() {
        let current = StoreCustomization::default();
        let merged: StoreCustomization =
            merge_into(&current, &json!({"colors": {"accent": "#00ff00"}})).unwrap();
        assert_eq!(merged.colors.accent, "#00ff00");
        assert_eq!(merged.colors.primary, current.colors.primary);

        let bad = merge_into(&current, &json!({"layout": {"headerStyle": "baroque"}}));
        assert!(bad.is_err());
    }
}
