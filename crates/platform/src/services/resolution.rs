//! Storefront store resolution.
//!
//! A storefront URL carries a key that is usually a subdomain but may be a
//! store id, a truncated id or a fragment of the name. [`resolve`] tries a
//! fixed list of strategies in order and reports which one matched, so
//! callers can decide whether the answer is stable enough to cache.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use bazaar_core::{StoreCustomization, StoreId, UserId};

use crate::models::Store;
use crate::models::store::merge_into;

/// Characters compared by the id suffix strategy.
const ID_SUFFIX_LEN: usize = 8;

/// Which strategy resolved a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    ExactSubdomain,
    ExactId,
    PreviewStoreId,
    IdSuffix,
    PreviewOwner,
    ViewerOwner,
    PartialSubdomain,
    NameContains,
    OnlyStore,
    FirstActive,
}

impl MatchKind {
    /// Exact matches always resolve the same key to the same store.
    #[must_use]
    pub const fn is_exact(self) -> bool {
        matches!(self, Self::ExactSubdomain | Self::ExactId)
    }
}

/// Preview parameters sent by the merchant dashboard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviewParams {
    pub store_id: Option<StoreId>,
    pub owner_id: Option<UserId>,
    /// Unsaved customization, a partial document.
    pub customization: Option<Value>,
}

/// Find the store for `key`.
///
/// Strategies, first hit wins:
///
/// 1. subdomain equals the key
/// 2. id equals the key
/// 3. (preview) id equals the preview store id
/// 4. last 8 characters of key and id overlap (keys of 8+ characters)
/// 5. (preview) owner equals the preview owner
/// 6. (preview) owner equals the viewer
/// 7. subdomain contains the key
/// 8. name contains the key, ignoring case
/// 9. there is exactly one store
/// 10. (not preview) the first active store
#[must_use]
pub fn resolve<'s>(
    stores: &'s [Store],
    key: &str,
    preview: Option<&PreviewParams>,
    viewer: Option<&UserId>,
) -> Option<(&'s Store, MatchKind)> {
    let key = key.trim();
    let find = |kind: MatchKind, pred: &dyn Fn(&Store) -> bool| {
        stores.iter().find(|&s| pred(s)).map(|s| (s, kind))
    };

    find(MatchKind::ExactSubdomain, &|s| s.subdomain.as_str() == key)
        .or_else(|| find(MatchKind::ExactId, &|s| s.id.as_str() == key))
        .or_else(|| {
            let wanted = preview?.store_id.as_ref()?;
            find(MatchKind::PreviewStoreId, &|s| &s.id == wanted)
        })
        .or_else(|| {
            let key_tail = tail(key)?;
            find(MatchKind::IdSuffix, &|s| {
                let id = s.id.as_str();
                id.contains(key_tail) || tail(id).is_some_and(|id_tail| key.contains(id_tail))
            })
        })
        .or_else(|| {
            let owner = preview?.owner_id.as_ref()?;
            find(MatchKind::PreviewOwner, &|s| &s.owner_id == owner)
        })
        .or_else(|| {
            let viewer = preview.and(viewer)?;
            find(MatchKind::ViewerOwner, &|s| &s.owner_id == viewer)
        })
        .or_else(|| {
            if key.is_empty() {
                return None;
            }
            find(MatchKind::PartialSubdomain, &|s| s.subdomain.as_str().contains(key))
                .or_else(|| {
                    let needle = key.to_lowercase();
                    find(MatchKind::NameContains, &|s| {
                        s.name.to_lowercase().contains(&needle)
                    })
                })
        })
        .or_else(|| match stores {
            [only] => Some((only, MatchKind::OnlyStore)),
            _ => None,
        })
        .or_else(|| {
            if preview.is_some() {
                return None;
            }
            find(MatchKind::FirstActive, &Store::is_active)
        })
}

/// The last [`ID_SUFFIX_LEN`] characters, if `s` is at least that long.
fn tail(s: &str) -> Option<&str> {
    let count = s.chars().count();
    if count < ID_SUFFIX_LEN {
        return None;
    }
    let start = s
        .char_indices()
        .nth(count - ID_SUFFIX_LEN)
        .map_or(0, |(i, _)| i);
    s.get(start..)
}

/// Overlay unsaved preview customization on a resolved store.
///
/// Only the customization changes; an overlay that does not produce a valid
/// document is ignored.
#[must_use]
pub fn apply_preview(mut store: Store, preview: &PreviewParams) -> Store {
    if let Some(overlay) = &preview.customization {
        match merge_into::<StoreCustomization>(&store.customization, overlay) {
            Ok(merged) if merged.validate().is_ok() => store.customization = merged,
            _ => {
                tracing::debug!(store_id = %store.id, "Ignoring invalid preview customization");
            }
        }
    }
    store
}

/// Preview flags as they arrive on the storefront query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewQuery {
    #[serde(default)]
    pub preview: Option<String>,
    #[serde(default)]
    pub store_id: Option<String>,
    #[serde(default)]
    pub owner_id: Option<String>,
    /// URL-encoded JSON object.
    #[serde(default)]
    pub customization: Option<String>,
}

impl PreviewQuery {
    /// Preview parameters, when preview mode is on (`preview=true` or `1`).
    ///
    /// Unparseable customization JSON is dropped.
    #[must_use]
    pub fn params(&self) -> Option<PreviewParams> {
        let on = matches!(self.preview.as_deref(), Some("true" | "1"));
        if !on {
            return None;
        }
        let non_blank = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
        };
        Some(PreviewParams {
            store_id: non_blank(&self.store_id).map(StoreId::new),
            owner_id: non_blank(&self.owner_id).map(UserId::new),
            customization: self
                .customization
                .as_deref()
                .and_then(|raw| serde_json::from_str::<Value>(raw).ok())
                .filter(Value::is_object),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use bazaar_core::{StoreSettings, StoreStatus, Subdomain};

    use super::*;

    fn store(id: &str, subdomain: &str, name: &str, owner: &str) -> Store {
        let now = Utc::now();
        Store {
            id: StoreId::new(id),
            name: name.to_owned(),
            description: String::new(),
            logo: None,
            cover: None,
            subdomain: Subdomain::parse(subdomain).unwrap(),
            owner_id: UserId::new(owner),
            template: "modern-ecommerce".to_owned(),
            customization: StoreCustomization::default(),
            settings: StoreSettings::default(),
            status: StoreStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    fn fixtures() -> Vec<Store> {
        vec![
            store("store_1718000000000_aaaaaaaaa", "coffee-house", "Coffee House", "u1"),
            store("store_1718000000001_bbbbbbbbb", "tech-world", "Tech World", "u2"),
            store("store_1718000000002_ccccccccc", "fashion", "Fashion Corner", "u3"),
        ]
    }

    fn kind(
        stores: &[Store],
        key: &str,
        preview: Option<&PreviewParams>,
    ) -> Option<(String, MatchKind)> {
        resolve(stores, key, preview, None).map(|(s, k)| (s.subdomain.to_string(), k))
    }

    #[test]
    fn test_exact_matches_win() {
        let stores = fixtures();
        assert_eq!(
            kind(&stores, "tech-world", None),
            Some(("tech-world".to_owned(), MatchKind::ExactSubdomain))
        );
        assert_eq!(
            kind(&stores, "store_1718000000002_ccccccccc", None),
            Some(("fashion".to_owned(), MatchKind::ExactId))
        );
    }

    #[test]
    fn test_id_suffix_in_both_directions() {
        let stores = fixtures();
        assert_eq!(
            kind(&stores, "bbbbbbbb", None),
            Some(("tech-world".to_owned(), MatchKind::IdSuffix))
        );
        assert_eq!(
            kind(&stores, "copied-link-ccccccccc", None),
            Some(("fashion".to_owned(), MatchKind::IdSuffix))
        );
        // Too short for the suffix rule, falls to partial subdomain.
        assert_eq!(
            kind(&stores, "tech", None),
            Some(("tech-world".to_owned(), MatchKind::PartialSubdomain))
        );
    }

    #[test]
    fn test_name_contains_ignores_case() {
        let stores = fixtures();
        assert_eq!(
            kind(&stores, "CORNER", None),
            Some(("fashion".to_owned(), MatchKind::NameContains))
        );
    }

    #[test]
    fn test_fallbacks() {
        let stores = fixtures();
        assert_eq!(
            kind(&stores, "nothing-like-it", None),
            Some(("coffee-house".to_owned(), MatchKind::FirstActive))
        );

        let preview = PreviewParams::default();
        assert_eq!(kind(&stores, "nothing-like-it", Some(&preview)), None);

        let single = vec![store("store_x", "solo", "Solo", "u9")];
        assert_eq!(
            kind(&single, "nothing-like-it", Some(&preview)),
            Some(("solo".to_owned(), MatchKind::OnlyStore))
        );
        assert_eq!(kind(&[], "anything", None), None);
    }

    #[test]
    fn test_first_active_skips_inactive() {
        let mut stores = fixtures();
        stores[0].status = StoreStatus::Inactive;
        assert_eq!(
            kind(&stores, "zzz-unknown", None),
            Some(("tech-world".to_owned(), MatchKind::FirstActive))
        );
    }

    #[test]
    fn test_preview_strategies() {
        let stores = fixtures();
        let by_id = PreviewParams {
            store_id: Some(StoreId::new("store_1718000000002_ccccccccc")),
            ..PreviewParams::default()
        };
        assert_eq!(
            kind(&stores, "new-store", Some(&by_id)),
            Some(("fashion".to_owned(), MatchKind::PreviewStoreId))
        );

        // The subdomain still wins over preview hints.
        assert_eq!(
            kind(&stores, "coffee-house", Some(&by_id)),
            Some(("coffee-house".to_owned(), MatchKind::ExactSubdomain))
        );

        let by_owner = PreviewParams {
            owner_id: Some(UserId::new("u2")),
            ..PreviewParams::default()
        };
        assert_eq!(
            kind(&stores, "new-store", Some(&by_owner)),
            Some(("tech-world".to_owned(), MatchKind::PreviewOwner))
        );

        let viewer = UserId::new("u3");
        let hit = resolve(&stores, "new-store", Some(&PreviewParams::default()), Some(&viewer));
        assert_eq!(
            hit.map(|(s, k)| (s.subdomain.as_str(), k)),
            Some(("fashion", MatchKind::ViewerOwner))
        );

        // The viewer only counts in preview mode.
        let hit = resolve(&stores, "zzz-unknown", None, Some(&viewer));
        assert_eq!(hit.map(|(_, k)| k), Some(MatchKind::FirstActive));
    }

    #[test]
    fn test_apply_preview_merges_customization_only() {
        let original = fixtures().remove(0);
        let preview = PreviewParams {
            customization: Some(json!({"colors": {"primary": "#ff0000"}, "name": "Hijack"})),
            ..PreviewParams::default()
        };
        let previewed = apply_preview(original.clone(), &preview);
        assert_eq!(previewed.customization.colors.primary, "#ff0000");
        assert_eq!(previewed.name, original.name);

        let bad = PreviewParams {
            customization: Some(json!({"colors": {"primary": "red"}})),
            ..PreviewParams::default()
        };
        assert_eq!(apply_preview(original.clone(), &bad).customization, original.customization);

        let style_escape = PreviewParams {
            customization: Some(json!({"fonts": {"heading": "x\"}</style><script>alert(1)</script>"}})),
            ..PreviewParams::default()
        };
        assert_eq!(
            apply_preview(original.clone(), &style_escape).customization,
            original.customization
        );
    }

    #[test]
    fn test_preview_query() {
        let query = PreviewQuery {
            preview: Some("true".to_owned()),
            store_id: Some("store_1".to_owned()),
            owner_id: Some(" ".to_owned()),
            customization: Some(r##"{"colors":{"primary":"#000000"}}"##.to_owned()),
        };
        let params = query.params().unwrap();
        assert_eq!(params.store_id, Some(StoreId::new("store_1")));
        assert_eq!(params.owner_id, None);
        assert!(params.customization.is_some());

        let off = PreviewQuery {
            preview: None,
            ..query
        };
        assert!(off.params().is_none());
    }
}
