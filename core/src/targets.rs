//! Output targets - which consumer tiles a producer's output should reach.
//!
//! Targets are declared by the producer only. The raw tile config carries them
//! either as `outputTargets` (a list) or, for tiles saved by older builds, as a
//! comma-separated `outputTarget` string. Both shapes are folded into
//! [`OutputTargets`] once, when the tile is loaded, and never parsed again.

use crate::tile::TileId;
use serde_json::{Map, Value};

/// Config key for the list form.
pub const OUTPUT_TARGETS_KEY: &str = "outputTargets";
/// Config key for the legacy comma-separated form.
pub const LEGACY_OUTPUT_TARGET_KEY: &str = "outputTarget";

/// Ordered list of tile ids a producer publishes to.
///
/// Never contains empty or whitespace-only ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputTargets(Vec<TileId>);

impl OutputTargets {
    pub fn new<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TileId>,
    {
        Self(
            ids.into_iter()
                .map(Into::into)
                .filter(|id: &TileId| !id.as_str().trim().is_empty())
                .collect(),
        )
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|t| t.as_str() == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TileId> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append a target. Returns `false` when it is blank or already present.
    pub fn push(&mut self, id: impl Into<TileId>) -> bool {
        let id = id.into();
        if id.as_str().trim().is_empty() || self.contains(id.as_str()) {
            return false;
        }
        self.0.push(id);
        true
    }

    /// Remove every occurrence of `id`. Returns `true` if anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|t| t.as_str() != id);
        self.0.len() < before
    }

    pub fn to_json(&self) -> Value {
        Value::Array(
            self.0
                .iter()
                .map(|id| Value::String(id.as_str().to_string()))
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a OutputTargets {
    type Item = &'a TileId;
    type IntoIter = std::slice::Iter<'a, TileId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Normalize the targets declared in a raw tile config.
///
/// Any JSON value is accepted. Non-objects, `null`, wrong types and missing
/// keys all degrade to "no targets".
pub fn normalize_targets(config: &Value) -> OutputTargets {
    match config.as_object() {
        Some(map) => normalize_map(map),
        None => OutputTargets::default(),
    }
}

fn normalize_map(map: &Map<String, Value>) -> OutputTargets {
    if let Some(Value::Array(items)) = map.get(OUTPUT_TARGETS_KEY) {
        let listed = OutputTargets::new(items.iter().filter_map(Value::as_str));
        if !listed.is_empty() {
            return listed;
        }
    }

    match map.get(LEGACY_OUTPUT_TARGET_KEY) {
        Some(Value::String(joined)) => OutputTargets::new(
            joined
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty()),
        ),
        _ => OutputTargets::default(),
    }
}

/// Lift the target keys out of a config map, leaving only tile-specific settings.
///
/// Returns `None` when the map declares neither key, so patches that do not
/// touch targets leave them alone.
pub fn take_targets(map: &mut Map<String, Value>) -> Option<OutputTargets> {
    if !map.contains_key(OUTPUT_TARGETS_KEY) && !map.contains_key(LEGACY_OUTPUT_TARGET_KEY) {
        return None;
    }
    let targets = normalize_map(map);
    map.remove(OUTPUT_TARGETS_KEY);
    map.remove(LEGACY_OUTPUT_TARGET_KEY);
    Some(targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids(targets: &OutputTargets) -> Vec<&str> {
        targets.iter().map(TileId::as_str).collect()
    }

    #[test]
    fn test_list_form_is_used_verbatim() {
        let targets = normalize_targets(&json!({"outputTargets": ["b", " c ", "", "   "]}));
        assert_eq!(ids(&targets), vec!["b", " c "]);
    }

    #[test]
    fn test_legacy_form_matches_list_form() {
        let legacy = normalize_targets(&json!({"outputTarget": "x, y"}));
        let list = normalize_targets(&json!({"outputTargets": ["x", "y"]}));
        assert_eq!(legacy, list);
        assert_eq!(ids(&legacy), vec!["x", "y"]);
    }

    #[test]
    fn test_legacy_drops_empty_parts() {
        let targets = normalize_targets(&json!({"outputTarget": " ,a,, b ,"}));
        assert_eq!(ids(&targets), vec!["a", "b"]);
    }

    #[test]
    fn test_empty_list_falls_back_to_legacy() {
        let targets = normalize_targets(&json!({"outputTargets": [], "outputTarget": "z"}));
        assert_eq!(ids(&targets), vec!["z"]);

        let targets = normalize_targets(&json!({"outputTargets": ["", 3], "outputTarget": "z"}));
        assert_eq!(ids(&targets), vec!["z"]);
    }

    #[test]
    fn test_list_wins_over_legacy() {
        let targets = normalize_targets(&json!({"outputTargets": ["a"], "outputTarget": "z"}));
        assert_eq!(ids(&targets), vec!["a"]);
    }

    #[test]
    fn test_malformed_config_has_no_targets() {
        for config in [
            json!(null),
            json!("a,b"),
            json!(["a"]),
            json!({}),
            json!({"outputTargets": "a"}),
            json!({"outputTargets": null, "outputTarget": 5}),
            json!({"outputTargets": [1, true, null]}),
            json!({"outputTarget": ""}),
        ] {
            assert!(normalize_targets(&config).is_empty(), "config {config}");
        }
    }

    #[test]
    fn test_take_targets_strips_keys() {
        let mut map = json!({"outputTarget": "a", "city": "Oslo"})
            .as_object()
            .cloned()
            .unwrap();
        let targets = take_targets(&mut map).unwrap();
        assert_eq!(ids(&targets), vec!["a"]);
        assert_eq!(Value::Object(map), json!({"city": "Oslo"}));
    }

    #[test]
    fn test_take_targets_without_keys() {
        let mut map = json!({"city": "Oslo"}).as_object().cloned().unwrap();
        assert!(take_targets(&mut map).is_none());
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_push_and_remove() {
        let mut targets = OutputTargets::default();
        assert!(targets.push("a"));
        assert!(!targets.push("a"));
        assert!(!targets.push("  "));
        assert!(targets.push("b"));
        assert!(targets.remove("a"));
        assert!(!targets.remove("a"));
        assert_eq!(ids(&targets), vec!["b"]);
    }
}
