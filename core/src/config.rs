use serde::Deserialize;

/// Tunables shared by search, autocomplete and spelling.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Most ranked results a single query materializes; pages beyond it are empty
    /// and reported totals are capped at it.
    pub result_window: usize,
    pub max_edit_distance: usize,
    pub suggestions_per_word: usize,
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            result_window: 1000,
            max_edit_distance: 2,
            suggestions_per_word: 5,
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

impl SearchConfig {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let cfg = SearchConfig::from_json(r#"{"result_window": 50}"#).unwrap();
        assert_eq!(cfg.result_window, 50);
        assert_eq!(cfg.max_edit_distance, 2);
        assert_eq!(cfg.default_page_size, 10);
    }
}
