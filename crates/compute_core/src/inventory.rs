/// Catalogue of selectable items, grouped by category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    rows: Vec<(String, String)>,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::from_rows([
            ("cat_a", "item_1"),
            ("cat_a", "item_2"),
            ("cat_a", "item_3"),
            ("cat_a", "item_4"),
            ("cat_b", "item_1"),
            ("cat_b", "item_2"),
            ("cat_b", "item_101"),
            ("cat_b", "item_102"),
            ("cat_b", "item_103"),
        ])
    }
}

impl Inventory {
    pub fn from_rows<C, I>(rows: impl IntoIterator<Item = (C, I)>) -> Self
    where
        C: Into<String>,
        I: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|(category, item)| (category.into(), item.into()))
                .collect(),
        }
    }

    /// Distinct categories in order of first appearance.
    pub fn categories(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for (category, _) in &self.rows {
            if !out.contains(&category.as_str()) {
                out.push(category);
            }
        }
        out
    }

    pub fn items_in(&self, category: &str) -> Vec<&str> {
        self.rows
            .iter()
            .filter(|(cat, _)| cat == category)
            .map(|(_, item)| item.as_str())
            .collect()
    }

    pub fn contains_category(&self, category: &str) -> bool {
        self.rows.iter().any(|(cat, _)| cat == category)
    }

    /// Selection to use after switching to `category`.
    ///
    /// Keeps previously selected items that exist in the category; falls back to
    /// the first item of the category when none survive.
    pub fn reconcile_selection(&self, category: &str, previous: &[String]) -> Vec<String> {
        let available = self.items_in(category);
        let kept: Vec<String> = previous
            .iter()
            .filter(|item| available.contains(&item.as_str()))
            .cloned()
            .collect();
        if !kept.is_empty() {
            return kept;
        }
        available
            .first()
            .map(|item| vec![(*item).to_string()])
            .unwrap_or_default()
    }
}
