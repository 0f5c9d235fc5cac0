//! Ordered next-page control locators.

use serde::{Deserialize, Serialize};

/// Placeholder replaced with the number of the page being advanced to.
pub const NEXT_PAGE_PLACEHOLDER: &str = "{next_page}";

/// One named XPath guess for the "next page" control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlLocator {
    pub label: String,
    pub xpath: String,
}

impl ControlLocator {
    pub fn new(label: impl Into<String>, xpath: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            xpath: xpath.into(),
        }
    }

    /// The XPath with `{next_page}` filled in for `current_page + 1`.
    pub fn resolve(&self, current_page: usize) -> String {
        self.xpath
            .replace(NEXT_PAGE_PLACEHOLDER, &(current_page + 1).to_string())
    }
}

/// The built-in locator list, in probe order.
pub fn default_locators() -> Vec<ControlLocator> {
    vec![
        ControlLocator::new("link-text-Next", "//a[contains(text(), 'Next')]"),
        ControlLocator::new("link-text-next", "//a[contains(text(), 'next')]"),
        ControlLocator::new("link-text-bn", "//a[contains(text(), 'পরবর্তী')]"),
        ControlLocator::new("link-class-next", "//a[contains(@class, 'next')]"),
        ControlLocator::new("button-text-Next", "//button[contains(text(), 'Next')]"),
        ControlLocator::new("link-rel-next", "//a[@rel='next']"),
        ControlLocator::new(
            "pager-arrow",
            "//a[contains(@class, 'page-link') and contains(text(), '>')]",
        ),
        ControlLocator::new("list-item-next", "//li[contains(@class, 'next')]/a"),
        ControlLocator::new(
            "page-number",
            format!("//a[contains(text(), '{NEXT_PAGE_PLACEHOLDER}')]"),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_order() {
        let locators = default_locators();
        assert_eq!(locators.len(), 9);
        assert_eq!(locators[0].xpath, "//a[contains(text(), 'Next')]");
        assert_eq!(locators[5].xpath, "//a[@rel='next']");
        assert_eq!(locators[8].label, "page-number");
    }

    #[test]
    fn test_resolve_page_number() {
        let locators = default_locators();
        assert_eq!(locators[8].resolve(1), "//a[contains(text(), '2')]");
        assert_eq!(locators[8].resolve(41), "//a[contains(text(), '42')]");
        // locators without the placeholder are unchanged
        assert_eq!(locators[5].resolve(3), "//a[@rel='next']");
    }

    #[test]
    fn test_locator_roundtrips_through_json() {
        let json = r#"[{"label":"custom","xpath":"//span[@id='fwd']"}]"#;
        let parsed: Vec<ControlLocator> = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, vec![ControlLocator::new("custom", "//span[@id='fwd']")]);
    }
}
