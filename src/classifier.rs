//! Keyword-based product classification.
//!
//! Priority: specific keyword rules (in table order) > generic T-shirt /
//! shirt with sleeve qualifier > `Others`. Matching is case-insensitive
//! substring matching on the raw product name; nothing else is normalised.

use crate::category::Category;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// One specific-category rule: any keyword occurring in the name selects
/// `label`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub label: Category,
    pub keywords: Vec<String>,
}

impl KeywordRule {
    fn new(label: Category, keywords: &[&str]) -> Self {
        Self {
            label,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// The complete, ordered rule set. Order of `rules` is evaluation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleTable {
    pub tshirt_keywords: Vec<String>,
    pub shirt_keywords: Vec<String>,
    pub full_sleeve_keywords: Vec<String>,
    pub rules: Vec<KeywordRule>,
}

impl Default for RuleTable {
    fn default() -> Self {
        use Category::*;
        let rules = vec![
            KeywordRule::new(Boxer, &["boxer"]),
            KeywordRule::new(Jeans, &["jeans"]),
            KeywordRule::new(Denim, &["denim"]),
            KeywordRule::new(Flannel, &["flannel"]),
            KeywordRule::new(Polo, &["polo"]),
            KeywordRule::new(Panjabi, &["panjabi", "punjabi"]),
            KeywordRule::new(Trousers, &["trouser"]),
            KeywordRule::new(TwillChino, &["twill", "chino"]),
            KeywordRule::new(Mask, &["mask"]),
            KeywordRule::new(Bag, &["bag"]),
            KeywordRule::new(WaterBottle, &["bottle"]),
            KeywordRule::new(Contrast, &["contrast"]),
            KeywordRule::new(Turtleneck, &["turtleneck", "turtle neck"]),
            KeywordRule::new(Wallet, &["wallet"]),
            KeywordRule::new(Kaftan, &["kaftan"]),
            KeywordRule::new(ActiveWear, &["active wear", "activewear"]),
            KeywordRule::new(Jersy, &["jersy", "jersey"]),
            KeywordRule::new(Sweatshirt, &["sweatshirt", "sweat shirt"]),
            KeywordRule::new(Jacket, &["jacket"]),
            KeywordRule::new(Belt, &["belt"]),
            KeywordRule::new(Sweater, &["sweater"]),
            KeywordRule::new(PassportHolder, &["passport"]),
            KeywordRule::new(Cap, &["cap"]),
        ];
        let owned = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            tshirt_keywords: owned(&["t-shirt", "t shirt", "tee"]),
            shirt_keywords: owned(&["shirt"]),
            full_sleeve_keywords: owned(&["full sleeve", "long sleeve", "fs", "l/s"]),
            rules,
        }
    }
}

impl RuleTable {
    /// Problems that would make the table misbehave: empty keywords, or
    /// labels reserved for the generic tiers.
    pub fn validate(&self) -> Result<(), String> {
        for rule in &self.rules {
            if matches!(
                rule.label,
                Category::FsTShirt
                    | Category::HsTShirt
                    | Category::FsShirt
                    | Category::HsShirt
                    | Category::Others
            ) {
                return Err(format!(
                    "label '{}' is assigned by the generic garment rules and cannot have keywords",
                    rule.label
                ));
            }
            if rule.keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(format!("rule '{}' has an empty keyword", rule.label));
            }
        }
        let generic = [
            ("tshirt_keywords", &self.tshirt_keywords),
            ("shirt_keywords", &self.shirt_keywords),
            ("full_sleeve_keywords", &self.full_sleeve_keywords),
        ];
        for (field, list) in generic {
            if list.iter().any(|k| k.trim().is_empty()) {
                return Err(format!("{field} contains an empty keyword"));
            }
        }
        Ok(())
    }
}

/// A compiled rule table: keywords pre-lowered once.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<(Category, Vec<String>)>,
    tshirt: Vec<String>,
    shirt: Vec<String>,
    full_sleeve: Vec<String>,
}

fn lower_all(list: &[String]) -> Vec<String> {
    list.iter().map(|k| k.to_lowercase()).collect()
}

fn has_any(name: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| name.contains(k.as_str()))
}

impl Classifier {
    pub fn new(table: &RuleTable) -> Self {
        Self {
            rules: table
                .rules
                .iter()
                .map(|r| (r.label, lower_all(&r.keywords)))
                .collect(),
            tshirt: lower_all(&table.tshirt_keywords),
            shirt: lower_all(&table.shirt_keywords),
            full_sleeve: lower_all(&table.full_sleeve_keywords),
        }
    }

    /// Assign exactly one category. Total: unmatched names are `Others`.
    pub fn classify(&self, product_name: &str) -> Category {
        let name = product_name.to_lowercase();

        for (label, keywords) in &self.rules {
            if has_any(&name, keywords) {
                return *label;
            }
        }

        let full_sleeve = has_any(&name, &self.full_sleeve);
        if has_any(&name, &self.tshirt) {
            return if full_sleeve {
                Category::FsTShirt
            } else {
                Category::HsTShirt
            };
        }
        if has_any(&name, &self.shirt) {
            return if full_sleeve {
                Category::FsShirt
            } else {
                Category::HsShirt
            };
        }

        Category::Others
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Classifier::new(&RuleTable::default())
    }
}

static DEFAULT_CLASSIFIER: Lazy<Classifier> = Lazy::new(Classifier::default);

/// Classify with the built-in reference table.
pub fn classify(product_name: &str) -> Category {
    DEFAULT_CLASSIFIER.classify(product_name)
}
