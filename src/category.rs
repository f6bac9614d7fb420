// Fixed category taxonomy.
//
// Every classified row carries exactly one of these labels. Rule tables in
// configuration refer to labels by their display name, so serde uses the
// display names as well.
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Boxer")]
    Boxer,
    #[serde(rename = "Jeans")]
    Jeans,
    #[serde(rename = "Denim")]
    Denim,
    #[serde(rename = "Flannel")]
    Flannel,
    #[serde(rename = "Polo")]
    Polo,
    #[serde(rename = "Panjabi")]
    Panjabi,
    #[serde(rename = "Trousers")]
    Trousers,
    #[serde(rename = "Twill Chino")]
    TwillChino,
    #[serde(rename = "Mask")]
    Mask,
    #[serde(rename = "Bag")]
    Bag,
    #[serde(rename = "Water Bottle")]
    WaterBottle,
    #[serde(rename = "Contrast")]
    Contrast,
    #[serde(rename = "Turtleneck")]
    Turtleneck,
    #[serde(rename = "Wallet")]
    Wallet,
    #[serde(rename = "Kaftan")]
    Kaftan,
    #[serde(rename = "Active Wear")]
    ActiveWear,
    #[serde(rename = "Jersy")]
    Jersy,
    #[serde(rename = "Sweatshirt")]
    Sweatshirt,
    #[serde(rename = "Jacket")]
    Jacket,
    #[serde(rename = "Belt")]
    Belt,
    #[serde(rename = "Sweater")]
    Sweater,
    #[serde(rename = "Passport Holder")]
    PassportHolder,
    #[serde(rename = "Cap")]
    Cap,
    #[serde(rename = "FS T-Shirt")]
    FsTShirt,
    #[serde(rename = "HS T-Shirt")]
    HsTShirt,
    #[serde(rename = "FS Shirt")]
    FsShirt,
    #[serde(rename = "HS Shirt")]
    HsShirt,
    #[serde(rename = "Others")]
    Others,
}

impl Category {
    pub const ALL: [Category; 28] = [
        Category::Boxer,
        Category::Jeans,
        Category::Denim,
        Category::Flannel,
        Category::Polo,
        Category::Panjabi,
        Category::Trousers,
        Category::TwillChino,
        Category::Mask,
        Category::Bag,
        Category::WaterBottle,
        Category::Contrast,
        Category::Turtleneck,
        Category::Wallet,
        Category::Kaftan,
        Category::ActiveWear,
        Category::Jersy,
        Category::Sweatshirt,
        Category::Jacket,
        Category::Belt,
        Category::Sweater,
        Category::PassportHolder,
        Category::Cap,
        Category::FsTShirt,
        Category::HsTShirt,
        Category::FsShirt,
        Category::HsShirt,
        Category::Others,
    ];

    /// Human-readable label, also used for report ordering and export.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Boxer => "Boxer",
            Category::Jeans => "Jeans",
            Category::Denim => "Denim",
            Category::Flannel => "Flannel",
            Category::Polo => "Polo",
            Category::Panjabi => "Panjabi",
            Category::Trousers => "Trousers",
            Category::TwillChino => "Twill Chino",
            Category::Mask => "Mask",
            Category::Bag => "Bag",
            Category::WaterBottle => "Water Bottle",
            Category::Contrast => "Contrast",
            Category::Turtleneck => "Turtleneck",
            Category::Wallet => "Wallet",
            Category::Kaftan => "Kaftan",
            Category::ActiveWear => "Active Wear",
            Category::Jersy => "Jersy",
            Category::Sweatshirt => "Sweatshirt",
            Category::Jacket => "Jacket",
            Category::Belt => "Belt",
            Category::Sweater => "Sweater",
            Category::PassportHolder => "Passport Holder",
            Category::Cap => "Cap",
            Category::FsTShirt => "FS T-Shirt",
            Category::HsTShirt => "HS T-Shirt",
            Category::FsShirt => "FS Shirt",
            Category::HsShirt => "HS Shirt",
            Category::Others => "Others",
        }
    }

    /// Case-insensitive lookup by display name.
    pub fn from_label(label: &str) -> Option<Category> {
        let wanted = label.trim();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
