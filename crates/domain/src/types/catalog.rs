//! Product catalog entries.

use serde::{Deserialize, Serialize};

use crate::impl_label_conversions;
use crate::types::table::Row;

/// Top-level navigation section a category belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Section {
    Personal,
    SmallBusiness,
}

impl_label_conversions!(Section {
    Personal => "PERSONAL",
    SmallBusiness => "SMALL BUSINESS",
});

impl Section {
    pub const ALL: [Self; 2] = [Self::Personal, Self::SmallBusiness];
}

/// One list item on a category page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub section: Section,
    pub category: String,
    pub product_name: String,
    pub description: String,
    pub features: String,
    pub promotions: String,
    pub terms: String,
}

impl Product {
    pub fn to_row(&self) -> Row {
        Row::new()
            .with("Section", self.section.label())
            .with("Category", self.category.as_str())
            .with("Product Name", self.product_name.as_str())
            .with("Description", self.description.as_str())
            .with("Features", self.features.as_str())
            .with("Promotions", self.promotions.as_str())
            .with("Terms", self.terms.as_str())
    }
}
