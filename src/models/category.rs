//! Fact categories and the filter used to browse them.

use std::{fmt, str::FromStr};

use anyhow::{anyhow, Error};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Technology,
    Science,
    Finance,
    Society,
    Entertainment,
    Health,
    History,
    News,
}

/// Display metadata for a category.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct CategoryInfo {
    pub category: Category,
    pub name: &'static str,
    pub color: &'static str,
}

static CATEGORY_TABLE: [CategoryInfo; 8] = [
    CategoryInfo { category: Category::Technology, name: "technology", color: "#3b82f6" },
    CategoryInfo { category: Category::Science, name: "science", color: "#16a34a" },
    CategoryInfo { category: Category::Finance, name: "finance", color: "#ef4444" },
    CategoryInfo { category: Category::Society, name: "society", color: "#eab308" },
    CategoryInfo { category: Category::Entertainment, name: "entertainment", color: "#db2777" },
    CategoryInfo { category: Category::Health, name: "health", color: "#14b8a6" },
    CategoryInfo { category: Category::History, name: "history", color: "#f97316" },
    CategoryInfo { category: Category::News, name: "news", color: "#8b5cf6" },
];

impl Category {
    /// Sidebar order.
    pub const ALL: [Category; 8] = [
        Category::Technology,
        Category::Science,
        Category::Finance,
        Category::Society,
        Category::Entertainment,
        Category::Health,
        Category::History,
        Category::News,
    ];

    pub fn info(self) -> &'static CategoryInfo {
        // Table rows are declared in enum order.
        &CATEGORY_TABLE[self as usize]
    }

    pub fn as_str(self) -> &'static str {
        self.info().name
    }

    pub fn color(self) -> &'static str {
        self.info().color
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        CATEGORY_TABLE
            .iter()
            .find(|info| info.name == value)
            .map(|info| info.category)
            .ok_or_else(|| anyhow!("unknown category '{value}'"))
    }
}

/// Active browse filter: everything, or a single category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            CategoryFilter::All => "all",
            CategoryFilter::Only(category) => category.as_str(),
        }
    }

    pub fn matches(self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => wanted == category,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryFilter {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value == "all" {
            Ok(CategoryFilter::All)
        } else {
            value.parse().map(CategoryFilter::Only)
        }
    }
}

impl From<Category> for CategoryFilter {
    fn from(category: Category) -> Self {
        CategoryFilter::Only(category)
    }
}

impl Serialize for CategoryFilter {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CategoryFilter {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
