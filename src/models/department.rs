//! Department hierarchy data structures.

use serde::{Deserialize, Serialize};

/// Category code used for departments listed under no other category.
pub const UNCATEGORIZED_CODE: &str = "uncategorized";

/// Display name of the uncategorized bucket.
pub const UNCATEGORIZED_NAME: &str = "未分類";

/// A department category from the side bar menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentCategory {
    pub category_code: String,
    pub category_name: String,
    pub category_url: String,
    pub category_href: String,
}

/// A department listed on a category page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub category_code: String,
    pub category_name: String,
    pub department_code: String,
    pub department_name: String,
    pub department_url: String,
    pub department_href: String,
}

/// Result of a department crawl.
#[derive(Debug, Default)]
pub struct DepartmentCatalog {
    pub categories: Vec<DepartmentCategory>,
    pub departments: Vec<Department>,
}

impl DepartmentCatalog {
    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    pub fn department_count(&self) -> usize {
        self.departments.len()
    }
}
