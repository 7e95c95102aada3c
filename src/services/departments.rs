// src/services/departments.rs

//! Department crawler service.
//!
//! Walks the category menu of the department index and collects the
//! departments listed on each category page.

use std::collections::HashSet;

use scraper::{ElementRef, Html};
use url::Url;

use crate::error::Result;
use crate::models::{
    Department, DepartmentCatalog, DepartmentCategory, Term, UNCATEGORIZED_CODE,
    UNCATEGORIZED_NAME,
};
use crate::utils::html::{NodeExt, parse_selector};
use crate::utils::http::{Transport, fetch_page_async};
use crate::utils::{last_path_segment, resolve_url};

/// Code of the catch-all category listing every department.
const EVERYTHING_CODE: &str = "everything";

/// Service for crawling department categories and departments.
pub struct DepartmentCrawler<'a> {
    transport: &'a dyn Transport,
    base_url: Url,
}

impl<'a> DepartmentCrawler<'a> {
    /// Create a new department crawler.
    pub fn new(transport: &'a dyn Transport, base_url: &str) -> Result<Self> {
        Ok(Self {
            transport,
            base_url: Url::parse(base_url)?,
        })
    }

    /// Path of the department index for a term.
    pub fn index_href(term: &Term) -> String {
        format!("/view-dept/{}/{}/", term.year, term.semester)
    }

    /// Crawl every category and return the full catalog.
    ///
    /// A category page that fails to load is logged and skipped.
    pub async fn crawl_all(&self, term: &Term) -> Result<DepartmentCatalog> {
        let index_url = resolve_url(&self.base_url, &Self::index_href(term));
        let links = {
            let document = fetch_page_async(self.transport, &index_url).await?;
            parse_category_links(&document)?
        };
        log::info!("Found {} department categories", links.len());

        let mut catalog = DepartmentCatalog::default();
        let mut everything_href = None;

        for (name, href) in links {
            let code = last_path_segment(&href).to_string();
            if code == EVERYTHING_CODE {
                everything_href = Some(href);
                continue;
            }

            let category = DepartmentCategory {
                category_code: code,
                category_name: name,
                category_url: resolve_url(&self.base_url, &href),
                category_href: href,
            };
            log::info!(
                "Crawling category {} ({})",
                category.category_name,
                category.category_code
            );

            match self.fetch_departments(&category).await {
                Ok(departments) => {
                    log::debug!("  Found {} departments", departments.len());
                    catalog.departments.extend(departments);
                }
                Err(e) => {
                    log::error!(
                        "  Failed to crawl category {}: {e}",
                        category.category_name
                    );
                }
            }
            catalog.categories.push(category);
        }

        if let Some(href) = everything_href {
            self.collect_uncategorized(&mut catalog, href).await;
        }

        Ok(catalog)
    }

    /// Add departments that appear only in the catch-all listing.
    async fn collect_uncategorized(&self, catalog: &mut DepartmentCatalog, href: String) {
        let bucket = DepartmentCategory {
            category_code: UNCATEGORIZED_CODE.to_string(),
            category_name: UNCATEGORIZED_NAME.to_string(),
            category_url: resolve_url(&self.base_url, &href),
            category_href: href,
        };

        let listed = match self.fetch_departments(&bucket).await {
            Ok(departments) => departments,
            Err(e) => {
                log::error!("Failed to crawl '{EVERYTHING_CODE}' category: {e}");
                return;
            }
        };

        let known: HashSet<&str> = catalog
            .departments
            .iter()
            .map(|d| d.department_code.as_str())
            .collect();
        let uncategorized: Vec<Department> = listed
            .into_iter()
            .filter(|d| !known.contains(d.department_code.as_str()))
            .collect();

        if uncategorized.is_empty() {
            return;
        }
        log::info!("Added {} uncategorized departments", uncategorized.len());
        catalog.categories.push(bucket);
        catalog.departments.extend(uncategorized);
    }

    async fn fetch_departments(&self, category: &DepartmentCategory) -> Result<Vec<Department>> {
        let document = fetch_page_async(self.transport, &category.category_url).await?;
        parse_department_table(&document, category, &self.base_url)
    }
}

/// Category `(name, href)` pairs from the side bar menu.
pub fn parse_category_links(document: &Html) -> Result<Vec<(String, String)>> {
    let menu_sel = parse_selector(".side_bar_menu")?;
    let link_sel = parse_selector("a")?;

    let Some(menu) = document.root_element().first(&menu_sel) else {
        log::error!("Could not find side_bar_menu on department index");
        return Ok(Vec::new());
    };

    Ok(menu
        .select(&link_sel)
        .filter_map(|a| {
            let href = a.value().attr("href")?.trim();
            if href.is_empty() {
                return None;
            }
            Some((a.text().collect::<String>().trim().to_string(), href.to_string()))
        })
        .collect())
}

/// Departments listed in the first table of a category page.
pub fn parse_department_table(
    document: &Html,
    category: &DepartmentCategory,
    base_url: &Url,
) -> Result<Vec<Department>> {
    let table_sel = parse_selector("table")?;
    let body_row_sel = parse_selector("tbody tr")?;
    let row_sel = parse_selector("tr")?;
    let cell_sel = parse_selector("td")?;
    let link_sel = parse_selector("a")?;

    let Some(table) = document.root_element().first(&table_sel) else {
        return Ok(Vec::new());
    };

    let body_rows: Vec<ElementRef<'_>> = table.select(&body_row_sel).collect();
    let rows: Vec<ElementRef<'_>> = if body_rows.is_empty() {
        table.select(&row_sel).skip(1).collect()
    } else {
        body_rows
    };

    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let cells: Vec<ElementRef<'_>> = row.select(&cell_sel).collect();
            if cells.len() < 2 {
                return None;
            }
            let link = cells[0].first(&link_sel)?;
            let href = link.value().attr("href")?.trim().to_string();
            Some(Department {
                category_code: category.category_code.clone(),
                category_name: category.category_name.clone(),
                department_code: last_path_segment(&href).to_string(),
                department_name: link.text().collect::<String>().trim().to_string(),
                department_url: resolve_url(base_url, &href),
                department_href: href,
            })
        })
        .collect())
}
