//! The catalog seed file: brands plus the nested four-level category tree,
//! loaded from YAML and validated before anything touches the database.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::categories::slugify;
use crate::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandSeed {
    pub name: String,
    pub logo_url: Option<String>,
}

impl BrandSeed {
    /// URL-safe slug derived from the brand name.
    #[must_use]
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }
}

/// One node of the seeded category tree. Nesting depth maps onto the four
/// hierarchy levels; deeper nesting is a validation error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySeed {
    pub name: String,
    pub image_url: Option<String>,
    #[serde(default)]
    pub children: Vec<CategorySeed>,
}

impl CategorySeed {
    #[must_use]
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }
}

#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub brands: Vec<BrandSeed>,
    #[serde(default)]
    pub categories: Vec<CategorySeed>,
}

/// Load and validate the catalog from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails
/// validation.
pub fn load_catalog(path: &Path) -> Result<CatalogFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CatalogFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let catalog: CatalogFile = serde_yaml::from_str(&content)?;
    validate_catalog(&catalog)?;
    Ok(catalog)
}

fn validate_catalog(catalog: &CatalogFile) -> Result<(), ConfigError> {
    let mut brand_slugs = HashSet::new();
    for brand in &catalog.brands {
        if brand.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "brand name must be non-empty".to_string(),
            ));
        }
        if !brand_slugs.insert(brand.slug()) {
            return Err(ConfigError::Validation(format!(
                "duplicate brand slug '{}'",
                brand.slug()
            )));
        }
    }

    validate_category_level(&catalog.categories, 1)
}

fn validate_category_level(siblings: &[CategorySeed], depth: u8) -> Result<(), ConfigError> {
    if depth > 4 {
        return Err(ConfigError::Validation(
            "category tree exceeds the four-level hierarchy".to_string(),
        ));
    }

    let mut slugs = HashSet::new();
    for category in siblings {
        if category.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "category name must be non-empty at depth {depth}"
            )));
        }
        let slug = category.slug();
        if slug.is_empty() {
            return Err(ConfigError::Validation(format!(
                "category '{}' slugifies to nothing",
                category.name
            )));
        }
        if !slugs.insert(slug) {
            return Err(ConfigError::Validation(format!(
                "duplicate category slug '{}' among siblings at depth {depth}",
                category.slug()
            )));
        }
        validate_category_level(&category.children, depth + 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> CatalogFile {
        serde_yaml::from_str(yaml).expect("valid yaml")
    }

    const SAMPLE: &str = r"
brands:
  - name: Worcester Bosch
    logo_url: https://cdn.example.com/wb.svg
  - name: Ideal Heating
categories:
  - name: Boilers
    children:
      - name: Combi
        children:
          - name: Gas
            children:
              - name: System Boilers
  - name: Radiators
";

    #[test]
    fn sample_catalog_parses_and_validates() {
        let catalog = parse(SAMPLE);
        assert!(validate_catalog(&catalog).is_ok());
        assert_eq!(catalog.brands.len(), 2);
        assert_eq!(catalog.brands[0].slug(), "worcester-bosch");
        assert_eq!(catalog.categories[0].children[0].name, "Combi");
    }

    #[test]
    fn five_levels_deep_is_rejected() {
        let catalog = parse(
            r"
categories:
  - name: A
    children:
      - name: B
        children:
          - name: C
            children:
              - name: D
                children:
                  - name: E
",
        );
        let result = validate_catalog(&catalog);
        assert!(
            matches!(result, Err(ConfigError::Validation(ref msg)) if msg.contains("four-level")),
            "expected depth validation error, got: {result:?}"
        );
    }

    #[test]
    fn duplicate_sibling_slugs_are_rejected() {
        let catalog = parse(
            r"
categories:
  - name: Taps & Showers
  - name: Taps   Showers
",
        );
        let result = validate_catalog(&catalog);
        assert!(
            matches!(result, Err(ConfigError::Validation(ref msg)) if msg.contains("duplicate")),
            "expected duplicate-slug error, got: {result:?}"
        );
    }

    #[test]
    fn same_slug_under_different_parents_is_fine() {
        let catalog = parse(
            r"
categories:
  - name: Boilers
    children:
      - name: Spares
  - name: Radiators
    children:
      - name: Spares
",
        );
        assert!(validate_catalog(&catalog).is_ok());
    }

    #[test]
    fn empty_brand_name_is_rejected() {
        let catalog = parse(
            r"
brands:
  - name: '   '
",
        );
        assert!(validate_catalog(&catalog).is_err());
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let catalog = parse("{}");
        assert!(catalog.brands.is_empty());
        assert!(catalog.categories.is_empty());
        assert!(validate_catalog(&catalog).is_ok());
    }
}
