//! The four-level category taxonomy and the navigation URL / breadcrumb
//! derivation used by the storefront.
//!
//! Categories live in a fixed hierarchy: primary → secondary → tertiary →
//! quaternary. A category's level determines which ancestor references it
//! carries, and navigation URLs are derived purely from a category's name,
//! level, and ancestor chain — no store access involved.

use serde::{Deserialize, Serialize};

/// One of the four fixed hierarchy levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryLevel {
    Primary,
    Secondary,
    Tertiary,
    Quaternary,
}

impl CategoryLevel {
    /// The lowercase storage/wire form, matching the `categories.level` column.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CategoryLevel::Primary => "primary",
            CategoryLevel::Secondary => "secondary",
            CategoryLevel::Tertiary => "tertiary",
            CategoryLevel::Quaternary => "quaternary",
        }
    }

    /// Parses the storage form. Returns `None` for anything else.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "primary" => Some(CategoryLevel::Primary),
            "secondary" => Some(CategoryLevel::Secondary),
            "tertiary" => Some(CategoryLevel::Tertiary),
            "quaternary" => Some(CategoryLevel::Quaternary),
            _ => None,
        }
    }

    /// The level of this level's direct children, if any.
    #[must_use]
    pub fn child(self) -> Option<CategoryLevel> {
        match self {
            CategoryLevel::Primary => Some(CategoryLevel::Secondary),
            CategoryLevel::Secondary => Some(CategoryLevel::Tertiary),
            CategoryLevel::Tertiary => Some(CategoryLevel::Quaternary),
            CategoryLevel::Quaternary => None,
        }
    }
}

impl std::fmt::Display for CategoryLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generates a deterministic, routing-safe slug from a display name.
///
/// Lowercases, keeps ASCII alphanumerics, and collapses every other run of
/// characters into a single hyphen: `"Gas & LPG Boilers"` → `"gas-lpg-boilers"`.
#[must_use]
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// A named ancestor reference, as denormalized on category records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AncestorRef {
    pub id: i64,
    pub name: String,
}

impl AncestorRef {
    #[must_use]
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// One entry of a breadcrumb trail: a label and the canonical URL it links to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub label: String,
    pub url: String,
}

/// A category together with its ancestor chain, ready for URL and breadcrumb
/// derivation.
///
/// Ancestors above the category's own level are ignored; ancestors below it
/// are meaningless and should be `None`. A *missing* expected ancestor (data
/// inconsistency in the denormalized references) renders as an empty path
/// segment and its id query parameter is omitted, rather than failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavTarget {
    pub id: i64,
    pub level: CategoryLevel,
    pub name: String,
    pub primary: Option<AncestorRef>,
    pub secondary: Option<AncestorRef>,
    pub tertiary: Option<AncestorRef>,
}

impl NavTarget {
    /// A target with no ancestor chain; suitable for primary categories.
    #[must_use]
    pub fn primary(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            level: CategoryLevel::Primary,
            name: name.into(),
            primary: None,
            secondary: None,
            tertiary: None,
        }
    }

    /// Slug segments for the ancestor run, topmost first, ending with the
    /// category's own slug. Expected-but-missing ancestors yield `""`.
    fn slug_segments(&self) -> Vec<String> {
        let ancestor_slug =
            |a: &Option<AncestorRef>| a.as_ref().map(|r| slugify(&r.name)).unwrap_or_default();

        let mut segments = Vec::with_capacity(4);
        if self.level != CategoryLevel::Primary {
            segments.push(ancestor_slug(&self.primary));
        }
        if matches!(self.level, CategoryLevel::Tertiary | CategoryLevel::Quaternary) {
            segments.push(ancestor_slug(&self.secondary));
        }
        if self.level == CategoryLevel::Quaternary {
            segments.push(ancestor_slug(&self.tertiary));
        }
        segments.push(slugify(&self.name));
        segments
    }

    /// The slash-delimited path: `/products/c/{ancestor-slugs}/{own-slug}/c`.
    ///
    /// The literal `c` segment opens and closes the category-slug run; the
    /// router relies on this exact shape.
    #[must_use]
    pub fn path(&self) -> String {
        format!("/products/c/{}/c", self.slug_segments().join("/"))
    }

    /// `(param, id)` pairs in `p_id`, `s_id`, `t_id`, `q_id` order, only for
    /// the levels that apply to this target.
    fn id_params(&self) -> Vec<(&'static str, i64)> {
        fn push(params: &mut Vec<(&'static str, i64)>, param: &'static str, r: &Option<AncestorRef>) {
            if let Some(r) = r {
                params.push((param, r.id));
            }
        }

        let mut params = Vec::with_capacity(4);
        match self.level {
            CategoryLevel::Primary => params.push(("p_id", self.id)),
            CategoryLevel::Secondary => {
                push(&mut params, "p_id", &self.primary);
                params.push(("s_id", self.id));
            }
            CategoryLevel::Tertiary => {
                push(&mut params, "p_id", &self.primary);
                push(&mut params, "s_id", &self.secondary);
                params.push(("t_id", self.id));
            }
            CategoryLevel::Quaternary => {
                push(&mut params, "p_id", &self.primary);
                push(&mut params, "s_id", &self.secondary);
                push(&mut params, "t_id", &self.tertiary);
                params.push(("q_id", self.id));
            }
        }
        params
    }

    /// The full canonical navigation URL:
    /// `/products/c/{slugs}/c?p_id={id}&s_id={id}&t_id={id}&q_id={id}`,
    /// with id parameters only for the levels that apply.
    #[must_use]
    pub fn url(&self) -> String {
        let query = self
            .id_params()
            .into_iter()
            .map(|(param, id)| format!("{param}={id}"))
            .collect::<Vec<_>>()
            .join("&");

        if query.is_empty() {
            self.path()
        } else {
            format!("{}?{}", self.path(), query)
        }
    }

    /// The breadcrumb trail from the primary ancestor down to this category.
    ///
    /// Each crumb links to that level's own canonical URL. Missing ancestors
    /// are skipped entirely — a breadcrumb with no label is worse than a gap.
    #[must_use]
    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        let mut crumbs = Vec::with_capacity(4);

        if self.level != CategoryLevel::Primary {
            if let Some(p) = &self.primary {
                crumbs.push(Breadcrumb {
                    label: p.name.clone(),
                    url: NavTarget::primary(p.id, p.name.clone()).url(),
                });
            }
        }
        if matches!(self.level, CategoryLevel::Tertiary | CategoryLevel::Quaternary) {
            if let Some(s) = &self.secondary {
                let target = NavTarget {
                    id: s.id,
                    level: CategoryLevel::Secondary,
                    name: s.name.clone(),
                    primary: self.primary.clone(),
                    secondary: None,
                    tertiary: None,
                };
                crumbs.push(Breadcrumb {
                    label: s.name.clone(),
                    url: target.url(),
                });
            }
        }
        if self.level == CategoryLevel::Quaternary {
            if let Some(t) = &self.tertiary {
                let target = NavTarget {
                    id: t.id,
                    level: CategoryLevel::Tertiary,
                    name: t.name.clone(),
                    primary: self.primary.clone(),
                    secondary: self.secondary.clone(),
                    tertiary: None,
                };
                crumbs.push(Breadcrumb {
                    label: t.name.clone(),
                    url: target.url(),
                });
            }
        }

        crumbs.push(Breadcrumb {
            label: self.name.clone(),
            url: self.url(),
        });
        crumbs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_roundtrips_through_storage_form() {
        for level in [
            CategoryLevel::Primary,
            CategoryLevel::Secondary,
            CategoryLevel::Tertiary,
            CategoryLevel::Quaternary,
        ] {
            assert_eq!(CategoryLevel::parse(level.as_str()), Some(level));
        }
        assert_eq!(CategoryLevel::parse("quinary"), None);
    }

    #[test]
    fn child_levels_descend_and_stop() {
        assert_eq!(
            CategoryLevel::Primary.child(),
            Some(CategoryLevel::Secondary)
        );
        assert_eq!(
            CategoryLevel::Tertiary.child(),
            Some(CategoryLevel::Quaternary)
        );
        assert_eq!(CategoryLevel::Quaternary.child(), None);
    }

    #[test]
    fn slugify_lowercases_and_hyphenates() {
        assert_eq!(slugify("Boilers"), "boilers");
        assert_eq!(slugify("Gas & LPG Boilers"), "gas-lpg-boilers");
        assert_eq!(slugify("  Combi  "), "combi");
        assert_eq!(slugify("28kW Output"), "28kw-output");
    }

    #[test]
    fn slugify_collapses_special_runs_to_single_hyphen() {
        assert_eq!(slugify("Taps -- & Showers"), "taps-showers");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn primary_url_has_single_id_param() {
        let target = NavTarget::primary(3, "Boilers");
        assert_eq!(target.url(), "/products/c/boilers/c?p_id=3");
    }

    #[test]
    fn secondary_url_includes_parent_slug_and_both_ids() {
        let target = NavTarget {
            id: 7,
            level: CategoryLevel::Secondary,
            name: "Combi".to_string(),
            primary: Some(AncestorRef::new(3, "Boilers")),
            secondary: None,
            tertiary: None,
        };
        assert_eq!(target.url(), "/products/c/boilers/combi/c?p_id=3&s_id=7");
    }

    #[test]
    fn quaternary_url_carries_full_chain_and_all_four_ids() {
        let target = NavTarget {
            id: 20,
            level: CategoryLevel::Quaternary,
            name: "System Boilers".to_string(),
            primary: Some(AncestorRef::new(3, "Boilers")),
            secondary: Some(AncestorRef::new(7, "Combi")),
            tertiary: Some(AncestorRef::new(11, "Gas")),
        };
        assert_eq!(
            target.url(),
            "/products/c/boilers/combi/gas/system-boilers/c?p_id=3&s_id=7&t_id=11&q_id=20"
        );
    }

    #[test]
    fn missing_ancestor_renders_empty_segment_not_failure() {
        // Denormalized secondary reference lost; the path keeps its shape.
        let target = NavTarget {
            id: 20,
            level: CategoryLevel::Quaternary,
            name: "System Boilers".to_string(),
            primary: Some(AncestorRef::new(3, "Boilers")),
            secondary: None,
            tertiary: Some(AncestorRef::new(11, "Gas")),
        };
        assert_eq!(
            target.url(),
            "/products/c/boilers//gas/system-boilers/c?p_id=3&t_id=11&q_id=20"
        );
    }

    #[test]
    fn breadcrumbs_walk_from_primary_down_to_self() {
        let target = NavTarget {
            id: 20,
            level: CategoryLevel::Quaternary,
            name: "System Boilers".to_string(),
            primary: Some(AncestorRef::new(3, "Boilers")),
            secondary: Some(AncestorRef::new(7, "Combi")),
            tertiary: Some(AncestorRef::new(11, "Gas")),
        };

        let crumbs = target.breadcrumbs();
        let labels: Vec<&str> = crumbs.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, ["Boilers", "Combi", "Gas", "System Boilers"]);
        assert_eq!(crumbs[0].url, "/products/c/boilers/c?p_id=3");
        assert_eq!(crumbs[1].url, "/products/c/boilers/combi/c?p_id=3&s_id=7");
        assert_eq!(
            crumbs[2].url,
            "/products/c/boilers/combi/gas/c?p_id=3&s_id=7&t_id=11"
        );
        assert_eq!(crumbs[3].url, target.url());
    }

    #[test]
    fn breadcrumbs_skip_missing_ancestors() {
        let target = NavTarget {
            id: 9,
            level: CategoryLevel::Tertiary,
            name: "Gas".to_string(),
            primary: None,
            secondary: Some(AncestorRef::new(7, "Combi")),
            tertiary: None,
        };
        let labels: Vec<String> = target.breadcrumbs().into_iter().map(|c| c.label).collect();
        assert_eq!(labels, ["Combi", "Gas"]);
    }

    #[test]
    fn primary_breadcrumb_is_just_itself() {
        let crumbs = NavTarget::primary(3, "Boilers").breadcrumbs();
        assert_eq!(crumbs.len(), 1);
        assert_eq!(crumbs[0].label, "Boilers");
    }

    #[test]
    fn level_serde_uses_lowercase() {
        let json = serde_json::to_string(&CategoryLevel::Quaternary).expect("serialize");
        assert_eq!(json, "\"quaternary\"");
        let back: CategoryLevel = serde_json::from_str("\"secondary\"").expect("deserialize");
        assert_eq!(back, CategoryLevel::Secondary);
    }
}
