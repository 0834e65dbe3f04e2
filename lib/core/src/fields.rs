use ahash::AHashSet;

/// Static classification of catalog fields.
///
/// Which fields take numeric range filters, which are hard text filters,
/// which only contribute to ranking - all of that is fixed configuration,
/// injected into the engine at construction rather than discovered at
/// runtime. The `Default` impl carries the production catalog layout.
#[derive(Debug, Clone)]
pub struct FieldCatalog {
    /// Fields accepting range / comparison criteria.
    pub numeric: AHashSet<String>,
    /// Fields whose criteria can exclude a record outright.
    pub strict_text: AHashSet<String>,
    /// Free-text fields scored during ranking instead of filtered.
    pub soft: AHashSet<String>,
    /// The ingredient-percentage field, e.g. "65%cotton 35%polyester".
    pub composition_field: String,
    /// Primary identifier used for match-tier ranking.
    pub code_field: String,
    /// Lot-code-prefix field, always equality / IN matched for index use.
    pub exact_match_field: String,
    /// Trailing-twelve-month sales figure, the final ranking key.
    pub sales_field: String,
    /// Weight field checked by the primary-mode null/zero drop.
    pub weight_field: String,
    /// Price-like fields: explicit sorts on these drop null/zero rows.
    pub price_fields: AHashSet<String>,
    /// Reserved query keys that never participate in field filtering.
    pub reserved: AHashSet<String>,
    /// Fields returned when the caller does not request a projection.
    pub default_return_fields: Vec<String>,
    /// Grouping of fields for the detail view.
    pub detail_categories: Vec<(&'static str, Vec<String>)>,
    /// Ordered (leading prefix, tier) pairs; first match wins.
    pub series_tiers: Vec<(String, u8)>,
    /// Tier for codes matching no prefix.
    pub fallback_tier: u8,
    /// Primary-mode allow-list on the lot-code-prefix field.
    pub primary_code_starts: Vec<String>,
    /// Primary-mode allow-list on the stocking-status field.
    pub primary_type_notes: Vec<String>,
}

fn string_set(items: &[&str]) -> AHashSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn string_vec(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for FieldCatalog {
    fn default() -> Self {
        Self {
            numeric: string_set(&[
                "weight", "width", "price", "taxkgprice", "taxmprice", "fewprice",
                "emptyqty", "papertubeqty", "stock_qty", "sale_num_year",
            ]),
            strict_text: string_set(&[
                "code", "name", "fabric_structure_two", "fabric_erp", "inelem",
                "code_start", "devproid", "customizable_grade",
                "spring_color_fastness", "light_fastness", "dry_rubbing_fastness",
                "image_urls", "report_urls", "type_notes",
                "release_date", "sale_num_year", "series",
                "unpilling", "ldensity", "hdensity", "propinnum", "dnumber",
                "color_name", "applicable_crowd",
            ]),
            soft: string_set(&["fabe", "introduce", "production_process"]),
            composition_field: "elem".to_string(),
            code_field: "code".to_string(),
            exact_match_field: "code_start".to_string(),
            sales_field: "sale_num_year".to_string(),
            weight_field: "weight".to_string(),
            price_fields: string_set(&[
                "price", "taxkgprice", "taxmprice", "fewprice",
                "mprice", "yprice", "kgprice", "taxyprice",
                "gkgprice", "gtaxkgprice",
            ]),
            reserved: string_set(&["title", "limit", "sort", "sort_by", "fields", "mode"]),
            default_return_fields: string_vec(&[
                "code", "name", "weight", "width", "taxkgprice", "price", "taxmprice",
                "fewprice", "elem", "inelem", "fabric_structure_two", "fabric_erp",
                "emptyqty", "papertubeqty", "type_notes", "image_urls", "report_urls",
                "code_start", "customizable_grade", "series", "release_date",
                "sale_num_year", "production_process",
            ]),
            detail_categories: vec![
                ("basic", string_vec(&[
                    "code", "name", "ename", "series", "release_date", "makedate_year",
                    "makedate_month", "devproid", "image_urls", "report_urls", "code_start",
                ])),
                ("specs", string_vec(&[
                    "elem", "inelem", "yarncount", "dnumber", "weight", "width",
                    "ldensity", "hdensity", "propinnum", "fiber_type", "yarn_type",
                    "spinntype", "glosscommid", "fabric_structure_two", "fabric_erp",
                    "fabric_structure", "className", "has_rib",
                ])),
                ("quality", string_vec(&[
                    "twist", "swzoomin", "shzoomin", "sph", "unpilling", "whitefiber",
                    "wetrubfast", "dry_rubbing_fastness", "spring_color_fastness",
                    "light_fastness", "quality_level", "customizable_grade", "fun_level",
                    "colorfastnotes",
                ])),
                ("process", string_vec(&[
                    "production_process", "devtype", "dyemethod", "dyeing_process",
                    "category", "foreignname",
                ])),
                ("price", string_vec(&[
                    "price", "unitid", "fewprice", "fewunitid", "fewunitrate", "mprice",
                    "yprice", "kgprice", "taxmprice", "taxyprice", "taxkgprice",
                    "unitqty", "emptyqty", "papertubeqty", "unitrate",
                ])),
                ("operation", string_vec(&[
                    "type_notes", "stock_qty", "sale_num_year", "season_new", "fabe",
                    "notice", "ennotice", "introduce", "eintroduce", "slogan",
                ])),
            ],
            // TODO: the second "9" entry is shadowed by the first; confirm
            // which tier the 9-series is actually meant to land in.
            series_tiers: vec![
                ("6".to_string(), 1),
                ("9".to_string(), 2),
                ("9".to_string(), 3),
                ("3".to_string(), 4),
                ("2".to_string(), 5),
            ],
            fallback_tier: 6,
            primary_code_starts: string_vec(&["6", "9", "3"]),
            primary_type_notes: string_vec(&["现货", "订单", "订单主推"]),
        }
    }
}

impl FieldCatalog {
    #[inline]
    pub fn is_numeric(&self, field: &str) -> bool {
        self.numeric.contains(field)
    }

    #[inline]
    pub fn is_strict_text(&self, field: &str) -> bool {
        self.strict_text.contains(field)
    }

    #[inline]
    pub fn is_soft(&self, field: &str) -> bool {
        self.soft.contains(field)
    }

    #[inline]
    pub fn is_reserved(&self, field: &str) -> bool {
        self.reserved.contains(field)
    }

    #[inline]
    pub fn is_composition(&self, field: &str) -> bool {
        field == self.composition_field
    }

    /// True for any field the engine knows how to filter or score on.
    pub fn is_classified(&self, field: &str) -> bool {
        self.is_numeric(field) || self.is_strict_text(field) || self.is_soft(field)
    }

    /// Business series tier from the identifier's leading characters.
    /// The tier table is ordered; the first matching prefix wins.
    pub fn series_tier(&self, code: &str) -> u8 {
        for (prefix, tier) in &self.series_tiers {
            if code.starts_with(prefix.as_str()) {
                return *tier;
            }
        }
        self.fallback_tier
    }

    /// Fields ranking and refinement always need, whether requested or not.
    pub fn mandatory_fields(&self) -> Vec<String> {
        vec![
            self.code_field.clone(),
            self.sales_field.clone(),
            self.composition_field.clone(),
            self.weight_field.clone(),
        ]
    }

    /// Every field name the catalog knows about, for detail projection.
    pub fn all_detail_fields(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for (_, fields) in &self.detail_categories {
            for f in fields {
                if !out.contains(f) {
                    out.push(f.clone());
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_tier_first_match_wins() {
        let catalog = FieldCatalog::default();
        assert_eq!(catalog.series_tier("6228A"), 1);
        assert_eq!(catalog.series_tier("9155"), 2);
        assert_eq!(catalog.series_tier("3001"), 4);
        assert_eq!(catalog.series_tier("2740"), 5);
        assert_eq!(catalog.series_tier("X100"), 6);
        assert_eq!(catalog.series_tier(""), 6);
    }

    #[test]
    fn reserved_keys_are_not_classified() {
        let catalog = FieldCatalog::default();
        for key in ["title", "limit", "sort", "sort_by", "fields", "mode"] {
            assert!(catalog.is_reserved(key));
            assert!(!catalog.is_classified(key));
        }
    }

    #[test]
    fn detail_fields_are_deduplicated() {
        let catalog = FieldCatalog::default();
        let all = catalog.all_detail_fields();
        let mut seen = AHashSet::new();
        for f in &all {
            assert!(seen.insert(f.clone()), "duplicate detail field {f}");
        }
        assert!(all.contains(&"elem".to_string()));
        assert!(all.contains(&"taxkgprice".to_string()));
    }
}
