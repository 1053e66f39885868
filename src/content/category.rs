//! Display names for blog categories.
//!
//! Post files use both the English ids and some older Portuguese ones
//! (`licencas`, `societario`, `tutorial`); both spellings map to the same
//! label.

/// Id of the pseudo-category that lists every post.
pub const ALL_CATEGORY: &str = "all";

/// Localized name of a category id. Unknown ids and locales pass through.
pub fn category_name<'a>(id: &'a str, locale: &str) -> &'a str {
    let name = match (locale, id) {
        ("pt", "all") => "Todas as Matérias",
        ("pt", "compliance") => "Compliance",
        ("pt", "legislation") => "Legislação",
        ("pt", "licenses" | "licencas") => "Licenças",
        ("pt", "corporate" | "societario") => "Societário",
        ("pt", "tutorials" | "tutorial") => "Tutoriais",
        ("pt", "market") => "Mercado",

        ("en", "all") => "All Articles",
        ("en", "compliance") => "Compliance",
        ("en", "legislation") => "Legislation",
        ("en", "licenses" | "licencas") => "Licenses",
        ("en", "corporate" | "societario") => "Corporate",
        ("en", "tutorials" | "tutorial") => "Tutorials",
        ("en", "market") => "Market",

        ("es", "all") => "Todos los Artículos",
        ("es", "compliance") => "Compliance",
        ("es", "legislation") => "Legislación",
        ("es", "licenses" | "licencas") => "Licencias",
        ("es", "corporate" | "societario") => "Corporativo",
        ("es", "tutorials" | "tutorial") => "Tutoriales",
        ("es", "market") => "Mercado",

        _ => return id,
    };
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn historical_spellings_share_labels() {
        assert_eq!(category_name("licencas", "pt"), category_name("licenses", "pt"));
        assert_eq!(category_name("societario", "en"), "Corporate");
        assert_eq!(category_name("tutorial", "es"), "Tutoriales");
    }

    #[test]
    fn all_category_is_localized() {
        assert_eq!(category_name(ALL_CATEGORY, "pt"), "Todas as Matérias");
        assert_eq!(category_name(ALL_CATEGORY, "en"), "All Articles");
    }

    #[test]
    fn unknown_passes_through() {
        assert_eq!(category_name("taxes", "pt"), "taxes");
        assert_eq!(category_name("market", "fr"), "market");
    }
}
