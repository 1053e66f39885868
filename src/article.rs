//! Article body rendering.
//!
//! Post bodies are stored as structured JSON rather than HTML:
//!
//! ```json
//! {
//!   "introduction": "…",
//!   "sections": [{ "heading": "…", "content": "…", "list": ["…"], "table": { "headers": [], "rows": [[]] } }],
//!   "tips": ["…"],
//!   "checklist": { "title": "…", "items": { "CNPJ": "…" } },
//!   "conclusion": "…",
//!   "cta": { "text": "…", "link": "/contato.html", "button": "…" }
//! }
//! ```
//!
//! Text fields are authored HTML and are inserted unescaped; attribute values
//! are escaped by Maud.

use maud::{Markup, PreEscaped, html};
use serde_json::{Map, Value};

/// Heading of the tips block.
fn tips_heading(locale: &str) -> &'static str {
    match locale {
        "en" => "Important Tips:",
        "es" => "Consejos Importantes:",
        _ => "Dicas Importantes:",
    }
}

/// Text form of a scalar field; `None` for absent, empty or non-scalar values.
fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("true".into()),
        _ => None,
    }
}

fn items(value: Option<&Value>) -> &[Value] {
    value.and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[])
}

fn cell(value: &Value) -> String {
    text(Some(value)).unwrap_or_default()
}

/// HTML for a structured post body. Anything but a mapping renders as
/// nothing.
pub fn render_article_body(content: &Value, locale: &str) -> String {
    let Some(body) = content.as_object() else {
        return String::new();
    };
    let tips = items(body.get("tips"));

    html! {
        @if let Some(intro) = text(body.get("introduction")) {
            div.article-intro { p { (PreEscaped(intro)) } }
        }
        @for section in items(body.get("sections")) {
            @if let Some(section) = section.as_object() {
                (render_section(section))
            }
        }
        @if !tips.is_empty() {
            div.tips-section {
                h3 { (tips_heading(locale)) }
                div.tips-grid {
                    @for tip in tips {
                        div.tip-card {
                            i.fas.fa-lightbulb {}
                            p { (PreEscaped(cell(tip))) }
                        }
                    }
                }
            }
        }
        @if let Some(checklist) = body.get("checklist").and_then(Value::as_object) {
            (render_checklist(checklist))
        }
        @if let Some(conclusion) = text(body.get("conclusion")) {
            div.article-conclusion { p { (PreEscaped(conclusion)) } }
        }
        @if let Some(cta) = body.get("cta").and_then(Value::as_object) {
            div.article-cta {
                p { (PreEscaped(text(cta.get("text")).unwrap_or_default())) }
                a.btn.btn-primary href=(text(cta.get("link")).unwrap_or_default()) {
                    (PreEscaped(text(cta.get("button")).unwrap_or_default()))
                }
            }
        }
    }
    .into_string()
}

fn render_section(section: &Map<String, Value>) -> Markup {
    let heading = text(section.get("heading")).or_else(|| text(section.get("title")));
    let paragraph = text(section.get("content")).or_else(|| text(section.get("text")));
    let list = items(section.get("list"));
    let checklist = items(section.get("checklist"));
    let table = section.get("table").and_then(Value::as_object);

    html! {
        section.article-section {
            @if let Some(heading) = heading {
                h2 { (PreEscaped(heading)) }
            }
            @if let Some(paragraph) = paragraph {
                p { (PreEscaped(paragraph)) }
            }
            @if !list.is_empty() {
                ul {
                    @for item in list {
                        li { (PreEscaped(cell(item))) }
                    }
                }
            }
            @if !checklist.is_empty() {
                div.checklist {
                    @for item in checklist {
                        div.checklist-item {
                            i.fas.fa-check-circle {}
                            span { (PreEscaped(cell(item))) }
                        }
                    }
                }
            }
            @if let Some(highlight) = text(section.get("highlight")) {
                div.highlight-box { p { (PreEscaped(highlight)) } }
            }
            @if let Some(highlights) = section.get("highlights").and_then(Value::as_object) {
                div.highlights {
                    @for (key, value) in highlights {
                        div.highlight-item {
                            strong { (PreEscaped(key)) ":" } " " (PreEscaped(cell(value)))
                        }
                    }
                }
            }
            @if let Some(table) = table {
                div.table-wrapper {
                    table {
                        @if let Some(headers) = table.get("headers").and_then(Value::as_array) {
                            thead { tr {
                                @for header in headers { th { (PreEscaped(cell(header))) } }
                            } }
                        }
                        @if let Some(rows) = table.get("rows").and_then(Value::as_array) {
                            tbody {
                                @for row in rows {
                                    tr {
                                        @for value in items(Some(row)) {
                                            td { (PreEscaped(cell(value))) }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// `{ "title", "items": {k: v} }`, or the mapping itself when `items` is
/// absent. Sequence items render without a label.
fn render_checklist(checklist: &Map<String, Value>) -> Markup {
    let title = text(checklist.get("title")).unwrap_or_else(|| "Checklist".into());
    let entries = checklist.get("items").unwrap_or(&Value::Null);

    html! {
        div.checklist-section {
            h3 { (PreEscaped(title)) }
            div.checklist {
                @match entries {
                    Value::Array(list) => {
                        @for item in list {
                            div.checklist-item {
                                i.fas.fa-check-circle {}
                                span { (PreEscaped(cell(item))) }
                            }
                        }
                    }
                    Value::Object(map) => {
                        (checklist_entries(map))
                    }
                    _ => {
                        (checklist_entries(checklist))
                    }
                }
            }
        }
    }
}

fn checklist_entries(map: &Map<String, Value>) -> Markup {
    html! {
        @for (key, value) in map {
            @if key != "title" {
                div.checklist-item {
                    i.fas.fa-check-circle {}
                    strong { (PreEscaped(key)) ":" } " " (PreEscaped(cell(value)))
                }
            }
        }
    }
}

/// `#tag` chips for an article header.
pub fn render_tags(tags: &[String]) -> String {
    html! {
        @for tag in tags {
            span.tag { "#" (tag) }
        }
    }
    .into_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_mapping_body_is_empty() {
        assert_eq!(render_article_body(&Value::Null, "pt"), "");
        assert_eq!(render_article_body(&json!("x"), "pt"), "");
    }

    #[test]
    fn introduction_and_conclusion_keep_authored_html() {
        let html = render_article_body(
            &json!({"introduction": "A <strong>LGPD</strong>", "conclusion": "Fim"}),
            "pt",
        );
        assert_eq!(
            html,
            r#"<div class="article-intro"><p>A <strong>LGPD</strong></p></div><div class="article-conclusion"><p>Fim</p></div>"#
        );
    }

    #[test]
    fn section_blocks_render_in_order() {
        let html = render_article_body(
            &json!({"sections": [{
                "title": "Passos",
                "text": "Siga:",
                "list": ["um", "dois"],
                "highlight": "Atenção"
            }]}),
            "pt",
        );
        assert_eq!(
            html,
            concat!(
                r#"<section class="article-section"><h2>Passos</h2><p>Siga:</p>"#,
                "<ul><li>um</li><li>dois</li></ul>",
                r#"<div class="highlight-box"><p>Atenção</p></div></section>"#
            )
        );
    }

    #[test]
    fn heading_preferred_over_title() {
        let html = render_article_body(&json!({"sections": [{"heading": "H", "title": "T"}]}), "pt");
        assert!(html.contains("<h2>H</h2>"));
        assert!(!html.contains("<h2>T</h2>"));
    }

    #[test]
    fn table_renders_headers_and_numeric_cells() {
        let html = render_article_body(
            &json!({"sections": [{"table": {"headers": ["Taxa", "Valor"], "rows": [["ISS", 5]]}}]}),
            "pt",
        );
        assert!(html.contains("<thead><tr><th>Taxa</th><th>Valor</th></tr></thead>"));
        assert!(html.contains("<tbody><tr><td>ISS</td><td>5</td></tr></tbody>"));
    }

    #[test]
    fn highlights_map_renders_key_value_pairs() {
        let html = render_article_body(&json!({"sections": [{"highlights": {"Prazo": "30 dias"}}]}), "pt");
        assert!(html.contains(r#"<div class="highlight-item"><strong>Prazo:</strong> 30 dias</div>"#));
    }

    #[test]
    fn tips_heading_is_localized() {
        let html = render_article_body(&json!({"tips": ["Leia"]}), "en");
        assert!(html.contains("<h3>Important Tips:</h3>"));
        assert!(html.contains(r#"<div class="tip-card"><i class="fas fa-lightbulb"></i><p>Leia</p></div>"#));
    }

    #[test]
    fn checklist_with_items_and_default_title() {
        let with_items = render_article_body(
            &json!({"checklist": {"title": "Documentos", "items": {"CNPJ": "ativo"}}}),
            "pt",
        );
        assert!(with_items.contains("<h3>Documentos</h3>"));
        assert!(with_items.contains("<strong>CNPJ:</strong> ativo"));

        let bare = render_article_body(&json!({"checklist": {"Alvará": "válido"}}), "pt");
        assert!(bare.contains("<h3>Checklist</h3>"));
        assert!(bare.contains("<strong>Alvará:</strong> válido"));
    }

    #[test]
    fn checklist_title_is_not_an_entry() {
        let html = render_article_body(&json!({"checklist": {"title": "T", "a": "b"}}), "pt");
        assert!(!html.contains("<strong>title:</strong>"));
    }

    #[test]
    fn cta_links_to_target() {
        let html = render_article_body(
            &json!({"cta": {"text": "Fale conosco", "link": "/contato.html", "button": "Contato"}}),
            "pt",
        );
        assert_eq!(
            html,
            r#"<div class="article-cta"><p>Fale conosco</p><a class="btn btn-primary" href="/contato.html">Contato</a></div>"#
        );
    }

    #[test]
    fn tags_render_as_chips() {
        assert_eq!(
            render_tags(&["lgpd".into(), "a&b".into()]),
            r#"<span class="tag">#lgpd</span><span class="tag">#a&amp;b</span>"#
        );
        assert_eq!(render_tags(&[]), "");
    }
}
