//! Card field synthesis from document content.
//!
//! Pure functions of a [`ContentDocument`] plus [`DerivationRules`]; the
//! reconciler only decides *when* to call them.

use serde::{Deserialize, Serialize};

use crate::domain::{CatalogEntry, ContentDocument, Role};

/// Image used when no candidate pattern is configured
pub const FALLBACK_IMAGE: &str = "/assets/images/placeholder-curso.png";

/// Tunables for deriving card fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivationRules {
    /// Keywords that classify a document as `SUS` (checked first)
    #[serde(default = "default_tier_a_keywords")]
    pub tier_a_keywords: Vec<String>,

    /// Keywords that classify a document as `Saude`
    #[serde(default = "default_tier_b_keywords")]
    pub tier_b_keywords: Vec<String>,

    /// Image path patterns in preference order; `{slug}` is substituted
    #[serde(default = "default_image_candidates")]
    pub image_candidates: Vec<String>,

    /// Maximum description length in characters before the ellipsis
    #[serde(default = "default_description_chars")]
    pub description_chars: usize,

    /// Description used when the document has no text; `{title}` is substituted
    #[serde(default = "default_fallback_description")]
    pub fallback_description: String,
}

fn default_tier_a_keywords() -> Vec<String> {
    ["sus", "sistema único", "saúde pública", "municipio"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_tier_b_keywords() -> Vec<String> {
    ["saude", "hospital", "clinica", "prontuario"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_image_candidates() -> Vec<String> {
    vec![
        "/assets/images/{slug}.png".to_string(),
        "/assets/images/{slug}.jpg".to_string(),
        FALLBACK_IMAGE.to_string(),
        "/assets/icons/default-course.svg".to_string(),
    ]
}

fn default_description_chars() -> usize {
    150
}

fn default_fallback_description() -> String {
    "Tutorial completo sobre {title}. Aprenda passo a passo todas as funcionalidades."
        .to_string()
}

impl Default for DerivationRules {
    fn default() -> Self {
        Self {
            tier_a_keywords: default_tier_a_keywords(),
            tier_b_keywords: default_tier_b_keywords(),
            image_candidates: default_image_candidates(),
            description_chars: default_description_chars(),
            fallback_description: default_fallback_description(),
        }
    }
}

/// Classify a document's access tier from its keywords.
///
/// Keywords are matched against the whole serialized document, including keys
/// the model does not name. Tier-A wins when both keyword sets match; no match
/// defaults to tier-B.
pub fn classify_role(doc: &ContentDocument, rules: &DerivationRules) -> Role {
    let title = doc.title.to_lowercase();
    let content = serde_json::to_string(doc)
        .unwrap_or_default()
        .to_lowercase();

    let matches = |keywords: &[String]| {
        keywords.iter().any(|k| {
            let k = k.to_lowercase();
            title.contains(&k) || content.contains(&k)
        })
    };

    if matches(&rules.tier_a_keywords) {
        Role::Sus
    } else if matches(&rules.tier_b_keywords) {
        Role::Saude
    } else {
        Role::Saude
    }
}

/// All candidate image paths for a slug, in preference order
pub fn image_candidates(slug: &str, rules: &DerivationRules) -> Vec<String> {
    rules
        .image_candidates
        .iter()
        .map(|pattern| pattern.replace("{slug}", slug))
        .collect()
}

/// Default image for a slug (first candidate, no existence check)
pub fn default_image(slug: &str, rules: &DerivationRules) -> String {
    image_candidates(slug, rules)
        .into_iter()
        .next()
        .unwrap_or_else(|| FALLBACK_IMAGE.to_string())
}

/// Short description from the text of the first chapter's leading block
pub fn describe(doc: &ContentDocument, rules: &DerivationRules) -> String {
    match doc.first_text() {
        Some(text) => {
            let truncated: String = text.chars().take(rules.description_chars).collect();
            let truncated = truncated.trim();
            if truncated.ends_with('.') {
                truncated.to_string()
            } else {
                format!("{}...", truncated)
            }
        }
        None => rules.fallback_description.replace("{title}", &doc.title),
    }
}

/// Synthesize a full catalog entry for a document lacking one
pub fn synthesize_entry(
    id: u64,
    slug: &str,
    doc: &ContentDocument,
    rules: &DerivationRules,
) -> CatalogEntry {
    CatalogEntry {
        id,
        title: doc.title.clone(),
        image: default_image(slug, rules),
        slug: slug.to_string(),
        description: describe(doc, rules),
        role: classify_role(doc, rules),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BlockKind, Chapter, ContentBlock};

    fn doc_with_text(title: &str, text: &str) -> ContentDocument {
        ContentDocument::new("doc", title).with_chapter(
            Chapter::new("c1", "Capítulo")
                .with_block(ContentBlock::text(BlockKind::Paragraph, text)),
        )
    }

    #[test]
    fn test_tier_a_wins_tie() {
        let rules = DerivationRules::default();
        let doc = doc_with_text("Atendimento", "Fluxo do sus dentro do hospital");
        assert_eq!(classify_role(&doc, &rules), Role::Sus);
    }

    #[test]
    fn test_tier_b_match() {
        let rules = DerivationRules::default();
        let doc = doc_with_text("Prontuario eletrônico", "Cadastro de pacientes");
        assert_eq!(classify_role(&doc, &rules), Role::Saude);
    }

    #[test]
    fn test_default_classification() {
        let rules = DerivationRules::default();
        let doc = doc_with_text("Planilhas", "Como abrir um arquivo");
        assert_eq!(classify_role(&doc, &rules), Role::Saude);
    }

    #[test]
    fn test_classification_is_case_insensitive() {
        let rules = DerivationRules::default();
        let doc = doc_with_text("Manual do SISTEMA ÚNICO", "texto");
        assert_eq!(classify_role(&doc, &rules), Role::Sus);
    }

    #[test]
    fn test_custom_keywords() {
        let rules = DerivationRules {
            tier_a_keywords: vec!["Regulação".to_string()],
            tier_b_keywords: vec![],
            ..Default::default()
        };
        let doc = doc_with_text("Central de regulação", "texto");
        assert_eq!(classify_role(&doc, &rules), Role::Sus);
    }

    #[test]
    fn test_keywords_in_unmodelled_fields_count() {
        let rules = DerivationRules::default();
        let doc: ContentDocument = serde_json::from_str(
            r#"{
                "id": "agenda",
                "titulo": "Agenda",
                "publico": "Rede municipal do SUS",
                "capitulos": [{
                    "id": "c1",
                    "titulo": "Início",
                    "conteudo": [{ "tipo": "paragrafo", "texto": "Marcar consultas." }]
                }]
            }"#,
        )
        .unwrap();
        assert_eq!(classify_role(&doc, &rules), Role::Sus);
    }

    #[test]
    fn test_description_uses_only_leading_block() {
        let rules = DerivationRules::default();
        let doc = ContentDocument::new("glpi", "GLPI").with_chapter(
            Chapter::new("c1", "Capítulo")
                .with_block(ContentBlock::image("/assets/images/tela.png", "Tela"))
                .with_block(ContentBlock::text(BlockKind::Paragraph, "Segundo bloco")),
        );
        assert_eq!(
            describe(&doc, &rules),
            "Tutorial completo sobre GLPI. Aprenda passo a passo todas as funcionalidades."
        );
    }

    #[test]
    fn test_default_image_is_first_candidate() {
        let rules = DerivationRules::default();
        assert_eq!(default_image("glpi", &rules), "/assets/images/glpi.png");
        assert_eq!(image_candidates("glpi", &rules).len(), 4);

        let empty = DerivationRules {
            image_candidates: vec![],
            ..Default::default()
        };
        assert_eq!(default_image("glpi", &empty), FALLBACK_IMAGE);
    }

    #[test]
    fn test_description_truncated_with_ellipsis() {
        let rules = DerivationRules::default();
        let doc = doc_with_text("T", &"a".repeat(300));
        let description = describe(&doc, &rules);

        assert_eq!(description, format!("{}...", "a".repeat(150)));
        assert_eq!(description.chars().count(), 153);
    }

    #[test]
    fn test_description_ending_in_period() {
        let rules = DerivationRules::default();
        let doc = doc_with_text("T", "Aprenda a abrir chamados.");
        assert_eq!(describe(&doc, &rules), "Aprenda a abrir chamados.");
    }

    #[test]
    fn test_description_trims_before_ellipsis() {
        let rules = DerivationRules {
            description_chars: 6,
            ..Default::default()
        };
        let doc = doc_with_text("T", "Abrir chamados");
        assert_eq!(describe(&doc, &rules), "Abrir...");
    }

    #[test]
    fn test_description_counts_characters_not_bytes() {
        let rules = DerivationRules {
            description_chars: 3,
            ..Default::default()
        };
        let doc = doc_with_text("T", "ção são");
        assert_eq!(describe(&doc, &rules), "ção...");
    }

    #[test]
    fn test_fallback_description() {
        let rules = DerivationRules::default();
        let doc = ContentDocument::new("glpi", "GLPI");
        assert_eq!(
            describe(&doc, &rules),
            "Tutorial completo sobre GLPI. Aprenda passo a passo todas as funcionalidades."
        );
    }

    #[test]
    fn test_synthesize_entry() {
        let rules = DerivationRules::default();
        let doc = doc_with_text("Recepção", "Atendimento no hospital.");
        let entry = synthesize_entry(4, "recepcao", &doc, &rules);

        assert_eq!(entry.id, 4);
        assert_eq!(entry.slug, "recepcao");
        assert_eq!(entry.title, "Recepção");
        assert_eq!(entry.image, "/assets/images/recepcao.png");
        assert_eq!(entry.description, "Atendimento no hospital.");
        assert_eq!(entry.role, Role::Saude);
    }
}
