//! Content documents: the full body of a tutorial.
//!
//! Documents are stored one per file and keyed by slug. The JSON keys follow
//! the portal's existing data files (`titulo`, `capitulos`, `conteudo`, `tipo`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A full tutorial document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentDocument {
    /// Slug identifying the document (also its file stem)
    pub id: String,

    /// Human-readable title
    #[serde(rename = "titulo")]
    pub title: String,

    /// Ordered chapters
    #[serde(rename = "capitulos", default)]
    pub chapters: Vec<Chapter>,

    /// Keys this model does not name, kept as written
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A chapter within a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,

    #[serde(rename = "titulo")]
    pub title: String,

    #[serde(rename = "conteudo", default)]
    pub blocks: Vec<ContentBlock>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single block of chapter content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "tipo")]
    pub kind: BlockKind,

    #[serde(rename = "texto", default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Kind of content block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    /// Chapter heading
    #[serde(rename = "capitulo")]
    ChapterHeading,

    /// Subheading
    #[serde(rename = "subtitulo")]
    Subheading,

    /// Body paragraph
    #[serde(rename = "paragrafo")]
    Paragraph,

    /// Embedded image (`src`/`alt`)
    #[serde(rename = "imagem")]
    Image,
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockKind::ChapterHeading => write!(f, "capitulo"),
            BlockKind::Subheading => write!(f, "subtitulo"),
            BlockKind::Paragraph => write!(f, "paragrafo"),
            BlockKind::Image => write!(f, "imagem"),
        }
    }
}

impl ContentBlock {
    /// Create a text-bearing block
    pub fn text(kind: BlockKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: Some(text.into()),
            src: None,
            alt: None,
            extra: Map::new(),
        }
    }

    /// Create an image block
    pub fn image(src: impl Into<String>, alt: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Image,
            text: None,
            src: Some(src.into()),
            alt: Some(alt.into()),
            extra: Map::new(),
        }
    }
}

impl ContentDocument {
    /// Create an empty document
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            chapters: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Append a chapter
    pub fn with_chapter(mut self, chapter: Chapter) -> Self {
        self.chapters.push(chapter);
        self
    }

    /// Placeholder written when an author opens a document that does not exist yet
    pub fn placeholder(slug: &str) -> Self {
        let upper = slug.to_uppercase();
        Self::new(slug, format!("Tutorial {}", upper)).with_chapter(
            Chapter::new("capitulo-principal", "Conteúdo Principal")
                .with_block(ContentBlock::text(
                    BlockKind::ChapterHeading,
                    format!("Introdução ao {}", upper),
                ))
                .with_block(ContentBlock::text(
                    BlockKind::Paragraph,
                    "Este tutorial está sendo criado. Adicione o conteúdo através do editor.",
                )),
        )
    }

    /// Text of the first block of the first chapter, when it has any
    pub fn first_text(&self) -> Option<&str> {
        self.chapters
            .first()
            .and_then(|c| c.blocks.first())
            .and_then(|b| b.text.as_deref())
            .filter(|t| !t.is_empty())
    }

    /// Total number of blocks across chapters
    pub fn block_count(&self) -> usize {
        self.chapters.iter().map(|c| c.blocks.len()).sum()
    }
}

impl Chapter {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            blocks: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn with_block(mut self, block: ContentBlock) -> Self {
        self.blocks.push(block);
        self
    }
}
