//! Catalog cards: the summary records shown in listings.

use serde::{Deserialize, Serialize};

/// Access tier of a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Public health system tier (tier-A)
    #[serde(rename = "SUS")]
    Sus,

    /// General health tier (tier-B, the default)
    #[serde(rename = "Saude")]
    Saude,
}

impl Default for Role {
    fn default() -> Self {
        Self::Saude
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Sus => write!(f, "SUS"),
            Role::Saude => write!(f, "Saude"),
        }
    }
}

/// A single card in the catalog index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Numeric identifier, assigned as max existing + 1
    pub id: u64,

    /// Card title
    pub title: String,

    /// Image path shown on the card
    pub image: String,

    /// Slug of the content document this card points to
    pub slug: String,

    /// Short description
    pub description: String,

    /// Access tier
    pub role: Role,
}

/// Card fields submitted by an author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardData {
    pub title: String,

    /// Optional in update bodies, where the slug comes from the target
    #[serde(default)]
    pub slug: String,

    pub image: String,
    pub description: String,
    pub role: Role,
}

impl CardData {
    /// Check every field, collecting all problems
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();

        if self.title.trim().is_empty() {
            problems.push("title: must not be empty".to_string());
        }
        if let Err(problem) = validate_slug(&self.slug) {
            problems.push(format!("slug: {}", problem));
        }
        if self.image.trim().is_empty() {
            problems.push("image: must not be empty".to_string());
        }
        if self.description.trim().is_empty() {
            problems.push("description: must not be empty".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }

    /// Build a catalog entry with the given id
    pub fn into_entry(self, id: u64) -> CatalogEntry {
        CatalogEntry {
            id,
            title: self.title,
            image: self.image,
            slug: self.slug,
            description: self.description,
            role: self.role,
        }
    }
}

impl CatalogEntry {
    /// Overwrite the editable fields from submitted card data (id and slug are kept)
    pub fn apply(&mut self, card: &CardData) {
        self.title = card.title.clone();
        self.image = card.image.clone();
        self.description = card.description.clone();
        self.role = card.role;
    }
}

/// A slug doubles as a file stem, so it must be a single plain path component
pub fn validate_slug(slug: &str) -> Result<(), String> {
    if slug.is_empty() {
        return Err("must not be empty".to_string());
    }
    if slug.starts_with('.') {
        return Err(format!("'{}' must not start with '.'", slug));
    }
    if slug.contains(['/', '\\']) {
        return Err(format!("'{}' must not contain path separators", slug));
    }
    if slug.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(format!("'{}' must not contain whitespace", slug));
    }
    Ok(())
}
