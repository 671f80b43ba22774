//! Command-line interface for portal.
//!
//! Provides commands for syncing the catalog, checking status, listing and
//! inspecting courses, and authoring (create, update, delete).

use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;

use crate::config;
use crate::core::{CourseSubmission, CourseUpdate, Portal};
use crate::domain::{CatalogEntry, Role};
use crate::error::ErrorPayload;
use crate::library::CatalogIndex;

/// portal - Tutorial catalog sync and authoring
#[derive(Parser, Debug)]
#[command(name = "portal")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create cards for content documents that have none
    Sync {
        /// Print the report (or error payload) as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show which documents lack a card
    Status {
        /// Print the report (or error payload) as JSON
        #[arg(long)]
        json: bool,
    },

    /// List catalog cards
    List {
        /// Filter by role
        #[arg(short, long, value_enum)]
        role: Option<RoleArg>,

        /// Only cards matching this text (title, slug, description)
        #[arg(short, long)]
        search: Option<String>,

        /// Maximum number of cards to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Show a course card and its document
    Show {
        /// Course slug
        slug: String,

        /// Print the full document JSON
        #[arg(short, long)]
        full: bool,

        /// Write a placeholder document if none exists
        #[arg(long)]
        scaffold: bool,
    },

    /// Create a course from {"cardData": ..., "tutorialContent": ...}
    Create {
        /// Input file (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Update a course from {"cardData"?: ..., "tutorialContent"?: ...}
    Update {
        /// Course slug
        slug: String,

        /// Input file (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Delete a course card and its document
    Delete {
        /// Course slug
        slug: String,

        /// Remove only the card (the next sync recreates it)
        #[arg(long)]
        keep_document: bool,
    },

    /// Show resolved configuration (debug)
    Config,
}

/// Role for CLI (maps to Role)
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RoleArg {
    /// Public health system tier
    Sus,

    /// General health tier
    Saude,
}

impl From<RoleArg> for Role {
    fn from(r: RoleArg) -> Self {
        match r {
            RoleArg::Sus => Role::Sus,
            RoleArg::Saude => Role::Saude,
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        if let Commands::Config = self.command {
            return show_config();
        }

        let portal = Portal::from_config(config::config()?);

        match self.command {
            Commands::Sync { json } => sync(&portal, json).await,
            Commands::Status { json } => status(&portal, json).await,
            Commands::List {
                role,
                search,
                limit,
            } => list(&portal, role, search, limit).await,
            Commands::Show {
                slug,
                full,
                scaffold,
            } => show(&portal, &slug, full, scaffold).await,
            Commands::Create { input } => create(&portal, input).await,
            Commands::Update { slug, input } => update(&portal, &slug, input).await,
            Commands::Delete {
                slug,
                keep_document,
            } => delete(&portal, &slug, !keep_document).await,
            Commands::Config => show_config(),
        }
    }
}

/// Print a structured error payload and exit non-zero
fn fail_json(summary: &str, err: anyhow::Error) -> Result<()> {
    let payload = ErrorPayload::from_anyhow(summary, &err);
    println!("{}", serde_json::to_string_pretty(&payload)?);
    std::process::exit(1);
}

/// Reconcile the catalog with the content directory
async fn sync(portal: &Portal, json: bool) -> Result<()> {
    let report = match portal.reconciler().reconcile().await {
        Ok(report) => report,
        Err(e) if json => return fail_json("Failed to sync catalog", e.into()),
        Err(e) => return Err(anyhow::Error::new(e).context("Failed to sync catalog")),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "Sync complete: {} new card(s), {} total",
        report.new_entries_created, report.total_entries
    );
    if report.new_entries_created > 0 {
        println!();
        let new_cards = &report.entries[report.entries.len() - report.new_entries_created..];
        print_table(new_cards.iter());
    }

    Ok(())
}

/// Report documents without cards
async fn status(portal: &Portal, json: bool) -> Result<()> {
    let report = match portal.status_reporter().status().await {
        Ok(report) => report,
        Err(e) if json => return fail_json("Failed to check status", e.into()),
        Err(e) => return Err(anyhow::Error::new(e).context("Failed to check status")),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Documents:     {}", report.documents_found);
    println!("Catalog cards: {}", report.catalog_entries);
    println!("Checked at:    {}", report.checked_at.to_rfc3339());

    if report.is_in_sync() {
        println!("\nEvery document has a card.");
    } else {
        println!("\nDocuments without a card ({}):", report.unmatched.len());
        for slug in &report.unmatched {
            println!("  {}", slug);
        }
        println!("\nRun 'portal sync' to create them.");
    }

    if !report.orphaned.is_empty() {
        println!("\nCards without a document ({}):", report.orphaned.len());
        for slug in &report.orphaned {
            println!("  {}", slug);
        }
    }

    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

fn print_table<'a>(entries: impl Iterator<Item = &'a CatalogEntry>) {
    println!("{:<5} {:<24} {:<7} {:<40}", "ID", "SLUG", "ROLE", "TITLE");
    println!("{}", "-".repeat(80));

    for entry in entries {
        println!(
            "{:<5} {:<24} {:<7} {:<40}",
            entry.id,
            truncate(&entry.slug, 24),
            entry.role.to_string(),
            truncate(&entry.title, 40)
        );
    }
}

/// Cards matching an optional role and search text, in catalog order
fn select_entries<'a>(
    index: &'a CatalogIndex,
    role: Option<RoleArg>,
    search: Option<&str>,
) -> Vec<&'a CatalogEntry> {
    let mut entries = match role {
        Some(role) => index.filter_by_role(role.into()),
        None => index.entries.iter().collect(),
    };
    if let Some(query) = search {
        let matches = index.search(query);
        entries.retain(|e| matches.iter().any(|m| std::ptr::eq(*m, *e)));
    }
    entries
}

/// List catalog cards
async fn list(
    portal: &Portal,
    role: Option<RoleArg>,
    search: Option<String>,
    limit: usize,
) -> Result<()> {
    let index = portal.authoring().list_entries().await;

    if index.is_empty() {
        println!("Catalog is empty. Use 'portal sync' or 'portal create' to add courses.");
        return Ok(());
    }

    let entries = select_entries(&index, role, search.as_deref());

    print_table(entries.iter().take(limit).copied());
    println!("\nShowing {} of {} cards", entries.len().min(limit), index.len());

    Ok(())
}

/// Show a course card and document
async fn show(portal: &Portal, slug: &str, full: bool, scaffold: bool) -> Result<()> {
    let authoring = portal.authoring();

    let document = if scaffold {
        let (doc, created) = authoring
            .scaffold_document(slug)
            .await
            .with_context(|| format!("Failed to scaffold document: {}", slug))?;
        if created {
            eprintln!("Created placeholder document for {}", slug);
        }
        Some(doc)
    } else {
        match authoring.read_document(slug).await {
            Ok(doc) => Some(doc),
            Err(crate::error::PortalError::NotFound(_)) => None,
            Err(e) => return Err(anyhow::Error::new(e).context("Failed to read document")),
        }
    };
    let entry = authoring.get_entry(slug).await;

    if entry.is_none() && document.is_none() {
        anyhow::bail!("Course not found: {}", slug);
    }

    match &entry {
        Some(entry) => {
            println!("Card");
            println!("  ID:          {}", entry.id);
            println!("  Title:       {}", entry.title);
            println!("  Role:        {}", entry.role);
            println!("  Image:       {}", entry.image);
            println!("  Description: {}", entry.description);
        }
        None => println!("Card: (none - run 'portal sync')"),
    }

    match &document {
        Some(doc) => {
            println!("Document");
            println!("  Title:    {}", doc.title);
            println!("  Chapters: {}", doc.chapters.len());
            println!("  Blocks:   {}", doc.block_count());
            for chapter in &doc.chapters {
                println!("    - {} ({})", chapter.title, chapter.id);
            }
            if full {
                println!("\n{}", serde_json::to_string_pretty(doc)?);
            }
        }
        None => println!("Document: (missing)"),
    }

    Ok(())
}

/// Read JSON input from a file or stdin
fn read_input<T: DeserializeOwned>(input: Option<PathBuf>) -> Result<T> {
    let raw = if let Some(path) = input {
        std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read input file: {}", path.display()))?
    } else {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        buffer
    };

    if raw.trim().is_empty() {
        anyhow::bail!("No input provided. Use --input <file> or pipe to stdin");
    }

    serde_json::from_str(&raw).context("Failed to parse input JSON")
}

/// Create a course
async fn create(portal: &Portal, input: Option<PathBuf>) -> Result<()> {
    let submission: CourseSubmission = read_input(input)?;
    let entry = portal
        .authoring()
        .create_course(submission)
        .await
        .context("Failed to create course")?;

    eprintln!("Course created: {} (id {})", entry.title, entry.id);
    println!("{}", serde_json::to_string_pretty(&entry)?);
    Ok(())
}

/// Update a course
async fn update(portal: &Portal, slug: &str, input: Option<PathBuf>) -> Result<()> {
    let update: CourseUpdate = read_input(input)?;
    let entry = portal
        .authoring()
        .update_course(slug, update)
        .await
        .with_context(|| format!("Failed to update course: {}", slug))?;

    match entry {
        Some(entry) => println!("{}", serde_json::to_string_pretty(&entry)?),
        None => eprintln!("Document updated; {} has no card yet (run 'portal sync')", slug),
    }
    Ok(())
}

/// Delete a course
async fn delete(portal: &Portal, slug: &str, remove_document: bool) -> Result<()> {
    let outcome = portal
        .authoring()
        .delete_course(slug, remove_document)
        .await
        .with_context(|| format!("Failed to delete course: {}", slug))?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

/// Show the resolved configuration (for debugging)
fn show_config() -> Result<()> {
    let cfg = config::config()?;

    println!("Portal Configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home:     {}", cfg.home.display());
    println!("  Content:  {}", cfg.content_dir.display());
    println!("  Catalog:  {}", cfg.catalog_path.display());
    println!();
    println!("Sync limits:");
    println!("  Timeout:           {}s", cfg.limits.timeout_seconds);
    println!("  Max document size: {} bytes", cfg.limits.max_document_bytes);
    println!();
    println!("Derivation:");
    println!("  SUS keywords:      {}", cfg.rules.tier_a_keywords.join(", "));
    println!("  Saude keywords:    {}", cfg.rules.tier_b_keywords.join(", "));
    println!("  Image candidates:  {}", cfg.rules.image_candidates.join(", "));
    println!("  Description chars: {}", cfg.rules.description_chars);

    Ok(())
}
