//! Authoring and Status Integration Tests
//!
//! Runs the author workflow against the filesystem stores and checks that
//! status and reconciliation see the results.

use std::sync::Arc;

use portal::core::{CourseSubmission, CourseUpdate, Portal};
use portal::domain::{CardData, Chapter, ContentBlock, BlockKind, ContentDocument, Role};
use portal::library::{FsContentStore, JsonCatalogStore};
use portal::PortalError;
use tempfile::TempDir;

fn fs_portal(dir: &TempDir) -> Portal {
    let content = FsContentStore::new(dir.path().join("tutorials"));
    let catalog = JsonCatalogStore::new(dir.path().join("catalog.json"));
    Portal::new(Arc::new(content), Arc::new(catalog))
}

fn card(slug: &str, role: Role) -> CardData {
    CardData {
        title: format!("Curso {}", slug),
        slug: slug.to_string(),
        image: format!("/assets/images/{}.png", slug),
        description: "Curso cadastrado pelo editor.".to_string(),
        role,
    }
}

fn document(title: &str) -> ContentDocument {
    ContentDocument::new("ignored", title).with_chapter(
        Chapter::new("inicio", "Início")
            .with_block(ContentBlock::text(BlockKind::Paragraph, "Primeiros passos."))
            .with_block(ContentBlock::image("/assets/images/tela.png", "Tela inicial")),
    )
}

#[tokio::test]
async fn test_created_course_is_in_sync() {
    let dir = TempDir::new().unwrap();
    let portal = fs_portal(&dir);

    let entry = portal
        .authoring()
        .create_course(CourseSubmission {
            card: card("glpi", Role::Saude),
            content: document("GLPI"),
        })
        .await
        .unwrap();
    assert_eq!(entry.id, 1);

    // Document lands under its slug with the id bound to the slug
    let raw = std::fs::read_to_string(dir.path().join("tutorials").join("glpi.json")).unwrap();
    let on_disk: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(on_disk["id"], "glpi");
    assert_eq!(on_disk["capitulos"][0]["conteudo"][1]["tipo"], "imagem");

    let status = portal.status_reporter().status().await.unwrap();
    assert!(status.is_in_sync());
    assert_eq!(status.documents_found, 1);
    assert_eq!(status.catalog_entries, 1);

    let report = portal.reconciler().reconcile().await.unwrap();
    assert_eq!(report.new_entries_created, 0);
    assert_eq!(report.entries[0].description, "Curso cadastrado pelo editor.");
}

#[tokio::test]
async fn test_create_duplicate_slug_rejected() {
    let dir = TempDir::new().unwrap();
    let portal = fs_portal(&dir);
    let tutorials = dir.path().join("tutorials");
    std::fs::create_dir_all(&tutorials).unwrap();
    std::fs::write(
        tutorials.join("pec.json"),
        r#"{"id":"pec","titulo":"PEC","capitulos":[]}"#,
    )
    .unwrap();

    let err = portal
        .authoring()
        .create_course(CourseSubmission {
            card: card("pec", Role::Sus),
            content: document("PEC"),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, PortalError::AlreadyExists(ref slug) if slug == "pec"));
    assert!(!dir.path().join("catalog.json").exists());
}

#[tokio::test]
async fn test_update_then_status_and_delete() {
    let dir = TempDir::new().unwrap();
    let portal = fs_portal(&dir);
    let authoring = portal.authoring();

    authoring
        .create_course(CourseSubmission {
            card: card("esus", Role::Saude),
            content: document("e-SUS"),
        })
        .await
        .unwrap();

    let mut changed = card("", Role::Sus);
    changed.title = "e-SUS APS".to_string();
    let updated = authoring
        .update_course(
            "esus",
            CourseUpdate {
                card: Some(changed),
                content: None,
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.id, 1);
    assert_eq!(updated.slug, "esus");
    assert_eq!(updated.title, "e-SUS APS");
    assert_eq!(updated.role, Role::Sus);

    // Removing only the card leaves an unmatched document
    let outcome = authoring.delete_course("esus", false).await.unwrap();
    assert!(outcome.removed_entry);
    assert!(!outcome.removed_document);

    let status = portal.status_reporter().status().await.unwrap();
    assert_eq!(status.unmatched, vec!["esus".to_string()]);

    // The next sync brings the card back from the document
    let report = portal.reconciler().reconcile().await.unwrap();
    assert_eq!(report.new_entries_created, 1);
    assert_eq!(report.entries[0].slug, "esus");
    assert_eq!(report.entries[0].description, "Primeiros passos.");

    let outcome = authoring.delete_course("esus", true).await.unwrap();
    assert!(outcome.removed_entry && outcome.removed_document);

    let status = portal.status_reporter().status().await.unwrap();
    assert_eq!(status.documents_found, 0);
    assert_eq!(status.catalog_entries, 0);

    let err = authoring.delete_course("esus", true).await.unwrap_err();
    assert!(matches!(err, PortalError::NotFound(_)));
}

#[tokio::test]
async fn test_status_reports_orphaned_cards() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("catalog.json"),
        r#"[{"id":3,"title":"Antigo","image":"/assets/images/antigo.png","slug":"antigo","description":"d","role":"Saude"}]"#,
    )
    .unwrap();

    let portal = fs_portal(&dir);
    let status = portal.status_reporter().status().await.unwrap();

    assert_eq!(status.documents_found, 0);
    assert_eq!(status.catalog_entries, 1);
    assert!(status.unmatched.is_empty());
    assert_eq!(status.orphaned, vec!["antigo".to_string()]);
    assert!(status.is_in_sync());
}

#[tokio::test]
async fn test_scaffold_creates_placeholder_once() {
    let dir = TempDir::new().unwrap();
    let portal = fs_portal(&dir);
    let authoring = portal.authoring();

    let (doc, created) = authoring.scaffold_document("sisreg").await.unwrap();
    assert!(created);
    assert_eq!(doc.title, "Tutorial SISREG");
    assert!(dir.path().join("tutorials").join("sisreg.json").exists());

    let (again, created) = authoring.scaffold_document("sisreg").await.unwrap();
    assert!(!created);
    assert_eq!(again, doc);
}

#[tokio::test]
async fn test_invalid_slug_never_touches_disk() {
    let dir = TempDir::new().unwrap();
    let portal = fs_portal(&dir);

    let err = portal
        .authoring()
        .create_course(CourseSubmission {
            card: card("../fora", Role::Saude),
            content: document("Fora"),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, PortalError::InvalidCard(_)));

    let err = portal.authoring().delete_course("../fora", true).await.unwrap_err();
    assert!(matches!(err, PortalError::InvalidSlug(_)));
    assert!(!dir.path().join("fora.json").exists());
}
