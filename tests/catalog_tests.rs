use estimate_tool::{Catalog, CatalogEntry, CatalogError, ElementCatalog};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_temp(suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

#[test]
fn loads_elements_sheet_from_csv() {
    let file = write_temp(
        ".csv",
        "Element,Unit,People_per_Unit\nBrickwork,m2,2\nFlooring, m2 ,\nWindows,nr,3\n",
    );
    let catalog = ElementCatalog::load(file.path()).unwrap();

    assert_eq!(catalog.len(), 3);
    let flooring = catalog.resolve("Flooring").unwrap();
    assert_eq!(flooring.unit, "m2");
    assert_eq!(flooring.default_crew, None);
    assert_eq!(catalog.resolve("Windows").unwrap().default_crew, Some(3));
    let names: Vec<&str> = catalog.entries().iter().map(|e| e.element.as_str()).collect();
    assert_eq!(names, vec!["Brickwork", "Flooring", "Windows"]);
}

#[test]
fn loads_catalog_from_json() {
    let file = write_temp(
        ".json",
        r#"[{"element": "Plastering", "unit": "m2"}, {"element": "Doors", "unit": "nr", "default_crew": 1}]"#,
    );
    let catalog = ElementCatalog::load(file.path()).unwrap();
    assert_eq!(catalog.resolve("Doors").unwrap().default_crew, Some(1));
    assert!(catalog.resolve("Brickwork").is_none());
}

#[test]
fn rejects_duplicate_elements() {
    let err = ElementCatalog::new(vec![
        CatalogEntry::new("Brickwork", "m2"),
        CatalogEntry::new("Brickwork", "m3"),
    ])
    .unwrap_err();
    assert!(matches!(err, CatalogError::DuplicateElement(name) if name == "Brickwork"));
}

#[test]
fn rejects_blank_element_names() {
    let err = ElementCatalog::new(vec![CatalogEntry::new("  ", "m2")]).unwrap_err();
    assert!(matches!(err, CatalogError::EmptyElement(0)));
}

#[test]
fn resolve_ignores_surrounding_whitespace() {
    let catalog = ElementCatalog::sample();
    assert!(!catalog.is_empty());
    assert_eq!(catalog.resolve(" Brickwork ").unwrap().unit, "m2");
}
