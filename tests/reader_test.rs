//! Integration tests for the readers and the reader factory.

mod common;

use docpdf::{
    Block, DocumentReader, Error, ReadOptions, ReaderFactory, SheetSelection, SourceFormat,
    TextStyle,
};

fn inventory() -> Vec<u8> {
    common::workbook(
        Some("Inventory"),
        &[
            (
                "Stock",
                vec![
                    vec![],
                    vec!["", "Item", "Qty", "Price"],
                    vec!["", "Bolt", "40", "0.25"],
                    vec!["", "Nut", "120", "0.1"],
                ],
            ),
            ("Empty", vec![]),
            ("Suppliers", vec![vec!["Name", "City"], vec!["Acme", "Busan"]]),
        ],
    )
}

#[test]
fn test_factory_tags_any_case() {
    let factory = ReaderFactory::new();
    let cases = [
        ("SPREADSHEET", SourceFormat::Spreadsheet),
        ("Xlsx", SourceFormat::Spreadsheet),
        (" docx ", SourceFormat::WordProcessor),
        ("Word", SourceFormat::WordProcessor),
        ("XML", SourceFormat::Markup),
        ("markup", SourceFormat::Markup),
    ];
    for (tag, format) in cases {
        assert_eq!(factory.create_reader(tag).unwrap().format(), format, "{}", tag);
    }
}

#[test]
fn test_factory_unsupported_tag() {
    for tag in ["pdf", "", "xlsx2"] {
        match ReaderFactory::new().create_reader(tag) {
            Err(Error::UnsupportedFormat(name)) => assert_eq!(name, tag),
            Err(e) => panic!("unexpected error for '{}': {}", tag, e),
            Ok(_) => panic!("'{}' should not be supported", tag),
        }
    }
}

#[test]
fn test_fresh_reader_has_empty_content() {
    let factory = ReaderFactory::new();
    for format in SourceFormat::ALL {
        let reader = factory.create(format);
        let content = reader.get_content();
        assert!(content.is_empty());
        assert!(content.metadata.is_empty());
    }
}

#[test]
fn test_spreadsheet_sheets_become_tables() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write(dir.path(), "inventory.xlsx", &inventory());

    let mut reader = ReaderFactory::new().create_reader("spreadsheet").unwrap();
    reader.read(&path).unwrap();
    let content = reader.get_content();

    assert_eq!(content.metadata.title.as_deref(), Some("Inventory"));
    assert_eq!(content.metadata.sheet_count, Some(3));
    assert_eq!(content.source_format, Some(SourceFormat::Spreadsheet));

    // The empty sheet contributes nothing
    assert_eq!(content.block_count(), 4);
    assert_eq!(content.blocks[0], Block::heading("Stock", 2));

    let tables: Vec<_> = content.tables().collect();
    assert_eq!(tables.len(), 2);
    let stock = tables[0];
    assert_eq!(stock.name.as_deref(), Some("Stock"));
    assert_eq!(stock.column_count(), 3);
    assert_eq!(stock.cell(0, 0), Some("Item"));
    assert_eq!(stock.cell(1, 1), Some("40"));
    assert_eq!(stock.cell(2, 2), Some("0.1"));
    assert_eq!(stock.header_rows, 1);
}

#[test]
fn test_spreadsheet_sheet_selection() {
    let options = ReadOptions::new().with_sheets(SheetSelection::parse("3").unwrap());
    let mut reader = ReaderFactory::with_options(options).create(SourceFormat::Spreadsheet);
    reader.read_bytes(&inventory()).unwrap();
    let content = reader.get_content();

    assert_eq!(content.block_count(), 2);
    assert_eq!(content.blocks[0], Block::heading("Suppliers", 2));
}

#[test]
fn test_word_document_structure() {
    let body = [
        common::para("Quarterly Review", Some("Title")),
        common::para("Summary", Some("Heading2")),
        r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>Revenue grew.</w:t></w:r></w:p>"#.to_string(),
        r#"<w:p><w:pPr><w:numPr><w:ilvl w:val="1"/><w:numId w:val="4"/></w:numPr></w:pPr><w:r><w:t>Second level</w:t></w:r></w:p>"#.to_string(),
        r#"<w:tbl><w:tr><w:tc><w:p><w:r><w:t>Region</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>Total</w:t></w:r></w:p></w:tc></w:tr><w:tr><w:tc><w:p><w:r><w:t>North</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>12</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#.to_string(),
    ]
    .concat();
    let dir = tempfile::tempdir().unwrap();
    let path = common::write(
        dir.path(),
        "review.docx",
        &common::word_document(&body, Some("Q3"), Some("Finance")),
    );

    let mut reader = ReaderFactory::new().create_for_path(&path).unwrap();
    assert_eq!(reader.format(), SourceFormat::WordProcessor);
    reader.read(&path).unwrap();
    let content = reader.get_content();

    assert_eq!(content.metadata.title.as_deref(), Some("Q3"));
    assert_eq!(content.metadata.author.as_deref(), Some("Finance"));
    assert!(content.metadata.created.is_some());

    assert_eq!(content.blocks[0], Block::heading("Quarterly Review", 1));
    assert_eq!(content.blocks[1], Block::heading("Summary", 2));
    match &content.blocks[2] {
        Block::Paragraph(p) => {
            assert_eq!(p.text, "Revenue grew.");
            assert_eq!(p.style, TextStyle::Bold);
        }
        other => panic!("expected paragraph, got {:?}", other),
    }
    assert_eq!(
        content.blocks[3],
        Block::ListItem {
            text: "Second level".to_string(),
            level: 1
        }
    );
    match &content.blocks[4] {
        Block::Table(table) => {
            assert_eq!(table.row_count(), 2);
            assert_eq!(table.cell(1, 0), Some("North"));
        }
        other => panic!("expected table, got {:?}", other),
    }
}

#[test]
fn test_word_tabs_and_text_boxes_with_default_options() {
    let body = [
        r#"<w:p><w:r><w:t>Name</w:t><w:tab/><w:t>Qty</w:t></w:r></w:p>"#,
        r#"<w:p><w:r><w:t xml:space="preserve">Before </w:t></w:r><w:r><w:pict><w:txbxContent><w:p><w:r><w:t>Box</w:t></w:r></w:p></w:txbxContent></w:pict></w:r><w:r><w:t xml:space="preserve"> After</w:t></w:r></w:p>"#,
    ]
    .concat();
    let mut reader = ReaderFactory::new().create(SourceFormat::WordProcessor);
    reader
        .read_bytes(&common::word_document(&body, None, None))
        .unwrap();

    assert_eq!(
        reader.get_content().blocks,
        vec![
            Block::paragraph("Name\tQty"),
            Block::paragraph("Before After"),
            Block::paragraph("Box"),
        ]
    );
}

#[test]
fn test_markup_images_resolve_against_source_dir() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write(
        dir.path(),
        "manual.xml",
        br#"<?xml version="1.0"?>
<manual>
  <title>Setup</title>
  <section>
    <title>Wiring</title>
    <para>Connect the <emphasis>red</emphasis> lead.</para>
    <image src="img/diagram.png" width="200" alt="Diagram"/>
  </section>
</manual>"#,
    );

    let mut reader = ReaderFactory::new().create_reader("xml").unwrap();
    reader.read(&path).unwrap();
    let content = reader.get_content();

    assert_eq!(content.metadata.title.as_deref(), Some("Setup"));
    assert_eq!(content.blocks[0], Block::heading("Setup", 1));
    assert_eq!(content.blocks[1], Block::heading("Wiring", 2));
    assert_eq!(content.blocks[2], Block::paragraph("Connect the red lead."));
    assert_eq!(
        content.blocks[3],
        Block::Image {
            path: dir.path().join("img/diagram.png"),
            width: Some(200.0),
            height: None,
            alt: Some("Diagram".to_string()),
        }
    );
}

#[test]
fn test_create_for_path_sniffs_content() {
    let dir = tempfile::tempdir().unwrap();
    let factory = ReaderFactory::new();

    let book = common::write(dir.path(), "export.bin", &inventory());
    assert_eq!(
        factory.create_for_path(&book).unwrap().format(),
        SourceFormat::Spreadsheet
    );

    let markup = common::write(dir.path(), "notes", b"\n  <notes><p>x</p></notes>");
    assert_eq!(
        factory.create_for_path(&markup).unwrap().format(),
        SourceFormat::Markup
    );

    let junk = common::write(dir.path(), "junk.dat", b"\x00\x01\x02");
    assert!(matches!(
        factory.create_for_path(&junk),
        Err(Error::UnknownFormat)
    ));
}

#[test]
fn test_read_errors() {
    let dir = tempfile::tempdir().unwrap();
    let factory = ReaderFactory::new();

    let mut reader = factory.create(SourceFormat::WordProcessor);
    assert!(matches!(
        reader.read(&dir.path().join("missing.docx")),
        Err(Error::FileNotFound(_))
    ));

    let broken = common::write(dir.path(), "broken.xml", b"<doc><p>done</p><p>open</doc>");
    let mut strict = factory.create(SourceFormat::Markup);
    assert!(strict.read(&broken).is_err());
    assert!(strict.get_content().is_empty());

    let mut lenient = ReaderFactory::with_options(ReadOptions::new().lenient())
        .create(SourceFormat::Markup);
    lenient.read(&broken).unwrap();
    // Blocks completed before the error are kept
    assert_eq!(lenient.get_content().plain_text(), "done");
}
