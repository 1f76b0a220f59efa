//! Two-page sample PDF for trying out indexing and question answering
//!
//! Page 1 carries an introduction and "Figure 1: Sample Chart", a bar chart
//! drawn with vector rectangles. Page 2 carries a small table (Alpha 23.4,
//! Beta 45.6, Gamma 78.9) and a conclusion referring back to the figure.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::path::Path;

use crate::error::{Error, Result};

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 50;

/// Font resource names
const REGULAR: &str = "F1";
const BOLD: &str = "F2";

/// Questions the sample document can answer
pub const SAMPLE_QUESTIONS: [&str; 2] = [
    "What does Figure 1 show?",
    "What is the value of Gamma in the table?",
];

/// Table rows: item, value, description
const TABLE: [(&str, &str, &str); 3] = [
    ("Alpha", "23.4", "First parameter"),
    ("Beta", "45.6", "Second parameter"),
    ("Gamma", "78.9", "Third parameter"),
];

/// Bar labels and heights (points) of Figure 1
const BARS: [(&str, i64); 5] = [("A", 20), ("B", 40), ("C", 60), ("D", 80), ("E", 20)];

fn text(ops: &mut Vec<Operation>, font: &str, size: i64, x: i64, y: i64, line: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new(
        "Tf",
        vec![Object::Name(font.as_bytes().to_vec()), Object::Integer(size)],
    ));
    ops.push(Operation::new("Td", vec![Object::Integer(x), Object::Integer(y)]));
    ops.push(Operation::new("Tj", vec![Object::string_literal(line)]));
    ops.push(Operation::new("ET", vec![]));
}

fn rect(ops: &mut Vec<Operation>, x: i64, y: i64, width: i64, height: i64, paint: &str) {
    ops.push(Operation::new(
        "re",
        vec![
            Object::Integer(x),
            Object::Integer(y),
            Object::Integer(width),
            Object::Integer(height),
        ],
    ));
    ops.push(Operation::new(paint, vec![]));
}

/// Lines of body text starting at `y`, 18pt apart; returns the next free y
fn paragraph(ops: &mut Vec<Operation>, y: i64, lines: &[&str]) -> i64 {
    let mut y = y;
    for line in lines {
        text(ops, REGULAR, 12, MARGIN, y, line);
        y -= 18;
    }
    y
}

fn first_page() -> Vec<Operation> {
    let mut ops = Vec::new();
    text(&mut ops, BOLD, 16, 190, 790, "Sample Document for Testing");

    let y = paragraph(
        &mut ops,
        750,
        &[
            "This is a sample document with text and an image for testing the multimodal",
            "RAG system. The system can understand both text and visual content in documents.",
            "",
            "The system uses ColPali for document retrieval and a vision-language model for",
            "understanding the content and answering questions.",
        ],
    );

    // Figure 1: framed bar chart
    let frame_top = y - 30;
    let baseline = frame_top - 170;
    text(&mut ops, BOLD, 12, 200, frame_top - 20, "Figure 1: Sample Chart");
    ops.push(Operation::new("w", vec![Object::Integer(1)]));
    rect(&mut ops, MARGIN + 50, baseline - 30, 400, 200, "S");

    ops.push(Operation::new(
        "rg",
        vec![Object::Integer(0), Object::Integer(0), Object::Integer(1)],
    ));
    let mut x = MARGIN + 90;
    for (_, height) in BARS {
        rect(&mut ops, x, baseline, 40, height * 2 - 20, "f");
        x += 70;
    }

    ops.push(Operation::new(
        "rg",
        vec![Object::Integer(0), Object::Integer(0), Object::Integer(0)],
    ));
    let mut x = MARGIN + 104;
    for (label, _) in BARS {
        text(&mut ops, REGULAR, 12, x, baseline - 18, label);
        x += 70;
    }

    ops
}

fn second_page() -> Vec<Operation> {
    let mut ops = Vec::new();
    text(&mut ops, BOLD, 14, MARGIN, 790, "Key Information");
    let y = paragraph(
        &mut ops,
        765,
        &[
            "When you ask questions about this document, the system should be able to",
            "reference both the text content and the visual elements.",
        ],
    );

    // Table: header row plus one row per item, 24pt rows
    let columns = [(MARGIN, 170), (MARGIN + 170, 110), (MARGIN + 280, 215)];
    let mut row_top = y - 20;
    let header = [("Item", "Value", "Description")];
    for (i, (item, value, description)) in header.iter().chain(TABLE.iter()).enumerate() {
        let font = if i == 0 { BOLD } else { REGULAR };
        for ((x, width), cell) in columns.iter().zip([item, value, description]) {
            rect(&mut ops, *x, row_top - 24, *width, 24, "S");
            text(&mut ops, font, 12, x + 6, row_top - 17, cell);
        }
        row_top -= 24;
    }

    paragraph(
        &mut ops,
        row_top - 30,
        &[
            "According to Figure 1, item C and D have the highest values.",
            "The table shows that Gamma has the highest value at 78.9.",
        ],
    );

    ops
}

fn add_page(doc: &mut Document, pages_id: ObjectId, operations: Vec<Operation>) -> Result<ObjectId> {
    let content = Content { operations }
        .encode()
        .map_err(|e| Error::pdf(format!("Failed to encode page content: {}", e)))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, content));
    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    }))
}

/// Build the two-page sample document
pub fn sample_document() -> Result<Document> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            REGULAR => regular_id,
            BOLD => bold_id,
        },
    });

    let kids: Vec<Object> = vec![
        add_page(&mut doc, pages_id, first_page())?.into(),
        add_page(&mut doc, pages_id, second_page())?.into(),
    ];
    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(PAGE_WIDTH),
                Object::Integer(PAGE_HEIGHT),
            ],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    Ok(doc)
}

/// Write the sample document to `path`, creating parent directories
pub fn write_sample_pdf(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut doc = sample_document()?;
    doc.save(path)
        .map_err(|e| Error::pdf(format!("Failed to write {}: {}", path.display(), e)))?;

    tracing::info!("Sample PDF created at: {}", path.display());
    Ok(())
}
