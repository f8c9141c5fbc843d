use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

/// One text fragment drawn at an absolute position.
pub struct Fragment<'a> {
    pub x: i64,
    pub y: i64,
    pub text: &'a str,
}

pub fn fragment(x: i64, y: i64, text: &str) -> Fragment<'_> {
    Fragment { x, y, text }
}

/// Lays `rows` out as a grid: row `i` at `top - i * pitch`, column `j` at `xs[j]`.
pub fn grid<'a>(top: i64, pitch: i64, xs: &[i64], rows: &[&[&'a str]]) -> Vec<Fragment<'a>> {
    let mut fragments = Vec::new();
    for (row_index, row) in (0_i64..).zip(rows) {
        for (x, text) in xs.iter().zip(row.iter()) {
            fragments.push(Fragment {
                x: *x,
                y: top - row_index * pitch,
                text: *text,
            });
        }
    }
    fragments
}

pub fn create_test_pdf(
    path: &Path,
    pages: &[Vec<Fragment<'_>>],
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::write(path, create_test_pdf_bytes(pages)?)?;
    Ok(())
}

pub fn create_test_pdf_bytes(
    pages: &[Vec<Fragment<'_>>],
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut page_ids = Vec::new();

    for fragments in pages {
        let mut operations = Vec::new();
        for fragment in fragments {
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 10.into()]),
                Operation::new(
                    "Tm",
                    vec![
                        1.into(),
                        0.into(),
                        0.into(),
                        1.into(),
                        fragment.x.into(),
                        fragment.y.into(),
                    ],
                ),
                Operation::new("Tj", vec![Object::string_literal(fragment.text)]),
                Operation::new("ET", vec![]),
            ]);
        }

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        page_ids.push(page_id);
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|id| (*id).into()).collect::<Vec<_>>(),
            "Count" => i64::try_from(page_ids.len())?,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}
