//! Fixture workbooks generated with rust_xlsxwriter, plus OpenDocument
//! spreadsheets assembled with zip for the formats calamine parses whole.

#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Workbook, Worksheet};
use sheetport::CellValue;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const HEADER: [&str; 3] = ["id", "number", "description"];

pub const DATA: [(i32, i32, &str); 3] = [
    (50, 123, "Description"),
    (6, 456, "Another description"),
    (7, 7890, "Some more info"),
];

pub fn write_data_rows(sheet: &mut Worksheet, first_row: u32) {
    for (offset, (id, number, description)) in DATA.iter().enumerate() {
        let row = first_row + offset as u32;
        sheet.write_number(row, 0, *id).unwrap();
        sheet.write_number(row, 1, *number).unwrap();
        sheet.write_string(row, 2, *description).unwrap();
    }
}

/// Header row plus three data rows.
pub fn header_fixture(dir: &Path) -> PathBuf {
    let path = dir.join("header.xlsx");
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, label) in HEADER.iter().enumerate() {
        sheet.write_string(0, col as u16, *label).unwrap();
    }
    write_data_rows(sheet, 1);
    workbook.save(&path).unwrap();
    path
}

/// The same three data rows without a header.
pub fn no_header_fixture(dir: &Path) -> PathBuf {
    let path = dir.join("no_header.xlsx");
    let mut workbook = Workbook::new();
    write_data_rows(workbook.add_worksheet(), 0);
    workbook.save(&path).unwrap();
    path
}

/// "Sheet 1" with three rows, "Sheet 2" with two.
pub fn multi_sheet_fixture(dir: &Path) -> PathBuf {
    let path = dir.join("multi_sheet.xlsx");
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Sheet 1").unwrap();
    for row in 0..3u32 {
        sheet.write_string(row, 0, format!("first {row}")).unwrap();
    }
    let sheet = workbook.add_worksheet();
    sheet.set_name("Sheet 2").unwrap();
    for row in 0..2u32 {
        sheet.write_string(row, 0, format!("second {row}")).unwrap();
    }
    workbook.save(&path).unwrap();
    path
}

/// Three rows of content plus a stray cell on row 1,000,000.
pub fn stray_cell_fixture(dir: &Path) -> PathBuf {
    let path = dir.join("stray_cell.xlsx");
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (row, value) in ["a", "b", "c"].iter().enumerate() {
        sheet.write_string(row as u32, 0, *value).unwrap();
    }
    sheet.write_string(999_999, 0, "stray").unwrap();
    workbook.save(&path).unwrap();
    path
}

const ODS_MIMETYPE: &str = "application/vnd.oasis.opendocument.spreadsheet";

const ODS_MANIFEST: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8"?>"#,
    r#"<manifest:manifest"#,
    r#" xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0""#,
    r#" manifest:version="1.2">"#,
    r#"<manifest:file-entry manifest:full-path="/""#,
    r#" manifest:media-type="application/vnd.oasis.opendocument.spreadsheet"/>"#,
    r#"<manifest:file-entry manifest:full-path="content.xml""#,
    r#" manifest:media-type="text/xml"/>"#,
    r#"</manifest:manifest>"#,
);

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn ods_cell(value: &CellValue) -> String {
    let (attrs, text) = match value {
        CellValue::Empty => return "<table:table-cell/>".to_string(),
        CellValue::Number(n) => (
            format!(r#"office:value-type="float" office:value="{n}""#),
            n.to_string(),
        ),
        CellValue::Bool(b) => (
            format!(r#"office:value-type="boolean" office:boolean-value="{b}""#),
            b.to_string(),
        ),
        CellValue::Text(s) | CellValue::Error(s) => {
            (r#"office:value-type="string""#.to_string(), escape_xml(s))
        }
    };
    format!("<table:table-cell {attrs}><text:p>{text}</text:p></table:table-cell>")
}

/// Write an `.ods` document with the given sheets.
pub fn ods_fixture(dir: &Path, name: &str, sheets: &[(&str, Vec<Vec<CellValue>>)]) -> PathBuf {
    let mut content = String::from(concat!(
        r#"<?xml version="1.0" encoding="UTF-8"?>"#,
        r#"<office:document-content"#,
        r#" xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0""#,
        r#" xmlns:table="urn:oasis:names:tc:opendocument:xmlns:table:1.0""#,
        r#" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0""#,
        r#" office:version="1.2"><office:body><office:spreadsheet>"#,
    ));
    for (sheet, rows) in sheets {
        content.push_str(&format!(
            r#"<table:table table:name="{}">"#,
            escape_xml(sheet)
        ));
        for row in rows {
            content.push_str("<table:table-row>");
            if row.is_empty() {
                content.push_str("<table:table-cell/>");
            }
            for value in row {
                content.push_str(&ods_cell(value));
            }
            content.push_str("</table:table-row>");
        }
        content.push_str("</table:table>");
    }
    content.push_str("</office:spreadsheet></office:body></office:document-content>");

    let path = dir.join(name);
    let mut zip = ZipWriter::new(File::create(&path).unwrap());
    // The mimetype entry comes first and is stored uncompressed.
    let options = |method| SimpleFileOptions::default().compression_method(method);
    zip.start_file("mimetype", options(CompressionMethod::Stored)).unwrap();
    zip.write_all(ODS_MIMETYPE.as_bytes()).unwrap();
    zip.start_file("META-INF/manifest.xml", options(CompressionMethod::Deflated)).unwrap();
    zip.write_all(ODS_MANIFEST.as_bytes()).unwrap();
    zip.start_file("content.xml", options(CompressionMethod::Deflated)).unwrap();
    zip.write_all(content.as_bytes()).unwrap();
    zip.finish().unwrap();
    path
}

fn data_cells() -> Vec<Vec<CellValue>> {
    DATA.iter()
        .map(|&(id, number, description)| {
            vec![
                CellValue::from(id),
                CellValue::from(number),
                CellValue::from(description),
            ]
        })
        .collect()
}

/// [`header_fixture`] as an OpenDocument spreadsheet.
pub fn ods_header_fixture(dir: &Path) -> PathBuf {
    let mut rows: Vec<Vec<CellValue>> =
        vec![HEADER.iter().map(|&label| CellValue::from(label)).collect()];
    rows.extend(data_cells());
    ods_fixture(dir, "header.ods", &[("Sheet1", rows)])
}

/// [`multi_sheet_fixture`] as an OpenDocument spreadsheet.
pub fn ods_multi_sheet_fixture(dir: &Path) -> PathBuf {
    let first: Vec<Vec<CellValue>> = (0..3)
        .map(|row| vec![CellValue::from(format!("first {row}"))])
        .collect();
    let second: Vec<Vec<CellValue>> = (0..2)
        .map(|row| vec![CellValue::from(format!("second {row}"))])
        .collect();
    ods_fixture(
        dir,
        "multi_sheet.ods",
        &[("Sheet 1", first), ("Sheet 2", second)],
    )
}
