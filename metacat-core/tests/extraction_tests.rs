//! Router boundary tests: drive `ExtractionRouter::extract` the way an
//! upload handler would and assert on the result envelope.
//!
//! Fixtures are small inline documents; workbooks are assembled in memory.
//! No files on disk are required to run these tests.

use metacat_core::detector::EXTENSION_TABLE;
use metacat_core::{
    CatalogStorage, DataSource, ErrorKind, ExtractionConfig, ExtractionRouter, FormatDetector,
    FormatTag, MemoryStorage, ProcessingStatus,
};
use serde_json::{json, Value};
use std::io::{Cursor, Write};

// ============================================================================
// Fixture helpers
// ============================================================================

/// Minimal OOXML workbook; each sheet is `(name, rows)` with the first row as
/// header. Cells are inline strings or numbers.
fn build_xlsx(sheets: &[(&str, Vec<Vec<&str>>)]) -> Vec<u8> {
    build_xlsx_omitting(sheets, None)
}

/// Same as `build_xlsx`, but the worksheet part at index `omit` is left out
/// of the archive while the workbook still lists it.
fn build_xlsx_omitting(sheets: &[(&str, Vec<Vec<&str>>)], omit: Option<usize>) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Stored);

    let mut content_types = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
    );
    let mut workbook = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#,
    );
    let mut rels = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );

    for (i, (name, rows)) in sheets.iter().enumerate() {
        let n = i + 1;
        content_types.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
        workbook.push_str(&format!(r#"<sheet name="{name}" sheetId="{n}" r:id="rId{n}"/>"#));
        rels.push_str(&format!(
            r#"<Relationship Id="rId{n}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{n}.xml"/>"#
        ));

        let mut sheet = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
        );
        for (r, row) in rows.iter().enumerate() {
            sheet.push_str(&format!(r#"<row r="{}">"#, r + 1));
            for (c, cell) in row.iter().enumerate() {
                let reference = format!("{}{}", (b'A' + c as u8) as char, r + 1);
                if cell.parse::<f64>().is_ok() {
                    sheet.push_str(&format!(r#"<c r="{reference}"><v>{cell}</v></c>"#));
                } else {
                    sheet.push_str(&format!(
                        r#"<c r="{reference}" t="inlineStr"><is><t>{cell}</t></is></c>"#
                    ));
                }
            }
            sheet.push_str("</row>");
        }
        sheet.push_str("</sheetData></worksheet>");

        if omit == Some(i) {
            continue;
        }
        zip.start_file(format!("xl/worksheets/sheet{n}.xml"), options).unwrap();
        zip.write_all(sheet.as_bytes()).unwrap();
    }

    content_types.push_str("</Types>");
    workbook.push_str("</sheets></workbook>");
    rels.push_str("</Relationships>");

    zip.start_file("[Content_Types].xml", options).unwrap();
    zip.write_all(content_types.as_bytes()).unwrap();
    zip.start_file("xl/workbook.xml", options).unwrap();
    zip.write_all(workbook.as_bytes()).unwrap();
    zip.start_file("xl/_rels/workbook.xml.rels", options).unwrap();
    zip.write_all(rels.as_bytes()).unwrap();
    zip.start_file("_rels/.rels", options).unwrap();
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
    )
    .unwrap();

    zip.finish().unwrap().into_inner()
}

/// Deterministic byte soup for totality checks
fn pseudo_random_bytes(seed: u64, len: usize) -> Vec<u8> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 33) as u8
        })
        .collect()
}

fn fields(result: &metacat_core::ExtractionResult) -> &serde_json::Map<String, Value> {
    result
        .fields()
        .unwrap_or_else(|| panic!("expected success, got {:?}", result.message()))
}

// ============================================================================
// Detection
// ============================================================================

#[test]
fn test_detection_table() {
    let detector = FormatDetector::new();
    for (ext, tag) in EXTENSION_TABLE {
        assert_eq!(detector.detect(&format!("upload.{ext}")), *tag);
        assert_eq!(detector.detect(&format!("UPLOAD.{}", ext.to_uppercase())), *tag);
    }
    for name in ["a.bin", "a", "", ".", "archive.tar.gz", "a.json.bak"] {
        assert_eq!(detector.detect(name), FormatTag::Unsupported, "name {name:?}");
    }
}

#[test]
fn test_extract_is_total() {
    let router = ExtractionRouter::new();
    let mut names: Vec<String> = EXTENSION_TABLE
        .iter()
        .map(|(ext, _)| format!("f.{ext}"))
        .collect();
    names.extend(["f.bin".to_string(), "noext".to_string(), String::new()]);

    let mut inputs: Vec<Vec<u8>> = (0..8).map(|seed| pseudo_random_bytes(seed, 257)).collect();
    inputs.extend([
        Vec::new(),
        b"\xef\xbb\xbf".to_vec(),
        b"PK\x03\x04garbage".to_vec(),
        b"<a><b></a>".to_vec(),
        b"{\"unterminated\": ".to_vec(),
        b"a,b\n1,2,3\n".to_vec(),
        b"@prefix : <broken".to_vec(),
    ]);

    for name in &names {
        let expected = FormatDetector::new().detect(name);
        for content in &inputs {
            let result = router.extract(name, content);
            assert_eq!(result.format_tag(), expected, "name {name:?}");
            if let Some(error) = result.error() {
                assert_ne!(error.kind(), ErrorKind::Internal, "name {name:?}: {error}");
            }
        }
    }
}

// ============================================================================
// Per-format behaviour
// ============================================================================

#[test]
fn test_json_round_trip() {
    let value = json!({
        "title": "Annual report",
        "tags": ["finance", "2024"],
        "nested": {"z": 1, "a": [true, null, 2.5]},
    });
    let bytes = serde_json::to_vec(&value).unwrap();
    let result = ExtractionRouter::new().extract("report.json", &bytes);

    assert_eq!(result.format_tag(), FormatTag::Json);
    let fields = fields(&result);
    assert_eq!(fields["file_type"], json!("JSON"));
    assert_eq!(fields["extracted_data"], value);
}

#[test]
fn test_malformed_json_is_tagged_json() {
    let result = ExtractionRouter::new().extract("broken.json", b"{\"a\": [1, 2}");
    assert_eq!(result.format_tag(), FormatTag::Json);
    assert!(result.message().unwrap().starts_with("JSON Parsing Error: "));
    assert_eq!(serde_json::to_value(&result).unwrap().as_object().unwrap().len(), 1);
}

#[test]
fn test_csv_summary() {
    let result = ExtractionRouter::new().extract("items.csv", b"a,b,c\n1,2,3\n4,5,6\n7,8,9\n");
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({"file_type": "Tabular/CSV", "column_names": ["a", "b", "c"], "row_count": 3})
    );
}

#[test]
fn test_txt_is_read_as_delimited_text() {
    let result = ExtractionRouter::new().extract("export.TXT", b"id,name\n1,x\n");
    assert_eq!(fields(&result)["row_count"], json!(1));
}

#[test]
fn test_two_sheet_workbook() {
    let workbook = build_xlsx(&[
        ("Books", vec![vec!["id", "title"], vec!["1", "Dune"], vec!["2", "Emma"]]),
        ("Loans", vec![vec!["loan_id", "book_id", "due"], vec!["10", "1", "soon"]]),
    ]);
    let result = ExtractionRouter::new().extract("library.xlsx", &workbook);

    assert_eq!(result.format_tag(), FormatTag::Tabular);
    let fields = fields(&result);
    assert_eq!(fields["file_type"], json!("Excel"));
    assert_eq!(
        fields["sheets"],
        json!({
            "Books": {"column_names": ["id", "title"], "row_count": 2},
            "Loans": {"column_names": ["loan_id", "book_id", "due"], "row_count": 1},
        })
    );
    let names: Vec<&String> = fields["sheets"].as_object().unwrap().keys().collect();
    assert_eq!(names, vec!["Books", "Loans"]);
}

#[test]
fn test_corrupt_workbook_is_tabular_failure() {
    let result = ExtractionRouter::new().extract("library.xlsx", b"PK\x03\x04not really");
    assert_eq!(result.format_tag(), FormatTag::Tabular);
    assert!(result.message().unwrap().starts_with("Tabular Parsing Error: "));
}

#[test]
fn test_legacy_xls_garbage_is_tabular_failure() {
    let mut content = vec![0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
    content.extend_from_slice(b"not a compound document");
    let result = ExtractionRouter::new().extract("ledger.xls", &content);
    assert_eq!(result.format_tag(), FormatTag::Tabular);
    let error = result.error().unwrap();
    assert_eq!(error.kind(), ErrorKind::Parse);
    assert!(error.to_string().starts_with("Tabular Parsing Error: "));
}

#[test]
fn test_one_unreadable_sheet_fails_the_workbook() {
    let workbook = build_xlsx_omitting(
        &[
            ("Books", vec![vec!["id"], vec!["1"]]),
            ("Loans", vec![vec!["loan_id"], vec!["10"]]),
        ],
        Some(1),
    );
    let result = ExtractionRouter::new().extract("library.xlsx", &workbook);
    assert_eq!(result.format_tag(), FormatTag::Tabular);
    assert!(result.fields().is_none());
    assert!(result.message().unwrap().starts_with("Tabular Parsing Error: "));
}

#[test]
fn test_csv_unterminated_quote() {
    let result = ExtractionRouter::new().extract("broken.csv", b"a,b\n1,\"unterminated\n");
    assert_eq!(result.format_tag(), FormatTag::Tabular);
    assert!(result.message().unwrap().contains("EOF inside string"));
}

#[test]
fn test_markup_utf16_and_internal_entities() {
    let xml = "<!DOCTYPE r [<!ENTITY org \"Metacat\">]><r><owner>&org;</owner></r>";
    let mut content = vec![0xFF, 0xFE];
    content.extend(xml.encode_utf16().flat_map(u16::to_le_bytes));
    let result = ExtractionRouter::new().extract("owner.xml", &content);
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({"schema_type": "XML", "owner": "Metacat", "total_elements": 2})
    );
}

#[test]
fn test_markup_first_occurrence() {
    let result = ExtractionRouter::new().extract(
        "record.xml",
        b"<root><a>x</a><a>y</a><b>  </b></root>",
    );
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({"schema_type": "XML", "a": "x", "total_elements": 4})
    );
}

#[test]
fn test_marcxml_record() {
    let marc = br#"<?xml version="1.0" encoding="UTF-8"?>
<record xmlns="http://www.loc.gov/MARC21/slim">
  <leader>00000nam a2200000 a 4500</leader>
  <controlfield tag="001">ocm12345</controlfield>
  <datafield tag="245" ind1="1" ind2="0">
    <subfield code="a">Dune /</subfield>
    <subfield code="c">Frank Herbert.</subfield>
  </datafield>
</record>"#;
    let result = ExtractionRouter::new().extract("dune.marc", marc);
    let fields = fields(&result);
    assert_eq!(fields["schema_type"], json!("MARC"));
    assert_eq!(fields["leader"], json!("00000nam a2200000 a 4500"));
    assert_eq!(fields["subfield"], json!("Dune /"));
    assert_eq!(fields["total_elements"], json!(6));
}

#[test]
fn test_ntriples_count() {
    let doc = "<http://ex.org/s1> <http://ex.org/p> \"one\" .\n\
               <http://ex.org/s2> <http://ex.org/p> \"two\" .\n\
               <http://ex.org/s1> <http://ex.org/p> \"one\" .\n\
               _:b0 <http://ex.org/p> <http://ex.org/s1> .\n";
    let result = ExtractionRouter::new().extract("graph.nt", doc.as_bytes());
    let fields = fields(&result);
    assert_eq!(fields["file_type"], json!("RDF"));
    assert_eq!(fields["triples_count"], json!(3));
    assert_eq!(fields["namespaces"], json!([]));
}

#[test]
fn test_turtle_namespaces() {
    let doc = "@prefix dcat: <http://www.w3.org/ns/dcat#> .\n\
               @prefix dct: <http://purl.org/dc/terms/> .\n\
               <http://ex.org/ds> a dcat:Dataset ; dct:title \"Loans\" .\n";
    let result = ExtractionRouter::new().extract("catalog.ttl", doc.as_bytes());
    let fields = fields(&result);
    assert_eq!(fields["triples_count"], json!(2));
    assert_eq!(
        fields["namespaces"],
        json!(["http://www.w3.org/ns/dcat#", "http://purl.org/dc/terms/"])
    );
    assert_eq!(fields["serialization"], json!("turtle"));
}

#[test]
fn test_rdf_xml_document() {
    let doc = r#"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns:dct="http://purl.org/dc/terms/">
  <rdf:Description rdf:about="http://ex.org/ds">
    <dct:title>Loans</dct:title>
  </rdf:Description>
</rdf:RDF>"#;
    let result = ExtractionRouter::new().extract("catalog.rdf", doc.as_bytes());
    let fields = fields(&result);
    assert_eq!(fields["triples_count"], json!(1));
    assert_eq!(fields["serialization"], json!("rdf/xml"));
}

#[test]
fn test_rdf_xml_relative_identifiers() {
    let doc = r##"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns:dct="http://purl.org/dc/terms/">
  <rdf:Description rdf:about="#book"><dct:title>Dune</dct:title></rdf:Description>
  <rdf:Description rdf:ID="loan"><dct:title>Loan 7</dct:title></rdf:Description>
</rdf:RDF>"##;
    let result = ExtractionRouter::new().extract("relative.rdf", doc.as_bytes());
    let fields = fields(&result);
    assert_eq!(fields["triples_count"], json!(2));
    assert_eq!(fields["serialization"], json!("rdf/xml"));
}

#[test]
fn test_turtle_relative_iris_without_base() {
    let doc = "@prefix dc: <http://purl.org/dc/elements/1.1/> .\n<#me> dc:title \"x\" .\n";
    let result = ExtractionRouter::new().extract("card.ttl", doc.as_bytes());
    let fields = fields(&result);
    assert_eq!(fields["triples_count"], json!(1));
    assert_eq!(fields["namespaces"], json!(["http://purl.org/dc/elements/1.1/"]));
}

#[test]
fn test_turtle_namespaces_ignore_comments_and_literals() {
    let doc = "@prefix ex: <http://ex.org/> .\n\
               # @prefix old: <http://old.example/> .\n\
               ex:a ex:note \"see . @prefix fake: <http://fake/>\" .\n";
    let result = ExtractionRouter::new().extract("notes.ttl", doc.as_bytes());
    assert_eq!(fields(&result)["namespaces"], json!(["http://ex.org/"]));
}

#[test]
fn test_rdf_invalid_utf8_is_decode_error() {
    let result = ExtractionRouter::new().extract("bad.ttl", b"<http://a> <http://b> \"\xff\xfe\" .");
    assert_eq!(result.format_tag(), FormatTag::Rdf);
    assert_eq!(result.error().unwrap().kind(), ErrorKind::Decode);
}

#[test]
fn test_malformed_rdf_is_tagged_rdf() {
    let result = ExtractionRouter::new().extract("catalog.ttl", b"<http://a> <http://b> .");
    assert_eq!(result.format_tag(), FormatTag::Rdf);
    assert!(result.message().unwrap().starts_with("RDF Parsing Error: "));
}

#[test]
fn test_unsupported_extension() {
    let result = ExtractionRouter::new().extract("firmware.bin", &[0u8, 1, 2]);
    assert_eq!(result.format_tag(), FormatTag::Unsupported);
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({"error": "Unsupported file type: .bin"})
    );
}

// ============================================================================
// Configuration and catalog
// ============================================================================

#[test]
fn test_sniffing_from_yaml_config() {
    let config = ExtractionConfig::from_yaml("detection:\n  sniff_content: true\n").unwrap();
    let router = ExtractionRouter::from_config(&config).unwrap();

    let workbook = build_xlsx(&[("Only", vec![vec!["k"], vec!["1"]])]);
    let result = router.extract("upload", &workbook);
    assert_eq!(result.format_tag(), FormatTag::Tabular);
    assert_eq!(fields(&result)["sheets"]["Only"]["row_count"], json!(1));

    let result = router.extract("upload", b"@prefix ex: <http://ex.org/> .\nex:a ex:b ex:c .\n");
    assert_eq!(result.format_tag(), FormatTag::Rdf);

    let result = router.extract("upload", b"<note><to>Tove</to></note>");
    assert_eq!(fields(&result)["schema_type"], json!("XML"));

    // Known extensions are never second-guessed
    let result = router.extract("upload.csv", b"{\"looks\": \"like json\"}");
    assert_eq!(result.format_tag(), FormatTag::Tabular);
}

#[test]
fn test_ingest_into_catalog() {
    let router = ExtractionRouter::new();
    let storage = MemoryStorage::new();

    let good = DataSource::ingest("Books", "books.csv", b"id,title\n1,Dune\n", &router);
    let bad = DataSource::ingest("Loans", "loans.json", b"{oops", &router);
    storage.store(&good).unwrap();
    storage.store(&bad).unwrap();

    let stored = storage.get(&good.id).unwrap().unwrap();
    assert_eq!(stored.status, ProcessingStatus::Success);
    assert_eq!(stored.processed_metadata.unwrap()["row_count"], json!(1));

    let stored = storage.get(&bad.id).unwrap().unwrap();
    assert_eq!(stored.status, ProcessingStatus::Failed);
    assert!(stored.error_message().unwrap().starts_with("JSON Parsing Error: "));

    assert_eq!(storage.list().unwrap().len(), 2);
}

#[test]
fn test_router_is_shareable_across_threads() {
    let router = std::sync::Arc::new(ExtractionRouter::new());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let router = router.clone();
            std::thread::spawn(move || {
                let csv = format!("n\n{}\n", i);
                router.extract("n.csv", csv.as_bytes()).is_success()
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
