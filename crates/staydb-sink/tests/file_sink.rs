//! Integration tests for the local file sink, writing into per-test
//! directories under the system temp dir.

use std::path::PathBuf;

use staydb_core::{NormalizedRecord, OutputFormat, ResultSet};
use staydb_sink::{write_records, write_table_csv, SinkError, Table};

fn temp_dir(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!("staydb-sink-{label}-{}", uuid::Uuid::new_v4().simple()))
}

fn record(id: usize) -> NormalizedRecord {
    NormalizedRecord {
        link: format!("www.airbnb.com/rooms/{id}"),
        name: format!("Listing {id}"),
        price: Some(100 + id as u64),
        rating: (id % 2 == 0).then(|| "4.85".to_owned()),
        review_count: Some(id.to_string()),
    }
}

fn result_set(count: usize, cap: usize) -> ResultSet {
    let mut results = ResultSet::with_cap(cap);
    for id in 0..count {
        results.push(record(id));
    }
    results
}

#[test]
fn csv_file_holds_exactly_first_hundred_records_in_order() {
    let dir = temp_dir("csv");
    let results = result_set(120, 100);

    let path = write_records(&results, &dir, "airbnb_barcelona", OutputFormat::Csv).unwrap();

    assert_eq!(path, dir.join("airbnb_barcelona.csv"));
    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 101, "header plus 100 rows");
    assert_eq!(lines[0], "link,name,price,rating,review_count");
    assert_eq!(lines[1], "www.airbnb.com/rooms/0,Listing 0,100,4.85,0");
    assert_eq!(lines[2], "www.airbnb.com/rooms/1,Listing 1,101,,1");
    assert_eq!(lines[100], "www.airbnb.com/rooms/99,Listing 99,199,,99");

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn json_file_is_an_array_of_first_hundred_records() {
    let dir = temp_dir("json");
    let results = result_set(120, 100);

    let path = write_records(&results, &dir, "airbnb_barcelona", OutputFormat::Json).unwrap();

    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("json"));
    let parsed: Vec<NormalizedRecord> =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(parsed.len(), 100);
    assert_eq!(parsed[0], record(0));
    assert_eq!(parsed[99], record(99));

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert!(raw[1]["rating"].is_null());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn fewer_records_than_cap_are_all_written() {
    let dir = temp_dir("short");
    let results = result_set(3, 100);

    let path = write_records(&results, &dir, "run", OutputFormat::Csv).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents.lines().count(), 4);
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn rewriting_replaces_previous_file() {
    let dir = temp_dir("rewrite");
    write_records(&result_set(50, 100), &dir, "run", OutputFormat::Csv).unwrap();
    let path = write_records(&result_set(2, 100), &dir, "run", OutputFormat::Csv).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents.lines().count(), 3);
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn empty_result_set_is_rejected() {
    let dir = temp_dir("empty");
    let err = write_records(&ResultSet::with_cap(100), &dir, "run", OutputFormat::Csv).unwrap_err();
    assert!(matches!(err, SinkError::EmptyRecords { .. }), "got: {err:?}");
    assert!(!dir.exists(), "nothing is created for an empty set");
}

#[test]
fn table_csv_creates_parent_directories() {
    let dir = temp_dir("table");
    let path = dir.join("nested").join("combined_data.csv");
    let mut table = Table::new(vec!["PropertyId".to_owned(), "Channel".to_owned()]);
    table.push_row(vec![Some("1".to_owned()), None]);

    write_table_csv(&table, &path).unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "PropertyId,Channel\n1,\n");
    std::fs::remove_dir_all(&dir).ok();
}
