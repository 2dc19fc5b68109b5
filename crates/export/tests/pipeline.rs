//! End-to-end: bid files on disk through parsing, analysis and export.

use approx::assert_relative_eq;
use bidtab_analysis::{
    summarize, summarize_project, FilterCriteria, FilterSortEngine, SortKey, SortSpec,
};
use bidtab_core::config::ParserConfig;
use bidtab_core::{BidDate, RecordSet};
use bidtab_export::{build_snapshot_at, parse_snapshot, read_snapshot, to_json, write_snapshot};
use bidtab_ingestion::{collect_bid_files, into_record_set, parse_files, BidFileParser};
use chrono::{DateTime, NaiveDate, Utc};
use std::fs;
use std::path::Path;

const HARRIS: &str = "\
TEXAS DEPARTMENT OF TRANSPORTATION
COUNTY HARRIS           HIGHWAY IH 45
TYPE BRIDGE REPAIR
LETTING DATE 03/15/24
CONTRACT NUMBER CSJ-100
*****ESTIMATE*****                 $1,000,000.00
BIDDER 1 A $950,000.00 Acme Construction
BIDDER 2 A $980,000.00 Beta Co
";

const TRAVIS: &str = "\
COUNTY TRAVIS
TYPE OVERLAY
LETTING DATE 01/09/24
CONTRACT NUMBER CSJ-200
*****ESTIMATE*****                 $200,000.00
BIDDER 1 A $210,000.00 Beta Co
BIDDER 2 A $230,000.00 Acme Construction
";

const NO_DATE: &str = "\
COUNTY HARRIS
TYPE OVERLAY
BIDDER 1 A $50,000.00 Gamma LLC
";

fn at() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(1_710_460_800_000).unwrap()
}

fn ingest(dir: &Path) -> RecordSet {
    fs::write(dir.join("CSJ100.TXT"), HARRIS).unwrap();
    fs::write(dir.join("CSJ200.TXT"), TRAVIS).unwrap();
    fs::write(dir.join("NODATE.TXT"), NO_DATE).unwrap();
    fs::write(dir.join("BROKEN.TXT"), [0xffu8, 0x00, 0xfe]).unwrap();
    fs::write(dir.join("readme.md"), "not a bid file").unwrap();

    let config = ParserConfig::default();
    let parser = BidFileParser::new(&config).unwrap();
    let files = collect_bid_files(&[dir.to_path_buf()], &config).unwrap();
    assert_eq!(files.len(), 4);

    let (records, failures) = into_record_set(parse_files(&parser, &files));
    assert_eq!(failures.len(), 1);
    assert!(failures[0].1.is_input_failure());
    records
}

#[test]
fn test_harris_example_end_to_end() {
    let parser = BidFileParser::new(&ParserConfig::default()).unwrap();
    let record = parser.parse_at(HARRIS, "CSJ100.TXT", at());

    assert_eq!(record.county(), "HARRIS");
    assert_eq!(record.project_type(), "BRIDGE REPAIR");
    assert_eq!(record.date(), BidDate::from_ymd(2024, 3, 15));
    assert_eq!(record.contract_number(), "CSJ-100");
    assert_relative_eq!(record.engineer_estimate(), 1_000_000.0);
    assert_relative_eq!(record.lowest_bid(), 950_000.0);
    assert_relative_eq!(record.diff_from_estimate(), -5.0);

    let stats = summarize(std::slice::from_ref(&record));
    let winner = &stats.bidder_stats[0];
    assert_eq!(winner.name, "Acme Construction");
    assert_eq!(winner.win_count, 1);
    assert_eq!(stats.bidder("Beta Co").unwrap().win_count, 0);

    let project = summarize_project(&record);
    assert_eq!(project.bid_count, 2);
    assert_relative_eq!(project.bid_range, 30_000.0);
}

#[test]
fn test_directory_to_snapshot_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let records = ingest(dir.path());
    assert_eq!(records.len(), 3);

    let snapshot = build_snapshot_at(records.records(), at());
    assert_eq!(snapshot.total_projects, 3);
    assert_eq!(snapshot.statistics.counties_covered, vec!["HARRIS", "TRAVIS"]);
    assert_eq!(snapshot.statistics.total_bidders, 5);

    let restored = parse_snapshot(&to_json(&snapshot, false).unwrap()).unwrap();
    assert_eq!(restored, snapshot);

    let path = dir.path().join("exports").join("txbids-export-2024-03-15.json");
    write_snapshot(&path, &snapshot, true).unwrap();
    assert_eq!(read_snapshot(&path).unwrap(), snapshot);
}

#[test]
fn test_filtered_listing_over_ingested_records() {
    let dir = tempfile::tempdir().unwrap();
    let records = ingest(dir.path());

    let mut engine = FilterSortEngine::new(
        FilterCriteria::default().with_county("harris"),
        SortSpec::descending(SortKey::Date),
    );
    let listed = engine.apply(records.records());
    let contracts: Vec<_> = listed.iter().map(|r| r.contract_number()).collect();
    // The record without a date sorts after every dated one.
    assert_eq!(contracts, vec!["CSJ-100", "Unknown"]);

    engine.set_criteria(FilterCriteria::default().with_bidder_name("beta"));
    engine.toggle_sort(SortKey::LowestBid);
    let listed = engine.apply(records.records());
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].contract_number(), "CSJ-200");
}

#[test]
fn test_snapshot_ledger_across_files() {
    let dir = tempfile::tempdir().unwrap();
    let records = ingest(dir.path());
    let stats = build_snapshot_at(records.records(), at()).statistics;

    // Acme wins CSJ-100, Beta wins CSJ-200, Gamma wins the undated file.
    let acme = stats.bidder("Acme Construction").unwrap();
    assert_eq!((acme.win_count, acme.bid_count), (1, 2));
    let beta = stats.bidder("Beta Co").unwrap();
    assert_eq!((beta.win_count, beta.bid_count), (1, 2));
    let gamma = stats.bidder("Gamma LLC").unwrap();
    assert_eq!((gamma.win_count, gamma.bid_count), (1, 1));

    assert_eq!(stats.bidder_stats[2].name, "Gamma LLC");
    assert_eq!(
        NaiveDate::from_ymd_opt(2024, 1, 9),
        records
            .iter()
            .find(|r| r.contract_number() == "CSJ-200")
            .and_then(|r| r.date().known())
    );
}
