//! Bid tabulation file parser.
//!
//! Extracts contract metadata, the engineer's estimate and every bidder line
//! from one plain-text tabulation. Fields are located by keyword anywhere on a
//! line, not by column. Each field is extracted independently; a missing or
//! malformed field falls back to its default and never aborts the parse.

use bidtab_core::config::ParserConfig;
use bidtab_core::{
    make_record_id, Amount, BidDate, BidRecord, Bidder, Error, RecordFields, Result, UNKNOWN,
};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::fmt;
use tracing::debug;

const COUNTY_MARKER: &str = "COUNTY";
const TYPE_MARKER: &str = "TYPE";
const DATE_MARKER: &str = "DATE";
const CONTRACT_MARKER: &str = "CONTRACT NUMBER";
const ESTIMATE_MARKER: &str = "*****ESTIMATE*****";
const BIDDER_TOKEN: &str = "BIDDER";

/// Metadata fields that have a default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordField {
    County,
    ProjectType,
    Date,
    ContractNumber,
    EngineerEstimate,
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordField::County => "county",
            RecordField::ProjectType => "projectType",
            RecordField::Date => "date",
            RecordField::ContractNumber => "contractNumber",
            RecordField::EngineerEstimate => "engineerEstimate",
        };
        f.write_str(name)
    }
}

/// Why a field took its default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultReason {
    /// No line carried the field's marker.
    MarkerMissing,
    /// The marker line was found but its value could not be read.
    Malformed,
}

/// A field that fell back to its default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDefault {
    pub field: RecordField,
    pub reason: DefaultReason,
}

/// Parsed record plus what the parser had to substitute or skip.
#[derive(Debug, Clone)]
pub struct ParseReport {
    pub record: BidRecord,
    pub defaults: Vec<FieldDefault>,
    /// `BIDDER` lines with a `$` whose amount could not be read.
    pub skipped_bidder_lines: usize,
}

impl ParseReport {
    /// True when every metadata field was found and no bidder line was dropped.
    pub fn is_complete(&self) -> bool {
        self.defaults.is_empty() && self.skipped_bidder_lines == 0
    }

    /// Whether `field` fell back to its default.
    pub fn defaulted(&self, field: RecordField) -> bool {
        self.defaults.iter().any(|d| d.field == field)
    }
}

type Extracted<T> = std::result::Result<T, DefaultReason>;

/// Parser for bid tabulation text files.
///
/// Holds the compiled extraction patterns; shareable across threads.
pub struct BidFileParser {
    date_pattern: Regex,
    estimate_pattern: Regex,
    century_base: i32,
}

impl BidFileParser {
    /// Create a parser from configuration.
    pub fn new(config: &ParserConfig) -> Result<Self> {
        Ok(Self {
            date_pattern: Regex::new(r"DATE\s+([0-9]{2})/([0-9]{2})/([0-9]{2})")?,
            estimate_pattern: Regex::new(r"\$([0-9,]+\.[0-9]{2})")?,
            century_base: config.century_base,
        })
    }

    /// Parse file text, stamping the record id with the current time.
    pub fn parse(&self, content: &str, filename: &str) -> BidRecord {
        self.parse_at(content, filename, Utc::now())
    }

    /// Parse file text with an explicit parse time.
    pub fn parse_at(&self, content: &str, filename: &str, parsed_at: DateTime<Utc>) -> BidRecord {
        self.parse_with_report(content, filename, parsed_at).record
    }

    /// Parse raw file bytes. Fails only when the bytes are not UTF-8 text.
    pub fn parse_bytes(&self, bytes: &[u8], filename: &str) -> Result<BidRecord> {
        let content =
            std::str::from_utf8(bytes).map_err(|_| Error::input_encoding(filename))?;
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        Ok(self.parse(content, filename))
    }

    /// Parse file text and report which fields took defaults.
    pub fn parse_with_report(
        &self,
        content: &str,
        filename: &str,
        parsed_at: DateTime<Utc>,
    ) -> ParseReport {
        let lines: Vec<&str> = content.lines().collect();
        let mut defaults = Vec::new();

        let county = or_default(
            extract_county(&lines),
            RecordField::County,
            UNKNOWN.to_string(),
            filename,
            &mut defaults,
        );
        let project_type = or_default(
            extract_project_type(&lines),
            RecordField::ProjectType,
            UNKNOWN.to_string(),
            filename,
            &mut defaults,
        );
        let date = or_default(
            self.extract_date(&lines),
            RecordField::Date,
            BidDate::Unknown,
            filename,
            &mut defaults,
        );
        let contract_number = or_default(
            extract_contract_number(&lines),
            RecordField::ContractNumber,
            UNKNOWN.to_string(),
            filename,
            &mut defaults,
        );
        let engineer_estimate = or_default(
            self.extract_estimate(&lines),
            RecordField::EngineerEstimate,
            0.0,
            filename,
            &mut defaults,
        );

        let (bidders, skipped_bidder_lines) = extract_bidders(&lines);
        if skipped_bidder_lines > 0 {
            debug!(filename, skipped = skipped_bidder_lines, "skipped unreadable bidder lines");
        }

        let record = BidRecord::new(RecordFields {
            id: make_record_id(filename, parsed_at),
            filename: filename.to_string(),
            county,
            project_type,
            date,
            contract_number,
            engineer_estimate,
            bidders,
        });

        debug!(
            filename,
            bidders = record.bidders().len(),
            lowest_bid = record.lowest_bid(),
            "parsed bid file"
        );

        ParseReport {
            record,
            defaults,
            skipped_bidder_lines,
        }
    }

    /// `DATE MM/DD/YY` on the first line mentioning `DATE`.
    fn extract_date(&self, lines: &[&str]) -> Extracted<BidDate> {
        let line = first_line_with(lines, DATE_MARKER).ok_or(DefaultReason::MarkerMissing)?;
        let caps = self
            .date_pattern
            .captures(line)
            .ok_or(DefaultReason::Malformed)?;

        let number = |i: usize| caps[i].parse::<u32>().map_err(|_| DefaultReason::Malformed);
        let (month, day, year) = (number(1)?, number(2)?, number(3)?);

        let year = self
            .century_base
            .checked_add(year as i32)
            .ok_or(DefaultReason::Malformed)?;
        match BidDate::from_ymd(year, month, day) {
            BidDate::Unknown => Err(DefaultReason::Malformed),
            date => Ok(date),
        }
    }

    /// First `$1,234.56` amount on the estimate marker line.
    fn extract_estimate(&self, lines: &[&str]) -> Extracted<Amount> {
        let line =
            first_line_with(lines, ESTIMATE_MARKER).ok_or(DefaultReason::MarkerMissing)?;
        let caps = self
            .estimate_pattern
            .captures(line)
            .ok_or(DefaultReason::Malformed)?;
        parse_amount(&caps[1]).ok_or(DefaultReason::Malformed)
    }
}

fn or_default<T>(
    extracted: Extracted<T>,
    field: RecordField,
    default: T,
    filename: &str,
    defaults: &mut Vec<FieldDefault>,
) -> T {
    match extracted {
        Ok(value) => value,
        Err(reason) => {
            debug!(filename, %field, ?reason, "using default value");
            defaults.push(FieldDefault { field, reason });
            default
        }
    }
}

fn first_line_with<'a>(lines: &[&'a str], marker: &str) -> Option<&'a str> {
    lines.iter().copied().find(|line| line.contains(marker))
}

/// Token following the `COUNTY` token.
fn extract_county(lines: &[&str]) -> Extracted<String> {
    let line = first_line_with(lines, COUNTY_MARKER).ok_or(DefaultReason::MarkerMissing)?;
    let mut tokens = line.split_whitespace();
    tokens
        .find(|token| token.contains(COUNTY_MARKER))
        .ok_or(DefaultReason::Malformed)?;
    tokens
        .next()
        .map(str::to_string)
        .ok_or(DefaultReason::Malformed)
}

/// The `TYPE` line with its leading `TYPE` token removed.
fn extract_project_type(lines: &[&str]) -> Extracted<String> {
    let line = first_line_with(lines, TYPE_MARKER).ok_or(DefaultReason::MarkerMissing)?;
    let trimmed = line.trim();
    let value = match trimmed.strip_prefix(TYPE_MARKER) {
        Some(rest) if rest.starts_with(char::is_whitespace) => rest.trim_start(),
        _ => trimmed,
    };
    Ok(value.to_string())
}

/// Last token of the `CONTRACT NUMBER` line.
fn extract_contract_number(lines: &[&str]) -> Extracted<String> {
    let line = first_line_with(lines, CONTRACT_MARKER).ok_or(DefaultReason::MarkerMissing)?;
    line.split_whitespace()
        .last()
        .map(str::to_string)
        .ok_or(DefaultReason::Malformed)
}

/// Every `BIDDER ... $amount name` line, in file order.
/// Returns the bidders and the number of candidate lines that were skipped.
fn extract_bidders(lines: &[&str]) -> (Vec<Bidder>, usize) {
    let mut bidders = Vec::new();
    let mut skipped = 0;

    for line in lines {
        let trimmed = line.trim();
        let is_bidder_line = trimmed
            .strip_prefix(BIDDER_TOKEN)
            .is_some_and(|rest| rest.starts_with(char::is_whitespace));
        if !is_bidder_line || !trimmed.contains('$') {
            continue;
        }

        match parse_bidder_line(trimmed) {
            Some(bidder) => bidders.push(bidder),
            None => skipped += 1,
        }
    }

    (bidders, skipped)
}

fn parse_bidder_line(line: &str) -> Option<Bidder> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let amount_index = parts
        .iter()
        .skip(1)
        .position(|part| part.starts_with('$'))?
        + 1;
    let amount = parse_amount(parts[amount_index])?;

    let number = format!("{}{}", parts[0].replacen(BIDDER_TOKEN, "", 1), parts[1]);
    let name = parts[amount_index + 1..].join(" ");

    Some(Bidder::new(number, name, amount))
}

/// Parse `$1,234.56` (or `1234.56`). Rejects negative and non-finite values.
fn parse_amount(raw: &str) -> Option<Amount> {
    let cleaned: String = raw.chars().filter(|c| *c != '$' && *c != ',').collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    const SAMPLE: &str = "\
TEXAS DEPARTMENT OF TRANSPORTATION
COUNTY HARRIS           HIGHWAY IH 45
TYPE BRIDGE REPAIR
LETTING DATE 03/15/24
CONTRACT NUMBER CSJ-100
*****ESTIMATE*****                 $1,000,000.00
BIDDER 1 A $950,000.00 Acme Construction
BIDDER 2 A $980,000.00 Beta Co
";

    fn parser() -> BidFileParser {
        BidFileParser::new(&ParserConfig::default()).unwrap()
    }

    fn at() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_710_460_800_000).unwrap()
    }

    #[test]
    fn test_parse_sample() {
        let report = parser().parse_with_report(SAMPLE, "CSJ100.TXT", at());
        let record = &report.record;

        assert!(report.is_complete());
        assert_eq!(record.id(), "CSJ100.TXT-1710460800000");
        assert_eq!(record.filename(), "CSJ100.TXT");
        assert_eq!(record.county(), "HARRIS");
        assert_eq!(record.project_type(), "BRIDGE REPAIR");
        assert_eq!(
            record.date().known(),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
        assert_eq!(record.contract_number(), "CSJ-100");
        assert_relative_eq!(record.engineer_estimate(), 1_000_000.0);
        assert_relative_eq!(record.lowest_bid(), 950_000.0);
        assert_relative_eq!(record.diff_from_estimate(), -5.0);
    }

    #[test]
    fn test_bidder_fields() {
        let record = parser().parse_at(SAMPLE, "a.TXT", at());
        let bidders = record.bidders();

        assert_eq!(bidders.len(), 2);
        assert_eq!(bidders[0].number, "1");
        assert_eq!(bidders[0].name, "Acme Construction");
        assert_eq!(bidders[0].amount, 950_000.0);
        assert_eq!(bidders[1].number, "2");
        assert_eq!(bidders[1].name, "Beta Co");
    }

    #[test]
    fn test_empty_input_uses_defaults() {
        let report = parser().parse_with_report("", "empty.TXT", at());
        let record = &report.record;

        assert_eq!(record.county(), UNKNOWN);
        assert_eq!(record.project_type(), UNKNOWN);
        assert_eq!(record.date(), BidDate::Unknown);
        assert_eq!(record.contract_number(), UNKNOWN);
        assert_eq!(record.engineer_estimate(), 0.0);
        assert!(record.bidders().is_empty());
        assert_eq!(record.lowest_bid(), 0.0);
        assert_eq!(record.diff_from_estimate(), 0.0);

        assert_eq!(report.defaults.len(), 5);
        assert!(report
            .defaults
            .iter()
            .all(|d| d.reason == DefaultReason::MarkerMissing));
    }

    #[test]
    fn test_malformed_date_and_estimate() {
        let content = "BID DATE TBD\n*****ESTIMATE***** pending\n";
        let report = parser().parse_with_report(content, "x.TXT", at());

        assert_eq!(report.record.date(), BidDate::Unknown);
        assert_eq!(report.record.engineer_estimate(), 0.0);
        assert!(report.defaults.contains(&FieldDefault {
            field: RecordField::Date,
            reason: DefaultReason::Malformed,
        }));
        assert!(report.defaults.contains(&FieldDefault {
            field: RecordField::EngineerEstimate,
            reason: DefaultReason::Malformed,
        }));
    }

    #[test]
    fn test_impossible_calendar_date_is_unknown() {
        let record = parser().parse_at("DATE 13/45/24\n", "x.TXT", at());
        assert_eq!(record.date(), BidDate::Unknown);
    }

    #[test]
    fn test_century_base_from_config() {
        let config = ParserConfig {
            century_base: 1900,
            ..ParserConfig::default()
        };
        let parser = BidFileParser::new(&config).unwrap();
        let record = parser.parse_at("DATE 07/04/99\n", "x.TXT", at());
        assert_eq!(record.date().to_string(), "1999-07-04");
    }

    #[test]
    fn test_overflowing_century_base_is_malformed_date() {
        let config = ParserConfig {
            century_base: i32::MAX,
            ..ParserConfig::default()
        };
        let parser = BidFileParser::new(&config).unwrap();
        let report = parser.parse_with_report("DATE 07/04/99\n", "x.TXT", at());
        assert_eq!(report.record.date(), BidDate::Unknown);
        assert!(report.defaults.contains(&FieldDefault {
            field: RecordField::Date,
            reason: DefaultReason::Malformed,
        }));
    }

    #[test]
    fn test_only_first_marker_line_is_used() {
        let content = "COUNTY\nCOUNTY TRAVIS\n";
        let report = parser().parse_with_report(content, "x.TXT", at());
        assert_eq!(report.record.county(), UNKNOWN);
        assert!(report.defaulted(RecordField::County));
    }

    #[test]
    fn test_type_line_without_leading_token_kept_whole() {
        let record = parser().parse_at("  WORK TYPE: OVERLAY  \n", "x.TXT", at());
        assert_eq!(record.project_type(), "WORK TYPE: OVERLAY");
    }

    #[test]
    fn test_contract_number_is_last_token() {
        let record = parser().parse_at("CONTRACT NUMBER  PROJ  0912-34-567\n", "x.TXT", at());
        assert_eq!(record.contract_number(), "0912-34-567");
    }

    #[test]
    fn test_unreadable_bidder_lines_skipped() {
        let content = "\
BIDDER 1 A NO BID $ SEE NOTE
BIDDER 2 A $500.00 Gamma LLC
BIDDER 3 A US$700.00 Foreign Bid
BIDDERS LIST $ SUMMARY
";
        let report = parser().parse_with_report(content, "x.TXT", at());
        let bidders = report.record.bidders();

        assert_eq!(bidders.len(), 1);
        assert_eq!(bidders[0].name, "Gamma LLC");
        // A bare "$" has no amount and "US$700.00" is not a dollar token.
        // "BIDDERS" is not the BIDDER token at all.
        assert_eq!(report.skipped_bidder_lines, 2);
    }

    #[test]
    fn test_bidder_with_empty_name() {
        let record = parser().parse_at("BIDDER 3 B $1,234.50\n", "x.TXT", at());
        let bidder = &record.bidders()[0];
        assert_eq!(bidder.number, "3");
        assert_eq!(bidder.name, "");
        assert_relative_eq!(bidder.amount, 1234.5);
    }

    #[test]
    fn test_indented_bidder_line_and_crlf() {
        let content = "COUNTY DALLAS\r\n   BIDDER 1 A $10.00 Delta Paving Inc\r\n";
        let record = parser().parse_at(content, "x.TXT", at());
        assert_eq!(record.county(), "DALLAS");
        assert_eq!(record.bidders()[0].name, "Delta Paving Inc");
    }

    #[test]
    fn test_tied_lowest_bid() {
        let content = "BIDDER 1 A $100.00 One\nBIDDER 2 A $100.00 Two\nBIDDER 3 A $120.00 Three\n";
        let record = parser().parse_at(content, "x.TXT", at());
        assert_eq!(record.lowest_bid(), 100.0);
        assert_eq!(record.winners().count(), 2);
    }

    #[test]
    fn test_parse_is_deterministic() {
        let p = parser();
        let a = p.parse_at(SAMPLE, "a.TXT", at());
        let b = p.parse_at(SAMPLE, "a.TXT", at());
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_bytes_rejects_invalid_utf8() {
        let err = parser().parse_bytes(&[0x43, 0xff, 0xfe, 0x00], "bad.TXT").unwrap_err();
        assert!(matches!(err, Error::InputEncoding { ref filename } if filename == "bad.TXT"));
    }

    #[test]
    fn test_parse_bytes_strips_bom() {
        let mut bytes = "\u{feff}".as_bytes().to_vec();
        bytes.extend_from_slice(SAMPLE.as_bytes());
        let record = parser().parse_bytes(&bytes, "bom.TXT").unwrap();
        assert_eq!(record.county(), "HARRIS");
        assert!(record.id().starts_with("bom.TXT-"));
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("$1,234,567.89"), Some(1_234_567.89));
        assert_eq!(parse_amount("$-5.00"), None);
        assert_eq!(parse_amount("$"), None);
        assert_eq!(parse_amount("$1.2.3"), None);
    }
}
