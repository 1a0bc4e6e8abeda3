//! CSV ingest and validation.
//!
//! This module turns the preprocessed county dataset into an immutable,
//! per-county-indexed `Dataset`.
//!
//! Design goals:
//! - **Strict schema**: missing required columns are reported together
//! - **Strict rows**: one unparsable row fails the load and names its line
//! - **Deterministic layout**: records sorted by `(county, period)`, counties
//!   listed alphabetically
//! - **Separation of concerns**: no feature engineering or inference here

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::ops::Range;
use std::path::{Path, PathBuf};

use csv::StringRecord;

use crate::domain::{CountyHistory, HistoricalRecord, Period, UNKNOWN_STATE};
use crate::error::{DashError, SelectionError};

/// Accepted header names per logical column (compared lowercase).
const COUNTY_HEADERS: &[&str] = &["county"];
const STATE_HEADERS: &[&str] = &["state"];
const PERIOD_HEADERS: &[&str] = &["date", "period"];
const EV_TOTAL_HEADERS: &[&str] = &["electric vehicle (ev) total", "ev_total"];
const EV_PERCENT_HEADERS: &[&str] = &["percent electric vehicles", "ev_percent"];
const BEV_HEADERS: &[&str] = &["battery electric vehicles (bevs)", "bev_count"];
const PHEV_HEADERS: &[&str] = &["plug-in hybrid electric vehicles (phevs)", "phev_count"];
const ENCODING_HEADERS: &[&str] = &["county_encoded"];

/// Index entry for one county inside `Dataset::records`.
#[derive(Debug, Clone)]
struct CountyIndex {
    state: String,
    encoding: i64,
    rows: Range<usize>,
}

/// The loaded historical dataset. Read-only after construction.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Sorted by `(county, period)`.
    records: Vec<HistoricalRecord>,
    counties: BTreeMap<String, CountyIndex>,
    earliest: Period,
    latest: Period,
}

impl Dataset {
    /// Build a dataset from parsed records.
    ///
    /// `encodings` holds the optional `county_encoded` value per record
    /// (same order as `records`); counties without one are label-encoded by
    /// their alphabetical position.
    pub fn from_records(
        source: impl Into<PathBuf>,
        records: Vec<HistoricalRecord>,
        encodings: Vec<Option<i64>>,
    ) -> Result<Self, DashError> {
        let source = source.into();
        if records.is_empty() {
            return Err(DashError::malformed(source, None, "dataset contains no rows"));
        }

        let mut rows: Vec<(HistoricalRecord, Option<i64>)> = records
            .into_iter()
            .zip(encodings.into_iter().chain(std::iter::repeat(None)))
            .collect();
        rows.sort_by(|(a, _), (b, _)| a.county.cmp(&b.county).then(a.period.cmp(&b.period)));

        for pair in rows.windows(2) {
            let (a, b) = (&pair[0].0, &pair[1].0);
            if a.county == b.county && a.period == b.period {
                return Err(DashError::malformed(
                    source,
                    None,
                    format!("duplicate record for county '{}' in {}", a.county, a.period),
                ));
            }
        }

        let mut counties: BTreeMap<String, CountyIndex> = BTreeMap::new();
        let mut explicit: HashMap<String, i64> = HashMap::new();
        for (idx, (record, encoding)) in rows.iter().enumerate() {
            let entry = counties.entry(record.county.clone()).or_insert_with(|| CountyIndex {
                state: record.state.clone(),
                encoding: 0,
                rows: idx..idx,
            });
            entry.rows.end = idx + 1;

            if let Some(code) = encoding {
                match explicit.get(&record.county) {
                    Some(prev) if prev != code => {
                        return Err(DashError::malformed(
                            source,
                            None,
                            format!(
                                "county '{}' has conflicting county_encoded values ({prev} and {code})",
                                record.county
                            ),
                        ));
                    }
                    _ => {
                        explicit.insert(record.county.clone(), *code);
                    }
                }
            }
        }

        for (position, (name, index)) in counties.iter_mut().enumerate() {
            index.encoding = explicit.get(name).copied().unwrap_or(position as i64);
        }

        let records: Vec<HistoricalRecord> = rows.into_iter().map(|(r, _)| r).collect();
        let earliest = records.iter().map(|r| r.period).min().unwrap_or_else(|| records[0].period);
        let latest = records.iter().map(|r| r.period).max().unwrap_or_else(|| records[0].period);

        Ok(Self {
            records,
            counties,
            earliest,
            latest,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct county keys, alphabetically.
    pub fn county_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.counties.keys().map(String::as_str)
    }

    pub fn county_count(&self) -> usize {
        self.counties.len()
    }

    pub fn contains(&self, county: &str) -> bool {
        self.counties.contains_key(county)
    }

    /// Distinct state labels.
    pub fn states(&self) -> BTreeSet<&str> {
        self.counties.values().map(|c| c.state.as_str()).collect()
    }

    /// Earliest period across all counties.
    pub fn earliest_period(&self) -> Period {
        self.earliest
    }

    /// Latest period across all counties.
    pub fn latest_period(&self) -> Period {
        self.latest
    }

    /// Historical slice for one county.
    pub fn history(&self, county: &str) -> Result<CountyHistory<'_>, SelectionError> {
        let (name, index) = self
            .counties
            .get_key_value(county)
            .ok_or_else(|| SelectionError::UnknownCounty(county.to_string()))?;
        Ok(CountyHistory {
            county: name.as_str(),
            state: index.state.as_str(),
            encoding: index.encoding,
            records: &self.records[index.rows.clone()],
        })
    }

    /// Every county's history, alphabetically.
    pub fn histories(&self) -> impl Iterator<Item = CountyHistory<'_>> + '_ {
        self.counties.iter().map(|(name, index)| CountyHistory {
            county: name.as_str(),
            state: index.state.as_str(),
            encoding: index.encoding,
            records: &self.records[index.rows.clone()],
        })
    }
}

/// Resolved column positions for one file.
#[derive(Debug, Clone, Copy)]
struct Columns {
    county: usize,
    state: Option<usize>,
    period: usize,
    ev_total: usize,
    ev_percent: usize,
    bev_count: usize,
    phev_count: usize,
    county_encoded: Option<usize>,
}

/// Load and validate the dataset at `path`.
pub fn load_dataset(path: &Path) -> Result<Dataset, DashError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DashError::MissingFile {
            what: "dataset file",
            path: path.to_path_buf(),
        },
        _ => DashError::malformed(path, None, format!("failed to open: {e}")),
    })?;
    read_dataset(file, path)
}

/// Parse a dataset from any reader; `source` is used for error messages.
pub fn read_dataset<R: Read>(reader: R, source: &Path) -> Result<Dataset, DashError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| DashError::malformed(source, Some(1), format!("failed to read CSV headers: {e}")))?
        .clone();

    let columns = resolve_columns(&build_header_map(&headers))
        .map_err(|message| DashError::malformed(source, Some(1), message))?;

    let mut records = Vec::new();
    let mut encodings = Vec::new();
    let mut seen: HashMap<(String, Period), usize> = HashMap::new();

    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header line; CSV lines are 1-based.
        let line = idx + 2;
        let record = result
            .map_err(|e| DashError::malformed(source, Some(line), format!("CSV parse error: {e}")))?;

        let (row, encoding) =
            parse_row(&record, &columns).map_err(|message| DashError::malformed(source, Some(line), message))?;
        if let Some(first) = seen.insert((row.county.clone(), row.period), line) {
            return Err(DashError::malformed(
                source,
                Some(line),
                format!(
                    "duplicate record for county '{}' in {} (first seen on line {first})",
                    row.county, row.period
                ),
            ));
        }
        records.push(row);
        encodings.push(encoding);
    }

    let dataset = Dataset::from_records(source, records, encodings)?;
    tracing::info!(
        path = %source.display(),
        records = dataset.len(),
        counties = dataset.county_count(),
        "loaded dataset"
    );
    Ok(dataset)
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a BOM; without
    // stripping it the first column always reads as missing.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn find_column(header_map: &HashMap<String, usize>, aliases: &[&str]) -> Option<usize> {
    aliases.iter().find_map(|alias| header_map.get(*alias).copied())
}

fn resolve_columns(header_map: &HashMap<String, usize>) -> Result<Columns, String> {
    let required = [
        ("County", COUNTY_HEADERS),
        ("Date", PERIOD_HEADERS),
        ("Electric Vehicle (EV) Total", EV_TOTAL_HEADERS),
        ("Percent Electric Vehicles", EV_PERCENT_HEADERS),
        ("Battery Electric Vehicles (BEVs)", BEV_HEADERS),
        ("Plug-In Hybrid Electric Vehicles (PHEVs)", PHEV_HEADERS),
    ];

    let missing: Vec<&str> = required
        .iter()
        .filter(|(_, aliases)| find_column(header_map, aliases).is_none())
        .map(|(label, _)| *label)
        .collect();
    if !missing.is_empty() {
        return Err(format!("missing required columns: {}", missing.join(", ")));
    }

    let col = |aliases: &[&str]| find_column(header_map, aliases).unwrap_or_default();
    Ok(Columns {
        county: col(COUNTY_HEADERS),
        state: find_column(header_map, STATE_HEADERS),
        period: col(PERIOD_HEADERS),
        ev_total: col(EV_TOTAL_HEADERS),
        ev_percent: col(EV_PERCENT_HEADERS),
        bev_count: col(BEV_HEADERS),
        phev_count: col(PHEV_HEADERS),
        county_encoded: find_column(header_map, ENCODING_HEADERS),
    })
}

fn parse_row(record: &StringRecord, columns: &Columns) -> Result<(HistoricalRecord, Option<i64>), String> {
    let county = field(record, columns.county, "County")?.to_string();
    let state = match columns.state {
        Some(idx) => record
            .get(idx)
            .filter(|v| !v.is_empty())
            .unwrap_or(UNKNOWN_STATE)
            .to_string(),
        None => UNKNOWN_STATE.to_string(),
    };

    let raw_period = field(record, columns.period, "Date")?;
    let period = Period::parse(raw_period).ok_or_else(|| format!("unparsable date '{raw_period}'"))?;

    let ev_total = parse_count(field(record, columns.ev_total, "Electric Vehicle (EV) Total")?, "ev_total")?;
    let bev_count = parse_count(field(record, columns.bev_count, "Battery Electric Vehicles (BEVs)")?, "bev_count")?;
    let phev_count = parse_count(
        field(record, columns.phev_count, "Plug-In Hybrid Electric Vehicles (PHEVs)")?,
        "phev_count",
    )?;

    let raw_percent = field(record, columns.ev_percent, "Percent Electric Vehicles")?;
    let ev_percent: f64 = raw_percent
        .parse()
        .map_err(|_| format!("invalid ev_percent '{raw_percent}'"))?;
    if !ev_percent.is_finite() || ev_percent < 0.0 {
        return Err(format!("invalid ev_percent '{raw_percent}'"));
    }

    let encoding = match columns.county_encoded.and_then(|idx| record.get(idx)) {
        Some(raw) if !raw.is_empty() => Some(parse_encoding(raw)?),
        _ => None,
    };

    Ok((
        HistoricalRecord {
            county,
            state,
            period,
            ev_total,
            ev_percent,
            bev_count,
            phev_count,
        },
        encoding,
    ))
}

fn field<'a>(record: &'a StringRecord, idx: usize, name: &str) -> Result<&'a str, String> {
    record
        .get(idx)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| format!("missing value for `{name}`"))
}

/// Parse a non-negative count. pandas writes integer columns with missing
/// values as floats, so integral floats (`"5000.0"`) are accepted.
fn parse_count(raw: &str, name: &str) -> Result<u64, String> {
    if let Ok(v) = raw.parse::<u64>() {
        return Ok(v);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 => Ok(v as u64),
        _ => Err(format!("invalid {name} '{raw}' (expected a non-negative whole number)")),
    }
}

fn parse_encoding(raw: &str) -> Result<i64, String> {
    if let Ok(v) = raw.parse::<i64>() {
        return Ok(v);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 => Ok(v as i64),
        _ => Err(format!("invalid county_encoded '{raw}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(csv: &str) -> Result<Dataset, DashError> {
        read_dataset(csv.as_bytes(), Path::new("test.csv"))
    }

    const ORIGINAL_HEADERS: &str = "Date,County,State,Electric Vehicle (EV) Total,Percent Electric Vehicles,\
Battery Electric Vehicles (BEVs),Plug-In Hybrid Electric Vehicles (PHEVs)\n";

    #[test]
    fn loads_original_headers_and_sorts_per_county() {
        let csv = format!(
            "{ORIGINAL_HEADERS}\
2023-02-28,King,WA,110,1.1,80,30\n\
2023-01-31,King,WA,100,1.0,70,30\n\
2023-01-31,Adams,WA,5,0.2,3,2\n"
        );
        let ds = parse(&csv).unwrap();

        assert_eq!(ds.len(), 3);
        assert_eq!(ds.county_names().collect::<Vec<_>>(), vec!["Adams", "King"]);

        let king = ds.history("King").unwrap();
        assert_eq!(king.records.len(), 2);
        assert_eq!(king.first_period(), Period::new(2023, 1));
        assert_eq!(king.last_period(), Period::new(2023, 2));
        assert_eq!(king.latest().unwrap().ev_total, 110);
        assert_eq!(king.state, "WA");

        assert_eq!(ds.earliest_period(), Period::new(2023, 1).unwrap());
        assert_eq!(ds.latest_period(), Period::new(2023, 2).unwrap());
    }

    #[test]
    fn short_aliases_bom_and_float_counts() {
        let csv = "\u{feff}county,period,ev_total,ev_percent,bev_count,phev_count\n\
King,2023-12,5000.0,2.5,3500,1500.0\n";
        let ds = parse(csv).unwrap();
        let king = ds.history("King").unwrap();
        assert_eq!(king.latest().unwrap().ev_total, 5000);
        assert_eq!(king.latest().unwrap().phev_count, 1500);
        assert_eq!(king.state, UNKNOWN_STATE);
    }

    #[test]
    fn missing_columns_are_listed_together() {
        let err = parse("County,Date,Electric Vehicle (EV) Total\nKing,2023-01-31,5\n").unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, DashError::MalformedData { line: Some(1), .. }));
        assert!(msg.contains("Percent Electric Vehicles"), "{msg}");
        assert!(msg.contains("Battery Electric Vehicles (BEVs)"), "{msg}");
        assert!(msg.contains("Plug-In Hybrid Electric Vehicles (PHEVs)"), "{msg}");
        assert!(!msg.contains("County,"), "{msg}");
    }

    #[test]
    fn bad_row_fails_with_line_number() {
        let csv = format!(
            "{ORIGINAL_HEADERS}\
2023-01-31,King,WA,100,1.0,70,30\n\
2023-02-28,King,WA,lots,1.0,70,30\n"
        );
        match parse(&csv).unwrap_err() {
            DashError::MalformedData { line, message, .. } => {
                assert_eq!(line, Some(3));
                assert!(message.contains("ev_total"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_negative_and_fractional_counts() {
        assert!(parse_count("-1", "ev_total").is_err());
        assert!(parse_count("1.5", "ev_total").is_err());
        assert_eq!(parse_count("12.0", "ev_total").unwrap(), 12);
    }

    #[test]
    fn rejects_bad_dates_and_duplicates() {
        let bad_date = format!("{ORIGINAL_HEADERS}someday,King,WA,1,1.0,1,0\n");
        assert!(matches!(
            parse(&bad_date).unwrap_err(),
            DashError::MalformedData { line: Some(2), .. }
        ));

        let duplicate = format!(
            "{ORIGINAL_HEADERS}\
2023-01-31,King,WA,1,1.0,1,0\n\
2023-01-15,King,WA,2,1.0,1,1\n"
        );
        let err = parse(&duplicate).unwrap_err();
        assert!(matches!(err, DashError::MalformedData { line: Some(3), .. }), "{err:?}");
        assert!(err.to_string().contains("duplicate record"), "{err}");
        assert!(err.to_string().contains("first seen on line 2"), "{err}");

        // The repeat may sit several lines below the first occurrence.
        let spread = format!(
            "{ORIGINAL_HEADERS}\
2023-01-31,King,WA,1,1.0,1,0\n\
2023-01-31,Pierce,WA,1,1.0,1,0\n\
2023-01-15,King,WA,2,1.0,1,1\n"
        );
        assert!(matches!(
            parse(&spread).unwrap_err(),
            DashError::MalformedData { line: Some(4), .. }
        ));
    }

    #[test]
    fn header_only_file_is_malformed() {
        let err = parse(ORIGINAL_HEADERS).unwrap_err();
        assert!(err.to_string().contains("no rows"), "{err}");
    }

    #[test]
    fn label_encoding_follows_alphabetical_order() {
        let csv = format!(
            "{ORIGINAL_HEADERS}\
2023-01-31,Yakima,WA,1,1.0,1,0\n\
2023-01-31,Adams,WA,1,1.0,1,0\n\
2023-01-31,King,WA,1,1.0,1,0\n"
        );
        let ds = parse(&csv).unwrap();
        assert_eq!(ds.history("Adams").unwrap().encoding, 0);
        assert_eq!(ds.history("King").unwrap().encoding, 1);
        assert_eq!(ds.history("Yakima").unwrap().encoding, 2);
    }

    #[test]
    fn explicit_encoding_wins_and_must_be_consistent() {
        let csv = "County,Date,ev_total,ev_percent,bev_count,phev_count,county_encoded\n\
King,2023-01,1,1.0,1,0,17\n\
King,2023-02,2,1.0,1,1,17.0\n";
        let ds = parse(csv).unwrap();
        assert_eq!(ds.history("King").unwrap().encoding, 17);

        let conflicting = "County,Date,ev_total,ev_percent,bev_count,phev_count,county_encoded\n\
King,2023-01,1,1.0,1,0,17\n\
King,2023-02,2,1.0,1,1,18\n";
        assert!(parse(conflicting).unwrap_err().to_string().contains("conflicting"));
    }

    #[test]
    fn unknown_county_is_a_selection_error() {
        let ds = parse(&format!("{ORIGINAL_HEADERS}2023-01-31,King,WA,1,1.0,1,0\n")).unwrap();
        assert_eq!(
            ds.history("Atlantis").unwrap_err(),
            SelectionError::UnknownCounty("Atlantis".to_string())
        );
        assert!(ds.contains("King"));
        assert!(!ds.contains("king"));
    }

    #[test]
    fn missing_file_is_reported_as_such() {
        let err = load_dataset(Path::new("does/not/exist.csv")).unwrap_err();
        assert!(matches!(err, DashError::MissingFile { .. }));
        assert_eq!(err.exit_code(), 2);
    }
}
