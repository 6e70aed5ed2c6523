// =============================================================================
// CSV History Loader
// =============================================================================
//
// Parses the per-symbol yfinance CSV exports under the data directory. The
// files carry two junk header rows (column banner + ticker row) before the
// data, and date cells arrive in several shapes:
//
//   2020-01-02
//   2020-01-02 00:00:00
//   2020-01-02 00:00:00+00:00
//
// Column order is fixed: Date, Adj_Close, Close, High, Low, Open, Volume.
//
// The loader is deliberately forgiving row-by-row — leftover header rows,
// unparsable dates and incomplete numeric cells drop the row, not the file.
// Rows violating the OHLC invariant are dropped too. What survives is
// sorted by date and de-duplicated so downstream code can rely on strictly
// increasing dates.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::types::{Bar, TimeSeries};

/// Column positions in the source CSV (after the Date column).
const COL_DATE: usize = 0;
const COL_ADJ_CLOSE: usize = 1;
const COL_CLOSE: usize = 2;
const COL_HIGH: usize = 3;
const COL_LOW: usize = 4;
const COL_OPEN: usize = 5;
const COL_VOLUME: usize = 6;

/// Load one symbol's history from `<dir>/<symbol>.csv`.
///
/// Returns an error only when the file cannot be read at all; malformed rows
/// are skipped with a debug log. The resulting series may be empty — the
/// store decides whether that is worth keeping.
pub fn load_symbol(dir: &Path, symbol: &str) -> Result<TimeSeries> {
    let path = dir.join(format!("{symbol}.csv"));
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(&path)
        .with_context(|| format!("opening {}", path.display()))?;

    let mut bars: Vec<Bar> = Vec::new();
    let mut skipped = 0usize;

    for record in reader.records() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                debug!(symbol, error = %e, "skipping unreadable CSV record");
                skipped += 1;
                continue;
            }
        };
        match parse_row(&record) {
            Some(bar) => bars.push(bar),
            None => skipped += 1,
        }
    }

    // Strictly increasing dates: sort, then keep the first bar per date.
    bars.sort_by_key(|b| b.date);
    bars.dedup_by_key(|b| b.date);

    if skipped > 0 {
        debug!(symbol, skipped, kept = bars.len(), "CSV rows dropped during load");
    }
    if bars.is_empty() {
        warn!(symbol, path = %path.display(), "no usable rows in history file");
    }

    Ok(TimeSeries {
        symbol: symbol.to_string(),
        bars,
    })
}

/// Parse a single CSV record into a [`Bar`], or `None` when the row is a
/// header remnant, has a bad date, bad numerics, or violates the OHLC
/// invariant.
fn parse_row(record: &csv::StringRecord) -> Option<Bar> {
    if record.len() <= COL_VOLUME {
        return None;
    }

    let date = parse_date(record.get(COL_DATE)?)?;
    let adj_close = parse_price(record.get(COL_ADJ_CLOSE)?)?;
    let close = parse_price(record.get(COL_CLOSE)?)?;
    let high = parse_price(record.get(COL_HIGH)?)?;
    let low = parse_price(record.get(COL_LOW)?)?;
    let open = parse_price(record.get(COL_OPEN)?)?;
    // Volume sometimes arrives as "12345.0"; truncate rather than reject.
    let volume = record.get(COL_VOLUME)?.trim().parse::<f64>().ok()? as u64;

    let bar = Bar {
        date,
        open,
        high,
        low,
        close,
        adj_close,
        volume,
    };
    bar.is_valid().then_some(bar)
}

/// Parse the leading `YYYY-MM-DD` from a date cell, tolerating trailing
/// time-of-day and timezone-offset suffixes.
fn parse_date(cell: &str) -> Option<NaiveDate> {
    let cell = cell.trim();
    if cell.len() < 10 {
        return None;
    }
    NaiveDate::parse_from_str(&cell[..10], "%Y-%m-%d").ok()
}

fn parse_price(cell: &str) -> Option<f64> {
    let v = cell.trim().parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[&str]) -> csv::StringRecord {
        csv::StringRecord::from(fields.to_vec())
    }

    #[test]
    fn parses_plain_date_row() {
        let bar = parse_row(&record(&[
            "2020-01-02", "74.06", "75.09", "75.15", "73.80", "74.06", "135480400",
        ]))
        .unwrap();
        assert_eq!(bar.date, NaiveDate::from_ymd_opt(2020, 1, 2).unwrap());
        assert_eq!(bar.volume, 135_480_400);
        assert!((bar.adj_close - 74.06).abs() < 1e-12);
    }

    #[test]
    fn parses_timestamped_dates() {
        for cell in [
            "2020-01-02 00:00:00",
            "2020-01-02 00:00:00+00:00",
            "2020-01-02T00:00:00Z",
        ] {
            assert_eq!(
                parse_date(cell),
                Some(NaiveDate::from_ymd_opt(2020, 1, 2).unwrap()),
                "failed on {cell}"
            );
        }
    }

    #[test]
    fn rejects_header_remnants() {
        assert!(parse_row(&record(&[
            "Date", "Adj_Close", "Close", "High", "Low", "Open", "Volume",
        ]))
        .is_none());
        assert!(parse_row(&record(&["Ticker", "AAPL", "", "", "", "", ""])).is_none());
    }

    #[test]
    fn rejects_short_rows() {
        assert!(parse_row(&record(&["2020-01-02", "74.06"])).is_none());
    }

    #[test]
    fn rejects_invariant_violations() {
        // low above the open/close body
        assert!(parse_row(&record(&[
            "2020-01-02", "74.0", "74.0", "75.0", "74.5", "74.0", "1000",
        ]))
        .is_none());
    }

    #[test]
    fn accepts_fractional_volume() {
        let bar = parse_row(&record(&[
            "2020-01-02", "74.0", "74.0", "75.0", "73.0", "74.0", "1000.0",
        ]))
        .unwrap();
        assert_eq!(bar.volume, 1000);
    }

    #[test]
    fn load_sorts_and_dedups() {
        let dir = std::env::temp_dir().join("chartwell_csv_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("TEST.csv");
        std::fs::write(
            &path,
            "Price,Adj Close,Close,High,Low,Open,Volume\n\
             Ticker,TEST,TEST,TEST,TEST,TEST,TEST\n\
             2020-01-03,11.0,11.0,12.0,10.0,11.0,100\n\
             2020-01-02,10.0,10.0,11.0,9.0,10.0,100\n\
             2020-01-02,99.0,99.0,100.0,98.0,99.0,100\n",
        )
        .unwrap();

        let series = load_symbol(&dir, "TEST").unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(series.bars.len(), 2);
        assert!(series.bars[0].date < series.bars[1].date);
        // First occurrence after the sort wins for the duplicated date.
        assert!((series.bars[0].adj_close - 10.0).abs() < 1e-12);
    }
}
