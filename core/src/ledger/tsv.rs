//! Tab-separated ledger files
//!
//! One header row with [`LEDGER_COLUMNS`] followed by [`MARKET_COLUMNS`],
//! then one row per record. The market columns hold the price snapshot of the
//! record and are left empty when it has none; files with only the ledger
//! columns are accepted too. Amounts are written with the shortest
//! representation that reads back to the same value, so `50.0` becomes `50`.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{ExpenseLedger, ExpenseRecord, LEDGER_COLUMNS, MARKET_COLUMNS};
use crate::economy::{MarketPrices, ResourceVector};

/// Ledger file errors
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to access ledger {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unexpected ledger header {found:?}")]
    Header { found: String },

    #[error("line {line}: {reason}")]
    Row { line: usize, reason: String },
}

/// Cached ledger location for a recording: same directory, `.tsv` extension
pub fn cached_tsv_path(recording: &Path) -> PathBuf {
    recording.with_extension("tsv")
}

fn clean_name(name: &str) -> String {
    name.replace(['\t', '\n', '\r'], " ")
}

impl ExpenseLedger {
    /// Write the ledger as TSV
    pub fn write_tsv<W: Write>(&self, mut writer: W) -> Result<(), LedgerError> {
        writeln!(
            writer,
            "{}\t{}",
            LEDGER_COLUMNS.join("\t"),
            MARKET_COLUMNS.join("\t")
        )?;
        for r in &self.records {
            let prices = match r.prices {
                Some(p) => format!("{}\t{}\t{}", p.wood, p.food, p.stone),
                None => "\t\t".to_string(),
            };
            writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                r.timestamp,
                r.action,
                r.player,
                r.entity_id,
                r.delta.wood,
                r.delta.food,
                r.delta.gold,
                r.delta.stone,
                clean_name(&r.name),
                prices
            )?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Render the ledger as a TSV string
    pub fn to_tsv_string(&self) -> Result<String, LedgerError> {
        let mut buffer = Vec::new();
        self.write_tsv(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Write the ledger to a TSV file
    pub fn save_tsv(&self, path: &Path) -> Result<(), LedgerError> {
        let file = File::create(path).map_err(|source| LedgerError::File {
            path: path.to_path_buf(),
            source,
        })?;
        self.write_tsv(BufWriter::new(file))?;
        tracing::info!("Wrote {} records to {}", self.len(), path.display());
        Ok(())
    }

    /// Read a ledger written by [`ExpenseLedger::write_tsv`]
    pub fn read_tsv<R: BufRead>(reader: R) -> Result<Self, LedgerError> {
        let mut lines = reader.lines();

        let header = lines.next().transpose()?.unwrap_or_default();
        let columns: Vec<_> = header.trim_end_matches('\r').split('\t').collect();
        let with_prices = columns.len() == LEDGER_COLUMNS.len() + MARKET_COLUMNS.len()
            && columns[LEDGER_COLUMNS.len()..] == MARKET_COLUMNS;
        if columns.len() < LEDGER_COLUMNS.len()
            || columns[..LEDGER_COLUMNS.len()] != LEDGER_COLUMNS
            || (columns.len() > LEDGER_COLUMNS.len() && !with_prices)
        {
            return Err(LedgerError::Header { found: header });
        }
        let width = columns.len();

        let mut records = Vec::new();
        for (index, line) in lines.enumerate() {
            let line = line?;
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            // Header is line 1
            let number = index + 2;
            let record = parse_row(line, width).map_err(|reason| LedgerError::Row {
                line: number,
                reason,
            })?;
            if let Some(last) = records.last().map(|r: &ExpenseRecord| r.timestamp) {
                if record.timestamp < last {
                    return Err(LedgerError::Row {
                        line: number,
                        reason: format!("timestamp {} is before {}", record.timestamp, last),
                    });
                }
            }
            records.push(record);
        }

        Ok(Self { records })
    }

    pub fn from_tsv_str(tsv: &str) -> Result<Self, LedgerError> {
        Self::read_tsv(tsv.as_bytes())
    }

    /// Read a ledger from a TSV file
    pub fn load_tsv(path: &Path) -> Result<Self, LedgerError> {
        let file = File::open(path).map_err(|source| LedgerError::File {
            path: path.to_path_buf(),
            source,
        })?;
        let ledger = Self::read_tsv(BufReader::new(file))?;
        tracing::info!("Loaded {} records from {}", ledger.len(), path.display());
        Ok(ledger)
    }
}

fn parse_row(line: &str, width: usize) -> Result<ExpenseRecord, String> {
    let fields: Vec<_> = line.split('\t').collect();
    if fields.len() != width {
        return Err(format!("expected {} columns, found {}", width, fields.len()));
    }

    fn number<T: std::str::FromStr>(column: &str, value: &str) -> Result<T, String> {
        value
            .trim()
            .parse()
            .map_err(|_| format!("invalid {} value {:?}", column, value))
    }

    Ok(ExpenseRecord {
        timestamp: number("ts", fields[0])?,
        action: fields[1].to_string(),
        player: number("player", fields[2])?,
        entity_id: number("id", fields[3])?,
        delta: ResourceVector::new(
            number("wood", fields[4])?,
            number("food", fields[5])?,
            number("gold", fields[6])?,
            number("stone", fields[7])?,
        ),
        name: fields[8].to_string(),
        prices: parse_prices(&fields[LEDGER_COLUMNS.len()..])?,
    })
}

fn parse_prices(fields: &[&str]) -> Result<Option<MarketPrices>, String> {
    if fields.is_empty() || fields.iter().all(|f| f.trim().is_empty()) {
        return Ok(None);
    }
    let mut prices = [0.0; 3];
    for ((price, column), value) in prices.iter_mut().zip(MARKET_COLUMNS).zip(fields) {
        *price = value
            .trim()
            .parse()
            .map_err(|_| format!("invalid {} value {:?}", column, value))?;
    }
    Ok(Some(MarketPrices {
        wood: prices[0],
        food: prices[1],
        stone: prices[2],
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::record;

    fn sample() -> ExpenseLedger {
        let mut sell = record(
            5000,
            "SELL",
            1,
            0,
            ResourceVector::new(0.0, -100.0, 70.0, 0.0),
            "sell food",
        );
        sell.prices = Some(MarketPrices {
            food: 97.0,
            ..MarketPrices::default()
        });
        vec![
            record(1352, "RESEARCH", 4, 22, ResourceVector::new(0.0, 0.0, 0.0, 50.0), "Loom"),
            sell,
            record(6000, "BUY", 2, 0, ResourceVector::new(0.0, 0.0, -172.9, 100.0), "buy stone"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_write_tsv_layout() {
        let tsv = sample().to_tsv_string().unwrap();
        let lines: Vec<_> = tsv.lines().collect();

        assert_eq!(
            lines[0],
            "ts\ttype\tplayer\tid\twood\tfood\tgold\tstone\tname\twood_market\tfood_market\tstone_market"
        );
        assert_eq!(lines[1], "1352\tRESEARCH\t4\t22\t0\t0\t0\t50\tLoom\t\t\t");
        assert_eq!(lines[2], "5000\tSELL\t1\t0\t0\t-100\t70\t0\tsell food\t100\t97\t130");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_reads_ledger_without_market_columns() {
        let tsv = "ts\ttype\tplayer\tid\twood\tfood\tgold\tstone\tname\n\
                   1352\tRESEARCH\t4\t22\t0\t0\t0\t50\tLoom\n";
        let ledger = ExpenseLedger::from_tsv_str(tsv).unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.records()[0].prices, None);
        assert_eq!(ledger.records()[0].delta.stone, 50.0);
    }

    #[test]
    fn test_read_back_written_ledger() {
        let ledger = sample();
        let parsed = ExpenseLedger::from_tsv_str(&ledger.to_tsv_string().unwrap()).unwrap();
        assert_eq!(parsed, ledger);
    }

    #[test]
    fn test_rejects_foreign_header() {
        let err = ExpenseLedger::from_tsv_str("time\ttype\n").unwrap_err();
        assert!(matches!(err, LedgerError::Header { .. }));

        let err = ExpenseLedger::from_tsv_str("").unwrap_err();
        assert!(matches!(err, LedgerError::Header { .. }));
    }

    #[test]
    fn test_reports_bad_row_line() {
        let tsv = "ts\ttype\tplayer\tid\twood\tfood\tgold\tstone\tname\n\
                   10\tBUILD\t1\t70\t25\t0\t0\t0\tHouse\n\
                   20\tBUILD\t1\t70\tlots\t0\t0\t0\tHouse\n";
        let err = ExpenseLedger::from_tsv_str(tsv).unwrap_err();
        match err {
            LedgerError::Row { line, reason } => {
                assert_eq!(line, 3);
                assert!(reason.contains("wood"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_tabs_in_names_are_replaced() {
        let ledger: ExpenseLedger = vec![record(
            0,
            "BUILD",
            1,
            70,
            ResourceVector::zero(),
            "Odd\tName",
        )]
        .into_iter()
        .collect();
        let parsed = ExpenseLedger::from_tsv_str(&ledger.to_tsv_string().unwrap()).unwrap();
        assert_eq!(parsed.records()[0].name, "Odd Name");
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.tsv");

        let ledger = sample();
        ledger.save_tsv(&path).unwrap();
        assert_eq!(ExpenseLedger::load_tsv(&path).unwrap(), ledger);
    }

    #[test]
    fn test_cached_path() {
        assert_eq!(
            cached_tsv_path(Path::new("/replays/MP Replay v101.aoe2record")),
            PathBuf::from("/replays/MP Replay v101.tsv")
        );
        assert_eq!(
            cached_tsv_path(Path::new("game.json")),
            PathBuf::from("game.tsv")
        );
    }
}
