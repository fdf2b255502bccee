//! Minimal CSV table used for the clip manifest and the feature dataset

use std::fs;
use std::path::Path;

use anyhow::{bail, ensure, Context, Result};

/// In-memory CSV table with a header row; every row has one cell per header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    pub fn push_row(&mut self, row: Vec<String>) -> Result<()> {
        ensure!(
            row.len() == self.headers.len(),
            "row has {} cells but table has {} columns",
            row.len(),
            self.headers.len()
        );
        self.rows.push(row);
        Ok(())
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read CSV file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Failed to parse CSV file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut records = parse_records(text)?.into_iter();
        let headers = match records.next() {
            Some(headers) => headers,
            None => bail!("CSV input has no header row"),
        };
        let mut table = Table {
            headers,
            rows: Vec::new(),
        };
        for (idx, record) in records.enumerate() {
            table
                .push_row(record)
                .with_context(|| format!("Malformed CSV record {}", idx + 1))?;
        }
        Ok(table)
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_csv_string())
            .with_context(|| format!("Failed to write CSV file {}", path.display()))
    }

    pub fn to_csv_string(&self) -> String {
        let mut out = String::new();
        write_record(&mut out, &self.headers);
        for row in &self.rows {
            write_record(&mut out, row);
        }
        out
    }
}

fn write_record(out: &mut String, cells: &[String]) {
    for (idx, cell) in cells.iter().enumerate() {
        if idx > 0 {
            out.push(',');
        }
        if cell.contains([',', '"', '\n', '\r']) {
            out.push('"');
            out.push_str(&cell.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(cell);
        }
    }
    out.push('\n');
}

fn parse_records(text: &str) -> Result<Vec<Vec<String>>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                // doubled quote is a literal quote
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    cell.push('"');
                }
                '"' => in_quotes = false,
                _ => cell.push(ch),
            }
            continue;
        }
        match ch {
            // quotes only open at the start of a field
            '"' if cell.is_empty() => in_quotes = true,
            ',' => record.push(std::mem::take(&mut cell)),
            // CRLF: the '\n' closes the record
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                record.push(std::mem::take(&mut cell));
                records.push(std::mem::take(&mut record));
            }
            _ => cell.push(ch),
        }
    }
    ensure!(!in_quotes, "unterminated quoted field");
    // last record may lack a trailing newline
    if !cell.is_empty() || !record.is_empty() {
        record.push(cell);
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_cells_that_need_it() {
        let mut table = Table::new(["filename", "tags"]);
        table
            .push_row(vec!["a_1.wav".into(), r#"{"form":2,"mizan":1}"#.into()])
            .unwrap();
        assert_eq!(
            table.to_csv_string(),
            "filename,tags\na_1.wav,\"{\"\"form\"\":2,\"\"mizan\"\":1}\"\n"
        );
    }

    #[test]
    fn parses_what_it_writes() {
        let mut table = Table::new(["a", "b"]);
        table
            .push_row(vec!["line\nbreak".into(), "comma, \"quoted\"".into()])
            .unwrap();
        table.push_row(vec![String::new(), "plain".into()]).unwrap();
        let parsed = Table::parse(&table.to_csv_string()).unwrap();
        assert_eq!(parsed, table);
    }

    #[test]
    fn accepts_crlf_and_missing_trailing_newline() {
        let parsed = Table::parse("filename,x\r\nr_1.wav,3").unwrap();
        assert_eq!(parsed.rows, vec![vec!["r_1.wav".to_string(), "3".to_string()]]);
        assert_eq!(parsed.column("x"), Some(1));
    }

    #[test]
    fn rejects_ragged_rows() {
        assert!(Table::parse("a,b\n1\n").is_err());
        assert!(Table::parse("").is_err());
        assert!(Table::parse("a\n\"open\n").is_err());
    }
}
