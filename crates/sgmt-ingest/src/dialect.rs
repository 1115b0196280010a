//! Named CSV dialects.
//!
//! | name        | delimiter | quoting     | line end |
//! |-------------|-----------|-------------|----------|
//! | `default`   | `,`       | when needed | `\n`     |
//! | `excel`     | `,`       | when needed | `\r\n`   |
//! | `excel-tab` | tab       | when needed | `\r\n`   |
//! | `unix`      | `,`       | always      | `\n`     |
//!
//! Reading accepts either line ending in every dialect.

use std::fmt;
use std::str::FromStr;

use csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};

use crate::error::IngestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    #[default]
    Default,
    Excel,
    ExcelTab,
    Unix,
}

impl Dialect {
    pub const ALL: [Dialect; 4] = [
        Dialect::Default,
        Dialect::Excel,
        Dialect::ExcelTab,
        Dialect::Unix,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Dialect::Default => "default",
            Dialect::Excel => "excel",
            Dialect::ExcelTab => "excel-tab",
            Dialect::Unix => "unix",
        }
    }

    pub fn delimiter(self) -> u8 {
        match self {
            Dialect::ExcelTab => b'\t',
            _ => b',',
        }
    }

    fn quote_style(self) -> QuoteStyle {
        match self {
            Dialect::Unix => QuoteStyle::Always,
            _ => QuoteStyle::Necessary,
        }
    }

    fn terminator(self) -> Terminator {
        match self {
            Dialect::Excel | Dialect::ExcelTab => Terminator::CRLF,
            Dialect::Default | Dialect::Unix => Terminator::Any(b'\n'),
        }
    }

    /// Reader for this dialect: header row expected, ragged rows allowed.
    pub fn reader_builder(self) -> ReaderBuilder {
        let mut builder = ReaderBuilder::new();
        builder
            .delimiter(self.delimiter())
            .has_headers(true)
            .flexible(true);
        builder
    }

    pub fn writer_builder(self) -> WriterBuilder {
        let mut builder = WriterBuilder::new();
        builder
            .delimiter(self.delimiter())
            .quote_style(self.quote_style())
            .terminator(self.terminator())
            .has_headers(false);
        builder
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = IngestError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Dialect::ALL
            .into_iter()
            .find(|dialect| dialect.name() == name)
            .ok_or_else(|| IngestError::UnknownDialect {
                name: name.to_string(),
                expected: Dialect::ALL.map(Dialect::name).join(", "),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_row(dialect: Dialect, row: &[&str]) -> String {
        let mut writer = dialect.writer_builder().from_writer(Vec::new());
        writer.write_record(row).unwrap();
        String::from_utf8(writer.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_parse_names() {
        for dialect in Dialect::ALL {
            assert_eq!(dialect.name().parse::<Dialect>().unwrap(), dialect);
        }
        let err = "tsv".parse::<Dialect>().unwrap_err();
        assert!(err.to_string().contains("excel-tab"));
    }

    #[test]
    fn test_write_quoting_and_terminators() {
        assert_eq!(write_row(Dialect::Default, &["a", "b,c"]), "a,\"b,c\"\n");
        assert_eq!(write_row(Dialect::Excel, &["a", "b"]), "a,b\r\n");
        assert_eq!(write_row(Dialect::ExcelTab, &["a", "b"]), "a\tb\r\n");
        assert_eq!(write_row(Dialect::Unix, &["a", "b"]), "\"a\",\"b\"\n");
    }

    #[test]
    fn test_read_tab_delimited() {
        let mut reader = Dialect::ExcelTab
            .reader_builder()
            .from_reader("src\tdst\r\na\tb\r\n".as_bytes());
        assert_eq!(reader.headers().unwrap(), vec!["src", "dst"]);
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows[0], vec!["a", "b"]);
    }
}
