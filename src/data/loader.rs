//! Poll Data Loader Module
//! Fetches the poll CSV over HTTP (or from disk) and parses it with Polars.

use polars::prelude::*;
use reqwest::blocking::Client;
use std::io::Cursor;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        source: reqwest::Error,
    },
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
}

/// Loads the poll table from a URL or a local CSV file.
pub struct PollLoader;

impl PollLoader {
    /// Load from `source`: `http(s)://` locators are fetched, anything else is read as a path.
    pub fn load(source: &str) -> Result<DataFrame, LoaderError> {
        let bytes = if Self::is_remote(source) {
            Self::fetch(source)?
        } else {
            let path = PathBuf::from(source);
            std::fs::read(&path).map_err(|source| LoaderError::Io { path, source })?
        };

        let df = Self::from_bytes(bytes)?;
        info!(
            "loaded {} rows x {} columns from {}",
            df.height(),
            df.width(),
            source
        );
        Ok(df)
    }

    /// Parse an in-memory CSV document.
    ///
    /// Dates are kept as strings so that month prefixes can be matched literally.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<DataFrame, LoaderError> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()?;
        Ok(df)
    }

    fn fetch(url: &str) -> Result<Vec<u8>, LoaderError> {
        debug!("GET {}", url);
        let wrap = |source| LoaderError::Fetch {
            url: url.to_string(),
            source,
        };

        let response = Client::new()
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(wrap)?;
        let body = response.bytes().map_err(wrap)?;
        debug!("received {} bytes", body.len());
        Ok(body.to_vec())
    }

    fn is_remote(source: &str) -> bool {
        source.starts_with("http://") || source.starts_with("https://")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CSV: &str = "\
Pollster,Start Date,Population,Mode,Clinton,Trump,Number of Observations,Question Iteration
A,2016-10-01,Likely Voters,Live Phone,48,44,1000,1
B,2016-10-02,Adults,Internet,50,,800,1
";

    #[test]
    fn parses_csv_bytes_with_string_dates() {
        let df = PollLoader::from_bytes(CSV.as_bytes().to_vec()).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.column("Start Date").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("Trump").unwrap().null_count(), 1);
    }

    #[test]
    fn loads_local_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CSV.as_bytes()).unwrap();

        let df = PollLoader::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = PollLoader::load("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, LoaderError::Io { .. }));
    }

    #[test]
    fn remote_detection() {
        assert!(PollLoader::is_remote("http://example.com/polls.csv"));
        assert!(PollLoader::is_remote("https://example.com/polls.csv"));
        assert!(!PollLoader::is_remote("polls.csv"));
    }
}
