use anyhow::{anyhow, bail, Context, Result};
use csv::{ReaderBuilder, StringRecord};
use log::{debug, info};
use ndarray::Array2;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::dataset::{DataSet, Identity};

/// Threshold on a numeric column; rows failing any filter are skipped.
#[derive(Debug, Clone, PartialEq)]
pub enum RowFilter {
    AtLeast { column: String, value: f64 },
    AtMost { column: String, value: f64 },
}

impl RowFilter {
    pub fn column(&self) -> &str {
        match self {
            RowFilter::AtLeast { column, .. } | RowFilter::AtMost { column, .. } => column,
        }
    }

    fn accepts(&self, x: f64) -> bool {
        match self {
            RowFilter::AtLeast { value, .. } => x >= *value,
            RowFilter::AtMost { value, .. } => x <= *value,
        }
    }
}

/// Parse a `COLUMN=VALUE` pair as given on the command line.
pub fn parse_bound(s: &str) -> Result<(String, f64)> {
    let (column, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("expected COLUMN=VALUE, got {:?}", s))?;
    let column = column.trim();
    if column.is_empty() {
        bail!("missing column name in {:?}", s);
    }
    let value = value
        .trim()
        .parse::<f64>()
        .with_context(|| format!("bound in {:?} is not a number", s))?;
    Ok((column.to_string(), value))
}

/// How to turn a delimited table into a [`DataSet`].
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub delimiter: u8,
    pub identity_columns: [String; 2],
    pub drop_columns: Vec<String>,
    pub filters: Vec<RowFilter>,
    /// Cut the first identity label at this character (keeps the text before it).
    pub name_separator: Option<char>,
}

impl LoadOptions {
    pub fn new(primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        Self {
            delimiter: b'\t',
            identity_columns: [primary.into(), secondary.into()],
            drop_columns: Vec::new(),
            filters: Vec::new(),
            name_separator: None,
        }
    }

    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn drop_column(mut self, column: impl Into<String>) -> Self {
        self.drop_columns.push(column.into());
        self
    }

    pub fn filter(mut self, filter: RowFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn name_separator(mut self, separator: char) -> Self {
        self.name_separator = Some(separator);
        self
    }
}

fn column_index(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| anyhow!("column {:?} not found in header", name))
}

fn parse_cell(record: &StringRecord, idx: usize, name: &str, row: usize) -> Result<f64> {
    let cell = record
        .get(idx)
        .ok_or_else(|| anyhow!("record {}: missing column {:?}", row, name))?;
    let x = cell
        .trim()
        .parse::<f64>()
        .with_context(|| format!("record {}: column {:?} is not numeric: {:?}", row, name, cell))?;
    if !x.is_finite() {
        bail!("record {}: column {:?} is not finite: {:?}", row, name, cell);
    }
    Ok(x)
}

impl DataSet {
    /// Read a delimited file into a DataSet
    pub fn from_tsv<P: AsRef<Path>>(path: P, opts: &LoadOptions) -> Result<Self> {
        let file = File::open(&path)
            .map_err(|e| anyhow!("Failed to open {:?}: {}", path.as_ref(), e))?;
        let ds = Self::from_reader(file, opts)
            .with_context(|| format!("while reading {:?}", path.as_ref()))?;
        info!(
            "Loaded {} records x {} features from {:?}",
            ds.n_records(),
            ds.n_features(),
            path.as_ref()
        );
        Ok(ds)
    }

    /// Read delimited text from any reader. The first line must be a header.
    pub fn from_reader<R: Read>(reader: R, opts: &LoadOptions) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(opts.delimiter)
            .has_headers(true)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let primary = column_index(&headers, &opts.identity_columns[0])?;
        let secondary = column_index(&headers, &opts.identity_columns[1])?;

        let mut dropped = vec![false; headers.len()];
        for name in &opts.drop_columns {
            dropped[column_index(&headers, name)?] = true;
        }
        dropped[primary] = true;
        dropped[secondary] = true;

        let filters = opts
            .filters
            .iter()
            .map(|f| Ok::<_, anyhow::Error>((column_index(&headers, f.column())?, f)))
            .collect::<Result<Vec<_>>>()?;

        let feature_cols: Vec<usize> = (0..headers.len()).filter(|&j| !dropped[j]).collect();
        if feature_cols.is_empty() {
            bail!("no feature columns left after dropping identity and excluded columns");
        }
        let feature_names: Vec<String> = feature_cols
            .iter()
            .map(|&j| headers[j].trim().to_string())
            .collect();

        let mut identities = Vec::new();
        let mut flat: Vec<f64> = Vec::new();
        let mut skipped = 0usize;

        'records: for (i, result) in rdr.records().enumerate() {
            let row = i + 1;
            let record = result.map_err(|e| anyhow!("Error reading record {}: {}", row, e))?;

            for (idx, filter) in &filters {
                let x = parse_cell(&record, *idx, filter.column(), row)?;
                if !filter.accepts(x) {
                    debug!("record {} rejected by {:?} (value {})", row, filter, x);
                    skipped += 1;
                    continue 'records;
                }
            }

            for &j in &feature_cols {
                flat.push(parse_cell(&record, j, &headers[j], row)?);
            }

            let mut name = record.get(primary).unwrap_or_default().trim();
            if let Some(sep) = opts.name_separator {
                if let Some((head, _)) = name.split_once(sep) {
                    name = head;
                }
            }
            let team = record.get(secondary).unwrap_or_default().trim();
            identities.push(Identity::new(name, team));
        }

        if identities.is_empty() {
            bail!("No data lines left after filtering ({} skipped)", skipped);
        }
        if skipped > 0 {
            debug!("{} records skipped by row filters", skipped);
        }

        let features = Array2::from_shape_vec((identities.len(), feature_cols.len()), flat)?;
        Ok(Self {
            identities,
            features,
            feature_names,
        })
    }
}
