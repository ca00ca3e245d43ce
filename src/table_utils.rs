// table_utils.rs
use crate::error_utils::SimError;
use anyhow::Result as AnyhowResult;
use std::error::Error;
use std::fs::File;

/// Represents a TableBuilder object: headers, string-cell rows, and an internal error handler.
/// This is the tabular carrier the simulation hands to external plotting and reporting
/// collaborators - LLN traces, confidence interval tables, assignment and balance outputs all
/// flow through it.
#[derive(Debug)]
pub struct TableBuilder {
    headers: Vec<String>,
    data: Vec<Vec<String>>,
    error: Option<Box<dyn Error>>,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBuilder {
    /// Creates a new, empty `TableBuilder`.
    ///
    /// ```
    /// use statsim::table_utils::TableBuilder;
    ///
    /// let builder = TableBuilder::new();
    ///
    /// // Initially, there are no headers or data
    /// assert!(builder.get_headers().is_none());
    /// assert!(builder.get_data().is_none());
    /// ```
    pub fn new() -> Self {
        TableBuilder {
            headers: Vec::new(),
            data: Vec::new(),
            error: None,
        }
    }

    /// Creates a `TableBuilder` from pre-assembled headers and rows.
    ///
    /// ```
    /// use statsim::table_utils::TableBuilder;
    ///
    /// let builder = TableBuilder::from_raw_data(
    ///     vec!["user".to_string(), "earnings".to_string()],
    ///     vec![
    ///         vec!["u1".to_string(), "120.5".to_string()],
    ///         vec!["u2".to_string(), "80.0".to_string()],
    ///     ],
    /// );
    ///
    /// assert_eq!(builder.get_headers().unwrap(), &["user".to_string(), "earnings".to_string()]);
    /// assert_eq!(builder.get_data().unwrap().len(), 2);
    /// ```
    pub fn from_raw_data(headers: Vec<String>, data: Vec<Vec<String>>) -> Self {
        TableBuilder {
            headers,
            data,
            error: None,
        }
    }

    /// Reads data from a CSV file at the specified `file_path` and returns a `TableBuilder`.
    /// If the file cannot be opened or parsed, the headers and data stay empty and the
    /// `error` field is set; inspect it via `has_error`/`get_error`.
    pub fn from_csv(file_path: &str) -> Self {
        let mut builder = TableBuilder::new();

        match File::open(file_path) {
            Ok(file) => {
                let mut rdr = csv::Reader::from_reader(file);

                if let Ok(hdrs) = rdr.headers() {
                    builder.headers = hdrs.iter().map(String::from).collect();
                }

                for result in rdr.records() {
                    match result {
                        Ok(record) => builder.data.push(record.iter().map(String::from).collect()),
                        Err(e) => {
                            builder.error = Some(Box::new(e));
                            break;
                        }
                    }
                }
            }
            Err(e) => builder.error = Some(Box::new(e)),
        }

        builder
    }

    /// Creates a copy of the `TableBuilder`, dropping any recorded error.
    pub fn from_copy(&self) -> Self {
        TableBuilder {
            headers: self.headers.clone(),
            data: self.data.clone(),
            error: None,
        }
    }

    /// Sets the headers, replacing any existing ones.
    pub fn set_header(&mut self, header: Vec<&str>) -> &mut Self {
        self.headers = header.iter().map(|h| h.to_string()).collect();
        self
    }

    /// Appends one row.
    pub fn add_row(&mut self, row: Vec<&str>) -> &mut Self {
        self.data.push(row.iter().map(|cell| cell.to_string()).collect());
        self
    }

    /// Appends multiple rows.
    pub fn add_rows(&mut self, rows: Vec<Vec<&str>>) -> &mut Self {
        for row in rows {
            self.add_row(row);
        }
        self
    }

    pub fn get_headers(&self) -> Option<&[String]> {
        if self.headers.is_empty() {
            None
        } else {
            Some(&self.headers)
        }
    }

    pub fn get_data(&self) -> Option<&Vec<Vec<String>>> {
        if self.data.is_empty() {
            None
        } else {
            Some(&self.data)
        }
    }

    pub fn row_count(&self) -> usize {
        self.data.len()
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn get_error(&self) -> Option<&dyn Error> {
        self.error.as_deref()
    }

    /// Returns the position of `column_name` in the headers.
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column_name)
    }

    /// Extracts the parseable numeric values of a column, in row order. Cells that do not
    /// parse as numbers are skipped, matching the course convention of ignoring missing or
    /// malformed entries when aggregating.
    ///
    /// ```
    /// use statsim::table_utils::TableBuilder;
    ///
    /// let builder = TableBuilder::from_raw_data(
    ///     vec!["price".to_string()],
    ///     vec![
    ///         vec!["100".to_string()],
    ///         vec!["NaN-ish".to_string()],
    ///         vec!["200".to_string()],
    ///     ],
    /// );
    ///
    /// assert_eq!(builder.get_numeric_column("price").unwrap(), vec![100.0, 200.0]);
    /// assert!(builder.get_numeric_column("absent").is_err());
    /// ```
    pub fn get_numeric_column(&self, column_name: &str) -> Result<Vec<f64>, SimError> {
        let idx = self
            .get_column_index(column_name)
            .ok_or_else(|| SimError::ColumnNotFound(column_name.to_string()))?;

        let mut values = Vec::new();
        for row in &self.data {
            if let Some(cell) = row.get(idx) {
                if let Ok(num) = cell.parse::<f64>() {
                    values.push(num);
                }
            }
        }
        Ok(values)
    }

    /// Returns the mean (average) of all numeric values in a column.
    ///
    /// ```
    /// use statsim::table_utils::TableBuilder;
    ///
    /// let builder = TableBuilder::from_raw_data(
    ///     vec!["earnings".to_string()],
    ///     vec![
    ///         vec!["10.0".to_string()],
    ///         vec!["20.0".to_string()],
    ///         vec!["30.0".to_string()],
    ///     ],
    /// );
    ///
    /// assert_eq!(builder.get_mean("earnings").unwrap(), 20.0);
    /// ```
    pub fn get_mean(&self, column_name: &str) -> Option<f64> {
        let values = self.get_numeric_column(column_name).ok()?;
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }

    /// Returns the unbiased sample variance of all numeric values in a column. Requires at
    /// least 2 parseable values.
    ///
    /// ```
    /// use statsim::table_utils::TableBuilder;
    ///
    /// let builder = TableBuilder::from_raw_data(
    ///     vec!["earnings".to_string()],
    ///     vec![
    ///         vec!["10.0".to_string()],
    ///         vec!["20.0".to_string()],
    ///         vec!["30.0".to_string()],
    ///     ],
    /// );
    ///
    /// assert_eq!(builder.get_variance("earnings").unwrap(), 100.0);
    /// ```
    pub fn get_variance(&self, column_name: &str) -> Option<f64> {
        let values = self.get_numeric_column(column_name).ok()?;
        if values.len() < 2 {
            return None;
        }
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let sum_of_squared_deviations =
            values.iter().map(|&val| (val - mean).powi(2)).sum::<f64>();
        Some(sum_of_squared_deviations / (values.len() - 1) as f64)
    }

    /// Returns the unbiased standard deviation of all numeric values in a column.
    pub fn get_standard_deviation(&self, column_name: &str) -> Option<f64> {
        let variance = self.get_variance(column_name)?;
        Some(variance.sqrt())
    }

    /// Prints the full table with consistent spacing for cells, and returns self for
    /// chaining.
    pub fn print_table(&mut self) -> &mut Self {
        let total_rows = self.data.len();
        let max_cell_width: usize = 45;

        // Column widths based on headers and all rows
        let mut max_lengths = self
            .headers
            .iter()
            .map(|h| h.len() + 1)
            .collect::<Vec<usize>>();
        for row in &self.data {
            for (i, cell) in row.iter().enumerate() {
                if i < max_lengths.len() {
                    let current_max = std::cmp::max(max_lengths[i], cell.len());
                    max_lengths[i] = std::cmp::min(current_max, max_cell_width);
                }
            }
        }

        let format_cell = |s: &String, max_length: usize| -> String {
            format!("{:width$.width$}", s, width = max_length)
        };

        let table_width = max_lengths.iter().map(|&len| len + 1).sum::<usize>() + 1;

        println!(
            "\n|{}|",
            self.headers
                .iter()
                .zip(max_lengths.iter())
                .map(|(header, &max_length)| format_cell(header, max_length))
                .collect::<Vec<String>>()
                .join("|")
        );
        println!("{}", "-".repeat(table_width));

        for row in &self.data {
            println!(
                "|{}|",
                row.iter()
                    .zip(max_lengths.iter())
                    .map(|(cell, &max_length)| format_cell(cell, max_length))
                    .collect::<Vec<String>>()
                    .join("|")
            );
        }

        println!("Total rows: {}", total_rows);

        self
    }

    /// Saves the table as a CSV file at the specified path.
    ///
    /// ```
    /// use statsim::table_utils::TableBuilder;
    /// use tempfile::NamedTempFile;
    ///
    /// let mut builder = TableBuilder::new();
    /// builder
    ///     .set_header(vec!["id", "value"])
    ///     .add_row(vec!["1", "0.5"])
    ///     .add_row(vec!["2", "0.7"]);
    ///
    /// let tmp = NamedTempFile::new().unwrap();
    /// let path = tmp.path().to_str().unwrap();
    /// builder.save_as(path).unwrap();
    ///
    /// let reloaded = TableBuilder::from_csv(path);
    /// assert_eq!(reloaded.get_headers().unwrap(), &["id".to_string(), "value".to_string()]);
    /// assert_eq!(reloaded.get_data().unwrap().len(), 2);
    /// ```
    pub fn save_as(&mut self, file_path: &str) -> AnyhowResult<&mut Self> {
        let file = File::create(file_path)?;
        let mut wtr = csv::Writer::from_writer(file);

        wtr.write_record(&self.headers)?;
        for row in &self.data {
            wtr.write_record(row)?;
        }
        wtr.flush()?;

        Ok(self)
    }
}
