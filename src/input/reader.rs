use crate::config::InputConfig;
use crate::input::Entry;
use crate::PaperbindError;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::path::{Path, PathBuf};

/// Entries read from an export along with filtering counts
#[derive(Debug, Clone)]
pub struct InputBatch {
    /// Entries that survived filtering, in file order
    pub entries: Vec<Entry>,

    /// Number of data rows in the file
    pub total_rows: usize,
}

impl InputBatch {
    /// Number of rows dropped by folder or URL filtering
    pub fn filtered_out(&self) -> usize {
        self.total_rows - self.entries.len()
    }
}

/// Column positions resolved from the header row
struct Columns {
    url: Option<usize>,
    title: Option<usize>,
    folder: Option<usize>,
    timestamp: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Self {
        let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
        Self {
            url: find("URL"),
            title: find("Title"),
            folder: find("Folder"),
            timestamp: find("Timestamp"),
        }
    }
}

/// Reads an export CSV and returns the entries to fetch
///
/// The file must have a header row; `URL`, `Title`, `Folder` and
/// `Timestamp` columns are looked up by name. Rows without a URL and rows in
/// one of the configured excluded folders are dropped. A blank title is kept
/// empty so the page title can be used instead.
///
/// # Arguments
///
/// * `path` - Path to the CSV export
/// * `config` - Input configuration (excluded folders)
///
/// # Returns
///
/// * `Ok(InputBatch)` - Kept entries plus the number of rows read
/// * `Err(PaperbindError::Csv)` - The file could not be opened or parsed
pub fn read_entries(path: &Path, config: &InputConfig) -> Result<InputBatch, PaperbindError> {
    let csv_error = |source| PaperbindError::Csv {
        path: path.display().to_string(),
        source,
    };

    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(csv_error)?;

    let columns = Columns::from_headers(reader.headers().map_err(csv_error)?);

    let mut entries = Vec::new();
    let mut total_rows = 0;

    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        total_rows += 1;

        let field = |column: Option<usize>| column.and_then(|i| record.get(i)).unwrap_or("");

        let folder = field(columns.folder);
        if config.excluded_folders.iter().any(|f| f == folder) {
            continue;
        }

        let url = field(columns.url);
        if url.is_empty() {
            tracing::debug!("Skipping row {} without URL", total_rows);
            continue;
        }

        entries.push(Entry {
            url: url.to_string(),
            title: field(columns.title).to_string(),
            folder: folder.to_string(),
            timestamp: field(columns.timestamp).parse().unwrap_or(0),
        });
    }

    tracing::info!(
        "CSV parsed: {} total rows, {} after filtering (excluded folders: {})",
        total_rows,
        entries.len(),
        config.excluded_folders.join(", ")
    );

    Ok(InputBatch {
        entries,
        total_rows,
    })
}

/// Finds the newest CSV export in a directory
///
/// Exports are named by date, so the lexicographically greatest `.csv`
/// file name is treated as the newest.
///
/// # Returns
///
/// * `Some(PathBuf)` - Path of the newest CSV file
/// * `None` - The directory is missing or has no CSV files
pub fn find_latest_csv(dir: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;

    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| ext.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
        })
        .max_by(|a, b| a.file_name().cmp(&b.file_name()))
}
