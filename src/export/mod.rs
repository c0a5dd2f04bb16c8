// Spreadsheet export of collected complexes
pub mod analysis;
pub mod raw;

pub use analysis::write_analysis;
pub use raw::write_raw;

use crate::model::ExportError;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Appends `.csv` unless the path already ends with it.
pub fn ensure_csv_extension(path: &Path) -> PathBuf {
    match path.extension() {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => path.to_path_buf(),
        _ => {
            let mut name = path.as_os_str().to_owned();
            name.push(".csv");
            PathBuf::from(name)
        }
    }
}

/// Opens a CSV writer with a UTF-8 BOM so spreadsheet programs detect the encoding.
fn open_writer(path: &Path) -> Result<csv::Writer<File>, ExportError> {
    let mut file = File::create(path)?;
    file.write_all(UTF8_BOM)?;
    Ok(csv::Writer::from_writer(file))
}

fn fmt_opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn fmt_decimal(value: Option<f64>, places: usize) -> String {
    value.map(|v| format!("{:.*}", places, v)).unwrap_or_default()
}
