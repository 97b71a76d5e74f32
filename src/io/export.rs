//! Export flattened posterior samples to CSV.
//!
//! One row per kept sample (walker-major), one column per parameter plus the
//! sample's log-posterior. Meant for spreadsheets and downstream plotting.

use std::path::{Path, PathBuf};

use crate::domain::ModelKind;
use crate::error::AppError;
use crate::sampler::Chain;

pub const LOG_POSTERIOR_COLUMN: &str = "log_posterior";

/// Write the kept samples of `chain` to `path`.
pub fn write_samples_csv(path: &Path, chain: &Chain, discard: usize) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(4, format!("Failed to create samples CSV '{}': {e}", path.display())))?;

    let mut header: Vec<&str> = chain.param_names().iter().map(String::as_str).collect();
    header.push(LOG_POSTERIOR_COLUMN);
    writer
        .write_record(&header)
        .map_err(|e| AppError::new(4, format!("Failed to write samples CSV header: {e}")))?;

    for (row, lp) in chain.flat_samples(discard).iter().zip(chain.flat_log_probs(discard)) {
        let mut record: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        record.push(lp.to_string());
        writer
            .write_record(&record)
            .map_err(|e| AppError::new(4, format!("Failed to write samples CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(4, format!("Failed to flush samples CSV: {e}")))?;
    Ok(())
}

/// `<dir>/<model>_samples.csv`
pub fn samples_csv_path(dir: &Path, kind: ModelKind) -> PathBuf {
    dir.join(format!("{}_samples.csv", kind.slug()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;

    #[test]
    fn writes_header_and_one_row_per_kept_sample() {
        let mut chain = Chain::new(vec!["T".into(), "A_w".into()], 2);
        for s in 0..3 {
            let s = s as f64;
            chain.push_step(&DMatrix::from_row_slice(2, 2, &[2.0, s, 2.1, s]), &[-s, -s - 0.5]);
        }
        let path = std::env::temp_dir().join(format!("brane-samples-{}.csv", std::process::id()));
        write_samples_csv(&path, &chain, 1).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "T,A_w,log_posterior");
        assert_eq!(lines.len(), 1 + 2 * 2);
        assert_eq!(lines[1], "2,1,-1");
        assert_eq!(lines[4], "2.1,2,-2.5");
    }

    #[test]
    fn path_is_named_after_the_model() {
        let p = samples_csv_path(Path::new("/tmp/out"), ModelKind::Oscillating);
        assert_eq!(p, Path::new("/tmp/out/oscillating_samples.csv"));
    }
}
