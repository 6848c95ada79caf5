//! Renaming day-of-year files to calendar dates.
//!
//! Daily rasters often arrive named `YYYYDDD` (year plus 1-366 ordinal).
//! This renames every such entry of a directory to `YYYY-MM-DD` keeping
//! the extension; anything else passes through untouched.

use crate::errors::Result;
use chrono::NaiveDate;
use std::path::Path;

/// Rename every `YYYYDDD`-stemmed file of `dir` to its ISO calendar
/// date, keeping extensions. Returns the resulting file names in
/// directory order, renamed or not.
///
/// Stems that are not exactly 7 digits, and ordinals that do not exist
/// in their year (day 366 of a non-leap year), are left as they are.
pub fn translate_julian_dates<P: AsRef<Path>>(dir: P) -> Result<Vec<String>> {
    let dir = dir.as_ref();
    let mut names = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let file_name = entry.file_name().to_string_lossy().into_owned();

        match julian_stem_to_iso(&file_name) {
            Some(new_name) => {
                std::fs::rename(dir.join(&file_name), dir.join(&new_name))?;
                log::info!("renamed {} -> {}", file_name, new_name);
                names.push(new_name);
            }
            None => names.push(file_name),
        }
    }

    Ok(names)
}

/// `2024099.tif` -> `2024-04-08.tif`; `None` when the stem is not a
/// valid 7-digit year+ordinal
fn julian_stem_to_iso(file_name: &str) -> Option<String> {
    let path = Path::new(file_name);
    let stem = path.file_stem()?.to_str()?;

    if stem.len() != 7 || !stem.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let year: i32 = stem[..4].parse().ok()?;
    let ordinal: u32 = stem[4..].parse().ok()?;
    let date = NaiveDate::from_yo_opt(year, ordinal)?;

    let iso = date.format("%Y-%m-%d").to_string();
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => Some(format!("{}.{}", iso, ext)),
        None => Some(iso),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_99_of_2024() {
        assert_eq!(
            julian_stem_to_iso("2024099.tif"),
            Some("2024-04-08.tif".to_string())
        );
    }

    #[test]
    fn non_julian_names_pass_through() {
        assert_eq!(julian_stem_to_iso("readme.txt"), None);
        assert_eq!(julian_stem_to_iso("202409.tif"), None);
        assert_eq!(julian_stem_to_iso("20240991.tif"), None);
        assert_eq!(julian_stem_to_iso("2024a99.tif"), None);
    }

    #[test]
    fn invalid_ordinal_is_untouched() {
        // 2023 is not a leap year
        assert_eq!(julian_stem_to_iso("2023366.tif"), None);
        assert!(julian_stem_to_iso("2024366.tif").is_some());
    }

    #[test]
    fn extensionless_stem() {
        assert_eq!(
            julian_stem_to_iso("2024001"),
            Some("2024-01-01".to_string())
        );
    }
}
