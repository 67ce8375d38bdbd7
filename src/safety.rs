//! Safety utilities to prevent accidental dataset overwrites.
//!
//! A cleaned dataset written over its own raw source would lose the fetched
//! lyrics, which cost a full provider crawl to rebuild.

use anyhow::{bail, Result};
use std::path::Path;

/// Marker the canonical output file name must carry unless forced.
pub const CLEANED_MARKER: &str = "cleaned";

/// Validates that an output path is safe to overwrite.
///
/// Checks:
/// - Output cannot be the same as any of the provided source paths
/// - Output filename must contain `required_pattern`, unless `force` is set
pub fn validate_output_path(
    output: &Path,
    required_pattern: &str,
    source_paths: &[&Path],
    force: bool,
) -> Result<()> {
    for source in source_paths {
        if output == *source || same_file(output, source) {
            bail!(
                "Safety check failed: output '{}' cannot be the same as source '{}'",
                output.display(),
                source.display()
            );
        }
    }

    let output_name = output.file_name().and_then(|n| n.to_str()).unwrap_or("");
    if !force && !output_name.contains(required_pattern) {
        bail!(
            "Safety check failed: output file '{}' must contain '{}' in the name (use --force to override)",
            output.display(),
            required_pattern
        );
    }

    Ok(())
}

/// Both paths exist and resolve to the same file.
fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
