//! Generates the huge-tier benchmark fixture to disk.
//!
//! Writes a ZIP archive (one common file plus thousands of line files) to
//! `target/bench-fixtures/huge.netex.zip`, loaded by `benches/huge_file.rs`
//! at benchmark time.

use std::error::Error;
use std::fs;
use std::io::Write as _;

use netex_validator_bench::{SizeTier, generate_dataset, huge_fixture_path};

fn main() -> Result<(), Box<dyn Error>> {
    let zip_path = huge_fixture_path();
    if let Some(parent) = zip_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut config = SizeTier::XLarge.config(42);
    config.num_lines = 10_000;
    eprintln!("Generating huge tier ({} lines)...", config.num_lines);
    let dataset = generate_dataset(&config);
    eprintln!(
        "Generated {} files, {:.1} MB total",
        dataset.file_count(),
        dataset.total_bytes() as f64 / (1024.0 * 1024.0)
    );

    eprintln!("Writing ZIP to {}...", zip_path.display());
    let out = fs::File::create(&zip_path)?;
    let mut writer = zip::ZipWriter::new(out);
    let opts = zip::write::SimpleFileOptions::default();
    for (name, bytes) in &dataset.entries {
        writer.start_file(name, opts)?;
        writer.write_all(bytes)?;
    }
    writer.finish()?;

    let meta = fs::metadata(&zip_path)?;
    eprintln!("ZIP: {:.1} MB", meta.len() as f64 / (1024.0 * 1024.0));

    Ok(())
}
