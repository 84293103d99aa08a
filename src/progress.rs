//! # Progress feedback
//!
//! Spinner shown by the CLI while a file is being recompressed, and the
//! one-line summary printed when it finishes:
//!
//! ```text
//! ✅ photo.png -> photo.webp [png→jpeg, webp] 1.20 MB -> 310.45 KB (74.7% saved)
//! ```

use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

use crate::compressor::{Commit, CompressionReport, Route};
use crate::file_manager::FileManager;

/// Create a spinner for indeterminate progress
pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();

    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }

    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));

    spinner
}

fn route_label(route: Route) -> &'static str {
    match route {
        Route::AlphaPng => "png+alpha",
        Route::OpaquePngToJpeg => "png→jpeg",
        Route::Jpeg => "jpeg",
    }
}

/// Summary line for a finished run
pub fn format_report(input: &Path, output: &Path, report: &CompressionReport) -> String {
    let committed = match report.commit {
        Commit::Webp => "webp",
        Commit::Original => "original kept",
    };
    format!(
        "✅ {} -> {} [{}, {}] {} -> {} ({:.1}% saved)",
        input.display(),
        output.display(),
        route_label(report.route),
        committed,
        FileManager::format_size(report.original_size),
        FileManager::format_size(report.output_size),
        report.reduction_percent()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_report() {
        let report = CompressionReport {
            route: Route::OpaquePngToJpeg,
            commit: Commit::Webp,
            original_size: 4096,
            candidate_size: 1024,
            output_size: 1024,
            width: 10,
            height: 10,
        };
        let line = format_report(Path::new("a.png"), Path::new("a.webp"), &report);
        assert!(line.contains("png→jpeg"));
        assert!(line.contains("4.00 KB -> 1.00 KB"));
        assert!(line.contains("75.0% saved"));
    }

    #[test]
    fn test_format_report_original_kept() {
        let report = CompressionReport {
            route: Route::Jpeg,
            commit: Commit::Original,
            original_size: 900,
            candidate_size: 1200,
            output_size: 900,
            width: 3,
            height: 3,
        };
        let line = format_report(Path::new("b.jpg"), Path::new("b.webp"), &report);
        assert!(line.contains("original kept"));
        assert!(line.contains("0.0% saved"));
    }
}
