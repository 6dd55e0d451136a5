//! Report type detection from column labels and the filename.

use pos_model::ReportType;

/// Guesses the report type of a file.
///
/// Types are tried in [`ReportType::ALL`] order; a type matches when any of
/// its identifying labels is a column, or any of its filename fragments
/// appears in `filename`.
pub fn detect_report_type<S: AsRef<str>>(columns: &[S], filename: &str) -> Option<ReportType> {
    ReportType::ALL.into_iter().find(|report_type| {
        let profile = report_type.profile();
        let by_column = profile
            .detect_columns
            .iter()
            .any(|label| columns.iter().any(|column| column.as_ref().trim() == *label));
        let by_name = profile
            .detect_filename
            .iter()
            .any(|fragment| filename.contains(fragment));
        by_column || by_name
    })
}
