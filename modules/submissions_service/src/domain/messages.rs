//! User-facing result messages

pub const SUBMISSION_UPDATED: &str = "The submission has been updated.";
pub const SUBMISSION_NOT_UPDATED: &str = "The submission could not be updated.";

pub const SUBMISSION_DELETED: &str = "The submission has been deleted.";
pub const SUBMISSIONS_DELETED: &str = "The submissions have been deleted.";
pub const SUBMISSION_AND_FILES_DELETED: &str =
    "The submission and its associated files have been deleted.";
pub const SUBMISSIONS_AND_FILES_DELETED: &str =
    "The submissions and their associated files have been deleted.";
pub const SUBMISSION_DELETED_WITH_PROBLEMS: &str =
    "The submission was deleted, but the following files could not be removed:";
pub const SUBMISSIONS_DELETED_WITH_PROBLEMS: &str =
    "The submissions were deleted, but the following files could not be removed:";

/// Problem line in a delete message
pub fn file_problem_line(filename: &str, error: &str) -> String {
    format!("\u{2022} {filename}: {error}")
}
