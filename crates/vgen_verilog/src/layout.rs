//! File banner, trailer and section separators.

use chrono::NaiveDateTime;

const RULE: &str = "------------------------------------------------------------------------------";
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Header comment naming the file, device, revision and generation date.
pub fn banner(module: &str, device: &str, revision: &str, date: NaiveDateTime) -> String {
    format!(
        "// -----------------------------------------------------------------------------\n\
         // Auto-Generated by vgen {}\n\
         //\n\
         // Filename   : {module}.v\n\
         // Device     : {device}\n\
         // Revision   : {revision}\n\
         // Date       : {}\n\
         //{RULE}\n\n",
        env!("CARGO_PKG_VERSION"),
        date.format(DATE_FORMAT)
    )
}

/// Closing comment after `endmodule`.
pub fn trailer(date: NaiveDateTime) -> String {
    format!(
        "\n// -----------------------------------------------------------------------------\n\
         //  Auto-Generated by vgen on {}.\n\
         //{RULE}\n",
        date.format(DATE_FORMAT)
    )
}

/// A titled section break.
pub fn separator(title: &str) -> String {
    format!("\n//{RULE}\n// {title}\n//{RULE}\n\n")
}

/// The `` `timescale `` directive.
pub fn timescale(unit: &str, precision: &str) -> String {
    format!("`timescale {unit} / {precision}\n")
}
