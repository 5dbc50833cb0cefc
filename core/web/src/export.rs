//! Spreadsheet export of listings.

use rust_xlsxwriter::{Format, Workbook, XlsxError};

use drivedesk_common::{Error, Result};
use drivedesk_storage::Listing;

/// Download name for exported listings.
pub const EXPORT_FILE_NAME: &str = "google_drive_files.xlsx";

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const HEADER: [&str; 3] = ["ID", "File Name", "File Type"];

fn export_error(err: XlsxError) -> Error {
    Error::Export(err.to_string())
}

/// Render `listing` as a single-sheet workbook: one header row, then one row
/// per entry in listing order.
pub fn listing_workbook(listing: &Listing) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Files").map_err(export_error)?;

    for (col, title) in (0u16..).zip(HEADER) {
        worksheet
            .write_string_with_format(0, col, title, &bold)
            .map_err(export_error)?;
    }

    for (row, entry) in (1u32..).zip(listing.rows()) {
        worksheet.write_string(row, 0, entry.id).map_err(export_error)?;
        worksheet.write_string(row, 1, entry.title).map_err(export_error)?;
        worksheet
            .write_string(row, 2, entry.mime_type)
            .map_err(export_error)?;
    }

    workbook.save_to_buffer().map_err(export_error)
}
