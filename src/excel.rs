use crate::error::Result;
use crate::layout::{CellStyle, SheetDocument};
use crate::schema::Value;
use log::info;
use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook};
use std::path::Path;

fn header_line_format() -> Format {
    Format::new().set_bold().set_font_size(12.0)
}

fn column_header_format() -> Format {
    Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0xD3D3D3))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
}

/// Renders a synthesized document into a single-worksheet xlsx file.
/// Empty cells are left unwritten; column widths come from the document.
pub fn write_workbook(document: &SheetDocument, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&document.title)?;

    let header_line = header_line_format();
    let column_header = column_header_format();

    for (r, row) in document.rows.iter().enumerate() {
        let r = r as u32;
        for (c, cell) in row.iter().enumerate() {
            let c = c as u16;
            let format = match cell.style {
                CellStyle::Plain => None,
                CellStyle::HeaderLine => Some(&header_line),
                CellStyle::ColumnHeader => Some(&column_header),
            };
            match (&cell.value, format) {
                (Value::Empty, _) => {}
                (Value::Text(s), Some(f)) => {
                    worksheet.write_string_with_format(r, c, s, f)?;
                }
                (Value::Text(s), None) => {
                    worksheet.write_string(r, c, s)?;
                }
                (Value::Number(n), Some(f)) => {
                    worksheet.write_number_with_format(r, c, *n, f)?;
                }
                (Value::Number(n), None) => {
                    worksheet.write_number(r, c, *n)?;
                }
            }
        }
    }

    for (c, width) in document.column_widths.iter().enumerate() {
        worksheet.set_column_width(c as u16, *width)?;
    }

    workbook.save(path)?;
    info!("Workbook written to {}", path.display());
    Ok(())
}
