use buddyperks_db::models::Redemption;
use rust_xlsxwriter::{Format, Workbook, XlsxError};

const HEADERS: [(&str, f64); 13] = [
    ("Type", 10.0),
    ("Buddy ID", 14.0),
    ("User Name", 22.0),
    ("User Email", 28.0),
    ("Company", 20.0),
    ("Product", 28.0),
    ("Discount %", 11.0),
    ("Category", 24.0),
    ("Redeemed At", 20.0),
    ("Expiry Date", 20.0),
    ("Status", 10.0),
    ("User Category", 16.0),
    ("User Service", 16.0),
];

/// Redemption facts as an `.xlsx` workbook, one row per fact.
pub fn export_redemptions(rows: &[Redemption]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Redemptions")?;

    let header_format = Format::new().set_bold();
    for (col, (title, width)) in HEADERS.iter().enumerate() {
        let col = col as u16;
        worksheet.write_string_with_format(0, col, *title, &header_format)?;
        worksheet.set_column_width(col, *width)?;
    }

    for (i, r) in rows.iter().enumerate() {
        let row = (i + 1) as u32;
        worksheet.write_string(row, 0, r.item_type.as_str())?;
        worksheet.write_string(row, 1, &r.buddy_id)?;
        worksheet.write_string(row, 2, &r.user_snapshot.name)?;
        worksheet.write_string(row, 3, &r.user_snapshot.email)?;
        worksheet.write_string(row, 4, &r.company)?;
        worksheet.write_string(row, 5, &r.product_name)?;
        worksheet.write_number(row, 6, r.discount_percentage)?;
        worksheet.write_string(row, 7, r.category.join(", "))?;
        worksheet.write_string(row, 8, format_date(r.redeemed_at))?;
        worksheet.write_string(row, 9, format_date(r.expiry_date))?;
        worksheet.write_string(row, 10, r.status.as_str())?;
        worksheet.write_string(row, 11, &r.user_snapshot.category)?;
        worksheet.write_string(row, 12, &r.user_snapshot.service)?;
    }

    workbook.save_to_buffer()
}

fn format_date(date: bson::DateTime) -> String {
    date.to_chrono().format("%Y-%m-%d %H:%M:%S").to_string()
}
