//! Reminder text rendering

use chrono::NaiveDate;

use core_kernel::{format_iso_date, Money};

/// In-app reminder text for one installment
///
/// `index` is the 0-based position of the installment in the sorted
/// schedule; it is rendered 1-based.
pub fn reminder_message(
    student_name: &str,
    index: usize,
    batch_name: &str,
    due_date: NaiveDate,
    installment_amount: Money,
    total_due: Money,
) -> String {
    format!(
        "Fee reminder: {}, installment {} for batch {} is due {}. Pending installment amount: {}. Total pending: {}.",
        student_name,
        index + 1,
        batch_name,
        format_iso_date(due_date),
        installment_amount.format_with_code(),
        total_due.format_with_code(),
    )
}

/// Ready-to-send WhatsApp text for one installment
pub fn whatsapp_template(student_name: &str, batch_name: &str, due_amount: Money, due_date: NaiveDate) -> String {
    format!(
        "Hello {}, this is a fee reminder for {}. Amount due: {}. Due date: {}. Please pay at the earliest. Thank you.",
        student_name,
        batch_name,
        due_amount.format_with_code(),
        format_iso_date(due_date),
    )
}
