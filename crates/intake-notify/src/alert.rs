//! Staff alert formatting.

use intake_core::types::IntakeRecord;

/// Renders the lead alert delivered to the department inbox.
pub fn format_alert(record: &IntakeRecord) -> String {
    let mut alert = format!(
        "🚨 *LEAD: {}*\n👤 {}\n📝 {}\n📞 https://wa.me/{}",
        record.department_label, record.name, record.reason, record.phone
    );
    if record.scheduled == Some(true) {
        alert.push_str("\n📅 Solicitou agendamento");
    }
    alert
}
