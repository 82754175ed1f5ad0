use crate::config::UiLocale;

/// Visible texts of the Unit4 timesheet screen in one UI language.
#[derive(Debug, Clone, Copy)]
pub struct UiLabels {
    pub menu: &'static str,
    pub week_field: &'static str,
    pub add: &'static str,
    pub delete: &'static str,
    pub confirm_yes: &'static str,
    pub ok: &'static str,
    pub cancel: &'static str,
    pub save: &'static str,
    pub details: &'static str,
    pub time_details: &'static str,
    pub work_order: &'static str,
    pub activity: &'static str,
    pub description: &'static str,
    pub ticket: &'static str,
    /// Status texts of a week that can no longer be edited.
    pub status_locked: &'static [&'static str],
}

const DE: UiLabels = UiLabels {
    menu: "Zeiterfassung - Standard",
    week_field: "Woche",
    add: "Ergänzen",
    delete: "Löschen",
    confirm_yes: "Ja",
    ok: "OK",
    cancel: "Abbrechen",
    save: "Speichern",
    details: "Klicken, um weitere Details anzuzeigen",
    time_details: "Zeitdetails",
    work_order: "ArbAuft",
    activity: "Aktivität",
    description: "Text",
    ticket: "Ticketno",
    status_locked: &["Bereit", "Transferiert", "Gesendet"],
};

const EN: UiLabels = UiLabels {
    menu: "Timesheets - standard",
    week_field: "Period",
    add: "Add",
    delete: "Delete",
    confirm_yes: "Yes",
    ok: "OK",
    cancel: "Cancel",
    save: "Save",
    details: "Click to see more details",
    time_details: "Time details",
    work_order: "Work order",
    activity: "Activity",
    description: "Description",
    ticket: "Ticketno",
    status_locked: &["Ready", "Transferred", "Sent"],
};

/// Page titles shown while the user is not logged in.
pub const LOGIN_TITLES: &[&str] = &["Login", "Anmelden", "Sign in"];

impl UiLabels {
    pub fn for_locale(locale: UiLocale) -> &'static UiLabels {
        match locale {
            UiLocale::De => &DE,
            UiLocale::En => &EN,
        }
    }
}

pub fn is_login_title(title: &str) -> bool {
    LOGIN_TITLES.iter().any(|t| title.contains(t))
}
