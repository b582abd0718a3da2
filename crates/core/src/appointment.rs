//! Appointment snapshot
//!
//! The read-only record a confirmation call is about. It is supplied when the
//! call session is created and never fetched or mutated by the dialogue layer.

use serde::{Deserialize, Serialize};

/// Appointment details for one call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    /// Spoken date, e.g. "tomorrow" or "Tuesday the 14th"
    pub date: String,
    /// Spoken time, e.g. "2:30 PM"
    pub time: String,
    /// Service booked, e.g. "dental cleaning"
    pub service_name: String,
    /// Provider the appointment is with, e.g. "Dr. Johnson"
    pub provider_name: String,
    /// Practice or location name
    pub location_name: String,
    /// Name of the person the appointment is for, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
}

impl Appointment {
    pub fn new(
        date: impl Into<String>,
        time: impl Into<String>,
        service_name: impl Into<String>,
        provider_name: impl Into<String>,
        location_name: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            time: time.into(),
            service_name: service_name.into(),
            provider_name: provider_name.into(),
            location_name: location_name.into(),
            customer_name: None,
        }
    }

    pub fn with_customer_name(mut self, name: impl Into<String>) -> Self {
        self.customer_name = Some(name.into());
        self
    }

    /// Value of a single detail, as it should be spoken
    pub fn detail(&self, detail: AppointmentDetail) -> String {
        match detail {
            AppointmentDetail::Date => self.date.clone(),
            AppointmentDetail::Time => self.time.clone(),
            AppointmentDetail::Service => self.service_name.clone(),
            AppointmentDetail::Provider => self.provider_name.clone(),
            AppointmentDetail::Location => self.location_name.clone(),
            AppointmentDetail::All => format!(
                "{} with {} at {}, {} at {}",
                self.service_name, self.provider_name, self.location_name, self.date, self.time
            ),
        }
    }

    /// Name to use when asking for the intended recipient
    pub fn recipient_name(&self) -> &str {
        self.customer_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or("the person this appointment is for")
    }
}

/// A single appointment fact a customer can ask about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentDetail {
    Date,
    Time,
    Service,
    Provider,
    Location,
    /// Everything at once
    All,
}

impl AppointmentDetail {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentDetail::Date => "date",
            AppointmentDetail::Time => "time",
            AppointmentDetail::Service => "service",
            AppointmentDetail::Provider => "provider",
            AppointmentDetail::Location => "location",
            AppointmentDetail::All => "all",
        }
    }
}

impl std::fmt::Display for AppointmentDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Part of the day used in greetings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    /// Morning before noon, afternoon before 17:00, evening otherwise
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..=11 => TimeOfDay::Morning,
            12..=16 => TimeOfDay::Afternoon,
            _ => TimeOfDay::Evening,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
        }
    }
}

impl std::fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
