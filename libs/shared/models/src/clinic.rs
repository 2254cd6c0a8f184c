use serde::{Deserialize, Serialize};

/// Recurring weekly window during which a veterinarian accepts bookings.
/// `start`/`end` are `HH:MM` strings and are only interpreted when slots are computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHours {
    pub day_of_week: String,
    pub start: String,
    pub end: String,
}

impl WorkingHours {
    pub fn new(day_of_week: &str, start: &str, end: &str) -> Self {
        Self {
            day_of_week: day_of_week.to_string(),
            start: start.to_string(),
            end: end.to_string(),
        }
    }
}

/// A pet owner profile. `id` is the identity provider's subject id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Veterinarian {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub clinic_address: String,
    #[serde(default)]
    pub available_hours: Vec<WorkingHours>,
    #[serde(default)]
    pub role: String,
}

/// Either kind of stored profile, as returned by the user endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Profile {
    Client(Client),
    Veterinarian(Veterinarian),
}

impl Profile {
    pub fn id(&self) -> &str {
        match self {
            Profile::Client(client) => &client.id,
            Profile::Veterinarian(vet) => &vet.id,
        }
    }
}
