use serde::{Deserialize, Serialize};

/// Incident categories a user can report. Wire names are stable; display
/// labels match the mobile screens.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IncidentKind {
    Theft,
    Harassment,
    Assault,
    Vandalism,
    Accident,
    Fire,
    Flood,
    Electrocution,
    Other,
}

impl Default for IncidentKind {
    fn default() -> Self {
        IncidentKind::Theft
    }
}

impl IncidentKind {
    pub fn label(&self) -> &'static str {
        match self {
            IncidentKind::Theft => "Vol",
            IncidentKind::Harassment => "Harcèlement",
            IncidentKind::Assault => "Agression",
            IncidentKind::Vandalism => "Vandalisme",
            IncidentKind::Accident => "Accident",
            IncidentKind::Fire => "Incendie",
            IncidentKind::Flood => "Inondation",
            IncidentKind::Electrocution => "Électrocution",
            IncidentKind::Other => "Autre",
        }
    }
}

/// Responder services an incident can be routed to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResponderService {
    Police,
    Gendarmerie,
    Firefighters,
    PrivateSecurity,
    Other,
}

impl Default for ResponderService {
    fn default() -> Self {
        ResponderService::Police
    }
}

impl ResponderService {
    pub fn label(&self) -> &'static str {
        match self {
            ResponderService::Police => "Police",
            ResponderService::Gendarmerie => "Gendarmerie",
            ResponderService::Firefighters => "Pompiers",
            ResponderService::PrivateSecurity => "Sécurité privée",
            ResponderService::Other => "Autre",
        }
    }
}

/// Best-effort location fix captured when the capture screen opens. Never
/// re-queried mid-edit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// A single incident record. Immutable once created; resubmitting creates a
/// new report with a fresh id.
///
/// Optional fields carry `serde(default)` so newer code keeps reading lists
/// written before the field existed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: IncidentKind,
    pub service: ResponderService,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    pub date: String,
}

/// The remote copy of a report. Only this copy carries the owner: the local
/// history is already scoped to one device and one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IncidentRecord {
    #[serde(flatten)]
    pub report: Report,
    pub owner_id: String,
}

impl IncidentRecord {
    pub fn new(report: Report, owner_id: &str) -> Self {
        Self {
            report,
            owner_id: owner_id.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("description is empty")]
    EmptyDescription,
}

/// In-progress capture draft. Every field except the description has a safe
/// preset, so a report is constructible as soon as the description is
/// non-empty.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureForm {
    pub kind: IncidentKind,
    pub service: ResponderService,
    pub description: String,
    pub image: Option<String>,
    pub location: Option<GeoPoint>,
}

impl Default for CaptureForm {
    fn default() -> Self {
        Self {
            kind: IncidentKind::default(),
            service: ResponderService::default(),
            description: String::new(),
            image: None,
            location: None,
        }
    }
}

impl CaptureForm {
    /// The only validation rule: the trimmed description must be non-empty.
    /// No side effects.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.description.trim().is_empty() {
            return Err(ValidationError::EmptyDescription);
        }
        Ok(())
    }

    /// Back to the preset state (default kind/service, empty description, no
    /// photo, no location).
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
