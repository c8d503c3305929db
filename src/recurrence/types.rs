//! Treatment recommendation input.

use crate::api::TreatmentType;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Light-bath course for a set of body locations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightBathSpec {
    pub locations: Vec<String>,
    pub quantity: u32,
    pub start_date: NaiveDate,
    pub color: String,
    /// In units of 7 minutes.
    pub duration: u8,
}

/// Rod course for a set of body locations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RodSpec {
    pub locations: Vec<String>,
    pub quantity: u32,
    pub start_date: NaiveDate,
}

/// A practitioner's recommendation issued at a spiritual consultation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentRecommendation {
    pub patient_id: u64,
    /// Consultation the recommendation came from.
    pub attendance_id: Option<u64>,
    pub attendance_date: NaiveDate,
    pub return_weeks: u32,
    pub light_bath: Option<Vec<LightBathSpec>>,
    pub rod: Option<Vec<RodSpec>>,
    pub notes: Option<String>,
}

/// One location spec normalized across treatment types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct CourseSpec {
    pub treatment_type: TreatmentType,
    pub locations: Vec<String>,
    pub quantity: u32,
    pub start_date: NaiveDate,
    pub color: Option<String>,
    pub duration: Option<u8>,
}

impl TreatmentRecommendation {
    /// Light-bath specs first, then rod, each in submission order.
    pub(crate) fn courses(&self) -> Vec<CourseSpec> {
        let light_bath = self.light_bath.iter().flatten().map(|spec| CourseSpec {
            treatment_type: TreatmentType::LightBath,
            locations: spec.locations.clone(),
            quantity: spec.quantity,
            start_date: spec.start_date,
            color: Some(spec.color.clone()),
            duration: Some(spec.duration),
        });
        let rod = self.rod.iter().flatten().map(|spec| CourseSpec {
            treatment_type: TreatmentType::Rod,
            locations: spec.locations.clone(),
            quantity: spec.quantity,
            start_date: spec.start_date,
            color: None,
            duration: None,
        });
        light_bath.chain(rod).collect()
    }
}

impl CourseSpec {
    pub fn describe(&self) -> String {
        format!("{} ({})", self.treatment_type.label(), self.locations.join(", "))
    }
}
