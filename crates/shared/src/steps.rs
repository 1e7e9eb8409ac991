use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ParseStepError;

/// One section of the multi-part application form.
///
/// Declaration order is the order the wizard walks through; unlock gating and
/// next/previous navigation both follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepId {
    ProgramDetails,
    PersonalInformation,
    DemographicInformation,
    ContactDetails,
    NextOfKin,
    MatricExamDetails,
    MatricSubjects,
    TertiaryEducation,
    FinancialInformation,
    GrantsScholarships,
    DocumentUpload,
    AlumniStaff,
    Agreement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepDefinition {
    pub id: StepId,
    pub title: &'static str,
    pub path: &'static str,
}

macro_rules! step {
    ($id:ident, $title:literal, $slug:literal) => {
        StepDefinition {
            id: StepId::$id,
            title: $title,
            path: concat!("/application/", $slug),
        }
    };
}

pub const APPLICATION_STEPS: [StepDefinition; 13] = [
    step!(ProgramDetails, "Program Details", "program-details"),
    step!(PersonalInformation, "Personal Information", "personal-information"),
    step!(DemographicInformation, "Demographic Information", "demographic-information"),
    step!(ContactDetails, "Contact Details", "contact-details"),
    step!(NextOfKin, "Next of Kin", "next-of-kin"),
    step!(MatricExamDetails, "Matric Exam Details", "matric-exam-details"),
    step!(MatricSubjects, "Matric Subjects", "matric-subjects"),
    step!(TertiaryEducation, "Tertiary Education", "tertiary-education"),
    step!(FinancialInformation, "Financial Information", "financial-information"),
    step!(GrantsScholarships, "Grants & Scholarships", "grants-scholarships"),
    step!(DocumentUpload, "Document Upload", "document-upload"),
    step!(AlumniStaff, "Alumni & Staff", "alumni-staff"),
    step!(Agreement, "Agreement", "agreement"),
];

pub const TOTAL_STEPS: usize = APPLICATION_STEPS.len();

const PATH_PREFIX: &str = "/application/";

impl StepId {
    pub const FIRST: StepId = StepId::ProgramDetails;
    pub const LAST: StepId = StepId::Agreement;

    pub fn all() -> impl Iterator<Item = StepId> {
        APPLICATION_STEPS.iter().map(|step| step.id)
    }

    /// Position in the fixed step sequence.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<StepId> {
        APPLICATION_STEPS.get(index).map(|step| step.id)
    }

    pub fn definition(self) -> &'static StepDefinition {
        &APPLICATION_STEPS[self.index()]
    }

    pub fn as_str(self) -> &'static str {
        &self.definition().path[PATH_PREFIX.len()..]
    }

    pub fn title(self) -> &'static str {
        self.definition().title
    }

    pub fn path(self) -> &'static str {
        self.definition().path
    }

    pub fn next(self) -> Option<StepId> {
        StepId::from_index(self.index() + 1)
    }

    pub fn previous(self) -> Option<StepId> {
        self.index().checked_sub(1).and_then(StepId::from_index)
    }

    /// Steps strictly before this one, in order.
    pub fn predecessors(self) -> &'static [StepDefinition] {
        &APPLICATION_STEPS[..self.index()]
    }

    /// Resolves a routing path such as `/application/next-of-kin`.
    ///
    /// A trailing slash is tolerated; anything outside the application
    /// section returns `None`.
    pub fn from_path(path: &str) -> Option<StepId> {
        let slug = path.strip_prefix(PATH_PREFIX)?.trim_end_matches('/');
        slug.parse().ok()
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepId {
    type Err = ParseStepError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        StepId::all()
            .find(|step| step.as_str() == raw)
            .ok_or_else(|| ParseStepError::UnknownStep(raw.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_order_matches_enum_discriminants() {
        for (index, step) in APPLICATION_STEPS.iter().enumerate() {
            assert_eq!(step.id.index(), index);
        }
        assert_eq!(TOTAL_STEPS, 13);
    }

    #[test]
    fn serde_names_match_path_slugs() {
        for step in StepId::all() {
            let encoded = serde_json::to_string(&step).expect("encode");
            assert_eq!(encoded, format!("\"{}\"", step.as_str()));
        }
    }

    #[test]
    fn navigation_stops_at_boundaries() {
        assert_eq!(StepId::FIRST.previous(), None);
        assert_eq!(StepId::LAST.next(), None);
        assert_eq!(
            StepId::ProgramDetails.next(),
            Some(StepId::PersonalInformation)
        );
        assert_eq!(StepId::Agreement.previous(), Some(StepId::AlumniStaff));
    }

    #[test]
    fn parses_ids_and_paths() {
        assert_eq!(
            "grants-scholarships".parse::<StepId>().expect("parse"),
            StepId::GrantsScholarships
        );
        assert_eq!(
            StepId::from_path("/application/next-of-kin/"),
            Some(StepId::NextOfKin)
        );
        assert_eq!(StepId::from_path("/application/close"), None);
        assert_eq!(StepId::from_path("/help"), None);
        assert!(matches!(
            "program-selection".parse::<StepId>(),
            Err(ParseStepError::UnknownStep(raw)) if raw == "program-selection"
        ));
    }

    #[test]
    fn predecessors_of_first_step_are_empty() {
        assert!(StepId::FIRST.predecessors().is_empty());
        assert_eq!(StepId::ContactDetails.predecessors().len(), 3);
    }
}
