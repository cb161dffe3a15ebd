//! Student directory record.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use gatekeep_core::{CompanyId, GroupId, RecordId, ValueObject};

use crate::verification::{VerifiableContent, Verified};

/// The persisted student document.
///
/// Updates never mutate a stored value: the update path builds a new record
/// from the stored one and the client payload (see [`crate::trust`]).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentRecord {
    pub id: RecordId,

    // Administered fields, never taken from a client payload.
    pub groups: Vec<GroupId>,
    pub companies_alloted: Vec<CompanyId>,
    pub batch: i32,
    pub email: String,
    pub department: String,

    pub roll_no: i64,
    pub course: String,
    pub specialisation: Option<String>,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_picture: Option<String>,
    pub gender: Option<Gender>,
    pub dob: Option<DateTime<Utc>>,
    pub permanent_address: String,
    pub present_address: String,
    pub personal_email: String,
    pub mobile: Option<i64>,
    pub category: Option<ReservationCategory>,
    pub mother_tongue: Option<String>,
    pub parents_details: Option<ParentsDetails>,

    pub academics: Verified<AcademicRecord>,
    pub social_profiles: SocialProfiles,
    pub work_experience: Vec<Verified<WorkEntry>>,
    pub extras: Verified<ExtrasRecord>,

    pub updated_at: DateTime<Utc>,
}

impl StudentRecord {
    pub fn new(id: RecordId, email: impl Into<String>, first_name: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            first_name: first_name.into(),
            ..Self::default()
        }
    }

    /// Display name, skipping absent middle/last names.
    pub fn full_name(&self) -> String {
        [
            Some(self.first_name.as_str()),
            self.middle_name.as_deref(),
            self.last_name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationCategory {
    pub category: String,
    #[serde(rename = "isEWS")]
    pub is_ews: bool,
    #[serde(rename = "isPWD")]
    pub is_pwd: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParentsDetails {
    pub father_name: Option<String>,
    pub father_occupation: Option<String>,
    pub mother_name: Option<String>,
    pub mother_occupation: Option<String>,
}

/// Board examination result (class X / XII).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchoolResult {
    pub board: String,
    pub institute: String,
    pub year: i32,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AcademicRecord {
    pub jee_rank: Option<i64>,
    pub tenth: Option<SchoolResult>,
    pub twelfth: Option<SchoolResult>,
    /// Semester performance index, one entry per completed semester.
    pub semester_spi: Vec<f64>,
    pub summer_spi: Vec<f64>,
    pub cgpa: Option<f64>,
    pub active_backlogs: u32,
    pub total_backlogs: u32,
    pub education_gap: Option<u32>,
}

impl ValueObject for AcademicRecord {}
impl VerifiableContent for AcademicRecord {}

/// A public profile on some external platform.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SocialHandle {
    pub url: String,
    pub username: String,
}

impl SocialHandle {
    pub fn new(url: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
        }
    }
}

impl ValueObject for SocialHandle {}
impl VerifiableContent for SocialHandle {}

/// The platforms a student can link, in wire order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SocialPlatform {
    LinkedIn,
    GitHub,
    MicrosoftTeams,
    Skype,
    GoogleScholar,
    Codeforces,
    CodeChef,
    LeetCode,
    Kaggle,
}

impl SocialPlatform {
    pub const ALL: [SocialPlatform; 9] = [
        SocialPlatform::LinkedIn,
        SocialPlatform::GitHub,
        SocialPlatform::MicrosoftTeams,
        SocialPlatform::Skype,
        SocialPlatform::GoogleScholar,
        SocialPlatform::Codeforces,
        SocialPlatform::CodeChef,
        SocialPlatform::LeetCode,
        SocialPlatform::Kaggle,
    ];

    /// Wire name of the platform's slot in `socialProfiles`.
    pub fn field_name(&self) -> &'static str {
        match self {
            SocialPlatform::LinkedIn => "linkedIn",
            SocialPlatform::GitHub => "github",
            SocialPlatform::MicrosoftTeams => "microsoftTeams",
            SocialPlatform::Skype => "skype",
            SocialPlatform::GoogleScholar => "googleScholar",
            SocialPlatform::Codeforces => "codeforces",
            SocialPlatform::CodeChef => "codeChef",
            SocialPlatform::LeetCode => "leetCode",
            SocialPlatform::Kaggle => "kaggle",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialProfiles {
    #[serde(rename = "linkedIn")]
    pub linkedin: Option<Verified<SocialHandle>>,
    pub github: Option<Verified<SocialHandle>>,
    #[serde(rename = "microsoftTeams")]
    pub microsoft_teams: Option<Verified<SocialHandle>>,
    pub skype: Option<Verified<SocialHandle>>,
    #[serde(rename = "googleScholar")]
    pub google_scholar: Option<Verified<SocialHandle>>,
    pub codeforces: Option<Verified<SocialHandle>>,
    #[serde(rename = "codeChef")]
    pub codechef: Option<Verified<SocialHandle>>,
    #[serde(rename = "leetCode")]
    pub leetcode: Option<Verified<SocialHandle>>,
    pub kaggle: Option<Verified<SocialHandle>>,
}

impl SocialProfiles {
    pub fn get(&self, platform: SocialPlatform) -> Option<&Verified<SocialHandle>> {
        self.slot(platform).as_ref()
    }

    pub fn slot(&self, platform: SocialPlatform) -> &Option<Verified<SocialHandle>> {
        match platform {
            SocialPlatform::LinkedIn => &self.linkedin,
            SocialPlatform::GitHub => &self.github,
            SocialPlatform::MicrosoftTeams => &self.microsoft_teams,
            SocialPlatform::Skype => &self.skype,
            SocialPlatform::GoogleScholar => &self.google_scholar,
            SocialPlatform::Codeforces => &self.codeforces,
            SocialPlatform::CodeChef => &self.codechef,
            SocialPlatform::LeetCode => &self.leetcode,
            SocialPlatform::Kaggle => &self.kaggle,
        }
    }

    pub fn slot_mut(&mut self, platform: SocialPlatform) -> &mut Option<Verified<SocialHandle>> {
        match platform {
            SocialPlatform::LinkedIn => &mut self.linkedin,
            SocialPlatform::GitHub => &mut self.github,
            SocialPlatform::MicrosoftTeams => &mut self.microsoft_teams,
            SocialPlatform::Skype => &mut self.skype,
            SocialPlatform::GoogleScholar => &mut self.google_scholar,
            SocialPlatform::Codeforces => &mut self.codeforces,
            SocialPlatform::CodeChef => &mut self.codechef,
            SocialPlatform::LeetCode => &mut self.leetcode,
            SocialPlatform::Kaggle => &mut self.kaggle,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkEntry {
    pub company: String,
    pub designation: String,
    pub location: Option<String>,
    /// e.g. "internship", "full-time".
    pub kind: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
}

impl ValueObject for WorkEntry {}
impl VerifiableContent for WorkEntry {}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtrasRecord {
    pub video_resume: Option<String>,
    pub achievements: Vec<String>,
    pub certifications: Vec<String>,
    pub positions_of_responsibility: Vec<String>,
}

impl ValueObject for ExtrasRecord {}
impl VerifiableContent for ExtrasRecord {}
