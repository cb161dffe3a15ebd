//! Typed, UI-facing view of a student's personal profile.
//!
//! Each field is rendered as a [`GenericField`]: the value tagged with its
//! data type, plus null/required flags the profile editor uses to render
//! inputs and validation hints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::student::{Gender, StudentRecord};

/// A field value tagged with its data type.
///
/// Every variant carries an `Option`: a field has a type even when it holds
/// no value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dataType", content = "value", rename_all = "camelCase")]
pub enum FieldValue {
    Bool(Option<bool>),
    #[serde(rename = "string")]
    Text(Option<String>),
    Integer(Option<i64>),
    Float(Option<f64>),
    DateTime(Option<DateTime<Utc>>),
    #[serde(rename = "choices")]
    Choice(Choice),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub selected: Option<String>,
    pub options: Vec<String>,
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        match self {
            FieldValue::Bool(v) => v.is_none(),
            FieldValue::Text(v) => v.is_none(),
            FieldValue::Integer(v) => v.is_none(),
            FieldValue::Float(v) => v.is_none(),
            FieldValue::DateTime(v) => v.is_none(),
            FieldValue::Choice(c) => c.selected.is_none(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericField {
    #[serde(flatten)]
    pub value: FieldValue,
    pub is_null: bool,
    pub is_required: bool,
}

impl GenericField {
    pub fn optional(value: FieldValue) -> Self {
        Self {
            is_null: value.is_null(),
            value,
            is_required: false,
        }
    }

    pub fn required(value: FieldValue) -> Self {
        Self {
            is_required: true,
            ..Self::optional(value)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalProfile {
    pub first_name: GenericField,
    pub middle_name: GenericField,
    pub last_name: GenericField,
    pub gender: GenericField,
    pub dob: GenericField,
    pub permanent_address: GenericField,
    pub present_address: GenericField,
    pub personal_email: GenericField,
    pub mobile: GenericField,
    pub category: GenericField,
    #[serde(rename = "isEWS")]
    pub is_ews: GenericField,
    #[serde(rename = "isPWD")]
    pub is_pwd: GenericField,
    pub mother_tongue: GenericField,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSections {
    pub personal_profile: PersonalProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentProfileView {
    pub profile: ProfileSections,
}

impl StudentProfileView {
    pub fn from_record(student: &StudentRecord) -> Self {
        Self {
            profile: ProfileSections {
                personal_profile: PersonalProfile::from_record(student),
            },
        }
    }
}

fn text(value: &str) -> FieldValue {
    FieldValue::Text(Some(value.to_owned()))
}

fn opt_text(value: Option<&str>) -> FieldValue {
    FieldValue::Text(value.map(str::to_owned))
}

impl PersonalProfile {
    pub fn from_record(student: &StudentRecord) -> Self {
        let category = student.category.as_ref();
        let gender = Choice {
            selected: student.gender.map(|g| g.as_str().to_owned()),
            options: Gender::ALL.iter().map(|g| g.as_str().to_owned()).collect(),
        };

        Self {
            first_name: GenericField::required(text(&student.first_name)),
            middle_name: GenericField::optional(opt_text(student.middle_name.as_deref())),
            last_name: GenericField::optional(opt_text(student.last_name.as_deref())),
            gender: GenericField::optional(FieldValue::Choice(gender)),
            dob: GenericField::required(FieldValue::DateTime(student.dob)),
            permanent_address: GenericField::required(text(&student.permanent_address)),
            present_address: GenericField::optional(text(&student.present_address)),
            personal_email: GenericField::required(text(&student.personal_email)),
            mobile: GenericField::required(FieldValue::Integer(student.mobile)),
            category: GenericField::optional(opt_text(category.map(|c| c.category.as_str()))),
            is_ews: GenericField::optional(FieldValue::Bool(category.map(|c| c.is_ews))),
            is_pwd: GenericField::optional(FieldValue::Bool(category.map(|c| c.is_pwd))),
            mother_tongue: GenericField::optional(opt_text(student.mother_tongue.as_deref())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::student::ReservationCategory;
    use gatekeep_core::RecordId;

    fn student() -> StudentRecord {
        StudentRecord::new(RecordId::new(), "asha.rao.cse21@iitbhu.ac.in", "Asha")
    }

    #[test]
    fn required_flags_follow_the_profile_form() {
        let p = PersonalProfile::from_record(&student());
        assert!(p.first_name.is_required);
        assert!(p.dob.is_required);
        assert!(p.permanent_address.is_required);
        assert!(p.personal_email.is_required);
        assert!(p.mobile.is_required);
        assert!(!p.middle_name.is_required);
        assert!(!p.category.is_required);
    }

    #[test]
    fn missing_category_nulls_all_three_fields() {
        let p = PersonalProfile::from_record(&student());
        assert!(p.category.is_null);
        assert!(p.is_ews.is_null);
        assert!(p.is_pwd.is_null);

        let mut s = student();
        s.category = Some(ReservationCategory {
            category: "OBC".into(),
            is_ews: false,
            is_pwd: true,
        });
        let p = PersonalProfile::from_record(&s);
        assert_eq!(p.category.value, FieldValue::Text(Some("OBC".into())));
        assert_eq!(p.is_pwd.value, FieldValue::Bool(Some(true)));
        assert!(!p.is_ews.is_null);
    }

    #[test]
    fn required_but_absent_is_null() {
        let p = PersonalProfile::from_record(&student());
        assert!(p.mobile.is_required && p.mobile.is_null);
        assert!(p.dob.is_null);
    }

    #[test]
    fn field_serializes_flat_with_data_type() {
        let p = PersonalProfile::from_record(&student());
        let json = serde_json::to_value(&p.first_name).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "dataType": "string",
                "value": "Asha",
                "isNull": false,
                "isRequired": true
            })
        );

        let gender = serde_json::to_value(&p.gender).unwrap();
        assert_eq!(gender["dataType"], "choices");
        assert_eq!(gender["value"]["options"], serde_json::json!(["male", "female", "other"]));
    }
}
