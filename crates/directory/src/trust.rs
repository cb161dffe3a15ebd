//! Trust revocation on profile updates.
//!
//! Reviewers attest individual blocks of a student profile (academics, each
//! social profile, each work-experience entry, extras). When the student
//! edits their profile, [`TrustInvalidator::merge`] builds the record to
//! persist: administered fields are kept, personal fields are taken from the
//! edit, and every block whose content changed loses its attestation.
//!
//! The merge is total and pure. It never fails and never touches storage.

use chrono::{DateTime, Utc};

use crate::student::{SocialPlatform, StudentRecord, WorkEntry};
use crate::verification::{VerifiableContent, Verified};

/// What happens to stored work-experience entries the edit no longer lists.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum WorkExperiencePolicy {
    /// The edit is authoritative: unmatched entries are dropped.
    #[default]
    Replace,
    /// Unmatched entries are kept, with their attestation, after the
    /// entries from the edit.
    RetainUnmatched,
}

/// Result of a merge.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub record: StudentRecord,
    /// Paths of blocks that were verified before the merge and no longer are
    /// (e.g. `academics`, `socialProfiles.github`, `workExperience[1]`).
    pub revoked: Vec<String>,
    /// Whether `record` differs from the stored record.
    pub changed: bool,
}

#[derive(Debug, Copy, Clone, Default)]
pub struct TrustInvalidator {
    work_experience: WorkExperiencePolicy,
}

impl TrustInvalidator {
    pub fn new(work_experience: WorkExperiencePolicy) -> Self {
        Self { work_experience }
    }

    pub fn work_experience_policy(&self) -> WorkExperiencePolicy {
        self.work_experience
    }

    /// Merge a client edit (`incoming`) into the stored record (`current`).
    ///
    /// `updated_at` is set to `now` only when the result differs from
    /// `current`, so merging a record with itself is the identity.
    pub fn merge(
        &self,
        incoming: &StudentRecord,
        current: &StudentRecord,
        now: DateTime<Utc>,
    ) -> MergeOutcome {
        let mut record = current.clone();
        let mut revoked = Vec::new();

        overwrite_personal_fields(&mut record, incoming);

        record.academics = merge_block(
            &incoming.academics,
            &current.academics,
            "academics",
            &mut revoked,
        );

        for platform in SocialPlatform::ALL {
            // An absent slot in the edit leaves the stored profile alone.
            let Some(update) = incoming.social_profiles.get(platform) else {
                continue;
            };
            let merged = match current.social_profiles.get(platform) {
                Some(existing) => merge_block(
                    update,
                    existing,
                    &format!("socialProfiles.{}", platform.field_name()),
                    &mut revoked,
                ),
                None => Verified::unverified(update.content.clone()),
            };
            *record.social_profiles.slot_mut(platform) = Some(merged);
        }

        record.work_experience = self.merge_work_experience(
            &incoming.work_experience,
            &current.work_experience,
            &mut revoked,
        );

        record.extras = merge_block(&incoming.extras, &current.extras, "extras", &mut revoked);

        let changed = record != *current;
        if changed {
            record.updated_at = now;
        }

        MergeOutcome {
            record,
            revoked,
            changed,
        }
    }

    /// Multiset match: each stored entry can vouch for at most one entry of
    /// the edit. Output order follows the edit.
    fn merge_work_experience(
        &self,
        incoming: &[Verified<WorkEntry>],
        current: &[Verified<WorkEntry>],
        revoked: &mut Vec<String>,
    ) -> Vec<Verified<WorkEntry>> {
        let mut matched = vec![false; current.len()];
        let mut merged = Vec::with_capacity(incoming.len());

        for entry in incoming {
            let hit = (0..current.len()).find(|&i| !matched[i] && current[i].same_content(entry));
            match hit {
                Some(i) => {
                    matched[i] = true;
                    merged.push(current[i].clone());
                }
                None => merged.push(Verified::unverified(entry.content.clone())),
            }
        }

        for (i, entry) in current.iter().enumerate().filter(|(i, _)| !matched[*i]) {
            match self.work_experience {
                WorkExperiencePolicy::Replace => {
                    if entry.is_verified() {
                        revoked.push(format!("workExperience[{i}]"));
                    }
                }
                WorkExperiencePolicy::RetainUnmatched => merged.push(entry.clone()),
            }
        }

        merged
    }
}

fn overwrite_personal_fields(record: &mut StudentRecord, incoming: &StudentRecord) {
    record.roll_no = incoming.roll_no;
    record.course = incoming.course.clone();
    record.specialisation = incoming.specialisation.clone();
    record.first_name = incoming.first_name.clone();
    record.middle_name = incoming.middle_name.clone();
    record.last_name = incoming.last_name.clone();
    record.profile_picture = incoming.profile_picture.clone();
    record.gender = incoming.gender;
    record.dob = incoming.dob;
    record.permanent_address = incoming.permanent_address.clone();
    record.present_address = incoming.present_address.clone();
    record.personal_email = incoming.personal_email.clone();
    record.mobile = incoming.mobile;
    record.category = incoming.category.clone();
    record.mother_tongue = incoming.mother_tongue.clone();
    record.parents_details = incoming.parents_details.clone();
}

fn merge_block<T: VerifiableContent>(
    incoming: &Verified<T>,
    current: &Verified<T>,
    path: &str,
    revoked: &mut Vec<String>,
) -> Verified<T> {
    if incoming.same_content(current) {
        return current.clone();
    }
    if current.is_verified() {
        revoked.push(path.to_owned());
    }
    Verified::unverified(incoming.content.clone())
}
