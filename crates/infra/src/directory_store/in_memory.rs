use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use gatekeep_core::{GroupId, RecordId, Role};
use gatekeep_directory::{
    DirectoryEntry, DirectoryStore, Group, RecruiterEntry, RecruiterRecord, StoreError, StudentEntry,
    StudentPage, StudentQuery, StudentRecord,
};

#[derive(Debug, Default)]
struct Directory {
    groups: HashMap<GroupId, Group>,
    students: HashMap<RecordId, StudentRecord>,
    recruiters: HashMap<RecordId, RecruiterRecord>,
}

impl Directory {
    /// Group ids that do not resolve are skipped, like a dangling join.
    fn join<R: Clone>(&self, record: &R, group_ids: &[GroupId]) -> DirectoryEntry<R> {
        DirectoryEntry {
            record: record.clone(),
            groups: group_ids
                .iter()
                .filter_map(|id| self.groups.get(id).cloned())
                .collect(),
        }
    }

    fn student_entry(&self, record: &StudentRecord) -> StudentEntry {
        self.join(record, &record.groups)
    }

    /// Students in roll-number order.
    fn students_sorted(&self) -> Vec<&StudentRecord> {
        let mut students: Vec<_> = self.students.values().collect();
        students.sort_by_key(|s| (s.roll_no, s.id));
        students
    }
}

/// In-memory directory for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryDirectoryStore {
    inner: RwLock<Directory>,
}

impl InMemoryDirectoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_group(&self, group: Group) -> Result<(), StoreError> {
        self.write()?.groups.insert(group.id, group);
        Ok(())
    }

    pub fn insert_student(&self, record: StudentRecord) -> Result<(), StoreError> {
        self.write()?.students.insert(record.id, record);
        Ok(())
    }

    pub fn insert_recruiter(&self, record: RecruiterRecord) -> Result<(), StoreError> {
        self.write()?.recruiters.insert(record.id, record);
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Directory>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::unavailable("in-memory directory lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Directory>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::unavailable("in-memory directory lock poisoned"))
    }
}

#[async_trait]
impl DirectoryStore for InMemoryDirectoryStore {
    async fn find_student_by_email_aliases(
        &self,
        aliases: &[String],
        _no_cache: bool,
    ) -> Result<Option<StudentEntry>, StoreError> {
        let dir = self.read()?;
        Ok(dir
            .students_sorted()
            .into_iter()
            .find(|s| aliases.contains(&s.email))
            .map(|s| dir.student_entry(s)))
    }

    async fn find_recruiter_by_email_aliases(
        &self,
        aliases: &[String],
        _no_cache: bool,
    ) -> Result<Option<RecruiterEntry>, StoreError> {
        let dir = self.read()?;
        let mut matches: Vec<_> = dir
            .recruiters
            .values()
            .filter(|r| aliases.contains(&r.email))
            .collect();
        matches.sort_by_key(|r| r.id);
        Ok(matches.first().map(|r| dir.join(*r, &r.groups)))
    }

    async fn find_student_by_id(
        &self,
        id: RecordId,
        _no_cache: bool,
    ) -> Result<Option<StudentEntry>, StoreError> {
        let dir = self.read()?;
        Ok(dir.students.get(&id).map(|s| dir.student_entry(s)))
    }

    async fn find_students_by_role(
        &self,
        role: &Role,
        _no_cache: bool,
    ) -> Result<Vec<StudentEntry>, StoreError> {
        let dir = self.read()?;
        Ok(dir
            .students_sorted()
            .into_iter()
            .map(|s| dir.student_entry(s))
            .filter(|entry| entry.grants(role))
            .collect())
    }

    async fn search_students(
        &self,
        query: &StudentQuery,
        _no_cache: bool,
    ) -> Result<StudentPage, StoreError> {
        let dir = self.read()?;
        let matches: Vec<_> = dir
            .students_sorted()
            .into_iter()
            .filter(|s| query.matches(s))
            .collect();
        let total = matches.len();
        let page = match query.pagination {
            Some(pagination) => pagination.apply(matches),
            None => matches,
        };
        Ok(StudentPage {
            students: page.into_iter().map(|s| dir.student_entry(s)).collect(),
            total,
        })
    }

    async fn persist_student(&self, record: StudentRecord) -> Result<(), StoreError> {
        self.insert_student(record)
    }
}
