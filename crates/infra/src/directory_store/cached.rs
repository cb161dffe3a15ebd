//! Read-through cache in front of a `DirectoryStore`.
//!
//! Reads are served from memory for `ttl`, bounded at `capacity` entries per
//! read kind. A read with `no_cache` skips the cache and refreshes it with
//! what the backing store returned. Any write clears the whole cache.

use std::time::Duration;

use async_trait::async_trait;
use moka::sync::Cache;

use gatekeep_core::{RecordId, Role};
use gatekeep_directory::{
    DirectoryStore, RecruiterEntry, SearchFilter, StoreError, StudentEntry, StudentPage,
    StudentQuery, StudentRecord,
};

pub const DEFAULT_CAPACITY: u64 = 10_000;

pub struct CachedDirectoryStore<S> {
    inner: S,
    students: Cache<String, Option<StudentEntry>>,
    recruiters: Cache<String, Option<RecruiterEntry>>,
    by_role: Cache<String, Vec<StudentEntry>>,
    searches: Cache<String, StudentPage>,
}

fn bounded<V: Clone + Send + Sync + 'static>(ttl: Duration, capacity: u64) -> Cache<String, V> {
    Cache::builder()
        .max_capacity(capacity)
        .time_to_live(ttl)
        .build()
}

impl<S: DirectoryStore> CachedDirectoryStore<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self::with_capacity(inner, ttl, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(inner: S, ttl: Duration, capacity: u64) -> Self {
        Self {
            inner,
            students: bounded(ttl, capacity),
            recruiters: bounded(ttl, capacity),
            by_role: bounded(ttl, capacity),
            searches: bounded(ttl, capacity),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn clear(&self) {
        self.students.invalidate_all();
        self.recruiters.invalidate_all();
        self.by_role.invalidate_all();
        self.searches.invalidate_all();
    }

    /// Entries currently held across all read kinds, after pending
    /// evictions have run.
    pub fn cached_entries(&self) -> u64 {
        self.students.run_pending_tasks();
        self.recruiters.run_pending_tasks();
        self.by_role.run_pending_tasks();
        self.searches.run_pending_tasks();
        self.students.entry_count()
            + self.recruiters.entry_count()
            + self.by_role.entry_count()
            + self.searches.entry_count()
    }
}

fn search_key(query: &StudentQuery) -> String {
    let filter = match &query.filter {
        SearchFilter::All => "all".to_string(),
        SearchFilter::RollNumber(b) => format!("roll:{}-{}", b.lower, b.upper),
        SearchFilter::Name(fragment) => format!("name:{fragment}"),
    };
    match query.pagination {
        Some(p) => format!("{filter}|{}x{}", p.page, p.per_page),
        None => filter,
    }
}

#[async_trait]
impl<S: DirectoryStore> DirectoryStore for CachedDirectoryStore<S> {
    async fn find_student_by_email_aliases(
        &self,
        aliases: &[String],
        no_cache: bool,
    ) -> Result<Option<StudentEntry>, StoreError> {
        let key = format!("email:{}", aliases.join(","));
        if !no_cache {
            if let Some(hit) = self.students.get(&key) {
                return Ok(hit);
            }
        }
        let value = self.inner.find_student_by_email_aliases(aliases, no_cache).await?;
        self.students.insert(key, value.clone());
        Ok(value)
    }

    async fn find_recruiter_by_email_aliases(
        &self,
        aliases: &[String],
        no_cache: bool,
    ) -> Result<Option<RecruiterEntry>, StoreError> {
        let key = aliases.join(",");
        if !no_cache {
            if let Some(hit) = self.recruiters.get(&key) {
                return Ok(hit);
            }
        }
        let value = self.inner.find_recruiter_by_email_aliases(aliases, no_cache).await?;
        self.recruiters.insert(key, value.clone());
        Ok(value)
    }

    async fn find_student_by_id(
        &self,
        id: RecordId,
        no_cache: bool,
    ) -> Result<Option<StudentEntry>, StoreError> {
        let key = format!("id:{id}");
        if !no_cache {
            if let Some(hit) = self.students.get(&key) {
                return Ok(hit);
            }
        }
        let value = self.inner.find_student_by_id(id, no_cache).await?;
        self.students.insert(key, value.clone());
        Ok(value)
    }

    async fn find_students_by_role(
        &self,
        role: &Role,
        no_cache: bool,
    ) -> Result<Vec<StudentEntry>, StoreError> {
        let key = role.as_str().to_string();
        if !no_cache {
            if let Some(hit) = self.by_role.get(&key) {
                return Ok(hit);
            }
        }
        let value = self.inner.find_students_by_role(role, no_cache).await?;
        self.by_role.insert(key, value.clone());
        Ok(value)
    }

    async fn search_students(
        &self,
        query: &StudentQuery,
        no_cache: bool,
    ) -> Result<StudentPage, StoreError> {
        let key = search_key(query);
        if !no_cache {
            if let Some(hit) = self.searches.get(&key) {
                return Ok(hit);
            }
        }
        let value = self.inner.search_students(query, no_cache).await?;
        self.searches.insert(key, value.clone());
        Ok(value)
    }

    async fn persist_student(&self, record: StudentRecord) -> Result<(), StoreError> {
        let result = self.inner.persist_student(record).await;
        self.clear();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory_store::InMemoryDirectoryStore;
    use gatekeep_core::GroupId;
    use gatekeep_directory::Group;

    fn cached(ttl: Duration) -> (CachedDirectoryStore<InMemoryDirectoryStore>, RecordId) {
        let backing = InMemoryDirectoryStore::new();
        let group = Group::new(GroupId::new(), "students", [Role::STUDENT]);
        let mut student = StudentRecord::new(RecordId::new(), "asha@iitbhu.ac.in", "Asha");
        student.groups = vec![group.id];
        let id = student.id;
        backing.insert_group(group).unwrap();
        backing.insert_student(student).unwrap();
        (CachedDirectoryStore::new(backing, ttl), id)
    }

    async fn rename_behind_cache(store: &CachedDirectoryStore<InMemoryDirectoryStore>, id: RecordId, name: &str) {
        let mut record = store.inner().find_student_by_id(id, true).await.unwrap().unwrap().record;
        record.first_name = name.to_string();
        store.inner().insert_student(record).unwrap();
    }

    #[tokio::test]
    async fn cached_reads_until_ttl_or_no_cache() {
        let (store, id) = cached(Duration::from_millis(200));
        assert_eq!(store.find_student_by_id(id, false).await.unwrap().unwrap().record.first_name, "Asha");

        rename_behind_cache(&store, id, "Ashalata").await;
        assert_eq!(store.find_student_by_id(id, false).await.unwrap().unwrap().record.first_name, "Asha");
        assert_eq!(store.find_student_by_id(id, true).await.unwrap().unwrap().record.first_name, "Ashalata");

        rename_behind_cache(&store, id, "A.").await;
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(store.find_student_by_id(id, false).await.unwrap().unwrap().record.first_name, "A.");
    }

    #[tokio::test]
    async fn expired_searches_are_evicted() {
        let (store, _) = cached(Duration::from_millis(200));
        for i in 0..500 {
            let query = StudentQuery::parse(&format!("name{i}"), 0, 0).unwrap();
            store.search_students(&query, false).await.unwrap();
        }
        assert!(store.cached_entries() > 0);

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(store.cached_entries(), 0);
    }

    #[tokio::test]
    async fn distinct_searches_stay_within_capacity() {
        let backing = InMemoryDirectoryStore::new();
        let store = CachedDirectoryStore::with_capacity(backing, Duration::from_secs(60), 64);
        for i in 0..5_000 {
            let query = StudentQuery::parse(&format!("name{i}"), 0, 0).unwrap();
            store.search_students(&query, false).await.unwrap();
        }
        assert!(store.cached_entries() <= 64);
    }

    #[tokio::test]
    async fn writes_clear_the_cache() {
        let (store, id) = cached(Duration::from_secs(60));
        let aliases = vec!["asha@iitbhu.ac.in".to_string()];
        let before = store.find_student_by_email_aliases(&aliases, false).await.unwrap().unwrap();

        let mut record = before.record.clone();
        record.first_name = "Ashalata".into();
        store.persist_student(record).await.unwrap();

        let after = store.find_student_by_email_aliases(&aliases, false).await.unwrap().unwrap();
        assert_eq!(after.record.first_name, "Ashalata");
        assert_eq!(store.find_students_by_role(&Role::STUDENT, false).await.unwrap()[0].record.id, id);
    }
}
