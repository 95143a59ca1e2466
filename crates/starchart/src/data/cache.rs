//! Single-flight entity cache.
//!
//! Every lookup is keyed structurally. The first request for a key inserts
//! a shared pending future synchronously, before anything is awaited, so any
//! later request for an equal key (even in the same turn) awaits that same
//! future instead of issuing another fetch. Settled results, failures
//! included, stay cached until `invalidate` or `reset`.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::rc::Rc;

use async_trait::async_trait;
use futures::future::{try_join_all, LocalBoxFuture, Shared};
use futures::FutureExt;

use crate::assets::files::GameFileList;
use crate::data::object::{ChangeData, ObjectData, RecordData};
use crate::data::reference::{ReferenceIndex, ReferenceSource};
use crate::data::scheme::{CategoryTable, ParsedObject, System};
use crate::error::DataError;

/// Transport for the static data tree.
///
/// Paths are relative to the data root (`data/ship/data/Argosy`). A missing
/// document resolves to `Ok(None)`; transport failures are errors.
#[async_trait(?Send)]
pub trait EntitySource {
    async fn fetch(&self, path: &str) -> Result<Option<String>, DataError>;
}

/// A pending or settled cache entry. Cloning it is cheap and every clone
/// resolves to the same result.
pub type Pending<V> = Shared<LocalBoxFuture<'static, Result<Rc<V>, DataError>>>;

/// Keyed store of shared lookups.
pub struct EntityCache<K, V> {
    name: &'static str,
    entries: RefCell<HashMap<K, Pending<V>>>,
}

impl<K, V> EntityCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: 'static,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: RefCell::new(HashMap::new()),
        }
    }

    /// Return the entry for `key`, creating it with `fetch` on a miss.
    /// `fetch` runs at most once per key until the entry is invalidated.
    pub fn get_or_fetch<F, Fut>(&self, key: &K, fetch: F) -> Pending<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, DataError>> + 'static,
    {
        let existing = self.entries.borrow().get(key).cloned();
        if let Some(pending) = existing {
            log::debug!("{} cache hit for {:?}", self.name, key);
            return pending;
        }
        log::debug!("{} cache miss for {:?}", self.name, key);
        let pending = fetch().map(|result| result.map(Rc::new)).boxed_local().shared();
        self.entries.borrow_mut().insert(key.clone(), pending.clone());
        pending
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.borrow().contains_key(key)
    }

    /// Drop the entry for `key`. Waiters holding it still get its result.
    pub fn invalidate(&self, key: &K) -> bool {
        self.entries.borrow_mut().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

struct CacheInner {
    source: Rc<dyn EntitySource>,
    records: EntityCache<ReferenceSource, ObjectData>,
    parsed: EntityCache<ReferenceSource, ParsedObject>,
    changelogs: EntityCache<ReferenceSource, Vec<ChangeData>>,
    /// Keyed by (category, include removed records).
    categories: EntityCache<(String, bool), CategoryTable>,
    indices: EntityCache<String, ReferenceIndex>,
    references: EntityCache<String, ReferenceIndex>,
    files: EntityCache<(), GameFileList>,
}

/// Session-wide cache context. Clones share the same entries.
#[derive(Clone)]
pub struct DataCache {
    inner: Rc<CacheInner>,
}

impl DataCache {
    pub fn new(source: Rc<dyn EntitySource>) -> Self {
        Self {
            inner: Rc::new(CacheInner {
                source,
                records: EntityCache::new("record"),
                parsed: EntityCache::new("parsed"),
                changelogs: EntityCache::new("changelog"),
                categories: EntityCache::new("category"),
                indices: EntityCache::new("index"),
                references: EntityCache::new("references"),
                files: EntityCache::new("files"),
            }),
        }
    }

    /// Raw record of one entity (`data/<category>/data/<name>`).
    pub fn record(&self, key: &ReferenceSource) -> Pending<ObjectData> {
        let source = Rc::clone(&self.inner.source);
        let key_owned = key.clone();
        self.inner.records.get_or_fetch(key, move || async move {
            let name = key_owned
                .name()
                .ok_or_else(|| DataError::NotFound(key_owned.clone()))?;
            let path = format!("data/{}/data/{}", key_owned.category, name);
            let text = source
                .fetch(&path)
                .await?
                .ok_or_else(|| DataError::NotFound(key_owned.clone()))?;
            ObjectData::from_json(key_owned.clone(), &text).map_err(|err| DataError::Malformed {
                reference: key_owned,
                reason: err.to_string(),
            })
        })
    }

    /// Parsed object of one entity, built from its raw record.
    pub fn parsed(&self, key: &ReferenceSource) -> Pending<ParsedObject> {
        self.inner.parsed.get_or_fetch(key, || {
            let record = self.record(key);
            async move {
                let data = record.await?;
                Ok(ParsedObject::parse(&data))
            }
        })
    }

    /// Parsed system; fails with `WrongKind` for any other category.
    pub async fn system(&self, name: &str) -> Result<Rc<System>, DataError> {
        let key = ReferenceSource::new("system", name);
        let parsed = self.parsed(&key).await?;
        parsed.to_system().ok_or(DataError::WrongKind {
            reference: key,
            expected: "system",
        })
    }

    /// Change history of one entity (`data/<category>/changelog/<name>`).
    pub fn changelog(&self, key: &ReferenceSource) -> Pending<Vec<ChangeData>> {
        let source = Rc::clone(&self.inner.source);
        let key_owned = key.clone();
        self.inner.changelogs.get_or_fetch(key, move || async move {
            let name = key_owned
                .name()
                .ok_or_else(|| DataError::NotFound(key_owned.clone()))?;
            let path = format!("data/{}/changelog/{}", key_owned.category, name);
            let text = source
                .fetch(&path)
                .await?
                .ok_or_else(|| DataError::NotFound(key_owned.clone()))?;
            Ok(serde_json::from_str(&text)?)
        })
    }

    /// Every non-removed object of `category`, parsed, keyed by name.
    pub fn all(&self, category: &str) -> Pending<CategoryTable> {
        self.all_with(category, false)
    }

    /// Like `all`, optionally keeping records marked as removed.
    pub fn all_with(&self, category: &str, include_removed: bool) -> Pending<CategoryTable> {
        let source = Rc::clone(&self.inner.source);
        let key = (category.to_string(), include_removed);
        let category = category.to_string();
        self.inner.categories.get_or_fetch(&key, move || async move {
            let path = format!("data/{category}/all");
            let text = source
                .fetch(&path)
                .await?
                .ok_or_else(|| DataError::CategoryNotFound(category.clone()))?;
            let records: BTreeMap<String, RecordData> = serde_json::from_str(&text)?;
            let mut table = CategoryTable::new();
            for (name, record) in records {
                let data = ObjectData::new(ReferenceSource::new(category.clone(), name), record);
                if data.is_removed() && !include_removed {
                    continue;
                }
                let parsed = ParsedObject::parse(&data);
                table.insert(parsed.name().to_string(), Rc::new(parsed));
            }
            log::info!("loaded {} {category} objects", table.len());
            Ok(table)
        })
    }

    /// Name index of `category` (`index/entries/<category>`).
    pub fn index(&self, category: &str) -> Pending<ReferenceIndex> {
        let path = format!("index/entries/{category}");
        self.fetch_index(&self.inner.indices, category, path)
    }

    /// Reverse references of `category` (`index/references/<category>`):
    /// entity name → entities that mention it.
    pub fn references(&self, category: &str) -> Pending<ReferenceIndex> {
        let path = format!("index/references/{category}");
        self.fetch_index(&self.inner.references, category, path)
    }

    fn fetch_index(
        &self,
        cache: &EntityCache<String, ReferenceIndex>,
        category: &str,
        path: String,
    ) -> Pending<ReferenceIndex> {
        let source = Rc::clone(&self.inner.source);
        let key = category.to_string();
        let category = key.clone();
        cache.get_or_fetch(&key, move || async move {
            let text = source
                .fetch(&path)
                .await?
                .ok_or(DataError::CategoryNotFound(category))?;
            Ok(ReferenceIndex::from_json(&text)?)
        })
    }

    /// Display name registered for `key` in the display-name index.
    pub async fn display_name(&self, key: &ReferenceSource) -> Result<String, DataError> {
        let index = self.index("display name").await?;
        index
            .key_of(key)
            .map(str::to_string)
            .ok_or_else(|| DataError::NotFound(key.clone()))
    }

    /// Parsed objects of category `kind` that reference `target`.
    /// All lookups run concurrently; any failure fails the whole call.
    pub async fn reference_objects(
        &self,
        target: &ReferenceSource,
        kind: &str,
    ) -> Result<Vec<Rc<ParsedObject>>, DataError> {
        let name = target
            .name()
            .ok_or_else(|| DataError::NotFound(target.clone()))?;
        let references = self.references(&target.category).await?;
        let lookups = references
            .get(name)
            .iter()
            .filter(|source| source.category == kind)
            .map(|source| self.parsed(source));
        try_join_all(lookups).await
    }

    /// The session's asset file list (`data/files.json`).
    pub fn file_list(&self) -> Pending<GameFileList> {
        let source = Rc::clone(&self.inner.source);
        self.inner.files.get_or_fetch(&(), move || async move {
            let path = "data/files.json";
            let text = source.fetch(path).await?.ok_or_else(|| DataError::Fetch {
                path: path.to_string(),
                reason: "missing".to_string(),
            })?;
            Ok(GameFileList::from_json(&text)?)
        })
    }

    /// Forget every entry derived from `key` so the next lookup refetches.
    pub fn invalidate(&self, key: &ReferenceSource) {
        self.inner.records.invalidate(key);
        self.inner.parsed.invalidate(key);
        self.inner.changelogs.invalidate(key);
    }

    /// Forget the whole-category tables and indices of `category`.
    pub fn invalidate_category(&self, category: &str) {
        self.inner.categories.invalidate(&(category.to_string(), false));
        self.inner.categories.invalidate(&(category.to_string(), true));
        self.inner.indices.invalidate(&category.to_string());
        self.inner.references.invalidate(&category.to_string());
    }

    /// Drop every entry.
    pub fn reset(&self) {
        log::info!("resetting data cache");
        self.inner.records.clear();
        self.inner.parsed.clear();
        self.inner.changelogs.clear();
        self.inner.categories.clear();
        self.inner.indices.clear();
        self.inner.references.clear();
        self.inner.files.clear();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::cell::Cell;

    /// In-memory data tree that counts fetches per path.
    #[derive(Default)]
    pub(crate) struct MemorySource {
        pub docs: HashMap<String, String>,
        pub fetches: RefCell<HashMap<String, usize>>,
        pub fail: Cell<bool>,
    }

    impl MemorySource {
        pub fn with(docs: &[(&str, &str)]) -> Self {
            Self {
                docs: docs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
                ..Self::default()
            }
        }

        pub fn count(&self, path: &str) -> usize {
            self.fetches.borrow().get(path).copied().unwrap_or(0)
        }
    }

    #[async_trait(?Send)]
    impl EntitySource for MemorySource {
        async fn fetch(&self, path: &str) -> Result<Option<String>, DataError> {
            *self.fetches.borrow_mut().entry(path.to_string()).or_default() += 1;
            if self.fail.get() {
                return Err(DataError::Fetch {
                    path: path.to_string(),
                    reason: "offline".to_string(),
                });
            }
            Ok(self.docs.get(path).cloned())
        }
    }

    const EARTH: &str = r#"{ "filename": "map planets.txt", "line": 3,
        "data": { "name": "Earth", "description": "Home" } }"#;

    #[test]
    fn concurrent_equal_keys_fetch_once() {
        let source = Rc::new(MemorySource::with(&[("data/planet/data/Earth", EARTH)]));
        let cache = DataCache::new(source.clone());

        // Structurally equal, separately allocated keys.
        let a = cache.record(&ReferenceSource::new("planet", "Earth"));
        let b = cache.record(&ReferenceSource::new(String::from("planet"), String::from("Earth")));
        let (a, b) = block_on(futures::future::join(a, b));
        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(a.display_name, "Earth");
        assert_eq!(source.count("data/planet/data/Earth"), 1);
    }

    #[test]
    fn missing_entity_fails_once_and_stays_cached() {
        let source = Rc::new(MemorySource::default());
        let cache = DataCache::new(source.clone());
        let key = ReferenceSource::new("planet", "Nowhere");

        let first = block_on(cache.record(&key));
        assert_eq!(first.unwrap_err(), DataError::NotFound(key.clone()));
        let second = block_on(cache.record(&key));
        assert_eq!(second.unwrap_err(), DataError::NotFound(key.clone()));
        assert_eq!(source.count("data/planet/data/Nowhere"), 1);

        cache.invalidate(&key);
        let _ = block_on(cache.record(&key));
        assert_eq!(source.count("data/planet/data/Nowhere"), 2);
    }

    #[test]
    fn transport_failure_reaches_every_waiter() {
        let source = Rc::new(MemorySource::default());
        source.fail.set(true);
        let cache = DataCache::new(source.clone());
        let key = ReferenceSource::new("ship", "Argosy");
        let (a, b) = block_on(futures::future::join(cache.parsed(&key), cache.parsed(&key)));
        assert!(matches!(a, Err(DataError::Fetch { .. })));
        assert_eq!(a.unwrap_err(), b.unwrap_err());
        assert_eq!(source.count("data/ship/data/Argosy"), 1);
    }

    #[test]
    fn parsed_reuses_record_entry() {
        let source = Rc::new(MemorySource::with(&[("data/planet/data/Earth", EARTH)]));
        let cache = DataCache::new(source.clone());
        let key = ReferenceSource::new("planet", "Earth");
        let raw = block_on(cache.record(&key)).unwrap();
        let parsed = block_on(cache.parsed(&key)).unwrap();
        assert_eq!(parsed.name(), "Earth");
        assert_eq!(raw.id, key);
        assert_eq!(source.count("data/planet/data/Earth"), 1);
    }

    #[test]
    fn category_skips_removed_records() {
        let all = r#"{
            "Sol": { "data": { "name": "Sol", "pos": ["0", "0"] } },
            "Old": { "data": { "name": "Old" }, "removed": { "hash": "abc" } }
        }"#;
        let source = Rc::new(MemorySource::with(&[("data/system/all", all)]));
        let cache = DataCache::new(source.clone());

        let table = block_on(cache.all("system")).unwrap();
        assert_eq!(table.keys().collect::<Vec<_>>(), vec!["Sol"]);
        let with_removed = block_on(cache.all_with("system", true)).unwrap();
        assert_eq!(with_removed.len(), 2);

        let again = block_on(cache.all("system")).unwrap();
        assert!(Rc::ptr_eq(&table, &again));
        assert_eq!(source.count("data/system/all"), 2);
    }

    #[test]
    fn unknown_category_is_reported() {
        let cache = DataCache::new(Rc::new(MemorySource::default()));
        let err = block_on(cache.all("nebula")).unwrap_err();
        assert_eq!(err, DataError::CategoryNotFound("nebula".into()));
    }

    #[test]
    fn reference_objects_filters_by_kind() {
        let refs = r#"{ "Earth": [
            { "type": "system", "name": "Sol" },
            { "type": "mission", "name": "Intro" } ] }"#;
        let sol = r#"{ "data": { "name": "Sol" } }"#;
        let source = Rc::new(MemorySource::with(&[
            ("index/references/planet", refs),
            ("data/system/data/Sol", sol),
        ]));
        let cache = DataCache::new(source.clone());
        let found =
            block_on(cache.reference_objects(&ReferenceSource::new("planet", "Earth"), "system")).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].as_system().is_some());
        assert_eq!(source.count("data/mission/data/Intro"), 0);
    }

    #[test]
    fn display_name_and_file_list() {
        let names = r#"{ "Terra": [{ "type": "planet", "name": "Earth" }] }"#;
        let files = r#"["images/planet/earth.png"]"#;
        let source = Rc::new(MemorySource::with(&[
            ("index/entries/display name", names),
            ("data/files.json", files),
        ]));
        let cache = DataCache::new(source.clone());
        let name = block_on(cache.display_name(&ReferenceSource::new("planet", "Earth"))).unwrap();
        assert_eq!(name, "Terra");

        let list = block_on(cache.file_list()).unwrap();
        let again = block_on(cache.file_list()).unwrap();
        assert!(Rc::ptr_eq(&list, &again));
        assert!(list.frames("planet/earth").is_some());
        assert_eq!(source.count("data/files.json"), 1);
    }

    #[test]
    fn changelog_is_fetched_once() {
        let log = r#"[{ "diff": { "added": true, "diff": "+ link Vega" },
                        "commit": { "hash": "123", "message": "Add link" } }]"#;
        let source = Rc::new(MemorySource::with(&[("data/system/changelog/Sol", log)]));
        let cache = DataCache::new(source.clone());

        let a = cache.changelog(&ReferenceSource::new("system", "Sol"));
        let b = cache.changelog(&ReferenceSource::new(String::from("system"), String::from("Sol")));
        let (a, b) = block_on(futures::future::join(a, b));
        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].commit.hash, "123");
        assert_eq!(source.count("data/system/changelog/Sol"), 1);

        let missing = ReferenceSource::new("system", "Vega");
        assert_eq!(block_on(cache.changelog(&missing)).unwrap_err(), DataError::NotFound(missing));
    }

    #[test]
    fn invalidate_category_refetches_tables_only() {
        let all = r#"{ "Sol": { "data": { "name": "Sol" } } }"#;
        let sol = r#"{ "data": { "name": "Sol" } }"#;
        let source = Rc::new(MemorySource::with(&[("data/system/all", all), ("data/system/data/Sol", sol)]));
        let cache = DataCache::new(source.clone());
        let key = ReferenceSource::new("system", "Sol");

        let table = block_on(cache.all("system")).unwrap();
        block_on(cache.record(&key)).unwrap();
        cache.invalidate_category("system");

        let again = block_on(cache.all("system")).unwrap();
        assert!(!Rc::ptr_eq(&table, &again));
        assert_eq!(source.count("data/system/all"), 2);
        block_on(cache.record(&key)).unwrap();
        assert_eq!(source.count("data/system/data/Sol"), 1);
    }

    #[test]
    fn system_rejects_other_kinds() {
        let source = Rc::new(MemorySource::with(&[("data/system/data/Sol", r#"{ "data": { "name": "Sol" } }"#)]));
        let cache = DataCache::new(source);
        assert!(block_on(cache.system("Sol")).is_ok());
        cache.reset();
        assert!(block_on(cache.system("Vega")).is_err());
    }
}
