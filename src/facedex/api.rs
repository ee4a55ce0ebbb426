//! # API Facade
//!
//! [`FacedexApi`] is the one object a process builds at startup and hands to its route
//! layer. It owns the document cache, the replace pipeline and the persistence queue,
//! and dispatches to the command layer.
//!
//! ## Role and Responsibilities
//!
//! - **Dispatches** to `commands/*` with the session's current source
//! - **Locks**: every document access goes through the cache lock
//! - **Persists**: successful mutations enqueue a snapshot before returning
//! - **Returns structured types**, never strings
//!
//! ## Sharing
//!
//! Every method takes `&self`, so one `Arc<FacedexApi<_>>` can serve all request threads.
//! Per-browser state lives in a [`Session`] the caller owns and passes in.
//!
//! ## Generic Over StorageBackend
//!
//! - Production: `FacedexApi<FsBackend>`
//! - Testing: `FacedexApi<InMemoryBackend>`

use crate::commands::browse::{self, CategoryPage, Collection, ImagePage};
use crate::commands::{self, LikeRequest, MutationResult};
use crate::config::FacedexConfig;
use crate::error::{FacedexError, Result};
use crate::index::ImageIndex;
use crate::model::{Action, Document, Session};
use crate::paths::normalize;
use crate::queue::PersistQueue;
use crate::store::cache::DocumentCache;
use crate::store::StorageBackend;
use crate::transform::ReplacePipeline;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

pub struct FacedexApi<B: StorageBackend> {
    backend: Arc<B>,
    pipeline: ReplacePipeline,
    sources: Vec<PathBuf>,
    per_page: usize,
    cache: DocumentCache,
    queue: PersistQueue,
}

impl<B: StorageBackend> FacedexApi<B> {
    /// Validates `config` and starts the persistence consumer.
    pub fn new(backend: B, config: &FacedexConfig) -> Result<Self> {
        config.validate()?;
        let backend = Arc::new(backend);
        let pipeline = config.pipeline();
        let queue = PersistQueue::start(Arc::clone(&backend), pipeline.clone())?;
        let sources: Vec<PathBuf> = config.sources.iter().map(|s| normalize(s)).collect();

        info!(
            sources = sources.len(),
            rules = pipeline.rules().len(),
            "facedex ready"
        );

        Ok(Self {
            backend,
            pipeline,
            sources,
            per_page: config.per_page,
            cache: DocumentCache::new(),
            queue,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    pub fn current_source(&self, session: &mut Session) -> usize {
        commands::sources::current_source(session, self.sources.len())
    }

    pub fn select_source(&self, session: &mut Session, index: usize) -> usize {
        commands::sources::select_source(session, index, self.sources.len())
    }

    /// Index of the session's current source. Empty if the source cannot be loaded.
    pub fn load_index(&self, session: &mut Session) -> ImageIndex {
        match self.current_path(session) {
            Some(source) => {
                commands::load::run(&self.cache, self.backend.as_ref(), &self.pipeline, source)
            }
            None => ImageIndex::default(),
        }
    }

    pub fn categories(&self, session: &mut Session, page: usize) -> CategoryPage {
        let index = self.load_index(session);
        browse::list_categories(&index, page, self.per_page)
    }

    pub fn images(
        &self,
        session: &mut Session,
        collection: Collection,
        page: usize,
        seed: Option<&str>,
    ) -> ImagePage {
        let index = self.load_index(session);
        browse::page_images(&index, collection, page, self.per_page, seed)
    }

    pub fn resolve_image_path(
        &self,
        session: &mut Session,
        category: &str,
        filename: &str,
    ) -> Option<PathBuf> {
        let index = self.load_index(session);
        commands::image::resolve_image_path(&index, category, filename)
    }

    pub fn like<S: AsRef<str>>(&self, session: &mut Session, paths: &[S]) -> Result<MutationResult> {
        self.set_liked(session, paths, Action::Like)
    }

    pub fn unlike<S: AsRef<str>>(
        &self,
        session: &mut Session,
        paths: &[S],
    ) -> Result<MutationResult> {
        self.set_liked(session, paths, Action::Unlike)
    }

    pub fn set_liked<S: AsRef<str>>(
        &self,
        session: &mut Session,
        paths: &[S],
        action: Action,
    ) -> Result<MutationResult> {
        let paths = paths.iter().map(|p| p.as_ref().to_string()).collect();
        let request = LikeRequest::new(paths, action).validated()?;
        self.apply(session, &request)
    }

    /// Decodes a JSON like/unlike body and applies it.
    pub fn handle_like_request(&self, session: &mut Session, body: &str) -> Result<MutationResult> {
        let request = LikeRequest::from_json(body)?;
        self.apply(session, &request)
    }

    /// Copy of the session's current document as browsed, with replace rules applied.
    pub fn document_snapshot(&self, session: &mut Session) -> Result<Document> {
        let source = self.current_path(session).ok_or(FacedexError::NoSources)?;
        self.cache
            .with_document(self.backend.as_ref(), &self.pipeline, source, |document| {
                document.clone()
            })
    }

    /// Writes accepted but not yet on disk.
    pub fn pending_writes(&self) -> usize {
        self.queue.pending()
    }

    /// Blocks until the write backlog is empty. The queue keeps accepting.
    pub fn flush(&self) {
        self.queue.wait_drained();
    }

    /// Stops accepting mutations and blocks until every accepted write has landed.
    pub fn shutdown(&self) {
        self.queue.shutdown();
    }

    fn current_path(&self, session: &mut Session) -> Option<&Path> {
        let current = self.current_source(session);
        self.sources.get(current).map(PathBuf::as_path)
    }

    fn apply(&self, session: &mut Session, request: &LikeRequest) -> Result<MutationResult> {
        let source = self.current_path(session).ok_or(FacedexError::NoSources)?;
        // reserved before mutating; shutdown waits for it
        let slot = self.queue.reserve()?;

        self.cache
            .with_document(self.backend.as_ref(), &self.pipeline, source, |document| {
                let result =
                    commands::liking::set_liked(document, &request.paths, request.action)?;
                if result.is_success() {
                    slot.send(source, document.clone())?;
                }
                debug!(
                    source = %source.display(),
                    action = %request.action,
                    found = result.found.len(),
                    not_found = result.not_found.len(),
                    "applied like request"
                );
                Ok(result)
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReplaceRule;
    use crate::store::memory::InMemoryBackend;
    use serde_json::json;

    fn config(sources: &[&str]) -> FacedexConfig {
        FacedexConfig {
            sources: sources.iter().map(PathBuf::from).collect(),
            per_page: 2,
            ..FacedexConfig::default()
        }
    }

    fn document() -> serde_json::Value {
        json!({
            "img": {
                "/data/people": {
                    "a.jpg": {"face_scores": [0.9], "like": false},
                    "b.jpg": {"face_scores": [0.8], "like": false},
                    "2019": {"c.jpg": {"face_scores": [0.7], "like": true}}
                }
            },
            "date_updated": "2020-01-01T00:00:00+00:00"
        })
    }

    fn api() -> FacedexApi<InMemoryBackend> {
        let backend = InMemoryBackend::new().with_document("faces.json", &document());
        FacedexApi::new(backend, &config(&["faces.json"])).unwrap()
    }

    #[test]
    fn rejects_configs_without_sources() {
        let result = FacedexApi::new(InMemoryBackend::new(), &config(&[]));
        assert!(matches!(result, Err(FacedexError::NoSources)));
    }

    #[test]
    fn like_is_visible_on_next_load() {
        let api = api();
        let mut session = Session::default();

        let result = api.like(&mut session, &["/data/people/a.jpg"]).unwrap();
        assert_eq!(result.http_status(), 200);

        let index = api.load_index(&mut session);
        let a = index.categories["people"]
            .iter()
            .find(|r| r.filename == "a.jpg")
            .unwrap();
        assert!(a.like);
    }

    #[test]
    fn successful_likes_are_persisted() {
        let api = api();
        let mut session = Session::default();
        api.like(&mut session, &["/data/people/b.jpg"]).unwrap();
        api.flush();

        let stored = api.backend().document(Path::new("faces.json")).unwrap();
        assert_eq!(stored["img"]["/data/people"]["b.jpg"]["like"], json!(true));
        assert_ne!(stored["date_updated"], json!("2020-01-01T00:00:00+00:00"));
    }

    #[test]
    fn not_found_mutations_do_not_write() {
        let api = api();
        let mut session = Session::default();
        let result = api.like(&mut session, &["/elsewhere/a.jpg"]).unwrap();
        assert_eq!(result.http_status(), 404);
        api.flush();
        assert_eq!(api.backend().write_count(), 0);
    }

    #[test]
    fn empty_path_lists_are_malformed() {
        let api = api();
        let mut session = Session::default();
        let err = api.like::<&str>(&mut session, &[]).unwrap_err();
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn handles_json_request_bodies() {
        let api = api();
        let mut session = Session::default();
        let result = api
            .handle_like_request(
                &mut session,
                r#"{"paths": ["/data/people/2019/c.jpg"], "action": "unlike"}"#,
            )
            .unwrap();
        assert_eq!(result.action, Some(Action::Unlike));

        let page = api.images(&mut session, Collection::Favorites, 1, Some("1"));
        assert!(page.images.is_empty());
    }

    #[test]
    fn writes_are_reversed_through_the_pipeline() {
        let backend = InMemoryBackend::new().with_document(
            "faces.json",
            &json!({"img": {"/mnt/people": {"a.jpg": {"face_scores": [0.9]}}}}),
        );
        let mut cfg = config(&["faces.json"]);
        cfg.replace = vec![ReplaceRule::new("/mnt", "/home/me")];
        let api = FacedexApi::new(backend, &cfg).unwrap();
        let mut session = Session::default();

        assert_eq!(
            api.resolve_image_path(&mut session, "people", "a.jpg"),
            Some(PathBuf::from("/home/me/people/a.jpg"))
        );
        api.like(&mut session, &["/home/me/people/a.jpg"]).unwrap();
        api.shutdown();

        let stored = api.backend().document(Path::new("faces.json")).unwrap();
        assert_eq!(stored["img"]["/mnt/people"]["a.jpg"]["like"], json!(true));
    }

    #[test]
    fn categories_and_pages_use_per_page() {
        let api = api();
        let mut session = Session::default();

        let categories = api.categories(&mut session, 1);
        let names: Vec<&str> = categories.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["2019", "people"]);

        let page = api.images(&mut session, Collection::from_name("people"), 1, None);
        assert_eq!(page.images.len(), 2);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn switching_sources_uses_separate_documents() {
        let backend = InMemoryBackend::new()
            .with_document("one.json", &document())
            .with_document(
                "two.json",
                &json!({"img": {"/data/pets": {"cat.jpg": {"face_scores": [0.2]}}}}),
            );
        let api = FacedexApi::new(backend, &config(&["one.json", "two.json"])).unwrap();
        let mut session = Session::default();

        assert_eq!(api.load_index(&mut session).sorted_categories(), vec!["2019", "people"]);
        assert_eq!(api.select_source(&mut session, 1), 1);
        assert_eq!(api.load_index(&mut session).sorted_categories(), vec!["pets"]);
        assert_eq!(api.select_source(&mut session, 7), 0);
    }

    #[test]
    fn unavailable_sources_load_empty_and_fail_mutations() {
        let api = FacedexApi::new(InMemoryBackend::new(), &config(&["missing.json"])).unwrap();
        let mut session = Session::default();

        assert!(api.load_index(&mut session).is_empty());
        let err = api.like(&mut session, &["/data/a.jpg"]).unwrap_err();
        assert!(matches!(err, FacedexError::SourceUnavailable { .. }));
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn mutations_after_shutdown_are_refused() {
        let api = api();
        let mut session = Session::default();
        api.load_index(&mut session);
        api.shutdown();
        let err = api.like(&mut session, &["/data/people/a.jpg"]).unwrap_err();
        assert!(matches!(err, FacedexError::ShuttingDown));
        assert_eq!(api.pending_writes(), 0);

        // the refused like never reached the cached document
        let cached = api.document_snapshot(&mut session).unwrap();
        assert_eq!(cached, document());
    }
}
