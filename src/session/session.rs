use tokio::{
    sync::{mpsc, oneshot, watch},
    time::{sleep_until, Instant},
};
use tracing::{error, info, instrument};

use crate::{
    catalog::Catalog,
    documents::{ExportFile, ImportFile},
    progress::{
        Applied, Notification, Notifications, ProgressStore, ReplaceSource, ResetConfirmation,
        Toggled,
    },
    view::{self, CategoryFilter, FilterCriteria, Stats, StatusFilter, View},
    Status,
};

use super::{resolve, Clock, Debouncer, KeyChord, ShortcutAction, TokioClock, SEARCH_DEBOUNCE};

/// User interactions delivered to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// Full page markup for the current state.
    Page,
    Search(String),
    Filter {
        category: Option<String>,
        status: Option<StatusFilter>,
    },
    Toggle(u64),
    Reset {
        confirmed: bool,
    },
    Import(Vec<u8>),
    Export,
    Key(KeyChord),
}

impl UiEvent {
    fn name(&self) -> &'static str {
        match self {
            UiEvent::Page => "page",
            UiEvent::Search(_) => "search",
            UiEvent::Filter { .. } => "filter",
            UiEvent::Toggle(_) => "toggle",
            UiEvent::Reset { .. } => "reset",
            UiEvent::Import(_) => "import",
            UiEvent::Export => "export",
            UiEvent::Key(_) => "key",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Page(String),
    /// The search is applied once typing pauses.
    Scheduled,
    Rendered(View),
    Toggled {
        id: u64,
        caught: bool,
        celebrate: bool,
        stats: Stats,
    },
    Reset {
        message: String,
    },
    Imported {
        count: usize,
    },
    Exported(ExportFile),
    Shortcut {
        action: ShortcutAction,
        prompt: Option<String>,
    },
    Ignored,
    Rejected(Status),
}

pub enum Command {
    Event(UiEvent, oneshot::Sender<Reply>),
    /// Stops the session after pending writes completed.
    Shutdown(oneshot::Sender<()>),
}

/// Event wiring: owns the state of one open page and re-renders after every
/// change.
pub struct Session<C: Clock = TokioClock> {
    catalog: Catalog,
    catalog_error: Option<String>,
    store: ProgressStore,
    criteria: FilterCriteria,
    search: Debouncer<String, C>,
    views: watch::Sender<View>,
}

impl<C: Clock> Session<C> {
    pub fn new(catalog: Result<Catalog, Status>, store: ProgressStore, clock: C) -> Self {
        let (catalog, catalog_error) = match catalog {
            Ok(catalog) => (catalog, None),
            Err(status) => {
                error!("Failed to load catalog: {status}");
                (Catalog::default(), Some(status.to_string()))
            }
        };

        let mut session = Session {
            catalog,
            catalog_error,
            store,
            criteria: FilterCriteria::default(),
            search: Debouncer::new(SEARCH_DEBOUNCE, clock),
            views: watch::channel(View::default()).0,
        };
        session.publish(None);
        session
    }

    pub fn subscribe(&self) -> watch::Receiver<View> {
        self.views.subscribe()
    }

    pub fn view(&self) -> View {
        self.views.borrow().clone()
    }

    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    #[instrument(name = "session::handle", level = "info", skip_all, fields(event = event.name()))]
    pub fn handle(&mut self, event: UiEvent) -> Reply {
        match event {
            UiEvent::Page => {
                let categories = self
                    .catalog
                    .categories()
                    .into_iter()
                    .map(str::to_owned)
                    .collect::<Vec<_>>();
                Reply::Page(view::page(
                    &self.view(),
                    &categories,
                    &self.criteria,
                    self.store.mode(),
                ))
            }
            UiEvent::Search(query) => {
                self.search.schedule(query);
                Reply::Scheduled
            }
            UiEvent::Filter { category, status } => {
                if let Some(category) = category {
                    self.criteria.category = CategoryFilter::from_value(&category);
                }
                if let Some(status) = status {
                    self.criteria.status = status;
                }
                self.publish(None);
                Reply::Rendered(self.view())
            }
            UiEvent::Toggle(id) => {
                let toggled = self.store.toggle(id);
                let celebrate = toggled == Toggled::Caught;
                self.publish(celebrate.then_some(id));
                Reply::Toggled {
                    id,
                    caught: celebrate,
                    celebrate,
                    stats: self.view().stats,
                }
            }
            UiEvent::Reset { confirmed } => match ResetConfirmation::from_user(confirmed) {
                Some(confirmation) => {
                    self.store.clear(confirmation);
                    self.publish(None);
                    Reply::Reset {
                        message: view::reset_done_message().to_owned(),
                    }
                }
                None => Reply::Rejected(Status::invalid_argument(
                    "Resetting the progress requires confirmation",
                )),
            },
            UiEvent::Import(bytes) => match ImportFile::parse(&bytes) {
                Ok(file) => {
                    self.store
                        .replace(file.pokemon_ids, ReplaceSource::Import);
                    self.publish(None);
                    Reply::Imported {
                        count: self.store.len(),
                    }
                }
                Err(status) => {
                    error!("Rejected import: {status}");
                    Reply::Rejected(status)
                }
            },
            UiEvent::Export => {
                let stats = self.view().stats;
                Reply::Exported(ExportFile::new(
                    self.store.snapshot(),
                    stats.caught,
                    stats.total,
                    stats.percentage,
                ))
            }
            UiEvent::Key(chord) => match resolve(&chord) {
                Some(action) => Reply::Shortcut {
                    action,
                    prompt: (action == ShortcutAction::Reset)
                        .then(|| view::reset_prompt(self.store.mode())),
                },
                None => Reply::Ignored,
            },
        }
    }

    #[instrument(name = "session::sync", level = "info", skip_all)]
    pub fn on_notification(&mut self, notification: Notification) {
        if self.store.apply(notification) != Applied::Unchanged {
            self.publish(None);
        }
    }

    /// Applies the pending search if typing paused long enough.
    pub fn on_search_timer(&mut self) -> bool {
        match self.search.poll() {
            Some(query) => {
                self.criteria.query = query;
                self.publish(None);
                true
            }
            None => false,
        }
    }

    pub fn search_deadline(&self) -> Option<Instant> {
        self.search.deadline()
    }

    pub async fn shutdown(&mut self) {
        self.search.cancel();
        self.store.flush().await;
        info!("session stopped");
    }

    fn publish(&mut self, celebrate: Option<u64>) {
        let mut view = match &self.catalog_error {
            Some(error) => View::failed(error),
            None => View::build(&self.catalog, self.store.snapshot(), &self.criteria),
        };
        view.celebrate = celebrate;
        self.views.send_replace(view);
    }
}

impl<C: Clock + Send + 'static> Session<C> {
    /// Processes commands, backend notifications and the search timer one at
    /// a time until shut down.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>, mut notifications: Notifications) {
        let mut subscribed = true;
        loop {
            let deadline = self.search_deadline();
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Event(event, reply)) => {
                        let _ = reply.send(self.handle(event));
                    }
                    Some(Command::Shutdown(done)) => {
                        self.shutdown().await;
                        let _ = done.send(());
                        return;
                    }
                    None => break,
                },
                notification = notifications.recv(), if subscribed => match notification {
                    Some(notification) => self.on_notification(notification),
                    None => subscribed = false,
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.on_search_timer();
                }
            }
        }
        self.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        documents::Pokemon,
        progress::{
            LocalBackend, LocalStorage, MemoryDocument, RemoteBackend, PROGRESS_KEY,
        },
        session::{debounce::tests::ManualClock, start},
    };
    use std::{collections::BTreeSet, sync::Arc, time::Duration};

    fn catalog() -> Catalog {
        Catalog::new(vec![
            Pokemon {
                id: 1,
                number: 1,
                name: "Bulbizarre".to_owned(),
                name_en: "Bulbasaur".to_owned(),
                types: vec!["plante".to_owned(), "poison".to_owned()],
                location: "Bourg Palette".to_owned(),
            },
            Pokemon {
                id: 2,
                number: 2,
                name: "Herbizarre".to_owned(),
                name_en: "Ivysaur".to_owned(),
                types: vec!["plante".to_owned(), "poison".to_owned()],
                location: "Évolution".to_owned(),
            },
        ])
    }

    fn storage(dir: &tempfile::TempDir) -> LocalStorage {
        LocalStorage::open(dir.path().join("local_storage.json")).unwrap()
    }

    fn local_session(dir: &tempfile::TempDir, clock: ManualClock) -> Session<ManualClock> {
        let store = ProgressStore::new(Arc::new(LocalBackend::new(storage(dir))), 2);
        Session::new(Ok(catalog()), store, clock)
    }

    #[test]
    fn toggle_twice_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = local_session(&dir, ManualClock::new());

        match session.handle(UiEvent::Toggle(1)) {
            Reply::Toggled {
                id,
                caught,
                celebrate,
                stats,
            } => {
                assert_eq!(id, 1);
                assert!(caught && celebrate);
                assert_eq!(stats.percentage, 50);
            }
            reply => panic!("unexpected reply {reply:?}"),
        }
        assert_eq!(session.store().snapshot(), &BTreeSet::from([1]));
        assert_eq!(session.view().celebrate, Some(1));

        match session.handle(UiEvent::Toggle(1)) {
            Reply::Toggled {
                caught,
                celebrate,
                stats,
                ..
            } => {
                assert!(!caught && !celebrate);
                assert_eq!(stats.percentage, 0);
            }
            reply => panic!("unexpected reply {reply:?}"),
        }
        assert!(session.store().is_empty());
        assert_eq!(session.view().celebrate, None);
    }

    #[test]
    fn search_waits_for_typing_pause() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::new();
        let mut session = local_session(&dir, clock.clone());

        assert_eq!(session.handle(UiEvent::Search("h".to_owned())), Reply::Scheduled);
        clock.advance(Duration::from_millis(150));
        assert_eq!(
            session.handle(UiEvent::Search("herb".to_owned())),
            Reply::Scheduled
        );
        clock.advance(Duration::from_millis(150));
        assert!(!session.on_search_timer());
        assert_eq!(session.view().shown, 2);

        clock.advance(Duration::from_millis(150));
        assert!(session.on_search_timer());
        assert_eq!(session.criteria().query, "herb");
        assert_eq!(session.view().shown, 1);
        assert!(session.view().grid.contains(r#"data-id="2""#));
    }

    #[test]
    fn filters_apply_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = local_session(&dir, ManualClock::new());
        session.handle(UiEvent::Toggle(2));

        let reply = session.handle(UiEvent::Filter {
            category: None,
            status: Some(StatusFilter::Uncaught),
        });
        match reply {
            Reply::Rendered(view) => {
                assert_eq!(view.shown, 1);
                assert!(view.grid.contains(r#"data-id="1""#));
            }
            reply => panic!("unexpected reply {reply:?}"),
        }

        let reply = session.handle(UiEvent::Filter {
            category: Some("feu".to_owned()),
            status: None,
        });
        match reply {
            Reply::Rendered(view) => {
                assert_eq!(view.shown, 0);
                assert!(view.grid.contains("empty-state"));
            }
            reply => panic!("unexpected reply {reply:?}"),
        }
    }

    #[test]
    fn reset_needs_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = local_session(&dir, ManualClock::new());
        session.handle(UiEvent::Toggle(1));

        let reply = session.handle(UiEvent::Reset { confirmed: false });
        assert!(matches!(reply, Reply::Rejected(status) if status.is_invalid_argument()));
        assert!(session.store().is_caught(1));

        let reply = session.handle(UiEvent::Reset { confirmed: true });
        assert!(matches!(reply, Reply::Reset { .. }));
        assert!(session.store().is_empty());
        assert_eq!(session.view().stats.caught, 0);
    }

    #[test]
    fn import_replaces_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = local_session(&dir, ManualClock::new());
        session.handle(UiEvent::Toggle(2));

        let reply = session.handle(UiEvent::Import(br#"{"pokemonIds": [1, 2, 3]}"#.to_vec()));

        assert_eq!(reply, Reply::Imported { count: 3 });
        assert_eq!(session.store().snapshot(), &BTreeSet::from([1, 2, 3]));
        assert_eq!(
            storage(&dir).get(PROGRESS_KEY).unwrap().as_deref(),
            Some("[1,2,3]")
        );
        assert_eq!(session.view().stats.caught, 2);
    }

    #[test]
    fn invalid_import_leaves_state_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = local_session(&dir, ManualClock::new());
        session.handle(UiEvent::Toggle(2));

        let reply = session.handle(UiEvent::Import(br#"{"pokemon": [1]}"#.to_vec()));

        assert!(matches!(reply, Reply::Rejected(status) if status.is_invalid_argument()));
        assert_eq!(session.store().snapshot(), &BTreeSet::from([2]));
    }

    #[test]
    fn export_round_trips_through_import() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = local_session(&dir, ManualClock::new());
        session.handle(UiEvent::Import(br#"{"pokemonIds": [2, 77]}"#.to_vec()));

        let Reply::Exported(export) = session.handle(UiEvent::Export) else {
            panic!("expected export");
        };
        assert_eq!(export.pokemon_ids, vec![2, 77]);
        assert_eq!((export.caught, export.total, export.percentage), (1, 2, 50));

        session.handle(UiEvent::Reset { confirmed: true });
        session.handle(UiEvent::Import(serde_json::to_vec(&export).unwrap()));
        assert_eq!(session.store().snapshot(), &BTreeSet::from([2, 77]));
    }

    #[test]
    fn reset_shortcut_carries_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = local_session(&dir, ManualClock::new());

        let reply = session.handle(UiEvent::Key(KeyChord {
            key: "r".to_owned(),
            ctrl: true,
            shift: true,
            ..Default::default()
        }));
        match reply {
            Reply::Shortcut { action, prompt } => {
                assert_eq!(action, ShortcutAction::Reset);
                assert!(prompt.unwrap().contains("this device"));
            }
            reply => panic!("unexpected reply {reply:?}"),
        }

        let reply = session.handle(UiEvent::Key(KeyChord {
            key: "a".to_owned(),
            ctrl: true,
            ..Default::default()
        }));
        assert_eq!(reply, Reply::Ignored);
    }

    #[test]
    fn page_contains_current_view() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = local_session(&dir, ManualClock::new());
        session.handle(UiEvent::Toggle(1));

        let Reply::Page(html) = session.handle(UiEvent::Page) else {
            panic!("expected page");
        };
        assert!(html.contains(r#"<div class="pokemon-card caught" data-id="1">"#));
        assert!(html.contains(r#"<option value="plante">plante</option>"#));
    }

    #[test]
    fn catalog_failure_renders_error_view() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::new(Arc::new(LocalBackend::new(storage(&dir))), 0);
        let session = Session::new(
            Err(Status::not_found("pokemon_data.json")),
            store,
            ManualClock::new(),
        );

        let view = session.view();
        assert!(view.grid.contains("empty-state error"));
        assert!(view.grid.contains("pokemon_data.json"));
        assert_eq!(view.stats.percentage, 0);
    }

    #[tokio::test]
    async fn other_tab_changes_are_rendered() {
        let dir = tempfile::tempdir().unwrap();
        let mut tab_a = local_session(&dir, ManualClock::new());
        let mut store_b = ProgressStore::new(Arc::new(LocalBackend::new(storage(&dir))), 2);
        let mut notifications = store_b.initialize().await.unwrap();
        let mut tab_b = Session::new(Ok(catalog()), store_b, ManualClock::new());

        tab_a.handle(UiEvent::Toggle(2));

        let notification = tokio::time::timeout(Duration::from_secs(5), notifications.recv())
            .await
            .expect("no storage notification")
            .unwrap();
        tab_b.on_notification(notification);

        assert!(tab_b.store().is_caught(2));
        assert!(tab_b
            .view()
            .grid
            .contains(r#"<div class="pokemon-card caught" data-id="2">"#));
    }

    #[tokio::test]
    async fn second_client_renders_bootstrapped_document() {
        let dir = tempfile::tempdir().unwrap();
        let document = Arc::new(MemoryDocument::new());
        let remote = || {
            let backend = RemoteBackend::new(Arc::clone(&document), storage(&dir));
            ProgressStore::new(Arc::new(backend), 2)
        };

        let mut store_a = remote();
        let mut notifications_a = store_a.initialize().await.unwrap();
        let mut client_a = Session::new(Ok(catalog()), store_a, ManualClock::new());
        client_a.on_notification(notifications_a.recv().await.unwrap());
        client_a.shutdown().await;

        let mut store_b = remote();
        store_b.replace([1, 2], ReplaceSource::Backend);
        let mut notifications_b = store_b.initialize().await.unwrap();
        let mut client_b = Session::new(Ok(catalog()), store_b, ManualClock::new());
        assert_eq!(client_b.view().stats.caught, 2);

        client_b.on_notification(notifications_b.recv().await.unwrap());
        assert_eq!(client_b.view().stats.caught, 0);
        assert!(!client_b.view().grid.contains("caught\""));
    }

    #[tokio::test(start_paused = true)]
    async fn running_session_debounces_search() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::new(Arc::new(LocalBackend::new(storage(&dir))), 2);
        let session = Session::new(Ok(catalog()), store, TokioClock);
        let (_sender, notifications) = mpsc::unbounded_channel();
        let (handle, task) = start(session, notifications);
        let mut views = handle.views();

        assert_eq!(
            handle.send(UiEvent::Search("bulb".to_owned())).await.unwrap(),
            Reply::Scheduled
        );
        views.changed().await.unwrap();
        assert_eq!(views.borrow_and_update().shown, 1);

        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }
}
