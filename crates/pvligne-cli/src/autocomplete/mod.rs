//! `@mention` autocomplete attached to a form field.
//!
//! Wires a [`MentionSession`] to timers, lookups and a suggestion panel.
//! Timers and lookups run as tokio tasks and report back through
//! [`WidgetEvent`]s, which the event loop hands to [`MentionAutocomplete`]
//! on the UI task.

pub mod panel;

use std::sync::Arc;

use pvligne_core::config::{Config, PanelConfig};
use pvligne_core::debounce::Debouncer;
use pvligne_core::directory::{UserDirectory, UserRecord};
use pvligne_core::session::{Committed, KeyOutcome, LookupOutcome, LookupTicket, TextChange};
use pvligne_core::{MentionSession, NavKey};
use ratatui::layout::Position;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use self::panel::PanelState;

/// Identifies the host field an instance is attached to.
pub type HostId = usize;

/// Asynchronous completions delivered back to the UI task.
#[derive(Debug)]
pub enum WidgetEvent {
    /// The debounce delay elapsed for `query`.
    LookupDue {
        host: HostId,
        generation: u64,
        query: String,
    },
    /// A lookup finished.
    LookupDone {
        host: HostId,
        ticket: LookupTicket,
        result: pvligne_core::Result<Vec<UserRecord>>,
    },
    /// The blur grace delay elapsed.
    BlurElapsed { host: HostId, generation: u64 },
}

impl WidgetEvent {
    pub const fn host(&self) -> HostId {
        match self {
            Self::LookupDue { host, .. }
            | Self::LookupDone { host, .. }
            | Self::BlurElapsed { host, .. } => *host,
        }
    }
}

/// Notifications an instance emits on its host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// The host text was rewritten; listeners should re-read it.
    ContentChanged { host: HostId },
}

/// Result of a pointer press seen by an instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerOutcome {
    /// Not on the panel.
    Outside,
    /// On the panel but not on a row (border).
    Panel,
    /// A row was committed.
    Commit(Committed),
}

/// Builds instances sharing one directory and event channel.
#[derive(Clone)]
pub struct AutocompleteFactory {
    config: Config,
    directory: Arc<dyn UserDirectory>,
    events: mpsc::Sender<WidgetEvent>,
}

impl AutocompleteFactory {
    pub fn new(
        config: Config,
        directory: Arc<dyn UserDirectory>,
        events: mpsc::Sender<WidgetEvent>,
    ) -> Self {
        Self {
            config,
            directory,
            events,
        }
    }

    pub const fn panel_config(&self) -> &PanelConfig {
        &self.config.panel
    }

    /// Create an instance for `host`.
    pub fn attach(&self, host: HostId) -> MentionAutocomplete {
        debug!(host, "Attaching mention autocomplete");
        MentionAutocomplete {
            host,
            session: MentionSession::new(),
            debounce: Debouncer::new(self.config.autocomplete.debounce(), self.events.clone()),
            blur: Debouncer::new(self.config.autocomplete.blur_grace(), self.events.clone()),
            directory: Arc::clone(&self.directory),
            events: self.events.clone(),
            panel: Some(PanelState::new(usize::from(self.config.panel.max_rows))),
        }
    }
}

/// One autocomplete instance bound to one host field.
pub struct MentionAutocomplete {
    host: HostId,
    session: MentionSession,
    debounce: Debouncer<WidgetEvent>,
    blur: Debouncer<WidgetEvent>,
    directory: Arc<dyn UserDirectory>,
    events: mpsc::Sender<WidgetEvent>,
    /// `None` once torn down.
    panel: Option<PanelState>,
}

impl MentionAutocomplete {
    pub const fn host(&self) -> HostId {
        self.host
    }

    pub const fn is_open(&self) -> bool {
        self.session.is_open()
    }

    pub const fn is_destroyed(&self) -> bool {
        self.session.is_destroyed()
    }

    pub const fn selected_index(&self) -> Option<usize> {
        self.session.selected_index()
    }

    pub fn candidates(&self) -> &[UserRecord] {
        self.session.candidates()
    }

    pub const fn session(&self) -> &MentionSession {
        &self.session
    }

    pub const fn panel(&self) -> Option<&PanelState> {
        self.panel.as_ref()
    }

    pub const fn panel_mut(&mut self) -> Option<&mut PanelState> {
        self.panel.as_mut()
    }

    pub const fn lookup_pending(&self) -> bool {
        self.debounce.is_pending()
    }

    /// The host text or caret changed through editing.
    pub fn on_input(&mut self, text: &str, caret: usize) {
        match self.session.on_text_changed(text, caret) {
            TextChange::Ignored => {}
            TextChange::Closed => {
                self.debounce.cancel();
                self.reset_panel();
            }
            TextChange::Schedule(query) => {
                let host = self.host;
                trace!(host, %query, "Scheduling lookup");
                self.debounce.schedule(move |generation| WidgetEvent::LookupDue {
                    host,
                    generation,
                    query,
                });
            }
        }
    }

    /// A navigation key while the host has focus.
    pub fn on_key(&mut self, key: NavKey, text: &str, caret: usize) -> KeyOutcome {
        let outcome = self.session.handle_key(key, text, caret);
        match &outcome {
            KeyOutcome::Handled => self.sync_panel(),
            KeyOutcome::Commit(_) => {
                self.debounce.cancel();
                self.reset_panel();
            }
            KeyOutcome::Ignored => {}
        }
        outcome
    }

    /// Route an asynchronous completion addressed to this instance.
    pub fn on_event(&mut self, event: WidgetEvent) {
        match event {
            WidgetEvent::LookupDue {
                generation, query, ..
            } => self.on_lookup_due(generation, &query),
            WidgetEvent::LookupDone { ticket, result, .. } => self.on_lookup_done(&ticket, result),
            WidgetEvent::BlurElapsed { generation, .. } => {
                if self.blur.accept(generation) && !self.is_destroyed() {
                    debug!(host = self.host, "Closing panel after blur");
                    self.close();
                }
            }
        }
    }

    fn on_lookup_due(&mut self, generation: u64, query: &str) {
        if !self.debounce.accept(generation) {
            return;
        }
        let Some(ticket) = self.session.begin_lookup(query) else {
            return;
        };
        debug!(host = self.host, seq = ticket.seq, query = %ticket.query, "Issuing lookup");
        let directory = Arc::clone(&self.directory);
        let events = self.events.clone();
        let host = self.host;
        tokio::spawn(async move {
            let result = directory.search(&ticket.query).await;
            let _ = events
                .send(WidgetEvent::LookupDone {
                    host,
                    ticket,
                    result,
                })
                .await;
        });
    }

    fn on_lookup_done(
        &mut self,
        ticket: &LookupTicket,
        result: pvligne_core::Result<Vec<UserRecord>>,
    ) {
        let outcome = match result {
            Ok(users) => self.session.apply_results(ticket, users),
            Err(e) => self.session.apply_failure(ticket, &e),
        };
        match outcome {
            LookupOutcome::Opened => {
                self.reset_panel();
                self.sync_panel();
            }
            LookupOutcome::Closed => self.reset_panel(),
            LookupOutcome::Discarded => {}
        }
    }

    /// The host regained focus; a pending blur close is cancelled.
    pub fn on_focus(&mut self) {
        self.blur.cancel();
    }

    /// The host lost focus. `into_panel` is true when focus moved onto the panel.
    pub fn on_blur(&mut self, into_panel: bool) {
        if into_panel || self.is_destroyed() || !self.is_open() {
            return;
        }
        let host = self.host;
        self.blur
            .schedule(move |generation| WidgetEvent::BlurElapsed { host, generation });
    }

    /// A pointer press anywhere in the document; `on_host` is true when it hit the host.
    pub fn on_document_click(&mut self, pos: Position, on_host: bool) {
        if self.is_destroyed() || !self.is_open() || on_host {
            return;
        }
        if !self.panel.as_ref().is_some_and(|p| p.contains(pos)) {
            debug!(host = self.host, "Closing panel on outside click");
            self.close();
        }
    }

    /// A pointer press that may land on the panel.
    pub fn on_pointer_down(&mut self, pos: Position, text: &str, caret: usize) -> PointerOutcome {
        if !self.is_open() {
            return PointerOutcome::Outside;
        }
        let Some(panel) = self.panel.as_ref() else {
            return PointerOutcome::Outside;
        };
        if !panel.contains(pos) {
            return PointerOutcome::Outside;
        }
        let Some(index) = panel.row_at(pos, self.session.candidates().len()) else {
            return PointerOutcome::Panel;
        };
        self.blur.cancel();
        match self.session.commit(index, text, caret) {
            Some(done) => {
                self.debounce.cancel();
                self.reset_panel();
                PointerOutcome::Commit(done)
            }
            None => PointerOutcome::Panel,
        }
    }

    /// Pointer movement: hovering a row selects it.
    pub fn on_hover(&mut self, pos: Position) -> bool {
        let Some(index) = self
            .panel
            .as_ref()
            .and_then(|p| p.row_at(pos, self.session.candidates().len()))
        else {
            return false;
        };
        self.session.select(index)
    }

    /// Close the panel without committing.
    pub fn close(&mut self) {
        self.session.close();
        self.debounce.cancel();
        self.reset_panel();
    }

    /// Tear down: remove the panel and stop reacting to anything.
    pub fn destroy(&mut self) {
        debug!(host = self.host, "Destroying mention autocomplete");
        self.session.destroy();
        self.debounce.cancel();
        self.blur.cancel();
        self.panel = None;
    }

    fn reset_panel(&mut self) {
        if let Some(panel) = self.panel.as_mut() {
            panel.reset();
        }
    }

    fn sync_panel(&mut self) {
        if let (Some(panel), Some(selected)) = (self.panel.as_mut(), self.session.selected_index()) {
            panel.follow(selected);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::time::Duration;

    use pvligne_core::directory::{DirectoryUser, Role, StaticDirectory};
    use ratatui::layout::Rect;

    use super::*;

    fn directory() -> Arc<dyn UserDirectory> {
        let users = ["alice", "alain", "albert", "bob"]
            .iter()
            .enumerate()
            .map(|(i, name)| DirectoryUser {
                id: i as u64 + 1,
                username: (*name).to_string(),
                role: if *name == "alice" { Role::Validator } else { Role::User },
                is_validated: true,
            })
            .collect();
        Arc::new(StaticDirectory::new(users))
    }

    fn setup() -> (MentionAutocomplete, mpsc::Receiver<WidgetEvent>) {
        let (tx, rx) = mpsc::channel(32);
        let factory = AutocompleteFactory::new(Config::default(), directory(), tx);
        (factory.attach(0), rx)
    }

    /// Deliver events until the instance has nothing in flight.
    async fn pump(widget: &mut MentionAutocomplete, rx: &mut mpsc::Receiver<WidgetEvent>) -> usize {
        let mut lookups = 0;
        while let Ok(Some(event)) = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await {
            if matches!(event, WidgetEvent::LookupDue { .. }) {
                lookups += 1;
            }
            let done = matches!(event, WidgetEvent::LookupDone { .. });
            widget.on_event(event);
            if done {
                break;
            }
        }
        lookups
    }

    #[tokio::test(start_paused = true)]
    async fn typing_then_enter_commits() {
        let (mut w, mut rx) = setup();
        w.on_input("Hello @ali", 10);
        pump(&mut w, &mut rx).await;
        assert!(w.is_open());
        assert_eq!(w.candidates()[0].username, "alice");
        assert_eq!(w.candidates()[0].role_display, "Validateur");

        let KeyOutcome::Commit(done) = w.on_key(NavKey::Enter, "Hello @ali", 10) else {
            panic!("expected commit");
        };
        assert_eq!(done.splice.text, "Hello @alice ");
        assert_eq!(done.splice.caret, 13);
        assert!(!w.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn burst_issues_single_lookup() {
        let (mut w, mut rx) = setup();
        for (i, text) in ["@a", "@al", "@alb"].iter().enumerate() {
            w.on_input(text, text.len());
            if i < 2 {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
        let lookups = pump(&mut w, &mut rx).await;
        assert_eq!(lookups, 1);
        assert_eq!(w.candidates().len(), 1);
        assert_eq!(w.candidates()[0].username, "albert");
    }

    #[tokio::test(start_paused = true)]
    async fn abandoning_mention_cancels_lookup() {
        let (mut w, mut rx) = setup();
        w.on_input("@al", 3);
        w.on_input("@al ", 4);
        assert!(!w.lookup_pending());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
        assert!(!w.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn no_match_keeps_panel_closed() {
        let (mut w, mut rx) = setup();
        w.on_input("@zed", 4);
        pump(&mut w, &mut rx).await;
        assert!(!w.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn blur_closes_after_grace_unless_refocused() {
        let (mut w, mut rx) = setup();
        w.on_input("@al", 3);
        pump(&mut w, &mut rx).await;
        assert!(w.is_open());

        w.on_blur(false);
        w.on_focus();
        tokio::time::sleep(Duration::from_secs(1)).await;
        while let Ok(ev) = rx.try_recv() {
            w.on_event(ev);
        }
        assert!(w.is_open());

        w.on_blur(false);
        let ev = rx.recv().await.unwrap();
        w.on_event(ev);
        assert!(!w.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn blur_into_panel_keeps_it_open() {
        let (mut w, mut rx) = setup();
        w.on_input("@al", 3);
        pump(&mut w, &mut rx).await;
        w.on_blur(true);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
        assert!(w.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn outside_click_closes_inside_click_commits() {
        let (mut w, mut rx) = setup();
        w.on_input("@al", 3);
        pump(&mut w, &mut rx).await;
        w.panel_mut().unwrap().set_area(Some(Rect::new(0, 2, 24, 5)));

        // Click on the host itself does nothing.
        w.on_document_click(Position::new(30, 0), true);
        assert!(w.is_open());

        // Rows are alain, albert, alice; y=4 is the second one.
        let outcome = w.on_pointer_down(Position::new(3, 4), "@al", 3);
        let PointerOutcome::Commit(done) = outcome else {
            panic!("expected commit, got {outcome:?}");
        };
        assert_eq!(done.user.username, "albert");
        assert_eq!(done.splice.text, "@albert ");

        w.on_input("@al", 3);
        pump(&mut w, &mut rx).await;
        w.panel_mut().unwrap().set_area(Some(Rect::new(0, 2, 24, 5)));
        w.on_document_click(Position::new(60, 20), false);
        assert!(!w.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn hover_moves_selection() {
        let (mut w, mut rx) = setup();
        w.on_input("@al", 3);
        pump(&mut w, &mut rx).await;
        w.panel_mut().unwrap().set_area(Some(Rect::new(0, 2, 24, 5)));
        assert!(w.on_hover(Position::new(2, 5)));
        assert_eq!(w.selected_index(), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn keyboard_selection_scrolls_window() {
        let users = (0..8)
            .map(|i| DirectoryUser {
                id: i + 1,
                username: format!("user{i}"),
                role: Role::User,
                is_validated: true,
            })
            .collect();
        let (tx, mut rx) = mpsc::channel(32);
        let factory =
            AutocompleteFactory::new(Config::default(), Arc::new(StaticDirectory::new(users)), tx);
        let mut w = factory.attach(0);

        w.on_input("@user", 5);
        pump(&mut w, &mut rx).await;
        assert_eq!(w.candidates().len(), 8);
        assert_eq!(w.panel().unwrap().visible_rows(), 6);

        for _ in 0..7 {
            assert_eq!(w.on_key(NavKey::Down, "@user", 5), KeyOutcome::Handled);
        }
        assert_eq!(w.selected_index(), Some(7));
        assert_eq!(w.panel().unwrap().scroll_offset(), 2);
        assert_eq!(w.panel().unwrap().window(8), 2..8);

        for _ in 0..7 {
            w.on_key(NavKey::Up, "@user", 5);
        }
        assert_eq!(w.selected_index(), Some(0));
        assert_eq!(w.panel().unwrap().scroll_offset(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn destroy_stops_all_reactions() {
        let (mut w, mut rx) = setup();
        w.on_input("@al", 3);
        pump(&mut w, &mut rx).await;
        w.on_input("@ali", 4);
        w.destroy();

        assert!(w.panel().is_none());
        w.on_input("@alice", 6);
        assert_eq!(w.on_key(NavKey::Down, "@alice", 6), KeyOutcome::Ignored);
        w.on_blur(false);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(rx.try_recv().is_err());
        assert!(!w.is_open());
        assert!(w.panel().is_none());
    }
}
