//! Application state and types.

use pvligne_core::config::PanelConfig;
use pvligne_core::mention::{self, clamp_to_char_boundary};
use pvligne_core::session::Committed;
use ratatui::layout::{Margin, Position, Rect};
use tracing::debug;

use crate::autocomplete::{AutocompleteFactory, HostEvent, HostId, MentionAutocomplete, WidgetEvent};

/// Static description of a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Key used when the minutes are exported.
    pub key: &'static str,
    pub label: &'static str,
    pub multiline: bool,
    /// Opt-in marker: fields with it get a mention autocomplete.
    pub mention: bool,
}

/// The action entry form of the minutes.
pub const MINUTES_FORM: &[FieldSpec] = &[
    FieldSpec {
        key: "categorie",
        label: "Catégorie",
        multiline: false,
        mention: false,
    },
    FieldSpec {
        key: "description",
        label: "Description de l'action",
        multiline: true,
        mention: false,
    },
    FieldSpec {
        key: "cause",
        label: "Cause supposée ou identifiée",
        multiline: true,
        mention: false,
    },
    FieldSpec {
        key: "personnes_impliquees",
        label: "Personnes impliquées",
        multiline: true,
        mention: true,
    },
];

/// A text field of the form.
pub struct Field {
    pub spec: FieldSpec,
    pub text: String,
    /// Byte offset of the caret, always on a char boundary.
    pub caret: usize,
    /// Bordered area, set each frame by the renderer.
    pub area: Rect,
    /// First visible wrapped row, set by the renderer.
    pub scroll: u16,
    pub autocomplete: Option<MentionAutocomplete>,
}

impl Field {
    fn new(spec: FieldSpec) -> Self {
        Self {
            spec,
            text: String::new(),
            caret: 0,
            area: Rect::default(),
            scroll: 0,
            autocomplete: None,
        }
    }

    /// Text area inside the border.
    pub fn text_area(&self) -> Rect {
        self.area.inner(Margin::new(1, 1))
    }
}

/// Live preview of the focused field, refreshed on content changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preview {
    pub host: HostId,
    /// Distinct mentioned usernames, in order of first appearance.
    pub mentions: Vec<String>,
    /// Number of content changes seen.
    pub revision: u64,
}

/// TUI application state.
pub struct App {
    pub fields: Vec<Field>,
    pub focus: usize,
    pub should_quit: bool,
    /// Print the minutes as JSON after leaving the TUI.
    pub save_on_exit: bool,
    pub status: String,
    pub preview: Preview,
    pub panel_config: PanelConfig,
    /// Instances subscribed to document-wide pointer presses.
    document_listeners: Vec<HostId>,
}

impl App {
    /// Build the form, attaching an autocomplete to every opted-in field.
    pub fn new(specs: &[FieldSpec], factory: Option<&AutocompleteFactory>) -> Self {
        let mut fields: Vec<Field> = specs.iter().copied().map(Field::new).collect();
        let mut document_listeners = Vec::new();
        if let Some(factory) = factory {
            for (host, field) in fields.iter_mut().enumerate() {
                if field.spec.mention {
                    field.autocomplete = Some(factory.attach(host));
                    document_listeners.push(host);
                }
            }
        }
        Self {
            fields,
            focus: 0,
            should_quit: false,
            save_on_exit: false,
            status: "Tab: champ suivant | @: mentionner | Ctrl+S: enregistrer".to_string(),
            preview: Preview::default(),
            panel_config: factory.map(|f| f.panel_config().clone()).unwrap_or_default(),
            document_listeners,
        }
    }

    pub fn focused(&self) -> &Field {
        &self.fields[self.focus]
    }

    pub fn focused_mut(&mut self) -> &mut Field {
        &mut self.fields[self.focus]
    }

    pub fn document_listeners(&self) -> &[HostId] {
        &self.document_listeners
    }

    /// Move focus to field `index`, blurring the previous one.
    pub fn focus_field(&mut self, index: usize) {
        if index >= self.fields.len() || index == self.focus {
            return;
        }
        if let Some(ac) = self.fields[self.focus].autocomplete.as_mut() {
            ac.on_blur(false);
        }
        self.focus = index;
        if let Some(ac) = self.fields[index].autocomplete.as_mut() {
            ac.on_focus();
        }
        self.refresh_preview(index);
    }

    pub fn focus_next(&mut self) {
        self.focus_field((self.focus + 1) % self.fields.len());
    }

    pub fn focus_prev(&mut self) {
        let len = self.fields.len();
        self.focus_field((self.focus + len - 1) % len);
    }

    // -- Editing of the focused field --

    pub fn insert_char(&mut self, c: char) {
        let field = self.focused_mut();
        field.text.insert(field.caret, c);
        field.caret += c.len_utf8();
        self.after_edit(true);
    }

    /// Enter outside the panel: newline in multi-line fields, next field otherwise.
    pub fn insert_newline(&mut self) {
        if self.focused().spec.multiline {
            self.insert_char('\n');
        } else {
            self.focus_next();
        }
    }

    pub fn backspace(&mut self) {
        let field = self.focused_mut();
        let Some(prev) = field.text[..field.caret].chars().next_back() else {
            return;
        };
        field.caret -= prev.len_utf8();
        field.text.remove(field.caret);
        self.after_edit(true);
    }

    pub fn delete(&mut self) {
        let field = self.focused_mut();
        if field.caret >= field.text.len() {
            return;
        }
        field.text.remove(field.caret);
        self.after_edit(true);
    }

    pub fn move_left(&mut self) {
        let field = self.focused_mut();
        if let Some(prev) = field.text[..field.caret].chars().next_back() {
            field.caret -= prev.len_utf8();
        }
        self.after_edit(false);
    }

    pub fn move_right(&mut self) {
        let field = self.focused_mut();
        if let Some(next) = field.text[field.caret..].chars().next() {
            field.caret += next.len_utf8();
        }
        self.after_edit(false);
    }

    pub fn move_home(&mut self) {
        let field = self.focused_mut();
        field.caret = field.text[..field.caret].rfind('\n').map_or(0, |i| i + 1);
        self.after_edit(false);
    }

    pub fn move_end(&mut self) {
        let field = self.focused_mut();
        field.caret = field.text[field.caret..]
            .find('\n')
            .map_or(field.text.len(), |i| field.caret + i);
        self.after_edit(false);
    }

    /// Put the caret of the focused field at `offset`.
    pub fn set_caret(&mut self, offset: usize) {
        let field = self.focused_mut();
        field.caret = clamp_to_char_boundary(&field.text, offset);
        self.after_edit(false);
    }

    fn after_edit(&mut self, text_changed: bool) {
        let host = self.focus;
        let field = &mut self.fields[host];
        if let Some(ac) = field.autocomplete.as_mut() {
            ac.on_input(&field.text, field.caret);
        }
        if text_changed {
            self.handle_host_event(&HostEvent::ContentChanged { host });
        }
    }

    // -- Autocomplete plumbing --

    /// Adopt a committed mention: new text and caret, focus back on the host.
    pub fn apply_commit(&mut self, host: HostId, committed: Committed) {
        let Some(field) = self.fields.get_mut(host) else {
            return;
        };
        field.text = committed.splice.text;
        field.caret = committed.splice.caret;
        self.focus_field(host);
        self.status = format!("@{} ({})", committed.user.username, committed.user.role_display);
        self.handle_host_event(&HostEvent::ContentChanged { host });
    }

    /// Listener side of host notifications.
    pub fn handle_host_event(&mut self, event: &HostEvent) {
        match *event {
            HostEvent::ContentChanged { host } => {
                self.preview.revision += 1;
                if host == self.focus {
                    self.refresh_preview(host);
                }
            }
        }
    }

    fn refresh_preview(&mut self, host: HostId) {
        let mut mentions: Vec<String> = Vec::new();
        for span in mention::extract_mentions(&self.fields[host].text) {
            if !mentions.contains(&span.username) {
                mentions.push(span.username);
            }
        }
        self.preview.host = host;
        self.preview.mentions = mentions;
    }

    /// Deliver a timer or lookup completion to its instance.
    pub fn route_widget_event(&mut self, event: WidgetEvent) {
        let host = event.host();
        match self.fields.get_mut(host).and_then(|f| f.autocomplete.as_mut()) {
            Some(ac) => ac.on_event(event),
            None => debug!(host, "Dropping event for detached autocomplete"),
        }
    }

    /// Fan a pointer press out to the document-level subscribers.
    pub fn document_click(&mut self, pos: Position) {
        for &host in &self.document_listeners {
            let field = &mut self.fields[host];
            let on_host = field.area.contains(pos);
            if let Some(ac) = field.autocomplete.as_mut() {
                ac.on_document_click(pos, on_host);
            }
        }
    }

    /// Tear down the autocomplete on `host` and drop its subscription.
    pub fn detach_autocomplete(&mut self, host: HostId) {
        if let Some(mut ac) = self.fields.get_mut(host).and_then(|f| f.autocomplete.take()) {
            ac.destroy();
        }
        self.document_listeners.retain(|&h| h != host);
    }

    /// Tear down every instance.
    pub fn teardown(&mut self) {
        for host in 0..self.fields.len() {
            self.detach_autocomplete(host);
        }
    }

    /// The captured minutes, keyed by field.
    pub fn to_json(&self) -> serde_json::Value {
        let mut fields = serde_json::Map::new();
        let mut mentioned: Vec<String> = Vec::new();
        for field in &self.fields {
            fields.insert(field.spec.key.to_string(), field.text.clone().into());
            if field.spec.mention {
                for span in mention::extract_mentions(&field.text) {
                    if !mentioned.contains(&span.username) {
                        mentioned.push(span.username);
                    }
                }
            }
        }
        serde_json::json!({ "fields": fields, "mentions": mentioned })
    }
}
