use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

use crate::app::Action;

/// A key combination
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    pub fn shift(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::SHIFT,
        }
    }

    pub fn from_event(event: &KeyEvent) -> Self {
        Self {
            code: event.code,
            modifiers: event.modifiers,
        }
    }
}

/// Context for keybindings
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyContext {
    Global,
    Dashboard,
}

/// Keybinding configuration
pub struct KeyBindings {
    bindings: HashMap<KeyContext, HashMap<KeyBinding, Action>>,
}

impl KeyBindings {
    pub fn new() -> Self {
        let mut bindings = HashMap::new();

        // Global bindings
        let mut global = HashMap::new();
        global.insert(KeyBinding::new(KeyCode::Char('?')), Action::ToggleHelp);
        global.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::Quit);
        global.insert(KeyBinding::new(KeyCode::Char('q')), Action::Quit);
        bindings.insert(KeyContext::Global, global);

        // Dashboard bindings - less-like navigation
        let mut dashboard = HashMap::new();
        dashboard.insert(KeyBinding::new(KeyCode::Char('j')), Action::ScrollDown(1));
        dashboard.insert(KeyBinding::new(KeyCode::Down), Action::ScrollDown(1));
        dashboard.insert(KeyBinding::new(KeyCode::Char('k')), Action::ScrollUp(1));
        dashboard.insert(KeyBinding::new(KeyCode::Up), Action::ScrollUp(1));
        dashboard.insert(KeyBinding::ctrl(KeyCode::Char('d')), Action::PageDown);
        dashboard.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::PageUp);
        dashboard.insert(KeyBinding::new(KeyCode::PageDown), Action::PageDown);
        dashboard.insert(KeyBinding::new(KeyCode::PageUp), Action::PageUp);
        dashboard.insert(KeyBinding::new(KeyCode::Char('g')), Action::ScrollToTop);
        dashboard.insert(KeyBinding::shift(KeyCode::Char('G')), Action::ScrollToBottom);
        dashboard.insert(KeyBinding::new(KeyCode::Home), Action::ScrollToTop);
        dashboard.insert(KeyBinding::new(KeyCode::End), Action::ScrollToBottom);
        dashboard.insert(
            KeyBinding::new(KeyCode::Char('f')),
            Action::ToggleAutoScroll,
        );
        dashboard.insert(
            KeyBinding::new(KeyCode::Char('t')),
            Action::ToggleTimestamps,
        );
        dashboard.insert(KeyBinding::new(KeyCode::Char('s')), Action::ToggleStats);
        dashboard.insert(
            KeyBinding::new(KeyCode::Char('l')),
            Action::CycleLevelFilter,
        );
        dashboard.insert(
            KeyBinding::new(KeyCode::Char('v')),
            Action::OpenServiceInput,
        );
        dashboard.insert(KeyBinding::new(KeyCode::Char('/')), Action::OpenTextSearch);
        dashboard.insert(KeyBinding::new(KeyCode::Char('n')), Action::ClearFilters);
        dashboard.insert(KeyBinding::new(KeyCode::Esc), Action::DismissError);
        bindings.insert(KeyContext::Dashboard, dashboard);

        Self { bindings }
    }

    /// Look up an action for a key in the given context, falling back to
    /// global bindings
    pub fn get_action(&self, context: KeyContext, event: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(event);

        if let Some(context_bindings) = self.bindings.get(&context) {
            if let Some(action) = context_bindings.get(&binding) {
                return Some(action.clone());
            }
        }

        self.bindings
            .get(&KeyContext::Global)
            .and_then(|global| global.get(&binding))
            .cloned()
    }

    /// Actions while the filter input line is being edited; arbitrary
    /// characters flow into the input, so this is a match rather than a map
    pub fn get_input_action(&self, event: &KeyEvent) -> Option<Action> {
        if event.modifiers.contains(KeyModifiers::CONTROL) {
            return match event.code {
                KeyCode::Char('c') => Some(Action::Quit),
                KeyCode::Char('u') => Some(Action::InputClear),
                _ => None,
            };
        }

        match event.code {
            KeyCode::Enter => Some(Action::ApplyInput),
            KeyCode::Esc => Some(Action::CancelInput),
            KeyCode::Backspace => Some(Action::InputBackspace),
            KeyCode::Char(c) => Some(Action::InputChar(c)),
            _ => None,
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}
