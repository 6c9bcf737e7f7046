//! Keyboard shortcuts as listed in the help dialog

use crossterm::event::KeyCode;

use super::app::Page;

#[derive(Debug, Clone)]
pub struct Keybinding {
    pub key: KeyCode,
    pub description: &'static str,
    pub context: KeyContext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyContext {
    Global,
    Page(Page),
    Dialog,
}

const fn bind(key: KeyCode, description: &'static str, context: KeyContext) -> Keybinding {
    Keybinding {
        key,
        description,
        context,
    }
}

use KeyContext::{Dialog, Global};

pub static KEYBINDINGS: &[Keybinding] = &[
    bind(KeyCode::Char('q'), "Quit", Global),
    bind(KeyCode::Char('?'), "Help", Global),
    bind(KeyCode::Char('1'), "Home", Global),
    bind(KeyCode::Char('2'), "Categories", Global),
    bind(KeyCode::Char('3'), "Limits", Global),
    bind(KeyCode::Char('4'), "Goals", Global),
    bind(KeyCode::Char('5'), "Transactions", Global),
    bind(KeyCode::Char('6'), "Settings", Global),
    bind(KeyCode::Char('j'), "Move down", Global),
    bind(KeyCode::Char('k'), "Move up", Global),
    bind(KeyCode::Char('i'), "Add income", Global),
    bind(KeyCode::Char('e'), "Add expense", Global),
    bind(KeyCode::Char('R'), "Check for changes now", Global),
    bind(KeyCode::Char('a'), "Add category", KeyContext::Page(Page::Categories)),
    bind(KeyCode::Char('d'), "Delete category", KeyContext::Page(Page::Categories)),
    bind(KeyCode::Char('a'), "Set a limit", KeyContext::Page(Page::Limits)),
    bind(KeyCode::Char('d'), "Remove limit", KeyContext::Page(Page::Limits)),
    bind(KeyCode::Char('a'), "Add goal", KeyContext::Page(Page::Goals)),
    bind(KeyCode::Char('t'), "Transfer to goal", KeyContext::Page(Page::Goals)),
    bind(KeyCode::Char('d'), "Delete goal", KeyContext::Page(Page::Goals)),
    bind(KeyCode::Char('d'), "Delete transaction", KeyContext::Page(Page::Transactions)),
    bind(KeyCode::Char('t'), "Toggle theme", KeyContext::Page(Page::Settings)),
    bind(KeyCode::Char('c'), "Next display currency", KeyContext::Page(Page::Settings)),
    bind(KeyCode::Char('n'), "Notifications on/off", KeyContext::Page(Page::Settings)),
    bind(KeyCode::Char('s'), "Auto sync on/off", KeyContext::Page(Page::Settings)),
    bind(KeyCode::Char('r'), "Refresh exchange rates", KeyContext::Page(Page::Settings)),
    bind(KeyCode::Tab, "Next field", Dialog),
    bind(KeyCode::BackTab, "Previous field", Dialog),
    bind(KeyCode::Left, "Change option", Dialog),
    bind(KeyCode::Enter, "Save", Dialog),
    bind(KeyCode::Esc, "Cancel", Dialog),
];

/// Bindings that apply in `context`
pub fn bindings_for(context: KeyContext) -> impl Iterator<Item = &'static Keybinding> {
    KEYBINDINGS.iter().filter(move |b| b.context == context)
}

pub fn key_label(key: &KeyCode) -> String {
    match key {
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Tab => "Tab".into(),
        KeyCode::BackTab => "Shift+Tab".into(),
        KeyCode::Enter => "Enter".into(),
        KeyCode::Esc => "Esc".into(),
        KeyCode::Left => "Left/Right".into(),
        other => format!("{:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_page_has_its_number() {
        for (i, page) in Page::ALL.iter().enumerate() {
            let digit = char::from_digit(i as u32 + 1, 10).unwrap();
            let binding = bindings_for(Global)
                .find(|b| b.key == KeyCode::Char(digit))
                .unwrap();
            assert_eq!(binding.description, page.title());
        }
    }

    #[test]
    fn test_no_duplicate_keys_per_context() {
        for (i, a) in KEYBINDINGS.iter().enumerate() {
            for b in &KEYBINDINGS[i + 1..] {
                assert!(
                    !(a.key == b.key && a.context == b.context),
                    "duplicate binding {:?}",
                    a.key
                );
            }
        }
    }
}
