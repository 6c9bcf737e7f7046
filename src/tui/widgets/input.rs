//! Text fields for dialogs

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::tui::theme::Palette;

/// Single-line text input; the cursor counts characters, not bytes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextInput {
    pub content: String,
    pub cursor: usize,
    pub placeholder: String,
    pub label: String,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.set(content);
        self
    }

    pub fn set(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.cursor = self.content.chars().count();
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len())
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.content.insert(at, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index(self.cursor);
            self.content.remove(at);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.content.chars().count() {
            let at = self.byte_index(self.cursor);
            self.content.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.content.chars().count() {
            self.cursor += 1;
        }
    }

    pub fn move_start(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.content.chars().count();
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }

    pub fn value(&self) -> &str {
        &self.content
    }

    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// A `TextInput` drawn with the active palette
pub struct InputWidget<'a> {
    input: &'a TextInput,
    focused: bool,
    palette: Palette,
    label_width: u16,
}

impl<'a> InputWidget<'a> {
    pub fn new(input: &'a TextInput, focused: bool, palette: Palette) -> Self {
        Self {
            input,
            focused,
            palette,
            label_width: input.label.chars().count() as u16 + 2,
        }
    }

    /// Align several fields by giving them the same label column
    pub fn label_width(mut self, width: u16) -> Self {
        self.label_width = width;
        self
    }
}

impl Widget for InputWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let input = self.input;
        let label_style = if self.focused {
            Style::default()
                .fg(self.palette.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            self.palette.muted()
        };
        let label = Line::from(vec![
            Span::styled(input.label.as_str(), label_style),
            Span::raw(": "),
        ]);
        buf.set_line(area.x, area.y, &label, self.label_width);

        let start = area.x + self.label_width;
        let width = area.width.saturating_sub(self.label_width) as usize;
        if input.content.is_empty() && !self.focused {
            buf.set_stringn(start, area.y, &input.placeholder, width, self.palette.muted());
            return;
        }
        buf.set_stringn(start, area.y, &input.content, width, self.palette.text());

        if self.focused {
            let cursor_x = start + input.cursor as u16;
            if cursor_x < area.x + area.width {
                let under = input.content.chars().nth(input.cursor).unwrap_or(' ');
                buf.set_string(
                    cursor_x,
                    area.y,
                    under.to_string(),
                    Style::default().fg(self.palette.background).bg(self.palette.accent),
                );
            }
        }
    }
}

/// A fixed set of options cycled with Left/Right
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Choice {
    pub label: String,
    pub options: Vec<String>,
    pub index: usize,
}

impl Choice {
    pub fn new(label: impl Into<String>, options: &[&str]) -> Self {
        Self {
            label: label.into(),
            options: options.iter().map(|o| o.to_string()).collect(),
            index: 0,
        }
    }

    pub fn selected(&self) -> &str {
        self.options.get(self.index).map(String::as_str).unwrap_or("")
    }

    pub fn select(&mut self, option: &str) {
        if let Some(i) = self.options.iter().position(|o| o == option) {
            self.index = i;
        }
    }

    pub fn cycle(&mut self, forward: bool) {
        let len = self.options.len();
        if len > 0 {
            self.index = if forward {
                (self.index + 1) % len
            } else {
                (self.index + len - 1) % len
            };
        }
    }
}

/// Fields of a dialog: an optional choice row followed by text inputs
///
/// Focus index 0 is the choice row when there is one.
#[derive(Debug, Clone, Default)]
pub struct FormFields {
    pub choice: Option<Choice>,
    pub inputs: Vec<TextInput>,
    pub focus: usize,
}

impl FormFields {
    pub fn new(inputs: Vec<TextInput>) -> Self {
        Self {
            choice: None,
            inputs,
            focus: 0,
        }
    }

    pub fn with_choice(mut self, choice: Choice) -> Self {
        self.choice = Some(choice);
        self
    }

    fn offset(&self) -> usize {
        usize::from(self.choice.is_some())
    }

    pub fn len(&self) -> usize {
        self.inputs.len() + self.offset()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn next(&mut self) {
        if !self.is_empty() {
            self.focus = (self.focus + 1) % self.len();
        }
    }

    pub fn prev(&mut self) {
        if !self.is_empty() {
            self.focus = (self.focus + self.len() - 1) % self.len();
        }
    }

    pub fn choice_focused(&self) -> bool {
        self.choice.is_some() && self.focus == 0
    }

    /// Whether input `index` has focus
    pub fn is_focused(&self, index: usize) -> bool {
        self.focus == index + self.offset()
    }

    /// Move focus to input `index`
    pub fn focus_input(&mut self, index: usize) {
        if index < self.inputs.len() {
            self.focus = index + self.offset();
        }
    }

    pub fn focused_mut(&mut self) -> Option<&mut TextInput> {
        let offset = self.offset();
        self.focus
            .checked_sub(offset)
            .and_then(|i| self.inputs.get_mut(i))
    }

    pub fn input_mut(&mut self, index: usize) -> Option<&mut TextInput> {
        self.inputs.get_mut(index)
    }

    pub fn value(&self, index: usize) -> &str {
        self.inputs.get(index).map(|i| i.value().trim()).unwrap_or("")
    }

    pub fn selected(&self) -> &str {
        self.choice.as_ref().map(Choice::selected).unwrap_or("")
    }

    /// Widest label plus the separator
    pub fn label_width(&self) -> u16 {
        self.inputs
            .iter()
            .map(|i| i.label.as_str())
            .chain(self.choice.iter().map(|c| c.label.as_str()))
            .map(|l| l.chars().count() as u16 + 2)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editing_multibyte_text() {
        let mut input = TextInput::new().content("zł");
        assert_eq!(input.cursor, 2);
        input.backspace();
        assert_eq!(input.value(), "z");
        input.move_start();
        input.insert('ż');
        assert_eq!(input.value(), "żz");
        input.move_end();
        input.insert('ł');
        assert_eq!(input.value(), "żzł");
        input.move_left();
        input.delete();
        assert_eq!(input.value(), "żz");
    }

    #[test]
    fn test_form_focus_wraps() {
        let mut form = FormFields::new(vec![
            TextInput::new().label("Amount"),
            TextInput::new().label("Category"),
        ]);
        form.prev();
        assert_eq!(form.focus, 1);
        form.next();
        assert_eq!(form.focus, 0);
        assert_eq!(form.label_width(), 10);
    }

    #[test]
    fn test_choice_row_comes_first() {
        let mut form = FormFields::new(vec![TextInput::new().label("Name")])
            .with_choice(Choice::new("Kind", &["expense", "income"]));
        assert!(form.choice_focused());
        assert!(form.focused_mut().is_none());
        form.next();
        assert!(form.is_focused(0));
        form.focused_mut().unwrap().insert('x');
        assert_eq!(form.value(0), "x");

        let choice = form.choice.as_mut().unwrap();
        choice.cycle(false);
        assert_eq!(choice.selected(), "income");
        choice.select("expense");
        assert_eq!(form.selected(), "expense");
    }
}
