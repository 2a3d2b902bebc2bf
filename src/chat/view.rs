//! Headless chat surface.
//!
//! [`ChatView`] holds everything a chat page shows: the message bubbles with
//! the markup they would be inserted with, the typing placeholder, the input
//! field, the subject tabs and the example prompts. It implements both
//! [`Renderer`] and [`Controls`], so a [`ChatSession`](super::ChatSession) can
//! drive it directly. An optional echo renderer mirrors every render call,
//! which is how the terminal front end prints while the model stays
//! inspectable.

use crate::chat::gate::Controls;
use crate::render::{Renderer, StreamHandle, bot_markup, newlines_to_breaks};
use crate::types::{Sender, Subject, Turn};

/// One message bubble in the chat list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bubble {
    id: u64,
    turn: Turn,
    markup: String,
    streaming: bool,
    echo: Option<StreamHandle>,
}

impl Bubble {
    /// The turn this bubble displays. For a streamed bubble the text is
    /// everything received so far.
    pub fn turn(&self) -> &Turn {
        &self.turn
    }

    /// Plain text of the bubble.
    pub fn text(&self) -> &str {
        &self.turn.text
    }

    /// Who sent it.
    pub fn sender(&self) -> Sender {
        self.turn.sender
    }

    /// The markup inserted into the bubble's content element.
    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// True while fragments may still be appended.
    pub fn is_streaming(&self) -> bool {
        self.streaming
    }
}

/// A subject tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    /// Text shown on the tab; also what the subject is resolved from.
    pub label: String,
    /// The active marker.
    pub active: bool,
}

/// Row of tabs with exactly one active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabBar {
    tabs: Vec<Tab>,
}

impl TabBar {
    /// Creates a tab bar with the first tab active.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tabs = labels
            .into_iter()
            .enumerate()
            .map(|(index, label)| Tab {
                label: label.into(),
                active: index == 0,
            })
            .collect();
        Self { tabs }
    }

    /// The standard Mathematics/Physics/Chemistry tabs with `active` selected.
    pub fn for_subjects(active: Subject) -> Self {
        let mut bar = Self::new(
            [Subject::Maths, Subject::Physics, Subject::Chemistry]
                .iter()
                .map(|subject| subject.tab_label()),
        );
        bar.select_label(active.tab_label());
        bar
    }

    /// All tabs in display order.
    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    /// Activates the tab at `index`, clearing the marker from every other tab.
    ///
    /// Returns false and changes nothing if there is no such tab.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.tabs.len() {
            return false;
        }
        for tab in self.tabs.iter_mut() {
            tab.active = false;
        }
        self.tabs[index].active = true;
        true
    }

    /// Activates the first tab whose label contains `name`, ignoring case.
    pub fn select_label(&mut self, name: &str) -> bool {
        let name = name.to_lowercase();
        match self
            .tabs
            .iter()
            .position(|tab| tab.label.to_lowercase().contains(&name))
        {
            Some(index) => self.select(index),
            None => false,
        }
    }

    /// Label of the active tab.
    pub fn active_label(&self) -> Option<&str> {
        self.tabs
            .iter()
            .find(|tab| tab.active)
            .map(|tab| tab.label.as_str())
    }
}

impl Default for TabBar {
    fn default() -> Self {
        Self::for_subjects(Subject::default())
    }
}

/// A clickable example prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Example {
    /// The question sent when the example is clicked.
    pub label: String,
    /// False while a request is outstanding.
    pub enabled: bool,
    /// True for the example that started the outstanding request.
    pub highlighted: bool,
}

/// List of example prompts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExampleList {
    items: Vec<Example>,
}

impl ExampleList {
    /// Creates an enabled, unhighlighted list.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::default();
        list.replace(labels);
        list
    }

    /// The sample questions for `subject`.
    pub fn for_subject(subject: Subject) -> Self {
        Self::new(subject.sample_questions().iter().copied())
    }

    /// Replaces every example, keeping the current enabled state.
    pub fn replace<I, S>(&mut self, labels: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let enabled = self.items.first().is_none_or(|item| item.enabled);
        self.items = labels
            .into_iter()
            .map(|label| Example {
                label: label.into(),
                enabled,
                highlighted: false,
            })
            .collect();
    }

    /// All examples in display order.
    pub fn items(&self) -> &[Example] {
        &self.items
    }

    fn set_enabled(&mut self, enabled: bool) {
        for item in self.items.iter_mut() {
            item.enabled = enabled;
        }
    }

    fn highlight(&mut self, index: usize) {
        for (i, item) in self.items.iter_mut().enumerate() {
            item.highlighted = i == index;
        }
    }

    /// Index of the highlighted example.
    pub fn highlighted(&self) -> Option<usize> {
        self.items.iter().position(|item| item.highlighted)
    }
}

/// The message input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputBox {
    /// Current text.
    pub text: String,
    /// False while a request is outstanding.
    pub enabled: bool,
}

impl Default for InputBox {
    fn default() -> Self {
        Self {
            text: String::new(),
            enabled: true,
        }
    }
}

/// Headless model of the chat page.
#[derive(Default)]
pub struct ChatView {
    bubbles: Vec<Bubble>,
    typing: bool,
    next_id: u64,
    input: InputBox,
    tabs: TabBar,
    examples: ExampleList,
    echo: Option<Box<dyn Renderer>>,
}

impl ChatView {
    /// Creates an empty view with the subject tabs and the sample questions
    /// of the default subject.
    pub fn new() -> Self {
        Self::for_subject(Subject::default())
    }

    /// Creates an empty view with `subject`'s tab active.
    pub fn for_subject(subject: Subject) -> Self {
        Self {
            tabs: TabBar::for_subjects(subject),
            examples: ExampleList::for_subject(subject),
            ..Self::default()
        }
    }

    /// Mirrors every render call to `renderer`.
    pub fn with_echo(mut self, renderer: impl Renderer + 'static) -> Self {
        self.echo = Some(Box::new(renderer));
        self
    }

    /// Replaces the tabs.
    pub fn with_tabs(mut self, tabs: TabBar) -> Self {
        self.tabs = tabs;
        self
    }

    /// Replaces the examples.
    pub fn with_examples(mut self, examples: ExampleList) -> Self {
        self.examples = examples;
        self
    }

    /// Message bubbles, oldest first. The typing placeholder is not a bubble.
    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    /// Completed and in-progress turns, oldest first.
    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.bubbles.iter().map(|bubble| &bubble.turn)
    }

    /// Bubbles sent by `sender`.
    pub fn count(&self, sender: Sender) -> usize {
        self.bubbles
            .iter()
            .filter(|bubble| bubble.sender() == sender)
            .count()
    }

    /// The most recent bubble.
    pub fn last(&self) -> Option<&Bubble> {
        self.bubbles.last()
    }

    /// True while the typing placeholder is shown.
    pub fn is_typing(&self) -> bool {
        self.typing
    }

    /// The input field.
    pub fn input(&self) -> &InputBox {
        &self.input
    }

    /// The subject tabs.
    pub fn tabs(&self) -> &TabBar {
        &self.tabs
    }

    /// Mutable access to the tabs; switching tabs never touches the network.
    pub fn tabs_mut(&mut self) -> &mut TabBar {
        &mut self.tabs
    }

    /// The example prompts.
    pub fn examples(&self) -> &ExampleList {
        &self.examples
    }

    /// Mutable access to the examples.
    pub fn examples_mut(&mut self) -> &mut ExampleList {
        &mut self.examples
    }

    /// Removes every bubble and the typing placeholder.
    pub fn clear(&mut self) {
        self.bubbles.clear();
        self.typing = false;
    }

    fn push(&mut self, turn: Turn, markup: String, streaming: bool) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.bubbles.push(Bubble {
            id,
            turn,
            markup,
            streaming,
            echo: None,
        });
        id
    }
}

impl Renderer for ChatView {
    fn append_message(&mut self, text: &str, sender: Sender) {
        let markup = match sender {
            Sender::User => text.to_string(),
            Sender::Bot => bot_markup(text),
        };
        self.push(Turn::new(text, sender), markup, false);
        if let Some(echo) = self.echo.as_mut() {
            echo.append_message(text, sender);
        }
    }

    fn show_typing_indicator(&mut self) {
        self.typing = true;
        if let Some(echo) = self.echo.as_mut() {
            echo.show_typing_indicator();
        }
    }

    fn remove_typing_indicator(&mut self) {
        if !self.typing {
            return;
        }
        self.typing = false;
        if let Some(echo) = self.echo.as_mut() {
            echo.remove_typing_indicator();
        }
    }

    fn begin_streaming_bot_message(&mut self) -> StreamHandle {
        let id = self.push(Turn::new("", Sender::Bot), String::new(), true);
        let echo = self
            .echo
            .as_mut()
            .map(|echo| echo.begin_streaming_bot_message());
        if let Some(bubble) = self.bubbles.last_mut() {
            bubble.echo = echo;
        }
        StreamHandle(id)
    }

    fn append_stream_fragment(&mut self, handle: StreamHandle, fragment: &str) {
        let Some(bubble) = self
            .bubbles
            .iter_mut()
            .find(|bubble| bubble.id == handle.0 && bubble.streaming)
        else {
            return;
        };
        bubble.turn.text.push_str(fragment);
        bubble.markup = newlines_to_breaks(&bubble.turn.text);
        if let (Some(echo), Some(echo_handle)) = (self.echo.as_mut(), bubble.echo) {
            echo.append_stream_fragment(echo_handle, fragment);
        }
    }

    fn finish_stream(&mut self, handle: StreamHandle) {
        let Some(bubble) = self
            .bubbles
            .iter_mut()
            .find(|bubble| bubble.id == handle.0 && bubble.streaming)
        else {
            return;
        };
        bubble.streaming = false;
        if let (Some(echo), Some(echo_handle)) = (self.echo.as_mut(), bubble.echo) {
            echo.finish_stream(echo_handle);
        }
    }
}

impl Controls for ChatView {
    fn input_text(&self) -> String {
        self.input.text.clone()
    }

    fn set_input_text(&mut self, text: &str) {
        self.input.text = text.to_string();
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        self.input.enabled = enabled;
    }

    fn set_examples_enabled(&mut self, enabled: bool) {
        self.examples.set_enabled(enabled);
    }

    fn example_label(&self, index: usize) -> Option<String> {
        self.examples
            .items
            .get(index)
            .map(|example| example.label.clone())
    }

    fn highlight_example(&mut self, index: usize) {
        self.examples.highlight(index);
    }

    fn clear_example_highlight(&mut self) {
        self.examples.highlight(usize::MAX);
    }

    fn active_tab_label(&self) -> Option<String> {
        self.tabs.active_label().map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_view_has_maths_active() {
        let view = ChatView::new();
        assert_eq!(view.tabs().active_label(), Some("Mathematics"));
        assert_eq!(view.examples().items().len(), 5);
        assert!(view.input().enabled);
        assert!(view.bubbles().is_empty());
    }

    #[test]
    fn tab_selection_keeps_one_active() {
        let mut tabs = TabBar::for_subjects(Subject::Maths);
        assert!(tabs.select(2));
        assert_eq!(tabs.active_label(), Some("Chemistry"));
        assert_eq!(tabs.tabs().iter().filter(|tab| tab.active).count(), 1);
        assert!(!tabs.select(7));
        assert_eq!(tabs.active_label(), Some("Chemistry"));
        assert!(tabs.select_label("phys"));
        assert_eq!(tabs.active_label(), Some("Physics"));
        assert!(!tabs.select_label("biology"));
        assert_eq!(tabs.tabs().iter().filter(|tab| tab.active).count(), 1);
    }

    #[test]
    fn bot_messages_use_markup_rules() {
        let mut view = ChatView::new();
        view.append_message("<p>Answer</p>", Sender::Bot);
        view.append_message("Line1\nLine2", Sender::Bot);
        view.append_message("a\nb", Sender::User);
        assert_eq!(view.bubbles()[0].markup(), "<p>Answer</p>");
        assert_eq!(view.bubbles()[1].markup(), "Line1<br>Line2");
        assert_eq!(view.bubbles()[1].text(), "Line1\nLine2");
        assert_eq!(view.bubbles()[2].markup(), "a\nb");
    }

    #[test]
    fn streamed_bubble_is_plain_text() {
        let mut view = ChatView::new();
        let handle = view.begin_streaming_bot_message();
        view.append_stream_fragment(handle, "<b>not</b>\n");
        view.append_stream_fragment(handle, "markup");
        let bubble = view.last().unwrap();
        assert!(bubble.is_streaming());
        assert_eq!(bubble.text(), "<b>not</b>\nmarkup");
        assert_eq!(bubble.markup(), "<b>not</b><br>markup");

        view.finish_stream(handle);
        view.append_stream_fragment(handle, "late");
        assert_eq!(view.last().unwrap().text(), "<b>not</b>\nmarkup");
        assert!(!view.last().unwrap().is_streaming());
    }

    #[test]
    fn typing_indicator_removal_is_idempotent() {
        let mut view = ChatView::new();
        view.remove_typing_indicator();
        assert!(!view.is_typing());
        view.show_typing_indicator();
        view.show_typing_indicator();
        assert!(view.is_typing());
        view.remove_typing_indicator();
        view.remove_typing_indicator();
        assert!(!view.is_typing());
        assert!(view.bubbles().is_empty());
    }

    #[test]
    fn example_controls() {
        let mut view = ChatView::for_subject(Subject::Physics);
        assert_eq!(
            view.example_label(0).as_deref(),
            Some("Why does a ball thrown upward come back down?")
        );
        assert_eq!(view.example_label(9), None);
        view.highlight_example(3);
        assert_eq!(view.examples().highlighted(), Some(3));
        view.set_examples_enabled(false);
        assert!(view.examples().items().iter().all(|item| !item.enabled));
        view.clear_example_highlight();
        assert_eq!(view.examples().highlighted(), None);
    }

    #[test]
    fn replacing_examples_keeps_disabled_state() {
        let mut view = ChatView::new();
        view.set_examples_enabled(false);
        view.examples_mut()
            .replace(Subject::Chemistry.sample_questions().iter().copied());
        assert!(view.examples().items().iter().all(|item| !item.enabled));
    }

    #[derive(Default)]
    struct Calls(std::sync::Arc<std::sync::Mutex<Vec<String>>>);

    impl Renderer for Calls {
        fn append_message(&mut self, text: &str, sender: Sender) {
            self.0.lock().unwrap().push(format!("{sender:?}: {text}"));
        }

        fn show_typing_indicator(&mut self) {
            self.0.lock().unwrap().push("typing".to_string());
        }

        fn remove_typing_indicator(&mut self) {
            self.0.lock().unwrap().push("untyping".to_string());
        }

        fn begin_streaming_bot_message(&mut self) -> StreamHandle {
            self.0.lock().unwrap().push("begin".to_string());
            StreamHandle(40)
        }

        fn append_stream_fragment(&mut self, handle: StreamHandle, fragment: &str) {
            self.0
                .lock()
                .unwrap()
                .push(format!("{}: {fragment}", handle.0));
        }

        fn finish_stream(&mut self, handle: StreamHandle) {
            self.0.lock().unwrap().push(format!("finish {}", handle.0));
        }
    }

    #[test]
    fn echo_mirrors_render_calls() {
        let calls = Calls::default();
        let log = calls.0.clone();
        let mut view = ChatView::new().with_echo(calls);
        view.append_message("hi", Sender::User);
        view.show_typing_indicator();
        view.remove_typing_indicator();
        view.remove_typing_indicator();
        let handle = view.begin_streaming_bot_message();
        view.append_stream_fragment(handle, "Hello");
        view.finish_stream(handle);
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "User: hi".to_string(),
                "typing".to_string(),
                "untyping".to_string(),
                "begin".to_string(),
                "40: Hello".to_string(),
                "finish 40".to_string(),
            ]
        );
    }
}
