/*
 * Change notifications emitted by the application controller and the registry that
 * dispatches them. Listeners subscribe per event kind and are called synchronously,
 * in subscription order, after the controller has committed the change. Payloads
 * are owned snapshots, so a listener never needs to borrow the controller.
 */
use crate::core::{Options, TestCaseSummary, TestSuiteSummary};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AppEventKind {
    BaseUrlChanged,
    OptionsChanged,
    CurrentFormatChanging,
    CurrentFormatChanged,
    ClipboardFormatChanged,
    TestSuiteUnloaded,
    TestSuiteChanged,
    TestCaseUnloaded,
    TestCaseChanged,
}

impl AppEventKind {
    pub const ALL: [AppEventKind; 9] = [
        AppEventKind::BaseUrlChanged,
        AppEventKind::OptionsChanged,
        AppEventKind::CurrentFormatChanging,
        AppEventKind::CurrentFormatChanged,
        AppEventKind::ClipboardFormatChanged,
        AppEventKind::TestSuiteUnloaded,
        AppEventKind::TestSuiteChanged,
        AppEventKind::TestCaseUnloaded,
        AppEventKind::TestCaseChanged,
    ];

    // The name views know the notification by.
    pub fn name(self) -> &'static str {
        match self {
            AppEventKind::BaseUrlChanged => "baseURLChanged",
            AppEventKind::OptionsChanged => "optionsChanged",
            AppEventKind::CurrentFormatChanging => "currentFormatChanging",
            AppEventKind::CurrentFormatChanged => "currentFormatChanged",
            AppEventKind::ClipboardFormatChanged => "clipboardFormatChanged",
            AppEventKind::TestSuiteUnloaded => "testSuiteUnloaded",
            AppEventKind::TestSuiteChanged => "testSuiteChanged",
            AppEventKind::TestCaseUnloaded => "testCaseUnloaded",
            AppEventKind::TestCaseChanged => "testCaseChanged",
        }
    }

    pub fn from_name(name: &str) -> Option<AppEventKind> {
        AppEventKind::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    BaseUrlChanged { base_url: String },
    OptionsChanged { options: Options },
    // Carries the format that is about to be replaced.
    CurrentFormatChanging { format_id: String },
    CurrentFormatChanged { format_id: String },
    ClipboardFormatChanged { format_id: String },
    TestSuiteUnloaded(TestSuiteSummary),
    TestSuiteChanged(TestSuiteSummary),
    TestCaseUnloaded(TestCaseSummary),
    TestCaseChanged(TestCaseSummary),
}

impl AppEvent {
    pub fn kind(&self) -> AppEventKind {
        match self {
            AppEvent::BaseUrlChanged { .. } => AppEventKind::BaseUrlChanged,
            AppEvent::OptionsChanged { .. } => AppEventKind::OptionsChanged,
            AppEvent::CurrentFormatChanging { .. } => AppEventKind::CurrentFormatChanging,
            AppEvent::CurrentFormatChanged { .. } => AppEventKind::CurrentFormatChanged,
            AppEvent::ClipboardFormatChanged { .. } => AppEventKind::ClipboardFormatChanged,
            AppEvent::TestSuiteUnloaded(_) => AppEventKind::TestSuiteUnloaded,
            AppEvent::TestSuiteChanged(_) => AppEventKind::TestSuiteChanged,
            AppEvent::TestCaseUnloaded(_) => AppEventKind::TestCaseUnloaded,
            AppEvent::TestCaseChanged(_) => AppEventKind::TestCaseChanged,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Listener = Box<dyn FnMut(&AppEvent)>;

pub struct ObserverRegistry {
    listeners: BTreeMap<AppEventKind, Vec<(ObserverId, Listener)>>,
    next_observer_id: u64,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        ObserverRegistry {
            listeners: BTreeMap::new(),
            next_observer_id: 1,
        }
    }

    pub fn subscribe<F>(&mut self, kind: AppEventKind, listener: F) -> ObserverId
    where
        F: FnMut(&AppEvent) + 'static,
    {
        let id = ObserverId(self.next_observer_id);
        self.next_observer_id += 1;
        self.listeners
            .entry(kind)
            .or_default()
            .push((id, Box::new(listener)));
        log::trace!("ObserverRegistry: {id:?} subscribed to '{}'", kind.name());
        id
    }

    // Returns false when `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let mut removed = false;
        for listeners in self.listeners.values_mut() {
            let before = listeners.len();
            listeners.retain(|(listener_id, _)| *listener_id != id);
            removed |= listeners.len() != before;
        }
        removed
    }

    pub fn notify(&mut self, event: &AppEvent) {
        let kind = event.kind();
        log::trace!("ObserverRegistry: Notifying '{}'", kind.name());
        if let Some(listeners) = self.listeners.get_mut(&kind) {
            for (_, listener) in listeners.iter_mut() {
                listener(event);
            }
        }
    }

    pub fn listener_count(&self, kind: AppEventKind) -> usize {
        self.listeners.get(&kind).map_or(0, Vec::len)
    }
}

impl Default for ObserverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn base_url_event(url: &str) -> AppEvent {
        AppEvent::BaseUrlChanged {
            base_url: url.to_string(),
        }
    }

    #[test]
    fn test_notify_calls_listeners_in_subscription_order() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut registry = ObserverRegistry::new();
        for label in ["first", "second", "third"] {
            let calls = Rc::clone(&calls);
            registry.subscribe(AppEventKind::BaseUrlChanged, move |_| {
                calls.borrow_mut().push(label);
            });
        }

        registry.notify(&base_url_event("http://a"));

        assert_eq!(*calls.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_notify_only_reaches_matching_kind() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut registry = ObserverRegistry::new();
        let sink = Rc::clone(&calls);
        registry.subscribe(AppEventKind::OptionsChanged, move |event| {
            sink.borrow_mut().push(event.name());
        });

        registry.notify(&base_url_event("http://a"));
        registry.notify(&AppEvent::OptionsChanged {
            options: Options::empty(),
        });

        assert_eq!(*calls.borrow(), vec!["optionsChanged"]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let count = Rc::new(RefCell::new(0));
        let mut registry = ObserverRegistry::new();
        let sink = Rc::clone(&count);
        let id = registry.subscribe(AppEventKind::BaseUrlChanged, move |_| {
            *sink.borrow_mut() += 1;
        });

        registry.notify(&base_url_event("http://a"));
        assert!(registry.unsubscribe(id));
        assert!(!registry.unsubscribe(id));
        registry.notify(&base_url_event("http://b"));

        assert_eq!(*count.borrow(), 1);
        assert_eq!(registry.listener_count(AppEventKind::BaseUrlChanged), 0);
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in AppEventKind::ALL {
            assert_eq!(AppEventKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(AppEventKind::from_name("testCaseSaved"), None);
        assert_eq!(base_url_event("x").name(), "baseURLChanged");
    }
}
