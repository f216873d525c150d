//! Event descriptor compilation.
//!
//! A view definition declares its event reactions as a compact map from a
//! descriptor key to a handler reference. The key grammar is:
//!
//! ```text
//! key    := eventName ['@' phase [':' scope]] [' ' target]
//! phase  := "init" | "show"            (default: "init")
//! scope  := "local" | "global"         (default: "global"; app events only)
//! target := "window" | "document" | "" | css selector
//! ```
//!
//! A key is DOM-bound when its event name is in the configured
//! [`DomEventSet`] or when a target was supplied. DOM-bound entries whose
//! target is the view root (`""`), `window`, or `document` go to the
//! phase's `delegate` list; entries scoped to a descendant selector go to
//! its `bind` list. Everything else is an application-level event routed
//! to the phase's `global` or `local` list by the scope marker.
//!
//! Every key lands in exactly one output list, in first-seen order. The
//! reserved [`INIT_HOOK`] key is pulled out of the tables entirely and
//! invoked once per instance at construction.

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::handler::HandlerRef;

/// Reserved key invoked once, synchronously, after instance construction.
pub const INIT_HOOK: &str = "ns-init";

/// Lifecycle phase gating when an event binding becomes active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// First attachment.
    Init,
    /// Becoming visible.
    Show,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::Show => write!(f, "show"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Global,
    Local,
}

/// Event names treated as DOM UI events when they appear without a target.
///
/// The distinction between a bare DOM event and a bare application event is
/// table membership, not structure, so the table is injected into the
/// registry rather than hardcoded. [`DomEventSet::default`] covers the
/// common UI event names; extend or replace it for custom environments.
#[derive(Debug, Clone)]
pub struct DomEventSet {
    names: HashSet<String>,
}

impl Default for DomEventSet {
    fn default() -> Self {
        const COMMON: &[&str] = &[
            "blur",
            "change",
            "click",
            "dblclick",
            "focus",
            "focusin",
            "focusout",
            "input",
            "keydown",
            "keypress",
            "keyup",
            "mousedown",
            "mouseenter",
            "mouseleave",
            "mousemove",
            "mouseout",
            "mouseover",
            "mouseup",
            "resize",
            "scroll",
            "submit",
            "touchend",
            "touchmove",
            "touchstart",
            "wheel",
        ];
        Self {
            names: COMMON.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl DomEventSet {
    /// An empty set: every bare name becomes an application event.
    pub fn empty() -> Self {
        Self {
            names: HashSet::new(),
        }
    }

    /// Add a recognized event name.
    pub fn insert(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    /// Add several recognized event names.
    pub fn extend<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(names.into_iter().map(Into::into));
    }

    /// Whether `name` is a recognized DOM event name.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

/// A DOM-bound event entry: `(event, target, handler)`.
#[derive(Debug, Clone)]
pub struct DomEventSpec {
    pub event: String,
    pub target: String,
    pub handler: HandlerRef,
}

/// An application-level event entry: `(event, handler)`.
#[derive(Debug, Clone)]
pub struct AppEventSpec {
    pub event: String,
    pub handler: HandlerRef,
}

/// DOM event lists for one phase.
#[derive(Debug, Clone, Default)]
pub struct DomEvents {
    /// Events attached to the view root, `window`, or `document`.
    pub delegate: Vec<DomEventSpec>,
    /// Events scoped to descendant elements located by a selector.
    pub bind: Vec<DomEventSpec>,
}

/// Application event lists for one phase.
#[derive(Debug, Clone, Default)]
pub struct AppEvents {
    /// Events broadcast application-wide.
    pub global: Vec<AppEventSpec>,
    /// Events scoped to the view instance.
    pub local: Vec<AppEventSpec>,
}

/// The compiled output of one raw event map.
#[derive(Debug, Clone, Default)]
pub(crate) struct EventTables {
    pub init_events: DomEvents,
    pub show_events: DomEvents,
    pub init_noevents: AppEvents,
    pub show_noevents: AppEvents,
    pub init_hook: Option<HandlerRef>,
}

/// Compile a raw event map into phase-scoped lookup tables.
pub(crate) fn compile(
    raw: &[(String, HandlerRef)],
    dom_events: &DomEventSet,
) -> Result<EventTables> {
    let mut tables = EventTables::default();
    for (key, handler) in raw {
        if key == INIT_HOOK {
            tables.init_hook = Some(handler.clone());
            continue;
        }
        route(&mut tables, key, handler.clone(), dom_events)?;
    }
    Ok(tables)
}

struct ParsedKey<'a> {
    event: &'a str,
    phase: Phase,
    scope: Option<Scope>,
    target: Option<&'a str>,
}

fn parse_key(key: &str) -> Result<ParsedKey<'_>> {
    let (head, target) = match key.split_once(' ') {
        Some((head, target)) => (head, Some(target)),
        None => (key, None),
    };

    let (event, phase, scope) = match head.split_once('@') {
        Some((event, suffix)) => {
            let (phase_str, scope_str) = match suffix.split_once(':') {
                Some((phase, scope)) => (phase, Some(scope)),
                None => (suffix, None),
            };
            let phase = match phase_str {
                "init" => Phase::Init,
                "show" => Phase::Show,
                other => {
                    return Err(Error::invalid_event_key(
                        key,
                        format!("unknown phase '{other}'"),
                    ));
                }
            };
            let scope = match scope_str {
                None => None,
                Some("global") => Some(Scope::Global),
                Some("local") => Some(Scope::Local),
                Some(other) => {
                    return Err(Error::invalid_event_key(
                        key,
                        format!("unknown scope '{other}'"),
                    ));
                }
            };
            (event, phase, scope)
        }
        None => (head, Phase::Init, None),
    };

    if event.is_empty() {
        return Err(Error::invalid_event_key(key, "empty event name"));
    }

    Ok(ParsedKey {
        event,
        phase,
        scope,
        target,
    })
}

fn route(
    tables: &mut EventTables,
    key: &str,
    handler: HandlerRef,
    dom_events: &DomEventSet,
) -> Result<()> {
    let parsed = parse_key(key)?;

    let dom_bound = dom_events.contains(parsed.event) || parsed.target.is_some();
    if dom_bound {
        if parsed.scope.is_some() {
            return Err(Error::invalid_event_key(
                key,
                "scope markers apply to application events only",
            ));
        }
        let target = parsed.target.unwrap_or("");
        let entry = DomEventSpec {
            event: parsed.event.to_owned(),
            target: target.to_owned(),
            handler,
        };
        let phase_events = match parsed.phase {
            Phase::Init => &mut tables.init_events,
            Phase::Show => &mut tables.show_events,
        };
        match target {
            "" | "window" | "document" => phase_events.delegate.push(entry),
            _ => phase_events.bind.push(entry),
        }
    } else {
        let entry = AppEventSpec {
            event: parsed.event.to_owned(),
            handler,
        };
        let phase_noevents = match parsed.phase {
            Phase::Init => &mut tables.init_noevents,
            Phase::Show => &mut tables.show_noevents,
        };
        match parsed.scope.unwrap_or(Scope::Global) {
            Scope::Global => phase_noevents.global.push(entry),
            Scope::Local => phase_noevents.local.push(entry),
        }
    }
    Ok(())
}
