//! Dashboard store and command reducer.
//!
//! One explicitly constructed [`DashboardStore`] is shared (by cheap clone)
//! between the chat engine and every UI surface. State changes only through
//! [`DashboardStore::dispatch`], which runs the pure [`reduce`] function and
//! notifies listeners synchronously.

use std::cell::RefCell;
use std::rc::Rc;
use chrono::NaiveDate;
use shopdash_types::{
    command::DashboardCommand,
    dashboard::{DashboardState, DateRange, FocusedSku},
};
use crate::ports::ClockPort;

/// Result of reducing one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reduction {
    Updated(DashboardState),
    /// State untouched; data consumers should refetch
    Refresh { force: bool },
    Unchanged,
    /// Command kind not understood
    Ignored,
}

/// Apply `command` to `state`. `today` anchors relative day ranges.
pub fn reduce(state: &DashboardState, command: &DashboardCommand, today: NaiveDate) -> Reduction {
    let mut next = state.clone();

    match command {
        DashboardCommand::SetDateRange(p) => {
            if let Some(days) = p.days {
                next.date_range = DateRange::last_days(today, days);
            } else if let (Some(start), Some(end)) = (p.start_date, p.end_date) {
                next.date_range = DateRange::new(start, end);
            }
        }
        DashboardCommand::SetMetricAndChart(p) => {
            if let Some(metric) = p.metric {
                next.metric = metric;
            }
            if let Some(chart) = p.chart {
                next.chart = chart;
            }
            if let Some(days) = p.days {
                next.date_range = DateRange::last_days(today, days);
            }
        }
        DashboardCommand::FocusSku(p) => {
            next.focus = if p.sku.is_none() && p.product_id.is_none() {
                None
            } else {
                Some(FocusedSku {
                    sku: p.sku.clone(),
                    product_id: p.product_id,
                })
            };
        }
        DashboardCommand::CompareShops(p) => {
            if let Some(ids) = &p.shop_ids {
                next.selected_shops = ids.clone();
            }
            if let Some(metric) = p.compare_metric {
                next.metric = metric;
            }
        }
        DashboardCommand::RefreshData(p) => return Reduction::Refresh { force: p.force },
        DashboardCommand::Unknown { .. } => return Reduction::Ignored,
    }

    if next == *state {
        Reduction::Unchanged
    } else {
        Reduction::Updated(next)
    }
}

/// Broadcast to data-fetching consumers by `RefreshData`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSignal {
    /// Monotonic, starting at 1
    pub seq: u64,
    pub force: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Updated,
    Unchanged,
    Refreshed(RefreshSignal),
    Ignored,
}

impl DispatchOutcome {
    /// Whether the command did something observable
    pub fn took_effect(&self) -> bool {
        !matches!(self, DispatchOutcome::Ignored)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type StateListener = Rc<dyn Fn(&DashboardState)>;
type RefreshListener = Rc<dyn Fn(RefreshSignal)>;

struct StoreInner {
    state: DashboardState,
    listeners: Vec<(SubscriptionId, StateListener)>,
    refresh_listeners: Vec<(SubscriptionId, RefreshListener)>,
    next_id: u64,
    last_refresh: Option<RefreshSignal>,
}

/// Shared dashboard state, clone-cheap via Rc.
#[derive(Clone)]
pub struct DashboardStore {
    inner: Rc<RefCell<StoreInner>>,
    clock: Rc<dyn ClockPort>,
}

impl DashboardStore {
    /// Store with default state anchored at the clock's current date.
    pub fn new(clock: Rc<dyn ClockPort>) -> Self {
        let state = DashboardState::initial(clock.today());
        Self::with_state(state, clock)
    }

    pub fn with_state(state: DashboardState, clock: Rc<dyn ClockPort>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(StoreInner {
                state,
                listeners: Vec::new(),
                refresh_listeners: Vec::new(),
                next_id: 0,
                last_refresh: None,
            })),
            clock,
        }
    }

    pub fn snapshot(&self) -> DashboardState {
        self.inner.borrow().state.clone()
    }

    /// Apply a command. Listeners run before this returns.
    pub fn dispatch(&self, command: &DashboardCommand) -> DispatchOutcome {
        let today = self.clock.today();
        let reduction = reduce(&self.inner.borrow().state, command, today);

        match reduction {
            Reduction::Updated(next) => {
                log::debug!("Dashboard command {} applied", command.kind());
                let listeners: Vec<StateListener> = {
                    let mut inner = self.inner.borrow_mut();
                    inner.state = next.clone();
                    inner.listeners.iter().map(|(_, l)| l.clone()).collect()
                };
                for listener in listeners {
                    listener(&next);
                }
                DispatchOutcome::Updated
            }
            Reduction::Unchanged => DispatchOutcome::Unchanged,
            Reduction::Refresh { force } => {
                let (signal, listeners) = {
                    let mut inner = self.inner.borrow_mut();
                    let seq = inner.last_refresh.map_or(1, |s| s.seq + 1);
                    let signal = RefreshSignal { seq, force };
                    inner.last_refresh = Some(signal);
                    let listeners: Vec<RefreshListener> =
                        inner.refresh_listeners.iter().map(|(_, l)| l.clone()).collect();
                    (signal, listeners)
                };
                log::info!("Dashboard refresh requested (force: {})", force);
                for listener in listeners {
                    listener(signal);
                }
                DispatchOutcome::Refreshed(signal)
            }
            Reduction::Ignored => {
                log::warn!("Ignoring unrecognized dashboard command: {}", command.kind());
                DispatchOutcome::Ignored
            }
        }
    }

    /// Call `listener` with the new state after every change.
    pub fn subscribe(&self, listener: impl Fn(&DashboardState) + 'static) -> SubscriptionId {
        let mut inner = self.inner.borrow_mut();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner.listeners.push((id, Rc::new(listener)));
        id
    }

    /// Call `listener` on every refresh signal.
    pub fn on_refresh(&self, listener: impl Fn(RefreshSignal) + 'static) -> SubscriptionId {
        let mut inner = self.inner.borrow_mut();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner.refresh_listeners.push((id, Rc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.listeners.len() + inner.refresh_listeners.len();
        inner.listeners.retain(|(sid, _)| *sid != id);
        inner.refresh_listeners.retain(|(sid, _)| *sid != id);
        before != inner.listeners.len() + inner.refresh_listeners.len()
    }

    /// Latest refresh signal, for consumers that poll instead of subscribing.
    pub fn last_refresh(&self) -> Option<RefreshSignal> {
        self.inner.borrow().last_refresh
    }

    /// Number of refreshes requested so far.
    pub fn refresh_seq(&self) -> u64 {
        self.last_refresh().map_or(0, |signal| signal.seq)
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }
}
