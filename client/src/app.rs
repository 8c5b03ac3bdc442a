use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use wager_race_shared::{WAGER_RACE_END_MS, countdown_text};

use crate::console;
use crate::leaderboard::{self, FetchSequencer, LeaderboardView, POLL_INTERVAL_MS};
use crate::widget::LeaderboardWidget;
use crate::window::WindowState;

const COUNTDOWN_INTERVAL_MS: i32 = 1_000;

struct IntervalBinding {
    window: web_sys::Window,
    interval_id: i32,
    _callback: Closure<dyn Fn()>,
}

impl IntervalBinding {
    fn clear(self) {
        self.window.clear_interval_with_handle(self.interval_id);
    }
}

thread_local! {
    static COUNTDOWN_INTERVAL_BINDING: RefCell<Option<IntervalBinding>> = const { RefCell::new(None) };
    static POLL_INTERVAL_BINDING: RefCell<Option<IntervalBinding>> = const { RefCell::new(None) };
}

type BindingSlot = std::thread::LocalKey<RefCell<Option<IntervalBinding>>>;

/// Replace whatever interval lives in `slot` with `tick` every `timeout_ms`.
fn bind_interval(slot: &'static BindingSlot, timeout_ms: i32, tick: impl Fn() + 'static) {
    let Some(window) = web_sys::window() else {
        return;
    };

    slot.with(|slot| {
        if let Some(old) = slot.borrow_mut().take() {
            old.clear();
        }
    });

    let cb = Closure::<dyn Fn()>::new(tick);
    let Ok(interval_id) = window
        .set_interval_with_callback_and_timeout_and_arguments_0(cb.as_ref().unchecked_ref(), timeout_ms)
    else {
        console::warn(&format!("[Timer] Could not start {timeout_ms}ms interval"));
        return;
    };
    slot.with(|slot| {
        *slot.borrow_mut() = Some(IntervalBinding {
            window,
            interval_id,
            _callback: cb,
        });
    });
}

fn clear_interval(slot: &'static BindingSlot) {
    slot.with(|slot| {
        if let Some(old) = slot.borrow_mut().take() {
            old.clear();
        }
    });
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[component]
pub fn App() -> impl IntoView {
    let now = RwSignal::new(now_ms());
    let board = LeaderboardView::new();
    let window_state = RwSignal::new(WindowState::default());
    let sequencer = Rc::new(RefCell::new(FetchSequencer::default()));

    let countdown = Signal::derive(move || countdown_text(WAGER_RACE_END_MS, now.get()));

    // Countdown ticks every second; the first value is already in `now`.
    Effect::new(move || {
        bind_interval(&COUNTDOWN_INTERVAL_BINDING, COUNTDOWN_INTERVAL_MS, move || {
            now.set(now_ms());
        });
        on_cleanup(|| clear_interval(&COUNTDOWN_INTERVAL_BINDING));
    });

    // Poll immediately, then on every interval.
    Effect::new(move || {
        leaderboard::fetch_and_render(board, Rc::clone(&sequencer));
        let sequencer = Rc::clone(&sequencer);
        bind_interval(&POLL_INTERVAL_BINDING, POLL_INTERVAL_MS, move || {
            leaderboard::fetch_and_render(board, Rc::clone(&sequencer));
        });
        on_cleanup(|| clear_interval(&POLL_INTERVAL_BINDING));
    });

    view! {
        <LeaderboardWidget board=board countdown=countdown window_state=window_state />
    }
}
