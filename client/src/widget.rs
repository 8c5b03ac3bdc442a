use std::cell::RefCell;

use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::MouseEvent;

use crate::console;
use crate::leaderboard::{LeaderboardView, PODIUM_POSITIONS};
use crate::window::{Point, WindowState, px};

struct DocumentDragBinding {
    document: web_sys::Document,
    on_move: Closure<dyn Fn(MouseEvent)>,
    on_up: Closure<dyn Fn(MouseEvent)>,
}

impl DocumentDragBinding {
    fn detach(self) {
        let _ = self.document.remove_event_listener_with_callback(
            "mousemove",
            self.on_move.as_ref().unchecked_ref(),
        );
        let _ = self.document.remove_event_listener_with_callback(
            "mouseup",
            self.on_up.as_ref().unchecked_ref(),
        );
    }
}

thread_local! {
    static DRAG_BINDING: RefCell<Option<DocumentDragBinding>> = const { RefCell::new(None) };
}

fn detach_drag_listeners() {
    DRAG_BINDING.with(|slot| {
        if let Some(old) = slot.borrow_mut().take() {
            old.detach();
        }
    });
}

/// Document-level move/up listeners so a drag keeps tracking when the
/// pointer outruns the header.
fn attach_drag_listeners(window_state: RwSignal<WindowState>) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };

    detach_drag_listeners();

    let on_move = Closure::<dyn Fn(MouseEvent)>::new(move |e: MouseEvent| {
        if !window_state.with_untracked(|s| s.dragging) {
            return;
        }
        let pointer = Point::new(e.client_x() as f64, e.client_y() as f64);
        window_state.update(|s| {
            s.drag_to(pointer);
        });
    });

    let on_up = Closure::<dyn Fn(MouseEvent)>::new(move |_: MouseEvent| {
        if !window_state.with_untracked(|s| s.dragging) {
            return;
        }
        window_state.update(|s| {
            s.end_drag();
        });
        console::info("[Drag] End");
    });

    if document
        .add_event_listener_with_callback("mousemove", on_move.as_ref().unchecked_ref())
        .is_err()
        || document
            .add_event_listener_with_callback("mouseup", on_up.as_ref().unchecked_ref())
            .is_err()
    {
        console::warn("[Drag] Could not attach document listeners");
    }

    DRAG_BINDING.with(|slot| {
        *slot.borrow_mut() = Some(DocumentDragBinding {
            document,
            on_move,
            on_up,
        });
    });
}

fn pressed_on_controls(e: &MouseEvent) -> bool {
    e.target()
        .and_then(|target| target.dyn_into::<web_sys::Element>().ok())
        .and_then(|el| el.closest(".stream-controls").ok().flatten())
        .is_some()
}

#[component]
fn PodiumSeatView(board: LeaderboardView, index: usize) -> impl IntoView {
    let position = PODIUM_POSITIONS[index];
    view! {
        <div class=format!("podium-seat {position}")>
            <div class="rank">{index + 1}</div>
            <div class="user">{move || board.podium.with(|seats| seats[index].username.clone())}</div>
            <div class="wager">{move || board.podium.with(|seats| seats[index].wager.clone())}</div>
        </div>
    }
}

/// Floating leaderboard window: header with controls, countdown, podium and list.
#[component]
pub fn LeaderboardWidget(
    board: LeaderboardView,
    countdown: Signal<String>,
    window_state: RwSignal<WindowState>,
) -> impl IntoView {
    let container_ref = NodeRef::<leptos::html::Div>::new();

    Effect::new(move || {
        attach_drag_listeners(window_state);
        on_cleanup(detach_drag_listeners);
    });

    let on_minimize = move |e: MouseEvent| {
        e.stop_propagation();
        window_state.update(|s| {
            s.toggle_minimize();
        });
        let minimized = window_state.with_untracked(|s| s.minimized);
        console::info(&format!("[Window] Minimized: {minimized}"));
    };

    let on_maximize = move |e: MouseEvent| {
        e.stop_propagation();
        window_state.update(|s| {
            s.toggle_maximize();
        });
        let maximized = window_state.with_untracked(|s| s.maximized);
        console::info(&format!("[Window] Maximized: {maximized}"));
    };

    let on_close = move |e: MouseEvent| {
        e.stop_propagation();
        window_state.update(WindowState::close);
        console::info("[Window] Closed");
    };

    let on_header_mousedown = move |e: MouseEvent| {
        if pressed_on_controls(&e) {
            return;
        }
        let Some(container) = container_ref.get_untracked() else {
            return;
        };
        let rect = container.get_bounding_client_rect();
        let pointer = Point::new(e.client_x() as f64, e.client_y() as f64);
        window_state.update(|s| s.begin_drag(pointer, Point::new(rect.x(), rect.y())));
        console::info("[Drag] Start");
    };

    let anchored = move || window_state.with(|s| s.is_top_left_anchored());
    let edge = move || if anchored() { "auto" } else { "" };

    view! {
        <div
            id="stream-floating"
            node_ref=container_ref
            class:minimized=move || window_state.with(|s| s.minimized)
            class:maximized=move || window_state.with(|s| s.maximized)
            class:dragging=move || window_state.with(|s| s.dragging)
            style:display=move || if window_state.with(|s| s.closed) { "none" } else { "" }
            style:top=move || px(window_state.with(|s| s.position.map(|p| p.y)))
            style:left=move || px(window_state.with(|s| s.position.map(|p| p.x)))
            style:bottom=edge
            style:right=edge
        >
            <div class="stream-header" on:mousedown=on_header_mousedown>
                <span class="stream-title">"Wager Race"</span>
                <div class="stream-controls">
                    <button id="minimizeBtn" title="Minimize" on:click=on_minimize>"_"</button>
                    <button id="maximizeBtn" title="Maximize" on:click=on_maximize>"□"</button>
                    <button id="closeBtn" title="Close" on:click=on_close>"×"</button>
                </div>
            </div>
            <div class="stream-body">
                <div id="countdown">{move || countdown.get()}</div>
                <div class="podium">
                    <PodiumSeatView board=board index=1 />
                    <PodiumSeatView board=board index=0 />
                    <PodiumSeatView board=board index=2 />
                </div>
                <ul id="others-list">
                    {move || {
                        board
                            .rows
                            .get()
                            .into_iter()
                            .map(|row| {
                                view! {
                                    <li>
                                        <div class="position">{row.rank}</div>
                                        <div class="username">{row.username}</div>
                                        <div class="label emphasized">"Wagered"</div>
                                        <div class="wager">{row.wager}</div>
                                        <div class="label emphasized">"Prize"</div>
                                        <div class="prize">{row.prize.unwrap_or_default()}</div>
                                    </li>
                                }
                            })
                            .collect_view()
                    }}
                </ul>
            </div>
        </div>
    }
}
