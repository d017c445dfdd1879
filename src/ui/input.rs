/// Input state tracker.
///
/// Tracks which keys are currently held down so movement continues while a
/// key is held, and which were pressed this frame so `interact` fires once
/// per press (respawning or quitting must not repeat from a held key).
///
/// Terminals rarely report key releases, so a key counts as released after
/// a short quiet period without Press/Repeat events.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::sim::player::PlayerIntent;

/// After this duration without a Press/Repeat event, consider the key released.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

const LEFT: [KeyCode; 3] = [KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const RIGHT: [KeyCode; 3] = [KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const UP: [KeyCode; 3] = [KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const DOWN: [KeyCode; 3] = [KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const INTERACT: [KeyCode; 2] = [KeyCode::Char(' '), KeyCode::Enter];
const QUIT: [KeyCode; 3] = [KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,
    /// Keys that went from "not held" to "held" during the last drain.
    fresh_presses: Vec<KeyCode>,
    raw_events: Vec<KeyEvent>,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
        }
    }

    /// Drain all pending terminal events. Call once per frame, before the step.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.raw_events.push(key);
                if key.kind == KeyEventKind::Release {
                    continue;
                }
                let was_held = self.is_held(key.code);
                self.last_active.insert(key.code, Instant::now());
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active.get(&code).map_or(false, |t| t.elapsed() < HOLD_TIMEOUT)
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.fresh_presses.contains(c))
    }

    /// Controls for this frame.
    pub fn intent(&self) -> PlayerIntent {
        PlayerIntent {
            left: self.any_held(&LEFT),
            right: self.any_held(&RIGHT),
            up: self.any_held(&UP),
            down: self.any_held(&DOWN),
            interact: self.any_pressed(&INTERACT),
        }
    }

    /// Esc / q, or Ctrl+C.
    pub fn quit_requested(&self) -> bool {
        self.any_pressed(&QUIT)
            || self.raw_events.iter().any(|k| {
                k.modifiers.contains(KeyModifiers::CONTROL)
                    && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
            })
    }
}
