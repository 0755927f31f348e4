//! Counter-timer switch controller.
//!
//! Counts seconds while armed and drives a set of switches when the count
//! reaches `threshold_seconds`:
//!
//! ```text
//!         [arm M-code]                    [elapsed >= threshold]
//!  NONE ───────────────▶ BELOW_THRESHOLD ───────────────────────▶ THRESHOLD
//!   ▲                        ▲                                        │
//!   │                        └──── multishot level: restart ──────────┤
//!   └──────────── singleshot / disarm M-code ─────────────────────────┘
//! ```
//!
//! A timer without an arm M-code is armed for life and starts counting at
//! construction.

use heapless::Vec;
use log::{error, info, warn};

use crate::actuation::{
    ActuationPolicy, Arming, MAX_SWITCHES, Repeat, SwitchBinding, ThresholdState, TriggerMode,
};
use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, PanelPort, SwitchRegistry};
use crate::config::CounterTimerConfig;
use crate::error::{ConfigError, Result};
use crate::timer::{CounterKind, TimerBank, TimerKey};

const MODULE: &str = "timercounter";

pub struct CounterTimer {
    name: String,
    arming: Arming,
    policy: ActuationPolicy,
    threshold_seconds: f32,
    menu: Option<String>,
    state: ThresholdState,
    timers: TimerBank,
    counter: TimerKey,
}

impl CounterTimer {
    /// Build a timer from its configuration section.
    ///
    /// Fails when the timer is disabled, has no switch, or has more than
    /// [`MAX_SWITCHES`] switches.
    pub fn from_config(cfg: &CounterTimerConfig) -> Result<Self> {
        if !cfg.enable {
            return Err(ConfigError::Disabled { module: MODULE }.into());
        }
        if cfg.switches.is_empty() {
            let err = ConfigError::Missing {
                module: MODULE,
                key: "switch",
            };
            error!("*ERROR* {err} ({})", cfg.name);
            return Err(err.into());
        }

        let mut bindings: Vec<SwitchBinding, MAX_SWITCHES> = Vec::new();
        for s in &cfg.switches {
            let binding = SwitchBinding {
                name: s.name.clone(),
                on_trigger: s.on_trigger,
            };
            if bindings.push(binding).is_err() {
                let err = ConfigError::Invalid {
                    module: MODULE,
                    key: "switch",
                };
                error!("*ERROR* {err}: {} has more than {MAX_SWITCHES}", cfg.name);
                return Err(err.into());
            }
        }

        let (timers, [counter]) =
            TimerBank::with_counters([("counter", CounterKind::Interlock, None)]);
        let mut timer = Self {
            name: cfg.name.clone(),
            arming: Arming::new(cfg.arm_mcode, cfg.disarm_mcode),
            policy: ActuationPolicy::new(
                TriggerMode::from_config(&cfg.trigger),
                Repeat::from_config(&cfg.kind),
                cfg.inverted,
                bindings,
            ),
            threshold_seconds: cfg.threshold_seconds,
            menu: (!cfg.menu.trim().is_empty()).then(|| cfg.menu.clone()),
            state: ThresholdState::None,
            timers,
            counter,
        };
        if !timer.arming.is_explicit() {
            timer.restart();
        }
        info!(
            "{MODULE} {}: {} switch(es), threshold {}s, {:?}/{:?}",
            timer.name,
            timer.policy.bindings().len(),
            timer.threshold_seconds,
            timer.policy.trigger(),
            timer.policy.repeat()
        );
        Ok(timer)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ThresholdState {
        self.state
    }

    pub fn is_armed(&self) -> bool {
        self.arming.is_armed()
    }

    pub fn elapsed(&self) -> u32 {
        self.timers.elapsed(self.counter)
    }

    pub fn threshold_seconds(&self) -> f32 {
        self.threshold_seconds
    }

    // ── Commands ──────────────────────────────────────────────

    /// Handle an M-code.  Returns the console reply when the code is ours.
    pub fn on_mcode(&mut self, code: u16, sink: &mut impl EventSink) -> Option<String> {
        if self.arming.arm_code() == Some(code) {
            self.arming.arm();
            self.restart();
            sink.emit(&AppEvent::Armed {
                timer: self.name.clone(),
            });
            return Some(format!("{MODULE} {} armed", self.name));
        }
        if self.arming.disarm_code() == Some(code) {
            if !self.arming.disarm() && !self.arming.is_explicit() {
                warn!("{MODULE} {}: always armed, M{code} ignored", self.name);
                return None;
            }
            self.state = ThresholdState::None;
            self.timers.request_stop(self.counter);
            sink.emit(&AppEvent::Disarmed {
                timer: self.name.clone(),
            });
            return Some(format!("{MODULE} {} disarmed", self.name));
        }
        None
    }

    // ── Ticks ─────────────────────────────────────────────────

    /// Count one second and act on the threshold comparison.
    pub fn second_tick(
        &mut self,
        switches: &mut impl SwitchRegistry,
        panel: &mut impl PanelPort,
        sink: &mut impl EventSink,
    ) {
        if !self.arming.is_armed() || self.state == ThresholdState::None {
            return;
        }

        self.timers.tick();
        let to = if self.elapsed() as f32 >= self.threshold_seconds {
            ThresholdState::Threshold
        } else {
            ThresholdState::BelowThreshold
        };
        let from = self.state;

        // Errors are logged by the policy; the state stays as it was.
        let Ok(act) = self.policy.apply(from, to, &mut self.arming, switches) else {
            return;
        };

        self.state = act.next;
        if act.restart_counter {
            self.timers.request_start(self.counter);
        }
        if from != to && to == ThresholdState::Threshold {
            info!("{MODULE} {} triggered", self.name);
            sink.emit(&AppEvent::Triggered {
                timer: self.name.clone(),
            });
        }
        if act.disarmed {
            sink.emit(&AppEvent::Disarmed {
                timer: self.name.clone(),
            });
        }
        if act.notify {
            if let Some(menu) = &self.menu {
                panel.show_menu(menu);
            }
        }
    }

    /// One status line for the console.
    pub fn status_line(&self) -> String {
        format!(
            "{MODULE} {}: state {} armed {} elapsed {}/{}",
            self.name,
            self.state.name(),
            self.is_armed(),
            self.elapsed(),
            self.threshold_seconds
        )
    }

    fn restart(&mut self) {
        self.state = ThresholdState::BelowThreshold;
        self.timers.request_start(self.counter);
    }
}
