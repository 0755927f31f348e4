//! Counter-timer switch controllers driven through the controller.

use cnc_interlock::actuation::ThresholdState;
use cnc_interlock::app::Controller;
use cnc_interlock::app::events::AppEvent;
use cnc_interlock::config::{ControllerConfig, CounterTimerConfig, SwitchBindingConfig};
use cnc_interlock::menu::Screen;

use crate::mock_hw::{MockBoard, MockCommands, MockSwitches, RecordingSink};

const DONE_MENU: &str = "/sd/menu/main/done";

fn timer(trigger: &str, kind: &str, threshold: f32) -> CounterTimerConfig {
    CounterTimerConfig {
        name: "spindle".into(),
        enable: true,
        switches: vec![SwitchBindingConfig {
            name: "spindle".into(),
            on_trigger: true,
        }],
        threshold_seconds: threshold,
        kind: kind.into(),
        trigger: trigger.into(),
        ..CounterTimerConfig::default()
    }
}

struct Rig {
    controller: Controller,
    switches: MockSwitches,
    commands: MockCommands,
    sink: RecordingSink,
}

impl Rig {
    fn new(timers: Vec<CounterTimerConfig>) -> Self {
        let cfg = ControllerConfig {
            counter_timers: timers,
            ..ControllerConfig::default()
        };
        Self {
            controller: Controller::from_config(&cfg, &MockBoard::new()),
            switches: MockSwitches::default(),
            commands: MockCommands::default(),
            sink: RecordingSink::default(),
        }
    }

    fn seconds(&mut self, n: usize) {
        for _ in 0..n {
            self.controller
                .second_tick(&mut self.switches, &mut self.commands, &mut self.sink);
        }
    }

    fn line(&mut self, line: &str) -> Vec<String> {
        self.controller.handle_line(line, &mut self.sink)
    }

    fn triggers(&self) -> usize {
        self.sink
            .count(|e| matches!(e, AppEvent::Triggered { .. }))
    }

    fn state(&self) -> ThresholdState {
        self.controller.counter_timers()[0].state()
    }
}

fn on(name: &str, level: bool) -> (String, bool) {
    (name.to_string(), level)
}

#[test]
fn level_multishot_keeps_the_switch_on_and_fires_every_period() {
    let mut rig = Rig::new(vec![timer("level", "multishot", 3.0)]);

    rig.seconds(2);
    assert!(rig.switches.history.is_empty());

    rig.seconds(1);
    assert_eq!(rig.switches.history, vec![on("spindle", true)]);
    assert_eq!(rig.state(), ThresholdState::BelowThreshold);
    assert_eq!(rig.triggers(), 1);

    rig.seconds(7);
    assert_eq!(rig.switches.history, vec![on("spindle", true)]);
    assert_eq!(rig.triggers(), 3);
}

#[test]
fn rising_singleshot_fires_once_per_arm_and_shows_menu() {
    let mut t = timer("rising", "singleshot", 2.0);
    t.arm_mcode = 1100;
    t.disarm_mcode = 1101;
    t.menu = DONE_MENU.into();
    let mut rig = Rig::new(vec![t]);

    rig.seconds(5);
    assert!(rig.switches.history.is_empty());
    assert_eq!(rig.state(), ThresholdState::None);

    assert_eq!(rig.line("M1100"), vec!["timercounter spindle armed"]);
    rig.seconds(2);
    assert_eq!(rig.switches.history, vec![on("spindle", true)]);
    assert_eq!(rig.state(), ThresholdState::None);
    assert!(!rig.controller.counter_timers()[0].is_armed());

    let nav = rig.controller.navigator();
    assert_eq!(nav.screen(), Screen::Menu);
    assert_eq!(nav.cursor().current_path, DONE_MENU);

    rig.seconds(5);
    assert_eq!(rig.switches.history.len(), 1);

    // Re-armed: the switch already reads on, so nothing is written.
    rig.line("M1100");
    rig.seconds(2);
    assert_eq!(rig.switches.history.len(), 1);
    assert_eq!(rig.triggers(), 2);
}

#[test]
fn inverted_level_drives_the_opposite_state() {
    let mut t = timer("level", "multishot", 2.0);
    t.inverted = true;
    let mut rig = Rig::new(vec![t]);
    rig.switches.states.insert("spindle".into(), true);

    rig.seconds(2);
    assert_eq!(rig.switches.history, vec![on("spindle", false)]);
    assert_eq!(rig.triggers(), 1);

    // Firing again finds the switch already off.
    rig.seconds(2);
    assert_eq!(rig.switches.history.len(), 1);
    assert_eq!(rig.triggers(), 2);
}

#[test]
fn switch_write_failure_keeps_the_state() {
    let mut rig = Rig::new(vec![timer("level", "multishot", 2.0)]);
    rig.switches.refuse_writes = true;

    rig.seconds(4);
    assert_eq!(rig.state(), ThresholdState::BelowThreshold);
    assert_eq!(rig.triggers(), 0);
    assert_eq!(rig.controller.counter_timers()[0].elapsed(), 4);

    rig.switches.refuse_writes = false;
    rig.seconds(1);
    assert_eq!(rig.switches.history, vec![on("spindle", true)]);
    assert_eq!(rig.triggers(), 1);
}

#[test]
fn disarm_stops_the_count() {
    let mut t = timer("level", "multishot", 3.0);
    t.arm_mcode = 1100;
    t.disarm_mcode = 1101;
    let mut rig = Rig::new(vec![t]);

    rig.line("M1100");
    rig.seconds(1);
    assert_eq!(rig.line("M1101"), vec!["timercounter spindle disarmed"]);
    assert_eq!(rig.state(), ThresholdState::None);

    rig.seconds(5);
    assert!(rig.switches.history.is_empty());
    assert!(rig.sink.events.contains(&AppEvent::Disarmed {
        timer: "spindle".into()
    }));
}

#[test]
fn always_armed_timer_ignores_disarm() {
    let mut t = timer("level", "multishot", 3.0);
    t.disarm_mcode = 1101;
    let mut rig = Rig::new(vec![t]);

    assert!(rig.line("M1101").is_empty());
    rig.seconds(3);
    assert_eq!(rig.switches.history, vec![on("spindle", true)]);
}

#[test]
fn invalid_timers_are_left_out() {
    let mut no_switch = timer("level", "multishot", 3.0);
    no_switch.switches.clear();
    let mut disabled = timer("level", "multishot", 3.0);
    disabled.enable = false;
    let mut too_many = timer("level", "multishot", 3.0);
    too_many.switches = (0..6)
        .map(|i| SwitchBindingConfig {
            name: format!("s{i}"),
            on_trigger: true,
        })
        .collect();

    let rig = Rig::new(vec![
        no_switch,
        disabled,
        too_many,
        timer("rising", "multishot", 3.0),
    ]);
    assert_eq!(rig.controller.counter_timers().len(), 1);
}

#[test]
fn status_lists_every_timer() {
    let mut rig = Rig::new(vec![timer("level", "multishot", 3.0)]);
    rig.seconds(1);
    let status = rig.controller.status();
    assert_eq!(status[0], "uptime 1s");
    assert!(status.contains(&"timercounter spindle: state BELOW armed true elapsed 1/3".to_string()));
}
