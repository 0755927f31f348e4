//! Water-jet cutter job lifecycle through the controller.

use cnc_interlock::app::Controller;
use cnc_interlock::app::events::AppEvent;
use cnc_interlock::config::{ControllerConfig, WaterJetConfig};
use cnc_interlock::error::LevelFault;
use cnc_interlock::escalation::RESUME_COMMAND;
use cnc_interlock::fsm::StateId;
use cnc_interlock::fsm::states::{PAUSE_SEQUENCE, RESUME_SEQUENCE};
use cnc_interlock::menu::Screen;

use crate::mock_hw::{MemCard, MockBoard, MockCommands, MockMachine, MockSwitches, RecordingSink};

const DOOR: &str = "P2.12";
const MIDDLE: &str = "P1.28";
const HIGH: &str = "P1.29";
const DUMP: &str = "P2.5";
const HIGH_PRESSURE: &str = "P1.22";
const LOW_MENU: &str = "/sd/menu/err/low";
const HIGH_MENU: &str = "/sd/menu/err/high";

struct Rig {
    controller: Controller,
    board: MockBoard,
    switches: MockSwitches,
    commands: MockCommands,
    sink: RecordingSink,
}

impl Rig {
    fn new() -> Self {
        let cfg = ControllerConfig {
            waterjetcutter: WaterJetConfig {
                enable: true,
                error_wl_low_menu: LOW_MENU.into(),
                error_wl_high_menu: HIGH_MENU.into(),
                error_clean_filters_menu: "/sd/menu/err/filters".into(),
                ..WaterJetConfig::default()
            },
            ..ControllerConfig::default()
        };
        let board = MockBoard::new();
        Self {
            controller: Controller::from_config(&cfg, &board),
            board,
            switches: MockSwitches::default(),
            commands: MockCommands::default(),
            sink: RecordingSink::default(),
        }
    }

    fn seconds(&mut self, n: usize) {
        for _ in 0..n {
            self.controller.poll_tick(&mut self.board);
            self.controller
                .second_tick(&mut self.switches, &mut self.commands, &mut self.sink);
            self.controller.main_loop(&mut self.board, &mut self.commands);
        }
    }

    fn line(&mut self, line: &str) -> Vec<String> {
        self.controller.handle_line(line, &mut self.sink)
    }

    fn state(&self) -> StateId {
        self.controller
            .water_jet()
            .map_or(StateId::Invalid, |jet| jet.state())
    }

    /// Enabled, door closed, job started.
    fn running(&mut self) {
        self.line("M1401");
        self.board.set(DOOR, true);
        self.controller.poll_tick(&mut self.board);
        assert_eq!(self.line("M1403"), vec!["waterjetcutter job started"]);
    }
}

#[test]
fn job_needs_enable_and_a_closed_door() {
    let mut rig = Rig::new();
    assert_eq!(
        rig.line("M1403"),
        vec!["waterjetcutter not active, send M1401 first"]
    );
    assert_eq!(rig.line("M1401"), vec!["waterjetcutter active"]);
    assert_eq!(rig.state(), StateId::Menu);

    rig.controller.poll_tick(&mut rig.board);
    assert_eq!(rig.line("M1403"), vec!["waterjetcutter door open, job refused"]);
    assert_eq!(rig.state(), StateId::Menu);

    rig.board.set(DOOR, true);
    rig.controller.poll_tick(&mut rig.board);
    assert_eq!(rig.line("M1403"), vec!["waterjetcutter job started"]);
    assert_eq!(rig.state(), StateId::Running);
}

#[test]
fn inactive_module_does_not_tick() {
    let mut rig = Rig::new();
    rig.seconds(30);
    assert_eq!(rig.state(), StateId::None);
    assert!(rig.commands.sent.is_empty());
}

#[test]
fn low_water_waits_for_fill_then_resumes() {
    let mut rig = Rig::new();
    rig.running();

    rig.seconds(1);
    assert_eq!(rig.state(), StateId::Watching);
    assert_eq!(rig.board.level(HIGH_PRESSURE), Some(true));

    rig.seconds(20);
    assert_eq!(rig.state(), StateId::WaitFill);
    assert_eq!(rig.commands.sent, vec!["M600"]);
    assert_eq!(rig.board.level(HIGH_PRESSURE), Some(false));
    assert!(rig.controller.water_jet().is_some_and(|j| j.is_paused()));
    assert!(rig.controller.is_suspended());
    assert_eq!(rig.controller.job_running(), Some(true));

    let nav = rig.controller.navigator();
    assert_eq!(nav.screen(), Screen::Menu);
    assert_eq!(nav.cursor().current_path, LOW_MENU);
    assert!(nav.leds().orange);

    // The menu is on screen, so waiting longer does not re-enter it.
    rig.seconds(30);
    assert_eq!(rig.commands.count("M600"), 1);
    assert_eq!(rig.state(), StateId::WaitFill);

    rig.board.set(MIDDLE, true);
    rig.seconds(1);
    assert_eq!(rig.state(), StateId::WaitFill);
    assert!(rig.sink.events.contains(&AppEvent::FaultsCleared {
        module: "waterjetcutter"
    }));

    assert_eq!(rig.line("resume"), vec!["resumed"]);
    assert!(!rig.controller.is_suspended());
    rig.seconds(1);
    assert_eq!(rig.state(), StateId::Resuming);
    assert_eq!(rig.commands.sent, vec!["M600", RESUME_COMMAND]);

    rig.seconds(1);
    assert_eq!(rig.state(), StateId::Watching);
    rig.seconds(1);
    assert_eq!(rig.state(), StateId::Dumping);
    assert_eq!(rig.board.level(DUMP), Some(true));
    assert_eq!(rig.board.level(HIGH_PRESSURE), Some(true));
}

#[test]
fn high_water_opens_the_dump_valve_and_shows_its_menu() {
    let mut rig = Rig::new();
    rig.running();
    rig.board.set(MIDDLE, true);
    rig.seconds(2);
    assert_eq!(rig.state(), StateId::Dumping);

    rig.board.set(HIGH, true);
    rig.seconds(1);
    assert_eq!(rig.state(), StateId::LevelTooHigh);
    assert_eq!(rig.board.level(DUMP), Some(true));
    assert_eq!(rig.board.level(HIGH_PRESSURE), Some(false));
    assert_eq!(rig.controller.navigator().cursor().current_path, HIGH_MENU);
    assert!(rig.sink.events.contains(&AppEvent::FaultRaised {
        module: "waterjetcutter",
        fault: LevelFault::LevelTooHigh
    }));

    // Still high: resume lifts the pause but the fault holds the state.
    rig.line("resume");
    rig.seconds(1);
    assert_eq!(rig.state(), StateId::LevelTooHigh);
}

#[test]
fn menu_pause_suspends_and_resume_restarts_the_head() {
    let mut rig = Rig::new();
    rig.running();
    rig.board.set(MIDDLE, true);
    rig.seconds(1);

    // Raw state 7 is PAUSED.
    let mut card = MemCard::default();
    card.file("/sd/menu/main", "1_pause.txt", "label-en Pause\naction state 7\n");
    rig.controller.open_menu();
    let machine = MockMachine::default();
    rig.controller
        .click(1, &card, &machine, &mut rig.commands, &mut rig.sink)
        .expect("menu readable");
    assert_eq!(rig.state(), StateId::Paused);

    rig.seconds(1);
    assert_eq!(rig.commands.sent, PAUSE_SEQUENCE);
    assert_eq!(rig.board.level(HIGH_PRESSURE), Some(false));

    rig.line("resume");
    rig.seconds(1);
    assert_eq!(rig.state(), StateId::Resuming);
    assert_eq!(&rig.commands.sent[PAUSE_SEQUENCE.len()..], RESUME_SEQUENCE);
}

#[test]
fn end_job_returns_to_menu_and_reports_status() {
    let mut rig = Rig::new();
    rig.running();
    rig.seconds(2);

    assert_eq!(rig.line("M1404"), vec!["waterjetcutter job ended"]);
    assert_eq!(rig.state(), StateId::Ending);
    rig.seconds(1);
    assert_eq!(rig.state(), StateId::Menu);
    assert_eq!(rig.board.level(HIGH_PRESSURE), Some(false));

    let status = rig.line("M1400");
    assert_eq!(status[0], "waterjetcutter");
    assert!(status.contains(&"Previous State was ENDING".to_string()));
    assert!(status.contains(&"Current  State  is MENU".to_string()));
    assert!(status.contains(&"active true".to_string()));
}

#[test]
fn disable_turns_everything_off() {
    let mut rig = Rig::new();
    rig.running();
    rig.seconds(1);

    assert_eq!(rig.line("M1402"), vec!["waterjetcutter inactive"]);
    assert_eq!(rig.state(), StateId::None);
    rig.seconds(5);
    assert_eq!(rig.board.level(HIGH_PRESSURE), Some(false));
    assert_eq!(rig.board.level(DUMP), Some(false));
    assert!(rig.commands.sent.is_empty());
    assert_eq!(rig.line("resume"), vec!["not suspended"]);
}
