//! Cutting water tank level interlock against mock hardware.

use cnc_interlock::app::events::AppEvent;
use cnc_interlock::app::ports::PanelPort;
use cnc_interlock::config::WaterTankConfig;
use cnc_interlock::controllers::WaterTank;
use cnc_interlock::controllers::water_tank::{DISABLE_MCODE, ENABLE_MCODE};
use cnc_interlock::error::{ConfigError, Error, LevelFault};
use cnc_interlock::menu::Navigator;
use cnc_interlock::safety::LevelPhase;

use crate::mock_hw::{MockBoard, MockCommands, MockPanel, RecordingSink};

const MIDDLE: &str = "P1.28";
const HIGH: &str = "P1.29";
const DUMP: &str = "P2.5";
const LOW_MENU: &str = "/sd/menu/low";
const HIGH_MENU: &str = "/sd/menu/high";
const FILTER_MENU: &str = "/sd/menu/filters";

fn config() -> WaterTankConfig {
    WaterTankConfig {
        enable: true,
        middle_float_pin: MIDDLE.into(),
        high_float_pin: HIGH.into(),
        dump_valve_pin: DUMP.into(),
        low_pressure_pump_pin: "P2.7".into(),
        low_water_detected_menu: LOW_MENU.into(),
        high_water_detected_menu: HIGH_MENU.into(),
        filters_blocked_menu: FILTER_MENU.into(),
        fill_cycle_seconds: 20,
        filter_cleaning_seconds: 40,
        water_level_too_low_seconds: 2400,
    }
}

struct Rig {
    tank: WaterTank,
    board: MockBoard,
    panel: MockPanel,
    commands: MockCommands,
    sink: RecordingSink,
}

impl Rig {
    fn new() -> Self {
        let board = MockBoard::new();
        let tank = WaterTank::from_config(&config(), 20, &board).expect("valid config");
        Self {
            tank,
            board,
            panel: MockPanel::default(),
            commands: MockCommands::default(),
            sink: RecordingSink::default(),
        }
    }

    fn seconds(&mut self, n: usize) {
        for _ in 0..n {
            self.tank.poll(&mut self.board);
            self.tank
                .second_tick(&mut self.panel, &mut self.commands, &mut self.sink);
            self.tank.main_loop(&mut self.board);
        }
    }
}

#[test]
fn low_water_suspends_once_and_rate_limits_the_menu() {
    let mut rig = Rig::new();

    rig.seconds(20);
    assert!(rig.commands.sent.is_empty());
    assert!(rig.panel.shown.is_empty());

    rig.seconds(1);
    assert_eq!(rig.commands.sent, vec!["M600"]);
    assert_eq!(rig.panel.shown, vec![LOW_MENU]);

    rig.seconds(20);
    assert_eq!(rig.commands.count("M600"), 1);
    assert_eq!(rig.panel.shown.len(), 1);

    rig.seconds(1);
    assert_eq!(rig.panel.shown.len(), 2);
    assert_eq!(rig.commands.count("M600"), 1);
}

#[test]
fn menu_already_on_screen_is_not_shown_again() {
    let mut rig = Rig::new();
    rig.panel.sticky = true;
    rig.seconds(80);
    assert_eq!(rig.panel.shown, vec![LOW_MENU]);
}

#[test]
fn high_water_preempts_the_low_water_menu() {
    let mut rig = Rig::new();
    rig.seconds(21);
    assert_eq!(rig.panel.shown, vec![LOW_MENU]);

    rig.board.set(HIGH, true);
    rig.seconds(1);
    assert_eq!(rig.panel.shown, vec![LOW_MENU, HIGH_MENU]);
    assert_eq!(rig.board.level(DUMP), Some(true));
    assert_eq!(rig.commands.count("M600"), 1);
    assert!(rig.sink.events.contains(&AppEvent::FaultRaised {
        module: "cutting_water_tank",
        fault: LevelFault::LevelTooHigh
    }));
}

#[test]
fn filters_blocked_after_long_dump() {
    let mut rig = Rig::new();
    rig.board.set(MIDDLE, true);
    rig.seconds(40);
    assert!(rig.commands.sent.is_empty());
    assert_eq!(rig.tank.verdict().phase, LevelPhase::Dumping);

    rig.seconds(1);
    assert_eq!(rig.panel.shown, vec![FILTER_MENU]);
    assert!(rig.tank.verdict().has_fault(LevelFault::FiltersBlocked));
}

#[test]
fn filling_then_dumping_drives_the_valve() {
    let mut rig = Rig::new();
    rig.seconds(3);
    assert_eq!(rig.board.writes_to(DUMP), vec![false]);
    rig.board.set(MIDDLE, true);
    rig.seconds(3);
    assert_eq!(rig.board.writes_to(DUMP), vec![false, true]);
    assert_eq!(rig.panel.indicator, vec![false]);
}

#[test]
fn resume_clears_the_pause_and_restarts_the_fill_count() {
    let mut rig = Rig::new();
    rig.seconds(21);
    assert!(rig.tank.is_paused());

    assert!(rig.tank.on_resume());
    rig.board.set(MIDDLE, true);
    rig.seconds(1);
    assert!(!rig.tank.is_paused());
    assert_eq!(rig.tank.verdict().faults, 0);
    assert_eq!(rig.panel.indicator.last(), Some(&false));
    assert!(rig.sink.events.contains(&AppEvent::FaultsCleared {
        module: "cutting_water_tank"
    }));
}

#[test]
fn unresolved_fault_raises_again_after_resume() {
    let mut rig = Rig::new();
    rig.seconds(21);
    rig.tank.on_resume();
    rig.seconds(21);
    assert_eq!(rig.commands.count("M600"), 2);
}

#[test]
fn disabled_tank_ignores_the_floats() {
    let mut rig = Rig::new();
    rig.tank.on_mcode(DISABLE_MCODE, &mut rig.sink);
    rig.seconds(60);
    assert!(rig.commands.sent.is_empty());
    assert!(rig.board.writes.is_empty());

    rig.tank.on_mcode(ENABLE_MCODE, &mut rig.sink);
    rig.seconds(21);
    assert_eq!(rig.commands.sent, vec!["M600"]);
}

#[test]
fn read_failure_keeps_last_level() {
    let mut rig = Rig::new();
    rig.board.set(MIDDLE, true);
    rig.seconds(1);
    rig.board.fail_reads = true;
    rig.seconds(5);
    assert_eq!(rig.tank.verdict().phase, LevelPhase::Dumping);
}

#[test]
fn absent_pin_refuses_the_module() {
    let mut board = MockBoard::new();
    board.absent.push(HIGH.into());
    let err = WaterTank::from_config(&config(), 20, &board).err();
    assert_eq!(
        err,
        Some(Error::Config(ConfigError::Missing {
            module: "cutting_water_tank",
            key: "high_float_pin"
        }))
    );
}

/// The real navigator, counting how often a menu is forced on screen.
struct CountingPanel {
    nav: Navigator,
    shows: usize,
}

impl PanelPort for CountingPanel {
    fn current_menu(&self) -> Option<&str> {
        self.nav.current_menu()
    }

    fn show_menu(&mut self, path: &str) {
        self.shows += 1;
        self.nav.show_menu(path);
    }

    fn set_fault_indicator(&mut self, fault: bool) {
        self.nav.set_fault_indicator(fault);
    }
}

#[test]
fn fault_menu_with_trailing_slash_is_shown_once() {
    let config = WaterTankConfig {
        low_water_detected_menu: "/sd/menu/low/".into(),
        ..config()
    };
    let mut board = MockBoard::new();
    let mut tank = WaterTank::from_config(&config, 20, &board).expect("valid config");
    let mut panel = CountingPanel {
        nav: Navigator::new("/sd/menu", "en"),
        shows: 0,
    };
    let mut commands = MockCommands::default();
    let mut sink = RecordingSink::default();

    for _ in 0..80 {
        tank.poll(&mut board);
        tank.second_tick(&mut panel, &mut commands, &mut sink);
        tank.main_loop(&mut board);
    }

    assert_eq!(panel.shows, 1);
    assert_eq!(panel.nav.current_menu(), Some(LOW_MENU));
    assert_eq!(commands.count("M600"), 1);
}
