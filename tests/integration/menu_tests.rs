//! Menu navigation against an in-memory card.

use cnc_interlock::app::Controller;
use cnc_interlock::app::ports::PanelPort;
use cnc_interlock::config::{ControllerConfig, WaterJetConfig};
use cnc_interlock::fsm::StateId;
use cnc_interlock::menu::{ClickOutcome, DisplayLine, Navigator, Screen};

use crate::mock_hw::{MemCard, MockBoard, MockCommands, MockMachine, RecordingSink};

const ROOT: &str = "/sd/menu/main";

fn card() -> MemCard {
    let mut card = MemCard::default();
    card.file(ROOT, "1_jobs.txt", "label-en Jobs\nlabel-de Auftraege\naction goto-menu /sd/menu/main/jobs\n")
        .file(
            ROOT,
            "2_cut.txt",
            "label-en Cut a file\nonly-if-playing-is 0\nfile-select /sd/gcode /sd/menu/main/cut\n",
        )
        .file(
            ROOT,
            "3_abort.txt",
            "label-en Abort\nonly-if-playing-is 1\naction run-command abort\n",
        )
        .file(ROOT, "4_endstop.txt", "label-en Endstop test\naction state 16\n")
        .file(ROOT, "5_watch.txt", "label-en Watch\naction display-watch-screen\n")
        .file(ROOT, ".6_hidden.txt", "label-en Hidden\n")
        .file(ROOT, "notes.md", "label-en Not a menu\n")
        .dir(ROOT, "jobs")
        .file("/sd/menu/main/jobs", "1_title.txt", "label-en Jobs\nis-title\nnot-selectable\n")
        .dir(ROOT, "cut")
        .file(
            "/sd/menu/main/cut",
            "1_file.txt",
            "label-en *f (*s bytes)\nis-title\nnot-selectable\n",
        )
        .file(
            "/sd/menu/main/cut",
            "2_go.txt",
            "label-en Start\nonly-if-file-is-gcode 1\naction run-command play\n",
        )
        .dir("/sd", "gcode")
        .file("/sd/gcode", "part.GCODE", "G0 X0\n")
        .file("/sd/gcode", "readme.txt", "hello\n")
        .dir("/sd/gcode", "sub")
        .file("/sd/gcode/sub", "bracket.gcode", "G1 X1\n");
    card
}

struct Rig {
    controller: Controller,
    card: MemCard,
    machine: MockMachine,
    commands: MockCommands,
    sink: RecordingSink,
}

impl Rig {
    fn new() -> Self {
        Self::with_config(ControllerConfig::default())
    }

    fn with_config(cfg: ControllerConfig) -> Self {
        let mut controller = Controller::from_config(&cfg, &MockBoard::new());
        controller.open_menu();
        Self {
            controller,
            card: card(),
            machine: MockMachine::default(),
            commands: MockCommands::default(),
            sink: RecordingSink::default(),
        }
    }

    fn click(&mut self, line: usize) -> ClickOutcome {
        self.controller
            .click(line, &self.card, &self.machine, &mut self.commands, &mut self.sink)
            .expect("card readable")
    }

    fn label(&self, line: usize) -> String {
        self.controller
            .display(line, &self.card, &self.machine)
            .expect("card readable")
            .label()
            .to_string()
    }

    fn lines(&self) -> usize {
        self.controller
            .navigator()
            .line_count(&self.card, &self.machine)
            .expect("card readable")
    }

    fn path(&self) -> &str {
        &self.controller.navigator().cursor().current_path
    }
}

#[test]
fn root_lists_eligible_menu_files_in_order() {
    let rig = Rig::new();
    assert_eq!(rig.controller.navigator().screen(), Screen::Menu);
    assert_eq!(rig.lines(), 5);
    assert_eq!(rig.label(0), "..");
    assert_eq!(rig.label(1), "Jobs");
    assert_eq!(rig.label(2), "Cut a file");
    assert_eq!(rig.label(3), "Endstop test");
    assert_eq!(rig.label(4), "Watch");
    assert_eq!(
        rig.controller.display(9, &rig.card, &rig.machine),
        Ok(DisplayLine::Blank)
    );
}

#[test]
fn predicates_follow_live_machine_state() {
    let mut rig = Rig::new();
    rig.machine.playing = true;
    assert_eq!(rig.label(2), "Abort");

    assert_eq!(rig.click(2), ClickOutcome::CommandSent("abort".into()));
    assert_eq!(rig.commands.sent, vec!["abort"]);
    assert_eq!(rig.controller.navigator().screen(), Screen::Watch);
}

#[test]
fn goto_menu_and_back_up() {
    let mut rig = Rig::new();
    assert_eq!(rig.click(1), ClickOutcome::Navigated);
    assert_eq!(rig.path(), "/sd/menu/main/jobs");
    assert_eq!(rig.click(1), ClickOutcome::Stayed);

    assert_eq!(rig.click(0), ClickOutcome::Navigated);
    assert_eq!(rig.path(), ROOT);
    assert_eq!(rig.click(0), ClickOutcome::LeftMenu);
    assert_eq!(rig.controller.navigator().screen(), Screen::Watch);
}

#[test]
fn file_select_then_run_command_appends_the_file() {
    let mut rig = Rig::new();
    assert_eq!(rig.click(2), ClickOutcome::Navigated);
    assert!(rig.controller.navigator().is_browsing());
    assert_eq!(rig.path(), "/sd/gcode");
    assert_eq!(rig.lines(), 3);
    assert_eq!(rig.label(1), "part.GCODE");
    assert_eq!(rig.label(2), "sub/");

    assert_eq!(rig.click(2), ClickOutcome::Navigated);
    assert_eq!(rig.path(), "/sd/gcode/sub");
    assert_eq!(rig.click(0), ClickOutcome::Navigated);
    assert_eq!(rig.path(), "/sd/gcode");

    assert_eq!(
        rig.click(1),
        ClickOutcome::FileSelected("/sd/gcode/part.GCODE".into())
    );
    assert_eq!(rig.path(), "/sd/menu/main/cut");
    assert_eq!(rig.label(1), "part.GCODE (6 bytes)");
    assert_eq!(rig.label(2), "Start");

    assert_eq!(
        rig.click(2),
        ClickOutcome::CommandSent("play /sd/gcode/part.GCODE".into())
    );
    assert_eq!(rig.commands.sent, vec!["play /sd/gcode/part.GCODE"]);
    assert_eq!(rig.controller.navigator().screen(), Screen::Watch);
    assert_eq!(rig.controller.navigator().cursor().pending_file_selection, None);
}

#[test]
fn up_from_browse_start_returns_to_the_origin_menu() {
    let mut rig = Rig::new();
    rig.click(2);
    assert_eq!(rig.click(0), ClickOutcome::Navigated);
    assert!(!rig.controller.navigator().is_browsing());
    assert_eq!(rig.path(), ROOT);
}

#[test]
fn gcode_predicate_hides_run_without_a_selection() {
    let (card, machine) = (card(), MockMachine::default());
    let mut nav = Navigator::new(ROOT, "en");
    nav.show_menu("/sd/menu/main/cut");
    assert_eq!(nav.line_count(&card, &machine), Ok(2));
    assert_eq!(
        nav.display(1, &card, &machine).map(|l| l.label().to_string()),
        Ok("*f (*s bytes)".to_string())
    );
}

#[test]
fn watch_screen_action_leaves_the_menu() {
    let mut rig = Rig::new();
    assert_eq!(rig.click(4), ClickOutcome::LeftMenu);
    assert_eq!(rig.controller.navigator().screen(), Screen::Watch);
    assert_eq!(rig.path(), ROOT);
}

#[test]
fn scroll_is_clamped_to_the_directory() {
    let mut rig = Rig::new();
    assert_eq!(rig.controller.scroll(10, &rig.card, &rig.machine), Ok(4));
    assert_eq!(rig.controller.scroll(-2, &rig.card, &rig.machine), Ok(2));
    assert_eq!(rig.controller.scroll(-9, &rig.card, &rig.machine), Ok(0));
}

#[test]
fn state_line_drives_the_water_jet() {
    let cfg = ControllerConfig {
        waterjetcutter: WaterJetConfig {
            enable: true,
            error_wl_low_menu: "/sd/menu/err/low".into(),
            error_wl_high_menu: "/sd/menu/err/high".into(),
            error_clean_filters_menu: "/sd/menu/err/filters".into(),
            ..WaterJetConfig::default()
        },
        ..ControllerConfig::default()
    };
    let mut rig = Rig::with_config(cfg);
    assert_eq!(rig.click(3), ClickOutcome::StateRequested(16));
    assert_eq!(
        rig.controller.water_jet().map(|j| j.state()),
        Some(StateId::EndstopTriggered)
    );
}

#[test]
fn german_labels() {
    let cfg = ControllerConfig {
        panel: cnc_interlock::config::PanelConfig {
            language: "de".into(),
            ..Default::default()
        },
        ..ControllerConfig::default()
    };
    let rig = Rig::with_config(cfg);
    assert_eq!(rig.label(1), "Auftraege");
    assert_eq!(rig.label(2), "");
}
