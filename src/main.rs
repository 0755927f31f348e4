//! CNC interlock simulator: host entry point.
//!
//! Runs the interlock controller against simulated pins, an in-memory
//! switch bank and a directory standing in for the SD card.  Operator
//! input comes from stdin, one line at a time.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                    │
//! │                                                              │
//! │  GpioBank(SimPin)  SwitchBank  SdCardFs  JsonConfigFile      │
//! │  (DigitalIo)       (Switches)  (MenuFs)  (ConfigPort)        │
//! │  LogEventSink      CommandQueue          SimMachine          │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ───────────────────    │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │            Controller (pure logic)                     │  │
//! │  │  counter timers · water tank · water jet · menu        │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Console lines besides M-codes and `resume`:
//!
//! | Line                     | Effect                                 |
//! |--------------------------|----------------------------------------|
//! | `set <pin> 0\|1`         | drive a simulated input                |
//! | `machine <flag> 0\|1`    | set a machine-state predicate          |
//! | `menu`                   | bring the menu screen up at the root   |
//! | `show`                   | print the current menu                 |
//! | `click <n>`              | click menu line `n`                    |
//! | `scroll <delta>`         | move the cursor                        |
//! | `status [--json]`        | module status reports                  |
//! | `quit`                   | exit                                   |
//!
//! Every command the controller sends is fed back as a console line.  The
//! `suspended` flag, and `playing` when a water jet is configured, follow
//! the controller after each tick batch.

#![deny(unused_must_use)]

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use tracing_subscriber::EnvFilter;

use cnc_interlock::adapters::gpio::GpioBank;
use cnc_interlock::adapters::json_config::JsonConfigFile;
use cnc_interlock::adapters::log_sink::LogEventSink;
use cnc_interlock::adapters::sd_card::SdCardFs;
use cnc_interlock::adapters::sim::{CommandQueue, SimMachine, SimPin};
use cnc_interlock::adapters::switches::SwitchBank;
use cnc_interlock::adapters::time::MonotonicClock;
use cnc_interlock::app::ports::ConfigPort;
use cnc_interlock::app::Controller;
use cnc_interlock::config::{ControllerConfig, pin_is_connected};
use cnc_interlock::menu::Predicate;

/// Poll ticks per second tick.
const POLLS_PER_SECOND: u32 = 10;

#[derive(Debug, Parser)]
#[command(version, about = "CNC interlock controller simulator")]
struct Args {
    /// JSON configuration file; built-in defaults when absent.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory mounted as the SD card (`/sd`).
    #[arg(long, default_value = "sd")]
    sd_root: PathBuf,

    /// Stop after this many seconds.
    #[arg(long)]
    ticks: Option<u64>,

    /// `error`, `warn`, `info`, `debug` or `trace`; RUST_LOG overrides.
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Simulated board: every configured pin, with handles to poke inputs.
struct Board {
    gpio: GpioBank,
    pins: BTreeMap<String, SimPin>,
}

impl Board {
    fn from_config(cfg: &ControllerConfig) -> Self {
        let tank = &cfg.cutting_water_tank;
        let jet = &cfg.waterjetcutter;
        let inputs = [
            &tank.middle_float_pin,
            &tank.high_float_pin,
            &jet.door_switch_pin,
            &jet.middle_float_pin,
            &jet.high_float_pin,
        ];
        let outputs = [
            &tank.dump_valve_pin,
            &tank.low_pressure_pump_pin,
            &jet.dump_valve_pin,
            &jet.low_pressure_pump_pin,
            &jet.high_pressure_pump_pin,
        ];

        let mut board = Self {
            gpio: GpioBank::new(),
            pins: BTreeMap::new(),
        };
        for name in inputs.into_iter().filter(|p| pin_is_connected(p)) {
            let pin = SimPin::new(false);
            board.gpio.add_input(name, pin.clone());
            board.pins.insert(name.clone(), pin);
        }
        for name in outputs.into_iter().filter(|p| pin_is_connected(p)) {
            let pin = SimPin::new(false);
            board.gpio.add_output(name, pin.clone());
            board.pins.insert(name.clone(), pin);
        }
        board
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    info!("cnc-interlock simulator v{}", env!("CARGO_PKG_VERSION"));

    // ── 1. Configuration ──────────────────────────────────────
    let cfg = match &args.config {
        Some(path) => JsonConfigFile::new(path)
            .load()
            .with_context(|| format!("loading {}", path.display()))?,
        None => {
            warn!("no --config given, every module stays disabled");
            ControllerConfig::default()
        }
    };

    // ── 2. Adapters ───────────────────────────────────────────
    let mut board = Board::from_config(&cfg);
    let mut switches = SwitchBank::with_switches(
        cfg.counter_timers
            .iter()
            .flat_map(|t| t.switches.iter().map(|s| s.name.as_str())),
    );
    let card = SdCardFs::new(&args.sd_root);
    let mut machine = SimMachine::new();
    let mut commands = CommandQueue::new();
    let mut sink = LogEventSink::new();

    // ── 3. Core ───────────────────────────────────────────────
    let mut controller = Controller::from_config(&cfg, &board.gpio);

    // ── 4. Operator input ─────────────────────────────────────
    let (tx, rx) = mpsc::channel::<String>();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines().map_while(std::result::Result::ok) {
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    // ── 5. Tick loop ──────────────────────────────────────────
    let clock = MonotonicClock::new();
    let mut poll = clock.every(Duration::from_millis(1000 / u64::from(POLLS_PER_SECOND)));
    let mut polls: u32 = 0;

    loop {
        for _ in 0..poll.wait() {
            controller.poll_tick(&mut board.gpio);
            polls += 1;
            if polls % POLLS_PER_SECOND == 0 {
                controller.second_tick(&mut switches, &mut commands, &mut sink);
                controller.main_loop(&mut board.gpio, &mut commands);
            }
        }
        // Commands reach the machine and echo back on the console.
        for line in commands.drain() {
            for reply in controller.handle_line(&line, &mut sink) {
                println!("{reply}");
            }
        }
        machine.mirror(&controller);

        while let Ok(line) = rx.try_recv() {
            let mut sim = Sim {
                controller: &mut controller,
                board: &mut board,
                card: &card,
                machine: &mut machine,
                commands: &mut commands,
                sink: &mut sink,
            };
            match sim.handle(line.trim()) {
                Flow::Continue => {}
                Flow::Quit => return Ok(()),
            }
        }

        if args.ticks.is_some_and(|limit| controller.uptime_seconds() >= limit) {
            info!("{} s elapsed, stopping", controller.uptime_seconds());
            return Ok(());
        }
    }
}

enum Flow {
    Continue,
    Quit,
}

/// Everything a console line may touch.
struct Sim<'a> {
    controller: &'a mut Controller,
    board: &'a mut Board,
    card: &'a SdCardFs,
    machine: &'a mut SimMachine,
    commands: &'a mut CommandQueue,
    sink: &'a mut LogEventSink,
}

impl Sim<'_> {
    fn handle(&mut self, line: &str) -> Flow {
        let mut words = line.split_whitespace();
        match (words.next(), words.next(), words.next()) {
            (None, ..) => {}
            (Some("quit" | "exit"), ..) => return Flow::Quit,
            (Some("set"), Some(pin), Some(level)) => self.set_pin(pin, level),
            (Some("machine"), Some(flag), Some(level)) => self.set_flag(flag, level),
            (Some("menu"), ..) => {
                self.controller.open_menu();
                self.show();
            }
            (Some("show"), ..) => self.show(),
            (Some("click"), Some(n), None) => match n.parse() {
                Ok(n) => self.click(n),
                Err(_) => println!("click <line>"),
            },
            (Some("scroll"), Some(d), None) => match d.parse() {
                Ok(d) => match self.controller.scroll(d, self.card, &*self.machine) {
                    Ok(_) => self.show(),
                    Err(e) => println!("menu: {e}"),
                },
                Err(_) => println!("scroll <delta>"),
            },
            (Some("status"), Some("--json"), None) => {
                for report in self.controller.status_reports() {
                    println!("{}", report.to_json());
                }
            }
            (Some("status"), None, _) => {
                for l in self.controller.status() {
                    println!("{l}");
                }
            }
            _ => {
                for reply in self.controller.handle_line(line, self.sink) {
                    println!("{reply}");
                }
            }
        }
        Flow::Continue
    }

    fn set_pin(&mut self, pin: &str, level: &str) {
        let Some(handle) = self.board.pins.get(pin) else {
            println!("no pin {pin}");
            return;
        };
        handle.set(level == "1");
        println!("{pin} = {}", handle.level());
    }

    fn set_flag(&mut self, flag: &str, level: &str) {
        match Predicate::from_directive(flag) {
            Some(p) => self.machine.set(p, level == "1"),
            None => println!("unknown machine flag {flag}"),
        }
    }

    fn click(&mut self, line: usize) {
        match self
            .controller
            .click(line, self.card, &*self.machine, self.commands, self.sink)
        {
            Ok(outcome) => {
                println!("{outcome:?}");
                self.show();
            }
            Err(e) => println!("menu: {e}"),
        }
    }

    fn show(&self) {
        let nav = self.controller.navigator();
        println!("[{:?}] {}", nav.screen(), nav.cursor().current_path);
        let count = match nav.line_count(self.card, &*self.machine) {
            Ok(n) => n,
            Err(e) => {
                println!("menu: {e}");
                return;
            }
        };
        for i in 0..count {
            let marker = if i == nav.cursor().current_line_index { '>' } else { ' ' };
            match self.controller.display(i, self.card, &*self.machine) {
                Ok(l) => println!("{marker}{i:2} {}", l.label()),
                Err(e) => println!("{marker}{i:2} <{e}>"),
            }
        }
    }
}
