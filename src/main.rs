// memsim: process address-space simulator

use std::io;
use std::process::ExitCode;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use memsim::config::{Cli, DEFAULT_SOURCES};
use memsim::loader::load_file;
use memsim::memory::{AddressSpace, SegmentRegistry};
use memsim::ui::App;
use memsim::{dump, logging};

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let program_name = args.first().map(|s| s.as_str()).unwrap_or("memsim");

    let cli = match Cli::parse(args.iter().skip(1).cloned()) {
        Ok(cli) => cli,
        Err(e) => {
            print_usage(program_name, &e.to_string());
            return Ok(ExitCode::SUCCESS);
        }
    };

    logging::init();

    let mut registry = SegmentRegistry::new();
    let mut spaces: Vec<AddressSpace> = Vec::with_capacity(cli.sources.len());
    for path in &cli.sources {
        match load_file(path, &mut registry, &cli.space) {
            Ok(space) => {
                println!("LOADED {} FROM {}", space.pid(), path);
                spaces.push(space);
            }
            Err(e) => {
                eprintln!("Error: failed to load '{}': {}", path, e);
                release(spaces);
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    if cli.interactive {
        let level = logging::silence();
        let res = run_viewer(&spaces);
        log::set_max_level(level);
        if let Err(err) = res {
            eprintln!("Error: {:?}", err);
        }
    } else {
        for space in &spaces {
            print!("{}", dump::render(space)?);
        }
    }

    release(spaces);
    Ok(ExitCode::SUCCESS)
}

/// Drop address spaces in load order
fn release(spaces: Vec<AddressSpace>) {
    for space in spaces {
        drop(space);
    }
}

fn run_viewer(spaces: &[AddressSpace]) -> io::Result<()> {
    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(spaces);
    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn print_usage(program_name: &str, reason: &str) {
    println!("Error: {}", reason);
    println!();
    println!(
        "Usage: {} [--tui] [--stack N] [--heap N] [A.txt B.txt C.txt]",
        program_name
    );
    println!();
    println!("With no files, loads {}.", DEFAULT_SOURCES.join(", "));
    println!("Set {}=debug to trace segment sharing.", logging::LEVEL_VAR);
}
