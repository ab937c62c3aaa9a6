// SPDX-FileCopyrightText: 2026 hexide contributors
// SPDX-License-Identifier: MIT

//! hexide CLI entrypoint.
//!
//! Opens a file in the terminal hex editor. Configuration and plugins are
//! Lua; see the bundled `plugins/` directory for the stock views.

use std::cell::RefCell;
use std::error::Error;
use std::path::PathBuf;
use std::rc::Rc;

use hexide::bytes;
use hexide::diag::DiagnosticLog;
use hexide::ext::Extensions;
use hexide::paths;
use hexide::script::{self, ConfigValues, ScriptHost};
use hexide::session::SessionState;
use hexide::store::{FileBuffer, DEFAULT_CHUNK_SIZE};
use hexide::term::{CrosstermScreen, Screen, SharedScreen};
use hexide::tui::Editor;

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [options] <file>\n  {program} --locate-config\n  {program} --locate-plugins\n\nOptions:\n  -c, --config-file <path>  Use <path> instead of the default config file\n  -p, --plugin-dir <dir>    Load bundled plugins from <dir>\n      --read-only           Open the file without write access\n      --start <offset>      Restrict the view to bytes at or after <offset>\n      --end <offset>        Restrict the view to bytes before <offset>\n  -d, --debug               Keep debug diagnostics for the exit log\n  -h, --help                Show this help\n\n--locate-config and --locate-plugins print the resolved path and exit."
    );
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    file: Option<String>,
    config_file: Option<String>,
    plugin_dir: Option<String>,
    locate_config: bool,
    locate_plugins: bool,
    read_only: bool,
    start: Option<u64>,
    end: Option<u64>,
    debug: bool,
    help: bool,
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                options.help = true;
            }
            "-c" | "--config-file" => {
                if options.config_file.is_some() {
                    return Err(());
                }
                let path = args.next().ok_or(())?;
                if bytes::is_string_whitespace(&path) {
                    return Err(());
                }
                options.config_file = Some(path);
            }
            "-p" | "--plugin-dir" => {
                if options.plugin_dir.is_some() {
                    return Err(());
                }
                let dir = args.next().ok_or(())?;
                if bytes::is_string_whitespace(&dir) {
                    return Err(());
                }
                options.plugin_dir = Some(dir);
            }
            "--locate-config" => {
                if options.locate_config {
                    return Err(());
                }
                options.locate_config = true;
            }
            "--locate-plugins" => {
                if options.locate_plugins {
                    return Err(());
                }
                options.locate_plugins = true;
            }
            "--read-only" => {
                if options.read_only {
                    return Err(());
                }
                options.read_only = true;
            }
            "--start" => {
                if options.start.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                options.start = Some(raw.parse().map_err(|_| ())?);
            }
            "--end" => {
                if options.end.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                options.end = Some(raw.parse().map_err(|_| ())?);
            }
            "-d" | "--debug" => {
                if options.debug {
                    return Err(());
                }
                options.debug = true;
            }
            _ if arg.starts_with('-') => return Err(()),
            _ => {
                if options.file.is_some() {
                    return Err(());
                }
                if bytes::is_string_whitespace(&arg) {
                    return Err(());
                }
                options.file = Some(arg);
            }
        }
    }

    Ok(options)
}

fn run_app(options: CliOptions, file: String) -> Result<(), Box<dyn Error>> {
    let config_path = paths::config_file_path(options.config_file.map(PathBuf::from));
    let plugin_dir = paths::plugin_dir(options.plugin_dir.map(PathBuf::from));
    let diag = DiagnosticLog::shared(options.debug);

    let config = match script::read_config(&config_path, &plugin_dir) {
        Ok(config) => config,
        Err(err) => {
            diag.borrow_mut()
                .push(format!("config {} failed to load: {err}", config_path.display()));
            ConfigValues::bundled(&plugin_dir)
        }
    };

    // The single-chunk read cache honors both limits; whichever is smaller
    // wins.
    let chunk_size = config
        .max_chunk_size
        .unwrap_or(DEFAULT_CHUNK_SIZE as u64)
        .min(config.max_chunk_memory.unwrap_or(u64::MAX))
        .max(1) as usize;

    let store = FileBuffer::open(
        PathBuf::from(&file).as_path(),
        options.read_only,
        (options.start.unwrap_or(0), options.end),
        chunk_size,
    )?
    .shared();

    let screen_impl = CrosstermScreen::new()?;
    let (width, height) = screen_impl.size();
    let screen: SharedScreen = Rc::new(RefCell::new(screen_impl));

    let session = SessionState::shared(width, height, config_path);
    let ext = Extensions::shared();

    let host = ScriptHost::new(
        session.clone(),
        store.clone(),
        ext.clone(),
        screen.clone(),
        diag.clone(),
        &plugin_dir,
    )?;
    host.load_plugins(&config.plugins);

    let mut editor = Editor::new(session, store, ext.clone(), screen.clone(), diag.clone());
    let result = editor.run();

    // Tear the terminal down before flushing diagnostics so they land on
    // the normal screen. Scripted callbacks hold the screen through the
    // interpreter; clearing the registries breaks that chain.
    ext.borrow_mut().clear_all();
    drop(editor);
    drop(host);
    drop(screen);

    diag.borrow().flush_to(&mut std::io::stdout())?;
    result?;
    Ok(())
}

fn main() {
    let mut args = std::env::args();
    let program = args.next().unwrap_or_else(|| "hexide".to_owned());

    let options = match parse_options(args) {
        Ok(options) => options,
        Err(()) => {
            print_usage(&program);
            std::process::exit(1);
        }
    };

    if options.help {
        print_usage(&program);
        return;
    }
    if options.locate_config {
        let path = paths::config_file_path(options.config_file.map(PathBuf::from));
        println!("{}", path.display());
        return;
    }
    if options.locate_plugins {
        let dir = paths::plugin_dir(options.plugin_dir.map(PathBuf::from));
        println!("{}", dir.display());
        return;
    }

    let Some(file) = options.file.clone() else {
        println!("Requires a file to open.");
        return;
    };

    if let Err(err) = run_app(options, file) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
