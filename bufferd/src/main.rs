//! # Buffer Host Daemon
//!
//! Main entry point for the buffer host runtime.

use bufferd::script::parse_choice;
use bufferd::{HostRuntime, HostRuntimeConfig};
use services_buffer_manager::config::load_settings_file;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    let config = parse_args(&args).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        print_usage(&args[0]);
        process::exit(1);
    });

    let mut runtime = HostRuntime::new(config).unwrap_or_else(|e| {
        eprintln!("Failed to create runtime: {}", e);
        process::exit(1);
    });

    if let Err(e) = runtime.run() {
        eprintln!("Runtime error: {}", e);
        process::exit(1);
    }
}

fn parse_args(args: &[String]) -> Result<HostRuntimeConfig, String> {
    let mut config = HostRuntimeConfig::default();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--script" | "-s" => {
                let script_path = value_of(args, &mut i, "--script")?;
                let script_text = fs::read_to_string(script_path)
                    .map_err(|e| format!("Failed to read script file: {}", e))?;
                config.script = Some(script_text);
            }
            "--config" | "-c" => {
                let path = value_of(args, &mut i, "--config")?;
                config.settings = load_settings_file(Path::new(path))
                    .map_err(|e| format!("Failed to load settings: {}", e))?;
            }
            "--buffers" | "-b" => {
                let value = value_of(args, &mut i, "--buffers")?;
                config.settings.buffers = value
                    .parse()
                    .map_err(|_| format!("Invalid buffers value: {}", value))?;
            }
            "--state-dir" => {
                let dir = value_of(args, &mut i, "--state-dir")?;
                config.settings.state_dir = Some(PathBuf::from(dir));
            }
            "--answer" => {
                let value = value_of(args, &mut i, "--answer")?;
                config.default_answer = parse_choice(value)?;
            }
            "--zorder" => config.settings.zorder_switching = true,
            "--session" => config.settings.save_session = true,
            "--recent" => config.settings.save_recent = true,
            "--quit-on-close-last" => config.settings.quit_on_close_last = true,
            "--load-on-activate" => config.settings.load_on_activate = true,
            "--save-on-deactivate" => config.settings.save_on_deactivate = true,
            "--read-only" => config.settings.read_only = true,
            "--no-confirm" => config.settings.are_you_sure = false,
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other if other.starts_with('-') => {
                return Err(format!("Unknown option: {}", other));
            }
            file => config.files.push(PathBuf::from(file)),
        }
        i += 1;
    }

    Ok(config)
}

fn value_of<'a>(args: &'a [String], i: &mut usize, flag: &str) -> Result<&'a str, String> {
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| format!("Missing value for {}", flag))
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} [OPTIONS] [FILES...]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -s, --script <FILE>      Command script (default: read standard input)");
    eprintln!("  -c, --config <FILE>      Settings file; later options override it");
    eprintln!("  -b, --buffers <N>        Number of buffers (1-100, default 10)");
    eprintln!("  --state-dir <DIR>        Where the recent list and session live");
    eprintln!("  --answer <yes|no|cancel> Answer to unscripted save questions");
    eprintln!("  --zorder                 Switch and close in most-recently-used order");
    eprintln!("  --session                Restore and save the default session");
    eprintln!("  --recent                 Load and save the recent files list");
    eprintln!("  --quit-on-close-last     Exit when the last buffer is closed");
    eprintln!("  --load-on-activate       Reload files changed on disk on 'activate'");
    eprintln!("  --save-on-deactivate     Save named buffers on 'deactivate'");
    eprintln!("  --read-only              Open files read-only");
    eprintln!("  --no-confirm             Save named buffers without asking");
    eprintln!("  -h, --help               Show this help message");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {} --buffers 4 --zorder --script scripts/demo.bufferd", program);
    eprintln!("  {} --session --recent notes.txt todo.txt", program);
}
