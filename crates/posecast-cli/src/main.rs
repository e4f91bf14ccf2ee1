//! `posecast-cli` – posecast command line interface
//!
//! ```text
//! posecast stream [--host H] [--port P] [--rate HZ] [--echo]
//! posecast listen [--port P]
//! posecast schema
//! posecast init
//! ```
//!
//! `stream` samples the (simulated) attitude sensor and sends one UDP
//! datagram per tick until Ctrl-C.  `listen` is the receiving end.  Both read
//! `~/.posecast/config.toml`; command-line flags win over the file.

mod config;

use std::io::Write;
use std::sync::Arc;

use colored::Colorize;
use tokio::sync::Notify;
use tracing::warn;

use posecast_hal::SimAttitudeSensor;
use posecast_middleware::{PoseReceiver, UdpTransport};
use posecast_perception::format_display;
use posecast_runtime::TelemetryPipeline;
use posecast_types::OrientationSample;

fn main() {
    let guard = posecast_runtime::init_tracing("posecast");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (command, rest) = match args.split_first() {
        Some((cmd, rest)) => (cmd.as_str(), rest),
        None => ("help", &[][..]),
    };

    let code = match command {
        "stream" => run_stream(rest),
        "listen" => run_listen(rest),
        "schema" => print_schema(),
        "init" => {
            run_first_run_wizard();
            0
        }
        "help" | "-h" | "--help" => {
            print_help();
            0
        }
        other => {
            println!("{}: unknown command `{}`\n", "Error".red(), other);
            print_help();
            2
        }
    };

    drop(guard);
    std::process::exit(code);
}

// ─────────────────────────────────────────────────────────────────────────────
// stream
// ─────────────────────────────────────────────────────────────────────────────

fn run_stream(args: &[String]) -> i32 {
    let mut cfg = load_config();
    let mut echo = false;
    if let Err(e) = apply_flags(args, &mut cfg, &mut echo) {
        println!("{}: {}", "Error".red(), e);
        return 2;
    }
    let pipeline_cfg = match cfg.pipeline_config() {
        Ok(pc) => pc,
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            return 2;
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            println!("{}: cannot start runtime: {}", "Error".red(), e);
            return 1;
        }
    };
    let shutdown = install_ctrlc();

    println!(
        "  Streaming pose to {} at {} Hz  {}",
        pipeline_cfg.endpoint.to_string().bold(),
        cfg.sample_rate_hz,
        "(Ctrl-C to stop)".dimmed()
    );

    let mut pipeline = TelemetryPipeline::new(
        pipeline_cfg,
        SimAttitudeSensor::default(),
        UdpTransport::default(),
    );
    if echo {
        pipeline = pipeline.with_display(echo_line);
    }

    runtime.block_on(async {
        if let Err(e) = pipeline.start().await {
            println!("{}: {}", "Setup failed".red(), e);
            return 1;
        }
        shutdown.notified().await;
        pipeline.stop().await;

        let stats = pipeline.stats();
        println!();
        println!("{}", "  ✓ Stream stopped.".green());
        match serde_json::to_string(&stats) {
            Ok(json) => println!("    {}", json.dimmed()),
            Err(e) => warn!(error = %e, "cannot render stats"),
        }
        0
    })
}

fn echo_line(sample: &OrientationSample) {
    let mut out = std::io::stdout().lock();
    let _ = write!(out, "\r  {}   ", format_display(sample));
    let _ = out.flush();
}

// ─────────────────────────────────────────────────────────────────────────────
// listen
// ─────────────────────────────────────────────────────────────────────────────

fn run_listen(args: &[String]) -> i32 {
    let mut cfg = load_config();
    let mut iter = args.iter();
    while let Some(flag) = iter.next() {
        match (flag.as_str(), iter.next()) {
            ("--port", Some(v)) => match v.parse::<u16>() {
                Ok(p) => cfg.listen_port = p,
                Err(_) => {
                    println!("{}: invalid port `{}`", "Error".red(), v);
                    return 2;
                }
            },
            (other, _) => {
                println!("{}: unexpected argument `{}`", "Error".red(), other);
                return 2;
            }
        }
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            println!("{}: cannot start runtime: {}", "Error".red(), e);
            return 1;
        }
    };
    let shutdown = install_ctrlc();

    runtime.block_on(async {
        let mut receiver = match PoseReceiver::bind(("0.0.0.0", cfg.listen_port)).await {
            Ok(r) => r,
            Err(e) => {
                println!("{}: {}", "Setup failed".red(), e);
                return 1;
            }
        };
        println!(
            "  Listening for pose datagrams on {}  {}",
            receiver.local_addr().to_string().bold(),
            "(Ctrl-C to stop)".dimmed()
        );

        let mut updates = receiver.subscribe();
        loop {
            tokio::select! {
                _ = shutdown.notified() => break,
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let latest = *updates.borrow_and_update();
                    if let Some(pose) = latest {
                        println!(
                            "  {} {}  {}",
                            pose.received_at.format("%H:%M:%S%.3f").to_string().dimmed(),
                            pose.peer,
                            format_display(&pose.sample)
                        );
                    }
                }
            }
        }

        receiver.stop().await;
        println!(
            "{} ({} received, {} rejected)",
            "  ✓ Listener stopped.".green(),
            receiver.received_count(),
            receiver.rejected_count()
        );
        0
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// schema / init / help
// ─────────────────────────────────────────────────────────────────────────────

fn print_schema() -> i32 {
    let schema = schemars::schema_for!(OrientationSample);
    match serde_json::to_string_pretty(&schema) {
        Ok(text) => {
            println!("{text}");
            0
        }
        Err(e) => {
            println!("{}: {}", "Error".red(), e);
            1
        }
    }
}

fn run_first_run_wizard() {
    println!();
    println!("{}", "  ╔══════════════════════════════════════╗".bold().cyan());
    println!("{}", "  ║         posecast setup wizard        ║".bold().cyan());
    println!("{}", "  ╚══════════════════════════════════════╝".bold().cyan());
    println!();

    let mut cfg = load_config();

    cfg.host = prompt_line(&format!("  Receiver host [{}]: ", cfg.host), &cfg.host);

    let port_str = prompt_line(
        &format!("  Receiver UDP port [{}]: ", cfg.port),
        &cfg.port.to_string(),
    );
    if let Ok(p) = port_str.trim().parse::<u16>() {
        cfg.port = p;
    }

    let rate_str = prompt_line(
        &format!("  Sample rate in Hz [{}]: ", cfg.sample_rate_hz),
        &cfg.sample_rate_hz.to_string(),
    );
    if let Ok(r) = rate_str.trim().parse::<f64>() {
        cfg.sample_rate_hz = r;
    }

    if let Err(e) = cfg.pipeline_config() {
        println!("{}: {}", "Config error".red(), e);
        return;
    }

    match config::save(&cfg) {
        Ok(()) => println!(
            "\n  {} Config saved to {}\n",
            "✓".green().bold(),
            config::config_path().display().to_string().bold()
        ),
        Err(e) => println!("{}: {}", "Error saving config".red(), e),
    }
}

fn print_help() {
    println!(
        "  {} {}",
        "posecast".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Stream device orientation over UDP\n");
    println!("  {}", "Commands:".bold());
    println!("    stream [--host H] [--port P] [--rate HZ] [--echo]   send poses until Ctrl-C");
    println!("    listen [--port P]                                  print received poses");
    println!("    schema                                             JSON schema of a datagram");
    println!("    init                                               write ~/.posecast/config.toml");
    println!("    help                                               this message");
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn load_config() -> config::Config {
    match config::load() {
        Ok(Some(cfg)) => cfg,
        Ok(None) => {
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            config::Config::default()
        }
    }
}

fn apply_flags(args: &[String], cfg: &mut config::Config, echo: &mut bool) -> Result<(), String> {
    let mut iter = args.iter();
    while let Some(flag) = iter.next() {
        match flag.as_str() {
            "--echo" => *echo = true,
            "--host" => {
                cfg.host = iter.next().ok_or("--host needs a value")?.clone();
            }
            "--port" => {
                let v = iter.next().ok_or("--port needs a value")?;
                cfg.port = v.parse().map_err(|_| format!("invalid port `{v}`"))?;
            }
            "--rate" => {
                let v = iter.next().ok_or("--rate needs a value")?;
                cfg.sample_rate_hz = v.parse().map_err(|_| format!("invalid rate `{v}`"))?;
            }
            other => return Err(format!("unexpected argument `{other}`")),
        }
    }
    Ok(())
}

/// Route Ctrl-C into a [`Notify`] the async side can await.
fn install_ctrlc() -> Arc<Notify> {
    let shutdown = Arc::new(Notify::new());
    let handle = Arc::clone(&shutdown);
    if let Err(e) = ctrlc::set_handler(move || handle.notify_one()) {
        warn!(error = %e, "Failed to install Ctrl-C handler; stop with SIGKILL");
    }
    shutdown
}

fn prompt_line(msg: &str, default: &str) -> String {
    use std::io::BufRead;
    print!("{}", msg);
    std::io::stdout().flush().ok();
    let mut line = String::new();
    match std::io::stdin().lock().read_line(&mut line) {
        Ok(_) => {
            let t = line.trim().to_string();
            if t.is_empty() { default.to_string() } else { t }
        }
        Err(_) => default.to_string(),
    }
}
