#![forbid(unsafe_code)]

//! `geotrackd-ctl` — local CLI companion for `geotrackd`.
//!
//! Connects to the IPC socket and sends JSON bridge requests to the
//! daemon. Useful for manual operation and for simulating the events a
//! host platform would normally deliver.

use std::io::{BufRead, BufReader, Write};

use clap::{Parser, Subcommand};
use interprocess::local_socket::{traits::Stream as _, GenericNamespaced, Stream, ToNsName};

#[derive(Debug, Parser)]
#[command(
    name = "geotrackd-ctl",
    about = "Local CLI for the geotrackd daemon",
    version,
    long_about = None
)]
struct Cli {
    /// IPC socket name (must match the daemon's `ipc_name` config).
    #[arg(long, default_value = "geotrackd")]
    ipc_name: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Register the background dispatcher entry point.
    Init {
        /// Raw dispatcher callback handle.
        dispatcher: i64,
        /// Execution-context instance that minted the handle.
        #[arg(long, default_value = "ctl")]
        issuer: String,
    },

    /// Start a tracking session.
    Start {
        /// Notification title.
        #[arg(long)]
        title: String,
        /// Notification body.
        #[arg(long)]
        body: String,
        /// Notification channel name.
        #[arg(long)]
        channel: String,
        /// Seconds between location updates.
        #[arg(long, default_value_t = 5)]
        interval: u32,
        /// Accuracy tier: powersave, low, balanced, high, navigation.
        #[arg(long, default_value = "high")]
        accuracy: String,
        /// Distance filter in meters.
        #[arg(long, default_value_t = 0.0)]
        distance_filter: f64,
        /// Raw update callback handle.
        #[arg(long)]
        update: i64,
        /// Optional raw notification-click callback handle.
        #[arg(long)]
        on_click: Option<i64>,
        /// Execution-context instance that minted the handles.
        #[arg(long, default_value = "ctl")]
        issuer: String,
    },

    /// Stop the tracking session.
    Stop,

    /// Query whether the session is running.
    Status,

    /// Update the live notification text.
    Notify {
        /// Replacement title.
        #[arg(long)]
        title: Option<String>,
        /// Replacement body.
        #[arg(long)]
        body: Option<String>,
    },

    /// Simulate a user interaction with the tracking notification.
    Click {
        /// JSON payload forwarded to the notification-click callback.
        #[arg(long, default_value = "{}")]
        payload: String,
    },
}

fn handle(raw: i64, issuer: &str) -> serde_json::Value {
    serde_json::json!({ "raw": raw, "issuer": issuer })
}

fn main() {
    let args = Cli::parse();

    let request_json = match &args.command {
        Command::Init { dispatcher, issuer } => serde_json::json!({
            "method": "initialize-background-handler",
            "args": { "dispatcher": handle(*dispatcher, issuer) },
        }),
        Command::Start {
            title,
            body,
            channel,
            interval,
            accuracy,
            distance_filter,
            update,
            on_click,
            issuer,
        } => {
            let mut callbacks = serde_json::json!({ "update": handle(*update, issuer) });
            if let Some(click) = on_click {
                callbacks["on_notification_click"] = handle(*click, issuer);
            }
            serde_json::json!({
                "method": "start-tracking",
                "args": {
                    "settings": {
                        "notification_title": title,
                        "notification_body": body,
                        "notification_channel": channel,
                        "interval_seconds": interval,
                        "accuracy": accuracy,
                        "distance_filter_m": distance_filter,
                    },
                    "callbacks": callbacks,
                },
            })
        }
        Command::Stop => serde_json::json!({ "method": "stop-tracking" }),
        Command::Status => serde_json::json!({ "method": "query-running" }),
        Command::Notify { title, body } => {
            let mut req = serde_json::json!({ "method": "update-notification", "args": {} });
            if let Some(t) = title {
                req["args"]["title"] = serde_json::Value::String(t.clone());
            }
            if let Some(b) = body {
                req["args"]["body"] = serde_json::Value::String(b.clone());
            }
            req
        }
        Command::Click { payload } => {
            let parsed: serde_json::Value =
                serde_json::from_str(payload).unwrap_or(serde_json::Value::Null);
            serde_json::json!({
                "method": "notification-interaction",
                "args": { "payload": parsed },
            })
        }
    };

    match send_request(&args.ipc_name, &request_json) {
        Ok(response) => {
            if let Some(obj) = response.as_object() {
                let ok = obj
                    .get("ok")
                    .and_then(serde_json::Value::as_bool)
                    .unwrap_or(false);
                if ok {
                    if let Some(data) = obj.get("data") {
                        println!("{}", serde_json::to_string_pretty(data).unwrap_or_default());
                    } else {
                        println!("OK");
                    }
                } else {
                    let err_msg = obj
                        .get("error")
                        .and_then(|v| v.as_str())
                        .unwrap_or("unknown error");
                    eprintln!("Error: {err_msg}");
                    std::process::exit(1);
                }
            } else {
                println!("{response}");
            }
        }
        Err(err) => {
            eprintln!("Failed to connect to daemon: {err}");
            eprintln!("Is geotrackd running with ipc_name '{}'?", args.ipc_name);
            std::process::exit(1);
        }
    }
}

/// Connect to the IPC socket, send one JSON line, and read the response.
fn send_request(
    ipc_name: &str,
    request: &serde_json::Value,
) -> std::result::Result<serde_json::Value, Box<dyn std::error::Error>> {
    let name = ipc_name.to_ns_name::<GenericNamespaced>()?;
    let mut stream = Stream::connect(name)?;

    let mut request_line = serde_json::to_string(request)?;
    request_line.push('\n');
    stream.write_all(request_line.as_bytes())?;
    stream.flush()?;

    let mut reader = BufReader::new(&stream);
    let mut response_line = String::new();
    reader.read_line(&mut response_line)?;

    let response: serde_json::Value = serde_json::from_str(response_line.trim())?;
    Ok(response)
}
