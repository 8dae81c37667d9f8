/// Policy Checker - Runs the configured policy pipeline over a metacard
///
/// Usage: cargo run --bin policy_check <policy.toml> <metacard.json> [event] [--remote]
///
/// `metacard.json` holds one metacard or an array of them (pre-delete).
/// `event` defaults to post-query. The merged response is printed as JSON.
use ddf_core::{init_tracing, LogFormat, Metacard, Query, ResourceRequest};
use ddf_policy::event::properties;
use ddf_policy::{EventProperties, LifecycleEvent, LifecycleEventKind, PolicyConfig, PolicyContext};
use serde::Deserialize;
use std::fs;
use std::process::exit;

#[derive(Deserialize)]
#[serde(untagged)]
enum MetacardInput {
    One(Metacard),
    Many(Vec<Metacard>),
}

fn usage() -> ! {
    eprintln!("Usage: cargo run --bin policy_check <policy.toml> <metacard.json> [event] [--remote]");
    eprintln!();
    eprintln!("Events:");
    for kind in LifecycleEventKind::ALL {
        eprintln!("  {}", kind);
    }
    exit(1);
}

fn main() {
    init_tracing("warn", LogFormat::from_env());

    let args: Vec<String> = std::env::args().skip(1).collect();
    let remote = args.iter().any(|arg| arg == "--remote");
    let positional: Vec<&String> = args.iter().filter(|arg| !arg.starts_with("--")).collect();
    if positional.len() < 2 {
        usage();
    }

    let config = match PolicyConfig::from_file(positional[0]) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {}", positional[0], e);
            exit(1);
        }
    };

    let raw = match fs::read_to_string(positional[1]) {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("Failed to read {}: {}", positional[1], e);
            exit(1);
        }
    };
    let metacards = match serde_json::from_str::<MetacardInput>(&raw) {
        Ok(MetacardInput::One(metacard)) => vec![metacard],
        Ok(MetacardInput::Many(metacards)) => metacards,
        Err(e) => {
            eprintln!("Invalid metacard JSON in {}: {}", positional[1], e);
            exit(1);
        }
    };
    let Some(first) = metacards.first() else {
        eprintln!("No metacards in {}", positional[1]);
        exit(1);
    };

    let kind = match positional.get(2).map(|raw| raw.parse::<LifecycleEventKind>()) {
        None => LifecycleEventKind::PostQuery,
        Some(Ok(kind)) => kind,
        Some(Err(e)) => {
            eprintln!("{}", e);
            usage();
        }
    };

    let query = Query::by_id(&first.id);
    let request = ResourceRequest::by_id(first.id.clone());
    let event = match kind {
        LifecycleEventKind::PreCreate => LifecycleEvent::PreCreate(first),
        LifecycleEventKind::PreUpdate => LifecycleEvent::PreUpdate {
            id: &first.id,
            metacard: first,
        },
        LifecycleEventKind::PreDelete => LifecycleEvent::PreDelete(&metacards),
        LifecycleEventKind::PreQuery => LifecycleEvent::PreQuery(&query),
        LifecycleEventKind::PostQuery => LifecycleEvent::PostQuery(first),
        LifecycleEventKind::PreResource => LifecycleEvent::PreResource(&request),
        LifecycleEventKind::PostResource => LifecycleEvent::PostResource(first),
    };

    let mut props = EventProperties::new();
    if remote {
        props.insert(properties::LOCAL_DESTINATION.to_string(), serde_json::Value::Bool(false));
    }

    let aggregator = config.build_aggregator();
    match aggregator.evaluate(&PolicyContext::with_properties(event, &props)) {
        Ok(response) => match serde_json::to_string_pretty(&response) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Failed to serialize response: {}", e);
                exit(1);
            }
        },
        Err(stop) => {
            eprintln!("Denied: {}", stop);
            exit(2);
        }
    }
}
