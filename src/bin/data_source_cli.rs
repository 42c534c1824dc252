use std::collections::HashMap;
use std::env;

use player_data_source::{
    build_data_source_factory, is_http, resolve_user_agent, HttpDataSourceFactory,
    SystemAgentDefaults,
};

fn main() {
    player_data_source::utils::logging::init_tracing();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: data_source_cli <uri> [Header:Value ...]");
        std::process::exit(1);
    }

    let uri = args[1].as_str();
    let headers = match parse_headers(&args[2..]) {
        Ok(headers) => headers,
        Err(error) => {
            eprintln!("Error: {error}");
            std::process::exit(1);
        }
    };

    let headers = if headers.is_empty() {
        None
    } else {
        Some(headers)
    };
    let user_agent = resolve_user_agent(&SystemAgentDefaults::new(), headers.as_ref());
    let factory = build_data_source_factory(user_agent, headers.as_ref());

    println!("URI: {uri}");
    println!("HTTP: {}", is_http(Some(uri)));
    print_factory(&factory);
}

fn parse_headers(raw: &[String]) -> Result<HashMap<String, String>, String> {
    raw.iter()
        .map(|entry| {
            entry
                .split_once(':')
                .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
                .ok_or_else(|| format!("expected Header:Value, got {entry:?}"))
        })
        .collect()
}

fn print_factory(factory: &HttpDataSourceFactory) {
    let config = factory.config();
    println!("User agent: {:?}", config.user_agent);
    println!(
        "Cross-protocol redirects: {}",
        config.allow_cross_protocol_redirects
    );
    println!("Connect timeout: {:?}", config.connect_timeout);
    println!("Read timeout: {:?}", config.read_timeout);
    match &config.default_request_headers {
        Some(headers) => {
            println!("Default headers:");
            for (name, value) in headers {
                println!("  {name}: {value}");
            }
        }
        None => println!("Default headers: none"),
    }
}
