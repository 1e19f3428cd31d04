mod color;

use std::{error::Error, path::PathBuf, sync::Arc, time::Duration};

use clap::{Args, CommandFactory, Parser, Subcommand};
use color::{color_output, loading::TerminalLoading, request_output, response_output};
use hyper::header::{HeaderName, HeaderValue};
use jrequest::{
    ConfigPatch, ReqwestTransport, RequestClient, RequestError, RequestOptions, UploadProgress,
};
use serde_json::Value;
use tokio::time::Instant;

#[derive(Parser)]
#[command(name = "jrequest")]
#[command(about = "Send requests through an interceptor-aware request client", long_about = None)]
struct Cli {
    #[command(flatten)]
    defaults: Defaults,

    /// Output format (json, table, raw)
    #[arg(short, long, global = true, default_value = "json")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Defaults {
    /// JSON file with client defaults, e.g. {"baseUrl": "https://api.example.com/"}
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Response field holding the payload
    #[arg(long, global = true)]
    business: Option<String>,

    /// Print the whole response body instead of the business field
    #[arg(long, global = true, conflicts_with = "business")]
    whole_body: bool,

    #[arg(long, global = true)]
    skip_interceptor_response: bool,

    /// Treat urls starting with '/' as absolute
    #[arg(long, global = true)]
    slash_absolute_url: bool,

    #[arg(long, global = true)]
    loading_tip: Option<String>,

    /// Minimum time the loading tip stays up, in milliseconds
    #[arg(long, global = true)]
    loading_duration: Option<u64>,

    /// Extra request header, 'Name: value'
    #[arg(short = 'H', long = "header", global = true)]
    headers: Vec<String>,

    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    Get {
        url: String,

        /// Query parameters as a JSON object
        #[arg(short, long)]
        data: Option<String>,
    },
    Post {
        url: String,

        /// Request body as JSON
        #[arg(short, long)]
        data: Option<String>,

        /// Body encoding (json, form)
        #[arg(short = 't', long, default_value = "json")]
        content_type: String,
    },
    Upload {
        url: String,

        #[arg(long)]
        file: PathBuf,

        /// Multipart field name of the file
        #[arg(long, default_value = "file")]
        name: String,

        /// Extra form fields as a JSON object
        #[arg(short, long)]
        data: Option<String>,
    },
    /// Print shell completions
    Completions { shell: clap_complete::Shell },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.defaults.debug);

    let loading = Arc::new(TerminalLoading::default());
    let client = build_client(&cli.defaults, loading.clone())?;

    let (method, options) = match cli.command {
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "jrequest", &mut std::io::stdout());
            return Ok(());
        }
        Commands::Get { url, data } => ("GET", with_data(RequestOptions::new(url), data)?),
        Commands::Post {
            url,
            data,
            content_type,
        } => (
            "POST",
            with_data(RequestOptions::new(url), data)?.content_type_name(content_type),
        ),
        Commands::Upload {
            url,
            file,
            name,
            data,
        } => (
            "UPLOAD",
            with_data(RequestOptions::new(url), data)?
                .file_path(file)
                .name(name)
                .on_progress(print_progress),
        ),
    };

    let start = Instant::now();
    let pending = match method {
        "GET" => client.get(options)?,
        "POST" => client.post(options)?,
        _ => client.upload(options)?,
    };
    let outcome = pending.await;
    let duration = start.elapsed();
    loading.wait_hidden().await;

    match outcome {
        Ok(payload) => display_payload(method, &payload, duration, &cli.format),
        Err(RequestError::Failed(response)) => {
            eprintln!("{}", serde_json::to_string_pretty(&response)?);
            Err(RequestError::Failed(response).into())
        }
        Err(err) => Err(err.into()),
    }
}

fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn build_client(
    defaults: &Defaults,
    loading: Arc<TerminalLoading>,
) -> Result<RequestClient, Box<dyn Error>> {
    let mut client =
        RequestClient::new(Arc::new(ReqwestTransport::default())).with_indicator(loading);

    if let Some(path) = &defaults.config {
        let patch: ConfigPatch = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        client.set_config(patch);
    }

    let business = if defaults.whole_body {
        Some(String::new())
    } else {
        defaults.business.clone()
    };
    client.set_config(ConfigPatch {
        base_url: defaults.base_url.clone(),
        business,
        debug: defaults.debug.then_some(true),
        loading_tip: defaults.loading_tip.clone().map(Some),
        loading_duration: defaults.loading_duration,
        slash_absolute_url: defaults.slash_absolute_url.then_some(true),
        skip_interceptor_response: defaults.skip_interceptor_response.then_some(true),
        ..Default::default()
    });

    let headers = parse_headers(&defaults.headers)?;
    if !headers.is_empty() {
        client.interceptors_mut().set_request(move |mut config| {
            for (name, value) in &headers {
                config.header.insert(name.clone(), value.clone());
            }
            config
        });
    }

    Ok(client)
}

fn parse_headers(raw: &[String]) -> Result<Vec<(HeaderName, HeaderValue)>, Box<dyn Error>> {
    raw.iter()
        .map(|line| {
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| format!("invalid header {:?}, expected 'Name: value'", line))?;
            Ok((
                HeaderName::from_bytes(name.trim().as_bytes())?,
                HeaderValue::from_str(value.trim())?,
            ))
        })
        .collect()
}

fn with_data(options: RequestOptions, data: Option<String>) -> Result<RequestOptions, Box<dyn Error>> {
    Ok(match data {
        Some(raw) => options.data(serde_json::from_str(&raw)?),
        None => options,
    })
}

fn print_progress(progress: &UploadProgress) {
    eprint!(
        "\rupload {:>3}% ({}/{} bytes)",
        progress.progress, progress.total_bytes_sent, progress.total_bytes_expected_to_send
    );
    if progress.progress == 100 {
        eprintln!();
    }
}

fn display_payload(
    method: &str,
    payload: &Value,
    duration: Duration,
    format: &str,
) -> Result<(), Box<dyn Error>> {
    match format {
        "json" => {
            response_output!({
                println!("{}", serde_json::to_string_pretty(payload)?);
            });
        }
        "table" => {
            request_output!({
                println!("{} completed in {:?}", method, duration);
            });
            print_payload_table(payload);
        }
        _ => {
            println!("{}", payload);
        }
    }
    Ok(())
}

fn print_payload_table(payload: &Value) {
    use prettytable::{Table, row};

    let mut table = Table::new();
    table.add_row(row!["Field", "Value"]);

    match payload {
        Value::Object(fields) => {
            for (i, (name, value)) in fields.iter().enumerate() {
                if i < 20 {
                    table.add_row(row![name, value]);
                } else if i == 20 {
                    table.add_row(row![Fy->format!("... and {} more", fields.len() - 20)]);
                }
            }
        }
        other => {
            table.add_row(row![b->"payload", other]);
        }
    }

    table.printstd();
}
