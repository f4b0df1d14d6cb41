//! Request command - raw authenticated calls against the API.

use anyhow::{Context as _, Result};
use clap::Args;
use serde_json::Value;
use vitrine_client::{HeaderMap, HeaderName, HeaderValue, Method, RequestOptions};

use super::{Context, build_form, parse_pair, print_value};

/// Arguments for the request command.
#[derive(Args, Debug)]
pub struct RequestArgs {
    /// HTTP method (GET, POST, PUT, PATCH, DELETE)
    pub method: String,

    /// Path relative to the API base, e.g. /brands/
    pub path: String,

    /// Query parameter as key=value (repeatable)
    #[arg(short, long = "query")]
    pub query: Vec<String>,

    /// Extra header as Name:Value (repeatable)
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// JSON request body
    #[arg(long, conflicts_with_all = ["fields", "files"])]
    pub json: Option<String>,

    /// Form field as key=value (repeatable)
    #[arg(long = "field")]
    pub fields: Vec<String>,

    /// Form file as key=path (repeatable)
    #[arg(long = "file")]
    pub files: Vec<String>,

    /// Never serve this request from or store it in the response cache
    #[arg(long)]
    pub no_cache: bool,
}

pub async fn run(args: RequestArgs, ctx: &Context) -> Result<()> {
    let method = parse_method(&args.method)?;
    let mut options = RequestOptions::new(method);

    for raw in &args.query {
        let (key, value) = parse_pair(raw)?;
        options = options.query(key, value);
    }
    if let Some(body) = &args.json {
        let body: Value = serde_json::from_str(body).context("--json is not valid JSON")?;
        options = options.json(&body)?;
    } else if !args.fields.is_empty() || !args.files.is_empty() {
        options = options.form(build_form(&args.fields, &args.files)?);
    }
    let headers = parse_headers(&args.headers)?;

    let services = ctx.connect().await?;
    let result = services
        .client
        .request(args.path.as_str(), options, headers, args.no_cache)
        .await;
    services.report_navigation();
    let response = result?;

    if ctx.verbose {
        eprintln!("HTTP {}", response.status());
    }
    if response.is_empty() {
        return Ok(());
    }
    match response.json::<Value>() {
        Ok(value) => print_value(&value, ctx)?,
        Err(_) => println!("{}", response.text()),
    }
    Ok(())
}

fn parse_method(raw: &str) -> Result<Method> {
    Method::from_bytes(raw.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("invalid HTTP method '{}'", raw))
}

fn parse_headers(raw: &[String]) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for entry in raw {
        let (name, value) = entry
            .split_once(':')
            .with_context(|| format!("expected Name:Value, got '{}'", entry))?;
        let name = HeaderName::from_bytes(name.trim().as_bytes())
            .with_context(|| format!("invalid header name in '{}'", entry))?;
        let value = HeaderValue::from_str(value.trim())
            .with_context(|| format!("invalid header value in '{}'", entry))?;
        headers.insert(name, value);
    }
    Ok(headers)
}
