use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Management CLI for the script gateway admin API", long_about = None)]
struct Cli {
    #[arg(short, long, env = "GATEWAY_ADMIN_URL", default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, env = "GATEWAY_ADMIN_TOKEN", default_value = "CHANGE_ME_IN_PRODUCTION")]
    token: String,

    /// Header carrying the admin token
    #[arg(long, default_value = "X-Admin-Token")]
    header: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway status
    Status,
    /// Manage routes
    #[command(subcommand)]
    Routes(RouteCommands),
    /// Manage hook scripts
    #[command(subcommand)]
    Hooks(HookCommands),
}

#[derive(Subcommand)]
enum RouteCommands {
    /// List all routes in match order
    List,
    /// Add a route from a JSON file holding one route definition
    Add { file: PathBuf },
    /// Replace a route (matched by path and method) from a JSON file
    Update { file: PathBuf },
    /// Delete a route
    Delete {
        #[arg(long)]
        path: String,
        #[arg(long, default_value = "")]
        method: String,
    },
}

#[derive(Subcommand)]
enum HookCommands {
    /// Show the number of hooks per point
    List,
    /// Replace every hook at a point with one script
    Update { point: String, script: PathBuf },
    /// Remove every hook at a point
    Clear { point: String },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_bytes(cli.header.as_bytes())?,
        HeaderValue::from_str(&cli.token)?,
    );

    let request = match cli.command {
        Commands::Status => client.get(format!("{}/admin/status", cli.url)),
        Commands::Routes(RouteCommands::List) => client.get(format!("{}/admin/routes", cli.url)),
        Commands::Routes(RouteCommands::Add { file }) => client
            .post(format!("{}/admin/routes/add", cli.url))
            .json(&json!({ "route": read_json(&file)? })),
        Commands::Routes(RouteCommands::Update { file }) => client
            .post(format!("{}/admin/routes/update", cli.url))
            .json(&json!({ "route": read_json(&file)? })),
        Commands::Routes(RouteCommands::Delete { path, method }) => client
            .post(format!("{}/admin/routes/delete", cli.url))
            .json(&json!({ "path": path, "method": method })),
        Commands::Hooks(HookCommands::List) => client.get(format!("{}/admin/hooks", cli.url)),
        Commands::Hooks(HookCommands::Update { point, script }) => client
            .post(format!("{}/admin/hooks/update", cli.url))
            .json(&json!({ "hookPoint": point, "script": std::fs::read_to_string(&script)? })),
        Commands::Hooks(HookCommands::Clear { point }) => client
            .post(format!("{}/admin/hooks/clear", cli.url))
            .json(&json!({ "hookPoint": point })),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

fn read_json(path: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

async fn print_response(res: reqwest::Response) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(ExitCode::FAILURE);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(ExitCode::SUCCESS)
}
