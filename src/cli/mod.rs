pub mod client;
pub mod utils;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use crate::types::EntityType;
use client::ApiClient;

#[derive(Parser)]
#[command(name = "school")]
#[command(about = "School CLI - Command-line client for the School API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, env = "SCHOOL_API_URL", default_value = "http://localhost:3000", help = "API base URL")]
    pub server: String,

    #[arg(long, global = true, env = "SCHOOL_API_TOKEN", hide_env_values = true, help = "Bearer token from `school login`")]
    pub token: Option<String>,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Exchange email and password for a token")]
    Login {
        #[arg(help = "Account email")]
        email: String,
        #[arg(long, env = "SCHOOL_PASSWORD", hide_env_values = true, help = "Account password")]
        password: String,
    },

    #[command(about = "Show the caller as the server resolves them")]
    Whoami,

    #[command(about = "List records of a collection")]
    List {
        #[arg(value_parser = parse_entity, help = "Collection (schools, classrooms, students, teachers, users)")]
        entity: EntityType,
        #[arg(long = "where", value_parser = parse_clause, help = "Equality filter as field=value (repeatable)")]
        filters: Vec<(String, String)>,
    },

    #[command(about = "Show one record")]
    Get {
        #[arg(value_parser = parse_entity)]
        entity: EntityType,
        id: String,
    },

    #[command(about = "Create a record from a JSON body")]
    Create {
        #[arg(value_parser = parse_entity)]
        entity: EntityType,
        #[arg(help = "JSON object")]
        body: String,
    },

    #[command(about = "Update a record from a JSON body")]
    Update {
        #[arg(value_parser = parse_entity)]
        entity: EntityType,
        id: String,
        #[arg(help = "JSON object with the fields to change")]
        body: String,
    },

    #[command(about = "Delete a record")]
    Delete {
        #[arg(value_parser = parse_entity)]
        entity: EntityType,
        id: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Accepts the collection name or the singular entity name
fn parse_entity(raw: &str) -> Result<EntityType, String> {
    let lower = raw.to_lowercase();
    EntityType::from_collection(&lower)
        .or_else(|| EntityType::ALL.into_iter().find(|e| e.label().to_lowercase() == lower))
        .ok_or_else(|| format!("unknown collection '{}'", raw))
}

fn parse_clause(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(field, _)| !field.is_empty())
        .map(|(field, value)| (field.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected field=value, got '{}'", raw))
}

fn parse_body(raw: &str) -> anyhow::Result<Value> {
    let body: Value = serde_json::from_str(raw).map_err(|e| anyhow::anyhow!("body is not valid JSON: {}", e))?;
    if !body.is_object() {
        anyhow::bail!("body must be a JSON object");
    }
    Ok(body)
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let client = ApiClient::new(cli.server, cli.token)?;

    match cli.command {
        Commands::Login { email, password } => {
            let data = client.login(&email, &password).await?;
            match output_format {
                OutputFormat::Json => utils::output_value(output_format, &data),
                OutputFormat::Text => {
                    let token = data.get("token").and_then(Value::as_str).unwrap_or_default();
                    println!("{}", token);
                    Ok(())
                }
            }
        }
        Commands::Whoami => {
            let actor = client.get("/api/auth/whoami").await?;
            utils::output_value(output_format, &actor)
        }
        Commands::List { entity, filters } => {
            let records = client.list(entity, &filters).await?;
            utils::output_records(output_format, entity, &records)
        }
        Commands::Get { entity, id } => {
            let record = client.get(&item_path(entity, &id)).await?;
            utils::output_value(output_format, &record)
        }
        Commands::Create { entity, body } => {
            let record = client.post(&collection_path(entity), &parse_body(&body)?).await?;
            utils::output_success(output_format, &format!("Created {}", entity), Some(json!({ "record": record })))
        }
        Commands::Update { entity, id, body } => {
            let record = client.put(&item_path(entity, &id), &parse_body(&body)?).await?;
            utils::output_success(output_format, &format!("Updated {} {}", entity, id), Some(json!({ "record": record })))
        }
        Commands::Delete { entity, id } => {
            client.delete(&item_path(entity, &id)).await?;
            utils::output_success(output_format, &format!("Deleted {} {}", entity, id), None)
        }
    }
}

fn collection_path(entity: EntityType) -> String {
    format!("/api/{}", entity.collection())
}

fn item_path(entity: EntityType, id: &str) -> String {
    format!("/api/{}/{}", entity.collection(), id)
}
