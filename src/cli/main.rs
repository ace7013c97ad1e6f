use clap::{Parser, Subcommand};
use reqwest::Client;
use std::error::Error;

#[derive(Parser)]
#[command(name = "article-pipeline-cli")]
#[command(about = "Query a running article search API", long_about = None)]
struct Cli {
    #[arg(short, long, env = "ARTICLE_PIPELINE_ENDPOINT", default_value = "http://localhost:8080")]
    endpoint: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Relevance search; prefix with `tag:a,b` to filter by tags
    Search {
        #[arg(value_name = "QUERY", default_value = "")]
        query: String,

        #[arg(short, long, default_value = "0")]
        from: i64,

        #[arg(short, long)]
        size: Option<i64>,
    },

    /// Show the most frequent tags
    Tags,

    /// Unindexed substring scan against the relational store
    Baseline {
        #[arg(value_name = "QUERY")]
        query: String,
    },

    /// Check server health
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let client = Client::new();

    let request = match cli.command {
        Commands::Search { query, from, size } => {
            let mut params = vec![("q", query), ("from", from.to_string())];
            if let Some(size) = size {
                params.push(("size", size.to_string()));
            }
            client
                .get(format!("{}/api/search", cli.endpoint))
                .query(&params)
        }
        Commands::Tags => client.get(format!("{}/api/analytics/tags", cli.endpoint)),
        Commands::Baseline { query } => client
            .get(format!("{}/api/search/db", cli.endpoint))
            .query(&[("q", query)]),
        Commands::Health => client.get(format!("{}/health", cli.endpoint)),
    };

    let response = request.send().await?;
    let status = response.status();
    let body: serde_json::Value = response.json().await?;
    println!("{}", serde_json::to_string_pretty(&body)?);

    if !status.is_success() {
        return Err(format!("request failed with HTTP {}", status).into());
    }

    Ok(())
}
