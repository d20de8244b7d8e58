use clap::{Parser, Subcommand};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::PathBuf;

const TOKEN_FILE: &str = ".portfolio_token";

#[derive(Parser)]
#[command(name = "portfolio-cli")]
#[command(about = "CLI for the portfolio API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, default_value = "http://localhost:5000")]
    url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the admin account (only works once)
    Setup {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },
    Logout,
    Profile,
    /// Change the admin username and/or password
    UpdateAdmin {
        #[arg(short, long)]
        username: Option<String>,
        #[arg(short, long)]
        password: Option<String>,
    },
    Projects,
    GetProject {
        #[arg(short, long)]
        id: String,
    },
    CreateProject {
        #[arg(short, long)]
        title: String,
        #[arg(short, long)]
        description: String,
        /// Comma separated, e.g. "Rust, Axum"
        #[arg(short = 's', long)]
        tech_stack: Option<String>,
        #[arg(short = 'm', long)]
        image: String,
        #[arg(long)]
        live_link: Option<String>,
        #[arg(long)]
        github_link: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        featured: bool,
    },
    UpdateProject {
        #[arg(short, long)]
        id: String,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short = 's', long)]
        tech_stack: Option<String>,
        #[arg(short = 'm', long)]
        image: Option<String>,
        #[arg(long)]
        live_link: Option<String>,
        #[arg(long)]
        github_link: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        featured: Option<bool>,
    },
    DeleteProject {
        #[arg(short, long)]
        id: String,
    },
    About,
    /// Replace the about-me section from a JSON file
    PutAbout {
        #[arg(short, long)]
        file: PathBuf,
    },
    Ratings,
    /// Leave a 1-5 rating
    Rate {
        #[arg(short, long)]
        score: u8,
        #[arg(short, long)]
        comment: Option<String>,
    },
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

fn authorized(builder: RequestBuilder) -> RequestBuilder {
    let token = fs::read_to_string(TOKEN_FILE).unwrap_or_default();
    builder.header("Authorization", format!("Bearer {}", token.trim()))
}

async fn print_response(res: Response) -> Result<(), reqwest::Error> {
    println!("Response ({}): {}", res.status(), res.text().await?);
    Ok(())
}

/// JSON object holding only the fields that were given.
fn project_body(fields: [(&str, Option<Value>); 8]) -> Value {
    let map: Map<String, Value> = fields
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key.to_string(), v)))
        .collect();
    Value::Object(map)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = Client::new();

    match cli.command {
        Commands::Setup { username, password } => {
            let res = client.post(format!("{}/api/admin/setup", cli.url))
                .json(&json!({ "username": username, "password": password }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Login { username, password } => {
            let res = client.post(format!("{}/api/admin/login", cli.url))
                .json(&json!({ "username": username, "password": password }))
                .send()
                .await?;
            if res.status().is_success() {
                let body: LoginResponse = res.json().await?;
                fs::write(TOKEN_FILE, body.token)?;
                println!("Logged in. Token saved to {}", TOKEN_FILE);
            } else {
                println!("Login failed: {}", res.text().await?);
            }
        }
        Commands::Logout => {
            let _ = fs::remove_file(TOKEN_FILE);
            println!("Logged out (token removed).");
        }
        Commands::Profile => {
            let res = authorized(client.get(format!("{}/api/admin/profile", cli.url)))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::UpdateAdmin { username, password } => {
            let res = authorized(client.put(format!("{}/api/admin/update", cli.url)))
                .json(&json!({ "username": username, "password": password }))
                .send()
                .await?;
            if res.status().is_success() {
                let body: LoginResponse = res.json().await?;
                fs::write(TOKEN_FILE, body.token)?;
                println!("Credentials updated. New token saved to {}", TOKEN_FILE);
            } else {
                println!("Update failed: {}", res.text().await?);
            }
        }
        Commands::Projects => {
            let res = client.get(format!("{}/api/projects", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::GetProject { id } => {
            let res = client.get(format!("{}/api/projects/{}", cli.url, id)).send().await?;
            print_response(res).await?;
        }
        Commands::CreateProject { title, description, tech_stack, image, live_link, github_link, category, featured } => {
            let body = project_body([
                ("title", Some(json!(title))),
                ("description", Some(json!(description))),
                ("techStack", tech_stack.map(Value::from)),
                ("image", Some(json!(image))),
                ("liveLink", live_link.map(Value::from)),
                ("githubLink", github_link.map(Value::from)),
                ("category", category.map(Value::from)),
                ("featured", Some(json!(featured))),
            ]);
            let res = authorized(client.post(format!("{}/api/projects", cli.url)))
                .json(&body)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::UpdateProject { id, title, description, tech_stack, image, live_link, github_link, category, featured } => {
            let body = project_body([
                ("title", title.map(Value::from)),
                ("description", description.map(Value::from)),
                ("techStack", tech_stack.map(Value::from)),
                ("image", image.map(Value::from)),
                ("liveLink", live_link.map(Value::from)),
                ("githubLink", github_link.map(Value::from)),
                ("category", category.map(Value::from)),
                ("featured", featured.map(Value::from)),
            ]);
            let res = authorized(client.put(format!("{}/api/projects/{}", cli.url, id)))
                .json(&body)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::DeleteProject { id } => {
            let res = authorized(client.delete(format!("{}/api/projects/{}", cli.url, id)))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::About => {
            let res = client.get(format!("{}/api/about", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::PutAbout { file } => {
            let body: Value = serde_json::from_str(&fs::read_to_string(&file)?)?;
            let res = authorized(client.put(format!("{}/api/about", cli.url)))
                .json(&body)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Ratings => {
            let res = client.get(format!("{}/api/ratings/summary", cli.url)).send().await?;
            print_response(res).await?;
            let res = client.get(format!("{}/api/ratings", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Rate { score, comment } => {
            let res = client.post(format!("{}/api/ratings", cli.url))
                .json(&json!({ "score": score, "comment": comment }))
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}
