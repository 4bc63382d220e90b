//! todosvc：Todo 服务与客户端命令行
//!
//! ```text
//! todosvc serve --http-addr 0.0.0.0:8000 --consul-addr http://localhost:8500
//! todosvc client --consul-addr http://localhost:8500 create 1 "buy milk"
//! todosvc client get 1
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use uuid::Uuid;

use todo_svc::config::{Config, RegistryConfig};
use todo_svc::discovery::{self, ServiceInstance};
use todo_svc::{
    HealthService, InMemoryTodoService, MetricsCollector, ServiceRuntime, Todo, TodoClient,
    TodoService, logging, make_http_handler,
};

#[derive(Parser)]
#[command(name = "todosvc", version, about = "Todo CRUD microservice")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service.
    Serve {
        /// HTTP listen address.
        #[arg(long)]
        http_addr: Option<String>,

        /// Consul agent address; registers the instance when set.
        #[arg(long)]
        consul_addr: Option<String>,

        /// Address announced to Consul (defaults to the listen address).
        #[arg(long)]
        advertise_addr: Option<String>,

        /// TOML configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Call the service through Consul discovery.
    Client {
        /// Consul agent address.
        #[arg(long, env = "CONSUL_HTTP_ADDR", default_value = "http://localhost:8500")]
        consul_addr: String,

        #[command(subcommand)]
        action: ClientAction,
    },
}

#[derive(Subcommand)]
enum ClientAction {
    /// Create a todo.
    Create {
        id: String,
        text: String,
        #[arg(long)]
        completed: bool,
    },
    /// Read a todo.
    Get { id: String },
    /// Create or replace a todo.
    Update {
        id: String,
        text: String,
        #[arg(long)]
        completed: bool,
    },
    /// Delete a todo.
    Delete { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            http_addr,
            consul_addr,
            advertise_addr,
            config,
        } => {
            let mut config = match config {
                Some(path) => Config::load_from_file(&path)
                    .with_context(|| format!("failed to load {}", path.display()))?,
                None => Config::default(),
            }
            .apply_env();

            if let Some(addr) = http_addr {
                config.server.http_addr = addr;
            }
            if let Some(addr) = consul_addr {
                config
                    .registry
                    .get_or_insert_with(RegistryConfig::default)
                    .consul_addr = addr;
            }
            if let (Some(addr), Some(registry)) = (advertise_addr, config.registry.as_mut()) {
                registry.advertise_addr = Some(addr);
            }

            logging::init(&config.log.level, config.log.json);
            serve(config).await
        }
        Command::Client {
            consul_addr,
            action,
        } => {
            let config = Config::default().apply_env();
            logging::init(&config.log.level, config.log.json);
            run_client(&consul_addr, action).await
        }
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let address = config.http_addr()?;
    let health = HealthService::new();
    let router = make_http_handler(
        Arc::new(InMemoryTodoService::new()),
        health.clone(),
        MetricsCollector::new(),
    );

    let mut runtime = ServiceRuntime::new(&config.service.name, address)
        .with_config(config.runtime_config())
        .with_health(health);

    if let (Some(discovery_config), Some(registry)) =
        (config.discovery_config(), config.registry.as_ref())
    {
        let backend = discovery::create_backend(&discovery_config)?;
        let host = registry
            .advertise_addr
            .clone()
            .unwrap_or_else(|| address.ip().to_string());
        let instance_id = format!("{}-{}", config.service.name, Uuid::new_v4());

        let mut instance =
            ServiceInstance::new(&config.service.name, instance_id, host, address.port());
        for tag in &config.service.tags {
            instance = instance.with_tag(tag);
        }

        info!(consul = %discovery_config.address, "service registration enabled");
        runtime = runtime.with_registration(backend, instance);
    }

    runtime.run(router).await
}

async fn run_client(consul_addr: &str, action: ClientAction) -> anyhow::Result<()> {
    let client = TodoClient::new(consul_addr).await?;

    match action {
        ClientAction::Create {
            id,
            text,
            completed,
        } => {
            client
                .post_todo(Todo::new(id, text).with_completed(completed))
                .await?;
            println!("{{}}");
        }
        ClientAction::Get { id } => {
            let todo = client.get_todo(&id).await?;
            println!("{}", serde_json::to_string_pretty(&todo)?);
        }
        ClientAction::Update {
            id,
            text,
            completed,
        } => {
            let todo = Todo::new(id.clone(), text).with_completed(completed);
            client.put_todo(&id, todo).await?;
            println!("{{}}");
        }
        ClientAction::Delete { id } => {
            client.delete_todo(&id).await?;
            println!("{{}}");
        }
    }

    Ok(())
}
