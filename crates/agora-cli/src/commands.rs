use std::collections::HashMap;
use std::sync::Arc;

use agora_sdk::{base_anchor, Address, Agent, Network, Post, PostsPage, QueryOptions};
use agora_server::AgoraServer;
use anyhow::{bail, Context};
use colored::Colorize;

use crate::cli::*;
use crate::config::AgoraConfig;

const AGENT_NAMES: [&str; 6] = ["alice", "bob", "carol", "dave", "erin", "frank"];

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = AgoraConfig::load(cli.config.as_deref())?;
    match cli.command {
        Command::Demo(args) => cmd_demo(args, config).await,
        Command::Serve(args) => cmd_serve(args, config).await,
        Command::Config => cmd_config(&config),
    }
}

/// Outcome of a demo run, kept apart from printing so it can be checked.
#[derive(Debug)]
pub struct DemoReport {
    pub created: Vec<(String, Address)>,
    pub adjacency: Vec<(Address, Address)>,
    pub first: PostsPage,
    pub rest: Option<PostsPage>,
    pub converged: bool,
}

fn agent_name(i: usize) -> String {
    AGENT_NAMES
        .get(i)
        .map(|n| n.to_string())
        .unwrap_or_else(|| format!("agent-{i}"))
}

pub async fn run_demo(args: &DemoArgs, config: &AgoraConfig) -> anyhow::Result<DemoReport> {
    if args.agents == 0 {
        bail!("the demo needs at least one agent");
    }

    let network = Network::new(config.network.clone());
    let mut agents: Vec<Arc<Agent>> = Vec::with_capacity(args.agents);
    for i in 0..args.agents {
        let name = agent_name(i);
        let mut agent_config = config.agent.clone();
        if let Some(dir) = &config.agent.data_dir {
            agent_config.data_dir = Some(dir.join(&name));
        }
        let agent = network
            .spawn_agent(&name, agent_config)
            .await
            .with_context(|| format!("starting agent {name}"))?;
        agents.push(agent);
    }

    let mut created = Vec::with_capacity(args.posts);
    for i in 0..args.posts {
        let author = &agents[i % agents.len()];
        let post = Post::new(format!("post {i}"), &args.base)
            .with_details(format!("demo post {i} from {}", author.name()))
            .with_type("demo")
            .with_timestamp(chrono::Utc::now().to_rfc3339());
        let stored = author.create(post).await?;
        created.push((author.name().to_string(), stored.address));
        network.await_consistency().await?;
    }

    let reader = &agents[0];
    let adjacency = reader.adjacency_list_for_base(&args.base)?;
    let converged = agents[1..]
        .iter()
        .map(|a| a.adjacency_list_for_base(&args.base))
        .collect::<Result<Vec<_>, _>>()?
        .iter()
        .all(|other| *other == adjacency);

    let first = reader.all_for_base(&args.base, &QueryOptions::all().limit(args.limit))?;
    let rest = match first.last_address() {
        Some(cursor) if first.more => {
            Some(reader.all_for_base(&args.base, &QueryOptions::all().since(cursor))?)
        }
        _ => None,
    };

    Ok(DemoReport {
        created,
        adjacency,
        first,
        rest,
        converged,
    })
}

async fn cmd_demo(args: DemoArgs, config: AgoraConfig) -> anyhow::Result<()> {
    let report = run_demo(&args, &config).await?;

    // Node 0 is the base anchor, posts follow in creation order.
    let mut index: HashMap<Address, usize> = HashMap::new();
    index.insert(base_anchor(&args.base), 0);
    for (i, (_, address)) in report.created.iter().enumerate() {
        index.insert(*address, i + 1);
    }
    let label = |a: &Address| {
        index
            .get(a)
            .map(|i| i.to_string())
            .unwrap_or_else(|| a.short())
    };

    println!("{} {} posts on {}", "Created".bold(), report.created.len(), args.base.yellow());
    for (i, (author, address)) in report.created.iter().enumerate() {
        println!("  {:>3}  {}  {}", i + 1, address.to_string().cyan(), author.dimmed());
    }

    println!("\n{}", "Adjacency".bold());
    for (from, to) in &report.adjacency {
        println!("  {} --> {}", label(from), label(to));
    }

    print_page(&format!("First page (limit {})", args.limit), &report.first, &label);
    if let Some(rest) = &report.rest {
        print_page("Next page", rest, &label);
    }

    if report.converged {
        println!("\n{} all replicas agree", "✓".green().bold());
    } else {
        println!("\n{} replicas diverged", "✗".red().bold());
    }
    Ok(())
}

fn print_page(title: &str, page: &PostsPage, label: &impl Fn(&Address) -> String) {
    println!("\n{}", title.bold());
    for post in &page.posts {
        println!("  {:>3}  {}", label(&post.address), post.post.title);
    }
    println!("  more: {}", if page.more { "yes".yellow() } else { "no".green() });
    for address in &page.unresolved {
        println!("  {} {}", "unresolved:".red(), address);
    }
}

async fn cmd_serve(args: ServeArgs, config: AgoraConfig) -> anyhow::Result<()> {
    let mut server_config = config.server;
    if let Some(bind) = args.bind {
        server_config.bind_addr = bind
            .parse()
            .with_context(|| format!("invalid bind address {bind:?}"))?;
    }
    if let Some(name) = args.name {
        server_config.agent_name = name;
    }

    let agent = Agent::open(&server_config.agent_name, config.agent)?;
    println!(
        "Agora agent {} ({}) on {}",
        server_config.agent_name.bold(),
        agent.id().short_id().cyan(),
        server_config.bind_addr.to_string().bold()
    );
    AgoraServer::new(server_config, Arc::new(agent)).serve().await?;
    Ok(())
}

fn cmd_config(config: &AgoraConfig) -> anyhow::Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}
