//! Implementations of the CLI subcommands.
//!
//! Each command is a thin shell over `ConfigFile` or `Notifier`. User-facing
//! output goes to stdout; diagnostics go through `tracing`.

use crate::cli::{AddCommand, Command, RemoveCommand, SendArgs};
use crate::config::Settings;
use crate::core::{Configuration, Destination, Destinations, DispatchResult, NotifyDefaults};
use crate::notification::MessageOptions;
use crate::notifier::Notifier;
use crate::store::{ConfigFile, Mutation};
use crate::topic::generate_topic;
use anyhow::{bail, Context, Result};
use std::fmt;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use tracing::debug;

/// Runs a parsed command with the resolved settings.
pub async fn run(command: Command, settings: &Settings) -> Result<ExitCode> {
    debug!(?command, ?settings, "Running command");
    let file = ConfigFile::locate(&settings.conf_path);
    match command {
        Command::Init { force } => init(&file, settings, force),
        Command::Clean { force } => clean(&file, force),
        Command::Add(add) => add_entry(&file, add),
        Command::Remove(remove) => remove_entry(&file, remove),
        Command::Send(args) => send(args, settings).await,
        Command::NewTopic { save } => new_topic(&file, save),
        Command::Show => show(&file),
    }
}

fn init(file: &ConfigFile, settings: &Settings, force: bool) -> Result<ExitCode> {
    if file.exists() && !force {
        bail!(
            "Config file already exists at {}, use --force to overwrite it",
            file.path().display()
        );
    }
    let topic = generate_topic();
    println!("Your first topic is {topic}. Use it to subscribe to notifications!");

    let config = Configuration {
        destinations: Destinations::from_parts([topic], Vec::<String>::new()),
        defaults: NotifyDefaults::stock(),
        base_url: settings.base_url.clone(),
    };
    file.save(&config)?;
    println!("Config file created at {}", file.path().display());
    Ok(ExitCode::SUCCESS)
}

fn clean(file: &ConfigFile, force: bool) -> Result<ExitCode> {
    if !file.exists() {
        bail!("Config file does not exist at {}", file.path().display());
    }
    if !force && !confirm(&format!("Delete {}?", file.path().display()))? {
        bail!("Aborted");
    }
    file.delete()?;
    println!("Config file removed from {}", file.path().display());
    Ok(ExitCode::SUCCESS)
}

fn confirm(question: &str) -> Result<bool> {
    print!("{question} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("failed to read confirmation")?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn add_entry(file: &ConfigFile, command: AddCommand) -> Result<ExitCode> {
    let path = file.path().display();
    match command {
        AddCommand::Topic { topic } => {
            let outcome = file.add_destination(Destination::topic(&topic))?;
            report_destination_added(outcome, "Topic", &topic, &path);
        }
        AddCommand::Email { email } => {
            let outcome = file.add_destination(Destination::email(&email))?;
            report_destination_added(outcome, "Email", &email, &path);
        }
        AddCommand::Default { key, value } => match file.add_default(&key, &value)? {
            Mutation::Updated { previous } => {
                println!("Default {key}={value} replaced {key}={previous} in {path}")
            }
            Mutation::AlreadyPresent => println!("Default {key}={value} already set in {path}"),
            _ => println!("Default {key}={value} added to {path}"),
        },
    }
    Ok(ExitCode::SUCCESS)
}

fn report_destination_added(outcome: Mutation, kind: &str, value: &str, path: &dyn fmt::Display) {
    match outcome {
        Mutation::AlreadyPresent => println!("{kind} {value} already exists in {path}"),
        _ => println!("{kind} {value} added to {path}"),
    }
}

fn remove_entry(file: &ConfigFile, command: RemoveCommand) -> Result<ExitCode> {
    let path = file.path().display();
    let (label, outcome) = match command {
        RemoveCommand::Topic { topic } => (
            format!("Topic {topic}"),
            file.remove_destination(&Destination::topic(&topic))?,
        ),
        RemoveCommand::Email { email } => (
            format!("Email {email}"),
            file.remove_destination(&Destination::email(&email))?,
        ),
        RemoveCommand::Default { key } => (format!("Default {key}"), file.remove_default(&key)?),
    };
    match outcome {
        Mutation::NotFound => println!("{label} not found in {path}, ignoring"),
        Mutation::Removed {
            previous: Some(value),
        } => println!("{label}={value} removed from {path}"),
        _ => println!("{label} removed from {path}"),
    }
    Ok(ExitCode::SUCCESS)
}

async fn send(args: SendArgs, settings: &Settings) -> Result<ExitCode> {
    let mut builder = Notifier::builder(&settings.conf_path)
        .topics(args.topics)
        .emails(args.emails)
        .write(false)
        .warnings(false)
        .debug(settings.debug);
    if let Some(base_url) = &settings.base_url {
        builder = builder.base_url(base_url.clone());
    }
    let notifier = builder.build()?;
    if let Some(topic) = notifier.generated_topic() {
        println!("No destination configured, sending to new topic {topic}");
    }

    let options = MessageOptions {
        title: args.title,
        priority: args.priority,
        tags: args.tags,
        click: args.click,
        attach: args.attach,
        actions: args.actions,
        icon: args.icon,
        ..Default::default()
    };
    let message = args.message.unwrap_or_default();
    let results = notifier.notify_with(&message, &options).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for result in &results {
            print_result(result);
        }
    }

    if results.iter().all(|r| r.success) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn print_result(result: &DispatchResult) {
    let status = result
        .status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string());
    if result.success {
        println!("Sent to {} ({status})", result.destination);
    } else {
        println!(
            "Failed to send to {} ({status}): {}",
            result.destination, result.status_detail
        );
    }
    if let Some(exchange) = &result.exchange {
        println!("  {} {}", exchange.method, exchange.url);
        for (name, value) in &exchange.request_headers {
            println!("  > {name}: {value}");
        }
        if let Some(body) = &exchange.response_body {
            println!("  < {body}");
        }
    }
}

fn new_topic(file: &ConfigFile, save: bool) -> Result<ExitCode> {
    let topic = generate_topic();
    println!("Topic: {topic}");
    if save {
        file.add_destination(Destination::topic(&topic))?;
        println!("Topic {topic} added to {}", file.path().display());
    }
    Ok(ExitCode::SUCCESS)
}

fn show(file: &ConfigFile) -> Result<ExitCode> {
    let Some(config) = file.load()? else {
        println!("No config file at {}", file.path().display());
        return Ok(ExitCode::SUCCESS);
    };
    let topics: Vec<&str> = config.destinations.topics().collect();
    let emails: Vec<&str> = config.destinations.emails().collect();
    println!("Config file: {}", file.path().display());
    println!("Server: {}", config.base_url());
    println!("Topics: {}", topics.join(", "));
    println!("Emails: {}", emails.join(", "));
    for (key, value) in config.defaults.iter() {
        println!("Default {key} = {value}");
    }
    Ok(ExitCode::SUCCESS)
}
