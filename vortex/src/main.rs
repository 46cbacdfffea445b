use clap::ArgMatches;
use colored::Colorize;
use commands::command_argument_builder;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;
use vortex::handlers::{
    build_client, describe_error, format_notification_line, format_reply, format_topic_line,
    print_banner, resolve_data_dir, strip_tags,
};
use vortex_client::ClientError;

mod commands;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    if chosen_command.subcommand().is_none() {
        // No subcommand provided, just show the banner
        return;
    }

    tracing_subscriber::fmt::init();

    let data_dir = resolve_data_dir(
        chosen_command
            .get_one::<String>("data-dir")
            .expect("data-dir has a default"),
    );

    let result = match chosen_command.subcommand() {
        Some(("hot", _)) => handle_hot(&data_dir).await,
        Some(("topic", sub)) => handle_topic(&data_dir, sub).await,
        Some(("node", sub)) => handle_node(&data_dir, sub).await,
        Some(("login", sub)) => handle_login(&data_dir, sub).await,
        Some(("checkin", _)) => handle_checkin(&data_dir).await,
        Some(("reply", sub)) => handle_reply(&data_dir, sub).await,
        Some(("notifications", sub)) => handle_notifications(&data_dir, sub).await,
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(error) = result {
        let message = match error.downcast_ref::<ClientError>() {
            Some(client_error) => describe_error(client_error),
            None => error.to_string(),
        };
        eprintln!("{} {}", "✗".red(), message);
        std::process::exit(1);
    }
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message.to_string());
    pb
}

fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

async fn handle_hot(data_dir: &Path) -> anyhow::Result<()> {
    let client = build_client(data_dir)?;
    let pb = spinner("fetching today's hot topics");
    let topics = client.hot_topics().await?;
    pb.finish_and_clear();

    for (index, topic) in topics.iter().enumerate() {
        println!(
            "{:>3}. {} {}  {}",
            index + 1,
            topic.title.bold(),
            format!("[{}]", topic.replies).cyan(),
            topic.member.username.green()
        );
    }
    Ok(())
}

async fn handle_topic(data_dir: &Path, args: &ArgMatches) -> anyhow::Result<()> {
    let id = args.get_one::<String>("id").unwrap();
    let page = *args.get_one::<i64>("page").unwrap();

    let client = build_client(data_dir)?;
    let pb = spinner("fetching topic");
    let topic = client.topic(id, page).await?;
    pb.finish_and_clear();

    let detail = &topic.data;
    println!("{}", detail.title.bold());
    if let Some(author) = &detail.author {
        println!("{} {}", "by".dimmed(), author.username.green());
    }
    if !detail.content.is_empty() {
        println!("\n{}\n", strip_tags(&detail.content));
    }
    for reply in &detail.replies {
        println!("{}", format_reply(reply));
    }
    if detail.pagination.maximum_page > 1 {
        println!(
            "\n{}",
            format!(
                "page {}/{}",
                detail.pagination.current_page, detail.pagination.maximum_page
            )
            .dimmed()
        );
    }
    Ok(())
}

async fn handle_node(data_dir: &Path, args: &ArgMatches) -> anyhow::Result<()> {
    let name = args.get_one::<String>("name").unwrap();
    let page = *args.get_one::<i64>("page").unwrap();

    let client = build_client(data_dir)?;
    let pb = spinner("fetching node listing");
    let listing = client.node_topics(name, page).await?;
    pb.finish_and_clear();

    for (index, item) in listing.data.items.iter().enumerate() {
        println!("{}", format_topic_line(index + 1, item));
    }
    Ok(())
}

async fn handle_login(data_dir: &Path, args: &ArgMatches) -> anyhow::Result<()> {
    let username = args.get_one::<String>("username").unwrap();

    let client = build_client(data_dir)?;
    let pb = spinner("fetching sign-in form");
    let form = client.login_form().await?;
    let image = client.captcha_image(&form.data).await?;
    pb.finish_and_clear();

    let captcha_file = data_dir.join("captcha.png");
    fs::create_dir_all(data_dir)?;
    fs::write(&captcha_file, &image)?;
    println!("Captcha image saved to {}", captcha_file.display());

    let captcha = prompt("Captcha")?;
    let password = prompt("Password")?;

    let pb = spinner("signing in");
    let landing = client.login(&form.data, username, &password, &captcha).await?;
    pb.finish_and_clear();

    println!("{} signed in as {}", "✓".green(), username.bold());
    if let Some(first) = landing.data.items.first() {
        println!("  latest: {}", first.title);
    }
    Ok(())
}

async fn handle_checkin(data_dir: &Path) -> anyhow::Result<()> {
    let client = build_client(data_dir)?;
    let pb = spinner("checking the daily mission");
    let mission = client.daily_mission().await?;
    pb.finish_and_clear();

    if mission.data.claimed() {
        println!("{} already checked in. {}", "✓".green(), mission.data.streak_text);
        return Ok(());
    }

    // the redeem token is page-scoped; it comes from the page we just
    // fetched, never from anywhere else
    let Some(once) = mission.data.once() else {
        anyhow::bail!("the mission page offered no redeem token");
    };

    let pb = spinner("redeeming");
    let after = client.check_in(&once).await?;
    pb.finish_and_clear();

    println!("{} checked in. {}", "✓".green(), after.data.streak_text);
    Ok(())
}

async fn handle_reply(data_dir: &Path, args: &ArgMatches) -> anyhow::Result<()> {
    let id = args.get_one::<String>("id").unwrap();
    let message = args.get_one::<String>("message").unwrap();

    let client = build_client(data_dir)?;
    let pb = spinner("fetching the reply token");
    let topic = client.topic(id, 1).await?;
    pb.finish_and_clear();

    if topic.data.once.is_empty() {
        anyhow::bail!("no reply token on the topic page; sign in first");
    }

    let pb = spinner("posting reply");
    let after = client.reply(id, message, &topic.data.once).await?;
    pb.finish_and_clear();

    println!(
        "{} replied to {} ({} replies now)",
        "✓".green(),
        after.data.title.bold(),
        after.data.replies.len()
    );
    Ok(())
}

async fn handle_notifications(data_dir: &Path, args: &ArgMatches) -> anyhow::Result<()> {
    let page = *args.get_one::<i64>("page").unwrap();

    let client = build_client(data_dir)?;
    let pb = spinner("fetching notifications");
    let notifications = client.notifications(page).await?;
    pb.finish_and_clear();

    if notifications.data.total > 0 {
        println!("{} notifications\n", notifications.data.total);
    }
    for item in &notifications.data.items {
        println!("{}", format_notification_line(item));
    }
    Ok(())
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
