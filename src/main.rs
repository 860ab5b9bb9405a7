use anyhow::Result;
use cit::Repository;
use cit::artifacts::merge::conflict::ResolutionStrategy;
use cit::artifacts::objects::commit::Commit;
use cit::artifacts::objects::object::Object;
use cit::artifacts::status::status_info::StatusInfo;
use clap::{Parser, Subcommand};
use colored::{Color, Colorize};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `CIT_LOG=debug`
const LOG_ENV: &str = "CIT_LOG";

#[derive(Parser)]
#[command(
    name = "cit",
    version = "0.1.0",
    author = "Sami Barbut-Dica",
    about = "A small content-addressed version control system",
    long_about = "cit tracks snapshots of a working tree in a local object store, \
    with branches, three-way merges and conflict resolution.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
",
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "init",
        about = "Initialize a new repository",
        long_about = "This command initializes a new repository in the current directory or at the specified path."
    )]
    Init {
        #[arg(index = 1, help = "The path to the repository")]
        path: Option<PathBuf>,
    },
    #[command(
        name = "add",
        about = "Stage files or directories",
        long_about = "This command records the current content of the given files, \
        or of every file below the given directories, in the staging area."
    )]
    Add {
        #[arg(index = 1, required = true, help = "The paths to stage")]
        paths: Vec<PathBuf>,
    },
    #[command(
        name = "commit",
        about = "Create a new commit with the specified message",
        long_about = "This command creates a new commit in the repository with the specified commit message."
    )]
    Commit {
        #[arg(short, long, help = "The commit message")]
        message: String,
    },
    #[command(name = "status", about = "Show the working tree status")]
    Status,
    #[command(name = "log", about = "Show the history of the current branch")]
    Log,
    #[command(name = "branch", about = "List, create or delete branches")]
    Branch {
        #[command(subcommand)]
        action: BranchAction,
    },
    #[command(
        name = "checkout",
        about = "Switch to another branch",
        long_about = "This command updates the working tree to the snapshot of the given branch \
        and makes it the current branch."
    )]
    Checkout {
        #[arg(index = 1, help = "The branch to switch to")]
        branch: String,
    },
    #[command(
        name = "merge",
        about = "Merge another branch into the current one",
        long_about = "This command performs a three-way merge of the given branch into the current branch. \
        Conflicting files are left with conflict markers and the merge is concluded by the next commit."
    )]
    Merge {
        #[arg(index = 1, help = "The branch to merge")]
        branch: String,
    },
    #[command(name = "resolve", about = "Resolve the conflict markers of a file")]
    Resolve {
        #[arg(index = 1, help = "The conflicted file")]
        path: PathBuf,
        #[arg(short, long, help = "ours, theirs or both")]
        strategy: String,
    },
    #[command(name = "conflicts", about = "List files that still carry conflict markers")]
    Conflicts,
    #[command(name = "remote", about = "Manage remotes")]
    Remote {
        #[command(subcommand)]
        action: RemoteAction,
    },
}

#[derive(Subcommand)]
enum BranchAction {
    #[command(about = "List branches")]
    List,
    #[command(about = "Create a branch at the current head")]
    Create { name: String },
    #[command(about = "Delete a branch")]
    Delete { name: String },
}

#[derive(Subcommand)]
enum RemoteAction {
    #[command(about = "Add a remote")]
    Add { name: String, url: String },
    #[command(about = "List remotes")]
    List,
    #[command(about = "Remove a remote")]
    Remove { name: String },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Init { path } => {
            let path = match path {
                Some(path) => path.clone(),
                None => std::env::current_dir()?,
            };
            let repository = Repository::init(&path)?;

            println!(
                "Initialized empty cit repository in {}",
                repository.metadata_path().display()
            );
        }
        Commands::Add { paths } => {
            let repository = open_repository()?;

            let pwd = std::env::current_dir()?;
            for path in paths {
                let report = repository.stage_path(pwd.join(path))?;
                for (file, reason) in &report.skipped {
                    eprintln!("{} {}: {}", "skipped".yellow(), file.display(), reason);
                }
            }
        }
        Commands::Commit { message } => {
            let repository = open_repository()?;
            let commit = repository.commit(message)?;
            let branch = repository.refs().current_branch()?;

            let root_marker = if commit.is_root() { "(root-commit) " } else { "" };
            println!(
                "[{} {}{}] {}",
                branch,
                root_marker,
                commit.object_id()?.to_short_oid(),
                commit.short_message()
            );
        }
        Commands::Status => {
            let repository = open_repository()?;
            print_status(&repository.status()?);
        }
        Commands::Log => {
            let repository = open_repository()?;
            for commit in repository.history()? {
                print_commit(&commit)?;
            }
        }
        Commands::Branch { action } => {
            let repository = open_repository()?;

            match action {
                BranchAction::List => {
                    for branch in repository.list_branches()? {
                        if branch.is_current {
                            println!("* {}", branch.name.to_string().green());
                        } else {
                            println!("  {}", branch.name);
                        }
                    }
                }
                BranchAction::Create { name } => {
                    repository.create_branch(name)?;
                }
                BranchAction::Delete { name } => {
                    let branch = repository.delete_branch(name)?;
                    let head = branch
                        .head
                        .map(|oid| oid.to_short_oid())
                        .unwrap_or_else(|| "unborn".to_string());
                    println!("Deleted branch {} (was {}).", branch.name, head);
                }
            }
        }
        Commands::Checkout { branch } => {
            let repository = open_repository()?;
            repository.checkout_branch(branch)?;

            println!("Switched to branch '{}'", branch);
        }
        Commands::Merge { branch } => {
            let repository = open_repository()?;
            let result = repository.merge(branch)?;

            for path in &result.conflicts {
                println!(
                    "{} Merge conflict in {}",
                    "CONFLICT (content):".red(),
                    path.display()
                );
            }
            println!("{}", result.message);

            if !result.success {
                std::process::exit(1);
            }
        }
        Commands::Resolve { path, strategy } => {
            let repository = open_repository()?;
            let strategy = strategy.parse::<ResolutionStrategy>()?;

            repository.resolve_conflict(std::env::current_dir()?.join(path), strategy)?;
        }
        Commands::Conflicts => {
            let repository = open_repository()?;
            for path in repository.conflict_status()? {
                println!("{}", path.display());
            }
        }
        Commands::Remote { action } => {
            let repository = open_repository()?;

            match action {
                RemoteAction::Add { name, url } => {
                    repository.add_remote(name, url)?;
                }
                RemoteAction::List => {
                    for remote in repository.list_remotes()? {
                        println!("{}\t{}", remote.name(), remote.url());
                    }
                }
                RemoteAction::Remove { name } => {
                    repository.remove_remote(name)?;
                }
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn open_repository() -> Result<Repository> {
    let pwd = std::env::current_dir()?;
    Repository::open(pwd)
}

fn print_status(status: &StatusInfo) {
    println!("On branch {}", status.current_branch);
    if status.last_commit.is_none() {
        println!("\nNo commits yet");
    }
    if let Some(merging) = &status.merging {
        println!("\nYou are merging '{}'; commit to conclude the merge", merging);
    }

    if status.is_clean() {
        println!("\nnothing to commit, working tree clean");
        return;
    }

    let staged = labelled("", &status.staged);
    let unstaged = [
        labelled("modified:   ", &status.modified),
        labelled("deleted:    ", &status.deleted),
    ]
    .concat();
    let untracked = labelled("", &status.untracked);

    print_section("Changes to be committed:", &staged, Color::Green);
    print_section("Changes not staged for commit:", &unstaged, Color::Red);
    print_section("Untracked files:", &untracked, Color::Red);
}

fn labelled(label: &str, paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|path| format!("{}{}", label, path.display()))
        .collect()
}

fn print_section(title: &str, lines: &[String], color: Color) {
    if lines.is_empty() {
        return;
    }

    println!("\n{}", title);
    for line in lines {
        println!("\t{}", line.color(color));
    }
}

fn print_commit(commit: &Commit) -> Result<()> {
    println!("{} {}", "commit".yellow(), commit.object_id()?.to_string().yellow());
    if commit.is_merge() {
        let parents = commit
            .parents()
            .iter()
            .map(|oid| oid.to_short_oid())
            .collect::<Vec<_>>()
            .join(" ");
        println!("Merge: {}", parents);
    }
    println!("Author: {}", commit.author().display_name());
    println!("Date:   {}", commit.author().readable_timestamp());
    println!();
    for line in commit.message().lines() {
        println!("    {}", line);
    }
    println!();

    Ok(())
}
