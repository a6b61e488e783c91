use std::error::Error;

use clap::Parser;

use crate::{
    changes::LocalChangesDirective,
    git::{Repo, Settings},
    plan::{CheckoutPlan, CheckoutRequest, NewBranchChoice},
    session::{self, QuickOutcome, Session},
    term::{
        self,
        ui::{self, Attribute, Icon, Indicator, Node, Status},
    },
};

#[derive(Parser)]
#[clap(about = "Switch branches")]
pub struct Opts {
    #[clap(help = "Branch to check out")]
    branch: Option<String>,

    #[clap(short, long, help = "Check out a remote-tracking branch")]
    remote: bool,

    #[clap(long, value_name = "REV", help = "Only offer branches containing this revision")]
    contains: Option<String>,

    #[clap(
        short = 'b',
        long,
        value_name = "NAME",
        conflicts_with_all = ["create_default", "reset_branch", "detach"],
        help = "Create a local branch with this name"
    )]
    create: Option<String>,

    #[clap(
        long,
        conflicts_with_all = ["reset_branch", "detach"],
        help = "Create a local branch with the proposed name"
    )]
    create_default: bool,

    #[clap(
        long,
        conflicts_with = "detach",
        help = "Reset (or create) the local branch with the same name"
    )]
    reset_branch: bool,

    #[clap(long, help = "Don't create a local branch")]
    detach: bool,

    #[clap(
        short,
        long,
        value_name = "ACTION",
        help = "What to do with local changes: dont-change, stash, merge or reset"
    )]
    changes: Option<LocalChangesDirective>,

    #[clap(short, long, help = "Ask before checking out, even when defaults apply")]
    interactive: bool,
}

impl Opts {
    fn has_choices(&self) -> bool {
        self.create.is_some()
            || self.create_default
            || self.reset_branch
            || self.detach
            || self.changes.is_some()
    }

    fn new_branch(&self, proposed: &str) -> Option<NewBranchChoice> {
        if let Some(name) = &self.create {
            Some(NewBranchChoice::Create(name.clone()))
        } else if self.create_default {
            Some(NewBranchChoice::Create(proposed.to_string()))
        } else if self.reset_branch {
            Some(NewBranchChoice::ResetExisting)
        } else if self.detach {
            Some(NewBranchChoice::DontCreate)
        } else {
            None
        }
    }
}

fn show_local_changes(repo: &Repo) -> Result<(), Box<dyn Error>> {
    let status = repo.status()?;
    let mut lines = vec![];

    for entry in status.entries() {
        lines.push(Node::Block(vec![
            Node::Indicator(Indicator::from(entry.status())),
            Node::spacer(),
            Node::Text(entry.path()?.to_string().into()),
        ]));
    }

    if !lines.is_empty() {
        let count = lines.len();
        println!(
            "{}\n",
            Node::Group("Local changes".into(), Some(count), Box::new(Node::MultiLine(lines)))
        );
    }

    Ok(())
}

fn report(repo: &Repo, plan: &CheckoutPlan) -> Result<(), Box<dyn Error>> {
    let head = repo.head()?;

    println!(
        "{}",
        Node::Block(vec![
            ui::message_with_icon(Icon::Check, "Checked out"),
            Node::spacer(),
            Node::Attribute(Attribute::from_ref(&head)?),
            Node::spacer(),
            Node::Dimmed(Box::new(Node::Label(Box::new(Node::Text(
                plan.to_string().into()
            ))))),
        ])
        .with_status(Status::Success)
    );

    Ok(())
}

fn prompt_plan(session: &mut Session<Repo>, opts: &Opts) -> Result<CheckoutPlan, Box<dyn Error>> {
    let (target, remote) = match &opts.branch {
        Some(branch) => (branch.clone(), opts.remote),
        None => {
            let listing = session.candidates(opts.remote)?;

            if listing.branches.is_empty() {
                return Err("no branches to check out".into());
            }

            let target = match listing.selected {
                Some(selected) => selected,
                None => term::select_branch(&listing.branches, listing.remote)?,
            };

            (target, listing.remote)
        }
    };

    let offered = session.offers_local_changes();
    let local_changes = match opts.changes {
        Some(changes) => changes,
        None if offered => {
            if session.is_dirty() {
                show_local_changes(session.backend())?;
            }

            let changes = term::select_local_changes(session.settings().local_changes)?;
            Settings::save_local_changes(&session.backend().config()?, changes)?;
            changes
        }
        None => session.settings().local_changes,
    };

    let mapping = session.mapping(&target, remote)?;
    let mut default = session.default_new_branch(&mapping);

    loop {
        let (new_branch, prompted) = match (remote, opts.new_branch(&mapping.proposed_name)) {
            (false, _) => (NewBranchChoice::DontCreate, false),
            (true, Some(choice)) => (choice, false),
            (true, None) => {
                let exists = session.local_branch_exists(&mapping.local_name)?;
                (term::select_new_branch(&mapping, &default, exists)?, true)
            }
        };

        let request = if remote {
            CheckoutRequest::remote(target.as_str(), new_branch.clone(), local_changes)
        } else {
            CheckoutRequest::local(target.as_str(), local_changes)
        };

        match session.plan(&request) {
            Ok(plan) => return Ok(plan),
            Err(session::Error::Plan(e)) if prompted => {
                println!(
                    "{}",
                    ui::message_with_icon(Icon::Warning, e.to_string()).with_status(Status::Warning)
                );
                default = new_branch;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

pub fn run(repo: Repo, opts: Opts) -> Result<(), Box<dyn Error>> {
    let settings = Settings::try_from(repo.config()?)?;
    let mut session = Session::new(repo, settings, opts.contains.clone())?;

    if !opts.interactive && !opts.has_choices() {
        if let Some(branch) = &opts.branch {
            match session.quick_checkout(branch, opts.remote)? {
                QuickOutcome::Done(plan) => return report(session.backend(), &plan),
                QuickOutcome::NeedsPrompt => {
                    tracing::debug!(branch = branch.as_str(), "checkout needs a prompt")
                }
            }
        }
    }

    let plan = prompt_plan(&mut session, &opts)?;
    session.execute(&plan)?;

    report(session.backend(), &plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Parser)]
    struct Cli {
        #[clap(flatten)]
        opts: Opts,
    }

    fn parse(args: &[&str]) -> Result<Opts, clap::Error> {
        Cli::try_parse_from(std::iter::once("checkout").chain(args.iter().copied()))
            .map(|cli| cli.opts)
    }

    #[test]
    fn test_new_branch_flags() {
        let opts = parse(&["origin/dev", "-r", "-b", "mine"]).unwrap();
        assert_eq!(
            opts.new_branch("origin_dev"),
            Some(NewBranchChoice::Create("mine".to_string()))
        );
        assert!(opts.has_choices());

        let opts = parse(&["origin/dev", "-r", "--create-default"]).unwrap();
        assert_eq!(
            opts.new_branch("origin_dev"),
            Some(NewBranchChoice::Create("origin_dev".to_string()))
        );

        let opts = parse(&["origin/dev", "-r", "--reset-branch"]).unwrap();
        assert_eq!(opts.new_branch("origin_dev"), Some(NewBranchChoice::ResetExisting));

        let opts = parse(&["origin/dev", "-r"]).unwrap();
        assert_eq!(opts.new_branch("origin_dev"), None);
        assert!(!opts.has_choices());
    }

    #[test]
    fn test_conflicting_flags() {
        assert!(parse(&["origin/dev", "-b", "x", "--detach"]).is_err());
        assert!(parse(&["origin/dev", "--reset-branch", "--detach"]).is_err());
    }

    #[test]
    fn test_changes_flag() {
        let opts = parse(&["main", "-c", "stash"]).unwrap();
        assert_eq!(opts.changes, Some(LocalChangesDirective::Stash));

        assert!(parse(&["main", "-c", "rebase"]).is_err());
    }
}
