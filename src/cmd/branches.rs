use std::error::Error;

use clap::Parser;

use crate::{
    catalog::RefKind,
    git::{Repo, Settings},
    session::Session,
    term::ui::{Attribute, Icon, Node, Status},
};

#[derive(Parser)]
#[clap(about = "List branches that can be checked out")]
pub struct Opts {
    #[clap(short, long, help = "List remote-tracking branches")]
    remote: bool,

    #[clap(long, value_name = "REV", help = "Only list branches containing this revision")]
    contains: Option<String>,
}

pub fn run(repo: Repo, opts: Opts) -> Result<(), Box<dyn Error>> {
    let settings = Settings {
        check_dirty: false,
        ..Settings::try_from(repo.config()?)?
    };
    let current = repo
        .head()
        .ok()
        .filter(|head| head.is_branch())
        .and_then(|head| head.shorthand().ok().map(str::to_string));

    let mut session = Session::new(repo, settings, opts.contains)?;
    let listing = session.candidates(opts.remote)?;

    let heading = if listing.remote {
        "Remote branches"
    } else {
        "Branches"
    };
    let lines = listing
        .branches
        .iter()
        .map(|branch| {
            let name = branch.name().to_string();
            let is_current = current.as_deref() == Some(branch.name());
            let attribute = match branch.kind() {
                RefKind::Remote => Attribute::Remote(name.into()),
                RefKind::Local | RefKind::Tag => Attribute::Branch(name.into()),
            };
            let node = Node::Block(vec![
                if is_current {
                    Node::Icon(Icon::Current)
                } else {
                    Node::spacer()
                },
                Node::spacer(),
                Node::Attribute(attribute),
            ]);

            if is_current {
                node.with_status(Status::Success)
            } else {
                node
            }
        })
        .collect::<Vec<_>>();

    println!(
        "{}",
        Node::Group(
            heading.into(),
            Some(lines.len()),
            Box::new(Node::MultiLine(lines))
        )
    );

    Ok(())
}
