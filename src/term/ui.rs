use std::{borrow::Cow, fmt::Display};

use colored::{Color, Colorize};

use crate::git::{self, Change, EntryStatus, Optional, Ref};

const HEADER: Color = Color::TrueColor {
    r: 225,
    g: 190,
    b: 120,
};

pub fn message_with_icon(icon: Icon, message: impl Into<Cow<'static, str>>) -> Node {
    Node::Block(vec![
        Node::Icon(icon),
        Node::spacer(),
        Node::Text(message.into()),
    ])
}

#[derive(Debug)]
pub enum Attribute {
    CommitShort(git2::Oid),
    Branch(Cow<'static, str>),
    Remote(Cow<'static, str>),
}

impl Attribute {
    pub fn from_ref(reference: &Ref<'_>) -> Result<Attribute, git::Error> {
        if reference.is_remote() {
            Ok(Attribute::Remote(reference.shorthand()?.to_string().into()))
        } else if reference.is_branch() || reference.is_tag() {
            Ok(Attribute::Branch(reference.shorthand()?.to_string().into()))
        } else {
            match reference.target().optional()? {
                Some(oid) => Ok(Attribute::CommitShort(oid)),
                None => Ok(Attribute::Branch(reference.shorthand()?.to_string().into())),
            }
        }
    }
}

#[derive(Debug)]
pub enum Status {
    Warning,
    Success,
}

#[derive(Debug)]
pub enum Icon {
    Check,
    Warning,
    Current,
}

#[derive(Debug)]
pub enum Indicator {
    Unknown,
    New,
    Modified,
    Renamed,
    Deleted,
}

impl From<EntryStatus> for Indicator {
    fn from(status: EntryStatus) -> Self {
        match status {
            EntryStatus::WorkTree(change) | EntryStatus::Index(change) => match change {
                Change::New => Indicator::New,
                Change::Modified | Change::Type => Indicator::Modified,
                Change::Renamed => Indicator::Renamed,
                Change::Deleted => Indicator::Deleted,
            },
            EntryStatus::Unknown => Indicator::Unknown,
        }
    }
}

#[derive(Debug)]
pub enum Node {
    Icon(Icon),
    Label(Box<Node>),
    Block(Vec<Node>),
    Dimmed(Box<Node>),
    MultiLine(Vec<Node>),
    Indicator(Indicator),
    Text(Cow<'static, str>),
    Attribute(Attribute),
    Status(Status, Box<Node>),
    Group(Cow<'static, str>, Option<usize>, Box<Node>),
}

impl Node {
    pub fn spacer() -> Node {
        Node::Text(" ".into())
    }

    pub fn with_status(self, status: Status) -> Self {
        Node::Status(status, Box::new(self))
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Node::Dimmed(node) => write!(f, "{}", format!("{node}").bright_black()),
            Node::Text(text) => write!(f, "{}", text),
            Node::Block(children) => {
                for node in children {
                    write!(f, "{}", node)?;
                }

                Ok(())
            }
            Node::Attribute(attr) => match attr {
                Attribute::CommitShort(oid) => write!(
                    f,
                    "{}",
                    format!("{oid}")
                        .chars()
                        .take(7)
                        .collect::<String>()
                        .yellow()
                ),
                Attribute::Branch(name) => write!(f, "{}", format!(" {name}").blue()),
                Attribute::Remote(name) => write!(f, "{}", format!("⬡ {name}").cyan()),
            },
            Node::Group(heading, count, node) => {
                write!(f, "{}", format!("{heading}").color(HEADER).bold())?;

                if let Some(count) = count {
                    write!(f, " {}", format!("({})", count).dimmed())?;
                }

                write!(f, "\n{}", node)
            }
            Node::MultiLine(children) => {
                for (i, node) in children.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }

                    write!(f, "{}", node)?;
                }

                Ok(())
            }
            Node::Icon(icon) => match icon {
                Icon::Check => write!(f, "✓"),
                Icon::Warning => write!(f, "⚠"),
                Icon::Current => write!(f, "*"),
            },
            Node::Indicator(indicator) => match indicator {
                Indicator::Unknown => write!(f, "{}", "⚠".bright_black()),
                Indicator::New => write!(f, "{}", "✚".green()),
                Indicator::Modified => write!(f, "{}", "~".yellow()),
                Indicator::Renamed => write!(f, "{}", "➜".yellow()),
                Indicator::Deleted => write!(f, "{}", "✖".red()),
            },
            Node::Status(status, node) => {
                write!(
                    f,
                    "{}",
                    match status {
                        Status::Warning => format!("{node}").yellow(),
                        Status::Success => format!("{node}").green(),
                    }
                )
            }
            Node::Label(node) => write!(f, "{}{node}{}", "(".dimmed(), ")".dimmed()),
        }
    }
}
