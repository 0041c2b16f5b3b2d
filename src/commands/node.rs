use std::path::PathBuf;

/// A fully resolved command ready to launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Entrypoint tokens with placeholders substituted.
    pub argv: Vec<String>,
    /// `KEY=VALUE` lines, global ones first; later lines win.
    pub env: Vec<String>,
    /// The configuration file the command was declared in.
    pub source: PathBuf,
}

/// Either something to run or a group of further commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Run(Invocation),
    Group(Vec<ResolvedCommand>),
}

/// One node of the invocable command tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCommand {
    pub name: String,
    pub usage: String,
    pub description: String,
    pub aliases: Vec<String>,
    pub hidden: bool,
    pub action: Action,
}

impl ResolvedCommand {
    /// Child commands, empty for runnable commands.
    #[must_use]
    pub fn children(&self) -> &[ResolvedCommand] {
        match &self.action {
            Action::Group(children) => children,
            Action::Run(_) => &[],
        }
    }

    #[must_use]
    pub fn invocation(&self) -> Option<&Invocation> {
        match &self.action {
            Action::Run(invocation) => Some(invocation),
            Action::Group(_) => None,
        }
    }

    /// True if `name` is this command's name or one of its aliases.
    #[must_use]
    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|alias| alias == name)
    }

    /// Follows a path of names (or aliases) down from a list of commands.
    #[must_use]
    pub fn find<'a, S: AsRef<str>>(
        commands: &'a [ResolvedCommand],
        path: &[S],
    ) -> Option<&'a ResolvedCommand> {
        let (first, rest) = path.split_first()?;
        let command = commands.iter().find(|c| c.answers_to(first.as_ref()))?;
        if rest.is_empty() {
            Some(command)
        } else {
            Self::find(command.children(), rest)
        }
    }
}
