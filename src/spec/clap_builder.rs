use clap::{Arg, ArgAction, Command as ClapCommand};

use super::{Action, Arity, CommandSpec, ValueHint};

/// Builds a spec tree from a clap command.
///
/// The command is cloned and built first so that clap's implicit
/// `--help`/`--version` flags, the `help` sub-command and the resolved
/// `num_args` ranges are visible. Arguments become actions in declaration
/// order; sub-commands recurse.
///
/// # Examples
///
/// ```rust
/// use clap::{Arg, Command};
/// use argcomp::spec::from_clap;
///
/// let cmd = Command::new("tool")
///     .arg(Arg::new("color").long("color").value_parser(["auto", "always", "never"]))
///     .subcommand(Command::new("build"));
///
/// let spec = from_clap(&cmd);
/// assert!(spec.find_flag("--color").is_some());
/// assert!(spec.find_subcommand("build").is_some());
/// ```
pub fn from_clap(command: &ClapCommand) -> CommandSpec {
    let mut command = command.clone();
    command.build();
    convert_command(&command)
}

fn convert_command(command: &ClapCommand) -> CommandSpec {
    let mut spec = CommandSpec::new(command.get_name());
    spec.aliases = command.get_all_aliases().map(str::to_string).collect();
    spec.help = command.get_about().map(|about| about.to_string());

    // clap lists positionals by index, flags in declaration order
    spec.actions = command
        .get_arguments()
        .filter(|arg| !arg.is_positional())
        .chain(command.get_positionals())
        .filter_map(convert_arg)
        .collect();

    spec.subcommands = command
        .get_subcommands()
        .filter(|sub| !sub.is_hide_set())
        .map(convert_command)
        .collect();

    spec
}

fn convert_arg(arg: &Arg) -> Option<Action> {
    let mut action = if arg.is_positional() {
        Action::positional(arg.get_id().as_str())
    } else {
        let names = flag_names(arg);
        if names.is_empty() {
            return None;
        }
        Action::flag(names)
    };

    action.arity = arity_of(arg);
    action.repeatable = matches!(arg.get_action(), ArgAction::Append | ArgAction::Count);
    action.hidden = arg.is_hide_set();
    action.terminator = arg.is_last_set();
    action.help = arg.get_help().map(|help| help.to_string());
    action.choices = arg
        .get_possible_values()
        .iter()
        .filter(|value| !value.is_hide_set())
        .map(|value| value.get_name().to_string())
        .collect();
    action.value_hint = match arg.get_value_hint() {
        clap::ValueHint::DirPath => ValueHint::DirPath,
        clap::ValueHint::FilePath | clap::ValueHint::AnyPath | clap::ValueHint::ExecutablePath => {
            ValueHint::FilePath
        }
        clap::ValueHint::Unknown => ValueHint::Any,
        _ => ValueHint::Nothing,
    };

    Some(action)
}

fn flag_names(arg: &Arg) -> Vec<String> {
    let mut names = Vec::new();
    if let Some(short) = arg.get_short() {
        names.push(format!("-{short}"));
    }
    if let Some(aliases) = arg.get_all_short_aliases() {
        names.extend(aliases.into_iter().map(|c| format!("-{c}")));
    }
    if let Some(long) = arg.get_long() {
        names.push(format!("--{long}"));
    }
    if let Some(aliases) = arg.get_all_aliases() {
        names.extend(aliases.into_iter().map(|a| format!("--{a}")));
    }
    names
}

fn arity_of(arg: &Arg) -> Arity {
    if !arg.get_action().takes_values() {
        return Arity::Zero;
    }
    let Some(range) = arg.get_num_args() else {
        return Arity::One;
    };
    let (min, max) = (range.min_values(), range.max_values());
    match (min, max) {
        (_, 0) => Arity::Zero,
        (0, 1) => Arity::Optional,
        (1, 1) => Arity::One,
        (0, usize::MAX) => Arity::ZeroOrMore,
        (1, usize::MAX) => Arity::OneOrMore,
        (n, m) if n == m => Arity::Exactly(n),
        (0, _) => Arity::ZeroOrMore,
        _ => Arity::OneOrMore,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_command() -> ClapCommand {
        ClapCommand::new("deployctl")
            .about("Deployment control")
            .arg(
                Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .action(ArgAction::Count),
            )
            .arg(
                Arg::new("protocol")
                    .long("protocol")
                    .value_parser(["http", "https", "ssh"]),
            )
            .arg(
                Arg::new("workdir")
                    .long("workdir")
                    .value_hint(clap::ValueHint::DirPath),
            )
            .arg(Arg::new("secret").long("secret").hide(true))
            .subcommand(
                ClapCommand::new("build")
                    .visible_alias("b")
                    .arg(Arg::new("targets").num_args(1..)),
            )
            .subcommand(ClapCommand::new("deploy"))
    }

    #[test]
    fn test_flags_and_builtins() {
        let spec = from_clap(&sample_command());

        let (_, verbose) = spec.find_flag("--verbose").unwrap();
        assert!(verbose.matches("-v"));
        assert!(verbose.repeatable);
        assert_eq!(verbose.arity, Arity::Zero);

        assert!(spec.find_flag("--help").is_some());
        assert!(spec.find_flag("--secret").unwrap().1.hidden);
    }

    #[test]
    fn test_choices_and_hints() {
        let spec = from_clap(&sample_command());

        let (_, protocol) = spec.find_flag("--protocol").unwrap();
        assert_eq!(protocol.arity, Arity::One);
        assert_eq!(protocol.choices, vec!["http", "https", "ssh"]);

        let (_, workdir) = spec.find_flag("--workdir").unwrap();
        assert_eq!(workdir.value_hint, ValueHint::DirPath);
    }

    #[test]
    fn test_subcommands_and_positionals() {
        let spec = from_clap(&sample_command());

        let build = spec.find_subcommand("b").unwrap();
        assert_eq!(build.name, "build");
        let positional = &build.actions[build.positional_indices()[0]];
        assert_eq!(positional.dest(), "targets");
        assert_eq!(positional.arity, Arity::OneOrMore);

        assert!(spec.find_subcommand("deploy").is_some());
    }

    #[test]
    fn test_converted_tree_validates() {
        let spec = from_clap(&sample_command());
        assert!(spec.validate().is_ok());
    }
}
