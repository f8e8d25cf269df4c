use clap::{Arg, ArgAction, ArgMatches, Command};

fn context_arg() -> Arg {
    Arg::new("context")
        .long("context")
        .short('c')
        .help("Chat context id (defaults to the last selected chat)")
}

pub fn build_cli() -> Command {
    Command::new("tether")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Watch and talk to a chat-style agent backend from the terminal")
        .long_about("tether keeps a live copy of the conversation log an agent backend produces for the active chat. It polls fast right after activity and slowly when idle, and lets you send messages, switch chats and pause the agent.")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("url")
                .long("url")
                .help("Backend base URL (overrides config)")
                .global(true),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("watch")
                .about("Follow the active chat and send each input line as a message")
                .arg(context_arg())
        )
        .subcommand(
            Command::new("send")
                .about("Send one message to a chat")
                .arg(
                    Arg::new("text")
                        .help("Message text")
                        .required(true)
                        .num_args(1..)
                        .index(1)
                )
                .arg(context_arg())
        )
        .subcommand(
            Command::new("chats")
                .about("List the chats known to the backend")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Output in JSON format")
                        .action(ArgAction::SetTrue)
                )
        )
        .subcommand(
            Command::new("new")
                .about("Start a fresh chat and make it the selected one")
        )
        .subcommand(
            Command::new("select")
                .about("Make a chat the selected one and print its log")
                .arg(
                    Arg::new("id")
                        .help("Chat context id")
                        .required(true)
                        .index(1)
                )
        )
        .subcommand(
            Command::new("reset")
                .about("Clear the history of a chat")
                .arg(context_arg())
        )
        .subcommand(
            Command::new("remove")
                .about("Delete a chat on the backend")
                .arg(
                    Arg::new("id")
                        .help("Chat context id")
                        .required(true)
                        .index(1)
                )
        )
        .subcommand(
            Command::new("pause")
                .about("Pause the agent working on a chat")
                .arg(context_arg())
        )
        .subcommand(
            Command::new("resume")
                .about("Resume a paused agent")
                .arg(context_arg())
        )
        .subcommand(
            Command::new("nudge")
                .about("Wake the agent of a chat when it looks stuck")
                .arg(context_arg())
        )
        .subcommand(
            Command::new("restart")
                .about("Restart the backend and wait until it answers again")
        )
        .subcommand(
            Command::new("save")
                .about("Export a chat to <context>.json")
                .arg(context_arg())
                .arg(
                    Arg::new("dir")
                        .long("dir")
                        .short('d')
                        .help("Directory to write the chat file to")
                        .default_value(".")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                )
        )
        .subcommand(
            Command::new("load")
                .about("Load exported chat files and select the first one")
                .arg(
                    Arg::new("files")
                        .help("Chat files written by 'tether save'")
                        .required(true)
                        .num_args(1..)
                        .index(1)
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                )
        )
        .subcommand(
            Command::new("speech")
                .about("Turn reading responses aloud on or off")
                .arg(
                    Arg::new("state")
                        .help("on or off")
                        .required(true)
                        .index(1)
                        .value_parser(["on", "off"])
                )
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .help("Target shell")
                        .required(true)
                        .index(1)
                        .value_parser(clap::value_parser!(clap_complete::Shell))
                )
        )
}

#[allow(dead_code)]
pub fn get_matches() -> ArgMatches {
    build_cli().get_matches()
}
