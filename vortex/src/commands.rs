use crate::CLAP_STYLING;
use clap::{arg, command};

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("vortex")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("vortex")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(
            arg!(-d --"data-dir" <PATH>)
                .required(false)
                .help("Directory holding the saved session (cookie snapshot, captcha image)")
                .default_value("~/.config/vortex/"),
        )
        .subcommand_required(false)
        .subcommand(command!("hot").about("Show today's hot topics"))
        .subcommand(
            command!("topic")
                .about("Show a topic and its replies")
                .arg(arg!(-i --"id" <ID>).required(true).help("The topic id"))
                .arg(
                    arg!(-p --"page" <PAGE>)
                        .required(false)
                        .help("Reply page to fetch")
                        .value_parser(clap::value_parser!(i64))
                        .default_value("1"),
                ),
        )
        .subcommand(
            command!("node")
                .about("Show the latest topics in a node")
                .arg(arg!(-n --"name" <NAME>).required(true).help("The node name, e.g. python"))
                .arg(
                    arg!(-p --"page" <PAGE>)
                        .required(false)
                        .help("Listing page to fetch")
                        .value_parser(clap::value_parser!(i64))
                        .default_value("1"),
                ),
        )
        .subcommand(
            command!("login")
                .about("Sign in and save the session for later commands")
                .arg(
                    arg!(-u --"username" <USERNAME>)
                        .required(true)
                        .help("Your username or email address"),
                ),
        )
        .subcommand(command!("checkin").about("Redeem the daily sign-in mission"))
        .subcommand(
            command!("reply")
                .about("Reply to a topic")
                .arg(arg!(-i --"id" <ID>).required(true).help("The topic id"))
                .arg(
                    arg!(-m --"message" <MESSAGE>)
                        .required(true)
                        .help("The reply content"),
                ),
        )
        .subcommand(
            command!("notifications")
                .about("Show your notifications")
                .arg(
                    arg!(-p --"page" <PAGE>)
                        .required(false)
                        .help("Notification page to fetch")
                        .value_parser(clap::value_parser!(i64))
                        .default_value("1"),
                ),
        )
}
