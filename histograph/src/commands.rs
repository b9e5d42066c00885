use crate::CLAP_STYLING;
use clap::{arg, command};

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("histograph")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("histograph")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Initializes the histograph config directory and cluster names database")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Location of the config directory")
                        .default_value("~/.config/histograph/"),
                )
                .arg(
                    arg!(-f --"force")
                        .help("Overwrite any existing names database at the specified location.")
                        .required(false),
                ),
        )
        .subcommand(
            command!("graph")
                .about(
                    "Build the domain graph for a time horizon, cluster it and print or save \
                the result.",
                )
                .arg(
                    arg!(-d --"days" <DAYS>)
                        .required(false)
                        .help("Horizon in days, counted back from now")
                        .value_parser(clap::value_parser!(u32))
                        .default_value("7"),
                )
                .arg(
                    arg!(--"history" <PATH>)
                        .required(false)
                        .help("Path to a Chromium 'History' SQLite database")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .conflicts_with("records"),
                )
                .arg(
                    arg!(--"records" <FILE>)
                        .required(false)
                        .help("Path to a JSON array of {url, lastVisitTime} records")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .conflicts_with("history"),
                )
                .arg(
                    arg!(--"page-size" <NUM>)
                        .required(false)
                        .help("Maximum records requested per history query")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("1000"),
                )
                .arg(
                    arg!(--"max-passes" <NUM>)
                        .required(false)
                        .help("Upper bound on label propagation passes")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("100"),
                )
                .arg(
                    arg!(--"delete-cluster" <LABEL>)
                        .required(false)
                        .help("Remove a cluster (by label) from the graph; may be repeated")
                        .action(clap::ArgAction::Append),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                )
                .arg(
                    arg!(--"config-dir" <PATH>)
                        .required(false)
                        .help("Config directory holding the cluster names database")
                        .default_value("~/.config/histograph/"),
                ),
        )
        .subcommand(
            command!("name")
                .about("Give a cluster a display name")
                .arg(
                    arg!(-l --"label" <LABEL>)
                        .required(true)
                        .help("The cluster label (the domain that labels it)"),
                )
                .arg(
                    arg!(-n --"name" <NAME>)
                        .required(true)
                        .help("The display name"),
                )
                .arg(
                    arg!(--"config-dir" <PATH>)
                        .required(false)
                        .help("Config directory holding the cluster names database")
                        .default_value("~/.config/histograph/"),
                ),
        )
        .subcommand(
            command!("names").about("List named clusters").arg(
                arg!(--"config-dir" <PATH>)
                    .required(false)
                    .help("Config directory holding the cluster names database")
                    .default_value("~/.config/histograph/"),
            ),
        )
}
