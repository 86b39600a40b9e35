use clap::{Parser, Subcommand};

#[derive(Parser)]
#[clap(
    author = "nullishamy",
    version = "0.1",
    about = "Introspects remote interface metadata from a JSON schema"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand)]
pub enum CliCommand {
    #[clap(about = "Examines a single interface declared in a schema file")]
    Examine {
        #[clap(value_name = "SCHEMA")]
        schema: String,

        #[clap(value_name = "INTERFACE")]
        interface: String,
    },
}
