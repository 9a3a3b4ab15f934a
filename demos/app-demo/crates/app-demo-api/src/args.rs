use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "app-demo-api", about = "FuncShim demo deployment entry point")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Run the development server
    Serve {
        /// Interface to bind (default: manifest `[dev] host`)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (default: manifest `[dev] port`)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Handle a single platform event and print the response
    Invoke {
        /// File holding the event JSON; stdin when omitted
        #[arg(long, short)]
        event: Option<PathBuf>,
        /// Pretty-print the response
        #[arg(long)]
        pretty: bool,
    },
    /// Serve invocations from the platform runtime API
    Runtime,
}

impl Args {
    /// The explicit subcommand, or the mode implied by the environment.
    pub fn command(self, runtime_api_set: bool) -> Command {
        self.cmd.unwrap_or(if runtime_api_set {
            Command::Runtime
        } else {
            Command::Serve {
                host: None,
                port: None,
            }
        })
    }
}
