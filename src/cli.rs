use std::net::SocketAddr;
use std::path::PathBuf;

use agency_gateway::Collection;
use clap::{Parser, Subcommand};

/// Content gateway for the agency site
#[derive(Parser)]
#[command(name = "agency-gateway")]
#[command(about = "Fetch CMS content with fallback, or run the CORS proxy relay", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to config.toml in the platform config dir)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the proxy relay
    Serve {
        /// Address to listen on, overriding the configured one
        #[arg(short, long)]
        listen: Option<SocketAddr>,
    },
    /// Fetch a collection (live or fallback) and print it as JSON
    Fetch {
        /// services, cases, team, testimonials or posts
        collection: Collection,
        /// Fetch a single item by slug
        #[arg(long)]
        slug: Option<String>,
    },
    /// Print the built-in fallback set of a collection
    Fallback {
        collection: Collection,
    },
}
