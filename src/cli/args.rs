//! CLI argument definitions using clap
//!
//! Commands:
//! - mongoproxy-schema check --schema <path>
//! - mongoproxy-schema insert --schema <path> --db <db> --collection <c>
//! - mongoproxy-schema update --schema <path> --db <db> --collection <c> [--upsert]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Schema enforcement for writes passing through the proxy
#[derive(Parser, Debug)]
#[command(name = "mongoproxy-schema")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load a schema configuration and list its collections
    Check {
        /// Path to the schema configuration file
        #[arg(long, default_value = "./schema.json")]
        schema: PathBuf,
    },

    /// Validate an insert document read from stdin
    Insert {
        /// Path to the schema configuration file
        #[arg(long, default_value = "./schema.json")]
        schema: PathBuf,

        /// Database name
        #[arg(long)]
        db: String,

        /// Collection name
        #[arg(long)]
        collection: String,
    },

    /// Validate an update operator document read from stdin
    Update {
        /// Path to the schema configuration file
        #[arg(long, default_value = "./schema.json")]
        schema: PathBuf,

        /// Database name
        #[arg(long)]
        db: String,

        /// Collection name
        #[arg(long)]
        collection: String,

        /// Treat the update as an upsert
        #[arg(long)]
        upsert: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_update_args() {
        let cli = Cli::try_parse_from([
            "mongoproxy-schema",
            "update",
            "--db",
            "testdb",
            "--collection",
            "users",
            "--upsert",
        ])
        .unwrap();

        match cli.command {
            Command::Update {
                schema,
                db,
                collection,
                upsert,
            } => {
                assert_eq!(schema, PathBuf::from("./schema.json"));
                assert_eq!(db, "testdb");
                assert_eq!(collection, "users");
                assert!(upsert);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_insert_requires_collection() {
        assert!(Cli::try_parse_from(["mongoproxy-schema", "insert", "--db", "testdb"]).is_err());
    }
}
